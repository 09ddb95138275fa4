//! Folder reconciler
//!
//! Picks the folder a room's files go into and migrates folders created by
//! earlier runs that did not yet know the room's name. Runs on the submitting
//! task before any download for the room is enqueued.

use crate::error::{AppError, AppResult};
use crate::utils::text::{sanitize, simplify_room};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Marker written into a room folder that received no files
pub const NO_UPLOADS_FILE: &str = "No uploads.txt";
const NO_UPLOADS_TEXT: &str = "No files submitted.";

/// Where one room's files go, plus the names earlier runs may have used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFolderPlan {
    pub room_index: usize,
    pub folder_name: String,
    /// Only populated when the room has a resolved name
    pub legacy_names: Vec<String>,
}

/// `RoomType_{i}` placeholder used while a room has no resolved name
pub fn placeholder_name(room_index: usize) -> String {
    format!("RoomType_{room_index}")
}

fn with_rank(base: &str, rank: usize) -> String {
    if rank > 1 {
        format!("{base}_{rank}")
    } else {
        base.to_string()
    }
}

/// Per-submission folder naming; disambiguates rooms that sanitize to the
/// same name with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct FolderNamer {
    seen: HashMap<String, usize>,
}

impl FolderNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the folders of every room of one submission.
    ///
    /// # Parameters
    /// - `rooms`: `(room index, raw room name)` in room order; an empty name
    ///   means the room is unresolved
    ///
    /// # Returns
    /// One plan per room. No plan lists another room's final folder among its
    /// legacy names, so reconciling one room never moves a folder another
    /// room of the same submission writes into.
    pub fn plan_rooms<'a>(
        &mut self,
        rooms: impl IntoIterator<Item = (usize, &'a str)>,
    ) -> Vec<RoomFolderPlan> {
        let mut plans: Vec<RoomFolderPlan> = rooms
            .into_iter()
            .map(|(index, name)| self.plan(index, name))
            .collect();

        let claimed: HashSet<String> = plans.iter().map(|p| p.folder_name.clone()).collect();
        for plan in &mut plans {
            plan.legacy_names.retain(|legacy| !claimed.contains(legacy));
        }
        plans
    }

    fn plan(&mut self, room_index: usize, raw_name: &str) -> RoomFolderPlan {
        let raw_name = raw_name.trim();
        let has_name = !raw_name.is_empty();
        let base = if has_name {
            sanitize(raw_name)
        } else {
            placeholder_name(room_index)
        };

        let rank = {
            let counter = self.seen.entry(base.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let folder_name = with_rank(&base, rank);

        let mut legacy_names = Vec::new();
        if has_name {
            // unnamed runs always used the plain placeholder, the index keeps it unique
            let placeholder = placeholder_name(room_index);
            legacy_names.push(placeholder.clone());
            let ranked = with_rank(&placeholder, rank);
            if ranked != placeholder {
                legacy_names.push(ranked);
            }
            let short = sanitize(&simplify_room(raw_name));
            if short != base {
                legacy_names.push(with_rank(&short, rank));
            }
        }

        RoomFolderPlan {
            room_index,
            folder_name,
            legacy_names,
        }
    }
}

/// What [`reconcile`] did on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Folder was already in place (or has just been created)
    Ready,
    /// A legacy folder was renamed to the final name
    Renamed { from: String },
    /// A legacy folder's files were moved into the existing final folder
    Merged {
        from: String,
        moved: usize,
        skipped: usize,
    },
}

/// Create `path` (and parents) unless it already exists.
///
/// Several rooms may create sibling folders at the same time, so "already
/// exists" is not an error.
///
/// # Parameters
/// - `path`: folder to create
///
/// # Returns
/// `FileError::CreateDirFailed` for any other failure
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(AppError::create_dir_failed(path, e)),
    }
}

/// Bring `hotel_dir/{plan.folder_name}` into existence, migrating the first
/// legacy folder found. Existing files in the final folder are never
/// overwritten; a legacy folder that cannot be removed afterwards is left
/// behind with a warning.
///
/// # Parameters
/// - `hotel_dir`: the hotel's folder, already created
/// - `plan`: from [`FolderNamer::plan_rooms`]
///
/// # Returns
/// The room folder and what was done to produce it
pub fn reconcile(hotel_dir: &Path, plan: &RoomFolderPlan) -> AppResult<(PathBuf, ReconcileAction)> {
    let room_dir = hotel_dir.join(&plan.folder_name);
    let mut action = ReconcileAction::Ready;

    for legacy in &plan.legacy_names {
        let legacy_dir = hotel_dir.join(legacy);
        if legacy_dir == room_dir || !legacy_dir.is_dir() {
            continue;
        }

        if !room_dir.exists() {
            fs::rename(&legacy_dir, &room_dir)
                .map_err(|e| AppError::rename_failed(&legacy_dir, &room_dir, e))?;
            info!("📂 Renamed {} -> {}", legacy, plan.folder_name);
            action = ReconcileAction::Renamed {
                from: legacy.clone(),
            };
        } else {
            let (moved, skipped) = merge_into(&legacy_dir, &room_dir)?;
            if let Err(e) = fs::remove_dir(&legacy_dir) {
                warn!(
                    "⚠️ Could not remove legacy folder {}: {}",
                    legacy_dir.display(),
                    e
                );
            }
            info!(
                "📂 Merged {} into {} ({} moved, {} already present)",
                legacy, plan.folder_name, moved, skipped
            );
            action = ReconcileAction::Merged {
                from: legacy.clone(),
                moved,
                skipped,
            };
        }
        break;
    }

    ensure_dir(&room_dir)?;
    Ok((room_dir, action))
}

/// Move every entry of `from` into `to` unless `to` already has that name
fn merge_into(from: &Path, to: &Path) -> AppResult<(usize, usize)> {
    let entries = fs::read_dir(from).map_err(|e| AppError::read_failed(from, e))?;
    let mut moved = 0;
    let mut skipped = 0;

    for entry in entries {
        let entry = entry.map_err(|e| AppError::read_failed(from, e))?;
        let target = to.join(entry.file_name());
        if target.exists() {
            skipped += 1;
            continue;
        }
        fs::rename(entry.path(), &target)
            .map_err(|e| AppError::rename_failed(&entry.path(), &target, e))?;
        moved += 1;
    }

    Ok((moved, skipped))
}

/// Write the "no files submitted" marker into `room_dir`.
///
/// # Parameters
/// - `room_dir`: an existing room folder; a previous marker is replaced
pub fn write_no_uploads_marker(room_dir: &Path) -> AppResult<()> {
    let path = room_dir.join(NO_UPLOADS_FILE);
    fs::write(&path, NO_UPLOADS_TEXT).map_err(|e| AppError::write_failed(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_for_unnamed_rooms() {
        let mut namer = FolderNamer::new();
        let plan = namer.plan(3, "  ");
        assert_eq!(plan.folder_name, "RoomType_3");
        assert!(plan.legacy_names.is_empty());
    }

    #[test]
    fn test_colliding_names_get_rank_suffix() {
        let mut namer = FolderNamer::new();
        let first = namer.plan(1, "Suite");
        let second = namer.plan(2, "Suite");
        let third = namer.plan(3, "Suite!");
        assert_eq!(first.folder_name, "Suite");
        assert_eq!(second.folder_name, "Suite_2");
        assert_eq!(third.folder_name, "Suite_");
        assert_eq!(second.legacy_names, vec!["RoomType_2", "RoomType_2_2"]);
    }

    #[test]
    fn test_short_name_of_one_room_never_targets_another_rooms_folder() {
        let plans = FolderNamer::new().plan_rooms([(1, "Suite"), (2, "Suite. Ocean view")]);
        assert_eq!(plans[0].folder_name, "Suite");
        assert_eq!(plans[1].folder_name, "Suite__Ocean_view");
        assert_eq!(plans[1].legacy_names, vec!["RoomType_2"]);

        // same when the longer name comes first
        let plans = FolderNamer::new().plan_rooms([(1, "Suite. Ocean view"), (2, "Suite")]);
        assert_eq!(plans[0].legacy_names, vec!["RoomType_1"]);
    }

    #[test]
    fn test_sibling_room_folder_survives_reconcile() {
        let tmp = TempDir::new().unwrap();
        let hotel = tmp.path();
        let plans = FolderNamer::new().plan_rooms([(1, "Suite"), (2, "Suite. Ocean view")]);

        let (suite, _) = reconcile(hotel, &plans[0]).unwrap();
        fs::write(suite.join("r1.jpg"), b"1").unwrap();
        let (ocean, action) = reconcile(hotel, &plans[1]).unwrap();

        assert_eq!(action, ReconcileAction::Ready);
        assert!(suite.join("r1.jpg").is_file());
        assert!(!ocean.join("r1.jpg").exists());
    }

    #[test]
    fn test_unranked_placeholder_is_migrated_for_ranked_room() {
        let tmp = TempDir::new().unwrap();
        let hotel = tmp.path();
        fs::create_dir(hotel.join("RoomType_2")).unwrap();
        fs::write(hotel.join("RoomType_2").join("b.jpg"), b"b").unwrap();

        let plans = FolderNamer::new().plan_rooms([(1, "Suite"), (2, "Suite")]);
        let (dir, action) = reconcile(hotel, &plans[1]).unwrap();

        assert_eq!(dir, hotel.join("Suite_2"));
        assert_eq!(action, ReconcileAction::Renamed { from: "RoomType_2".into() });
        assert!(dir.join("b.jpg").is_file());
        assert!(!hotel.join("RoomType_2").exists());
    }

    #[test]
    fn test_legacy_names_include_short_name() {
        let mut namer = FolderNamer::new();
        let plan = namer.plan(1, "Deluxe King. Sleeps two with city views");
        assert_eq!(plan.folder_name, "Deluxe_King__Sleeps_two_with_city_views");
        assert_eq!(plan.legacy_names, vec!["RoomType_1", "Deluxe_King"]);
    }

    #[test]
    fn test_placeholder_folder_is_renamed() {
        let tmp = TempDir::new().unwrap();
        let hotel = tmp.path();
        fs::create_dir(hotel.join("RoomType_1")).unwrap();
        fs::write(hotel.join("RoomType_1").join("img1.jpg"), b"x").unwrap();

        let plan = FolderNamer::new().plan(1, "Deluxe King");
        let (dir, action) = reconcile(hotel, &plan).unwrap();

        assert_eq!(dir, hotel.join("Deluxe_King"));
        assert!(hotel.join("Deluxe_King").join("img1.jpg").exists());
        assert!(!hotel.join("RoomType_1").exists());
        assert_eq!(action, ReconcileAction::Renamed { from: "RoomType_1".into() });
    }

    #[test]
    fn test_placeholder_folder_is_merged_without_overwriting() {
        let tmp = TempDir::new().unwrap();
        let hotel = tmp.path();
        let legacy = hotel.join("RoomType_1");
        let target = hotel.join("Deluxe_King");
        fs::create_dir(&legacy).unwrap();
        fs::create_dir(&target).unwrap();
        fs::write(legacy.join("new.jpg"), b"legacy").unwrap();
        fs::write(legacy.join("same.jpg"), b"legacy").unwrap();
        fs::write(target.join("same.jpg"), b"final").unwrap();

        let plan = FolderNamer::new().plan(1, "Deluxe King");
        let (_, action) = reconcile(hotel, &plan).unwrap();

        assert_eq!(
            action,
            ReconcileAction::Merged { from: "RoomType_1".into(), moved: 1, skipped: 1 }
        );
        assert!(target.join("new.jpg").exists());
        assert_eq!(fs::read(target.join("same.jpg")).unwrap(), b"final");
        // still holds the skipped file, so it stays
        assert!(legacy.join("same.jpg").exists());
    }

    #[test]
    fn test_empty_legacy_folder_is_removed_after_merge() {
        let tmp = TempDir::new().unwrap();
        let hotel = tmp.path();
        fs::create_dir(hotel.join("Suite")).unwrap();
        fs::create_dir(hotel.join("Suite").join("Nested")).unwrap();
        fs::create_dir(hotel.join("RoomType_2")).unwrap();
        fs::write(hotel.join("RoomType_2").join("a.png"), b"a").unwrap();

        let plan = FolderNamer::new().plan(2, "Suite");
        reconcile(hotel, &plan).unwrap();

        assert!(hotel.join("Suite").join("a.png").exists());
        assert!(!hotel.join("RoomType_2").exists());
    }

    #[test]
    fn test_unnamed_room_just_creates_folder() {
        let tmp = TempDir::new().unwrap();
        let plan = FolderNamer::new().plan(4, "");
        let (dir, action) = reconcile(tmp.path(), &plan).unwrap();
        assert!(dir.is_dir());
        assert_eq!(action, ReconcileAction::Ready);
        // second run is a no-op
        assert!(reconcile(tmp.path(), &plan).is_ok());
    }

    #[test]
    fn test_no_uploads_marker() {
        let tmp = TempDir::new().unwrap();
        write_no_uploads_marker(tmp.path()).unwrap();
        let text = fs::read_to_string(tmp.path().join(NO_UPLOADS_FILE)).unwrap();
        assert_eq!(text, "No files submitted.");
    }
}
