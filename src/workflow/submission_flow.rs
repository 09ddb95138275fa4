//! Submission flow
//!
//! What happens to one submission, in order:
//! 1. classify answers into hotel / hotel images / five room slots
//! 2. create the hotel folder and its `Hotel_Images` folder when needed
//! 3. per room: pick the folder name, migrate legacy folders, then either
//!    write the empty-room marker or enqueue the room's downloads
//!
//! Steps 1-3 run on the caller. Only the downloads run on worker tasks, so a
//! room's folder is final before anything is written into it.

use crate::clients::FileFetcher;
use crate::error::AppResult;
use crate::models::{LogRow, Status, Submission, ROOM_INDICES};
use crate::services::folder_reconciler::{ensure_dir, reconcile, write_no_uploads_marker};
use crate::services::{AuditLog, Downloader, FolderNamer, SubmissionClassifier};
use crate::workflow::form_ctx::FormCtx;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Folder (and log room label) for hotel-level images
pub const HOTEL_IMAGES_FOLDER: &str = "Hotel_Images";

const NO_FILE: &str = "N/A";

/// Per-form submission pipeline
///
/// - owns the form's classifier
/// - shares the downloader, audit log and worker permits with every task it spawns
/// - never waits for downloads; the caller drains the handles it collects
pub struct SubmissionFlow<F> {
    classifier: SubmissionClassifier,
    downloader: Arc<Downloader<F>>,
    audit: Arc<AuditLog>,
    workers: Arc<Semaphore>,
    dry_run: bool,
}

impl<F: FileFetcher + 'static> SubmissionFlow<F> {
    /// # Parameters
    /// - `classifier`: built once from the form schema
    /// - `downloader`: shared by all download tasks of the form
    /// - `audit`: log rows and status counts for the form
    /// - `max_workers`: downloads allowed in flight at once
    /// - `dry_run`: skip the empty-room marker as well as transfers
    pub fn new(
        classifier: SubmissionClassifier,
        downloader: Arc<Downloader<F>>,
        audit: Arc<AuditLog>,
        max_workers: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            classifier,
            downloader,
            audit,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
            dry_run,
        }
    }

    /// Classify, reconcile folders and enqueue downloads for one submission.
    ///
    /// # Parameters
    /// - `handles`: receives one handle per enqueued download, also for the
    ///   downloads queued before an error cut the submission short
    ///
    /// # Returns
    /// Number of downloads queued. Each task records its own log row.
    pub fn run(
        &self,
        submission: &Submission,
        ctx: &FormCtx,
        handles: &mut Vec<JoinHandle<()>>,
    ) -> AppResult<usize> {
        let entity = self.classifier.classify(submission);
        let hotel = entity.hotel.clone();
        let hotel_dir = ctx.hotel_dir(&hotel);

        ensure_dir(&hotel_dir)?;
        self.audit.register_hotel(&hotel);

        let queued_before = handles.len();

        if !entity.hotel_image_urls.is_empty() {
            let images_dir = hotel_dir.join(HOTEL_IMAGES_FOLDER);
            ensure_dir(&images_dir)?;
            for url in &entity.hotel_image_urls {
                handles.push(self.enqueue(url.clone(), images_dir.clone(), &hotel, HOTEL_IMAGES_FOLDER));
            }
        }

        let plans = FolderNamer::new()
            .plan_rooms(ROOM_INDICES.map(|i| (i, entity.rooms[i - 1].name.as_str())));
        for plan in &plans {
            let i = plan.room_index;
            let slot = &entity.rooms[i - 1];
            let (room_dir, action) = reconcile(&hotel_dir, plan)?;
            debug!("{} {} room {} -> {} ({:?})", ctx, hotel, i, plan.folder_name, action);

            if slot.asset_urls.is_empty() {
                if !self.dry_run {
                    write_no_uploads_marker(&room_dir)?;
                }
                self.audit
                    .record(LogRow::new(&hotel, &plan.folder_name, NO_FILE, Status::NoUploads));
                continue;
            }

            for url in &slot.asset_urls {
                handles.push(self.enqueue(url.clone(), room_dir.clone(), &hotel, &plan.folder_name));
            }
        }

        let queued = handles.len() - queued_before;
        debug!("{} submission {}: {} download(s) queued", ctx, submission.id, queued);
        Ok(queued)
    }

    /// Spawn one download; the task waits for a worker permit first
    fn enqueue(&self, url: String, dest: PathBuf, hotel: &str, room: &str) -> JoinHandle<()> {
        let downloader = Arc::clone(&self.downloader);
        let audit = Arc::clone(&self.audit);
        let workers = Arc::clone(&self.workers);
        let hotel = hotel.to_string();
        let room = room.to_string();

        tokio::spawn(async move {
            let _permit = match workers.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    warn!("⚠️ worker pool closed, downloading {} unthrottled: {}", url, e);
                    None
                }
            };

            let outcome = downloader.download(&url, &dest).await;
            info!(
                "[{}] {} -> {} ({})",
                outcome.status.indicator(),
                outcome.filename,
                room,
                outcome.status
            );
            audit.record(LogRow::new(hotel, room, outcome.filename, outcome.status));
        })
    }
}
