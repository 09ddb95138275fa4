//! Services: one capability per module, no knowledge of the overall flow

pub mod answer_extractor;
pub mod audit_log;
pub mod classifier;
pub mod downloader;
pub mod folder_reconciler;
pub mod matrix_resolver;

pub use audit_log::AuditLog;
pub use classifier::{ClassifierRules, SubmissionClassifier};
pub use downloader::{DownloadOutcome, DownloadPolicy, Downloader};
pub use folder_reconciler::{FolderNamer, ReconcileAction, RoomFolderPlan};
pub use matrix_resolver::discover_room_matrices;
