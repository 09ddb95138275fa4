//! Orchestration layer
//!
//! ```text
//! batch_processor (every configured market form)
//!     ↓
//! form_processor (one form: fetch, classify, download, write logs)
//!     ↓
//! workflow::SubmissionFlow (one submission)
//!     ↓
//! services (classifier / reconciler / downloader / audit log)
//!     ↓
//! clients (FormSource + FileFetcher)
//! ```
//!
//! Only this layer owns the client and the worker pool, and only this layer
//! decides whether a failure is fatal for a form or for the batch.

pub mod batch_processor;
pub mod form_processor;

pub use batch_processor::{App, BatchStats};
pub use form_processor::{process_form, FormReport};
