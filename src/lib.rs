//! # Jotform Downloader
//!
//! Pulls hotel and room assets out of Jotform submissions and files them as
//! `{root}/{market}/{hotel}/{room}/`.
//!
//! ## Architecture
//!
//! ### ① Clients
//! - `clients/` - the only code that talks to the network
//! - `FormSource` / `FileFetcher` - seams the pipeline depends on
//! - `JotformClient` - REST implementation of both
//!
//! ### ② Services
//! - `services/` - one capability each, no knowledge of the flow
//! - `matrix_resolver` - where room names live in matrix questions
//! - `answer_extractor` - URLs and room names out of raw answers
//! - `classifier` - answers bound to hotel / images / room slots
//! - `folder_reconciler` - room folder names and legacy folder migration
//! - `downloader` - idempotent, retried file transfer
//! - `audit_log` - log rows, status counts, CSV and summary files
//!
//! ### ③ Workflow
//! - `workflow/` - what happens to one submission
//!
//! ### ④ Orchestration
//! - `orchestrator/form_processor` - one form, its worker pool and reports
//! - `orchestrator/batch_processor` - every market form, failures isolated

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

pub use clients::{FileFetcher, FormSource, JotformClient};
pub use config::{Config, MarketForm};
pub use error::{AppError, AppResult};
pub use models::{LogRow, Status};
pub use orchestrator::{process_form, App, BatchStats, FormReport};
