pub mod form_ctx;
pub mod submission_flow;

pub use form_ctx::FormCtx;
pub use submission_flow::{SubmissionFlow, HOTEL_IMAGES_FOLDER};
