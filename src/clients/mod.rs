pub mod jotform_client;
pub mod source;

pub use jotform_client::JotformClient;
pub use source::{fetch_all_submissions, FetchResponse, FileFetcher, FormSource};
