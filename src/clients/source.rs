//! Data source seams
//!
//! The pipeline only sees these traits, so it can run against the live API or
//! an in-memory fake.

use crate::error::AppResult;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Read access to forms and their submissions
pub trait FormSource: Send + Sync {
    /// Form title, unsanitized
    fn form_title(&self, form_id: &str) -> impl Future<Output = AppResult<String>> + Send;

    /// Question metadata keyed by question id
    fn form_questions(&self, form_id: &str) -> impl Future<Output = AppResult<Value>> + Send;

    /// One page of raw submission objects; an empty page ends pagination
    fn submissions_page(
        &self,
        form_id: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = AppResult<Vec<Value>>> + Send;
}

/// Status code and body of one file request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Fetches file bytes for a download URL
pub trait FileFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = AppResult<FetchResponse>> + Send;
}

/// Fetch pages with `offset`/`limit` until an empty page comes back
pub async fn fetch_all_submissions<S: FormSource>(
    source: &S,
    form_id: &str,
    page_size: usize,
) -> AppResult<Vec<Value>> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let page = source.submissions_page(form_id, offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        debug!("form {}: fetched {} submission(s) at offset {}", form_id, page.len(), offset);
        all.extend(page);
        offset += page_size;
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct PagedSource {
        items: Vec<Value>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl FormSource for PagedSource {
        async fn form_title(&self, _form_id: &str) -> AppResult<String> {
            Ok("title".into())
        }

        async fn form_questions(&self, _form_id: &str) -> AppResult<Value> {
            Ok(json!({}))
        }

        async fn submissions_page(&self, _form_id: &str, offset: usize, limit: usize) -> AppResult<Vec<Value>> {
            self.calls.lock().unwrap().push((offset, limit));
            Ok(self.items.iter().skip(offset).take(limit).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_pagination_stops_on_empty_page() {
        let source = PagedSource {
            items: (0..5).map(|i| json!({ "id": i })).collect(),
            calls: Mutex::new(Vec::new()),
        };
        let all = fetch_all_submissions(&source, "f", 2).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(*source.calls.lock().unwrap(), vec![(0, 2), (2, 2), (4, 2), (6, 2)]);
    }
}
