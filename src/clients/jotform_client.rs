/// Jotform REST API client
///
/// Wraps the form, questions and submissions endpoints plus authenticated file
/// downloads.
use crate::clients::source::{FetchResponse, FileFetcher, FormSource};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Jotform API client
#[derive(Clone)]
pub struct JotformClient {
    http: Client,
    base_api: String,
    api_key: String,
    api_timeout: Duration,
    submissions_timeout: Duration,
    download_timeout: Duration,
}

impl JotformClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("jotform_downloader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::api_request_failed("client builder", e))?;

        Ok(Self {
            http,
            base_api: config.base_api.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_timeout: config.api_timeout,
            submissions_timeout: config.submissions_timeout,
            download_timeout: config.download_timeout,
        })
    }

    /// GET `{base}/{path}` and return the `content` field of the JSON envelope
    async fn get_content(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> AppResult<Value> {
        let endpoint = format!("{}/{}", self.base_api, path);
        debug!("GET {} {:?}", endpoint, query);

        let response = self
            .http
            .get(&endpoint)
            .header("APIKEY", &self.api_key)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::bad_status(&endpoint, status.as_u16()));
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| AppError::malformed(&endpoint, e.to_string()))?;

        Ok(body
            .get_mut("content")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

impl FormSource for JotformClient {
    async fn form_title(&self, form_id: &str) -> AppResult<String> {
        let content = self
            .get_content(&format!("form/{form_id}"), &[], self.api_timeout)
            .await?;
        Ok(content
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Form_{form_id}")))
    }

    async fn form_questions(&self, form_id: &str) -> AppResult<Value> {
        self.get_content(&format!("form/{form_id}/questions"), &[], self.api_timeout)
            .await
    }

    async fn submissions_page(
        &self,
        form_id: &str,
        offset: usize,
        limit: usize,
    ) -> AppResult<Vec<Value>> {
        let path = format!("form/{form_id}/submissions");
        let content = self
            .get_content(
                &path,
                &[("offset", offset.to_string()), ("limit", limit.to_string())],
                self.submissions_timeout,
            )
            .await?;

        match content {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::malformed(
                path,
                format!("expected an array of submissions, got {}", type_name(&other)),
            )),
        }
    }
}

impl FileFetcher for JotformClient {
    async fn fetch(&self, url: &str) -> AppResult<FetchResponse> {
        let response = self
            .http
            .get(url)
            .header("APIKEY", &self.api_key)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(url, e))?;

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
