//! Single form processor
//!
//! Runs one market form end to end:
//!
//! 1. **Fetch**: title, every submission page, question metadata
//! 2. **Resolve**: schema and room matrix locators, once per form
//! 3. **Dispatch**: each submission through [`SubmissionFlow`]
//! 4. **Drain**: wait for every queued download
//! 5. **Report**: per-hotel CSV logs and one summary file

use crate::clients::{fetch_all_submissions, FileFetcher, FormSource};
use crate::config::{Config, MarketForm};
use crate::models::{FormSchema, Status, Submission};
use crate::services::folder_reconciler::ensure_dir;
use crate::services::{
    discover_room_matrices, AuditLog, DownloadPolicy, Downloader, SubmissionClassifier,
};
use crate::utils::logging::{log_form_complete, log_form_start};
use crate::utils::text::sanitize;
use crate::workflow::{FormCtx, SubmissionFlow};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// What one form run produced
#[derive(Debug, Clone)]
pub struct FormReport {
    pub market: String,
    pub form_id: String,
    pub title: String,
    pub submissions: usize,
    pub summary: BTreeMap<Status, usize>,
    pub log_paths: Vec<PathBuf>,
    pub summary_path: PathBuf,
}

/// Process one market form.
///
/// # Parameters
/// - `client`: form source, also used to fetch files
/// - `market`: market label and form id
/// - `config`: download root, worker count, retry policy, extensions
///
/// # Returns
/// The form's report. Errors only when the form cannot be listed at all or
/// its logs cannot be written; individual downloads never fail the form.
pub async fn process_form<C>(client: Arc<C>, market: &MarketForm, config: &Config) -> Result<FormReport>
where
    C: FormSource + FileFetcher + 'static,
{
    let form_id = market.form_id.as_str();

    let title = client
        .form_title(form_id)
        .await
        .with_context(|| format!("fetching title of form {form_id}"))?;

    let market_root = config.download_root.join(sanitize(&market.label));
    ensure_dir(&market_root)
        .with_context(|| format!("creating {}", market_root.display()))?;

    log_form_start(&market.label, form_id, &title);

    let raw_submissions = fetch_all_submissions(client.as_ref(), form_id, config.page_size)
        .await
        .with_context(|| format!("listing submissions of form {form_id}"))?;
    info!("📋 Submissions found: {}", raw_submissions.len());

    let questions = client
        .form_questions(form_id)
        .await
        .with_context(|| format!("fetching questions of form {form_id}"))?;
    let schema = FormSchema::from_json(form_id, &questions);
    let locators = discover_room_matrices(&schema);
    info!(
        "🧩 {} question(s), {} room matrix locator(s)",
        schema.questions.len(),
        locators.len()
    );

    let classifier = SubmissionClassifier::new(&schema, locators, config.allowed_extensions.clone());
    let downloader = Arc::new(Downloader::new(
        Arc::clone(&client),
        DownloadPolicy::from_config(config),
    ));
    let audit = Arc::new(AuditLog::new());
    let flow = SubmissionFlow::new(
        classifier,
        downloader,
        Arc::clone(&audit),
        config.max_workers,
        config.dry_run,
    );
    let ctx = FormCtx::new(&market.label, form_id, market_root.clone());

    let mut handles = Vec::new();
    for raw in &raw_submissions {
        let submission = Submission::from_json(raw);
        if let Err(e) = flow.run(&submission, &ctx, &mut handles) {
            error!("{} ❌ submission {} left incomplete: {}", ctx, submission.id, e);
        }
    }

    info!("⏳ Waiting for {} download(s)", handles.len());
    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("{} download task aborted: {}", ctx, e);
        }
    }

    let log_paths = audit
        .write_hotel_logs(&market_root)
        .context("writing per-hotel logs")?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let summary_path = audit
        .write_summary(&market_root, &log_paths, &timestamp)
        .context("writing summary file")?;

    log_form_complete(&market.label, raw_submissions.len(), &summary_path);

    Ok(FormReport {
        market: market.label.clone(),
        form_id: form_id.to_string(),
        title,
        submissions: raw_submissions.len(),
        summary: audit.summary(),
        log_paths,
        summary_path,
    })
}
