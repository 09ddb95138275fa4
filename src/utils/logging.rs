//! Logging setup and banner helpers

use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialise the global subscriber. Honours `RUST_LOG`, defaults to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Log startup information
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Jotform downloader starting");
    info!("📁 Download root: {}", config.download_root.display());
    info!("📊 Workers per form: {}", config.max_workers);
    info!("🔁 Retry limit: {}", config.retry_limit);
    if config.dry_run {
        info!("🧪 DRY RUN: no files will be written");
    }
    info!("📋 Forms queued: {}", config.markets.len());
    info!("{}", "=".repeat(60));
}

pub fn log_form_start(market: &str, form_id: &str, title: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 {} ({})", market, form_id);
    info!("📄 Form title: {}", title);
    info!("{}", "=".repeat(60));
}

pub fn log_form_complete(market: &str, submissions: usize, summary_path: &std::path::Path) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {} done: {} submission(s)", market, submissions);
    info!("📝 Logs written. Summary -> {}", summary_path.display());
    info!("{}", "─".repeat(60));
}

/// Print totals across all forms
pub fn print_final_stats(
    forms_ok: usize,
    forms_failed: usize,
    totals: &std::collections::BTreeMap<crate::models::Status, usize>,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 All forms processed");
    info!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ Forms succeeded: {}", forms_ok);
    info!("❌ Forms failed: {}", forms_failed);
    for (status, count) in totals {
        info!("   {}: {}", status, count);
    }
    info!("{}", "=".repeat(60));
}
