//! Batch processor
//!
//! Application entry point: owns the configuration and the API client and
//! walks every configured market form in order.
//!
//! - **Isolation**: a form that fails is logged with its market and form id;
//!   the batch carries on with the next one
//! - **Statistics**: totals per status across all forms that completed

use crate::clients::{FileFetcher, FormSource, JotformClient};
use crate::config::Config;
use crate::models::Status;
use crate::orchestrator::form_processor::{process_form, FormReport};
use crate::utils::logging::{log_startup, print_final_stats};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Application
pub struct App<C> {
    config: Config,
    client: Arc<C>,
}

impl App<JotformClient> {
    /// Build the live API client from `config`
    pub fn initialize(config: Config) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            warn!("⚠️ JOTFORM_API_KEY is not set, requests will be rejected");
        }
        let client = JotformClient::new(&config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }
}

impl<C: FormSource + FileFetcher + 'static> App<C> {
    pub fn with_client(config: Config, client: Arc<C>) -> Self {
        Self { config, client }
    }

    /// Process every configured market form
    pub async fn run(&self) -> Result<BatchStats> {
        log_startup(&self.config);

        if self.config.markets.is_empty() {
            warn!("⚠️ No market forms configured, nothing to do");
            return Ok(BatchStats::default());
        }

        let mut stats = BatchStats::default();

        for market in &self.config.markets {
            match process_form(Arc::clone(&self.client), market, &self.config).await {
                Ok(report) => stats.add(report),
                Err(e) => {
                    error!(
                        "❌ Failed to process {} ({}): {:#}",
                        market.label, market.form_id, e
                    );
                    stats.forms_failed += 1;
                }
            }
        }

        print_final_stats(stats.reports.len(), stats.forms_failed, &stats.totals);
        Ok(stats)
    }
}

/// Totals across one batch run
#[derive(Debug, Default)]
pub struct BatchStats {
    pub reports: Vec<FormReport>,
    pub forms_failed: usize,
    pub totals: BTreeMap<Status, usize>,
}

impl BatchStats {
    fn add(&mut self, report: FormReport) {
        for (status, count) in &report.summary {
            *self.totals.entry(*status).or_insert(0) += count;
        }
        self.reports.push(report);
    }

    pub fn forms_ok(&self) -> usize {
        self.reports.len()
    }
}
