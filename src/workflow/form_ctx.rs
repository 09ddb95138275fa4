//! Form processing context
//!
//! Which market/form a submission belongs to and where its files go

use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FormCtx {
    /// Market label as configured
    pub market: String,

    pub form_id: String,

    /// `{download_root}/{sanitized market}`
    pub market_root: PathBuf,
}

impl FormCtx {
    pub fn new(market: impl Into<String>, form_id: impl Into<String>, market_root: PathBuf) -> Self {
        Self {
            market: market.into(),
            form_id: form_id.into(),
            market_root,
        }
    }

    pub fn hotel_dir(&self, hotel: &str) -> PathBuf {
        self.market_root.join(hotel)
    }
}

impl Display for FormCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} form#{}]", self.market, self.form_id)
    }
}
