use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// One (market label, form id) pair to process
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MarketForm {
    pub label: String,
    pub form_id: String,
}

impl MarketForm {
    pub fn new(label: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            form_id: form_id.into(),
        }
    }
}

/// Program configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Form API key, sent as the `APIKEY` header
    pub api_key: String,
    /// Form API base URL
    pub base_api: String,
    /// Root under which `{market}/{hotel}/...` is created
    pub download_root: PathBuf,
    /// Simulate downloads without network access or file writes
    pub dry_run: bool,
    /// Download attempts per file
    pub retry_limit: u32,
    /// Concurrent download workers per form
    pub max_workers: usize,
    /// Delay between failed download attempts
    pub retry_backoff: Duration,
    pub api_timeout: Duration,
    pub submissions_timeout: Duration,
    pub download_timeout: Duration,
    /// Submissions fetched per page
    pub page_size: usize,
    /// Allowed file extensions, lowercase without the leading dot
    pub allowed_extensions: Vec<String>,
    /// Forms to process, in order
    pub markets: Vec<MarketForm>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_api: "https://api.jotform.com".to_string(),
            download_root: PathBuf::from("Jotform Downloads"),
            dry_run: false,
            retry_limit: 2,
            max_workers: 8,
            retry_backoff: Duration::from_secs(2),
            api_timeout: Duration::from_secs(15),
            submissions_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(30),
            page_size: 100,
            allowed_extensions: ["jpg", "jpeg", "png", "pdf", "webp", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            markets: default_markets(),
        }
    }
}

fn default_markets() -> Vec<MarketForm> {
    [
        ("Amsterdam", "252926398638979"),
        ("London", "252935569279980"),
        ("Sao Paulo", "252935271108961"),
        ("Mexico City", "252935748443972"),
        ("New York", "252935471877976"),
        ("Melbourne", "252926736062966"),
        ("Sydney", "252927338105963"),
        ("Toronto", "252935176631966"),
        ("Austin", "252935065497973"),
        ("Chicago", "252935153593968"),
        ("Los Angeles", "252935200726959"),
        ("Berlin", "252935290996977"),
        ("Paris", "252935037349968"),
    ]
    .iter()
    .map(|(label, id)| MarketForm::new(*label, *id))
    .collect()
}

/// Layout of the optional `FORMS_FILE`
#[derive(Debug, Deserialize)]
struct FormsFile {
    #[serde(default)]
    markets: Vec<MarketForm>,
}

impl Config {
    /// Build the configuration from defaults overlaid with environment variables.
    ///
    /// If `FORMS_FILE` is set, its `[[markets]]` table replaces the built-in list.
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        let mut config = Self {
            api_key: std::env::var("JOTFORM_API_KEY").unwrap_or(default.api_key),
            base_api: std::env::var("JOTFORM_BASE_API").unwrap_or(default.base_api),
            download_root: std::env::var("DOWNLOAD_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.download_root),
            dry_run: env_parse("DRY_RUN", "bool")?.unwrap_or(default.dry_run),
            retry_limit: env_parse("RETRY_LIMIT", "u32")?.unwrap_or(default.retry_limit),
            max_workers: env_parse("MAX_WORKERS", "usize")?.unwrap_or(default.max_workers),
            retry_backoff: env_parse("RETRY_BACKOFF_MS", "u64")?
                .map(Duration::from_millis)
                .unwrap_or(default.retry_backoff),
            api_timeout: env_parse("API_TIMEOUT_SECS", "u64")?
                .map(Duration::from_secs)
                .unwrap_or(default.api_timeout),
            submissions_timeout: env_parse("SUBMISSIONS_TIMEOUT_SECS", "u64")?
                .map(Duration::from_secs)
                .unwrap_or(default.submissions_timeout),
            download_timeout: env_parse("DOWNLOAD_TIMEOUT_SECS", "u64")?
                .map(Duration::from_secs)
                .unwrap_or(default.download_timeout),
            page_size: env_parse("PAGE_SIZE", "usize")?.unwrap_or(default.page_size),
            allowed_extensions: std::env::var("ALLOWED_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .unwrap_or(default.allowed_extensions),
            markets: default.markets,
        };

        if let Ok(path) = std::env::var("FORMS_FILE") {
            config.markets = load_forms_file(Path::new(&path))?;
        }

        Ok(config.normalized())
    }

    /// Clamp values that would stall the pipeline and canonicalize extensions
    pub fn normalized(mut self) -> Self {
        self.retry_limit = self.retry_limit.max(1);
        self.max_workers = self.max_workers.max(1);
        self.page_size = self.page_size.max(1);
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }
}

/// Parse a `FORMS_FILE` TOML document
pub fn load_forms_file(path: &Path) -> AppResult<Vec<MarketForm>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| crate::error::AppError::read_failed(path, e))?;
    parse_forms_toml(&content, &path.display().to_string())
}

fn parse_forms_toml(content: &str, path: &str) -> AppResult<Vec<MarketForm>> {
    let file: FormsFile = toml::from_str(content).map_err(|source| ConfigError::FormsFileInvalid {
        path: path.to_string(),
        source,
    })?;
    if file.markets.is_empty() {
        return Err(ConfigError::NoMarkets {
            path: path.to_string(),
        }
        .into());
    }
    Ok(file.markets)
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_extension)
        .filter(|e| !e.is_empty())
        .collect()
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
