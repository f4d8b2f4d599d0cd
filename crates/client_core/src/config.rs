use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::directory::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "onboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub step1_api_url: String,
    pub step2_api_url: String,
    pub draft_database_url: String,
    pub draft_debounce_ms: u64,
    pub lookup_debounce_ms: u64,
    /// Simulated latency before each backend write of a submission.
    pub submit_delay_ms: u64,
    pub redirect_pause_ms: u64,
    pub page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step1_api_url: "http://localhost:4001".into(),
            step2_api_url: "http://localhost:4002".into(),
            draft_database_url: "sqlite://./data/drafts.db".into(),
            draft_debounce_ms: 2000,
            lookup_debounce_ms: 300,
            submit_delay_ms: 3000,
            redirect_pause_ms: 1500,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Waits the wizard and the submission flow observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub draft_debounce: Duration,
    pub lookup_debounce: Duration,
    pub submit_delay: Duration,
    pub redirect_pause: Duration,
}

impl Timing {
    /// No artificial waits; drafts and lookups still debounce.
    pub fn immediate() -> Self {
        Self {
            submit_delay: Duration::ZERO,
            redirect_pause: Duration::ZERO,
            ..Settings::default().timing()
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Settings::default().timing()
    }
}

impl Settings {
    pub fn timing(&self) -> Timing {
        Timing {
            draft_debounce: Duration::from_millis(self.draft_debounce_ms),
            lookup_debounce: Duration::from_millis(self.lookup_debounce_ms),
            submit_delay: Duration::from_millis(self.submit_delay_ms),
            redirect_pause: Duration::from_millis(self.redirect_pause_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    step1_api_url: Option<String>,
    step2_api_url: Option<String>,
    draft_database_url: Option<String>,
    draft_debounce_ms: Option<u64>,
    lookup_debounce_ms: Option<u64>,
    submit_delay_ms: Option<u64>,
    redirect_pause_ms: Option<u64>,
    page_size: Option<u32>,
}

/// Defaults, then the TOML file (`config_path`, or `onboard.toml` when it
/// exists), then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
    };
    if let Some(path) = path {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    normalize(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.step1_api_url {
        settings.step1_api_url = v;
    }
    if let Some(v) = file_cfg.step2_api_url {
        settings.step2_api_url = v;
    }
    if let Some(v) = file_cfg.draft_database_url {
        settings.draft_database_url = v;
    }
    if let Some(v) = file_cfg.draft_debounce_ms {
        settings.draft_debounce_ms = v;
    }
    if let Some(v) = file_cfg.lookup_debounce_ms {
        settings.lookup_debounce_ms = v;
    }
    if let Some(v) = file_cfg.submit_delay_ms {
        settings.submit_delay_ms = v;
    }
    if let Some(v) = file_cfg.redirect_pause_ms {
        settings.redirect_pause_ms = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    for key in ["STEP1_API_URL", "APP__STEP1_API_URL"] {
        if let Some(v) = var(key) {
            settings.step1_api_url = v;
        }
    }
    for key in ["STEP2_API_URL", "APP__STEP2_API_URL"] {
        if let Some(v) = var(key) {
            settings.step2_api_url = v;
        }
    }
    for key in ["DRAFT_DATABASE_URL", "APP__DRAFT_DATABASE_URL"] {
        if let Some(v) = var(key) {
            settings.draft_database_url = v;
        }
    }

    override_number(&var, "APP__DRAFT_DEBOUNCE_MS", &mut settings.draft_debounce_ms);
    override_number(&var, "APP__LOOKUP_DEBOUNCE_MS", &mut settings.lookup_debounce_ms);
    override_number(&var, "APP__SUBMIT_DELAY_MS", &mut settings.submit_delay_ms);
    override_number(&var, "APP__REDIRECT_PAUSE_MS", &mut settings.redirect_pause_ms);
    override_number(&var, "APP__PAGE_SIZE", &mut settings.page_size);
}

fn override_number<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = var(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(key, value = %raw, "ignoring unparseable numeric override"),
    }
}

fn normalize(mut settings: Settings) -> anyhow::Result<Settings> {
    settings.step1_api_url = normalize_base_url(&settings.step1_api_url)
        .context("invalid step1_api_url")?;
    settings.step2_api_url = normalize_base_url(&settings.step2_api_url)
        .context("invalid step2_api_url")?;
    settings.draft_database_url = normalize_database_url(&settings.draft_database_url);
    if settings.page_size == 0 {
        bail!("page_size must be at least 1");
    }
    Ok(settings)
}

/// Absolute http(s) URL without a trailing slash.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("'{raw}' is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("'{raw}' must use http or https");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().draft_database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
