//! Application configuration for contactsync.
//!
//! User config lives at `~/.contactsync/contactsync.toml`.
//! Secrets come from the environment; the file only names the variables.
//! The runtime [`SyncSettings`] is resolved once at startup and passed by
//! reference from there on.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ContactSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contactsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contactsync";

/// Environment variables that override the `[sender]` section.
const SENDER_NAME_ENV: &str = "SENDER_NAME";
const SENDER_EMAIL_ENV: &str = "SENDER_EMAIL";

// ---------------------------------------------------------------------------
// Config structs (matching contactsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote service connection settings.
    #[serde(default)]
    pub brevo: BrevoConfig,

    /// Sender identity used for campaigns.
    #[serde(default)]
    pub sender: SenderConfig,

    /// Folder, list and campaign naming.
    #[serde(default)]
    pub campaign: CampaignConfig,

    /// Daily trigger settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// `[brevo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrevoConfig {
    /// API root, e.g. `https://api.brevo.com/v3`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Contacts fetched per page while indexing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Pause between contact pages, in ms.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Folders fetched per page while looking up the target folder.
    #[serde(default = "default_folder_page_size")]
    pub folder_page_size: usize,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            folder_page_size: default_folder_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.brevo.com/v3".into()
}
fn default_api_key_env() -> String {
    "BREVO_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_page_size() -> usize {
    1000
}
fn default_page_delay_ms() -> u64 {
    100
}
fn default_folder_page_size() -> usize {
    50
}

/// `[sender]` section. Empty values fall back to `SENDER_NAME` / `SENDER_EMAIL`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// `[campaign]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Folder that holds every run's recipient list.
    #[serde(default = "default_folder_name")]
    pub folder_name: String,

    /// Recipient list names are `"<prefix> - <local timestamp>"`.
    #[serde(default = "default_list_name_prefix")]
    pub list_name_prefix: String,

    /// Campaign names are `"<prefix> - <unix seconds>"`.
    #[serde(default = "default_campaign_name_prefix")]
    pub campaign_name_prefix: String,

    /// Subject line.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// HTML body template.
    #[serde(default = "default_template_path")]
    pub template_path: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            folder_name: default_folder_name(),
            list_name_prefix: default_list_name_prefix(),
            campaign_name_prefix: default_campaign_name_prefix(),
            subject: default_subject(),
            template_path: default_template_path(),
        }
    }
}

fn default_folder_name() -> String {
    "Winners".into()
}
fn default_list_name_prefix() -> String {
    "Winners List".into()
}
fn default_campaign_name_prefix() -> String {
    "CSV Import Campaign".into()
}
fn default_subject() -> String {
    "დოკუმენტაციის თარგმნა ნოტარიულად დამოწმებით".into()
}
fn default_template_path() -> String {
    "static/message_template.html".into()
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression (with seconds), evaluated in local time.
    #[serde(default = "default_cron")]
    pub cron: String,

    /// Directory holding the daily exports.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// File name pattern under `input_dir`; `{date}` becomes `YYYY-MM-DD`.
    #[serde(default = "default_input_pattern")]
    pub input_pattern: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            input_dir: default_input_dir(),
            input_pattern: default_input_pattern(),
        }
    }
}

fn default_cron() -> String {
    "0 0 2 * * *".into()
}
fn default_input_dir() -> String {
    "var/winners".into()
}
fn default_input_pattern() -> String {
    "applications_{date}_past_1days/profiles.csv".into()
}

impl ScheduleConfig {
    /// Input file expected for the given local date.
    pub fn input_path_for(&self, date: chrono::NaiveDate) -> PathBuf {
        let name = self
            .input_pattern
            .replace("{date}", &date.format("%Y-%m-%d").to_string());
        Path::new(&self.input_dir).join(name)
    }
}

// ---------------------------------------------------------------------------
// Runtime settings (resolved once from config + environment)
// ---------------------------------------------------------------------------

/// API key newtype that keeps the secret out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Connection settings for the remote contact client.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_key: ApiKey,
    pub timeout: Duration,
}

/// Sender identity stamped on campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub name: String,
    pub email: String,
}

/// Everything a pipeline run needs, resolved from [`AppConfig`] + environment.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub remote: RemoteSettings,
    pub sender: SenderIdentity,
    pub page_size: usize,
    pub page_delay: Duration,
    pub folder_page_size: usize,
    pub folder_name: String,
    pub list_name_prefix: String,
    pub campaign_name_prefix: String,
    pub subject: String,
    pub template_path: PathBuf,
}

impl SyncSettings {
    /// Resolve settings against the process environment.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve settings using `lookup` for environment values.
    ///
    /// Fails with a config error naming every missing variable.
    pub fn resolve_with<F>(config: &AppConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(&config.brevo.api_key_env);
        let sender_name = non_empty(SENDER_NAME_ENV).or_else(|| {
            Some(config.sender.name.clone()).filter(|v| !v.trim().is_empty())
        });
        let sender_email = non_empty(SENDER_EMAIL_ENV).or_else(|| {
            Some(config.sender.email.clone()).filter(|v| !v.trim().is_empty())
        });

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push(config.brevo.api_key_env.as_str());
        }
        if sender_name.is_none() {
            missing.push(SENDER_NAME_ENV);
        }
        if sender_email.is_none() {
            missing.push(SENDER_EMAIL_ENV);
        }
        if !missing.is_empty() {
            return Err(ContactSyncError::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        let base_url = validate_base_url(&config.brevo.base_url)?;

        if config.brevo.page_size == 0 || config.brevo.folder_page_size == 0 {
            return Err(ContactSyncError::config("page sizes must be positive"));
        }
        if config.brevo.timeout_secs == 0 {
            return Err(ContactSyncError::config("request timeout must be positive"));
        }

        Ok(Self {
            remote: RemoteSettings {
                base_url,
                api_key: ApiKey::new(api_key.unwrap_or_default()),
                timeout: Duration::from_secs(config.brevo.timeout_secs),
            },
            sender: SenderIdentity {
                name: sender_name.unwrap_or_default(),
                email: sender_email.unwrap_or_default(),
            },
            page_size: config.brevo.page_size,
            page_delay: Duration::from_millis(config.brevo.page_delay_ms),
            folder_page_size: config.brevo.folder_page_size,
            folder_name: config.campaign.folder_name.clone(),
            list_name_prefix: config.campaign.list_name_prefix.clone(),
            campaign_name_prefix: config.campaign.campaign_name_prefix.clone(),
            subject: config.campaign.subject.clone(),
            template_path: PathBuf::from(&config.campaign.template_path),
        })
    }
}

fn validate_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| ContactSyncError::config(format!("invalid base_url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ContactSyncError::config(format!(
            "base_url must be http or https, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contactsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContactSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contactsync/contactsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContactSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContactSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContactSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContactSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContactSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
