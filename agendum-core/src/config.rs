//! Settings for agendum.
//!
//! Read from `~/.config/agendum/config.toml`, then overridden by `AGENDUM_*`
//! environment variables (nested keys use `__`, e.g. `AGENDUM_CALDAV__PASSWORD`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use crate::error::{AgendumError, AgendumResult};
use crate::event::BuildOptions;
use crate::store::LocalStore;

static DEFAULT_DATA_DIR: &str = "~/.local/share/agendum";
static DEFAULT_TIMEZONE: &str = "Europe/Berlin";
static DEFAULT_DURATION: &str = "1h";
static DEFAULT_REQUEST_TIMEOUT: &str = "30s";
static DEFAULT_LOG_LEVEL: &str = "info";

/// Settings as they appear in the file / environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default = "default_duration")]
    default_duration: String,
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    caldav: RawCalDav,
}

#[derive(Debug, Default, Deserialize)]
struct RawCalDav {
    #[serde(default)]
    url: String,
    #[serde(default)]
    account: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    request_timeout: Option<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_duration() -> String {
    DEFAULT_DURATION.to_string()
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Connection settings for the CalDAV remote.
#[derive(Clone, PartialEq, Eq)]
pub struct CalDavSettings {
    pub url: String,
    pub account: String,
    pub password: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for CalDavSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalDavSettings")
            .field("url", &self.url)
            .field("account", &self.account)
            .field("password", &"********")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub timezone: Tz,
    pub default_duration: chrono::Duration,
    pub data_dir: PathBuf,
    pub log_level: String,
    /// `None` when no CalDAV password is configured; remote sync is then skipped.
    pub caldav: Option<CalDavSettings>,
}

impl Settings {
    pub fn config_path() -> AgendumResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendumError::Config("Could not determine config directory".into()))?
            .join("agendum");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default config path, creating a commented template on first run.
    pub fn load() -> AgendumResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> AgendumResult<Self> {
        Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
    }

    /// Parse settings from a TOML string (environment still applies).
    pub fn from_toml_str(toml: &str) -> AgendumResult<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> AgendumResult<Self> {
        let raw: RawSettings = builder
            .add_source(
                Environment::with_prefix("AGENDUM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| AgendumError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendumError::Config(e.to_string()))?;

        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> AgendumResult<Self> {
        let timezone: Tz = raw
            .timezone
            .parse()
            .map_err(|_| AgendumError::Config(format!("Unknown timezone '{}'", raw.timezone)))?;

        let default_duration = parse_duration("default_duration", &raw.default_duration)?;
        let default_duration = chrono::Duration::from_std(default_duration)
            .map_err(|_| AgendumError::Config("default_duration is too large".into()))?;

        let data_dir = PathBuf::from(shellexpand::tilde(&raw.data_dir).into_owned());

        let caldav = if raw.caldav.password.is_empty() {
            None
        } else {
            if raw.caldav.account.is_empty() {
                return Err(AgendumError::Config(
                    "caldav.account is required when caldav.password is set".into(),
                ));
            }
            let request_timeout = parse_duration(
                "caldav.request_timeout",
                raw.caldav
                    .request_timeout
                    .as_deref()
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            )?;
            let url = if raw.caldav.url.is_empty() {
                default_caldav_url(&raw.caldav.account)
            } else {
                raw.caldav.url
            };
            Some(CalDavSettings {
                url,
                account: raw.caldav.account,
                password: raw.caldav.password,
                request_timeout,
            })
        };

        Ok(Settings {
            timezone,
            default_duration,
            data_dir,
            log_level: raw.log_level,
            caldav,
        })
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            timezone: self.timezone,
            default_duration: self.default_duration,
        }
    }

    /// Directory of the local fallback store.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("events")
    }

    /// Open the local fallback store under `data_dir`.
    pub fn open_store(&self) -> AgendumResult<LocalStore> {
        Ok(LocalStore::open(self.store_dir())?)
    }

    /// File holding the persisted decision log.
    pub fn decisions_path(&self) -> PathBuf {
        self.data_dir.join("decisions.json")
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendumResult<()> {
        let contents = format!(
            "\
# agendum configuration

# Timezone new events are created in:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Length of new events:
# default_duration = \"{DEFAULT_DURATION}\"

# Where events are kept when the remote calendar is unavailable:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# log_level = \"{DEFAULT_LOG_LEVEL}\"

[caldav]
# url = \"https://caldav.example.com/dav/you@example.com/calendar/\"
# account = \"you@example.com\"
# App password for the calendar (prefer AGENDUM_CALDAV__PASSWORD):
# password = \"\"
# request_timeout = \"{DEFAULT_REQUEST_TIMEOUT}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgendumError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendumError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

/// GMX-style calendar URL, used when only the account is configured.
fn default_caldav_url(account: &str) -> String {
    format!("https://caldav.gmx.net/begenda/dav/{account}/calendar/")
}

fn parse_duration(key: &str, value: &str) -> AgendumResult<Duration> {
    let duration = humantime::parse_duration(value)
        .map_err(|e| AgendumError::Config(format!("Invalid {key} '{value}': {e}")))?;
    if duration.is_zero() {
        return Err(AgendumError::Config(format!("{key} must be positive")));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn defaults_without_caldav() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(settings.default_duration, chrono::Duration::hours(1));
        assert!(settings.data_dir.ends_with(".local/share/agendum"));
        assert!(!settings.data_dir.starts_with("~"));
    }

    #[test]
    fn caldav_section() {
        let settings = Settings::from_toml_str(
            r#"
timezone = "America/New_York"
default_duration = "45m"
data_dir = "/tmp/agendum"

[caldav]
url = "https://dav.example.com/cal/"
account = "me@example.com"
password = "secret"
request_timeout = "5s"
"#,
        )
        .unwrap();

        assert_eq!(settings.timezone, chrono_tz::America::New_York);
        assert_eq!(settings.default_duration, chrono::Duration::minutes(45));
        assert_eq!(settings.store_dir(), PathBuf::from("/tmp/agendum/events"));

        let caldav = settings.caldav.unwrap();
        assert_eq!(caldav.url, "https://dav.example.com/cal/");
        assert_eq!(caldav.request_timeout, Duration::from_secs(5));
        assert!(!format!("{caldav:?}").contains("secret"));
    }

    #[test]
    fn caldav_url_defaults_from_account() {
        let settings = Settings::from_toml_str(
            "[caldav]\naccount = \"me@gmx.de\"\npassword = \"pw\"\n",
        )
        .unwrap();
        let caldav = settings.caldav.unwrap();
        assert_eq!(caldav.url, "https://caldav.gmx.net/begenda/dav/me@gmx.de/calendar/");
        assert_eq!(caldav.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = Settings::from_toml_str("timezone = \"Mars/Olympus\"").unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(Settings::from_toml_str("default_duration = \"0s\"").is_err());
    }

    #[test]
    fn password_without_account_is_an_error() {
        assert!(Settings::from_toml_str("[caldav]\npassword = \"pw\"\n").is_err());
    }

    #[test]
    fn open_store_creates_events_dir() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!("data_dir = '{}'", dir.path().display());
        let settings = Settings::from_toml_str(&toml).unwrap();

        let store = settings.open_store().unwrap();
        assert_eq!(store.dir(), settings.store_dir());
        assert!(settings.store_dir().is_dir());
    }

    #[test]
    fn open_store_reports_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let toml = format!("data_dir = '{}'", blocker.display());
        let settings = Settings::from_toml_str(&toml).unwrap();

        assert!(matches!(
            settings.open_store(),
            Err(AgendumError::Storage(StorageError::Io { .. }))
        ));
    }

    #[test]
    fn default_config_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agendum").join("config.toml");
        Settings::create_default_config(&path).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
    }
}
