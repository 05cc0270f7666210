//! Persisted application configuration

use crate::core::media::Quality;
use crate::error::GrabError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Per-site extraction hints, keyed by host in [`AppConfig::site_hints`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteHints {
    /// Regex whose first capture group is the AJAX nonce
    pub token_pattern: Option<String>,
    /// Regex whose first capture group is the post id
    pub post_id_pattern: Option<String>,
    /// Absolute AJAX endpoint
    pub ajax_url: Option<String>,
    /// Hosts whose iframes are treated as player frames
    pub player_hosts: Vec<String>,
}

/// Settings stored in the JSON configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving finished downloads and scratch directories
    pub download_dir: PathBuf,
    /// Default quality ("auto", "720p", ...)
    pub default_quality: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Retries for page and segment requests
    pub max_retries: u32,
    /// User-Agent override
    pub user_agent: Option<String>,
    /// Extraction hints by site host
    pub site_hints: BTreeMap<String, SiteHints>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./downloads"),
            default_quality: "auto".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            user_agent: None,
            site_hints: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults, which are written to `path`.
    /// An unreadable or malformed file yields the defaults and is left untouched.
    pub fn load_or_init(path: &Path) -> Result<Self, GrabError> {
        if !path.exists() {
            info!("No configuration at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(GrabError::from)
            .and_then(|text| serde_json::from_str::<AppConfig>(&text).map_err(GrabError::from));

        match loaded {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring configuration at {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Write configuration as pretty JSON, replacing `path` atomically
    pub fn save(&self, path: &Path) -> Result<(), GrabError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp_path, path)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Parsed default quality
    pub fn quality(&self) -> Result<Quality, GrabError> {
        Quality::parse(&self.default_quality)
    }

    /// HTTP timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Look up hints for `host`, ignoring a leading `www.` on either side
pub fn hints_for_host<'a>(
    site_hints: &'a BTreeMap<String, SiteHints>,
    host: &str,
) -> Option<&'a SiteHints> {
    let host = host.trim_start_matches("www.");
    site_hints.iter().find_map(|(site, hints)| {
        let site = site.trim_start_matches("www.");
        (host == site || host.ends_with(&format!(".{}", site))).then_some(hints)
    })
}

/// Configuration bound to its file; every setter rewrites the file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    /// Open the store, creating the file with defaults when missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GrabError> {
        let path = path.into();
        let config = AppConfig::load_or_init(&path)?;
        Ok(Self { path, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_download_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), GrabError> {
        self.config.download_dir = dir.into();
        self.config.save(&self.path)
    }

    pub fn set_default_quality(&mut self, quality: Quality) -> Result<(), GrabError> {
        self.config.default_quality = quality.to_string();
        self.config.save(&self.path)
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), GrabError> {
        self.config.timeout_secs = timeout.as_secs().max(1);
        self.config.save(&self.path)
    }

    pub fn set_max_retries(&mut self, retries: u32) -> Result<(), GrabError> {
        self.config.max_retries = retries;
        self.config.save(&self.path)
    }

    pub fn set_user_agent(&mut self, user_agent: Option<String>) -> Result<(), GrabError> {
        self.config.user_agent = user_agent;
        self.config.save(&self.path)
    }

    pub fn set_site_hints(&mut self, host: &str, hints: SiteHints) -> Result<(), GrabError> {
        self.config.site_hints.insert(host.to_string(), hints);
        self.config.save(&self.path)
    }
}
