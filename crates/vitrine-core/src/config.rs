use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::carousel::{CarouselOptions, MediaItem};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file lives here)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Autoplay interval in milliseconds
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// How long a slide change stays in the transitioning state
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
    /// Start playing on mount
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Pause autoplay while the pointer is over the carousel
    #[serde(default = "default_true")]
    pub pause_on_hover: bool,
    /// Honour the reduced-motion preference
    #[serde(default = "default_true")]
    pub respect_reduced_motion: bool,
    /// Slides, in display order
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            settle_ms: default_settle(),
            autoplay: default_true(),
            pause_on_hover: default_true(),
            respect_reduced_motion: default_true(),
            items: Vec::new(),
        }
    }
}

/// A configured slide.
/// Can be written as a bare source string or as a table with a caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemConfig {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

// Accept either "path/or/url" or { source = "...", caption = "..." }
impl<'de> Deserialize<'de> for ItemConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};
        use std::fmt;

        struct ItemConfigVisitor;

        impl<'de> Visitor<'de> for ItemConfigVisitor {
            type Value = ItemConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a media source string or a map with 'source' and optional 'caption'")
            }

            fn visit_str<E>(self, value: &str) -> Result<ItemConfig, E>
            where
                E: de::Error,
            {
                Ok(ItemConfig {
                    source: value.to_string(),
                    caption: None,
                })
            }

            fn visit_map<M>(self, mut map: M) -> Result<ItemConfig, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut source: Option<String> = None;
                let mut caption: Option<String> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "source" => source = Some(map.next_value()?),
                        "caption" => caption = Some(map.next_value()?),
                        _ => {
                            let _: de::IgnoredAny = map.next_value()?;
                        }
                    }
                }

                Ok(ItemConfig {
                    source: source.ok_or_else(|| de::Error::missing_field("source"))?,
                    caption,
                })
            }
        }

        deserializer.deserialize_any(ItemConfigVisitor)
    }
}

/// Where the reduced-motion preference comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    /// Ask the host environment
    #[default]
    Auto,
    /// Always reduce motion
    On,
    /// Never reduce motion
    Off,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub reduced_motion: MotionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Give up on a single probe after this many seconds (0 = wait forever)
    #[serde(default)]
    pub probe_timeout_secs: u64,
    /// User-Agent sent with remote media requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            probe_timeout_secs: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl LoaderConfig {
    pub fn probe_timeout(&self) -> Option<Duration> {
        (self.probe_timeout_secs > 0).then(|| Duration::from_secs(self.probe_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Theme name: "dark", "light" or "nord"
    #[serde(default = "default_theme_name")]
    pub theme: String,
    /// Optional colour overrides applied on top of the theme
    #[serde(default)]
    pub colors: ColorOverrides,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            theme: default_theme_name(),
            colors: ColorOverrides::default(),
        }
    }
}

/// Each colour is a hex string (e.g., "#ff0000" or "ff0000")
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorOverrides {
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub accent: Option<String>,
    pub muted: Option<String>,
    pub placeholder: Option<String>,
    pub error: Option<String>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vitrine")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    4000
}

fn default_settle() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("vitrine/{}", env!("CARGO_PKG_VERSION"))
}

fn default_tick_rate() -> u64 {
    100
}

fn default_theme_name() -> String {
    "dark".to_string()
}

/// Expand tilde (~) in path to user's home directory
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;

        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/vitrine/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("vitrine")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("vitrine.log")
    }

    /// Reject settings the carousel cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.carousel.interval_ms == 0 {
            return Err(crate::Error::Config(
                "carousel.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.ui.tick_rate_ms == 0 {
            return Err(crate::Error::Config(
                "ui.tick_rate_ms must be greater than zero".to_string(),
            ));
        }
        if self.carousel.settle_ms > self.carousel.interval_ms {
            tracing::warn!(
                "carousel.settle_ms ({}) exceeds interval_ms ({}); transitions will settle after {}ms",
                self.carousel.settle_ms,
                self.carousel.interval_ms,
                self.carousel.interval_ms
            );
        }
        Ok(())
    }

    /// Carousel options derived from the [carousel] section
    pub fn carousel_options(&self) -> CarouselOptions {
        CarouselOptions {
            interval: Duration::from_millis(self.carousel.interval_ms),
            settle: Duration::from_millis(self.carousel.settle_ms),
            autoplay: self.carousel.autoplay,
            pause_on_hover: self.carousel.pause_on_hover,
            respect_reduced_motion: self.carousel.respect_reduced_motion,
        }
    }

    /// Parse the configured slides
    pub fn media_items(&self) -> crate::Result<Vec<MediaItem>> {
        self.carousel
            .items
            .iter()
            .map(|item| MediaItem::parse(&item.source).map(|m| m.with_caption(item.caption.clone())))
            .collect()
    }
}
