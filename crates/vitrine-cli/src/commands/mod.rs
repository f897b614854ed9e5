pub mod config;
pub mod probe;
pub mod run;

use vitrine_core::{AppConfig, MediaItem};

/// Slides from the command line, or the configured ones when none are given
pub fn resolve_items(config: &AppConfig, items: &[String]) -> vitrine_core::Result<Vec<MediaItem>> {
    if items.is_empty() {
        config.media_items()
    } else {
        items.iter().map(|raw| MediaItem::parse(raw)).collect()
    }
}
