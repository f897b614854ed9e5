use tokio::sync::watch;
use tracing::debug;

use crate::config::{MotionConfig, MotionMode};

/// Environment variables consulted in `auto` mode, in order
const MOTION_ENV_VARS: &[&str] = &["VITRINE_REDUCED_MOTION", "REDUCE_MOTION"];

/// Host reduced-motion preference.
///
/// Publishes on a watch channel; subscribers see every change. Publishing
/// the current value again does not wake anyone.
pub struct MotionPreference {
    tx: watch::Sender<bool>,
}

impl MotionPreference {
    pub fn new(reduced: bool) -> Self {
        let (tx, _) = watch::channel(reduced);
        Self { tx }
    }

    /// Resolve the initial preference from config and environment
    pub fn detect(config: &MotionConfig) -> Self {
        let reduced = detect_reduced_motion(config.reduced_motion, |name| std::env::var(name).ok());
        debug!("Reduced motion detected: {}", reduced);
        Self::new(reduced)
    }

    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Publish a new value. Returns true if it changed.
    pub fn set(&self, reduced: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == reduced {
                false
            } else {
                *current = reduced;
                true
            }
        })
    }

    /// Flip the preference; returns the new value
    pub fn toggle(&self) -> bool {
        let next = !self.current();
        self.set(next);
        next
    }
}

/// `auto` asks the environment; anything missing or unreadable means
/// "no preference", i.e. motion allowed.
pub fn detect_reduced_motion<F>(mode: MotionMode, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match mode {
        MotionMode::On => true,
        MotionMode::Off => false,
        MotionMode::Auto => MOTION_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).and_then(|value| parse_flag(&value)))
            .unwrap_or(false),
    }
}

/// Parse a boolean-ish environment value
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "reduce" => Some(true),
        "0" | "false" | "no" | "off" | "no-preference" => Some(false),
        _ => None,
    }
}
