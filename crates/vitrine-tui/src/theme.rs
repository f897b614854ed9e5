//! Colour palettes
//!
//! Three built-in palettes selected by name, plus per-colour hex overrides
//! from `[ui.colors]`.

use ratatui::style::Color;
use vitrine_core::config::{ColorOverrides, UiConfig};

/// Runtime theme with configurable colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub placeholder: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        dark()
    }
}

pub fn dark() -> Theme {
    Theme {
        background: Color::Rgb(0x1d, 0x20, 0x21),
        surface: Color::Rgb(0x32, 0x30, 0x2f),
        foreground: Color::Rgb(0xd4, 0xbe, 0x98),
        muted: Color::Rgb(0x92, 0x83, 0x74),
        accent: Color::Rgb(0x89, 0xb4, 0x82),
        placeholder: Color::Rgb(0xd8, 0xa6, 0x57),
        error: Color::Rgb(0xea, 0x69, 0x62),
    }
}

pub fn light() -> Theme {
    Theme {
        background: Color::Rgb(0xfb, 0xf1, 0xc7),
        surface: Color::Rgb(0xeb, 0xdb, 0xb2),
        foreground: Color::Rgb(0x3c, 0x38, 0x36),
        muted: Color::Rgb(0x7c, 0x6f, 0x64),
        accent: Color::Rgb(0x42, 0x7b, 0x58),
        placeholder: Color::Rgb(0xb5, 0x76, 0x14),
        error: Color::Rgb(0x9d, 0x00, 0x06),
    }
}

pub fn nord() -> Theme {
    Theme {
        background: Color::Rgb(0x2e, 0x34, 0x40),
        surface: Color::Rgb(0x3b, 0x42, 0x52),
        foreground: Color::Rgb(0xec, 0xef, 0xf4),
        muted: Color::Rgb(0x81, 0xa1, 0xc1),
        accent: Color::Rgb(0x88, 0xc0, 0xd0),
        placeholder: Color::Rgb(0xeb, 0xcb, 0x8b),
        error: Color::Rgb(0xbf, 0x61, 0x6a),
    }
}

/// Parse a hex color string into a ratatui Color
/// Accepts formats: "#RRGGBB", "RRGGBB", "#RGB", "RGB"
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn apply_overrides(mut theme: Theme, overrides: &ColorOverrides) -> Theme {
    let slots: [(&Option<String>, &mut Color); 6] = [
        (&overrides.background, &mut theme.background),
        (&overrides.foreground, &mut theme.foreground),
        (&overrides.accent, &mut theme.accent),
        (&overrides.muted, &mut theme.muted),
        (&overrides.placeholder, &mut theme.placeholder),
        (&overrides.error, &mut theme.error),
    ];

    for (value, slot) in slots {
        if let Some(hex) = value {
            match parse_hex_color(hex) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid colour override: {}", hex),
            }
        }
    }
    theme
}

/// Load a theme by name from config
pub fn load_theme(config: &UiConfig) -> Theme {
    let base = match config.theme.to_lowercase().as_str() {
        "light" => light(),
        "nord" => nord(),
        "dark" => dark(),
        other => {
            tracing::warn!("Unknown theme '{}', using dark", other);
            dark()
        }
    };

    apply_overrides(base, &config.colors)
}
