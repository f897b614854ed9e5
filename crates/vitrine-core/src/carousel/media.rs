use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::config::expand_tilde;
use crate::{Error, Result};

/// Where a slide's image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Fetched over http(s)
    Remote(Url),
    /// Read from the local filesystem
    Local(PathBuf),
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Remote(url) => write!(f, "{}", url),
            MediaSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One slide in the carousel. Immutable once built; order in the
/// sequence is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub source: MediaSource,
    pub caption: Option<String>,
}

impl MediaItem {
    /// Parse a source string: http(s) URLs are remote, `file://` URLs and
    /// plain paths are local.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidMedia("empty source".to_string()));
        }

        // Something that claims to be a web address must parse as one
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self {
                source: MediaSource::Remote(Url::parse(raw)?),
                caption: None,
            });
        }

        let source = match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => MediaSource::Remote(url),
                "file" => MediaSource::Local(
                    url.to_file_path()
                        .map_err(|_| Error::InvalidMedia(raw.to_string()))?,
                ),
                // Windows drive letters parse as a one-letter scheme
                scheme if scheme.len() == 1 => MediaSource::Local(PathBuf::from(raw)),
                scheme => {
                    return Err(Error::InvalidMedia(format!(
                        "unsupported scheme '{}' in {}",
                        scheme, raw
                    )))
                }
            },
            Err(_) => MediaSource::Local(expand_tilde(std::path::Path::new(raw))),
        };

        Ok(Self {
            source,
            caption: None,
        })
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption.filter(|c| !c.trim().is_empty());
        self
    }

    /// Short human-readable name: the caption, else the file name
    pub fn label(&self) -> String {
        if let Some(ref caption) = self.caption {
            return caption.clone();
        }

        let name = match &self.source {
            MediaSource::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| url.host_str().map(str::to_string)),
            MediaSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        };

        name.unwrap_or_else(|| self.source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let item = MediaItem::parse("https://example.com/img/hero.jpg").unwrap();
        assert!(matches!(item.source, MediaSource::Remote(_)));
        assert_eq!(item.label(), "hero.jpg");
    }

    #[test]
    fn test_parse_local_path() {
        let item = MediaItem::parse("slides/scrap-metal.png").unwrap();
        assert_eq!(
            item.source,
            MediaSource::Local(PathBuf::from("slides/scrap-metal.png"))
        );
        assert_eq!(item.label(), "scrap-metal.png");
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown_scheme() {
        assert!(matches!(MediaItem::parse("   "), Err(Error::InvalidMedia(_))));
        assert!(matches!(
            MediaItem::parse("ftp://example.com/a.png"),
            Err(Error::InvalidMedia(_))
        ));
    }

    #[test]
    fn test_malformed_web_address_is_an_error() {
        assert!(matches!(MediaItem::parse("https://"), Err(Error::UrlParse(_))));
        assert!(matches!(MediaItem::parse("HTTP://"), Err(Error::UrlParse(_))));
    }

    #[test]
    fn test_caption_wins_over_file_name() {
        let item = MediaItem::parse("a.png")
            .unwrap()
            .with_caption(Some("Copper grades".to_string()));
        assert_eq!(item.label(), "Copper grades");

        let blank = MediaItem::parse("a.png").unwrap().with_caption(Some("  ".to_string()));
        assert_eq!(blank.caption, None);
    }

    #[test]
    fn test_label_falls_back_to_host() {
        let item = MediaItem::parse("https://example.com/").unwrap();
        assert_eq!(item.label(), "example.com");
    }
}
