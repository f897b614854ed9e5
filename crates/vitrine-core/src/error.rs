use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid media source: {0}")]
    InvalidMedia(String),

    #[error("Slide {index} is out of range (carousel has {len} slides)")]
    SlideOutOfRange { index: usize, len: usize },

    #[error("Failed to load media: {0}")]
    MediaLoad(String),
}

pub type Result<T> = std::result::Result<T, Error>;
