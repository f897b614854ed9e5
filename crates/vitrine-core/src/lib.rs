pub mod carousel;
pub mod config;
pub mod error;

pub use carousel::{
    Carousel, CarouselCommand, CarouselEvent, CarouselOptions, CarouselService, CarouselState,
    MediaItem, MotionPreference, Phase,
};
pub use config::AppConfig;
pub use error::{Error, Result};
