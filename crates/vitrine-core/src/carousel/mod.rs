//! Autoplaying media carousel
//!
//! - `media` - slide sources
//! - `state` - per-mount carousel state and readiness flags
//! - `timer` - the single autoplay interval and the settle deadline
//! - `controller` - `Carousel`, the state machine and its reconcile step
//! - `preference` - reduced-motion preference sensor
//! - `preloader` - detached load probes reporting over mpsc
//! - `render` - pure state -> frame mapping
//! - `service` - the event loop that drives one carousel

pub mod controller;
pub mod media;
pub mod preference;
pub mod preloader;
pub mod render;
pub mod service;
pub mod state;
pub mod timer;

pub use controller::{Carousel, CarouselOptions};
pub use media::{MediaItem, MediaSource};
pub use preference::MotionPreference;
pub use preloader::{probe, spawn_preload, DefaultLoader, MediaLoader, PreloadReport};
pub use render::{render, Indicator, PlaceholderKind, SlideContent, SlideFrame, SlideView};
pub use service::{CarouselCommand, CarouselEvent, CarouselService, CarouselSnapshot};
pub use state::{CarouselState, Phase, Readiness};
pub use timer::{AutoplayTimer, TimerEvent};
