use std::sync::Arc;

use image::DynamicImage;

use super::media::MediaItem;
use super::state::{CarouselState, Readiness};

/// Why a slide shows a placeholder instead of its image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Probe not settled yet
    Loading,
    /// Probe settled with an error
    Broken(String),
}

#[derive(Debug, Clone)]
pub enum SlideContent {
    Image(Arc<DynamicImage>),
    Placeholder(PlaceholderKind),
}

#[derive(Debug, Clone)]
pub struct SlideView {
    pub index: usize,
    pub label: String,
    pub visible: bool,
    pub content: SlideContent,
}

/// Per-slide selector control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub index: usize,
    pub label: String,
    pub active: bool,
}

/// Everything a host needs to draw one frame
#[derive(Debug, Clone)]
pub struct SlideFrame {
    pub slides: Vec<SlideView>,
    pub indicators: Vec<Indicator>,
    pub transitioning: bool,
    pub playing: bool,
}

impl SlideFrame {
    /// The single visible slide, if any
    pub fn active(&self) -> Option<&SlideView> {
        self.slides.iter().find(|s| s.visible)
    }
}

/// Map state to visual output. Pure: same input, same frame.
pub fn render(state: &CarouselState, items: &[MediaItem]) -> SlideFrame {
    let slides = items
        .iter()
        .zip(&state.readiness)
        .enumerate()
        .map(|(index, (item, readiness))| SlideView {
            index,
            label: item.label(),
            visible: index == state.current_index,
            content: match readiness {
                Readiness::Pending => SlideContent::Placeholder(PlaceholderKind::Loading),
                Readiness::Ready(image) => SlideContent::Image(Arc::clone(image)),
                Readiness::Failed(reason) => {
                    SlideContent::Placeholder(PlaceholderKind::Broken(reason.clone()))
                }
            },
        })
        .collect::<Vec<_>>();

    let indicators = slides
        .iter()
        .map(|slide| Indicator {
            index: slide.index,
            label: slide.label.clone(),
            active: slide.visible,
        })
        .collect();

    SlideFrame {
        slides,
        indicators,
        transitioning: state.is_transitioning,
        playing: state.is_playing,
    }
}
