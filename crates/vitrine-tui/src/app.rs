use ratatui::layout::Rect;
use ratatui::text::Line;
use vitrine_core::carousel::{CarouselEvent, CarouselSnapshot};

use crate::hover::{contains, HoverTracker};
use crate::theme::Theme;

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Screen regions from the last draw, used for mouse hit testing
#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
    /// Slide plus indicator bar; hovering here pauses autoplay
    pub container: Rect,
    /// Slide image area
    pub slide: Rect,
    /// One cell per indicator dot, in slide order
    pub indicators: Vec<Rect>,
}

/// Halfblock rendering of the active slide, reused until the slide or
/// the area changes
pub(crate) struct RenderedImage {
    pub key: (u64, usize, u16, u16),
    pub lines: Vec<Line<'static>>,
}

pub struct App {
    pub snapshot: CarouselSnapshot,
    pub theme: Theme,
    pub hover: HoverTracker,
    pub layout: FrameLayout,
    /// Indicator focused for keyboard activation
    pub focused_indicator: Option<usize>,
    pub status_message: Option<String>,
    pub should_quit: bool,
    spinner_frame: usize,
    pub(crate) image_cache: Option<RenderedImage>,
}

impl App {
    pub fn new(snapshot: CarouselSnapshot, theme: Theme) -> Self {
        Self {
            snapshot,
            theme,
            hover: HoverTracker::new(),
            layout: FrameLayout::default(),
            focused_indicator: None,
            status_message: None,
            should_quit: false,
            spinner_frame: 0,
            image_cache: None,
        }
    }

    /// Take a newer snapshot from the carousel service
    pub fn set_snapshot(&mut self, snapshot: CarouselSnapshot) {
        if snapshot.generation != self.snapshot.generation {
            self.image_cache = None;
        }
        if self
            .focused_indicator
            .is_some_and(|i| i >= snapshot.items.len())
        {
            self.focused_indicator = None;
        }
        self.snapshot = snapshot;
    }

    pub fn slide_count(&self) -> usize {
        self.snapshot.items.len()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.spinner_frame]
    }

    pub fn focus_next_indicator(&mut self) {
        let count = self.slide_count();
        if count == 0 {
            return;
        }
        self.focused_indicator = Some(self.focused_indicator.map(|i| (i + 1) % count).unwrap_or(0));
    }

    pub fn focus_prev_indicator(&mut self) {
        let count = self.slide_count();
        if count == 0 {
            return;
        }
        self.focused_indicator = Some(
            self.focused_indicator
                .map(|i| if i == 0 { count - 1 } else { i - 1 })
                .unwrap_or(count - 1),
        );
    }

    /// Indicator under a mouse position
    pub fn indicator_at(&self, column: u16, row: u16) -> Option<usize> {
        self.layout
            .indicators
            .iter()
            .position(|area| contains(*area, column, row))
    }

    /// Surface service notifications in the status bar
    pub fn handle_carousel_event(&mut self, event: &CarouselEvent) {
        match event {
            CarouselEvent::Error { message } => self.set_status(message.clone()),
            CarouselEvent::MediaSettled { index, ok: false } => {
                let label = self
                    .snapshot
                    .items
                    .get(*index)
                    .map(|item| item.label())
                    .unwrap_or_default();
                self.set_status(format!("Slide {} ({}) failed to load", index + 1, label));
            }
            CarouselEvent::Selected { .. } => self.clear_status(),
            _ => {}
        }
    }
}
