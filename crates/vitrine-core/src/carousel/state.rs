use std::sync::Arc;

use image::DynamicImage;

/// Per-slide load status written by the preloader
#[derive(Debug, Clone, Default)]
pub enum Readiness {
    /// Probe still in flight (or hung)
    #[default]
    Pending,
    /// Image decoded and ready to draw
    Ready(Arc<DynamicImage>),
    /// Probe settled with an error; drawn as a placeholder
    Failed(String),
}

impl Readiness {
    /// Settled either way. Failures count so the UI never waits forever.
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Readiness::Pending)
    }

    #[inline]
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            Readiness::Ready(image) => Some(image),
            _ => None,
        }
    }
}

/// Coarse carousel state, derived from `CarouselState` and the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No autoplay timer scheduled
    Idle,
    /// Timer scheduled, slide at rest
    Running,
    /// A slide change is settling
    Transitioning,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running => write!(f, "playing"),
            Phase::Transitioning => write!(f, "transitioning"),
        }
    }
}

/// Mutable state of one mounted carousel.
///
/// `readiness` always has one entry per slide and `current_index` is
/// always a valid index when there is at least one slide.
#[derive(Debug, Clone)]
pub struct CarouselState {
    pub current_index: usize,
    pub is_playing: bool,
    pub is_transitioning: bool,
    pub readiness: Vec<Readiness>,
}

impl CarouselState {
    pub fn new(len: usize, is_playing: bool) -> Self {
        Self {
            current_index: 0,
            is_playing,
            is_transitioning: false,
            readiness: vec![Readiness::Pending; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readiness.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readiness.is_empty()
    }

    /// One flag per slide: true once its probe has settled
    pub fn loaded_flags(&self) -> Vec<bool> {
        self.readiness.iter().map(Readiness::is_settled).collect()
    }

    /// Number of slides whose probe has settled
    pub fn settled_count(&self) -> usize {
        self.readiness.iter().filter(|r| r.is_settled()).count()
    }

    /// Move to the next slide, wrapping at the end
    pub(crate) fn advance(&mut self) {
        if !self.is_empty() {
            self.current_index = (self.current_index + 1) % self.len();
        }
    }

    pub(crate) fn set_readiness(&mut self, index: usize, readiness: Readiness) -> bool {
        match self.readiness.get_mut(index) {
            Some(slot) => {
                *slot = readiness;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_pending() {
        let state = CarouselState::new(3, true);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.loaded_flags(), vec![false, false, false]);
        assert_eq!(state.settled_count(), 0);
    }

    #[test]
    fn test_advance_wraps() {
        let mut state = CarouselState::new(3, true);
        let seen: Vec<usize> = (0..4)
            .map(|_| {
                state.advance();
                state.current_index
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_advance_on_empty_is_noop() {
        let mut state = CarouselState::new(0, true);
        state.advance();
        assert_eq!(state.current_index, 0);
    }

    #[test]
    fn test_failed_counts_as_settled() {
        let mut state = CarouselState::new(2, true);
        assert!(state.set_readiness(1, Readiness::Failed("404".to_string())));
        assert!(!state.set_readiness(5, Readiness::Failed("nope".to_string())));
        assert_eq!(state.loaded_flags(), vec![false, true]);
        assert!(state.readiness[1].image().is_none());
    }
}
