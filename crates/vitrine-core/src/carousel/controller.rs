use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::media::MediaItem;
use super::preloader::PreloadReport;
use super::state::{CarouselState, Phase};
use super::timer::{AutoplayTimer, TimerEvent};
use crate::{Error, Result};

// Unique across instances so a report can never land in the wrong mount
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Construction options for a carousel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselOptions {
    /// Autoplay interval
    pub interval: Duration,
    /// Transition settle delay (clamped to `interval`)
    pub settle: Duration,
    /// Play on mount
    pub autoplay: bool,
    /// Pause while hovered
    pub pause_on_hover: bool,
    /// Stop autoplay when reduced motion is requested
    pub respect_reduced_motion: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(4000),
            settle: Duration::from_millis(1000),
            autoplay: true,
            pause_on_hover: true,
            respect_reduced_motion: true,
        }
    }
}

impl CarouselOptions {
    /// Settle delay actually used; never longer than one interval so
    /// transitions cannot overlap.
    #[inline]
    pub fn effective_settle(&self) -> Duration {
        self.settle.min(self.interval)
    }
}

/// A mounted carousel: owns its state and its autoplay timer.
///
/// All mutation goes through the methods below. Whenever one of the three
/// autoplay inputs changes (`is_playing`, reduced motion, slide count) the
/// timer is re-evaluated by [`Carousel::reconcile`].
pub struct Carousel {
    items: Arc<[MediaItem]>,
    options: CarouselOptions,
    state: CarouselState,
    timer: AutoplayTimer,
    reduced_motion: bool,
    hovered: bool,
    generation: u64,
    torn_down: bool,
}

impl Carousel {
    /// Mount a carousel over `items`. Must be called inside a tokio runtime.
    pub fn mount(items: Arc<[MediaItem]>, options: CarouselOptions, reduced_motion: bool) -> Self {
        let timer = AutoplayTimer::new(options.interval, options.effective_settle());
        let state = CarouselState::new(items.len(), options.autoplay);

        let mut carousel = Self {
            items,
            options,
            state,
            timer,
            reduced_motion,
            hovered: false,
            generation: next_generation(),
            torn_down: false,
        };

        info!(
            "Carousel mounted: {} slides, generation {}, reduced_motion={}",
            carousel.items.len(),
            carousel.generation,
            reduced_motion
        );
        carousel.reconcile();
        carousel
    }

    /// Whether the autoplay timer may run right now
    pub fn autoplay_allowed(&self) -> bool {
        let motion_blocked = self.options.respect_reduced_motion && self.reduced_motion;
        self.state.is_playing && !motion_blocked && self.items.len() > 1
    }

    /// Stop the timer and restart it only if autoplay is allowed.
    /// Safe to call any number of times; at most one interval is ever live.
    pub fn reconcile(&mut self) {
        if self.torn_down {
            return;
        }

        self.timer.stop();
        if self.autoplay_allowed() {
            self.timer.start();
        }
        debug!("Reconciled autoplay: running={}", self.timer.is_running());
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing != playing {
            self.state.is_playing = playing;
            self.reconcile();
        }
    }

    fn begin_transition(&mut self) {
        self.state.is_transitioning = true;
        self.timer.begin_settle();
    }

    /// Autoplay step: advance with wraparound and start a transition
    pub fn tick(&mut self) {
        if self.torn_down || self.items.is_empty() {
            return;
        }
        self.state.advance();
        self.begin_transition();
        debug!("Advanced to slide {}", self.state.current_index);
    }

    /// Manual navigation to slide `index`
    pub fn select(&mut self, index: usize) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        if index >= self.items.len() {
            return Err(Error::SlideOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        self.state.current_index = index;
        self.begin_transition();
        debug!("Selected slide {}", index);
        Ok(())
    }

    pub fn select_next(&mut self) -> Result<()> {
        match self.items.len() {
            0 => Ok(()),
            len => self.select((self.state.current_index + 1) % len),
        }
    }

    pub fn select_previous(&mut self) -> Result<()> {
        match self.items.len() {
            0 => Ok(()),
            len => self.select((self.state.current_index + len - 1) % len),
        }
    }

    /// End of the settle delay
    pub fn settle(&mut self) {
        self.state.is_transitioning = false;
    }

    pub fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick => self.tick(),
            TimerEvent::Settled => self.settle(),
        }
    }

    /// Wait for the timer; see [`AutoplayTimer::next`]
    pub async fn next_timer_event(&mut self) -> TimerEvent {
        self.timer.next().await
    }

    pub fn pointer_enter(&mut self) {
        if self.torn_down {
            return;
        }
        self.hovered = true;
        if self.options.pause_on_hover {
            self.set_playing(false);
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.torn_down {
            return;
        }
        self.hovered = false;
        if self.options.pause_on_hover {
            self.set_playing(self.options.autoplay);
        }
    }

    /// Record a reduced-motion change from the host
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if self.torn_down || self.reduced_motion == reduced {
            return;
        }
        info!("Reduced motion preference changed: {}", reduced);
        self.reduced_motion = reduced;
        self.reconcile();
    }

    /// Swap the slide sequence. A different sequence remounts: fresh state,
    /// new generation, timer re-evaluated. Returns true when remounted.
    pub fn replace_items(&mut self, items: Arc<[MediaItem]>) -> bool {
        if Arc::ptr_eq(&self.items, &items) {
            return false;
        }

        self.timer.shutdown();
        let paused_by_hover = self.hovered && self.options.pause_on_hover;
        self.state = CarouselState::new(items.len(), self.options.autoplay && !paused_by_hover);
        self.items = items;
        self.generation = next_generation();
        self.torn_down = false;

        info!(
            "Carousel remounted: {} slides, generation {}",
            self.items.len(),
            self.generation
        );
        self.reconcile();
        true
    }

    /// Store a preload result. Reports from another generation, or arriving
    /// after teardown, are dropped. Returns true when applied.
    pub fn apply_preload(&mut self, report: PreloadReport) -> bool {
        if self.torn_down || report.generation != self.generation {
            debug!(
                "Dropping stale preload report for slide {} (generation {})",
                report.index, report.generation
            );
            return false;
        }
        self.state.set_readiness(report.index, report.outcome)
    }

    /// Cancel all timers and invalidate in-flight preloads. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.timer.shutdown();
        self.state.is_transitioning = false;
        self.generation = next_generation();
        self.torn_down = true;
        info!("Carousel torn down");
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_transitioning {
            Phase::Transitioning
        } else if self.timer.is_running() {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    pub fn state(&self) -> &CarouselState {
        &self.state
    }

    pub fn items(&self) -> &Arc<[MediaItem]> {
        &self.items
    }

    pub fn options(&self) -> &CarouselOptions {
        &self.options
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn timer_arm_count(&self) -> u64 {
        self.timer.arm_count()
    }
}
