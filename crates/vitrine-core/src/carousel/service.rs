use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::controller::{Carousel, CarouselOptions};
use super::media::MediaItem;
use super::preloader::{spawn_preload, MediaLoader, PreloadReport};
use super::render::{render, SlideFrame};
use super::state::{CarouselState, Phase};
use super::timer::TimerEvent;

/// Host input for a running carousel
#[derive(Debug, Clone)]
pub enum CarouselCommand {
    /// Pointer entered the carousel area
    PointerEnter,
    /// Pointer left the carousel area
    PointerLeave,
    /// Show a specific slide
    Select(usize),
    /// Show the next slide (wraps)
    Next,
    /// Show the previous slide (wraps)
    Previous,
    /// Swap the slide sequence; a different sequence remounts
    ReplaceItems(Arc<[MediaItem]>),
}

/// Events emitted by the service to notify the UI of changes
#[derive(Debug, Clone)]
pub enum CarouselEvent {
    /// Autoplay moved to a new slide
    Advanced { index: usize },
    /// The user picked a slide
    Selected { index: usize },
    /// A transition finished
    Settled { index: usize },
    /// A slide's probe settled
    MediaSettled { index: usize, ok: bool },
    /// The autoplay timer started or stopped
    AutoplayChanged { running: bool },
    /// A command could not be applied
    Error { message: String },
}

/// Consistent copy of a carousel for the host to draw from
#[derive(Debug, Clone)]
pub struct CarouselSnapshot {
    pub state: CarouselState,
    pub items: Arc<[MediaItem]>,
    pub phase: Phase,
    pub hovered: bool,
    pub reduced_motion: bool,
    pub generation: u64,
}

impl CarouselSnapshot {
    fn capture(carousel: &Carousel) -> Self {
        Self {
            state: carousel.state().clone(),
            items: Arc::clone(carousel.items()),
            phase: carousel.phase(),
            hovered: carousel.is_hovered(),
            reduced_motion: carousel.reduced_motion(),
            generation: carousel.generation(),
        }
    }

    fn unmounted(items: Arc<[MediaItem]>, autoplay: bool, reduced_motion: bool) -> Self {
        Self {
            state: CarouselState::new(items.len(), autoplay),
            items,
            phase: Phase::Idle,
            hovered: false,
            reduced_motion,
            generation: 0,
        }
    }

    pub fn frame(&self) -> SlideFrame {
        render(&self.state, &self.items)
    }
}

/// Runs one carousel on a single task: timer, preference changes, host
/// commands and preload reports are all handled in one `select!` loop.
pub struct CarouselService {
    items: Arc<[MediaItem]>,
    options: CarouselOptions,
    loader: Arc<dyn MediaLoader>,
    probe_timeout: Option<Duration>,
    motion: watch::Receiver<bool>,
    event_tx: Option<mpsc::UnboundedSender<CarouselEvent>>,
    snapshot_tx: watch::Sender<CarouselSnapshot>,
}

impl CarouselService {
    /// Create a new carousel service
    pub fn new(
        items: Arc<[MediaItem]>,
        options: CarouselOptions,
        loader: Arc<dyn MediaLoader>,
        motion: watch::Receiver<bool>,
    ) -> Self {
        let initial =
            CarouselSnapshot::unmounted(Arc::clone(&items), options.autoplay, *motion.borrow());
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            items,
            options,
            loader,
            probe_timeout: None,
            motion,
            event_tx: None,
            snapshot_tx,
        }
    }

    /// Give up on individual probes after `timeout`
    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the event sender for UI notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<CarouselEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Receiver for state snapshots; updated after every change
    pub fn snapshot(&self) -> watch::Receiver<CarouselSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn send_event(&mut self, event: CarouselEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send carousel event: receiver dropped");
                self.event_tx = None;
            }
        }
    }

    fn publish(&self, carousel: &Carousel) {
        self.snapshot_tx.send_replace(CarouselSnapshot::capture(carousel));
    }

    /// Mount, preload and run until shutdown or until the command channel
    /// closes. The carousel is torn down before returning; in-flight
    /// probes are abandoned.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<CarouselCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut motion = Some(self.motion.clone());
        let reduced = motion.as_mut().map(|rx| *rx.borrow_and_update()).unwrap_or(false);

        let mut carousel = Carousel::mount(Arc::clone(&self.items), self.options.clone(), reduced);
        let (preload_tx, mut preload_rx) = mpsc::unbounded_channel::<PreloadReport>();
        spawn_preload(
            carousel.items(),
            carousel.generation(),
            Arc::clone(&self.loader),
            self.probe_timeout,
            preload_tx.clone(),
        );
        self.publish(&carousel);

        info!("Carousel service started");

        loop {
            let was_running = carousel.is_timer_running();

            tokio::select! {
                // Handle shutdown signal
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Carousel service received shutdown signal");
                        break;
                    }
                }

                command = commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(&mut carousel, command, &preload_tx),
                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }

                changed = wait_motion(&mut motion) => {
                    match changed {
                        Some(reduced) => carousel.set_reduced_motion(reduced),
                        None => {
                            warn!("Motion preference source closed; keeping last value");
                            motion = None;
                        }
                    }
                }

                event = carousel.next_timer_event() => {
                    carousel.handle_timer(event);
                    let index = carousel.state().current_index;
                    match event {
                        TimerEvent::Tick => self.send_event(CarouselEvent::Advanced { index }),
                        TimerEvent::Settled => self.send_event(CarouselEvent::Settled { index }),
                    }
                }

                Some(report) = preload_rx.recv() => {
                    let index = report.index;
                    let ok = report.outcome.image().is_some();
                    if carousel.apply_preload(report) {
                        self.send_event(CarouselEvent::MediaSettled { index, ok });
                    }
                }
            }

            let running = carousel.is_timer_running();
            if running != was_running {
                self.send_event(CarouselEvent::AutoplayChanged { running });
            }
            self.publish(&carousel);
        }

        carousel.teardown();
        self.publish(&carousel);
        info!("Carousel service stopped");
    }

    fn handle_command(
        &mut self,
        carousel: &mut Carousel,
        command: CarouselCommand,
        preload_tx: &mpsc::UnboundedSender<PreloadReport>,
    ) {
        debug!("Carousel command: {:?}", command);

        let selects = matches!(
            command,
            CarouselCommand::Select(_) | CarouselCommand::Next | CarouselCommand::Previous
        );

        let result = match command {
            CarouselCommand::PointerEnter => {
                carousel.pointer_enter();
                Ok(())
            }
            CarouselCommand::PointerLeave => {
                carousel.pointer_leave();
                Ok(())
            }
            CarouselCommand::Select(index) => carousel.select(index),
            CarouselCommand::Next => carousel.select_next(),
            CarouselCommand::Previous => carousel.select_previous(),
            CarouselCommand::ReplaceItems(items) => {
                if carousel.replace_items(items) {
                    spawn_preload(
                        carousel.items(),
                        carousel.generation(),
                        Arc::clone(&self.loader),
                        self.probe_timeout,
                        preload_tx.clone(),
                    );
                }
                Ok(())
            }
        };

        match result {
            Ok(()) if selects && !carousel.items().is_empty() => {
                let index = carousel.state().current_index;
                self.send_event(CarouselEvent::Selected { index });
            }
            Ok(()) => {}
            Err(e) => {
                warn!("Carousel command rejected: {}", e);
                self.send_event(CarouselEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}

async fn wait_motion(rx: &mut Option<watch::Receiver<bool>>) -> Option<bool> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::preference::MotionPreference;
    use crate::carousel::preloader::testing::{Script, ScriptedLoader};
    use crate::carousel::render::{PlaceholderKind, SlideContent};
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, sleep_until, timeout, Instant};

    struct Harness {
        commands: mpsc::UnboundedSender<CarouselCommand>,
        events: mpsc::UnboundedReceiver<CarouselEvent>,
        snapshot: watch::Receiver<CarouselSnapshot>,
        shutdown: watch::Sender<bool>,
        preference: Option<MotionPreference>,
        handle: JoinHandle<()>,
    }

    impl Harness {
        fn start(labels: &[&str], scripts: &[(&str, Script)], reduced: bool) -> Self {
            Self::start_with(labels, scripts, reduced, CarouselOptions::default())
        }

        fn start_with(
            labels: &[&str],
            scripts: &[(&str, Script)],
            reduced: bool,
            options: CarouselOptions,
        ) -> Self {
            let items: Arc<[MediaItem]> =
                labels.iter().map(|l| MediaItem::parse(l).unwrap()).collect();
            let preference = MotionPreference::new(reduced);
            let (event_tx, events) = mpsc::unbounded_channel();
            let (commands, command_rx) = mpsc::unbounded_channel();
            let (shutdown, shutdown_rx) = watch::channel(false);

            let service = CarouselService::new(
                items,
                options,
                Arc::new(ScriptedLoader::new(scripts)),
                preference.subscribe(),
            )
            .with_event_sender(event_tx);
            let snapshot = service.snapshot();
            let handle = tokio::spawn(service.run(command_rx, shutdown_rx));

            Self {
                commands,
                events,
                snapshot,
                shutdown,
                preference: Some(preference),
                handle,
            }
        }

        fn preference(&self) -> &MotionPreference {
            self.preference.as_ref().unwrap()
        }

        /// Drop the only publisher of the reduced-motion preference
        fn close_preference(&mut self) {
            self.preference = None;
        }

        fn index(&self) -> usize {
            self.snapshot.borrow().state.current_index
        }

        fn drain_events(&mut self) -> Vec<CarouselEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }
    }

    async fn pause(ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_slides_advance_on_schedule() {
        let start = Instant::now();
        let harness = Harness::start(&["a.png", "b.png", "c.png"], &[], false);

        pause(1).await;
        assert_eq!(harness.index(), 0);
        assert_eq!(harness.snapshot.borrow().phase, Phase::Running);

        for (at, expected) in [(4001, 1), (8001, 2), (12001, 0)] {
            sleep_until(start + Duration::from_millis(at)).await;
            assert_eq!(harness.index(), expected, "at t={}ms", at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_shows_placeholder_but_carousel_advances() {
        let harness = Harness::start(
            &["a.png", "b.png", "c.png"],
            &[("b.png", Script::Hang)],
            false,
        );

        pause(4001).await;
        let snapshot = harness.snapshot.borrow().clone();
        assert_eq!(snapshot.state.loaded_flags(), vec![true, false, true]);
        assert_eq!(snapshot.state.current_index, 1);

        let frame = snapshot.frame();
        let active = frame.active().unwrap();
        assert_eq!(active.index, 1);
        assert!(matches!(
            active.content,
            SlideContent::Placeholder(PlaceholderKind::Loading)
        ));

        pause(60_000).await;
        assert_eq!(
            harness.snapshot.borrow().state.loaded_flags(),
            vec![true, false, true]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reduced_motion_holds_until_reverted() {
        let harness = Harness::start(&["a.png", "b.png", "c.png"], &[], true);

        pause(60_000).await;
        assert_eq!(harness.index(), 0);
        assert_eq!(harness.snapshot.borrow().phase, Phase::Idle);

        harness.preference().set(false);
        pause(4001).await;
        assert_eq!(harness.index(), 1);
        assert!(!harness.snapshot.borrow().reduced_motion);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_pauses_and_resumes() {
        let mut harness = Harness::start(&["a.png", "b.png", "c.png"], &[], false);
        pause(1000).await;

        harness.commands.send(CarouselCommand::PointerEnter).unwrap();
        pause(10_000).await;
        assert_eq!(harness.index(), 0);
        assert!(harness.snapshot.borrow().hovered);

        harness.commands.send(CarouselCommand::PointerLeave).unwrap();
        pause(4001).await;
        assert_eq!(harness.index(), 1);

        let changes: Vec<bool> = harness
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                CarouselEvent::AutoplayChanged { running } => Some(running),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_commands() {
        let mut harness = Harness::start(&["a.png", "b.png", "c.png"], &[], false);
        pause(1).await;
        harness.drain_events();

        harness.commands.send(CarouselCommand::Select(2)).unwrap();
        pause(1).await;
        assert_eq!(harness.index(), 2);
        assert_eq!(harness.snapshot.borrow().phase, Phase::Transitioning);

        harness.commands.send(CarouselCommand::Next).unwrap();
        harness.commands.send(CarouselCommand::Select(9)).unwrap();
        pause(1).await;
        assert_eq!(harness.index(), 0);

        let events = harness.drain_events();
        assert!(matches!(events[0], CarouselEvent::Selected { index: 2 }));
        assert!(matches!(events[1], CarouselEvent::Selected { index: 0 }));
        assert!(matches!(events[2], CarouselEvent::Error { ref message } if message.contains("out of range")));

        pause(1001).await;
        assert_eq!(harness.snapshot.borrow().phase, Phase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_items_remounts_and_preloads() {
        let harness = Harness::start(&["a.png", "b.png"], &[], false);
        pause(1).await;
        let first_generation = harness.snapshot.borrow().generation;

        let items: Arc<[MediaItem]> = ["x.png", "y.png", "z.png"]
            .iter()
            .map(|l| MediaItem::parse(l).unwrap())
            .collect();
        harness
            .commands
            .send(CarouselCommand::ReplaceItems(items))
            .unwrap();
        pause(1).await;

        let snapshot = harness.snapshot.borrow().clone();
        assert_ne!(snapshot.generation, first_generation);
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.state.loaded_flags(), vec![true, true, true]);
        assert_eq!(snapshot.state.current_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_down() {
        let harness = Harness::start(
            &["a.png", "b.png"],
            &[("b.png", Script::Delay(Duration::from_secs(30)))],
            false,
        );
        pause(1).await;
        let mounted_generation = harness.snapshot.borrow().generation;

        harness.shutdown.send(true).unwrap();
        timeout(Duration::from_secs(1), harness.handle)
            .await
            .unwrap()
            .unwrap();

        let snapshot = harness.snapshot.borrow().clone();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_ne!(snapshot.generation, mounted_generation);

        // The abandoned probe finishes later without touching anything
        pause(60_000).await;
        assert_eq!(
            harness.snapshot.borrow().state.loaded_flags(),
            vec![true, false]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_commands_stops_service() {
        let harness = Harness::start(&["a.png", "b.png"], &[], false);
        let Harness {
            commands, handle, ..
        } = harness;
        drop(commands);
        assert!(timeout(Duration::from_secs(1), handle).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_motion_source_keeps_playing() {
        let start = Instant::now();
        let mut harness = Harness::start(&["a.png", "b.png", "c.png"], &[], false);
        harness.close_preference();

        for (at, expected) in [(4001, 1), (8001, 2), (12001, 0)] {
            sleep_until(start + Duration::from_millis(at)).await;
            assert_eq!(harness.index(), expected, "at t={}ms", at);
        }
        assert!(!harness.snapshot.borrow().reduced_motion);
        assert!(!harness.handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_motion_source_keeps_reduced_motion() {
        let mut harness = Harness::start(&["a.png", "b.png", "c.png"], &[], true);
        harness.close_preference();

        pause(60_000).await;
        assert_eq!(harness.index(), 0);
        assert_eq!(harness.snapshot.borrow().phase, Phase::Idle);
        assert!(harness.snapshot.borrow().reduced_motion);

        // Still serving commands
        harness.commands.send(CarouselCommand::Select(2)).unwrap();
        pause(1).await;
        assert_eq!(harness.index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_shorter_than_settle_never_overlaps() {
        let options = CarouselOptions {
            interval: Duration::from_millis(300),
            ..Default::default()
        };
        let start = Instant::now();
        let mut harness = Harness::start_with(&["a.png", "b.png", "c.png"], &[], false, options);

        let mut indices = Vec::new();
        for tick in 1..=7u64 {
            sleep_until(start + Duration::from_millis(tick * 300 + 1)).await;
            indices.push(harness.index());
            assert_eq!(harness.snapshot.borrow().phase, Phase::Transitioning);
        }
        assert_eq!(indices, vec![1, 2, 0, 1, 2, 0, 1]);

        // Each tick re-arms the one settle deadline; settles never outnumber ticks
        let events = harness.drain_events();
        let advanced = events
            .iter()
            .filter(|e| matches!(e, CarouselEvent::Advanced { .. }))
            .count();
        let settled = events
            .iter()
            .filter(|e| matches!(e, CarouselEvent::Settled { .. }))
            .count();
        assert_eq!(advanced, 7);
        assert!(settled < advanced);

        // Pausing lets the pending transition finish, then everything is quiet
        harness.commands.send(CarouselCommand::PointerEnter).unwrap();
        pause(300).await;
        let snapshot = harness.snapshot.borrow().clone();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(!snapshot.state.is_transitioning);

        pause(5_000).await;
        assert_eq!(harness.index(), 1);
    }
}
