use std::io::{self, Stdout};
use std::sync::Arc;

use anyhow::{bail, Result};
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use vitrine_core::carousel::{
    CarouselCommand, CarouselEvent, CarouselService, CarouselSnapshot, DefaultLoader, MediaLoader,
    MotionPreference,
};
use vitrine_core::config::MotionMode;
use vitrine_core::{AppConfig, MediaItem};
use vitrine_tui::{
    event::{AppEvent, EventHandler},
    input::{handle_focus_lost, handle_key_event, handle_mouse_event, Action},
    load_theme,
    widgets::draw,
    App,
};

use super::resolve_items;
use crate::RunArgs;

/// Command-line flags win over the config file
fn apply_overrides(config: &mut AppConfig, args: &RunArgs) -> Result<()> {
    if let Some(interval_ms) = args.interval_ms {
        if interval_ms == 0 {
            bail!("--interval-ms must be greater than zero");
        }
        config.carousel.interval_ms = interval_ms;
    }
    if args.no_hover_pause {
        config.carousel.pause_on_hover = false;
    }
    if args.ignore_reduced_motion {
        config.carousel.respect_reduced_motion = false;
    }
    if args.reduced_motion {
        config.motion.reduced_motion = MotionMode::On;
    }
    Ok(())
}

pub async fn run(mut config: AppConfig, args: RunArgs) -> Result<()> {
    apply_overrides(&mut config, &args)?;

    let items: Arc<[MediaItem]> = resolve_items(&config, &args.items)?.into();
    let preference = MotionPreference::detect(&config.motion);
    let loader: Arc<dyn MediaLoader> = Arc::new(DefaultLoader::new(&config.loader)?);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<CarouselEvent>();
    let service = CarouselService::new(
        Arc::clone(&items),
        config.carousel_options(),
        loader,
        preference.subscribe(),
    )
    .with_probe_timeout(config.loader.probe_timeout())
    .with_event_sender(event_tx);
    let mut snapshots = service.snapshot();

    let (command_tx, command_rx) = mpsc::unbounded_channel::<CarouselCommand>();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service_handle = tokio::spawn(service.run(command_rx, shutdown_rx));
    info!("Started carousel with {} slides", items.len());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        SetTitle("Vitrine")
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let initial = snapshots.borrow_and_update().clone();
    let mut app = App::new(initial, load_theme(&config.ui));
    let event_handler = EventHandler::new(config.ui.tick_rate_ms);

    let result = event_loop(
        &mut terminal,
        &mut app,
        &event_handler,
        &mut snapshots,
        &mut event_rx,
        &command_tx,
        &preference,
    );

    // Stop the carousel before giving the terminal back
    let _ = shutdown_tx.send(true);
    if let Err(e) = service_handle.await {
        warn!("Carousel service ended abnormally: {}", e);
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    event_handler: &EventHandler,
    snapshots: &mut watch::Receiver<CarouselSnapshot>,
    events: &mut mpsc::UnboundedReceiver<CarouselEvent>,
    commands: &mpsc::UnboundedSender<CarouselCommand>,
    preference: &MotionPreference,
) -> Result<()> {
    loop {
        // Pick up the latest carousel state (non-blocking)
        if snapshots.has_changed().unwrap_or(false) {
            app.set_snapshot(snapshots.borrow_and_update().clone());
        }
        while let Ok(event) = events.try_recv() {
            app.handle_carousel_event(&event);
        }

        terminal.draw(|frame| draw(frame, app))?;

        if let Some(event) = event_handler.next()? {
            let actions = match event {
                AppEvent::Key(key) => vec![handle_key_event(key, app)],
                AppEvent::Mouse(mouse) => handle_mouse_event(mouse, app),
                AppEvent::FocusLost => vec![handle_focus_lost(app)],
                // Rendered slides are keyed by area, the next draw rescales
                AppEvent::Resize(_, _) => Vec::new(),
                AppEvent::Tick => {
                    // Tick spinner animation for loading placeholders
                    app.tick_spinner();
                    Vec::new()
                }
            };
            for action in actions {
                handle_action(app, action, commands, preference);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_action(
    app: &mut App,
    action: Action,
    commands: &mpsc::UnboundedSender<CarouselCommand>,
    preference: &MotionPreference,
) {
    let command = match action {
        Action::Quit => {
            app.should_quit = true;
            return;
        }
        Action::Select(index) => CarouselCommand::Select(index),
        Action::Next => CarouselCommand::Next,
        Action::Previous => CarouselCommand::Previous,
        Action::PointerEnter => CarouselCommand::PointerEnter,
        Action::PointerLeave => CarouselCommand::PointerLeave,
        Action::ToggleReducedMotion => {
            let reduced = preference.toggle();
            app.set_status(if reduced {
                "Reduced motion on"
            } else {
                "Reduced motion off"
            });
            return;
        }
        Action::FocusNextIndicator => {
            app.focus_next_indicator();
            return;
        }
        Action::FocusPrevIndicator => {
            app.focus_prev_indicator();
            return;
        }
        Action::None => return,
    };

    if commands.send(command).is_err() {
        warn!("Carousel service is gone; quitting");
        app.should_quit = true;
    }
}
