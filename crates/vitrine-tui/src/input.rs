use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::hover::HoverEdge;

/// Input action that can be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Select(usize),
    Next,
    Previous,
    ToggleReducedMotion,
    FocusNextIndicator,
    FocusPrevIndicator,
    PointerEnter,
    PointerLeave,
    None,
}

impl From<HoverEdge> for Action {
    fn from(edge: HoverEdge) -> Self {
        match edge {
            HoverEdge::Enter => Action::PointerEnter,
            HoverEdge::Leave => Action::PointerLeave,
        }
    }
}

/// Handle a key event and return the corresponding action
pub fn handle_key_event(key: KeyEvent, app: &App) -> Action {
    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
        (KeyCode::Esc, _) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        // Direct selection: 1-9
        (KeyCode::Char(c @ '1'..='9'), KeyModifiers::NONE) => {
            let index = (c as u8 - b'1') as usize;
            if index < app.slide_count() {
                Action::Select(index)
            } else {
                Action::None
            }
        }

        // Manual navigation
        (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => Action::Previous,
        (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => Action::Next,

        // Indicator focus and activation
        (KeyCode::Tab, _) => Action::FocusNextIndicator,
        (KeyCode::BackTab, _) => Action::FocusPrevIndicator,
        (KeyCode::Enter, _) | (KeyCode::Char(' '), KeyModifiers::NONE) => app
            .focused_indicator
            .map(Action::Select)
            .unwrap_or(Action::None),

        // Stand-in for the OS reduced-motion switch
        (KeyCode::Char('m'), KeyModifiers::NONE) => Action::ToggleReducedMotion,

        _ => Action::None,
    }
}

/// Handle a mouse event. Hover edges come first so a click that also
/// enters the carousel pauses before it selects.
pub fn handle_mouse_event(mouse: MouseEvent, app: &mut App) -> Vec<Action> {
    let mut actions = Vec::new();

    if let Some(edge) = app.hover.update(app.layout.container, mouse.column, mouse.row) {
        actions.push(edge.into());
    }

    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
        if let Some(index) = app.indicator_at(mouse.column, mouse.row) {
            actions.push(Action::Select(index));
        }
    }

    actions
}

/// The terminal lost focus; treat it as the pointer leaving
pub fn handle_focus_lost(app: &mut App) -> Action {
    app.hover.leave().map(Action::from).unwrap_or(Action::None)
}
