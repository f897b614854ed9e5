use ratatui::layout::Rect;

/// Pointer crossing the carousel boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEdge {
    Enter,
    Leave,
}

/// Turns raw mouse positions into enter/leave edges for one area.
/// Only crossings are reported; moving inside the area is silent.
#[derive(Debug, Default, Clone)]
pub struct HoverTracker {
    inside: bool,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Feed a pointer position
    pub fn update(&mut self, area: Rect, column: u16, row: u16) -> Option<HoverEdge> {
        let inside = contains(area, column, row);
        self.transition(inside)
    }

    /// Pointer left the terminal entirely
    pub fn leave(&mut self) -> Option<HoverEdge> {
        self.transition(false)
    }

    fn transition(&mut self, inside: bool) -> Option<HoverEdge> {
        if inside == self.inside {
            return None;
        }
        self.inside = inside;
        Some(if inside { HoverEdge::Enter } else { HoverEdge::Leave })
    }
}

/// Whether a cell lies inside `area`
pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
