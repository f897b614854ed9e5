use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

const ACTIVE_DOT: &str = "●";
const INACTIVE_DOT: &str = "○";

/// Row of per-slide selector dots
pub struct IndicatorBar;

impl IndicatorBar {
    /// Cell of each dot: centred, one column apart. Dots that do not fit
    /// are left out.
    pub fn layout(area: Rect, count: usize) -> Vec<Rect> {
        if count == 0 || area.width == 0 || area.height == 0 {
            return Vec::new();
        }

        let fits = ((area.width as usize + 1) / 2).min(count);
        let used = (fits * 2 - 1) as u16;
        let start = area.x + (area.width - used) / 2;

        (0..fits)
            .map(|i| Rect::new(start + (i as u16) * 2, area.y, 1, 1))
            .collect()
    }

    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let frame_model = app.snapshot.frame();
        let cells = &app.layout.indicators;

        for (indicator, cell) in frame_model.indicators.iter().zip(cells) {
            let mut style = if indicator.active {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.muted)
            };
            if app.focused_indicator == Some(indicator.index) {
                style = style.add_modifier(Modifier::REVERSED);
            }

            let dot = if indicator.active { ACTIVE_DOT } else { INACTIVE_DOT };
            frame.render_widget(Paragraph::new(Line::from(Span::styled(dot, style))), *cell);
        }

        // Label of the focused indicator, right-aligned past the last dot,
        // so keyboard users know what Enter will show
        let Some(focused) = app
            .focused_indicator
            .and_then(|i| frame_model.indicators.get(i))
        else {
            return;
        };
        let Some(label_area) = Self::label_area(area, cells) else {
            return;
        };

        let hint = Line::from(Span::styled(
            format!("{} ", focused.label),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        ))
        .right_aligned();
        frame.render_widget(Paragraph::new(hint), label_area);
    }

    /// Columns right of the last dot, keeping one blank column after it
    fn label_area(area: Rect, cells: &[Rect]) -> Option<Rect> {
        let start = cells.last().map(|cell| cell.right() + 1).unwrap_or(area.x);
        let width = area.right().saturating_sub(start);
        (width > 0).then(|| Rect {
            x: start,
            width,
            ..area
        })
    }
}
