mod carousel;
mod indicators;
mod status_bar;

pub use carousel::{halfblock_lines, CarouselWidget};
pub use indicators::IndicatorBar;
pub use status_bar::StatusBarWidget;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::{App, FrameLayout};

/// Draw the whole screen and record the hit-test layout on `app`
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    // Main layout: slide + indicators + status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    let container = Rect {
        height: rows[0].height + rows[1].height,
        ..rows[0]
    };
    app.layout = FrameLayout {
        container,
        slide: rows[0],
        indicators: IndicatorBar::layout(rows[1], app.slide_count()),
    };

    CarouselWidget::render(frame, rows[0], app);
    IndicatorBar::render(frame, rows[1], app);
    StatusBarWidget::render(frame, rows[2], app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::snapshot;
    use crate::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_records_layout() {
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        let mut app = App::new(snapshot(3), Theme::default());

        terminal.draw(|frame| draw(frame, &mut app)).unwrap();

        assert_eq!(app.layout.container, Rect::new(0, 0, 40, 11));
        assert_eq!(app.layout.slide, Rect::new(0, 0, 40, 10));
        assert_eq!(app.layout.indicators.len(), 3);
        assert!(app.layout.indicators.iter().all(|r| r.y == 10));
    }

    #[test]
    fn test_pending_slide_draws_placeholder() {
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();
        let mut app = App::new(snapshot(2), Theme::default());

        terminal.draw(|frame| draw(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);

        assert!(text.contains("Loading slide-0.png"));
        assert!(text.contains("1/2"));
    }

    #[test]
    fn test_empty_carousel_message() {
        let mut terminal = Terminal::new(TestBackend::new(50, 8)).unwrap();
        let mut app = App::new(snapshot(0), Theme::default());

        terminal.draw(|frame| draw(frame, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("No slides"));
        assert!(app.layout.indicators.is_empty());
    }
}
