use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

const HELP_HINT: &str = " q:quit ←/→:move 1-9:jump tab:focus m:motion ";

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let snapshot = &app.snapshot;

        let status_text = if let Some(msg) = &app.status_message {
            format!(" {}", msg)
        } else if snapshot.items.is_empty() {
            " empty".to_string()
        } else {
            let label = snapshot
                .items
                .get(snapshot.state.current_index)
                .map(|item| item.label())
                .unwrap_or_default();
            let mut text = format!(
                " {}/{} {} | {}",
                snapshot.state.current_index + 1,
                snapshot.items.len(),
                label,
                snapshot.phase
            );
            if snapshot.hovered {
                text.push_str(" | hover");
            }
            if snapshot.reduced_motion {
                text.push_str(" | reduced motion");
            }
            text
        };

        let used = status_text.chars().count() + HELP_HINT.chars().count();
        let padding_len = (area.width as usize).saturating_sub(used);

        let bar = Style::default().bg(theme.surface);
        let line = Line::from(vec![
            Span::styled(
                status_text,
                bar.fg(theme.foreground).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ".repeat(padding_len), bar),
            Span::styled(HELP_HINT, bar.fg(theme.muted)),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
