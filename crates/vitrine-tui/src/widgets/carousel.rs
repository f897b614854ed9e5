use image::{DynamicImage, GenericImageView};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use vitrine_core::carousel::{PlaceholderKind, SlideContent};

use crate::app::{App, RenderedImage};
use crate::theme::Theme;

pub struct CarouselWidget;

impl CarouselWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
        let slide_frame = app.snapshot.frame();
        let theme = app.theme.clone();

        // Border lights up while a transition is settling
        let border_style = if slide_frame.transitioning {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.surface)
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(theme.background));

        let Some(active) = slide_frame.active() else {
            frame.render_widget(block.clone(), area);
            render_message(
                frame,
                block.inner(area),
                "No slides configured",
                Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
            );
            return;
        };

        block = block.title(Span::styled(
            format!(" {} ", active.label),
            Style::default().fg(theme.foreground).add_modifier(Modifier::BOLD),
        ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &active.content {
            SlideContent::Image(image) => {
                let key = (app.snapshot.generation, active.index, inner.width, inner.height);
                let cached = app.image_cache.as_ref().is_some_and(|c| c.key == key);
                if !cached {
                    app.image_cache = Some(RenderedImage {
                        key,
                        lines: halfblock_lines(image, inner.width, inner.height),
                    });
                }
                if let Some(rendered) = &app.image_cache {
                    render_lines(frame, inner, &rendered.lines);
                }
            }
            SlideContent::Placeholder(PlaceholderKind::Loading) => {
                render_message(
                    frame,
                    inner,
                    &format!("{} Loading {}", app.spinner(), active.label),
                    Style::default()
                        .fg(theme.placeholder)
                        .add_modifier(Modifier::BOLD),
                );
            }
            SlideContent::Placeholder(PlaceholderKind::Broken(reason)) => {
                render_broken(frame, inner, &active.label, reason, &theme);
            }
        }
    }
}

/// Scale `img` into `width` x `height` cells, two pixels per cell using
/// the upper half block. Aspect ratio is kept and the picture centred;
/// every returned line is exactly `width` cells wide.
pub fn halfblock_lines(img: &DynamicImage, width: u16, height: u16) -> Vec<Line<'static>> {
    let (img_width, img_height) = img.dimensions();
    if width == 0 || height == 0 || img_width == 0 || img_height == 0 {
        return Vec::new();
    }

    let target_width = width as u32;
    let target_height = height as u32 * 2;

    let scale_w = target_width as f32 / img_width as f32;
    let scale_h = target_height as f32 / img_height as f32;
    let scale = scale_w.min(scale_h);

    let new_width = ((img_width as f32 * scale) as u32).clamp(1, target_width);
    let new_height = ((img_height as f32 * scale) as u32).clamp(1, target_height);

    let rgba = img
        .resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
        .to_rgba8();

    let left = ((target_width - new_width) / 2) as usize;
    let right = target_width as usize - new_width as usize - left;
    let rows = new_height.div_ceil(2);
    let top = (height as u32).saturating_sub(rows) / 2;

    let mut lines = Vec::with_capacity(height as usize);
    lines.extend((0..top).map(|_| Line::from(" ".repeat(width as usize))));

    for row in 0..rows {
        let y = row * 2;
        let mut spans = Vec::with_capacity(new_width as usize + 2);
        if left > 0 {
            spans.push(Span::raw(" ".repeat(left)));
        }
        for x in 0..new_width {
            let upper = rgba.get_pixel(x, y);
            let lower = if y + 1 < new_height {
                rgba.get_pixel(x, y + 1)
            } else {
                upper
            };
            spans.push(Span::styled(
                "▀",
                Style::default()
                    .fg(Color::Rgb(upper[0], upper[1], upper[2]))
                    .bg(Color::Rgb(lower[0], lower[1], lower[2])),
            ));
        }
        if right > 0 {
            spans.push(Span::raw(" ".repeat(right)));
        }
        lines.push(Line::from(spans));
    }

    lines
}

fn render_lines(frame: &mut Frame, area: Rect, lines: &[Line<'static>]) {
    for (row, line) in lines.iter().enumerate().take(area.height as usize) {
        let line_area = Rect {
            y: area.y + row as u16,
            height: 1,
            ..area
        };
        frame.render_widget(Paragraph::new(line.clone()), line_area);
    }
}

/// One centred line in the middle of `area`
fn render_message(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let centered = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, centered);
}

fn render_broken(frame: &mut Frame, area: Rect, label: &str, reason: &str, theme: &Theme) {
    if area.height == 0 {
        return;
    }
    let lines = vec![
        Line::from(Span::styled(
            format!("✗ {} could not be loaded", label),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            reason.to_string(),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )),
    ];
    let height = (lines.len() as u16).min(area.height);
    let centered = Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::tests::snapshot;
    use image::{Rgba, RgbaImage};
    use ratatui::{backend::TestBackend, Terminal};
    use vitrine_core::carousel::Readiness;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn test_halfblock_lines_keep_width() {
        let lines = halfblock_lines(&solid(4, 2), 10, 5);
        // 10x5 pixels after scaling -> 3 cell rows, centred with one blank row above
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.width() == 10));
        assert!(lines[0].spans.iter().all(|s| s.content.trim().is_empty()));
    }

    #[test]
    fn test_halfblock_lines_degenerate_area() {
        assert!(halfblock_lines(&solid(4, 2), 0, 5).is_empty());
        assert!(halfblock_lines(&solid(4, 2), 5, 0).is_empty());
    }

    #[test]
    fn test_ready_slide_is_cached() {
        let mut terminal = Terminal::new(TestBackend::new(20, 8)).unwrap();
        let mut snap = snapshot(2);
        snap.state.readiness[0] = Readiness::Ready(Arc::new(solid(4, 4)));
        let mut app = App::new(snap, Theme::default());

        let area = Rect::new(0, 0, 20, 8);
        terminal
            .draw(|frame| CarouselWidget::render(frame, area, &mut app))
            .unwrap();

        let cache = app.image_cache.as_ref().unwrap();
        assert_eq!(cache.key, (1, 0, 18, 6));
        assert_eq!(cache.lines.len(), 6);
    }

    #[test]
    fn test_broken_slide_shows_reason() {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        let mut snap = snapshot(1);
        snap.state.readiness[0] = Readiness::Failed("HTTP 404".to_string());
        let mut app = App::new(snap, Theme::default());

        let area = Rect::new(0, 0, 40, 8);
        terminal
            .draw(|frame| CarouselWidget::render(frame, area, &mut app))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("HTTP 404"));
        assert!(app.image_cache.is_none());
    }
}
