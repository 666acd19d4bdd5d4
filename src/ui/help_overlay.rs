//! Help overlay showing all keybindings
//!
//! Renders a centered modal overlay with keyboard shortcuts.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::i18n::Translator;

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame, t: &Translator) {
    let area = frame.area();

    let overlay_width = 52;
    let overlay_height = 22;
    let overlay_area = centered_rect(overlay_width, overlay_height, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let lines = vec![
        Line::from(Span::styled(
            t.translate("help.title"),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Filters"),
        help_line("s", "Next state (wraps to all)"),
        help_line("d", "Next district in state"),
        help_line("f, Tab", "Next commodity family"),
        help_line("/", "Search commodity, market, variety"),
        help_line("x", "Clear filters"),
        Line::from(""),
        section("Pages"),
        help_line("←/h, →/l", "Previous / next page"),
        help_line("g, G", "First / last page"),
        Line::from(""),
        section("Other"),
        help_line("r", "Refresh (skips the cache)"),
        help_line("L", "Switch language (en/te/hi)"),
        help_line("?", "Toggle this help"),
        help_line("q, Esc", "Quit"),
        Line::from(""),
        Line::from(Span::styled(
            t.translate("help.close"),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, overlay_area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )])
}

/// Creates a help line with key and description
fn help_line(key: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
        Span::raw(description.to_string()),
    ])
}

/// Helper function to create a centered rect
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(t: &Translator) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, t)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_help_overlay_renders() {
        let content = draw(&Translator::default());
        assert!(content.contains("Help"), "Should render help title");
        assert!(content.contains("Keyboard Shortcuts"));
        assert!(content.contains("Filters"), "Should show filters section");
        assert!(content.contains("Refresh"));
        assert!(content.contains("Press Esc, ? or q to close"));
    }

    #[test]
    fn test_help_title_falls_back_to_english() {
        let content = draw(&Translator::new(Language::Te));
        assert!(content.contains("Keyboard Shortcuts"));
    }
}
