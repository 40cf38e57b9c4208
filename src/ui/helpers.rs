use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::admin::status::BannerKind;
use crate::models::{Bird, Event, PopulationStatus};

/// Colour used for a conservation status badge.
fn status_color(status: PopulationStatus) -> Color {
    match status {
        PopulationStatus::Common => Color::Green,
        PopulationStatus::Uncommon => Color::Cyan,
        PopulationStatus::Vulnerable => Color::Yellow,
        PopulationStatus::Endangered => Color::LightRed,
        PopulationStatus::CriticallyEndangered => Color::Red,
    }
}

pub(crate) fn banner_style(kind: BannerKind) -> Style {
    match kind {
        BannerKind::Loading => Style::default().fg(Color::Cyan),
        BannerKind::Success => Style::default().fg(Color::Green),
        BannerKind::Error => Style::default().fg(Color::Red),
    }
}

/// Join the non-blank parts with a middle dot.
fn joined(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Text for a bird card in the admin list.
pub(crate) fn bird_card_lines(bird: &Bird, selected: bool) -> Vec<Line<'static>> {
    let mut title = if selected {
        format!("▶ {}", bird.english_name)
    } else {
        bird.english_name.clone()
    };
    if bird.is_featured {
        title.push_str(" ★");
    }

    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                joined(&[&bird.scientific_name, &bird.location]),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  "),
            Span::styled(
                bird.population_status.as_str(),
                Style::default().fg(status_color(bird.population_status)),
            ),
        ]),
    ];

    if !bird.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            bird.tags.join(", "),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines
}

/// Text for an event card in the admin list.
pub(crate) fn event_card_lines(event: &Event, selected: bool) -> Vec<Line<'static>> {
    let title = if selected {
        format!("▶ {}", event.title)
    } else {
        event.title.clone()
    };
    let date = event.event_date.format("%Y-%m-%d").to_string();

    let mut lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            joined(&[&date, &event.location_name]),
            Style::default().fg(Color::Gray),
        )),
    ];

    match event.bird_species_spotted.len() {
        0 => {}
        count => lines.push(Line::from(Span::styled(
            format!("{count} species spotted"),
            Style::default().fg(Color::Cyan),
        ))),
    }
    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(std::io::Error::other("disk full"))
            .context("could not read image")
            .unwrap_err();
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn bird_card_marks_featured_and_selected() {
        let bird = Bird {
            english_name: "Kea".to_string(),
            scientific_name: "Nestor notabilis".to_string(),
            is_featured: true,
            ..Bird::default()
        };
        let lines = bird_card_lines(&bird, true);
        assert_eq!(lines[0].spans[0].content, "▶ Kea ★");
        assert_eq!(lines.len(), 2);
    }
}
