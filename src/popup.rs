use chrono::NaiveDate;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::log_entry::LogEntry;

const STAR_COUNT: usize = 10;

pub fn format_coords(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.4}, {longitude:.4}")
}

/// Month-day-year, e.g. `May 01, 2024`. Accepts either a plain date or a
/// full ISO timestamp; anything unparseable is shown as-is.
pub fn format_visit_date(raw: &str) -> String {
    let day = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => date.format("%b %d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Star widget plus `r/10`. Unrated entries (rating 0) get nothing.
pub fn rating_line(rating: f64) -> Option<String> {
    if rating <= 0.0 {
        return None;
    }
    let filled = (rating.round() as usize).min(STAR_COUNT);
    let mut stars = "★".repeat(filled);
    stars.push_str(&"☆".repeat(STAR_COUNT - filled));
    Some(format!("{stars} {rating}/10"))
}

pub fn entry_lines(entry: &LogEntry) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        entry.title.clone(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];

    if let Some(stars) = rating_line(entry.rating) {
        lines.push(Line::from(Span::styled(
            stars,
            Style::default().fg(Color::Yellow),
        )));
    }

    if let Some(description) = entry.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(description.to_string()));
    }

    if let Some(comments) = entry.comments.as_deref().filter(|c| !c.is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("\"{comments}\""),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::from(format!(
        "Visited: {}",
        format_visit_date(&entry.visit_date)
    )));
    lines.push(Line::from(format_coords(entry.latitude, entry.longitude)));

    if let Some(image) = entry.image.as_deref().filter(|i| !i.is_empty()) {
        lines.push(Line::from(Span::styled(
            image.to_string(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }

    lines
}
