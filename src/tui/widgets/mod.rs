pub mod categories;
pub mod dashboard;
pub mod quiz;
pub mod summary;

use ratatui::style::Color;

pub fn accuracy_color(accuracy: u32) -> Color {
    if accuracy >= 70 {
        Color::Green
    } else if accuracy >= 50 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn accuracy_bar(accuracy: u32, width: usize) -> String {
    let filled = (accuracy.min(100) as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
