use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use super::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let active = app.selected_category();

    let items: Vec<ListItem> = app
        .categories
        .items
        .iter()
        .map(|category| {
            let is_active = active == Some(category.as_str());
            let marker = if is_active { "* " } else { "  " };
            let name_style = if is_active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(format!("{:<24}", truncate(category, 22)), name_style),
                Span::styled(
                    format!("{} questions", app.question_count(category)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let title = match active {
        Some(category) => format!(" Categories (playing: {}) ", category),
        None => " Categories (playing: all) ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.categories.selected);

    f.render_stateful_widget(list, area, &mut state);
}
