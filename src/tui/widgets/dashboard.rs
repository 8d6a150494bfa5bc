use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{accuracy_bar, accuracy_color, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Totals + next game row
            Constraint::Min(0),    // Category accuracy
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_totals(f, app, top_chunks[0]);
    draw_next_game(f, app, top_chunks[1]);
    draw_category_accuracy(f, app, chunks[1]);
}

fn draw_totals(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let overall = stats.overall_accuracy();

    let last_played = if stats.games_played > 0 {
        stats.last_played.format("%b %d, %H:%M").to_string()
    } else {
        "Never".to_string()
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Games: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.games_played),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Answered: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} ({} correct)", stats.total_questions, stats.total_correct),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}%", overall),
                Style::default().fg(accuracy_color(overall)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Best game: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}%", stats.best_accuracy),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Last played: ", Style::default().fg(Color::Gray)),
            Span::styled(last_played, Style::default().fg(Color::White)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_next_game(f: &mut Frame, app: &App, area: Rect) {
    let category = app.selected_category().unwrap_or("All categories");

    let text = vec![
        Line::from(vec![
            Span::styled("Category: ", Style::default().fg(Color::Gray)),
            Span::styled(category.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("Questions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", app.game_length),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to play",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next Game ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_category_accuracy(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.stats.category_accuracy();

    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new(Span::styled(
            "No games played yet",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        rows.iter()
            .map(|c| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<20}", truncate(&c.category, 18)),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        accuracy_bar(c.accuracy, 10),
                        Style::default().fg(accuracy_color(c.accuracy)),
                    ),
                    Span::styled(
                        format!(" {:>3}% ", c.accuracy),
                        Style::default().fg(accuracy_color(c.accuracy)),
                    ),
                    Span::styled(
                        format!("{}/{}", c.correct, c.total),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Accuracy by Category ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
