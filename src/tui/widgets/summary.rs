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
    let Some(summary) = &app.summary else {
        let block = Block::default().borders(Borders::ALL).title(" Game Over ");
        f.render_widget(Paragraph::new("No game finished").block(block), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Score
            Constraint::Min(0),    // Per category
        ])
        .split(area);

    let is_best = summary.accuracy > summary.previous_best;
    let mut score = vec![
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{}/{} ({}%)",
                    summary.correct, summary.answered, summary.accuracy
                ),
                Style::default()
                    .fg(accuracy_color(summary.accuracy))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Games played: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", summary.totals.games_played),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Best: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}%", summary.totals.best_accuracy),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];
    if is_best {
        score.push(Line::from(Span::styled(
            "New best!",
            Style::default().fg(Color::Yellow),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Game Over ")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(Paragraph::new(score).block(block), chunks[0]);

    let items: Vec<ListItem> = summary
        .categories
        .iter()
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
                    format!(" {}/{} ({}%)", c.correct, c.total, c.accuracy),
                    Style::default().fg(accuracy_color(c.accuracy)),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" This Game by Category ")
        .title_style(Style::default().fg(Color::Magenta));
    f.render_widget(List::new(items).block(block), chunks[1]);
}
