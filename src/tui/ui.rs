use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{categories, dashboard, quiz, summary};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Categories", "Quiz"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Categories => 1,
        View::Quiz | View::Summary => 2,
    };

    let title = match app.selected_category() {
        Some(category) => format!(" Knowledge Gap [{}] ", category),
        None => " Knowledge Gap ".to_string(),
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Categories => categories::draw(f, app, area),
        View::Quiz => quiz::draw(f, app, area),
        View::Summary => summary::draw(f, app, area),
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        let line = Line::from(vec![
            Span::styled(status.as_str(), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            key("q"),
            Span::raw(" Quit"),
        ]);
        let help = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
        f.render_widget(help, area);
        return;
    }

    let mut spans = Vec::new();
    let in_question = app.current.is_some();

    if !in_question {
        spans.extend(vec![key("h/l"), Span::raw(" Views  ")]);
    }

    match app.view {
        View::Dashboard => {
            spans.extend(vec![
                key("<CR>"),
                Span::raw(" Play  "),
                key("+/-"),
                Span::raw(" Length  "),
                key("X"),
                Span::raw(" Reset stats  "),
                key("^r"),
                Span::raw(" Refresh  "),
            ]);
        }
        View::Categories => {
            spans.extend(vec![
                key("j/k"),
                Span::raw(" Nav  "),
                key("<CR>"),
                Span::raw(" Choose  "),
                key("<Esc>"),
                Span::raw(" All  "),
            ]);
        }
        View::Quiz => match app.current.as_ref().map(|c| c.answered.is_some()) {
            None => spans.extend(vec![key("<CR>/n"), Span::raw(" New game  ")]),
            Some(false) => spans.extend(vec![
                key("j/k"),
                Span::raw(" Choose  "),
                key("1-9/<CR>"),
                Span::raw(" Answer  "),
                key("<Esc>"),
                Span::raw(" End game  "),
            ]),
            Some(true) => spans.extend(vec![
                key("<CR>/n"),
                Span::raw(" Next  "),
                key("<Esc>"),
                Span::raw(" End game  "),
            ]),
        },
        View::Summary => {
            spans.extend(vec![
                key("n"),
                Span::raw(" Play again  "),
                key("<CR>"),
                Span::raw(" Done  "),
            ]);
        }
    }

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}
