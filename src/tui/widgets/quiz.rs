use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::tui::{App, CurrentQuestion};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let (Some(session), Some(current)) = (&app.session, &app.current) else {
        draw_idle(f, app, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Length(5), // Question text
            Constraint::Min(0),    // Options
            Constraint::Length(3), // Feedback
        ])
        .split(area);

    let ratio = if session.length() == 0 {
        0.0
    } else {
        session.answered() as f64 / session.length() as f64
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!(
            "{}/{}  ({} correct)",
            session.answered(),
            session.length(),
            session.correct()
        ));
    f.render_widget(gauge, chunks[0]);

    draw_question(f, current, chunks[1]);
    draw_options(f, current, chunks[2]);
    draw_feedback(f, current, chunks[3]);
}

fn draw_idle(f: &mut Frame, app: &App, area: Rect) {
    let category = app.selected_category().unwrap_or("all categories");
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{} questions from {}", app.game_length, category),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to start",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Quiz ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_question(f: &mut Frame, current: &CurrentQuestion, area: Rect) {
    let q = &current.question;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} / {} ", q.category, q.difficulty_label()))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(q.text.as_str())
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_options(f: &mut Frame, current: &CurrentQuestion, area: Rect) {
    let items: Vec<ListItem> = current
        .options
        .items
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = match current.answered {
                Some(_) if current.question.is_correct(option) => Style::default().fg(Color::Green),
                Some(false) if current.options.selected == Some(i) => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::White),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}) ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(option.as_str(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Options "))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(current.options.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_feedback(f: &mut Frame, current: &CurrentQuestion, area: Rect) {
    let line = match current.answered {
        None => Line::from(Span::styled(
            "Choose an answer",
            Style::default().fg(Color::DarkGray),
        )),
        Some(true) => Line::from(Span::styled(
            "Correct!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Some(false) => Line::from(vec![
            Span::styled(
                "Wrong. ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled("The answer was: ", Style::default().fg(Color::Gray)),
            Span::styled(
                current.question.correct_answer.as_str(),
                Style::default().fg(Color::Green),
            ),
        ]),
    };

    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}
