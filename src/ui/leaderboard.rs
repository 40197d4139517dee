use chrono::{DateTime, Local};
use quik::score_store::ScoreRecord;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::App;

/// Humanized age of a stored record ("a minute ago"); falls back to a dash
/// for timestamps we cannot parse.
pub fn age_label(created_at: &str) -> String {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(then) => {
            let secs = Local::now().signed_duration_since(then).num_seconds().max(0) as u64;
            HumanTime::from(std::time::Duration::from_secs(secs))
                .to_text_en(Accuracy::Rough, Tense::Past)
        }
        Err(_) => "—".to_string(),
    }
}

fn record_cells(record: &ScoreRecord) -> Vec<Cell<'static>> {
    vec![
        Cell::from(format!("{:.0}", record.wpm)),
        Cell::from(format!("{:.1}%", record.accuracy)),
        Cell::from(format!("{:.0}", record.score)),
        Cell::from(age_label(&record.created_at)),
    ]
}

/// Top-N table across all players, highlighting the current one.
pub fn ranking_table<'a>(records: &[ScoreRecord], highlight: &str) -> Table<'a> {
    let header = Row::new(vec!["#", "player", "wpm", "acc", "score", "when"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let name_style = if record.owner == highlight {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut cells = vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(record.owner.clone()).style(name_style),
            ];
            cells.extend(record_cells(record));
            Row::new(cells)
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("leaderboard"))
}

fn history_table<'a>(records: &[ScoreRecord]) -> Table<'a> {
    let header = Row::new(vec!["id", "wpm", "acc", "score", "when"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let mut cells = vec![Cell::from(format!("{}", record.id))];
            // Reuse the ranking column shapes minus the player column.
            let mut rest = record_cells(record);
            cells.append(&mut rest);
            Row::new(cells)
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("history"))
}

pub fn render_history(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(format!("scores for {}", app.settings.player))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if app.history.is_empty() {
        let empty = Paragraph::new("no recorded sessions yet")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
    } else {
        f.render_widget(history_table(&app.history), chunks[1]);
    }

    let legend = Paragraph::new("(b)ack / (esc) menu")
        .style(Style::default().add_modifier(Modifier::ITALIC));
    f.render_widget(legend, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_label_handles_garbage() {
        assert_eq!(age_label("not a timestamp"), "—");
    }

    #[test]
    fn age_label_parses_fresh_timestamps() {
        let label = age_label(&Local::now().to_rfc3339());
        assert_ne!(label, "—");
    }

    #[test]
    fn ranking_table_builds_for_empty_and_full_lists() {
        // Mostly a smoke test: the table must be constructible either way.
        let _ = ranking_table(&[], "ada");

        let records = vec![ScoreRecord {
            id: 1,
            owner: "ada".into(),
            score: 120.0,
            wpm: 42.0,
            accuracy: 96.5,
            created_at: Local::now().to_rfc3339(),
        }];
        let _ = ranking_table(&records, "ada");
    }
}
