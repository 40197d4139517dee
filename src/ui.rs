pub mod charting;
pub mod leaderboard;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::{App, AppState};
use quik::evaluator::CharOutcome;
use quik::metrics::std_dev;
use quik::session::SessionPhase;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::Menu => render_menu(app, f),
        AppState::History => leaderboard::render_history(app, f),
        AppState::Typing | AppState::Results => f.render_widget(app, f.area()),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            _ => {}
        }
    }
}

fn render_menu(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        "quik",
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let line = if app.session.phase() == SessionPhase::Loading {
        "fetching questions...".to_string()
    } else {
        format!(
            "{} questions from the {} pack, playing as {}",
            app.settings.questions,
            app.settings.pack.to_string().to_lowercase(),
            app.settings.player
        )
    };
    let subtitle = Paragraph::new(Span::styled(
        line,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(subtitle, chunks[2]);

    if let Some(notice) = app.notice.as_deref().or(app.session.notice()) {
        let notice = Paragraph::new(Span::styled(
            notice,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        f.render_widget(notice, chunks[4]);
    }

    let legend = Paragraph::new(Span::styled(
        "(enter) start / (h)istory / (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[6]);
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let Some(prompt) = app.session.current_prompt() else {
        return;
    };

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let mut question_lines =
        ((prompt.question.width() as f64 / max_chars_per_line as f64).ceil()) as u16;
    if prompt.question.width() <= max_chars_per_line as usize {
        question_lines = 1;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),                  // progress + clock
            Constraint::Min(1),                     // top padding
            Constraint::Length(question_lines + 1), // question
            Constraint::Length(1),                  // answer feedback
            Constraint::Min(1),                     // bottom padding
            Constraint::Length(1),                  // live stats
            Constraint::Length(1),                  // legend
        ])
        .split(area);

    let (current, total) = app.session.progress();
    let header = Paragraph::new(Span::styled(
        format!(
            "question {}/{}   {}s",
            current,
            total,
            app.session.elapsed_secs()
        ),
        dim_bold_style,
    ))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    let question = Paragraph::new(prompt.question.clone())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    question.render(chunks[2], buf);

    let spans = if let Some(revealed) = app.session.revealed_answer() {
        vec![
            Span::styled(
                revealed,
                Style::default()
                    .patch(bold_style)
                    .fg(Color::Yellow),
            ),
            Span::styled("  (skipped)", italic_style),
        ]
    } else {
        answer_spans(
            app,
            green_bold_style,
            red_bold_style,
            dim_bold_style,
            underlined_dim_bold_style,
        )
    };

    let answer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    answer.render(chunks[3], buf);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{:.0} wpm   {:.1}% acc   {}/{} keys",
            app.session.live_wpm(),
            app.session.live_accuracy(),
            app.session.correct_chars(),
            app.session.total_chars()
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    stats.render(chunks[5], buf);

    let legend = Paragraph::new(Span::styled(
        "(tab) skip / (esc) abandon",
        italic_style,
    ))
    .alignment(Alignment::Center);
    legend.render(chunks[6], buf);
}

/// One span per answer position: typed characters in green/red, the rest of
/// the answer as a dim placeholder with the cursor underlined. Wrong spaces
/// render as a visible dot.
fn answer_spans(
    app: &App,
    green_bold_style: Style,
    red_bold_style: Style,
    dim_bold_style: Style,
    underlined_dim_bold_style: Style,
) -> Vec<Span<'static>> {
    let outcomes = app.session.classify();
    let field: Vec<char> = app.session.field().chars().collect();
    let answer: Vec<char> = app
        .session
        .current_prompt()
        .map(|p| p.answer.chars().collect())
        .unwrap_or_default();

    outcomes
        .iter()
        .enumerate()
        .map(|(idx, outcome)| match outcome {
            CharOutcome::Correct => Span::styled(answer[idx].to_string(), green_bold_style),
            CharOutcome::Incorrect => Span::styled(
                match field[idx] {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            CharOutcome::Pending => {
                let style = if idx == field.len() {
                    underlined_dim_bold_style
                } else {
                    dim_bold_style
                };
                Span::styled(answer[idx].to_string(), style)
            }
        })
        .collect()
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let Some(summary) = app.session.summary() else {
        return;
    };

    let ranking_height = (app.ranking.len() as u16 + 3).min(13);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),                  // wpm chart
            Constraint::Length(1),               // summary stats
            Constraint::Length(1),               // notice
            Constraint::Length(ranking_height),  // leaderboard
            Constraint::Length(1),               // legend
        ])
        .split(area);

    let samples = app.session.wpm_samples();
    let (overall_duration, highest_wpm) = charting::compute_chart_params(samples);

    let tuples: Vec<(f64, f64)> = samples.iter().map(|s| (s.t, s.wpm)).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        );
    chart.render(chunks[0], buf);

    let consistency = std_dev(&samples.iter().map(|s| s.wpm).collect::<Vec<f64>>());
    let stats = Paragraph::new(Span::styled(
        format!(
            "{:.0} pts   {:.0} wpm   {:.1}% acc   {:.2} sd   {}s",
            summary.score,
            summary.wpm,
            summary.accuracy,
            consistency.unwrap_or(0.0),
            summary.elapsed_secs
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    stats.render(chunks[1], buf);

    if let Some(notice) = &app.notice {
        let notice = Paragraph::new(Span::styled(
            notice.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        notice.render(chunks[2], buf);
    }

    leaderboard::ranking_table(&app.ranking, &app.settings.player).render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled(
        String::from(if Browser::is_available() {
            "(r)etry / (h)istory / (t)weet / (esc) menu"
        } else {
            "(r)etry / (h)istory / (esc) menu"
        }),
        italic_style,
    ));
    legend.render(chunks[4], buf);

    if app.celebration.is_active {
        render_celebration_particles(app, area, buf);
    }
}

/// Render celebration particles on top of the results screen
fn render_celebration_particles(app: &App, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &app.celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let alpha = particle.fade();

            let style = if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}
