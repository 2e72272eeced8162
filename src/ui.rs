pub mod operator_stats;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use arithmo::{
    attempt::Attempt,
    problem::{Difficulty, Operator},
};

use crate::{App, AppState, Feedback};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Practice => render_practice(self, area, buf),
            AppState::PracticeSummary => render_summary(self, area, buf),
            AppState::Challenge => render_challenge(self, area, buf),
            AppState::ChallengeResults => render_results(self, area, buf),
            // drawn by operator_stats with access to the frame
            AppState::Stats => {}
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_italic() -> Style {
    Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::DIM | Modifier::ITALIC)
}

/// Header, question, answer box, feedback and key help, top to bottom.
fn question_layout(area: Rect) -> [Rect; 5] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3], chunks[4]]
}

fn question_widget(attempt: Option<&Attempt>) -> Paragraph<'static> {
    let text = attempt
        .map(|a| a.problem.question())
        .unwrap_or_else(|| "…".to_string());
    Paragraph::new(Line::from(Span::styled(text, bold().fg(Color::Cyan))))
        .alignment(Alignment::Center)
}

fn answer_widget(input: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled(input.to_string(), bold()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Answer"))
}

fn feedback_line(feedback: Option<&Feedback>) -> Line<'static> {
    match feedback {
        None => Line::default(),
        Some(Feedback::Correct) => Line::from(Span::styled("Correct!", bold().fg(Color::Green))),
        Some(Feedback::Incorrect { correct_answer }) => Line::from(Span::styled(
            format!("Incorrect. The answer is {correct_answer}"),
            bold().fg(Color::Red),
        )),
        Some(Feedback::NotANumber) => Line::from(Span::styled(
            "Please enter a whole number",
            bold().fg(Color::Yellow),
        )),
        Some(Feedback::Notice(text)) => {
            Line::from(Span::styled(text.clone(), Style::default().fg(Color::Yellow)))
        }
    }
}

fn help_widget(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(text, dim_italic())).alignment(Alignment::Center)
}

fn render_practice(app: &App, area: Rect, buf: &mut Buffer) {
    let [header, question, answer, feedback, help] = question_layout(area);
    let practice = app.trainer.practice();

    let position = practice.cursor().map_or(0, |c| c + 1);
    Paragraph::new(Line::from(vec![
        Span::styled("Practice", bold().fg(Color::Magenta)),
        Span::raw(format!(
            "  {} · {}  problem {}/{}  score {}",
            practice.difficulty(),
            practice.operators(),
            position,
            practice.attempts().len(),
            practice.score()
        )),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM))
    .render(header, buf);

    question_widget(practice.current()).render(question, buf);
    answer_widget(&app.input).render(answer, buf);
    Paragraph::new(feedback_line(app.feedback.as_ref()))
        .alignment(Alignment::Center)
        .render(feedback, buf);
    help_widget("(enter) submit  (←/→) previous/next  (tab) summary  (s)tats  (esc)ape")
        .render(help, buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(6),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let summary = app.trainer.practice().summary();
    Paragraph::new(vec![
        Line::from(format!("Problems seen:  {}", summary.total_generated)),
        Line::from(format!("Answered:       {}", summary.total_answered)),
        Line::from(format!("Correct:        {}", summary.correct)),
        Line::from(format!("Accuracy:       {:.1}%", summary.accuracy)),
        Line::from(format!("Score:          {}", app.trainer.practice().score())),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Session Summary"),
    )
    .render(chunks[0], buf);

    let settings = app.trainer.settings();
    let difficulty_spans = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        .iter()
        .enumerate()
        .map(|(idx, d)| {
            let style = if *d == settings.difficulty {
                bold().fg(Color::Green)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Span::styled(format!(" ({}){} ", idx + 1, d), style)
        });
    let operator_spans = Operator::ALL.iter().map(|op| {
        let style = if settings.operations.contains(op) {
            bold().fg(Color::Green)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        Span::styled(format!(" [{op}] "), style)
    });

    Paragraph::new(vec![
        Line::from(
            std::iter::once(Span::raw("Difficulty: "))
                .chain(difficulty_spans)
                .collect::<Vec<_>>(),
        ),
        Line::from(
            std::iter::once(Span::raw("Operators:  "))
                .chain(operator_spans)
                .collect::<Vec<_>>(),
        ),
        Line::from(format!(
            "Challenge:  {} questions in {}s",
            settings.timed_mode.question_count, settings.timed_mode.time_limit
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Settings"))
    .wrap(Wrap { trim: true })
    .render(chunks[1], buf);

    Paragraph::new(feedback_line(app.feedback.as_ref()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    help_widget("(1-3) difficulty  (+ - * /) toggle operator  (n)ew session  (c)hallenge  (s)tats  (tab) back")
        .render(chunks[3], buf);
}

fn render_challenge(app: &App, area: Rect, buf: &mut Buffer) {
    let [header, question, answer, feedback, help] = question_layout(area);
    let challenge = app.trainer.challenge();
    let progress = challenge.progress();

    let ratio = match challenge.time_limit() {
        limit if limit > 0.0 => (progress.remaining_time / limit).clamp(0.0, 1.0),
        _ => 0.0,
    };
    let gauge_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };

    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Challenge  question {}/{}  correct {}",
            progress.current, progress.total, progress.correct
        )))
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!("{:.0}s", progress.remaining_time.ceil()))
        .render(header, buf);

    question_widget(challenge.current()).render(question, buf);
    answer_widget(&app.input).render(answer, buf);
    Paragraph::new(feedback_line(app.feedback.as_ref()))
        .alignment(Alignment::Center)
        .render(feedback, buf);
    help_widget("(enter) submit  (esc)ape").render(help, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let challenge = app.trainer.challenge();
    let results = challenge.results();

    let mut lines = vec![
        feedback_line(app.feedback.as_ref()),
        Line::from(format!("Questions:  {}", results.total_questions)),
        Line::from(format!("Attempted:  {}", results.attempted)),
        Line::from(format!("Correct:    {}", results.correct)),
        Line::from(format!("Accuracy:   {:.1}%", results.accuracy)),
        Line::from(format!("Time:       {:.1}s", results.time_taken)),
    ];
    if results.total_questions > 0 && results.correct == results.total_questions {
        lines.push(Line::from(Span::styled(
            "Perfect round!",
            bold().fg(Color::Magenta),
        )));
    }
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .render(chunks[0], buf);

    let questions: Vec<String> = challenge
        .attempts()
        .iter()
        .map(|a| a.problem.to_string())
        .collect();
    let column = questions.iter().map(|q| q.width()).max().unwrap_or(0);

    let answers: Vec<Line> = challenge
        .attempts()
        .iter()
        .zip(&questions)
        .map(|(attempt, question)| {
            let (mark, style) = match attempt.is_correct {
                Some(true) => ("✓", Style::default().fg(Color::Green)),
                Some(false) => ("✗", Style::default().fg(Color::Red)),
                None => ("·", Style::default().add_modifier(Modifier::DIM)),
            };
            let given = attempt
                .submitted_answer
                .map_or_else(|| "-".to_string(), |a| a.to_string());
            Line::from(vec![
                Span::styled(format!("{mark} "), style),
                Span::raw(format!(
                    "{question}{}  {given:>6}  (answer {})",
                    " ".repeat(column - question.width()),
                    attempt.problem.correct_answer
                )),
            ])
        })
        .collect();
    Paragraph::new(answers)
        .block(Block::default().borders(Borders::ALL).title("Answers"))
        .render(chunks[1], buf);

    help_widget("(c) new challenge  (enter) practice  (s)tats  (esc)ape").render(chunks[2], buf);
}
