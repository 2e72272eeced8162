use std::cmp::Ordering;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use arithmo::stats::{OperatorStats, StatsReport};

use crate::{App, SortBy};

/// Operator rows ordered for display.
pub fn sorted_rows(report: &StatsReport, sort_by: SortBy, ascending: bool) -> Vec<OperatorStats> {
    let mut rows = report.operators.clone();
    rows.sort_by(|a, b| {
        let cmp = match sort_by {
            SortBy::Operator => a.operator.cmp(&b.operator),
            SortBy::Attempts => a.attempts.cmp(&b.attempts),
            SortBy::Accuracy => a.accuracy.partial_cmp(&b.accuracy).unwrap_or(Ordering::Equal),
            SortBy::AvgTime => a
                .average_time
                .partial_cmp(&b.average_time)
                .unwrap_or(Ordering::Equal),
        };
        if ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
    rows
}

pub fn present_row(stats: &OperatorStats) -> Row<'static> {
    let accuracy_color = if stats.accuracy >= 90.0 {
        Color::Green
    } else if stats.accuracy >= 70.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let time_color = if stats.average_time < 5.0 {
        Color::Green
    } else if stats.average_time < 10.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(stats.operator.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{} ({} correct)", stats.attempts, stats.correct)),
        Cell::from(format!("{:.1}", stats.accuracy)).style(Style::default().fg(accuracy_color)),
        Cell::from(format!("{:.1}", stats.average_time)).style(Style::default().fg(time_color)),
    ])
}

fn overview_lines(report: &StatsReport) -> Vec<Line<'static>> {
    let practice = &report.practice;
    let challenge = &report.challenge;
    vec![
        Line::from(format!(
            "Practice:   {} answered, {} correct, {:.1}% accuracy, {:.1}s average",
            practice.total_questions,
            practice.correct_answers,
            practice.accuracy,
            practice.average_time
        )),
        Line::from(format!(
            "Challenges: {} played, {}/{} attempted, {:.1}% accuracy, {:.1}% completion",
            challenge.total_challenges,
            challenge.attempted_questions,
            challenge.total_questions,
            challenge.accuracy,
            challenge.completion_rate
        )),
    ]
}

/// Render the Statistics screen
pub fn render_stats(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let stats = &mut app.stats_state;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(4), // Overview
            Constraint::Min(0),    // Operator table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let sort_direction = if stats.sort_ascending { "↑" } else { "↓" };
    let sort_by_text = match stats.sort_by {
        SortBy::Operator => "Operator",
        SortBy::Attempts => "Attempts",
        SortBy::Accuracy => "Accuracy",
        SortBy::AvgTime => "Avg Time",
    };
    let title = Paragraph::new(format!(
        "Statistics, last {} days (Sort: {sort_by_text} {sort_direction})",
        stats.report.days
    ))
    .block(Block::default().borders(Borders::ALL).title("Stats"))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    f.render_widget(
        Paragraph::new(overview_lines(&stats.report))
            .block(Block::default().borders(Borders::ALL).title("Overview")),
        chunks[1],
    );

    if stats.report.operators.is_empty() {
        let no_data = Paragraph::new("No practice history yet. Answer a few problems first.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[2]);
    } else {
        let rows = sorted_rows(&stats.report, stats.sort_by, stats.sort_ascending);

        let table_height = chunks[2].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = rows.len().saturating_sub(table_height);
        stats.scroll_offset = stats.scroll_offset.min(max_scroll);

        let indicator = |column: SortBy| {
            if stats.sort_by == column {
                sort_direction
            } else {
                ""
            }
        };
        let header = Row::new(vec![
            Cell::from(format!("Op {}", indicator(SortBy::Operator))),
            Cell::from(format!("Attempts {}", indicator(SortBy::Attempts))),
            Cell::from(format!("Accuracy (%) {}", indicator(SortBy::Accuracy))),
            Cell::from(format!("Avg Time (s) {}", indicator(SortBy::AvgTime))),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = rows
            .iter()
            .skip(stats.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Length(22),
            Constraint::Length(16),
            Constraint::Min(14),
        ];

        let table = Table::new(visible_rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("By Operator"),
            )
            .column_spacing(2);
        f.render_widget(table, chunks[2]);
    }

    let instructions = Paragraph::new(
        "(↑/↓) scroll  (1-4) sort  (space) direction  (r)eload  (b/backspace) back  (esc)ape",
    )
    .alignment(Alignment::Center)
    .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[3]);
}
