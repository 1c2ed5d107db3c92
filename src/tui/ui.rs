use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::guard::Route;
use crate::models::{CycleSubjectStatus, Priority};
use crate::timer::{format_clock, TimerPhase, TimerTarget};

use super::app::{App, InputField, InputMode, MENU};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Page
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    render_header(f, app, chunks[0]);

    match app.route {
        Route::Login => render_login(f, app, chunks[1]),
        Route::Dashboard => render_dashboard(f, app, chunks[1]),
        Route::Subjects => render_subjects(f, app, chunks[1], "Subjects"),
        Route::Tasks => render_tasks(f, app, chunks[1]),
        Route::Plans => render_plans(f, app, chunks[1]),
        Route::Cycles => render_cycles(f, app, chunks[1]),
        Route::StudySession => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Min(0)].as_ref())
                .split(chunks[1]);
            render_timer(f, app, parts[0]);
            render_subjects(f, app, parts[1], "Pick a subject (s: start)");
        }
        other => {
            let text = format!("{}\n\nThis page is not available in the terminal.", other.title());
            let page = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL).title(other.title()));
            f.render_widget(page, chunks[1]);
        }
    }

    render_help(f, app, chunks[2]);

    if app.input_mode == InputMode::Editing {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_field {
            InputField::Email => "Email",
            InputField::Password => "Password",
            InputField::SessionTitle => "Session title",
            InputField::StopNotes => "Notes (optional)",
            InputField::None => "",
        };
        let shown = if app.input_field == InputField::Password {
            "*".repeat(app.input_buffer.chars().count())
        } else {
            app.input_buffer.clone()
        };
        let input = Paragraph::new(shown)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let user = app
        .session
        .user()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "not logged in".to_string());
    let mut text = format!("Studyust - {} | {}", app.route.title(), user);
    if !app.store.timer().is_idle() {
        text.push_str(&format!(" | {} {}", phase_label(app.store.timer().phase()), format_clock(app.store.elapsed())));
    }
    let header = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_login(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from("Sign in to continue."),
        Line::from(""),
        Line::from(format!("Demo account: {} / {}", crate::auth::DEMO_EMAIL, crate::auth::DEMO_PASSWORD)),
    ];
    if let Some(url) = app.session.return_url() {
        lines.push(Line::from(format!("You will be taken to {} after login.", url)));
    }
    let page = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Login"));
    f.render_widget(page, area);
}

fn render_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.store.study_stats();
    let mut lines = vec![
        Line::from(format!("Total hours:    {:.1}", stats.total_hours)),
        Line::from(format!("This week:      {:.1}", stats.weekly_hours)),
        Line::from(format!("This month:     {:.1}", stats.monthly_hours)),
        Line::from(format!("Tasks:          {} done, {} pending", stats.completed_tasks, stats.pending_tasks)),
        Line::from(""),
    ];
    match app.store.active_plan() {
        Some(plan) => {
            let progress = app.store.plan_progress(&plan.id).unwrap_or(0.0);
            lines.push(Line::from(format!("Active plan:    {} ({:.0}%)", plan.name, progress)));
        }
        None => lines.push(Line::from("Active plan:    none")),
    }
    match app.store.active_cycle() {
        Some(cycle) => {
            let progress = app.store.cycle_progress(&cycle.id).map(|p| p.percent).unwrap_or(0.0);
            lines.push(Line::from(format!("Active cycle:   {} ({:.0}%)", cycle.name, progress)));
        }
        None => lines.push(Line::from("Active cycle:   none")),
    }
    lines.push(Line::from(""));
    for subject in app.store.subjects() {
        let progress = stats.subject_progress.get(&subject.id).copied().unwrap_or(0.0);
        lines.push(Line::from(format!("  {:<24} {:>5.0}%", subject.name, progress)));
    }
    let page = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Dashboard"));
    f.render_widget(page, area);
}

fn render_subjects(f: &mut Frame, app: &mut App, area: Rect, title: &str) {
    let rows: Vec<Row> = app
        .store
        .subjects()
        .iter()
        .map(|s| {
            let progress = app.store.subject_progress(&s.id).unwrap_or(0.0);
            let done = s.topics.iter().filter(|t| t.completed).count();
            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(format!("{}/{}", done, s.topics.len())),
                Cell::from(format!("{:.1}/{:.1}", s.studied_hours, s.total_hours)),
                Cell::from(format!("{:.0}%", progress)),
            ])
            .style(Style::default().fg(progress_color(progress)))
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Name", "Topics", "Hours", "Progress"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let today = chrono::Local::now().date_naive();
    let rows: Vec<Row> = app
        .store
        .tasks()
        .iter()
        .map(|t| {
            let subject = app.store.subject(&t.subject_id).map(|s| s.name.clone()).unwrap_or_default();
            let style = if t.completed {
                Style::default().fg(Color::DarkGray)
            } else if t.due_date < today {
                Style::default().fg(Color::Red)
            } else {
                match t.priority {
                    Priority::High => Style::default().fg(Color::Yellow),
                    Priority::Medium => Style::default(),
                    Priority::Low => Style::default().fg(Color::Green),
                }
            };
            Row::new(vec![
                Cell::from(t.title.clone()),
                Cell::from(subject),
                Cell::from(t.due_date.to_string()),
                Cell::from(t.priority.to_string()),
                Cell::from(if t.completed { "Done" } else { "Pending" }),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Title", "Subject", "Due", "Priority", "Status"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_plans(f: &mut Frame, app: &mut App, area: Rect) {
    let active = app.store.active_plan().map(|p| p.id.clone());
    let rows: Vec<Row> = app
        .store
        .plans()
        .iter()
        .map(|p| {
            let progress = app.store.plan_progress(&p.id).unwrap_or(0.0);
            Row::new(vec![
                Cell::from(if active.as_deref() == Some(p.id.as_str()) { "*" } else { "" }),
                Cell::from(p.name.clone()),
                Cell::from(p.status.to_string()),
                Cell::from(format!("{} - {}", p.start_date, p.end_date)),
                Cell::from(format!("{:.1}h/day", p.daily_hours_goal)),
                Cell::from(format!("{:.0}%", progress)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(24),
        Constraint::Length(10),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["", "Name", "Status", "Dates", "Goal", "Progress"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Study Plans"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_cycles(f: &mut Frame, app: &mut App, area: Rect) {
    let active = app.store.active_cycle().map(|c| c.id.clone());
    let rows: Vec<Row> = app
        .store
        .cycles()
        .iter()
        .flat_map(|c| c.subjects.iter().map(move |cs| (c, cs)))
        .map(|(c, cs)| {
            let subject = app.store.subject(&cs.subject_id).map(|s| s.name.clone()).unwrap_or_default();
            let marker = if active.as_deref() == Some(c.id.as_str()) { "*" } else { "" };
            let style = match cs.status {
                CycleSubjectStatus::Studying => Style::default().fg(Color::Yellow),
                CycleSubjectStatus::Paused => Style::default().fg(Color::Magenta),
                CycleSubjectStatus::Completed => Style::default().fg(Color::Green),
                CycleSubjectStatus::Pending => Style::default(),
            };
            Row::new(vec![
                Cell::from(format!("{}{}", marker, c.name)),
                Cell::from(subject),
                Cell::from(format!("{}/{}", cs.actual_minutes, cs.planned_minutes)),
                Cell::from(cs.status.to_string()),
                Cell::from(
                    cs.review_at
                        .map(|r| r.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                ),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(17),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Cycle", "Subject", "Minutes", "Status", "Review"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Study Cycles"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_timer(f: &mut Frame, app: &App, area: Rect) {
    let timer = app.store.timer();
    let what = match timer.target() {
        Some(TimerTarget::Session { subject_id, title, .. }) => {
            let subject = app.store.subject(subject_id).map(|s| s.name.as_str()).unwrap_or("?");
            format!("{} ({})", title, subject)
        }
        Some(TimerTarget::CycleSubject { cycle_id, .. }) => {
            let cycle = app.store.cycle(cycle_id).map(|c| c.name.as_str()).unwrap_or("?");
            format!("Cycle: {}", cycle)
        }
        None => "No session running".to_string(),
    };
    let lines = vec![
        Line::from(what),
        Line::from(format!("{}  [{}]", format_clock(app.store.elapsed()), phase_label(timer.phase()))),
    ];
    let page = Paragraph::new(lines)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Timer"));
    f.render_widget(page, area);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.input_mode {
        InputMode::Editing => "Enter: Confirm | Esc: Cancel".to_string(),
        InputMode::Normal => {
            let menu = MENU
                .iter()
                .map(|(key, route)| format!("{}: {}", key, route.title()))
                .collect::<Vec<_>>()
                .join(" | ");
            let page = match app.route {
                Route::Tasks => " | Space: Done | d: Del",
                Route::Plans => " | Enter: Activate",
                Route::Cycles => " | Enter: Start | a: Activate | p/r/x: Pause/Resume/Stop",
                Route::Subjects => " | s: Start session",
                Route::StudySession => " | s: Start | p: Pause | r: Resume | x: Stop",
                _ => "",
            };
            format!("q: Quit | o: Logout | {}{}", menu, page)
        }
    };
    let mut help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    if let Some(status) = &app.status {
        help = help.block(Block::default().borders(Borders::ALL).title(status.clone()));
    }
    f.render_widget(help, area);
}

fn phase_label(phase: TimerPhase) -> &'static str {
    match phase {
        TimerPhase::Idle => "idle",
        TimerPhase::Running => "running",
        TimerPhase::Paused => "paused",
    }
}

fn progress_color(percent: f64) -> Color {
    if percent >= 100.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::White
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
