use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use ffbank_core::auth::Alert;

use crate::app::{App, AppState, LoginFocus};

use super::dashboard;
use super::styles;

/// Width of the fixed-size dialogs
const DIALOG_WIDTH: u16 = 46;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Overlays, lowest first
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::OfferingBiometrics => render_biometric_offer(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }

    if let Some(ref busy) = app.busy_message {
        render_busy_overlay(frame, busy);
    } else if let Some(alert) = app.alerts.front() {
        render_alert_overlay(frame, alert, app.alerts.len());
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  FFBank";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 2)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.is_authenticated() {
        dashboard::render(frame, app, area);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.busy_message, &app.status_message) {
        (Some(busy), _) => format!(" {} ", busy),
        (None, Some(msg)) => format!(" {} ", msg),
        (None, None) => String::from(" "),
    };

    let shortcuts = if app.is_authenticated() {
        "[u]pdate | [l]ogout | [q]uit"
    } else {
        "[Esc] quit"
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc.to_string(), styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 17, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!(" FFBank {}", version),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Transactions", styles::highlight_style())),
        help_line("↑/↓ j/k", "Move selection"),
        help_line("PgUp/PgDn", "Move by a page"),
        help_line("Enter", "Show details"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u / r", "Update balance and transactions"),
        help_line("l", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(DIALOG_WIDTH, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(format!("  {}", app.login_heading), styles::title_style())),
        Line::from(""),
    ];

    let nickname_focused = app.login_focus == LoginFocus::Nickname;
    let nickname_style = if nickname_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if nickname_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("  Nickname: [", styles::muted_style()),
        Span::styled(format!("{:<20}{}", app.login_nickname, cursor), nickname_style),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let masked = "*".repeat(app.login_password.chars().count().min(20));
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::styled("  Password: [", styles::muted_style()),
        Span::styled(format!("{:<20}{}", masked, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_biometric_offer(frame: &mut Frame) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 8, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(" Fingerprint unlock", styles::title_style())),
        Line::from(""),
        Line::from(" Sign in with your fingerprint next time?"),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to enable, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" for not now", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_alert_overlay(frame: &mut Frame, alert: &Alert, queued: usize) {
    let message_lines = alert.message.lines().count().max(1) as u16;
    let area = centered_rect_fixed(DIALOG_WIDTH, message_lines + 5, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = alert
        .message
        .lines()
        .map(|l| Line::from(format!(" {}", l)))
        .collect();
    lines.push(Line::from(""));
    let more = if queued > 1 {
        format!(" ({} more)", queued - 1)
    } else {
        String::new()
    };
    lines.push(Line::from(vec![
        Span::styled(" Press ", styles::muted_style()),
        Span::styled("Enter", styles::help_key_style()),
        Span::styled(format!(" to close{}", more), styles::muted_style()),
    ]));

    let title_style = if alert.title == "Error" {
        styles::error_style()
    } else {
        styles::title_style()
    };
    let block = Block::default()
        .title(format!(" {} ", alert.title))
        .title_style(title_style)
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_busy_overlay(frame: &mut Frame, message: &str) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 3, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        styles::highlight_style(),
    )))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(DIALOG_WIDTH, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
