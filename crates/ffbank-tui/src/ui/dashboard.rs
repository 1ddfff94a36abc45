use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use ffbank_core::dashboard::NO_TRANSACTIONS_MESSAGE;
use ffbank_core::models::Direction as MoneyDirection;
use ffbank_core::utils::{format_currency, initial, truncate_string};

use crate::app::App;
use crate::ui::styles;

/// Widest description shown in the table before truncation
const DESCRIPTION_MAX_CHARS: usize = 40;

/// Render the signed-in dashboard: greeting, balance and transactions
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Greeting
            Constraint::Length(5), // Balance card
            Constraint::Min(5),    // Transactions
        ])
        .split(area);

    render_greeting(frame, app, chunks[0]);
    render_balance(frame, app, chunks[1]);
    render_transactions(frame, app, chunks[2]);
}

fn render_greeting(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.greeting_name().unwrap_or_default();
    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(format!(" {} ", initial(name)), styles::avatar_style()),
        Span::raw("  "),
        Span::styled(format!("Hello, {}", name), styles::title_style()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_balance(frame: &mut Frame, app: &App, area: Rect) {
    let amount = match app.dashboard.balance {
        Some(balance) => Span::styled(format_currency(balance.amount), styles::balance_style()),
        None => Span::styled("--", styles::muted_style()),
    };

    let mut lines = vec![
        Line::from(Span::styled(" Available balance", styles::muted_style())),
        Line::from(vec![Span::raw(" "), amount]),
    ];
    if let Some(updated) = app.dashboard.updated_display() {
        lines.push(Line::from(Span::styled(format!(" {}", updated), styles::muted_style())));
    }

    let block = Block::default()
        .title(" Balance ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_transactions(frame: &mut Frame, app: &App, area: Rect) {
    let transactions = &app.dashboard.transactions;
    let title = format!(" Transactions ({}) ", transactions.len());
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if transactions.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!(" {}", NO_TRANSACTIONS_MESSAGE),
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new([
        Cell::from("Description"),
        Cell::from("Counterparty"),
        Cell::from("Date"),
        Cell::from("Amount"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = transactions
        .iter()
        .map(|t| {
            let amount_style = match t.direction() {
                MoneyDirection::Incoming => styles::incoming_style(),
                MoneyDirection::Outgoing => styles::outgoing_style(),
            };
            Row::new(vec![
                Cell::from(truncate_string(&t.description, DESCRIPTION_MAX_CHARS)),
                Cell::from(t.counterparty_label()),
                Cell::from(t.display_date()),
                Cell::from(Span::styled(format!("{:>14}", t.signed_amount()), amount_style)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(10),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.selection));

    frame.render_stateful_widget(table, area, &mut state);
}
