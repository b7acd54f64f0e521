//! Field table: one row per telemetry field with its value, trend and rate.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Sparkline cells drawn per row.
const SPARKLINE_WIDTH: usize = 12;

/// Render the field table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.snapshot.fields.is_empty() {
        let waiting = format!(" Waiting for telemetry ({})", app.link.label());
        let paragraph = Paragraph::new(waiting)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block.title(" Fields "));
        frame.render_widget(paragraph, area);
        return;
    }

    let fields = app.visible_fields();

    let header = Row::new(vec!["Field", "Value", "Type", "Trend", "Δ/s"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = fields
        .iter()
        .map(|(name, value)| {
            let rate = app
                .history
                .field_rate(name)
                .map(|r| format!("{:+.2}", r))
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(name.to_string()),
                Cell::from(value.to_string()),
                Cell::from(value.kind()).style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(render_sparkline(&app.history.sparkline(name)))
                    .style(Style::default().fg(app.theme.highlight)),
                Cell::from(rate),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Length(6),
        Constraint::Length(SPARKLINE_WIDTH as u16),
        Constraint::Fill(1),
    ];

    let selected = app.selected_index.min(fields.len().saturating_sub(1));

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [Esc:clear]", app.filter_text)
    } else {
        String::new()
    };
    let position_info = if fields.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, fields.len())
    };
    let title = format!(
        " Fields ({}/{}){}{} ",
        fields.len(),
        app.snapshot.fields.len(),
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_sparkline(levels: &[u8]) -> String {
    if levels.is_empty() {
        return " ".repeat(SPARKLINE_WIDTH);
    }

    let skip = levels.len().saturating_sub(SPARKLINE_WIDTH);
    levels[skip..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}
