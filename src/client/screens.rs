use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};
use ratatui::Frame;

use super::components::{DashboardUI, FocusedWidget, FormField, FormInput, LoginField};
use crate::models::schema::TablePreview;
use crate::navigation::{Browsing, Level, Notice, ViewState};

pub fn draw(f: &mut Frame, ui: &DashboardUI) {
    match ui.navigator.state() {
        ViewState::LoggedOut { notice } => render_login_screen(f, ui, notice.as_ref()),
        ViewState::LoggedIn(browsing) => {
            render_browser_screen(f, ui, browsing);
            if let Some(form) = &ui.form {
                render_form_popup(f, form);
            }
        }
    }
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::Yellow)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn key_hint(key: &str, color: Color) -> Span<'_> {
    Span::styled(
        key,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn notice_line(notice: Option<&Notice>) -> Line<'_> {
    match notice {
        Some(Notice::Success(message)) => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Green),
        )),
        Some(Notice::Error(message)) => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(""),
    }
}

fn render_login_screen(f: &mut Frame, ui: &DashboardUI, notice: Option<&Notice>) {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(30),
                Constraint::Length(5),
                Constraint::Length(4),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let horizontal_layout = centered_rect(50, vertical_chunks[1]);

    let block = Block::default()
        .title("Connect to Snowflake")
        .borders(Borders::ALL)
        .title_alignment(Alignment::Center);

    let input = &ui.login_input;
    let mut content = [
        format!("Username: {}", input.username),
        format!("Password: {}", "*".repeat(input.password.chars().count())),
    ];
    let current = match input.current_field {
        LoginField::Username => 0,
        LoginField::Password => 1,
    };
    content[current].push_str(" <");

    let input_paragraph = Paragraph::new(content.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(input_paragraph, horizontal_layout);

    let notice_paragraph = Paragraph::new(notice_line(notice))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(notice_paragraph, centered_rect(70, vertical_chunks[2]));

    let help_message = Line::from(vec![
        key_hint("Enter", Color::Green),
        Span::raw(" to confirm input, "),
        key_hint("Tab", Color::Yellow),
        Span::raw(" to switch field, "),
        key_hint("Esc", Color::Red),
        Span::raw(" to quit"),
    ]);
    f.render_widget(
        Paragraph::new(help_message).alignment(Alignment::Center),
        vertical_chunks[4],
    );
}

fn render_browser_screen(f: &mut Frame, ui: &DashboardUI, browsing: &Browsing) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let level_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4].as_ref())
        .split(chunks[0]);

    for (level, area) in Level::ALL.iter().zip(level_chunks.iter()) {
        render_level_list(f, ui, browsing, *level, *area);
    }

    render_preview(
        f,
        browsing.preview.as_ref(),
        ui.preview_offset,
        ui.current_focus == FocusedWidget::Preview,
        chunks[1],
    );

    let status = Paragraph::new(notice_line(browsing.notice.as_ref()))
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, chunks[2]);

    let help_message = Line::from(vec![
        key_hint("Tab", Color::Yellow),
        Span::raw(" pane, "),
        key_hint("Enter", Color::Green),
        Span::raw(" select, "),
        key_hint("w/d/s/t", Color::Cyan),
        Span::raw(" create, "),
        key_hint("r", Color::Yellow),
        Span::raw(" refresh, "),
        key_hint("l", Color::Yellow),
        Span::raw(" logout, "),
        key_hint("q", Color::Red),
        Span::raw(" quit"),
    ]);
    f.render_widget(
        Paragraph::new(help_message).alignment(Alignment::Center),
        chunks[3],
    );
}

fn render_level_list(f: &mut Frame, ui: &DashboardUI, browsing: &Browsing, level: Level, area: Rect) {
    let focused = ui.current_focus == FocusedWidget::Level(level);
    let selected = browsing.selection.get(level);

    let items: Vec<ListItem> = browsing
        .options
        .get(level)
        .iter()
        .map(|name| {
            let style = if Some(name.as_str()) == selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(name.as_str()).style(style)
        })
        .collect();

    let title = match selected {
        Some(name) => format!("{}s [{}]", level, name),
        None => format!("{}s", level),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        });

    let list = List::new(items)
        .block(block)
        .highlight_style(if focused { highlight() } else { Style::default() });

    let mut state = ListState::default();
    if focused && !browsing.options.get(level).is_empty() {
        state.select(Some(ui.cursor(level)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_preview(
    f: &mut Frame,
    preview: Option<&TablePreview>,
    offset: usize,
    focused: bool,
    area: Rect,
) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let Some(preview) = preview else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Preview")
            .border_style(border_style);
        let placeholder = Paragraph::new("Select a table to preview its rows")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(placeholder, area);
        return;
    };

    let location = &preview.location;
    let title = format!(
        "Table: {}  Schema: {}  Database: {}  ({} rows)",
        location.table,
        location.schema,
        location.database,
        preview.rows().len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style);

    let header = Row::new(
        preview
            .columns()
            .iter()
            .map(|column| Cell::from(column.as_str())),
    )
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows = preview.rows().iter().skip(offset).map(|row| {
        Row::new(row.iter().map(|value| match value {
            Some(text) => Cell::from(text.as_str()),
            None => Cell::from("NULL").style(Style::default().fg(Color::DarkGray)),
        }))
    });

    let count = preview.columns().len().max(1) as u32;
    let widths = vec![Constraint::Ratio(1, count); preview.columns().len()];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn render_form_popup(f: &mut Frame, form: &FormInput) {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Length(6),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(f.area());
    let area = centered_rect(60, vertical_chunks[1]);

    let block = Block::default()
        .title(format!("Create {}", form.kind.as_str().to_lowercase()))
        .borders(Borders::ALL)
        .title_alignment(Alignment::Center)
        .border_style(Style::default().fg(Color::Cyan));

    let mut lines = vec![format!("Name: {}", form.name)];
    if form.has_columns() {
        lines.push(format!("Columns (e.g. id INT, name VARCHAR(100)): {}", form.columns));
    }
    let current = match form.current_field {
        FormField::Name => 0,
        FormField::Columns => 1,
    };
    if let Some(line) = lines.get_mut(current) {
        line.push_str(" <");
    }
    lines.push(String::new());
    lines.push("Enter to submit, Esc to cancel".to_string());

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines.join("\n"))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    popup_layout[1]
}
