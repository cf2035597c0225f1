use crate::{
    app::{App, Focus},
    form::{FormField, TaskInput},
    persistence::TaskPersistence,
    task_list::{RowMode, TaskRow},
};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

pub fn run_app<B: Backend, P: TaskPersistence>(
    terminal: &mut Terminal<B>,
    app: &mut App<P>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

/// Style for a row's priority class.
pub fn class_style(class: &str) -> Style {
    match class {
        "priority-high" => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        "priority-medium" => Style::default().fg(Color::Yellow),
        "priority-low" => Style::default().fg(Color::Green),
        _ => Style::default(),
    }
}

fn hint(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn field_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{label:<13}"), style),
        Span::styled(value, style),
    ])
}

/// Description, priority select and date field of a task input.
fn input_lines(input: &TaskInput, active: bool) -> Vec<Line<'static>> {
    let focused = |field: FormField| active && input.focus == field;
    let cursor = |field: FormField| if focused(field) { "_" } else { "" };
    let due = if input.due_date.is_empty() && !focused(FormField::DueDate) {
        "yyyy-mm-dd".to_string()
    } else {
        format!("{}{}", input.due_date, cursor(FormField::DueDate))
    };
    vec![
        field_line(
            "Description:",
            format!("{}{}", input.description, cursor(FormField::Description)),
            focused(FormField::Description),
        ),
        field_line(
            "Priority:",
            format!("< {} >", input.priority),
            focused(FormField::Priority),
        ),
        field_line("Due date:", due, focused(FormField::DueDate)),
    ]
}

/// Projects one task row into display lines.
pub fn row_lines(row: &TaskRow) -> Vec<Line<'static>> {
    let task = row.task();
    match row.mode() {
        RowMode::Viewing => vec![Line::from(vec![
            Span::styled(
                format!("[{}] ", task.priority),
                class_style(task.priority.class_name()),
            ),
            Span::styled(task.description.clone(), Style::default().fg(Color::White)),
            Span::raw(format!(" (Due: {})", task.due_date)),
            hint("  [e]dit [d]elete"),
        ])],
        RowMode::Editing(draft) => {
            let mut lines = input_lines(draft, true);
            lines.push(Line::from(hint(
                "[Enter] save  [Esc] cancel  [Tab] next field",
            )));
            lines
        }
    }
}

pub fn task_row_item(row: &TaskRow) -> ListItem<'static> {
    ListItem::new(row_lines(row))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn footer_hint<P: TaskPersistence>(app: &App<P>) -> &'static str {
    if app.alert.is_some() {
        return "[Enter] dismiss";
    }
    match app.focus {
        Focus::Form => "[Enter] add  [Tab] next field  [Esc] list  [Ctrl+S] sort  [Ctrl+C] quit",
        Focus::List if app.editing_row().is_some() => "[Enter] save  [Esc] cancel",
        Focus::List => "[e]dit  [d]elete  [s]ort by priority  [a]dd  [q]uit",
    }
}

pub fn render<P: TaskPersistence>(f: &mut Frame, app: &App<P>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(f.area());

    let focus_border = |focus: Focus| {
        if app.focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };

    let form = Paragraph::new(input_lines(&app.form.input, app.focus == Focus::Form)).block(
        Block::default()
            .title("New task")
            .borders(Borders::ALL)
            .border_style(focus_border(Focus::Form)),
    );
    f.render_widget(form, chunks[0]);

    let items: Vec<ListItem> = app.list.rows().iter().map(task_row_item).collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title("Tasks")
                .borders(Borders::ALL)
                .border_style(focus_border(Focus::List)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == Focus::List && !app.list.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);

    let footer = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                app.list.count_label(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            hint(&app.status),
        ]),
        Line::from(hint(footer_hint(app))),
    ]);
    f.render_widget(footer, chunks[2]);

    if let Some(message) = &app.alert {
        let area = centered(f.area(), 50, 6);
        let alert = Paragraph::new(vec![
            Line::from(message.clone()),
            Line::from(""),
            Line::from(hint("[Enter] OK")),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Alert")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(Clear, area);
        f.render_widget(alert, area);
    }
}
