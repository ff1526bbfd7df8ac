use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use figurechat_core::Sender;
use crate::app::{App, CharacterForm, Focus, FormField};

/// Number of terminal rows `text` takes when wrapped to `width` columns
fn wrapped_height(text: &Text, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [figures_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_figures(app, frame, figures_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);

    if let Some(form) = &app.character_form {
        render_character_form(form, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = app
        .status
        .as_deref()
        .map(|s| format!(" {}", s))
        .unwrap_or_default();

    let title = Line::from(vec![
        Span::styled(" Chat with a Historical Figure ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status, Style::default().fg(Color::Green)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = if app.character_form.is_some() {
        &[(" Tab ", " next field "), (" Enter ", " create "), (" Esc ", " cancel ")]
    } else {
        match app.focus {
            Focus::Figures => &[
                (" j/k ", " nav "),
                (" Enter ", " chat "),
                (" n ", " new character "),
                (" PgUp/PgDn ", " scroll "),
                (" q ", " quit "),
            ],
            Focus::Input => &[
                (" Enter ", " send "),
                (" Esc ", " figures "),
                (" PgUp/PgDn ", " scroll "),
            ],
        }
    };

    let mode = match (app.character_form.is_some(), app.focus) {
        (true, _) => Span::styled(" NEW ", Style::default().bg(Color::Magenta).fg(Color::White)),
        (false, Focus::Figures) => Span::styled(" FIGURES ", Style::default().bg(Color::Blue).fg(Color::White)),
        (false, Focus::Input) => Span::styled(" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let mut spans = vec![mode, Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_figures(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Figures && app.character_form.is_none();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let active_id = app.session.selected_figure().map(|f| f.id);

    let items: Vec<ListItem> = app
        .roster
        .figures()
        .iter()
        .map(|figure| {
            let marker = if Some(figure.id) == active_id { "● " } else { "  " };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(figure.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("  {}", figure.description),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Figures "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶");

    frame.render_stateful_widget(list, area, &mut app.figure_state);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let figure_name = app.session.selected_figure().map(|f| f.name.clone());
    let busy = app.session.is_busy();

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(match &figure_name {
            Some(name) => format!(" Chat with {} [{}] ", name, app.session.responder().label()),
            None => " Chat ".to_string(),
        });

    let chat_text = match &figure_name {
        None => Text::from(Span::styled(
            "Pick a figure to start chatting.",
            Style::default().fg(Color::DarkGray),
        )),
        Some(_) if app.session.messages().is_empty() && !busy => Text::from(Span::styled(
            "Start the conversation!",
            Style::default().fg(Color::DarkGray),
        )),
        Some(name) => {
            let mut lines: Vec<Line> = Vec::new();

            for msg in app.session.messages() {
                let label_color = match msg.sender {
                    Sender::User => Color::Cyan,
                    Sender::Figure(_) => Color::Yellow,
                    Sender::System => Color::Red,
                };
                lines.push(Line::from(Span::styled(
                    format!("{}:", msg.sender.label()),
                    Style::default().fg(label_color).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }

            if busy {
                lines.push(Line::from(Span::styled(
                    format!("{}:", name),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("Thinking{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }

            Text::from(lines)
        }
    };

    // Keep the newest message in view unless the user scrolled back
    let inner_height = chat_area.height.saturating_sub(2);
    let inner_width = chat_area.width.saturating_sub(2);
    app.chat_height = inner_height;
    let max_scroll = wrapped_height(&chat_text, inner_width).saturating_sub(inner_height);
    if app.follow_chat || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_chat = true;
    }

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area, figure_name.as_deref(), busy);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, figure_name: Option<&str>, busy: bool) {
    let editing = app.focus == Focus::Input && app.character_form.is_none();
    let border_color = if busy {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if busy { " Waiting for reply... " } else { " Message " });

    let pending = app.session.pending_input();
    let input = if pending.is_empty() {
        let placeholder = match figure_name {
            Some(name) => format!("Ask {} anything...", name),
            None => String::new(),
        };
        Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(pending)
    };
    frame.render_widget(input.block(input_block), area);

    if editing && !busy {
        let inner_width = area.width.saturating_sub(2);
        let cursor_x = (app.input_cursor as u16).min(inner_width.saturating_sub(1));
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_character_form(form: &CharacterForm, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 10;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height.min(area.height));

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Create a Custom Character ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let field_line = |label: &str, value: &str, active: bool| {
        let label_style = if active {
            Style::default().fg(Color::Magenta).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Line::from(vec![
            Span::styled(format!("{:<15}", label), label_style),
            Span::styled(value.to_string(), Style::default().fg(Color::White)),
        ])
    };

    let mut lines = vec![
        field_line("Character name", &form.name, form.field == FormField::Name),
        Line::default(),
        field_line("PDF path", &form.pdf, form.field == FormField::Pdf),
        Line::default(),
    ];

    if form.creating {
        lines.push(Line::from(Span::styled("Creating...", Style::default().fg(Color::Yellow))));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    } else {
        lines.push(Line::from(Span::styled(
            "The PDF is sent to the server, which trains the character.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    // Cursor at the end of the active field
    let (row, value) = match form.field {
        FormField::Name => (0, &form.name),
        FormField::Pdf => (2, &form.pdf),
    };
    let cursor_x = (15 + value.chars().count() as u16).min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + cursor_x, inner.y + row));
}
