use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use crate::app::{App, ChatRole, FilesSection, FocusPane, InputMode, Screen, SendPhase};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Agents => render_agents_screen(app, frame, body_area),
        Screen::Detail => render_detail_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_upload_prompt {
        render_upload_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let context = match (&app.agent, app.screen) {
        (Some(agent), Screen::Detail) => format!(" / {}", agent.name),
        _ => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Foundry ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(context, Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Agents, _) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" open ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" refresh ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::Detail, InputMode::Normal) => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" prompt ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
            ];
            if app.focus == FocusPane::Files {
                hints.extend(vec![
                    Span::styled(" s ", key_style),
                    Span::styled(" section ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" download ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" u ", key_style),
                Span::styled(" upload ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" back ", label_style),
            ]);
            hints
        }
        (Screen::Detail, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
    };

    let status = match app.send_phase {
        SendPhase::Idle => None,
        SendPhase::Sending => Some(("sending", Color::Yellow)),
        SendPhase::Streaming => Some(("streaming", Color::Green)),
        SendPhase::Failed => Some(("failed", Color::Red)),
    };
    if let Some((label, color)) = status {
        hints.push(Span::raw(" "));
        hints.push(Span::styled(
            format!(" {label} "),
            Style::default().bg(color).fg(Color::Black),
        ));
    }

    if let Some(notice) = &app.notice {
        hints.push(Span::raw(" "));
        hints.push(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_agents_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" AI Agents ");

    if app.agents.is_empty() {
        let empty = Paragraph::new(Text::from(Span::styled(
            "No agents available. Press 'r' to retry.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .agents
        .iter()
        .map(|agent| {
            let lines = vec![
                Line::from(Span::styled(
                    agent.name.as_str(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("  {}", agent.description),
                    Style::default().fg(Color::Gray),
                )),
            ];
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.agents_state);
}

fn render_detail_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_pane, files_pane] =
        Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)]).areas(area);

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(chat_pane);

    // Viewport size for scroll math (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_files(app, frame, files_pane);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let chat_focused = app.focus == FocusPane::Chat;
    let border_color = if chat_focused { Color::Cyan } else { Color::DarkGray };

    let title = match &app.agent {
        Some(agent) => format!(" {} ", agent.name),
        None => " Chat ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let chat_text = if app.messages.is_empty() && app.active_streams == 0 {
        Text::from(Span::styled(
            "Provide your prompt here",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.messages {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                ChatRole::Agent => {
                    lines.push(Line::from(Span::styled(
                        "Agent:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            for line in msg.text.lines() {
                lines.push(Line::from(line.to_string()));
            }
            if msg.text.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::default());
        }

        if app.active_streams > 0 {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Working{dots}"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing && !app.show_upload_prompt {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Prompt ");

    // Horizontal scroll keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing && !app.show_upload_prompt {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_files(app: &mut App, frame: &mut Frame, area: Rect) {
    let [uploads_area, outputs_area] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let files_focused = app.focus == FocusPane::Files;
    let uploads_color = if files_focused && app.files_section == FilesSection::Uploads {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let outputs_color = if files_focused && app.files_section == FilesSection::Outputs {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let uploads_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(uploads_color))
        .title(" Uploaded Files ");
    let uploads_items: Vec<ListItem> = app
        .uploads
        .iter()
        .map(|name| ListItem::new(format!(" {name} ")))
        .collect();
    let uploads_list = List::new(uploads_items)
        .block(uploads_block)
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
        .highlight_symbol("> ");
    frame.render_stateful_widget(uploads_list, uploads_area, &mut app.uploads_state);

    let outputs_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(outputs_color))
        .title(" Download Files ");
    let outputs_items: Vec<ListItem> = app
        .downloads
        .iter()
        .map(|name| ListItem::new(format!(" {name} ")))
        .collect();
    let outputs_list = List::new(outputs_items)
        .block(outputs_block)
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
        .highlight_symbol("> ");
    frame.render_stateful_widget(outputs_list, outputs_area, &mut app.outputs_state);
}

fn render_upload_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 3, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Upload file (path) ");

    let inner_width = popup.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.upload_cursor >= inner_width {
        app.upload_cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .upload_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Yellow))
        .block(block);
    frame.render_widget(input, popup);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (app.upload_cursor - scroll_offset) as u16;
        frame.set_cursor_position((popup.x + cursor_x + 1, popup.y + 1));
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
