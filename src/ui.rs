use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use crate::app::{App, FocusPane, InputMode};
use crate::conversation::{MessageKind, Role};
use crate::sources::EMPTY_PLACEHOLDER;

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

    // Body: panes on top, question input at the bottom
    let [panes_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(body_area);

    if app.sidebar.is_collapsed() {
        app.chat_area = Some(panes_area);
        app.sources_area = None;
        render_chat(app, frame, panes_area);
    } else {
        let [chat_area, sources_area] = Layout::horizontal([
            Constraint::Percentage(62),
            Constraint::Percentage(38),
        ])
        .areas(panes_area);

        // Store areas for mouse hit-testing
        app.chat_area = Some(chat_area);
        app.sources_area = Some(sources_area);

        render_chat(app, frame, chat_area);
        render_sources(app, frame, sources_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.upload.prompt_open {
        render_upload_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();

    let title = Line::from(vec![
        Span::styled(
            " docchat ",
            Style::default().fg(palette.bar_fg).bold(),
        ),
        Span::styled(
            format!(" {} ", app.status_document_label()),
            Style::default().fg(palette.bar_fg),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.bar_fg),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(palette.bar_bg));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = if app.upload.prompt_open || app.input_mode == InputMode::Editing {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };

    let mode_text = if app.upload.prompt_open {
        " UPLOAD "
    } else {
        match app.input_mode {
            InputMode::Normal => " NORMAL ",
            InputMode::Editing => " EDIT ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.upload.prompt_open {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" upload ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ]
    } else {
        let mut hints = vec![
            Span::styled(" i ", key_style),
            Span::styled(" ask ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" upload ", label_style),
        ];

        if app.focus == FocusPane::Sources {
            hints.extend(vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" nav ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" expand ", label_style),
            ]);
        } else {
            hints.extend(vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ]);
        }

        // The reveal control lives here while the sidebar is hidden; the
        // hide control lives in the sidebar title while it is showing.
        if app.sidebar.reveal_control_visible() {
            hints.extend(vec![
                Span::styled(" s ", key_style),
                Span::styled(" show sources ", label_style),
            ]);
        }

        hints.extend(vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(" theme ", label_style),
            Span::styled(" n ", key_style),
            Span::styled(" new chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
        hints
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let chat_focused = app.focus == FocusPane::Chat;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border_style(chat_focused))
        .title(" Conversation ");

    let inner_area = block.inner(area);
    app.chat_height = inner_area.height;
    app.chat_width = inner_area.width;

    if app.conversation.is_empty() {
        let placeholder = Paragraph::new(
            "Upload a document with 'o', then ask questions about it.",
        )
        .style(palette.muted_style())
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let user_header = Style::default().fg(palette.user).add_modifier(Modifier::BOLD);
    let assistant_header = Style::default()
        .fg(palette.assistant)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.conversation.messages() {
        let header = match msg.role {
            Role::User => Span::styled("You:", user_header),
            Role::Assistant => Span::styled("AI:", assistant_header),
        };
        lines.push(Line::from(header));

        match msg.kind {
            MessageKind::Typing => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("{}{}", msg.text, dots),
                    palette.muted_style().add_modifier(Modifier::ITALIC),
                )));
            }
            MessageKind::Error => {
                for line in msg.text.lines() {
                    lines.push(Line::from(Span::styled(
                        line,
                        Style::default().fg(palette.error),
                    )));
                }
            }
            MessageKind::Normal => {
                for line in msg.text.lines() {
                    lines.push(Line::from(line));
                }
            }
        }
        lines.push(Line::default());
    }

    app.chat_total_lines = lines.len() as u16;

    let chat = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    // Render scrollbar
    if app.chat_total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.chat_total_lines as usize)
            .position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_sources(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let sources_focused = app.focus == FocusPane::Sources;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border_style(sources_focused))
        .title(format!(" Sources ({}) [s] hide ", app.sources.len()));

    if app.sources.is_empty() {
        let placeholder = Paragraph::new(EMPTY_PLACEHOLDER)
            .style(palette.muted_style())
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let fragment_header = Style::default().fg(palette.accent).bold();
    let toggle_hint = palette.muted_style().add_modifier(Modifier::ITALIC);

    let items: Vec<ListItem> = app
        .sources
        .fragments()
        .iter()
        .enumerate()
        .map(|(i, fragment)| {
            let mut item_lines = vec![Line::from(Span::styled(
                format!("Fragment {}", i + 1),
                fragment_header,
            ))];
            for line in fragment.display_text().lines() {
                item_lines.push(Line::from(line.to_string()));
            }
            if fragment.has_more() {
                let label = if fragment.is_expanded() {
                    "Show less"
                } else {
                    "Show more"
                };
                item_lines.push(Line::from(Span::styled(label, toggle_hint)));
            }
            item_lines.push(Line::default());
            ListItem::new(item_lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(palette.highlight())
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.sources.list_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.theme.palette();
    let input_focused = app.focus == FocusPane::Input;

    let border_style = if input_focused || app.input_mode == InputMode::Editing {
        Style::default().fg(palette.editing)
    } else {
        Style::default().fg(palette.border)
    };

    let title = if app.question_in_flight() {
        " Ask (waiting for answer) "
    } else if !app.upload.document_ready() {
        " Ask (upload a document first) "
    } else {
        " Ask (Tab to focus) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.question_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = app
        .question_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if app.input_enabled() {
        Style::default().fg(palette.user)
    } else {
        palette.muted_style()
    };

    let input = Paragraph::new(visible_text)
        .style(text_style)
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing (the upload prompt owns the cursor while open)
    if app.input_mode == InputMode::Editing && !app.upload.prompt_open {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_upload_prompt(app: &App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    let palette = app.theme.palette();

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.editing))
        .title(" Upload document ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Instructions
    let instructions =
        Paragraph::new("Type the path to a document. Press Enter to upload, Esc to cancel.")
            .style(palette.muted_style());

    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    // Input field with horizontal scrolling
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let inner_width = input_area.width as usize;
    let cursor_pos = app.upload.path_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .upload
        .path_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text).style(Style::default().fg(palette.user));
    frame.render_widget(input, input_area);

    // Show cursor
    let cursor_x = (cursor_pos - scroll_offset).min(inner_width.saturating_sub(1)) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    // Status line
    let status = Paragraph::new("Supported: .pdf, .docx").style(palette.muted_style());
    let status_area = Rect::new(inner.x, inner.y + 4, inner.width, 1);
    frame.render_widget(status, status_area);
}
