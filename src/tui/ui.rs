use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::citation::CitationStyle;
use crate::models::{credibility_label, credibility_stars, ResultPanel};
use crate::nav::{Modal, Page};

use super::form::FormField;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Page content
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.nav.page() {
        Page::Topics => render_topics(frame, app, chunks[1]),
        Page::TopicDetail(_) => render_topic_detail(frame, app, chunks[1]),
        Page::Sources(_) => render_sources(frame, app, chunks[1]),
    }
    render_status(frame, app, chunks[2]);

    // Modals stack in a fixed order so the topmost one receives input
    if app.nav.modals.is_open(Modal::AddTopic) {
        render_add_topic(frame, app);
    }
    if app.nav.modals.is_open(Modal::AddSource) {
        render_source_form(frame, app);
    }
    if app.nav.modals.is_open(Modal::Citation) {
        render_citations(frame, app);
    }

    if app.prompt.is_some() {
        render_prompt(frame, app);
    }
    if app.confirm.is_some() {
        render_confirm(frame, app);
    }
    if app.notification.is_some() {
        render_notification(frame, app);
    }
    if app.show_help {
        render_help(frame);
    }
}

/// Screen rectangle of a modal; clicks outside it close the modal.
pub fn modal_area(modal: Modal, area: Rect) -> Rect {
    match modal {
        Modal::AddTopic => centered_rect(50, 20, area),
        Modal::AddSource => centered_rect(70, 70, area),
        Modal::Citation => centered_rect(80, 80, area),
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let topic_name = app
        .current_topic
        .as_ref()
        .map(|t| t.name.as_str())
        .unwrap_or_default();

    let (title, stats) = match app.nav.page() {
        Page::Topics => (
            " Research Topics ".to_string(),
            format!(" {} topics", app.topics.len()),
        ),
        Page::TopicDetail(_) => (
            format!(" {topic_name} "),
            format!(" {} saved summaries", app.summaries.len()),
        ),
        Page::Sources(_) => (
            format!(" Sources - {topic_name} "),
            format!(" {} sources", app.sources.len()),
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_topics(frame: &mut Frame, app: &App, area: Rect) {
    if app.topics.is_empty() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                " No Topics Yet",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(" Create your first research topic to get started (press 'a')"),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .topics
        .iter()
        .map(|row| {
            let line = Line::from(vec![
                Span::styled(
                    row.topic.name.as_str(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  Created {}", row.topic.created_label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("  {} summaries", row.summary_count),
                    Style::default().fg(Color::Blue),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.topic_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_topic_detail(frame: &mut Frame, app: &App, area: Rect) {
    // Left: notes and page, right: results and saved summaries
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    render_notes(frame, app, left[0]);
    render_active_page(frame, app, left[1]);
    render_result(frame, app, right[0]);
    render_saved_summaries(frame, app, right[1]);
}

fn render_notes(frame: &mut Frame, app: &App, area: Rect) {
    let (title, color) = if app.notes_editing {
        (" Notes (editing - Ctrl-S save, Esc done) ", Color::Yellow)
    } else {
        (" Notes ", Color::Green)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let text = if app.notes_editing {
        format!("{}_", app.notes)
    } else if app.notes.is_empty() {
        "Press 'n' to write notes...".to_string()
    } else {
        app.notes.clone()
    };

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_active_page(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Page ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let lines = match &app.active_page {
        Some(page) => {
            let selection = match page.selected_text() {
                Some(text) => format!("Selected: {} chars", text.chars().count()),
                None => "No text selected (x to select)".to_string(),
            };
            let words = page.text.split_whitespace().count();
            vec![
                Line::from(Span::styled(
                    page.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(page.url.clone(), Style::default().fg(Color::DarkGray))),
                Line::from(format!("{selection}  ({words} words on page)")),
            ]
        }
        None => vec![Line::from(Span::styled(
            "No page open (p to open, x to select text)",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn br_lines(text: &str) -> Vec<Line<'static>> {
    text.split("<br>").map(|l| Line::from(l.to_string())).collect()
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match &app.result {
        ResultPanel::Empty => (
            " Results ",
            vec![Line::from(Span::styled(
                "s: summarize selection  t: suggest topics",
                Style::default().fg(Color::DarkGray),
            ))],
        ),
        ResultPanel::Pending(message) => (
            " Results ",
            vec![Line::from(Span::styled(
                format!("⏳ {message}"),
                Style::default().fg(Color::Yellow),
            ))],
        ),
        ResultPanel::Message(message) => (" Results ", vec![Line::from(message.clone())]),
        ResultPanel::Summary(text) => {
            let mut lines = br_lines(text);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "A: add to sources",
                Style::default().fg(Color::DarkGray),
            )));
            (" Summary ", lines)
        }
        ResultPanel::Suggestions(text) => (" Suggested Topics ", br_lines(text)),
        ResultPanel::Error(message) => (
            " Results ",
            vec![Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            ))],
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_saved_summaries(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Saved Summaries ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    if app.summaries.is_empty() {
        let paragraph = Paragraph::new("No summaries yet")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let mut lines = Vec::new();
    for summary in &app.summaries {
        let stamp = summary
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%-m/%-d/%Y %H:%M");
        lines.push(Line::from(Span::styled(
            format!("{stamp}  {}", summary.url),
            Style::default().fg(Color::DarkGray),
        )));
        lines.extend(summary.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    if app.sources.is_empty() {
        let paragraph = Paragraph::new("\n No sources yet. Press 'a' to add one.")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    // Highlight symbol and borders take four columns
    let wrap_width = area.width.saturating_sub(6).max(20) as usize;

    let items: Vec<ListItem> = app
        .sources
        .iter()
        .map(|source| {
            let mut lines = vec![Line::from(Span::styled(
                source.display_title().to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))];

            if !source.author.is_empty() {
                lines.push(Line::from(format!("By {}", source.author)));
            }

            let mut meta = vec![Span::styled(
                source.source_type.label(),
                Style::default().fg(Color::Blue),
            )];
            if !source.date.is_empty() {
                meta.push(Span::raw(format!("  {}", source.date)));
            }
            if let Some(rating) = source.rating() {
                meta.push(Span::styled(
                    format!("  {} {}", credibility_stars(rating), credibility_label(Some(rating))),
                    Style::default().fg(Color::Yellow),
                ));
            }
            lines.push(Line::from(meta));

            if !source.url.is_empty() {
                lines.push(Line::from(Span::styled(
                    source.url.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for wrapped in textwrap::wrap(&source.notes, wrap_width) {
                lines.push(Line::from(Span::styled(
                    wrapped.into_owned(),
                    Style::default().fg(Color::Gray),
                )));
            }
            lines.push(Line::from(""));

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.source_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = match app.nav.page() {
        Page::Topics => "j/k:nav  Enter:open  a:add topic  ?:help  q:quit",
        Page::TopicDetail(_) if app.notes_editing => "Ctrl-S:save notes  Esc:stop editing",
        Page::TopicDetail(_) => {
            "p:page  x:select  s:summarize  t:suggest  c:capture  v:sources  n:notes  ?:help"
        }
        Page::Sources(_) => "a:add  e:edit  d:delete  g:citations  o:open  b:back  ?:help",
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_add_topic(frame: &mut Frame, app: &App) {
    let area = modal_area(Modal::AddTopic, frame.area());

    let block = Block::default()
        .title(" New Research Topic ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    // Clear the area first
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(format!("> {}_", app.topic_input)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: create  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_source_form(frame: &mut Frame, app: &App) {
    let area = modal_area(Modal::AddSource, frame.area());
    let form = &app.source_form;

    let title = if form.is_editing() { " Edit Source " } else { " Add Source " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let cursor = if focused && !matches!(field, FormField::Type | FormField::Credibility) {
            "_"
        } else {
            ""
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<18}", field.label()), label_style),
            Span::raw(format!("{}{cursor}", form.display_value(field))),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab/↓:next  ←/→:change  Ctrl-F:auto-fill  Enter:save  Esc:cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_citations(frame: &mut Frame, app: &App) {
    let area = modal_area(Modal::Citation, frame.area());

    let block = Block::default()
        .title(" Citations ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(citations) = &app.citations {
        for style in CitationStyle::ALL {
            lines.push(Line::from(Span::styled(
                format!("{} Format", style.label()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.extend(citations.get(style).lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::from(""));
        }
    }
    lines.push(Line::from(Span::styled(
        "a/m/c: copy APA/MLA/Chicago  Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn render_prompt(frame: &mut Frame, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let area = centered_rect(60, 30, frame.area());

    let block = Block::default()
        .title(prompt.kind.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(format!("> {}_", prompt.input))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_confirm(frame: &mut Frame, app: &App) {
    let Some(confirm) = &app.confirm else {
        return;
    };
    let area = centered_rect(50, 20, frame.area());

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let lines = vec![
        Line::from(confirm.message.clone()),
        Line::from(""),
        Line::from(Span::styled("y: yes  n: no", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn notification_width(message: &str) -> u16 {
    u16::try_from(message.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(4)
}

fn render_notification(frame: &mut Frame, app: &App) {
    let Some(notification) = &app.notification else {
        return;
    };
    let screen = frame.area();
    let width = notification_width(&notification.message).min(screen.width);
    let area = Rect::new(screen.width.saturating_sub(width), 0, width, 3.min(screen.height));

    let color = if notification.is_error { Color::Red } else { Color::Green };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let paragraph = Paragraph::new(notification.message.as_str())
        .block(block)
        .style(Style::default().fg(color));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 80, frame.area());

    let help_text = vec![
        "",
        " Topics:",
        "   j / k    Move down / up",
        "   Enter    Open topic",
        "   a        Add topic",
        "",
        " Topic:",
        "   p        Open a page by URL",
        "   x        Select (type or paste) text",
        "   s        Summarize selection",
        "   t        Suggest related topics",
        "   A        Add summarized page to sources",
        "   c        Capture current page as a source",
        "   r        Clear results",
        "   n / w    Edit / save notes",
        "   v        View sources",
        "   D        Delete topic",
        "   b / Esc  Back to topics",
        "",
        " Sources:",
        "   a / e / d  Add / edit / delete source",
        "   g        Generate citations",
        "   o        Open in browser",
        "   b / Esc  Back to topic",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
