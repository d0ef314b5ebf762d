use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen, WizardStep, WIZARD_LABELS};
use crate::present::{sections, IdeaView, SectionBody, ANALYZING, NOT_FOUND};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Screen body
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.screen {
        Screen::SignIn => render_sign_in(frame, app, chunks[1]),
        Screen::Dashboard => render_dashboard(frame, app, chunks[1]),
        Screen::Wizard => render_wizard(frame, app, chunks[1]),
        Screen::Result => render_result(frame, app, chunks[1]),
    }
    render_status(frame, app, chunks[2]);

    if app.task_input.is_some() {
        render_task_input(frame, app);
    }

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::SignIn => " VibeBuild ".to_string(),
        Screen::Dashboard => " VibeBuild [Dashboard] ".to_string(),
        Screen::Wizard => match app.wizard.step {
            WizardStep::Basics => " New Idea [Step 1 of 2] ".to_string(),
            WizardStep::Details => " New Idea [Step 2 of 2] ".to_string(),
        },
        Screen::Result => " Idea ".to_string(),
    };

    let who = match (&app.profile, &app.session) {
        (Some(profile), _) => format!(" Welcome, {} | {} Ideas", profile.name, app.ideas.len()),
        (None, Some(session)) => format!(" {} | {} Ideas", session.email, app.ideas.len()),
        (None, None) => " Not signed in".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(who).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_sign_in(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect(60, 40, area);

    let block = Block::default()
        .title(" Sign in ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    // tokens are secrets; only show how much has been typed
    let masked = "*".repeat(app.token_input.chars().count().min(40));
    let text = vec![
        Line::from("Paste a bearer token and press Enter."),
        Line::from(Span::styled(
            "Get one with: vibebuild signin <email>",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(format!("> {}_", masked)),
    ];

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    if app.ideas.is_empty() {
        let paragraph = Paragraph::new("No ideas yet. Press 'n' to describe your first one.")
            .block(Block::default().borders(Borders::ALL).title(" Your Ideas "))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .ideas
        .iter()
        .map(|idea| {
            let (marker, marker_style) = if idea.is_analyzed() {
                ("✓ ", Style::default().fg(Color::Green))
            } else {
                ("… ", Style::default().fg(Color::Yellow))
            };
            let date = idea.created_at.format("%Y-%m-%d").to_string();

            let mut spans = vec![
                Span::styled(marker, marker_style),
                Span::styled(format!("[{date}] "), Style::default().fg(Color::Blue)),
                Span::styled(idea.fields.title.as_str(), Style::default().fg(Color::White)),
            ];
            if !idea.is_analyzed() {
                spans.push(Span::styled(
                    format!(" ({})", idea.status),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            let line = Line::from(spans);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Your Ideas "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_wizard(frame: &mut Frame, app: &App, area: Rect) {
    let range = app.wizard.field_range();
    let mut constraints: Vec<Constraint> = range.clone().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (slot, field) in range.enumerate() {
        let focused = field == app.wizard.focus;
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let required = if field < 2 { " *" } else { "" };
        let cursor = if focused && !app.is_submitting { "_" } else { "" };

        let paragraph = Paragraph::new(format!("{}{}", app.wizard.values[field], cursor)).block(
            Block::default()
                .title(format!(" {}{} ", WIZARD_LABELS[field], required))
                .borders(Borders::ALL)
                .border_style(border),
        );
        frame.render_widget(paragraph, chunks[slot]);
    }

    if app.is_submitting {
        let waiting = Paragraph::new(format!(" {} {}", app.spinner(), ANALYZING))
            .style(Style::default().fg(Color::Magenta));
        frame.render_widget(waiting, chunks[chunks.len() - 1]);
    }
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let (title, analysis) = match &app.view {
        Some(IdeaView::Ready { title, analysis }) => (title, analysis),
        Some(IdeaView::Analyzing { title }) => {
            let paragraph = Paragraph::new(format!("{}\n\nPress 'r' to reload.", ANALYZING))
                .block(bordered(title, Color::Green))
                .style(Style::default().fg(Color::Magenta));
            frame.render_widget(paragraph, area);
            return;
        }
        Some(IdeaView::NotFound) | None => {
            let paragraph = Paragraph::new(NOT_FOUND)
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, area);
            return;
        }
    };

    // 2/3 analysis, 1/3 roadmap checklist
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
        .split(area);

    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut lines: Vec<Line> = Vec::new();
    for section in sections(analysis) {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(section.title, heading)));
        match section.body {
            SectionBody::Text(text) => lines.push(Line::from(text)),
            SectionBody::Bullets(items) => {
                lines.extend(items.into_iter().map(|item| Line::from(format!("  • {item}"))));
            }
            SectionBody::Numbered(items) => {
                lines.extend(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| Line::from(format!("  {}. {item}", i + 1))),
                );
            }
        }
    }

    // Clamp to the wrapped height so the last screenful stays visible
    let width = chunks[0].width.saturating_sub(2).max(1) as usize;
    let height = chunks[0].height.saturating_sub(2) as usize;
    let rows: usize = lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
            textwrap::wrap(&text, width).len().max(1)
        })
        .sum();
    let scroll = app.analysis_scroll.min(rows.saturating_sub(height));

    let paragraph = Paragraph::new(lines)
        .block(bordered(title, Color::Green))
        .wrap(Wrap { trim: true })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, chunks[0]);

    render_roadmap(frame, app, chunks[1]);
}

fn render_roadmap(frame: &mut Frame, app: &App, area: Rect) {
    let editor = &app.editor;
    let dirty = if editor.is_dirty() { " *" } else { "" };
    let title = format!(
        " Development Roadmap ({}/{}){} ",
        editor.completed(),
        editor.len(),
        dirty
    );

    let items: Vec<ListItem> = editor
        .tasks()
        .iter()
        .map(|task| {
            let (check, style) = if task.done {
                ("[x] ", Style::default().fg(Color::DarkGray))
            } else {
                ("[ ] ", Style::default().fg(Color::White))
            };
            ListItem::new(Line::from(vec![
                Span::styled(check, Style::default().fg(Color::Yellow)),
                Span::styled(task.text.as_str(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !editor.is_empty() {
        state.select(Some(app.task_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = &app.message {
        let paragraph = Paragraph::new(message.as_str()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, area);
        return;
    }

    let hints = match app.screen {
        Screen::SignIn => "Enter:sign in  Esc:quit",
        Screen::Dashboard => "j/k:nav  Enter:open  n:new idea  r:reload  o:sign out  ?:help  q:quit",
        Screen::Wizard if app.is_submitting => "Submitting...",
        Screen::Wizard => match app.wizard.step {
            WizardStep::Basics => "Tab:next field  Enter:continue  Esc:cancel",
            WizardStep::Details => "Tab:next field  Enter:analyze  Esc:back",
        },
        Screen::Result => {
            "space:toggle  e:edit  a:add  d:remove  s:save  J/K:scroll  r:reload  b:back  ?:help"
        }
    };

    let paragraph = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_task_input(frame: &mut Frame, app: &App) {
    let Some(input) = &app.task_input else {
        return;
    };
    let area = centered_rect(60, 20, frame.area());

    let title = if input.index.is_some() {
        " Edit task "
    } else {
        " Add task "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(format!("> {}_", input.text))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    let help_text = vec![
        "",
        " Dashboard:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   Enter    Open idea",
        "   n        New idea",
        "   r        Reload ideas",
        "   o        Sign out",
        "",
        " Idea:",
        "   space    Toggle task done",
        "   e        Edit task",
        "   a        Add task",
        "   d        Remove task",
        "   s        Save roadmap",
        "   J / K    Scroll analysis",
        "   PgDn/Up  Scroll a page",
        "   r        Reload idea",
        "   b / Esc  Back to dashboard",
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

fn bordered(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
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
