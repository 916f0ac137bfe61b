use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use quotation_client::{DocumentKind, ProgressStep, QuotationResult, RequestState};

use crate::app::{App, Focus, InputMode};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

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

    let [files_area, submit_area, status_area, progress_area, outcome_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(5),
    ])
    .areas(body_area);

    let [proposal_area, financial_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(files_area);

    // Store areas for mouse hit-testing
    app.proposal_area = Some(proposal_area);
    app.financial_area = Some(financial_area);
    app.submit_area = Some(submit_area);

    render_file_input(app, frame, proposal_area, DocumentKind::Proposal);
    render_file_input(app, frame, financial_area, DocumentKind::Financial);
    render_submit(app, frame, submit_area);
    render_status(app, frame, status_area);
    render_progress(app, frame, progress_area);
    render_outcome(app, frame, outcome_area);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Span::styled(
        " Insurance Quotation Generator ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    );
    let target = Span::styled(
        format!(" {} ({}) ", app.client.upload_url(), app.client.mode().as_str()),
        Style::default().fg(Color::DarkGray),
    );
    frame.render_widget(Paragraph::new(Line::from(vec![title, target])), area);
}

fn render_file_input(app: &App, frame: &mut Frame, area: Rect, kind: DocumentKind) {
    let focused = app.focus.document() == Some(kind);
    let editing = focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let extensions = kind
        .accepted_extensions()
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(" ");
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} [{}] ", kind.display_name(), extensions));

    let input = app.input(kind);
    let path_line = if input.value.is_empty() && !editing {
        Line::from(Span::styled("Press Enter to type a path", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(input.value.as_str())
    };

    let selected_line = match app.session.files.get(kind) {
        Some(file) => Line::from(vec![
            Span::styled("Selected: ", Style::default().fg(Color::Green)),
            Span::raw(file.name.clone()),
        ]),
        None => Line::from(Span::styled(
            "No file selected",
            Style::default().fg(Color::DarkGray).italic(),
        )),
    };

    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(vec![path_line, selected_line]).block(block), area);

    if editing {
        let cursor_x = input.cursor.min(inner.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y));
    }
}

fn render_submit(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.session.can_submit();
    let focused = app.focus == Focus::Submit;

    let label = if app.session.request.is_processing() {
        let spinner = SPINNER[app.animation_frame as usize % SPINNER.len()];
        format!(" {} Generating quotation... ", spinner)
    } else {
        " Generate Quotation ".to_string()
    };

    let style = if enabled {
        Style::default().fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let button = Paragraph::new(Line::from(Span::styled(label, style)).centered()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    frame.render_widget(button, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(status) = &app.status {
        let style = Style::default().fg(Color::Yellow);
        let line = Paragraph::new(Span::styled(status.as_str(), style));
        frame.render_widget(line, area);
    }
}

fn progress_line(step: &ProgressStep) -> Line<'static> {
    let color = if step.progress >= 100.0 { Color::Green } else { Color::Yellow };
    Line::from(vec![
        Span::styled(step.name.clone(), Style::default().bold()),
        Span::raw(": "),
        Span::styled(format!("{}%", step.progress), Style::default().fg(color)),
        Span::raw(format!(" - {}", step.description)),
    ])
}

fn render_progress(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Processing Steps ({}) ", app.session.progress.len()));

    if app.session.progress.is_empty() {
        let placeholder = if app.session.request.is_processing() {
            "Waiting for the backend..."
        } else {
            "Progress is shown here while a quotation is streamed."
        };
        let paragraph = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .session
        .progress
        .iter()
        .skip(app.progress_scroll as usize)
        .map(|step| ListItem::new(progress_line(step)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn result_text(result: &QuotationResult) -> Text<'static> {
    let label = Style::default().fg(Color::Cyan);
    Text::from(vec![
        Line::from(vec![Span::styled("Premium: ", label), Span::raw(result.premium_display())]),
        Line::from(vec![Span::styled("Risk Score: ", label), Span::raw(result.risk_display())]),
        Line::from(vec![
            Span::styled("Recommendation: ", label),
            Span::styled(result.recommendation.clone(), Style::default().bold()),
        ]),
    ])
}

fn render_outcome(app: &App, frame: &mut Frame, area: Rect) {
    match &app.session.request {
        RequestState::Succeeded(result) => {
            let card = Paragraph::new(result_text(result)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green))
                    .title(" Quotation Result "),
            );
            frame.render_widget(card, area);
        }
        RequestState::Failed(message) => {
            let error = Paragraph::new(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            ))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
            frame.render_widget(error, area);
        }
        RequestState::Idle | RequestState::Processing => {}
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            (" Tab ", " next "),
            (" Enter ", " edit/select "),
            (" g ", " generate "),
            (" J/K ", " scroll "),
            (" q ", " quit "),
        ],
        InputMode::Editing => &[
            (" Enter ", " load file "),
            (" Esc ", " cancel "),
            (" C-u ", " clear "),
        ],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
