//! Rendering of the setup and chat screens

use super::input::KeyAction;
use crate::runtime::UiEvent;
use crate::state_machine::{AppState, Origin, Phase, Transcript};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TITLE: &str = "Wikipedia RAG Chatbot";
const URL_LABEL: &str = "Enter Wikipedia URL (English):";
const URL_PLACEHOLDER: &str = "https://en.wikipedia.org/wiki/...";
const QUESTION_PLACEHOLDER: &str = "Type your question...";
const THINKING: &str = "Thinking...";
const RESTART_HINT: &str = "Ctrl-R: Restart Chat";

const PAGE: u16 = 5;

const USER_PREFIX: &str = "You: ";
const BOT_PREFIX: &str = "Bot: ";

/// The front end's copy of the session plus purely visual state
#[derive(Debug, Default)]
pub struct ViewState {
    pub state: AppState,
    pub list: ListState,
    /// Last refused action, cleared by the next state change
    pub notice: Option<String>,
}

impl ViewState {
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::StateChanged { state } => {
                let same_transcript = matches!(
                    (&self.state.transcript, &state.transcript),
                    (Some(old), Some(new)) if old.id == new.id
                );
                if !same_transcript {
                    self.list = ListState::default();
                }
                self.state = state;
                self.notice = None;
            }
            UiEvent::ScrollToLatest {
                transcript,
                sequence,
            } => {
                let index = self
                    .state
                    .transcript
                    .as_ref()
                    .filter(|t| t.id == transcript)
                    .and_then(|t| t.messages().iter().position(|m| m.sequence == sequence));
                if let Some(index) = index {
                    self.list.select(Some(index));
                }
            }
            UiEvent::Rejected { message } => {
                self.notice = Some(message);
            }
        }
    }

    pub fn scroll(&mut self, action: &KeyAction) {
        match action {
            KeyAction::ScrollUp => self.list.select_previous(),
            KeyAction::ScrollDown => self.list.select_next(),
            KeyAction::PageUp => self.list.scroll_up_by(PAGE),
            KeyAction::PageDown => self.list.scroll_down_by(PAGE),
            _ => {}
        }
    }
}

pub fn render(frame: &mut Frame, view: &mut ViewState) {
    let [title_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        title_area,
    );

    if view.state.session.is_ready() {
        render_chat(frame, body_area, view);
    } else {
        render_setup(frame, body_area, &view.state);
    }

    render_footer(frame, footer_area, view);
}

fn render_setup(frame: &mut Frame, area: Rect, state: &AppState) {
    let [label_area, input_area, button_area, error_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(URL_LABEL), label_area);

    let ingesting = state.session.phase == Phase::Ingesting;
    render_input(
        frame,
        input_area,
        &state.session.input_url,
        URL_PLACEHOLDER,
        !ingesting,
    );

    let button = if ingesting {
        Span::styled("[ Loading... ]", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled("[ Load Article ]", Style::default().fg(Color::Cyan))
    };
    frame.render_widget(Paragraph::new(Line::from(button)), button_area);

    if let Some(error) = state.visible_error() {
        frame.render_widget(error_line(&error.to_string()), error_area);
    }
}

fn render_chat(frame: &mut Frame, area: Rect, view: &mut ViewState) {
    let [list_area, error_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    let Some(transcript) = view.state.transcript.as_ref() else {
        return;
    };

    let block = Block::bordered().title(" Chat ");
    let width = block.inner(list_area).width as usize;
    let list = List::new(message_items(transcript, width)).block(block);
    frame.render_stateful_widget(list, list_area, &mut view.list);

    if let Some(error) = view.state.visible_error() {
        frame.render_widget(error_line(&error.to_string()), error_area);
    }

    if transcript.pending {
        render_input(frame, input_area, "", THINKING, false);
    } else {
        render_input(
            frame,
            input_area,
            &transcript.input,
            QUESTION_PLACEHOLDER,
            true,
        );
    }
}

fn render_footer(frame: &mut Frame, area: Rect, view: &ViewState) {
    let line = if let Some(notice) = &view.notice {
        Line::from(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Yellow),
        ))
    } else if view.state.session.is_ready() {
        hint_line(&[RESTART_HINT, "Enter: Send", "Esc: Quit"])
    } else {
        hint_line(&["Enter: Load Article", "Esc: Quit"])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn hint_line(hints: &[&'static str]) -> Line<'static> {
    Line::from(Span::styled(
        hints.join("  "),
        Style::default().fg(Color::DarkGray),
    ))
}

fn error_line(message: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(message, Style::default().fg(Color::Red)))
}

/// Bordered single-line input. Shows the tail of long text so the cursor
/// stays visible.
fn render_input(frame: &mut Frame, area: Rect, text: &str, placeholder: &str, editable: bool) {
    let block = Block::bordered();
    let inner = block.inner(area);
    let width = inner.width.saturating_sub(1) as usize;

    let (visible, typed) = tail(text, width);
    let content = if text.is_empty() {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(visible)
    };
    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);

    if editable && inner.width > 0 {
        let typed = u16::try_from(typed).unwrap_or(0);
        frame.set_cursor_position(Position::new(inner.x + typed, inner.y));
    }
}

/// Longest suffix of `text` that fits in `width` columns, and its width
fn tail(text: &str, width: usize) -> (String, usize) {
    let mut kept = Vec::new();
    let mut used = 0;
    for ch in text.chars().rev() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        kept.push(ch);
    }
    (kept.into_iter().rev().collect(), used)
}

fn message_items(transcript: &Transcript, width: usize) -> Vec<ListItem<'static>> {
    let text_width = width.saturating_sub(USER_PREFIX.len());
    transcript
        .messages()
        .iter()
        .map(|message| {
            let (prefix, style) = match message.origin {
                Origin::User => (
                    USER_PREFIX,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Origin::Bot => (BOT_PREFIX, Style::default().fg(Color::Green)),
            };
            let indent = " ".repeat(prefix.len());
            let lines: Vec<Line<'static>> = wrap(&message.text, text_width)
                .into_iter()
                .enumerate()
                .map(|(i, line)| {
                    let lead = if i == 0 {
                        Span::styled(prefix, style)
                    } else {
                        Span::raw(indent.clone())
                    };
                    Line::from(vec![lead, Span::raw(line)])
                })
                .collect();
            ListItem::new(Text::from(lines))
        })
        .collect()
}

/// Greedy word wrap measured in display columns. Whitespace inside a line
/// is kept as written and dropped where a line breaks. Words wider than
/// `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let paragraph = paragraph.replace('\t', TAB);
        let mut line = String::new();
        let mut line_width = 0;

        for (blank, run) in runs(&paragraph) {
            let run_width = run.width();
            if line_width + run_width <= width {
                line.push_str(&run);
                line_width += run_width;
                continue;
            }
            if blank {
                if line_width > 0 {
                    lines.push(break_line(&mut line));
                    line_width = 0;
                }
                continue;
            }
            if line_width > 0 && run_width <= width {
                lines.push(break_line(&mut line));
                line_width = 0;
            }
            for ch in run.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width > 0 && line_width + ch_width > width {
                    lines.push(break_line(&mut line));
                    line_width = 0;
                }
                line.push(ch);
                line_width += ch_width;
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

const TAB: &str = "    ";

/// Split into alternating runs of whitespace and non-whitespace
fn runs(text: &str) -> Vec<(bool, String)> {
    let mut out: Vec<(bool, String)> = Vec::new();
    for ch in text.chars() {
        let blank = ch.is_whitespace();
        match out.last_mut() {
            Some((kind, run)) if *kind == blank => run.push(ch),
            _ => out.push((blank, ch.to_string())),
        }
    }
    out
}

fn break_line(line: &mut String) -> String {
    let taken = std::mem::take(line);
    taken.trim_end().to_string()
}
