//! Key bindings

use crate::state_machine::{Event, TextEdit};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the front end to do
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// Forward to the session runtime
    Dispatch(Event),
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Quit,
}

/// Map a key press to an action. Releases and repeats of modifier-only keys
/// map to nothing.
pub fn map_key(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('r') if ctrl => KeyAction::Dispatch(Event::Reset),
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return None,
        KeyCode::Char(c) => KeyAction::Dispatch(Event::InputEdited(TextEdit::Insert(c))),
        KeyCode::Backspace => KeyAction::Dispatch(Event::InputEdited(TextEdit::Backspace)),
        KeyCode::Enter => KeyAction::Dispatch(Event::SubmitInput),
        KeyCode::Up => KeyAction::ScrollUp,
        KeyCode::Down => KeyAction::ScrollDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        _ => return None,
    };
    Some(action)
}

/// Pasted text goes into the active input as one edit. Line breaks become
/// spaces so a multi-line paste never submits on its own.
pub fn map_paste(text: String) -> Option<KeyAction> {
    let text: String = text
        .trim_end_matches(['\r', '\n'])
        .chars()
        .filter_map(|c| match c {
            '\r' | '\n' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    if text.is_empty() {
        return None;
    }
    Some(KeyAction::Dispatch(Event::InputEdited(TextEdit::InsertStr(
        text,
    ))))
}
