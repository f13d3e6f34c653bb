//! Terminal front end
//!
//! Keeps a read-only copy of the session state and turns key presses into
//! runtime events. Both event sources are polled together with
//! `tokio::select!`; the screen is redrawn after each one.

mod input;
mod view;

use input::{map_key, map_paste, KeyAction};
use view::ViewState;

use crate::runtime::{RuntimeHandle, UiEvent};
use crate::state_machine::Event;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event as TermEvent, EventStream};
use crossterm::execute;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::io;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Take over the terminal and run until the user quits. The terminal is
/// restored afterwards, and on panic by ratatui's hook.
pub async fn run(handle: RuntimeHandle) -> io::Result<()> {
    let mut terminal = ratatui::try_init()?;
    // Pasted newlines would otherwise arrive as Enter and submit early
    let result = match execute!(io::stdout(), EnableBracketedPaste) {
        Ok(()) => App::new(handle).run(&mut terminal).await,
        Err(e) => Err(e),
    };
    if let Err(e) = execute!(io::stdout(), DisableBracketedPaste) {
        tracing::warn!(error = %e, "Failed to disable bracketed paste");
    }
    ratatui::restore();
    result
}

struct App {
    handle: RuntimeHandle,
    ui_rx: broadcast::Receiver<UiEvent>,
    view: ViewState,
    quit: bool,
}

impl App {
    fn new(handle: RuntimeHandle) -> Self {
        let ui_rx = handle.subscribe();
        Self {
            handle,
            ui_rx,
            view: ViewState::default(),
            quit: false,
        }
    }

    async fn run(mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        let mut terminal_events = EventStream::new();

        while !self.quit {
            terminal.draw(|frame| view::render(frame, &mut self.view))?;

            tokio::select! {
                event = terminal_events.next() => match event {
                    Some(Ok(event)) => self.handle_terminal_event(event).await,
                    Some(Err(e)) => return Err(e),
                    None => break,
                },
                update = self.ui_rx.recv() => match update {
                    Ok(update) => self.view.apply(update),
                    // Snapshots are whole states, so the next one catches up
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Front end lagged behind runtime");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Runtime closed, leaving front end");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    async fn handle_terminal_event(&mut self, event: TermEvent) {
        let action = match event {
            TermEvent::Key(key) => map_key(key),
            TermEvent::Paste(text) => map_paste(text),
            // Resize just needs the redraw at the top of the loop
            _ => None,
        };
        let Some(action) = action else {
            return;
        };

        match action {
            KeyAction::Quit => self.quit = true,
            KeyAction::Dispatch(event) => {
                // Reset is only offered on the chat screen
                if event == Event::Reset && !self.view.state.session.is_ready() {
                    return;
                }
                // Inputs are disabled while a request is out
                if matches!(event, Event::InputEdited(_)) && self.view.state.is_busy() {
                    return;
                }
                if let Err(e) = self.handle.send(event).await {
                    tracing::error!(error = %e, "Failed to forward input");
                    self.quit = true;
                }
            }
            scroll => self.view.scroll(&scroll),
        }
    }
}
