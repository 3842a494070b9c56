use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// What the run loop reacts to after one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Key(KeyEvent),
    Resize,
    /// Nothing arrived before the timeout; time to drain responses.
    Tick,
}

/// Wait up to `timeout` for terminal input. Key releases and repeats
/// reported by some terminals are dropped so each press acts once.
pub fn next_input(timeout: Duration) -> color_eyre::Result<Input> {
    if !event::poll(timeout)? {
        return Ok(Input::Tick);
    }
    Ok(classify(event::read()?))
}

fn classify(event: Event) -> Input {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Input::Key(key),
        Event::Resize(..) => Input::Resize,
        _ => Input::Tick,
    }
}
