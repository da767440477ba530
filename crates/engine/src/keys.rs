//! Keyboard input and key recording.
//!
//! Barcode scanners "type" a whole value plus Enter within a few
//! milliseconds, faster than a focus change completes. While a lookup cell is
//! selected (not yet editing), keystrokes are buffered and the recording
//! window restarts on every key. When the window closes, a buffer containing
//! a newline is a scanned value to submit; anything else starts a manual edit
//! seeded with the buffered text.

use std::time::{Duration, Instant};

use crate::debounce::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Column/row delta for arrow keys.
    pub fn arrow_delta(&self) -> Option<(isize, isize)> {
        match self {
            Key::Up => Some((0, -1)),
            Key::Down => Some((0, 1)),
            Key::Left => Some((-1, 0)),
            Key::Right => Some((1, 0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        control: false,
        alt: false,
    };

    pub const CONTROL: Modifiers = Modifiers {
        shift: false,
        control: true,
        alt: false,
    };
}

/// What a finished recording turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedInput {
    /// Contained Enter: fill the text into the grid and move on.
    Submit(String),
    /// Plain typing: start editing with this text.
    Edit(String),
}

#[derive(Debug, Clone)]
pub struct KeyRecorder {
    buffer: String,
    debounce: Debouncer,
}

impl KeyRecorder {
    pub fn new(window: Duration) -> Self {
        Self {
            buffer: String::new(),
            debounce: Debouncer::new(window),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Buffer one key and restart the recording window.
    pub fn record(&mut self, ch: char, now: Instant) {
        self.buffer.push(ch);
        self.debounce.restart(now);
    }

    /// Once the window has closed, classify and return the buffered input.
    pub fn poll(&mut self, now: Instant) -> Option<RecordedInput> {
        if !self.debounce.fire_if_due(now) {
            return None;
        }
        let text = std::mem::take(&mut self.buffer);
        if text.contains('\n') {
            Some(RecordedInput::Submit(text))
        } else {
            Some(RecordedInput::Edit(text))
        }
    }

    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_scanner_burst_submits() {
        let t0 = Instant::now();
        let mut rec = KeyRecorder::new(25 * MS);
        for (i, ch) in "S-42\n".chars().enumerate() {
            rec.record(ch, t0 + (i as u32) * 3 * MS);
        }
        assert!(rec.is_recording());
        // Still inside the window of the last key
        assert_eq!(rec.poll(t0 + 20 * MS), None);
        assert_eq!(rec.poll(t0 + 40 * MS), Some(RecordedInput::Submit("S-42\n".into())));
        assert!(!rec.is_recording());
    }

    #[test]
    fn test_single_keystroke_starts_edit() {
        let t0 = Instant::now();
        let mut rec = KeyRecorder::new(25 * MS);
        rec.record('a', t0);
        assert_eq!(rec.poll(t0 + 25 * MS), Some(RecordedInput::Edit("a".into())));
        assert_eq!(rec.poll(t0 + 60 * MS), None);
    }

    #[test]
    fn test_cancel_discards_buffer() {
        let t0 = Instant::now();
        let mut rec = KeyRecorder::new(25 * MS);
        rec.record('x', t0);
        rec.cancel();
        assert_eq!(rec.poll(t0 + 100 * MS), None);
        rec.record('y', t0 + 100 * MS);
        assert_eq!(rec.poll(t0 + 200 * MS), Some(RecordedInput::Edit("y".into())));
    }

    #[test]
    fn test_arrow_delta() {
        assert_eq!(Key::Up.arrow_delta(), Some((0, -1)));
        assert_eq!(Key::Right.arrow_delta(), Some((1, 0)));
        assert_eq!(Key::Enter.arrow_delta(), None);
    }
}
