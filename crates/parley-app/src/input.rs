//! Terminal-agnostic keyboard input and the composer line.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries, enabling
/// deterministic simulation testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Escape key (close viewer, otherwise quit).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}

/// Composer line: text buffer and cursor.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    buffer: String,
    /// Cursor position in characters.
    cursor: usize,
}

impl InputState {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True if the buffer is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    /// Take the text, leaving the composer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Apply an editing key. Returns `true` if anything changed.
    ///
    /// `Enter` and `Esc` are not editing keys and return `false`.
    pub fn apply(&mut self, key: KeyInput) -> bool {
        let len = self.buffer.chars().count();
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
                true
            },
            KeyInput::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                true
            },
            KeyInput::Delete if self.cursor < len => {
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                true
            },
            KeyInput::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            },
            KeyInput::Right if self.cursor < len => {
                self.cursor += 1;
                true
            },
            KeyInput::Home if self.cursor > 0 => {
                self.cursor = 0;
                true
            },
            KeyInput::End if self.cursor < len => {
                self.cursor = len;
                true
            },
            _ => false,
        }
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputState {
        let mut input = InputState::new();
        for c in text.chars() {
            input.apply(KeyInput::Char(c));
        }
        input
    }

    #[test]
    fn typing_appends() {
        let input = typed("hello");
        assert_eq!(input.buffer(), "hello");
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn edits_at_cursor() {
        let mut input = typed("helo");
        input.apply(KeyInput::Left);
        input.apply(KeyInput::Char('l'));
        assert_eq!(input.buffer(), "hello");

        input.apply(KeyInput::Home);
        input.apply(KeyInput::Delete);
        assert_eq!(input.buffer(), "ello");

        input.apply(KeyInput::End);
        input.apply(KeyInput::Backspace);
        assert_eq!(input.buffer(), "ell");
    }

    #[test]
    fn multibyte_characters() {
        let mut input = typed("héllo🙂");
        input.apply(KeyInput::Backspace);
        input.apply(KeyInput::Left);
        input.apply(KeyInput::Left);
        input.apply(KeyInput::Left);
        input.apply(KeyInput::Backspace);
        assert_eq!(input.buffer(), "hllo");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn no_op_keys_report_unchanged() {
        let mut input = InputState::new();
        assert!(!input.apply(KeyInput::Backspace));
        assert!(!input.apply(KeyInput::Delete));
        assert!(!input.apply(KeyInput::Left));
        assert!(!input.apply(KeyInput::Enter));
        assert!(!input.apply(KeyInput::Esc));
    }

    #[test]
    fn take_clears() {
        let mut input = typed("  ");
        assert!(input.is_blank());
        assert_eq!(input.take(), "  ");
        assert_eq!(input.buffer(), "");
        assert_eq!(input.cursor(), 0);
    }
}
