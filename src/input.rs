/// Actions a text entry surface can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Insert(String),
    /// Newline insertion (e.g. Shift+Enter); never submits.
    InsertNewline,
    /// Line submit (e.g. Enter).
    Submit,
}

/// Multi-line text entry read and cleared by the session on submit.
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Applies an action. Returns `true` when the action asks for a submit.
    pub fn apply(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::Insert(s) => {
                self.text.push_str(&s);
                false
            }
            InputAction::InsertNewline => {
                self.text.push('\n');
                false
            }
            InputAction::Submit => true,
        }
    }

    /// Feeds one terminal line. A trailing backslash continues the message on
    /// a new line; anything else is a line submit.
    pub fn feed_line(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.strip_suffix('\\') {
            Some(head) => {
                self.apply(InputAction::Insert(head.to_string()));
                self.apply(InputAction::InsertNewline)
            }
            None => {
                self.apply(InputAction::Insert(line.to_string()));
                self.apply(InputAction::Submit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_does_not_submit() {
        let mut input = InputBuffer::new();
        assert!(!input.apply(InputAction::Insert("first".into())));
        assert!(!input.apply(InputAction::InsertNewline));
        assert!(!input.apply(InputAction::Insert("second".into())));
        assert!(input.apply(InputAction::Submit));
        assert_eq!(input.text(), "first\nsecond");
    }

    #[test]
    fn test_feed_line_continuation() {
        let mut input = InputBuffer::new();
        assert!(!input.feed_line("select revenue\\\n"));
        assert!(input.feed_line("for 2015\n"));
        assert_eq!(input.text(), "select revenue\nfor 2015");

        input.clear();
        assert_eq!(input.text(), "");
    }
}
