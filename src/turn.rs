use std::fmt;

use crate::escape::escape_markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    SystemError,
}

impl Role {
    /// Stable name used as the CSS class in exported transcripts.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::SystemError => "system-error",
        }
    }

    /// Label shown in front of the turn on a terminal.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::SystemError => "System",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exchange unit in the transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub auxiliary: Option<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            auxiliary: None,
        }
    }

    pub fn assistant(text: impl Into<String>, auxiliary: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            auxiliary,
        }
    }

    pub fn system_error(text: impl Into<String>) -> Self {
        Self {
            role: Role::SystemError,
            text: text.into(),
            auxiliary: None,
        }
    }

    /// Builds the render request handed to a transcript surface. All text is
    /// escaped here; surfaces never see raw user or server text.
    pub fn render(&self) -> RenderedTurn {
        RenderedTurn {
            order: 0,
            role: self.role,
            text: escape_markup(Some(&self.text)),
            auxiliary: self.auxiliary.as_deref().map(|aux| escape_markup(Some(aux))),
        }
    }
}

/// A turn whose text fields are already markup-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTurn {
    /// Position in the transcript, stamped by [`Transcript`] on append.
    ///
    /// [`Transcript`]: crate::transcript::Transcript
    pub order: usize,
    pub role: Role,
    pub text: String,
    pub auxiliary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes_text_and_auxiliary() {
        let turn = Turn::assistant("<b>hi</b>", Some("a & b".to_string()));
        let rendered = turn.render();
        assert_eq!(rendered.role, Role::Assistant);
        assert_eq!(rendered.text, "&lt;b&gt;hi&lt;/b&gt;");
        assert_eq!(rendered.auxiliary.as_deref(), Some("a &amp; b"));
    }

    #[test]
    fn test_render_without_auxiliary() {
        let rendered = Turn::user("hello").render();
        assert_eq!(rendered.auxiliary, None);
        assert_eq!(rendered.text, "hello");
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::SystemError.to_string(), "system-error");
        assert_eq!(Role::User.label(), "You");
    }
}
