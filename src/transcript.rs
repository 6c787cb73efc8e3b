use minijinja::{context, value::Value, Environment};

use crate::turn::RenderedTurn;

/// Append-only view the session renders turns into.
///
/// Implementations receive already-escaped text and must keep the most
/// recently appended entry in view.
pub trait TranscriptSurface: Send + 'static {
    fn append(&mut self, turn: RenderedTurn);

    /// Shows the pending placeholder with its first frame.
    fn show_pending(&mut self, frame: &str);

    /// Replaces the pending frame. Does nothing when no placeholder is shown.
    fn animate_pending(&mut self, frame: &str);

    fn remove_pending(&mut self);
}

/// In-memory transcript with auto-scroll to the newest entry.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<RenderedTurn>,
    pending: Option<String>,
    pub scroll_position: usize,
    pub max_scroll: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RenderedTurn] {
        &self.entries
    }

    /// Current pending frame, if the placeholder is shown.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_position = self.scroll_position.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_position = self.max_scroll;
    }

    fn update_max_scroll(&mut self) {
        // The pending placeholder occupies a row below the last entry.
        let rows = self.entries.len() + usize::from(self.pending.is_some());
        self.max_scroll = rows.saturating_sub(1);
    }

    /// Renders the transcript as a standalone HTML page.
    ///
    /// Entry text is already escaped and inserted as-is; the title is escaped
    /// by the template engine.
    pub fn render_html(&self, title: &str) -> Result<String, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("transcript.html", TRANSCRIPT_TEMPLATE)?;
        let tmpl = env.get_template("transcript.html")?;

        let turns: Vec<Value> = self
            .entries
            .iter()
            .map(|turn| {
                context! {
                    role => turn.role.as_str(),
                    label => turn.role.label(),
                    text => Value::from_safe_string(turn.text.clone()),
                    auxiliary => turn.auxiliary.clone().map(Value::from_safe_string),
                }
            })
            .collect();

        tmpl.render(context! { title => title, turns => turns })
    }
}

impl TranscriptSurface for Transcript {
    fn append(&mut self, mut turn: RenderedTurn) {
        turn.order = self.entries.len();
        self.entries.push(turn);
        self.update_max_scroll();
        // Auto-scroll to bottom when a new turn is added
        self.scroll_to_bottom();
    }

    fn show_pending(&mut self, frame: &str) {
        self.pending = Some(frame.to_string());
        self.update_max_scroll();
        self.scroll_to_bottom();
    }

    fn animate_pending(&mut self, frame: &str) {
        if let Some(current) = self.pending.as_mut() {
            frame.clone_into(current);
        }
    }

    fn remove_pending(&mut self) {
        self.pending = None;
        self.update_max_scroll();
        self.scroll_position = self.scroll_position.min(self.max_scroll);
    }
}

const TRANSCRIPT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
</head>
<body>
<div id="chat-box">
{%- for turn in turns %}
<div class="msg {{ turn.role }}"><b>{{ turn.label }}:</b> {{ turn.text }}
{%- if turn.auxiliary %}
<pre class="tool">{{ turn.auxiliary }}</pre>
{%- endif %}
</div>
{%- endfor %}
</div>
</body>
</html>
"#;
