// Interactive terminal front end: stdin is the input surface, stdout the
// transcript surface.

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use parley::escape::unescape_markup;
use parley::{
    ChatEndpoint, ChatSession, InputBuffer, RenderedTurn, Role, Transcript, TranscriptSurface,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const PENDING_LABEL: &str = "Assistant is thinking";

/// Prints turns as they arrive and keeps an in-memory copy for export.
pub struct ConsoleTranscript {
    transcript: Transcript,
    animate: bool,
}

impl ConsoleTranscript {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            // Cursor tricks only make sense on a terminal.
            animate: std::io::stdout().is_terminal(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn redraw_pending(&self, frame: &str) {
        if !self.animate {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r\x1b[2K{PENDING_LABEL}{frame}");
        let _ = stdout.flush();
    }
}

impl Default for ConsoleTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSurface for ConsoleTranscript {
    fn append(&mut self, turn: RenderedTurn) {
        // The terminal is the renderer here: entities decode back to text.
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(
            stdout,
            "{}: {}",
            turn.role.label(),
            unescape_markup(&turn.text)
        );
        if let Some(aux) = &turn.auxiliary {
            for line in unescape_markup(aux).lines() {
                let _ = writeln!(stdout, "    | {line}");
            }
        }
        let _ = stdout.flush();
        drop(stdout);
        self.transcript.append(turn);
    }

    fn show_pending(&mut self, frame: &str) {
        self.transcript.show_pending(frame);
        self.redraw_pending(frame);
    }

    fn animate_pending(&mut self, frame: &str) {
        if self.transcript.pending().is_none() {
            return;
        }
        self.transcript.animate_pending(frame);
        self.redraw_pending(frame);
    }

    fn remove_pending(&mut self) {
        if self.animate && self.transcript.pending().is_some() {
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "\r\x1b[2K");
            let _ = stdout.flush();
        }
        self.transcript.remove_pending();
    }
}

/// Reads messages from stdin until EOF or `/quit`.
pub async fn run_chat<E: ChatEndpoint>(endpoint: E, export: Option<&Path>) -> Result<()> {
    let surface = Arc::new(Mutex::new(ConsoleTranscript::new()));
    let session = ChatSession::new(endpoint, surface.clone());

    println!("Type a message and press Enter. End a line with \\ to continue it, /quit to leave.");

    let mut input = InputBuffer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if input.text().is_empty() && line.trim() == "/quit" {
            break;
        }
        if !input.feed_line(&line) {
            continue;
        }
        if session.submit_input(&mut input) {
            session.wait_idle().await;
        } else {
            // Whitespace-only submissions leave nothing worth keeping.
            input.clear();
        }
    }

    if let Some(path) = export {
        export_transcript(&surface, path)?;
    }
    info!("Chat session finished.");
    Ok(())
}

/// Runs a single turn and fails if it ended in a system-error turn.
pub async fn send_once<E: ChatEndpoint>(endpoint: E, message: &str) -> Result<()> {
    let surface = Arc::new(Mutex::new(ConsoleTranscript::new()));
    let session = ChatSession::new(endpoint, surface.clone());

    if !session.submit(message) {
        bail!("Message is empty");
    }
    session.wait_idle().await;

    let surface = surface
        .lock()
        .map_err(|_| anyhow::anyhow!("Transcript lock poisoned"))?;
    match surface.transcript().entries().last() {
        Some(turn) if turn.role == Role::SystemError => {
            warn!("Turn ended with an error");
            bail!("{}", unescape_markup(&turn.text))
        }
        _ => Ok(()),
    }
}

fn export_transcript(surface: &Mutex<ConsoleTranscript>, path: &Path) -> Result<()> {
    let surface = surface
        .lock()
        .map_err(|_| anyhow::anyhow!("Transcript lock poisoned"))?;
    let html = surface
        .transcript()
        .render_html("Chat transcript")
        .context("Failed to render transcript")?;
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
    info!("Transcript exported to {}", path.display());
    Ok(())
}
