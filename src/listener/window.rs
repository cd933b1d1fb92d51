// Window-manager listener: JSON-lines stream of window and input events.

use serde::Deserialize;

use crate::error::SourceError;
use crate::units::{Update, WindowChange};

use super::{LineStream, Reporter};

#[derive(Debug, Clone)]
pub struct WindowListener {
    /// Subscription command, e.g. `swaymsg -r -t subscribe -m '["window","input"]'`.
    pub command: Vec<String>,
}

impl WindowListener {
    pub(super) async fn session(&self, reporter: &Reporter) -> Result<(), SourceError> {
        let mut events = LineStream::spawn(&self.command)?;
        reporter.connected().await?;
        tracing::info!(listener = reporter.name(), program = events.program(), "window event stream open");

        while let Some(line) = events.next_line().await? {
            if let Some(change) = decode_event(&line)? {
                reporter.update(Update::Window(change)).await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WmEvent {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    container: Option<WmContainer>,
    #[serde(default)]
    input: Option<WmInput>,
}

#[derive(Debug, Default, Deserialize)]
struct WmContainer {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WmInput {
    #[serde(default)]
    xkb_active_layout_name: Option<String>,
    #[serde(default)]
    xkb_active_layout_index: Option<i64>,
}

/// Decodes one event line. `Ok(None)` for blank lines, subscription
/// replies, and events that carry neither a title nor a layout.
///
/// A title is taken only when non-empty; a layout index only when the event
/// names a non-empty active layout.
pub fn decode_event(line: &str) -> Result<Option<WindowChange>, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let event: WmEvent = serde_json::from_str(line)
        .map_err(|e| SourceError::stream(format!("undecodable window event: {e}")))?;

    if event.success == Some(false) {
        return Err(SourceError::stream("window manager rejected subscription"));
    }

    let title = event
        .container
        .and_then(|c| c.name)
        .filter(|name| !name.is_empty());
    let layout_index = event.input.and_then(|input| {
        input
            .xkb_active_layout_name
            .filter(|name| !name.is_empty())
            .map(|_| input.xkb_active_layout_index.unwrap_or(0))
    });

    if title.is_none() && layout_index.is_none() {
        return Ok(None);
    }
    Ok(Some(WindowChange {
        title,
        layout_index,
    }))
}
