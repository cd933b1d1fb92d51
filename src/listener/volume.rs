// Audio sink listener: subscribes to mixer notifications and re-queries the
// default sink's volume and mute flag on every sink change.

use crate::error::SourceError;
use crate::models::VolumeState;
use crate::units::Update;

use super::{LineStream, Reporter};

const SINK_CHANGE_PREFIX: &str = "Event 'change' on sink";
const DEFAULT_SINK_PREFIX: &str = "Default sink name: ";

#[derive(Debug, Clone)]
pub struct VolumeListener {
    /// Long-lived notification command, e.g. `pactl subscribe`.
    pub subscribe: Vec<String>,
    /// One-shot sink dump, e.g. `pacmd info`.
    pub query: Vec<String>,
}

impl VolumeListener {
    pub(super) async fn session(&self, reporter: &Reporter) -> Result<(), SourceError> {
        let mut events = LineStream::spawn(&self.subscribe)?;
        reporter.connected().await?;
        tracing::info!(listener = reporter.name(), program = events.program(), "volume stream open");

        let state = query_sink(&self.query).await?;
        reporter.update(Update::Volume(state)).await?;

        while let Some(line) = events.next_line().await? {
            if !is_sink_change(&line) {
                continue;
            }
            match query_sink(&self.query).await {
                Ok(state) => reporter.update(Update::Volume(state)).await?,
                // keep the subscription; the next change retries the query
                Err(e) => {
                    tracing::warn!(listener = reporter.name(), error = %e, "sink query failed");
                    reporter.failed(e).await?;
                }
            }
        }
        Ok(())
    }
}

pub fn is_sink_change(line: &str) -> bool {
    line.starts_with(SINK_CHANGE_PREFIX)
}

/// Runs the one-shot query command and stops reading (killing the child)
/// as soon as the default sink's volume and mute flag are known.
pub async fn query_sink(argv: &[String]) -> Result<VolumeState, SourceError> {
    let mut output = LineStream::spawn(argv)?;
    let mut parser = SinkInfoParser::default();
    while let Some(line) = output.next_line().await? {
        if let Some(state) = parser.feed(&line)? {
            return Ok(state);
        }
    }
    parser.finish()
}

/// Incremental parser for the audio server's info dump.
///
/// Finds `Default sink name: X`, then the sink block containing
/// `name: <X>`, then that block's `\tvolume:` and `\tmuted:` lines.
#[derive(Debug, Default)]
pub struct SinkInfoParser {
    default_sink: Option<String>,
    in_default_sink: bool,
    volume: Option<u32>,
    muted: Option<bool>,
}

impl SinkInfoParser {
    /// Returns the state once both values have been seen.
    pub fn feed(&mut self, line: &str) -> Result<Option<VolumeState>, SourceError> {
        if self.in_default_sink && line.starts_with("\tvolume: ") {
            self.volume = Some(parse_percent(line)?);
        } else if self.in_default_sink && line == "\tmuted: no" {
            self.muted = Some(false);
        } else if self.in_default_sink && line == "\tmuted: yes" {
            self.muted = Some(true);
        } else if self.default_sink.is_none() {
            if let Some(name) = line.strip_prefix(DEFAULT_SINK_PREFIX) {
                self.default_sink = Some(name.to_string());
            }
        } else if let Some(name) = &self.default_sink
            && line
                .strip_suffix('>')
                .and_then(|l| l.strip_suffix(name.as_str()))
                .is_some_and(|l| l.ends_with("name: <"))
        {
            self.in_default_sink = true;
        }

        Ok(match (self.volume, self.muted) {
            (Some(percent), Some(muted)) => Some(VolumeState { percent, muted }),
            _ => None,
        })
    }

    /// Called at end of input when `feed` never completed.
    pub fn finish(self) -> Result<VolumeState, SourceError> {
        if self.default_sink.is_none() {
            return Err(SourceError::MissingField("default sink name"));
        }
        let percent = self.volume.ok_or(SourceError::MissingField("sink volume"))?;
        let muted = self.muted.ok_or(SourceError::MissingField("sink muted"))?;
        Ok(VolumeState { percent, muted })
    }
}

/// The digits immediately before the first `%` on a volume line.
fn parse_percent(line: &str) -> Result<u32, SourceError> {
    let idx = line
        .find('%')
        .ok_or_else(|| SourceError::parse(format!("no '%' in {line:?}")))?;
    let head = &line[..idx];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map_or(idx, |(i, _)| i);
    head[start..]
        .parse()
        .map_err(|_| SourceError::parse(format!("no volume digits in {line:?}")))
}
