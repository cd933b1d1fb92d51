// Local wall-clock time.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};

use crate::error::SourceError;
use crate::models::Reading;

use super::Sampler;

pub const DEFAULT_CLOCK_FORMAT: &str = "%H:%M:%S";

pub struct ClockUnit {
    format: String,
    text: String,
}

impl ClockUnit {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            text: String::new(),
        }
    }

    /// True when chrono can render `format` without an error item.
    pub fn is_valid_format(format: &str) -> bool {
        !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    }
}

impl Default for ClockUnit {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_FORMAT)
    }
}

impl Sampler for ClockUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        let mut text = String::with_capacity(self.format.len() + 8);
        write!(text, "{}", chrono::Local::now().format(&self.format))
            .map_err(|_| SourceError::parse(format!("bad clock format {:?}", self.format)))?;
        self.text = text;
        Ok(())
    }

    fn reading(&self) -> Reading {
        Reading::Clock(self.text.clone())
    }
}
