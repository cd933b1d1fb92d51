// Single-integer sysfs files (hwmon temperatures and similar).

use std::path::PathBuf;

use crate::error::{SourceError, read_to_string};
use crate::models::{Reading, ScalarValue};

use super::Sampler;

pub struct ScalarUnit {
    path: PathBuf,
    divisor: f64,
    value: ScalarValue,
}

impl ScalarUnit {
    /// `divisor` must be non-zero; config validation guarantees it.
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, divisor: f64) -> Self {
        Self {
            path: path.into(),
            divisor,
            value: ScalarValue {
                label: label.into(),
                value: 0,
                suffix: String::new(),
                warn_at: None,
                urgent_at: None,
            },
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.value.suffix = suffix.into();
        self
    }

    pub fn with_thresholds(mut self, warn_at: Option<i64>, urgent_at: Option<i64>) -> Self {
        self.value.warn_at = warn_at;
        self.value.urgent_at = urgent_at;
        self
    }

    pub fn value(&self) -> i64 {
        self.value.value
    }

    pub fn update_from(&mut self, content: &str) -> Result<(), SourceError> {
        let text = content.trim();
        let raw: i64 = text.parse().map_err(|_| {
            SourceError::parse(format!("{}: expected integer, got {text:?}", self.path.display()))
        })?;
        self.value.value = (raw as f64 / self.divisor).round() as i64;
        Ok(())
    }
}

impl Sampler for ScalarUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        let content = read_to_string(&self.path)?;
        self.update_from(&content)
    }

    fn reading(&self) -> Reading {
        Reading::Scalar(self.value.clone())
    }
}
