// Memory usage from /proc/meminfo.

use std::path::PathBuf;

use crate::error::{SourceError, read_to_string};
use crate::models::{MemoryUsage, Reading};

use super::Sampler;

pub struct MemoryUnit {
    meminfo_path: PathBuf,
    current: MemoryUsage,
}

impl MemoryUnit {
    pub fn new(meminfo_path: impl Into<PathBuf>) -> Self {
        Self {
            meminfo_path: meminfo_path.into(),
            current: MemoryUsage::default(),
        }
    }

    pub fn usage(&self) -> MemoryUsage {
        self.current
    }

    pub fn update_from(&mut self, content: &str) -> Result<(), SourceError> {
        self.current = parse_meminfo(content)?;
        Ok(())
    }
}

/// Scans until MemTotal, MemFree and MemAvailable have all been seen.
pub(crate) fn parse_meminfo(content: &str) -> Result<MemoryUsage, SourceError> {
    let mut total = None;
    let mut free = None;
    let mut available = None;
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let slot = match key {
            "MemTotal:" => &mut total,
            "MemFree:" => &mut free,
            "MemAvailable:" => &mut available,
            _ => continue,
        };
        let kib: u64 = value
            .parse()
            .map_err(|_| SourceError::parse(format!("{key} bad value {value:?}")))?;
        *slot = Some(kib.saturating_mul(1024));
        if total.is_some() && free.is_some() && available.is_some() {
            break;
        }
    }
    let total = total.ok_or(SourceError::MissingField("MemTotal"))?;
    let free = free.ok_or(SourceError::MissingField("MemFree"))?;
    let available = available.ok_or(SourceError::MissingField("MemAvailable"))?;
    if total == 0 {
        return Err(SourceError::parse("MemTotal is zero"));
    }
    let used = u128::from(total.saturating_sub(available));
    let used_percent = u64::try_from(used * 100 / u128::from(total))
        .map_err(|_| SourceError::parse("used memory percent out of range"))?;
    Ok(MemoryUsage {
        total,
        free,
        available,
        used_percent,
    })
}

impl Sampler for MemoryUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        let content = read_to_string(&self.meminfo_path)?;
        self.update_from(&content)
    }

    fn reading(&self) -> Reading {
        Reading::Memory(self.current)
    }
}
