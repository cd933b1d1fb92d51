// CPU load from /proc/stat: aggregate line plus per-core lines.

use std::path::PathBuf;

use crate::error::{SourceError, read_to_string};
use crate::models::{CpuLoad, Reading};
use crate::rate::busy_percent;

use super::Sampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    idle: u64,
    total: u64,
}

/// Slot 0 is the aggregate `cpu` line, slot n+1 is `cpuN`.
pub struct CpuUnit {
    stat_path: PathBuf,
    prev: Vec<Option<CpuTimes>>,
    current: CpuLoad,
}

impl CpuUnit {
    pub fn new(stat_path: impl Into<PathBuf>) -> Self {
        Self {
            stat_path: stat_path.into(),
            prev: Vec::new(),
            current: CpuLoad::default(),
        }
    }

    pub fn load(&self) -> CpuLoad {
        self.current
    }

    /// Computes loads from one `/proc/stat` read. State is only committed
    /// when every cpu line parsed.
    pub fn update_from(&mut self, content: &str) -> Result<(), SourceError> {
        let mut readings: Vec<(usize, CpuTimes)> = Vec::new();
        for line in content.lines() {
            let mut fields = line.split_whitespace();
            let Some(label) = fields.next() else {
                break;
            };
            let Some(suffix) = label.strip_prefix("cpu") else {
                // cpu lines come first; the rest of the table is not ours
                break;
            };
            let slot = if suffix.is_empty() {
                0
            } else {
                suffix
                    .parse::<usize>()
                    .map_err(|_| SourceError::parse(format!("bad cpu label {label:?}")))?
                    + 1
            };
            readings.push((slot, parse_times(label, fields)?));
        }
        if readings.is_empty() {
            return Err(SourceError::parse("no cpu lines in stat table"));
        }

        let mut load = CpuLoad::default();
        let mut prev = self.prev.clone();
        for (slot, times) in readings {
            if prev.len() <= slot {
                prev.resize(slot + 1, None);
            }
            let percent = prev[slot].map_or(0, |p| {
                busy_percent(p.idle, times.idle, p.total, times.total)
            });
            prev[slot] = Some(times);
            if slot == 0 {
                load.load = percent;
            } else {
                load.max_core_load = load.max_core_load.max(percent);
            }
        }
        self.prev = prev;
        self.current = load;
        Ok(())
    }
}

fn parse_times<'a>(
    label: &str,
    fields: impl Iterator<Item = &'a str>,
) -> Result<CpuTimes, SourceError> {
    let mut idle = None;
    let mut total: u64 = 0;
    for (i, field) in fields.enumerate() {
        let value: u64 = field
            .parse()
            .map_err(|_| SourceError::parse(format!("{label}: bad counter {field:?}")))?;
        if i == 3 {
            idle = Some(value);
        }
        total = total.saturating_add(value);
    }
    let idle = idle.ok_or_else(|| SourceError::parse(format!("{label}: too few counters")))?;
    Ok(CpuTimes { idle, total })
}

impl Sampler for CpuUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        let content = read_to_string(&self.stat_path)?;
        self.update_from(&content)
    }

    fn reading(&self) -> Reading {
        Reading::Cpu(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_A: &str = "\
cpu  100 0 100 800 0 0 0 0 0 0
cpu0 50 0 50 400 0 0 0 0 0 0
cpu1 50 0 50 400 0 0 0 0 0 0
intr 12345 0 0
ctxt 999
";

    // cpu0 fully busy (+100 busy), cpu1 fully idle (+100 idle)
    const STAT_B: &str = "\
cpu  200 0 100 900 0 0 0 0 0 0
cpu0 150 0 50 400 0 0 0 0 0 0
cpu1 50 0 50 500 0 0 0 0 0 0
intr 12400 0 0
";

    #[test]
    fn first_sample_reports_zero() {
        let mut unit = CpuUnit::new("/unused");
        unit.update_from(STAT_A).unwrap();
        assert_eq!(unit.load(), CpuLoad::default());
    }

    #[test]
    fn aggregate_and_max_core_tracked_separately() {
        let mut unit = CpuUnit::new("/unused");
        unit.update_from(STAT_A).unwrap();
        unit.update_from(STAT_B).unwrap();
        assert_eq!(
            unit.load(),
            CpuLoad {
                load: 50,
                max_core_load: 100,
            }
        );
    }

    #[test]
    fn same_counters_twice_is_zero() {
        let mut unit = CpuUnit::new("/unused");
        unit.update_from(STAT_B).unwrap();
        unit.update_from(STAT_B).unwrap();
        assert_eq!(unit.load(), CpuLoad::default());
    }

    #[test]
    fn malformed_counter_fails_and_keeps_previous_value() {
        let mut unit = CpuUnit::new("/unused");
        unit.update_from(STAT_A).unwrap();
        unit.update_from(STAT_B).unwrap();
        let err = unit
            .update_from("cpu  1 2 x 4\ncpu0 1 2 3 4\n")
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
        assert_eq!(unit.load().load, 50);
    }

    #[test]
    fn bad_core_label_is_parse_error() {
        let mut unit = CpuUnit::new("/unused");
        let err = unit.update_from("cpu 1 2 3 4\ncpuX 1 2 3 4\n").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn too_few_counters_is_parse_error() {
        let mut unit = CpuUnit::new("/unused");
        assert!(matches!(
            unit.update_from("cpu 1 2 3\n"),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn empty_table_is_parse_error() {
        let mut unit = CpuUnit::new("/unused");
        assert!(matches!(unit.update_from(""), Err(SourceError::Parse(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let mut unit = CpuUnit::new("/nonexistent/proc/stat");
        assert!(matches!(unit.sample(0), Err(SourceError::Read { .. })));
    }
}
