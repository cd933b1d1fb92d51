// Block device throughput from /sys/class/block/<dev>/stat.

use std::path::PathBuf;
use std::time::Instant;

use crate::error::{SourceError, read_to_string};
use crate::models::{DiskRates, Reading};
use crate::rate::per_second;

use super::Sampler;

/// The stat file always counts 512-byte sectors, whatever the device's
/// logical block size.
pub const SECTOR_SIZE: u64 = 512;

#[derive(Debug, Clone, Copy)]
struct SectorCounts {
    read: u64,
    written: u64,
    at: Instant,
}

pub struct DiskUnit {
    stat_path: PathBuf,
    prev: Option<SectorCounts>,
    current: DiskRates,
}

impl DiskUnit {
    pub fn new(block_root: impl Into<PathBuf>, device: &str) -> Self {
        Self {
            stat_path: block_root.into().join(device).join("stat"),
            prev: None,
            current: DiskRates {
                device: device.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn rates(&self) -> &DiskRates {
        &self.current
    }

    /// Rates are over the wall time since this unit's own previous sample.
    pub fn update_from(&mut self, content: &str, now: Instant) -> Result<(), SourceError> {
        let (read, written) = parse_sectors(content)?;
        let (read_rate, write_rate) = match self.prev {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.at);
                (
                    per_second(
                        prev.read.saturating_mul(SECTOR_SIZE),
                        read.saturating_mul(SECTOR_SIZE),
                        elapsed,
                    ),
                    per_second(
                        prev.written.saturating_mul(SECTOR_SIZE),
                        written.saturating_mul(SECTOR_SIZE),
                        elapsed,
                    ),
                )
            }
            None => (0, 0),
        };
        self.prev = Some(SectorCounts {
            read,
            written,
            at: now,
        });
        self.current.read_bytes_per_sec = read_rate;
        self.current.write_bytes_per_sec = write_rate;
        Ok(())
    }
}

/// Fields 3 and 7 (1-based) are sectors read and sectors written.
fn parse_sectors(content: &str) -> Result<(u64, u64), SourceError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.len() < 7 {
        return Err(SourceError::parse(format!(
            "block stat has {} fields, expected at least 7",
            fields.len()
        )));
    }
    let number = |i: usize| {
        fields[i]
            .parse::<u64>()
            .map_err(|_| SourceError::parse(format!("block stat field {} is {:?}", i + 1, fields[i])))
    };
    Ok((number(2)?, number(6)?))
}

impl Sampler for DiskUnit {
    fn sample(&mut self, _tick: u64) -> Result<(), SourceError> {
        let content = read_to_string(&self.stat_path)?;
        self.update_from(&content, Instant::now())
    }

    fn reading(&self) -> Reading {
        Reading::Disk(self.current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stat(read: u64, written: u64) -> String {
        format!("  1000  20  {read}  300  400  10  {written}  500  0  600  900\n")
    }

    #[test]
    fn first_sample_is_zero() {
        let mut unit = DiskUnit::new("/sys/class/block", "nvme0n1");
        unit.update_from(&stat(1_000_000, 2_000_000), Instant::now())
            .unwrap();
        assert_eq!(unit.rates().read_bytes_per_sec, 0);
        assert_eq!(unit.rates().write_bytes_per_sec, 0);
        assert_eq!(unit.rates().device, "nvme0n1");
    }

    #[test]
    fn sector_delta_converted_to_bytes_per_second() {
        let mut unit = DiskUnit::new("/sys/class/block", "sda");
        let t0 = Instant::now();
        unit.update_from(&stat(100, 100), t0).unwrap();
        unit.update_from(&stat(104, 300), t0 + Duration::from_secs(2))
            .unwrap();
        assert_eq!(unit.rates().read_bytes_per_sec, 4 * 512 / 2);
        assert_eq!(unit.rates().write_bytes_per_sec, 200 * 512 / 2);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let mut unit = DiskUnit::new("/sys/class/block", "sda");
        let t0 = Instant::now();
        unit.update_from(&stat(5000, 5000), t0).unwrap();
        unit.update_from(&stat(10, 6000), t0 + Duration::from_secs(1))
            .unwrap();
        assert_eq!(unit.rates().read_bytes_per_sec, 0);
        assert_eq!(unit.rates().write_bytes_per_sec, 1000 * 512);
    }

    #[test]
    fn short_stat_is_parse_error() {
        let mut unit = DiskUnit::new("/sys/class/block", "sda");
        assert!(matches!(
            unit.update_from("1 2 3", Instant::now()),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn stat_path_joins_device() {
        let unit = DiskUnit::new("/sys/class/block", "sda");
        assert_eq!(unit.stat_path, PathBuf::from("/sys/class/block/sda/stat"));
    }
}
