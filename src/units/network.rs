// Per-interface throughput from /proc/net/dev.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use crate::error::{SourceError, read_to_string};
use crate::models::{InterfaceRate, Reading};
use crate::rate::per_second;

use super::Sampler;

/// The interface table is only re-read on every third tick.
pub const NETWORK_TICK_DIVISOR: u64 = 3;

#[derive(Debug, Clone, Copy)]
struct InterfaceEntry {
    rx_bytes: u64,
    tx_bytes: u64,
    rx_rate: u64,
    tx_rate: u64,
}

type ExcludeFn = Box<dyn Fn(&str) -> bool + Send>;

pub struct NetworkUnit {
    dev_path: PathBuf,
    exclude: ExcludeFn,
    entries: HashMap<String, InterfaceEntry>,
    /// Interface names in table order.
    order: Vec<String>,
    last_sample: Option<Instant>,
}

impl NetworkUnit {
    pub fn new(dev_path: impl Into<PathBuf>, exclude: impl Fn(&str) -> bool + Send + 'static) -> Self {
        Self {
            dev_path: dev_path.into(),
            exclude: Box::new(exclude),
            entries: HashMap::new(),
            order: Vec::new(),
            last_sample: None,
        }
    }

    pub fn rates(&self) -> Vec<InterfaceRate> {
        self.order
            .iter()
            .filter_map(|name| {
                self.entries.get(name).map(|e| InterfaceRate {
                    name: name.clone(),
                    rx_bytes_per_sec: e.rx_rate,
                    tx_bytes_per_sec: e.tx_rate,
                })
            })
            .collect()
    }

    /// Rebuilds the registry from one table read. Interfaces seen for the
    /// first time start at rate 0; interfaces missing from the table are
    /// dropped. Nothing is committed if any line is malformed.
    pub fn update_from(&mut self, content: &str, now: Instant) -> Result<(), SourceError> {
        let elapsed = self
            .last_sample
            .map(|prev| now.saturating_duration_since(prev))
            .unwrap_or_default();

        let mut entries = HashMap::with_capacity(self.entries.len());
        let mut order = Vec::with_capacity(self.order.len());
        // first two lines are column headers
        for line in content.lines().skip(2) {
            if line.trim().is_empty() {
                continue;
            }
            let (name, counters) = line
                .split_once(':')
                .ok_or_else(|| SourceError::parse(format!("no ':' separator in {line:?}")))?;
            let name = name.trim();
            if (self.exclude)(name) {
                continue;
            }
            if entries.contains_key(name) {
                return Err(SourceError::parse(format!("interface {name} listed twice")));
            }
            let (rx_bytes, tx_bytes) = parse_counters(name, counters)?;
            let entry = match self.entries.get(name) {
                Some(prev) => InterfaceEntry {
                    rx_bytes,
                    tx_bytes,
                    rx_rate: per_second(prev.rx_bytes, rx_bytes, elapsed),
                    tx_rate: per_second(prev.tx_bytes, tx_bytes, elapsed),
                },
                None => InterfaceEntry {
                    rx_bytes,
                    tx_bytes,
                    rx_rate: 0,
                    tx_rate: 0,
                },
            };
            entries.insert(name.to_string(), entry);
            order.push(name.to_string());
        }

        for gone in self.order.iter().filter(|n| !entries.contains_key(*n)) {
            tracing::debug!(interface = %gone, "network interface disappeared");
        }
        self.entries = entries;
        self.order = order;
        self.last_sample = Some(now);
        Ok(())
    }
}

/// Receive bytes is column 1, transmit bytes is column 9.
fn parse_counters(name: &str, counters: &str) -> Result<(u64, u64), SourceError> {
    let fields: Vec<&str> = counters.split_whitespace().collect();
    if fields.len() < 9 {
        return Err(SourceError::parse(format!(
            "{name}: {} counters, expected at least 9",
            fields.len()
        )));
    }
    let number = |i: usize| {
        fields[i]
            .parse::<u64>()
            .map_err(|_| SourceError::parse(format!("{name}: bad counter {:?}", fields[i])))
    };
    Ok((number(0)?, number(8)?))
}

impl Sampler for NetworkUnit {
    fn sample(&mut self, tick: u64) -> Result<(), SourceError> {
        if tick % NETWORK_TICK_DIVISOR != 0 {
            return Ok(());
        }
        let content = read_to_string(&self.dev_path)?;
        self.update_from(&content, Instant::now())
    }

    fn reading(&self) -> Reading {
        Reading::Network(self.rates())
    }
}
