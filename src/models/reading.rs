// Derived values published by units

use std::path::PathBuf;

/// Aggregate and busiest-core load, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuLoad {
    pub load: u64,
    pub max_core_load: u64,
}

/// Memory quantities in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    /// `(total - available) * 100 / total`
    pub used_percent: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskRates {
    pub device: String,
    pub read_bytes_per_sec: u64,
    pub write_bytes_per_sec: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRate {
    pub name: String,
    pub rx_bytes_per_sec: u64,
    pub tx_bytes_per_sec: u64,
}

/// A scaled sysfs scalar (temperature and the like) with display thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarValue {
    pub label: String,
    pub value: i64,
    pub suffix: String,
    pub warn_at: Option<i64>,
    pub urgent_at: Option<i64>,
}

impl ScalarValue {
    pub fn is_urgent(&self) -> bool {
        self.urgent_at.is_some_and(|limit| self.value >= limit)
    }

    pub fn is_warning(&self) -> bool {
        self.warn_at.is_some_and(|limit| self.value >= limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeSpace {
    pub path: PathBuf,
    pub available_bytes: u64,
}

/// Default sink state as reported by the audio server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeState {
    pub percent: u32,
    pub muted: bool,
}

/// Focused window title and active keyboard layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    pub title: String,
    pub layout_index: i64,
}

/// The current value of one unit, as captured into a render snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Cpu(CpuLoad),
    Memory(MemoryUsage),
    Disk(DiskRates),
    Network(Vec<InterfaceRate>),
    Scalar(ScalarValue),
    FreeSpace {
        entries: Vec<FreeSpace>,
        urgent_below_bytes: u64,
    },
    Volume(VolumeState),
    Window(WindowState),
    Clock(String),
}
