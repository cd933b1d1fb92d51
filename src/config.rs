use serde::Deserialize;

use crate::units::{ClockUnit, DEFAULT_CLOCK_FORMAT};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub listeners: ListenersConfig,
    pub cpu: CpuConfig,
    pub memory: MemoryConfig,
    pub disk: DiskConfig,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub sensors: Vec<SensorConfig>,
    pub volume: VolumeConfig,
    pub window: WindowConfig,
    pub clock: ClockConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick length; ticks land on multiples of this since the epoch.
    pub interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenersConfig {
    /// Wait before restarting a failed listener.
    pub backoff_ms: u64,
    /// Capacity of the listener -> scheduler channel.
    pub channel_capacity: usize,
}

impl Default for ListenersConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 1000,
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub enabled: bool,
    pub stat_path: String,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stat_path: "/proc/stat".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub enabled: bool,
    pub meminfo_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            meminfo_path: "/proc/meminfo".into(),
        }
    }
}

/// Disabled unless a device is named.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    pub device: Option<String>,
    pub block_root: String,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            device: None,
            block_root: "/sys/class/block".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub enabled: bool,
    pub dev_path: String,
    /// Interface names skipped exactly.
    pub exclude: Vec<String>,
    /// Interface name prefixes skipped.
    pub exclude_prefixes: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dev_path: "/proc/net/dev".into(),
            exclude: vec!["lo".into()],
            exclude_prefixes: vec!["docker".into(), "br-".into(), "veth".into()],
        }
    }
}

impl NetworkConfig {
    pub fn excludes(&self, name: &str) -> bool {
        self.exclude.iter().any(|n| n == name)
            || self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub mounts: Vec<String>,
    pub urgent_below_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mounts: vec!["/".into()],
            urgent_below_bytes: 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub label: String,
    pub path: String,
    #[serde(default = "default_divisor")]
    pub divisor: f64,
    #[serde(default = "default_sensor_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub warn_at: Option<i64>,
    #[serde(default)]
    pub urgent_at: Option<i64>,
}

fn default_divisor() -> f64 {
    1000.0
}

fn default_sensor_suffix() -> String {
    "°C".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub enabled: bool,
    pub subscribe: Vec<String>,
    pub query: Vec<String>,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subscribe: vec!["pactl".into(), "subscribe".into()],
            query: vec!["pacmd".into(), "info".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub enabled: bool,
    pub command: Vec<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec![
                "swaymsg".into(),
                "-r".into(),
                "-t".into(),
                "subscribe".into(),
                "-m".into(),
                r#"["window","input"]"#.into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub enabled: bool,
    pub format: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: DEFAULT_CLOCK_FORMAT.into(),
        }
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE`, else `config.toml`. Without `CONFIG_FILE`, a
    /// missing `config.toml` means built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?;
                Self::load_from_str(&s)
            }
            Err(_) => match std::fs::read_to_string("config.toml") {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
                Err(e) => Err(anyhow::anyhow!("config config.toml: {}", e)),
            },
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.scheduler.interval_ms > 0,
            "scheduler.interval_ms must be > 0, got {}",
            self.scheduler.interval_ms
        );
        anyhow::ensure!(
            self.listeners.backoff_ms > 0,
            "listeners.backoff_ms must be > 0, got {}",
            self.listeners.backoff_ms
        );
        anyhow::ensure!(
            self.listeners.channel_capacity > 0,
            "listeners.channel_capacity must be > 0, got {}",
            self.listeners.channel_capacity
        );
        if let Some(device) = &self.disk.device {
            anyhow::ensure!(!device.is_empty(), "disk.device must be non-empty");
        }
        if self.storage.enabled {
            anyhow::ensure!(
                !self.storage.mounts.is_empty(),
                "storage.mounts must be non-empty when storage is enabled"
            );
        }
        for (i, sensor) in self.sensors.iter().enumerate() {
            anyhow::ensure!(!sensor.label.is_empty(), "sensors[{}].label must be non-empty", i);
            anyhow::ensure!(!sensor.path.is_empty(), "sensors[{}].path must be non-empty", i);
            anyhow::ensure!(
                sensor.divisor.is_finite() && sensor.divisor != 0.0,
                "sensors[{}].divisor must be finite and non-zero, got {}",
                i,
                sensor.divisor
            );
        }
        if self.volume.enabled {
            anyhow::ensure!(
                !self.volume.subscribe.is_empty() && !self.volume.query.is_empty(),
                "volume.subscribe and volume.query must be non-empty when volume is enabled"
            );
        }
        if self.window.enabled {
            anyhow::ensure!(
                !self.window.command.is_empty(),
                "window.command must be non-empty when window is enabled"
            );
        }
        if self.clock.enabled {
            anyhow::ensure!(
                ClockUnit::is_valid_format(&self.clock.format),
                "clock.format is not a valid strftime format: {:?}",
                self.clock.format
            );
        }
        Ok(())
    }
}
