// Builds the fixed unit list and the listeners for push-based units from
// the startup configuration.

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::listener::{Listener, VolumeListener, WindowListener};
use crate::models::{VolumeState, WindowState};
use crate::units::{
    ClockUnit, CpuUnit, DiskUnit, FreeSpaceUnit, MemoryUnit, NetworkUnit, PushState, ScalarUnit,
    Unit, UnitId,
};

/// Units in display order, plus one listener per push-based unit.
#[derive(Debug)]
pub struct Setup {
    pub units: Vec<Unit>,
    pub listeners: Vec<(UnitId, String, Listener)>,
}

impl Setup {
    /// Order: window title, cpu, sensors, memory, free space, disk, volume,
    /// network, clock.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut setup = Setup {
            units: Vec::new(),
            listeners: Vec::new(),
        };

        if config.window.enabled {
            setup.push_listened(
                Unit::pushed("window", PushState::Window(WindowState::default())),
                Listener::Window(WindowListener {
                    command: config.window.command.clone(),
                }),
            );
        }
        if config.cpu.enabled {
            setup
                .units
                .push(Unit::sampled("cpu", CpuUnit::new(&config.cpu.stat_path)));
        }
        for sensor in &config.sensors {
            let unit = ScalarUnit::new(&sensor.label, &sensor.path, sensor.divisor)
                .with_suffix(&sensor.suffix)
                .with_thresholds(sensor.warn_at, sensor.urgent_at);
            setup
                .units
                .push(Unit::sampled(format!("sensor_{}", sensor.label), unit));
        }
        if config.memory.enabled {
            setup.units.push(Unit::sampled(
                "memory",
                MemoryUnit::new(&config.memory.meminfo_path),
            ));
        }
        if config.storage.enabled {
            let mounts = config.storage.mounts.iter().map(PathBuf::from).collect();
            setup.units.push(Unit::sampled(
                "storage",
                FreeSpaceUnit::new(mounts, config.storage.urgent_below_bytes),
            ));
        }
        if let Some(device) = &config.disk.device {
            setup.units.push(Unit::sampled(
                "disk",
                DiskUnit::new(&config.disk.block_root, device),
            ));
        }
        if config.volume.enabled {
            setup.push_listened(
                Unit::pushed("volume", PushState::Volume(VolumeState::default())),
                Listener::Volume(VolumeListener {
                    subscribe: config.volume.subscribe.clone(),
                    query: config.volume.query.clone(),
                }),
            );
        }
        if config.network.enabled {
            let filter = config.network.clone();
            setup.units.push(Unit::sampled(
                "network",
                NetworkUnit::new(&config.network.dev_path, move |name| filter.excludes(name)),
            ));
        }
        if config.clock.enabled {
            setup
                .units
                .push(Unit::sampled("clock", ClockUnit::new(&config.clock.format)));
        }
        setup
    }

    fn push_listened(&mut self, unit: Unit, listener: Listener) {
        let id = UnitId(self.units.len());
        self.listeners
            .push((id, unit.name().to_string(), listener));
        self.units.push(unit);
    }
}
