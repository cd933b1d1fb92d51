// Source units: one per monitored quantity.
//
// Pull-based units implement `Sampler` and are driven by the scheduler tick.
// Push-based units hold state that only their listener updates, delivered
// to the scheduler as `Update` messages.

mod clock;
mod cpu;
mod disk;
mod memory;
mod network;
mod scalar;
mod storage;

pub use clock::{ClockUnit, DEFAULT_CLOCK_FORMAT};
pub use cpu::CpuUnit;
pub use disk::{DiskUnit, SECTOR_SIZE};
pub use memory::MemoryUnit;
pub use network::{NETWORK_TICK_DIVISOR, NetworkUnit};
pub use scalar::ScalarUnit;
pub use storage::{FreeSpaceUnit, available_for};

use crate::error::SourceError;
use crate::models::{Reading, VolumeState, WindowState};

/// Capability of pull-based units: refresh from the source, then expose the
/// derived value.
///
/// `sample` must leave the previous value untouched when it fails.
pub trait Sampler: Send {
    fn sample(&mut self, tick: u64) -> Result<(), SourceError>;

    fn reading(&self) -> Reading;
}

/// Index of a unit in the scheduler's configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub usize);

/// A partial window-manager change: either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowChange {
    pub title: Option<String>,
    pub layout_index: Option<i64>,
}

/// State change produced by a listener for its push-based unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Volume(VolumeState),
    Window(WindowChange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushState {
    Volume(VolumeState),
    Window(WindowState),
}

pub enum UnitKind {
    Sampled(Box<dyn Sampler>),
    Pushed(PushState),
}

pub struct Unit {
    name: String,
    kind: UnitKind,
}

impl Unit {
    pub fn sampled(name: impl Into<String>, sampler: impl Sampler + 'static) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Sampled(Box::new(sampler)),
        }
    }

    pub fn pushed(name: impl Into<String>, state: PushState) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Pushed(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_sampled(&self) -> bool {
        matches!(self.kind, UnitKind::Sampled(_))
    }

    /// Runs the unit's sampler; push-based units are left alone.
    pub fn sample(&mut self, tick: u64) -> Result<(), SourceError> {
        match &mut self.kind {
            UnitKind::Sampled(sampler) => sampler.sample(tick),
            UnitKind::Pushed(_) => Ok(()),
        }
    }

    /// Applies a listener update. Returns false when the update does not
    /// belong to this kind of unit.
    pub fn apply(&mut self, update: Update) -> bool {
        match (&mut self.kind, update) {
            (UnitKind::Pushed(PushState::Volume(state)), Update::Volume(next)) => {
                *state = next;
                true
            }
            (UnitKind::Pushed(PushState::Window(state)), Update::Window(change)) => {
                if let Some(title) = change.title {
                    state.title = title;
                }
                if let Some(index) = change.layout_index {
                    state.layout_index = index;
                }
                true
            }
            _ => false,
        }
    }

    pub fn reading(&self) -> Reading {
        match &self.kind {
            UnitKind::Sampled(sampler) => sampler.reading(),
            UnitKind::Pushed(PushState::Volume(state)) => Reading::Volume(*state),
            UnitKind::Pushed(PushState::Window(state)) => Reading::Window(state.clone()),
        }
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("sampled", &self.is_sampled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_change_updates_only_present_fields() {
        let mut unit = Unit::pushed("window", PushState::Window(WindowState::default()));
        assert!(unit.apply(Update::Window(WindowChange {
            title: Some("vim".into()),
            layout_index: None,
        })));
        assert!(unit.apply(Update::Window(WindowChange {
            title: None,
            layout_index: Some(1),
        })));
        assert_eq!(
            unit.reading(),
            Reading::Window(WindowState {
                title: "vim".into(),
                layout_index: 1,
            })
        );
    }

    #[test]
    fn mismatched_update_is_rejected() {
        let mut unit = Unit::pushed("volume", PushState::Volume(VolumeState::default()));
        assert!(!unit.apply(Update::Window(WindowChange::default())));
        assert_eq!(unit.reading(), Reading::Volume(VolumeState::default()));
    }

    #[test]
    fn pushed_unit_sample_is_noop() {
        let mut unit = Unit::pushed("volume", PushState::Volume(VolumeState::default()));
        assert!(!unit.is_sampled());
        assert!(unit.sample(0).is_ok());
    }
}
