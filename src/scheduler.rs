// Scheduler: owns every unit, drives the wall-clock aligned tick, consumes
// listener messages, and is the single writer of output frames.
//
// Units live behind a mutex only so a sampling pass can run on the blocking
// pool; the scheduler awaits that pass before doing anything else, so unit
// state is never observed mid-update and renders never interleave.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::SourceError;
use crate::listener::ListenerEvent;
use crate::render::{BarWriter, Snapshot, SnapshotEntry, render};
use crate::units::{Unit, UnitId};

/// One listener notification for one unit.
#[derive(Debug)]
pub struct Message {
    pub unit: UnitId,
    pub event: ListenerEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sampling,
    Rendering,
}

/// Holds at most the most recent error; a new error replaces the old one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorSlot {
    current: Option<String>,
}

impl ErrorSlot {
    pub fn set(&mut self, source: &str, err: &SourceError) {
        self.current = Some(format!("{source}: {err}"));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn get(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

/// Time left until the next multiple of `interval` since the Unix epoch.
pub fn until_next_boundary(now: SystemTime, interval: Duration) -> Duration {
    let interval_ns = interval.as_nanos().max(1);
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let remaining = interval_ns - since_epoch % interval_ns;
    Duration::from_nanos(u64::try_from(remaining).unwrap_or(u64::MAX))
}

pub struct Scheduler<W: Write> {
    units: Arc<Mutex<Vec<Unit>>>,
    /// Indices of pull-based units, in configured order.
    sampled: Arc<[usize]>,
    rx: mpsc::Receiver<Message>,
    rx_open: bool,
    writer: BarWriter<W>,
    interval: Duration,
    tick: u64,
    phase: Phase,
    error: ErrorSlot,
    /// Last known connection state per listener; absent until it reports.
    listener_up: HashMap<UnitId, bool>,
}

impl<W: Write> Scheduler<W> {
    pub fn new(
        units: Vec<Unit>,
        rx: mpsc::Receiver<Message>,
        writer: BarWriter<W>,
        interval: Duration,
    ) -> Self {
        let sampled: Arc<[usize]> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.is_sampled())
            .map(|(i, _)| i)
            .collect();
        Self {
            units: Arc::new(Mutex::new(units)),
            sampled,
            rx,
            rx_open: true,
            writer,
            interval,
            tick: 0,
            phase: Phase::Idle,
            error: ErrorSlot::default(),
            listener_up: HashMap::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn error(&self) -> Option<&str> {
        self.error.get()
    }

    pub fn writer(&self) -> &BarWriter<W> {
        &self.writer
    }

    pub fn into_writer(self) -> BarWriter<W> {
        self.writer
    }

    fn lock_units(&self) -> MutexGuard<'_, Vec<Unit>> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of every unit's value plus the error slot.
    pub fn snapshot(&self) -> Snapshot {
        let units = self.lock_units();
        Snapshot {
            entries: units
                .iter()
                .map(|u| SnapshotEntry {
                    name: u.name().to_string(),
                    reading: u.reading(),
                })
                .collect(),
            error: self.error.get().map(str::to_string),
        }
    }

    /// Samples every pull-based unit in order, then renders one frame.
    ///
    /// A failing unit sets the error slot and keeps its previous value;
    /// later units still sample. The slot is cleared only when every unit
    /// succeeded and no listener is currently down.
    pub async fn tick(&mut self) -> std::io::Result<()> {
        self.phase = Phase::Sampling;
        let tick = self.tick;
        let units = Arc::clone(&self.units);
        let order = Arc::clone(&self.sampled);
        let failures = tokio::task::spawn_blocking(move || {
            let mut units = units.lock().unwrap_or_else(PoisonError::into_inner);
            let mut failures = Vec::new();
            for &i in order.iter() {
                let unit = &mut units[i];
                if let Err(e) = unit.sample(tick) {
                    failures.push((unit.name().to_string(), e));
                }
            }
            failures
        })
        .await;

        let clean = match failures {
            Ok(failures) => {
                let clean = failures.is_empty();
                for (name, err) in failures {
                    tracing::warn!(unit = %name, tick, error = %err, "sample failed");
                    self.error.set(&name, &err);
                }
                clean
            }
            Err(e) => {
                tracing::error!(tick, error = %e, "sampling pass aborted");
                self.error
                    .set("scheduler", &SourceError::Aborted(format!("sampling pass: {e}")));
                false
            }
        };
        if clean && self.listener_up.values().all(|up| *up) {
            self.error.clear();
        }
        self.tick += 1;
        self.render()
    }

    /// Applies one listener message. Updates and failures each produce
    /// exactly one frame; a connection notice only updates health.
    pub fn handle(&mut self, msg: Message) -> std::io::Result<()> {
        let Message { unit, event } = msg;
        match event {
            ListenerEvent::Connected => {
                self.listener_up.insert(unit, true);
                tracing::debug!(unit = unit.0, "listener connected");
                Ok(())
            }
            ListenerEvent::Update(update) => {
                let applied = {
                    let mut units = self.lock_units();
                    units.get_mut(unit.0).map(|u| u.apply(update))
                };
                match applied {
                    Some(true) => {
                        self.listener_up.insert(unit, true);
                    }
                    Some(false) => {
                        tracing::warn!(unit = unit.0, "update does not match unit kind; ignored")
                    }
                    None => tracing::warn!(unit = unit.0, "update for unknown unit; ignored"),
                }
                self.render()
            }
            ListenerEvent::Failed(err) => {
                self.listener_up.insert(unit, false);
                let name = self
                    .lock_units()
                    .get(unit.0)
                    .map_or_else(|| format!("unit {}", unit.0), |u| u.name().to_string());
                self.error.set(&name, &err);
                self.render()
            }
        }
    }

    fn render(&mut self) -> std::io::Result<()> {
        self.phase = Phase::Rendering;
        let frame = render(&self.snapshot());
        let result = self.writer.write_frame(&frame);
        self.phase = Phase::Idle;
        tracing::trace!(blocks = frame.len(), tick = self.tick, "frame written");
        result
    }

    /// Header, an immediate first tick, then forever: aligned ticks and
    /// listener messages, whichever comes first. Returns only when output
    /// can no longer be written.
    pub async fn run(mut self) -> std::io::Result<()> {
        self.writer.write_header()?;
        self.tick().await?;
        let mut deadline = Instant::now() + until_next_boundary(SystemTime::now(), self.interval);
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    self.tick().await?;
                    deadline = Instant::now() + until_next_boundary(SystemTime::now(), self.interval);
                }
                msg = self.rx.recv(), if self.rx_open => match msg {
                    Some(msg) => self.handle(msg)?,
                    None => {
                        tracing::debug!("all listeners gone; ticking only");
                        self.rx_open = false;
                    }
                },
            }
        }
    }
}
