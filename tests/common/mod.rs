// Shared test helpers

#![allow(dead_code)]

use std::path::PathBuf;

use swaybar_status::render::BarWriter;
use swaybar_status::scheduler::{Message, Scheduler};
use swaybar_status::units::Unit;
use tokio::sync::mpsc;

pub const STAT_IDLE: &str = "\
cpu  100 0 100 800 0 0 0 0 0 0
cpu0 100 0 100 800 0 0 0 0 0 0
intr 1 0
";

pub const STAT_HALF_BUSY: &str = "\
cpu  200 0 100 900 0 0 0 0 0 0
cpu0 200 0 100 900 0 0 0 0 0 0
intr 2 0
";

pub const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:    1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0:    5000      50    0    0    0     0          0         0     2000      20    0    0    0     0       0          0
 wlan0:       0       0    0    0    0     0          0         0        0       0    0    0    0     0       0          0
";

/// Temporary directory with files standing in for /proc and /sys entries.
pub struct Fixture {
    pub dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes (or overwrites) `name` and returns its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }
}

pub type TestScheduler = Scheduler<Vec<u8>>;

/// Scheduler writing into memory, plus the sender side of its channel.
pub fn scheduler(units: Vec<Unit>) -> (TestScheduler, mpsc::Sender<Message>) {
    let (tx, rx) = mpsc::channel(16);
    let scheduler = Scheduler::new(
        units,
        rx,
        BarWriter::new(Vec::new()),
        std::time::Duration::from_secs(1),
    );
    (scheduler, tx)
}

/// Every frame written so far, one JSON array per line.
pub fn frames(output: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(output)
        .lines()
        .filter_map(|line| line.strip_suffix(','))
        .map(|frame| serde_json::from_str(frame).expect("frame is JSON"))
        .collect()
}
