// Push-based event listeners.
//
// Each listener runs as its own task for the process lifetime. It never
// touches unit state directly: updates, connection changes and failures are
// sent as messages to the scheduler, which is the only consumer.

mod process;
mod volume;
mod window;

pub use process::LineStream;
pub use volume::{SinkInfoParser, VolumeListener, is_sink_change, query_sink};
pub use window::{WindowListener, decode_event};

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::SourceError;
use crate::scheduler::Message;
use crate::units::{Update, UnitId};

/// Lifecycle and data events a listener reports for its unit.
#[derive(Debug)]
pub enum ListenerEvent {
    /// The event stream is open.
    Connected,
    Update(Update),
    /// The stream failed or a query inside it failed.
    Failed(SourceError),
}

/// Sending half handed to a listener session, bound to one unit.
#[derive(Debug, Clone)]
pub struct Reporter {
    unit: UnitId,
    name: String,
    tx: mpsc::Sender<Message>,
}

impl Reporter {
    pub fn new(unit: UnitId, name: impl Into<String>, tx: mpsc::Sender<Message>) -> Self {
        Self {
            unit,
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Fails only when the scheduler has gone away.
    pub async fn send(&self, event: ListenerEvent) -> Result<(), SourceError> {
        self.tx
            .send(Message {
                unit: self.unit,
                event,
            })
            .await
            .map_err(|_| SourceError::stream("scheduler channel closed"))
    }

    pub async fn connected(&self) -> Result<(), SourceError> {
        self.send(ListenerEvent::Connected).await
    }

    pub async fn update(&self, update: Update) -> Result<(), SourceError> {
        self.send(ListenerEvent::Update(update)).await
    }

    pub async fn failed(&self, err: SourceError) -> Result<(), SourceError> {
        self.send(ListenerEvent::Failed(err)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs `session` forever: whenever it returns (error or end of stream),
/// the failure is reported, then after `backoff` a fresh session starts.
///
/// Returns only once the scheduler's receiver has been dropped.
pub async fn run_with_backoff<F, Fut>(reporter: Reporter, backoff: Duration, mut session: F)
where
    F: FnMut(Reporter) -> Fut,
    Fut: Future<Output = Result<(), SourceError>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        tracing::debug!(listener = reporter.name(), attempt, "listener session starting");
        let err = match session(reporter.clone()).await {
            Ok(()) => SourceError::stream("event stream ended"),
            Err(e) => e,
        };
        if reporter.is_closed() {
            tracing::debug!(listener = reporter.name(), "scheduler gone, listener exiting");
            return;
        }
        tracing::warn!(
            listener = reporter.name(),
            error = %err,
            backoff_ms = backoff.as_millis() as u64,
            "listener failed; restarting after backoff"
        );
        if reporter.failed(err).await.is_err() {
            return;
        }
        tokio::time::sleep(backoff).await;
    }
}

/// A configured listener, ready to be spawned for its unit.
#[derive(Debug, Clone)]
pub enum Listener {
    Volume(VolumeListener),
    Window(WindowListener),
}

impl Listener {
    pub fn spawn(self, reporter: Reporter, backoff: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            match self {
                Listener::Volume(listener) => {
                    run_with_backoff(reporter, backoff, |r| {
                        let listener = listener.clone();
                        async move { listener.session(&r).await }
                    })
                    .await
                }
                Listener::Window(listener) => {
                    run_with_backoff(reporter, backoff, |r| {
                        let listener = listener.clone();
                        async move { listener.session(&r).await }
                    })
                    .await
                }
            }
        })
    }
}
