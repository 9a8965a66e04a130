//! Single-writer task around a [`Roster`].
//!
//! Events arrive over a bounded channel and are applied one at a time by a
//! dedicated task, each under a write guard that is released before the
//! next event is taken. Readers take the read side of the same lock, so a
//! lookup always sees the state between two events, never halfway through
//! one.

use crate::error::RosterClosed;
use crate::event::RosterEvent;
use crate::state::{MemberRecord, Roster};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

enum Request {
    Event(RosterEvent),
    /// Answered once every request queued before it has been handled.
    Sync(oneshot::Sender<()>),
}

/// Owner of the roster task. Dropping it closes the queue.
pub struct RosterHandle {
    tx: mpsc::Sender<Request>,
    view: RosterView,
    task: JoinHandle<()>,
}

impl RosterHandle {
    /// Start the task. `queue` bounds how many events may wait to be applied.
    pub fn spawn(roster: Roster, queue: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let view = RosterView {
            state: Arc::new(RwLock::new(roster)),
        };
        let task = tokio::spawn(run(Arc::clone(&view.state), rx));
        Self { tx, view, task }
    }

    /// Queue an event, waiting for room if the queue is full.
    pub async fn send(&self, event: RosterEvent) -> Result<(), RosterClosed> {
        self.tx
            .send(Request::Event(event))
            .await
            .map_err(|_| RosterClosed)
    }

    /// Wait until every event queued so far has been applied.
    pub async fn sync(&self) -> Result<(), RosterClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Sync(reply_tx))
            .await
            .map_err(|_| RosterClosed)?;
        reply_rx.await.map_err(|_| RosterClosed)
    }

    /// A cloneable read-only view for other components.
    pub fn view(&self) -> RosterView {
        self.view.clone()
    }

    pub fn get_user(&self, nick: &str) -> Option<MemberRecord> {
        self.view.get_user(nick)
    }

    pub fn with_roster<R>(&self, f: impl FnOnce(&Roster) -> R) -> R {
        self.view.with_roster(f)
    }

    /// Close the queue and wait for the task to apply what is left.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!(error = %e, "roster task ended abnormally");
        }
    }
}

/// Read access to a roster driven by a [`RosterHandle`].
#[derive(Clone)]
pub struct RosterView {
    state: Arc<RwLock<Roster>>,
}

impl RosterView {
    /// Snapshot of the record for `nick`.
    ///
    /// The copy does not follow later events; look the user up again to see them.
    pub fn get_user(&self, nick: &str) -> Option<MemberRecord> {
        self.state.read().get_user(nick).cloned()
    }

    /// Run `f` against one consistent state.
    pub fn with_roster<R>(&self, f: impl FnOnce(&Roster) -> R) -> R {
        f(&self.state.read())
    }
}

async fn run(state: Arc<RwLock<Roster>>, mut rx: mpsc::Receiver<Request>) {
    while let Some(request) = rx.recv().await {
        match request {
            Request::Event(event) => {
                let kind = event.kind();
                let result = state.write().apply(event);
                if let Err(e) = result {
                    warn!(event = kind, code = e.error_code(), error = %e, "dropping event");
                }
            }
            Request::Sync(reply_tx) => {
                let _ = reply_tx.send(());
            }
        }
    }
    debug!("roster queue closed");
}
