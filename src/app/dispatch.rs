//! Runs store requests in the background and feeds their outcomes back.
//!
//! Requests are spawned on a tokio runtime. Their results travel over a
//! channel and are applied to the [`UsersStore`] by whoever owns it (the UI
//! loop), one at a time and in the order they complete.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{PhotoStatus, UsersApi};
use crate::error::ApiError;
use crate::store::{OperationKind, Request, Response, UsersStore};

/// Identifies one dispatched request.
pub type Ticket = u64;

enum Message {
    Store {
        ticket: Ticket,
        kind: OperationKind,
        outcome: Result<Response, ApiError>,
    },
    Photo {
        url: String,
        status: PhotoStatus,
    },
}

/// Something that finished since the last drain.
#[derive(Debug)]
pub enum Event {
    /// A store request resolved and the store has already applied it.
    Settled {
        ticket: Ticket,
        kind: OperationKind,
        result: Result<(), ApiError>,
    },
    Photo { url: String, status: PhotoStatus },
}

pub struct Dispatcher {
    runtime: Handle,
    api: Arc<dyn UsersApi>,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    tasks: HashMap<Ticket, (OperationKind, JoinHandle<()>)>,
    next_ticket: Ticket,
}

impl Dispatcher {
    pub fn new(runtime: Handle, api: Arc<dyn UsersApi>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            api,
            tx,
            rx,
            tasks: HashMap::new(),
            next_ticket: 1,
        }
    }

    /// Start `request`: mark it in the store and spawn the network call.
    pub fn dispatch(&mut self, store: &mut UsersStore, request: Request) -> Ticket {
        let kind = request.kind();
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        store.begin(kind);
        debug!(ticket, op = kind.label(), "dispatching");

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let handle = self.runtime.spawn(async move {
            let outcome = request.send(api.as_ref()).await;
            let _ = tx.send(Message::Store {
                ticket,
                kind,
                outcome,
            });
        });
        self.tasks.insert(ticket, (kind, handle));
        ticket
    }

    /// Check a photo URL. Not a store operation; never touches `loading`.
    pub fn probe_photo(&self, url: String) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let status = api.probe_photo(&url).await;
            let _ = tx.send(Message::Photo { url, status });
        });
    }

    /// Number of store requests still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Apply everything that completed so far, without waiting.
    pub fn drain(&mut self, store: &mut UsersStore) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            if let Some(event) = self.apply(store, message) {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the next completion and apply it.
    pub async fn next_event(&mut self, store: &mut UsersStore) -> Option<Event> {
        loop {
            let message = self.rx.recv().await?;
            if let Some(event) = self.apply(store, message) {
                return Some(event);
            }
        }
    }

    /// Abort every running store request. Their outcomes are discarded and
    /// they stop counting toward `loading`.
    pub fn cancel_all(&mut self, store: &mut UsersStore) {
        for (ticket, (kind, handle)) in self.tasks.drain() {
            handle.abort();
            store.abandon(kind);
            debug!(ticket, op = kind.label(), "cancelled");
        }
    }

    fn apply(&mut self, store: &mut UsersStore, message: Message) -> Option<Event> {
        match message {
            Message::Store {
                ticket,
                kind,
                outcome,
            } => {
                // Cancelled before its result was read.
                self.tasks.remove(&ticket)?;
                let result = store.resolve(kind, outcome);
                Some(Event::Settled {
                    ticket,
                    kind,
                    result,
                })
            }
            Message::Photo { url, status } => Some(Event::Photo { url, status }),
        }
    }
}
