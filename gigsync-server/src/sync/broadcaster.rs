use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::*;

use gigsync_api::{PauseSignal, PauseState, SyncFrame, ViewerId, WaiterToken};

type SubscriberKey = u64;

/// Shared registry of viewers and waiting participants.
///
/// One lock guards both sets and is also held for the duration of a tick. It is never held
/// across an await: frames go into each viewer's bounded queue with `try_send`, and a full
/// queue loses that frame instead of stalling the tick.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Mutex<Registry>>,
    capacity: usize,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<SubscriberKey, Subscriber>,
    waiting:     HashSet<WaiterToken>,
    next_key:    SubscriberKey,
}

struct Subscriber {
    viewer_id: ViewerId,
    queue:     mpsc::Sender<SyncFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub frame:     SyncFrame,
    pub delivered: usize,
    pub dropped:   usize,
    pub pruned:    usize,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        Self { registry: Default::default(),
               capacity: capacity.max(1) }
    }

    /// Add a viewer. It stays registered until the returned [`Subscription`] is dropped.
    pub fn register(&self, viewer_id: ViewerId) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);

        let key = {
            let mut registry = self.lock();
            let key = registry.next_key;
            registry.next_key += 1;
            registry.subscribers.insert(key,
                                        Subscriber { viewer_id: viewer_id.clone(),
                                                     queue:     tx, });
            key
        };

        debug!(%viewer_id, "Viewer registered");

        Subscription { key,
                       viewer_id,
                       queue: rx,
                       registry: self.registry.clone() }
    }

    /// Returns `true` if the token was not already waiting.
    pub fn set_waiting(&self, token: WaiterToken) -> bool {
        self.lock().waiting.insert(token)
    }

    /// Returns `true` if the token was waiting.
    pub fn clear_waiting(&self, token: &WaiterToken) -> bool {
        self.lock().waiting.remove(token)
    }

    pub fn apply(&self, signal: PauseSignal) {
        let PauseSignal { token, state } = signal;

        match state {
            PauseState::Wait => {
                if self.set_waiting(token.clone()) {
                    debug!(%token, "Participant is waiting");
                }
            }
            PauseState::Ready => {
                if self.clear_waiting(&token) {
                    debug!(%token, "Participant is ready");
                }
            }
            PauseState::Unrecognized(value) => {
                trace!(%token, %value, "Ignoring unrecognized pause value");
            }
        }
    }

    /// The frame the next tick would send.
    pub fn status(&self) -> SyncFrame {
        SyncFrame::status(!self.lock().waiting.is_empty())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.lock().waiting.len()
    }

    /// Queue the current status frame for every viewer.
    pub fn tick(&self) -> TickReport {
        let mut registry = self.lock();
        let frame = SyncFrame::status(!registry.waiting.is_empty());

        let mut delivered = 0;
        let mut dropped = 0;
        let mut closed = vec![];

        for (key, subscriber) in &registry.subscribers {
            match subscriber.queue.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    trace!(viewer_id = %subscriber.viewer_id, "Viewer queue full, dropping frame");
                    dropped += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(*key),
            }
        }

        for key in &closed {
            if let Some(subscriber) = registry.subscribers.remove(key) {
                debug!(viewer_id = %subscriber.viewer_id, "Pruned closed viewer queue");
            }
        }

        TickReport { frame,
                     delivered,
                     dropped,
                     pruned: closed.len() }
    }

    /// Tick once per `period` until `cancel` fires. The first tick happens one period in.
    pub async fn run(self, period: Duration, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick();
                    trace!(?report, "Tick");
                }
            }
        }

        debug!("Broadcaster stopped");
    }

    pub fn spawn(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(period, cancel))
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registered viewer's receiving end. Dropping it unregisters the viewer.
pub struct Subscription {
    key:       SubscriberKey,
    viewer_id: ViewerId,
    queue:     mpsc::Receiver<SyncFrame>,
    registry:  Arc<Mutex<Registry>>,
}

impl Subscription {
    pub fn viewer_id(&self) -> &ViewerId {
        &self.viewer_id
    }

    pub async fn recv(&mut self) -> Option<SyncFrame> {
        self.queue.recv().await
    }

    pub fn try_recv(&mut self) -> Result<SyncFrame, TryRecvError> {
        self.queue.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let removed = self.registry
                          .lock()
                          .unwrap_or_else(PoisonError::into_inner)
                          .subscribers
                          .remove(&self.key)
                          .is_some();

        if removed {
            debug!(viewer_id = %self.viewer_id, "Viewer unregistered");
        }
    }
}
