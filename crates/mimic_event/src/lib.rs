//! # mimic_event - World broadcast channels
//!
//! Process-wide signals (sounds, pause/resume-all) are published by world
//! objects and consumed by any number of agents. Each subscriber gets its own
//! queue which it drains once per tick; dropping the [`Subscription`] removes
//! it from the channel, so a despawned agent never leaves a dangling listener.

use crossbeam_channel::{unbounded, Receiver, Sender};
use mimic_math::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// A sound emitted somewhere in the world
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundEvent {
    /// Where the sound originated
    pub origin: Vec3,
    /// Loudness; compared against path distance by listeners
    pub volume: f32,
}

impl SoundEvent {
    pub fn new(origin: Vec3, volume: f32) -> Self {
        Self { origin, volume }
    }
}

/// Simulation-wide control signals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEvent {
    /// Freeze every listening agent
    PauseAll,
    /// Unfreeze every listening agent
    ResumeAll,
}

struct ChannelInner<E> {
    subscribers: RwLock<Vec<(SubscriberId, Sender<E>)>>,
    next_subscriber_id: AtomicU64,
}

impl<E> ChannelInner<E> {
    fn remove(&self, id: SubscriberId) {
        self.subscribers.write().retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Fan-out channel for a single event type.
///
/// Cloning the channel yields another handle to the same subscriber list.
pub struct BroadcastChannel<E: Clone + Send + 'static> {
    inner: Arc<ChannelInner<E>>,
}

impl<E: Clone + Send + 'static> BroadcastChannel<E> {
    /// Create a new channel with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                subscribers: RwLock::new(Vec::new()),
                next_subscriber_id: AtomicU64::new(1),
            }),
        }
    }

    /// Publish an event to every live subscriber.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn publish(&self, event: E) -> usize {
        let subscribers = self.inner.subscribers.read();
        let mut delivered = 0;
        for (id, sender) in subscribers.iter() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                log::debug!("Subscriber {:?} receiver gone, skipping", id);
            }
        }
        delivered
    }

    /// Subscribe; the returned handle unsubscribes when dropped
    pub fn subscribe(&self) -> Subscription<E> {
        let id = SubscriberId(self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = unbounded();
        self.inner.subscribers.write().push((id, sender));

        Subscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl<E: Clone + Send + 'static> Clone for BroadcastChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Clone + Send + 'static> Default for BroadcastChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a [`BroadcastChannel`] owned by one listener
pub struct Subscription<E> {
    id: SubscriberId,
    receiver: Receiver<E>,
    channel: Weak<ChannelInner<E>>,
}

impl<E> Subscription<E> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receive one queued event
    pub fn try_recv(&self) -> Option<E> {
        self.receiver.try_recv().ok()
    }

    /// Drain all queued events in publish order
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.remove(self.id);
        }
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{BroadcastChannel, SimulationEvent, SoundEvent, SubscriberId, Subscription};
}
