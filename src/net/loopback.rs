//! In-memory scene bus connecting several local endpoints.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crossbeam_channel::Sender;

use super::{
    bus::{SceneBus, Subscription},
    errors::BusError,
    messages::Topic,
};

const TRANSPORT: &str = "loopback";

type EndpointId = u32;

#[derive(Debug, Default)]
struct HubState {
    subscribers: HashMap<Topic, Vec<(EndpointId, Sender<String>)>>,
    pending_drops: HashMap<Topic, usize>,
    next_endpoint: EndpointId,
}

/// Shared in-memory hub; every endpoint created from it sees the others' messages.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new endpoint attached to this hub.
    pub fn endpoint(&self) -> LoopbackBus {
        let id = match self.lock() {
            Ok(mut state) => {
                let id = state.next_endpoint;
                state.next_endpoint = state.next_endpoint.wrapping_add(1);
                id
            }
            Err(_) => EndpointId::MAX,
        };
        LoopbackBus {
            hub: self.clone(),
            id,
        }
    }

    /// Loses the next `count` messages published on `topic`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn drop_next(&self, topic: Topic, count: usize) {
        if let Ok(mut state) = self.lock() {
            *state.pending_drops.entry(topic).or_insert(0) += count;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, BusError> {
        self.state.lock().map_err(|_| BusError::closed(TRANSPORT))
    }
}

/// One client's view of a [`LoopbackHub`]. Publishing never echoes to the publisher.
#[derive(Debug)]
pub struct LoopbackBus {
    hub: LoopbackHub,
    id: EndpointId,
}

impl SceneBus for LoopbackBus {
    fn transport(&self) -> &'static str {
        TRANSPORT
    }

    fn publish(&self, topic: Topic, payload: String) -> Result<(), BusError> {
        let mut state = self.hub.lock()?;

        if let Some(remaining) = state.pending_drops.get_mut(&topic) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(());
            }
        }

        if let Some(subscribers) = state.subscribers.get_mut(&topic) {
            // Endpoints that went away are pruned; delivery to the rest still happens.
            subscribers.retain(|(endpoint, sender)| {
                *endpoint == self.id || sender.send(payload.clone()).is_ok()
            });
        }
        Ok(())
    }

    fn subscribe(&mut self, topic: Topic) -> Result<Subscription, BusError> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut state = self.hub.lock()?;
        state
            .subscribers
            .entry(topic)
            .or_default()
            .push((self.id, sender));
        Ok(Subscription::new(topic, receiver))
    }
}
