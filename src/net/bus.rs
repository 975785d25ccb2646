//! Broadcast channel abstraction and the resource holding the active transport.
use bevy::prelude::*;
use crossbeam_channel::{Receiver, TryRecvError};

use super::{errors::BusError, messages::Topic};

/// Receive side of a topic subscription, drained once per tick.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    receiver: Receiver<String>,
}

impl Subscription {
    pub fn new(topic: Topic, receiver: Receiver<String>) -> Self {
        Self { topic, receiver }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Takes every payload currently queued. A disconnected sender is reported once
    /// the queue is empty.
    pub fn drain(&self) -> Result<Vec<String>, BusError> {
        let mut payloads = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(payload) => payloads.push(payload),
                Err(TryRecvError::Empty) => return Ok(payloads),
                Err(TryRecvError::Disconnected) if payloads.is_empty() => {
                    return Err(BusError::closed("subscription"))
                }
                Err(TryRecvError::Disconnected) => return Ok(payloads),
            }
        }
    }
}

/// Scene-scoped, unordered, at-most-once publish/subscribe transport.
pub trait SceneBus: Send + Sync + 'static {
    fn transport(&self) -> &'static str;

    fn publish(&self, topic: Topic, payload: String) -> Result<(), BusError>;

    fn subscribe(&mut self, topic: Topic) -> Result<Subscription, BusError>;
}

/// Resource wrapping the transport used by this client.
#[derive(Resource)]
pub struct ActiveSceneBus {
    bus: Box<dyn SceneBus>,
    subscriptions: Vec<Subscription>,
}

impl ActiveSceneBus {
    pub fn new(bus: Box<dyn SceneBus>) -> Self {
        Self {
            bus,
            subscriptions: Vec::new(),
        }
    }

    pub fn transport(&self) -> &'static str {
        self.bus.transport()
    }

    pub fn publish(&self, topic: Topic, payload: String) -> Result<(), BusError> {
        self.bus.publish(topic, payload)
    }

    pub fn subscribe(&mut self, topic: Topic) -> Result<(), BusError> {
        if self.is_subscribed(topic) {
            return Ok(());
        }
        let subscription = self.bus.subscribe(topic)?;
        self.subscriptions.push(subscription);
        Ok(())
    }

    pub fn is_subscribed(&self, topic: Topic) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| subscription.topic() == topic)
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }
}
