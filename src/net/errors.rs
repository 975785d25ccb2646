//! Error types surfaced by the scene bus.
use std::fmt;

use super::messages::Topic;

/// Failures while moving messages on and off the broadcast channel.
#[derive(Debug, Clone)]
pub enum BusError {
    Encode { topic: Topic, message: String },
    Decode { topic: Topic, message: String },
    Closed { transport: &'static str },
}

impl BusError {
    pub fn encode(topic: Topic, err: impl fmt::Display) -> Self {
        Self::Encode {
            topic,
            message: err.to_string(),
        }
    }

    pub fn decode(topic: Topic, err: impl fmt::Display) -> Self {
        Self::Decode {
            topic,
            message: err.to_string(),
        }
    }

    pub fn closed(transport: &'static str) -> Self {
        Self::Closed { transport }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Self::Encode { topic, .. } | Self::Decode { topic, .. } => Some(*topic),
            Self::Closed { .. } => None,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { topic, message } => {
                write!(f, "Failed to encode {} message: {}", topic, message)
            }
            Self::Decode { topic, message } => {
                write!(f, "Failed to decode {} message: {}", topic, message)
            }
            Self::Closed { transport } => write!(f, "Transport {} is closed", transport),
        }
    }
}

impl std::error::Error for BusError {}
