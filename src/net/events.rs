//! Bevy messages bridging the scene bus and the protocol systems.
use bevy::prelude::Message;

use super::messages::{
    AppearanceUpdate, JoinAnnouncement, ResetForDeparted, SceneMessage, StateSnapshot,
};

/// Queued for publication at the end of the frame.
#[derive(Message, Debug, Clone)]
pub struct OutboundMessage(pub SceneMessage);

#[derive(Message, Debug, Clone)]
pub struct JoinAnnounced(pub JoinAnnouncement);

#[derive(Message, Debug, Clone)]
pub struct AppearanceReceived(pub AppearanceUpdate);

#[derive(Message, Debug, Clone)]
pub struct SnapshotReceived(pub StateSnapshot);

#[derive(Message, Debug, Clone)]
pub struct ResetReceived(pub ResetForDeparted);
