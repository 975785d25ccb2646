//! Components and resources describing the local player as reported by the host.
use std::env;

use bevy::prelude::*;

use crate::presence::PeerId;

/// Marker for the local player's avatar; its `Transform` is the player position.
#[derive(Component, Debug)]
pub struct Player;

/// Body attributes compared by the cosmetic watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyAppearance {
    pub body_shape: String,
    pub eye_color: String,
    pub skin_color: String,
    pub hair_color: String,
}

/// Identity and cosmetic state of the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub user_id: PeerId,
    pub name: String,
    pub wearables: Vec<String>,
    pub emotes: Vec<String>,
    pub body: BodyAppearance,
}

impl PlayerProfile {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: PeerId::new(user_id),
            name: name.into(),
            wearables: Vec::new(),
            emotes: Vec::new(),
            body: BodyAppearance::default(),
        }
    }

    pub fn with_wearables<I, S>(mut self, wearables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wearables = wearables.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the profile the host would hand over from `SCENE_PLAYER_*` variables.
    pub fn from_env() -> Option<Self> {
        let user_id = env::var("SCENE_PLAYER_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;

        let name = env::var("SCENE_PLAYER_NAME")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|_| user_id.clone());

        let wearables = env::var("SCENE_PLAYER_WEARABLES")
            .map(|value| split_list(&value))
            .unwrap_or_default();

        let body_shape = env::var("SCENE_PLAYER_BODY_SHAPE")
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let mut profile = Self::new(user_id, name).with_wearables(wearables);
        profile.body.body_shape = body_shape;
        Some(profile)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// The host's answer to "who is playing here". `None` means no session context yet.
#[derive(Resource, Debug, Default, Clone)]
pub struct LocalPlayer {
    profile: Option<PlayerProfile>,
}

impl LocalPlayer {
    pub fn new(profile: PlayerProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    pub fn profile(&self) -> Option<&PlayerProfile> {
        self.profile.as_ref()
    }

    pub fn profile_mut(&mut self) -> Option<&mut PlayerProfile> {
        self.profile.as_mut()
    }

    pub fn user_id(&self) -> Option<&PeerId> {
        self.profile.as_ref().map(|profile| &profile.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wearable_lists_are_trimmed() {
        assert_eq!(split_list(" urn:a, ,urn:b "), vec!["urn:a", "urn:b"]);
    }

    #[test]
    fn missing_profile_has_no_user() {
        let player = LocalPlayer::default();
        assert!(player.user_id().is_none());

        let player = LocalPlayer::new(PlayerProfile::new("0xabc", "Ada").with_wearables(["urn:a"]));
        assert_eq!(player.user_id(), Some(&PeerId::new("0xabc")));
        assert_eq!(player.profile().map(|p| p.wearables.len()), Some(1));
    }
}
