//! Periodic check of the local player's cosmetics; bound NPCs follow outfit changes.
use bevy::prelude::*;

use crate::{
    core::SimulationClock,
    diagnostics::SyncDiagnostic,
    host::components::{BodyAppearance, LocalPlayer, PlayerProfile},
    net::{
        events::OutboundMessage,
        messages::{AppearanceUpdate, SceneMessage},
    },
};

use super::registry::NpcRegistry;

/// Cached cosmetic state compared between checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmeticSnapshot {
    pub wearables: Vec<String>,
    pub emotes: Vec<String>,
    pub body: BodyAppearance,
}

impl From<&PlayerProfile> for CosmeticSnapshot {
    fn from(profile: &PlayerProfile) -> Self {
        Self {
            wearables: profile.wearables.clone(),
            emotes: profile.emotes.clone(),
            body: profile.body.clone(),
        }
    }
}

/// Check interval plus the last observed cosmetics.
#[derive(Resource, Debug)]
pub struct CosmeticWatch {
    timer: Timer,
    cached: Option<CosmeticSnapshot>,
}

impl CosmeticWatch {
    pub fn new(interval_seconds: f32) -> Self {
        Self {
            timer: Timer::from_seconds(interval_seconds.max(0.1), TimerMode::Repeating),
            cached: None,
        }
    }

    /// Advances the interval timer; `true` when a check is due.
    pub fn tick(&mut self, delta: std::time::Duration) -> bool {
        self.timer.tick(delta).just_finished()
    }

    /// Fills the cache if nothing has been observed yet; returns `true` when it did.
    pub fn prime(&mut self, current: impl FnOnce() -> CosmeticSnapshot) -> bool {
        if self.cached.is_some() {
            return false;
        }
        self.cached = Some(current());
        true
    }

    /// Stores `current` and reports whether it differs from a previously cached value.
    /// The first observation only fills the cache.
    pub fn observe(&mut self, current: CosmeticSnapshot) -> bool {
        match self.cached.as_ref() {
            Some(previous) if *previous == current => false,
            Some(_) => {
                self.cached = Some(current);
                true
            }
            None => {
                self.cached = Some(current);
                false
            }
        }
    }
}

/// Remembers the outfit on the first active frame, then every interval re-dresses NPCs
/// bound to the local player when their outfit changed.
pub fn watch_local_cosmetics(
    clock: Res<SimulationClock>,
    local_player: Res<LocalPlayer>,
    mut watch: ResMut<CosmeticWatch>,
    mut registry: ResMut<NpcRegistry>,
    mut outbound: MessageWriter<OutboundMessage>,
    mut diagnostics: MessageWriter<SyncDiagnostic>,
) {
    let Some(profile) = local_player.profile() else {
        return;
    };
    watch.prime(|| CosmeticSnapshot::from(profile));
    if !watch.tick(clock.last_scaled_delta()) {
        return;
    }
    if !watch.observe(CosmeticSnapshot::from(profile)) {
        return;
    }

    let mut rebroadcast = 0;
    for record in registry
        .iter_mut()
        .filter(|record| record.is_owned_by(&profile.user_id))
    {
        record.appearance.wearables = profile.wearables.clone();
        record.appearance.display_name = profile.name.clone();
        outbound.write(OutboundMessage(SceneMessage::Appearance(
            AppearanceUpdate::from_record(record),
        )));
        rebroadcast += 1;
    }

    info!(
        target: "scene_sync",
        "Cosmetics of {} changed; refreshed {} bound NPCs",
        profile.user_id,
        rebroadcast
    );
    diagnostics.write(SyncDiagnostic::CosmeticsChanged { rebroadcast });
}
