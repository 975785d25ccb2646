//! Arena of NPC records owned by the local client.
use std::collections::HashMap;

use bevy::prelude::*;

use crate::{
    net::messages::{AppearanceUpdate, NpcSnapshotEntry},
    presence::PeerId,
};

use super::components::{AppearancePalette, NpcId, NpcPose, NpcRecord};

/// Indexed collection of NPC records plus an id → slot index.
#[derive(Resource, Debug, Default)]
pub struct NpcRegistry {
    records: Vec<NpcRecord>,
    index: HashMap<NpcId, usize>,
}

impl NpcRegistry {
    /// Inserts or replaces a record; returns `true` when the id was new.
    pub fn insert(&mut self, record: NpcRecord) -> bool {
        match self.index.get(&record.id) {
            Some(&slot) => {
                self.records[slot] = record;
                false
            }
            None => {
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn get(&self, id: NpcId) -> Option<&NpcRecord> {
        self.index.get(&id).map(|&slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, id: NpcId) -> Option<&mut NpcRecord> {
        match self.index.get(&id) {
            Some(&slot) => self.records.get_mut(slot),
            None => None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn iter(&self) -> impl Iterator<Item = &NpcRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NpcRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Releases every NPC bound to `departed`. Already released NPCs are left untouched,
    /// so repeating the call changes nothing.
    pub fn reset_owned_by(&mut self, departed: &PeerId, palette: &AppearancePalette) -> Vec<NpcId> {
        let mut reverted = Vec::new();
        for record in self.records.iter_mut().filter(|record| record.is_owned_by(departed)) {
            record.owner = None;
            record.influenced = false;
            record.appearance = palette.neutral();
            reverted.push(record.id);
        }
        reverted
    }

    /// Applies a remote appearance update, creating the record if it is unknown.
    /// The local influence flag is kept.
    pub fn apply_appearance(&mut self, update: &AppearanceUpdate) {
        match self.get_mut(update.npc_id) {
            Some(record) => {
                record.appearance = update.appearance();
                record.owner = update.owner_id.clone();
                record.pose = update.pose();
            }
            None => {
                self.insert(NpcRecord {
                    id: update.npc_id,
                    pose: update.pose(),
                    appearance: update.appearance(),
                    owner: update.owner_id.clone(),
                    influenced: false,
                });
            }
        }
    }

    /// Overwrites records keyed by id from a snapshot; returns how many entries were applied.
    pub fn apply_snapshot(&mut self, entries: &[NpcSnapshotEntry]) -> usize {
        for entry in entries {
            match self.get_mut(entry.npc_id) {
                Some(record) => {
                    record.appearance = entry.appearance();
                    record.owner = entry.owner_id.clone();
                    record.pose.position = entry.position.into();
                }
                None => {
                    self.insert(NpcRecord {
                        id: entry.npc_id,
                        pose: NpcPose::at(entry.position.into()),
                        appearance: entry.appearance(),
                        owner: entry.owner_id.clone(),
                        influenced: false,
                    });
                }
            }
        }
        entries.len()
    }

    pub fn snapshot_entries(&self) -> Vec<NpcSnapshotEntry> {
        self.records.iter().map(NpcSnapshotEntry::from_record).collect()
    }
}
