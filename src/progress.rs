//! Player progress and preferences
//!
//! Completion records, world unlocks, seen lore/tutorials and settings:
//! everything that outlives a level session. This module owns the data
//! model only; where the payload is stored is the driver's business.

use serde::{Deserialize, Serialize};

use crate::catalog;

/// Player preferences persisted alongside progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Show the session timer in the HUD
    pub show_timer: bool,
    /// Show the move counter in the HUD
    pub show_moves: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            music_volume: 0.7,
            sfx_volume: 1.0,
            show_timer: true,
            show_moves: true,
        }
    }
}

fn initial_worlds() -> Vec<u32> {
    vec![1]
}

/// Durable player progress. Serialized as a single JSON payload; unknown
/// or missing fields fall back to defaults so old saves keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_levels: Vec<String>,
    #[serde(default = "initial_worlds")]
    pub unlocked_worlds: Vec<u32>,
    #[serde(default)]
    pub seen_tutorials: Vec<String>,
    #[serde(default)]
    pub seen_lore: Vec<String>,
    #[serde(default)]
    pub settings: PlayerSettings,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            completed_levels: Vec::new(),
            unlocked_worlds: initial_worlds(),
            seen_tutorials: Vec::new(),
            seen_lore: Vec::new(),
            settings: PlayerSettings::default(),
        }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, level_id: &str) -> bool {
        self.completed_levels.iter().any(|id| id == level_id)
    }

    pub fn is_world_unlocked(&self, world: u32) -> bool {
        self.unlocked_worlds.contains(&world)
    }

    /// Record a completed level. When that finishes its world, the next
    /// world unlocks; the newly unlocked world number is returned.
    pub fn complete_level(&mut self, level_id: &str) -> Option<u32> {
        if self.is_completed(level_id) {
            return None;
        }
        self.completed_levels.push(level_id.to_string());

        let world = catalog::level_world(level_id)?;
        let world_done = catalog::levels_in_world(world)
            .iter()
            .all(|id| self.is_completed(id));
        if !world_done {
            return None;
        }

        let next_world = world + 1;
        if self.is_world_unlocked(next_world) || catalog::world(next_world).is_none() {
            return None;
        }
        self.unlocked_worlds.push(next_world);
        log::info!("world {next_world} unlocked");
        Some(next_world)
    }

    /// A level is playable when its world is unlocked and it is either the
    /// first level of its world or its predecessor in play order is done.
    pub fn is_level_unlocked(&self, level_id: &str) -> bool {
        let Some(world) = catalog::level_world(level_id) else {
            return false;
        };
        if !self.is_world_unlocked(world) {
            return false;
        }

        let world_levels = catalog::levels_in_world(world);
        if world_levels.first() == Some(&level_id) {
            return true;
        }

        let Some(index) = catalog::LEVEL_ORDER
            .iter()
            .position(|&id| id == level_id)
        else {
            return false;
        };
        if index == 0 {
            return true;
        }
        self.is_completed(catalog::LEVEL_ORDER[index - 1])
    }

    /// Returns true the first time a lore entry is seen.
    pub fn mark_lore_seen(&mut self, lore_id: &str) -> bool {
        if self.seen_lore.iter().any(|id| id == lore_id) {
            return false;
        }
        self.seen_lore.push(lore_id.to_string());
        true
    }

    /// Returns true the first time a tutorial is seen.
    pub fn mark_tutorial_seen(&mut self, tutorial_id: &str) -> bool {
        if self.seen_tutorials.iter().any(|id| id == tutorial_id) {
            return false;
        }
        self.seen_tutorials.push(tutorial_id.to_string());
        true
    }

    /// Wipe everything back to a fresh profile. Settings survive.
    pub fn reset(&mut self) {
        self.completed_levels.clear();
        self.unlocked_worlds = initial_worlds();
        self.seen_tutorials.clear();
        self.seen_lore.clear();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
