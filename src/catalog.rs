//! Built-in level pack
//!
//! Levels are embedded as ASCII map literals and built on demand. The
//! worlds, ordering and metadata drive the unlock flow in
//! [`crate::progress`]; lore and tutorial ids reference dialog data owned
//! by the presentation layer.

use crate::engine::level::{LevelDef, LevelMeta};

/// A group of levels sharing a theme and an unlock gate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct World {
    pub number: u32,
    pub name: &'static str,
}

pub const WORLDS: [World; 2] = [
    World {
        number: 1,
        name: "Awakening",
    },
    World {
        number: 2,
        name: "The Box",
    },
];

/// Play order across all worlds; also the unlock chain.
pub const LEVEL_ORDER: [&str; 6] = ["1-1", "1-2", "1-3", "1-4", "2-1", "2-2"];

struct Entry {
    id: &'static str,
    name: &'static str,
    world: u32,
    difficulty: u8,
    lore_id: Option<&'static str>,
    tutorial_id: Option<&'static str>,
    map: &'static [&'static str],
}

const ENTRIES: [Entry; 6] = [
    Entry {
        id: "1-1",
        name: "First Light",
        world: 1,
        difficulty: 1,
        lore_id: Some("intro_1"),
        tutorial_id: Some("movement"),
        map: &[
            "#####", //
            "#@..#", //
            "#.o.#", //
            "#...#", //
            "#####",
        ],
    },
    Entry {
        id: "1-2",
        name: "The Long Way",
        world: 1,
        difficulty: 2,
        lore_id: None,
        tutorial_id: Some("switches"),
        map: &[
            "#######", //
            "#@....#", //
            "#.###.#", //
            "#.#o..#", //
            "#.#.###", //
            "#.....#", //
            "#######",
        ],
    },
    Entry {
        id: "1-3",
        name: "Division",
        world: 1,
        difficulty: 2,
        lore_id: Some("split_intro"),
        tutorial_id: Some("split"),
        map: &[
            "#######", //
            "#..o..#", //
            "#..#..#", //
            "#..@..#", //
            "#######",
        ],
    },
    Entry {
        id: "1-4",
        name: "Twins",
        world: 1,
        difficulty: 3,
        lore_id: None,
        tutorial_id: Some("simultaneous"),
        map: &[
            "#######", //
            "#....o#", //
            "#..#..#", //
            "#..@.o#", //
            "#######",
        ],
    },
    Entry {
        id: "2-1",
        name: "Anu's Parlor",
        world: 2,
        difficulty: 3,
        lore_id: Some("anu_intro"),
        tutorial_id: None,
        map: &[
            "#########", //
            "#*.....*#", //
            "#.@.#...#", //
            "#...#...#", //
            "#..o#o..#", //
            "#########",
        ],
    },
    Entry {
        id: "2-2",
        name: "Four of Us",
        world: 2,
        difficulty: 4,
        lore_id: Some("anu_promise"),
        tutorial_id: None,
        map: &[
            "########", //
            "#......#", //
            "#.o#o..#", //
            "#.#.#..#", //
            "#.o.o..#", //
            "#......#", //
            "#.....@#", //
            "########",
        ],
    },
];

fn entry(id: &str) -> Option<&'static Entry> {
    ENTRIES.iter().find(|e| e.id == id)
}

/// Build the level with the given id.
pub fn level(id: &str) -> Option<LevelDef> {
    let entry = entry(id)?;
    let mut meta = LevelMeta::new(entry.id, entry.name, entry.world, entry.difficulty);
    if let Some(lore) = entry.lore_id {
        meta = meta.with_lore(lore);
    }
    if let Some(tutorial) = entry.tutorial_id {
        meta = meta.with_tutorial(tutorial);
    }
    // Catalog maps are static data; validity is pinned by tests.
    Some(LevelDef::from_map(entry.map, meta).expect("catalog level data is valid"))
}

pub fn world(number: u32) -> Option<&'static World> {
    WORLDS.iter().find(|w| w.number == number)
}

/// World a level belongs to, without building the level.
pub fn level_world(id: &str) -> Option<u32> {
    entry(id).map(|e| e.world)
}

/// Level ids of one world, in play order.
pub fn levels_in_world(world: u32) -> Vec<&'static str> {
    LEVEL_ORDER
        .iter()
        .copied()
        .filter(|id| level_world(id) == Some(world))
        .collect()
}

/// The level after `id` in play order, if any.
pub fn next_level(id: &str) -> Option<&'static str> {
    let index = LEVEL_ORDER.iter().position(|&other| other == id)?;
    LEVEL_ORDER.get(index + 1).copied()
}
