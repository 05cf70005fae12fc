//! Level definitions: grid layout, start positions, metadata
//!
//! A `LevelDef` is validated at construction and immutable afterwards; an
//! invalid definition never produces a value, so the session layer can
//! assume every invariant holds.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_PEBBLES;
use crate::engine::grid::{Grid, TileKind};

/// Display and collaborator-facing metadata for one level.
///
/// `lore_id` and `tutorial_id` reference dialog/tutorial entries owned by
/// the presentation layer; the engine only carries the identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMeta {
    pub id: String,
    pub name: String,
    pub world: u32,
    /// Star rating, 1..=5.
    pub difficulty: u8,
    pub lore_id: Option<String>,
    pub tutorial_id: Option<String>,
}

impl LevelMeta {
    pub fn new(id: &str, name: &str, world: u32, difficulty: u8) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            world,
            difficulty,
            lore_id: None,
            tutorial_id: None,
        }
    }

    pub fn with_lore(mut self, lore_id: &str) -> Self {
        self.lore_id = Some(lore_id.to_string());
        self
    }

    pub fn with_tutorial(mut self, tutorial_id: &str) -> Self {
        self.tutorial_id = Some(tutorial_id.to_string());
        self
    }
}

/// Structural invariant violations caught at load time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level grid is empty")]
    EmptyGrid,
    #[error("grid row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unrecognized map glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: i32, y: i32 },
    #[error("level has no start positions")]
    NoStartPositions,
    #[error("level has {count} start positions, limit is {MAX_PEBBLES}")]
    TooManyStartPositions { count: usize },
    #[error("start position ({x}, {y}) is out of bounds")]
    StartOutOfBounds { x: i32, y: i32 },
    #[error("start position ({x}, {y}) is on a wall")]
    StartOnWall { x: i32, y: i32 },
    #[error("duplicate start position ({x}, {y})")]
    DuplicateStart { x: i32, y: i32 },
}

/// Immutable description of one puzzle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDef {
    grid: Grid,
    start_positions: Vec<IVec2>,
    meta: LevelMeta,
}

impl LevelDef {
    /// Build and validate a level from explicit tile rows.
    pub fn new(
        rows: Vec<Vec<TileKind>>,
        start_positions: Vec<IVec2>,
        meta: LevelMeta,
    ) -> Result<Self, LevelError> {
        let height = rows.len();
        if height == 0 || rows[0].is_empty() {
            return Err(LevelError::EmptyGrid);
        }
        let width = rows[0].len();
        for (row, tiles) in rows.iter().enumerate() {
            if tiles.len() != width {
                return Err(LevelError::RaggedRow {
                    row,
                    found: tiles.len(),
                    expected: width,
                });
            }
        }

        let grid = Grid::new(
            width as i32,
            height as i32,
            rows.into_iter().flatten().collect(),
        );

        if start_positions.is_empty() {
            return Err(LevelError::NoStartPositions);
        }
        if start_positions.len() > MAX_PEBBLES {
            return Err(LevelError::TooManyStartPositions {
                count: start_positions.len(),
            });
        }
        for (i, &pos) in start_positions.iter().enumerate() {
            match grid.tile_at(pos) {
                Err(_) => {
                    return Err(LevelError::StartOutOfBounds { x: pos.x, y: pos.y });
                }
                Ok(TileKind::Wall) => {
                    return Err(LevelError::StartOnWall { x: pos.x, y: pos.y });
                }
                Ok(_) => {}
            }
            if start_positions[..i].contains(&pos) {
                return Err(LevelError::DuplicateStart { x: pos.x, y: pos.y });
            }
        }

        Ok(Self {
            grid,
            start_positions,
            meta,
        })
    }

    /// Build a level from an ASCII map.
    ///
    /// Glyphs: `#` wall, `.` or space floor, `o` switch, `*` portal,
    /// `@` start position (on floor). Starts are collected in row-major
    /// scan order.
    pub fn from_map(map: &[&str], meta: LevelMeta) -> Result<Self, LevelError> {
        let mut rows = Vec::with_capacity(map.len());
        let mut starts = Vec::new();
        for (y, line) in map.iter().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, glyph) in line.chars().enumerate() {
                let tile = if glyph == '@' {
                    starts.push(IVec2::new(x as i32, y as i32));
                    TileKind::Floor
                } else {
                    TileKind::from_glyph(glyph).ok_or(LevelError::UnknownGlyph {
                        glyph,
                        x: x as i32,
                        y: y as i32,
                    })?
                };
                row.push(tile);
            }
            rows.push(row);
        }
        Self::new(rows, starts, meta)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn start_positions(&self) -> &[IVec2] {
        &self.start_positions
    }

    pub fn meta(&self) -> &LevelMeta {
        &self.meta
    }
}
