//! Tile grid and bounds/walkability queries
//!
//! The grid is immutable for the lifetime of a level: tiles are classified
//! once at load and never change (there is no destructible terrain).

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic kind of one grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Floor,
    Wall,
    /// Target tile; active while some pebble stands on it.
    Switch,
    /// Decorative teleporter. Walkable, no engine behavior.
    Portal,
}

impl TileKind {
    /// Map glyph used by level definitions and the text renderer.
    pub fn glyph(self) -> char {
        match self {
            TileKind::Floor => '.',
            TileKind::Wall => '#',
            TileKind::Switch => 'o',
            TileKind::Portal => '*',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<TileKind> {
        match glyph {
            '.' | ' ' => Some(TileKind::Floor),
            '#' => Some(TileKind::Wall),
            'o' => Some(TileKind::Switch),
            '*' => Some(TileKind::Portal),
            _ => None,
        }
    }

    /// Pebbles may rest on any tile that is not a wall.
    pub fn is_walkable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }
}

/// Errors from direct coordinate queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
}

/// Rectangular tile grid, row-major, y growing downward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Callers must pass exactly `width * height` tiles; level validation
    /// guarantees this before a `Grid` is ever built.
    pub(crate) fn new(width: i32, height: i32, tiles: Vec<TileKind>) -> Self {
        debug_assert_eq!(tiles.len(), (width * height) as usize);
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn idx(&self, pos: IVec2) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    #[inline]
    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Tile lookup that fails loudly out of bounds instead of clamping.
    pub fn tile_at(&self, pos: IVec2) -> Result<TileKind, GridError> {
        if !self.in_bounds(pos) {
            return Err(GridError::OutOfBounds { x: pos.x, y: pos.y });
        }
        Ok(self.tiles[self.idx(pos)])
    }

    /// True iff `pos` is in bounds and its tile is not a wall.
    pub fn is_walkable(&self, pos: IVec2) -> bool {
        self.in_bounds(pos) && self.tiles[self.idx(pos)].is_walkable()
    }

    /// All switch coordinates in row-major scan order.
    pub fn switch_positions(&self) -> Vec<IVec2> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = IVec2::new(x, y);
                if self.tiles[self.idx(pos)] == TileKind::Switch {
                    out.push(pos);
                }
            }
        }
        out
    }

    /// Text view of the bare grid, one glyph per cell.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.tiles[self.idx(IVec2::new(x, y))].glyph());
            }
            if y + 1 < self.height {
                out.push('\n');
            }
        }
        out
    }
}
