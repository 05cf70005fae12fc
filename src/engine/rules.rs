//! Pure move/split planning
//!
//! The query half of the resolvers: given an immutable grid and the
//! current Pebble Set, compute what a synchronized move or a split would
//! do. Nothing here mutates state; [`crate::engine::command`] applies the
//! returned plans.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::engine::grid::{Grid, TileKind};
use crate::engine::state::{Direction, Pebble, PebbleId};

/// One pebble's planned translation for a synchronized move.
/// Plans are produced in Pebble Set order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub id: PebbleId,
    pub from: IVec2,
    pub to: IVec2,
    /// False means the pebble bumps in place this turn.
    pub legal: bool,
}

/// One new pebble a split would create, in creation order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPlan {
    /// The pebble splitting through the wall.
    pub parent: PebbleId,
    /// Direction of the wall relative to the parent.
    pub dir: Direction,
    /// Birth cell, one step beyond the wall.
    pub pos: IVec2,
}

/// True iff `target` is in bounds, walkable, and not occupied by any
/// pebble other than `exclude`. Occupancy uses the pebbles' current
/// (pre-move) positions.
pub fn can_enter(grid: &Grid, pebbles: &[Pebble], target: IVec2, exclude: PebbleId) -> bool {
    if !grid.is_walkable(target) {
        return false;
    }
    !pebbles
        .iter()
        .any(|p| p.id != exclude && p.pos == target)
}

/// Plan a synchronized move of every pebble by one step in `dir`.
///
/// A candidate is individually legal per [`can_enter`]; then any group of
/// legal candidates sharing a target coordinate is wholly marked illegal,
/// evaluated against a snapshot so that marking one member never frees
/// another. Two pebbles may never merge into one cell, even transiently.
pub fn plan_move(grid: &Grid, pebbles: &[Pebble], dir: Direction) -> Vec<MovePlan> {
    let delta = dir.delta();
    let mut plans: Vec<MovePlan> = pebbles
        .iter()
        .map(|p| {
            let to = p.pos + delta;
            MovePlan {
                id: p.id,
                from: p.pos,
                to,
                legal: can_enter(grid, pebbles, to, p.id),
            }
        })
        .collect();

    let legal_targets: Vec<(PebbleId, IVec2)> = plans
        .iter()
        .filter(|p| p.legal)
        .map(|p| (p.id, p.to))
        .collect();
    for plan in plans.iter_mut().filter(|p| p.legal) {
        let contested = legal_targets
            .iter()
            .any(|&(id, to)| id != plan.id && to == plan.to);
        if contested {
            plan.legal = false;
        }
    }

    plans
}

/// Plan a split operation over the current Pebble Set.
///
/// Pebbles are scanned in set order at their pre-split positions, walls in
/// [`Direction::SCAN_ORDER`]. A slot is eligible when the adjacent cell is
/// a wall, the cell beyond it is in bounds and not a wall, and that cell
/// is unoccupied by existing pebbles or by pebbles planned earlier in the
/// same operation. At most `capacity` pebbles are planned.
pub fn plan_splits(grid: &Grid, pebbles: &[Pebble], capacity: usize) -> Vec<SplitPlan> {
    let mut planned: Vec<SplitPlan> = Vec::new();
    for pebble in pebbles {
        for dir in Direction::SCAN_ORDER {
            if planned.len() >= capacity {
                return planned;
            }
            let delta = dir.delta();
            let wall = pebble.pos + delta;
            let beyond = pebble.pos + delta * 2;
            if grid.tile_at(wall) != Ok(TileKind::Wall) {
                continue;
            }
            if !grid.is_walkable(beyond) {
                continue;
            }
            let occupied = pebbles.iter().any(|p| p.pos == beyond)
                || planned.iter().any(|p| p.pos == beyond);
            if occupied {
                continue;
            }
            planned.push(SplitPlan {
                parent: pebble.id,
                dir,
                pos: beyond,
            });
        }
    }
    planned
}
