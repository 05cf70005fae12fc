//! Session state and core simulation types
//!
//! Everything a level attempt owns lives here: the live pebbles, the
//! derived switch states, the move counter and the playback guard. State
//! is only mutated through the operations in [`crate::engine::command`].

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::engine::level::LevelDef;

/// One of the four unit move directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed order in which walls are scanned when splitting.
    pub const SCAN_ORDER: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit delta, y growing downward.
    #[inline]
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

/// Opaque pebble identity. Monotonically assigned per session, never
/// reused, stable across splits (new pebbles never renumber old ones).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PebbleId(u32);

impl std::fmt::Display for PebbleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A movable avatar on the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pebble {
    pub id: PebbleId,
    pub pos: IVec2,
}

/// Per-session phase. `Won` is terminal for move/split; only a reset
/// returns the session to `InProgress`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    InProgress,
    Won,
}

/// Derived activation state of one switch tile. The coordinate is the
/// switch's identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    pub pos: IVec2,
    pub active: bool,
}

/// State of one level attempt.
///
/// Owns the Pebble Set and switch activations exclusively; presentation
/// layers observe the reports returned by commands instead of reaching in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub(crate) level: LevelDef,
    pub(crate) pebbles: Vec<Pebble>,
    pub(crate) switches: Vec<SwitchState>,
    pub(crate) moves: u32,
    pub(crate) phase: SessionPhase,
    /// Single in-flight playback slot: while set, move/split commands are
    /// rejected until the driver acknowledges with `playback_complete`.
    pub(crate) busy: bool,
    next_id: u32,
}

impl Session {
    /// Start a session for a validated level.
    pub fn new(level: &LevelDef) -> Self {
        let switches = level
            .grid()
            .switch_positions()
            .into_iter()
            .map(|pos| SwitchState { pos, active: false })
            .collect();
        let mut session = Self {
            level: level.clone(),
            pebbles: Vec::new(),
            switches,
            moves: 0,
            phase: SessionPhase::InProgress,
            busy: false,
            next_id: 0,
        };
        session.spawn_at_starts();
        session.refresh_switches();
        log::info!(
            "session started: level {} with {} pebble(s)",
            session.level.meta().id,
            session.pebbles.len()
        );
        session
    }

    /// Allocate a fresh identity token.
    fn next_pebble_id(&mut self) -> PebbleId {
        let id = PebbleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a new pebble at `pos`. Callers uphold the occupancy and
    /// capacity rules.
    pub(crate) fn spawn_pebble(&mut self, pos: IVec2) -> PebbleId {
        let id = self.next_pebble_id();
        self.pebbles.push(Pebble { id, pos });
        id
    }

    fn spawn_at_starts(&mut self) {
        let starts: Vec<IVec2> = self.level.start_positions().to_vec();
        for pos in starts {
            let _ = self.spawn_pebble(pos);
        }
    }

    /// Return to the level's starting configuration. Identity tokens keep
    /// climbing; ids are never reused within a session.
    pub(crate) fn respawn(&mut self) {
        self.pebbles.clear();
        self.spawn_at_starts();
        for switch in &mut self.switches {
            switch.active = false;
        }
        self.refresh_switches();
        self.moves = 0;
        self.phase = SessionPhase::InProgress;
        self.busy = false;
    }

    /// Recompute every switch from the current Pebble Set. Returns the
    /// coordinates that transitioned inactive -> active.
    pub(crate) fn refresh_switches(&mut self) -> Vec<IVec2> {
        let mut newly_active = Vec::new();
        for switch in &mut self.switches {
            let was_active = switch.active;
            switch.active = self.pebbles.iter().any(|p| p.pos == switch.pos);
            if switch.active && !was_active {
                newly_active.push(switch.pos);
            }
        }
        newly_active
    }

    pub fn level(&self) -> &LevelDef {
        &self.level
    }

    pub fn pebbles(&self) -> &[Pebble] {
        &self.pebbles
    }

    pub fn switches(&self) -> &[SwitchState] {
        &self.switches
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn won(&self) -> bool {
        self.phase == SessionPhase::Won
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Text view of the board with pebbles drawn as `@`.
    pub fn render_text(&self) -> String {
        let grid = self.level.grid();
        let mut out = String::new();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = IVec2::new(x, y);
                if self.pebbles.iter().any(|p| p.pos == pos) {
                    out.push('@');
                } else {
                    // In-bounds by construction.
                    out.push(grid.tile_at(pos).map(|t| t.glyph()).unwrap_or('?'));
                }
            }
            if y + 1 < grid.height() {
                out.push('\n');
            }
        }
        out
    }
}
