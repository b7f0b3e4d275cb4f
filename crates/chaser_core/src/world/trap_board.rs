//! Per-coordinate trap classification.
//!
//! Each coordinate carries an explicit state machine instead of ad-hoc
//! flags:
//!
//! ```text
//! Unknown ──────────────► PendingSearch ──► ConfirmedTrap | ConfirmedSafe
//!    │                                            ▲
//!    └──► SuspectedTrap ──────────────────────────┘ (probe or retraction)
//! ```
//!
//! `ConfirmedTrap` and `ConfirmedSafe` are terminal: passive evidence can
//! never flip them again.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::Coord;

/// Classification state of one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrapStatus {
    #[default]
    Unknown,
    /// An active probe has been issued and its verdict is outstanding.
    PendingSearch,
    /// Passive geometric evidence says this looks like a trap.
    SuspectedTrap,
    ConfirmedTrap,
    ConfirmedSafe,
}

impl TrapStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TrapStatus::ConfirmedTrap | TrapStatus::ConfirmedSafe)
    }

    /// Statuses that make a tile unenterable for movement planning.
    #[inline]
    pub fn blocks_movement(self) -> bool {
        matches!(
            self,
            TrapStatus::ConfirmedTrap | TrapStatus::PendingSearch | TrapStatus::SuspectedTrap
        )
    }

    /// Statuses that make a tile impassable for the A* search. Suspected
    /// tiles stay searchable; only hard knowledge prunes the graph.
    #[inline]
    pub fn blocks_search(self) -> bool {
        matches!(self, TrapStatus::ConfirmedTrap | TrapStatus::PendingSearch)
    }
}

/// Why a coordinate carries its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapReason {
    /// Seen openly walkable; an escapable square is never a trap.
    OpenTile,
    /// Verdict of an active probe ray.
    Probe,
    /// A cached probe ray already showed the tile is pass-through.
    ProbeCache,
    /// Item ahead with both forward diagonals blocked.
    WalledItem,
    /// Bounded reachability says the tile is a pocket.
    DeadEnd,
    /// Item with three or more known-blocked neighbors on the map.
    MapWalledItem,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrapEntry {
    pub status: TrapStatus,
    pub reason: TrapReason,
    pub updated_turn: u32,
}

/// Typed map of trap classifications.
#[derive(Debug, Clone, Default)]
pub struct TrapBoard {
    entries: FxHashMap<Coord, TrapEntry>,
}

impl TrapBoard {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn status(&self, coord: Coord) -> TrapStatus {
        self.entries.get(&coord).map_or(TrapStatus::Unknown, |e| e.status)
    }

    #[inline]
    pub fn reason(&self, coord: Coord) -> Option<TrapReason> {
        self.entries.get(&coord).map(|e| e.reason)
    }

    pub fn entry(&self, coord: Coord) -> Option<&TrapEntry> {
        self.entries.get(&coord)
    }

    /// Record a terminal trap verdict. Ignored when the coordinate already
    /// reached a terminal state.
    pub fn mark_trap(&mut self, coord: Coord, reason: TrapReason, turn: u32) -> bool {
        self.set(coord, TrapStatus::ConfirmedTrap, reason, turn)
    }

    /// Record a terminal safe verdict. Ignored when the coordinate already
    /// reached a terminal state.
    pub fn mark_safe(&mut self, coord: Coord, reason: TrapReason, turn: u32) -> bool {
        self.set(coord, TrapStatus::ConfirmedSafe, reason, turn)
    }

    /// Flag a coordinate as suspicious from passive evidence. Never
    /// overrides a pending probe or a terminal verdict.
    pub fn mark_suspected(&mut self, coord: Coord, reason: TrapReason, turn: u32) -> bool {
        if self.status(coord) == TrapStatus::PendingSearch {
            return false;
        }
        self.set(coord, TrapStatus::SuspectedTrap, reason, turn)
    }

    /// Record that an active probe has been issued for this coordinate.
    pub fn mark_pending(&mut self, coord: Coord, turn: u32) -> bool {
        self.set(coord, TrapStatus::PendingSearch, TrapReason::Probe, turn)
    }

    /// Retract a suspicion when contradicting passive evidence arrives.
    /// Only a `SuspectedTrap` with the matching reason is downgraded.
    pub fn retract_suspicion(&mut self, coord: Coord, reason: TrapReason, turn: u32) -> bool {
        match self.entries.get(&coord) {
            Some(entry)
                if entry.status == TrapStatus::SuspectedTrap && entry.reason == reason =>
            {
                self.entries.insert(
                    coord,
                    TrapEntry { status: TrapStatus::ConfirmedSafe, reason, updated_turn: turn },
                );
                true
            }
            _ => false,
        }
    }

    fn set(&mut self, coord: Coord, status: TrapStatus, reason: TrapReason, turn: u32) -> bool {
        if self.status(coord).is_terminal() {
            return false;
        }
        self.entries.insert(coord, TrapEntry { status, reason, updated_turn: turn });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn confirmed_trap_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == TrapStatus::ConfirmedTrap)
            .count()
    }
}
