//! Move history resource

use draughts_engine::{Move, MoveOutcome, Side};

/// One committed hop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub side: Side,
    pub mv: Move,
    pub promoted: bool,
    /// 1-based turn number; every hop of a capture chain shares it
    pub turn: u32,
}

/// Hops committed in the current match, local and remote
#[derive(Debug, Default, Clone)]
pub struct MoveHistory {
    moves: Vec<MoveRecord>,
    completed_turns: u32,
}

impl MoveHistory {
    /// Append a hop and return the stored record
    pub fn record(&mut self, side: Side, mv: Move, outcome: &MoveOutcome) -> &MoveRecord {
        let record = MoveRecord {
            side,
            mv,
            promoted: outcome.promoted,
            turn: self.completed_turns + 1,
        };
        if outcome.turn_ended() {
            self.completed_turns += 1;
        }
        self.moves.push(record);
        &self.moves[self.moves.len() - 1]
    }

    /// Get the last move made
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.moves.last()
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Pieces removed by `side` so far
    pub fn captures_by(&self, side: Side) -> usize {
        self.moves
            .iter()
            .filter(|r| r.side == side)
            .map(|r| r.mv.captured.len())
            .sum()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.completed_turns = 0;
    }
}
