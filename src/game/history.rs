//! 撤销历史：有界的快照栈，超出容量时丢弃最旧的快照。

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use super::state::{Card, GameState};

pub const DEFAULT_MAX_UNDO_DEPTH: usize = 10;

/// 某一时刻手牌、桌面与分数的深拷贝。不记录结束标志。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySnapshot {
    pub hand: Vec<Card>,
    pub playfield: Vec<Card>,
    pub score: u32,
}

impl HistorySnapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            hand: state.hand.clone(),
            playfield: state.playfield.clone(),
            score: state.score,
        }
    }

    /// 覆盖状态并清除结束标志，撤销后总是回到可继续的局面。
    pub fn restore(self, state: &mut GameState) {
        state.hand = self.hand;
        state.playfield = self.playfield;
        state.score = self.score;
        state.is_over = false;
        state.is_won = false;
    }
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    snapshots: VecDeque<HistorySnapshot>,
    max_depth: usize,
}

impl HistoryManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(max_depth.min(DEFAULT_MAX_UNDO_DEPTH)),
            max_depth,
        }
    }

    pub fn save_state(&mut self, state: &GameState) {
        self.snapshots.push_back(HistorySnapshot::capture(state));
        self.evict_overflow();
        debug!(depth = self.snapshots.len(), "history snapshot saved");
    }

    /// 弹出最近的快照并写回状态。没有可撤销的快照时返回 false。
    pub fn undo(&mut self, state: &mut GameState) -> bool {
        let Some(snapshot) = self.snapshots.pop_back() else {
            return false;
        };
        snapshot.restore(state);
        debug!(depth = self.snapshots.len(), "history snapshot restored");
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.evict_overflow();
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn peek(&self) -> Option<&HistorySnapshot> {
        self.snapshots.back()
    }

    fn evict_overflow(&mut self) {
        while self.snapshots.len() > self.max_depth {
            self.snapshots.pop_front();
        }
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{CardFace, CardSuit};
    use proptest::prelude::*;

    fn state_with_score(score: u32) -> GameState {
        let mut state = GameState::with_cards(
            vec![Card::new(1, CardFace::Two, CardSuit::Clubs, true)],
            vec![Card::new(2, CardFace::Three, CardSuit::Clubs, true)],
        );
        state.score = score;
        state
    }

    #[test]
    fn undo_restores_exact_pre_save_position_and_clears_flags() {
        let mut history = HistoryManager::default();
        let mut state = state_with_score(10);
        let saved = state.clone();
        history.save_state(&state);

        state.playfield.clear();
        state.score = 25;
        state.is_over = true;
        state.is_won = true;

        assert!(history.undo(&mut state));
        assert_eq!(state, saved);
        assert!(!state.is_over);
        assert!(!state.is_won);
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut history = HistoryManager::default();
        let mut state = state_with_score(5);
        let before = state.clone();
        assert!(!history.undo(&mut state));
        assert_eq!(state, before);
    }

    #[test]
    fn three_saves_then_undo_leaves_two() {
        let mut history = HistoryManager::default();
        let mut state = state_with_score(0);
        for score in [1, 2, 3] {
            state.score = score;
            history.save_state(&state);
        }

        state.score = 99;
        assert!(history.undo(&mut state));
        assert_eq!(state.score, 3);
        assert_eq!(history.len(), 2);
        assert_eq!(history.peek().map(|snapshot| snapshot.score), Some(2));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut history = HistoryManager::new(3);
        let mut state = state_with_score(0);
        for score in 1..=4 {
            state.score = score;
            history.save_state(&state);
        }
        assert_eq!(history.len(), 3);

        let mut restored = Vec::new();
        while history.undo(&mut state) {
            restored.push(state.score);
        }
        assert_eq!(restored, vec![4, 3, 2]);
    }

    #[test]
    fn shrinking_capacity_evicts_immediately() {
        let mut history = HistoryManager::new(5);
        let mut state = state_with_score(0);
        for score in 1..=5 {
            state.score = score;
            history.save_state(&state);
        }

        history.set_max_depth(2);

        assert_eq!(history.len(), 2);
        assert_eq!(history.max_depth(), 2);
        assert_eq!(history.peek().map(|snapshot| snapshot.score), Some(5));

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut history = HistoryManager::new(usize::MAX);
        let mut state = state_with_score(7);
        history.save_state(&state);
        state.score = 8;

        assert!(history.undo(&mut state));
        assert_eq!(state.score, 7);
        assert_eq!(history.max_depth(), usize::MAX);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(max_depth in 0usize..12, pushes in 0usize..40) {
            let mut history = HistoryManager::new(max_depth);
            let mut state = state_with_score(0);
            for score in 0..pushes {
                state.score = score as u32;
                history.save_state(&state);
                prop_assert!(history.len() <= max_depth);
            }
            prop_assert_eq!(history.len(), pushes.min(max_depth));
            if max_depth > 0 && pushes > 0 {
                let newest = history.peek().map(|snapshot| snapshot.score);
                prop_assert_eq!(newest, Some((pushes - 1) as u32));
            }
        }
    }
}
