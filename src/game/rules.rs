use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    matching::{can_match, has_any_possible_match},
    scoring::match_score,
    state::{CardId, GameState, GameStatus},
};

/// 一次操作后的终局判定结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndCondition {
    Continue,
    Won,
    Lost,
}

impl EndCondition {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EndCondition::Continue)
    }
}

/// 成功操作产生的事件，表现层据此播放动画。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardPromoted {
        card_id: CardId,
    },
    CardMatched {
        card_id: CardId,
        replaced_id: CardId,
        points: u32,
    },
    GameEnded {
        won: bool,
    },
}

/// 被拒绝的操作。拒绝时状态不会发生任何变化。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum MoveError {
    #[error("game is already over")]
    GameFinished,
    #[error("hand is empty")]
    EmptyHand,
    #[error("card {card_id} is not in the hand")]
    CardNotInHand { card_id: CardId },
    #[error("card {card_id} is not on the playfield")]
    CardNotOnPlayfield { card_id: CardId },
    #[error("card {playfield_card} does not match top of hand {hand_card}")]
    NoMatch {
        hand_card: CardId,
        playfield_card: CardId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub status: GameStatus,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let status = state.status();
        Self {
            state,
            events,
            status,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_in_progress(state: &GameState) -> Result<(), MoveError> {
        if state.is_finished() {
            return Err(MoveError::GameFinished);
        }
        Ok(())
    }

    /// 把指定手牌移到手牌顶。移动本来就在顶部的牌也算成功。
    pub fn replace_top_of_hand(
        state: &mut GameState,
        card_id: CardId,
    ) -> Result<Vec<GameEvent>, MoveError> {
        Self::ensure_in_progress(state)?;

        let idx = state
            .hand_index(card_id)
            .ok_or(MoveError::CardNotInHand { card_id })?;

        let card = state.hand.remove(idx);
        state.hand.push(card);
        debug!(card_id, from = idx, "hand card moved to top");

        Ok(vec![GameEvent::CardPromoted { card_id }])
    }

    /// 用手牌顶匹配一张桌面牌。
    ///
    /// 成功时桌面牌整体覆盖手牌顶（手牌数量不变），原桌面牌被移除，
    /// 分数按被匹配的牌以默认难度累加。
    pub fn execute_match(
        state: &mut GameState,
        playfield_card_id: CardId,
    ) -> Result<Vec<GameEvent>, MoveError> {
        Self::ensure_in_progress(state)?;

        let matched = *state
            .playfield_card(playfield_card_id)
            .ok_or(MoveError::CardNotOnPlayfield {
                card_id: playfield_card_id,
            })?;
        let top = *state.top_of_hand().ok_or(MoveError::EmptyHand)?;

        if !can_match(&matched, &top) {
            debug!(
                hand_card = top.id,
                playfield_card = matched.id,
                "rejected match: faces are not adjacent"
            );
            return Err(MoveError::NoMatch {
                hand_card: top.id,
                playfield_card: matched.id,
            });
        }

        let points = match_score(&matched);
        state.remove_playfield_card(playfield_card_id);
        if let Some(slot) = state.hand.last_mut() {
            *slot = matched;
        }
        state.score = state.score.saturating_add(points);

        debug!(
            card_id = matched.id,
            replaced_id = top.id,
            points,
            score = state.score,
            "match executed"
        );

        Ok(vec![GameEvent::CardMatched {
            card_id: matched.id,
            replaced_id: top.id,
            points,
        }])
    }

    /// 终局判定，按顺序取第一个成立的条件：
    /// 桌面清空 → 胜；手牌为空 → 负；仍有可匹配 → 继续；
    /// 手牌多于一张（还能换牌） → 继续；否则负。
    pub fn classify_end_condition(state: &GameState) -> EndCondition {
        if state.is_win_condition() {
            return EndCondition::Won;
        }
        if state.is_lose_condition() {
            return EndCondition::Lost;
        }
        if has_any_possible_match(&state.hand, &state.playfield) {
            return EndCondition::Continue;
        }
        if state.hand.len() > 1 {
            return EndCondition::Continue;
        }
        EndCondition::Lost
    }

    /// 判定并写回结束标志。只在首次进入终局时产生 `GameEnded`。
    pub fn apply_end_condition(state: &mut GameState) -> Option<GameEvent> {
        if state.is_finished() {
            return None;
        }

        let condition = Self::classify_end_condition(state);
        if !condition.is_terminal() {
            return None;
        }
        let won = condition == EndCondition::Won;

        state.is_over = true;
        state.is_won = won;
        info!(won, score = state.score, "game over");
        Some(GameEvent::GameEnded { won })
    }
}
