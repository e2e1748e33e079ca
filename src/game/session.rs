//! 对局会话：持有状态与撤销历史，对外提供点击、撤销、开局等操作。
//!
//! 会话只通过注册的回调通知表现层，不持有表现层的任何引用。

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

use super::{
    history::{HistoryManager, DEFAULT_MAX_UNDO_DEPTH},
    level::{LevelConfig, LevelSource},
    rules::{GameEvent, MoveError, RuleEngine},
    scoring::{combo_bonus, completion_bonus, time_bonus},
    state::{Card, CardId, GameState},
};

pub const DEFAULT_LEVEL_TIME_LIMIT_SECS: f64 = 120.0;

pub type RefreshCallback = Box<dyn FnMut(&[Card], &[Card])>;
pub type MotionCallback = Box<dyn FnMut(CardMotion)>;
pub type GameEndCallback = Box<dyn FnMut(bool)>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub max_undo_depth: usize,
    pub level_time_limit_secs: f64,
}

impl SessionConfig {
    pub fn with_max_undo_depth(mut self, max_undo_depth: usize) -> Self {
        self.max_undo_depth = max_undo_depth;
        self
    }

    pub fn with_level_time_limit(mut self, secs: f64) -> Self {
        self.level_time_limit_secs = secs;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
            level_time_limit_secs: DEFAULT_LEVEL_TIME_LIMIT_SECS,
        }
    }
}

/// 交给表现层的动画意图，仅作提示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CardMotion {
    HandToTop { card_id: CardId },
    PlayfieldToHand { card_id: CardId },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub level: u32,
    pub over: bool,
    pub won: bool,
    pub score: u32,
    pub remaining: usize,
    pub moves: u32,
    pub best_combo: u32,
    pub undo_count: u32,
    pub completion_bonus: u32,
    pub time_bonus: u32,
}

pub struct GameSession {
    state: GameState,
    history: HistoryManager,
    levels: Box<dyn LevelSource>,
    config: SessionConfig,
    combo: u32,
    best_combo: u32,
    moves: u32,
    undo_count: u32,
    on_refresh: Option<RefreshCallback>,
    on_motion: Option<MotionCallback>,
    on_game_end: Option<GameEndCallback>,
}

impl GameSession {
    /// 创建空会话。注册好回调后调用 [`GameSession::start_new_game`] 开局。
    pub fn new(levels: Box<dyn LevelSource>, config: SessionConfig) -> Self {
        Self::from_state(GameState::new(), levels, config)
    }

    /// 从已有局面继续。
    pub fn from_state(
        state: GameState,
        levels: Box<dyn LevelSource>,
        config: SessionConfig,
    ) -> Self {
        Self {
            state,
            history: HistoryManager::new(config.max_undo_depth),
            levels,
            config,
            combo: 0,
            best_combo: 0,
            moves: 0,
            undo_count: 0,
            on_refresh: None,
            on_motion: None,
            on_game_end: None,
        }
    }

    pub fn set_refresh_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&[Card], &[Card]) + 'static,
    {
        self.on_refresh = Some(Box::new(callback));
    }

    pub fn set_motion_callback<F>(&mut self, callback: F)
    where
        F: FnMut(CardMotion) + 'static,
    {
        self.on_motion = Some(Box::new(callback));
    }

    pub fn set_game_end_callback<F>(&mut self, callback: F)
    where
        F: FnMut(bool) + 'static,
    {
        self.on_game_end = Some(Box::new(callback));
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn combo_count(&self) -> u32 {
        self.combo
    }

    pub fn combo_bonus(&self) -> u32 {
        combo_bonus(self.combo)
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn undo_count(&self) -> u32 {
        self.undo_count
    }

    pub fn set_max_undo_depth(&mut self, max_undo_depth: usize) {
        self.config.max_undo_depth = max_undo_depth;
        self.history.set_max_depth(max_undo_depth);
    }

    /// 点击手牌：把该牌换到手牌顶。返回操作是否生效。
    pub fn on_hand_card_clicked(&mut self, card_id: CardId) -> bool {
        self.play(card_id, RuleEngine::replace_top_of_hand)
    }

    /// 点击桌面牌：尝试与手牌顶匹配。返回操作是否生效。
    pub fn on_playfield_card_clicked(&mut self, card_id: CardId) -> bool {
        self.play(card_id, RuleEngine::execute_match)
    }

    /// 撤销上一步。没有可撤销的历史时什么也不做。
    pub fn on_undo_clicked(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        if !self.history.undo(&mut self.state) {
            return false;
        }

        self.combo = 0;
        self.undo_count = self.undo_count.saturating_add(1);
        debug!(depth = self.history.len(), "undo applied");
        self.refresh();
        true
    }

    /// 清空状态与历史，重新加载当前关卡。
    pub fn start_new_game(&mut self) {
        self.state.reset();
        self.history.clear();
        self.combo = 0;
        self.best_combo = 0;
        self.moves = 0;
        self.undo_count = 0;

        let level = self.state.level;
        let loaded = self
            .levels
            .load(level)
            .and_then(|config| self.state.load_level(&config));
        if let Err(err) = loaded {
            warn!(level, %err, "level load failed, using fallback layout");
            if let Err(err) = self.state.load_level(&LevelConfig::fallback()) {
                error!(%err, "fallback layout rejected");
            }
        }

        info!(
            level,
            hand = self.state.hand.len(),
            playfield = self.state.playfield.len(),
            "new game started"
        );
        self.refresh();
    }

    pub fn reset(&mut self) {
        self.start_new_game();
    }

    pub fn next_level(&mut self) {
        self.state.level = self.state.level.saturating_add(1);
        self.start_new_game();
    }

    pub fn summary(&self, elapsed_secs: f64) -> GameSummary {
        let won = self.state.is_over && self.state.is_won;
        let perfect = won && self.undo_count == 0;
        let remaining = self.state.playfield.len();
        GameSummary {
            level: self.state.level,
            over: self.state.is_over,
            won,
            score: self.state.score,
            remaining,
            moves: self.moves,
            best_combo: self.best_combo,
            undo_count: self.undo_count,
            completion_bonus: if self.state.is_over {
                completion_bonus(remaining, elapsed_secs, perfect)
            } else {
                0
            },
            time_bonus: if won {
                time_bonus(elapsed_secs, self.config.level_time_limit_secs)
            } else {
                0
            },
        }
    }

    // 快照在操作之前保存；操作被拒绝时快照仍然保留。
    fn play<F>(&mut self, card_id: CardId, action: F) -> bool
    where
        F: FnOnce(&mut GameState, CardId) -> Result<Vec<GameEvent>, MoveError>,
    {
        if self.state.is_finished() {
            debug!(card_id, "click ignored: game is over");
            return false;
        }

        self.history.save_state(&self.state);

        match action(&mut self.state, card_id) {
            Ok(events) => {
                self.moves = self.moves.saturating_add(1);
                self.track_combo(&events);
                self.dispatch(&events);
                self.refresh();
                self.check_game_end();
                true
            }
            Err(err) => {
                debug!(card_id, %err, "move refused");
                self.combo = 0;
                false
            }
        }
    }

    fn track_combo(&mut self, events: &[GameEvent]) {
        for event in events {
            if matches!(event, GameEvent::CardMatched { .. }) {
                self.combo += 1;
                self.best_combo = self.best_combo.max(self.combo);
            }
        }
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        let Some(on_motion) = self.on_motion.as_mut() else {
            return;
        };
        for event in events {
            match event {
                GameEvent::CardPromoted { card_id } => {
                    on_motion(CardMotion::HandToTop { card_id: *card_id })
                }
                GameEvent::CardMatched { card_id, .. } => {
                    on_motion(CardMotion::PlayfieldToHand { card_id: *card_id })
                }
                GameEvent::GameEnded { .. } => {}
            }
        }
    }

    fn refresh(&mut self) {
        if let Some(on_refresh) = self.on_refresh.as_mut() {
            on_refresh(&self.state.hand, &self.state.playfield);
        }
    }

    fn check_game_end(&mut self) {
        if let Some(GameEvent::GameEnded { won }) = RuleEngine::apply_end_condition(&mut self.state)
        {
            if let Some(on_game_end) = self.on_game_end.as_mut() {
                on_game_end(won);
            }
        }
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("history", &self.history)
            .field("config", &self.config)
            .field("combo", &self.combo)
            .field("moves", &self.moves)
            .finish_non_exhaustive()
    }
}
