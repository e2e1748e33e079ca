//! 游戏核心逻辑模块（状态、匹配与计分规则、撤销历史、会话编排）。

pub mod history;
pub mod level;
pub mod matching;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod state;

pub use history::{HistoryManager, HistorySnapshot, DEFAULT_MAX_UNDO_DEPTH};
pub use level::{CardConfig, DealtLevel, LevelConfig, LevelError, LevelSet, LevelSource};
pub use matching::{can_match, face_difference, find_matchable, has_any_possible_match};
pub use rules::{EndCondition, GameEvent, MoveError, RuleEngine, RuleResolution};
pub use session::{CardMotion, GameSession, GameSummary, SessionConfig};
pub use state::{
    Card,
    CardFace,
    CardId,
    CardSuit,
    GameState,
    GameStatus,
    IntegrityError,
    Position,
};
