//! 关卡数据与关卡来源。
//!
//! 关卡 JSON 格式：`{"Playfield": [...], "Stack": [...]}`，
//! 每张牌为 `{"CardFace": 0..12, "CardSuit": 0..3, "Position": {"x", "y"}}`。

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::state::{Card, CardFace, CardSuit, Position};
use crate::utils::next_card_id;

const DECK_SIZE: usize = 52;
const LAYOUT_COLUMNS: usize = 7;
const LAYOUT_SPACING_X: f32 = 120.0;
const LAYOUT_SPACING_Y: f32 = 160.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum LevelError {
    #[error("invalid card face {value}")]
    InvalidFace { value: i32 },
    #[error("invalid card suit {value}")]
    InvalidSuit { value: i32 },
    #[error("level has no stack cards")]
    EmptyStack,
    #[error("level {level} does not exist")]
    UnknownLevel { level: u32 },
    #[error("cannot deal {requested} cards from a single deck")]
    DeckExhausted { requested: usize },
    #[error("failed to parse level data: {message}")]
    Parse { message: String },
}

/// 关卡文件中的一张牌。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CardConfig {
    #[serde(rename = "CardFace")]
    pub card_face: i32,
    #[serde(rename = "CardSuit")]
    pub card_suit: i32,
    #[serde(rename = "Position", default)]
    pub position: Position,
}

impl CardConfig {
    pub fn new(face: CardFace, suit: CardSuit, position: Position) -> Self {
        Self {
            card_face: face.ordinal(),
            card_suit: suit.ordinal(),
            position,
        }
    }

    fn resolve(&self) -> Result<(CardFace, CardSuit), LevelError> {
        Ok((
            CardFace::try_from(self.card_face)?,
            CardSuit::try_from(self.card_suit)?,
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LevelConfig {
    #[serde(rename = "Playfield", default)]
    pub playfield: Vec<CardConfig>,
    #[serde(rename = "Stack", default)]
    pub stack: Vec<CardConfig>,
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        serde_json::from_str(json).map_err(|err| LevelError::Parse {
            message: err.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.stack.is_empty() {
            return Err(LevelError::EmptyStack);
        }
        for config in self.stack.iter().chain(self.playfield.iter()) {
            config.resolve()?;
        }
        Ok(())
    }

    /// 生成 (手牌, 桌面)。先校验全部数据，再按手牌、桌面的顺序分配新 ID。
    pub fn build_cards(&self) -> Result<(Vec<Card>, Vec<Card>), LevelError> {
        self.validate()?;
        let build = |configs: &[CardConfig]| {
            configs
                .iter()
                .map(|config| -> Result<Card, LevelError> {
                    let (face, suit) = config.resolve()?;
                    Ok(Card::new(next_card_id(), face, suit, true).with_position(config.position))
                })
                .collect::<Result<Vec<Card>, LevelError>>()
        };
        let hand = build(&self.stack)?;
        let playfield = build(&self.playfield)?;
        Ok((hand, playfield))
    }

    /// 关卡加载失败时使用的默认局面：红桃 2..6 作手牌，黑桃 3..5 摆在桌面。
    pub fn fallback() -> Self {
        let stack = (1..=5)
            .filter_map(CardFace::from_ordinal)
            .map(|face| CardConfig::new(face, CardSuit::Hearts, Position::default()))
            .collect();
        let playfield = (2..=4)
            .filter_map(CardFace::from_ordinal)
            .enumerate()
            .map(|(i, face)| {
                let x = i as f32 * LAYOUT_SPACING_X;
                CardConfig::new(face, CardSuit::Spades, Position::new(x, 0.0))
            })
            .collect();
        Self { playfield, stack }
    }
}

/// 关卡来源，由会话在开局时调用。
pub trait LevelSource {
    fn load(&mut self, level: u32) -> Result<LevelConfig, LevelError>;
}

/// 单一固定关卡：任何关卡号都返回同一份数据。
impl LevelSource for LevelConfig {
    fn load(&mut self, _level: u32) -> Result<LevelConfig, LevelError> {
        Ok(self.clone())
    }
}

/// 按顺序排列的关卡列表，关卡号从 1 开始。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LevelSet {
    pub levels: Vec<LevelConfig>,
}

impl LevelSet {
    pub fn new(levels: Vec<LevelConfig>) -> Self {
        Self { levels }
    }
}

impl LevelSource for LevelSet {
    fn load(&mut self, level: u32) -> Result<LevelConfig, LevelError> {
        let index = usize::try_from(level)
            .ok()
            .and_then(|level| level.checked_sub(1))
            .ok_or(LevelError::UnknownLevel { level })?;
        self.levels
            .get(index)
            .cloned()
            .ok_or(LevelError::UnknownLevel { level })
    }
}

/// 从洗好的整副牌发出关卡。同一种子与关卡号总是得到同样的牌局。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealtLevel {
    pub seed: u64,
    pub playfield_size: usize,
    pub stack_size: usize,
}

impl DealtLevel {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            playfield_size: 21,
            stack_size: 15,
        }
    }

    pub fn with_sizes(mut self, playfield_size: usize, stack_size: usize) -> Self {
        self.playfield_size = playfield_size;
        self.stack_size = stack_size;
        self
    }

    pub fn deal(&self, level: u32) -> Result<LevelConfig, LevelError> {
        let requested = self.playfield_size.saturating_add(self.stack_size);
        if requested > DECK_SIZE {
            return Err(LevelError::DeckExhausted { requested });
        }
        if self.stack_size == 0 {
            return Err(LevelError::EmptyStack);
        }

        let mut deck: Vec<(CardFace, CardSuit)> = CardSuit::ALL
            .iter()
            .flat_map(|&suit| CardFace::ALL.iter().map(move |&face| (face, suit)))
            .collect();
        let mut rng = SmallRng::seed_from_u64(self.seed ^ u64::from(level));
        deck.shuffle(&mut rng);

        let mut cards = deck.into_iter();
        let playfield = cards
            .by_ref()
            .take(self.playfield_size)
            .enumerate()
            .map(|(i, (face, suit))| {
                let x = (i % LAYOUT_COLUMNS) as f32 * LAYOUT_SPACING_X;
                let y = (i / LAYOUT_COLUMNS) as f32 * LAYOUT_SPACING_Y;
                CardConfig::new(face, suit, Position::new(x, y))
            })
            .collect();
        let stack = cards
            .take(self.stack_size)
            .map(|(face, suit)| CardConfig::new(face, suit, Position::default()))
            .collect();

        debug!(seed = self.seed, level, "dealt level");
        Ok(LevelConfig { playfield, stack })
    }
}

impl LevelSource for DealtLevel {
    fn load(&mut self, level: u32) -> Result<LevelConfig, LevelError> {
        self.deal(level)
    }
}
