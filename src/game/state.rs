use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::level::{LevelConfig, LevelError};
use crate::utils::next_card_id;

/// 全局唯一的卡牌标识。
pub type CardId = u32;

/// 牌面，A 到 K，序号 0..12。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardFace {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl CardFace {
    pub const ALL: [CardFace; 13] = [
        CardFace::Ace,
        CardFace::Two,
        CardFace::Three,
        CardFace::Four,
        CardFace::Five,
        CardFace::Six,
        CardFace::Seven,
        CardFace::Eight,
        CardFace::Nine,
        CardFace::Ten,
        CardFace::Jack,
        CardFace::Queen,
        CardFace::King,
    ];

    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_ordinal(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// A、J、Q、K 为特殊牌，计分时有额外奖励。
    pub fn is_special(self) -> bool {
        matches!(
            self,
            CardFace::Ace | CardFace::Jack | CardFace::Queen | CardFace::King
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            CardFace::Ace => "A",
            CardFace::Two => "2",
            CardFace::Three => "3",
            CardFace::Four => "4",
            CardFace::Five => "5",
            CardFace::Six => "6",
            CardFace::Seven => "7",
            CardFace::Eight => "8",
            CardFace::Nine => "9",
            CardFace::Ten => "10",
            CardFace::Jack => "J",
            CardFace::Queen => "Q",
            CardFace::King => "K",
        }
    }
}

impl TryFrom<i32> for CardFace {
    type Error = LevelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or(LevelError::InvalidFace { value })
    }
}

impl fmt::Display for CardFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 花色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CardSuit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl CardSuit {
    pub const ALL: [CardSuit; 4] = [
        CardSuit::Clubs,
        CardSuit::Diamonds,
        CardSuit::Hearts,
        CardSuit::Spades,
    ];

    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_ordinal(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn is_red(self) -> bool {
        matches!(self, CardSuit::Diamonds | CardSuit::Hearts)
    }

    pub fn name(self) -> &'static str {
        match self {
            CardSuit::Clubs => "Clubs",
            CardSuit::Diamonds => "Diamonds",
            CardSuit::Hearts => "Hearts",
            CardSuit::Spades => "Spades",
        }
    }
}

impl TryFrom<i32> for CardSuit {
    type Error = LevelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or(LevelError::InvalidSuit { value })
    }
}

impl fmt::Display for CardSuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 关卡数据给出的摆放位置，仅供表现层参考。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 一张扑克牌。值类型，可自由复制。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub face: CardFace,
    pub suit: CardSuit,
    #[serde(default = "face_up_default")]
    pub face_up: bool,
    #[serde(default)]
    pub position: Position,
}

fn face_up_default() -> bool {
    true
}

impl Card {
    pub fn new(id: CardId, face: CardFace, suit: CardSuit, face_up: bool) -> Self {
        Self {
            id,
            face,
            suit,
            face_up,
            position: Position::default(),
        }
    }

    /// 以新分配的 ID 创建一张正面朝上的牌。
    pub fn fresh(face: CardFace, suit: CardSuit) -> Self {
        Self::new(next_card_id(), face, suit, true)
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.face, self.suit)
    }
}

/// 对局状态（由标志位推导）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("card id {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("game is marked won but not over")]
    WonWithoutOver,
}

/// 游戏整体状态。
///
/// `hand` 的最后一张是手牌顶，只有它可以参与匹配；`playfield` 的顺序只影响显示。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub playfield: Vec<Card>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub is_over: bool,
    #[serde(default)]
    pub is_won: bool,
    #[serde(default = "first_level")]
    pub level: u32,
}

fn first_level() -> u32 {
    1
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(hand: Vec<Card>, playfield: Vec<Card>) -> Self {
        Self {
            hand,
            playfield,
            ..Self::default()
        }
    }

    pub fn top_of_hand(&self) -> Option<&Card> {
        self.hand.last()
    }

    pub fn hand_index(&self, card_id: CardId) -> Option<usize> {
        self.hand.iter().position(|card| card.id == card_id)
    }

    pub fn playfield_index(&self, card_id: CardId) -> Option<usize> {
        self.playfield.iter().position(|card| card.id == card_id)
    }

    pub fn playfield_card(&self, card_id: CardId) -> Option<&Card> {
        self.playfield.iter().find(|card| card.id == card_id)
    }

    pub fn contains_card(&self, card_id: CardId) -> bool {
        self.hand_index(card_id).is_some() || self.playfield_index(card_id).is_some()
    }

    pub fn remove_playfield_card(&mut self, card_id: CardId) -> Option<Card> {
        let idx = self.playfield_index(card_id)?;
        Some(self.playfield.remove(idx))
    }

    /// 清空牌面、分数与结束标志，保留关卡号。
    pub fn reset(&mut self) {
        self.hand.clear();
        self.playfield.clear();
        self.score = 0;
        self.is_over = false;
        self.is_won = false;
    }

    /// 用关卡数据重新填充状态。数据非法时返回错误且不修改状态。
    pub fn load_level(&mut self, config: &LevelConfig) -> Result<(), LevelError> {
        let (hand, playfield) = config.build_cards()?;
        self.reset();
        self.hand = hand;
        self.playfield = playfield;
        Ok(())
    }

    pub fn is_win_condition(&self) -> bool {
        self.playfield.is_empty()
    }

    pub fn is_lose_condition(&self) -> bool {
        self.hand.is_empty() && !self.playfield.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.is_over
    }

    pub fn status(&self) -> GameStatus {
        match (self.is_over, self.is_won) {
            (true, true) => GameStatus::Won,
            (true, false) => GameStatus::Lost,
            _ => GameStatus::InProgress,
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.is_won && !self.is_over {
            return Err(IntegrityError::WonWithoutOver);
        }

        let mut seen = HashSet::new();
        for card in self.hand.iter().chain(self.playfield.iter()) {
            if !seen.insert(card.id) {
                return Err(IntegrityError::DuplicateCardId { card_id: card.id });
            }
        }

        Ok(())
    }

    /// 一个小型示例局面，方便前端调试。
    pub fn sample() -> Self {
        let hand = vec![
            Card::fresh(CardFace::Five, CardSuit::Clubs),
            Card::fresh(CardFace::Nine, CardSuit::Diamonds),
            Card::fresh(CardFace::Two, CardSuit::Hearts),
        ];

        let playfield = [
            (CardFace::Ace, CardSuit::Hearts, 0.0),
            (CardFace::Three, CardSuit::Spades, 120.0),
            (CardFace::Ten, CardSuit::Clubs, 240.0),
            (CardFace::King, CardSuit::Diamonds, 360.0),
            (CardFace::Queen, CardSuit::Spades, 480.0),
        ]
        .into_iter()
        .map(|(face, suit, x)| Card::fresh(face, suit).with_position(Position::new(x, 0.0)))
        .collect();

        Self::with_cards(hand, playfield)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            hand: Vec::new(),
            playfield: Vec::new(),
            score: 0,
            is_over: false,
            is_won: false,
            level: first_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_ordinals_cover_ace_to_king() {
        assert_eq!(CardFace::Ace.ordinal(), 0);
        assert_eq!(CardFace::King.ordinal(), 12);
        assert_eq!(CardFace::from_ordinal(10), Some(CardFace::Jack));
        assert_eq!(CardFace::from_ordinal(-1), None);
        assert_eq!(CardFace::from_ordinal(13), None);
        assert!(CardSuit::try_from(4).is_err());
    }

    #[test]
    fn card_display_reads_naturally() {
        let card = Card::new(7, CardFace::Queen, CardSuit::Spades, true);
        assert_eq!(card.to_string(), "Q of Spades");
        assert!(CardSuit::Hearts.is_red());
        assert!(!CardSuit::Clubs.is_red());
    }

    #[test]
    fn top_of_hand_is_last_card() {
        let state = GameState::sample();
        let top = state.top_of_hand().expect("sample hand should not be empty");
        assert_eq!(top.face, CardFace::Two);
        assert_eq!(state.hand_index(top.id), Some(state.hand.len() - 1));
    }

    #[test]
    fn reset_clears_cards_and_flags_but_keeps_level() {
        let mut state = GameState::sample();
        state.score = 40;
        state.is_over = true;
        state.is_won = true;
        state.level = 3;

        state.reset();

        assert!(state.hand.is_empty());
        assert!(state.playfield.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.status(), GameStatus::InProgress);
        assert_eq!(state.level, 3);
    }

    #[test]
    fn card_lookup_and_raw_end_conditions() {
        let hand = Card::new(1, CardFace::Two, CardSuit::Clubs, true);
        let field = Card::new(2, CardFace::Three, CardSuit::Clubs, true);

        let state = GameState::with_cards(vec![hand], vec![field]);
        assert!(state.contains_card(1));
        assert!(state.contains_card(2));
        assert!(!state.contains_card(3));
        assert!(!state.is_win_condition());
        assert!(!state.is_lose_condition());

        let state = GameState::with_cards(Vec::new(), vec![field]);
        assert!(state.is_lose_condition());

        // 桌面清空即胜利，手牌空也不算失败
        let state = GameState::with_cards(Vec::new(), Vec::new());
        assert!(state.is_win_condition());
        assert!(!state.is_lose_condition());
    }

    #[test]
    fn integrity_check_flags_duplicate_ids() {
        let card = Card::new(42, CardFace::Four, CardSuit::Clubs, true);
        let state = GameState::with_cards(vec![card], vec![card]);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::DuplicateCardId { card_id: 42 })
        );
        assert!(GameState::sample().integrity_check().is_ok());
    }

    #[test]
    fn integrity_check_flags_won_without_over() {
        let mut state = GameState::sample();
        state.is_won = true;
        assert_eq!(state.integrity_check(), Err(IntegrityError::WonWithoutOver));
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = GameState::sample();
        let json = serde_json::to_string(&state).expect("state should serialize");
        assert!(json.contains("\"faceUp\":true"));
        let parsed: GameState = serde_json::from_str(&json).expect("state should parse");
        assert_eq!(parsed, state);
    }
}
