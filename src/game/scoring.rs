//! 计分规则。全部为无状态的纯函数。

use super::matching::face_difference;
use super::state::Card;

pub const BASE_MATCH_SCORE: u32 = 10;
pub const SPECIAL_CARD_BONUS: u32 = 5;
pub const SAME_SUIT_BONUS: u32 = 3;
pub const PERFECT_GAME_MULTIPLIER: u32 = 2;
pub const COMBO_MULTIPLIER: f64 = 1.5;
pub const TIME_BONUS_FACTOR: f64 = 0.1;
pub const MAX_COMBO_BONUS: u32 = 50;
pub const MAX_TIME_BONUS: u32 = 20;
pub const DEFAULT_DIFFICULTY: f64 = 1.0;

pub fn is_special_card(card: &Card) -> bool {
    card.face.is_special()
}

pub fn special_card_bonus(card: &Card) -> u32 {
    if is_special_card(card) {
        SPECIAL_CARD_BONUS
    } else {
        0
    }
}

/// 以默认难度 1.0 计算一次匹配的得分。出牌路径只使用这个版本。
pub fn match_score(card: &Card) -> u32 {
    weighted_match_score(card, DEFAULT_DIFFICULTY)
}

/// `max(1, round((基础分 + 特殊牌奖励) * difficulty))`
pub fn weighted_match_score(card: &Card, difficulty: f64) -> u32 {
    let raw = f64::from(BASE_MATCH_SCORE + special_card_bonus(card)) * difficulty;
    raw.round().max(1.0) as u32
}

/// 连击奖励：2 连击 2 分，3 连击 6 分，4 连击 14 分……最高 50。
pub fn combo_bonus(combo_count: u32) -> u32 {
    if combo_count <= 1 {
        return 0;
    }
    let steps = f64::from(combo_count - 1);
    let bonus = (steps * steps * COMBO_MULTIPLIER).round();
    if bonus >= f64::from(MAX_COMBO_BONUS) {
        MAX_COMBO_BONUS
    } else {
        bonus as u32
    }
}

pub fn time_bonus(elapsed: f64, base_time: f64) -> u32 {
    if elapsed >= base_time {
        return 0;
    }
    let bonus = ((base_time - elapsed) * TIME_BONUS_FACTOR).round();
    bonus.clamp(0.0, f64::from(MAX_TIME_BONUS)) as u32
}

/// 通关奖励：按剩余桌面牌分档，完美通关翻倍，再加用时档位奖励。
pub fn completion_bonus(remaining_cards: usize, total_time: f64, perfect: bool) -> u32 {
    let mut bonus = match remaining_cards {
        0 => 100,
        1..=2 => 50,
        3..=5 => 20,
        _ => 0,
    };

    if perfect {
        bonus *= PERFECT_GAME_MULTIPLIER;
    }

    if total_time < 60.0 {
        bonus += 30;
    } else if total_time < 120.0 {
        bonus += 15;
    }

    bonus
}

/// 匹配难度系数。目前不参与出牌计分。
pub fn match_difficulty(a: &Card, b: &Card) -> f64 {
    let mut difficulty = if face_difference(a, b) == 1 { 1.5 } else { 1.0 };
    if is_special_card(a) || is_special_card(b) {
        difficulty *= 1.2;
    }
    difficulty
}

pub fn suit_match_bonus(a: &Card, b: &Card) -> u32 {
    if a.suit == b.suit {
        SAME_SUIT_BONUS
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{CardFace, CardSuit};

    fn card(face: CardFace, suit: CardSuit) -> Card {
        Card::new(1, face, suit, true)
    }

    #[test]
    fn plain_and_special_match_scores() {
        assert_eq!(match_score(&card(CardFace::Seven, CardSuit::Clubs)), 10);
        assert_eq!(match_score(&card(CardFace::Ace, CardSuit::Hearts)), 15);
        assert_eq!(match_score(&card(CardFace::Jack, CardSuit::Spades)), 15);
        assert_eq!(match_score(&card(CardFace::King, CardSuit::Diamonds)), 15);
    }

    #[test]
    fn weighted_score_rounds_and_never_drops_below_one() {
        let queen = card(CardFace::Queen, CardSuit::Hearts);
        assert_eq!(weighted_match_score(&queen, 1.8), 27);
        assert_eq!(weighted_match_score(&card(CardFace::Two, CardSuit::Hearts), 1.25), 13);
        assert_eq!(weighted_match_score(&queen, 0.0), 1);
        assert_eq!(weighted_match_score(&queen, -3.0), 1);
    }

    #[test]
    fn combo_bonus_grows_quadratically_and_caps() {
        assert_eq!(combo_bonus(0), 0);
        assert_eq!(combo_bonus(1), 0);
        assert_eq!(combo_bonus(2), 2);
        assert_eq!(combo_bonus(3), 6);
        assert_eq!(combo_bonus(4), 14);
        assert_eq!(combo_bonus(6), 38);
        assert_eq!(combo_bonus(7), 50);
        assert_eq!(combo_bonus(100), 50);
    }

    #[test]
    fn time_bonus_is_zero_when_over_time_and_capped() {
        assert_eq!(time_bonus(120.0, 120.0), 0);
        assert_eq!(time_bonus(200.0, 120.0), 0);
        assert_eq!(time_bonus(60.0, 120.0), 6);
        assert_eq!(time_bonus(0.0, 1000.0), 20);
    }

    #[test]
    fn completion_bonus_tiers() {
        assert_eq!(completion_bonus(0, 200.0, false), 100);
        assert_eq!(completion_bonus(0, 30.0, true), 230);
        assert_eq!(completion_bonus(2, 90.0, false), 65);
        assert_eq!(completion_bonus(5, 150.0, true), 40);
        assert_eq!(completion_bonus(6, 150.0, true), 0);
        assert_eq!(completion_bonus(9, 10.0, false), 30);
    }

    #[test]
    fn match_difficulty_weights_adjacent_and_special() {
        let two = card(CardFace::Two, CardSuit::Clubs);
        let three = card(CardFace::Three, CardSuit::Clubs);
        let nine = card(CardFace::Nine, CardSuit::Clubs);
        let ace = card(CardFace::Ace, CardSuit::Clubs);

        assert!((match_difficulty(&two, &three) - 1.5).abs() < 1e-9);
        assert!((match_difficulty(&two, &nine) - 1.0).abs() < 1e-9);
        assert!((match_difficulty(&ace, &two) - 1.8).abs() < 1e-9);
        assert!((match_difficulty(&ace, &nine) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn suit_bonus_only_for_same_suit() {
        let a = card(CardFace::Two, CardSuit::Clubs);
        let b = card(CardFace::Three, CardSuit::Clubs);
        let c = card(CardFace::Three, CardSuit::Hearts);
        assert_eq!(suit_match_bonus(&a, &b), SAME_SUIT_BONUS);
        assert_eq!(suit_match_bonus(&a, &c), 0);
    }
}
