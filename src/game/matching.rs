//! 匹配规则：两张牌的点数相差 1 即可匹配，与花色和朝向无关。

use super::state::{Card, CardId};

/// 两张牌的点数差（绝对值）。
pub fn face_difference(a: &Card, b: &Card) -> i32 {
    (a.face.ordinal() - b.face.ordinal()).abs()
}

pub fn can_match(a: &Card, b: &Card) -> bool {
    face_difference(a, b) == 1
}

/// 候选牌中所有能与 `target` 匹配的牌 ID，保持候选顺序。
pub fn find_matchable(target: &Card, candidates: &[Card]) -> Vec<CardId> {
    candidates
        .iter()
        .filter(|candidate| can_match(target, candidate))
        .map(|candidate| candidate.id)
        .collect()
}

/// 手牌与桌面之间是否存在任意一对可匹配的牌。
///
/// 只用于终局判定；实际出牌只会使用手牌顶。
pub fn has_any_possible_match(hand: &[Card], playfield: &[Card]) -> bool {
    hand.iter()
        .any(|hand_card| playfield.iter().any(|card| can_match(hand_card, card)))
}
