//! 进程级工具：卡牌 ID 分配与 panic 钩子。

use std::sync::atomic::{AtomicU32, Ordering};

use crate::game::CardId;

static NEXT_CARD_ID: AtomicU32 = AtomicU32::new(1);

/// 分配一个新的卡牌 ID。从 1 开始单调递增，进程内不会重复。
pub fn next_card_id() -> CardId {
    NEXT_CARD_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}
