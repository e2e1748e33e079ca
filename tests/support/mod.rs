//! 集成测试共用的辅助函数。

use match_solitaire::{CardConfig, CardFace, CardSuit, LevelConfig, Position};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// 只初始化一次测试日志。级别依次取 `TEST_LOG`、`RUST_LOG`，默认 `warn`。
pub fn init_logging() {
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// 由 `(牌面, 花色)` 列表构造关卡，`stack` 的最后一张成为手牌顶。
pub fn level(stack: &[(CardFace, CardSuit)], playfield: &[(CardFace, CardSuit)]) -> LevelConfig {
    let to_configs = |cards: &[(CardFace, CardSuit)]| {
        cards
            .iter()
            .map(|&(face, suit)| CardConfig::new(face, suit, Position::default()))
            .collect()
    };
    LevelConfig {
        stack: to_configs(stack),
        playfield: to_configs(playfield),
    }
}
