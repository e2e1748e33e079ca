pub mod game;
pub mod utils;

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use std::fmt::Display;
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

pub use game::{
    can_match, find_matchable, has_any_possible_match, Card, CardConfig, CardFace, CardId,
    CardMotion, CardSuit, DealtLevel, EndCondition, GameEvent, GameSession, GameState,
    GameStatus, GameSummary, HistoryManager, HistorySnapshot, IntegrityError, LevelConfig,
    LevelError, LevelSet, LevelSource, MoveError, Position, RuleEngine, RuleResolution,
    SessionConfig,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn report_callback_error(error: JsValue) {
    web_sys::console::error_2(&"game callback failed:".into(), &error);
}

/// 关卡 JSON 可以是单个关卡，也可以是按顺序排列的关卡数组。
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelInput {
    Many(Vec<LevelConfig>),
    One(LevelConfig),
}

fn parse_levels(json: &str) -> Result<Box<dyn LevelSource>, JsValue> {
    let input: LevelInput = serde_json::from_str(json).map_err(|err| {
        to_js_error(LevelError::Parse {
            message: err.to_string(),
        })
    })?;
    let levels: Box<dyn LevelSource> = match input {
        LevelInput::Many(levels) => Box::new(LevelSet::new(levels)),
        LevelInput::One(level) => Box::new(level),
    };
    Ok(levels)
}

fn parse_config(config_json: Option<String>) -> Result<SessionConfig, JsValue> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error),
        None => Ok(SessionConfig::default()),
    }
}

/// 供 JS 表现层驱动的对局。表现层只持有这个句柄，会话通过注册的回调反向通知。
#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(
        level_json: Option<String>,
        config_json: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let config = parse_config(config_json)?;
        let levels: Box<dyn LevelSource> = match level_json {
            Some(json) => parse_levels(&json)?,
            None => Box::new(LevelConfig::fallback()),
        };
        let mut session = GameSession::new(levels, config);
        session.start_new_game();
        Ok(GameEngine { session })
    }

    /// 使用随机发牌的关卡，同一种子总是得到同样的关卡序列。
    #[wasm_bindgen(js_name = "withDealtLevels")]
    pub fn with_dealt_levels(
        seed: u32,
        config_json: Option<String>,
    ) -> Result<GameEngine, JsValue> {
        let config = parse_config(config_json)?;
        let mut session = GameSession::new(Box::new(DealtLevel::new(u64::from(seed))), config);
        session.start_new_game();
        Ok(GameEngine { session })
    }

    #[wasm_bindgen(js_name = "onHandCardClicked")]
    pub fn on_hand_card_clicked(&mut self, card_id: CardId) -> bool {
        self.session.on_hand_card_clicked(card_id)
    }

    #[wasm_bindgen(js_name = "onPlayfieldCardClicked")]
    pub fn on_playfield_card_clicked(&mut self, card_id: CardId) -> bool {
        self.session.on_playfield_card_clicked(card_id)
    }

    #[wasm_bindgen(js_name = "onUndoClicked")]
    pub fn on_undo_clicked(&mut self) -> bool {
        self.session.on_undo_clicked()
    }

    #[wasm_bindgen(js_name = "canUndo")]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = "startNewGame")]
    pub fn start_new_game(&mut self) {
        self.session.start_new_game();
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = "nextLevel")]
    pub fn next_level(&mut self) {
        self.session.next_level();
    }

    #[wasm_bindgen(js_name = "setMaxUndoDepth")]
    pub fn set_max_undo_depth(&mut self, depth: usize) {
        self.session.set_max_undo_depth(depth);
    }

    #[wasm_bindgen(js_name = "comboCount")]
    pub fn combo_count(&self) -> u32 {
        self.session.combo_count()
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.state()).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "summaryJson")]
    pub fn summary_json(&self, elapsed_secs: f64) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.summary(elapsed_secs)).map_err(serde_to_js_error)
    }

    /// 回调参数：`(hand, playfield)`，均为卡牌数组。
    ///
    /// 回调在引擎方法内部同步执行，不能直接再调用本引擎的方法，需要时请延后（如 `setTimeout`）。
    #[wasm_bindgen(js_name = "setRefreshCallback")]
    pub fn set_refresh_callback(&mut self, callback: Function) {
        self.session.set_refresh_callback(move |hand, playfield| {
            let hand = to_value(&hand).unwrap_or(JsValue::NULL);
            let playfield = to_value(&playfield).unwrap_or(JsValue::NULL);
            if let Err(err) = callback.call2(&JsValue::NULL, &hand, &playfield) {
                report_callback_error(err);
            }
        });
    }

    /// 回调参数：`{type: "HandToTop" | "PlayfieldToHand", card_id}`。
    #[wasm_bindgen(js_name = "setMotionCallback")]
    pub fn set_motion_callback(&mut self, callback: Function) {
        self.session.set_motion_callback(move |motion| {
            let motion = to_value(&motion).unwrap_or(JsValue::NULL);
            if let Err(err) = callback.call1(&JsValue::NULL, &motion) {
                report_callback_error(err);
            }
        });
    }

    /// 回调参数：是否获胜。
    ///
    /// 与刷新回调一样不能同步重入引擎：在回调里直接调用 `startNewGame` 会因重复借用而失败，
    /// 错误只会打印到控制台。请延后到下一个任务再开新局。
    #[wasm_bindgen(js_name = "setGameEndCallback")]
    pub fn set_game_end_callback(&mut self, callback: Function) {
        self.session.set_game_end_callback(move |won| {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_bool(won)) {
                report_callback_error(err);
            }
        });
    }
}

/// 返回一个示例游戏状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "canMatch")]
pub fn can_match_js(a: JsValue, b: JsValue) -> Result<bool, JsValue> {
    let a: Card = from_value(a).map_err(JsValue::from)?;
    let b: Card = from_value(b).map_err(JsValue::from)?;
    Ok(can_match(&a, &b))
}

#[wasm_bindgen(js_name = "matchScore")]
pub fn match_score_js(card: JsValue) -> Result<u32, JsValue> {
    let card: Card = from_value(card).map_err(JsValue::from)?;
    Ok(game::scoring::match_score(&card))
}

#[wasm_bindgen(js_name = "replaceTopOfHand")]
pub fn replace_top_of_hand(state: JsValue, card_id: CardId) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    match RuleEngine::replace_top_of_hand(&mut state, card_id) {
        Ok(events) => to_value(&resolve(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "executeMatch")]
pub fn execute_match(state: JsValue, card_id: CardId) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    match RuleEngine::execute_match(&mut state, card_id) {
        Ok(events) => to_value(&resolve(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "classifyEndCondition")]
pub fn classify_end_condition(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    to_value(&RuleEngine::classify_end_condition(&state)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state.integrity_check().map_err(to_js_error)
}

fn resolve(mut state: GameState, mut events: Vec<GameEvent>) -> RuleResolution {
    events.extend(RuleEngine::apply_end_condition(&mut state));
    RuleResolution::new(state, events)
}
