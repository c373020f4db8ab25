pub mod ai;
pub mod game;
pub mod utils;

use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    find_blocking_move, find_winning_move, minimax, strategic_moves, AiAgent, AiConfig,
    AiDecision, AiDifficulty, SearchStats, DIFFICULTY_PRESETS,
};
pub use game::{
    Board, BoardEvaluation, Cell, CellIndex, GameEvent, GameState, IntegrityError, Mark,
    PlayMoveAction, RuleEngine, RuleError, RuleResolution, Score, VictoryReason, VictoryState,
    WINNING_LINES,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_difficulty(value: Option<String>) -> AiDifficulty {
    value
        .as_deref()
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or(AiDifficulty::Medium)
}

fn resolution_json(state: &GameState, events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&RuleResolution::new(state.clone(), events)).map_err(serde_to_js_error)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

/// 面向前端的有状态引擎封装：持有当前对局、难度与累计比分。
#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    score: Score,
    difficulty: AiDifficulty,
    tallied: bool,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: Option<String>) -> GameEngine {
        GameEngine {
            state: GameState::default(),
            score: Score::default(),
            difficulty: parse_difficulty(difficulty),
            tallied: false,
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.tallied = state.outcome.is_some();
        self.state = state;
        Ok(())
    }

    pub fn score_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.score).map_err(serde_to_js_error)
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        self.difficulty = AiDifficulty::from_str(difficulty)
            .map_err(|_| JsValue::from_str(&format!("unknown difficulty: {difficulty}")))?;
        Ok(())
    }

    /// 当前行棋方落子。非法落子记录警告后原样拒绝，状态不变。
    pub fn play_move(&mut self, index: usize) -> Result<String, JsValue> {
        let action = PlayMoveAction {
            mark: self.state.current_player,
            index,
        };
        let mut engine = RuleEngine::new();
        let events = engine.play_move(&mut self.state, action).map_err(|error| {
            utils::console_warn(&format!("rejected move at {index}: {error:?}"));
            to_js_error(error)
        })?;
        self.tally_outcome();
        resolution_json(&self.state, events)
    }

    /// 按当前难度计算电脑着法并立即应用。
    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let mut agent = AiAgent::new(AiConfig::from_difficulty(self.difficulty));
        let decision = agent
            .decide_move(&self.state.board, self.state.current_player)
            .map_err(to_js_error)?;

        let action = PlayMoveAction {
            mark: self.state.current_player,
            index: decision.index,
        };
        let mut engine = RuleEngine::new();
        let events = engine.play_move(&mut self.state, action).map_err(to_js_error)?;
        self.tally_outcome();

        let response = AiMoveResponse {
            decision,
            applied: Some(RuleResolution::new(self.state.clone(), events)),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 延迟 `delay_ms` 后计算电脑着法（不应用）。延迟只是表现层的
    /// "思考时间"，不会影响算出的着法。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.state.board;
        let mark = self.state.current_player;
        let difficulty = self.difficulty;
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(AiConfig::from_difficulty(difficulty));
            let decision = agent.decide_move(&board, mark).map_err(to_js_error)?;
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    /// 开新一局，累计比分保留。
    pub fn new_game(&mut self) -> Result<String, JsValue> {
        self.state.reset_board();
        self.tallied = false;
        self.state_json()
    }

    pub fn reset_score(&mut self) {
        self.score.reset();
    }

    fn tally_outcome(&mut self) {
        if self.tallied {
            return;
        }
        if let Some(outcome) = self.state.outcome.clone() {
            self.score.record(&outcome);
            self.tallied = true;
        }
    }
}

/// 返回一个全新的空盘局面。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::default()).map_err(JsValue::from)
}

/// 将传入的局面深拷贝后返回。
#[wasm_bindgen(js_name = "cloneGameState")]
pub fn clone_game_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

/// 评估棋盘：胜者、是否平局、是否终局以及剩余空位。
#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&board.evaluate()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move(state: JsValue, action: JsValue) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let action: PlayMoveAction = from_value(action).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.play_move(&mut state, action) {
        Ok(events) => to_value(&RuleResolution::new(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "checkVictory")]
pub fn check_victory(state: JsValue) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let outcome = RuleEngine::check_victory(&mut state);
    to_value(&outcome).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

/// 无状态计算电脑着法；`seed` 可固定随机序列方便复现。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    state: JsValue,
    difficulty: Option<String>,
    seed: Option<u32>,
) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let config = AiConfig::from_difficulty(parse_difficulty(difficulty));
    let mut agent = match seed {
        Some(seed) => AiAgent::with_seed(config, u64::from(seed)),
        None => AiAgent::new(config),
    };
    let decision = agent
        .decide_move(&state.board, state.current_player)
        .map_err(to_js_error)?;
    to_value(&decision).map_err(JsValue::from)
}

/// 难度选择器使用的完整配置表。
#[wasm_bindgen(js_name = "difficultyPresets")]
pub fn difficulty_presets() -> Result<JsValue, JsValue> {
    to_value(&*DIFFICULTY_PRESETS).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
