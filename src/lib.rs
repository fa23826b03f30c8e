pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{HeuristicAgent, MoveDecision, SelectionStage, SelectorConfig};
pub use game::{
    evaluate, winning_cell, Board, CellIndex, GameEvent, GameOutcome, GamePhase, GameState,
    IntegrityError, Letter, RuleResolution, Scoreboard, BOARD_CELLS, LINES,
};

/// 电脑"思考"动画的默认时长（毫秒）。
pub const DEFAULT_THINK_DELAY_MS: u32 = 600;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn integrity_to_js_error(error: IntegrityError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn resolution_json(state: &GameState, events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&RuleResolution::new(state.clone(), events)).map_err(serde_to_js_error)
}

#[derive(Serialize)]
struct ComputerMoveResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<MoveDecision>,
    resolution: RuleResolution,
}

/// 面向前端的游戏引擎：持有会话状态与电脑对手，
/// 所有方法以 JSON 往返。
#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    agent: HeuristicAgent,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = match initial_state_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => GameState::new(),
        };
        Ok(GameEngine {
            state,
            agent: HeuristicAgent::new(SelectorConfig::default()),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    /// 玩家选择执子（"X" 或 "O"）。
    pub fn select_letter(&mut self, letter: &str) -> Result<String, JsValue> {
        let letter =
            Letter::from_str(letter).map_err(|_| JsValue::from_str("unknown letter"))?;
        let events = self.state.select_letter(letter);
        resolution_json(&self.state, events)
    }

    /// 玩家点击某个格子。非法点击返回无事件的快照。
    pub fn play_cell(&mut self, index: u8) -> Result<String, JsValue> {
        let events = self.state.apply_player_move(index);
        resolution_json(&self.state, events)
    }

    /// 执行电脑回合：调用走子选择器并落子。
    /// 只在思考阶段生效，其余阶段原样返回快照。
    pub fn play_computer_turn(&mut self) -> Result<String, JsValue> {
        let response = match (
            self.state.phase,
            self.state.computer_letter,
            self.state.player_letter,
        ) {
            (GamePhase::ComputerThinking, Some(own), Some(opponent)) => {
                let decision = self.agent.select_move(&self.state.board, own, opponent);
                let events = self.state.apply_computer_move(decision.index);
                ComputerMoveResponse {
                    decision: Some(decision),
                    resolution: RuleResolution::new(self.state.clone(), events),
                }
            }
            _ => ComputerMoveResponse {
                decision: None,
                resolution: RuleResolution::new(self.state.clone(), Vec::new()),
            },
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 返回一个在指定延迟后兑现的 Promise，模拟电脑思考。
    /// 兑现值表示当前是否确实处于思考阶段；期间玩家输入
    /// 会被 `play_cell` 的阶段守卫拒绝，因此同一时刻最多
    /// 只有一个待执行的电脑回合。
    pub fn think_computer_turn(&self, delay_ms: Option<u32>) -> Promise {
        let thinking = self.state.phase == GamePhase::ComputerThinking;
        let delay = delay_ms.unwrap_or(DEFAULT_THINK_DELAY_MS);
        future_to_promise(async move {
            if thinking && delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            Ok(JsValue::from_bool(thinking))
        })
    }

    /// 下一局（保留比分与执子）。
    pub fn reset_game(&mut self) -> Result<String, JsValue> {
        let events = self.state.reset_game();
        resolution_json(&self.state, events)
    }

    /// 整体重置（清空比分，回到选子界面）。
    pub fn reset_all(&mut self) -> Result<String, JsValue> {
        let events = self.state.reset_all();
        resolution_json(&self.state, events)
    }

    pub fn celebrating(&self) -> bool {
        self.state.celebrating()
    }

    pub fn phase(&self) -> Result<JsValue, JsValue> {
        to_value(&self.state.phase).map_err(JsValue::from)
    }
}

/// 返回一个进行中的示例对局，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

/// 将传入的游戏状态进行深拷贝后返回。
#[wasm_bindgen(js_name = "cloneGameState")]
pub fn clone_game_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

/// 纯终局判定：返回胜负/平局结果，进行中返回 null。
#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

/// 不落子地预览电脑的走子决策。传入种子可复现结果。
#[wasm_bindgen(js_name = "computeMove")]
pub fn compute_move(state: JsValue, seed: Option<u64>) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let (own, opponent) = match (state.computer_letter, state.player_letter) {
        (Some(own), Some(opponent)) => (own, opponent),
        _ => return Err(JsValue::from_str("letters are not assigned")),
    };
    if state.board.is_full() || state.is_finished() {
        return Err(JsValue::from_str("game is already terminal"));
    }

    let config = SelectorConfig::default();
    let mut agent = match seed {
        Some(seed) => HeuristicAgent::with_seed(config, seed),
        None => HeuristicAgent::new(config),
    };
    let decision = agent.select_move(&state.board, own, opponent);
    to_value(&decision).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state.integrity_check().map_err(integrity_to_js_error)
}
