use serde::{Deserialize, Serialize};

use super::state::{Board, CellIndex, GameEvent, GameOutcome, GameState, Letter};

/// 八条可能的获胜连线：三行、三列、两条对角线。
pub const LINES: [[CellIndex; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 终局判定。按固定顺序扫描八条连线，取第一条成线的；
/// 无人成线且棋盘已满则为平局，否则对局继续。
pub fn evaluate(board: &Board) -> Option<GameOutcome> {
    for line in LINES {
        let [a, b, c] = line;
        if let Some(letter) = board.cell(a) {
            if board.cell(b) == Some(letter) && board.cell(c) == Some(letter) {
                return Some(GameOutcome::Win { letter, line });
            }
        }
    }

    if board.is_full() {
        Some(GameOutcome::Draw)
    } else {
        None
    }
}

/// 在棋盘副本上逐一试走，返回能让 `letter` 立即获胜的
/// 第一个空格子。走子选择器用它做一步前瞻。
pub fn winning_cell(board: &Board, letter: Letter) -> Option<CellIndex> {
    for index in board.empty_cells() {
        let mut probe = *board;
        probe.set(index, letter);
        if matches!(
            evaluate(&probe),
            Some(GameOutcome::Win { letter: winner, .. }) if winner == letter
        ) {
            return Some(index);
        }
    }
    None
}

/// 每次操作后交给前端的完整快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    pub celebrating: bool,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome;
        let celebrating = state.celebrating();
        Self {
            state,
            events,
            outcome,
            celebrating,
        }
    }
}
