//! 游戏核心逻辑模块（状态机、终局判定等）。

pub mod rules;
pub mod state;

pub use rules::{evaluate, winning_cell, RuleResolution, LINES};
pub use state::{
    Board,
    CellIndex,
    GameEvent,
    GameOutcome,
    GamePhase,
    GameState,
    IntegrityError,
    Letter,
    Scoreboard,
    BOARD_CELLS,
};
