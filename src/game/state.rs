use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rules;

/// 棋盘格子索引（0..9，按行排列）。
pub type CellIndex = u8;

/// 棋盘格子总数。
pub const BOARD_CELLS: usize = 9;

/// 棋子标记，双方各执一种。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Letter {
    X,
    O,
}

impl Letter {
    pub fn opponent(self) -> Self {
        match self {
            Letter::X => Letter::O,
            Letter::O => Letter::X,
        }
    }
}

impl FromStr for Letter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Letter::X),
            "O" => Ok(Letter::O),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Letter::X => write!(f, "X"),
            Letter::O => write!(f, "O"),
        }
    }
}

/// 九宫格棋盘，空格子为 `None`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub cells: [Option<Letter>; BOARD_CELLS],
}

impl Board {
    pub fn cell(&self, index: CellIndex) -> Option<Letter> {
        self.cells[usize::from(index)]
    }

    pub fn is_empty_cell(&self, index: CellIndex) -> bool {
        self.cells[usize::from(index)].is_none()
    }

    pub fn set(&mut self, index: CellIndex, letter: Letter) {
        self.cells[usize::from(index)] = Some(letter);
    }

    pub fn empty_cells(&self) -> Vec<CellIndex> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index as CellIndex)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    pub fn count(&self, letter: Letter) -> u8 {
        self.cells
            .iter()
            .filter(|cell| **cell == Some(letter))
            .count() as u8
    }

    pub fn move_count(&self) -> u8 {
        self.cells.iter().filter(|cell| cell.is_some()).count() as u8
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
        }
    }
}

/// 游戏阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    NotStarted,
    PlayerTurn,
    ComputerThinking,
    Over,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// 一局结束时的结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOutcome {
    Win {
        letter: Letter,
        line: [CellIndex; 3],
    },
    Draw,
}

/// 跨局累计的比分，只有整体重置时才清零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scoreboard {
    pub player_wins: u32,
    pub computer_wins: u32,
    pub draws: u32,
}

impl Scoreboard {
    pub fn record_win(&mut self, player_won: bool) {
        if player_won {
            self.player_wins += 1;
        } else {
            self.computer_wins += 1;
        }
    }

    pub fn record_draw(&mut self) {
        self.draws += 1;
    }

    pub fn total_games(&self) -> u32 {
        self.player_wins + self.computer_wins + self.draws
    }
}

/// 游戏事件流，供前端渲染与动画使用。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    LetterChosen {
        player: Letter,
        computer: Letter,
    },
    MoveApplied {
        letter: Letter,
        index: CellIndex,
    },
    GameWon {
        letter: Letter,
        line: [CellIndex; 3],
    },
    GameDrawn,
    BoardCleared,
    SessionReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountSkewed { x_marks: u8, o_marks: u8 },
    MissingLetters { phase: GamePhase },
    LettersNotComplementary,
    OutcomeMismatch,
}

/// 整局会话状态：棋盘、阶段、执子分配、比分与事件日志。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub phase: GamePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_letter: Option<Letter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_letter: Option<Letter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
    #[serde(default)]
    pub scoreboard: Scoreboard,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::default(),
            phase: GamePhase::NotStarted,
            player_letter: None,
            computer_letter: None,
            outcome: None,
            scoreboard: Scoreboard::default(),
            event_log: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// 玩家获胜时为 true，用于驱动前端的庆祝动画。
    pub fn celebrating(&self) -> bool {
        matches!(
            self.outcome,
            Some(GameOutcome::Win { letter, .. }) if Some(letter) == self.player_letter
        )
    }

    /// 玩家选择执子。传统规则：执 X 的一方先行，
    /// 因此玩家选 O 时直接进入电脑思考阶段。
    pub fn select_letter(&mut self, letter: Letter) -> Vec<GameEvent> {
        if self.phase != GamePhase::NotStarted {
            return Vec::new();
        }

        let computer = letter.opponent();
        self.player_letter = Some(letter);
        self.computer_letter = Some(computer);
        self.board = Board::default();
        self.outcome = None;
        self.phase = if computer == Letter::X {
            GamePhase::ComputerThinking
        } else {
            GamePhase::PlayerTurn
        };

        let event = GameEvent::LetterChosen {
            player: letter,
            computer,
        };
        self.record_event(event.clone());
        vec![event]
    }

    /// 玩家落子。非法输入（错误阶段、越界、格子已占）静默忽略，
    /// 返回空事件表示未产生任何变化。
    pub fn apply_player_move(&mut self, index: CellIndex) -> Vec<GameEvent> {
        if self.phase != GamePhase::PlayerTurn {
            return Vec::new();
        }
        let Some(letter) = self.player_letter else {
            return Vec::new();
        };
        if usize::from(index) >= BOARD_CELLS || !self.board.is_empty_cell(index) {
            return Vec::new();
        }

        self.settle_move(letter, index, GamePhase::ComputerThinking)
    }

    /// 电脑落子。索引由走子选择器给出，这里仍按原版行为
    /// 再次确认格子为空，不满足时静默忽略。
    pub fn apply_computer_move(&mut self, index: CellIndex) -> Vec<GameEvent> {
        if self.phase != GamePhase::ComputerThinking {
            return Vec::new();
        }
        let Some(letter) = self.computer_letter else {
            return Vec::new();
        };
        if usize::from(index) >= BOARD_CELLS || !self.board.is_empty_cell(index) {
            return Vec::new();
        }

        self.settle_move(letter, index, GamePhase::PlayerTurn)
    }

    fn settle_move(
        &mut self,
        letter: Letter,
        index: CellIndex,
        next_phase: GamePhase,
    ) -> Vec<GameEvent> {
        self.board.set(index, letter);
        let mut events = vec![GameEvent::MoveApplied { letter, index }];

        match rules::evaluate(&self.board) {
            Some(outcome) => {
                match outcome {
                    GameOutcome::Win {
                        letter: winner,
                        line,
                    } => {
                        self.scoreboard
                            .record_win(Some(winner) == self.player_letter);
                        events.push(GameEvent::GameWon {
                            letter: winner,
                            line,
                        });
                    }
                    GameOutcome::Draw => {
                        self.scoreboard.record_draw();
                        events.push(GameEvent::GameDrawn);
                    }
                }
                self.outcome = Some(outcome);
                self.phase = GamePhase::Over;
            }
            None => {
                self.phase = next_phase;
            }
        }

        for event in &events {
            self.record_event(event.clone());
        }
        events
    }

    /// 下一局：清空棋盘与结果，保留执子分配与比分。
    /// 电脑执 X 时由它开局。
    pub fn reset_game(&mut self) -> Vec<GameEvent> {
        if self.player_letter.is_none() {
            return Vec::new();
        }

        self.board = Board::default();
        self.outcome = None;
        self.phase = if self.computer_letter == Some(Letter::X) {
            GamePhase::ComputerThinking
        } else {
            GamePhase::PlayerTurn
        };

        let event = GameEvent::BoardCleared;
        self.record_event(event.clone());
        vec![event]
    }

    /// 整体重置：回到选子界面，比分一并清零。
    pub fn reset_all(&mut self) -> Vec<GameEvent> {
        *self = Self::new();
        let event = GameEvent::SessionReset;
        self.record_event(event.clone());
        vec![event]
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x_marks = self.board.count(Letter::X);
        let o_marks = self.board.count(Letter::O);
        // X 先行，两种标记的数量最多相差一
        if x_marks != o_marks && x_marks != o_marks + 1 {
            return Err(IntegrityError::MarkCountSkewed { x_marks, o_marks });
        }

        if self.phase != GamePhase::NotStarted {
            match (self.player_letter, self.computer_letter) {
                (Some(player), Some(computer)) => {
                    if computer != player.opponent() {
                        return Err(IntegrityError::LettersNotComplementary);
                    }
                }
                _ => {
                    return Err(IntegrityError::MissingLetters { phase: self.phase });
                }
            }
        }

        if (self.phase == GamePhase::Over) != self.outcome.is_some() {
            return Err(IntegrityError::OutcomeMismatch);
        }
        if let Some(outcome) = self.outcome {
            if rules::evaluate(&self.board) != Some(outcome) {
                return Err(IntegrityError::OutcomeMismatch);
            }
        }

        Ok(())
    }

    /// 返回一个进行中的示例对局，方便前端调试或初始化。
    pub fn sample() -> Self {
        let mut state = Self::new();
        state.select_letter(Letter::X);
        state.apply_player_move(0);
        state.apply_computer_move(4);
        state
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
