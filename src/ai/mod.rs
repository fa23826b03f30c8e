//! AI 模块：带分层随机性的启发式电脑对手。

pub mod heuristic;

pub use heuristic::{HeuristicAgent, MoveDecision, SelectionStage, SelectorConfig};
