//! 游戏核心逻辑模块（棋盘状态、规则引擎等）。

pub mod rules;
pub mod state;

pub use rules::{PlayMoveAction, RuleEngine, RuleError, RuleResolution};
pub use state::{
    Board, BoardEvaluation, Cell, CellIndex, GameEvent, GameState, IntegrityError, Mark, Score,
    VictoryReason, VictoryState, WINNING_LINES,
};
