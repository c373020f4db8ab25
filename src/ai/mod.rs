//! AI 对手模块（战术启发与极小极大搜索）。

pub mod minimax;

pub use minimax::{
    find_blocking_move, find_winning_move, minimax, strategic_moves, AiAgent, AiConfig,
    AiDecision, AiDifficulty, SearchStats, DIFFICULTY_PRESETS,
};
