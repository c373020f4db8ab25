use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{Board, CellIndex, Mark, RuleEngine, RuleError};

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy)]
struct WasmInstant {
    timestamp: f64,
}

impl WasmInstant {
    fn now() -> Self {
        Self { timestamp: now_ms() }
    }

    fn elapsed(&self) -> Duration {
        let elapsed_ms = (now_ms() - self.timestamp).max(0.0);
        Duration::from_millis(elapsed_ms as u64)
    }
}

/// 电脑对手的三档难度。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 难度配置：展示名、描述以及触发聪明着法的概率。
/// Hard 始终走完整搜索，不消费这个概率。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    pub name: String,
    pub description: String,
    pub smart_move_chance: f64,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                difficulty,
                name: "Easy".into(),
                description: "Random moves with basic blocking".into(),
                smart_move_chance: 0.3,
            },
            AiDifficulty::Medium => Self {
                difficulty,
                name: "Medium".into(),
                description: "Strategic play with win/block detection".into(),
                smart_move_chance: 0.7,
            },
            AiDifficulty::Hard => Self {
                difficulty,
                name: "Hard".into(),
                description: "Optimal play using minimax algorithm".into(),
                smart_move_chance: 1.0,
            },
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Medium)
    }
}

/// 供前端难度选择器使用的完整配置表。
pub static DIFFICULTY_PRESETS: Lazy<Vec<AiConfig>> = Lazy::new(|| {
    vec![
        AiConfig::from_difficulty(AiDifficulty::Easy),
        AiConfig::from_difficulty(AiDifficulty::Medium),
        AiConfig::from_difficulty(AiDifficulty::Hard),
    ]
});

/// 一次决策的结果与搜索统计。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    pub index: CellIndex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    pub nodes: u64,
    pub depth_reached: u8,
    pub duration_ms: u64,
    pub difficulty: AiDifficulty,
}

#[derive(Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub depth_reached: u8,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 找出 `mark` 一步制胜的落点：按升序逐个试落并检查连线。
pub fn find_winning_move(board: &Board, mark: Mark) -> Option<CellIndex> {
    for index in board.available_moves() {
        let Ok(next) = RuleEngine::apply_move(board, index, mark) else {
            continue;
        };
        if next.winner() == Some(mark) {
            return Some(index);
        }
    }
    None
}

/// 找出必须封堵的落点，即对手的一步制胜点。
pub fn find_blocking_move(board: &Board, mark: Mark) -> Option<CellIndex> {
    find_winning_move(board, mark.opponent())
}

/// 位置偏好排序：中心 > 四角 > 四边，同类内固定顺序。
pub fn strategic_moves(board: &Board) -> Vec<CellIndex> {
    const CENTER: CellIndex = 4;
    const CORNERS: [CellIndex; 4] = [0, 2, 6, 8];
    const EDGES: [CellIndex; 4] = [1, 3, 5, 7];

    let available = board.available_moves();
    let mut ordered = Vec::with_capacity(available.len());
    if available.contains(&CENTER) {
        ordered.push(CENTER);
    }
    for corner in CORNERS {
        if available.contains(&corner) {
            ordered.push(corner);
        }
    }
    for edge in EDGES {
        if available.contains(&edge) {
            ordered.push(edge);
        }
    }
    ordered
}

/// 带 alpha-beta 剪枝的极小极大搜索，`ai_mark` 为极大化一方。
///
/// 终局评分带深度修正：赢得越早分越高（10 - depth），输得越晚分越高
/// （depth - 10），平局恒为 0。同分着法取升序枚举中最先出现的那个，
/// 因此 Hard 档对同一局面的选择是确定的。
pub fn minimax(
    board: &Board,
    ai_mark: Mark,
    depth: u8,
    is_maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    stats: &mut SearchStats,
) -> (i32, Option<CellIndex>) {
    stats.nodes += 1;
    if depth > stats.depth_reached {
        stats.depth_reached = depth;
    }

    if let Some(winner) = board.winner() {
        let score = if winner == ai_mark {
            10 - depth as i32
        } else {
            depth as i32 - 10
        };
        return (score, None);
    }
    if board.is_full() {
        return (0, None);
    }

    let mover = if is_maximizing {
        ai_mark
    } else {
        ai_mark.opponent()
    };
    let mut best_move = None;

    if is_maximizing {
        let mut best_score = i32::MIN;
        for index in board.available_moves() {
            let Ok(next) = RuleEngine::apply_move(board, index, mover) else {
                continue;
            };
            let (score, _) = minimax(&next, ai_mark, depth + 1, false, alpha, beta, stats);
            if score > best_score {
                best_score = score;
                best_move = Some(index);
            }
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        (best_score, best_move)
    } else {
        let mut best_score = i32::MAX;
        for index in board.available_moves() {
            let Ok(next) = RuleEngine::apply_move(board, index, mover) else {
                continue;
            };
            let (score, _) = minimax(&next, ai_mark, depth + 1, true, alpha, beta, stats);
            if score < best_score {
                best_score = score;
                best_move = Some(index);
            }
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        (best_score, best_move)
    }
}

/// 电脑棋手。Easy/Medium 依赖随机源，Hard 完全确定。
pub struct AiAgent<R: Rng = SmallRng> {
    config: AiConfig,
    rng: R,
}

impl AiAgent<SmallRng> {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> AiAgent<R> {
    /// 注入自定义随机源，测试时可用确定序列替代真随机。
    pub fn with_rng(config: AiConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 按当前难度为 `mark` 选择一手棋。棋盘上必须还有空位。
    pub fn decide_move(&mut self, board: &Board, mark: Mark) -> Result<AiDecision, RuleError> {
        let start = WasmInstant::now();
        let available = board.available_moves();
        if available.is_empty() {
            return Err(RuleError::NoAvailableMoves);
        }

        let mut stats = SearchStats::new();
        let (index, score) = match self.config.difficulty {
            AiDifficulty::Easy => (self.easy_move(board, mark, &available), None),
            AiDifficulty::Medium => (self.medium_move(board, mark, &available), None),
            AiDifficulty::Hard => self.hard_move(board, mark, &available, &mut stats),
        };

        Ok(AiDecision {
            index,
            score,
            nodes: stats.nodes,
            depth_reached: stats.depth_reached,
            duration_ms: start.elapsed().as_millis() as u64,
            difficulty: self.config.difficulty,
        })
    }

    fn easy_move(&mut self, board: &Board, mark: Mark, available: &[CellIndex]) -> CellIndex {
        let roll = self.rng.gen::<f64>();
        if roll < self.config.smart_move_chance {
            if let Some(index) = find_winning_move(board, mark) {
                return index;
            }
            if let Some(index) = find_blocking_move(board, mark) {
                return index;
            }
            // 点数命中但无战术着法：直接落入随机，不重掷
        }
        self.random_move(available)
    }

    fn medium_move(&mut self, board: &Board, mark: Mark, available: &[CellIndex]) -> CellIndex {
        if let Some(index) = find_winning_move(board, mark) {
            return index;
        }
        if let Some(index) = find_blocking_move(board, mark) {
            return index;
        }
        if self.rng.gen::<f64>() < self.config.smart_move_chance {
            if let Some(index) = strategic_moves(board).first().copied() {
                return index;
            }
        }
        self.random_move(available)
    }

    fn hard_move(
        &mut self,
        board: &Board,
        mark: Mark,
        available: &[CellIndex],
        stats: &mut SearchStats,
    ) -> (CellIndex, Option<i32>) {
        let (score, best) = minimax(board, mark, 0, true, i32::MIN, i32::MAX, stats);
        // 非终局局面搜索必有着法，保险起见退回首个空位
        (best.unwrap_or(available[0]), Some(score))
    }

    fn random_move(&mut self, available: &[CellIndex]) -> CellIndex {
        available
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(available[0])
    }
}
