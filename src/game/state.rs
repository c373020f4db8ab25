use serde::{Deserialize, Serialize};

/// 棋盘格子索引（0-8，按行优先排列）。
pub type CellIndex = usize;

/// 所有获胜连线：3 行、3 列、2 条对角线。
pub const WINNING_LINES: [[CellIndex; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 玩家标记。人类执 X 先行，电脑执 O。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// 单个格子：空位或某一方的标记。
pub type Cell = Option<Mark>;

/// 3x3 棋盘。值类型，落子永远产生新棋盘而不修改原值，
/// 搜索过程因此无需悔棋逻辑。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Board(pub [Cell; 9]);

impl Board {
    pub fn empty() -> Self {
        Board([None; 9])
    }

    pub fn cell(&self, index: CellIndex) -> Cell {
        self.0.get(index).copied().flatten()
    }

    pub fn in_bounds(index: CellIndex) -> bool {
        index < 9
    }

    /// 扫描 8 条连线，返回获胜方及其连线。
    pub fn winning_line(&self) -> Option<(Mark, [CellIndex; 3])> {
        for line in WINNING_LINES {
            let [a, b, c] = line;
            if let Some(mark) = self.0[a] {
                if self.0[b] == Some(mark) && self.0[c] == Some(mark) {
                    return Some((mark, line));
                }
            }
        }
        None
    }

    pub fn winner(&self) -> Option<Mark> {
        self.winning_line().map(|(mark, _)| mark)
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|cell| cell.is_some())
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some() || self.is_full()
    }

    /// 所有空位索引，按升序排列。顺序会影响同分落子与搜索展开的先后。
    pub fn available_moves(&self) -> Vec<CellIndex> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.0.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn evaluate(&self) -> BoardEvaluation {
        let winner = self.winner();
        let is_draw = winner.is_none() && self.is_full();
        BoardEvaluation {
            winner,
            is_draw,
            is_game_over: winner.is_some() || is_draw,
            available_moves: self.available_moves(),
        }
    }
}

/// 棋盘的派生评估结果，提供给前端展示。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEvaluation {
    pub winner: Option<Mark>,
    pub is_draw: bool,
    pub is_game_over: bool,
    pub available_moves: Vec<CellIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum VictoryReason {
    LineCompleted { line: [CellIndex; 3] },
    BoardFull,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VictoryState {
    pub winner: Option<Mark>,
    pub reason: VictoryReason,
}

impl VictoryState {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MovePlaced { index: CellIndex, mark: Mark },
    GameWon { winner: Mark, line: [CellIndex; 3] },
    GameDrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkCountSkew { x: usize, o: usize },
    StaleOutcome,
    MissingOutcome,
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    #[serde(default)]
    pub board: Board,
    pub current_player: Mark,
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryState>,
}

impl GameState {
    pub fn new(first_player: Mark) -> Self {
        Self {
            board: Board::empty(),
            current_player: first_player,
            turn: 1,
            event_log: Vec::new(),
            outcome: None,
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn advance_turn(&mut self) {
        self.current_player = self.current_player.opponent();
        self.turn += 1;
    }

    /// 开新一局：清空棋盘与事件，X 重新先行。累计比分由调用方另行保管。
    pub fn reset_board(&mut self) {
        self.board = Board::empty();
        self.current_player = Mark::X;
        self.turn = 1;
        self.event_log.clear();
        self.outcome = None;
    }

    /// 根据当前棋盘判定胜负。已有结果时直接返回，不重复宣告。
    pub fn evaluate_victory(&mut self) -> Option<VictoryState> {
        if let Some(outcome) = &self.outcome {
            return Some(outcome.clone());
        }

        if let Some((winner, line)) = self.board.winning_line() {
            return Some(self.declare_victory(Some(winner), VictoryReason::LineCompleted { line }));
        }

        if self.board.is_full() {
            return Some(self.declare_victory(None, VictoryReason::BoardFull));
        }

        None
    }

    pub fn declare_victory(&mut self, winner: Option<Mark>, reason: VictoryReason) -> VictoryState {
        let victory = VictoryState { winner, reason };
        if self.outcome.is_none() {
            match &victory {
                VictoryState {
                    winner: Some(mark),
                    reason: VictoryReason::LineCompleted { line },
                } => self.record_event(GameEvent::GameWon {
                    winner: *mark,
                    line: *line,
                }),
                _ => self.record_event(GameEvent::GameDrawn),
            }
            self.outcome = Some(victory.clone());
        }
        victory
    }

    /// 校验状态一致性：X 先行的合法对局里 #X == #O 或 #X == #O + 1，
    /// outcome 标志必须与棋盘实际局面一致。
    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x = self.board.0.iter().filter(|c| **c == Some(Mark::X)).count();
        let o = self.board.0.iter().filter(|c| **c == Some(Mark::O)).count();
        if x != o && x != o + 1 {
            return Err(IntegrityError::MarkCountSkew { x, o });
        }
        if self.outcome.is_some() && !self.board.is_game_over() {
            return Err(IntegrityError::StaleOutcome);
        }
        if self.outcome.is_none() && self.board.winner().is_some() {
            return Err(IntegrityError::MissingOutcome);
        }
        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(Mark::X)
    }
}

/// 累计比分，跨局保留，由前端决定何时清零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub player_wins: u32,
    pub computer_wins: u32,
    pub draws: u32,
}

impl Score {
    pub fn record(&mut self, outcome: &VictoryState) {
        match outcome.winner {
            Some(Mark::X) => self.player_wins += 1,
            Some(Mark::O) => self.computer_wins += 1,
            None => self.draws += 1,
        }
    }

    pub fn reset(&mut self) {
        *self = Score::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Cell = Some(Mark::X);
    const O: Cell = Some(Mark::O);
    const E: Cell = None;

    #[test]
    fn empty_board_has_no_winner_and_nine_moves() {
        let board = Board::empty();
        assert_eq!(board.winner(), None);
        assert!(!board.is_full());
        assert!(!board.is_game_over());
        assert_eq!(board.available_moves(), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn detects_row_column_and_diagonal_wins() {
        let row = Board([X, X, X, O, O, E, E, E, E]);
        assert_eq!(row.winning_line(), Some((Mark::X, [0, 1, 2])));

        let column = Board([O, X, E, O, X, E, O, E, X]);
        assert_eq!(column.winning_line(), Some((Mark::O, [0, 3, 6])));

        let diagonal = Board([X, O, O, E, X, E, E, E, X]);
        assert_eq!(diagonal.winning_line(), Some((Mark::X, [0, 4, 8])));
    }

    #[test]
    fn winner_occupies_exactly_one_line() {
        let board = Board([X, X, X, O, O, E, E, E, E]);
        let lines = WINNING_LINES
            .iter()
            .filter(|line| line.iter().all(|&i| board.cell(i) == Some(Mark::X)))
            .count();
        assert_eq!(lines, 1);
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        let board = Board([X, O, X, X, O, O, O, X, X]);
        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        let evaluation = board.evaluate();
        assert!(evaluation.is_draw);
        assert!(evaluation.is_game_over);
        assert!(evaluation.available_moves.is_empty());
    }

    #[test]
    fn available_plus_occupied_is_always_nine() {
        let boards = [
            Board::empty(),
            Board([X, E, E, E, O, E, E, E, E]),
            Board([X, O, X, X, O, O, O, X, X]),
        ];
        for board in boards {
            assert_eq!(board.available_moves().len() + board.occupied_count(), 9);
        }
    }

    #[test]
    fn evaluate_victory_records_win_event_once() {
        let mut state = GameState::default();
        state.board = Board([X, X, X, O, O, E, E, E, E]);
        let outcome = state.evaluate_victory().expect("game should be over");
        assert_eq!(outcome.winner, Some(Mark::X));
        // 再次判定不应重复记录事件
        state.evaluate_victory();
        let won_events = state
            .event_log
            .iter()
            .filter(|event| matches!(event, GameEvent::GameWon { .. }))
            .count();
        assert_eq!(won_events, 1);
    }

    #[test]
    fn reset_board_keeps_score_untouched() {
        let mut state = GameState::default();
        let mut score = Score::default();
        state.board = Board([X, X, X, O, O, E, E, E, E]);
        let outcome = state.evaluate_victory().expect("game should be over");
        score.record(&outcome);
        state.reset_board();
        assert_eq!(state.board, Board::empty());
        assert_eq!(state.current_player, Mark::X);
        assert!(state.outcome.is_none());
        assert_eq!(score.player_wins, 1);
    }

    #[test]
    fn integrity_check_flags_mark_skew_and_stale_outcome() {
        let mut state = GameState::default();
        state.board = Board([X, X, E, E, E, E, E, E, E]);
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::MarkCountSkew { x: 2, o: 0 })
        );

        let mut stale = GameState::default();
        stale.declare_victory(Some(Mark::X), VictoryReason::LineCompleted { line: [0, 1, 2] });
        assert_eq!(stale.integrity_check(), Err(IntegrityError::StaleOutcome));
    }

    #[test]
    fn board_serializes_as_flat_array() {
        let board = Board([X, E, E, E, O, E, E, E, E]);
        let json = serde_json::to_string(&board).expect("serialize");
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);
        let back: Board = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, board);
    }

    #[test]
    fn score_tallies_each_outcome_kind() {
        let mut score = Score::default();
        score.record(&VictoryState {
            winner: Some(Mark::X),
            reason: VictoryReason::LineCompleted { line: [0, 1, 2] },
        });
        score.record(&VictoryState {
            winner: Some(Mark::O),
            reason: VictoryReason::LineCompleted { line: [0, 3, 6] },
        });
        score.record(&VictoryState {
            winner: None,
            reason: VictoryReason::BoardFull,
        });
        assert_eq!(
            (score.player_wins, score.computer_wins, score.draws),
            (1, 1, 1)
        );
    }
}
