use serde::{Deserialize, Serialize};

use super::state::{
    Board, CellIndex, GameEvent, GameState, IntegrityError, Mark, VictoryState,
};

/// 一次落子请求。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayMoveAction {
    pub mark: Mark,
    pub index: CellIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    NotPlayerTurn {
        expected: Mark,
        actual: Mark,
    },
    OutOfBounds {
        index: CellIndex,
    },
    CellOccupied {
        index: CellIndex,
    },
    NoAvailableMoves,
    IntegrityViolation {
        error: IntegrityError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<VictoryState>,
}

impl RuleResolution {
    pub fn new(state: GameState, mut events: Vec<GameEvent>) -> Self {
        let victory = state.outcome.clone();
        if let Some(ref outcome) = victory {
            let has_event = events.iter().any(|event| {
                matches!(event, GameEvent::GameWon { .. } | GameEvent::GameDrawn)
            });
            if !has_event {
                match (&outcome.winner, state.board.winning_line()) {
                    (Some(winner), Some((_, line))) => events.push(GameEvent::GameWon {
                        winner: *winner,
                        line,
                    }),
                    _ => events.push(GameEvent::GameDrawn),
                }
            }
        }

        Self {
            state,
            events,
            victory,
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_not_finished(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_turn_owner(state: &GameState, mark: Mark) -> Result<(), RuleError> {
        if state.current_player != mark {
            return Err(RuleError::NotPlayerTurn {
                expected: state.current_player,
                actual: mark,
            });
        }
        Ok(())
    }

    /// 纯函数落子：目标格必须为空，返回新棋盘，原棋盘不变。
    pub fn apply_move(board: &Board, index: CellIndex, mark: Mark) -> Result<Board, RuleError> {
        if !Board::in_bounds(index) {
            return Err(RuleError::OutOfBounds { index });
        }
        if board.cell(index).is_some() {
            return Err(RuleError::CellOccupied { index });
        }
        let mut next = *board;
        next.0[index] = Some(mark);
        Ok(next)
    }

    /// 执行一手棋并推进对局：校验回合归属、落子、判定胜负、交换行棋方。
    /// 任何校验失败都保持状态原样返回错误。
    pub fn play_move(
        &mut self,
        state: &mut GameState,
        action: PlayMoveAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_not_finished(state)?;
        Self::ensure_turn_owner(state, action.mark)?;

        let next_board = Self::apply_move(&state.board, action.index, action.mark)?;
        state.board = next_board;

        let placed = GameEvent::MovePlaced {
            index: action.index,
            mark: action.mark,
        };
        state.record_event(placed.clone());
        let mut events = vec![placed];

        let log_before = state.event_log.len();
        if state.evaluate_victory().is_some() {
            // declare_victory 已把结束事件写入 event_log，这里同步到返回值
            events.extend(state.event_log[log_before..].iter().cloned());
        } else {
            state.advance_turn();
        }

        Ok(events)
    }

    pub fn check_victory(state: &mut GameState) -> Option<VictoryState> {
        state.evaluate_victory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Cell, VictoryReason};

    const X: Cell = Some(Mark::X);
    const O: Cell = Some(Mark::O);
    const E: Cell = None;

    #[test]
    fn apply_move_changes_only_the_target_cell() {
        let board = Board([X, E, E, E, O, E, E, E, E]);
        let next = RuleEngine::apply_move(&board, 8, Mark::X).expect("legal move");
        for index in 0..9 {
            if index == 8 {
                assert_eq!(next.cell(index), Some(Mark::X));
            } else {
                assert_eq!(next.cell(index), board.cell(index));
            }
        }
        // 原棋盘保持不变
        assert_eq!(board.cell(8), None);
    }

    #[test]
    fn apply_move_rejects_occupied_cell_and_out_of_bounds() {
        let board = Board([X, E, E, E, E, E, E, E, E]);
        assert_eq!(
            RuleEngine::apply_move(&board, 0, Mark::O),
            Err(RuleError::CellOccupied { index: 0 })
        );
        assert_eq!(
            RuleEngine::apply_move(&board, 9, Mark::O),
            Err(RuleError::OutOfBounds { index: 9 })
        );
    }

    #[test]
    fn play_move_alternates_turns() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::default();
        let events = engine
            .play_move(&mut state, PlayMoveAction { mark: Mark::X, index: 4 })
            .expect("legal move");
        assert_eq!(events, vec![GameEvent::MovePlaced { index: 4, mark: Mark::X }]);
        assert_eq!(state.current_player, Mark::O);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn play_move_rejects_out_of_turn_and_leaves_state_unchanged() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::default();
        let before = state.clone();
        let result = engine.play_move(&mut state, PlayMoveAction { mark: Mark::O, index: 0 });
        assert_eq!(
            result,
            Err(RuleError::NotPlayerTurn {
                expected: Mark::X,
                actual: Mark::O,
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn play_move_on_occupied_cell_leaves_state_unchanged() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::default();
        engine
            .play_move(&mut state, PlayMoveAction { mark: Mark::X, index: 4 })
            .expect("legal move");
        let before = state.clone();
        let result = engine.play_move(&mut state, PlayMoveAction { mark: Mark::O, index: 4 });
        assert_eq!(result, Err(RuleError::CellOccupied { index: 4 }));
        assert_eq!(state, before);
    }

    #[test]
    fn winning_move_declares_victory_and_stops_play() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::default();
        state.board = Board([X, X, E, O, O, E, E, E, E]);
        let events = engine
            .play_move(&mut state, PlayMoveAction { mark: Mark::X, index: 2 })
            .expect("legal move");
        assert!(events.contains(&GameEvent::GameWon {
            winner: Mark::X,
            line: [0, 1, 2],
        }));
        let outcome = state.outcome.clone().expect("victory declared");
        assert_eq!(outcome.winner, Some(Mark::X));
        // 终局后行棋方不再交换
        assert_eq!(state.current_player, Mark::X);
        assert_eq!(
            engine.play_move(&mut state, PlayMoveAction { mark: Mark::X, index: 5 }),
            Err(RuleError::GameFinished)
        );
    }

    #[test]
    fn filling_the_board_without_a_line_is_a_draw() {
        let mut engine = RuleEngine::new();
        let mut state = GameState::default();
        state.board = Board([X, O, X, X, O, O, O, X, E]);
        let events = engine
            .play_move(&mut state, PlayMoveAction { mark: Mark::X, index: 8 })
            .expect("legal move");
        assert!(events.contains(&GameEvent::GameDrawn));
        let outcome = state.outcome.clone().expect("draw declared");
        assert!(outcome.is_draw());
        assert_eq!(outcome.reason, VictoryReason::BoardFull);
    }

    #[test]
    fn resolution_carries_victory_from_state() {
        let mut state = GameState::default();
        state.board = Board([X, X, X, O, O, E, E, E, E]);
        state.evaluate_victory();
        let resolution = RuleResolution::new(state, Vec::new());
        assert!(resolution.victory.is_some());
        assert!(resolution
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::GameWon { .. })));
    }
}
