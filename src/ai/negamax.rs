use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::position::{center_order, Position, OPPONENT, OWN};
use super::strategy::{BotConfig, BotLevel, BotProfile, BotStrategy};
use crate::game::{Board, PlayerId, CONNECT};

/// Score of a won position; the remaining depth is added so faster wins rank higher.
const WIN_SCORE: f64 = 1_000_000.0;

/// Trait for evaluating a position from one side's perspective.
pub trait Heuristic: Send + Sync {
    fn evaluate(&self, position: &Position, side: i8) -> f64;
}

/// Default heuristic: center-column bias plus a score for every open
/// four-cell window.
pub struct WindowHeuristic;

impl WindowHeuristic {
    fn score_window(own: usize, opp: usize, empty: usize) -> f64 {
        if own == 3 && empty == 1 {
            50.0
        } else if own == 2 && empty == 2 {
            10.0
        } else if opp == 3 && empty == 1 {
            -80.0
        } else if opp == 2 && empty == 2 {
            -10.0
        } else {
            0.0
        }
    }

    fn is_center(width: usize, col: usize) -> bool {
        (2 * col).abs_diff(width - 1) <= 1
    }
}

impl Heuristic for WindowHeuristic {
    fn evaluate(&self, position: &Position, side: i8) -> f64 {
        let (width, height) = (position.width(), position.height());
        let mut score = 0.0;

        // Center column bonus
        for col in (0..width).filter(|&c| Self::is_center(width, c)) {
            for row in 0..height {
                let cell = position.get(col, row);
                if cell == side {
                    score += 3.0;
                } else if cell == -side {
                    score -= 3.0;
                }
            }
        }

        // Every window of CONNECT cells along the four axes
        let span = CONNECT as isize - 1;
        for &(dc, dr) in &[(1isize, 0isize), (0, 1), (1, 1), (1, -1)] {
            for row in 0..height as isize {
                for col in 0..width as isize {
                    let end_c = col + dc * span;
                    let end_r = row + dr * span;
                    if end_c < 0 || end_c >= width as isize || end_r < 0 || end_r >= height as isize
                    {
                        continue;
                    }
                    let mut own = 0;
                    let mut opp = 0;
                    let mut empty = 0;
                    for i in 0..CONNECT as isize {
                        match position.get((col + dc * i) as usize, (row + dr * i) as usize) {
                            c if c == side => own += 1,
                            0 => empty += 1,
                            _ => opp += 1,
                        }
                    }
                    score += Self::score_window(own, opp, empty);
                }
            }
        }

        score
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    column: usize,
    score: f64,
    /// The opponent cannot win on its very next move.
    safe: bool,
}

/// Negamax bot with alpha-beta pruning. Difficulty comes from its
/// [`BotProfile`]: search depth and how loosely it picks among good moves.
#[derive(Clone)]
pub struct NegamaxBot {
    profile: BotProfile,
    heuristic: Arc<dyn Heuristic>,
}

impl NegamaxBot {
    pub fn new(profile: BotProfile) -> Self {
        NegamaxBot {
            profile,
            heuristic: Arc::new(WindowHeuristic),
        }
    }

    pub fn with_heuristic(profile: BotProfile, heuristic: Arc<dyn Heuristic>) -> Self {
        NegamaxBot { profile, heuristic }
    }

    pub fn for_level(config: &BotConfig, level: BotLevel) -> Self {
        Self::new(config.profile(level))
    }

    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    fn best_move(&self, position: &mut Position) -> Option<usize> {
        let legal: Vec<usize> = center_order(position.width())
            .into_iter()
            .filter(|&c| position.can_play(c))
            .collect();
        if legal.is_empty() {
            return None;
        }

        if let Some(&win) = legal.iter().find(|&&c| position.is_winning_move(c, OWN)) {
            return Some(win);
        }

        // A single opponent threat must be blocked; with two or more the
        // search below picks the least bad move.
        let threats: Vec<usize> = legal
            .iter()
            .copied()
            .filter(|&c| position.is_winning_move(c, OPPONENT))
            .collect();
        if let [only] = threats.as_slice() {
            return Some(*only);
        }

        let depth = self.profile.depth.max(1);
        let candidates: Vec<Candidate> = legal
            .iter()
            .map(|&column| {
                position.play(column, OWN);
                let safe = !position
                    .legal_columns()
                    .into_iter()
                    .any(|reply| position.is_winning_move(reply, OPPONENT));
                let score =
                    -self.negamax(position, depth - 1, f64::NEG_INFINITY, f64::INFINITY, OPPONENT);
                position.undo(column);
                Candidate {
                    column,
                    score,
                    safe,
                }
            })
            .collect();

        Some(self.choose(&candidates, position))
    }

    /// Pick among scored candidates (given in center-first order).
    fn choose(&self, candidates: &[Candidate], position: &Position) -> usize {
        let any_safe = candidates.iter().any(|c| c.safe);
        let pool: Vec<Candidate> = candidates
            .iter()
            .copied()
            .filter(|c| c.safe || !any_safe)
            .collect();
        let best = pool
            .iter()
            .map(|c| c.score)
            .fold(f64::NEG_INFINITY, f64::max);

        if self.profile.tolerance > 0.0 {
            let near: Vec<usize> = pool
                .iter()
                .filter(|c| c.score >= best - self.profile.tolerance)
                .map(|c| c.column)
                .collect();
            if near.len() > 1 {
                let mut rng = match self.profile.seed {
                    Some(seed) => StdRng::seed_from_u64(seed ^ position.fingerprint()),
                    None => StdRng::from_os_rng(),
                };
                return near[rng.random_range(0..near.len())];
            }
        }

        // Center-first order makes the first best candidate the tie-break winner.
        pool.iter()
            .find(|c| c.score == best)
            .or_else(|| pool.first())
            .map_or(candidates[0].column, |c| c.column)
    }

    fn negamax(&self, position: &mut Position, depth: usize, mut alpha: f64, beta: f64, side: i8) -> f64 {
        let order = center_order(position.width());

        if order.iter().any(|&c| position.is_winning_move(c, side)) {
            return WIN_SCORE + depth as f64;
        }
        if position.is_full() {
            return 0.0;
        }
        if depth == 0 {
            return self.heuristic.evaluate(position, side);
        }

        let mut best = f64::NEG_INFINITY;
        for &col in &order {
            if !position.can_play(col) {
                continue;
            }
            position.play(col, side);
            let score = -self.negamax(position, depth - 1, -beta, -alpha, -side);
            position.undo(col);
            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        best
    }
}

impl BotStrategy for NegamaxBot {
    fn generate_move(&self, board: &Board, own: PlayerId) -> Option<usize> {
        let mut position = Position::from_board(board, own);
        self.best_move(&mut position)
    }

    fn name(&self) -> &str {
        "Negamax"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, GameOutcome, Player, PlayerRole};

    const RED: PlayerId = PlayerId(1);
    const YELLOW: PlayerId = PlayerId(2);

    fn exact(depth: usize) -> NegamaxBot {
        NegamaxBot::new(BotProfile {
            depth,
            tolerance: 0.0,
            seed: None,
        })
    }

    fn new_game() -> Game {
        Game::new(
            Board::standard(),
            vec![
                Player::new(RED, PlayerRole::Bot, 0),
                Player::new(YELLOW, PlayerRole::Bot, 0),
            ],
            None,
        )
        .unwrap()
    }

    fn play(game: &mut Game, columns: &[usize]) {
        for &c in columns {
            let id = game.next_player().id();
            game.make_move(id, c).unwrap();
        }
    }

    // --- Heuristic tests ---

    #[test]
    fn heuristic_empty_board_is_zero() {
        let pos = Position::from_board(&Board::standard(), RED);
        let h = WindowHeuristic;
        assert!(h.evaluate(&pos, OWN).abs() < f64::EPSILON);
        assert!(h.evaluate(&pos, OPPONENT).abs() < f64::EPSILON);
    }

    #[test]
    fn heuristic_center_preference() {
        let h = WindowHeuristic;
        let mut center = Board::standard();
        center.place(3, RED).unwrap();
        let mut edge = Board::standard();
        edge.place(0, RED).unwrap();

        let score_center = h.evaluate(&Position::from_board(&center, RED), OWN);
        let score_edge = h.evaluate(&Position::from_board(&edge, RED), OWN);
        assert!(
            score_center > score_edge,
            "Center ({score_center}) should score higher than edge ({score_edge})"
        );
    }

    #[test]
    fn heuristic_three_in_a_row_scores_high() {
        let mut board = Board::standard();
        for col in 0..3 {
            board.place(col, RED).unwrap();
        }
        let score = WindowHeuristic.evaluate(&Position::from_board(&board, RED), OWN);
        assert!(score > 40.0, "3-in-a-row should score high, got {score}");
    }

    // --- Move selection ---

    #[test]
    fn selects_legal_action() {
        let game = new_game();
        let col = exact(4).generate_move(game.board(), RED).unwrap();
        assert!(game.board().is_move_legal(col));
    }

    #[test]
    fn opens_in_center_column() {
        for depth in [1, 2] {
            assert_eq!(exact(depth).generate_move(&Board::standard(), RED), Some(3));
        }
    }

    #[test]
    fn equal_center_columns_break_left() {
        let board = Board::new(6, 6);
        assert_eq!(exact(1).generate_move(&board, RED), Some(2));
    }

    #[test]
    fn takes_winning_move() {
        let mut game = new_game();
        play(&mut game, &[0, 0, 1, 1, 2, 2]);
        assert_eq!(exact(2).generate_move(game.board(), RED), Some(3));
    }

    #[test]
    fn blocks_opponent_win() {
        let mut game = new_game();
        play(&mut game, &[6, 0, 6, 1, 5, 2]);
        // Yellow holds 0..=2 on the bottom row; Red must take column 3.
        for depth in [1, 2, 4] {
            assert_eq!(exact(depth).generate_move(game.board(), RED), Some(3));
        }
    }

    #[test]
    fn prefers_win_over_block() {
        let mut game = new_game();
        play(&mut game, &[0, 0, 1, 1, 2, 2]);
        // Both sides threaten column 3; Red moves and should win there.
        assert_eq!(exact(4).generate_move(game.board(), RED), Some(3));
    }

    #[test]
    fn never_hands_opponent_an_immediate_win() {
        // Yellow threatens (3, 1); dropping into column 3 would let it win.
        let mut board = Board::standard();
        board.place(0, RED).unwrap();
        board.place(1, YELLOW).unwrap();
        board.place(2, RED).unwrap();
        for col in 0..3 {
            board.place(col, YELLOW).unwrap();
        }
        let loose = |seed| {
            NegamaxBot::new(BotProfile {
                depth: 1,
                tolerance: 1.0e9,
                seed: Some(seed),
            })
        };
        for seed in 0..50 {
            let col = loose(seed).generate_move(&board, RED).unwrap();
            assert_ne!(col, 3, "seed {seed} played the losing column");
        }
    }

    #[test]
    fn seeded_choice_is_repeatable() {
        let bot = NegamaxBot::new(BotProfile {
            depth: 2,
            tolerance: 1.0e9,
            seed: Some(99),
        });
        let board = Board::standard();
        let first = bot.generate_move(&board, RED);
        for _ in 0..10 {
            assert_eq!(bot.generate_move(&board, RED), first);
        }
    }

    #[test]
    fn full_board_has_no_move() {
        let mut board = Board::new(2, 2);
        board.place(0, RED).unwrap();
        board.place(0, YELLOW).unwrap();
        board.place(1, RED).unwrap();
        board.place(1, YELLOW).unwrap();
        assert_eq!(exact(3).generate_move(&board, RED), None);
    }

    // --- Integration tests ---

    #[test]
    fn full_game_easy_vs_medium_completes() {
        let config = BotConfig::default();
        let easy = NegamaxBot::for_level(&config, BotLevel::Easy);
        let medium = NegamaxBot::for_level(&config, BotLevel::Medium);
        let mut game = new_game();

        while game.is_running() {
            let id = game.next_player().id();
            let bot = if id == RED { &easy } else { &medium };
            let col = bot.generate_move(game.board(), id).unwrap();
            game.make_move(id, col).unwrap();
        }

        assert!(game.outcome().is_some());
        assert!(game.move_count() <= 42);
    }

    #[test]
    fn beats_random_player() {
        let games_per_color = 10;
        let mut rng = StdRng::seed_from_u64(7);
        let mut bot_wins = 0;

        for game_idx in 0..games_per_color * 2 {
            let bot_id = if game_idx % 2 == 0 { RED } else { YELLOW };
            let bot = exact(4);
            let mut game = new_game();

            while game.is_running() {
                let id = game.next_player().id();
                let col = if id == bot_id {
                    bot.generate_move(game.board(), id).unwrap()
                } else {
                    let legal = game.board().legal_columns();
                    legal[rng.random_range(0..legal.len())]
                };
                game.make_move(id, col).unwrap();
            }

            if game.outcome() == Some(GameOutcome::Winner(bot_id)) {
                bot_wins += 1;
            }
        }

        let total = games_per_color * 2;
        let win_rate = bot_wins as f64 / total as f64;
        assert!(
            win_rate > 0.80,
            "Negamax should beat random >80% of the time, got {:.0}% ({bot_wins}/{total})",
            win_rate * 100.0
        );
    }

    #[test]
    fn custom_heuristic_drives_quiet_positions() {
        struct LeftEdge;
        impl Heuristic for LeftEdge {
            fn evaluate(&self, position: &Position, side: i8) -> f64 {
                // Positive for the side whose token sits in column 0.
                f64::from(position.get(0, 0) * side)
            }
        }
        let bot = NegamaxBot::with_heuristic(
            BotProfile {
                depth: 1,
                tolerance: 0.0,
                seed: None,
            },
            Arc::new(LeftEdge),
        );
        assert_eq!(bot.generate_move(&Board::standard(), RED), Some(0));
    }

    #[test]
    fn name_is_negamax() {
        assert_eq!(exact(3).name(), "Negamax");
    }
}
