//! Game state, the move-legality state machine and reversible moves.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Region};
use crate::error::GameError;
use crate::{Color, Coord};

/// Legality context within one turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveState {
    /// Nothing moved yet this turn.
    First,
    /// At least one jump made; more jumps may follow.
    Subsequent,
    /// A single adjacent step was made; the turn is over.
    SubsequentAfterSingleMove,
    /// Replay of a move validated earlier. Skips all checks when
    /// [`GameConfig::trust_players`] is set.
    AlreadyChecked,
}

/// Game parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board size: side length of each home triangle.
    pub n: u32,
    /// Accept [`MoveState::AlreadyChecked`] moves without checking them.
    pub trust_players: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            n: 4,
            trust_players: false,
        }
    }
}

/// One entry of the move stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackedMove {
    pub color: Color,
    pub from: Coord,
    pub to: Coord,
    /// State the move was checked under.
    pub state: MoveState,
    /// Previous holder of `to`. Only a trusted replay can land on a held spot.
    pub displaced: Option<Color>,
}

/// Order-independent snapshot of the spots held by one color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionSet(Vec<u32>);

impl PositionSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of the mirror test on a line's occupancy.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineSymmetry {
    /// Mirror symmetric with at least one occupied spot: a legal jump.
    Symmetric,
    /// Nothing to jump over.
    Empty,
    Asymmetric,
}

/// Compare the occupancy of a line with its mirror image.
pub fn line_symmetry(occupation: &[bool]) -> LineSymmetry {
    let len = occupation.len();
    let mut any = false;
    for i in 0..len.div_ceil(2) {
        let (occ, rocc) = (occupation[i], occupation[len - i - 1]);
        if occ != rocc {
            return LineSymmetry::Asymmetric;
        }
        any |= occ;
    }
    if any {
        LineSymmetry::Symmetric
    } else {
        LineSymmetry::Empty
    }
}

/// Live game: piece positions per color plus the occupancy cache.
///
/// # Invariants
///
/// - `occupancy[i] == Some(c)` iff spot `i` is in `player_spots[c]`.
/// - No spot is held by two colors.
/// - Each color keeps the same number of pieces for the whole game.
#[derive(Clone, Debug)]
pub struct Game {
    board: Arc<Board>,
    config: GameConfig,
    colors: Vec<Color>,
    player_spots: BTreeMap<Color, Vec<Coord>>,
    occupancy: Vec<Option<Color>>,
    move_stack: Vec<StackedMove>,
}

impl Game {
    /// Start a game with every listed color on its own home.
    pub fn new(colors: &[Color], config: GameConfig) -> Game {
        let board = Arc::new(Board::new(config.n));
        let mut seated = Vec::with_capacity(colors.len());
        for &color in colors {
            if !seated.contains(&color) {
                seated.push(color);
            }
        }
        let positions = seated
            .iter()
            .map(|&c| (c, board.home_spots(c).to_vec()))
            .collect();
        Self::assemble(board, config, seated, positions)
    }

    /// Start from an arbitrary position. Colors are seated in `Color` order.
    pub fn from_positions(
        config: GameConfig,
        positions: BTreeMap<Color, Vec<Coord>>,
    ) -> Result<Game, GameError> {
        let board = Arc::new(Board::new(config.n));
        let mut taken = vec![false; board.board_spots().len()];
        for &spot in positions.values().flatten() {
            match board.spot_index(spot) {
                Some(i) if !taken[i] => taken[i] = true,
                _ => return Err(GameError::SpotUnavailable(spot)),
            }
        }
        let seated = positions.keys().copied().collect();
        Ok(Self::assemble(board, config, seated, positions))
    }

    fn assemble(
        board: Arc<Board>,
        config: GameConfig,
        colors: Vec<Color>,
        player_spots: BTreeMap<Color, Vec<Coord>>,
    ) -> Game {
        let mut occupancy = vec![None; board.board_spots().len()];
        for (&color, spots) in &player_spots {
            for &spot in spots {
                if let Some(i) = board.spot_index(spot) {
                    occupancy[i] = Some(color);
                }
            }
        }
        Game {
            board,
            config,
            colors,
            player_spots,
            occupancy,
            move_stack: Vec::new(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seated colors in seat order.
    #[inline]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[inline]
    pub fn player_spots(&self) -> &BTreeMap<Color, Vec<Coord>> {
        &self.player_spots
    }

    /// Spots held by one color, in piece order.
    pub fn spots(&self, color: Color) -> Result<&[Coord], GameError> {
        self.player_spots
            .get(&color)
            .map(Vec::as_slice)
            .ok_or(GameError::UnknownColor(color))
    }

    /// Occupancy cache, indexed by board spot index.
    #[inline]
    pub fn occupancy(&self) -> &[Option<Color>] {
        &self.occupancy
    }

    #[inline]
    pub fn move_stack(&self) -> &[StackedMove] {
        &self.move_stack
    }

    #[inline]
    pub fn pieces_per_player(&self) -> usize {
        self.board.pieces_per_player()
    }

    /// Color on the spot, if any. Off-board spots are never occupied.
    #[inline]
    pub fn occupant(&self, spot: Coord) -> Option<Color> {
        self.board.spot_index(spot).and_then(|i| self.occupancy[i])
    }

    #[inline]
    pub fn occupied(&self, spot: Coord) -> bool {
        self.occupant(spot).is_some()
    }

    /// Occupancy along a line with the moving piece's own spot counted as empty.
    fn occupation(&self, line: &[usize], from: usize) -> Vec<bool> {
        line.iter()
            .map(|&i| i != from && self.occupancy[i].is_some())
            .collect()
    }

    // ========== Legality ==========

    /// Whether a piece on `from` may move to `to` in the given state.
    ///
    /// Returns the state the turn is in afterwards, or `None` if the move is
    /// not legal.
    pub fn is_legal_move(&self, from: Coord, to: Coord, state: MoveState) -> Option<MoveState> {
        match state {
            MoveState::AlreadyChecked if self.config.trust_players => return Some(state),
            MoveState::SubsequentAfterSingleMove => return None,
            _ => {}
        }

        let to_idx = self.board.spot_index(to)?;
        if self.occupancy[to_idx].is_some() {
            return None;
        }

        let line = self.board.line_indices(from, to)?;
        if line.is_empty() {
            return None;
        }

        // Single adjacent step, only as the opening move of a turn.
        if state == MoveState::First && line.len() == 2 {
            return Some(MoveState::SubsequentAfterSingleMove);
        }

        let from_idx = self.board.spot_index(from)?;
        match line_symmetry(&self.occupation(line, from_idx)) {
            LineSymmetry::Symmetric => Some(MoveState::Subsequent),
            LineSymmetry::Empty | LineSymmetry::Asymmetric => None,
        }
    }

    /// Every spot reachable from `from` in one move, with the follow-up state.
    ///
    /// Only the three axis lines through `from` can hold a legal target.
    pub fn get_legal_moves(&self, from: Coord, state: MoveState) -> Vec<(Coord, MoveState)> {
        let mut moves = Vec::new();
        if state == MoveState::SubsequentAfterSingleMove {
            return moves;
        }
        for axis in 0..3 {
            for &i in self.board.axis_line(axis, from.axis(axis)) {
                let to = self.board.spot(i);
                // Two distinct spots share at most one axis, so no target repeats.
                if to == from {
                    continue;
                }
                if let Some(next) = self.is_legal_move(from, to, state) {
                    moves.push((to, next));
                }
            }
        }
        moves
    }

    /// Whether a turn that began on `from` may finish on `to`.
    ///
    /// Staying put is always allowed. Otherwise the spot must be free and lie
    /// in the field, the mover's own home or the mover's target home.
    pub fn is_legal_endpoint(&self, color: Color, from: Coord, to: Coord) -> bool {
        if from == to {
            return true;
        }
        let Some(idx) = self.board.spot_index(to) else {
            return false;
        };
        if self.occupancy[idx].is_some() {
            return false;
        }
        match self.board.region_at(idx) {
            Region::Field => true,
            Region::Home(owner) => owner == color || owner == color.opposing(),
        }
    }

    // ========== Applying moves ==========

    /// Validate and apply one move, returning the follow-up state.
    ///
    /// `Ok(None)` means `color` has no piece on `from`; nothing changes.
    fn step(
        &mut self,
        color: Color,
        from: Coord,
        to: Coord,
        state: MoveState,
    ) -> Result<Option<MoveState>, GameError> {
        let next = self
            .is_legal_move(from, to, state)
            .ok_or(GameError::IllegalMove { color, from, to })?;
        if self.relocate(color, from, to) {
            Ok(Some(next))
        } else {
            Ok(None)
        }
    }

    /// Move a piece without any rule checks. Updates the position list and
    /// the occupancy cache together.
    fn relocate(&mut self, color: Color, from: Coord, to: Coord) -> bool {
        let (Some(from_idx), Some(to_idx)) = (self.board.spot_index(from), self.board.spot_index(to)) else {
            return false;
        };
        let Some(spots) = self.player_spots.get_mut(&color) else {
            return false;
        };
        let Some(slot) = spots.iter_mut().find(|s| **s == from) else {
            return false;
        };
        *slot = to;
        self.occupancy[from_idx] = None;
        self.occupancy[to_idx] = Some(color);
        true
    }

    /// Apply a move after checking it.
    ///
    /// Fails with [`GameError::IllegalMove`] when the rules reject it, and
    /// returns `Ok(false)` without changes when `color` has no piece on `from`.
    pub fn do_move(&mut self, color: Color, from: Coord, to: Coord, state: MoveState) -> Result<bool, GameError> {
        Ok(self.step(color, from, to, state)?.is_some())
    }

    /// Apply a move and record it on the move stack so it can be popped.
    pub fn push_move(&mut self, color: Color, from: Coord, to: Coord, state: MoveState) -> Result<MoveState, GameError> {
        let displaced = self.occupant(to);
        match self.step(color, from, to, state)? {
            Some(next) => {
                self.move_stack.push(StackedMove {
                    color,
                    from,
                    to,
                    state,
                    displaced,
                });
                trace!("push {} {} -> {} ({:?})", color, from, to, state);
                Ok(next)
            }
            None => Err(GameError::PieceMissing { color, at: from }),
        }
    }

    /// Undo the most recent pushed move. The inverse is replayed without
    /// legality checks, and `to` gets back whatever held it before the push.
    pub fn pop_move(&mut self) -> Option<StackedMove> {
        let mov = self.move_stack.pop()?;
        if !self.relocate(mov.color, mov.to, mov.from) {
            warn!("move stack out of sync: {} has no piece on {}", mov.color, mov.to);
            return Some(mov);
        }
        if let Some(i) = self.board.spot_index(mov.to) {
            self.occupancy[i] = mov.displaced;
        }
        trace!("pop {} {} -> {}", mov.color, mov.to, mov.from);
        Some(mov)
    }

    /// Apply a whole turn: `path[0]` is the piece, each later spot one move.
    ///
    /// Nothing is applied unless every step is legal and the last spot is a
    /// legal endpoint. A path of one spot is a pass.
    pub fn play_turn(&mut self, color: Color, path: &[Coord]) -> Result<(), GameError> {
        let (&start, &end) = match (path.first(), path.last()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(GameError::EmptyTurn),
        };
        if !self.spots(color)?.contains(&start) {
            return Err(GameError::PieceMissing { color, at: start });
        }
        if !self.is_legal_endpoint(color, start, end) {
            return Err(GameError::IllegalEndpoint { color, from: start, to: end });
        }
        let mut trial = Trial::new(self);
        trial.push_path(color, path)?;
        trial.commit();
        Ok(())
    }

    // ========== Scoring ==========

    /// Whether `color` fills its entire target home.
    pub fn win_condition(&self, color: Color) -> bool {
        self.board
            .home_spots(color.opposing())
            .iter()
            .all(|&spot| self.occupant(spot) == Some(color))
    }

    /// Snapshot of the spots held by `color`, independent of piece order.
    pub fn position_set(&self, color: Color) -> PositionSet {
        let mut key: Vec<u32> = self
            .player_spots
            .get(&color)
            .into_iter()
            .flatten()
            .filter_map(|&s| self.board.spot_index(s))
            .map(|i| i as u32)
            .collect();
        key.sort_unstable();
        PositionSet(key)
    }

    /// Summed progress of all of a color's pieces.
    pub fn total_progress(&self, color: Color) -> i32 {
        self.player_spots
            .get(&color)
            .into_iter()
            .flatten()
            .map(|&s| self.board.progress(color, s))
            .sum()
    }
}

/// Scoped trial moves.
///
/// Every move pushed through a `Trial` is popped again when the trial is
/// dropped, on every exit path including `?`. Nested trials borrow the game
/// through [`Trial::game_mut`] and so are always dropped first.
pub struct Trial<'g> {
    game: &'g mut Game,
    pushed: usize,
}

impl<'g> Trial<'g> {
    pub fn new(game: &'g mut Game) -> Trial<'g> {
        Trial { game, pushed: 0 }
    }

    /// Push one move; see [`Game::push_move`].
    pub fn push(&mut self, color: Color, from: Coord, to: Coord, state: MoveState) -> Result<MoveState, GameError> {
        let next = self.game.push_move(color, from, to, state)?;
        self.pushed += 1;
        Ok(next)
    }

    /// Push every step of a turn, threading the move state from `First`.
    pub fn push_path(&mut self, color: Color, path: &[Coord]) -> Result<MoveState, GameError> {
        let mut state = MoveState::First;
        for pair in path.windows(2) {
            state = self.push(color, pair[0], pair[1], state)?;
        }
        Ok(state)
    }

    /// Push a turn that was validated earlier.
    ///
    /// With [`GameConfig::trust_players`] set, only the start and end of the
    /// path are replayed as one [`MoveState::AlreadyChecked`] move. Otherwise
    /// every step is checked again as in [`Trial::push_path`].
    pub fn replay(&mut self, color: Color, path: &[Coord]) -> Result<MoveState, GameError> {
        if !self.game.config.trust_players {
            return self.push_path(color, path);
        }
        match (path.first(), path.last()) {
            (Some(&start), Some(&end)) if start != end => self.push(color, start, end, MoveState::AlreadyChecked),
            _ => Ok(MoveState::First),
        }
    }

    #[inline]
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    #[inline]
    pub fn game(&self) -> &Game {
        self.game
    }

    /// Mutable access for nested searches. Anything pushed here must be
    /// popped before this trial is used again.
    #[inline]
    pub fn game_mut(&mut self) -> &mut Game {
        self.game
    }

    /// Keep the pushed moves applied and drop them from the move stack.
    pub fn commit(mut self) {
        let keep = self.game.move_stack.len() - self.pushed;
        self.game.move_stack.truncate(keep);
        self.pushed = 0;
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        for _ in 0..self.pushed {
            self.game.pop_move();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Coord = Coord::new(0, 0, 0);

    fn axis_spot(k: i32) -> Coord {
        Coord::new(0, k, k)
    }

    /// Red on the origin, black blockers on the given spots of the x = 0 line.
    fn line_game(blockers: &[i32]) -> Game {
        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, vec![ORIGIN]);
        positions.insert(Color::Black, blockers.iter().map(|&k| axis_spot(k)).collect());
        Game::from_positions(GameConfig::default(), positions).unwrap()
    }

    fn trusting(game: Game) -> Game {
        let config = GameConfig {
            trust_players: true,
            ..*game.config()
        };
        Game::from_positions(config, game.player_spots().clone()).unwrap()
    }

    fn snapshot(game: &Game) -> (BTreeMap<Color, Vec<Coord>>, Vec<Option<Color>>) {
        (game.player_spots().clone(), game.occupancy().to_vec())
    }

    // ========== Line symmetry ==========

    #[test]
    fn test_line_symmetry_patterns() {
        use LineSymmetry::*;
        assert_eq!(line_symmetry(&[true, false, true, false, true]), Symmetric);
        assert_eq!(line_symmetry(&[true, false, false, false, false]), Asymmetric);
        assert_eq!(line_symmetry(&[false, false, true, false, false]), Symmetric);
        assert_eq!(line_symmetry(&[false, true, false, true, false]), Symmetric);
        assert_eq!(line_symmetry(&[false, false, false, false]), Empty);
        assert_eq!(line_symmetry(&[false, true, true, false]), Symmetric);
        assert_eq!(line_symmetry(&[false, true, false, false]), Asymmetric);
        assert_eq!(line_symmetry(&[]), Empty);
    }

    // ========== Legality ==========

    #[test]
    fn test_single_step_only_first() {
        let game = line_game(&[]);
        assert_eq!(
            game.is_legal_move(ORIGIN, axis_spot(1), MoveState::First),
            Some(MoveState::SubsequentAfterSingleMove)
        );
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(1), MoveState::Subsequent), None);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(1), MoveState::SubsequentAfterSingleMove), None);
    }

    #[test]
    fn test_jump_over_adjacent() {
        let game = line_game(&[1]);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(2), MoveState::First), Some(MoveState::Subsequent));
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(2), MoveState::Subsequent), Some(MoveState::Subsequent));
        // Cannot land on the blocker.
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(1), MoveState::First), None);
    }

    #[test]
    fn test_long_symmetric_jump() {
        // [from, _, X, _, to]
        let game = line_game(&[2]);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(4), MoveState::First), Some(MoveState::Subsequent));
        // [from, _, X, to] is lopsided.
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(3), MoveState::First), None);
    }

    #[test]
    fn test_two_blocker_symmetric_jump() {
        // [from, X, _, X, to]
        let game = line_game(&[1, 3]);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(4), MoveState::First), Some(MoveState::Subsequent));
    }

    #[test]
    fn test_asymmetric_jump_rejected() {
        // [from, X, _, _, to]
        let game = line_game(&[1]);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(4), MoveState::First), None);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(3), MoveState::First), None);
    }

    #[test]
    fn test_empty_line_rejected() {
        let game = line_game(&[]);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(2), MoveState::First), None);
        assert_eq!(game.is_legal_move(ORIGIN, axis_spot(4), MoveState::First), None);
    }

    #[test]
    fn test_off_axis_and_off_board_rejected() {
        let game = line_game(&[1]);
        assert_eq!(game.is_legal_move(ORIGIN, Coord::new(1, 1, 2), MoveState::First), None);
        assert_eq!(game.is_legal_move(ORIGIN, Coord::new(0, 20, 20), MoveState::First), None);
    }

    #[test]
    fn test_already_checked_honours_trust_flag() {
        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, vec![ORIGIN]);
        let untrusting = Game::from_positions(GameConfig::default(), positions.clone()).unwrap();
        let trusting = Game::from_positions(
            GameConfig {
                trust_players: true,
                ..GameConfig::default()
            },
            positions,
        )
        .unwrap();

        let far = Coord::new(1, 1, 2);
        assert_eq!(untrusting.is_legal_move(ORIGIN, far, MoveState::AlreadyChecked), None);
        assert_eq!(
            trusting.is_legal_move(ORIGIN, far, MoveState::AlreadyChecked),
            Some(MoveState::AlreadyChecked)
        );
        // Without trust, a replayed single step is not a jump.
        assert_eq!(untrusting.is_legal_move(ORIGIN, axis_spot(1), MoveState::AlreadyChecked), None);
    }

    #[test]
    fn test_legal_moves_from_start() {
        let game = Game::new(&[Color::Red, Color::Black], GameConfig::default());
        // Front row of the red home steps into the field.
        let front = Coord::new(5, -4, 1);
        let moves = game.get_legal_moves(front, MoveState::First);
        assert!(moves.contains(&(Coord::new(4, -4, 0), MoveState::SubsequentAfterSingleMove)));
        for (to, _) in &moves {
            assert!(!game.occupied(*to));
        }
        assert!(game.get_legal_moves(front, MoveState::SubsequentAfterSingleMove).is_empty());
    }

    #[test]
    fn test_legal_moves_match_brute_force() {
        let game = Game::new(&Color::ALL, GameConfig { n: 3, ..GameConfig::default() });
        for &from in game.spots(Color::Green).unwrap() {
            for state in [MoveState::First, MoveState::Subsequent] {
                let mut fast: Vec<Coord> = game.get_legal_moves(from, state).into_iter().map(|(c, _)| c).collect();
                let mut slow: Vec<Coord> = game
                    .board()
                    .board_spots()
                    .iter()
                    .copied()
                    .filter(|&to| game.is_legal_move(from, to, state).is_some())
                    .collect();
                fast.sort();
                slow.sort();
                assert_eq!(fast, slow);
            }
        }
    }

    #[test]
    fn test_legal_endpoint_regions() {
        let game = Game::new(&[Color::Red, Color::Black], GameConfig::default());
        let red_start = game.spots(Color::Red).unwrap()[0];

        // Staying put.
        assert!(game.is_legal_endpoint(Color::Red, red_start, red_start));
        // Field.
        assert!(game.is_legal_endpoint(Color::Red, red_start, ORIGIN));
        // Occupied target home.
        let black_home = game.board().home_spots(Color::Black)[0];
        assert!(!game.is_legal_endpoint(Color::Red, red_start, black_home));
        // Someone else's home.
        let yellow_home = game.board().home_spots(Color::Yellow)[0];
        assert!(!game.is_legal_endpoint(Color::Red, red_start, yellow_home));
        // Off board.
        assert!(!game.is_legal_endpoint(Color::Red, red_start, Coord::new(0, 30, 30)));
    }

    #[test]
    fn test_legal_endpoint_empty_target_home() {
        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, vec![ORIGIN]);
        let game = Game::from_positions(GameConfig::default(), positions).unwrap();
        let black_home = game.board().home_spots(Color::Black)[0];
        let red_home = game.board().home_spots(Color::Red)[0];
        let grey_home = game.board().home_spots(Color::Grey)[0];
        assert!(game.is_legal_endpoint(Color::Red, ORIGIN, black_home));
        assert!(game.is_legal_endpoint(Color::Red, ORIGIN, red_home));
        assert!(!game.is_legal_endpoint(Color::Red, ORIGIN, grey_home));
    }

    // ========== Applying moves ==========

    #[test]
    fn test_do_move_updates_positions_and_cache() {
        let mut game = line_game(&[1]);
        assert_eq!(game.do_move(Color::Red, ORIGIN, axis_spot(2), MoveState::First), Ok(true));
        assert_eq!(game.spots(Color::Red).unwrap(), &[axis_spot(2)]);
        assert!(!game.occupied(ORIGIN));
        assert_eq!(game.occupant(axis_spot(2)), Some(Color::Red));
    }

    #[test]
    fn test_do_move_illegal() {
        let mut game = line_game(&[1]);
        let before = snapshot(&game);
        assert_eq!(
            game.do_move(Color::Red, ORIGIN, axis_spot(3), MoveState::First),
            Err(GameError::IllegalMove {
                color: Color::Red,
                from: ORIGIN,
                to: axis_spot(3)
            })
        );
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn test_do_move_wrong_owner() {
        let mut game = line_game(&[1]);
        let before = snapshot(&game);
        // The origin holds a red piece, not a black one.
        assert_eq!(game.do_move(Color::Black, ORIGIN, axis_spot(2), MoveState::First), Ok(false));
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn test_push_pop_roundtrip_every_opening() {
        let mut game = Game::new(&[Color::Red, Color::Black], GameConfig::default());
        let before = snapshot(&game);
        for color in [Color::Red, Color::Black] {
            for from in game.spots(color).unwrap().to_vec() {
                for (to, _) in game.get_legal_moves(from, MoveState::First) {
                    game.push_move(color, from, to, MoveState::First).unwrap();
                    assert_ne!(snapshot(&game), before);
                    let popped = game.pop_move().unwrap();
                    assert_eq!(popped.from, from);
                    assert_eq!(popped.to, to);
                    assert_eq!(snapshot(&game), before);
                }
            }
        }
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_push_missing_piece() {
        let mut game = line_game(&[1]);
        let err = game.push_move(Color::Black, ORIGIN, axis_spot(2), MoveState::First);
        assert_eq!(err, Err(GameError::PieceMissing { color: Color::Black, at: ORIGIN }));
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_pop_empty_stack() {
        let mut game = line_game(&[]);
        assert_eq!(game.pop_move(), None);
    }

    #[test]
    fn test_pop_out_of_sync_entry_leaves_board_alone() {
        let mut game = line_game(&[1]);
        let before = snapshot(&game);
        game.move_stack.push(StackedMove {
            color: Color::Red,
            from: ORIGIN,
            to: axis_spot(4),
            state: MoveState::First,
            displaced: None,
        });
        let popped = game.pop_move().unwrap();
        assert_eq!(popped.to, axis_spot(4));
        assert_eq!(snapshot(&game), before);
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_chain_push_pop() {
        // Two jumps: 0 -> 2 over 1, then 2 -> 4 over 3.
        let mut game = line_game(&[1, 3]);
        let before = snapshot(&game);
        let s = game.push_move(Color::Red, ORIGIN, axis_spot(2), MoveState::First).unwrap();
        assert_eq!(s, MoveState::Subsequent);
        let s = game.push_move(Color::Red, axis_spot(2), axis_spot(4), s).unwrap();
        assert_eq!(s, MoveState::Subsequent);
        assert_eq!(game.move_stack().len(), 2);
        game.pop_move();
        game.pop_move();
        assert_eq!(snapshot(&game), before);
    }

    // ========== Trials and turns ==========

    #[test]
    fn test_trial_pops_on_drop() {
        let mut game = line_game(&[1, 3]);
        let before = snapshot(&game);
        {
            let mut trial = Trial::new(&mut game);
            trial.push_path(Color::Red, &[ORIGIN, axis_spot(2), axis_spot(4)]).unwrap();
            assert_eq!(trial.pushed(), 2);
            assert_eq!(trial.game().occupant(axis_spot(4)), Some(Color::Red));
        }
        assert_eq!(snapshot(&game), before);
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_trial_pops_after_error() {
        let mut game = line_game(&[1]);
        let before = snapshot(&game);
        let result = (|| {
            let mut trial = Trial::new(&mut game);
            // First jump is fine, the second has nothing to jump over.
            trial.push_path(Color::Red, &[ORIGIN, axis_spot(2), axis_spot(4)])?;
            Ok::<_, GameError>(())
        })();
        assert!(matches!(result, Err(GameError::IllegalMove { .. })));
        assert_eq!(snapshot(&game), before);
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_trusted_push_onto_held_spot_pops_cleanly() {
        let mut game = trusting(line_game(&[2]));
        let before = snapshot(&game);
        let next = game.push_move(Color::Red, ORIGIN, axis_spot(2), MoveState::AlreadyChecked);
        assert_eq!(next, Ok(MoveState::AlreadyChecked));
        assert_eq!(game.occupant(axis_spot(2)), Some(Color::Red));
        assert_eq!(game.move_stack()[0].displaced, Some(Color::Black));

        game.pop_move().unwrap();
        assert_eq!(snapshot(&game), before);
        assert_eq!(game.occupant(axis_spot(2)), Some(Color::Black));
        assert_eq!(game.occupant(ORIGIN), Some(Color::Red));
    }

    #[test]
    fn test_replay_collapses_path_when_trusted() {
        let path = [ORIGIN, axis_spot(2), axis_spot(4)];

        let mut game = trusting(line_game(&[1, 3]));
        let before = snapshot(&game);
        {
            let mut trial = Trial::new(&mut game);
            assert_eq!(trial.replay(Color::Red, &path), Ok(MoveState::AlreadyChecked));
            assert_eq!(trial.pushed(), 1);
            let top = trial.game().move_stack()[0];
            assert_eq!((top.from, top.to, top.state), (ORIGIN, axis_spot(4), MoveState::AlreadyChecked));
            assert_eq!(trial.game().occupant(axis_spot(4)), Some(Color::Red));
        }
        assert_eq!(snapshot(&game), before);

        let mut game = line_game(&[1, 3]);
        let mut trial = Trial::new(&mut game);
        assert_eq!(trial.replay(Color::Red, &path), Ok(MoveState::Subsequent));
        assert_eq!(trial.pushed(), 2);
    }

    #[test]
    fn test_replay_of_a_pass_pushes_nothing() {
        let mut game = trusting(line_game(&[1]));
        let mut trial = Trial::new(&mut game);
        assert_eq!(trial.replay(Color::Red, &[ORIGIN]), Ok(MoveState::First));
        assert_eq!(trial.pushed(), 0);
    }

    #[test]
    fn test_nested_trials() {
        let mut game = line_game(&[1, 3]);
        let before = snapshot(&game);
        {
            let mut outer = Trial::new(&mut game);
            outer.push(Color::Red, ORIGIN, axis_spot(2), MoveState::First).unwrap();
            {
                let mut inner = Trial::new(outer.game_mut());
                inner.push(Color::Red, axis_spot(2), axis_spot(4), MoveState::Subsequent).unwrap();
                assert_eq!(inner.game().move_stack().len(), 2);
            }
            assert_eq!(outer.game().move_stack().len(), 1);
            assert_eq!(outer.game().occupant(axis_spot(2)), Some(Color::Red));
        }
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn test_play_turn_commits() {
        let mut game = line_game(&[1, 3]);
        game.play_turn(Color::Red, &[ORIGIN, axis_spot(2), axis_spot(4)]).unwrap();
        assert_eq!(game.spots(Color::Red).unwrap(), &[axis_spot(4)]);
        assert!(game.move_stack().is_empty());
    }

    #[test]
    fn test_play_turn_single_step_then_more_rejected() {
        let mut game = line_game(&[3]);
        let before = snapshot(&game);
        // Step to 1, then try to continue to 2.
        let err = game.play_turn(Color::Red, &[ORIGIN, axis_spot(1), axis_spot(2)]);
        assert!(matches!(err, Err(GameError::IllegalMove { .. })));
        assert_eq!(snapshot(&game), before);
    }

    #[test]
    fn test_play_turn_errors() {
        let mut game = Game::new(&[Color::Red, Color::Black], GameConfig::default());
        assert_eq!(game.play_turn(Color::Red, &[]), Err(GameError::EmptyTurn));
        assert_eq!(
            game.play_turn(Color::Green, &[ORIGIN]),
            Err(GameError::UnknownColor(Color::Green))
        );
        assert_eq!(
            game.play_turn(Color::Red, &[ORIGIN]),
            Err(GameError::PieceMissing { color: Color::Red, at: ORIGIN })
        );
        // A pass is a one-spot turn.
        let start = game.spots(Color::Red).unwrap()[0];
        assert_eq!(game.play_turn(Color::Red, &[start]), Ok(()));
    }

    #[test]
    fn test_play_turn_rejects_foreign_home_endpoint() {
        let board = Board::new(4);
        // A yellow home spot with a free field neighbour to step in from.
        let (from, target) = board
            .home_spots(Color::Yellow)
            .iter()
            .find_map(|&h| {
                let steps = [(1, 0, 1), (-1, 0, -1), (0, 1, 1), (0, -1, -1), (1, -1, 0), (-1, 1, 0)];
                steps
                    .into_iter()
                    .map(|(dx, dy, dz)| Coord::new(h.x + dx, h.y + dy, h.z + dz))
                    .find(|&c| board.in_field(c))
                    .map(|c| (c, h))
            })
            .unwrap();

        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, vec![from]);
        let mut game = Game::from_positions(GameConfig::default(), positions).unwrap();
        assert!(game.is_legal_move(from, target, MoveState::First).is_some());
        assert_eq!(
            game.play_turn(Color::Red, &[from, target]),
            Err(GameError::IllegalEndpoint {
                color: Color::Red,
                from,
                to: target
            })
        );
        assert_eq!(game.spots(Color::Red).unwrap(), &[from]);
    }

    // ========== Scoring ==========

    #[test]
    fn test_win_condition() {
        let board = Board::new(2);
        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, board.home_spots(Color::Black).to_vec());
        positions.insert(Color::Black, board.home_spots(Color::Red).to_vec());
        let game = Game::from_positions(GameConfig { n: 2, ..GameConfig::default() }, positions).unwrap();
        assert!(game.win_condition(Color::Red));
        assert!(game.win_condition(Color::Black));

        let fresh = Game::new(&[Color::Red, Color::Black], GameConfig { n: 2, ..GameConfig::default() });
        assert!(!fresh.win_condition(Color::Red));
    }

    #[test]
    fn test_position_set_ignores_piece_order() {
        let mut a = BTreeMap::new();
        a.insert(Color::Red, vec![ORIGIN, axis_spot(1)]);
        let mut b = BTreeMap::new();
        b.insert(Color::Red, vec![axis_spot(1), ORIGIN]);
        let ga = Game::from_positions(GameConfig::default(), a).unwrap();
        let gb = Game::from_positions(GameConfig::default(), b).unwrap();
        assert_eq!(ga.position_set(Color::Red), gb.position_set(Color::Red));
        assert_eq!(ga.position_set(Color::Red).len(), 2);
        assert!(ga.position_set(Color::Blue).is_empty());
    }

    #[test]
    fn test_position_set_keeps_high_spot_indices_apart() {
        let config = GameConfig {
            n: 110,
            ..GameConfig::default()
        };
        let board = Board::new(config.n);
        assert!(board.board_spots().len() > 65_537);
        let at = |spot: Coord| {
            let mut positions = BTreeMap::new();
            positions.insert(Color::Red, vec![spot]);
            Game::from_positions(config, positions).unwrap().position_set(Color::Red)
        };
        assert_ne!(at(board.spot(1)), at(board.spot(65_537)));
    }

    #[test]
    fn test_from_positions_rejects_overlap() {
        let mut positions = BTreeMap::new();
        positions.insert(Color::Red, vec![ORIGIN]);
        positions.insert(Color::Black, vec![ORIGIN]);
        assert_eq!(
            Game::from_positions(GameConfig::default(), positions).unwrap_err(),
            GameError::SpotUnavailable(ORIGIN)
        );
    }

    #[test]
    fn test_total_progress_start() {
        let game = Game::new(&[Color::Red, Color::Black], GameConfig::default());
        let red = game.total_progress(Color::Red);
        let black = game.total_progress(Color::Black);
        assert_eq!(red, black);
        assert!(red < 0);
    }
}
