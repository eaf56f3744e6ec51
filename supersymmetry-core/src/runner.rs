//! Game driver: rounds of turns until everyone has arrived or time runs out.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::Game;
use crate::players::Player;
use crate::Color;

/// When a color finished. Colors still playing when the step budget runs out
/// are given the budget as their step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finish {
    pub color: Color,
    pub step: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// One entry per starting player, in finishing order.
    pub win_sequence: Vec<Finish>,
    /// Each color's total progress after each of its turns.
    pub progress: BTreeMap<Color, Vec<i32>>,
    /// Rounds played.
    pub steps: usize,
    /// Turns where a player had nothing to play.
    pub passes: usize,
}

impl GameRecord {
    /// Step at which `color` finished, if it played.
    pub fn finish_step(&self, color: Color) -> Option<usize> {
        self.win_sequence.iter().find(|f| f.color == color).map(|f| f.step)
    }
}

/// Play `game` to the end with one player per seated color.
///
/// Each round asks every remaining player for a turn in seat order. A player
/// that completes its target home is recorded at that round and leaves at the
/// end of it.
pub fn run_game(game: &mut Game, players: &mut [Box<dyn Player>], max_steps: usize) -> Result<GameRecord, GameError> {
    let mut record = GameRecord::default();
    let mut remaining: Vec<usize> = (0..players.len()).collect();

    for step in 0..max_steps {
        record.steps = step + 1;
        let mut winners = Vec::new();

        for &seat in &remaining {
            let player = &mut players[seat];
            let color = player.color();

            match player.play(game)? {
                Some(turn) => {
                    debug!("step {} {} ({}) plays {:?}", step, color, player.kind(), turn);
                    game.play_turn(color, &turn)?;
                }
                None => {
                    debug!("step {} {} passes", step, color);
                    record.passes += 1;
                }
            }
            record.progress.entry(color).or_default().push(game.total_progress(color));

            if game.win_condition(color) {
                debug!("{} finished at step {}", color, step);
                record.win_sequence.push(Finish { color, step });
                winners.push(seat);
            }
        }

        if !winners.is_empty() {
            remaining.retain(|seat| !winners.contains(seat));
            if remaining.is_empty() {
                return Ok(record);
            }
        }
    }

    for seat in remaining {
        record.win_sequence.push(Finish {
            color: players[seat].color(),
            step: max_steps,
        });
    }
    debug!("game over after {} steps", record.steps);
    Ok(record)
}
