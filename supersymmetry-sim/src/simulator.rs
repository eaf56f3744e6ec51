//! Repeated games with a fixed table of strategies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use supersymmetry_core::{build_lineup, run_game, Game, GameError, GameRecord};

use crate::config::SimConfig;
use crate::stats::{Progress, Summary};

const LOG_INTERVAL_SECS: u64 = 5;

pub struct Simulator {
    config: SimConfig,
    running: Arc<AtomicBool>,
    records: Vec<GameRecord>,
}

impl Simulator {
    /// `running` is checked between games; clearing it stops the run early.
    pub fn new(config: SimConfig, running: Arc<AtomicBool>) -> Self {
        Simulator {
            config,
            running,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Play game number `index` from the starting position.
    pub fn play_one(&self, index: usize) -> Result<GameRecord, GameError> {
        let mut game = Game::new(&self.config.colors(), self.config.game);
        let seed = self.config.seed.wrapping_add(index as u64);
        let mut players = build_lineup(&self.config.lineup(), seed);
        run_game(&mut game, &mut players, self.config.max_steps)
    }

    /// Play every configured game, or until interrupted.
    pub fn execute(&mut self) -> Result<Summary, GameError> {
        let mut progress = Progress::new();
        let total = self.config.games;
        let mut steps = 0;

        for index in 0..total {
            if !self.running.load(Ordering::SeqCst) {
                info!("stopping after {} of {} games", index, total);
                break;
            }
            let record = self.play_one(index)?;
            debug!("game {}: {:?}", index, record.win_sequence);
            steps += record.steps;
            self.records.push(record);

            if progress.should_log(LOG_INTERVAL_SECS) || index + 1 == total {
                progress.log(index + 1, total, steps);
            }
        }

        let kinds: Vec<_> = self
            .config
            .seats
            .iter()
            .map(|s| (s.color, s.strategy.kind()))
            .collect();
        let mut summary = Summary::from_records(&kinds, &self.records, self.config.max_steps);
        summary.interrupted = self.records.len() < total;
        summary.elapsed_secs = progress.elapsed_secs();
        Ok(summary)
    }
}
