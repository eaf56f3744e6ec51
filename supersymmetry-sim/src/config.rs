//! Simulation settings: a JSON file plus command-line overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use supersymmetry_core::{Color, GameConfig, ParseColorError, StrategyConfig};
use thiserror::Error;

pub const USAGE: &str = "\
usage: simulate [--config <file.json>] [--games N] [--max-steps N] [--seed N]
                [--n N] [--colors red,black,...] [--trust] [--json]";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Color(#[from] ParseColorError),

    #[error("{0} is seated more than once")]
    DuplicateColor(Color),

    #[error("at least one player is required")]
    NoPlayers,

    #[error("board size must be at least 1")]
    ZeroBoard,

    #[error("{flag} expects a value")]
    MissingValue { flag: String },

    #[error("bad value {value:?} for {flag}")]
    BadValue { flag: String, value: String },

    #[error("unknown argument {0:?}")]
    UnknownArg(String),
}

/// One seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    pub color: Color,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub game: GameConfig,
    /// Number of games to play.
    pub games: usize,
    /// Rounds per game before the remaining players are stopped.
    pub max_steps: usize,
    /// Base seed. Game `i` uses `seed + i`.
    pub seed: u64,
    pub seats: Vec<SeatConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            game: GameConfig::default(),
            games: 10,
            max_steps: 50,
            seed: 0,
            seats: vec![
                SeatConfig {
                    color: Color::Red,
                    strategy: StrategyConfig::default(),
                },
                SeatConfig {
                    color: Color::Black,
                    strategy: StrategyConfig::default(),
                },
            ],
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<SimConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.n == 0 {
            return Err(ConfigError::ZeroBoard);
        }
        if self.seats.is_empty() {
            return Err(ConfigError::NoPlayers);
        }
        for (i, seat) in self.seats.iter().enumerate() {
            if self.seats[..i].iter().any(|s| s.color == seat.color) {
                return Err(ConfigError::DuplicateColor(seat.color));
            }
        }
        Ok(())
    }

    pub fn colors(&self) -> Vec<Color> {
        self.seats.iter().map(|s| s.color).collect()
    }

    pub fn lineup(&self) -> Vec<(Color, StrategyConfig)> {
        self.seats.iter().map(|s| (s.color, s.strategy.clone())).collect()
    }
}

/// Parsed command line.
#[derive(Debug)]
pub struct Options {
    pub config: SimConfig,
    pub json: bool,
}

fn value<'a>(args: &'a [String], i: usize) -> Result<&'a str, ConfigError> {
    args.get(i + 1).map(String::as_str).ok_or_else(|| ConfigError::MissingValue {
        flag: args[i].clone(),
    })
}

fn number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::BadValue {
        flag: flag.to_string(),
        value: raw.to_string(),
    })
}

/// Parse arguments (without the program name). `--config` is read first,
/// then every other flag overrides it regardless of order.
pub fn parse_args(args: &[String]) -> Result<Options, ConfigError> {
    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => SimConfig::load(Path::new(value(args, i)?))?,
        None => SimConfig::default(),
    };
    let mut json = false;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--json" => json = true,
            "--trust" => config.game.trust_players = true,
            "--config" => i += 1,
            "--games" => {
                config.games = number(flag, value(args, i)?)?;
                i += 1;
            }
            "--max-steps" => {
                config.max_steps = number(flag, value(args, i)?)?;
                i += 1;
            }
            "--seed" => {
                config.seed = number(flag, value(args, i)?)?;
                i += 1;
            }
            "--n" => {
                config.game.n = number(flag, value(args, i)?)?;
                i += 1;
            }
            "--colors" => {
                let strategy = config.seats.first().map(|s| s.strategy.clone()).unwrap_or_default();
                config.seats = value(args, i)?
                    .split(',')
                    .map(|name| -> Result<SeatConfig, ConfigError> {
                        Ok(SeatConfig {
                            color: name.trim().parse()?,
                            strategy: strategy.clone(),
                        })
                    })
                    .collect::<Result<_, _>>()?;
                i += 1;
            }
            other => return Err(ConfigError::UnknownArg(other.to_string())),
        }
        i += 1;
    }

    config.validate()?;
    Ok(Options { config, json })
}
