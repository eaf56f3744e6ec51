//! Progress reporting and per-color result statistics.

use std::collections::BTreeMap;
#[cfg(unix)]
use std::mem::MaybeUninit;
use std::time::Instant;

use serde::Serialize;
use supersymmetry_core::{Color, GameRecord};

/// Peak resident set size of this process in bytes.
#[cfg(unix)]
pub fn peak_memory() -> Option<u64> {
    let mut usage = MaybeUninit::<libc::rusage>::uninit();
    // SAFETY: getrusage only writes into the struct it is given.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let max = u64::try_from(unsafe { usage.assume_init() }.ru_maxrss).ok()?;
    // macOS reports bytes, everything else kilobytes.
    if cfg!(target_os = "macos") {
        Some(max)
    } else {
        Some(max * 1024)
    }
}

#[cfg(not(unix))]
pub fn peak_memory() -> Option<u64> {
    None
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    match unit {
        0 => format!("{} B", bytes),
        3 => format!("{:.2} GB", value),
        _ => format!("{:.1} {}", value, UNITS[unit]),
    }
}

/// `[hh:mm:ss]` prefix for progress lines.
pub fn clock(secs: u64) -> String {
    format!("[{:02}:{:02}:{:02}]", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Timer for periodic progress lines.
pub struct Progress {
    start: Instant,
    last_log: Instant,
    games_at_last_log: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        let now = Instant::now();
        Progress {
            start: now,
            last_log: now,
            games_at_last_log: 0,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn should_log(&self, interval_secs: u64) -> bool {
        self.last_log.elapsed().as_secs() >= interval_secs
    }

    pub fn log(&mut self, games: usize, total: usize, steps: usize) {
        let since = self.last_log.elapsed().as_secs_f64();
        let rate = if since > 0.0 {
            (games - self.games_at_last_log) as f64 / since
        } else {
            0.0
        };
        let mem = peak_memory()
            .map(|m| format!(" peak={}", format_bytes(m)))
            .unwrap_or_default();

        println!(
            "{} games={}/{} steps={} rate={:.2}/s{}",
            clock(self.start.elapsed().as_secs()),
            games,
            total,
            steps,
            rate,
            mem,
        );

        self.last_log = Instant::now();
        self.games_at_last_log = games;
    }
}

/// Finishing statistics for one color over many games.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorSummary {
    pub color: Color,
    pub strategy: String,
    pub games: usize,
    /// Games where the color filled its target home within the budget.
    pub finished: usize,
    /// Games where the color finished strictly first.
    pub wins: usize,
    /// Games where the color shared the earliest finishing step.
    pub ties: usize,
    pub mean_step: f64,
    pub min_step: usize,
    pub max_step: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub max_steps: usize,
    pub interrupted: bool,
    pub elapsed_secs: f64,
    pub colors: Vec<ColorSummary>,
}

impl Summary {
    /// Aggregate finishing steps. `seats` gives the colors, in seat order,
    /// with their strategy names.
    pub fn from_records(seats: &[(Color, &str)], records: &[GameRecord], max_steps: usize) -> Summary {
        let mut steps: BTreeMap<Color, Vec<usize>> = BTreeMap::new();
        let mut wins: BTreeMap<Color, usize> = BTreeMap::new();
        let mut ties: BTreeMap<Color, usize> = BTreeMap::new();

        for record in records {
            for finish in &record.win_sequence {
                steps.entry(finish.color).or_default().push(finish.step);
            }
            let Some(best) = record.win_sequence.iter().map(|f| f.step).min() else {
                continue;
            };
            let leaders: Vec<Color> = record
                .win_sequence
                .iter()
                .filter(|f| f.step == best)
                .map(|f| f.color)
                .collect();
            let tally = if leaders.len() == 1 { &mut wins } else { &mut ties };
            for color in leaders {
                *tally.entry(color).or_default() += 1;
            }
        }

        let colors = seats
            .iter()
            .map(|&(color, strategy)| {
                let s = steps.get(&color).map(Vec::as_slice).unwrap_or(&[]);
                let mean_step = if s.is_empty() {
                    0.0
                } else {
                    s.iter().sum::<usize>() as f64 / s.len() as f64
                };
                ColorSummary {
                    color,
                    strategy: strategy.to_string(),
                    games: s.len(),
                    finished: s.iter().filter(|&&x| x < max_steps).count(),
                    wins: wins.get(&color).copied().unwrap_or(0),
                    ties: ties.get(&color).copied().unwrap_or(0),
                    mean_step,
                    min_step: s.iter().copied().min().unwrap_or(0),
                    max_step: s.iter().copied().max().unwrap_or(0),
                }
            })
            .collect();

        Summary {
            games: records.len(),
            max_steps,
            interrupted: false,
            elapsed_secs: 0.0,
            colors,
        }
    }

    pub fn print(&self) {
        println!("Games played: {}", self.games);
        if self.interrupted {
            println!("(interrupted before all games were played)");
        }
        println!("Step budget: {}", self.max_steps);
        println!("Time: {:.2}s", self.elapsed_secs);
        println!();
        println!(
            "{:<8} {:<14} {:>8} {:>6} {:>6} {:>8} {:>5} {:>5}",
            "color", "strategy", "finished", "wins", "ties", "mean", "min", "max"
        );
        for c in &self.colors {
            println!(
                "{:<8} {:<14} {:>8} {:>6} {:>6} {:>8.1} {:>5} {:>5}",
                c.color.name(),
                c.strategy,
                c.finished,
                c.wins,
                c.ties,
                c.mean_step,
                c.min_step,
                c.max_step
            );
        }
    }
}
