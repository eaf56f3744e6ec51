//! Measure move-tree exploration from the starting position.
//!
//! For each depth limit from 1 up to `--max-depth`, explores the tree of every
//! piece of the first color and reports how many spots were reached, how many
//! of them are legal endpoints, and how long it took.
//!
//! usage: tree_stats [--n N] [--max-depth D] [--colors red,black,...]

use std::env;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use supersymmetry_core::{Color, Game, GameConfig, GameError, MoveSearch};

/// Totals for one depth limit.
#[derive(Default)]
struct DepthStats {
    /// Spots reached, over all pieces, starts excluded
    nodes: usize,
    /// Reached spots that are legal endpoints
    candidates: usize,
    /// Largest tree of a single piece
    widest: usize,
    /// Longest candidate chain, in moves
    longest: usize,
}

fn measure(game: &mut Game, color: Color, max_depth: usize) -> Result<DepthStats, GameError> {
    let search = MoveSearch::new(color, max_depth, 0);
    let mut stats = DepthStats::default();
    for start in game.spots(color)?.to_vec() {
        let tree = search.explore(game, start)?;
        stats.nodes += tree.len() - 1;
        stats.widest = stats.widest.max(tree.len() - 1);

        let candidates = search.moves_for_piece(game, start)?;
        stats.candidates += candidates.len();
        for cand in &candidates {
            stats.longest = stats.longest.max(cand.path.len() - 1);
        }
    }
    Ok(stats)
}

fn parse(args: &[String]) -> Result<(GameConfig, usize, Vec<Color>), String> {
    let mut config = GameConfig::default();
    let mut max_depth = 6;
    let mut colors = vec![Color::Red, Color::Black];

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1).ok_or_else(|| format!("{} expects a value", flag))?;
        match flag {
            "--n" => config.n = value.parse().map_err(|_| format!("bad board size {:?}", value))?,
            "--max-depth" => max_depth = value.parse().map_err(|_| format!("bad depth {:?}", value))?,
            "--colors" => {
                colors = value
                    .split(',')
                    .map(|c| c.trim().parse::<Color>().map_err(|e| e.to_string()))
                    .collect::<Result<_, _>>()?;
            }
            other => return Err(format!("unknown argument {:?}", other)),
        }
        i += 2;
    }
    if config.n == 0 || colors.is_empty() {
        return Err("need a board size of at least 1 and one color".to_string());
    }
    Ok((config, max_depth, colors))
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let (config, max_depth, colors) = match parse(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: tree_stats [--n N] [--max-depth D] [--colors red,black,...]");
            process::exit(2);
        }
    };

    println!("Move Tree Statistics");
    println!("====================");
    println!("Board size {}, {} seated, exploring for {}", config.n, colors.len(), colors[0]);
    println!();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n\nInterrupt received, stopping after this depth...");
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("warning: cannot install Ctrl-C handler: {}", e);
    }

    let mut game = Game::new(&colors, config);
    let start = Instant::now();

    println!(
        "{:>5} {:>10} {:>10} {:>7} {:>7} {:>10}",
        "depth", "nodes", "endpoints", "widest", "chain", "time"
    );
    for depth in 1..=max_depth {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let t = Instant::now();
        let stats = match measure(&mut game, colors[0], depth) {
            Ok(stats) => stats,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        };
        println!(
            "{:>5} {:>10} {:>10} {:>7} {:>7} {:>9.3}s",
            depth,
            stats.nodes,
            stats.candidates,
            stats.widest,
            stats.longest,
            t.elapsed().as_secs_f64()
        );
    }

    println!();
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
}
