//! Supersymmetry simulator
//!
//! Plays many games between configured strategies and reports how quickly
//! each color reaches its target home.

mod config;
mod simulator;
mod stats;

use std::env;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::config::{parse_args, USAGE};
use crate::simulator::Simulator;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };
    let config = options.config;

    if !options.json {
        println!("Supersymmetry Simulator");
        println!("=======================");
        println!("Board size: {}", config.game.n);
        println!("Games: {}  step budget: {}  seed: {}", config.games, config.max_steps, config.seed);
        for seat in &config.seats {
            println!("  {:<7} {:?}", seat.color.name(), seat.strategy);
        }
        println!();
    }

    // Stop between games on Ctrl-C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("\n\nInterrupt received, finishing the current game...");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("cannot install Ctrl-C handler: {}", e);
    }

    let mut sim = Simulator::new(config, running);
    let summary = match sim.execute() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    info!("{} games recorded", sim.records().len());

    if options.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("\n=======================");
        summary.print();
    }
}
