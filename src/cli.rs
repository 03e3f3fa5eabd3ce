//! Command-line surface: train a strategy, show a saved one, inspect
//! the tree for a config.

use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cfr::{CfrSolver, TrainedStrategy};
use crate::eval::{expected_game_value, exploitability};
use crate::game_tree::build_game_tree;
use crate::hand::GameConfig;
use crate::policy::Policy;

#[derive(Parser)]
#[command(name = "ocl", version, about = "One-card limit poker CFR trainer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a strategy by CFR self-play and save it.
    Train {
        #[arg(long, default_value_t = 4)]
        deck_size: usize,
        #[arg(long, default_value_t = 2)]
        max_raises: u32,
        #[arg(long, default_value_t = 1)]
        ante: i64,
        #[arg(long, default_value_t = 100_000)]
        iterations: u64,
        /// RNG seed; random if omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Shard iterations across worker threads in batches of this size.
        #[arg(long)]
        batch_size: Option<u64>,
        /// Output path for the trained strategy.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also export the averaged policy as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Display a saved strategy.
    Show { path: PathBuf },
    /// Print game-tree statistics for a config.
    Tree {
        #[arg(long, default_value_t = 4)]
        deck_size: usize,
        #[arg(long, default_value_t = 2)]
        max_raises: u32,
        #[arg(long, default_value_t = 1)]
        ante: i64,
    },
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Train {
            deck_size,
            max_raises,
            ante,
            iterations,
            seed,
            batch_size,
            out,
            json,
        } => {
            let config = GameConfig::new(deck_size, max_raises, ante)?;
            let seed = seed.unwrap_or_else(rand::random);

            println!(
                "Training {} for {} iterations (seed {})...",
                config.to_string().bold(),
                iterations,
                seed,
            );

            let mut solver = CfrSolver::new(config);
            let policy = match batch_size {
                Some(batch) => solver.train_parallel(iterations, batch, seed)?,
                None => solver.train(iterations, &mut StdRng::seed_from_u64(seed))?,
            };

            let ev = expected_game_value(&policy, config)?;
            let gap = exploitability(&policy, config)?;
            println!(
                "EV: OP {:+.4} | IP {:+.4}  Exploitability: {:.4}",
                ev[0], ev[1], gap,
            );

            let path = out.unwrap_or_else(|| default_path(config));
            TrainedStrategy::from_solver(&solver).save(&path)?;
            println!("Saved strategy to {}", path.display().to_string().bold());

            if let Some(json_path) = json {
                std::fs::write(&json_path, policy.to_json()?)?;
                println!("Exported policy to {}", json_path.display());
            }

            print_policy(&policy);
            Ok(())
        }
        Command::Show { path } => {
            let record = TrainedStrategy::load(&path)?;
            println!(
                "Strategy {} | {} iterations | {} info states",
                record.config.to_string().bold(),
                record.iterations,
                record.policy.len(),
            );
            let ev = expected_game_value(&record.policy, record.config)?;
            let gap = exploitability(&record.policy, record.config)?;
            println!(
                "EV: OP {:+.4} | IP {:+.4}  Exploitability: {:.4}",
                ev[0], ev[1], gap,
            );
            print_policy(&record.policy);
            Ok(())
        }
        Command::Tree {
            deck_size,
            max_raises,
            ante,
        } => {
            let config = GameConfig::new(deck_size, max_raises, ante)?;
            let tree = build_game_tree(config)?;
            println!(
                "Game {} | {} deals | {} decision nodes | {} terminal states | {} info states",
                config.to_string().bold(),
                tree.deals.len(),
                tree.count_action_nodes(),
                tree.count_terminal_nodes(),
                tree.decision_info_states().len(),
            );
            Ok(())
        }
    }
}

fn default_path(config: GameConfig) -> PathBuf {
    PathBuf::from(format!(
        "trained_strategies/ocl_d{}_r{}.bin",
        config.deck_size(),
        config.max_raises(),
    ))
}

fn print_policy(policy: &Policy) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Info state", "Strategy"]);

    for row in policy.sorted_rows() {
        let strategy: Vec<String> = row
            .actions
            .iter()
            .zip(&row.probs)
            .map(|(action, prob)| {
                let pct = (prob * 100.0).round() as u32;
                let shown = format!("{} {}%", action, pct);
                if pct > 70 {
                    shown.green().to_string()
                } else if pct > 30 {
                    shown.yellow().to_string()
                } else {
                    shown
                }
            })
            .collect();
        table.add_row(vec![row.info, strategy.join("  ")]);
    }
    println!("{table}");
}
