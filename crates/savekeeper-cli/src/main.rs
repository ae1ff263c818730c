//! savekeeper CLI: inspect and update profile saves from the command line.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use savekeeper_core::logging::{FileLogSink, LogFacadeSink, LogSink};
use savekeeper_core::{InteractionGate, SaveManager, Score};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sink: Arc<dyn LogSink> = match &cli.log_dir {
        Some(dir) => Arc::new(FileLogSink::open(Some(dir.as_path()), "savekeeper")),
        None => Arc::new(LogFacadeSink),
    };
    let gate = InteractionGate::for_platform(config.requires_interaction_gate);
    let manager = SaveManager::from_config(&config, gate, sink);
    log::debug!("using data dir {}", config.data_dir.display());

    match cli.command {
        Commands::Submit {
            profile,
            level,
            time,
        } => {
            manager.load_or_create(&profile).await;
            let Some(handle) = manager.submit_score(level, time) else {
                return ExitCode::FAILURE;
            };
            if !handle.wait().await {
                return ExitCode::FAILURE;
            }
            if let Some(metric) = manager
                .active_profile()
                .and_then(|data| data.metric(level).copied())
            {
                println!(
                    "{profile} level {level}: last {:.3}, best {:.3}",
                    metric.last_time, metric.best_time
                );
            }
            ExitCode::SUCCESS
        }

        Commands::Show { profile } => {
            match manager.score_aggregator().load_profile(&profile) {
                Some(data) => {
                    println!("{}", data.profile_name);
                    for metric in &data.progress_metrics {
                        println!(
                            "  level {:>4}  best {:>10.3}  last {:>10.3}",
                            metric.level_id, metric.best_time, metric.last_time
                        );
                    }
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("No readable save for profile {profile}");
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Profiles => {
            for name in manager.store().list_profile_names() {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }

        Commands::Scores { level, json } => {
            let scores = manager.score_aggregator().ranked_scores(level).await;
            if json {
                match serde_json::to_string_pretty(&scores) {
                    Ok(out) => println!("{out}"),
                    Err(e) => {
                        log::error!("Could not serialize scores: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", format_table(&scores));
            }
            ExitCode::SUCCESS
        }
    }
}

fn format_table(scores: &[Score]) -> String {
    let mut out = String::new();
    for (rank, score) in scores.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<20} best {:>10.3}  last {:>10.3}\n",
            rank + 1,
            score.player_name,
            score.best_time,
            score.last_time
        ));
    }
    out
}
