use clap::Parser;
use fungera::cli::{Cli, Command};
use fungera::config::EngineConfig;
use fungera::engine::Engine;
use fungera::error::FungeraError;
use fungera::tui::Tui;
use log::{error, info, warn};
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), FungeraError> {
    let command = cli.command.unwrap_or(Command::Run {
        config: None,
        genome: None,
        load_snapshot: None,
        cycles: None,
    });

    let Command::Run {
        config,
        genome,
        load_snapshot,
        cycles,
    } = command;

    let config = match config {
        Some(path) => EngineConfig::load(&path)?,
        None => {
            warn!("no --config given, using defaults");
            EngineConfig::default()
        }
    };

    let mut engine = Engine::new(config.clone());

    match (genome, load_snapshot) {
        (_, Some(snapshot_path)) => engine.load(&snapshot_path)?,
        (Some(genome_path), None) => {
            let genome = load_genome_file(&genome_path)?;
            engine.load_ancestor(&genome)?;
        }
        (None, None) => {
            return Err(FungeraError::MalformedGenome {
                reason: "either --genome or --load-snapshot is required".to_string(),
            });
        }
    }

    let headless = cli.headless || cycles.is_some();
    if headless {
        let steps = cycles.unwrap_or(1);
        info!("running {} ticks headlessly", steps);
        for _ in 0..steps {
            engine.step();
        }
        println!(
            "cycle={} population={}",
            engine.cycle(),
            engine.queue().len()
        );
    } else {
        engine.set_minimal(false);
        engine.set_running(true);
        let mut tui = Tui::new(config.scroll_step);
        tui.run(&mut engine)?;
    }

    Ok(())
}

fn load_genome_file(path: &PathBuf) -> Result<Vec<Vec<char>>, FungeraError> {
    let text = std::fs::read_to_string(path)?;
    let genome: Vec<Vec<char>> = text.lines().map(|line| line.chars().collect()).collect();
    if genome.is_empty() {
        return Err(FungeraError::MalformedGenome {
            reason: format!("{} is empty", path.display()),
        });
    }
    Ok(genome)
}
