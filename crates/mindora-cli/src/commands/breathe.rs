use std::future::Future;
use std::time::Duration;

use clap::Subcommand;
use mindora_core::{BreathingEngine, Config, Database, Event};

use super::{open_database, print_event};

#[derive(Subcommand)]
pub enum BreatheAction {
    /// List available exercises as JSON
    List,
    /// Print the saved state of an exercise
    Status {
        /// Exercise id (defaults to breathing.default_exercise)
        exercise: Option<String>,
    },
    /// Run an exercise in the foreground until it completes; Ctrl-C pauses
    Start {
        /// Exercise id (defaults to breathing.default_exercise)
        exercise: Option<String>,
    },
    /// Apply seconds immediately without waiting, then pause
    Advance {
        /// Exercise id (defaults to breathing.default_exercise)
        exercise: Option<String>,
        /// Number of one-second ticks to apply
        #[arg(long, default_value = "1")]
        seconds: u32,
    },
    /// Save the current position of an exercise
    Pause {
        /// Exercise id (defaults to breathing.default_exercise)
        exercise: Option<String>,
    },
    /// Discard saved progress and return to the first phase
    Reset {
        /// Exercise id (defaults to breathing.default_exercise)
        exercise: Option<String>,
    },
}

fn open_engine<'a>(
    config: &Config,
    db: &'a Database,
    exercise: Option<String>,
) -> Result<BreathingEngine<&'a Database>, Box<dyn std::error::Error>> {
    let id = exercise.unwrap_or_else(|| config.breathing.default_exercise.clone());
    let exercise = config.exercise(&id)?;
    let mut engine = BreathingEngine::new(exercise, db)?
        .with_log_key(config.storage.log_key.clone())
        .with_tick_interval(Duration::from_millis(config.breathing.tick_interval_ms));
    let opened = engine.open();
    tracing::debug!(event = opened.kind(), session = %id, "opened exercise");
    Ok(engine)
}

fn should_print(config: &Config, event: &Event) -> bool {
    config.breathing.announce_phases || !matches!(event, Event::PhaseChanged { .. })
}

/// Drive a session on its own interval until it completes or `interrupt`
/// resolves, which pauses it.
async fn run_live<F: Future>(
    config: &Config,
    engine: &mut BreathingEngine<&Database>,
    interrupt: F,
) -> Result<(), Box<dyn std::error::Error>> {
    enum Step {
        Tick(Option<Event>),
        Interrupted,
    }

    if let Some(event) = engine.start() {
        print_event(&event)?;
    }

    tokio::pin!(interrupt);

    while engine.is_running() {
        let step = tokio::select! {
            event = engine.next_tick() => Step::Tick(event),
            _ = &mut interrupt => Step::Interrupted,
        };
        match step {
            Step::Tick(Some(event)) if should_print(config, &event) => print_event(&event)?,
            Step::Tick(_) => {}
            Step::Interrupted => {
                if let Some(event) = engine.stop() {
                    print_event(&event)?;
                }
                break;
            }
        }
    }
    Ok(())
}

pub fn run(action: BreatheAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        BreatheAction::List => {
            let exercises = config.exercises()?;
            println!("{}", serde_json::to_string_pretty(&exercises)?);
        }
        BreatheAction::Status { exercise } => {
            let db = open_database(&config)?;
            let engine = open_engine(&config, &db, exercise)?;
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        BreatheAction::Start { exercise } => {
            let db = open_database(&config)?;
            let mut engine = open_engine(&config, &db, exercise)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(&config, &mut engine, tokio::signal::ctrl_c()))?;
            println!("{}", serde_json::to_string(&engine.snapshot())?);
        }
        BreatheAction::Advance { exercise, seconds } => {
            let db = open_database(&config)?;
            let mut engine = open_engine(&config, &db, exercise)?;
            engine.start();
            for _ in 0..seconds {
                if !engine.is_running() {
                    break;
                }
                if let Some(event) = engine.tick() {
                    if should_print(&config, &event) {
                        print_event(&event)?;
                    }
                }
            }
            engine.pause();
            println!("{}", serde_json::to_string(&engine.snapshot())?);
        }
        BreatheAction::Pause { exercise } => {
            let db = open_database(&config)?;
            let mut engine = open_engine(&config, &db, exercise)?;
            engine.pause();
            println!("{}", serde_json::to_string(&engine.snapshot())?);
        }
        BreatheAction::Reset { exercise } => {
            let db = open_database(&config)?;
            let mut engine = open_engine(&config, &db, exercise)?;
            print_event(&engine.reset())?;
        }
    }
    Ok(())
}
