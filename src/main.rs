//! Warrior Rimer headless entry point
//!
//! Runs one autopilot session and logs the outcome.
//!
//! Usage: warrior-rimer [--seed N] [--difficulty easy|normal|hard|0-20]
//!                      [--ticks N] [--settings FILE] [--save FILE]
//!                      [--achievements FILE] [--continue]

use warrior_rimer::achievements::{AchievementLedger, AchievementTracker};
use warrior_rimer::effects::LogEffectSink;
use warrior_rimer::persistence::{JsonFileStore, RunStore};
use warrior_rimer::sim::TickInput;
use warrior_rimer::{DifficultyMode, Session, Settings};

/// Ten simulated minutes
const DEFAULT_TICK_BUDGET: u64 = 60 * 60 * 10;

struct Args {
    seed: Option<u64>,
    difficulty: Option<DifficultyMode>,
    ticks: u64,
    settings: Option<String>,
    save: String,
    achievements: String,
    resume: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            seed: None,
            difficulty: None,
            ticks: DEFAULT_TICK_BUDGET,
            settings: None,
            save: "game_data.json".to_string(),
            achievements: "achievement_data.json".to_string(),
            resume: false,
        }
    }
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--continue" => args.resume = true,
            "--seed" | "--difficulty" | "--ticks" | "--settings" | "--save" | "--achievements" => {
                let Some(value) = it.next() else {
                    log::warn!("{} needs a value", flag);
                    continue;
                };
                match flag.as_str() {
                    "--seed" => args.seed = value.parse().ok(),
                    "--difficulty" => {
                        args.difficulty = DifficultyMode::from_str(&value);
                        if args.difficulty.is_none() {
                            log::warn!("unknown difficulty '{}', using settings", value);
                        }
                    }
                    "--ticks" => args.ticks = value.parse().unwrap_or(DEFAULT_TICK_BUDGET),
                    "--settings" => args.settings = Some(value),
                    "--save" => args.save = value,
                    _ => args.achievements = value,
                }
            }
            other => log::warn!("ignoring argument '{}'", other),
        }
    }
    args
}

fn main() {
    env_logger::init();
    log::info!("Warrior Rimer (headless) starting...");

    let args = parse_args();
    let mut settings = args
        .settings
        .as_deref()
        .map(Settings::load)
        .unwrap_or_default();
    if let Some(mode) = args.difficulty {
        settings.difficulty = mode;
    }
    let seed = args.seed.or(settings.seed).unwrap_or_else(rand::random);
    log::info!("seed {} difficulty {}", seed, settings.difficulty.label());

    let store = JsonFileStore::open(&args.save);
    let tracker = AchievementLedger::open(&args.achievements);
    let mut effects = LogEffectSink::new();
    effects.set_muted(settings.mute_effects);

    let config = settings.run_config();
    let mut session = if args.resume {
        Session::resume(seed, config, store, tracker, effects)
    } else {
        Session::start(seed, config, store, tracker, effects)
    };

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut ticks = 0;
    while !session.is_finished() && ticks < args.ticks {
        session.step(&input);
        ticks += 1;
        while let Some(achievement) = session.tracker_mut().pop_notification() {
            log::info!("Achievement: {} - {}", achievement.name, achievement.description);
        }
    }

    let state = session.state();
    log::info!(
        "{:?} after {} ticks: floor {} room {} score {} gold {} kills {} bosses {}",
        state.phase,
        ticks,
        state.scheduler.floor,
        state.scheduler.room,
        state.player.score,
        state.player.gold,
        state.kills,
        state.boss_kills
    );
    if let Some(cause) = state.death_cause {
        log::info!("cause: {}", cause.description());
    }

    if !session.is_finished() {
        match session.save_and_quit() {
            Ok(_) => log::info!("tick budget spent, run saved to {}", args.save),
            Err(e) => log::warn!("could not save run: {}", e),
        }
    }
    log::info!(
        "high score {} ({} runs on record)",
        session.store().query_high_score(),
        session.store().query_history().len()
    );
}
