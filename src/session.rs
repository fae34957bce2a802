//! Run session: one run plus its injected collaborators
//!
//! Lifecycle: `start` (or `resume`) → `step` per tick → the run ends on
//! GameOver/Victory, at which point the result is recorded exactly once.
//! `save_and_quit` stores a snapshot instead of recording a result.

use crate::achievements::{AchievementTracker, ProgressCategory};
use crate::effects::{Effect, EffectSink};
use crate::persistence::{PersistenceError, RunStore};
use crate::sim::{GameEvent, GamePhase, GameState, RunConfig, RunSnapshot, TickInput, tick};

pub struct Session<S: RunStore, T: AchievementTracker, E: EffectSink> {
    state: GameState,
    store: S,
    tracker: T,
    effects: E,
    /// Result already written to the store
    recorded: bool,
}

impl<S: RunStore, T: AchievementTracker, E: EffectSink> Session<S, T, E> {
    /// Begin a fresh run
    pub fn start(seed: u64, config: RunConfig, store: S, tracker: T, effects: E) -> Self {
        let state = GameState::new(seed, config);
        Self::begin(state, store, tracker, effects)
    }

    /// Continue the run saved in the store, or begin a fresh one if there
    /// is none
    pub fn resume(seed: u64, config: RunConfig, store: S, tracker: T, effects: E) -> Self {
        let state = match store.load_last_saved_run() {
            Some(snapshot) => snapshot.restore(seed, config),
            None => {
                log::info!("no saved run, starting fresh");
                GameState::new(seed, config)
            }
        };
        Self::begin(state, store, tracker, effects)
    }

    fn begin(state: GameState, store: S, mut tracker: T, effects: E) -> Self {
        tracker.report_progress(ProgressCategory::GameStart, 1);
        let mut session = Self {
            state,
            store,
            tracker,
            effects,
            recorded: false,
        };
        // Room-start events queued while the state was built
        session.dispatch_events();
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access, for tests and tooling
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase.is_terminal()
    }

    /// Advance one tick and notify collaborators
    pub fn step(&mut self, input: &TickInput) -> GamePhase {
        tick(&mut self.state, input);
        self.dispatch_events();
        if self.is_finished() && !self.recorded {
            self.finish();
        }
        self.state.phase
    }

    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            if let Some(effect) = Effect::from_event(&event) {
                if let Err(e) = self.effects.play(effect) {
                    log::warn!("effect {:?} failed: {}", effect, e);
                }
            }
            match event {
                GameEvent::EnemyKilled { source, .. } => {
                    self.tracker.report_progress(ProgressCategory::KillCount, 1);
                    if let Some(weapon) = source.weapon() {
                        self.tracker
                            .report_progress(ProgressCategory::WeaponKill(weapon), 1);
                    }
                }
                GameEvent::BossKilled => {
                    self.tracker.report_progress(ProgressCategory::BossKill, 1);
                }
                GameEvent::FloorReached { floor } => {
                    self.tracker
                        .report_progress(ProgressCategory::Floor, floor as u64);
                }
                _ => {}
            }
        }
    }

    /// End-of-run reporting and the single history record
    fn finish(&mut self) {
        self.recorded = true;
        let state = &self.state;
        let score = state.player.score;
        let floor = state.scheduler.floor;

        self.tracker.report_progress(
            ProgressCategory::SurvivalTime,
            state.survival_secs().floor() as u64,
        );
        self.tracker.report_progress(ProgressCategory::Score, score);
        self.tracker.report_progress(ProgressCategory::Floor, floor as u64);
        self.tracker.report_progress(
            ProgressCategory::Difficulty,
            state.config.achievement_level() as u64,
        );
        if state.phase == GamePhase::Victory {
            self.tracker.report_progress(ProgressCategory::GameComplete, 1);
        }

        let label = state.config.label();
        if let Err(e) = self.store.record_completed_run(score, &label, floor) {
            log::warn!("could not record run: {}", e);
        }
        log::info!(
            "run finished: {:?} score {} floor {} ({})",
            state.phase,
            score,
            floor,
            label
        );
    }

    /// Store a snapshot of the unfinished run. Finished runs have nothing
    /// to save and are left alone.
    pub fn save_and_quit(&mut self) -> Result<Option<RunSnapshot>, PersistenceError> {
        if self.is_finished() {
            return Ok(None);
        }
        let snapshot = RunSnapshot::capture(&self.state);
        self.store.save_run_snapshot(&snapshot)?;
        Ok(Some(snapshot))
    }

    /// Hand the collaborators back
    pub fn into_parts(self) -> (GameState, S, T, E) {
        (self.state, self.store, self.tracker, self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{AchievementLedger, NullTracker};
    use crate::effects::{EffectError, NullEffectSink};
    use crate::persistence::MemoryStore;
    use crate::sim::{HitTarget, PowerUpKind, Skill, Weapon};
    use glam::Vec2;

    /// Sink whose every call fails
    struct BrokenSink {
        calls: u32,
    }

    impl BrokenSink {
        fn fail(&mut self) -> Result<(), EffectError> {
            self.calls += 1;
            Err(EffectError::Unavailable("no device".into()))
        }
    }

    impl EffectSink for BrokenSink {
        fn on_shot(&mut self, _: Weapon) -> Result<(), EffectError> {
            self.fail()
        }
        fn on_explosion(&mut self, _: Vec2, _: f32) -> Result<(), EffectError> {
            self.fail()
        }
        fn on_hit(&mut self, _: HitTarget) -> Result<(), EffectError> {
            self.fail()
        }
        fn on_powerup(&mut self, _: PowerUpKind) -> Result<(), EffectError> {
            self.fail()
        }
        fn on_skill_activate(&mut self, _: Skill) -> Result<(), EffectError> {
            self.fail()
        }
        fn on_boss_spawn(&mut self) -> Result<(), EffectError> {
            self.fail()
        }
    }

    fn kill_player<S: RunStore, T: AchievementTracker, E: EffectSink>(session: &mut Session<S, T, E>) {
        session.state_mut().player.health = 0;
        let p = session.state().player.pos;
        session
            .state_mut()
            .enemy_bullets
            .push(crate::sim::Bullet::enemy(p, 0.0));
    }

    #[test]
    fn test_start_reports_game_start() {
        let session = Session::start(
            1,
            RunConfig::default(),
            MemoryStore::new(),
            AchievementLedger::in_memory(),
            NullEffectSink,
        );
        assert_eq!(session.tracker().stats().game_count, 1);
        assert!(session.tracker().is_unlocked("first_game"));
    }

    #[test]
    fn test_run_recorded_exactly_once() {
        let mut session = Session::start(
            1,
            RunConfig::default(),
            MemoryStore::new(),
            AchievementLedger::in_memory(),
            NullEffectSink,
        );
        session.state_mut().player.score = 420;
        kill_player(&mut session);
        assert_eq!(session.step(&TickInput::default()), GamePhase::GameOver);
        session.step(&TickInput::default());
        session.step(&TickInput::default());

        let history = session.store().query_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 420);
        assert_eq!(history[0].difficulty, "Normal");
        assert_eq!(session.store().query_high_score(), 420);
        assert_eq!(session.tracker().stats().max_score, 420);
        assert_eq!(session.tracker().stats().max_difficulty, 5);
        assert_eq!(session.tracker().stats().game_completions, 0);
    }

    #[test]
    fn test_failing_effects_never_abort() {
        let mut session = Session::start(
            3,
            RunConfig::default(),
            MemoryStore::new(),
            NullTracker,
            BrokenSink { calls: 0 },
        );
        session.state_mut().walls.clear();
        let fire = TickInput {
            fire_key: true,
            ..Default::default()
        };
        session.step(&fire);
        assert_eq!(session.phase(), GamePhase::Fighting);
        assert!(session.effects().calls >= 1);
        assert_eq!(session.state().bullets.len(), 1);
    }

    #[test]
    fn test_save_and_resume() {
        let mut session = Session::start(
            5,
            RunConfig::default(),
            MemoryStore::new(),
            NullTracker,
            NullEffectSink,
        );
        session.state_mut().player.gold = 64;
        let snapshot = session.save_and_quit().unwrap();
        assert!(snapshot.is_some());

        let (_, store, tracker, effects) = session.into_parts();
        assert!(store.load_last_saved_run().is_some());
        let resumed = Session::resume(6, RunConfig::default(), store, tracker, effects);
        assert_eq!(resumed.state().player.gold, 64);
    }

    #[test]
    fn test_finished_run_clears_snapshot() {
        let mut store = MemoryStore::new();
        store.save_run_snapshot(&RunSnapshot::default()).unwrap();
        let mut session = Session::resume(
            5,
            RunConfig::default(),
            store,
            NullTracker,
            NullEffectSink,
        );
        kill_player(&mut session);
        session.step(&TickInput::default());
        assert!(session.is_finished());
        assert!(session.store().load_last_saved_run().is_none());
        assert_eq!(session.save_and_quit().unwrap(), None);
    }

    #[test]
    fn test_kill_events_feed_tracker() {
        let mut session = Session::start(
            8,
            RunConfig::default(),
            MemoryStore::new(),
            AchievementLedger::in_memory(),
            NullEffectSink,
        );
        let state = session.state_mut();
        state.walls.clear();
        let id = state.next_entity_id();
        let mut enemy = crate::sim::Enemy::spawn(id, crate::sim::EnemyKind::Basic, 0, &[], &mut state.rng);
        enemy.health = 1;
        enemy.speed = 0.0;
        enemy.pos = Vec2::new(100.0, 100.0);
        state.enemies.push(enemy);
        crate::sim::combat::detonate_grenade(state, Vec2::new(100.0, 100.0), 50.0);

        session.step(&TickInput::default());
        let stats = session.tracker().stats();
        assert_eq!(stats.total_kills, 1);
        assert_eq!(stats.weapon_kills[Weapon::Grenade.index()], 1);
        assert!(session.tracker().is_unlocked("first_kill"));
    }
}
