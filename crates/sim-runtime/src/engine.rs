//! The entity store and its two writers.
//!
//! The current [`GameState`] lives behind one lock as an immutable `Arc`
//! together with a generation counter and the time of the last tick. Ticks
//! and commands compute a whole new state from the current one and install
//! it with a single replace while holding the write lock, so readers only
//! ever see a state before or after a complete update.

use crate::clock::Clock;
use crate::commands::{self, Command, Rejection};
use crate::tick;
use crate::view::{build_view, GameView};
use sim_core::{AssetId, GameState, ManagerId, Millis, SimConfig, UpgradeId};
use sim_econ::{quote, BuyQuantity, PurchaseQuote};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

struct Store {
    state: Arc<GameState>,
    generation: u64,
    last_tick: Millis,
}

/// Summary of one committed tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Store generation after the tick.
    pub generation: u64,
    pub credited: f64,
    pub completed: Vec<AssetId>,
    /// Post-tick snapshot to persist, when a save was due.
    pub save: Option<Arc<GameState>>,
}

/// Owns the game state and serializes every mutation of it.
pub struct Engine<C: Clock> {
    clock: C,
    config: SimConfig,
    store: RwLock<Store>,
}

impl<C: Clock> Engine<C> {
    /// Wrap `state` (fresh or restored).
    ///
    /// With `offline_accrual` the first tick credits automated income from
    /// the snapshot's `last_save_time`; otherwise time starts counting now.
    pub fn new(state: GameState, config: SimConfig, clock: C) -> Self {
        let now = clock.now();
        let last_tick = if config.offline_accrual {
            state.last_save_time.min(now)
        } else {
            now
        };
        Self {
            clock,
            config,
            store: RwLock::new(Store {
                state: Arc::new(state),
                generation: 0,
                last_tick,
            }),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The latest committed state.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.read().state)
    }

    /// Number of committed updates since construction.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Run one tick at the clock's current time.
    pub fn tick(&self) -> TickReport {
        self.tick_at(self.clock.now(), false)
    }

    /// Tick and force a save regardless of the autosave interval.
    ///
    /// Returns the snapshot to persist; its `last_save_time` is now.
    pub fn checkpoint(&self) -> Arc<GameState> {
        let report = self.tick_at(self.clock.now(), true);
        report.save.unwrap_or_else(|| self.snapshot())
    }

    fn tick_at(&self, now: Millis, force_save: bool) -> TickReport {
        let mut store = self.write();
        let mut outcome = tick::advance(
            &store.state,
            store.last_tick,
            now,
            self.config.save_interval_ms,
        );
        if force_save && !outcome.save_due {
            outcome.state.last_save_time = now;
            outcome.save_due = true;
        }

        let state = Arc::new(outcome.state);
        store.state = Arc::clone(&state);
        store.generation += 1;
        // never rewind, or the next tick would credit the same span twice
        store.last_tick = store.last_tick.max(now);

        if !outcome.completed.is_empty() {
            debug!(
                completed = ?outcome.completed,
                credited = outcome.credited,
                "production cycles completed"
            );
        }
        TickReport {
            generation: store.generation,
            credited: outcome.credited,
            completed: outcome.completed,
            save: outcome.save_due.then_some(state),
        }
    }

    /// Validate and apply `command`; on rejection nothing changes.
    pub fn execute(&self, command: Command) -> Result<(), Rejection> {
        let now = self.clock.now();
        let mut store = self.write();
        match commands::apply(&store.state, &command, now) {
            Ok(next) => {
                store.state = Arc::new(next);
                store.generation += 1;
                info!(?command, cash = store.state.cash, "command applied");
                Ok(())
            }
            Err(rejection) => {
                debug!(?command, %rejection, "command rejected");
                Err(rejection)
            }
        }
    }

    pub fn buy_asset(
        &self,
        asset: &AssetId,
        count: u32,
        expected_cost: f64,
    ) -> Result<(), Rejection> {
        self.execute(Command::BuyAsset {
            asset: asset.clone(),
            count,
            expected_cost,
        })
    }

    pub fn manual_produce(&self, asset: &AssetId) -> Result<(), Rejection> {
        self.execute(Command::ManualProduce {
            asset: asset.clone(),
        })
    }

    pub fn buy_manager(&self, manager: &ManagerId) -> Result<(), Rejection> {
        self.execute(Command::BuyManager {
            manager: manager.clone(),
        })
    }

    pub fn buy_upgrade(&self, upgrade: &UpgradeId) -> Result<(), Rejection> {
        self.execute(Command::BuyUpgrade {
            upgrade: upgrade.clone(),
        })
    }

    /// Price `mode` for `asset` against the current balance.
    pub fn quote(&self, asset: &AssetId, mode: BuyQuantity) -> Option<PurchaseQuote> {
        let state = self.snapshot();
        let a = state.asset(asset)?;
        Some(quote(a.base_cost, a.level, state.cash, mode))
    }

    /// Quote and buy in one step, the way a buy button would.
    pub fn buy_with(
        &self,
        asset: &AssetId,
        mode: BuyQuantity,
    ) -> Result<PurchaseQuote, Rejection> {
        let q = self
            .quote(asset, mode)
            .ok_or_else(|| Rejection::UnknownAsset(asset.clone()))?;
        self.buy_asset(asset, q.count, q.cost)?;
        Ok(q)
    }

    /// Presentation view of the current state.
    pub fn view(&self) -> GameView {
        build_view(&self.snapshot(), self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::tick::{phase, AssetPhase};
    use sim_core::{initial_state, Catalog};

    const T0: Millis = 1_700_000_000_000;

    fn engine() -> (Engine<ManualClock>, ManualClock) {
        let clock = ManualClock::new(T0);
        let config = SimConfig::default();
        let state = initial_state(&Catalog::builtin(), &config, T0);
        (Engine::new(state, config, clock.clone()), clock)
    }

    fn gas() -> AssetId {
        AssetId::from("gas_royalties")
    }

    #[test]
    fn buy_then_work_then_collect() {
        let (engine, clock) = engine();
        engine.buy_asset(&gas(), 1, 10.0).unwrap();
        let s = engine.snapshot();
        assert_eq!(s.cash, 0.0);
        assert_eq!(s.assets[0].level, 1);
        assert!(s.assets[1].unlocked);

        engine.manual_produce(&gas()).unwrap();
        assert_eq!(engine.manual_produce(&gas()), Err(Rejection::Busy(gas())));

        clock.advance(500);
        let r = engine.tick();
        assert_eq!(r.credited, 0.0);
        let s = engine.snapshot();
        assert_eq!(phase(&s, &s.assets[0], clock.now()), AssetPhase::Producing);

        clock.advance(500);
        let r = engine.tick();
        assert_eq!(r.credited, 1.0);
        assert_eq!(r.completed, vec![gas()]);
        let s = engine.snapshot();
        assert_eq!(s.cash, 1.0);
        assert_eq!(s.assets[0].last_produced_time, 0);
    }

    #[test]
    fn cycle_started_at_clock_zero_ends_one_ms_late() {
        let clock = ManualClock::new(0);
        let mut s = initial_state(&Catalog::builtin(), &SimConfig::default(), 0);
        s.cash = 0.0;
        s.assets[0].level = 1;
        let engine = Engine::new(s, SimConfig::default(), clock.clone());

        engine.manual_produce(&gas()).unwrap();
        assert_eq!(engine.snapshot().assets[0].last_produced_time, 1);
        clock.set(1_000);
        assert_eq!(engine.tick().credited, 0.0);
        clock.set(1_001);
        assert_eq!(engine.tick().credited, 1.0);
    }

    #[test]
    fn automated_income_at_ten_hertz() {
        let (engine, clock) = engine();
        engine.buy_asset(&gas(), 1, 10.0).unwrap();
        let mut s = (*engine.snapshot()).clone();
        s.assets[0].level = 2;
        s.managers[0].owned = true;
        let engine = Engine::new(s, SimConfig::default(), clock.clone());

        for i in 1..=20 {
            clock.advance(100);
            let r = engine.tick();
            assert!((r.credited - 0.2).abs() < 1e-12, "tick {i}");
        }
        let s = engine.snapshot();
        assert!((s.cash - 4.0).abs() < 1e-9);
        assert_eq!(s.assets[0].last_produced_time, 0);
    }

    #[test]
    fn rejected_command_does_not_bump_generation() {
        let (engine, _clock) = engine();
        let g = engine.generation();
        let before = engine.snapshot();
        assert!(engine.buy_asset(&gas(), 1, 11.0).is_err());
        assert!(engine.buy_asset(&gas(), 1, 11.0).is_err());
        assert_eq!(engine.generation(), g);
        assert!(Arc::ptr_eq(&before, &engine.snapshot()));

        engine.buy_asset(&gas(), 1, 10.0).unwrap();
        assert_eq!(engine.generation(), g + 1);
    }

    #[test]
    fn autosave_after_interval() {
        let (engine, clock) = engine();
        clock.advance(10_000);
        assert!(engine.tick().save.is_none());
        clock.advance(1);
        let saved = engine.tick().save.expect("save due");
        assert_eq!(saved.last_save_time, clock.now());
        assert_eq!(engine.snapshot().last_save_time, clock.now());
        clock.advance(100);
        assert!(engine.tick().save.is_none());
    }

    #[test]
    fn checkpoint_forces_save_stamp() {
        let (engine, clock) = engine();
        clock.advance(42);
        let snap = engine.checkpoint();
        assert_eq!(snap.last_save_time, T0 + 42);
        assert!(Arc::ptr_eq(&snap, &engine.snapshot()));
    }

    #[test]
    fn resume_credits_offline_time_once() {
        let (engine, clock) = engine();
        let mut s = (*engine.snapshot()).clone();
        s.cash = 0.0;
        s.assets[0].level = 1;
        s.managers[0].owned = true;
        s.last_save_time = T0;

        // back after a minute away
        clock.set(T0 + 60_000);
        let engine = Engine::new(s.clone(), SimConfig::default(), clock.clone());
        let first = engine.tick();
        assert!((first.credited - 60.0).abs() < 1e-9);
        let second = engine.tick();
        assert_eq!(second.credited, 0.0);

        let config = SimConfig {
            offline_accrual: false,
            ..SimConfig::default()
        };
        let engine = Engine::new(s, config, clock.clone());
        assert_eq!(engine.tick().credited, 0.0);
    }

    #[test]
    fn save_and_resume_without_drift() {
        let (engine, clock) = engine();
        let mut s = (*engine.snapshot()).clone();
        s.cash = 0.0;
        s.assets[0].level = 1;
        s.managers[0].owned = true;
        let engine = Engine::new(s, SimConfig::default(), clock.clone());

        clock.advance(5_000);
        let saved = (*engine.checkpoint()).clone();
        assert!((saved.cash - 5.0).abs() < 1e-9);

        // the restored session continues from the checkpoint
        clock.advance(5_000);
        let resumed = Engine::new(saved, SimConfig::default(), clock.clone());
        resumed.tick();
        assert!((resumed.snapshot().cash - 10.0).abs() < 1e-9);
    }

    #[test]
    fn buy_with_max_spends_what_it_quotes() {
        let (engine, _clock) = engine();
        let mut s = (*engine.snapshot()).clone();
        s.cash = 100.0;
        let engine = Engine::new(s, SimConfig::default(), ManualClock::new(T0));
        let q = engine.buy_with(&gas(), BuyQuantity::Max).unwrap();
        let s = engine.snapshot();
        assert_eq!(s.assets[0].level, q.count);
        assert!((s.cash - (100.0 - q.cost)).abs() < 1e-9);
        assert!(s.cash >= 0.0);
        assert!(engine.quote(&AssetId::from("nope"), BuyQuantity::One).is_none());
    }
}
