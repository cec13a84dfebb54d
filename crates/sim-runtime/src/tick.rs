//! Tick processor: advances the store by one scheduled step.
//!
//! All time-based decisions compare the current wall-clock time against
//! timestamps stored on the entities, never against a tick counter, so a
//! late, skipped or irregular tick still completes cycles at the right
//! moment and credits automated income for the real elapsed time.

use serde::Serialize;
use sim_core::{Asset, AssetId, GameState, Millis};
use sim_econ::{automated_accrual, income_rate};

/// Production state of one asset at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetPhase {
    /// Not owned, or owned and waiting for a manual start.
    Idle,
    /// Manager owned; accrues continuously.
    Automated,
    /// Manual cycle running.
    Producing,
    /// Manual cycle elapsed; pays out on the next tick.
    Complete,
}

/// Classify `asset` at time `now`.
///
/// A cycle started while the clock read 0 is stamped 1 (0 means idle), so
/// it completes at `production_time + 1`.
pub fn phase(state: &GameState, asset: &Asset, now: Millis) -> AssetPhase {
    if asset.level == 0 {
        return AssetPhase::Idle;
    }
    if state.is_automated(&asset.id) {
        return AssetPhase::Automated;
    }
    if !asset.cycle_in_flight() {
        return AssetPhase::Idle;
    }
    if now.saturating_sub(asset.last_produced_time) >= asset.production_time {
        AssetPhase::Complete
    } else {
        AssetPhase::Producing
    }
}

/// Result of [`advance`]: the next state plus what happened to get there.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    pub state: GameState,
    /// Total cash credited this tick.
    pub credited: f64,
    /// Assets whose manual cycle paid out this tick.
    pub completed: Vec<AssetId>,
    /// The save threshold elapsed; `state.last_save_time` is now `now`.
    pub save_due: bool,
}

/// Compute the state after a tick at `now`, the previous tick having run at
/// `last_tick`.
///
/// - Automated assets earn `income_rate x elapsed` and never hold a cycle.
/// - Manual cycles that reached `production_time` pay `income_rate` once and
///   return to idle.
/// - Cash is credited once for the whole tick.
pub fn advance(
    state: &GameState,
    last_tick: Millis,
    now: Millis,
    save_interval_ms: Millis,
) -> TickOutcome {
    let elapsed = now.saturating_sub(last_tick).max(0);
    let mut next = state.clone();
    let mut credited = 0.0;
    let mut completed = Vec::new();

    for (i, asset) in state.assets.iter().enumerate() {
        match phase(state, asset, now) {
            AssetPhase::Automated => {
                credited += automated_accrual(income_rate(state, asset), elapsed);
                next.assets[i].last_produced_time = 0;
            }
            AssetPhase::Complete => {
                credited += income_rate(state, asset);
                next.assets[i].last_produced_time = 0;
                completed.push(asset.id.clone());
            }
            AssetPhase::Idle | AssetPhase::Producing => {}
        }
    }
    next.cash += credited;

    let save_due = now.saturating_sub(state.last_save_time) > save_interval_ms;
    if save_due {
        next.last_save_time = now;
    }

    TickOutcome {
        state: next,
        credited,
        completed,
        save_due,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{initial_state, Catalog, SimConfig};

    const SAVE: Millis = 10_000;

    fn state_at(t: Millis) -> GameState {
        initial_state(&Catalog::builtin(), &SimConfig::default(), t)
    }

    #[test]
    fn manual_cycle_pays_once_on_completion() {
        let mut s = state_at(0);
        s.cash = 0.0;
        s.assets[0].level = 1;
        s.assets[0].last_produced_time = 1;

        let mid = advance(&s, 1, 500, SAVE);
        assert_eq!(mid.credited, 0.0);
        assert_eq!(phase(&mid.state, &mid.state.assets[0], 500), AssetPhase::Producing);
        assert_eq!(mid.state.assets[0].last_produced_time, 1);

        let done = advance(&mid.state, 500, 1_001, SAVE);
        assert_eq!(done.credited, 1.0);
        assert_eq!(done.state.cash, 1.0);
        assert_eq!(done.completed, vec![s.assets[0].id.clone()]);
        assert_eq!(done.state.assets[0].last_produced_time, 0);

        let after = advance(&done.state, 1_001, 1_101, SAVE);
        assert_eq!(after.credited, 0.0);
        assert_eq!(after.state.cash, 1.0);
    }

    #[test]
    fn late_tick_still_completes_cycle() {
        let mut s = state_at(0);
        s.assets[1].level = 2;
        s.assets[1].last_produced_time = 100;
        // no tick for a long time, e.g. a suspended process
        let out = advance(&s, 100, 9_000, SAVE);
        assert_eq!(out.completed.len(), 1);
        assert_eq!(out.credited, 10.0);
    }

    #[test]
    fn automated_asset_accrues_per_tick() {
        let mut s = state_at(0);
        s.cash = 0.0;
        s.assets[0].level = 2;
        s.managers[0].owned = true;
        let mut t = 0;
        for _ in 0..10 {
            let out = advance(&s, t, t + 100, SAVE);
            assert!((out.credited - 0.2).abs() < 1e-12);
            assert_eq!(out.state.assets[0].last_produced_time, 0);
            s = out.state;
            t += 100;
        }
        assert!((s.cash - 2.0).abs() < 1e-9);
    }

    #[test]
    fn automated_asset_drops_stale_cycle_without_payout() {
        let mut s = state_at(0);
        s.cash = 0.0;
        s.assets[0].level = 1;
        s.assets[0].last_produced_time = 10;
        s.managers[0].owned = true;
        let out = advance(&s, 5_000, 5_000, SAVE);
        assert_eq!(out.credited, 0.0);
        assert!(out.completed.is_empty());
        assert_eq!(out.state.assets[0].last_produced_time, 0);
    }

    #[test]
    fn multipliers_apply_to_manual_and_automated_income() {
        let mut s = state_at(0);
        s.cash = 0.0;
        s.upgrades[0].owned = true; // x3 gas royalties
        s.upgrades[4].owned = true; // x1.5 global
        s.assets[0].level = 1;
        s.assets[0].last_produced_time = 1;
        let out = advance(&s, 0, 1_001, SAVE);
        assert_eq!(out.credited, 4.5);

        let mut s = out.state;
        s.managers[0].owned = true;
        let out = advance(&s, 1_001, 2_001, SAVE);
        assert_eq!(out.credited, 4.5);
    }

    #[test]
    fn idle_and_unowned_assets_are_untouched() {
        let mut s = state_at(0);
        s.assets[0].level = 3;
        let out = advance(&s, 0, 5_000, SAVE);
        assert_eq!(out.state, s);
        assert_eq!(phase(&s, &s.assets[0], 5_000), AssetPhase::Idle);
        assert_eq!(phase(&s, &s.assets[1], 5_000), AssetPhase::Idle);
    }

    #[test]
    fn save_threshold_is_strict() {
        let s = state_at(0);
        let out = advance(&s, 0, SAVE, SAVE);
        assert!(!out.save_due);
        assert_eq!(out.state.last_save_time, 0);

        let out = advance(&s, 0, SAVE + 1, SAVE);
        assert!(out.save_due);
        assert_eq!(out.state.last_save_time, SAVE + 1);
    }

    #[test]
    fn clock_going_backwards_credits_nothing() {
        let mut s = state_at(0);
        s.assets[0].level = 5;
        s.managers[0].owned = true;
        let out = advance(&s, 2_000, 1_000, SAVE);
        assert_eq!(out.credited, 0.0);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let mut s = state_at(0);
        s.last_save_time = i64::MIN;
        s.assets[0].level = 1;
        s.assets[0].last_produced_time = i64::MIN;
        assert_eq!(phase(&s, &s.assets[0], i64::MAX), AssetPhase::Complete);

        let out = advance(&s, i64::MIN, i64::MAX, SAVE);
        assert!(out.save_due);
        assert_eq!(out.credited, 1.0);
        assert_eq!(out.state.last_save_time, i64::MAX);
    }
}
