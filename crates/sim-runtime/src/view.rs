//! Read-only projection of the state for a presentation layer.

use crate::tick::{phase, AssetPhase};
use serde::Serialize;
use sim_core::{GameState, Millis};
use sim_econ::{income_rate, next_level_cost, total_income_rate};

/// Production progress as a display hint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Idle,
    /// Share of the running manual cycle, 0..=100.
    Percent(f64),
    /// Automated; there is no cycle, only continuous accrual.
    Looping,
}

impl Progress {
    /// Fill level for a progress bar.
    pub fn percent(&self) -> f64 {
        match self {
            Progress::Idle => 0.0,
            Progress::Percent(p) => *p,
            Progress::Looping => 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetView {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub unlocked: bool,
    /// Locked assets show only once the asset before them is owned.
    pub visible: bool,
    pub automated: bool,
    pub cycle_in_flight: bool,
    pub income_per_sec: f64,
    pub next_cost: f64,
    pub progress: Progress,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManagerView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target: String,
    pub cost: f64,
    pub owned: bool,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpgradeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target: String,
    pub cost: f64,
    pub multiplier: f64,
    pub owned: bool,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameView {
    pub cash: f64,
    pub income_per_sec: f64,
    pub assets: Vec<AssetView>,
    pub managers: Vec<ManagerView>,
    pub upgrades: Vec<UpgradeView>,
}

fn progress(state: &GameState, idx: usize, now: Millis) -> Progress {
    let asset = &state.assets[idx];
    match phase(state, asset, now) {
        AssetPhase::Idle => Progress::Idle,
        AssetPhase::Automated => Progress::Looping,
        AssetPhase::Complete => Progress::Percent(100.0),
        AssetPhase::Producing => {
            let elapsed = now.saturating_sub(asset.last_produced_time).max(0) as f64;
            let pct = elapsed / asset.production_time as f64 * 100.0;
            Progress::Percent(pct.clamp(0.0, 100.0))
        }
    }
}

/// Project `state` at time `now`.
pub fn build_view(state: &GameState, now: Millis) -> GameView {
    let assets = state
        .assets
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let prev_owned = i
                .checked_sub(1)
                .map_or(true, |p| state.assets[p].level > 0);
            let p = progress(state, i, now);
            AssetView {
                id: a.id.to_string(),
                name: a.name.clone(),
                level: a.level,
                unlocked: a.unlocked,
                visible: a.unlocked || prev_owned,
                automated: state.is_automated(&a.id),
                cycle_in_flight: matches!(p, Progress::Percent(_)),
                income_per_sec: income_rate(state, a),
                next_cost: next_level_cost(a.base_cost, a.level),
                progress: p,
            }
        })
        .collect();

    let managers = state
        .managers
        .iter()
        .map(|m| ManagerView {
            id: m.id.to_string(),
            name: m.name.clone(),
            description: m.description.clone(),
            target: m.target_asset_id.to_string(),
            cost: m.cost,
            owned: m.owned,
            affordable: !m.owned && state.cash >= m.cost,
        })
        .collect();

    let upgrades = state
        .upgrades
        .iter()
        .map(|u| UpgradeView {
            id: u.id.to_string(),
            name: u.name.clone(),
            description: u.description.clone(),
            target: String::from(u.target.clone()),
            cost: u.cost,
            multiplier: u.multiplier,
            owned: u.owned,
            affordable: !u.owned && state.cash >= u.cost,
        })
        .collect();

    GameView {
        cash: state.cash,
        income_per_sec: total_income_rate(state),
        assets,
        managers,
        upgrades,
    }
}
