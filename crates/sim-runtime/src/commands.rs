//! Command processor: validate-then-apply player actions.
//!
//! [`apply`] is pure. It either returns the complete next state or a
//! [`Rejection`] describing the failed precondition, in which case the
//! caller keeps the state it already has. Re-issuing a rejected command is
//! always safe.

use sim_core::{AssetId, GameState, ManagerId, Millis, UpgradeId};
use sim_econ::{covers_cost, income_rate};
use thiserror::Error;

/// A player-initiated mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Buy `count` levels for the quoted `expected_cost`.
    BuyAsset {
        asset: AssetId,
        count: u32,
        expected_cost: f64,
    },
    /// Start a manual production cycle.
    ManualProduce { asset: AssetId },
    BuyManager { manager: ManagerId },
    BuyUpgrade { upgrade: UpgradeId },
}

/// Why a command left the state unchanged.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),
    #[error("unknown manager {0}")]
    UnknownManager(ManagerId),
    #[error("unknown upgrade {0}")]
    UnknownUpgrade(UpgradeId),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("asset {0} is locked")]
    Locked(AssetId),
    #[error("purchase needs a positive count and a finite, non-negative cost")]
    InvalidQuote,
    #[error("quoted cost is below the current price of asset {0}")]
    StaleQuote(AssetId),
    #[error("asset {0} has no levels")]
    NotOwned(AssetId),
    #[error("asset {0} is run by a manager")]
    Automated(AssetId),
    #[error("asset {0} already has a cycle in flight")]
    Busy(AssetId),
    #[error("{0} is already owned")]
    AlreadyOwned(String),
}

fn ensure_funds(state: &GameState, needed: f64) -> Result<(), Rejection> {
    if state.cash < needed {
        return Err(Rejection::InsufficientFunds {
            needed,
            available: state.cash,
        });
    }
    Ok(())
}

/// Apply `command` at time `now`, returning the next state.
pub fn apply(state: &GameState, command: &Command, now: Millis) -> Result<GameState, Rejection> {
    match command {
        Command::BuyAsset {
            asset,
            count,
            expected_cost,
        } => buy_asset(state, asset, *count, *expected_cost),
        Command::ManualProduce { asset } => manual_produce(state, asset, now),
        Command::BuyManager { manager } => buy_manager(state, manager),
        Command::BuyUpgrade { upgrade } => buy_upgrade(state, upgrade),
    }
}

fn buy_asset(
    state: &GameState,
    id: &AssetId,
    count: u32,
    expected_cost: f64,
) -> Result<GameState, Rejection> {
    let idx = state
        .asset_index(id)
        .ok_or_else(|| Rejection::UnknownAsset(id.clone()))?;
    if count == 0 || !expected_cost.is_finite() || expected_cost < 0.0 {
        return Err(Rejection::InvalidQuote);
    }
    ensure_funds(state, expected_cost)?;
    let asset = &state.assets[idx];
    if !asset.unlocked {
        return Err(Rejection::Locked(id.clone()));
    }
    if !covers_cost(expected_cost, asset.base_cost, asset.level, count) {
        return Err(Rejection::StaleQuote(id.clone()));
    }

    let mut next = state.clone();
    next.cash -= expected_cost;
    next.assets[idx].level = asset.level.saturating_add(count);
    // unlock propagation looks exactly one asset ahead
    if next.assets[idx].level > 0 {
        if let Some(following) = next.assets.get_mut(idx + 1) {
            following.unlocked = true;
        }
    }
    Ok(next)
}

fn manual_produce(state: &GameState, id: &AssetId, now: Millis) -> Result<GameState, Rejection> {
    let idx = state
        .asset_index(id)
        .ok_or_else(|| Rejection::UnknownAsset(id.clone()))?;
    let asset = &state.assets[idx];
    if asset.level == 0 {
        return Err(Rejection::NotOwned(id.clone()));
    }
    if state.is_automated(id) {
        return Err(Rejection::Automated(id.clone()));
    }
    if asset.cycle_in_flight() {
        return Err(Rejection::Busy(id.clone()));
    }

    let mut next = state.clone();
    // 0 is the idle sentinel
    next.assets[idx].last_produced_time = now.max(1);
    Ok(next)
}

fn buy_manager(state: &GameState, id: &ManagerId) -> Result<GameState, Rejection> {
    let idx = state
        .managers
        .iter()
        .position(|m| &m.id == id)
        .ok_or_else(|| Rejection::UnknownManager(id.clone()))?;
    let manager = &state.managers[idx];
    if manager.owned {
        return Err(Rejection::AlreadyOwned(id.to_string()));
    }
    ensure_funds(state, manager.cost)?;

    let mut next = state.clone();
    next.cash -= manager.cost;
    next.managers[idx].owned = true;

    // An in-flight manual cycle is settled now so the asset enters
    // automation with no cycle armed.
    if let Some(a) = next.asset_index(&manager.target_asset_id) {
        if next.assets[a].cycle_in_flight() {
            let payout = income_rate(&next, &next.assets[a]);
            next.cash += payout;
            next.assets[a].last_produced_time = 0;
        }
    }
    Ok(next)
}

fn buy_upgrade(state: &GameState, id: &UpgradeId) -> Result<GameState, Rejection> {
    let idx = state
        .upgrades
        .iter()
        .position(|u| &u.id == id)
        .ok_or_else(|| Rejection::UnknownUpgrade(id.clone()))?;
    let upgrade = &state.upgrades[idx];
    if upgrade.owned {
        return Err(Rejection::AlreadyOwned(id.to_string()));
    }
    ensure_funds(state, upgrade.cost)?;

    let mut next = state.clone();
    next.cash -= upgrade.cost;
    next.upgrades[idx].owned = true;
    Ok(next)
}
