#![deny(warnings)]

//! Core domain models and invariants for Oil Tycoon.
//!
//! This crate defines the serializable entity records owned by the game
//! store (assets, managers, upgrades and the scalar economy fields) together
//! with validation helpers that guarantee the structural invariants the
//! simulation relies on.

mod catalog;

pub use catalog::{initial_state, Catalog};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Serialized form of [`UpgradeTarget::Global`].
pub const GLOBAL_TARGET: &str = "GLOBAL";

/// Epoch milliseconds. `0` marks "no timestamp" where a sentinel is needed.
pub type Millis = i64;

/// Stable identifier of an asset, e.g. "gas_royalties".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

/// Stable identifier of a manager.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerId(pub String);

/// Stable identifier of an upgrade.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

macro_rules! id_impls {
    ($($ty:ident),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    )*};
}

id_impls!(AssetId, ManagerId, UpgradeId);

/// An income-producing unit with discrete levels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Cost of the first level (> 0).
    pub base_cost: f64,
    /// Income per owned level per second, before multipliers.
    pub base_income: f64,
    /// Owned copies; 0 = not yet purchased.
    #[serde(default)]
    pub level: u32,
    /// Gates purchasing.
    #[serde(default)]
    pub unlocked: bool,
    /// Duration of one manual production cycle in ms (> 0).
    pub production_time: Millis,
    /// Start of the in-flight manual cycle, `0` when idle.
    #[serde(default)]
    pub last_produced_time: Millis,
}

impl Asset {
    /// True while a manual production cycle is running.
    pub fn cycle_in_flight(&self) -> bool {
        self.last_produced_time != 0
    }
}

/// Automation bound one-to-one to an asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: ManagerId,
    #[serde(default)]
    pub name: String,
    pub target_asset_id: AssetId,
    pub cost: f64,
    #[serde(default)]
    pub owned: bool,
    #[serde(default)]
    pub description: String,
}

/// What an upgrade multiplies: one asset or every asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpgradeTarget {
    Global,
    Asset(AssetId),
}

impl UpgradeTarget {
    /// Whether this target covers `asset`.
    pub fn applies_to(&self, asset: &AssetId) -> bool {
        match self {
            UpgradeTarget::Global => true,
            UpgradeTarget::Asset(id) => id == asset,
        }
    }
}

impl From<String> for UpgradeTarget {
    fn from(s: String) -> Self {
        if s == GLOBAL_TARGET {
            UpgradeTarget::Global
        } else {
            UpgradeTarget::Asset(AssetId(s))
        }
    }
}

impl From<UpgradeTarget> for String {
    fn from(t: UpgradeTarget) -> Self {
        match t {
            UpgradeTarget::Global => GLOBAL_TARGET.to_string(),
            UpgradeTarget::Asset(id) => id.0,
        }
    }
}

/// One-time multiplicative income bonus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: UpgradeId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "targetAssetId")]
    pub target: UpgradeTarget,
    pub cost: f64,
    /// Income factor (> 1).
    pub multiplier: f64,
    #[serde(default)]
    pub owned: bool,
    #[serde(default)]
    pub description: String,
}

/// Full game state: entity collections plus the scalar economy fields.
///
/// This is also the persisted snapshot record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current balance (>= 0, fractional from automated accrual).
    pub cash: f64,
    /// Assets in definition order; unlock propagation follows this order.
    pub assets: Vec<Asset>,
    pub managers: Vec<Manager>,
    pub upgrades: Vec<Upgrade>,
    pub last_save_time: Millis,
    pub start_time: Millis,
}

impl GameState {
    pub fn asset_index(&self, id: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| &a.id == id)
    }

    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| &a.id == id)
    }

    pub fn manager(&self, id: &ManagerId) -> Option<&Manager> {
        self.managers.iter().find(|m| &m.id == id)
    }

    pub fn upgrade(&self, id: &UpgradeId) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    /// The manager bound to `asset`, owned or not.
    pub fn manager_for(&self, asset: &AssetId) -> Option<&Manager> {
        self.managers.iter().find(|m| &m.target_asset_id == asset)
    }

    /// Whether `asset` has an owned manager.
    pub fn is_automated(&self, asset: &AssetId) -> bool {
        self.manager_for(asset).is_some_and(|m| m.owned)
    }
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Scheduler period in ms (default: 100, i.e. 10 Hz).
    pub tick_period_ms: u64,
    /// Autosave once more than this many ms passed since the last save.
    pub save_interval_ms: Millis,
    /// Cash granted to a fresh game.
    pub starting_cash: f64,
    /// Credit automated income for the time between last save and resume.
    pub offline_accrual: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            save_interval_ms: 10_000,
            starting_cash: 10.0,
            offline_accrual: true,
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(String),
    /// Price, income or cash must be non-negative.
    #[error("negative monetary value in {0}")]
    NegativeMoney(String),
    /// Asset base cost must be strictly positive.
    #[error("base cost of {0} must be > 0")]
    NonPositiveCost(String),
    /// Production cycle must last at least 1 ms.
    #[error("production time of {0} must be > 0")]
    NonPositiveProductionTime(String),
    /// Upgrade multipliers must strictly increase income.
    #[error("multiplier of {0} must be > 1")]
    MultiplierTooSmall(String),
    /// Ids must be unique within their collection.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// Asset ids may not collide with the global upgrade sentinel.
    #[error("reserved id: {0}")]
    ReservedId(String),
    /// More than one manager bound to the same asset.
    #[error("asset {0} has more than one manager")]
    DuplicateManager(String),
    /// Manager or upgrade references an unknown asset.
    #[error("unknown asset reference: {0}")]
    UnknownAsset(String),
    /// Timestamps are epoch milliseconds, never before 1970.
    #[error("negative timestamp in {0}")]
    NegativeTimestamp(String),
}

fn check_time(value: Millis, what: &str) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeTimestamp(what.to_string()));
    }
    Ok(())
}

fn check_money(value: f64, what: &str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(what.to_string()));
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeMoney(what.to_string()));
    }
    Ok(())
}

/// Validate a single asset record.
pub fn validate_asset(a: &Asset) -> Result<(), ValidationError> {
    if a.id.0 == GLOBAL_TARGET {
        return Err(ValidationError::ReservedId(a.id.0.clone()));
    }
    check_money(a.base_cost, &a.id.0)?;
    check_money(a.base_income, &a.id.0)?;
    if a.base_cost <= 0.0 {
        return Err(ValidationError::NonPositiveCost(a.id.0.clone()));
    }
    if a.production_time <= 0 {
        return Err(ValidationError::NonPositiveProductionTime(a.id.0.clone()));
    }
    check_time(a.last_produced_time, &a.id.0)?;
    Ok(())
}

/// Validate a single upgrade record.
pub fn validate_upgrade(u: &Upgrade) -> Result<(), ValidationError> {
    check_money(u.cost, &u.id.0)?;
    if !u.multiplier.is_finite() {
        return Err(ValidationError::NonFinite(u.id.0.clone()));
    }
    if u.multiplier <= 1.0 {
        return Err(ValidationError::MultiplierTooSmall(u.id.0.clone()));
    }
    Ok(())
}

/// Validate the whole state, including cross-references between collections.
pub fn validate_state(state: &GameState) -> Result<(), ValidationError> {
    check_money(state.cash, "cash")?;
    check_time(state.last_save_time, "lastSaveTime")?;
    check_time(state.start_time, "startTime")?;

    let mut asset_ids: BTreeSet<&AssetId> = BTreeSet::new();
    for a in &state.assets {
        validate_asset(a)?;
        if !asset_ids.insert(&a.id) {
            return Err(ValidationError::DuplicateId(a.id.0.clone()));
        }
    }

    let mut manager_ids: BTreeSet<&ManagerId> = BTreeSet::new();
    let mut targets: BTreeSet<&AssetId> = BTreeSet::new();
    for m in &state.managers {
        check_money(m.cost, &m.id.0)?;
        if !manager_ids.insert(&m.id) {
            return Err(ValidationError::DuplicateId(m.id.0.clone()));
        }
        if !asset_ids.contains(&m.target_asset_id) {
            return Err(ValidationError::UnknownAsset(m.target_asset_id.0.clone()));
        }
        if !targets.insert(&m.target_asset_id) {
            return Err(ValidationError::DuplicateManager(
                m.target_asset_id.0.clone(),
            ));
        }
    }

    let mut upgrade_ids: BTreeSet<&UpgradeId> = BTreeSet::new();
    for u in &state.upgrades {
        validate_upgrade(u)?;
        if !upgrade_ids.insert(&u.id) {
            return Err(ValidationError::DuplicateId(u.id.0.clone()));
        }
        if let UpgradeTarget::Asset(target) = &u.target {
            if !asset_ids.contains(target) {
                return Err(ValidationError::UnknownAsset(target.0.clone()));
            }
        }
    }
    Ok(())
}
