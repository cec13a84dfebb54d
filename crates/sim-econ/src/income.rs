//! Income under composed upgrade multipliers.

use sim_core::{Asset, AssetId, GameState, Millis, Upgrade, UpgradeTarget};

/// Product of all owned global upgrade multipliers (1 if none).
pub fn global_multiplier(upgrades: &[Upgrade]) -> f64 {
    upgrades
        .iter()
        .filter(|u| u.owned && u.target == UpgradeTarget::Global)
        .map(|u| u.multiplier)
        .product()
}

/// Product of all owned upgrade multipliers targeting `asset` specifically.
pub fn asset_multiplier(upgrades: &[Upgrade], asset: &AssetId) -> f64 {
    upgrades
        .iter()
        .filter(|u| u.owned && matches!(&u.target, UpgradeTarget::Asset(id) if id == asset))
        .map(|u| u.multiplier)
        .product()
}

/// Combined asset and global multiplier for `asset`.
pub fn effective_multiplier(upgrades: &[Upgrade], asset: &AssetId) -> f64 {
    asset_multiplier(upgrades, asset) * global_multiplier(upgrades)
}

/// Income per second of `asset`: base income x level x multipliers.
///
/// This is also the payout of one completed manual production cycle.
pub fn income_rate(state: &GameState, asset: &Asset) -> f64 {
    asset.base_income * f64::from(asset.level) * effective_multiplier(&state.upgrades, &asset.id)
}

/// Sum of [`income_rate`] over every asset.
pub fn total_income_rate(state: &GameState) -> f64 {
    state.assets.iter().map(|a| income_rate(state, a)).sum()
}

/// Continuous accrual of an automated asset over `elapsed_ms`.
///
/// Example:
/// assert_eq!(automated_accrual(2.0, 100), 0.2);
pub fn automated_accrual(rate: f64, elapsed_ms: Millis) -> f64 {
    if elapsed_ms <= 0 {
        return 0.0;
    }
    rate * (elapsed_ms as f64 / 1000.0)
}
