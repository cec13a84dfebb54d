//! Static entity definitions a fresh game starts from.

use crate::{
    Asset, AssetId, GameState, Manager, ManagerId, Millis, SimConfig, Upgrade, UpgradeId,
    UpgradeTarget,
};
use serde::{Deserialize, Serialize};

/// Definition tables for assets, managers and upgrades.
///
/// Asset order is significant: buying the first level of an asset unlocks
/// the one after it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub managers: Vec<Manager>,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
}

fn asset(id: &str, name: &str, base_cost: f64, base_income: f64, production_time: Millis) -> Asset {
    Asset {
        id: AssetId::from(id),
        name: name.to_string(),
        base_cost,
        base_income,
        level: 0,
        unlocked: false,
        production_time,
        last_produced_time: 0,
    }
}

fn manager(id: &str, name: &str, target: &str, label: &str, cost: f64) -> Manager {
    Manager {
        id: ManagerId::from(id),
        name: name.to_string(),
        target_asset_id: AssetId::from(target),
        cost,
        owned: false,
        description: format!("Auto-run {label}"),
    }
}

fn upgrade(
    id: &str,
    name: &str,
    target: UpgradeTarget,
    cost: f64,
    multiplier: f64,
    description: &str,
) -> Upgrade {
    Upgrade {
        id: UpgradeId::from(id),
        name: name.to_string(),
        target,
        cost,
        multiplier,
        owned: false,
        description: description.to_string(),
    }
}

fn on(id: &str) -> UpgradeTarget {
    UpgradeTarget::Asset(AssetId::from(id))
}

impl Catalog {
    /// The stock oil & gas progression.
    pub fn builtin() -> Self {
        let assets = vec![
            asset("gas_royalties", "Gas Royalties", 10.0, 1.0, 1_000),
            asset("oil_royalties", "Oil Royalties", 100.0, 5.0, 2_000),
            asset("gas_well", "Gas Well", 1_000.0, 20.0, 4_000),
            asset("oil_well", "Oil Well", 10_000.0, 100.0, 8_000),
            asset("oil_sands", "Oil Sands", 100_000.0, 500.0, 12_000),
            asset("shale_play", "Shale Play", 1_000_000.0, 2_000.0, 20_000),
            asset("omani_field", "Omani Field", 20_000_000.0, 10_000.0, 30_000),
        ];
        let managers = vec![
            manager(
                "mgr_gas_royalties",
                "J. Ewing",
                "gas_royalties",
                "Gas Royalties",
                500.0,
            ),
            manager(
                "mgr_oil_royalties",
                "D. Plainview",
                "oil_royalties",
                "Oil Royalties",
                5_000.0,
            ),
            manager(
                "mgr_gas_well",
                "R. Rich",
                "gas_well",
                "Gas Well",
                25_000.0,
            ),
            manager(
                "mgr_oil_well",
                "M. Burns",
                "oil_well",
                "Oil Well",
                100_000.0,
            ),
            manager(
                "mgr_oil_sands",
                "L. Luthor",
                "oil_sands",
                "Oil Sands",
                500_000.0,
            ),
            manager(
                "mgr_shale",
                "G. Gekko",
                "shale_play",
                "Shale Play",
                5_000_000.0,
            ),
            manager(
                "mgr_omani",
                "T. Stark",
                "omani_field",
                "Omani Field",
                100_000_000.0,
            ),
        ];
        let upgrades = vec![
            upgrade(
                "upg_drill_1",
                "Carbide Drills",
                on("gas_royalties"),
                2_000.0,
                3.0,
                "Gas Royalties profit x3",
            ),
            upgrade(
                "upg_pump_1",
                "High Pressure Pumps",
                on("oil_royalties"),
                10_000.0,
                3.0,
                "Oil Royalties profit x3",
            ),
            upgrade(
                "upg_frack_1",
                "Hydraulic Fracking",
                on("gas_well"),
                50_000.0,
                3.0,
                "Gas Well profit x3",
            ),
            upgrade(
                "upg_offshore",
                "Offshore Logistics",
                on("oil_well"),
                250_000.0,
                3.0,
                "Oil Well profit x3",
            ),
            upgrade(
                "upg_refinery",
                "Efficient Refinery",
                UpgradeTarget::Global,
                10_000_000.0,
                1.5,
                "All income x1.5",
            ),
        ];
        Self {
            assets,
            managers,
            upgrades,
        }
    }
}

/// Build the default-initial state: starting cash, first asset unlocked,
/// everything else locked at level 0, nothing owned.
///
/// Progress fields in the catalog are ignored so any definition table
/// yields a fresh game.
pub fn initial_state(catalog: &Catalog, config: &SimConfig, now: Millis) -> GameState {
    let assets = catalog
        .assets
        .iter()
        .enumerate()
        .map(|(i, a)| Asset {
            level: 0,
            unlocked: i == 0,
            last_produced_time: 0,
            ..a.clone()
        })
        .collect();
    let managers = catalog
        .managers
        .iter()
        .map(|m| Manager {
            owned: false,
            ..m.clone()
        })
        .collect();
    let upgrades = catalog
        .upgrades
        .iter()
        .map(|u| Upgrade {
            owned: false,
            ..u.clone()
        })
        .collect();
    GameState {
        cash: config.starting_cash,
        assets,
        managers,
        upgrades,
        last_save_time: now,
        start_time: now,
    }
}
