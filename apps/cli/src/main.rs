#![deny(warnings)]

//! Headless player: resume the saved game, apply one action, save, print.

use anyhow::{bail, Context, Result};
use persistence::{default_sqlite_url, ensure_sqlite_dir, SqliteSlot};
use serde::Deserialize;
use sim_core::{
    initial_state, validate_state, AssetId, Catalog, ManagerId, SimConfig, UpgradeId,
};
use sim_econ::{format_money, BuyQuantity};
use sim_runtime::{Clock, Engine, GameView, Progress, Rejection, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: idle-cli [--db URL] [--scenario FILE] [--json] <command>

commands:
  status                     show the current game (default)
  buy <asset> [1|10|max]     buy asset levels
  work <asset>               start a manual production cycle
  hire <manager>             buy a manager
  upgrade <upgrade>          buy an upgrade
  run [seconds]              tick in real time until the duration or Ctrl-C
  reset                      discard the save and start over
  version                    print build information";

#[derive(Debug, PartialEq)]
enum Action {
    Status,
    Buy { asset: String, mode: BuyQuantity },
    Work { asset: String },
    Hire { manager: String },
    Upgrade { upgrade: String },
    Run { seconds: Option<u64> },
    Reset,
    Version,
}

#[derive(Debug, PartialEq)]
struct Args {
    db: String,
    scenario: Option<String>,
    json: bool,
    action: Action,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut db = default_sqlite_url().to_string();
    let mut scenario = None;
    let mut json = false;
    let mut words = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--db" => db = it.next().context("--db needs a value")?,
            "--scenario" => scenario = Some(it.next().context("--scenario needs a value")?),
            "--json" => json = true,
            "-h" | "--help" => bail!("{USAGE}"),
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let command = words.next();
    let mut operand = |what: &str| {
        words
            .next()
            .with_context(|| format!("missing {what}\n\n{USAGE}"))
    };
    let action = match command.as_deref() {
        None | Some("status") => Action::Status,
        Some("buy") => {
            let asset = operand("asset id")?;
            let mode = match operand("quantity") {
                Ok(q) => q.parse()?,
                Err(_) => BuyQuantity::One,
            };
            Action::Buy { asset, mode }
        }
        Some("work") => Action::Work {
            asset: operand("asset id")?,
        },
        Some("hire") => Action::Hire {
            manager: operand("manager id")?,
        },
        Some("upgrade") => Action::Upgrade {
            upgrade: operand("upgrade id")?,
        },
        Some("run") => Action::Run {
            seconds: match operand("seconds") {
                Ok(s) => Some(s.parse().with_context(|| format!("invalid seconds {s:?}"))?),
                Err(_) => None,
            },
        },
        Some("reset") => Action::Reset,
        Some("version") => Action::Version,
        Some(other) => bail!("unknown command {other:?}\n\n{USAGE}"),
    };
    Ok(Args {
        db,
        scenario,
        json,
        action,
    })
}

/// Optional overrides for configuration and entity definitions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    config: SimConfig,
    catalog: Option<Catalog>,
}

fn load_scenario(path: Option<&str>) -> Result<(SimConfig, Catalog)> {
    let Some(path) = path else {
        return Ok((SimConfig::default(), Catalog::builtin()));
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let scenario: Scenario =
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse {path}"))?;
    let catalog = scenario.catalog.unwrap_or_else(Catalog::builtin);
    validate_state(&initial_state(&catalog, &scenario.config, 0))
        .with_context(|| format!("invalid catalog in {path}"))?;
    info!(path, assets = catalog.assets.len(), "scenario loaded");
    Ok((scenario.config, catalog))
}

fn report(result: Result<String, Rejection>) {
    match result {
        Ok(msg) => println!("{msg}"),
        Err(rejection) => println!("no effect: {rejection}"),
    }
}

fn render(view: &GameView) -> String {
    let mut out = format!(
        "Cash {} | income {}/s\n",
        format_money(view.cash),
        format_money(view.income_per_sec)
    );
    out.push_str("Assets\n");
    for a in view.assets.iter().filter(|a| a.visible) {
        let status = match a.progress {
            Progress::Looping => "auto".to_string(),
            Progress::Percent(p) => format!("{p:.0}%"),
            Progress::Idle if a.level > 0 => "ready".to_string(),
            Progress::Idle if a.unlocked => "-".to_string(),
            Progress::Idle => "locked".to_string(),
        };
        out.push_str(&format!(
            "  {:<16} {:<14} lvl {:>4}  {:>9}/s  next {:>9}  {}\n",
            a.id,
            a.name,
            a.level,
            format_money(a.income_per_sec),
            format_money(a.next_cost),
            status
        ));
    }
    out.push_str("Managers\n");
    for m in &view.managers {
        let mark = if m.owned { "hired" } else { "" };
        out.push_str(&format!(
            "  {:<18} {:<13} {:>9}  {}\n",
            m.id,
            m.name,
            format_money(m.cost),
            mark
        ));
    }
    out.push_str("Upgrades\n");
    for u in &view.upgrades {
        let mark = if u.owned { "installed" } else { "" };
        out.push_str(&format!(
            "  {:<14} {:<26} {:>9}  {}\n",
            u.id,
            u.description,
            format_money(u.cost),
            mark
        ));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.action == Action::Version {
        println!(
            "idle-cli {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }

    let (config, catalog) = load_scenario(args.scenario.as_deref())?;
    ensure_sqlite_dir(&args.db)?;
    let slot = Arc::new(SqliteSlot::connect(&args.db).await?);
    let clock = SystemClock;
    let state = if args.action == Action::Reset {
        info!("discarding saved game");
        initial_state(&catalog, &config, clock.now())
    } else {
        persistence::load_or_default(slot.as_ref(), &catalog, &config, clock.now()).await
    };
    let engine = Arc::new(Engine::new(state, config, clock));
    // catch up on the time since the last save
    engine.tick();

    match args.action {
        Action::Buy { asset, mode } => report(
            engine
                .buy_with(&AssetId(asset), mode)
                .map(|q| format!("bought {} level(s) for {}", q.count, format_money(q.cost))),
        ),
        Action::Work { asset } => report(
            engine
                .manual_produce(&AssetId(asset))
                .map(|()| "production started".to_string()),
        ),
        Action::Hire { manager } => report(
            engine
                .buy_manager(&ManagerId(manager))
                .map(|()| "manager hired".to_string()),
        ),
        Action::Upgrade { upgrade } => report(
            engine
                .buy_upgrade(&UpgradeId(upgrade))
                .map(|()| "upgrade installed".to_string()),
        ),
        Action::Run { seconds } => {
            info!(?seconds, "running; Ctrl-C to stop");
            let shutdown = async move {
                match seconds {
                    Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
                    None => {
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
            };
            sim_runtime::scheduler::run(Arc::clone(&engine), Arc::clone(&slot), shutdown).await;
        }
        Action::Status | Action::Reset | Action::Version => {}
    }

    let snapshot = engine.checkpoint();
    persistence::save(slot.as_ref(), &snapshot).await?;

    let view = engine.view();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render(&view));
    }
    Ok(())
}
