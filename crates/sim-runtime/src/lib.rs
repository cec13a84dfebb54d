#![deny(warnings)]

//! Simulation runtime for Oil Tycoon.
//!
//! The [`Engine`] owns the game state and is its only writer. Two kinds of
//! updates reach it: scheduled ticks ([`tick`]) and player commands
//! ([`commands`]). Both are pure state-to-state functions; the engine installs
//! their results atomically. [`scheduler::run`] drives ticks on a fixed period
//! and persists snapshots in the background.

pub mod clock;
pub mod commands;
pub mod engine;
pub mod scheduler;
pub mod tick;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, Rejection};
pub use engine::{Engine, TickReport};
pub use tick::{AssetPhase, TickOutcome};
pub use view::{build_view, AssetView, GameView, ManagerView, Progress, UpgradeView};
