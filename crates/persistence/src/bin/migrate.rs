#![deny(warnings)]

use persistence::{default_sqlite_url, ensure_sqlite_dir, SqliteSlot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    ensure_sqlite_dir(&url)?;
    let slot = SqliteSlot::connect(&url).await?;
    let has_save = persistence::load(&slot).await.is_some();
    println!("DB migrated at {} | snapshot present: {}", url, has_save);
    Ok(())
}
