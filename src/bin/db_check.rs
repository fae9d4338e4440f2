//! Store connectivity check.
//!
//! Reports which secrets are visible (prefixes only) and inserts a
//! `Debug_Bot` user to confirm the store accepts writes.
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin db-check
//! ```

use std::sync::Arc;

use anyhow::Context;
use blind_date::persona::Gender;
use blind_date::storage::{GameRepository, RestStore};
use blind_date::utilities::config::{SecretSource, Settings};

const CHECKED_KEYS: [&str; 3] = ["SUPABASE_URL", "SUPABASE_KEY", "OPENAI_API_KEY"];
const PREFIX_CHARS: usize = 8;

fn masked(value: &str) -> String {
    let prefix: String = value.chars().take(PREFIX_CHARS).collect();
    format!("{prefix}...")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = SecretSource::from_env().context("reading secrets")?;
    for key in CHECKED_KEYS {
        match source.get(key) {
            Some(value) => println!("{key}: {}", masked(&value)),
            None => println!("{key}: <missing>"),
        }
    }

    let settings = Settings::from_source(&source).context("resolving settings")?;
    let store = RestStore::new(&settings.store, None).context("building store client")?;
    let repository = GameRepository::new(Arc::new(store));

    match repository.register_user("Debug_Bot", Gender::Male).await {
        Some(user_id) => {
            println!("Insert OK, user_id = {user_id}");
            Ok(())
        }
        None => anyhow::bail!("insert into users failed; see log output"),
    }
}
