//! mix-inspect - look at and clean up the saved mixes on disk
//!
//! ```text
//! mix-inspect [--store PATH] list
//! mix-inspect [--store PATH] show NAME
//! mix-inspect [--store PATH] delete NAME
//! mix-inspect catalog
//! ```
//!
//! Reads the JSON mix store at the default data location unless `--store`
//! points elsewhere. The key prefix comes from the session config.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use soundblanket_core::config::{default_config_path, default_store_path, load_config, CONFIG_FILENAME};
use soundblanket_core::{Catalog, Category, FileStore, MixRecord, MixRepository, SessionConfig};

const USAGE: &str = "usage: mix-inspect [--store PATH] (list | show NAME | delete NAME | catalog)";

enum Command {
    List,
    Show(String),
    Delete(String),
    Catalog,
}

struct Args {
    store: PathBuf,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut store = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--store" => {
                let path = iter.next().context("--store needs a path")?;
                store = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!(USAGE),
            _ => rest.push(arg.as_str()),
        }
    }

    let command = match rest.as_slice() {
        ["list"] => Command::List,
        ["show", name] => Command::Show(name.to_string()),
        ["delete", name] => Command::Delete(name.to_string()),
        ["catalog"] => Command::Catalog,
        _ => bail!(USAGE),
    };

    Ok(Args {
        store: store.unwrap_or_else(default_store_path),
        command,
    })
}

fn print_summary(record: &MixRecord) {
    println!(
        "{:<24} {:>2} sounds  updated {}  ({})",
        record.name,
        record.playing_count(),
        record.updated_at.format("%Y-%m-%d %H:%M"),
        record.sound_names().join(" • ")
    );
}

fn print_catalog() {
    let catalog = Catalog::builtin();
    for category in Category::ALL {
        println!("{}", category.label());
        for track in catalog.by_category(category) {
            println!("  {:<14} {}", track.id, track.display_name);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    if let Command::Catalog = args.command {
        print_catalog();
        return Ok(());
    }

    let config: SessionConfig = load_config(&default_config_path(CONFIG_FILENAME));
    let config = config.sanitized();
    let store = FileStore::open(&args.store)
        .await
        .with_context(|| format!("Failed to open mix store {:?}", args.store))?;
    let repo = MixRepository::with_prefix(Arc::new(store), config.storage_key_prefix);

    match args.command {
        Command::List => {
            let records = repo.list().await?;
            if records.is_empty() {
                println!("No saved mixes in {:?}", args.store);
            }
            for record in &records {
                print_summary(record);
            }
        }
        Command::Show(name) => {
            let Some(record) = repo.get(&name).await? else {
                bail!("No mix named '{}'", name);
            };
            print_summary(&record);
            println!("created {}", record.created_at.to_rfc3339());
            for sound in &record.sounds {
                println!("  {:<14} {:<20} {:>3.0}%", sound.id, sound.name, sound.volume * 100.0);
            }
        }
        Command::Delete(name) => {
            repo.delete(&name).await?;
            println!("Deleted '{}'", name);
        }
        Command::Catalog => {}
    }
    Ok(())
}
