mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use store::config::{DEFAULT_LOCAL_DIR, DEFAULT_REMOTE_URL, normalize_base_url, parse_backend};
use store::{Collection, CollectionStore, Hero, HistoricalEvent, Place, QuizQuestion, StoreConfig, WarHero};
use time::OffsetDateTime;

use crate::commands::CliError;

#[derive(Parser, Debug)]
#[command(name = "heritage-admin", about = "Heritage site content admin CLI")]
struct Cli {
    /// `local` or `remote`.
    #[arg(long, env = "HERITAGE_BACKEND", default_value = "local")]
    backend: String,

    #[arg(long, env = "HERITAGE_LOCAL_DIR", default_value = DEFAULT_LOCAL_DIR)]
    local_dir: PathBuf,

    #[arg(long, env = "HERITAGE_REMOTE_URL", default_value = DEFAULT_REMOTE_URL)]
    remote_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record of a collection in stored order.
    List { collection: Collection },
    Show { collection: Collection, id: String },
    /// Append a record; a payload without `id` gets a timestamp id.
    Add {
        collection: Collection,
        #[arg(long)]
        data: String,
    },
    Update {
        collection: Collection,
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete { collection: Collection, id: String },
    /// Replace all collections with seed data.
    Reset {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Write `history-backup-YYYY-MM-DD.json` into a directory.
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Heroes, war heroes and events merged by year.
    Timeline,
    Stats,
    Search { query: String },
}

/// Run `$module::$func::<T>(args..)` for the record type stored in `$collection`.
macro_rules! for_collection {
    ($collection:expr, $module:ident::$func:ident, ($($arg:expr),*)) => {
        match $collection {
            Collection::Heroes => $module::$func::<Hero>($($arg),*),
            Collection::WarHeroes => $module::$func::<WarHero>($($arg),*),
            Collection::Places => $module::$func::<Place>($($arg),*),
            Collection::Quiz => $module::$func::<QuizQuestion>($($arg),*),
            Collection::Timeline => $module::$func::<HistoricalEvent>($($arg),*),
        }
    };
    ($collection:expr, $module:ident::$func:ident, ($($arg:expr),*), await) => {
        match $collection {
            Collection::Heroes => $module::$func::<Hero>($($arg),*).await,
            Collection::WarHeroes => $module::$func::<WarHero>($($arg),*).await,
            Collection::Places => $module::$func::<Place>($($arg),*).await,
            Collection::Quiz => $module::$func::<QuizQuestion>($($arg),*).await,
            Collection::Timeline => $module::$func::<HistoricalEvent>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = StoreConfig {
        backend: parse_backend(Some(cli.backend.trim()))?,
        local_dir: cli.local_dir,
        remote_url: normalize_base_url(&cli.remote_url),
        ..StoreConfig::from_env()?
    };

    let store = CollectionStore::new(store::backend::open(&config)?);
    commands::settle_startup(store.initialize().await).await;

    let output = run(&store, cli.command).await?;
    print_json(&output)
}

async fn run(store: &CollectionStore, command: Command) -> Result<Value, CliError> {
    match command {
        Command::List { collection } => for_collection!(collection, commands::list, (store)),
        Command::Show { collection, id } => for_collection!(collection, commands::show, (store, &id)),
        Command::Add { collection, data } => for_collection!(collection, commands::add, (store, &data), await),
        Command::Update { collection, id, data } => {
            for_collection!(collection, commands::update, (store, &id, &data), await)
        }
        Command::Delete { collection, id } => for_collection!(collection, commands::delete, (store, &id), await),
        Command::Reset { yes } => commands::reset(store, yes).await,
        Command::Export { dir } => {
            let path = commands::export(store, &dir, OffsetDateTime::now_utc())?;
            Ok(Value::String(path.display().to_string()))
        }
        Command::Timeline => commands::timeline(store),
        Command::Stats => commands::stats(store),
        Command::Search { query } => commands::search(store, &query),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
