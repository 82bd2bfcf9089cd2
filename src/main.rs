use anyhow::{bail, Context, Result};
use clap::Parser;
use reelshelf::player::display::speed_presets;
use reelshelf::system::fs::LocalDirectory;
use reelshelf::system::storage::JsonFileStore;
use reelshelf::system::urls::UrlRegistry;
use reelshelf::{Catalog, Config, FolderMemoryService, FolderPick, Library};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing one subdirectory per video collection
    #[arg()]
    folder: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "reelshelf.toml")]
    config: PathBuf,

    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,

    /// Only list videos whose name contains this text
    #[arg(short, long)]
    search: Option<String>,

    /// Forget the remembered folder and exit
    #[arg(long)]
    forget: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config).unwrap_or_else(|e| {
        warn!(
            "Failed to load {}: {}. Using defaults.",
            args.config.display(),
            e
        );
        Config::default()
    });

    let store = JsonFileStore::open(&config.memory.store_path).with_context(|| {
        format!(
            "opening state file {}",
            config.memory.store_path.display()
        )
    })?;
    let memory = FolderMemoryService::new(Arc::new(store), &config.memory);

    if args.forget {
        memory.forget()?;
        info!("Forgot remembered folder");
        return Ok(());
    }

    let mut library = Library::new(&config, UrlRegistry::new(), memory);

    let Some(folder) = args.folder else {
        match library.welcome_back() {
            Some(last) => println!("{}", last.welcome_message()),
            None => println!("Usage: reelshelf <FOLDER>"),
        }
        return Ok(());
    };
    if !folder.is_dir() {
        bail!("{} is not a directory", folder.display());
    }

    let pick = FolderPick::Picked(Box::new(LocalDirectory::new(&folder)));
    let catalog = match library.select_folder(pick).await {
        Ok(Some(catalog)) => catalog,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let shown = match args.search.as_deref() {
        Some(term) => catalog.filtered(term),
        None => catalog.clone(),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print_catalog(&shown);
        let labels: Vec<String> = speed_presets(&config.player.speed_presets)
            .into_iter()
            .map(|p| p.label)
            .collect();
        println!("Playback speeds: {}", labels.join(" "));
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    for collection in catalog {
        println!(
            "{} [{}] - {} videos",
            collection.title(),
            collection.id(),
            collection.len()
        );
        for (index, asset) in collection.assets().iter().enumerate() {
            println!("  {:>3}. {} ({})", index + 1, asset.display_name, asset.resolved_filename);
        }
    }
}
