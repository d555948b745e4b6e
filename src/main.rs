use std::{error::Error, path::PathBuf, str::FromStr, sync::Arc};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use vanacargo::catalog::InventoryCatalog;
use vanacargo::config::{self, CoreSettings, store::SettingsStore};
use vanacargo::export::{self, ExportColumn};
use vanacargo::models::server::Server;
use vanacargo::parsing::SaveFileParser;
use vanacargo::pricing::{FfxiahSource, PriceCache, worker};

/// Reads FFXI save data, prices the items against FFXIAH and writes the
/// whole inventory out as CSV.
#[derive(Parser)]
#[command(name = "vanacargo")]
struct Args {
    /// Settings file, created on first run
    #[arg(long, default_value = "vanacargo.json")]
    config: PathBuf,
    /// FFXI installation path (overrides the settings file)
    #[arg(long)]
    game_path: Option<PathBuf>,
    /// FFXIAH server to price against (overrides the settings file)
    #[arg(long)]
    server: Option<String>,
    /// Export with cached prices only, no network
    #[arg(long)]
    no_fetch: bool,
    /// Output CSV path
    #[arg(long, default_value = "export.csv")]
    out: PathBuf,
    /// Comma-separated columns, e.g. "name,level,median" (default: all)
    #[arg(long)]
    columns: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut store = SettingsStore::open(&args.config);
    let mut settings = CoreSettings::load(&mut store);
    if let Some(path) = args.game_path {
        settings.game_path = path;
    }
    if let Some(server) = &args.server {
        settings.ffxiah_server = Some(Server::from_str(server)?);
    }
    settings.save(&mut store);

    let tabs = config::inventory_tabs(&mut store);
    let characters = config::discover_characters(&settings.game_path, &store);
    if characters.is_empty() {
        println!("No characters found under {:?}.", settings.game_path.join("USER"));
    }

    let mut catalog = InventoryCatalog::new(
        settings.game_path.clone(),
        characters,
        tabs,
        settings.language,
        Box::new(SaveFileParser),
    );
    let mut loaded_tabs = 0;
    catalog.load_all(&mut |completed, _total| loaded_tabs = completed);
    println!("Loaded {} items from {} tabs.", catalog.count_all(), loaded_tabs);

    let server_name = settings
        .ffxiah_server
        .map(|server| server.as_str().to_string())
        .unwrap_or_default();
    let mut cache = PriceCache::load(&store, &server_name, settings.cache_ttl_enabled);

    if !args.no_fetch && !server_name.is_empty() {
        let missing = cache.missing_ids(catalog.all_items());
        if !missing.is_empty() {
            println!("Fetching {} prices from FFXIAH ({})...", missing.len(), server_name);
            let source = Arc::new(FfxiahSource::new()?);
            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_cancel.cancel();
                }
            });

            let mut last_reported = 0;
            let outcome = worker::fetch_all_medians(
                &missing,
                &server_name,
                source,
                &cancel,
                &mut |completed, total| {
                    if completed != last_reported {
                        last_reported = completed;
                        println!("  {}/{}", completed, total);
                    }
                },
            )
            .await;

            // Prices that landed before a cancel are still good; the join
            // inside fetch_all_medians makes the partial map race-free.
            let cancelled = outcome.cancelled;
            for (id, median) in outcome.medians {
                cache.set(id, median);
            }
            if cancelled {
                println!("Export cancelled.");
                cache.save(&mut store, &server_name);
                store.save()?;
                return Ok(());
            }
        }
    }

    let columns = match &args.columns {
        Some(list) => list
            .split(',')
            .map(|name| ExportColumn::from_str(name.trim()))
            .collect::<Result<Vec<_>, _>>()?,
        None => ExportColumn::all(),
    };
    let rows = export::export_csv(&args.out, &mut catalog, &cache, &[], &columns)?;
    println!("Exported {} rows to {:?}.", rows, args.out);

    if !server_name.is_empty() {
        cache.save(&mut store, &server_name);
    }
    store.save()?;
    catalog.unload_all();
    Ok(())
}
