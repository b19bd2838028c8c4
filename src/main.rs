use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playlist_mender::config::{AppConfig, CliConfig, FileConfig};
use playlist_mender::fixes::FixApplier;
use playlist_mender::library_import::{import_playlist, scan_music_directory};
use playlist_mender::library_store::{EntityClass, LibraryStore, SqliteLibraryStore};
use playlist_mender::matching::TrackMatcher;
use playlist_mender::progress::{CancellationFlag, TracingProgress};
use playlist_mender::suggestions::{
    MatchBucket, SuggestionCache, SuggestionFilters, SuggestionService,
};
use playlist_mender::word_index::WordIndexBuilder;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn parse_bucket(s: &str) -> Result<MatchBucket> {
    MatchBucket::parse(s)
        .with_context(|| format!("Unknown bucket {:?} (expected exact/high/medium/low)", s))
}

#[derive(Parser, Debug)]
#[command(version, about = "Reconciles a music library against M3U and VDJFolder playlists")]
struct CliArgs {
    /// Path to the SQLite library database file.
    #[clap(long, value_parser = parse_path)]
    db: Option<PathBuf>,

    /// Path to an optional TOML config file.
    #[clap(long, value_parser = parse_path)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a music directory into the library index.
    Scan {
        #[clap(value_parser = parse_path)]
        music_dir: PathBuf,
    },
    /// Import one or more playlist files (M3U or VDJFolder).
    Import {
        #[clap(value_parser = parse_path, required = true)]
        playlists: Vec<PathBuf>,
    },
    /// Rebuild both word indexes from scratch.
    Reindex,
    /// Resolve a single track reference, record its status and print the
    /// match result.
    Resolve { track_id: i64 },
    /// Generate (or serve cached) fix suggestions.
    Suggest {
        #[clap(long, value_parser = parse_bucket)]
        bucket: Option<MatchBucket>,
        #[clap(long)]
        min_similarity: Option<f64>,
        #[clap(long)]
        limit: Option<usize>,
        #[clap(long)]
        offset: Option<usize>,
        /// Drop the cached set and recompute.
        #[clap(long)]
        refresh: bool,
    },
    /// Apply suggestions back into the database and playlist files.
    Apply {
        /// Only apply suggestions in this bucket.
        #[clap(long, value_parser = parse_bucket)]
        bucket: Option<MatchBucket>,
        /// Minimum similarity to apply. Defaults to the auto-accept
        /// threshold; pass a lower value to apply tentative suggestions.
        #[clap(long)]
        min_similarity: Option<f64>,
    },
    /// Print library statistics.
    Stats,
    /// Inspect or clear the suggestion cache.
    Cache {
        #[clap(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(
        &CliConfig {
            db_path: cli_args.db.clone(),
        },
        file_config,
    )?;

    info!("Opening library database at {:?}", config.db_path);
    let store: Arc<dyn LibraryStore> = Arc::new(SqliteLibraryStore::new(&config.db_path)?);

    let cancel = CancellationFlag::new();

    match cli_args.command {
        Command::Scan { music_dir } => run_scan(&config, store, &music_dir, &cancel),
        Command::Import { playlists } => run_import(&config, store, &playlists, &cancel),
        Command::Reindex => run_reindex(store, &cancel),
        Command::Resolve { track_id } => run_resolve(&config, store, track_id),
        Command::Suggest {
            bucket,
            min_similarity,
            limit,
            offset,
            refresh,
        } => {
            let filters = SuggestionFilters {
                bucket,
                min_similarity,
                limit,
                offset,
            };
            run_suggest(&config, store, &filters, refresh, &cancel)
        }
        Command::Apply {
            bucket,
            min_similarity,
        } => {
            let filters = SuggestionFilters::for_unattended_apply(
                bucket,
                min_similarity,
                config.matcher.auto_accept_threshold,
            );
            run_apply(&config, store, &filters, &cancel)
        }
        Command::Stats => run_stats(&config, store),
        Command::Cache { clear } => run_cache(&config, store, clear),
    }
}

fn suggestion_service(config: &AppConfig, store: Arc<dyn LibraryStore>) -> SuggestionService {
    let cache = SuggestionCache::new(
        store.clone(),
        chrono::Duration::hours(config.cache_ttl_hours),
    );
    let matcher = TrackMatcher::new(store.clone(), config.matcher);
    SuggestionService::new(store, cache, matcher, config.suggestions)
}

fn run_scan(
    config: &AppConfig,
    store: Arc<dyn LibraryStore>,
    music_dir: &PathBuf,
    cancel: &CancellationFlag,
) -> Result<()> {
    let records = scan_music_directory(music_dir)?;
    info!("Found {} music files under {:?}", records.len(), music_dir);
    for record in &records {
        store.insert_music_file(record)?;
    }

    let names = store.all_music_file_names()?;
    let inserted = WordIndexBuilder::new(store.clone()).rebuild(
        EntityClass::MusicFiles,
        &names,
        &TracingProgress,
        cancel,
    )?;
    info!("Indexed {} music files ({} index rows)", names.len(), inserted);
    suggestion_service(config, store).invalidate_cache()?;
    Ok(())
}

fn run_import(
    config: &AppConfig,
    store: Arc<dyn LibraryStore>,
    playlists: &[PathBuf],
    cancel: &CancellationFlag,
) -> Result<()> {
    let mut imported = 0usize;
    for playlist in playlists {
        let tracks = import_playlist(playlist)?;
        imported += tracks.len();
        for track in &tracks {
            store.insert_track_reference(track)?;
        }
        info!("Imported {} tracks from {:?}", tracks.len(), playlist);
    }

    let names = store.all_track_names()?;
    WordIndexBuilder::new(store.clone()).rebuild(
        EntityClass::Tracks,
        &names,
        &TracingProgress,
        cancel,
    )?;
    info!("Imported {} tracks total", imported);
    suggestion_service(config, store).invalidate_cache()?;
    Ok(())
}

fn run_reindex(store: Arc<dyn LibraryStore>, cancel: &CancellationFlag) -> Result<()> {
    let builder = WordIndexBuilder::new(store.clone());
    let track_names = store.all_track_names()?;
    builder.rebuild(EntityClass::Tracks, &track_names, &TracingProgress, cancel)?;
    let file_names = store.all_music_file_names()?;
    builder.rebuild(
        EntityClass::MusicFiles,
        &file_names,
        &TracingProgress,
        cancel,
    )?;
    info!(
        "Reindexed {} tracks and {} music files",
        track_names.len(),
        file_names.len()
    );
    Ok(())
}

fn run_resolve(config: &AppConfig, store: Arc<dyn LibraryStore>, track_id: i64) -> Result<()> {
    let track = store
        .track_reference_by_id(track_id)?
        .with_context(|| format!("No track reference with id {}", track_id))?;
    let matcher = TrackMatcher::new(store, config.matcher);
    let result = matcher.resolve_and_record(&track)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_suggest(
    config: &AppConfig,
    store: Arc<dyn LibraryStore>,
    filters: &SuggestionFilters,
    refresh: bool,
    cancel: &CancellationFlag,
) -> Result<()> {
    let service = suggestion_service(config, store);
    if refresh {
        service.invalidate_cache()?;
    }
    let page = service.generate(filters, &TracingProgress, cancel)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn run_apply(
    config: &AppConfig,
    store: Arc<dyn LibraryStore>,
    filters: &SuggestionFilters,
    cancel: &CancellationFlag,
) -> Result<()> {
    let service = suggestion_service(config, store.clone());
    let page = service.generate(filters, &TracingProgress, cancel)?;
    info!("Applying {} suggestions", page.suggestions.len());

    let summary = FixApplier::new(store).apply_fixes_batch(&page.suggestions);
    service.invalidate_cache()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_stats(config: &AppConfig, store: Arc<dyn LibraryStore>) -> Result<()> {
    let stats = suggestion_service(config, store).statistics()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn run_cache(config: &AppConfig, store: Arc<dyn LibraryStore>, clear: bool) -> Result<()> {
    let service = suggestion_service(config, store);
    if clear {
        service.invalidate_cache()?;
        info!("Suggestion cache cleared");
        return Ok(());
    }
    let diagnostics = service.cache().diagnostics()?;
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    Ok(())
}
