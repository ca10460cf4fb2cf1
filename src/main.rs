#[cfg(feature = "server")]
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use ranking::config::Settings;
use ranking::data::RankingItem;
use ranking::error::FeedError;
use ranking::feed::RankingFeed;
use ranking::filter::{FilterKind, FilterSpec};
use ranking::genre::Genre;
use ranking::progress::ProgressConfig;
#[cfg(feature = "server")]
use ranking::server::MockServer;
use ranking::source::http::Client;
use ranking::utils;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Webtoon rankings by genre")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Hide progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List a genre ranking
    List {
        /// Genre to list
        #[arg(short, long)]
        genre: Option<GenreArg>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Load every page
        #[arg(long, conflicts_with = "pages")]
        all: bool,

        /// Only titles still being serialized
        #[arg(long, conflicts_with = "completed")]
        ongoing: bool,

        /// Only completed titles
        #[arg(long)]
        completed: bool,

        /// Only titles with at least 3 free episodes
        #[arg(long)]
        free: bool,

        /// Base URL of the ranking API
        #[arg(long)]
        base_url: Option<Url>,

        /// Settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Times to retry a page that failed to load
        #[arg(long, default_value_t = 0)]
        page_retries: u32,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Serve ranking pages from JSON files
    #[cfg(feature = "server")]
    Serve {
        /// Directory holding `{genre}/page_{n}.json`
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenreArg {
    Romance,
    Drama,
}

impl From<GenreArg> for Genre {
    fn from(genre: GenreArg) -> Self {
        match genre {
            GenreArg::Romance => Genre::Romance,
            GenreArg::Drama => Genre::Drama,
        }
    }
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    genre: Genre,
    pages: u32,
    total_count: u64,
    has_more: bool,
    filter: FilterSpec,
    error: Option<&'a FeedError>,
    items: &'a [RankingItem],
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let progress = if cli.quiet {
        ProgressConfig::disabled()
    } else {
        ProgressConfig::default()
    };

    match cli.command {
        Command::List {
            genre,
            pages,
            all,
            ongoing,
            completed,
            free,
            base_url,
            config,
            page_retries,
            json,
        } => {
            let settings = match config {
                Some(path) => Settings::load(path).await?,
                None => Settings::default(),
            };
            let genre = genre
                .map(Genre::from)
                .or(settings.genre)
                .unwrap_or_default();

            let mut builder = settings.config_builder();
            if let Some(base_url) = base_url {
                builder.base_url(base_url);
            }
            let client = Client::new(builder.build())?;

            let mut filter = FilterSpec::new();
            filter.set(FilterKind::Ongoing, ongoing);
            filter.set(FilterKind::Completed, completed);
            filter.set(FilterKind::FreeEpisodes, free);

            list(client, genre, pages, all, page_retries, filter, json, &progress).await?;
        }
        #[cfg(feature = "server")]
        Command::Serve { data, addr } => {
            MockServer::new(data).serve(addr).await?;
        }
    };

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn list(
    client: Client,
    genre: Genre,
    pages: u32,
    all: bool,
    page_retries: u32,
    filter: FilterSpec,
    json: bool,
    progress: &ProgressConfig,
) -> Result<()> {
    let pb = if all {
        progress.spinner(format!("Loading {} ranking...", genre.label()))?
    } else {
        progress.build_with_message(pages, format!("Loading {} ranking...", genre.label()))?
    };

    let feed = RankingFeed::new(client, genre);
    feed.load_first_page(genre).await;

    let snapshot = feed.snapshot();
    if let Some(error) = &snapshot.last_error {
        pb.abandon();
        bail!("Failed to load {} ranking: {} (run again to reload)", genre, error);
    }
    pb.set_position(snapshot.current_page.into());

    let mut retries_left = page_retries;
    loop {
        let snapshot = feed.snapshot();
        if let Some(error) = &snapshot.last_error {
            if retries_left == 0 {
                break;
            }
            retries_left -= 1;
            tracing::warn!(page = snapshot.current_page + 1, %error, "retrying page");
            feed.retry_next_page().await;
            continue;
        }
        if !snapshot.has_more || (!all && snapshot.current_page >= pages) {
            break;
        }
        feed.load_next_page().await;
        pb.set_position(feed.snapshot().current_page.into());
    }
    pb.finish_and_clear();

    let snapshot = feed.snapshot();
    let items = filter.apply(&snapshot.items);

    if json {
        let output = ListOutput {
            genre,
            pages: snapshot.current_page,
            total_count: snapshot.total_count,
            has_more: snapshot.has_more,
            filter,
            error: snapshot.last_error.as_ref(),
            items: &items,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let active = FilterKind::ALL
        .into_iter()
        .filter(|kind| filter.is_enabled(*kind))
        .map(|kind| kind.label())
        .collect::<Vec<_>>();
    println!(
        "{} 랭킹 ({} / {}){}",
        genre.label(),
        items.len(),
        snapshot.total_count,
        if active.is_empty() {
            String::new()
        } else {
            format!(" [{}]", active.join(", "))
        }
    );
    for item in &items {
        println!("{}", utils::format_item(item));
    }
    if let Some(error) = &snapshot.last_error {
        eprintln!(
            "Failed to load page {}: {} (retry with --page-retries)",
            snapshot.current_page + 1,
            error
        );
    }

    Ok(())
}
