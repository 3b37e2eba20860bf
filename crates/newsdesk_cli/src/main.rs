#![forbid(unsafe_code)]

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{error, info};
use newsdesk_core::db::open_db;
use newsdesk_core::feed::export::{read_feed, write_feed, write_meta};
use newsdesk_core::service::archive_service::{ArchiveFilter, ArchiveService};
use newsdesk_core::{
    build_site, default_log_level, init_logging, run_pipeline, search_news, HttpFetcher,
    NewsdeskConfig, Portal, PortalFilter, SearchQuery, SqliteNewsRepository,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "News feed aggregation and static portal builder")]
#[command(version)]
struct Cli {
    /// YAML configuration; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory; `<cwd>/logs` when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source and rewrite the published feed.
    Collect,
    /// Render the feed into a static site.
    Build {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the page a browser would get for a query string.
    Render {
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Narrow the published feed by text, tag and category.
    Filter {
        #[arg(default_value = "")]
        text: String,
        #[arg(long)]
        tag: Option<String>,
        /// Exact category; "Все" lists every category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Full-text search over the archive.
    Search {
        text: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Most used tags.
    Tags {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// One page of the archive, newest first.
    Archive {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 24)]
        per_page: u32,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let log_dir = match cli.log_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|err| format!("cannot resolve working directory: {err}"))?
            .join("logs"),
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir).map_err(|err| err.to_string())?;

    let config = match cli.config.as_ref() {
        Some(path) => NewsdeskConfig::load(path).map_err(|err| err.to_string())?,
        None => NewsdeskConfig::default(),
    };

    match cli.command {
        Commands::Collect => collect(&config),
        Commands::Build { out } => build(&config, out),
        Commands::Render { query } => {
            let portal = load_portal(&config)?;
            println!("{}", portal.render_query(&query));
            Ok(())
        }
        Commands::Filter {
            text,
            tag,
            category,
        } => {
            let portal = load_portal(&config)?;
            let filter = PortalFilter {
                text,
                tag,
                category,
            };
            for item in portal.filter(&filter) {
                println!("{}\t{}\t{}", item.id, item.title, item.link);
            }
            Ok(())
        }
        Commands::Search {
            text,
            category,
            limit,
            raw,
        } => {
            let conn = open_archive(&config)?;
            let query = SearchQuery {
                text,
                category,
                limit,
                raw_fts_syntax: raw,
            };
            let hits = search_news(&conn, &query).map_err(|err| err.to_string())?;
            for hit in hits {
                println!("{}\t{}\t{}", hit.item_id, hit.title, hit.snippet);
            }
            Ok(())
        }
        Commands::Tags { limit } => tags(&config, limit),
        Commands::Archive {
            page,
            per_page,
            tag,
            category,
        } => {
            let mut conn = open_archive(&config)?;
            let service = ArchiveService::new(SqliteNewsRepository::new(&mut conn));
            let page = service
                .page(&ArchiveFilter { tag, category }, page, per_page)
                .map_err(|err| err.to_string())?;
            println!("page {}/{} total={}", page.page, page.pages, page.total);
            for item in &page.items {
                println!("{}\t{}\t{}", item.id, item.title, item.link);
            }
            Ok(())
        }
    }
}

fn collect(config: &NewsdeskConfig) -> Result<(), String> {
    let fetcher = HttpFetcher::new().map_err(|err| err.to_string())?;
    let output = &config.output;
    let existing = read_feed(&output.feed_path).map_err(|err| err.to_string())?;
    let now = Utc::now();

    let outcome =
        run_pipeline(config, &fetcher, existing, now).map_err(|err| err.to_string())?;
    write_feed(&output.feed_path, &outcome.items).map_err(|err| err.to_string())?;
    write_meta(&output.meta_path, outcome.items.len(), now).map_err(|err| err.to_string())?;

    if output.db_path.is_some() {
        let mut conn = open_archive(config)?;
        let mut service = ArchiveService::new(SqliteNewsRepository::new(&mut conn));
        service
            .ingest(&outcome.items)
            .map_err(|err| err.to_string())?;
    }

    let report = &outcome.report;
    for source in &report.sources {
        match &source.error {
            Some(err) => println!("{}: failed ({err})", source.name),
            None => println!("{}: {} items", source.name, source.collected),
        }
    }
    println!(
        "fresh={} blocked={} excluded={} too_old={} total={}",
        report.fresh, report.blocked, report.excluded, report.too_old, report.merged
    );
    if let Some((domain, count)) = &report.top_domain {
        println!("top domain: {domain} ({count})");
    }
    info!(
        "event=cli_collect module=cli status=ok total={} feed={}",
        report.merged,
        output.feed_path.display()
    );
    Ok(())
}

fn build(config: &NewsdeskConfig, out: Option<PathBuf>) -> Result<(), String> {
    let portal = load_portal(config)?;
    let out_dir = out.unwrap_or_else(|| config.output.site_dir.clone());
    let report = build_site(&portal, &out_dir).map_err(|err| err.to_string())?;
    println!(
        "wrote {} list pages and {} articles to {}",
        report.list_pages,
        report.article_pages,
        out_dir.display()
    );
    Ok(())
}

fn tags(config: &NewsdeskConfig, limit: usize) -> Result<(), String> {
    if config.output.db_path.is_some() {
        let mut conn = open_archive(config)?;
        let service = ArchiveService::new(SqliteNewsRepository::new(&mut conn));
        let tags = service.tags().map_err(|err| err.to_string())?;
        for tag in tags.into_iter().take(limit) {
            println!("{}\t{}", tag.count, tag.name);
        }
        return Ok(());
    }

    let portal = load_portal(config)?;
    for (name, count) in portal.top_tags(limit) {
        println!("{count}\t{name}");
    }
    Ok(())
}

fn load_portal(config: &NewsdeskConfig) -> Result<Portal, String> {
    let fetcher = HttpFetcher::new().map_err(|err| err.to_string())?;
    Portal::load(config.site.clone(), &fetcher).map_err(|err| err.to_string())
}

fn open_archive(config: &NewsdeskConfig) -> Result<Connection, String> {
    let path = config
        .output
        .db_path
        .as_ref()
        .ok_or_else(|| "output.db_path is not configured".to_string())?;
    open_db(path).map_err(|err| err.to_string())
}
