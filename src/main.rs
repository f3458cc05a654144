use std::{error::Error, sync::Arc, time::Duration};

use betterreads_catalog::{
    config::{self, Config},
    provider::{self, GoogleBooks, OpenLibrary, SearchProvider},
    search::{search_all, FanOutError},
    BookSearchResult, ReqwestTransport, Transport,
};
use clap::{Parser, Subcommand, ValueEnum};
use sentry::integrations::log::SentryLogger;
use tokio_stream::StreamExt;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    #[arg(long, env = config::GOOGLE_API_KEY_VAR, hide_env_values = true, global = true)]
    google_api_key: Option<String>,

    #[arg(long, default_value = config::GOOGLE_BOOKS_ENDPOINT, global = true)]
    google_books_endpoint: String,

    #[arg(long, default_value = config::OPEN_LIBRARY_ENDPOINT, global = true)]
    open_library_endpoint: String,

    #[arg(long, default_value = config::OPEN_LIBRARY_COVERS, global = true)]
    open_library_covers: String,

    /// Per-provider deadline in seconds when searching all providers.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Providers,
    Search {
        query: String,
        #[arg(short, long, value_enum, default_value_t = ProviderArg::All)]
        provider: ProviderArg,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Google,
    OpenLibrary,
    All,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            google_api_key: self.google_api_key.clone(),
            google_books_endpoint: self.google_books_endpoint.clone(),
            open_library_endpoint: self.open_library_endpoint.clone(),
            open_library_covers: self.open_library_covers.clone(),
            deadline: self.timeout.map(Duration::from_secs),
        }
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let logger = SentryLogger::with_dest(LogTracer::new());
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(log::LevelFilter::Trace);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_results(results: &[BookSearchResult]) {
    for r in results {
        let year = r
            .details
            .published_date
            .as_deref()
            .map(|d| format!(" ({})", d.get(..4).unwrap_or(d)))
            .unwrap_or_default();
        println!(
            "{} by {}{} [{}:{}]",
            r.book.title,
            r.details.author_line(),
            year,
            r.details.provider,
            r.id()
        );
    }
}

async fn search(
    config: &Config,
    transport: Arc<dyn Transport>,
    query: &str,
    which: ProviderArg,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let single: Box<dyn SearchProvider> = match which {
        ProviderArg::Google => Box::new(GoogleBooks::from_config(config, transport)),
        ProviderArg::OpenLibrary => Box::new(OpenLibrary::from_config(config, transport)),
        ProviderArg::All => {
            let mut all = vec![];
            let mut outcomes = search_all(provider::all(config, transport), query, config.deadline);
            while let Some(outcome) = outcomes.next().await {
                match outcome.result {
                    Ok(results) => all.extend(results),
                    Err(FanOutError::Search(err)) => {
                        sentry::capture_error(&err);
                        eprintln!("{}: {}", outcome.provider, err);
                    }
                    Err(err) => eprintln!("{}: {}", outcome.provider, err),
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                print_results(&all);
            }
            return Ok(());
        }
    };

    let results = single.search(query).await.map_err(|err| {
        sentry::capture_error(&err);
        err
    })?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.config();
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());

    match &cli.command {
        Commands::Providers => {
            let google = GoogleBooks::from_config(&config, transport.clone());
            println!(
                "{}\t{}",
                google.kind(),
                if google.is_configured() {
                    "configured"
                } else {
                    "missing API key"
                }
            );
            let open = OpenLibrary::from_config(&config, transport);
            println!("{}\tconfigured", open.kind());
        }
        Commands::Search {
            query,
            provider,
            json,
        } => {
            search(&config, transport, query, *provider, *json).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let sentry = sentry::init(sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
    });
    if let Err(err) = init_logging() {
        eprintln!("cannot initialize logging: {err}");
    }

    if let Err(err) = run(&cli).await {
        eprintln!("{err}");
        drop(sentry);
        std::process::exit(1);
    }
}
