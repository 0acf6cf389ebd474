//! Itinerary CLI
//!
//! Feeds a recorded or piped model response through the stream decoder.
//! Narrative is printed to stdout as soon as it is released; the validated
//! itinerary follows once the stream ends.
//!
//! # Usage
//!
//! ```bash
//! # Decode a recorded response
//! itinerary --input response.txt
//!
//! # Pipe a live response and print the payload as JSON
//! some-model-client | itinerary --json
//!
//! # Simulate a slow network with small reads
//! itinerary --input response.txt --chunk-size 7
//!
//! # Keep a completed itinerary in the trip history
//! itinerary --input response.txt --save
//!
//! # With verbose logging
//! RUST_LOG=debug itinerary --input response.txt
//! ```
//!
//! # Environment Variables
//!
//! - `ITINERARY_MODEL`, `ITINERARY_CHANNEL_CAPACITY`,
//!   `ITINERARY_FRAGMENT_TIMEOUT_MS`, `ITINERARY_READ_CHUNK_SIZE`:
//!   configuration overrides
//! - `ITINERARY_MAX_TRIPS`: trip history limit applied by `--save`
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Exit Status
//!
//! - 0: completed, with or without a payload
//! - 1: transport failure or rejected payload
//! - 130: cancelled (Ctrl-C or fragment timeout)

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use itinerary_core::{
    load_config, load_config_from_path, ConfigOverrides, InMemoryTripStore, ItineraryConfig,
    Planner, ReaderBackend, SessionOutcome, ValidatedItinerary,
};

/// Decode a streamed trip-planner response
#[derive(Debug, Parser)]
#[command(name = "itinerary", version, about)]
struct Args {
    /// Recorded response to decode (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Configuration file (default: ~/.config/itinerary/itinerary.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trip description the response answers
    #[arg(short, long, default_value = "recorded response")]
    prompt: String,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Bytes per read
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Cancel when no fragment arrives within this many milliseconds (0 = never)
    #[arg(long)]
    fragment_timeout_ms: Option<u64>,

    /// Print the payload as pretty JSON
    #[arg(long)]
    json: bool,

    /// Save a completed itinerary to the trip history
    #[arg(long)]
    save: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref model) = self.model {
            overrides = overrides.with_model(model.clone());
        }
        if let Some(size) = self.chunk_size {
            overrides = overrides.with_read_chunk_size(size);
        }
        if let Some(ms) = self.fragment_timeout_ms {
            overrides = overrides.with_fragment_timeout_ms(ms);
        }
        overrides
    }
}

/// Exit status for a terminal outcome
fn exit_code(outcome: &SessionOutcome) -> u8 {
    match outcome {
        SessionOutcome::Complete { .. } | SessionOutcome::NarrativeOnly { .. } => 0,
        SessionOutcome::Failed { .. } => 1,
        SessionOutcome::Cancelled => 130,
    }
}

/// Plain-text itinerary summary, one line per location
fn render_summary(itinerary: &ValidatedItinerary) -> String {
    let payload = &itinerary.payload;
    let mut out = format!(
        "{} | {} | {}\n",
        payload.title, payload.destination, payload.duration
    );
    for location in &payload.locations {
        let day = location
            .day
            .map_or_else(|| "    ".to_string(), |d| format!("D{d:<3}"));
        let category = location.category();
        out.push_str(&format!(
            "  {day} {} [{} / {}] ({:.4}, {:.4})\n",
            location.name,
            category,
            category.thai_label(),
            location.lat,
            location.lng
        ));
    }
    out
}

fn load(args: &Args) -> anyhow::Result<ItineraryConfig> {
    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone()))?,
        None => load_config()?,
    };
    args.overrides().apply(&mut config)?;
    info!(
        source = %config.source(),
        model = %config.model,
        chunk_size = config.read_chunk_size,
        timeout = ?config.fragment_timeout,
        "Configuration loaded"
    );
    Ok(config)
}

async fn open_input(input: Option<&PathBuf>) -> anyhow::Result<Box<dyn AsyncRead + Unpin + Send>> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                anyhow::anyhow!("Failed to open input {}: {}", path.display(), e)
            })?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries narrative and payload only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("itinerary=info".parse()?)
                .add_directive("itinerary_core=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load(&args)?;

    let reader = open_input(args.input.as_ref()).await?;
    let backend = ReaderBackend::new(reader)
        .with_chunk_size(config.read_chunk_size)
        .with_capacity(config.channel_capacity);
    let planner = Planner::from_config(
        backend,
        InMemoryTripStore::with_limit(config.max_trips),
        &config,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling session");
                cancel.cancel();
            }
        }
    });

    let outcome = planner
        .plan(&args.prompt, cancel, |segment| {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(segment.as_bytes());
            let _ = stdout.flush();
        })
        .await?;

    let mut stdout = std::io::stdout().lock();
    match &outcome {
        SessionOutcome::Complete { itinerary, .. } => {
            if let Some(warning) = itinerary.warning() {
                warn!(%warning, "Some locations were not plotted");
            }
            writeln!(stdout)?;
            if args.json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&itinerary.payload)?)?;
            } else {
                write!(stdout, "{}", render_summary(itinerary))?;
            }
        }
        SessionOutcome::NarrativeOnly { .. } => {
            writeln!(stdout)?;
            info!("Response had no itinerary data");
        }
        SessionOutcome::Failed { error, .. } => {
            writeln!(stdout)?;
            error!(%error, "Session failed");
        }
        SessionOutcome::Cancelled => {
            writeln!(stdout)?;
            warn!("Session cancelled");
        }
    }
    stdout.flush()?;

    if args.save {
        match planner.save(&outcome).await? {
            Some(id) => {
                let saved = planner.history().await?.len();
                info!(trip = %id, saved, limit = config.max_trips, "Trip saved");
            }
            None => info!(state = ?outcome.state(), "Nothing to save"),
        }
    }

    Ok(ExitCode::from(exit_code(&outcome)))
}
