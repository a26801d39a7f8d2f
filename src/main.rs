use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use jpi_logbook::config::LogbookConfig;
use jpi_logbook::log_format::init_logging;

mod commands;

use commands::{
    DecodeOutput, handle_convert_airports, handle_decode, handle_flights, handle_fuel,
    handle_nearest, handle_summarize,
};

const VERSION: &str = match option_env!("VERGEN_GIT_DESCRIBE") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

#[derive(Parser)]
#[command(name = "jpi-logbook")]
#[command(about = "Decode JPI engine-monitor logs into logbook entries")]
#[command(version = VERSION)]
struct Cli {
    /// TOML config file (defaults to ./jpi-logbook.toml when present)
    #[arg(long, global = true, env = "JPI_LOGBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Airport dataset JSON, tried before data/airports.json and the bundled set
    #[arg(long, global = true, env = "AIRPORTS_JSON_PATH")]
    airports: Option<PathBuf>,

    /// Maximum distance in km for matching a GPS fix to an airport
    #[arg(long = "max-km", global = true, env = "JPI_MATCH_RADIUS_KM")]
    max_km: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the flights stored in a log
    Flights {
        /// JPI log file
        file: PathBuf,
    },
    /// Decode one flight into sample rows
    Decode {
        /// JPI log file
        file: PathBuf,

        /// Flight id (1-based position in the log)
        #[arg(long)]
        flight: u32,

        #[arg(long, value_enum, default_value_t = DecodeOutput::Json)]
        out: DecodeOutput,
    },
    /// Summarize all flights into logbook drafts
    Summarize {
        /// JPI log file
        file: PathBuf,

        /// Fuel invoice text, one extracted item per line
        #[arg(long)]
        fuel: Option<PathBuf>,

        /// Print flight summaries without airport or fuel data
        #[arg(long, default_value_t = false)]
        summaries_only: bool,
    },
    /// Extract gallons and dollars from fuel invoice text
    Fuel {
        /// Invoice text, one extracted item per line
        file: PathBuf,
    },
    /// Find the nearest airport to a position
    Nearest {
        /// Latitude: decimal degrees or N37.38.45 form
        #[arg(allow_hyphen_values = true)]
        lat: String,
        /// Longitude: decimal degrees or W122.05.88 form
        #[arg(allow_hyphen_values = true)]
        lng: String,
    },
    /// Convert an OurAirports CSV or airport JSON file into the gazetteer format
    ConvertAirports {
        input: PathBuf,

        #[arg(default_value = "data/airports.json")]
        dest: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info");

    let cli = Cli::parse();

    let mut config = LogbookConfig::resolve(cli.config.as_deref())?;
    if let Some(path) = cli.airports {
        config.airports_json_path = Some(path);
    }
    if let Some(max_km) = cli.max_km {
        config.match_radius_km = max_km;
    }
    config.validate()?;

    let mut sources = config.gazetteer_sources();
    // flag, then AIRPORTS_JSON_PATH (both via clap), then the config file
    if config.airports_json_path.is_some() {
        sources.configured = config.airports_json_path.clone();
    }
    debug!("config: {:?}", config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Flights { file } => handle_flights(&file, &mut out)?,
        Commands::Decode { file, flight, out: format } => {
            handle_decode(&file, flight, format, &mut out)?
        }
        Commands::Summarize {
            file,
            fuel,
            summaries_only,
        } => handle_summarize(
            &file,
            fuel.as_deref(),
            summaries_only,
            &sources,
            config.match_radius_km,
            &mut out,
        )?,
        Commands::Fuel { file } => handle_fuel(&file, &mut out)?,
        Commands::Nearest { lat, lng } => {
            handle_nearest(&lat, &lng, &sources, config.match_radius_km, &mut out)?
        }
        Commands::ConvertAirports { input, dest } => handle_convert_airports(&input, &dest)?,
    }

    out.flush()?;
    Ok(())
}
