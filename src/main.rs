use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use nobil_service::config::ServiceConfig;
use nobil_service::dev_mode::DevMode;
use nobil_service::logging::{self, LogLevel, Stage};
use nobil_service::service::{ExportService, FeedSource, Supervisor};

// sysexits(3)
const EX_USAGE: u8 = 64;
const EX_SOFTWARE: u8 = 70;
const EX_CONFIG: u8 = 78;

#[derive(Parser)]
#[command(name = "nobild")]
#[command(about = "Export NOBIL charging stations as GPX, KML and a filtering script")]
#[command(version)]
struct Cli {
    /// NOBIL API key (overrides config and NOBIL_API_KEY)
    #[arg(short = 'a', long)]
    api_key: Option<String>,

    /// Directory receiving the exported files
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long, default_value = "nobild.toml")]
    config: PathBuf,

    /// Replay a saved datadump instead of calling the API
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Stop after the first successful cycle
    #[arg(long)]
    once: bool,

    /// Also write one GPX/KML pair per filter combination
    #[arg(long)]
    legacy: bool,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match ServiceConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nobild: {}: {}", cli.config.display(), e);
            return ExitCode::from(EX_CONFIG);
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }
    if cli.api_key.is_some() {
        config.feed.api_key = cli.api_key;
    }
    if cli.legacy {
        config.output.legacy_combinatorial = true;
    }

    let level = match config.logging.level.parse::<LogLevel>() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("nobild: {}", e);
            return ExitCode::from(EX_CONFIG);
        }
    };
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    let source = match cli.input {
        Some(path) => FeedSource::Replay(DevMode::new(path)),
        None => match config.resolve_api_key() {
            Ok(api_key) => FeedSource::Remote {
                url: config.feed.url.clone(),
                api_key,
                timeout_secs: config.feed.timeout_secs,
            },
            Err(e) => {
                eprintln!("nobild: {} (use --api-key, NOBIL_API_KEY or --input)", e);
                return ExitCode::from(EX_USAGE);
            }
        },
    };

    logging::info(
        Stage::System,
        None,
        &format!("Writing exports to {}", config.output.directory.display()),
    );

    let mut supervisor = Supervisor::new(ExportService::new(config, source));
    if cli.once {
        supervisor = supervisor.once();
    }

    let handle = match supervisor.spawn() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("nobild: cannot start worker thread: {}", e);
            return ExitCode::from(EX_SOFTWARE);
        }
    };

    match handle.join() {
        Ok(Ok(_)) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            logging::error(Stage::System, None, &format!("Giving up: {}", e));
            ExitCode::FAILURE
        }
        Err(_) => {
            eprintln!("nobild: worker thread panicked");
            ExitCode::from(EX_SOFTWARE)
        }
    }
}
