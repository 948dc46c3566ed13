use clap::{Parser, Subcommand};
use crop_export::config::{self, Settings};
use crop_export::imaging::{EncodeFormat, Quality};
use crop_export::output;
use crop_export::persist::Pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Encoding flags shared by the export commands.
#[derive(clap::Args, Clone)]
struct EncodeArgs {
    /// Output format (jpeg, png, webp, avif). Defaults to each output's
    /// extension, then to the settings file
    #[arg(long)]
    format: Option<EncodeFormat>,

    /// Quality 0-100, used by jpeg and avif
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,
}

impl EncodeArgs {
    fn quality(&self, settings: &Settings) -> Quality {
        self.quality
            .map(Quality::new)
            .unwrap_or(settings.export.quality)
    }
}

#[derive(Parser)]
#[command(name = "crop-export")]
#[command(version, about = "Encode and save cropped images on a background pool")]
#[command(long_about = "\
Encode and save cropped images on a background pool

Every output is written by its own job; jobs run in parallel and each one
reports separately. Missing output directories are created and existing
files are replaced.

Logs go to stderr. Set RUST_LOG (e.g. RUST_LOG=crop_export=debug) or pass
--log-level to see per-job details.

Run 'crop-export gen-config' to generate a documented settings file.")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an image to one or more files concurrently
    Export {
        /// Source image (jpeg, png or webp)
        input: PathBuf,
        /// Destination files
        #[arg(required = true)]
        outputs: Vec<PathBuf>,
        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Encode an image to standard output
    Stream {
        /// Source image (jpeg, png or webp)
        input: PathBuf,
        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Print the effective settings
    ShowConfig,
    /// Print a stock settings file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let settings = match &cli.config {
        Some(path) => config::load_settings(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Export {
            input,
            outputs,
            encode,
        } => {
            let image = Arc::new(image::open(&input)?);
            let quality = encode.quality(&settings);
            let pipeline = Pipeline::new(&settings.processing)?;

            let handles: Vec<_> = outputs
                .into_iter()
                .map(|dest| {
                    let format = encode
                        .format
                        .or_else(|| EncodeFormat::from_path(&dest))
                        .unwrap_or(settings.export.format);
                    let handle =
                        pipeline.encode_to_file(Arc::clone(&image), format, quality, dest.clone());
                    (dest, handle)
                })
                .collect();

            let results: Vec<_> = handles
                .into_iter()
                .map(|(dest, handle)| (dest, handle.wait()))
                .collect();
            pipeline.shutdown();

            output::print_export_output(&results);
            if results.iter().all(|(_, result)| result.is_ok()) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Stream { input, encode } => {
            let image = image::open(&input)?;
            let format = encode.format.unwrap_or(settings.export.format);
            let pipeline = Pipeline::new(&settings.processing)?;

            let outcome = pipeline
                .encode_to_stream(
                    image,
                    format,
                    encode.quality(&settings),
                    std::io::stdout(),
                    false,
                )
                .wait();
            pipeline.shutdown();

            match outcome.result {
                Ok(_) => Ok(ExitCode::SUCCESS),
                Err(e) => {
                    eprintln!("error: {e}");
                    Ok(ExitCode::from(u8::try_from(e.status_code()).unwrap_or(1)))
                }
            }
        }
        Command::ShowConfig => {
            print!("{}", settings.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
