use clap::{Parser, Subcommand};
use heritage_restore::analysis::{GeminiClient, build_prompt};
use heritage_restore::config::{self, AppConfig};
use heritage_restore::credentials::{self, Credential};
use heritage_restore::imaging::measure;
use heritage_restore::output;
use heritage_restore::restore::RestoreOptions;
use heritage_restore::session::{AnalysisAttempt, Session, SessionError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Flags for commands that call the analysis service.
#[derive(clap::Args, Clone)]
struct KeyArgs {
    /// Gemini API key for this run (ignored when a secret is configured)
    #[arg(long)]
    api_key: Option<String>,
}

/// Flags for commands that write a restored image.
#[derive(clap::Args, Clone)]
struct RestoreArgs {
    /// Directory the restored PNG is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Do not print staged progress
    #[arg(long)]
    no_progress: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "heritage-restore")]
#[command(about = "Damage analysis and simulated restoration for artifact photos")]
#[command(long_about = "\
Damage analysis and simulated restoration for artifact photos

Upload a JPG, PNG or WebP photo of a damaged cultural artifact. The analysis
step sends it to Google Gemini and prints a free-text damage assessment. The
restore step applies a fixed chain of cosmetic filters (sharpen, contrast,
colour, brightness) and writes the result as PNG.

The restoration is simulated: it does not repair damage and does not use the
analysis.

API key resolution (first available wins):
  1. GEMINI_API_KEY in the secrets file ([analysis] secrets_file)
  2. GEMINI_API_KEY environment variable
  3. --api-key

Run 'heritage-restore gen-config' to generate a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "heritage-restore.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an image and print its info card
    Inspect { image: PathBuf },
    /// Request a damage analysis of an image
    Analyze {
        image: PathBuf,
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Apply the simulated restoration and export it as PNG
    Restore {
        image: PathBuf,
        #[command(flatten)]
        restore: RestoreArgs,
    },
    /// Run the full pipeline: inspect → analyze → restore → compare
    Run {
        image: PathBuf,
        #[command(flatten)]
        key: KeyArgs,
        /// Skip the analysis request
        #[arg(long)]
        skip_analysis: bool,
        #[command(flatten)]
        restore: RestoreArgs,
    },
    /// Print the analysis prompt for the configured language
    Prompt,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = config::load_config(&cli.config)?;
    init_thread_pool(&config.processing);
    let mut session = Session::new();

    match cli.command {
        Command::Inspect { image } => {
            let uploaded = session.upload_path(&image)?;
            output::print_image_info(uploaded);
        }
        Command::Analyze { image, key } => {
            output::print_image_info(session.upload_path(&image)?);
            run_analysis(&mut session, &config, &key)?;
        }
        Command::Restore { image, restore } => {
            output::print_image_info(session.upload_path(&image)?);
            run_restoration(&mut session, &config, &restore)?;
        }
        Command::Run {
            image,
            key,
            skip_analysis,
            restore,
        } => {
            println!("==> Upload: {}", image.display());
            output::print_image_info(session.upload_path(&image)?);

            if skip_analysis {
                println!("==> Analysis skipped");
            } else {
                println!("==> Analysis");
                // Neither a missing key nor a failed request stops the restoration.
                let (credential, client, prompt) = prepare_analysis(&config, &key)?;
                match session.try_analyze(&client, credential.key(), &prompt)? {
                    AnalysisAttempt::MissingCredential => {
                        println!("{}", output::format_missing_credential_hint());
                    }
                    AnalysisAttempt::Completed | AnalysisAttempt::Failed => {
                        if let Some(outcome) = session.analysis() {
                            output::print_analysis(outcome);
                        }
                    }
                }
            }

            println!("==> Restoration");
            run_restoration(&mut session, &config, &restore)?;

            if let (Some(original), Some(restored)) = (session.original(), session.restored()) {
                output::print_comparison(&measure(&original.bitmap), &measure(&restored.bitmap));
            }
        }
        Command::Prompt => {
            print!("{}", build_prompt(config.analysis.language));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Resolve the API key, print where it came from, and build the client and prompt.
fn prepare_analysis(
    config: &AppConfig,
    key: &KeyArgs,
) -> Result<(Credential, GeminiClient, String), Box<dyn std::error::Error>> {
    let credential = credentials::resolve(
        Path::new(&config.analysis.secrets_file),
        |name| std::env::var(name).ok(),
        key.api_key.as_deref(),
    )?;
    println!("{}", output::format_credential_status(&credential));

    let client = GeminiClient::from_config(&config.analysis)?;
    let prompt = build_prompt(config.analysis.language);
    Ok((credential, client, prompt))
}

/// Analyze the session's current image.
///
/// The outcome is printed whether the service succeeded or failed.
fn run_analysis(
    session: &mut Session,
    config: &AppConfig,
    key: &KeyArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (credential, client, prompt) = prepare_analysis(config, key)?;
    let result = session.analyze(&client, credential.key(), &prompt);
    if let (Ok(_) | Err(SessionError::Analysis(_)), Some(outcome)) = (&result, session.analysis()) {
        output::print_analysis(outcome);
    }
    result?;
    Ok(())
}

/// Restore the session's current image, printing progress, and write the export.
fn run_restoration(
    session: &mut Session,
    config: &AppConfig,
    args: &RestoreArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = RestoreOptions {
        step_delay: Duration::from_millis(config.restoration.step_delay_ms),
    };

    if config.restoration.progress && !args.no_progress {
        let (tx, rx) = std::sync::mpsc::channel();
        let printer = std::thread::spawn(move || {
            for event in rx {
                println!("{}", output::format_progress_event(&event));
            }
        });
        let result = session.restore(options, Some(&tx)).map(|_| ());
        drop(tx);
        printer.join().ok();
        result?;
    } else {
        session.restore(RestoreOptions::immediate(), None)?;
    }

    let download = session.export_restored()?;
    let path = download.write_to(&args.output)?;
    output::print_download(&download, &path);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
