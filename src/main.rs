//! Synheart Keystroke CLI
//!
//! Enroll a typing profile and verify attempts from recorded key event
//! streams (newline-delimited JSON, `-` for stdin).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use synheart_keystroke_auth::{
    audit::create_shared_log_with_persistence,
    collector::{CancellationToken, ReplaySource},
    config::Config,
    core::{AuthState, AuthenticationContext, ProfileStore},
    AuthError, PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-keystroke")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Keystroke-rhythm password authentication", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Override the configured acceptance threshold for this run
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Override the configured password for this run
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a new typing profile, replacing any existing one
    Enroll {
        /// Recorded event streams, replayed in order (use - for stdin)
        #[arg(long = "events", short, required = true)]
        events: Vec<PathBuf>,
    },

    /// Verify a typing attempt against the enrolled profile
    Verify {
        /// Recorded event stream (use - for stdin)
        #[arg(long = "events", short, required = true)]
        events: Vec<PathBuf>,
    },

    /// Show per-sample distances of the enrolled profile
    Report {
        /// Print the report as JSON instead of a chart
        #[arg(long)]
        json: bool,

        /// Chart height in rows
        #[arg(long, default_value = "10")]
        height: usize,
    },

    /// Show enrollment state and activity counts
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(threshold) = cli.threshold {
        config.auth.threshold = threshold;
    }
    if let Some(password) = cli.password {
        config.auth.password = password;
    }

    match cli.command {
        Commands::Enroll { events } => cmd_enroll(&config, &events),
        Commands::Verify { events } => cmd_verify(&config, &events),
        Commands::Report { json, height } => cmd_report(&config, json, height),
        Commands::Status => cmd_status(&config),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            ExitCode::SUCCESS
        }
        Commands::Config => cmd_config(&config),
    }
}

fn cmd_enroll(config: &Config, events: &[PathBuf]) -> ExitCode {
    let Some(ctx) = build_context(config) else {
        return ExitCode::FAILURE;
    };
    let Some(mut source) = open_events(events) else {
        return ExitCode::FAILURE;
    };
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let store = ProfileStore::in_dir(&config.data_path);
    let audit = create_shared_log_with_persistence(config.data_path.join("audit.json"));
    let cancel = cancel_on_ctrlc();
    let samples = config.auth.sample_count;

    println!("Enrolling new typing profile...");
    let outcome = ctx.enroll_from(&mut source, &cancel, |round| {
        println!("  Type sample {round}/{samples} of the password");
    });

    let code = match outcome {
        Ok(profile) => match store.save(&profile) {
            Ok(()) => {
                audit.record_enrollment();
                println!();
                println!("✅ Typing profile successfully enrolled.");
                println!("Profile ID: {}", profile.id());
                if let Ok(report) = ctx.report() {
                    if !report.all_within_threshold() {
                        println!("Warning: some samples are already above the threshold.");
                        println!("Run `synheart-keystroke report` to inspect them.");
                    }
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                audit.record_failure();
                eprintln!("Error saving profile: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            audit.record_failure();
            report_failure("Enrollment failed", &e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = audit.save() {
        eprintln!("Warning: Could not save audit log: {e}");
    }
    code
}

fn cmd_verify(config: &Config, events: &[PathBuf]) -> ExitCode {
    let Some(ctx) = build_context(config) else {
        return ExitCode::FAILURE;
    };
    let Some(ctx) = attach_profile(ctx, config) else {
        return ExitCode::FAILURE;
    };
    if ctx.state() == AuthState::Unenrolled {
        eprintln!("You must enroll first! Run `synheart-keystroke enroll`.");
        return ExitCode::FAILURE;
    }
    let Some(mut source) = open_events(events) else {
        return ExitCode::FAILURE;
    };

    let audit = create_shared_log_with_persistence(config.data_path.join("audit.json"));
    let cancel = cancel_on_ctrlc();

    let code = match ctx.verify_from(&mut source, &cancel) {
        Ok(result) => {
            audit.record_decision(&result);
            if result.accepted {
                println!("✅ Authentication Successful!");
            } else {
                println!("❌ Authentication Failed!");
            }
            println!("DTW distance: {:.3}", result.distance);
            if result.accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            audit.record_failure();
            report_failure("Verification failed", &e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = audit.save() {
        eprintln!("Warning: Could not save audit log: {e}");
    }
    code
}

fn cmd_report(config: &Config, json: bool, height: usize) -> ExitCode {
    let Some(ctx) = build_context(config).and_then(|ctx| attach_profile(ctx, config)) else {
        return ExitCode::FAILURE;
    };

    let report = match ctx.report() {
        Ok(report) => report,
        Err(AuthError::NotEnrolled) => {
            println!("No profile enrolled. Please enroll first.");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error building report: {e}");
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("DTW Distance per Enrollment Sample");
    println!("==================================");
    println!();
    print!("{}", report.render_chart(height));
    println!();
    for point in &report.points {
        println!(
            "  Sample {}: {:.3} {}",
            point.sample,
            point.distance,
            if point.within_threshold { "✓" } else { "✗" }
        );
    }
    println!();
    println!(
        "Threshold: {:.3} | mean: {:.3} | max: {:.3} | std dev: {:.3}",
        report.threshold, report.mean, report.max, report.std_dev
    );
    ExitCode::SUCCESS
}

fn cmd_status(config: &Config) -> ExitCode {
    println!("Synheart Keystroke Auth Status");
    println!("==============================");
    println!();

    println!("Configuration:");
    println!("  Threshold: {}", config.auth.threshold);
    println!("  Enrollment samples: {}", config.auth.sample_count);
    println!(
        "  DTW: {}",
        match config.distance_engine().window() {
            Some(radius) => format!("banded (radius {radius})"),
            None => "exact".to_string(),
        }
    );
    println!();

    let store = ProfileStore::in_dir(&config.data_path);
    match store.load() {
        Ok(Some(profile)) => {
            println!("Profile: enrolled");
            println!("  ID: {}", profile.id());
            println!("  Enrolled at: {}", profile.enrolled_at().to_rfc3339());
            println!("  Features per sample: {}", profile.average().len());
        }
        Ok(None) => println!("Profile: not enrolled"),
        Err(e) => println!("Profile: unreadable ({e})"),
    }
    println!();

    let audit_path = config.data_path.join("audit.json");
    if audit_path.exists() {
        let audit = create_shared_log_with_persistence(audit_path);
        println!("{}", audit.summary());
    } else {
        println!("No previous activity found.");
    }
    ExitCode::SUCCESS
}

fn cmd_config(config: &Config) -> ExitCode {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();

    let mut value = match serde_json::to_value(config) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error serializing configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    value["auth"]["password"] = serde_json::Value::String("<redacted>".to_string());
    println!(
        "{}",
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "Error".to_string())
    );
    ExitCode::SUCCESS
}

/// Install the tracing subscriber, writing to stderr.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_context(config: &Config) -> Option<AuthenticationContext> {
    match AuthenticationContext::from_config(config) {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("Error: {e}");
            None
        }
    }
}

/// Restore the stored profile, if any, into the context.
fn attach_profile(ctx: AuthenticationContext, config: &Config) -> Option<AuthenticationContext> {
    match ProfileStore::in_dir(&config.data_path).load() {
        Ok(Some(profile)) => {
            let ctx = ctx.with_profile(profile);
            if !ctx.profile_matches_config() {
                eprintln!(
                    "Warning: the stored profile was not enrolled with {} samples. Consider re-enrolling.",
                    config.auth.sample_count
                );
            }
            Some(ctx)
        }
        Ok(None) => Some(ctx),
        Err(e) => {
            eprintln!("Error loading profile: {e}");
            None
        }
    }
}

fn open_events(paths: &[PathBuf]) -> Option<ReplaySource> {
    let mut source = ReplaySource::default();
    for path in paths {
        let result = if path.as_os_str() == "-" {
            source.extend_from_reader(std::io::stdin().lock())
        } else {
            source.extend_from_path(path)
        };
        if let Err(e) = result {
            eprintln!("Error reading events from {path:?}: {e}");
            return None;
        }
    }
    Some(source)
}

/// Cancel the running capture on Ctrl+C.
fn cancel_on_ctrlc() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        tracing::warn!("Could not install Ctrl+C handler: {e}");
    }
    cancel
}

fn report_failure(context: &str, error: &AuthError) {
    eprintln!("{context}: {error}");
    if error.is_retryable() {
        eprintln!("Please type the password again and retry.");
    }
}
