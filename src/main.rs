// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use facecam::app::frame_processor::create_locator;
use facecam::app::{Resources, SessionController};
use facecam::backends::camera;
use facecam::config::{Config, SourceKind};
use facecam::pipelines::MediaEncoder;
use facecam::pipelines::session::OutputSession;
use facecam::storage::FsArtifactNamer;
use facecam::terminal::TerminalFrontend;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

mod cli;

#[derive(Parser)]
#[command(name = "facecam")]
#[command(about = "Terminal camera with recording and face cropping")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Flags applied on top of the config file
#[derive(Args)]
struct Overrides {
    /// Config file (default: ~/.config/facecam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Frame source
    #[arg(long, value_enum, global = true)]
    source: Option<SourceKind>,

    /// V4L2 device node
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Requested capture width
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Requested capture height
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Clockwise rotation in degrees (0, 90, 180, 270)
    #[arg(long, global = true, allow_negative_numbers = true)]
    rotation: Option<i32>,

    /// SeetaFace detection model
    #[arg(long, global = true)]
    face_model: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(source) = self.source {
            config.camera.source = source;
        }
        if let Some(device) = self.device {
            config.camera.device = device;
        }
        if let Some(width) = self.width {
            config.camera.width = width;
        }
        if let Some(height) = self.height {
            config.camera.height = height;
        }
        if let Some(rotation) = self.rotation {
            config.camera.rotation = rotation;
        }
        if let Some(model) = self.face_model {
            config.face.model_path = Some(model);
        }
        if let Some(output) = self.output {
            config.output.root = output;
        }
        if let Some(file) = self.log_file {
            config.logging.file = Some(file);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive camera session (default)
    Run,

    /// List cameras, formats and video encoders
    List,

    /// Take a single photo
    Photo,

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.overrides.config.clone().or_else(Config::default_path);
    let mut config = Config::load(cli.overrides.config.as_deref())?;
    cli.overrides.apply(&mut config);
    config.validate()?;

    let command = cli.command.unwrap_or(Commands::Run);
    // The terminal UI owns stderr while running; only log there for one-shot commands
    let interactive = matches!(command, Commands::Run);
    init_logging(config.logging.file.as_ref(), interactive)?;

    match command {
        Commands::Run => run_session(config),
        Commands::List => cli::list_cameras(),
        Commands::Photo => cli::take_photo(&config).map(|_| ()),
        Commands::Config { write } => {
            let target = if write { config_path.as_deref() } else { None };
            cli::show_config(&config, target)
        }
    }
}

// Set RUST_LOG environment variable to control log level
// Examples: RUST_LOG=debug, RUST_LOG=facecam=debug, RUST_LOG=info
fn init_logging(
    file: Option<&PathBuf>,
    interactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run_session(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))?;
    }

    let source = camera::open_source(&config)?;
    let locator = create_locator(&config.face);
    if config.face.model_path.is_none() {
        warn!("No face model configured, face mode will not find faces");
    }
    let encoder = MediaEncoder::new(
        config.recording.bitrate_preset,
        config.recording.jpeg_quality,
    );
    let output = OutputSession::new(encoder, FsArtifactNamer::new(&config.output));
    info!(root = %config.output.root.display(), "Writing artifacts");

    let frontend = TerminalFrontend::new()?;
    let resources = Resources {
        source,
        locator,
        output,
    };
    let mut controller = SessionController::new(resources, frontend, config.recording.clone())
        .with_shutdown_flag(shutdown);
    let result = controller.run();

    let artifacts: Vec<String> = controller
        .finished_artifacts()
        .iter()
        .map(|a| format!("{} ({} frames)", a.path.display(), a.frames))
        .chain(
            controller
                .captured_stills()
                .iter()
                .map(|p| p.display().to_string()),
        )
        .collect();
    // Restore the terminal before printing
    drop(controller);

    for artifact in artifacts {
        println!("Saved: {}", artifact);
    }
    result?;
    Ok(())
}
