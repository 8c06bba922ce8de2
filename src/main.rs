//! sphere-rt: CPU ray caster for a single sphere, drawn in the terminal
//!
//! Controls (interactive mode):
//! - M or Tab: Cycle shading mode (noise, binary hit, shaded)
//! - Space: Pause
//! - Q or Escape: Quit

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use sphere_rt::{
    config::AppConfig,
    terminal::{parse_key_event, to_halfblock, Action, TerminalDisplay},
    Renderer, ShadingMode,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "sphere-rt")]
#[command(version = "0.1.0")]
#[command(about = "CPU ray caster for a single sphere, drawn in the terminal")]
#[command(long_about = "
sphere-rt casts one ray per pixel from a fixed camera at a sphere sitting at
the origin and shows the result with half-block characters.

Example usage:
  sphere-rt run --mode binary_hit
  sphere-rt frame --width 120 --height 60
  sphere-rt check-config --config config.yaml
")]
struct Cli {
    /// Path to config file (defaults to ./config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Override the shading mode
    #[arg(short, long, global = true)]
    mode: Option<ShadingMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal viewer (default)
    Run,

    /// Render a single frame and print it to stdout
    Frame {
        /// Override image width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Override image height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Validate configuration file
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config_or_exit(cli.config.as_deref());
    if let Some(mode) = cli.mode {
        config.render.mode = mode;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_interactive(&config)?,
        Commands::Frame { width, height } => {
            if let Some(width) = width {
                config.render.width = width;
            }
            if let Some(height) = height {
                config.render.height = height;
            }
            render_frame(&config)?;
        }
        Commands::CheckConfig => check_config(&config),
    }

    Ok(())
}

fn build_renderer(config: &AppConfig) -> Renderer {
    Renderer::new(config.scene(), config.render.mode)
        .with_parallel(config.render.parallel)
        .with_seed(config.render.seed)
}

/// Interactive loop: resize on terminal changes, render once per displayed frame
fn run_interactive(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = TerminalDisplay::new()?;
    let mut renderer = build_renderer(config);

    let (width, height) = terminal.render_size();
    renderer.resize(width, height)?;
    tracing::info!(width, height, mode = %renderer.mode(), "Starting viewer");

    let frame_time = Duration::from_millis(config.display.frame_interval_ms);
    let mut last_frame: Option<Instant> = None;
    let mut paused = false;

    'main_loop: loop {
        if terminal.check_resize() {
            let (width, height) = terminal.render_size();
            if renderer.resize(width, height)? {
                last_frame = None;
            }
        }

        match terminal.poll_input(Duration::from_millis(16)) {
            Ok(Some(key_event)) => match parse_key_event(key_event) {
                Action::Quit => break 'main_loop,
                Action::NextMode => {
                    renderer.set_mode(renderer.mode().next());
                    last_frame = None;
                }
                Action::Pause => paused = !paused,
                Action::None => {}
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Input error"),
        }

        // Skip rendering when paused (allows text selection)
        if paused {
            continue;
        }

        if last_frame.is_some_and(|t| t.elapsed() < frame_time) {
            continue;
        }
        last_frame = Some(Instant::now());

        renderer.render()?;

        let status = format!(
            "Mode: {} | {}x{} | Frame {} | [M] Mode  [SPACE] Pause  [Q]uit",
            renderer.mode(),
            renderer.width(),
            renderer.height(),
            renderer.frame_count()
        );

        let Some(image) = renderer.image() else {
            continue;
        };
        if let Err(e) = terminal.present(image, &status) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                break;
            }
            tracing::warn!(error = %e, "Render error");
        }
    }

    tracing::info!(frames = renderer.frame_count(), "Viewer closed");
    Ok(())
}

/// Headless mode: one frame of the configured size to stdout
fn render_frame(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut renderer = build_renderer(config);
    renderer.resize(config.render.width, config.render.height)?;

    let start = Instant::now();
    renderer.render()?;
    tracing::info!(
        width = config.render.width,
        height = config.render.height,
        mode = %config.render.mode,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Rendered frame"
    );

    if let Some(image) = renderer.image() {
        println!("{}", to_halfblock(image));
    }
    Ok(())
}

/// Print the effective configuration
fn check_config(config: &AppConfig) {
    println!("✓ Configuration is valid\n");
    println!("Render:");
    println!("  Mode: {}", config.render.mode);
    println!("  Parallel: {}", config.render.parallel);
    println!("  Seed: {}", config.render.seed);
    println!("  Frame size: {}x{}", config.render.width, config.render.height);
    println!("\nScene:");
    println!("  Sphere radius: {}", config.scene.sphere_radius);
    println!("  Camera: (0, 0, {})", config.scene.camera_z);
    println!("  Light direction: {:?}", config.scene.light_direction);
    println!("  Albedo: {:?}", config.scene.albedo);
    println!("\nDisplay:");
    println!("  Frame interval: {}ms", config.display.frame_interval_ms);
}

/// Load configuration or exit with error
fn load_config_or_exit(config_path: Option<&std::path::Path>) -> AppConfig {
    match AppConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nYou can copy config.yaml.default and modify it:");
            eprintln!("  cp config.yaml.default config.yaml");
            std::process::exit(1);
        }
    }
}
