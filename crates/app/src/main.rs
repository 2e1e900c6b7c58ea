use std::path::PathBuf;

use clap::{Parser, Subcommand};
use film3d_core::{Aabb, AnimatedImageEncoder, AppConfig, RotationSequence, WireframeRenderer};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> film3d_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture {
            name,
            fps,
            step,
            output_dir,
            config,
            model_size,
        } => {
            let mut settings = match config {
                Some(path) => AppConfig::load(path)?,
                None => AppConfig::default(),
            };
            if let Some(fps) = fps {
                settings.output.frames_per_second = fps;
            }
            if let Some(step) = step {
                settings.capture.step_radians = step;
            }
            if let Some(dir) = output_dir {
                settings.output.output_dir = dir;
            }
            run_capture(&settings, &name, model_size).await
        }
        Commands::Angles { start, step } => run_angles(start, step),
    }
}

async fn run_capture(
    settings: &AppConfig,
    name: &str,
    model_size: f32,
) -> film3d_core::Result<()> {
    let bounds = Aabb::cube(model_size * 0.5);
    let mut renderer =
        WireframeRenderer::new(settings.capture.width, settings.capture.height, bounds);
    let mut scheduler = settings.scheduler()?;
    scheduler.camera_mut().fit_to_bounds(&bounds);

    let token = scheduler.start()?;
    let stop = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested");
            stop.cancel();
        }
    });

    let report = settings
        .clock()?
        .drive(&mut scheduler, &mut renderer)
        .await?;
    if report.cancelled {
        scheduler.stop();
    }
    tracing::info!(
        captured = scheduler.frames().count(),
        report = %serde_json::to_string(&report)?,
        "images captured"
    );

    // Saving never races a running orbit.
    scheduler.cancel();
    let encoder = AnimatedImageEncoder::from_settings(&settings.output);
    match encoder.encode(
        scheduler.frames().as_slice(),
        name,
        settings.output.frames_per_second,
    ) {
        Ok(animation) => {
            tracing::info!(path = %animation.path.display(), "save result: saved");
            Ok(())
        }
        Err(err) => {
            tracing::error!(%err, "save failed");
            Err(err)
        }
    }
}

fn run_angles(start: f32, step: f32) -> film3d_core::Result<()> {
    let angles: Vec<f32> = RotationSequence::new(start, step)?.collect();
    println!("{}", serde_json::to_string(&angles)?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Orbit a model and save the view as an animated GIF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture one revolution around the model and save it as `<name>.gif`.
    Capture {
        /// Name of the animated image, without extension.
        #[arg(short, long)]
        name: String,
        /// Playback rate of the saved animation.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=30))]
        fps: Option<u32>,
        /// Rotation between two captured frames, in radians.
        #[arg(long)]
        step: Option<f32>,
        /// Directory the animation is written to.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Edge length of the model's bounding cube.
        #[arg(long, default_value_t = 0.5)]
        model_size: f32,
    },
    /// Print the rotation angles of one revolution as JSON.
    Angles {
        /// First angle, in radians.
        #[arg(long, default_value_t = 0.0)]
        start: f32,
        /// Increment between angles, in radians.
        #[arg(long, default_value_t = 0.05)]
        step: f32,
    },
}
