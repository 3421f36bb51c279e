//! Pose classification server: camera in, posture labels out over WebSocket.

use anyhow::{Context, Result};
use body_pose_classification::{
    camera::CaptureDevice,
    config::{Config, EXAMPLE_CONFIG},
    detection::OnnxPoseDetector,
    server::{bind, cancel_on_ctrl_c, LabelServer},
};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to process instead of the camera
    #[arg(short, long)]
    video: Option<String>,

    /// Host to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the ONNX landmark model
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Height frames are resized to before detection
    #[arg(long)]
    frame_height: Option<i32>,

    /// Run without the preview window
    #[arg(long)]
    no_gui: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(cam) = self.cam {
            config.camera.index = cam;
        }
        if let Some(video) = &self.video {
            config.camera.video_file = Some(video.clone());
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        if let Some(height) = self.frame_height {
            config.processing.frame_height = height;
        }
        if self.no_gui {
            config.display.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    info!("Body Pose Classification {}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    args.apply(&mut config);
    config.validate()?;

    let detector = OnnxPoseDetector::new(
        &config.model.path,
        config.model.input_size,
        config.model.min_detection_confidence,
    )
    .with_context(|| format!("Failed to load landmark model {}", config.model.path.display()))?;

    let listener = bind(&config.server.host, config.server.port)
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    let source = config.camera.video_source();
    let (width, height) = (config.camera.capture_width, config.camera.capture_height);
    let mut server = LabelServer::new(
        detector,
        move || CaptureDevice::open(&source, width, height),
        config.pipeline_settings(),
        config.view_settings(),
    );

    server.serve(listener, shutdown).await?;

    Ok(())
}
