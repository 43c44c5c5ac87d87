//! gaugecam CLI — live gauge reading and one-shot snapshot analysis.

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use gaugecam::annotate::Overlay;
use gaugecam::fetch::SnapshotClient;
use gaugecam::{analyze_frame, GaugeConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const WINDOW_TITLE: &str = "Winter-7423 Airspeed Indicator Reader";

/// Bounded wait between iterations; doubles as the quit-key poll.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "gaugecam")]
#[command(about = "Read an analog gauge dial from networked camera snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the camera and display annotated readings in a window.
    Live(LiveArgs),

    /// Analyze one frame (from a file or a single fetch) and write the
    /// annotated image.
    Snapshot(SnapshotArgs),

    /// Print the effective configuration as JSON.
    ConfigInfo(ConfigInfoArgs),
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Path to a JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera snapshot URL (overrides the configuration file).
    #[arg(long)]
    url: Option<String>,

    /// Gauge scale minimum, in labeled units.
    #[arg(long)]
    min_value: Option<f32>,

    /// Gauge scale maximum, in labeled units.
    #[arg(long)]
    max_value: Option<f32>,

    /// Needle sector start angle, degrees from the positive x-axis.
    #[arg(long)]
    sector_start: Option<f32>,

    /// Needle sector end angle, degrees.
    #[arg(long)]
    sector_end: Option<f32>,
}

impl ConfigArgs {
    fn resolve(&self) -> CliResult<GaugeConfig> {
        let mut config = match &self.config {
            Some(path) => GaugeConfig::from_json_file(path)?,
            None => GaugeConfig::default(),
        };
        if let Some(url) = &self.url {
            config.camera.url = url.clone();
        }
        if let Some(v) = self.min_value {
            config.scale.min_value = v;
        }
        if let Some(v) = self.max_value {
            config.scale.max_value = v;
        }
        if let Some(v) = self.sector_start {
            config.sector.start_deg = v;
        }
        if let Some(v) = self.sector_end {
            config.sector.end_deg = v;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Args)]
struct LiveArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct SnapshotArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Analyze a local image instead of fetching from the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Path for the annotated output image.
    #[arg(long, default_value = "annotated.png")]
    output: PathBuf,

    /// Optional path for the JSON analysis report.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigInfoArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> CliResult<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Live(args) => run_live(args.config.resolve()?),
        Commands::Snapshot(args) => run_snapshot(args.config.resolve()?, &args),
        Commands::ConfigInfo(args) => {
            let config = args.config.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Copy an RGB frame into the RGBA surface buffer.
fn blit(frame: &image::RgbImage, target: &mut [u8]) {
    for (src, dst) in frame.pixels().zip(target.chunks_exact_mut(4)) {
        dst[0] = src[0];
        dst[1] = src[1];
        dst[2] = src[2];
        dst[3] = 0xff;
    }
}

fn run_snapshot(config: GaugeConfig, args: &SnapshotArgs) -> CliResult<()> {
    let frame = match &args.input {
        Some(path) => image::open(path)?.into_rgb8(),
        None => SnapshotClient::new(config.camera.url.clone()).fetch()?,
    };

    let analysis = analyze_frame(&frame, &config);
    match analysis.reading {
        Some(value) => println!("Speed: {value:.1} {}", config.scale.units),
        None => {
            if let Some(message) = analysis.outcome.diagnostic() {
                println!("{message}");
            }
        }
    }

    let mut annotated = frame;
    Overlay::new().annotate(&mut annotated, &analysis, &config.scale.units);
    annotated.save(&args.output)?;
    info!("annotated frame written to {}", args.output.display());

    if let Some(report) = &args.report {
        std::fs::write(report, serde_json::to_string_pretty(&analysis)?)?;
        info!("analysis report written to {}", report.display());
    }
    Ok(())
}

fn run_live(config: GaugeConfig) -> CliResult<()> {
    let client = SnapshotClient::new(config.camera.url.clone());
    let overlay = Overlay::new();
    info!("watching {}", client.url());

    // First frame up front: it sizes the window and the surface, and a
    // dead endpoint fails before any window appears.
    let first = client.fetch()?;
    let (mut buf_w, mut buf_h) = first.dimensions();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(buf_w as f64, buf_h as f64))
        .with_resizable(false)
        .build(&event_loop)?;
    let window = Arc::new(window);
    let window_clone = window.clone();

    let size = window.inner_size();
    let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(buf_w, buf_h, surface_texture)?;

    // Acquisition failure is fatal: it is carried out of the event loop
    // and propagated by this function.
    let fatal: Rc<RefCell<Option<CliError>>> = Rc::new(RefCell::new(None));
    let fatal_in = fatal.clone();

    let units = config.scale.units.clone();
    let mut pending = Some(first);
    let mut last_iteration = Instant::now();

    event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed {
                        match event.logical_key.as_ref() {
                            Key::Character("q") | Key::Named(NamedKey::Escape) => target.exit(),
                            _ => {}
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    let frame = match pending.take() {
                        Some(frame) => frame,
                        None => match client.fetch() {
                            Ok(frame) => frame,
                            Err(e) => {
                                error!("frame acquisition failed: {e}");
                                *fatal_in.borrow_mut() = Some(Box::new(e));
                                target.exit();
                                return;
                            }
                        },
                    };

                    let (fw, fh) = frame.dimensions();
                    if (fw, fh) != (buf_w, buf_h) {
                        if let Err(e) = pixels.resize_buffer(fw, fh) {
                            *fatal_in.borrow_mut() = Some(Box::new(e));
                            target.exit();
                            return;
                        }
                        (buf_w, buf_h) = (fw, fh);
                    }

                    let analysis = analyze_frame(&frame, &config);
                    if let Some(value) = analysis.reading {
                        println!("Speed: {value:.1} {units}");
                    }

                    let mut annotated = frame;
                    overlay.annotate(&mut annotated, &analysis, &units);
                    blit(&annotated, pixels.frame_mut());
                    if let Err(e) = pixels.render() {
                        *fatal_in.borrow_mut() = Some(Box::new(e));
                        target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                // bounded wait between iterations
                let elapsed = last_iteration.elapsed();
                if elapsed < POLL_INTERVAL {
                    std::thread::sleep(POLL_INTERVAL - elapsed);
                }
                last_iteration = Instant::now();
                window_clone.request_redraw();
            }
            _ => {}
        }
    })?;

    let result = match fatal.borrow_mut().take() {
        Some(err) => Err(err),
        None => Ok(()),
    };
    result
}
