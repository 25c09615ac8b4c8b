mod cli;
mod config;
mod display;

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use display::Display;
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xdg::BaseDirectories;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const CONFIG_FILE_NAME: &str = "config.toml";

/// Complain if no frame made it through the pipeline for this long.
const SILENCE_WARNING_AFTER: Duration = Duration::from_secs(2);

static XDG: OnceLock<BaseDirectories> = OnceLock::new();

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    if args.list_input_devices {
        let names = soundr_audio::fetcher::input_device_names()?;

        info!("Available input devices:\n\n{:#?}\n", names);
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_path()?,
    };

    let mut config = config::load_or_default(&config_path);
    if let Some(device) = args.device {
        config.audio.device = Some(device);
    }
    if let Some(frame_size) = args.frame_size {
        config.audio.frame_size = frame_size;
    }

    if let Err(err) = run(&config, args.duration.map(Duration::from_secs)) {
        error!("{:?}", err);
        anyhow::bail!("Fatal error");
    }

    Ok(())
}

fn run(config: &config::Config, duration: Option<Duration>) -> anyhow::Result<()> {
    let mut coordinator = config.coordinator().context("Invalid config")?;
    coordinator
        .start()
        .context("Couldn't start listening to the input device")?;

    let stop_requested = watch_stdin();
    if duration.is_none() {
        info!("Press <Enter> to stop");
    }

    let mut display = Display::new(&config.display);
    let refresh_interval = config.display.refresh_interval();

    let started = Instant::now();
    let mut last_estimate = started;
    let mut warned_silence = false;

    while !stop_requested.load(Ordering::Relaxed)
        && duration.is_none_or(|duration| started.elapsed() < duration)
    {
        std::thread::sleep(refresh_interval);

        match coordinator.latest() {
            Some(estimate) => {
                last_estimate = Instant::now();
                warned_silence = false;
                display.show(&estimate)?;
            }
            None if !warned_silence && last_estimate.elapsed() > SILENCE_WARNING_AFTER => {
                warn!(
                    "No audio arrived for {:?}. Is the input device still there?",
                    SILENCE_WARNING_AFTER
                );
                warned_silence = true;
            }
            None => {}
        }
    }

    coordinator.stop();
    display.finish()?;

    Ok(())
}

/// Returns a flag which gets set as soon as a line is entered on stdin.
fn watch_stdin() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));

    let thread_flag = flag.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        // closed stdin (`Ok(0)`) isn't a stop request
        match std::io::stdin().read_line(&mut line) {
            Ok(read) if read > 0 => thread_flag.store(true, Ordering::Relaxed),
            _ => {}
        }
    });

    flag
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(
        EnvFilter::builder()
            .parse("soundr=info,soundr_audio=info")
            .unwrap(),
    );

    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::fmt()
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_env_filter(env_filter)
        .without_time()
        .pretty()
        .finish()
        .with(indicatif_layer)
        .init();

    tracing::debug!("Debug logging enabled");
}

fn get_xdg() -> &'static BaseDirectories {
    XDG.get_or_init(|| BaseDirectories::with_prefix(APP_NAME))
}

/// Returns the path to the config file of `soundr`.
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    get_xdg()
        .place_config_file(CONFIG_FILE_NAME)
        .context("Couldn't create the config directory")
}
