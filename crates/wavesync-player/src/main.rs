//! Wavesync Player - zoomable waveform view synchronized with playback
//!
//! This is the main entry point for the GUI application. It:
//! 1. Initializes logging and loads the config
//! 2. Launches the iced GUI application
//! 3. Optionally loads a file given on the command line
//!
//! ## Command line
//!
//! `wavesync-player [PATH] [--config <PATH>]`
//!
//! - `PATH`: raw 16-bit mono PCM or WAV file to load at startup
//! - `--config <PATH>`: use this config file instead of the default location

mod audio;
mod config;
mod domain;
mod ui;

use std::path::PathBuf;

use iced::{Size, Task};

use ui::{Message, WavesyncApp};

const USAGE: &str = "usage: wavesync-player [PATH] [--config <PATH>]";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    source: Option<PathBuf>,
    config_path: Option<PathBuf>,
    help: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => parsed.help = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            _ if parsed.source.is_some() => return Err(format!("unexpected argument {}", arg)),
            _ => parsed.source = Some(PathBuf::from(arg)),
        }
    }
    Ok(parsed)
}

fn main() -> iced::Result {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) if args.help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    log::info!("wavesync-player starting up");

    let config_path = args.config_path.unwrap_or_else(config::default_config_path);
    let config = config::load_or_init(&config_path);
    log::info!(
        "Poll interval {:?}, padding {:?}",
        config.playback.poll_interval(),
        config.display.padding()
    );

    // Wrap startup values in cells so the boot closure can be Fn (required by iced)
    let config_cell = std::cell::RefCell::new(Some(config));
    let source_cell = std::cell::RefCell::new(args.source);

    iced::application(
        move || {
            let config = config_cell.borrow_mut().take().unwrap_or_default();
            let source = source_cell.borrow_mut().take();
            WavesyncApp::new(config, source)
        },
        update,
        view,
    )
    .subscription(subscription)
    .theme(theme)
    .title("Wavesync")
    .window_size(Size::new(1100.0, 520.0))
    .run()
}

/// Update function for iced
fn update(app: &mut WavesyncApp, message: Message) -> Task<Message> {
    app.update(message)
}

/// View function for iced
fn view(app: &WavesyncApp) -> iced::Element<'_, Message> {
    app.view()
}

/// Subscription function for iced
fn subscription(app: &WavesyncApp) -> iced::Subscription<Message> {
    app.subscription()
}

/// Theme function for iced
fn theme(app: &WavesyncApp) -> iced::Theme {
    app.theme()
}
