//! invdict main entry point
//!
//! Speaks out word by word whatever you type. Optionally takes the command
//! line of the speech program to use; each sentence is written to its stdin.

use anyhow::Context;
use invdict::cancel::{install_interrupt_handler, CancelToken};
use invdict::config::{parse_rate, Config};
use invdict::input::StdinSource;
use invdict::session;
use invdict::speech::CommandSpeaker;
use invdict::terminal::{Echo, InputMode};
use invdict::APP_NAME;
use log::{debug, error, info};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const USAGE: &str = "usage: invdict [--debug] [--rate N] [--config PATH] [--help | [--] command...]";

const HELP: &str = "\
Inverse dictation: speaks out word by word whatever you type.

Finished words are spoken by an external program that reads the text on its
stdin (default: say -r 100). Give its command line after the options to use
something else, e.g. `invdict espeak-ng -s 150`.

Ctrl+D ends the session after the last words are spoken; Ctrl+C stops at once.

options:
  -h, --help         show this help message and exit
  -d, --debug        print debugging info
  --rate N           speech rate for the configured program (default 100)
  --config PATH      read settings from PATH instead of ~/.invdict.cfg";

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    help: bool,
    debug: bool,
    rate: Option<u32>,
    config: Option<PathBuf>,
    /// Speaker command line, verbatim
    command: Vec<String>,
}

/// Parse arguments; the first one that is not ours starts the speaker command
fn parse_args<I>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "-d" | "--debug" => parsed.debug = true,
            "--rate" => {
                let value = args.next().ok_or("--rate needs a value")?;
                parsed.rate = Some(parse_rate(&value).map_err(|e| e.to_string())?);
            }
            "--config" => {
                let value = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--" => {
                parsed.command.extend(args.by_ref());
            }
            other => {
                parsed.command.push(other.to_string());
                parsed.command.extend(args.by_ref());
            }
        }
    }

    Ok(parsed)
}

fn load_config(args: &Args) -> invdict::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if args.debug {
        config.debug = true;
    }
    if let Some(rate) = args.rate {
        config.rate = rate;
    }
    if !args.command.is_empty() {
        config.command = Some(args.command.clone());
    }

    Ok(config)
}

/// Initialize logger
///
/// Log lines go to stderr. The first one ends the typing line on stdout so
/// diagnostics never run into echoed text; that counts as the session's
/// trailing newline.
fn init_logging(debug: bool, newline_sent: Arc<AtomicBool>) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(move |buf, record| {
            if !newline_sent.swap(true, Ordering::SeqCst) {
                let mut stdout = io::stdout();
                let _ = stdout.write_all(b"\n");
                let _ = stdout.flush();
            }
            writeln!(buf, "{}: {}: {}", APP_NAME, record.level(), record.args())
        })
        .init();
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}: {}", APP_NAME, msg);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if args.help {
        println!("{}\n\n{}", USAGE, HELP);
        return;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            process::exit(1);
        }
    };

    let echo = Echo::new(io::stdout());
    init_logging(config.debug, echo.newline_flag());
    info!("{} version {} starting", APP_NAME, invdict::VERSION);

    if let Err(e) = run(&config, echo) {
        error!("Fatal error: {:#}", e);
        process::exit(1);
    }
}

fn run(config: &Config, mut echo: Echo<io::Stdout>) -> anyhow::Result<()> {
    debug!("Configuration: {:?}", config);

    let cancel = CancelToken::new();
    install_interrupt_handler(cancel.clone()).context("failed to install Ctrl+C handler")?;

    // A speaker that cannot be started ends things before any input is read
    let speaker = CommandSpeaker::new(config.speaker_command(), &cancel)?;
    info!("Speaking with: {}", speaker.argv().join(" "));

    let mut source = StdinSource::new(&cancel).context("failed to open stdin")?;
    let mode = InputMode::detect();

    let outcome = session::run(speaker, &mut source, &mut echo, mode, &cancel)?;
    let dispatched = outcome.dispatcher.wait()?;
    debug!("Speech dispatch finished: {:?}", dispatched);

    Ok(())
}
