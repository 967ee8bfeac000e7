//! pagespeak command line entry point
//!
//! Reads text files (or stdin) into a page, speaks them through the native
//! synthesizer and waits until speech ends. Ctrl+C tears the page down,
//! which stops speech.

use anyhow::{bail, Context};
use clap::Parser;
use log::{debug, error, info};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use pagespeak::clipboard::PrimarySelection;
use pagespeak::dom::{Element, NoSelection, Page, SelectionSource};
use pagespeak::speech::backends::memory::MemorySynthesis;
use pagespeak::speech::{create_synthesis, HostEvent, SpeechEvent, SpeechSynthesis, Voice};
use pagespeak::{Host, OptionsPatch, PlaybackState, SpeechController, DEFAULT_SELECTOR};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How often the event loop drains host notifications
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Time the engine gets to start speaking before "not speaking" means done
const START_GRACE: Duration = Duration::from_millis(500);

/// Global flag set by SIGINT handler
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// SIGINT handler - sets flag so the loop can tear down cleanly
extern "C" fn handle_sigint(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

#[derive(Parser, Debug)]
#[command(name = "pagespeak")]
#[command(about = "Read text aloud through the system speech synthesizer", long_about = None)]
#[command(version)]
struct Args {
    /// Log to pagespeak.log at debug level
    #[arg(long, short)]
    debug: bool,

    /// Print the text that would be spoken instead of speaking it
    #[arg(long, short = 'n')]
    dry_run: bool,

    /// Speak the primary selection instead of the input while it exists
    #[arg(long, short)]
    selection: bool,

    /// List the engine's voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Language tag of the voice to use, e.g. ja-JP
    #[arg(long, value_name = "TAG")]
    lang: Option<String>,

    /// Speech rate (0.1 to 10)
    #[arg(long)]
    rate: Option<f32>,

    /// Speech pitch (0 to 2)
    #[arg(long)]
    pitch: Option<f32>,

    /// Speech volume (0 to 1)
    #[arg(long)]
    volume: Option<f32>,

    /// Configuration file (default ~/.pagespeak.cfg)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Files to read; stdin when none or "-"
    files: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        // Debug mode: write to pagespeak.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("pagespeak.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open pagespeak.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "pagespeak version {} starting (debug mode, logging to pagespeak.log)",
            pagespeak::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run(args) {
        error!("Fatal error: {:#}", e);
        eprintln!("pagespeak: {:#}", e);
        process::exit(1);
    }
}

/// Options from the config file, then the command line on top
fn load_options(args: &Args) -> anyhow::Result<OptionsPatch> {
    let path = args.config.clone().unwrap_or_else(OptionsPatch::default_path);

    let mut options = if path.exists() {
        OptionsPatch::from_ini_file(&path)
            .with_context(|| format!("Reading {}", path.display()))?
    } else if args.config.is_some() {
        bail!("Config file {} not found", path.display());
    } else {
        debug!("No config file at {:?}", path);
        OptionsPatch::new()
    };

    if let Some(lang) = &args.lang {
        options.lang = Some(lang.clone());
    }
    if let Some(rate) = args.rate {
        options.rate = Some(rate);
    }
    if let Some(pitch) = args.pitch {
        options.pitch = Some(pitch);
    }
    if let Some(volume) = args.volume {
        options.volume = Some(volume);
    }
    if args.debug {
        options.debug = Some(true);
    }

    Ok(options)
}

/// One `.speech` paragraph per input file, or one for stdin
fn build_page(files: &[PathBuf]) -> anyhow::Result<Page> {
    let page = Page::new();
    let class = DEFAULT_SELECTOR.trim_start_matches('.');

    if files.is_empty() || (files.len() == 1 && files[0].as_os_str() == "-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Reading stdin")?;
        page.push(Element::new("p").with_class(class).with_text(&text));
        return Ok(page);
    }

    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Reading {}", file.display()))?;
        page.push(Element::new("p").with_class(class).with_text(&text));
    }

    Ok(page)
}

fn run(args: Args) -> anyhow::Result<()> {
    debug!("Arguments: {:?}", args);

    let options = load_options(&args)?;

    let mut synthesis: Box<dyn SpeechSynthesis> = if args.dry_run {
        let lang = args.lang.clone().unwrap_or_else(|| "en-US".to_string());
        Box::new(MemorySynthesis::new(vec![
            Voice::new("Dry Run", lang).as_default()
        ]))
    } else {
        create_synthesis()?
    };

    if args.list_voices {
        for voice in synthesis.voices()? {
            let marker = if voice.default { " [default]" } else { "" };
            println!("{}{}", voice.label(), marker);
        }
        return Ok(());
    }

    let page = build_page(&args.files)?;
    let selection: Box<dyn SelectionSource> = if args.selection {
        Box::new(PrimarySelection::new())
    } else {
        Box::new(NoSelection)
    };

    let host = Host::new(synthesis, Box::new(page), selection);
    let mut speech = SpeechController::with_options(host, options)?;
    speech.on_error(|event| {
        if let SpeechEvent::Error(message) = event {
            eprintln!("pagespeak: speech failed: {}", message);
        }
    });
    speech.on_end(|_| info!("Speech finished"));

    if args.dry_run {
        speech.play()?;
        println!("{}", speech.utterance().text);
        return Ok(());
    }

    // Ctrl+C is the teardown hook: it stops speech instead of killing us mid-word
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_sigint))
            .context("Failed to set SIGINT handler")?;
    }
    let teardown = speech.event_sender();

    speech.play()?;
    let started = Instant::now();
    info!("Speaking {} chars", speech.utterance().text.len());

    loop {
        if INTERRUPTED.swap(false, Ordering::Relaxed) {
            let _ = teardown.send(HostEvent::Unload);
        }

        speech.process_events()?;
        if speech.state() == PlaybackState::Idle {
            break;
        }

        // Engines without end callbacks: stop waiting once they go quiet
        if started.elapsed() > START_GRACE && speech.is_speaking()? == Some(false) {
            debug!("Engine is no longer speaking");
            speech.dispatch(SpeechEvent::End);
            break;
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    speech.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("pagespeak").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--lang", "ja-JP", "--rate", "1.5", "-n", "a.txt", "b.txt"]).unwrap();
        assert_eq!(parsed.lang.as_deref(), Some("ja-JP"));
        assert_eq!(parsed.rate, Some(1.5));
        assert!(parsed.dry_run);
        assert_eq!(parsed.files.len(), 2);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--rate"]).is_err());
        assert!(args(&["--rate", "fast"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }

    #[test]
    fn test_parse_args_defaults() {
        let parsed = args(&["-", "-d", "-s"]).unwrap();
        assert!(parsed.debug);
        assert!(parsed.selection);
        assert!(!parsed.dry_run);
        assert!(parsed.config.is_none());
        assert_eq!(parsed.files, vec![PathBuf::from("-")]);
    }
}
