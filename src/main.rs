use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use campus_connect::voice::{AudioPlayback, TtsClient};
use campus_connect::{
    AnswerBackend, AnswerClient, Config, DeviceSpeechOutput, Message, MicCapture, Origin,
    OutputDispatcher, SessionController, SessionState, SpeechCapture, SpeechOutput,
};

/// Campus Connect - voice query client for the campus assistant
#[derive(Parser)]
#[command(name = "campus", version, about)]
struct Cli {
    /// Path to a config file (defaults to the XDG location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Answer service base URL override
    #[arg(long, env = "CAMPUS_ANSWER_URL")]
    url: Option<String>,

    /// Startup locale (en, hi, te, kn)
    #[arg(short, long)]
    locale: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for hosts without audio hardware)
    #[arg(long, env = "CAMPUS_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Capture one utterance and print its transcript
    TestMic {
        /// Seconds to wait for an utterance
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },
    /// Play a test tone on the default output device
    TestSpeaker,
    /// Synthesize and play a phrase
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Probe the answer service health endpoint
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,campus_connect=warn",
        1 => "info,campus_connect=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(url) = cli.url {
        config.answer.base_url = url;
    }
    if let Some(code) = &cli.locale {
        config.locale = code.parse()?;
    }
    if cli.disable_voice {
        config.voice.enabled = false;
    }

    match cli.command {
        Some(Command::TestMic { duration }) => test_mic(&config, duration).await,
        Some(Command::TestSpeaker) => test_speaker(),
        Some(Command::TestTts { text }) => test_tts(&config, &text).await,
        Some(Command::Health) => health(&config).await,
        None => run_session(config).await,
    }
}

/// Run the interactive session until EOF or `/quit`
#[allow(clippy::future_not_send)]
async fn run_session(config: Config) -> anyhow::Result<()> {
    let answer = Arc::new(AnswerClient::new(&config.answer)?);
    let capture = MicCapture::new(&config.voice);
    let output = DeviceSpeechOutput::new(TtsClient::new(&config.voice));
    let dispatcher = OutputDispatcher::new(output, config.voice.voices.clone());

    let (events_tx, mut events_rx) = mpsc::channel(32);
    let mut controller =
        SessionController::new(config.locale, capture, answer, dispatcher, events_tx);

    println!("Campus Connect - ask me anything about campus");
    println!(
        "  language: {} ({})    service: {}",
        controller.locale(),
        controller.locale().native_name(),
        config.answer.base_url
    );
    println!("  /mic toggles capture, /lang [code] changes language,");
    println!("  /replay repeats the last answer, /quit exits\n");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut printed = 0;

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                if let Err(e) = controller.handle_event(event).await {
                    println!("! {e}");
                }
                flush_log(controller.log(), &mut printed);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut controller, &line).await {
                    break;
                }
                flush_log(controller.log(), &mut printed);
            }
        }
    }

    println!("goodbye");
    Ok(())
}

/// Apply one input line to the session; returns false to exit
async fn handle_line<C, A, O>(
    controller: &mut SessionController<C, A, O>,
    line: &str,
) -> bool
where
    C: SpeechCapture,
    A: AnswerBackend + 'static,
    O: SpeechOutput,
{
    match line.trim() {
        "" => {}
        "/quit" | "/exit" => return false,
        "/mic" => match controller.toggle_capture().await {
            Ok(()) => {
                if controller.state() == SessionState::Capturing {
                    println!("listening... (/mic again to cancel)");
                }
            }
            Err(e) => println!("! {e}"),
        },
        "/lang" => {
            let locale = controller.cycle_locale();
            println!("language: {locale} ({})", locale.native_name());
        }
        "/replay" => {
            if let Err(e) = controller.replay().await {
                println!("! {e}");
            }
        }
        command if command.starts_with("/lang ") => {
            match controller.set_locale_code(&command["/lang ".len()..]) {
                Ok(locale) => println!("language: {locale} ({})", locale.native_name()),
                Err(e) => println!("! {e}"),
            }
        }
        command if command.starts_with('/') => {
            println!("! unknown command: {command}");
        }
        text => {
            if let Err(e) = controller.submit_text(text) {
                println!("! {e}");
            }
        }
    }

    true
}

/// Print conversation entries added since the last flush
fn flush_log(log: &[Message], printed: &mut usize) {
    for message in &log[*printed..] {
        match message.origin {
            Origin::User => println!("you> {}", message.text),
            Origin::Assistant => println!("campus> {}", message.text),
        }
    }
    *printed = log.len();
}

/// Capture one utterance and print what was heard
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Speak a short phrase; the transcript will print below.\n");

    let mut capture = MicCapture::new(&config.voice);
    if !capture.is_available() {
        anyhow::bail!("no input device available");
    }

    let (tx, mut rx) = mpsc::channel(4);
    capture.start(config.locale, tx).await?;

    match tokio::time::timeout(Duration::from_secs(duration), rx.recv()).await {
        Ok(Some(event)) => println!("heard: {}", event.fragments.concat()),
        Ok(None) => println!("capture ended without a transcript"),
        Err(_) => println!("no utterance detected in {duration}s"),
    }

    capture.stop().await;
    Ok(())
}

/// Play a 440Hz tone for two seconds
fn test_speaker() -> anyhow::Result<()> {
    println!("Playing a 440Hz tone for 2 seconds...");

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..48000)
        .map(|i| {
            let t = i as f32 / 24000.0;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    let playback = AudioPlayback::new()?;
    playback.play_samples(&samples)?;

    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Synthesize a phrase and play it
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let voice = config
        .voice
        .voices
        .get(&config.locale)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no voice mapped for locale {}", config.locale))?;

    println!("Synthesizing \"{text}\" with voice {voice}...");

    let tts = TtsClient::new(&config.voice);
    let mp3 = tts.synthesize(text, &voice).await?;
    println!("Got {} bytes of audio", mp3.len());

    AudioPlayback::new()?.play_mp3(&mp3)?;
    Ok(())
}

/// Probe the answer service
async fn health(config: &Config) -> anyhow::Result<()> {
    let client = AnswerClient::new(&config.answer)?;
    client.health().await?;
    println!("answer service at {} is healthy", config.answer.base_url);
    Ok(())
}
