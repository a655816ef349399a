use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use lingo_pal::api::{ApiServer, ApiState};
use lingo_pal::voice::{
    AudioPlayback, CapturePipeline, CpalMicrophone, Narrator, SilentNarrator, SpeechOutput,
    TextToSpeech, Utterance,
};
use lingo_pal::{
    Category, Config, Difficulty, FeedbackView, HttpTutorBackend, LessonPlan, PhoneticDictionary,
    Retrying, Session, SessionEvent, Verdict,
};

/// Lingo Pal - spoken pronunciation practice with a friendly tutor
#[derive(Parser)]
#[command(name = "lingopal", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive practice session (the default)
    Practice {
        /// Target words to practice, in order
        #[arg(short, long = "word")]
        words: Vec<String>,
        /// Practice every word in a category
        #[arg(short, long)]
        category: Option<Category>,
        /// Print replies instead of speaking them
        #[arg(long)]
        mute: bool,
        /// Serve the feedback view over HTTP on this port
        #[arg(long, env = "LINGOPAL_API_PORT")]
        port: Option<u16>,
    },
    /// Show the phonetic breakdown of a word
    Lookup { word: String },
    /// Check a heard word against an expected word
    Check { heard: String, expected: String },
    /// List known words
    Words {
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(short, long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Speak text with the tutor's voice
    Say {
        #[arg(default_value = "Hello! Let's practice some words together.")]
        text: String,
    },
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    let level: u8 = s.parse().map_err(|e| format!("{e}"))?;
    Difficulty::try_from(level).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,lingo_pal=info",
        1 => "info,lingo_pal=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let dictionary = PhoneticDictionary::load(config.dictionary_path.as_deref())?;

    match cli.command.unwrap_or(Command::Practice {
        words: Vec::new(),
        category: None,
        mute: false,
        port: None,
    }) {
        Command::Practice {
            words,
            category,
            mute,
            port,
        } => practice(config, dictionary, &words, category, mute, port).await,
        Command::Lookup { word } => {
            lookup(&dictionary, &word);
            Ok(())
        }
        Command::Check { heard, expected } => check(&dictionary, &heard, &expected),
        Command::Words {
            category,
            difficulty,
        } => {
            list_words(&dictionary, category, difficulty);
            Ok(())
        }
        Command::TestMic { duration } => test_mic(duration).await,
        Command::Say { text } => say(&config, &text).await,
    }
}

/// Build the speech output for a session
fn speech_output(config: &Config, mute: bool) -> Box<dyn SpeechOutput> {
    if mute {
        return Box::new(SilentNarrator);
    }
    match narrator(config) {
        Ok(narrator) => Box::new(narrator),
        Err(e) => {
            tracing::warn!(error = %e, "speech output unavailable, replies will be text only");
            Box::new(SilentNarrator)
        }
    }
}

fn narrator(config: &Config) -> anyhow::Result<Narrator> {
    let key = config
        .tts_api_key()
        .ok_or_else(|| anyhow::anyhow!("no API key for {:?} TTS", config.voice.provider))?;
    let tts = TextToSpeech::new(
        config.voice.provider,
        key.to_string(),
        config.voice.tts_model.clone(),
        config.voice.default_voice.clone(),
    )?;
    let playback = AudioPlayback::new()?;
    Ok(Narrator::new(
        tts,
        playback,
        config.voice.profile,
        config.voice.preferred_voices.clone(),
    ))
}

#[allow(clippy::future_not_send)]
async fn practice(
    config: Config,
    dictionary: PhoneticDictionary,
    words: &[String],
    category: Option<Category>,
    mute: bool,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let dictionary = Arc::new(dictionary);

    let lesson = if !words.is_empty() {
        LessonPlan::from_words(&dictionary, words)?
    } else if let Some(category) = category {
        LessonPlan::for_category(&dictionary, category)
    } else {
        LessonPlan::default()
    };

    let backend = Retrying::new(
        HttpTutorBackend::new(&config.backend.url, config.backend.timeout)?,
        config.retry_policy(),
    );
    let speech = speech_output(&config, mute);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(
        CpalMicrophone::new(),
        backend,
        speech,
        Arc::clone(&dictionary),
        config.session.clone(),
        events_tx.clone(),
    );
    session.set_lesson(lesson);

    // Port 0 disables the HTTP surface
    let port = port.unwrap_or(config.api_port);
    if port != 0 {
        let server = ApiServer::new(
            ApiState {
                feedback: session.subscribe(),
                dictionary: Arc::clone(&dictionary),
            },
            port,
        );
        let _server = server.spawn();
    }

    tokio::spawn(render(session.subscribe()));
    std::thread::spawn(move || read_commands(&events_tx));

    println!("Press Enter to start/stop talking, l = listen, s = slow, q = quit\n");
    lingo_pal::session::run(session, events_rx).await?;
    Ok(())
}

/// Print feedback changes as they happen
async fn render(mut feedback: watch::Receiver<FeedbackView>) {
    let mut last_text = String::new();
    loop {
        {
            let view = feedback.borrow_and_update();
            let status = match view.phase {
                lingo_pal::Phase::ListeningForTap => "🎤 tap to talk",
                lingo_pal::Phase::Recording => "🔴 recording... tap to stop",
                lingo_pal::Phase::Thinking => "💭 thinking...",
                lingo_pal::Phase::Speaking => "🔊 speaking...",
            };
            if view.feedback_text != last_text {
                println!("[{}] {}", view.mood, view.feedback_text);
                last_text.clone_from(&view.feedback_text);
            }
            if let Some(correction) = &view.correction {
                let breakdown: Vec<String> = correction
                    .phonemes
                    .iter()
                    .map(|p| {
                        if p.focus {
                            format!("[{}]", p.phoneme)
                        } else {
                            p.phoneme.clone()
                        }
                    })
                    .collect();
                println!("   {}  ->  {}", correction.prompt, breakdown.join(" "));
            }
            if view.phase.accepts_tap() {
                if let Some(word) = &view.target_word {
                    print!("{status} (target: {word}) > ");
                } else {
                    print!("{status} > ");
                }
            } else {
                println!("{status}");
            }
            let _ = std::io::stdout().flush();
        }
        if feedback.changed().await.is_err() {
            break;
        }
    }
}

/// Turn terminal lines into session events
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
fn read_commands(events: &mpsc::UnboundedSender<SessionEvent>) {
    for line in std::io::stdin().lines() {
        let Ok(line) = line else {
            break;
        };
        let Some(event) = SessionEvent::from_command(&line) else {
            println!("unknown command: {line}");
            continue;
        };
        if events.send(event).is_err() || event == SessionEvent::Quit {
            return;
        }
    }
    let _ = events.send(SessionEvent::Quit);
}

fn lookup(dictionary: &PhoneticDictionary, word: &str) {
    match dictionary.lookup(word) {
        Some(entry) => {
            println!("{}", entry.word);
            println!("  phonemes:     {}", entry.phonemes.join(" "));
            println!("  target sound: /{}/", entry.target_sound);
            println!("  difficulty:   {}", entry.difficulty);
            println!("  category:     {}", entry.category);
        }
        None => println!("\"{word}\" is not in the dictionary"),
    }
}

fn check(dictionary: &PhoneticDictionary, heard: &str, expected: &str) -> anyhow::Result<()> {
    let entry = dictionary
        .lookup(expected)
        .ok_or_else(|| anyhow::anyhow!("\"{expected}\" is not in the dictionary"))?;

    match lingo_pal::evaluate(heard, entry) {
        Verdict::Accepted => println!("✅ \"{heard}\" matches \"{}\"", entry.word),
        Verdict::Correction(case) => {
            println!("❌ {}", case.prompt());
            println!("   {}", case.breakdown());
        }
    }
    Ok(())
}

fn list_words(
    dictionary: &PhoneticDictionary,
    category: Option<Category>,
    difficulty: Option<Difficulty>,
) {
    let words = dictionary
        .entries()
        .into_iter()
        .filter(|w| category.is_none_or(|c| w.category == c))
        .filter(|w| difficulty.is_none_or(|d| w.difficulty == d));

    for w in words {
        println!(
            "{:<12} {:<14} /{}/  level {}",
            w.word, w.category, w.target_sound, w.difficulty
        );
    }
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = CapturePipeline::new(CpalMicrophone::new());
    capture.start_capture()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.recent_samples(lingo_pal::voice::SAMPLE_RATE as usize);
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    let artifact = capture.stop_capture()?;

    println!("\n---");
    println!(
        "Captured {} ms of audio ({} bytes WAV)",
        artifact.duration_ms(),
        artifact.bytes.len()
    );
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Speak text with the configured voice
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let mut narrator = narrator(config)?;
    if let Err(e) = narrator.refresh_voices().await {
        tracing::warn!(error = %e, "voice listing failed");
    }
    println!(
        "Speaking with {}...",
        narrator.voice().map_or("the default voice", |v| v.name.as_str())
    );
    narrator.speak(Utterance::new(text, None)).await?.wait().await;
    Ok(())
}
