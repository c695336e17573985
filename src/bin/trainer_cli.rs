use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guitar_trainer::assist::{parse_progression, SongAssistClient};
use guitar_trainer::config::AppConfig;
use guitar_trainer::curriculum::Curriculum;
use guitar_trainer::detection::DetectionLink;
use guitar_trainer::media::StreamController;
use guitar_trainer::session::TrainerSession;

#[derive(Parser, Debug)]
#[command(
    name = "trainer_cli",
    about = "Diagnostic harness for the guitar trainer core"
)]
struct Cli {
    /// Override path to the JSON config file
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the curriculum with lock state and thresholds
    Curriculum,
    /// Connect to the detection channel and print events as JSON lines
    Listen {
        /// Stop after this many events (0 = until Ctrl-C)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Issue a media stream control request
    Stream {
        #[command(subcommand)]
        action: StreamAction,
    },
    /// Fetch a chord progression for a song from the assistance service
    Progression { song: String },
}

#[derive(Subcommand, Debug)]
enum StreamAction {
    Start,
    Stop,
}

fn main() -> ExitCode {
    guitar_trainer::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building Tokio runtime")?;

    match cli.command {
        Commands::Curriculum => run_curriculum(config),
        Commands::Listen { limit } => runtime.block_on(run_listen(&config, limit)),
        Commands::Stream { action } => runtime.block_on(run_stream(&config, action)),
        Commands::Progression { song } => runtime.block_on(run_progression(&config, &song)),
    }
}

fn run_curriculum(config: AppConfig) -> Result<ExitCode> {
    let session = TrainerSession::new(config, Curriculum::builtin());
    let overviews = session
        .lesson_overviews()
        .map_err(|err| anyhow::anyhow!("{}", err))?;
    let curriculum = std::sync::Arc::clone(session.curriculum());

    for overview in overviews {
        let locked = if overview.locked { " [locked]" } else { "" };
        println!("{} - {}{}", overview.lesson_id, overview.title, locked);
        let Some(lesson) = curriculum.lesson(&overview.lesson_id) else {
            continue;
        };
        for sublesson in &lesson.sublessons {
            let threshold = sublesson
                .config
                .as_ref()
                .and_then(|c| match (c.min_correct, c.total_trials) {
                    (Some(min), Some(total)) => Some(format!(" ({}/{})", min, total)),
                    (Some(min), None) => Some(format!(" (min {})", min)),
                    _ => c.required_accuracy.map(|a| format!(" ({}% accuracy)", a)),
                })
                .unwrap_or_default();
            println!(
                "  {} {:?} - {}{}",
                sublesson.id, sublesson.kind, sublesson.title, threshold
            );
        }
    }
    Ok(ExitCode::from(0))
}

async fn run_listen(config: &AppConfig, limit: usize) -> Result<ExitCode> {
    let link = DetectionLink::new(&config.link);
    let mut events = link.subscribe_events();
    let mut states = link.subscribe_state();
    link.connect().map_err(|err| anyhow::anyhow!("{}", err))?;

    let mut seen = 0usize;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    seen += 1;
                    if limit > 0 && seen >= limit {
                        break;
                    }
                }
                Err(_) => continue,
            },
            state = states.recv() => {
                if let Ok(state) = state {
                    eprintln!("# connection: {:?}", state);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    link.disconnect()
        .await
        .map_err(|err| anyhow::anyhow!("{}", err))?;
    Ok(ExitCode::from(0))
}

async fn run_stream(config: &AppConfig, action: StreamAction) -> Result<ExitCode> {
    let stream = StreamController::new(&config.stream);
    let result = match action {
        StreamAction::Start => stream.start().await,
        StreamAction::Stop => stream.stop().await,
    };
    match result {
        Ok(()) => {
            println!("stream state: {:?}", stream.state());
            Ok(ExitCode::from(0))
        }
        Err(err) => {
            eprintln!("stream control failed: {}", err);
            Ok(ExitCode::from(2))
        }
    }
}

async fn run_progression(config: &AppConfig, song: &str) -> Result<ExitCode> {
    let assist = SongAssistClient::new(&config.assist);
    let text = assist.chord_progression(song).await?;
    println!("{}", text);
    let chords = parse_progression(&text);
    if !chords.is_empty() {
        let roots: Vec<&str> = chords.iter().map(|c| c.root()).collect();
        println!("# parsed chords: {}", roots.join(" "));
    }
    Ok(ExitCode::from(0))
}
