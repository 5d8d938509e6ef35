use std::{fmt, fs, io, path::PathBuf};

use clap::Parser;
use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};
use log::{error, info, warn};
use swiftread_core::{
    app::{PlaybackState, ReaderApp, TickResult},
    content::{IngestionError, NoNativeRendering, PlainTextDecoder, load_document},
    input::MockInput,
    settings::{ChapterProgressMode, Settings},
    storage::SessionStore,
};

use file_store::FileStore;
use session_sync::SessionSyncState;

#[path = "main/file_store.rs"]
mod file_store;
#[path = "main/session_sync.rs"]
mod session_sync;
#[path = "main/terminal.rs"]
mod terminal;

const SESSION_RETRY_MS: u64 = 2_000;
const DEFAULT_SMALL_QUOTA_BYTES: usize = 5 * 1024 * 1024;
const REPORT_INTERVAL_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(name = "swiftread")]
#[command(about = "Speed-read a text file one word at a time", long_about = None)]
struct Args {
    /// Text file to read
    #[arg(conflicts_with = "resume", required_unless_present = "resume")]
    file: Option<PathBuf>,

    /// Continue the saved session instead of opening a file
    #[arg(long)]
    resume: bool,

    /// Reading speed in words per minute
    #[arg(long)]
    wpm: Option<u16>,

    /// Words shown together (1-5)
    #[arg(long)]
    frame: Option<u8>,

    /// Show words left in the chapter instead of a percentage
    #[arg(long)]
    words_left: bool,

    /// Stop after this many words
    #[arg(long)]
    max_words: Option<usize>,

    /// Directory holding the saved session
    #[arg(long, default_value = ".swiftread")]
    state_dir: PathBuf,

    /// Byte quota of the small session tier
    #[arg(long, default_value_t = DEFAULT_SMALL_QUOTA_BYTES)]
    small_quota: usize,

    /// Forget the saved session before starting
    #[arg(long)]
    forget: bool,
}

#[derive(Debug)]
enum RunError {
    Read { path: PathBuf, source: io::Error },
    Ingestion(IngestionError),
    NothingSaved,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Ingestion(err) => write!(f, "cannot open document: {err}"),
            Self::NothingSaved => f.write_str("no saved session to resume"),
        }
    }
}

impl std::error::Error for RunError {}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), RunError> {
    let mut store = SessionStore::new(
        FileStore::with_quota(args.state_dir.join("small"), args.small_quota),
        FileStore::unlimited(args.state_dir.join("large")),
    );
    if args.forget && !store.clear().await {
        warn!("session: could not clear every tier");
    }

    let mut app = ReaderApp::new(MockInput::new(), Settings::default());

    if args.resume {
        let session = store.load().await.ok_or(RunError::NothingSaved)?;
        if let Err(err) = app.restore_session(session) {
            warn!("session: saved session unusable: {err}");
            return Err(RunError::NothingSaved);
        }
    } else if let Some(path) = args.file.as_ref() {
        let bytes = fs::read(path).map_err(|source| RunError::Read {
            path: path.clone(),
            source,
        })?;
        app.begin_ingestion();
        let loaded = load_document(&bytes, &PlainTextDecoder, &NoNativeRendering).await;
        app.finish_ingestion(loaded).map_err(RunError::Ingestion)?;
    }

    let mut settings = app.settings().clone();
    if let Some(wpm) = args.wpm {
        settings.wpm = wpm;
    }
    if let Some(frame) = args.frame {
        settings.frame_size = frame;
    }
    if args.words_left {
        settings.chapter_progress = ChapterProgressMode::WordsLeft;
    }
    app.apply_settings(settings);

    info!(
        "Reader started: words={} wpm={} frame={} state_dir={}",
        app.total_words(),
        app.settings().wpm,
        app.settings().frame_size,
        args.state_dir.display()
    );

    let mut session_sync = SessionSyncState::new();
    let loop_start = Instant::now();
    let mut report_start = Instant::now();
    let mut report_words = 0u64;
    let mut words_read = 0usize;
    let mut last_position = app.position();

    app.play(loop_start.elapsed().as_millis());

    loop {
        let now_ms = loop_start.elapsed().as_millis();
        if app.tick(now_ms) == TickResult::RenderRequested
            && let Some(line) = terminal::render_line(&app, terminal::DEFAULT_COLUMNS)
        {
            println!("{line}");
        }

        if app.position() != last_position {
            let moved = app.position().abs_diff(last_position);
            words_read = words_read.saturating_add(moved);
            report_words = report_words.saturating_add(moved as u64);
            last_position = app.position();
        }

        session_sync.track(&mut app, now_ms);
        session_sync.flush_if_due(&app, &mut store, now_ms).await;

        if app.playback() == PlaybackState::Stopped {
            break;
        }
        if args.max_words.is_some_and(|max| words_read >= max) {
            info!("reader: word limit reached at={}", app.position());
            break;
        }

        let elapsed = report_start.elapsed();
        if elapsed >= Duration::from_secs(REPORT_INTERVAL_SECS) {
            let elapsed_ms = elapsed.as_millis().max(1);
            let wpm_x100 = report_words * 6_000_000 / elapsed_ms;
            info!(
                "effective_wpm={}.{:02} words={} elapsed_ms={}",
                wpm_x100 / 100,
                wpm_x100 % 100,
                report_words,
                elapsed_ms
            );
            report_words = 0;
            report_start = Instant::now();
        }

        Timer::after_millis(1).await;
    }

    app.visibility_lost();
    session_sync.flush_now(&mut app, &mut store).await;
    info!(
        "Reader finished: at={}/{} saves={}",
        app.position(),
        app.total_words(),
        session_sync.saves()
    );
    Ok(())
}
