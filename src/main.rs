// src/main.rs

use anyhow::{Context, bail};
use chrono::Utc;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use voice_fold::render::format_clock;
use voice_fold::waveform::terminal::render_ascii;
use voice_fold::{
    ClipCache, CpalOpener, PlayerConfig, RedrawFlag, ToggleOutcome, VoiceAnnotation, VoiceFold,
    VoiceFoldController, VoiceRecorder, store_recording,
};

const FRAME: Duration = Duration::from_millis(50);
const ROWS: usize = 6;

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("record") => {
            let dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".idea"));
            record(&dir)
        }
        Some(clip) => {
            let config = match args.get(2) {
                Some(path) => PlayerConfig::load_from_disk(Path::new(path))
                    .with_context(|| format!("loading config {path}"))?,
                None => PlayerConfig::default(),
            };
            play(Path::new(clip), config)
        }
        None => bail!("usage: voice_player <clip> [config.json] | voice_player record <dir>"),
    }
}

/// Restores the terminal however the loop exits.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn quit_requested(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Esc)
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}

fn play(path: &Path, config: PlayerConfig) -> Result<(), anyhow::Error> {
    let cache = ClipCache::new(config.resolution);
    let clip = cache.get_or_load(path)?;
    info!(
        "{}: {:.2}s, {} Hz, {} bit, recorded {}",
        path.display(),
        clip.duration_secs(),
        clip.format.sample_rate,
        clip.format.bits_per_sample,
        clip.created_label
    );

    let redraw = Arc::new(RedrawFlag::new());
    let mut fold = VoiceFold::new(clip, config.timing(), Arc::new(CpalOpener), redraw.clone());

    println!("[SPACE] Play/Pause | [Q] Quit");
    let _raw = RawMode::enable()?;
    let mut stdout = io::stdout();
    let (_, top) = cursor::position()?;
    draw(&mut stdout, &fold, top)?;

    loop {
        if event::poll(FRAME)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind != KeyEventKind::Press {
                    continue;
                }
                if quit_requested(ev.code, ev.modifiers) {
                    break;
                }
                if ev.code == KeyCode::Char(' ') {
                    match fold.toggle() {
                        ToggleOutcome::FileMissing => error!("{} is gone", path.display()),
                        ToggleOutcome::OpenFailed => error!("could not open audio output"),
                        _ => {}
                    }
                    draw(&mut stdout, &fold, top)?;
                }
            }
        }
        if redraw.take() {
            draw(&mut stdout, &fold, top)?;
        }
    }

    fold.dispose();
    Ok(())
}

fn draw(out: &mut impl Write, fold: &VoiceFold, top: u16) -> io::Result<()> {
    let snapshot = fold.snapshot();
    execute!(out, cursor::MoveTo(0, top), Clear(ClearType::FromCursorDown))?;
    for row in render_ascii(&fold.clip().envelope.buckets, ROWS, snapshot.progress()) {
        write!(out, "{row}\r\n")?;
    }
    let icon = if snapshot.is_playing() { "||" } else { "> " };
    write!(
        out,
        "{icon} {} / {}   {}\r\n",
        format_clock(snapshot.current_time),
        format_clock(snapshot.duration),
        fold.clip().created_label
    )?;
    out.flush()
}

fn record(dir: &Path) -> Result<(), anyhow::Error> {
    let temp = std::env::temp_dir().join(format!("voice_player_{}.wav", std::process::id()));
    let recorder = VoiceRecorder::start(&temp)?;

    println!("Recording... [ENTER] Stop | [ESC] Discard");
    let raw = RawMode::enable()?;
    let mut stdout = io::stdout();
    let keep = loop {
        if event::poll(FRAME)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind != KeyEventKind::Press {
                    continue;
                }
                match ev.code {
                    KeyCode::Enter => break true,
                    code if quit_requested(code, ev.modifiers) => break false,
                    _ => {}
                }
            }
        }
        execute!(stdout, terminal::Clear(ClearType::CurrentLine), cursor::MoveToColumn(0))?;
        write!(stdout, "{}", format_clock(recorder.elapsed().as_secs_f64()))?;
        stdout.flush()?;
    };
    drop(raw);
    println!();

    let temp = recorder.stop()?;
    if !keep {
        std::fs::remove_file(&temp).ok();
        info!("recording discarded");
        return Ok(());
    }

    let stored = store_recording(&temp, dir, Utc::now())?;
    let root = std::env::current_dir()?;
    match VoiceAnnotation::relative_to(&stored, &root) {
        Some(annotation) => println!("{}", annotation.comment()),
        None => bail!(
            "{} is outside {}; record into a directory under the project",
            stored.display(),
            root.display()
        ),
    }
    Ok(())
}
