use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use voice_fold::playback::{PlaybackResource, ResourceOpener};
use voice_fold::render::{self, DisplayList, DrawCommand, Point};
use voice_fold::{
    ClipCache, ClipError, DecodeError, PlaybackError, PlaybackTiming, RedrawFlag, RenderError,
    ToggleOutcome, VoiceFold, VoiceFoldController,
};

fn write_tone(path: &Path, seconds: f64) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut w = WavWriter::create(path, spec).unwrap();
    let n = (seconds * 8_000.0) as usize;
    for i in 0..n {
        let amp = (i * 4 / n.max(1) + 1) as i16 * 2_000;
        w.write_sample(if i % 2 == 0 { amp } else { 0 }).unwrap();
    }
    w.finalize().unwrap();
}

struct Silent;

impl PlaybackResource for Silent {
    fn start(&mut self) {}
    fn stop(&mut self) {}
    fn is_running(&self) -> bool {
        false
    }
    fn position_secs(&self) -> f64 {
        0.0
    }
}

struct SilentOpener;

impl ResourceOpener for SilentOpener {
    fn open(&self, _path: &Path) -> Result<Box<dyn PlaybackResource>, PlaybackError> {
        Ok(Box::new(Silent))
    }
}

fn fold_for(path: &Path) -> VoiceFold {
    let cache = ClipCache::new(40);
    let clip = cache.get_or_load(path).unwrap();
    let timing = PlaybackTiming {
        poll_period: Duration::from_secs(60),
        ..PlaybackTiming::default()
    };
    VoiceFold::new(clip, timing, Arc::new(SilentOpener), Arc::new(RedrawFlag::new()))
}

#[test]
fn test_cache_reuses_until_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_tone(&path, 1.0);

    let cache = ClipCache::new(40);
    let first = cache.get_or_load(&path).unwrap();
    let again = cache.get_or_load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(cache.len(), 1);

    write_tone(&path, 2.0);
    let later = SystemTime::now() + Duration::from_secs(5);
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let reloaded = cache.get_or_load(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert!((reloaded.duration_secs() - 2.0).abs() < 1e-9);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_invalidate_forces_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_tone(&path, 1.0);

    let cache = ClipCache::new(40);
    let first = cache.get_or_load(&path).unwrap();
    cache.invalidate(&path);
    assert!(cache.is_empty());
    let second = cache.get_or_load(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.envelope, second.envelope);
}

#[test]
fn test_cache_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.wav");
    assert!(!ClipCache::exists(&path));
    let err = ClipCache::new(40).get_or_load(&path).unwrap_err();
    assert!(matches!(err, ClipError::Decode(DecodeError::NotFound(_))));
}

#[test]
fn test_paint_records_player_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_tone(&path, 1.0);
    let fold = fold_for(&path).with_font("Fira Code", 13.0);

    let mut list = DisplayList::new();
    fold.paint(&mut list, Point::new(0.0, 0.0)).unwrap();

    assert!(matches!(list.commands[0], DrawCommand::FillRoundRect { .. }));
    let texts: Vec<&str> = list
        .commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { text, family, .. } => {
                assert_eq!(family, "Fira Code");
                Some(text.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["00:00", fold.clip().created_label.as_str()]);
}

#[test]
fn test_detached_surface_drops_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_tone(&path, 1.0);
    let fold = fold_for(&path);

    let mut list = DisplayList {
        detached: true,
        ..DisplayList::new()
    };
    let err = fold.paint(&mut list, Point::new(0.0, 0.0)).unwrap_err();
    assert!(matches!(err, RenderError::TargetUnavailable));
    assert!(list.commands.is_empty());
}

#[test]
fn test_click_routes_only_play_button() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_tone(&path, 1.0);
    let mut fold = fold_for(&path);
    fold.set_indent(4);
    let origin = Point::new(0.0, 100.0);
    let offset = fold.indent_offset();
    assert_eq!(offset, 26.0);

    // On the waveform: ignored.
    assert_eq!(fold.click(origin, Point::new(offset + 120.0, 130.0)), None);
    // Where the button would be without the indent: ignored.
    assert_eq!(fold.click(origin, Point::new(15.0, 130.0)), None);

    let button = render::toggle_bounds(origin, offset);
    let center = Point::new(button.x + button.width / 2.0, button.y + button.height / 2.0);
    assert_eq!(fold.click(origin, center), Some(ToggleOutcome::Started));
    assert!(fold.snapshot().is_playing());
    assert_eq!(fold.click(origin, center), Some(ToggleOutcome::Paused));
    assert_eq!(fold.size(), (render::WIDTH, render::HEIGHT));
}
