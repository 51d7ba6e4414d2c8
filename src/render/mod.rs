// src/render/mod.rs
//! Paint routine for the inline voice player.
//!
//! Everything here is a pure function of its inputs: the envelope, a
//! playback snapshot and where to draw. The output is a list of
//! [`DrawCommand`]s in logical units; surfaces antialias natively.

pub mod surface;

use crate::playback::PlaybackSnapshot;

pub use surface::{DisplayList, PaintSurface, paint};

/// Player box size.
pub const WIDTH: f32 = 200.0;
pub const HEIGHT: f32 = 64.0;
pub const PADDING: f32 = 10.0;
/// Arc diameter of the background's corners.
pub const ROUNDING: f32 = 36.0;
pub const MAX_BAR_HEIGHT: f32 = 28.0;
pub const BAR_SPACING: f32 = 1.0;
pub const CIRCLE_STROKE: f32 = 2.0;
pub const LABEL_FONT_SIZE: f32 = 11.0;
const BAR_CORNER_RADIUS: f32 = 1.25;
const PAUSE_CORNER_RADIUS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub const BACKGROUND: Color = Color::rgba(80, 80, 80, 60);
pub const ACCENT: Color = Color::rgba(72, 141, 226, 255);
pub const DIMMED: Color = Color::rgba(120, 120, 120, 255);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.x + self.width && p.y > self.y && p.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRoundRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        width: f32,
        color: Color,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    /// `origin` is the baseline anchor; right-aligned text ends there.
    Text {
        text: String,
        origin: Point,
        family: String,
        size: f32,
        align: TextAlign,
        color: Color,
    },
}

/// Inputs of one paint.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Area the host reserved for the player; its origin anchors the box.
    pub viewport: Rect,
    pub font_family: &'a str,
    pub snapshot: PlaybackSnapshot,
    pub buckets: &'a [f32],
    pub created_label: &'a str,
    /// Horizontal shift that lines the player up with the commented code.
    pub indent_offset: f32,
}

/// Pixel offset for a comment indented by `columns` characters.
pub fn indent_offset(font_size: f32, columns: u32) -> f32 {
    (font_size * columns as f32 / 2.0).round()
}

/// `MM:SS`, minutes uncapped.
pub fn format_clock(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Box occupied by the play/pause button.
pub fn toggle_bounds(origin: Point, indent_offset: f32) -> Rect {
    let size = HEIGHT - 2.0 * PADDING;
    Rect::new(origin.x + indent_offset + PADDING, origin.y + PADDING, size, size)
}

/// Whether a click at `point` lands on the play/pause button.
pub fn toggle_hit(origin: Point, indent_offset: f32, point: Point) -> bool {
    toggle_bounds(origin, indent_offset).contains(point)
}

pub fn render(req: &RenderRequest<'_>) -> Vec<DrawCommand> {
    if req.viewport.width <= 0.0 || req.viewport.height <= 0.0 {
        return Vec::new();
    }

    let x = req.viewport.x + req.indent_offset;
    let y = req.viewport.y;
    let mut cmds = Vec::with_capacity(req.buckets.len() + 6);

    cmds.push(DrawCommand::FillRoundRect {
        rect: Rect::new(x, y, WIDTH, HEIGHT),
        radius: ROUNDING / 2.0,
        color: BACKGROUND,
    });

    // The circle sits in a HEIGHT x HEIGHT slot on the left.
    let slot = HEIGHT;
    let size = slot - 2.0 * PADDING;
    let center = Point::new(x + slot / 2.0, y + slot / 2.0);
    cmds.push(DrawCommand::StrokeCircle {
        center,
        radius: size / 2.0,
        width: CIRCLE_STROKE,
        color: ACCENT,
    });

    if req.snapshot.is_playing() {
        let bar_h = size * 0.4;
        let bar_w = bar_h / 3.0;
        let top = center.y - bar_h / 2.0;
        for left in [center.x - bar_h / 6.0 - bar_w, center.x + bar_h / 6.0] {
            cmds.push(DrawCommand::FillRoundRect {
                rect: Rect::new(left, top, bar_w, bar_h),
                radius: PAUSE_CORNER_RADIUS,
                color: ACCENT,
            });
        }
    } else {
        let ox = x + PADDING;
        let oy = y + PADDING;
        cmds.push(DrawCommand::FillPolygon {
            points: vec![
                Point::new(ox + size * 0.35, oy + size * 0.7),
                Point::new(ox + size * 0.75, oy + size * 0.5),
                Point::new(ox + size * 0.35, oy + size * 0.3),
            ],
            color: ACCENT,
        });
    }

    let baseline = y + HEIGHT - PADDING;
    cmds.push(DrawCommand::Text {
        text: format_clock(req.snapshot.current_time),
        origin: Point::new(x + slot, baseline),
        family: req.font_family.to_string(),
        size: LABEL_FONT_SIZE,
        align: TextAlign::Left,
        color: ACCENT,
    });

    let count = req.buckets.len();
    if count > 0 {
        let progress = req.snapshot.progress();
        let slot_w = (WIDTH - slot - PADDING * 1.5) / count as f32;
        for (i, &value) in req.buckets.iter().enumerate() {
            let bar_h = (value * MAX_BAR_HEIGHT).max(slot_w);
            let played = (i as f64) / (count as f64) < progress;
            cmds.push(DrawCommand::FillRoundRect {
                rect: Rect::new(
                    x + slot + i as f32 * slot_w,
                    y + MAX_BAR_HEIGHT - bar_h / 2.0 - PADDING * 0.3,
                    slot_w - BAR_SPACING,
                    bar_h,
                ),
                radius: BAR_CORNER_RADIUS,
                color: if played { ACCENT } else { DIMMED },
            });
        }
    }

    cmds.push(DrawCommand::Text {
        text: req.created_label.to_string(),
        origin: Point::new(x + WIDTH - PADDING, baseline),
        family: req.font_family.to_string(),
        size: LABEL_FONT_SIZE,
        align: TextAlign::Right,
        color: DIMMED,
    });

    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackState;

    fn snapshot(state: PlaybackState, current_time: f64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state,
            current_time,
            duration: 4.0,
        }
    }

    fn request<'a>(buckets: &'a [f32], snap: PlaybackSnapshot) -> RenderRequest<'a> {
        RenderRequest {
            viewport: Rect::new(0.0, 0.0, WIDTH, HEIGHT),
            font_family: "monospace",
            snapshot: snap,
            buckets,
            created_label: "14:05",
            indent_offset: 0.0,
        }
    }

    fn bars(cmds: &[DrawCommand]) -> Vec<(Rect, Color)> {
        // Background first, then the glyph; bars are the small round rects
        // right of the circle slot.
        cmds.iter()
            .filter_map(|c| match c {
                DrawCommand::FillRoundRect { rect, color, .. } if rect.x >= HEIGHT => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(59.9), "00:59");
        assert_eq!(format_clock(61.0), "01:01");
        assert_eq!(format_clock(-3.0), "00:00");
        assert_eq!(format_clock(f64::NAN), "00:00");
    }

    #[test]
    fn test_indent_offset_rounds() {
        assert_eq!(indent_offset(13.0, 4), 26.0);
        assert_eq!(indent_offset(13.0, 3), 20.0);
        assert_eq!(indent_offset(12.0, 0), 0.0);
    }

    #[test]
    fn test_idle_draws_triangle_and_playing_draws_two_bars() {
        let buckets = [0.5f32; 40];
        let idle = render(&request(&buckets, snapshot(PlaybackState::Idle, 0.0)));
        assert!(idle.iter().any(|c| matches!(c, DrawCommand::FillPolygon { points, .. } if points.len() == 3)));

        let playing = render(&request(&buckets, snapshot(PlaybackState::Playing, 1.0)));
        assert!(!playing.iter().any(|c| matches!(c, DrawCommand::FillPolygon { .. })));
        let pause_bars = playing
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRoundRect { rect, .. } if rect.x < HEIGHT && rect.width < WIDTH))
            .count();
        assert_eq!(pause_bars, 2);
    }

    #[test]
    fn test_bars_colored_by_progress() {
        let buckets = [1.0f32; 40];
        let cmds = render(&request(&buckets, snapshot(PlaybackState::Playing, 1.0)));
        let bars = bars(&cmds);
        assert_eq!(bars.len(), 40);
        // A quarter of the clip played: bars 0..10 are lit.
        assert!(bars[..10].iter().all(|(_, c)| *c == ACCENT));
        assert!(bars[10..].iter().all(|(_, c)| *c == DIMMED));
    }

    #[test]
    fn test_bar_geometry() {
        let mut buckets = [0.5f32; 40];
        buckets[0] = 0.0;
        buckets[1] = 1.0;
        let cmds = render(&request(&buckets, snapshot(PlaybackState::Idle, 0.0)));
        let bars = bars(&cmds);
        let slot_w = (WIDTH - HEIGHT - PADDING * 1.5) / 40.0;

        // Silent bucket still gets a bar as tall as it is wide.
        assert_eq!(bars[0].0.height, slot_w);
        assert_eq!(bars[1].0.height, MAX_BAR_HEIGHT);
        assert_eq!(bars[1].0.x, HEIGHT + slot_w);
        assert_eq!(bars[1].0.width, slot_w - BAR_SPACING);
        assert!(bars.iter().all(|(r, _)| r.x + r.width <= WIDTH));
    }

    #[test]
    fn test_labels_and_indent_shift() {
        let buckets = [0.3f32; 40];
        let mut req = request(&buckets, snapshot(PlaybackState::Idle, 65.0));
        req.indent_offset = 26.0;
        let cmds = render(&req);

        match &cmds[0] {
            DrawCommand::FillRoundRect { rect, radius, .. } => {
                assert_eq!(rect.x, 26.0);
                assert_eq!(*radius, 18.0);
            }
            other => panic!("unexpected first command {other:?}"),
        }

        let texts: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, origin, align, .. } => Some((text.as_str(), *origin, *align)),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], ("01:05", Point::new(26.0 + HEIGHT, 54.0), TextAlign::Left));
        assert_eq!(texts[1], ("14:05", Point::new(26.0 + WIDTH - PADDING, 54.0), TextAlign::Right));
    }

    #[test]
    fn test_empty_viewport_draws_nothing() {
        let mut req = request(&[0.5; 40], snapshot(PlaybackState::Idle, 0.0));
        req.viewport = Rect::new(0.0, 0.0, 0.0, 0.0);
        assert!(render(&req).is_empty());
    }

    #[test]
    fn test_toggle_hit() {
        let origin = Point::new(100.0, 40.0);
        assert!(toggle_hit(origin, 13.0, Point::new(100.0 + 13.0 + 32.0, 40.0 + 32.0)));
        assert!(!toggle_hit(origin, 13.0, Point::new(100.0 + 5.0, 40.0 + 32.0)));
        assert!(!toggle_hit(origin, 0.0, Point::new(100.0 + 120.0, 40.0 + 32.0)));
    }
}
