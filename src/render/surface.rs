// src/render/surface.rs

use super::DrawCommand;
use crate::error::RenderError;

/// A 2D target the host hands to the player for one paint.
pub trait PaintSurface {
    /// `false` once the widget behind the surface is gone.
    fn is_available(&self) -> bool {
        true
    }

    fn draw(&mut self, command: &DrawCommand);
}

/// Replays `commands` onto `surface`. An unavailable surface drops the
/// whole frame; callers do not retry.
pub fn paint(surface: &mut dyn PaintSurface, commands: &[DrawCommand]) -> Result<(), RenderError> {
    if !surface.is_available() {
        return Err(RenderError::TargetUnavailable);
    }
    for cmd in commands {
        surface.draw(cmd);
    }
    Ok(())
}

/// Records commands instead of drawing them.
#[derive(Debug, Default, Clone)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
    pub detached: bool,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaintSurface for DisplayList {
    fn is_available(&self) -> bool {
        !self.detached
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}
