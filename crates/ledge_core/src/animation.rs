//! Sprite-sheet animation state and deterministic frame stepping.
//!
//! A sprite sheet is a uniform grid of cells numbered row-major from the top
//! left. A clip is an ordered list of cell indices; the runtime state walks
//! that list with a fixed per-frame duration. Timing is integer microseconds
//! so frame selection is identical on every platform under the fixed step.
//!
//! The active clip is chosen by the owner (input handling for the player)
//! before `tick` runs; `tick` only advances within the current clip. A tick of
//! zero microseconds never changes the frame, which makes it usable as the
//! "compute the initial render-ready state" pass.

use serde::Deserialize;
use thiserror::Error;

/// Uniform cell grid over a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SpriteSheet {
    pub cols: u32,
    pub rows: u32,
}

impl SpriteSheet {
    /// Whole texture as one cell.
    pub const SINGLE: SpriteSheet = SpriteSheet { cols: 1, rows: 1 };

    pub fn new(cols: u32, rows: u32) -> Result<Self, AnimationError> {
        if cols == 0 || rows == 0 {
            return Err(AnimationError::EmptySheet);
        }
        Ok(Self { cols, rows })
    }

    pub fn cell_count(&self) -> u32 {
        self.cols * self.rows
    }

    pub fn contains(&self, cell: u32) -> bool {
        cell < self.cell_count()
    }

    /// Texture-space rectangle `[u0, v0, u1, v1]` of a cell, `v0` at the top.
    pub fn uv_rect(&self, cell: u32) -> [f32; 4] {
        let cell_w = 1.0 / self.cols as f32;
        let cell_h = 1.0 / self.rows as f32;
        let u0 = (cell % self.cols) as f32 * cell_w;
        let v0 = (cell / self.cols) as f32 * cell_h;
        [u0, v0, u0 + cell_w, v0 + cell_h]
    }
}

impl Default for SpriteSheet {
    fn default() -> Self {
        Self::SINGLE
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("sprite sheet must have at least one column and one row")]
    EmptySheet,
    #[error("clip '{0}' has no frames")]
    EmptyClip(String),
    #[error("clip '{clip}' frame {frame} uses cell {cell} but the sheet has {cells} cells")]
    CellOutOfRange {
        clip: String,
        frame: usize,
        cell: u32,
        cells: u32,
    },
}

/// Named sequence of sheet cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    pub name: String,
    frames: Vec<u32>,
}

impl AnimationClip {
    pub fn new(name: &str, frames: Vec<u32>, sheet: SpriteSheet) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::EmptyClip(name.to_string()));
        }
        for (frame, &cell) in frames.iter().enumerate() {
            if !sheet.contains(cell) {
                return Err(AnimationError::CellOutOfRange {
                    clip: name.to_string(),
                    frame,
                    cell,
                    cells: sheet.cell_count(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            frames,
        })
    }

    /// Single-frame clip showing one cell.
    pub fn still(cell: u32) -> Self {
        Self {
            name: "still".to_string(),
            frames: vec![cell],
        }
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Runtime animation state for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    clip: AnimationClip,
    pub frame_index: usize,
    pub elapsed_us: u64,
}

impl AnimationState {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            frame_index: 0,
            elapsed_us: 0,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Switch to another clip. Re-selecting the current clip is a no-op; a new
    /// clip keeps the frame position (wrapped to its length) so direction
    /// changes do not restart the cycle.
    pub fn set_clip(&mut self, clip: &AnimationClip) {
        if self.clip.name == clip.name {
            return;
        }
        self.clip = clip.clone();
        self.frame_index %= self.clip.frame_count();
    }

    /// Sheet cell to draw right now.
    pub fn current_cell(&self) -> u32 {
        self.clip.frames[self.frame_index]
    }

    /// Accumulate `dt_us`; once the timer reaches `frame_duration_us` step to
    /// the next frame (wrapping) and reset the timer. Returns the cell to draw.
    pub fn tick(&mut self, dt_us: u64, frame_duration_us: u64) -> u32 {
        self.elapsed_us += dt_us;
        if frame_duration_us > 0 && self.elapsed_us >= frame_duration_us {
            self.frame_index = (self.frame_index + 1) % self.clip.frame_count();
            self.elapsed_us = 0;
        }
        self.current_cell()
    }
}
