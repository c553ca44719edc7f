//! End-of-game banners drawn with a 16x16 glyph font sheet.
//!
//! Letters index the sheet by their ASCII code. A space maps to a blank cell.

use crate::entity::{Entity, EntityKind, TextureHandle};
use glam::Vec3;
use ledge_core::animation::{AnimationClip, SpriteSheet};
use std::fmt;

/// Sheet cell drawn for a space.
pub const BLANK_GLYPH: u32 = 9;

const fn glyph_table<const N: usize>(text: &[u8; N]) -> [u32; N] {
    let mut out = [0u32; N];
    let mut i = 0;
    while i < N {
        out[i] = if text[i] == b' ' {
            BLANK_GLYPH
        } else {
            text[i] as u32
        };
        i += 1;
    }
    out
}

const GAME_OVER_GLYPHS: [u32; 9] = glyph_table(b"GAME OVER");
const YOU_WIN_GLYPHS: [u32; 7] = glyph_table(b"YOU WIN");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Banner {
    GameOver,
    YouWin,
}

impl Banner {
    pub const ALL: [Banner; 2] = [Banner::GameOver, Banner::YouWin];

    pub fn text(self) -> &'static str {
        match self {
            Banner::GameOver => "GAME OVER",
            Banner::YouWin => "YOU WIN",
        }
    }

    pub fn glyphs(self) -> &'static [u32] {
        match self {
            Banner::GameOver => &GAME_OVER_GLYPHS,
            Banner::YouWin => &YOU_WIN_GLYPHS,
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Where and how banner glyphs are laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontLayout {
    pub texture: TextureHandle,
    pub sheet: SpriteSheet,
    pub glyph_size: f32,
    /// Center x of the first glyph.
    pub start_x: f32,
    pub spacing: f32,
    pub baseline_y: f32,
}

/// The glyph entities of one banner. Built inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerSet {
    banner: Banner,
    glyphs: Vec<Entity>,
}

impl BannerSet {
    pub fn new(banner: Banner, font: &FontLayout) -> Self {
        let glyphs = banner
            .glyphs()
            .iter()
            .enumerate()
            .map(|(i, &cell)| {
                let position = Vec3::new(
                    font.start_x + i as f32 * font.spacing,
                    font.baseline_y,
                    0.0,
                );
                let mut glyph = Entity {
                    width: font.glyph_size,
                    height: font.glyph_size,
                    ..Entity::new(
                        EntityKind::Glyph,
                        position,
                        font.texture,
                        font.sheet,
                        AnimationClip::still(cell),
                    )
                };
                glyph.active = false;
                glyph
            })
            .collect();
        Self { banner, glyphs }
    }

    pub fn glyphs(&self) -> &[Entity] {
        &self.glyphs
    }

    #[allow(dead_code)]
    pub fn is_shown(&self) -> bool {
        self.glyphs.iter().all(|g| g.active)
    }

    /// Activate every glyph and run its zero-length animation step.
    pub fn show(&mut self) {
        for glyph in &mut self.glyphs {
            glyph.active = true;
            glyph.animate(0, 0);
        }
        log::debug!("Showing {} ({} glyphs)", self.banner, self.glyphs.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontLayout {
        FontLayout {
            texture: TextureHandle(7),
            sheet: SpriteSheet { cols: 16, rows: 16 },
            glyph_size: 0.3,
            start_x: -2.0,
            spacing: 0.5,
            baseline_y: 0.0,
        }
    }

    #[test]
    fn glyph_tables_match_ascii_with_blank_space() {
        assert_eq!(
            Banner::GameOver.glyphs(),
            &[71, 65, 77, 69, 9, 79, 86, 69, 82]
        );
        assert_eq!(Banner::YouWin.glyphs(), &[89, 79, 85, 9, 87, 73, 78]);
    }

    #[test]
    fn glyph_count_matches_text_length() {
        for banner in Banner::ALL {
            assert_eq!(banner.glyphs().len(), banner.text().len());
        }
    }

    #[test]
    fn banner_set_lays_out_inactive_glyphs() {
        let set = BannerSet::new(Banner::YouWin, &font());
        assert_eq!(set.glyphs().len(), 7);
        assert!(!set.is_shown());
        assert!(set.glyphs().iter().all(|g| !g.active));

        let xs: Vec<f32> = set.glyphs().iter().map(|g| g.position.x).collect();
        assert_eq!(xs, vec![-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(set.glyphs()[0].animation.current_cell(), 89);
        assert_eq!(set.glyphs()[0].width, 0.3);
    }

    #[test]
    fn show_activates_without_changing_frames() {
        let mut set = BannerSet::new(Banner::GameOver, &font());
        set.show();
        assert!(set.is_shown());
        for (glyph, &cell) in set.glyphs().iter().zip(Banner::GameOver.glyphs()) {
            assert_eq!(glyph.animation.frame_index, 0);
            assert_eq!(glyph.animation.current_cell(), cell);
        }
    }

    #[test]
    fn display_uses_banner_text() {
        assert_eq!(Banner::GameOver.to_string(), "GAME OVER");
    }
}
