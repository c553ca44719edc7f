//! Level file loading: JSON layout of the player, platform runs, enemies,
//! banner font and simulation rules.

use crate::ai::{AiPhase, AiVariant, EnemyAi};
use crate::assets::TextureSet;
use crate::banner::{Banner, FontLayout};
use crate::entity::{Entity, EntityKind, TextureHandle};
use crate::world::{PlayerClips, Rules, World};
use glam::{Vec2, Vec3};
use ledge_core::animation::{AnimationClip, AnimationError, SpriteSheet};
use ledge_core::time::DEFAULT_FIXED_DT_US;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const LEVEL_VERSION: &str = "0.1";

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level JSON {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level validation failed: unsupported version '{0}' (expected '{LEVEL_VERSION}')")]
    UnsupportedVersion(String),
    #[error("level validation failed: {0}")]
    Invalid(String),
    #[error("level validation failed: {owner} uses unknown texture key '{key}'")]
    UnknownTexture { owner: String, key: String },
    #[error("level validation failed: {owner} has no clip named '{clip}'")]
    UnknownClip { owner: String, clip: String },
    #[error("level validation failed: {0}")]
    Animation(#[from] AnimationError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    pub textures: BTreeMap<String, String>,
    pub player: PlayerConfig,
    pub platforms: Vec<PlatformRun>,
    pub enemies: Vec<EnemyConfig>,
    pub font: FontConfig,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RulesConfig {
    #[serde(default = "default_fixed_dt_us")]
    pub fixed_dt_us: u64,
    #[serde(default = "default_frame_duration_us")]
    pub frame_duration_us: u64,
    #[serde(default)]
    pub walker_bounce: bool,
    #[serde(default)]
    pub stomp_defeats_enemy: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            fixed_dt_us: default_fixed_dt_us(),
            frame_duration_us: default_frame_duration_us(),
            walker_bounce: false,
            stomp_defeats_enemy: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    #[serde(default = "default_half_width")]
    pub half_width: f32,
    #[serde(default = "default_half_height")]
    pub half_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            half_width: default_half_width(),
            half_height: default_half_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerConfig {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "default_size")]
    pub width: f32,
    #[serde(default = "default_size")]
    pub height: f32,
    pub speed: f32,
    pub jump_power: f32,
    #[serde(default)]
    pub gravity: f32,
    pub texture: String,
    #[serde(default)]
    pub sheet: SpriteSheet,
    pub clips: BTreeMap<String, Vec<u32>>,
    pub initial_clip: String,
}

/// `count` unit-spaced tiles starting at (`x`, `y`), stepping right.
#[derive(Debug, Deserialize, Clone)]
pub struct PlatformRun {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_size")]
    pub width: f32,
    #[serde(default = "default_size")]
    pub height: f32,
    pub texture: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnemyConfig {
    pub ai: AiVariant,
    #[serde(default)]
    pub phase: Option<AiPhase>,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_size")]
    pub width: f32,
    #[serde(default = "default_size")]
    pub height: f32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub movement_x: f32,
    #[serde(default)]
    pub movement_y: f32,
    #[serde(default)]
    pub gravity: f32,
    #[serde(default)]
    pub jump_power: f32,
    pub texture: String,
    #[serde(default)]
    pub sheet: SpriteSheet,
    #[serde(default)]
    pub clip: Option<Vec<u32>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FontConfig {
    pub texture: String,
    pub sheet: SpriteSheet,
    #[serde(default = "default_glyph_size")]
    pub glyph_size: f32,
    #[serde(default = "default_font_start_x")]
    pub start_x: f32,
    #[serde(default = "default_font_spacing")]
    pub spacing: f32,
    #[serde(default)]
    pub y: f32,
}

/// A validated level turned into a runnable world.
#[derive(Debug)]
pub struct LoadedLevel {
    pub level_id: String,
    pub fixed_dt_us: u64,
    pub camera: CameraConfig,
    pub world: World,
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.display().to_string(),
        source,
    })?;
    LevelFile::from_json(&raw, &path.display().to_string())
}

impl LevelFile {
    /// Parse and validate. `origin` names the source in errors.
    pub fn from_json(raw: &str, origin: &str) -> Result<Self, LevelError> {
        let level: LevelFile = serde_json::from_str(raw).map_err(|source| LevelError::Parse {
            path: origin.to_string(),
            source,
        })?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.version != LEVEL_VERSION {
            return Err(LevelError::UnsupportedVersion(self.version.clone()));
        }
        if self.rules.fixed_dt_us == 0 {
            return invalid("rules.fixed_dt_us must be > 0");
        }
        if self.rules.frame_duration_us == 0 {
            return invalid("rules.frame_duration_us must be > 0");
        }
        if !(self.camera.half_width > 0.0 && self.camera.half_height > 0.0) {
            return invalid("camera half extents must be > 0");
        }

        let player = &self.player;
        self.check_texture("player", &player.texture)?;
        check_size("player", player.width, player.height)?;
        if player.speed < 0.0 {
            return invalid("player speed must be >= 0");
        }
        SpriteSheet::new(player.sheet.cols, player.sheet.rows)?;
        for (name, frames) in &player.clips {
            AnimationClip::new(name, frames.clone(), player.sheet)?;
        }
        if !player.clips.contains_key(&player.initial_clip) {
            return Err(LevelError::UnknownClip {
                owner: "player".to_string(),
                clip: player.initial_clip.clone(),
            });
        }

        if self.platforms.is_empty() {
            log::warn!("Level '{}' has no platforms", self.level_id);
        }
        for (i, run) in self.platforms.iter().enumerate() {
            let owner = format!("platforms[{i}]");
            self.check_texture(&owner, &run.texture)?;
            check_size(&owner, run.width, run.height)?;
            if run.count == 0 {
                return invalid(&format!("{owner} count must be > 0"));
            }
        }

        if self.enemies.is_empty() {
            return invalid("enemies array is empty");
        }
        for (i, enemy) in self.enemies.iter().enumerate() {
            let owner = format!("enemies[{i}]");
            self.check_texture(&owner, &enemy.texture)?;
            check_size(&owner, enemy.width, enemy.height)?;
            if enemy.speed < 0.0 {
                return invalid(&format!("{owner} speed must be >= 0"));
            }
            SpriteSheet::new(enemy.sheet.cols, enemy.sheet.rows)?;
            if let Some(frames) = &enemy.clip {
                AnimationClip::new(&owner, frames.clone(), enemy.sheet)?;
            }
        }

        let font = &self.font;
        self.check_texture("font", &font.texture)?;
        SpriteSheet::new(font.sheet.cols, font.sheet.rows)?;
        if font.glyph_size <= 0.0 {
            return invalid("font glyph_size must be > 0");
        }
        for banner in Banner::ALL {
            AnimationClip::new(banner.text(), banner.glyphs().to_vec(), font.sheet)?;
        }

        Ok(())
    }

    fn check_texture(&self, owner: &str, key: &str) -> Result<(), LevelError> {
        if self.textures.contains_key(key) {
            Ok(())
        } else {
            Err(LevelError::UnknownTexture {
                owner: owner.to_string(),
                key: key.to_string(),
            })
        }
    }

    /// Build the world with texture keys resolved through `textures`.
    pub fn build(&self, textures: &TextureSet) -> Result<LoadedLevel, LevelError> {
        let texture = |owner: &str, key: &str| -> Result<TextureHandle, LevelError> {
            textures.get(key).ok_or_else(|| LevelError::UnknownTexture {
                owner: owner.to_string(),
                key: key.to_string(),
            })
        };

        let p = &self.player;
        let player_clip = |name: &str| -> Result<Option<AnimationClip>, LevelError> {
            p.clips
                .get(name)
                .map(|frames| AnimationClip::new(name, frames.clone(), p.sheet))
                .transpose()
                .map_err(LevelError::from)
        };
        let initial = player_clip(&p.initial_clip)?.ok_or_else(|| LevelError::UnknownClip {
            owner: "player".to_string(),
            clip: p.initial_clip.clone(),
        })?;
        let player = Entity {
            width: p.width,
            height: p.height,
            speed: p.speed,
            jump_power: p.jump_power,
            acceleration: Vec2::new(0.0, p.gravity),
            ..Entity::new(
                EntityKind::Player,
                Vec3::new(p.x, p.y, p.z),
                texture("player", &p.texture)?,
                p.sheet,
                initial,
            )
        };
        let clips = PlayerClips {
            run_left: player_clip("run_left")?,
            run_right: player_clip("run_right")?,
        };

        let mut platforms = Vec::new();
        for (i, run) in self.platforms.iter().enumerate() {
            let handle = texture(&format!("platforms[{i}]"), &run.texture)?;
            for step in 0..run.count {
                platforms.push(Entity {
                    width: run.width,
                    height: run.height,
                    ..Entity::new(
                        EntityKind::Platform,
                        Vec3::new(run.x + step as f32, run.y, 0.0),
                        handle,
                        SpriteSheet::SINGLE,
                        AnimationClip::still(0),
                    )
                });
            }
        }

        let mut enemies = Vec::with_capacity(self.enemies.len());
        for (i, e) in self.enemies.iter().enumerate() {
            let owner = format!("enemies[{i}]");
            let clip = match &e.clip {
                Some(frames) => AnimationClip::new(&owner, frames.clone(), e.sheet)?,
                None => AnimationClip::still(0),
            };
            let ai = EnemyAi {
                variant: e.ai,
                phase: e.phase.unwrap_or_else(|| e.ai.initial_phase()),
            };
            enemies.push(Entity {
                width: e.width,
                height: e.height,
                speed: e.speed,
                movement: Vec2::new(e.movement_x, e.movement_y),
                acceleration: Vec2::new(0.0, e.gravity),
                jump_power: e.jump_power,
                ..Entity::new(
                    EntityKind::Enemy(ai),
                    Vec3::new(e.x, e.y, 0.0),
                    texture(&owner, &e.texture)?,
                    e.sheet,
                    clip,
                )
            });
        }

        let font = FontLayout {
            texture: texture("font", &self.font.texture)?,
            sheet: self.font.sheet,
            glyph_size: self.font.glyph_size,
            start_x: self.font.start_x,
            spacing: self.font.spacing,
            baseline_y: self.font.y,
        };

        let rules = Rules {
            frame_duration_us: self.rules.frame_duration_us,
            walker_bounce: self.rules.walker_bounce,
            stomp_defeats_enemy: self.rules.stomp_defeats_enemy,
        };

        log::info!(
            "Level '{}': {} platforms, {} enemies",
            self.level_id,
            platforms.len(),
            enemies.len()
        );

        Ok(LoadedLevel {
            level_id: self.level_id.clone(),
            fixed_dt_us: self.rules.fixed_dt_us,
            camera: self.camera,
            world: World::new(rules, player, clips, platforms, enemies, &font),
        })
    }
}

fn invalid(message: &str) -> Result<(), LevelError> {
    Err(LevelError::Invalid(message.to_string()))
}

fn check_size(owner: &str, width: f32, height: f32) -> Result<(), LevelError> {
    if width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        invalid(&format!("{owner} width and height must be > 0"))
    }
}

const fn default_fixed_dt_us() -> u64 {
    DEFAULT_FIXED_DT_US
}

const fn default_frame_duration_us() -> u64 {
    250_000
}

const fn default_half_width() -> f32 {
    5.0
}

const fn default_half_height() -> f32 {
    3.75
}

const fn default_size() -> f32 {
    1.0
}

const fn default_count() -> u32 {
    1
}

const fn default_glyph_size() -> f32 {
    0.3
}

const fn default_font_start_x() -> f32 {
    -2.0
}

const fn default_font_spacing() -> f32 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::FakeLoader;
    use crate::world::GameStatus;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SHIPPED: &str = include_str!("../../../assets/levels/level1.json");

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ledge_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn textures_for(level: &LevelFile) -> TextureSet {
        TextureSet::load(&level.textures, &mut FakeLoader::default()).unwrap()
    }

    fn shipped() -> LevelFile {
        LevelFile::from_json(SHIPPED, "level1.json").expect("shipped level should validate")
    }

    fn edited(edit: impl FnOnce(&mut serde_json::Value)) -> Result<LevelFile, LevelError> {
        let mut value: serde_json::Value = serde_json::from_str(SHIPPED).unwrap();
        edit(&mut value);
        LevelFile::from_json(&value.to_string(), "edited.json")
    }

    #[test]
    fn shipped_level_builds_the_session_layout() {
        let level = shipped();
        let loaded = level.build(&textures_for(&level)).unwrap();
        let world = &loaded.world;

        assert_eq!(loaded.fixed_dt_us, 16_667);
        assert_eq!(loaded.camera, CameraConfig::default());
        assert_eq!(world.platforms().len(), 16);
        assert_eq!(world.enemies().len(), 3);
        assert_eq!(world.status(), GameStatus::Playing);

        let player = world.player();
        assert_eq!(player.position, Vec3::new(-4.0, -1.0, 0.0));
        assert_eq!((player.width, player.height), (0.8, 0.8));
        assert_eq!(player.jump_power, 7.0);
        assert_eq!(player.animation.clip().name, "run_right");
        assert_eq!(player.animation.current_cell(), 3);

        let ground: Vec<f32> = world.platforms()[..11].iter().map(|p| p.position.x).collect();
        assert_eq!(ground.first(), Some(&-5.0));
        assert_eq!(ground.last(), Some(&5.0));
        assert!(world.platforms()[11..].iter().all(|p| p.position.y == 0.5));

        let variants: Vec<_> = world
            .enemies()
            .iter()
            .filter_map(|e| e.enemy_ai())
            .map(|ai| (ai.variant, ai.phase))
            .collect();
        assert_eq!(
            variants,
            vec![
                (AiVariant::Walker, AiPhase::Walking),
                (AiVariant::WaitAndGo, AiPhase::Idle),
                (AiVariant::Jumper, AiPhase::Jumping),
            ]
        );
        assert_eq!(world.enemies()[0].movement, Vec2::new(-1.0, 0.0));
        assert_eq!(world.enemies()[2].jump_power, 4.0);
    }

    #[test]
    fn level_file_loads_from_disk() {
        let path = temp_file_path("load");
        fs::write(&path, SHIPPED).expect("write level file");
        let level = load_level_from_path(&path).expect("level should load");
        assert_eq!(level.level_id, "level1");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_level_from_path(Path::new("/nonexistent/ledge/level.json")).unwrap_err();
        assert!(matches!(err, LevelError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/ledge/level.json"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = LevelFile::from_json("{ \"version\": ", "broken.json").unwrap_err();
        assert!(matches!(err, LevelError::Parse { .. }));
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = edited(|v| v["version"] = "9.9".into()).unwrap_err();
        assert!(matches!(err, LevelError::UnsupportedVersion(ref found) if found == "9.9"));
    }

    #[test]
    fn rejects_unknown_texture_key() {
        let err = edited(|v| v["enemies"][1]["texture"] = "ghost".into()).unwrap_err();
        assert!(err.to_string().contains("enemies[1]"));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn rejects_unknown_initial_clip() {
        let err = edited(|v| v["player"]["initial_clip"] = "moonwalk".into()).unwrap_err();
        assert!(matches!(err, LevelError::UnknownClip { .. }));
    }

    #[test]
    fn rejects_clip_cell_outside_sheet() {
        let err = edited(|v| v["player"]["clips"]["run_left"] = serde_json::json!([1, 5, 9, 16]))
            .unwrap_err();
        assert!(matches!(
            err,
            LevelError::Animation(AnimationError::CellOutOfRange { cell: 16, .. })
        ));
    }

    #[test]
    fn rejects_font_sheet_too_small_for_glyphs() {
        let err = edited(|v| v["font"]["sheet"] = serde_json::json!({ "cols": 8, "rows": 8 }))
            .unwrap_err();
        assert!(matches!(err, LevelError::Animation(_)));
    }

    #[test]
    fn rejects_non_positive_sizes_and_rates() {
        assert!(edited(|v| v["platforms"][0]["width"] = 0.0.into()).is_err());
        assert!(edited(|v| v["rules"]["frame_duration_us"] = 0.into()).is_err());
        assert!(edited(|v| v["enemies"] = serde_json::json!([])).is_err());
    }

    #[test]
    fn optional_sections_take_defaults() {
        let level = edited(|v| {
            let obj = v.as_object_mut().unwrap();
            obj.remove("rules");
            obj.remove("camera");
        })
        .unwrap();
        assert_eq!(level.rules.fixed_dt_us, 16_667);
        assert_eq!(level.rules.frame_duration_us, 250_000);
        assert!(!level.rules.walker_bounce);
        assert_eq!(level.camera.half_width, 5.0);
    }

    #[test]
    fn explicit_phase_overrides_variant_default() {
        let level = edited(|v| v["enemies"][1]["phase"] = "walking".into()).unwrap();
        let loaded = level.build(&textures_for(&level)).unwrap();
        let ai = loaded.world.enemies()[1].enemy_ai().unwrap();
        assert_eq!(ai.phase, AiPhase::Walking);
    }

    #[test]
    fn build_fails_when_texture_was_not_loaded() {
        let level = shipped();
        let err = level.build(&TextureSet::default()).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTexture { .. }));
    }
}
