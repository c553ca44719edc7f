//! Owns every entity and sequences one fixed tick:
//!
//!  1. Remember last tick's contacts, clear the current ones.
//!  2. Enemy AI picks movement and jump intent.
//!  3. Player integrates, then resolves against platforms, then against enemies.
//!     A player contact with an enemy on the top, left or right edge fails the
//!     player.
//!  4. Each enemy integrates and resolves against platforms.
//!  5. Active entities advance their animation.
//!  6. Win/lose is evaluated; a terminal state shows its banner and freezes
//!     the world.

use crate::ai::AiRules;
use crate::banner::{Banner, BannerSet, FontLayout};
use crate::collision::{self, Resolution, Target};
use crate::entity::{Entity, SpriteView};
use glam::Vec2;
use ledge_core::animation::AnimationClip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Lost,
    Won,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Playing
    }

    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Playing => "Playing",
            GameStatus::Lost => "Lost",
            GameStatus::Won => "Won",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub frame_duration_us: u64,
    pub walker_bounce: bool,
    /// Landing on an enemy deactivates it.
    pub stomp_defeats_enemy: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            frame_duration_us: 250_000,
            walker_bounce: false,
            stomp_defeats_enemy: false,
        }
    }
}

/// Input sampled once per rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    pub move_x: f32,
    pub jump_pressed: bool,
}

/// Clips the player switches between when moving horizontally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerClips {
    pub run_left: Option<AnimationClip>,
    pub run_right: Option<AnimationClip>,
}

#[derive(Debug)]
pub struct World {
    rules: Rules,
    player: Entity,
    player_clips: PlayerClips,
    platforms: Vec<Entity>,
    enemies: Vec<Entity>,
    game_over: BannerSet,
    you_win: BannerSet,
    status: GameStatus,
    tick_count: u64,
}

impl World {
    pub fn new(
        rules: Rules,
        player: Entity,
        player_clips: PlayerClips,
        platforms: Vec<Entity>,
        enemies: Vec<Entity>,
        font: &FontLayout,
    ) -> Self {
        let mut world = Self {
            rules,
            player,
            player_clips,
            platforms,
            enemies,
            game_over: BannerSet::new(Banner::GameOver, font),
            you_win: BannerSet::new(Banner::YouWin, font),
            status: GameStatus::Playing,
            tick_count: 0,
        };
        world.animate_all(0);
        world
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[allow(dead_code)]
    pub fn player(&self) -> &Entity {
        &self.player
    }

    #[allow(dead_code)]
    pub fn platforms(&self) -> &[Entity] {
        &self.platforms
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn active_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.active).count()
    }

    #[allow(dead_code)]
    pub fn banner(&self, banner: Banner) -> &BannerSet {
        match banner {
            Banner::GameOver => &self.game_over,
            Banner::YouWin => &self.you_win,
        }
    }

    /// Map frame input onto the player's intent. A jump press is latched
    /// until the next integration consumes it.
    pub fn apply_input(&mut self, input: ControllerInput) {
        if self.status.is_terminal() || !self.player.active {
            return;
        }
        let mut movement = Vec2::new(input.move_x, 0.0);
        if movement.length() > 1.0 {
            movement = movement.normalize();
        }
        self.player.movement = movement;

        let clip = if input.move_x < 0.0 {
            self.player_clips.run_left.as_ref()
        } else if input.move_x > 0.0 {
            self.player_clips.run_right.as_ref()
        } else {
            None
        };
        if let Some(clip) = clip {
            self.player.animation.set_clip(clip);
        }

        if input.jump_pressed {
            self.player.jump_requested = true;
        }
    }

    pub fn tick(&mut self, dt_us: u64) -> GameStatus {
        self.tick_count += 1;
        if self.status.is_terminal() {
            return self.status;
        }
        let dt = dt_us as f32 / 1_000_000.0;

        let player_grounded = self.player.begin_tick().bottom;
        let enemy_contacts: Vec<_> = self.enemies.iter_mut().map(Entity::begin_tick).collect();

        let ai_rules = AiRules {
            walker_bounce: self.rules.walker_bounce,
        };
        for (enemy, previous) in self.enemies.iter_mut().zip(&enemy_contacts) {
            enemy.think(*previous, &ai_rules);
        }

        let platform_targets: Vec<Target> = self.platforms.iter().map(Entity::as_target).collect();

        self.player.integrate(dt, player_grounded);
        let landed = collision::resolve(self.player.as_mover(), &platform_targets);
        self.player.apply_resolution(&landed);

        let enemy_targets: Vec<Target> = self.enemies.iter().map(Entity::as_target).collect();
        let hit = collision::resolve(self.player.as_mover(), &enemy_targets);
        self.player.apply_resolution(&hit);
        self.judge_enemy_contact(&hit);

        for (enemy, previous) in self.enemies.iter_mut().zip(&enemy_contacts) {
            if enemy.integrate(dt, previous.bottom).is_none() {
                continue;
            }
            let resolution = collision::resolve(enemy.as_mover(), &platform_targets);
            enemy.apply_resolution(&resolution);
        }

        self.animate_all(dt_us);
        self.evaluate()
    }

    /// Active entities in draw order, stable-sorted by z.
    pub fn sprites(&self) -> Vec<SpriteView> {
        let mut sprites: Vec<SpriteView> = self
            .platforms
            .iter()
            .chain(&self.enemies)
            .chain(self.game_over.glyphs())
            .chain(self.you_win.glyphs())
            .chain(std::iter::once(&self.player))
            .filter(|e| e.active)
            .map(Entity::sprite)
            .collect();
        sprites.sort_by(|a, b| a.z.total_cmp(&b.z));
        sprites
    }

    fn judge_enemy_contact(&mut self, hit: &Resolution) {
        if hit.contacts.any_except_bottom() {
            let enemy = hit.x_target.or(hit.y_target);
            log::debug!(
                "Player touched enemy {:?} with contacts {:?}",
                enemy,
                hit.contacts
            );
            self.player.active = false;
            return;
        }
        if self.rules.stomp_defeats_enemy && hit.contacts.bottom {
            if let Some(index) = hit.y_target {
                self.enemies[index].active = false;
                log::info!("Enemy {index} stomped");
            }
        }
    }

    fn animate_all(&mut self, dt_us: u64) {
        let frame_duration = self.rules.frame_duration_us;
        self.player.animate(dt_us, frame_duration);
        for entity in self.platforms.iter_mut().chain(self.enemies.iter_mut()) {
            entity.animate(dt_us, frame_duration);
        }
    }

    fn evaluate(&mut self) -> GameStatus {
        if !self.player.active {
            self.status = GameStatus::Lost;
            self.game_over.show();
            log::info!("{} after {} ticks", Banner::GameOver, self.tick_count);
        } else if self.enemies.iter().all(|e| !e.active) {
            self.status = GameStatus::Won;
            self.you_win.show();
            log::info!("{} after {} ticks", Banner::YouWin, self.tick_count);
        }
        self.status
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Entity {
        &mut self.player
    }

    #[cfg(test)]
    pub(crate) fn enemies_mut(&mut self) -> &mut [Entity] {
        &mut self.enemies
    }
}
