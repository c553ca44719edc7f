//! The single entity type shared by the player, platforms, enemies and banner
//! glyphs. Entities are never removed: "dead" or "failed" is `active == false`.

use crate::ai::{AiRules, EnemyAi, Perception};
use crate::collision::{Aabb, ContactState, Mover, Resolution, Target};
use crate::physics::{self, Integrated, JumpState, Kinematics};
use glam::{Vec2, Vec3};
use ledge_core::animation::{AnimationClip, AnimationState, SpriteSheet};

/// Opaque id of a loaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Platform,
    Enemy(EnemyAi),
    Glyph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    /// `z` only orders drawing.
    pub position: Vec3,
    pub width: f32,
    pub height: f32,
    pub movement: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub speed: f32,
    pub jump_requested: bool,
    pub jump_power: f32,
    /// Contacts recorded during the current tick.
    pub contacts: ContactState,
    pub active: bool,
    pub texture: TextureHandle,
    pub sheet: SpriteSheet,
    pub animation: AnimationState,
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteView {
    pub center: Vec2,
    pub z: f32,
    pub size: Vec2,
    pub texture: TextureHandle,
    pub sheet: SpriteSheet,
    pub cell: u32,
}

impl Entity {
    /// Unit-sized, motionless, active entity.
    pub fn new(
        kind: EntityKind,
        position: Vec3,
        texture: TextureHandle,
        sheet: SpriteSheet,
        clip: AnimationClip,
    ) -> Self {
        Self {
            kind,
            position,
            width: 1.0,
            height: 1.0,
            movement: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            speed: 0.0,
            jump_requested: false,
            jump_power: 0.0,
            contacts: ContactState::default(),
            active: true,
            texture,
            sheet,
            animation: AnimationState::new(clip),
        }
    }

    #[allow(dead_code)]
    pub fn enemy_ai(&self) -> Option<EnemyAi> {
        match self.kind {
            EntityKind::Enemy(ai) => Some(ai),
            _ => None,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position.truncate(), self.width, self.height)
    }

    pub fn as_mover(&self) -> Mover {
        Mover {
            aabb: self.aabb(),
            velocity: self.velocity,
            active: self.active,
        }
    }

    pub fn as_target(&self) -> Target {
        Target {
            aabb: self.aabb(),
            active: self.active,
        }
    }

    /// Clear this tick's contacts and hand back the previous tick's.
    pub fn begin_tick(&mut self) -> ContactState {
        let previous = self.contacts;
        if self.active {
            self.contacts = ContactState::default();
        }
        previous
    }

    /// Run the enemy's AI against last tick's contacts.
    pub fn think(&mut self, previous: ContactState, rules: &AiRules) {
        if !self.active {
            return;
        }
        let EntityKind::Enemy(ai) = self.kind else {
            return;
        };
        let intent = ai.think(
            &Perception {
                movement: self.movement,
                contacts: previous,
            },
            rules,
        );
        self.movement = intent.movement;
        self.kind = EntityKind::Enemy(EnemyAi {
            phase: intent.phase,
            ..ai
        });
        if intent.jump {
            self.jump_requested = true;
        }
    }

    /// Integrate one step. The jump request is consumed either way.
    pub fn integrate(&mut self, dt: f32, grounded: bool) -> Option<Integrated> {
        if !self.active {
            return None;
        }
        let body = Kinematics {
            position: self.position.truncate(),
            velocity: self.velocity,
            acceleration: self.acceleration,
            movement: self.movement,
            speed: self.speed,
        };
        let jump = JumpState {
            requested: self.jump_requested,
            power: self.jump_power,
            grounded,
        };
        let out = physics::integrate(&body, jump, dt);
        self.position.x = out.position.x;
        self.position.y = out.position.y;
        self.velocity = out.velocity;
        self.jump_requested = false;
        if out.jumped {
            log::trace!(
                "{:?} jumped at ({:.3}, {:.3})",
                self.kind,
                self.position.x,
                self.position.y
            );
        }
        Some(out)
    }

    pub fn apply_resolution(&mut self, resolution: &Resolution) {
        if !self.active {
            return;
        }
        self.position.x = resolution.center.x;
        self.position.y = resolution.center.y;
        self.velocity = resolution.velocity;
        self.contacts = self.contacts.union(resolution.contacts);
    }

    pub fn animate(&mut self, dt_us: u64, frame_duration_us: u64) {
        if self.active {
            self.animation.tick(dt_us, frame_duration_us);
        }
    }

    pub fn sprite(&self) -> SpriteView {
        SpriteView {
            center: self.position.truncate(),
            z: self.position.z,
            size: Vec2::new(self.width, self.height),
            texture: self.texture,
            sheet: self.sheet,
            cell: self.animation.current_cell(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiVariant;

    fn platform() -> Entity {
        Entity::new(
            EntityKind::Platform,
            Vec3::new(0.0, 0.0, 0.0),
            TextureHandle(0),
            SpriteSheet::SINGLE,
            AnimationClip::still(0),
        )
    }

    fn jumper() -> Entity {
        Entity {
            acceleration: Vec2::new(0.0, -9.81),
            jump_power: 4.0,
            movement: Vec2::new(0.0, 1.0),
            speed: 1.0,
            ..Entity::new(
                EntityKind::Enemy(EnemyAi::new(AiVariant::Jumper)),
                Vec3::new(-4.0, 1.5, 0.0),
                TextureHandle(1),
                SpriteSheet::SINGLE,
                AnimationClip::still(0),
            )
        }
    }

    #[test]
    fn inactive_entity_is_frozen() {
        let mut entity = jumper();
        entity.active = false;
        entity.jump_requested = true;
        assert!(entity.integrate(0.016_667, true).is_none());
        assert_eq!(entity.position, Vec3::new(-4.0, 1.5, 0.0));
        assert!(entity.jump_requested);
    }

    #[test]
    fn begin_tick_returns_previous_contacts_and_clears() {
        let mut entity = platform();
        entity.contacts.bottom = true;
        let previous = entity.begin_tick();
        assert!(previous.bottom);
        assert!(!entity.contacts.any());
    }

    #[test]
    fn jumper_requests_jump_after_landing() {
        let mut entity = jumper();
        let grounded = ContactState {
            bottom: true,
            ..Default::default()
        };
        entity.think(grounded, &AiRules::default());
        assert!(entity.jump_requested);

        let out = entity.integrate(0.016_667, grounded.bottom).unwrap();
        assert!(out.jumped);
        assert_eq!(entity.velocity.y, 4.0);
        assert!(!entity.jump_requested);
    }

    #[test]
    fn think_ignores_non_enemies() {
        let mut entity = platform();
        entity.movement = Vec2::new(1.0, 0.0);
        entity.think(ContactState::default(), &AiRules::default());
        assert_eq!(entity.movement, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn sprite_view_reflects_position_and_cell() {
        let entity = platform();
        let view = entity.sprite();
        assert_eq!(view.center, Vec2::ZERO);
        assert_eq!(view.size, Vec2::ONE);
        assert_eq!(view.cell, 0);
    }
}
