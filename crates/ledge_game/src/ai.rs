//! Enemy behaviour. Each variant maps the enemy's current movement and last
//! tick's contacts to an intent; the world applies the intent before
//! integration. AI never touches position.

use crate::collision::ContactState;
use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiVariant {
    Walker,
    WaitAndGo,
    Jumper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiPhase {
    Idle,
    Walking,
    Jumping,
}

impl AiVariant {
    pub fn initial_phase(self) -> AiPhase {
        match self {
            AiVariant::Walker => AiPhase::Walking,
            AiVariant::WaitAndGo => AiPhase::Idle,
            AiVariant::Jumper => AiPhase::Jumping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyAi {
    pub variant: AiVariant,
    pub phase: AiPhase,
}

impl EnemyAi {
    #[allow(dead_code)]
    pub fn new(variant: AiVariant) -> Self {
        Self {
            variant,
            phase: variant.initial_phase(),
        }
    }
}

/// What the enemy knows at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub movement: Vec2,
    /// Contacts from the previous tick.
    pub contacts: ContactState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub movement: Vec2,
    pub jump: bool,
    pub phase: AiPhase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiRules {
    /// Reverse a walker when it reports a contact on the side it walks toward.
    pub walker_bounce: bool,
}

impl EnemyAi {
    pub fn think(&self, seen: &Perception, rules: &AiRules) -> Intent {
        match self.variant {
            AiVariant::Walker => {
                let mut movement = seen.movement;
                if rules.walker_bounce
                    && ((seen.contacts.left && movement.x < 0.0)
                        || (seen.contacts.right && movement.x > 0.0))
                {
                    movement.x = -movement.x;
                }
                Intent {
                    movement,
                    jump: false,
                    phase: AiPhase::Walking,
                }
            }
            // No trigger leaves Idle yet. A WaitAndGo placed in Walking walks.
            AiVariant::WaitAndGo => match self.phase {
                AiPhase::Idle => Intent {
                    movement: Vec2::ZERO,
                    jump: false,
                    phase: AiPhase::Idle,
                },
                phase => Intent {
                    movement: seen.movement,
                    jump: false,
                    phase,
                },
            },
            AiVariant::Jumper => Intent {
                movement: seen.movement,
                jump: seen.contacts.bottom,
                phase: AiPhase::Jumping,
            },
        }
    }
}
