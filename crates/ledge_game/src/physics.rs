//! Semi-implicit Euler step for one entity under a fixed dt.
//!
//! Gravity only drives the vertical axis. Horizontal velocity is set directly
//! from movement intent each step, so there is no horizontal momentum.

use glam::Vec2;

/// Motion inputs read from an entity before the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub movement: Vec2,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpState {
    pub requested: bool,
    pub power: f32,
    /// Bottom contact from the previous resolution pass.
    pub grounded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrated {
    pub position: Vec2,
    pub velocity: Vec2,
    pub jumped: bool,
}

/// Advance one step. A jump fires only when requested while grounded and then
/// replaces the vertical velocity outright; an airborne request is dropped.
pub fn integrate(body: &Kinematics, jump: JumpState, dt: f32) -> Integrated {
    let mut velocity = body.velocity;
    velocity.x = body.movement.x * body.speed;
    velocity.y += body.acceleration.y * dt;

    let jumped = jump.requested && jump.grounded;
    if jumped {
        velocity.y = jump.power;
    }

    let position = Vec2::new(
        body.position.x + velocity.x * dt,
        body.position.y + velocity.y * dt,
    );

    Integrated {
        position,
        velocity,
        jumped,
    }
}
