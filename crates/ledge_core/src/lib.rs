//! Engine-level building blocks shared by the game binary: the fixed-timestep
//! scheduler and its clock source, keyboard state, and sprite-sheet animation.

pub mod animation;
pub mod input;
pub mod time;
