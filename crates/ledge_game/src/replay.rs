use crate::world::{ControllerInput, GameStatus, World};
use ledge_core::time::{ManualClock, TimeState};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Recorded rendered frames: the input sampled that frame and the wall time
/// that elapsed before it.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default = "default_elapsed_ms")]
    pub elapsed_ms: u64,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub ticks: u64,
    pub elapsed_us: u64,
    pub leftover_us: u64,
    pub status: GameStatus,
}

impl ReplaySequence {
    pub fn expanded(&self) -> Vec<(ControllerInput, u64)> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push((
                    ControllerInput {
                        move_x: frame.move_x.clamp(-1.0, 1.0),
                        jump_pressed: frame.jump_pressed,
                    },
                    frame.elapsed_ms,
                ));
            }
        }
        out
    }

    /// Drive `world` through the scheduler the way the main loop does: one
    /// input sample per frame, then as many fixed ticks as the elapsed time
    /// allows.
    pub fn run(&self, world: &mut World, fixed_dt_us: u64) -> ReplayOutcome {
        let clock = ManualClock::new();
        let mut time = TimeState::new(fixed_dt_us);
        let mut elapsed_us = 0;
        for (input, elapsed_ms) in self.expanded() {
            clock.advance_ms(elapsed_ms);
            elapsed_us += elapsed_ms * 1000;
            world.apply_input(input);
            time.run_frame(&clock, |dt_us| {
                world.tick(dt_us);
            });
        }
        ReplayOutcome {
            ticks: time.fixed_step_count,
            elapsed_us,
            leftover_us: time.accumulator_us(),
            status: world.status(),
        }
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(replay)
}

const fn default_elapsed_ms() -> u64 {
    16
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::session;
    use crate::world::Rules;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ledge_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_replay(name_hint: &str, json: &str) -> ReplaySequence {
        let path = temp_file_path(name_hint);
        fs::write(&path, json).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let replay = write_replay(
            "parse",
            r#"{
              "frames": [
                { "move_x": 3.0, "repeat": 3 },
                { "jump_pressed": true, "elapsed_ms": 40 }
              ]
            }"#,
        );
        let expanded = replay.expanded();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].0.move_x, 1.0);
        assert_eq!(expanded[0].1, 16);
        assert!(expanded[3].0.jump_pressed);
        assert_eq!(expanded[3].1, 40);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        assert!(load_replay_from_path(&path).is_err());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        // Uneven frame times exercise the accumulator carrying remainders.
        let replay = write_replay(
            "deterministic",
            r#"{
              "frames": [
                { "repeat": 40 },
                { "move_x": 1.0, "elapsed_ms": 7, "repeat": 30 },
                { "move_x": 1.0, "jump_pressed": true, "elapsed_ms": 33 },
                { "move_x": 1.0, "elapsed_ms": 25, "repeat": 50 },
                { "move_x": -1.0, "elapsed_ms": 11, "repeat": 45 }
              ]
            }"#,
        );

        let mut run_a = session(Rules::default());
        let mut run_b = session(Rules::default());
        let outcome_a = replay.run(&mut run_a, 16_667);
        let outcome_b = replay.run(&mut run_b, 16_667);

        assert_eq!(outcome_a, outcome_b);
        assert_eq!(run_a.player(), run_b.player());
        assert_eq!(run_a.enemies(), run_b.enemies());
        assert_eq!(run_a.tick_count(), outcome_a.ticks);
    }

    #[test]
    fn replay_ticks_conserve_elapsed_time() {
        let replay = write_replay(
            "conserve",
            r#"{ "frames": [ { "elapsed_ms": 5, "repeat": 7 }, { "elapsed_ms": 50, "repeat": 3 } ] }"#,
        );
        let mut world = session(Rules::default());
        let outcome = replay.run(&mut world, 16_667);

        assert_eq!(outcome.elapsed_us, 185_000);
        assert_eq!(outcome.ticks, 11);
        assert_eq!(outcome.ticks * 16_667 + outcome.leftover_us, outcome.elapsed_us);
        assert!(outcome.leftover_us < 16_667);
    }
}
