//! Scripted stand-in for a human player
//!
//! Each step the autopilot either keeps driving in its current direction or
//! turns to a random one, and sometimes fires.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Direction;

/// One player command produced by the autopilot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Fire,
}

pub struct Autopilot {
    rng: StdRng,
    direction: Direction,
    turn_chance: f64,
    fire_chance: f64,
    steps: u64,
}

impl Autopilot {
    /// Probabilities are clamped to `0.0..=1.0`; NaN counts as zero
    pub fn new(turn_chance: f64, fire_chance: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), turn_chance, fire_chance)
    }

    /// Deterministic autopilot for reproducible runs
    pub fn seeded(seed: u64, turn_chance: f64, fire_chance: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), turn_chance, fire_chance)
    }

    fn with_rng(rng: StdRng, turn_chance: f64, fire_chance: f64) -> Self {
        Self {
            rng,
            direction: Direction::Right,
            turn_chance: probability(turn_chance),
            fire_chance: probability(fire_chance),
            steps: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Commands for the next step: always one move, optionally a fire
    pub fn next_commands(&mut self) -> Vec<Command> {
        self.steps += 1;

        if self.rng.gen_bool(self.turn_chance) {
            self.direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        }

        let mut commands = vec![Command::Move(self.direction)];
        if self.rng.gen_bool(self.fire_chance) {
            commands.push(Command::Fire);
        }
        commands
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(0.2, 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autopilot_creation() {
        let autopilot = Autopilot::default();
        assert_eq!(autopilot.steps(), 0);
        assert_eq!(autopilot.direction(), Direction::Right);
    }

    #[test]
    fn test_never_turning_never_firing() {
        let mut autopilot = Autopilot::seeded(7, 0.0, 0.0);
        for _ in 0..50 {
            assert_eq!(autopilot.next_commands(), vec![Command::Move(Direction::Right)]);
        }
        assert_eq!(autopilot.steps(), 50);
    }

    #[test]
    fn test_always_fires() {
        let mut autopilot = Autopilot::seeded(7, 0.5, 1.0);
        for _ in 0..20 {
            let commands = autopilot.next_commands();
            assert_eq!(commands.len(), 2);
            assert_eq!(commands[1], Command::Fire);
        }
    }

    #[test]
    fn test_same_seed_same_script() {
        let mut a = Autopilot::seeded(42, 0.5, 0.5);
        let mut b = Autopilot::seeded(42, 0.5, 0.5);
        for _ in 0..100 {
            assert_eq!(a.next_commands(), b.next_commands());
        }
    }

    #[test]
    fn test_probabilities_are_clamped() {
        let mut autopilot = Autopilot::seeded(1, 7.0, -3.0);
        let commands = autopilot.next_commands();
        assert_eq!(commands.len(), 1);
    }
}
