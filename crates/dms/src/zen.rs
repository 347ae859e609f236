//! Zen mode breathing exercises

use serde::Serialize;

/// Breathing pattern with per-phase lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreathingExercise {
    pub name: &'static str,
    pub inhale: u32,
    pub hold: u32,
    pub exhale: u32,
}

pub const BREATHING_EXERCISES: [BreathingExercise; 3] = [
    BreathingExercise { name: "4-7-8 Breathing", inhale: 4, hold: 7, exhale: 8 },
    BreathingExercise { name: "Box Breathing", inhale: 4, hold: 4, exhale: 4 },
    BreathingExercise { name: "Deep Breathing", inhale: 5, hold: 2, exhale: 5 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathingPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathingPhase {
    fn next(self) -> Self {
        match self {
            BreathingPhase::Inhale => BreathingPhase::Hold,
            BreathingPhase::Hold => BreathingPhase::Exhale,
            BreathingPhase::Exhale => BreathingPhase::Inhale,
        }
    }
}

impl BreathingExercise {
    /// Length of a phase in seconds
    pub fn phase_secs(&self, phase: BreathingPhase) -> u32 {
        match phase {
            BreathingPhase::Inhale => self.inhale,
            BreathingPhase::Hold => self.hold,
            BreathingPhase::Exhale => self.exhale,
        }
    }
}

/// Phase stepper driven by a one-second timer
#[derive(Debug, Clone)]
pub struct BreathingCycle {
    exercise: usize,
    phase: BreathingPhase,
    elapsed_secs: u32,
}

impl Default for BreathingCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl BreathingCycle {
    pub fn new() -> Self {
        Self {
            exercise: 0,
            phase: BreathingPhase::Inhale,
            elapsed_secs: 0,
        }
    }

    pub fn exercise(&self) -> &BreathingExercise {
        &BREATHING_EXERCISES[self.exercise]
    }

    pub fn phase(&self) -> BreathingPhase {
        self.phase
    }

    /// Seconds left in the current phase
    pub fn remaining_secs(&self) -> u32 {
        self.exercise()
            .phase_secs(self.phase)
            .saturating_sub(self.elapsed_secs)
    }

    /// Advance one second; returns the new phase when it changes
    pub fn tick(&mut self) -> Option<BreathingPhase> {
        self.elapsed_secs += 1;
        if self.elapsed_secs >= self.exercise().phase_secs(self.phase) {
            self.phase = self.phase.next();
            self.elapsed_secs = 0;
            Some(self.phase)
        } else {
            None
        }
    }

    /// Switch to the next exercise and restart at inhale
    pub fn next_exercise(&mut self) -> &BreathingExercise {
        self.exercise = (self.exercise + 1) % BREATHING_EXERCISES.len();
        self.phase = BreathingPhase::Inhale;
        self.elapsed_secs = 0;
        self.exercise()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_breathing_cycle() {
        let mut cycle = BreathingCycle::new();
        assert_eq!(cycle.next_exercise().name, "Box Breathing");

        let changes: Vec<_> = (0..12).filter_map(|_| cycle.tick()).collect();
        assert_eq!(
            changes,
            vec![BreathingPhase::Hold, BreathingPhase::Exhale, BreathingPhase::Inhale]
        );
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let mut cycle = BreathingCycle::new();
        assert_eq!(cycle.remaining_secs(), 4);
        cycle.tick();
        assert_eq!(cycle.remaining_secs(), 3);
    }

    #[test]
    fn test_exercises_wrap_around() {
        let mut cycle = BreathingCycle::new();
        for _ in 0..BREATHING_EXERCISES.len() {
            cycle.next_exercise();
        }
        assert_eq!(cycle.exercise().name, "4-7-8 Breathing");
    }
}
