//! Per-object animation state machines
//!
//! Everything here advances once per frame through [`AnimationState::advance`]
//! and is then read, unchanged, by both the depth pass and the main pass.

use cgmath::{Deg, Matrix4, Vector3};

use super::audience::Audience;

/// Angle step applied to the gates every animated frame, in degrees
pub const GATE_STEP: f32 = 0.5;
/// Rotation applied to the disco ball every animated frame, in degrees
pub const DISCO_BALL_STEP: f32 = 0.5;
/// Angle of a closed gate
pub const GATE_CLOSED: f32 = 90.0;
/// Angle of a fully open gate
pub const GATE_OPEN: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateSide {
    Left,
    Right,
}

/// A swinging gate: an angle in `[0, 90]` and the direction it is heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub side: GateSide,
    angle: f32,
    opening: bool,
}

impl Gate {
    pub fn new(side: GateSide) -> Self {
        Self {
            side,
            angle: GATE_CLOSED,
            opening: false,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_opening(&self) -> bool {
        self.opening
    }

    pub fn reset(&mut self) {
        self.angle = GATE_CLOSED;
        self.opening = false;
    }

    /// Flips the direction flag when the gate sits on either end stop.
    fn update_direction(&mut self) {
        if self.angle == GATE_CLOSED {
            self.opening = false;
        } else if self.angle == GATE_OPEN {
            self.opening = true;
        }
    }

    /// Moves the gate one step, increasing while `opening`.
    fn step(&mut self, opening: bool) {
        let delta = if opening { GATE_STEP } else { -GATE_STEP };
        self.angle = (self.angle + delta).clamp(GATE_OPEN, GATE_CLOSED);
    }

    pub fn transform(&self) -> Matrix4<f32> {
        match self.side {
            GateSide::Left => {
                Matrix4::from_translation(Vector3::new(4.4, 0.3, -16.0))
                    * Matrix4::from_angle_y(Deg(-self.angle))
            }
            GateSide::Right => {
                Matrix4::from_translation(Vector3::new(-3.8, 0.3, -16.4))
                    * Matrix4::from_angle_y(Deg(self.angle))
            }
        }
    }
}

/// The pair of stage gates
///
/// With `right_gate_follows_left` set (the authored behaviour) the right
/// gate updates its own flag but steps in the direction of the left gate's
/// flag. Both gates start and reset together, so the two only disagree if
/// their angles are ever driven apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gates {
    pub left: Gate,
    pub right: Gate,
    pub right_gate_follows_left: bool,
}

impl Gates {
    pub fn new(right_gate_follows_left: bool) -> Self {
        Self {
            left: Gate::new(GateSide::Left),
            right: Gate::new(GateSide::Right),
            right_gate_follows_left,
        }
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    pub fn advance(&mut self) {
        self.left.update_direction();
        self.left.step(self.left.opening);

        self.right.update_direction();
        let right_direction = if self.right_gate_follows_left {
            self.left.opening
        } else {
            self.right.opening
        };
        self.right.step(right_direction);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiscoBall {
    angle: f32,
}

impl DiscoBall {
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn advance(&mut self) {
        self.angle = (self.angle + DISCO_BALL_STEP).rem_euclid(360.0);
    }

    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(0.0, 9.5, 14.6)) * Matrix4::from_angle_y(Deg(self.angle))
    }
}

/// All animated scene state
pub struct AnimationState {
    pub gates: Gates,
    pub disco_ball: DiscoBall,
    pub audience: Audience,
    frames_advanced: u64,
}

impl AnimationState {
    pub fn new(audience: Audience, right_gate_follows_left: bool) -> Self {
        Self {
            gates: Gates::new(right_gate_follows_left),
            disco_ball: DiscoBall::default(),
            audience,
            frames_advanced: 0,
        }
    }

    /// Advances every animated object by one frame.
    ///
    /// Disabled animations put the gates back to closed and let the audience
    /// settle; the disco ball keeps its last angle.
    pub fn advance(&mut self, enabled: bool, delta_secs: f32) {
        if enabled {
            self.gates.advance();
            self.disco_ball.advance();
        } else {
            self.gates.reset();
        }
        self.audience.advance(enabled, delta_secs);
        self.frames_advanced += 1;
    }

    /// Number of times [`advance`](Self::advance) has run
    pub fn frames_advanced(&self) -> u64 {
        self.frames_advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animations() -> AnimationState {
        AnimationState::new(Audience::grid(2, 1), true)
    }

    #[test]
    fn test_gate_cycles_between_closed_and_open() {
        let mut gates = Gates::new(true);
        let mut previous = gates.left.angle();

        // 180 steps down to 0, then 180 steps back up to 90
        for _ in 0..180 {
            gates.advance();
            assert!(gates.left.angle() < previous);
            previous = gates.left.angle();
        }
        assert_eq!(gates.left.angle(), GATE_OPEN);

        for _ in 0..180 {
            gates.advance();
            assert!(gates.left.angle() > previous);
            previous = gates.left.angle();
        }
        assert_eq!(gates.left.angle(), GATE_CLOSED);

        gates.advance();
        assert!(gates.left.angle() < GATE_CLOSED);
    }

    #[test]
    fn test_gate_angle_stays_in_range() {
        for follows in [true, false] {
            let mut gates = Gates::new(follows);
            for _ in 0..2_000 {
                gates.advance();
                for gate in [gates.left, gates.right] {
                    assert!((GATE_OPEN..=GATE_CLOSED).contains(&gate.angle()));
                }
            }
        }
    }

    #[test]
    fn test_right_gate_follows_left_flag() {
        let mut gates = Gates::new(true);
        // Drive the gates apart: left is half way, right is closed.
        for _ in 0..90 {
            gates.left.update_direction();
            gates.left.step(false);
        }
        gates.left.opening = true;

        gates.advance();
        // The right gate reads "closed" and clears its own flag, yet moves
        // the way the left gate is going and hits its end stop.
        assert!(!gates.right.is_opening());
        assert_eq!(gates.right.angle(), GATE_CLOSED);

        let mut independent = gates;
        independent.right_gate_follows_left = false;
        independent.advance();
        assert!(independent.right.angle() < GATE_CLOSED);
    }

    #[test]
    fn test_disabled_forces_gates_closed() {
        let mut state = animations();
        for _ in 0..37 {
            state.advance(true, 0.016);
        }
        assert!(state.gates.left.angle() < GATE_CLOSED);

        state.advance(false, 0.016);
        assert_eq!(state.gates.left.angle(), GATE_CLOSED);
        assert_eq!(state.gates.right.angle(), GATE_CLOSED);
        assert!(!state.gates.left.is_opening());
        assert!(!state.gates.right.is_opening());
    }

    #[test]
    fn test_disco_ball_freezes_when_disabled() {
        let mut state = animations();
        for _ in 0..10 {
            state.advance(true, 0.016);
        }
        let frozen = state.disco_ball.angle();
        assert_eq!(frozen, 5.0);

        for _ in 0..100 {
            state.advance(false, 0.016);
            assert_eq!(state.disco_ball.angle(), frozen);
        }
    }

    #[test]
    fn test_disco_ball_wraps() {
        let mut ball = DiscoBall::default();
        for _ in 0..721 {
            ball.advance();
            assert!((0.0..360.0).contains(&ball.angle()));
        }
        assert_eq!(ball.angle(), 0.5);
    }

    #[test]
    fn test_advance_counts_frames() {
        let mut state = animations();
        state.advance(true, 0.016);
        state.advance(false, 0.016);
        assert_eq!(state.frames_advanced(), 2);
    }
}
