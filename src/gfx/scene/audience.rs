//! The jumping audience
//!
//! Each member owns its own random stream, seeded once when the grid is
//! built, so a given seed always produces the same crowd and the same
//! jumps.

use cgmath::{Deg, Matrix4, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const AUDIENCE_GRID_SIDE: usize = 8;
pub const AUDIENCE_SPACING: f32 = 2.5;
pub const JUMP_HEIGHT_MIN: f32 = 0.7;
pub const JUMP_HEIGHT_MAX: f32 = 2.3;
pub const JUMP_SPEED_MAX: f32 = 0.4;
/// Longest rest at the top of a jump before the member is kicked upward again
pub const APEX_DELAY_MAX: f32 = 1.0;
/// Largest random yaw given to a member, in whole degrees (exclusive)
const MAX_YAW_DEGREES: u32 = 45;

const GRID_ORIGIN: Vector3<f32> = Vector3::new(-8.5, 0.0, -10.0);

#[derive(Debug, Clone)]
pub struct AudienceMember {
    base: Matrix4<f32>,
    floor: f32,
    height: f32,
    ceiling: f32,
    moving_up: bool,
    delay: f32,
    rng: StdRng,
}

impl AudienceMember {
    pub fn new(base: Matrix4<f32>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let floor = base.w.y;
        let delay = rng.random_range(0.0..APEX_DELAY_MAX);
        Self {
            base,
            floor,
            height: floor,
            ceiling: floor,
            moving_up: false,
            delay,
            rng,
        }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Current vertical position
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    pub fn is_moving_up(&self) -> bool {
        self.moving_up
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn transform(&self) -> Matrix4<f32> {
        self.base * Matrix4::from_translation(Vector3::new(0.0, self.height - self.floor, 0.0))
    }

    pub fn advance(&mut self, enabled: bool, delta_secs: f32) {
        if !enabled {
            self.height = self.floor;
            self.moving_up = false;
            return;
        }

        let speed = self.rng.random_range(0.0..JUMP_SPEED_MAX);

        if self.moving_up {
            if self.height >= self.ceiling {
                self.moving_up = false;
                self.delay = self.rng.random_range(0.0..APEX_DELAY_MAX);
            } else {
                self.height = (self.height + speed).min(self.ceiling);
            }
        } else if self.height - speed <= self.floor {
            self.height = self.floor;
        } else {
            self.height -= speed;
        }

        self.delay -= delta_secs;
        if self.delay <= 0.0 && !self.moving_up {
            self.start_jump();
        }
    }

    fn start_jump(&mut self) {
        self.moving_up = true;
        self.ceiling = self.floor + self.rng.random_range(JUMP_HEIGHT_MIN..JUMP_HEIGHT_MAX);
    }
}

#[derive(Debug, Clone)]
pub struct Audience {
    members: Vec<AudienceMember>,
}

impl Audience {
    /// Builds a `side` x `side` grid of members behind the gates, each with
    /// a random yaw.
    pub fn grid(side: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let origin = Matrix4::from_translation(GRID_ORIGIN);

        let mut members = Vec::with_capacity(side * side);
        for i in 0..side {
            for j in 0..side {
                let offset = Vector3::new(i as f32 * AUDIENCE_SPACING, 0.0, j as f32 * AUDIENCE_SPACING);
                let yaw = Deg(rng.random_range(0..MAX_YAW_DEGREES) as f32);
                let base = origin * Matrix4::from_translation(offset) * Matrix4::from_angle_y(yaw);
                members.push(AudienceMember::new(base, rng.random::<u64>()));
            }
        }

        log::debug!("Placed {} audience members (seed {:#x})", members.len(), seed);
        Self { members }
    }

    pub fn members(&self) -> &[AudienceMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn advance(&mut self, enabled: bool, delta_secs: f32) {
        for member in &mut self.members {
            member.advance(enabled, delta_secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn test_grid_layout() {
        let audience = Audience::grid(AUDIENCE_GRID_SIDE, 42);
        assert_eq!(audience.len(), 64);

        let first = audience.members()[0].transform();
        assert_eq!(first.w.x, -8.5);
        assert_eq!(first.w.z, -10.0);

        let last = audience.members()[63].transform();
        assert!((last.w.x - (-8.5 + 7.0 * 2.5)).abs() < 1e-5);
        assert!((last.w.z - (-10.0 + 7.0 * 2.5)).abs() < 1e-5);
    }

    #[test]
    fn test_same_seed_same_crowd() {
        let mut a = Audience::grid(3, 9);
        let mut b = Audience::grid(3, 9);
        for _ in 0..500 {
            a.advance(true, FRAME);
            b.advance(true, FRAME);
        }
        for (x, y) in a.members().iter().zip(b.members()) {
            assert_eq!(x.transform(), y.transform());
        }
    }

    #[test]
    fn test_height_stays_bounded() {
        let mut audience = Audience::grid(AUDIENCE_GRID_SIDE, 1234);
        for frame in 0..20_000 {
            // Uneven frame times, with the occasional long hitch
            let delta = if frame % 97 == 0 { 0.5 } else { FRAME };
            audience.advance(true, delta);
            for member in audience.members() {
                assert!(member.height() >= member.floor());
                assert!(member.height() <= member.floor() + JUMP_HEIGHT_MAX);
            }
        }
    }

    #[test]
    fn test_members_keep_jumping() {
        let mut audience = Audience::grid(AUDIENCE_GRID_SIDE, 77);
        let mut peaks = vec![0.0f32; audience.len()];
        let mut landings = vec![0u32; audience.len()];

        for _ in 0..6_000 {
            let before: Vec<f32> = audience.members().iter().map(|m| m.height()).collect();
            audience.advance(true, FRAME);
            for (idx, member) in audience.members().iter().enumerate() {
                peaks[idx] = peaks[idx].max(member.height() - member.floor());
                if before[idx] > member.floor() && member.height() == member.floor() {
                    landings[idx] += 1;
                }
            }
        }

        for idx in 0..audience.len() {
            assert!(peaks[idx] >= JUMP_HEIGHT_MIN * 0.5, "member {idx} never left the floor");
            assert!(landings[idx] >= 2, "member {idx} stopped jumping");
        }
    }

    #[test]
    fn test_expired_delay_starts_jump_same_frame() {
        let mut member = AudienceMember::new(Matrix4::from_translation(Vector3::new(1.0, 0.0, 1.0)), 5);
        member.delay = 0.01;
        member.moving_up = false;

        member.advance(true, 0.02);

        assert!(member.is_moving_up());
        assert!(member.ceiling() >= member.floor() + JUMP_HEIGHT_MIN);
        assert!(member.ceiling() < member.floor() + JUMP_HEIGHT_MAX);
    }

    #[test]
    fn test_disabled_settles_on_floor() {
        let mut member = AudienceMember::new(Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0)), 3);
        member.delay = 0.0;
        for _ in 0..3 {
            member.advance(true, FRAME);
        }
        assert!(member.height() > member.floor());

        member.advance(false, FRAME);
        assert_eq!(member.height(), member.floor());
        assert!(!member.is_moving_up());
        assert_eq!(member.transform(), member.base);
    }
}
