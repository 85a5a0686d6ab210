//! Ephemeral effects
//!
//! Explosions, shockwaves and beams are cosmetic: they animate and expire but
//! never touch gameplay state. Gravity wells are the exception; they pull
//! balls for their whole lifetime.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::GRAVITY_CORE_RADIUS;

/// Expanding blast ring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub max_radius: f32,
    pub radius: f32,
    pub alpha: f32,
    pub finished: bool,
}

impl Explosion {
    const EXPAND_SPEED: f32 = 15.0;
    const FADE_SPEED: f32 = 0.05;

    pub fn new(pos: Vec2, max_radius: f32) -> Self {
        Self {
            pos,
            max_radius,
            radius: 0.0,
            alpha: 1.0,
            finished: false,
        }
    }

    /// Grow to full size, then fade out
    pub fn update(&mut self) {
        if self.radius < self.max_radius {
            self.radius += Self::EXPAND_SPEED;
        } else {
            self.alpha -= Self::FADE_SPEED;
            if self.alpha <= 0.0 {
                self.finished = true;
            }
        }
    }
}

/// Ring left behind by a penetrating ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shockwave {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
    pub finished: bool,
}

impl Shockwave {
    const MAX_RADIUS: f32 = 60.0;
    const EXPAND_SPEED: f32 = 8.0;

    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: 0.0,
            alpha: 1.0,
            finished: false,
        }
    }

    pub fn update(&mut self) {
        self.radius += Self::EXPAND_SPEED;
        self.alpha = 1.0 - self.radius / Self::MAX_RADIUS;
        if self.radius >= Self::MAX_RADIUS {
            self.finished = true;
        }
    }
}

/// Vertical beam column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    /// Horizontal center
    pub x: f32,
    /// Top of the beam
    pub y: f32,
    pub height: f32,
    /// Nominal width (the gameplay band)
    pub base_width: f32,
    /// Pulsing draw width
    pub width: f32,
    pub alpha: f32,
    pub timer: u32,
    pub finished: bool,
}

impl Beam {
    const DURATION: u32 = 30;

    pub fn new(x: f32, y: f32, height: f32, base_width: f32) -> Self {
        Self {
            x,
            y,
            height,
            base_width,
            width: base_width,
            alpha: 1.0,
            timer: 0,
            finished: false,
        }
    }

    pub fn update(&mut self) {
        self.timer += 1;
        let t = self.timer as f32;
        let duration = Self::DURATION as f32;

        self.width = self.base_width * (0.8 + (t * 0.3).sin() * 0.2);
        if t > duration * 0.6 {
            self.alpha = (1.0 - (t - duration * 0.6) / (duration * 0.4)).max(0.0);
        }
        if self.timer >= Self::DURATION {
            self.finished = true;
        }
    }
}

/// Attractor spawned by the gravity skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityWell {
    pub id: u32,
    pub pos: Vec2,
    /// Outer pull radius
    pub radius: f32,
    pub core_radius: f32,
    pub pull_strength: f32,
    pub duration: u32,
    pub timer: u32,
    pub finished: bool,
}

impl GravityWell {
    pub fn new(id: u32, pos: Vec2, radius: f32, pull_strength: f32, duration: u32) -> Self {
        Self {
            id,
            pos,
            radius,
            core_radius: GRAVITY_CORE_RADIUS,
            pull_strength,
            duration,
            timer: 0,
            finished: false,
        }
    }

    pub fn update(&mut self) {
        self.timer += 1;
        if self.timer >= self.duration {
            self.finished = true;
        }
    }

    /// Attraction added to a ball's velocity this tick
    ///
    /// Linear falloff from full strength at the center to zero at `radius`.
    pub fn pull_on(&self, ball_pos: Vec2) -> Vec2 {
        let to_center = self.pos - ball_pos;
        let distance = to_center.length();
        if distance > self.radius || distance == 0.0 {
            return Vec2::ZERO;
        }
        let strength = self.pull_strength * (1.0 - distance / self.radius);
        to_center / distance * strength
    }

    /// Ball has reached the core sphere
    pub fn touches_core(&self, ball_pos: Vec2, ball_radius: f32) -> bool {
        self.pos.distance(ball_pos) < self.core_radius + ball_radius
    }

    /// Remaining life as a 0..1 ratio
    pub fn life_ratio(&self) -> f32 {
        1.0 - self.timer as f32 / self.duration.max(1) as f32
    }
}

/// All live effects, owned by the game state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    pub explosions: Vec<Explosion>,
    pub shockwaves: Vec<Shockwave>,
    pub beams: Vec<Beam>,
    pub gravity_wells: Vec<GravityWell>,
}

impl Effects {
    /// Advance the purely visual effects and drop finished ones
    pub fn update_cosmetic(&mut self) {
        for e in &mut self.explosions {
            e.update();
        }
        self.explosions.retain(|e| !e.finished);

        for s in &mut self.shockwaves {
            s.update();
        }
        self.shockwaves.retain(|s| !s.finished);

        for b in &mut self.beams {
            b.update();
        }
        self.beams.retain(|b| !b.finished);
    }

    /// Advance gravity wells and drop expired ones
    pub fn update_wells(&mut self) {
        for w in &mut self.gravity_wells {
            w.update();
        }
        self.gravity_wells.retain(|w| !w.finished);
    }

    pub fn clear(&mut self) {
        self.explosions.clear();
        self.shockwaves.clear();
        self.beams.clear();
        self.gravity_wells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explosion_expands_then_fades() {
        let mut e = Explosion::new(Vec2::ZERO, 30.0);
        e.update();
        e.update();
        assert_eq!(e.radius, 30.0);
        assert_eq!(e.alpha, 1.0);

        let mut ticks = 0;
        while !e.finished {
            e.update();
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(e.alpha <= 0.0);
    }

    #[test]
    fn test_shockwave_lifetime() {
        let mut s = Shockwave::new(Vec2::ZERO);
        for _ in 0..7 {
            s.update();
        }
        assert!(!s.finished);
        s.update();
        assert!(s.finished);
    }

    #[test]
    fn test_beam_lifetime() {
        let mut b = Beam::new(100.0, 0.0, 600.0, 120.0);
        for _ in 0..29 {
            b.update();
        }
        assert!(!b.finished);
        b.update();
        assert!(b.finished);
        assert!(b.alpha >= 0.0);
    }

    #[test]
    fn test_well_pull_outside_radius_is_zero() {
        let w = GravityWell::new(1, Vec2::ZERO, 50.0, 0.3, 10);
        assert_eq!(w.pull_on(Vec2::new(60.0, 0.0)), Vec2::ZERO);
        assert_eq!(w.pull_on(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_well_expires() {
        let mut effects = Effects::default();
        effects
            .gravity_wells
            .push(GravityWell::new(1, Vec2::ZERO, 50.0, 0.3, 3));
        effects.update_wells();
        effects.update_wells();
        assert_eq!(effects.gravity_wells.len(), 1);
        effects.update_wells();
        assert!(effects.gravity_wells.is_empty());
    }

    #[test]
    fn test_cosmetic_update_leaves_wells_alone() {
        let mut effects = Effects::default();
        effects
            .gravity_wells
            .push(GravityWell::new(1, Vec2::ZERO, 50.0, 0.3, 1));
        effects.explosions.push(Explosion::new(Vec2::ZERO, 10.0));
        effects.update_cosmetic();
        assert_eq!(effects.gravity_wells[0].timer, 0);
        assert_eq!(effects.explosions[0].radius, 15.0);
    }
}
