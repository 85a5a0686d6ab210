//! Collision detection and response for the rectangular play field
//!
//! Discrete per-tick tests only: circle vs. axis-aligned rectangles for the
//! ball, rectangle overlap for falling blocks, and point-in-rect for orbs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::GravityWell;
use super::state::{Ball, Block, Paddle};
use crate::consts::*;

/// Axis-aligned rectangle in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            left: pos.x,
            top: pos.y,
            right: pos.x + size.x,
            bottom: pos.y + size.y,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Closest point on (or in) the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.left, self.right), p.y.clamp(self.top, self.bottom))
    }

    /// Edge-inclusive overlap test
    pub fn touches(&self, other: &Rect) -> bool {
        self.bottom >= other.top
            && self.top <= other.bottom
            && self.right >= other.left
            && self.left <= other.right
    }

    /// Strict overlap test (shared edges don't count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

/// Whether a circle overlaps a rectangle
#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    center.distance(rect.closest_point(center)) < radius
}

/// Side of a block the ball approached from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitSides {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Which faces of `rect` the point lies outside of
pub fn hit_sides(center: Vec2, rect: &Rect) -> HitSides {
    HitSides {
        horizontal: center.x < rect.left || center.x > rect.right,
        vertical: center.y < rect.top || center.y > rect.bottom,
    }
}

/// Launch angle off the paddle for a given hit offset ratio (0 = left edge, 1 = right edge)
#[inline]
pub fn paddle_bounce_angle(hit_ratio: f32) -> f32 {
    (hit_ratio - 0.5) * PADDLE_BOUNCE_SPREAD
}

/// Reflect off the side walls and ceiling, clamping back inside
///
/// Returns true if any wall was struck.
pub fn ball_wall_collision(ball: &mut Ball, field_width: f32) -> bool {
    let mut hit = false;

    if ball.pos.x - ball.radius <= 0.0 || ball.pos.x + ball.radius >= field_width {
        ball.vel.x = -ball.vel.x;
        ball.pos.x = ball.pos.x.clamp(ball.radius, field_width - ball.radius);
        hit = true;
    }

    if ball.pos.y - ball.radius <= 0.0 {
        ball.vel.y = -ball.vel.y;
        ball.pos.y = ball.radius;
        hit = true;
    }

    hit
}

/// Bounce a downward-moving ball off the paddle
///
/// Consumes any pending paddle enhancement and arms the ball with it.
/// Returns true on contact.
pub fn ball_paddle_collision(ball: &mut Ball, paddle: &mut Paddle) -> bool {
    let bounds = paddle.bounds();

    let overlaps = ball.pos.y + ball.radius >= bounds.top
        && ball.pos.y - ball.radius <= bounds.bottom
        && ball.pos.x >= bounds.left
        && ball.pos.x <= bounds.right;

    if !overlaps || ball.vel.y <= 0.0 {
        return false;
    }

    let hit_ratio = (ball.pos.x - bounds.left) / bounds.width();
    let angle = paddle_bounce_angle(hit_ratio);
    ball.vel = Vec2::new(ball.speed * angle.sin(), -ball.speed * angle.cos());
    ball.normalize_speed();
    ball.pos.y = bounds.top - ball.radius;

    if let Some(enhancement) = paddle.take_enhance() {
        ball.apply_enhancement(enhancement);
    }

    true
}

/// One ball-block contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockHit {
    /// Index into the block slice
    pub index: usize,
    /// This hit brought the block to zero HP
    pub destroyed: bool,
    /// Hit by a ball still penetrating afterwards (shockwave)
    pub pierced: bool,
}

/// Resolve a ball against every live block
///
/// A non-penetrating ball reflects off and damages the first block it
/// overlaps. A penetrating ball one-shots every overlapping block in the tick,
/// spending one charge per block, and stops piercing once its charges run out.
pub fn ball_block_collisions(ball: &mut Ball, blocks: &mut [Block], base_damage: u32) -> Vec<BlockHit> {
    let mut hits = Vec::new();

    for index in (0..blocks.len()).rev() {
        let block = &mut blocks[index];
        if block.destroyed {
            continue;
        }

        let bounds = block.bounds();
        if !circle_rect_overlap(ball.pos, ball.radius, &bounds) {
            continue;
        }

        if !ball.penetrating {
            reflect_off_block(ball, &bounds);
        }

        let damage = if ball.penetrating {
            ball.use_penetrate();
            block.max_hp
        } else {
            ball.damage(base_damage)
        };

        let destroyed = block.take_damage(damage);
        hits.push(BlockHit {
            index,
            destroyed,
            pierced: ball.penetrating,
        });

        if !ball.penetrating {
            break;
        }
    }

    hits
}

/// Invert the velocity component for the struck face
fn reflect_off_block(ball: &mut Ball, bounds: &Rect) {
    let sides = hit_sides(ball.pos, bounds);

    if sides.horizontal {
        ball.vel.x = -ball.vel.x;

        // Keep balls from travelling purely sideways forever
        let edge = bounds.height() * BLOCK_EDGE_ZONE;
        let relative_y = ball.pos.y - bounds.top;
        let kick = (ball.speed * BLOCK_EDGE_KICK).abs();
        if relative_y < edge {
            ball.vel.y = -kick;
        } else if relative_y > bounds.height() - edge {
            ball.vel.y = kick;
        }
    }

    if sides.vertical {
        ball.vel.y = -ball.vel.y;
    }
}

/// Apply gravity well attraction to a ball
///
/// A ball that reaches a well's core stops being pulled by that well until
/// it next bounces off something. Pulls from several wells accumulate.
pub fn gravity_well_interaction(ball: &mut Ball, wells: &[GravityWell]) {
    for well in wells {
        if well.finished || ball.ignored_gravity_well == Some(well.id) {
            continue;
        }

        if well.touches_core(ball.pos, ball.radius) {
            ball.ignored_gravity_well = Some(well.id);
            continue;
        }

        ball.vel += well.pull_on(ball.pos);
    }
}
