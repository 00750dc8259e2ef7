//! Arena geometry and the random-walk movement step.
//!
//! Coordinates are screen-style: the origin is the top-left corner of the
//! arena, `x` grows to the right and `y` grows downwards.  Both are `f64` so
//! long runs of tiny steps do not accumulate visible rounding drift.

use std::f64::consts::PI;

use crate::AgentRng;

/// Largest distance a single movement step can cover, before the fixed
/// `0.5` offset is added.
pub const MOVE_RADIUS: f64 = 2.0;

/// Distance from the right and bottom edges at which an agent is turned
/// back.  Leaves room for the agent's own drawn size.
pub const EDGE_MARGIN: f64 = 5.0;

/// Maximum absolute heading change per step (PI / 8).
pub const MAX_TURN: f64 = 0.125 * PI;

// ── Point ─────────────────────────────────────────────────────────────────────

/// A position inside (or momentarily just outside) the arena.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ── Arena ─────────────────────────────────────────────────────────────────────

/// The bounded rectangle agents move in.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arena {
    pub width:  f64,
    pub height: f64,
}

impl Arena {
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// `true` if `p` lies in `[0, width] x [0, height]`.
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(200.0, 200.0)
    }
}

// ── Heading ───────────────────────────────────────────────────────────────────

/// Direction of travel in radians (`0` = +x, `PI / 2` = +y).
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Heading(pub f64);

impl Heading {
    pub fn random(rng: &mut AgentRng) -> Self {
        Heading(rng.gen_range(0.0..2.0 * PI))
    }
}

// ── Movement ──────────────────────────────────────────────────────────────────

/// One random-walk step.
///
/// The heading is perturbed by up to `MAX_TURN` either way, then the agent
/// advances between `0.5` and `0.5 + MOVE_RADIUS / 2` units along it.  If the
/// new position is past an edge the heading is pointed straight back into
/// the arena; the position itself is never clamped, so an agent that
/// overshoots walks back in over the following steps.
pub fn random_walk(pos: Point, heading: Heading, arena: Arena, rng: &mut AgentRng) -> (Point, Heading) {
    let turn: f64 = rng.random();
    let mut dir = heading.0 + (turn - 0.5) * 2.0 * MAX_TURN;

    let stride: f64 = rng.random();
    let distance = MOVE_RADIUS * (stride * 0.5) + 0.5;

    let next = Point::new(pos.x + dir.cos() * distance, pos.y + dir.sin() * distance);

    if next.x > arena.width - EDGE_MARGIN {
        dir = PI;
    }
    if next.y > arena.height - EDGE_MARGIN {
        dir = 1.5 * PI;
    }
    if next.x < 0.0 {
        dir = 0.0;
    }
    if next.y < 0.0 {
        dir = 0.5 * PI;
    }

    (next, Heading(dir))
}
