//! Contact-radius adjacency.
//!
//! A [`ProximityIndex`] is a snapshot: it is built from one slice of
//! positions (agent `i` at `positions[i]`) and never updated.  The
//! controller rebuilds it on every neighbor refresh; at a few thousand
//! agents a bulk load is cheaper than tracking moves.
//!
//! Neighbor rows are sorted by `AgentId` and never contain the agent
//! itself.  Two agents exactly `radius` apart are neighbors.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use ct_core::{AgentId, Point};

use crate::{SpatialError, SpatialResult};

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct AgentEntry {
    point: [f64; 2],
    id:    AgentId,
}

impl RTreeObject for AgentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for AgentEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── ProximityIndex ────────────────────────────────────────────────────────────

pub struct ProximityIndex {
    tree:      RTree<AgentEntry>,
    positions: Vec<Point>,
}

impl ProximityIndex {
    /// Index `positions`; agent `i` is `AgentId(i)`.
    pub fn build(positions: &[Point]) -> SpatialResult<Self> {
        let mut entries = Vec::with_capacity(positions.len());
        for (i, p) in positions.iter().enumerate() {
            let id = AgentId(i as u32);
            if !p.is_finite() {
                return Err(SpatialError::NonFinitePosition { agent: id, x: p.x, y: p.y });
            }
            entries.push(AgentEntry { point: [p.x, p.y], id });
        }
        Ok(Self { tree: RTree::bulk_load(entries), positions: positions.to_vec() })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Every other agent within `radius` of `id`, sorted by ID.
    pub fn neighbors_of(&self, id: AgentId, radius: f64) -> SpatialResult<Vec<AgentId>> {
        check_radius(radius)?;
        let center = self.positions.get(id.index()).ok_or(SpatialError::AgentNotFound(id))?;
        Ok(self.row(id, *center, radius))
    }

    /// Neighbor rows for every agent, indexed by `AgentId`.  Symmetric.
    pub fn adjacency(&self, radius: f64) -> SpatialResult<Vec<Vec<AgentId>>> {
        check_radius(radius)?;

        #[cfg(not(feature = "parallel"))]
        {
            Ok(self
                .positions
                .iter()
                .enumerate()
                .map(|(i, &p)| self.row(AgentId(i as u32), p, radius))
                .collect())
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            Ok(self
                .positions
                .par_iter()
                .enumerate()
                .map(|(i, &p)| self.row(AgentId(i as u32), p, radius))
                .collect())
        }
    }

    fn row(&self, id: AgentId, center: Point, radius: f64) -> Vec<AgentId> {
        let mut row: Vec<AgentId> = self
            .tree
            .locate_within_distance([center.x, center.y], radius * radius)
            .map(|e| e.id)
            .filter(|&other| other != id)
            .collect();
        row.sort_unstable();
        row
    }
}

fn check_radius(radius: f64) -> SpatialResult<()> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(SpatialError::InvalidRadius(radius))
    }
}
