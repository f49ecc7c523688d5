//! Deformable terrain field
//!
//! The cave is a cloud of soft circles. Digging shrinks a node's radius and
//! removes it once it falls below `min_radius`; coverage ("is this gem still
//! buried?") is a proximity test.
//!
//! Nodes live in a slot vector so a [`NodeId`] stays valid until the node is
//! removed or the field is rebuilt. A uniform grid keyed by the build
//! spacing indexes the live slots so range queries only visit nearby cells.

use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::FieldConfig;

/// Index of a node slot (stable until removal or rebuild)
pub type NodeId = usize;

/// One deformable terrain circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNode {
    pub id: NodeId,
    pub pos: Vec2,
    /// Current radius, `0 <= radius <= max_radius`
    pub radius: f32,
    /// Radius at build time
    pub max_radius: f32,
}

/// What an erosion call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erosion {
    /// Node was missing or the amount was not a positive finite number
    Ignored,
    /// Node shrank and is still in the field
    Shrunk,
    /// Node fell below the minimum radius and was removed
    Removed,
}

/// Terrain field with a bucket grid index
#[derive(Debug, Clone, Default)]
pub struct SpatialField {
    config: FieldConfig,
    slots: Vec<Option<FieldNode>>,
    buckets: HashMap<(i32, i32), Vec<NodeId>>,
    /// Largest radius any node was built with (bounds the query halo)
    max_node_radius: f32,
    live: usize,
}

impl SpatialField {
    /// A field with no nodes (used by the biplane variant)
    pub fn empty(config: FieldConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Build a fresh field covering a `width` x `height` viewport
    pub fn build(width: f32, height: f32, config: FieldConfig, rng: &mut impl Rng) -> Self {
        let mut field = Self::empty(config);
        field.rebuild(width, height, rng);
        field
    }

    /// Build a field from explicit `(position, radius)` pairs
    pub fn from_nodes(config: FieldConfig, nodes: impl IntoIterator<Item = (Vec2, f32)>) -> Self {
        let mut field = Self::empty(config);
        for (pos, radius) in nodes {
            field.insert(pos, radius);
        }
        field
    }

    /// Discard every node and regenerate the grid layout
    ///
    /// Erosion state is not carried across a rebuild.
    pub fn rebuild(&mut self, width: f32, height: f32, rng: &mut impl Rng) {
        self.slots.clear();
        self.buckets.clear();
        self.max_node_radius = 0.0;
        self.live = 0;

        let cfg = self.config.clone();
        if cfg.spacing <= 0.0 || !cfg.spacing.is_finite() {
            log::warn!("Field spacing {} is unusable, leaving field empty", cfg.spacing);
            return;
        }

        let open_limit = height * cfg.open_band;
        let jitter = cfg.spacing * cfg.position_jitter;
        let mut y = cfg.margin;
        while y < height - cfg.margin {
            let mut x = cfg.margin;
            while x < width - cfg.margin {
                let skip = y < open_limit && rng.random::<f32>() < cfg.open_skip_chance;
                if !skip {
                    let scale = 1.0 + symmetric(rng, cfg.radius_jitter);
                    let pos = Vec2::new(x + symmetric(rng, jitter), y + symmetric(rng, jitter));
                    self.insert(pos, cfg.node_radius * scale);
                }
                x += cfg.spacing;
            }
            y += cfg.spacing;
        }

        log::info!(
            "Built field {}x{}: {} nodes (spacing {})",
            width,
            height,
            self.live,
            cfg.spacing
        );
    }

    /// Add a node, returning its id
    pub fn insert(&mut self, pos: Vec2, radius: f32) -> Option<NodeId> {
        if !pos.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return None;
        }
        let id = self.slots.len();
        self.slots.push(Some(FieldNode {
            id,
            pos,
            radius,
            max_radius: radius,
        }));
        self.buckets.entry(self.cell_of(pos)).or_default().push(id);
        self.max_node_radius = self.max_node_radius.max(radius);
        self.live += 1;
        Some(id)
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Authored node radius (used to size query halos)
    pub fn node_radius(&self) -> f32 {
        self.config.node_radius
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&FieldNode> {
        self.slots.get(id).and_then(|s| s.as_ref())
    }

    /// Live nodes in id order
    pub fn iter(&self) -> impl Iterator<Item = &FieldNode> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Ids of every node whose circle comes within `radius` of `point`
    /// (`distance < radius + node.radius`), sorted by id
    pub fn query(&self, point: Vec2, radius: f32) -> Vec<NodeId> {
        if self.live == 0 || !point.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }

        let reach = radius + self.max_node_radius;
        let lo = self.cell_of(point - Vec2::splat(reach));
        let hi = self.cell_of(point + Vec2::splat(reach));

        let mut hits = Vec::new();
        let mut visit = |ids: &[NodeId]| {
            for &id in ids {
                if let Some(node) = self.get(id)
                    && node.pos.distance(point) < radius + node.radius
                {
                    hits.push(id);
                }
            }
        };

        // Wide queries walk the occupied buckets instead of empty cells
        let cells = (i64::from(hi.0) - i64::from(lo.0) + 1)
            .saturating_mul(i64::from(hi.1) - i64::from(lo.1) + 1);
        if cells > self.buckets.len() as i64 {
            for (&(cx, cy), ids) in &self.buckets {
                if (lo.0..=hi.0).contains(&cx) && (lo.1..=hi.1).contains(&cy) {
                    visit(ids.as_slice());
                }
            }
        } else {
            for cy in lo.1..=hi.1 {
                for cx in lo.0..=hi.0 {
                    if let Some(ids) = self.buckets.get(&(cx, cy)) {
                        visit(ids.as_slice());
                    }
                }
            }
        }
        hits.sort_unstable();
        hits
    }

    /// First node whose circle contains `point`
    pub fn node_at(&self, point: Vec2) -> Option<NodeId> {
        self.query(point, 0.0).into_iter().next()
    }

    /// Shrink a node by `amount`, removing it once it drops below the minimum
    pub fn erode(&mut self, id: NodeId, amount: f32) -> Erosion {
        if !amount.is_finite() || amount <= 0.0 {
            return Erosion::Ignored;
        }
        let min_radius = self.config.min_radius;
        let Some(node) = self.slots.get_mut(id).and_then(|s| s.as_mut()) else {
            return Erosion::Ignored;
        };

        node.radius = (node.radius - amount).max(0.0);
        if node.radius < min_radius {
            self.remove(id);
            Erosion::Removed
        } else {
            Erosion::Shrunk
        }
    }

    /// Erode every node within `radius` of `point`, returning how many were hit
    pub fn erode_area(&mut self, point: Vec2, radius: f32, amount: f32) -> usize {
        let ids = self.query(point, radius);
        for &id in &ids {
            self.erode(id, amount);
        }
        ids.len()
    }

    /// True if any node within `check_radius` of `point` is still larger
    /// than `threshold`
    pub fn is_covered(&self, point: Vec2, check_radius: f32, threshold: f32) -> bool {
        self.query(point, check_radius)
            .into_iter()
            .filter_map(|id| self.get(id))
            .any(|n| n.radius > threshold)
    }

    /// How buried a point is, 0 (exposed) to 1 (fully covered)
    pub fn coverage(&self, point: Vec2, check_radius: f32) -> f32 {
        self.query(point, check_radius)
            .into_iter()
            .filter_map(|id| self.get(id))
            .map(|n| {
                if n.max_radius > 0.0 {
                    n.radius / n.max_radius
                } else {
                    0.0
                }
            })
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }

    fn remove(&mut self, id: NodeId) {
        let Some(node) = self.slots.get_mut(id).and_then(|s| s.take()) else {
            return;
        };
        let cell = self.cell_of(node.pos);
        if let Some(ids) = self.buckets.get_mut(&cell) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.buckets.remove(&cell);
            }
        }
        self.live -= 1;
    }

    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        let size = if self.config.spacing > 0.0 {
            self.config.spacing
        } else {
            1.0
        };
        ((p.x / size).floor() as i32, (p.y / size).floor() as i32)
    }
}

/// Uniform sample in `[-half, half]` (zero when `half` is not positive)
fn symmetric(rng: &mut impl Rng, half: f32) -> f32 {
    if half > 0.0 {
        rng.random_range(-half..=half)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn single_node(radius: f32) -> (SpatialField, NodeId) {
        let field = SpatialField::from_nodes(FieldConfig::default(), [(Vec2::new(100.0, 100.0), radius)]);
        (field, 0)
    }

    #[test]
    fn test_build_fills_interior_and_opens_top() {
        let mut rng = Pcg32::seed_from_u64(7);
        let field = SpatialField::build(1280.0, 720.0, FieldConfig::default(), &mut rng);
        assert!(field.len() > 300);

        let cfg = FieldConfig::default();
        for node in field.iter() {
            assert!(node.radius <= node.max_radius);
            assert!(node.radius >= cfg.node_radius * (1.0 - cfg.radius_jitter) - 1e-3);
            assert!(node.radius <= cfg.node_radius * (1.0 + cfg.radius_jitter) + 1e-3);
        }

        // The open band is sparser than a full row
        let band = 720.0 * cfg.open_band;
        let top = field.iter().filter(|n| n.pos.y < band).count();
        let full_row = ((1280.0 - 2.0 * cfg.margin) / cfg.spacing).ceil() as usize;
        assert!(top < full_row);
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = Pcg32::seed_from_u64(11);
        let field = SpatialField::build(900.0, 600.0, FieldConfig::default(), &mut rng);
        for &(x, y, r) in &[(300.0, 300.0, 10.0), (60.0, 60.0, 40.0), (850.0, 590.0, 0.0)] {
            let p = Vec2::new(x, y);
            let mut brute: Vec<NodeId> = field
                .iter()
                .filter(|n| n.pos.distance(p) < r + n.radius)
                .map(|n| n.id)
                .collect();
            brute.sort_unstable();
            assert_eq!(field.query(p, r), brute);
        }
    }

    #[test]
    fn test_wide_query_stays_fast() {
        let (field, id) = single_node(10.0);
        let start = std::time::Instant::now();
        let hits = field.query(Vec2::new(100.0, 100.0), 2.0e5);
        assert_eq!(hits, vec![id]);
        assert!(start.elapsed() < std::time::Duration::from_millis(50));

        let mut rng = Pcg32::seed_from_u64(4);
        let field = SpatialField::build(900.0, 600.0, FieldConfig::default(), &mut rng);
        assert_eq!(field.query(Vec2::new(450.0, 300.0), 1.0e6).len(), field.len());
    }

    #[test]
    fn test_erode_removes_below_minimum() {
        let (mut field, id) = single_node(10.0);
        assert_eq!(field.erode(id, 4.0), Erosion::Shrunk);
        assert!((field.get(id).unwrap().radius - 6.0).abs() < 1e-5);
        assert_eq!(field.erode(id, 3.5), Erosion::Removed);
        assert!(field.get(id).is_none());
        assert!(field.is_empty());
        assert!(field.query(Vec2::new(100.0, 100.0), 50.0).is_empty());
        // Stale id is a no-op
        assert_eq!(field.erode(id, 1.0), Erosion::Ignored);
    }

    #[test]
    fn test_erode_rejects_bad_amounts() {
        let (mut field, id) = single_node(10.0);
        assert_eq!(field.erode(id, 0.0), Erosion::Ignored);
        assert_eq!(field.erode(id, -2.0), Erosion::Ignored);
        assert_eq!(field.erode(id, f32::NAN), Erosion::Ignored);
        assert_eq!(field.get(id).unwrap().radius, 10.0);
    }

    #[test]
    fn test_coverage_and_is_covered() {
        let (mut field, id) = single_node(10.0);
        let p = Vec2::new(100.0, 100.0);
        assert!(field.is_covered(p, 8.0, 6.0));
        assert!((field.coverage(p, 8.0) - 1.0).abs() < 1e-5);

        field.erode(id, 4.5);
        assert!(!field.is_covered(p, 8.0, 6.0));
        assert!(field.coverage(p, 8.0) < 0.6);
    }

    proptest! {
        #[test]
        fn prop_erosion_is_monotonic(
            radius in 4.0f32..40.0,
            amounts in proptest::collection::vec(0.01f32..5.0, 1..40),
        ) {
            let (mut field, id) = single_node(radius);
            let mut last = radius;
            for amount in amounts {
                match field.erode(id, amount) {
                    Erosion::Shrunk => {
                        let now = field.get(id).unwrap().radius;
                        prop_assert!(now < last);
                        prop_assert!(now >= 0.0);
                        last = now;
                    }
                    Erosion::Removed => {
                        prop_assert!(field.get(id).is_none());
                        break;
                    }
                    Erosion::Ignored => prop_assert!(false, "positive erosion ignored"),
                }
            }
        }
    }
}
