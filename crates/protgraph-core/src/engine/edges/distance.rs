use super::{EdgeCandidate, EdgeContext, EdgeStrategy, too_close_in_sequence};
use crate::core::utils::geometry;
use crate::engine::config::EdgeRule;
use crate::engine::error::GraphError;
use itertools::Itertools;
use kiddo::{KdTree, SquaredEuclidean};
use std::collections::BTreeSet;
use tracing::debug;

// Slack on the k-d tree radius; every hit is re-checked against the exact cutoff.
const RADIUS_SLACK: f64 = 1e-9;

// kiddo's default float tree splits buckets of 32 items and cannot split a bucket whose
// items share one value on the split axis. Point sets with that many shared values on
// any axis are scanned pairwise instead.
const MAX_SHARED_AXIS_VALUE: usize = 16;

/// Connects node pairs whose positions lie within `cutoff` Å of each other.
#[derive(Debug, Clone, Copy)]
pub struct DistanceThresholdStrategy {
    pub cutoff: f64,
    pub min_sequence_separation: usize,
}

impl EdgeStrategy for DistanceThresholdStrategy {
    fn name(&self) -> &str {
        EdgeRule::DISTANCE_THRESHOLD
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let nodes = context.layout.nodes();
        if nodes.len() < 2 {
            return Ok(Vec::new());
        }
        let points: Vec<[f64; 3]> = nodes
            .iter()
            .map(|node| [node.position.x, node.position.y, node.position.z])
            .collect();
        let radius_sq = self.cutoff * self.cutoff + RADIUS_SLACK;

        let mut candidates = Vec::new();
        for (i, neighbours) in neighbours_within(&points, radius_sq).into_iter().enumerate() {
            for j in neighbours {
                let distance = geometry::distance(&nodes[i].position, &nodes[j].position);
                if distance > self.cutoff
                    || too_close_in_sequence(&nodes[i].key, &nodes[j].key, self.min_sequence_separation)
                {
                    continue;
                }
                if let Some(candidate) = EdgeCandidate::new(i, j, self.name()) {
                    candidates.push(candidate.with_metadata("distance", distance));
                }
            }
        }
        Ok(candidates)
    }
}

/// For each point, the sorted indices of later points within `radius_sq` (squared).
fn neighbours_within(points: &[[f64; 3]], radius_sq: f64) -> Vec<Vec<usize>> {
    if !fits_kdtree(points) {
        debug!(points = points.len(), "Coincident coordinates, scanning pairs directly.");
        return (0..points.len())
            .map(|i| {
                (i + 1..points.len())
                    .filter(|&j| squared_distance(&points[i], &points[j]) <= radius_sq)
                    .collect()
            })
            .collect();
    }

    let mut kdtree: KdTree<f64, 3> = KdTree::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        kdtree.add(point, i as u64);
    }
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let mut neighbours: Vec<usize> = kdtree
                .within_unsorted::<SquaredEuclidean>(point, radius_sq)
                .into_iter()
                .map(|hit| hit.item as usize)
                .filter(|&j| j > i)
                .collect();
            neighbours.sort_unstable();
            neighbours
        })
        .collect()
}

fn fits_kdtree(points: &[[f64; 3]]) -> bool {
    (0..3).all(|axis| {
        points
            .iter()
            // +0.0 folds -0.0 into the same key.
            .map(|point| (point[axis] + 0.0).to_bits())
            .counts()
            .into_values()
            .all(|count| count <= MAX_SHARED_AXIS_VALUE)
    })
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Connects every node to its `k` nearest other nodes.
///
/// Ties are broken by ascending node index. The union of all directed choices is collapsed
/// to undirected edges, so a node can end up with more than `k` neighbours.
#[derive(Debug, Clone, Copy)]
pub struct KNearestStrategy {
    pub k: usize,
}

impl EdgeStrategy for KNearestStrategy {
    fn name(&self) -> &str {
        EdgeRule::K_NEAREST
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let nodes = context.layout.nodes();
        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();

        for (i, node) in nodes.iter().enumerate() {
            let mut others: Vec<(f64, usize)> = nodes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (geometry::distance(&node.position, &other.position), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            for &(_, j) in others.iter().take(self.k) {
                pairs.insert((i.min(j), i.max(j)));
            }
        }

        Ok(pairs
            .into_iter()
            .filter_map(|(i, j)| {
                let distance = geometry::distance(&nodes[i].position, &nodes[j].position);
                EdgeCandidate::new(i, j, self.name()).map(|c| c.with_metadata("distance", distance))
            })
            .collect())
    }
}
