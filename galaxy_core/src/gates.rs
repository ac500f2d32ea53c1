//! Warp gate network construction.
//!
//! Builds a deduplicated adjacency graph over the supplied stars. The
//! builder is pure: it returns rows and never persists. Edge identity is
//! the canonical coordinate tuple, so discovering a pair from either
//! endpoint produces the same logical edge exactly once.

use std::collections::HashSet;

use rand::seq::SliceRandom;

use galaxy_schema::{GalaxyId, GateKey, GateRow, GateStatus, Point, Star};

use crate::rng::SeededRng;
use crate::spatial::{GridItem, SpatialGrid};

/// Parameters for one gate network pass.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    /// Maximum distance at which two stars connect.
    pub adjacency_threshold: f64,
    /// Retained-neighbor cap per scanned star.
    pub max_gates_per_system: u32,
    pub status: GateStatus,
    /// Pre-flag every emitted gate hidden (used for dormant frontier
    /// gates; core gates are hidden by post-insert sampling instead).
    pub hidden: bool,
}

/// Fuel cost for traversing a gate of the given length.
pub fn fuel_cost(distance: f64) -> u32 {
    ((distance / 2.0).ceil() as u32).max(1)
}

/// Build the gate rows for one star set.
///
/// Callers pass the stars eligible for gating — inhabited stars for the
/// core network, frontier stars for the dormant pass. Fewer than two
/// stars yields an empty network, not an error. Output order follows the
/// scan order of `stars`, but the emitted edge *set* is independent of it.
pub fn build_gate_network(galaxy: GalaxyId, stars: &[Star], config: &GateConfig) -> Vec<GateRow> {
    if stars.len() < 2 {
        return Vec::new();
    }

    let grid = SpatialGrid::build(
        stars.iter().map(|s| GridItem {
            id: s.id,
            x: f64::from(s.x),
            y: f64::from(s.y),
        }),
        config.adjacency_threshold * 2.0,
    );

    let mut seen: HashSet<GateKey> = HashSet::new();
    let mut rows: Vec<GateRow> = Vec::new();

    for star in stars {
        let neighbors = grid.neighbors(
            f64::from(star.x),
            f64::from(star.y),
            config.adjacency_threshold,
            Some(star.id),
        );

        for neighbor in neighbors
            .iter()
            .take(config.max_gates_per_system as usize)
        {
            let key = GateKey::canonical(
                Point::new(star.x, star.y),
                Point::new(neighbor.x as u32, neighbor.y as u32),
            );
            if !seen.insert(key) {
                continue;
            }
            rows.push(GateRow {
                galaxy_id: galaxy,
                source_id: star.id,
                dest_id: neighbor.id,
                key,
                distance: neighbor.distance,
                fuel_cost: fuel_cost(neighbor.distance),
                hidden: config.hidden,
                status: config.status,
            });
        }
    }

    tracing::debug!(
        target: "galaxy::gates",
        stars = stars.len(),
        edges = rows.len(),
        threshold = config.adjacency_threshold,
        "gate network collected"
    );

    rows
}

/// Choose the keys to flag hidden: a seeded sample of
/// `ceil(total × fraction)` distinct gates.
pub fn sample_hidden_keys(keys: &[GateKey], fraction: f64, rng: &mut SeededRng) -> Vec<GateKey> {
    if keys.is_empty() || fraction <= 0.0 {
        return Vec::new();
    }
    let wanted = ((keys.len() as f64 * fraction).ceil() as usize).min(keys.len());
    let mut pool: Vec<GateKey> = keys.to_vec();
    let (sampled, _) = pool.partial_shuffle(rng, wanted);
    sampled.to_vec()
}
