//! Star field generation.
//!
//! Places core-region stars with the configured distribution method
//! (always inhabited) and outer frontier stars by rejection sampling
//! outside the core bounds (never inhabited — frontier systems stay
//! isolated until colonized). Pure: returns rows, persists nothing.

use serde_json::json;

use galaxy_schema::{GalaxyId, PoiKind, PoiRow, Point, RegionKind};

use crate::config::GenerationConfig;
use crate::points::{generator_for, PointConfig};
use crate::rng::SeededRng;
use crate::spatial::{GridItem, SpatialGrid};

const GREEK_LETTERS: [&str; 24] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
    "Lambda", "Mu", "Nu", "Xi", "Omicron", "Pi", "Rho", "Sigma", "Tau", "Upsilon", "Phi", "Chi",
    "Psi", "Omega",
];

const STELLAR_CLASSES_CORE: [(&str, u32); 5] =
    [("G", 40), ("K", 30), ("F", 15), ("M", 10), ("A", 5)];

const STELLAR_CLASSES_OUTER: [(&str, u32); 7] = [
    ("O", 5),
    ("B", 15),
    ("A", 20),
    ("F", 20),
    ("G", 20),
    ("K", 15),
    ("M", 5),
];

const STELLAR_SIZES: [(&str, u32); 5] = [
    ("dwarf", 10),
    ("main_sequence", 40),
    ("subgiant", 25),
    ("giant", 20),
    ("supergiant", 5),
];

/// Attempts per requested outer star before reporting a shortfall.
const OUTER_ATTEMPT_MULTIPLIER: u32 = 20;

/// Border kept free of outer stars on every edge.
const OUTER_EDGE_MARGIN: u32 = 10;

#[derive(Debug)]
pub struct StarField {
    pub rows: Vec<PoiRow>,
    pub core_count: usize,
    pub outer_count: usize,
    /// Requested stars that could not be placed within the attempt
    /// budgets, summed over both regions. Reported, never silent.
    pub shortfall: usize,
}

pub fn generate_star_field(
    galaxy: GalaxyId,
    config: &GenerationConfig,
    rng: &mut SeededRng,
) -> StarField {
    let core = config.core_region;
    let generator = generator_for(
        config.distribution,
        PointConfig {
            width: core.width(),
            height: core.height(),
            count: config.core_stars,
            spacing_factor: config.spacing_factor,
            options: config.generator,
        },
    );
    let sampled = generator.sample(rng);
    let mut shortfall = sampled.shortfall;

    let mut rows = Vec::with_capacity((config.core_stars + config.outer_stars) as usize);
    for point in &sampled.points {
        let x = core.x_min + point.x;
        let y = core.y_min + point.y;
        rows.push(star_row(
            galaxy,
            x,
            y,
            RegionKind::Core,
            true,
            &STELLAR_CLASSES_CORE,
            rng,
        ));
    }
    let core_count = sampled.points.len();

    let outer = sample_outer_points(config, rng);
    shortfall += (config.outer_stars as usize).saturating_sub(outer.len());
    let outer_count = outer.len();
    for point in outer {
        rows.push(star_row(
            galaxy,
            point.x,
            point.y,
            RegionKind::Outer,
            false,
            &STELLAR_CLASSES_OUTER,
            rng,
        ));
    }

    tracing::debug!(
        target: "galaxy::starfield",
        core = core_count,
        outer = outer_count,
        shortfall,
        method = ?config.distribution,
        "star field generated"
    );

    StarField {
        rows,
        core_count,
        outer_count,
        shortfall,
    }
}

/// Rejection-sample frontier stars: uniform over the full bounds minus
/// the core region, spaced by `outer_min_spacing`.
fn sample_outer_points(config: &GenerationConfig, rng: &mut SeededRng) -> Vec<Point> {
    let mut points = Vec::with_capacity(config.outer_stars as usize);
    let mut grid = SpatialGrid::new(config.outer_min_spacing.max(1.0));

    let margin = OUTER_EDGE_MARGIN.min(config.width / 4);
    let max_attempts = config.outer_stars * OUTER_ATTEMPT_MULTIPLIER;
    let mut attempts = 0;

    while (points.len() as u32) < config.outer_stars && attempts < max_attempts {
        attempts += 1;
        let x = rng.int_in(i64::from(margin), i64::from(config.width - 1 - margin)) as u32;
        let y = rng.int_in(i64::from(margin), i64::from(config.height - 1 - margin)) as u32;

        if config.core_region.contains(x, y) {
            continue;
        }
        if grid.has_item_within(f64::from(x), f64::from(y), config.outer_min_spacing) {
            continue;
        }

        grid.insert(GridItem {
            id: points.len() as u64,
            x: f64::from(x),
            y: f64::from(y),
        });
        points.push(Point::new(x, y));
    }

    points
}

fn star_row(
    galaxy: GalaxyId,
    x: u32,
    y: u32,
    region: RegionKind,
    inhabited: bool,
    classes: &[(&str, u32)],
    rng: &mut SeededRng,
) -> PoiRow {
    PoiRow {
        galaxy_id: galaxy,
        kind: PoiKind::Star,
        x,
        y,
        name: star_name(rng),
        region,
        inhabited,
        parent: None,
        orbital_index: None,
        attributes: json!({
            "stellar_class": weighted_pick(classes, rng),
            "stellar_size": weighted_pick(&STELLAR_SIZES, rng),
        }),
    }
}

pub(crate) fn star_name(rng: &mut SeededRng) -> String {
    let prefix = GREEK_LETTERS[rng.index(GREEK_LETTERS.len())];
    let catalog = rng.int_in(100, 9999);
    format!("{prefix}-{catalog}")
}

fn weighted_pick<'a>(weights: &[(&'a str, u32)], rng: &mut SeededRng) -> &'a str {
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    let roll = rng.int_in(1, i64::from(total)) as u32;
    let mut acc = 0;
    for (value, weight) in weights {
        acc += weight;
        if roll <= acc {
            return value;
        }
    }
    weights[weights.len() - 1].0
}
