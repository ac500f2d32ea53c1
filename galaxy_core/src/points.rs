//! Point distribution generators.
//!
//! Eight interchangeable sampling strategies behind one trait, selected by
//! a closed [`DistributionMethod`] tag. Every generator is a pure function
//! of its config and the seeded engine: same seed, same method, same
//! output. No generator persists anything or touches the filesystem.
//!
//! Shortfall policy, uniform across all variants: a generator attempts up
//! to [`MAX_ATTEMPT_MULTIPLIER`] times the requested count (or the natural
//! exhaustion point of the geometric method), then returns fewer points
//! with the deficit reported in [`SampledPoints::shortfall`]. Under-return
//! is always visible to the caller, never silent.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use galaxy_schema::Point;

use crate::rng::SeededRng;
use crate::spatial::{GridItem, SpatialGrid};

/// Bound on candidate draws relative to the requested count.
pub const MAX_ATTEMPT_MULTIPLIER: u64 = 1000;

/// Plastic-constant recurrence coefficients: α₁ = 1/φ, α₂ = 1/φ² where
/// φ ≈ 1.32471795724474602596 is the real root of x³ = x + 1.
const R2_ALPHA_1: f64 = 0.754_877_666_246_692_7;
const R2_ALPHA_2: f64 = 0.569_840_290_998_053_2;

/// Golden angle in radians (≈ 137.5°).
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653_3;

/// Closed tag selecting a point distribution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMethod {
    #[default]
    RandomScatter,
    PoissonDisk,
    HaltonSequence,
    R2Sequence,
    VogelsSpiral,
    StratifiedGrid,
    LatinHypercube,
    UniformRandom,
}

impl DistributionMethod {
    pub const ALL: [DistributionMethod; 8] = [
        DistributionMethod::RandomScatter,
        DistributionMethod::PoissonDisk,
        DistributionMethod::HaltonSequence,
        DistributionMethod::R2Sequence,
        DistributionMethod::VogelsSpiral,
        DistributionMethod::StratifiedGrid,
        DistributionMethod::LatinHypercube,
        DistributionMethod::UniformRandom,
    ];

    /// Parse a configuration tag. Unknown tags fall back to the scatter
    /// default, matching the engine-kind fallback behavior.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "poisson" | "poissondisk" => DistributionMethod::PoissonDisk,
            "halton" | "haltonsequence" => DistributionMethod::HaltonSequence,
            "r2" | "r2sequence" => DistributionMethod::R2Sequence,
            "vogel" | "vogelsspiral" => DistributionMethod::VogelsSpiral,
            "stratified" | "stratifiedgrid" => DistributionMethod::StratifiedGrid,
            "latin" | "latinhypercube" => DistributionMethod::LatinHypercube,
            "uniform" | "uniformrandom" => DistributionMethod::UniformRandom,
            "scatter" | "randomscatter" => DistributionMethod::RandomScatter,
            other => {
                tracing::warn!(
                    target: "galaxy::points",
                    tag = other,
                    "unknown distribution tag, falling back to random scatter"
                );
                DistributionMethod::default()
            }
        }
    }
}

/// Tunables shared by the generators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Candidate darts per active point in Poisson-disk sampling.
    pub attempts: u32,
    /// Empty border kept free of points on every edge.
    pub margin: u32,
    /// Rotation offset for Vogel's spiral, in degrees.
    pub rotation_degrees: f64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            attempts: 30,
            margin: 0,
            rotation_degrees: 0.0,
        }
    }
}

/// Inputs common to every generator.
#[derive(Debug, Clone, Copy)]
pub struct PointConfig {
    pub width: u32,
    pub height: u32,
    pub count: u32,
    pub spacing_factor: f64,
    pub options: GeneratorOptions,
}

impl PointConfig {
    fn attempt_budget(&self) -> u64 {
        u64::from(self.count) * MAX_ATTEMPT_MULTIPLIER
    }

    /// Minimum integer spacing derived from the spacing factor.
    fn min_spacing(&self) -> f64 {
        self.spacing_factor.ceil().max(1.0)
    }
}

/// Generator output: the points plus how many of the requested count
/// could not be placed within the attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledPoints {
    pub points: Vec<Point>,
    pub shortfall: usize,
}

impl SampledPoints {
    pub fn requested(&self) -> usize {
        self.points.len() + self.shortfall
    }
}

/// A point distribution strategy.
pub trait PointGenerator {
    fn method(&self) -> DistributionMethod;

    /// Produce up to `count` unique points within `[0, width) × [0, height)`.
    fn sample(&self, rng: &mut SeededRng) -> SampledPoints;
}

/// Factory keyed on the closed method tag.
pub fn generator_for(method: DistributionMethod, config: PointConfig) -> Box<dyn PointGenerator> {
    match method {
        DistributionMethod::RandomScatter => Box::new(RandomScatter { config }),
        DistributionMethod::PoissonDisk => Box::new(PoissonDisk { config }),
        DistributionMethod::HaltonSequence => Box::new(HaltonSequence { config }),
        DistributionMethod::R2Sequence => Box::new(R2Sequence { config }),
        DistributionMethod::VogelsSpiral => Box::new(VogelsSpiral { config }),
        DistributionMethod::StratifiedGrid => Box::new(StratifiedGrid { config }),
        DistributionMethod::LatinHypercube => Box::new(LatinHypercube { config }),
        DistributionMethod::UniformRandom => Box::new(UniformRandom { config }),
    }
}

/// Accumulates accepted points, enforcing uniqueness and (optionally) a
/// minimum spacing via a spatial grid.
struct PlacedPoints {
    points: Vec<Point>,
    seen: HashSet<Point>,
    grid: Option<SpatialGrid>,
    min_spacing: f64,
}

impl PlacedPoints {
    fn unique_only(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            grid: None,
            min_spacing: 0.0,
        }
    }

    fn spaced(capacity: usize, min_spacing: f64) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            grid: Some(SpatialGrid::new(min_spacing)),
            min_spacing,
        }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn try_push(&mut self, point: Point) -> bool {
        if self.seen.contains(&point) {
            return false;
        }
        let x = f64::from(point.x);
        let y = f64::from(point.y);
        if let Some(grid) = &self.grid {
            if grid.has_item_within(x, y, self.min_spacing) {
                return false;
            }
        }
        if let Some(grid) = &mut self.grid {
            grid.insert(GridItem {
                id: self.points.len() as u64,
                x,
                y,
            });
        }
        self.seen.insert(point);
        self.points.push(point);
        true
    }

    fn into_sampled(self, requested: u32) -> SampledPoints {
        let shortfall = (requested as usize).saturating_sub(self.points.len());
        SampledPoints {
            points: self.points,
            shortfall,
        }
    }
}

fn clamp_to_bounds(value: f64, upper: u32) -> u32 {
    let max = upper.saturating_sub(1);
    if value <= 0.0 {
        0
    } else {
        (value.round() as u32).min(max)
    }
}

/// Rejection sampling with a short collision retry.
///
/// On an exact coordinate collision the draw is retried up to three times;
/// a still-colliding draw is simply discarded (the original kept points in
/// a coordinate-keyed map, so a duplicate overwrote and was lost).
pub struct RandomScatter {
    config: PointConfig,
}

impl PointGenerator for RandomScatter {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::RandomScatter
    }

    fn sample(&self, rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let mut placed = PlacedPoints::unique_only(cfg.count as usize);
        let mut attempts = 0u64;
        let budget = cfg.attempt_budget();

        while (placed.len() as u32) < cfg.count && attempts < budget {
            let mut accepted = false;
            for _ in 0..=3 {
                attempts += 1;
                let point = Point::new(
                    rng.int_in(0, i64::from(cfg.width) - 1) as u32,
                    rng.int_in(0, i64::from(cfg.height) - 1) as u32,
                );
                if placed.try_push(point) {
                    accepted = true;
                    break;
                }
            }
            if !accepted && attempts >= budget {
                break;
            }
        }

        placed.into_sampled(cfg.count)
    }
}

/// Bridson-style Poisson-disk dart throwing.
///
/// Guarantees no two returned points are closer than the derived radius
/// `r = max(1, spacing_factor)`, including after snapping to integers.
pub struct PoissonDisk {
    config: PointConfig,
}

impl PoissonDisk {
    fn radius(&self) -> f64 {
        self.config.spacing_factor.max(1.0)
    }
}

impl PointGenerator for PoissonDisk {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::PoissonDisk
    }

    fn sample(&self, rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let width = f64::from(cfg.width);
        let height = f64::from(cfg.height);
        let margin = f64::from(cfg.options.margin);
        let r = self.radius();
        let cell = r / std::f64::consts::SQRT_2;
        let grid_w = ((width / cell).ceil() as usize).max(1);
        let grid_h = ((height / cell).ceil() as usize).max(1);
        let mut occupancy: Vec<Option<usize>> = vec![None; grid_w * grid_h];

        // Candidates are generated in float space but snapped to their
        // integer cell before the acceptance check, so the radius
        // guarantee holds on the returned integer points, not just on the
        // pre-snap floats.
        let mut samples: Vec<(f64, f64)> = Vec::with_capacity(cfg.count as usize);
        let mut active: Vec<usize> = Vec::new();

        let cell_of = |x: f64, y: f64| -> (usize, usize) {
            let gx = ((x / cell) as usize).min(grid_w - 1);
            let gy = ((y / cell) as usize).min(grid_h - 1);
            (gx, gy)
        };
        let snap = |x: f64, y: f64| -> (f64, f64) {
            (
                f64::from(clamp_to_bounds(x, cfg.width)),
                f64::from(clamp_to_bounds(y, cfg.height)),
            )
        };
        let far_enough = |x: f64,
                          y: f64,
                          samples: &[(f64, f64)],
                          occupancy: &[Option<usize>]| {
            let (gx, gy) = cell_of(x, y);
            for yy in gy.saturating_sub(2)..=(gy + 2).min(grid_h - 1) {
                for xx in gx.saturating_sub(2)..=(gx + 2).min(grid_w - 1) {
                    let Some(neighbor) = occupancy[yy * grid_w + xx] else {
                        continue;
                    };
                    let (qx, qy) = samples[neighbor];
                    let dx = qx - x;
                    let dy = qy - y;
                    if dx * dx + dy * dy < r * r {
                        return false;
                    }
                }
            }
            true
        };
        let add = |x: f64,
                   y: f64,
                   samples: &mut Vec<(f64, f64)>,
                   active: &mut Vec<usize>,
                   occupancy: &mut Vec<Option<usize>>| {
            let idx = samples.len();
            samples.push((x, y));
            active.push(idx);
            let (gx, gy) = cell_of(x, y);
            occupancy[gy * grid_w + gx] = Some(idx);
        };

        let (seed_x, seed_y) = snap(
            margin + rng.unit() * (width - 2.0 * margin).max(0.0),
            margin + rng.unit() * (height - 2.0 * margin).max(0.0),
        );
        add(seed_x, seed_y, &mut samples, &mut active, &mut occupancy);

        while !active.is_empty() && samples.len() < cfg.count as usize {
            let active_idx = rng.index(active.len());
            let (px, py) = samples[active[active_idx]];
            let mut placed = false;

            for _ in 0..cfg.options.attempts {
                let u = rng.unit();
                let angle = rng.angle();
                // Annulus radius in [r, 2r).
                let radius = r * (1.0 + 3.0 * u).sqrt();
                let x = px + radius * angle.cos();
                let y = py + radius * angle.sin();

                if x < margin || y < margin || x >= width - margin || y >= height - margin {
                    continue;
                }

                let (sx, sy) = snap(x, y);
                if far_enough(sx, sy, &samples, &occupancy) {
                    add(sx, sy, &mut samples, &mut active, &mut occupancy);
                    placed = true;
                    break;
                }
            }

            if !placed {
                // This seed's annulus is saturated; retire it.
                active.swap_remove(active_idx);
            }
        }

        let points = samples
            .into_iter()
            .map(|(x, y)| Point::new(x as u32, y as u32))
            .collect::<Vec<_>>();
        let shortfall = (cfg.count as usize).saturating_sub(points.len());
        SampledPoints { points, shortfall }
    }
}

fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let mut fraction = 1.0;
    let mut result = 0.0;
    while index > 0 {
        fraction /= base as f64;
        result += fraction * (index % base) as f64;
        index /= base;
    }
    result
}

/// Base-2/base-3 Halton low-discrepancy sequence, scaled to the bounds.
pub struct HaltonSequence {
    config: PointConfig,
}

impl PointGenerator for HaltonSequence {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::HaltonSequence
    }

    fn sample(&self, _rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let mut placed = if cfg.spacing_factor > 0.0 {
            PlacedPoints::spaced(cfg.count as usize, cfg.min_spacing())
        } else {
            PlacedPoints::unique_only(cfg.count as usize)
        };

        let budget = cfg.attempt_budget();
        let mut index = 1u64;
        while (placed.len() as u32) < cfg.count && index <= budget {
            let x = (radical_inverse(index, 2) * f64::from(cfg.width)).floor();
            let y = (radical_inverse(index, 3) * f64::from(cfg.height)).floor();
            placed.try_push(Point::new(
                (x as u32).min(cfg.width - 1),
                (y as u32).min(cfg.height - 1),
            ));
            index += 1;
        }

        placed.into_sampled(cfg.count)
    }
}

/// Additive recurrence over the plastic constant (the R2 sequence).
/// Better 2D equidistribution than Halton, with no directional bias.
pub struct R2Sequence {
    config: PointConfig,
}

impl PointGenerator for R2Sequence {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::R2Sequence
    }

    fn sample(&self, _rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let mut placed = if cfg.spacing_factor > 0.0 {
            PlacedPoints::spaced(cfg.count as usize, cfg.min_spacing())
        } else {
            PlacedPoints::unique_only(cfg.count as usize)
        };

        let budget = cfg.attempt_budget();
        let mut index = 0u64;
        while (placed.len() as u32) < cfg.count && index < budget {
            let x_frac = (0.5 + index as f64 * R2_ALPHA_1).fract();
            let y_frac = (0.5 + index as f64 * R2_ALPHA_2).fract();
            let x = ((x_frac * f64::from(cfg.width)).floor() as u32).min(cfg.width - 1);
            let y = ((y_frac * f64::from(cfg.height)).floor() as u32).min(cfg.height - 1);
            placed.try_push(Point::new(x, y));
            index += 1;
        }

        placed.into_sampled(cfg.count)
    }
}

/// Golden-angle spiral with radius proportional to √index.
/// Produces the sunflower pattern: dense center, sparse rim.
pub struct VogelsSpiral {
    config: PointConfig,
}

impl VogelsSpiral {
    fn spiral_point(&self, index: u64, rotation: f64, radius_scale: f64) -> Point {
        let cfg = &self.config;
        let center_x = f64::from(cfg.width) / 2.0;
        let center_y = f64::from(cfg.height) / 2.0;
        let angle = index as f64 * GOLDEN_ANGLE + rotation;
        let radius = radius_scale * (index as f64).sqrt();
        Point::new(
            clamp_to_bounds(center_x + radius * angle.cos(), cfg.width),
            clamp_to_bounds(center_y + radius * angle.sin(), cfg.height),
        )
    }
}

impl PointGenerator for VogelsSpiral {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::VogelsSpiral
    }

    fn sample(&self, _rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let rotation = cfg.options.rotation_degrees.to_radians();
        let center = f64::from(cfg.width.min(cfg.height)) / 2.0;
        let max_radius = center * 0.95;
        let radius_scale = max_radius / f64::from(cfg.count.max(1)).sqrt();

        let mut placed = PlacedPoints::unique_only(cfg.count as usize);
        for index in 0..u64::from(cfg.count) {
            placed.try_push(self.spiral_point(index, rotation, radius_scale));
        }

        // Integer rounding occasionally collides near the center; keep
        // walking the spiral outward to fill the gaps.
        let budget = cfg.attempt_budget();
        let mut index = u64::from(cfg.count);
        while (placed.len() as u32) < cfg.count && index < budget {
            placed.try_push(self.spiral_point(index, rotation, radius_scale));
            index += 1;
        }

        placed.into_sampled(cfg.count)
    }
}

/// One random point per cell of a ⌈√count⌉-sided subdivision.
/// Guarantees near-uniform coverage with no large empty regions.
pub struct StratifiedGrid {
    config: PointConfig,
}

struct CellBounds {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

impl StratifiedGrid {
    fn cell_bounds(&self, col: u32, row: u32, cell_width: f64, cell_height: f64) -> CellBounds {
        let cfg = &self.config;
        let min_x = (f64::from(col) * cell_width).floor() as i64;
        let max_x = ((f64::from(col) + 1.0) * cell_width).floor() as i64 - 1;
        let min_y = (f64::from(row) * cell_height).floor() as i64;
        let max_y = ((f64::from(row) + 1.0) * cell_height).floor() as i64 - 1;
        CellBounds {
            min_x: min_x.clamp(0, i64::from(cfg.width) - 1),
            max_x: max_x.clamp(0, i64::from(cfg.width) - 1),
            min_y: min_y.clamp(0, i64::from(cfg.height) - 1),
            max_y: max_y.clamp(0, i64::from(cfg.height) - 1),
        }
    }
}

impl PointGenerator for StratifiedGrid {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::StratifiedGrid
    }

    fn sample(&self, rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let cells_per_row = (f64::from(cfg.count).sqrt().ceil() as u32).max(1);
        let cells_per_col = cfg.count.div_ceil(cells_per_row).max(1);
        let cell_width = f64::from(cfg.width) / f64::from(cells_per_row);
        let cell_height = f64::from(cfg.height) / f64::from(cells_per_col);

        let mut placed = PlacedPoints::unique_only(cfg.count as usize);
        'fill: for row in 0..cells_per_col {
            for col in 0..cells_per_row {
                if placed.len() as u32 >= cfg.count {
                    break 'fill;
                }
                let bounds = self.cell_bounds(col, row, cell_width, cell_height);
                let x = rng.int_in(bounds.min_x, bounds.max_x.max(bounds.min_x)) as u32;
                let y = rng.int_in(bounds.min_y, bounds.max_y.max(bounds.min_y)) as u32;
                placed.try_push(Point::new(x, y));
            }
        }

        // Boundary ties are rare; re-roll random cells to make up the
        // difference.
        let budget = cfg.attempt_budget();
        let mut attempts = 0u64;
        while (placed.len() as u32) < cfg.count && attempts < budget {
            attempts += 1;
            let col = rng.int_in(0, i64::from(cells_per_row) - 1) as u32;
            let row = rng.int_in(0, i64::from(cells_per_col) - 1) as u32;
            let bounds = self.cell_bounds(col, row, cell_width, cell_height);
            let x = rng.int_in(bounds.min_x, bounds.max_x.max(bounds.min_x)) as u32;
            let y = rng.int_in(bounds.min_y, bounds.max_y.max(bounds.min_y)) as u32;
            placed.try_push(Point::new(x, y));
        }

        placed.into_sampled(cfg.count)
    }
}

/// Latin hypercube sampling: independently shuffled row- and column-band
/// permutations, paired. No two points share an x-band or a y-band.
pub struct LatinHypercube {
    config: PointConfig,
}

impl LatinHypercube {
    fn band_point(&self, x_band: u32, y_band: u32, rng: &mut SeededRng) -> Point {
        let cfg = &self.config;
        let x_segment = f64::from(cfg.width) / f64::from(cfg.count);
        let y_segment = f64::from(cfg.height) / f64::from(cfg.count);

        let min_x = ((f64::from(x_band) * x_segment).floor() as i64).clamp(0, i64::from(cfg.width) - 1);
        let max_x = (((f64::from(x_band) + 1.0) * x_segment).floor() as i64 - 1)
            .clamp(min_x, i64::from(cfg.width) - 1);
        let min_y = ((f64::from(y_band) * y_segment).floor() as i64).clamp(0, i64::from(cfg.height) - 1);
        let max_y = (((f64::from(y_band) + 1.0) * y_segment).floor() as i64 - 1)
            .clamp(min_y, i64::from(cfg.height) - 1);

        Point::new(
            rng.int_in(min_x, max_x) as u32,
            rng.int_in(min_y, max_y) as u32,
        )
    }
}

impl PointGenerator for LatinHypercube {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::LatinHypercube
    }

    fn sample(&self, rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let mut x_bands: Vec<u32> = (0..cfg.count).collect();
        let mut y_bands: Vec<u32> = (0..cfg.count).collect();
        x_bands.shuffle(rng);
        y_bands.shuffle(rng);

        let mut placed = PlacedPoints::unique_only(cfg.count as usize);
        for i in 0..cfg.count as usize {
            placed.try_push(self.band_point(x_bands[i], y_bands[i], rng));
        }

        // Collisions only happen when bands collapse to shared integer
        // cells (count close to the bounds); refill with a prime-offset
        // band walk.
        let budget = cfg.attempt_budget();
        let mut attempts = 0u64;
        while (placed.len() as u32) < cfg.count && attempts < budget {
            attempts += 1;
            let i = (placed.len() as u64 + attempts) % u64::from(cfg.count);
            let x_band = i as u32;
            let y_band = ((i * 7) % u64::from(cfg.count)) as u32;
            placed.try_push(self.band_point(x_band, y_band, rng));
        }

        placed.into_sampled(cfg.count)
    }
}

/// Pure independent uniform sampling. Intentionally clustered; only exact
/// duplicates are rejected.
pub struct UniformRandom {
    config: PointConfig,
}

impl PointGenerator for UniformRandom {
    fn method(&self) -> DistributionMethod {
        DistributionMethod::UniformRandom
    }

    fn sample(&self, rng: &mut SeededRng) -> SampledPoints {
        let cfg = &self.config;
        let mut placed = PlacedPoints::unique_only(cfg.count as usize);
        let budget = cfg.attempt_budget();
        let mut attempts = 0u64;
        while (placed.len() as u32) < cfg.count && attempts < budget {
            attempts += 1;
            placed.try_push(Point::new(
                rng.int_in(0, i64::from(cfg.width) - 1) as u32,
                rng.int_in(0, i64::from(cfg.height) - 1) as u32,
            ));
        }
        placed.into_sampled(cfg.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EngineKind;

    fn config(width: u32, height: u32, count: u32, spacing: f64) -> PointConfig {
        PointConfig {
            width,
            height,
            count,
            spacing_factor: spacing,
            options: GeneratorOptions::default(),
        }
    }

    fn sample_with(method: DistributionMethod, cfg: PointConfig, seed: u64) -> SampledPoints {
        let generator = generator_for(method, cfg);
        let mut rng = SeededRng::new(EngineKind::ChaCha8, seed);
        generator.sample(&mut rng)
    }

    #[test]
    fn every_method_is_deterministic() {
        let cfg = config(200, 200, 80, 0.75);
        for method in DistributionMethod::ALL {
            let a = sample_with(method, cfg, 42);
            let b = sample_with(method, cfg, 42);
            assert_eq!(a, b, "{method:?} diverged for identical seeds");
        }
    }

    #[test]
    fn every_method_respects_bounds() {
        let cfg = config(120, 90, 60, 0.75);
        for method in DistributionMethod::ALL {
            let sampled = sample_with(method, cfg, 7);
            for point in &sampled.points {
                assert!(point.x < 120, "{method:?} emitted x={}", point.x);
                assert!(point.y < 90, "{method:?} emitted y={}", point.y);
            }
        }
    }

    #[test]
    fn every_method_reaches_count_on_roomy_bounds() {
        let cfg = config(300, 300, 100, 0.75);
        for method in DistributionMethod::ALL {
            let sampled = sample_with(method, cfg, 11);
            assert_eq!(
                sampled.points.len(),
                100,
                "{method:?} under-returned without reporting"
            );
            assert_eq!(sampled.shortfall, 0);
        }
    }

    #[test]
    fn every_method_emits_unique_points() {
        let cfg = config(150, 150, 90, 0.75);
        for method in DistributionMethod::ALL {
            let sampled = sample_with(method, cfg, 23);
            let unique: HashSet<Point> = sampled.points.iter().copied().collect();
            assert_eq!(unique.len(), sampled.points.len(), "{method:?} duplicated");
        }
    }

    #[test]
    fn poisson_disk_keeps_spacing_for_reference_scenario() {
        // 100×100, count=50, spacing 0.8, seed 42: at most 50 points, all
        // pairwise distances at least the derived radius, reproducible.
        let cfg = config(100, 100, 50, 0.8);
        let sampled = sample_with(DistributionMethod::PoissonDisk, cfg, 42);
        assert!(sampled.points.len() <= 50);
        let radius = 1.0f64;
        for (i, a) in sampled.points.iter().enumerate() {
            for b in &sampled.points[i + 1..] {
                assert!(a.distance_to(b) >= radius, "{a:?} and {b:?} too close");
            }
        }
        let again = sample_with(DistributionMethod::PoissonDisk, cfg, 42);
        assert_eq!(sampled, again);
    }

    #[test]
    fn poisson_disk_enforces_wide_radius() {
        let cfg = config(400, 400, 40, 12.0);
        let sampled = sample_with(DistributionMethod::PoissonDisk, cfg, 5);
        assert!(!sampled.points.is_empty());
        for (i, a) in sampled.points.iter().enumerate() {
            for b in &sampled.points[i + 1..] {
                assert!(a.distance_to(b) >= 12.0, "{a:?} and {b:?} under radius");
            }
        }
    }

    #[test]
    fn latin_hypercube_keeps_band_exclusivity() {
        let cfg = config(100, 100, 20, 0.0);
        let sampled = sample_with(DistributionMethod::LatinHypercube, cfg, 99);
        assert_eq!(sampled.points.len(), 20);

        let x_bands: HashSet<u32> = sampled.points.iter().map(|p| p.x / 5).collect();
        let y_bands: HashSet<u32> = sampled.points.iter().map(|p| p.y / 5).collect();
        assert_eq!(x_bands.len(), 20, "two points share an x band");
        assert_eq!(y_bands.len(), 20, "two points share a y band");
    }

    #[test]
    fn shortfall_is_reported_not_silent() {
        // Spacing too large for the area: the sequence variants exhaust
        // their attempt budget and must report the deficit.
        let cfg = config(50, 50, 40, 30.0);
        for method in [
            DistributionMethod::HaltonSequence,
            DistributionMethod::R2Sequence,
            DistributionMethod::PoissonDisk,
        ] {
            let sampled = sample_with(method, cfg, 3);
            assert!(sampled.shortfall > 0, "{method:?} hid its shortfall");
            assert_eq!(sampled.requested(), 40, "{method:?} lost the request size");
        }
    }

    #[test]
    fn vogel_spiral_fills_collisions_from_the_spiral() {
        let cfg = config(60, 60, 300, 0.0);
        let sampled = sample_with(DistributionMethod::VogelsSpiral, cfg, 17);
        let unique: HashSet<Point> = sampled.points.iter().copied().collect();
        assert_eq!(unique.len(), sampled.points.len());
        assert_eq!(sampled.points.len() + sampled.shortfall, 300);
    }

    #[test]
    fn stratified_grid_covers_every_quadrant() {
        let cfg = config(200, 200, 64, 0.0);
        let sampled = sample_with(DistributionMethod::StratifiedGrid, cfg, 31);
        assert_eq!(sampled.points.len(), 64);
        // With an 8×8 subdivision every 100×100 quadrant holds 16 cells;
        // coverage means no quadrant is empty.
        for (qx, qy) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            let occupied = sampled
                .points
                .iter()
                .any(|p| p.x / 100 == qx && p.y / 100 == qy);
            assert!(occupied, "quadrant ({qx},{qy}) left empty");
        }
    }

    #[test]
    fn halton_differs_from_r2() {
        let cfg = config(100, 100, 30, 0.0);
        let halton = sample_with(DistributionMethod::HaltonSequence, cfg, 1);
        let r2 = sample_with(DistributionMethod::R2Sequence, cfg, 1);
        assert_ne!(halton.points, r2.points);
    }

    #[test]
    fn method_tags_parse_with_fallback() {
        assert_eq!(
            DistributionMethod::from_tag("poissondisk"),
            DistributionMethod::PoissonDisk
        );
        assert_eq!(
            DistributionMethod::from_tag("LATIN"),
            DistributionMethod::LatinHypercube
        );
        assert_eq!(
            DistributionMethod::from_tag("not-a-method"),
            DistributionMethod::RandomScatter
        );
    }

    #[test]
    fn generators_do_not_consume_entropy_for_pure_sequences() {
        // Halton, R2 and Vogel are deterministic sequences; the engine
        // must be untouched so later pipeline steps see the same stream
        // regardless of method.
        use rand::RngCore;

        for method in [
            DistributionMethod::HaltonSequence,
            DistributionMethod::R2Sequence,
            DistributionMethod::VogelsSpiral,
        ] {
            let mut rng = SeededRng::new(EngineKind::Pcg64, 55);
            let generator = generator_for(method, config(100, 100, 40, 0.0));
            generator.sample(&mut rng);
            let mut fresh = SeededRng::new(EngineKind::Pcg64, 55);
            assert_eq!(
                rng.next_u64(),
                fresh.next_u64(),
                "{method:?} consumed entropy"
            );
        }
    }
}
