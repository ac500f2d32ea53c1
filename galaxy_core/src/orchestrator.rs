//! Generation pipeline orchestration.
//!
//! Runs the fixed step sequence in dependency order, committing each
//! step's writes independently (large galaxies must not hold one giant
//! transaction). The orchestrator is the single catch point: generators
//! and the store raise, it logs, cleans up and decides the final
//! externally-visible outcome. A failed run leaves no partial galaxy
//! behind — every entity family written by completed steps is deleted in
//! reverse dependency order, including any mirror galaxy created earlier
//! in the pipeline.

use std::collections::BTreeMap;

use thiserror::Error;

use galaxy_schema::{
    EntityKind, GalaxyId, GalaxyRecord, GalaxyStatus, GateStatus, RegionKind,
};

use crate::config::{ConfigError, GenerationConfig};
use crate::gates::{self, GateConfig};
use crate::metrics::{GalaxySummary, GenerationMetrics, GenerationReport, StepReport};
use crate::persist::{BulkWriter, GalaxyStore, StoreError};
use crate::planets;
use crate::rng::SeededRng;
use crate::sectors;
use crate::starfield;

pub const STEP_STAR_FIELD: &str = "star_field";
pub const STEP_PLANETARY_SYSTEMS: &str = "planetary_systems";
pub const STEP_SECTOR_GRID: &str = "sector_grid";
pub const STEP_WARP_GATE_NETWORK: &str = "warp_gate_network";
pub const STEP_MIRROR_UNIVERSE: &str = "mirror_universe";

/// Salt for deriving the mirror galaxy's generator from the prime seed.
const MIRROR_SEED_SALT: u64 = 0x4D49_5252;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{step}: {message}")]
    Generation { step: &'static str, message: String },
}

/// Hook for external progress broadcasting. The core only emits; the
/// transport (websocket, queue, console) is a collaborator concern.
pub trait ProgressSink {
    fn on_progress(&self, step: &str, percent: u8);
}

/// Default sink: discard progress events.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _step: &str, _percent: u8) {}
}

/// Externally observable pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running(usize),
    CleaningUp,
    Completed,
    Failed,
}

/// Per-run context handed from step to step. Steps deposit their outputs
/// for later steps and for the final report.
type StepContext = BTreeMap<String, serde_json::Value>;

pub struct GenerationOrchestrator<'s, S: GalaxyStore> {
    store: &'s mut S,
    progress: &'s dyn ProgressSink,
    state: RunState,
}

impl<'s, S: GalaxyStore> GenerationOrchestrator<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            progress: &NoProgress,
            state: RunState::NotStarted,
        }
    }

    pub fn with_progress(mut self, sink: &'s dyn ProgressSink) -> Self {
        self.progress = sink;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the full pipeline. Configuration errors fail fast before any
    /// persistence; step failures trigger cleanup. Either way the caller
    /// receives a structured report with the original error preserved.
    pub fn generate(&mut self, config: &GenerationConfig) -> GenerationReport {
        let mut total = GenerationMetrics::new();

        if let Err(err) = config.validate() {
            tracing::error!(target: "galaxy::orchestrator", error = %err, "invalid generation config");
            self.state = RunState::Failed;
            total.complete();
            return GenerationReport {
                success: false,
                galaxy: None,
                mirror_galaxy: None,
                steps: Vec::new(),
                statistics: None,
                error: Some(err.to_string()),
                total_elapsed_ms: total.elapsed_ms(),
            };
        }

        let mut rng = SeededRng::new(config.engine, config.seed);
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| generate_galaxy_name(&mut rng));

        let galaxy = match self.store.create_galaxy(GalaxyRecord {
            name: name.clone(),
            tier: config.tier,
            width: config.width,
            height: config.height,
            seed: config.seed,
            status: GalaxyStatus::Generating,
            mirror_of: None,
        }) {
            Ok(id) => id,
            Err(err) => {
                self.state = RunState::Failed;
                total.complete();
                return GenerationReport {
                    success: false,
                    galaxy: None,
                    mirror_galaxy: None,
                    steps: Vec::new(),
                    statistics: None,
                    error: Some(err.to_string()),
                    total_elapsed_ms: total.elapsed_ms(),
                };
            }
        };

        tracing::info!(
            target: "galaxy::orchestrator",
            galaxy,
            name = %name,
            tier = ?config.tier,
            seed = config.seed,
            "galaxy generation started"
        );

        let mut step_names = vec![
            STEP_STAR_FIELD,
            STEP_PLANETARY_SYSTEMS,
            STEP_SECTOR_GRID,
            STEP_WARP_GATE_NETWORK,
        ];
        if config.include_mirror {
            step_names.push(STEP_MIRROR_UNIVERSE);
        }

        let mut steps: Vec<StepReport> = Vec::with_capacity(step_names.len());
        let mut context = StepContext::new();
        let mut mirror_galaxy: Option<GalaxyId> = None;

        for (index, &step_name) in step_names.iter().enumerate() {
            self.state = RunState::Running(index);
            let percent = (index * 100 / step_names.len()) as u8;
            self.progress.on_progress(step_name, percent);

            let mut metrics = GenerationMetrics::new();
            let outcome = self.run_step(
                step_name,
                galaxy,
                config,
                &mut rng,
                &mut metrics,
                &mut context,
                &mut mirror_galaxy,
            );
            metrics.complete();

            match outcome {
                Ok(()) => {
                    tracing::info!(
                        target: "galaxy::orchestrator",
                        galaxy,
                        step = step_name,
                        elapsed_ms = metrics.elapsed_ms(),
                        "step completed"
                    );
                    steps.push(StepReport::success(step_name, &metrics));
                }
                Err(err) => {
                    tracing::error!(
                        target: "galaxy::orchestrator",
                        galaxy,
                        step = step_name,
                        error = %err,
                        "step failed, cleaning up partial galaxy"
                    );
                    steps.push(StepReport::failure(step_name, &metrics, err.to_string()));
                    self.cleanup(galaxy, mirror_galaxy);
                    self.state = RunState::Failed;
                    total.complete();
                    return GenerationReport {
                        success: false,
                        galaxy: self.summary(galaxy),
                        mirror_galaxy: None,
                        steps,
                        statistics: None,
                        error: Some(err.to_string()),
                        total_elapsed_ms: total.elapsed_ms(),
                    };
                }
            }
        }

        if let Err(err) = self.store.set_galaxy_status(galaxy, GalaxyStatus::Active) {
            steps.push(StepReport::failure(
                "finalize",
                &GenerationMetrics::new(),
                err.to_string(),
            ));
            self.cleanup(galaxy, mirror_galaxy);
            self.state = RunState::Failed;
            total.complete();
            return GenerationReport {
                success: false,
                galaxy: self.summary(galaxy),
                mirror_galaxy: None,
                steps,
                statistics: None,
                error: Some(err.to_string()),
                total_elapsed_ms: total.elapsed_ms(),
            };
        }

        self.progress.on_progress("completed", 100);
        self.state = RunState::Completed;
        total.complete();

        let statistics = self.store.galaxy_statistics(galaxy).ok();
        tracing::info!(
            target: "galaxy::orchestrator",
            galaxy,
            elapsed_ms = total.elapsed_ms(),
            "galaxy generation completed"
        );

        GenerationReport {
            success: true,
            galaxy: self.summary(galaxy),
            mirror_galaxy: mirror_galaxy.and_then(|id| self.summary(id)),
            steps,
            statistics,
            error: None,
            total_elapsed_ms: total.elapsed_ms(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &mut self,
        step: &'static str,
        galaxy: GalaxyId,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        metrics: &mut GenerationMetrics,
        context: &mut StepContext,
        mirror_galaxy: &mut Option<GalaxyId>,
    ) -> Result<(), GenerationError> {
        match step {
            STEP_STAR_FIELD => self.star_field_step(galaxy, config, rng, metrics, context),
            STEP_PLANETARY_SYSTEMS => self.planetary_step(galaxy, config, rng, metrics, context),
            STEP_SECTOR_GRID => self.sector_step(galaxy, config, metrics),
            STEP_WARP_GATE_NETWORK => self.gate_step(galaxy, config, rng, metrics),
            STEP_MIRROR_UNIVERSE => {
                self.mirror_step(galaxy, config, rng, metrics, mirror_galaxy)
            }
            other => Err(GenerationError::Generation {
                step: "pipeline",
                message: format!("unknown pipeline step {other}"),
            }),
        }
    }

    fn star_field_step(
        &mut self,
        galaxy: GalaxyId,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        metrics: &mut GenerationMetrics,
        context: &mut StepContext,
    ) -> Result<(), GenerationError> {
        let field = starfield::generate_star_field(galaxy, config, rng);
        if field.rows.is_empty() {
            return Err(GenerationError::Generation {
                step: STEP_STAR_FIELD,
                message: "no stars could be placed within the configured bounds".to_string(),
            });
        }
        if field.shortfall > 0 {
            tracing::warn!(
                target: "galaxy::orchestrator",
                galaxy,
                shortfall = field.shortfall,
                "star placement under-returned; continuing with fewer stars"
            );
        }

        let writer = BulkWriter::new(config.chunk_size);
        let inserted = writer.insert_pois(self.store, &field.rows)?;

        metrics.set_count("core_stars", field.core_count as u64);
        metrics.set_count("outer_stars", field.outer_count as u64);
        metrics.set_count("placement_shortfall", field.shortfall as u64);
        metrics.set_count("stars_inserted", inserted as u64);
        context.insert("star_count".to_string(), serde_json::json!(inserted));
        Ok(())
    }

    fn planetary_step(
        &mut self,
        galaxy: GalaxyId,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        metrics: &mut GenerationMetrics,
        context: &mut StepContext,
    ) -> Result<(), GenerationError> {
        let stars = self.store.load_region_star_names(galaxy, RegionKind::Outer)?;
        let rows = planets::generate_planetary_systems(galaxy, &stars, rng);

        let writer = BulkWriter::new(config.chunk_size);
        let inserted = writer.insert_pois(self.store, &rows)?;

        metrics.set_count("stars_processed", stars.len() as u64);
        metrics.set_count("bodies_inserted", inserted as u64);
        context.insert("planetary_bodies".to_string(), serde_json::json!(inserted));
        Ok(())
    }

    fn sector_step(
        &mut self,
        galaxy: GalaxyId,
        config: &GenerationConfig,
        metrics: &mut GenerationMetrics,
    ) -> Result<(), GenerationError> {
        let rows =
            sectors::generate_sector_grid(galaxy, config.width, config.height, config.sector_grid_size);

        let writer = BulkWriter::new(config.chunk_size);
        let inserted = writer.insert_sectors(self.store, &rows)?;
        let assigned = self
            .store
            .assign_poi_sectors(galaxy, config.sector_grid_size)?;

        metrics.set_count("sectors_created", inserted as u64);
        metrics.set_count("pois_assigned", assigned as u64);
        Ok(())
    }

    fn gate_step(
        &mut self,
        galaxy: GalaxyId,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        metrics: &mut GenerationMetrics,
    ) -> Result<(), GenerationError> {
        let writer = BulkWriter::new(config.chunk_size);

        // Core network: inhabited systems only. Uninhabited stars stay
        // isolated to reward exploration.
        let inhabited = self.store.load_inhabited_stars(galaxy)?;
        metrics.set_count("inhabited_stars", inhabited.len() as u64);

        let core_rows = gates::build_gate_network(
            galaxy,
            &inhabited,
            &GateConfig {
                adjacency_threshold: config.adjacency_threshold,
                max_gates_per_system: config.max_gates_per_system,
                status: GateStatus::Active,
                hidden: false,
            },
        );
        let core_inserted = writer.insert_gates(self.store, &core_rows)?;
        metrics.set_count("core_gates", core_inserted as u64);

        // Frontier network: sparse dormant gates awaiting activation.
        let outer = self.store.load_region_stars(galaxy, RegionKind::Outer)?;
        let outer_rows = gates::build_gate_network(
            galaxy,
            &outer,
            &GateConfig {
                adjacency_threshold: config.outer_gate_max_distance,
                max_gates_per_system: config.outer_gates_per_system,
                status: GateStatus::Dormant,
                hidden: true,
            },
        );
        let outer_inserted = writer.insert_gates(self.store, &outer_rows)?;
        metrics.set_count("dormant_gates", outer_inserted as u64);

        // Hide a sampled fraction of the active network.
        let keys = self.store.load_gate_keys(galaxy, GateStatus::Active)?;
        let hidden = gates::sample_hidden_keys(&keys, config.hidden_gate_fraction, rng);
        let marked = self.store.mark_gates_hidden(galaxy, &hidden)?;
        metrics.set_count("gates_marked_hidden", marked as u64);

        Ok(())
    }

    /// Generate the paired satellite galaxy: same structure recipe from a
    /// derived seed, denser gate network, activated on completion.
    fn mirror_step(
        &mut self,
        prime: GalaxyId,
        config: &GenerationConfig,
        rng: &mut SeededRng,
        metrics: &mut GenerationMetrics,
        mirror_galaxy: &mut Option<GalaxyId>,
    ) -> Result<(), GenerationError> {
        let mirror_config = config.mirror_config();
        let mut mirror_rng = rng.derive(MIRROR_SEED_SALT);

        let prime_name = self.store.load_galaxy(prime)?.name;
        let mirror = self.store.create_galaxy(GalaxyRecord {
            name: format!("{prime_name} (Mirror)"),
            tier: mirror_config.tier,
            width: mirror_config.width,
            height: mirror_config.height,
            seed: mirror_rng.seed(),
            status: GalaxyStatus::Generating,
            mirror_of: Some(prime),
        })?;
        *mirror_galaxy = Some(mirror);

        let field = starfield::generate_star_field(mirror, &mirror_config, &mut mirror_rng);
        let writer = BulkWriter::new(mirror_config.chunk_size);
        let stars_inserted = writer.insert_pois(self.store, &field.rows)?;
        metrics.set_count("mirror_stars", stars_inserted as u64);

        let sector_rows = sectors::generate_sector_grid(
            mirror,
            mirror_config.width,
            mirror_config.height,
            mirror_config.sector_grid_size,
        );
        let sectors_inserted = writer.insert_sectors(self.store, &sector_rows)?;
        self.store
            .assign_poi_sectors(mirror, mirror_config.sector_grid_size)?;
        metrics.set_count("mirror_sectors", sectors_inserted as u64);

        let inhabited = self.store.load_inhabited_stars(mirror)?;
        let gate_rows = gates::build_gate_network(
            mirror,
            &inhabited,
            &GateConfig {
                adjacency_threshold: mirror_config.adjacency_threshold,
                max_gates_per_system: mirror_config.max_gates_per_system,
                status: GateStatus::Active,
                hidden: false,
            },
        );
        let gates_inserted = writer.insert_gates(self.store, &gate_rows)?;
        metrics.set_count("mirror_gates", gates_inserted as u64);

        let keys = self.store.load_gate_keys(mirror, GateStatus::Active)?;
        let hidden =
            gates::sample_hidden_keys(&keys, mirror_config.hidden_gate_fraction, &mut mirror_rng);
        self.store.mark_gates_hidden(mirror, &hidden)?;

        self.store.set_galaxy_status(mirror, GalaxyStatus::Active)?;
        Ok(())
    }

    /// Delete everything written for the run, satellite first, each
    /// entity family in reverse dependency order. Cleanup failures are
    /// logged and swallowed — the original step error is what surfaces.
    fn cleanup(&mut self, galaxy: GalaxyId, mirror_galaxy: Option<GalaxyId>) {
        self.state = RunState::CleaningUp;
        for id in mirror_galaxy.into_iter().chain(std::iter::once(galaxy)) {
            for kind in EntityKind::ORDERED.iter().rev() {
                match self.store.delete_galaxy_entities(id, *kind) {
                    Ok(removed) => {
                        tracing::debug!(
                            target: "galaxy::orchestrator",
                            galaxy = id,
                            kind = ?kind,
                            removed,
                            "cleanup removed entities"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "galaxy::orchestrator",
                            galaxy = id,
                            kind = ?kind,
                            error = %err,
                            "cleanup could not remove entities"
                        );
                    }
                }
            }
            if let Err(err) = self.store.set_galaxy_status(id, GalaxyStatus::Failed) {
                tracing::warn!(
                    target: "galaxy::orchestrator",
                    galaxy = id,
                    error = %err,
                    "cleanup could not mark galaxy failed"
                );
            }
        }
    }

    fn summary(&self, galaxy: GalaxyId) -> Option<GalaxySummary> {
        let record = self.store.load_galaxy(galaxy).ok()?;
        Some(GalaxySummary {
            id: galaxy,
            name: record.name,
            tier: record.tier,
            width: record.width,
            height: record.height,
            status: record.status,
        })
    }
}

/// Convenience: run one generation against a store with default progress.
pub fn generate_galaxy<S: GalaxyStore>(
    store: &mut S,
    config: &GenerationConfig,
) -> GenerationReport {
    GenerationOrchestrator::new(store).generate(config)
}

const NAME_PREFIXES: [&str; 8] = [
    "Crimson", "Silent", "Outer", "Veiled", "Radiant", "Hollow", "Drifting", "Ashen",
];

const NAME_SUFFIXES: [&str; 8] = [
    "Expanse", "Reach", "Verge", "Drift", "Cluster", "Spiral", "Frontier", "Deep",
];

fn generate_galaxy_name(rng: &mut SeededRng) -> String {
    format!(
        "{} {} {}",
        NAME_PREFIXES[rng.index(NAME_PREFIXES.len())],
        NAME_SUFFIXES[rng.index(NAME_SUFFIXES.len())],
        rng.int_in(100, 999)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use galaxy_schema::SizeTier;

    fn quick_config(seed: u64) -> GenerationConfig {
        let mut config = GenerationConfig::from_tier(SizeTier::Small, seed);
        config.include_mirror = false;
        config
    }

    #[test]
    fn invalid_config_fails_fast_without_persisting() {
        let mut store = MemoryStore::new();
        let mut config = quick_config(1);
        config.hidden_gate_fraction = 2.0;

        let report = generate_galaxy(&mut store, &config);
        assert!(!report.success);
        assert!(report.steps.is_empty());
        assert!(report.galaxy.is_none());
        assert!(store.active_galaxies().is_empty());
    }

    #[test]
    fn successful_run_reports_every_step() {
        let mut store = MemoryStore::new();
        let report = generate_galaxy(&mut store, &quick_config(42));

        assert!(report.success, "error: {:?}", report.error);
        let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                STEP_STAR_FIELD,
                STEP_PLANETARY_SYSTEMS,
                STEP_SECTOR_GRID,
                STEP_WARP_GATE_NETWORK
            ]
        );
        assert!(report.steps.iter().all(|s| s.success));
        assert_eq!(
            report.galaxy.unwrap().status,
            galaxy_schema::GalaxyStatus::Active
        );
    }

    #[test]
    fn progress_events_cover_the_pipeline() {
        use std::cell::RefCell;

        struct Recorder(RefCell<Vec<(String, u8)>>);
        impl ProgressSink for Recorder {
            fn on_progress(&self, step: &str, percent: u8) {
                self.0.borrow_mut().push((step.to_string(), percent));
            }
        }

        let mut store = MemoryStore::new();
        let recorder = Recorder(RefCell::new(Vec::new()));
        let config = quick_config(7);
        GenerationOrchestrator::new(&mut store)
            .with_progress(&recorder)
            .generate(&config);

        let events = recorder.0.into_inner();
        assert_eq!(events.first().unwrap().0, STEP_STAR_FIELD);
        assert_eq!(events.last().unwrap(), &("completed".to_string(), 100));
        let percents: Vec<u8> = events.iter().map(|(_, p)| *p).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn generated_names_are_deterministic() {
        let mut a = SeededRng::new(crate::rng::EngineKind::ChaCha8, 4);
        let mut b = SeededRng::new(crate::rng::EngineKind::ChaCha8, 4);
        assert_eq!(generate_galaxy_name(&mut a), generate_galaxy_name(&mut b));
    }
}
