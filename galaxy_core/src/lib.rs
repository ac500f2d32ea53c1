//! Galaxy structure generation engine.
//!
//! Produces the spatial and connectivity skeleton of a game galaxy:
//! star coordinates placed by one of eight interchangeable distribution
//! methods, a sector grid overlay, planetary detail for the frontier, and
//! a deduplicated warp-gate network over inhabited systems — all driven
//! by a deterministic seeded engine and persisted through a narrow store
//! port via [`GenerationOrchestrator`].

pub mod config;
pub mod gates;
pub mod metrics;
pub mod persist;
pub mod planets;
pub mod points;
pub mod rng;
pub mod sectors;
pub mod spatial;
pub mod starfield;

mod orchestrator;

pub use config::{ConfigError, GenerationConfig};
pub use gates::{build_gate_network, fuel_cost, sample_hidden_keys, GateConfig};
pub use metrics::{GalaxySummary, GenerationMetrics, GenerationReport, StepReport};
pub use orchestrator::{
    generate_galaxy, GenerationError, GenerationOrchestrator, NoProgress, ProgressSink, RunState,
    STEP_MIRROR_UNIVERSE, STEP_PLANETARY_SYSTEMS, STEP_SECTOR_GRID, STEP_STAR_FIELD,
    STEP_WARP_GATE_NETWORK,
};
pub use persist::{BulkWriter, GalaxyStore, MemoryStore, StoreError};
pub use points::{
    generator_for, DistributionMethod, GeneratorOptions, PointConfig, PointGenerator,
    SampledPoints,
};
pub use rng::{EngineKind, SeededRng};
pub use spatial::{GridItem, Neighbor, SpatialGrid};
