//! Shared helpers for the cross-component tests.

use galaxy_core::persist::{GalaxyStore, MemoryStore, StoreError};
use galaxy_core::GenerationConfig;
use galaxy_schema::{
    EntityKind, GalaxyId, GalaxyRecord, GalaxyStatistics, GalaxyStatus, GateKey, GateRow,
    GateStatus, NamedStar, PoiRow, RegionKind, SectorRow, SizeTier, Star,
};

/// A small-tier config with the mirror pass disabled, for quick runs.
pub fn small_config(seed: u64) -> GenerationConfig {
    let mut config = GenerationConfig::from_tier(SizeTier::Small, seed);
    config.include_mirror = false;
    config
}

/// Store wrapper that injects a backend failure into the nth call of one
/// named mutating operation, delegating everything else to [`MemoryStore`].
pub struct FailingStore {
    pub inner: MemoryStore,
    fail_op: &'static str,
    successes_before_failure: usize,
}

impl FailingStore {
    pub fn new(fail_op: &'static str, successes_before_failure: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_op,
            successes_before_failure,
        }
    }

    fn trip(&mut self, op: &'static str) -> Result<(), StoreError> {
        if op == self.fail_op {
            if self.successes_before_failure == 0 {
                return Err(StoreError::Backend(format!("injected failure in {op}")));
            }
            self.successes_before_failure -= 1;
        }
        Ok(())
    }
}

impl GalaxyStore for FailingStore {
    fn create_galaxy(&mut self, record: GalaxyRecord) -> Result<GalaxyId, StoreError> {
        self.trip("create_galaxy")?;
        self.inner.create_galaxy(record)
    }

    fn set_galaxy_status(
        &mut self,
        galaxy: GalaxyId,
        status: GalaxyStatus,
    ) -> Result<(), StoreError> {
        self.trip("set_galaxy_status")?;
        self.inner.set_galaxy_status(galaxy, status)
    }

    fn galaxy_status(&self, galaxy: GalaxyId) -> Result<GalaxyStatus, StoreError> {
        self.inner.galaxy_status(galaxy)
    }

    fn load_galaxy(&self, galaxy: GalaxyId) -> Result<GalaxyRecord, StoreError> {
        self.inner.load_galaxy(galaxy)
    }

    fn insert_pois(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError> {
        self.trip("insert_pois")?;
        self.inner.insert_pois(rows)
    }

    fn insert_pois_raw(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError> {
        self.trip("insert_pois_raw")?;
        self.inner.insert_pois_raw(rows)
    }

    fn insert_sectors(&mut self, rows: &[SectorRow]) -> Result<usize, StoreError> {
        self.trip("insert_sectors")?;
        self.inner.insert_sectors(rows)
    }

    fn insert_gates_ignoring_conflicts(&mut self, rows: &[GateRow]) -> Result<usize, StoreError> {
        self.trip("insert_gates_ignoring_conflicts")?;
        self.inner.insert_gates_ignoring_conflicts(rows)
    }

    fn assign_poi_sectors(&mut self, galaxy: GalaxyId, grid_size: u32) -> Result<usize, StoreError> {
        self.trip("assign_poi_sectors")?;
        self.inner.assign_poi_sectors(galaxy, grid_size)
    }

    fn mark_gates_hidden(&mut self, galaxy: GalaxyId, keys: &[GateKey]) -> Result<usize, StoreError> {
        self.trip("mark_gates_hidden")?;
        self.inner.mark_gates_hidden(galaxy, keys)
    }

    fn load_inhabited_stars(&self, galaxy: GalaxyId) -> Result<Vec<Star>, StoreError> {
        self.inner.load_inhabited_stars(galaxy)
    }

    fn load_region_stars(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<Star>, StoreError> {
        self.inner.load_region_stars(galaxy, region)
    }

    fn load_region_star_names(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<NamedStar>, StoreError> {
        self.inner.load_region_star_names(galaxy, region)
    }

    fn load_gate_keys(
        &self,
        galaxy: GalaxyId,
        status: GateStatus,
    ) -> Result<Vec<GateKey>, StoreError> {
        self.inner.load_gate_keys(galaxy, status)
    }

    fn galaxy_statistics(&self, galaxy: GalaxyId) -> Result<GalaxyStatistics, StoreError> {
        self.inner.galaxy_statistics(galaxy)
    }

    fn delete_galaxy_entities(
        &mut self,
        galaxy: GalaxyId,
        kind: EntityKind,
    ) -> Result<usize, StoreError> {
        // Cleanup must keep working while the injected failure is live.
        self.inner.delete_galaxy_entities(galaxy, kind)
    }
}
