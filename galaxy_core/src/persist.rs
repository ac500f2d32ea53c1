//! Persistence port and bulk write path.
//!
//! The pipeline never talks to a concrete database. It writes through
//! [`GalaxyStore`], a narrow port offering chunked batch operations, and
//! reads back only the small projections it needs (inhabited stars, gate
//! keys, entity counts). [`BulkWriter`] sits in front of the port and
//! handles chunking plus the high-volume raw path. [`MemoryStore`] is the
//! reference implementation used by tests and the report binary; it
//! enforces the canonical-tuple unique constraint the way a real schema
//! would.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use galaxy_schema::{
    EntityKind, GalaxyId, GalaxyRecord, GalaxyStatistics, GalaxyStatus, GateKey, GateRow,
    GateStatus, NamedStar, PoiId, PoiRow, RegionKind, SectorId, SectorRow, Star,
};

/// Row count above which batches take the raw insert path.
pub const RAW_PATH_THRESHOLD: usize = 5000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("galaxy {0} not found")]
    GalaxyNotFound(GalaxyId),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// The persistence port. One implementation per backing store; the
/// pipeline only ever sees this trait.
pub trait GalaxyStore {
    fn create_galaxy(&mut self, record: GalaxyRecord) -> Result<GalaxyId, StoreError>;
    fn set_galaxy_status(&mut self, galaxy: GalaxyId, status: GalaxyStatus)
        -> Result<(), StoreError>;
    fn galaxy_status(&self, galaxy: GalaxyId) -> Result<GalaxyStatus, StoreError>;
    fn load_galaxy(&self, galaxy: GalaxyId) -> Result<GalaxyRecord, StoreError>;

    /// Parameterized batch insert.
    fn insert_pois(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError>;
    /// Raw-statement batch insert, taken for very large volumes.
    fn insert_pois_raw(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError>;
    fn insert_sectors(&mut self, rows: &[SectorRow]) -> Result<usize, StoreError>;
    /// Insert gates, silently skipping rows whose canonical key already
    /// exists. Retry-safe.
    fn insert_gates_ignoring_conflicts(&mut self, rows: &[GateRow]) -> Result<usize, StoreError>;

    /// Assign every POI to the sector covering its coordinates.
    fn assign_poi_sectors(&mut self, galaxy: GalaxyId, grid_size: u32) -> Result<usize, StoreError>;
    fn mark_gates_hidden(&mut self, galaxy: GalaxyId, keys: &[GateKey]) -> Result<usize, StoreError>;

    fn load_inhabited_stars(&self, galaxy: GalaxyId) -> Result<Vec<Star>, StoreError>;
    fn load_region_stars(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<Star>, StoreError>;
    fn load_region_star_names(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<NamedStar>, StoreError>;
    fn load_gate_keys(
        &self,
        galaxy: GalaxyId,
        status: GateStatus,
    ) -> Result<Vec<GateKey>, StoreError>;
    fn galaxy_statistics(&self, galaxy: GalaxyId) -> Result<GalaxyStatistics, StoreError>;

    /// Remove every row of one entity family for a galaxy. Used by
    /// failure cleanup, walking families in reverse dependency order.
    fn delete_galaxy_entities(
        &mut self,
        galaxy: GalaxyId,
        kind: EntityKind,
    ) -> Result<usize, StoreError>;
}

/// Chunked write front-end over a [`GalaxyStore`].
///
/// Splits batches by the configured chunk size; batches above
/// [`RAW_PATH_THRESHOLD`] rows switch to the store's raw insert path.
#[derive(Debug, Clone, Copy)]
pub struct BulkWriter {
    chunk_size: usize,
}

impl BulkWriter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn insert_pois<S: GalaxyStore + ?Sized>(
        &self,
        store: &mut S,
        rows: &[PoiRow],
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut inserted = 0;
        if rows.len() > RAW_PATH_THRESHOLD {
            for chunk in rows.chunks(self.chunk_size) {
                inserted += store.insert_pois_raw(chunk)?;
            }
        } else {
            for chunk in rows.chunks(self.chunk_size) {
                inserted += store.insert_pois(chunk)?;
            }
        }
        Ok(inserted)
    }

    pub fn insert_sectors<S: GalaxyStore + ?Sized>(
        &self,
        store: &mut S,
        rows: &[SectorRow],
    ) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for chunk in rows.chunks(self.chunk_size) {
            inserted += store.insert_sectors(chunk)?;
        }
        Ok(inserted)
    }

    pub fn insert_gates<S: GalaxyStore + ?Sized>(
        &self,
        store: &mut S,
        rows: &[GateRow],
    ) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for chunk in rows.chunks(self.chunk_size) {
            inserted += store.insert_gates_ignoring_conflicts(chunk)?;
        }
        Ok(inserted)
    }
}

/// Write-path counters kept by [`MemoryStore`], so tests can assert which
/// path a volume took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub parameterized_batches: u64,
    pub raw_batches: u64,
}

#[derive(Debug, Clone)]
pub struct StoredPoi {
    pub id: PoiId,
    pub sector: Option<SectorId>,
    pub row: PoiRow,
}

#[derive(Debug, Clone)]
pub struct StoredSector {
    pub id: SectorId,
    pub row: SectorRow,
}

#[derive(Debug, Default)]
struct GalaxyData {
    record: Option<GalaxyRecord>,
    pois: Vec<StoredPoi>,
    sectors: Vec<StoredSector>,
    gates: Vec<GateRow>,
    gate_keys: HashSet<GateKey>,
}

/// In-memory reference store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_galaxy_id: GalaxyId,
    next_poi_id: PoiId,
    next_sector_id: SectorId,
    galaxies: BTreeMap<GalaxyId, GalaxyData>,
    pub write_stats: WriteStats,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn galaxy_record(&self, galaxy: GalaxyId) -> Option<&GalaxyRecord> {
        self.galaxies.get(&galaxy).and_then(|g| g.record.as_ref())
    }

    /// Galaxies visible in an "active" listing.
    pub fn active_galaxies(&self) -> Vec<GalaxyId> {
        self.galaxies
            .iter()
            .filter(|(_, data)| {
                data.record
                    .as_ref()
                    .is_some_and(|r| r.status == GalaxyStatus::Active)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn pois(&self, galaxy: GalaxyId) -> &[StoredPoi] {
        self.galaxies
            .get(&galaxy)
            .map(|g| g.pois.as_slice())
            .unwrap_or(&[])
    }

    pub fn sectors(&self, galaxy: GalaxyId) -> &[StoredSector] {
        self.galaxies
            .get(&galaxy)
            .map(|g| g.sectors.as_slice())
            .unwrap_or(&[])
    }

    pub fn gates(&self, galaxy: GalaxyId) -> &[GateRow] {
        self.galaxies
            .get(&galaxy)
            .map(|g| g.gates.as_slice())
            .unwrap_or(&[])
    }

    pub fn entity_count(&self, galaxy: GalaxyId, kind: EntityKind) -> usize {
        let Some(data) = self.galaxies.get(&galaxy) else {
            return 0;
        };
        match kind {
            EntityKind::Pois => data.pois.len(),
            EntityKind::Sectors => data.sectors.len(),
            EntityKind::Gates => data.gates.len(),
        }
    }

    fn data(&self, galaxy: GalaxyId) -> Result<&GalaxyData, StoreError> {
        self.galaxies
            .get(&galaxy)
            .filter(|g| g.record.is_some())
            .ok_or(StoreError::GalaxyNotFound(galaxy))
    }

    fn data_mut(&mut self, galaxy: GalaxyId) -> Result<&mut GalaxyData, StoreError> {
        self.galaxies
            .get_mut(&galaxy)
            .filter(|g| g.record.is_some())
            .ok_or(StoreError::GalaxyNotFound(galaxy))
    }

    fn store_pois(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError> {
        for row in rows {
            // Validate the whole chunk up front; a real store would
            // reject the statement atomically.
            self.data(row.galaxy_id)?;
        }
        for row in rows {
            self.next_poi_id += 1;
            let id = self.next_poi_id;
            let data = self
                .galaxies
                .get_mut(&row.galaxy_id)
                .expect("validated above");
            data.pois.push(StoredPoi {
                id,
                sector: None,
                row: row.clone(),
            });
        }
        Ok(rows.len())
    }
}

impl GalaxyStore for MemoryStore {
    fn create_galaxy(&mut self, record: GalaxyRecord) -> Result<GalaxyId, StoreError> {
        self.next_galaxy_id += 1;
        let id = self.next_galaxy_id;
        self.galaxies.insert(
            id,
            GalaxyData {
                record: Some(record),
                ..GalaxyData::default()
            },
        );
        Ok(id)
    }

    fn set_galaxy_status(
        &mut self,
        galaxy: GalaxyId,
        status: GalaxyStatus,
    ) -> Result<(), StoreError> {
        let data = self.data_mut(galaxy)?;
        if let Some(record) = data.record.as_mut() {
            record.status = status;
        }
        Ok(())
    }

    fn galaxy_status(&self, galaxy: GalaxyId) -> Result<GalaxyStatus, StoreError> {
        Ok(self.data(galaxy)?.record.as_ref().expect("filtered").status)
    }

    fn load_galaxy(&self, galaxy: GalaxyId) -> Result<GalaxyRecord, StoreError> {
        Ok(self
            .data(galaxy)?
            .record
            .as_ref()
            .expect("filtered")
            .clone())
    }

    fn insert_pois(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError> {
        self.write_stats.parameterized_batches += 1;
        self.store_pois(rows)
    }

    fn insert_pois_raw(&mut self, rows: &[PoiRow]) -> Result<usize, StoreError> {
        self.write_stats.raw_batches += 1;
        self.store_pois(rows)
    }

    fn insert_sectors(&mut self, rows: &[SectorRow]) -> Result<usize, StoreError> {
        for row in rows {
            self.data(row.galaxy_id)?;
        }
        for row in rows {
            self.next_sector_id += 1;
            let id = self.next_sector_id;
            let data = self
                .galaxies
                .get_mut(&row.galaxy_id)
                .expect("validated above");
            data.sectors.push(StoredSector {
                id,
                row: row.clone(),
            });
        }
        Ok(rows.len())
    }

    fn insert_gates_ignoring_conflicts(&mut self, rows: &[GateRow]) -> Result<usize, StoreError> {
        for row in rows {
            self.data(row.galaxy_id)?;
        }
        let mut inserted = 0;
        for row in rows {
            let data = self
                .galaxies
                .get_mut(&row.galaxy_id)
                .expect("validated above");
            if data.gate_keys.insert(row.key) {
                data.gates.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn assign_poi_sectors(&mut self, galaxy: GalaxyId, grid_size: u32) -> Result<usize, StoreError> {
        let data = self.data_mut(galaxy)?;
        let record = data.record.as_ref().expect("filtered");
        let sector_width = f64::from(record.width) / f64::from(grid_size);
        let sector_height = f64::from(record.height) / f64::from(grid_size);
        let max_index = grid_size - 1;

        let by_grid: HashMap<(u32, u32), SectorId> = data
            .sectors
            .iter()
            .map(|s| ((s.row.grid_x, s.row.grid_y), s.id))
            .collect();

        let mut assigned = 0;
        for poi in &mut data.pois {
            let grid_x = ((f64::from(poi.row.x) / sector_width).floor() as u32).min(max_index);
            let grid_y = ((f64::from(poi.row.y) / sector_height).floor() as u32).min(max_index);
            if let Some(sector) = by_grid.get(&(grid_x, grid_y)) {
                poi.sector = Some(*sector);
                assigned += 1;
            }
        }
        Ok(assigned)
    }

    fn mark_gates_hidden(&mut self, galaxy: GalaxyId, keys: &[GateKey]) -> Result<usize, StoreError> {
        let data = self.data_mut(galaxy)?;
        let wanted: HashSet<&GateKey> = keys.iter().collect();
        let mut updated = 0;
        for gate in &mut data.gates {
            if wanted.contains(&gate.key) && !gate.hidden {
                gate.hidden = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn load_inhabited_stars(&self, galaxy: GalaxyId) -> Result<Vec<Star>, StoreError> {
        Ok(self
            .data(galaxy)?
            .pois
            .iter()
            .filter(|p| p.row.kind.is_star() && p.row.inhabited)
            .map(|p| Star {
                id: p.id,
                x: p.row.x,
                y: p.row.y,
                inhabited: true,
            })
            .collect())
    }

    fn load_region_stars(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<Star>, StoreError> {
        Ok(self
            .data(galaxy)?
            .pois
            .iter()
            .filter(|p| p.row.kind.is_star() && p.row.region == region)
            .map(|p| Star {
                id: p.id,
                x: p.row.x,
                y: p.row.y,
                inhabited: p.row.inhabited,
            })
            .collect())
    }

    fn load_region_star_names(
        &self,
        galaxy: GalaxyId,
        region: RegionKind,
    ) -> Result<Vec<NamedStar>, StoreError> {
        Ok(self
            .data(galaxy)?
            .pois
            .iter()
            .filter(|p| p.row.kind.is_star() && p.row.region == region)
            .map(|p| NamedStar {
                id: p.id,
                name: p.row.name.clone(),
                x: p.row.x,
                y: p.row.y,
            })
            .collect())
    }

    fn load_gate_keys(
        &self,
        galaxy: GalaxyId,
        status: GateStatus,
    ) -> Result<Vec<GateKey>, StoreError> {
        Ok(self
            .data(galaxy)?
            .gates
            .iter()
            .filter(|g| g.status == status)
            .map(|g| g.key)
            .collect())
    }

    fn galaxy_statistics(&self, galaxy: GalaxyId) -> Result<GalaxyStatistics, StoreError> {
        let data = self.data(galaxy)?;
        let mut stats = GalaxyStatistics {
            total_pois: data.pois.len() as u64,
            sectors: data.sectors.len() as u64,
            gates: data.gates.len() as u64,
            ..GalaxyStatistics::default()
        };
        for poi in &data.pois {
            if poi.row.kind.is_star() {
                stats.total_stars += 1;
                match poi.row.region {
                    RegionKind::Core => stats.core_stars += 1,
                    RegionKind::Outer => stats.outer_stars += 1,
                }
                if poi.row.inhabited {
                    stats.inhabited_stars += 1;
                }
            } else {
                stats.planetary_bodies += 1;
            }
        }
        for gate in &data.gates {
            match gate.status {
                GateStatus::Active => stats.active_gates += 1,
                GateStatus::Dormant => stats.dormant_gates += 1,
            }
            if gate.hidden {
                stats.hidden_gates += 1;
            }
        }
        Ok(stats)
    }

    fn delete_galaxy_entities(
        &mut self,
        galaxy: GalaxyId,
        kind: EntityKind,
    ) -> Result<usize, StoreError> {
        let data = self.data_mut(galaxy)?;
        let removed = match kind {
            EntityKind::Pois => std::mem::take(&mut data.pois).len(),
            EntityKind::Sectors => std::mem::take(&mut data.sectors).len(),
            EntityKind::Gates => {
                data.gate_keys.clear();
                std::mem::take(&mut data.gates).len()
            }
        };
        Ok(removed)
    }
}
