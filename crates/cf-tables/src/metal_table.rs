//! Per-species metal-line cooling grids.
//!
//! Each snapshot file is a flat little-endian `f32` array laid out as
//! `[species][density-bin][temperature-bin]` and holds the normalized cooling
//! rate `Λ_i / nH^2` [erg cm^3 s^-1] of species `i` at solar abundance, at the
//! table's own electron fraction. Snapshots exist at discrete redshifts; the
//! two bracketing the active redshift are kept in memory.

use crate::error::{TableError, TableResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dimensions and axes of the metal cooling grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetalGrid {
    pub n_species: usize,
    pub n_density: usize,
    pub n_temperature: usize,
    pub log_nh_min: f64,
    pub log_nh_max: f64,
    pub log_t_min: f64,
    pub log_t_max: f64,
}

impl Default for MetalGrid {
    fn default() -> Self {
        // C, N, O, Ne, Mg, Si, S, Ca, Fe
        Self {
            n_species: 9,
            n_density: 71,
            n_temperature: 176,
            log_nh_min: -8.0,
            log_nh_max: 6.0,
            log_t_min: 2.0,
            log_t_max: 9.0,
        }
    }
}

impl MetalGrid {
    pub fn len(&self) -> usize {
        self.n_species * self.n_density * self.n_temperature
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len() * std::mem::size_of::<f32>()
    }

    pub fn validate(&self) -> TableResult<()> {
        if self.n_species == 0 || self.n_density < 2 || self.n_temperature < 2 {
            return Err(TableError::InvalidSetup {
                what: format!(
                    "metal grid needs >=1 species and >=2 bins per axis, got {}x{}x{}",
                    self.n_species, self.n_density, self.n_temperature
                ),
            });
        }
        if !(self.log_nh_min < self.log_nh_max) || !(self.log_t_min < self.log_t_max) {
            return Err(TableError::InvalidSetup {
                what: "metal grid axes must be increasing".to_string(),
            });
        }
        Ok(())
    }

    fn offset(&self, species: usize, i_n: usize, i_t: usize) -> usize {
        (species * self.n_density + i_n) * self.n_temperature + i_t
    }

    /// Lower bin index and upper-bin weight along one axis, clamped.
    fn axis_cell(x: f64, min: f64, max: f64, n: usize) -> (usize, f64) {
        let step = (max - min) / (n - 1) as f64;
        let t = ((x - min) / step).clamp(0.0, (n - 1) as f64);
        if !t.is_finite() {
            return (0, 0.0);
        }
        let i = (t.floor() as usize).min(n - 2);
        (i, t - i as f64)
    }
}

/// Where to find the snapshot for one redshift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalSnapshotSource {
    pub redshift: f64,
    pub path: PathBuf,
}

/// Metal cooling grid at a single redshift.
#[derive(Debug, Clone)]
pub struct MetalSnapshot {
    redshift: f64,
    data: Vec<f32>,
}

impl MetalSnapshot {
    pub fn from_values(grid: &MetalGrid, redshift: f64, data: Vec<f32>) -> TableResult<Self> {
        grid.validate()?;
        if data.len() != grid.len() {
            return Err(TableError::InvalidSetup {
                what: format!(
                    "metal snapshot has {} values, grid expects {}",
                    data.len(),
                    grid.len()
                ),
            });
        }
        Ok(Self { redshift, data })
    }

    /// Decode a snapshot; `path` is only used in error messages.
    ///
    /// The byte count must match the grid exactly.
    pub fn from_bytes(
        grid: &MetalGrid,
        redshift: f64,
        bytes: &[u8],
        path: &Path,
    ) -> TableResult<Self> {
        grid.validate()?;
        let expected = grid.byte_len();
        if bytes.len() < expected {
            return Err(TableError::ShortRead {
                path: path.to_path_buf(),
                expected,
                found: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(TableError::TrailingBytes {
                path: path.to_path_buf(),
                expected,
                found: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_values(grid, redshift, data)
    }

    pub fn from_path(grid: &MetalGrid, source: &MetalSnapshotSource) -> TableResult<Self> {
        let bytes = std::fs::read(&source.path).map_err(|e| TableError::Io {
            path: source.path.clone(),
            source: e,
        })?;
        let snapshot = Self::from_bytes(grid, source.redshift, &bytes, &source.path)?;
        tracing::debug!(
            path = %source.path.display(),
            redshift = source.redshift,
            "loaded metal cooling snapshot"
        );
        Ok(snapshot)
    }

    pub fn redshift(&self) -> f64 {
        self.redshift
    }

    /// Bilinear interpolation in (log nH, log T), clamped to the grid.
    pub fn species_rate(&self, grid: &MetalGrid, species: usize, log_nh: f64, log_t: f64) -> f64 {
        let (i_n, w_n) =
            MetalGrid::axis_cell(log_nh, grid.log_nh_min, grid.log_nh_max, grid.n_density);
        let (i_t, w_t) =
            MetalGrid::axis_cell(log_t, grid.log_t_min, grid.log_t_max, grid.n_temperature);
        let at = |a: usize, b: usize| self.data[grid.offset(species, a, b)] as f64;

        let lo = at(i_n, i_t) * (1.0 - w_t) + at(i_n, i_t + 1) * w_t;
        let hi = at(i_n + 1, i_t) * (1.0 - w_t) + at(i_n + 1, i_t + 1) * w_t;
        lo * (1.0 - w_n) + hi * w_n
    }
}

/// Pair of snapshots bracketing the active redshift.
#[derive(Debug, Clone)]
pub struct MetalCoolingTable {
    grid: MetalGrid,
    lower: MetalSnapshot,
    upper: Option<MetalSnapshot>,
    weight_upper: f64,
}

impl MetalCoolingTable {
    pub fn new(
        grid: MetalGrid,
        lower: MetalSnapshot,
        upper: Option<MetalSnapshot>,
        redshift: f64,
    ) -> TableResult<Self> {
        grid.validate()?;
        let weight_upper = match &upper {
            Some(up) if up.redshift > lower.redshift => {
                ((redshift - lower.redshift) / (up.redshift - lower.redshift)).clamp(0.0, 1.0)
            }
            Some(_) => {
                return Err(TableError::InvalidSetup {
                    what: "metal snapshots must bracket in increasing redshift".to_string(),
                });
            }
            None => 0.0,
        };
        Ok(Self {
            grid,
            lower,
            upper,
            weight_upper,
        })
    }

    /// Load the two snapshots bracketing `redshift` from `sources`.
    pub fn load(
        grid: MetalGrid,
        sources: &[MetalSnapshotSource],
        redshift: f64,
    ) -> TableResult<Self> {
        let (lo, hi) = bracket_sources(sources, redshift)?;
        let lower = MetalSnapshot::from_path(&grid, &sources[lo])?;
        let upper = hi
            .map(|i| MetalSnapshot::from_path(&grid, &sources[i]))
            .transpose()?;
        Self::new(grid, lower, upper, redshift)
    }

    /// Re-weight for a new redshift inside the current bracket.
    ///
    /// Returns `false` when `redshift` has left the bracket and the table must
    /// be reloaded.
    pub fn reweight(&mut self, redshift: f64) -> bool {
        match &self.upper {
            Some(up) if redshift >= self.lower.redshift && redshift <= up.redshift => {
                self.weight_upper =
                    (redshift - self.lower.redshift) / (up.redshift - self.lower.redshift);
                true
            }
            _ => false,
        }
    }

    pub fn grid(&self) -> &MetalGrid {
        &self.grid
    }

    /// Redshifts of the loaded snapshots.
    pub fn bracket(&self) -> (f64, Option<f64>) {
        (self.lower.redshift, self.upper.as_ref().map(|s| s.redshift))
    }

    /// Normalized solar-abundance cooling rate of one species.
    pub fn species_rate(&self, species: usize, log_nh: f64, log_t: f64) -> f64 {
        if species >= self.grid.n_species {
            return 0.0;
        }
        let lo = self.lower.species_rate(&self.grid, species, log_nh, log_t);
        match &self.upper {
            Some(up) if self.weight_upper > 0.0 => {
                let hi = up.species_rate(&self.grid, species, log_nh, log_t);
                lo + (hi - lo) * self.weight_upper
            }
            _ => lo,
        }
    }
}

/// Indices of the snapshots bracketing `redshift`.
///
/// Sources must be sorted by increasing redshift. Outside the covered range
/// the nearest snapshot is used alone.
pub fn bracket_sources(
    sources: &[MetalSnapshotSource],
    redshift: f64,
) -> TableResult<(usize, Option<usize>)> {
    if sources.is_empty() {
        return Err(TableError::InvalidSetup {
            what: "no metal cooling snapshots configured".to_string(),
        });
    }
    if sources.windows(2).any(|w| w[1].redshift <= w[0].redshift) {
        return Err(TableError::InvalidSetup {
            what: "metal snapshots must be sorted by increasing redshift".to_string(),
        });
    }
    let last = sources.len() - 1;
    if redshift <= sources[0].redshift {
        return Ok((0, None));
    }
    if redshift >= sources[last].redshift {
        return Ok((last, None));
    }
    let hi = sources.partition_point(|s| s.redshift <= redshift);
    Ok((hi - 1, Some(hi)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> MetalGrid {
        MetalGrid {
            n_species: 2,
            n_density: 3,
            n_temperature: 4,
            log_nh_min: -2.0,
            log_nh_max: 2.0,
            log_t_min: 4.0,
            log_t_max: 7.0,
        }
    }

    /// value = species*100 + i_n*10 + i_t, scaled
    fn ramp(grid: &MetalGrid, scale: f32) -> Vec<f32> {
        let mut v = Vec::with_capacity(grid.len());
        for s in 0..grid.n_species {
            for n in 0..grid.n_density {
                for t in 0..grid.n_temperature {
                    v.push(scale * (s * 100 + n * 10 + t) as f32);
                }
            }
        }
        v
    }

    #[test]
    fn node_values_reproduced() {
        let grid = small_grid();
        let snap = MetalSnapshot::from_values(&grid, 0.0, ramp(&grid, 1.0)).unwrap();
        // i_n = 1 -> log nH = 0, i_t = 2 -> log T = 6
        let v = snap.species_rate(&grid, 1, 0.0, 6.0);
        assert!((v - 112.0).abs() < 1e-9, "v = {v}");
    }

    #[test]
    fn bilinear_midpoint() {
        let grid = small_grid();
        let snap = MetalSnapshot::from_values(&grid, 0.0, ramp(&grid, 1.0)).unwrap();
        let v = snap.species_rate(&grid, 0, 1.0, 5.5);
        // midway between n=1,2 and t=1,2 -> 15 + 1.5
        assert!((v - 16.5).abs() < 1e-9, "v = {v}");
    }

    #[test]
    fn lookups_clamp_outside_grid() {
        let grid = small_grid();
        let snap = MetalSnapshot::from_values(&grid, 0.0, ramp(&grid, 1.0)).unwrap();
        assert!((snap.species_rate(&grid, 0, -50.0, 1.0) - 0.0).abs() < 1e-12);
        assert!((snap.species_rate(&grid, 0, 50.0, 12.0) - 23.0).abs() < 1e-9);
    }

    #[test]
    fn short_read_is_reported() {
        let grid = small_grid();
        let bytes = vec![0u8; grid.byte_len() - 4];
        let err = MetalSnapshot::from_bytes(&grid, 0.0, &bytes, Path::new("z0.bin")).unwrap_err();
        match err {
            TableError::ShortRead {
                expected, found, ..
            } => {
                assert_eq!(expected, 96);
                assert_eq!(found, 92);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn redshift_interpolation_is_linear() {
        let grid = small_grid();
        let lo = MetalSnapshot::from_values(&grid, 0.0, ramp(&grid, 1.0)).unwrap();
        let hi = MetalSnapshot::from_values(&grid, 1.0, ramp(&grid, 3.0)).unwrap();
        let mut table = MetalCoolingTable::new(grid, lo, Some(hi), 0.25).unwrap();
        let v = table.species_rate(0, 0.0, 6.0);
        // base value 12 at z=0, 36 at z=1
        assert!((v - 18.0).abs() < 1e-9, "v = {v}");

        assert!(table.reweight(0.5));
        assert!((table.species_rate(0, 0.0, 6.0) - 24.0).abs() < 1e-9);
        assert!(!table.reweight(1.5));
    }

    #[test]
    fn bracket_selection() {
        let sources: Vec<MetalSnapshotSource> = [0.0, 1.0, 2.0]
            .iter()
            .map(|&z| MetalSnapshotSource {
                redshift: z,
                path: PathBuf::from(format!("z{z}.bin")),
            })
            .collect();
        assert_eq!(bracket_sources(&sources, 0.5).unwrap(), (0, Some(1)));
        assert_eq!(bracket_sources(&sources, 1.0).unwrap(), (1, Some(2)));
        assert_eq!(bracket_sources(&sources, -1.0).unwrap(), (0, None));
        assert_eq!(bracket_sources(&sources, 5.0).unwrap(), (2, None));
        assert!(bracket_sources(&[], 0.0).is_err());
    }

    #[test]
    fn unknown_species_contributes_nothing() {
        let grid = small_grid();
        let snap = MetalSnapshot::from_values(&grid, 0.0, ramp(&grid, 1.0)).unwrap();
        let table = MetalCoolingTable::new(grid, snap, None, 0.0).unwrap();
        assert_eq!(table.species_rate(7, 0.0, 5.0), 0.0);
    }
}
