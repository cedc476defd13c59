//! Redshift-indexed ionizing UV background.
//!
//! The text format holds one row per redshift bin:
//!
//! ```text
//! log10(1+z)  Γ_H0  Γ_He0  Γ_He+  ε_H0  ε_He0  ε_He+
//! ```
//!
//! with photoionization rates Γ in s^-1 and photoheating rates ε in erg s^-1.
//! Rows must be sorted by increasing redshift. Lines starting with `#` and blank
//! lines are ignored.

use crate::error::{TableError, TableResult};
use std::path::Path;

/// Photoionization and photoheating rates per species.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UvRates {
    pub gamma_h0: f64,
    pub gamma_he0: f64,
    pub gamma_hep: f64,
    pub eps_h0: f64,
    pub eps_he0: f64,
    pub eps_hep: f64,
}

impl UvRates {
    pub const ZERO: Self = Self {
        gamma_h0: 0.0,
        gamma_he0: 0.0,
        gamma_hep: 0.0,
        eps_h0: 0.0,
        eps_he0: 0.0,
        eps_hep: 0.0,
    };

    /// True if no species is photoionized.
    pub fn is_zero(&self) -> bool {
        self.gamma_h0 <= 0.0 && self.gamma_he0 <= 0.0 && self.gamma_hep <= 0.0
    }

    /// H0 photoionization rate in units of 1e-12 s^-1.
    pub fn gamma_12(&self) -> f64 {
        self.gamma_h0 / 1.0e-12
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            gamma_h0: self.gamma_h0 * factor,
            gamma_he0: self.gamma_he0 * factor,
            gamma_hep: self.gamma_hep * factor,
            eps_h0: self.eps_h0 * factor,
            eps_he0: self.eps_he0 * factor,
            eps_hep: self.eps_hep * factor,
        }
    }

    pub fn plus(&self, other: &Self) -> Self {
        Self {
            gamma_h0: self.gamma_h0 + other.gamma_h0,
            gamma_he0: self.gamma_he0 + other.gamma_he0,
            gamma_hep: self.gamma_hep + other.gamma_hep,
            eps_h0: self.eps_h0 + other.eps_h0,
            eps_he0: self.eps_he0 + other.eps_he0,
            eps_hep: self.eps_hep + other.eps_hep,
        }
    }

    fn from_slice(v: &[f64; 6]) -> Self {
        Self {
            gamma_h0: v[0],
            gamma_he0: v[1],
            gamma_hep: v[2],
            eps_h0: v[3],
            eps_he0: v[4],
            eps_hep: v[5],
        }
    }

    fn as_array(&self) -> [f64; 6] {
        [
            self.gamma_h0,
            self.gamma_he0,
            self.gamma_hep,
            self.eps_h0,
            self.eps_he0,
            self.eps_hep,
        ]
    }
}

/// One redshift bin of the background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRow {
    pub log_1pz: f64,
    pub rates: UvRates,
}

/// Sorted UV background rows.
#[derive(Debug, Clone)]
pub struct UvBackgroundTable {
    rows: Vec<UvRow>,
}

impl UvBackgroundTable {
    /// Load a table from disk.
    pub fn from_path(path: &Path) -> TableResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text, path)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.rows.len(),
            "loaded UV background"
        );
        Ok(table)
    }

    /// Parse table text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> TableResult<Self> {
        let mut rows = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let malformed = |what: String| TableError::Malformed {
                path: path.to_path_buf(),
                line: line_no,
                what,
            };

            let values = trimmed
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| malformed(format!("cannot parse '{tok}' as a number")))
                })
                .collect::<TableResult<Vec<f64>>>()?;

            if values.len() != 7 {
                return Err(malformed(format!("expected 7 columns, found {}", values.len())));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(malformed("non-finite value".to_string()));
            }
            if values[1..].iter().any(|v| *v < 0.0) {
                return Err(malformed("negative rate".to_string()));
            }

            let mut rates = [0.0; 6];
            rates.copy_from_slice(&values[1..]);
            rows.push(UvRow {
                log_1pz: values[0],
                rates: UvRates::from_slice(&rates),
            });
        }

        Self::from_rows(rows).map_err(|e| match e {
            TableError::InvalidSetup { what } => TableError::Malformed {
                path: path.to_path_buf(),
                line: 0,
                what,
            },
            other => other,
        })
    }

    pub fn from_rows(rows: Vec<UvRow>) -> TableResult<Self> {
        if rows.is_empty() {
            return Err(TableError::InvalidSetup {
                what: "UV background has no rows".to_string(),
            });
        }
        if let Some(w) = rows.windows(2).position(|w| w[1].log_1pz <= w[0].log_1pz) {
            return Err(TableError::InvalidSetup {
                what: format!(
                    "rows must be sorted by increasing redshift (row {} has log(1+z)={} after {})",
                    w + 2,
                    rows[w + 1].log_1pz,
                    rows[w].log_1pz
                ),
            });
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[UvRow] {
        &self.rows
    }

    /// Covered redshift range.
    pub fn redshift_range(&self) -> (f64, f64) {
        let first = self.rows[0].log_1pz;
        let last = self.rows[self.rows.len() - 1].log_1pz;
        (10f64.powf(first) - 1.0, 10f64.powf(last) - 1.0)
    }

    /// Rates at `redshift`, log-log interpolated between the bracketing rows.
    ///
    /// Outside the covered range, or when the H0 rate of either bracketing row
    /// is zero (background not yet switched on), all rates are zero.
    pub fn rates_at(&self, redshift: f64) -> UvRates {
        let log_z = (1.0 + redshift).log10();
        if !log_z.is_finite() {
            return UvRates::ZERO;
        }

        let first = &self.rows[0];
        let last = &self.rows[self.rows.len() - 1];
        if log_z < first.log_1pz || log_z > last.log_1pz {
            return UvRates::ZERO;
        }
        if self.rows.len() == 1 {
            return first.rates;
        }

        // last row with log_1pz <= log_z; bounded so hi stays in range
        let lo = self
            .rows
            .partition_point(|r| r.log_1pz <= log_z)
            .saturating_sub(1)
            .min(self.rows.len() - 2);
        let (row_lo, row_hi) = (&self.rows[lo], &self.rows[lo + 1]);

        if row_lo.rates.gamma_h0 <= 0.0 || row_hi.rates.gamma_h0 <= 0.0 {
            return UvRates::ZERO;
        }

        let dz_lo = log_z - row_lo.log_1pz;
        let dz_hi = row_hi.log_1pz - log_z;
        let span = dz_lo + dz_hi;

        let a = row_lo.rates.as_array();
        let b = row_hi.rates.as_array();
        let mut out = [0.0; 6];
        for k in 0..6 {
            out[k] = if a[k] > 0.0 && b[k] > 0.0 {
                10f64.powf((dz_hi * a[k].log10() + dz_lo * b[k].log10()) / span)
            } else {
                (dz_hi * a[k] + dz_lo * b[k]) / span
            };
        }
        UvRates::from_slice(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# log(1+z) gH0 gHe0 gHep eH0 eHe0 eHep
0.0    3.0e-14  1.5e-14  1.0e-16  2.0e-25  3.0e-25  1.0e-26
0.301  1.0e-12  5.0e-13  4.0e-15  6.0e-24  8.0e-24  2.0e-25

0.602  4.0e-13  2.0e-13  1.0e-15  3.0e-24  4.0e-24  1.0e-25
";

    fn sample() -> UvBackgroundTable {
        UvBackgroundTable::parse(SAMPLE, Path::new("sample")).unwrap()
    }

    #[test]
    fn parses_rows_and_skips_comments() {
        let table = sample();
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[1].rates.gamma_h0, 1.0e-12);
    }

    #[test]
    fn exact_row_is_reproduced() {
        let table = sample();
        let z = 10f64.powf(0.301) - 1.0;
        let r = table.rates_at(z);
        assert!((r.gamma_h0 - 1.0e-12).abs() / 1.0e-12 < 1e-9);
    }

    #[test]
    fn log_log_midpoint() {
        let table = sample();
        let z = 10f64.powf(0.1505) - 1.0;
        let r = table.rates_at(z);
        let expected = (3.0e-14_f64 * 1.0e-12).sqrt();
        assert!((r.gamma_h0 - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn zero_outside_range() {
        let table = sample();
        assert_eq!(table.rates_at(10.0), UvRates::ZERO);
        assert_eq!(table.rates_at(-0.5), UvRates::ZERO);
        assert!(!table.rates_at(0.0).is_zero());
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let err = UvBackgroundTable::parse("0.0 1e-12 2e-12\n", Path::new("bad.txt")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.txt"));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn unsorted_rows_rejected() {
        let text = "0.3 1e-12 1e-12 1e-12 1e-24 1e-24 1e-24\n0.1 1e-12 1e-12 1e-12 1e-24 1e-24 1e-24\n";
        let err = UvBackgroundTable::parse(text, Path::new("unsorted")).unwrap_err();
        assert!(err.to_string().contains("sorted"));
    }

    #[test]
    fn missing_file_names_path() {
        let path = Path::new("/definitely/not/here/TREECOOL");
        let err = UvBackgroundTable::from_path(path).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/TREECOOL"));
    }

    #[test]
    fn rates_combine() {
        let a = UvRates {
            gamma_h0: 1.0e-12,
            ..UvRates::ZERO
        };
        let b = a.scaled(0.5).plus(&a);
        assert!((b.gamma_h0 - 1.5e-12).abs() < 1e-24);
        assert!((a.gamma_12() - 1.0).abs() < 1e-12);
    }
}
