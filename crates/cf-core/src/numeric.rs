use crate::CfError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CfError::NonFinite { what, value: v })
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CfError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CfError::InvalidArg { what })
    }
}

/// Replace a non-finite value with `fallback`.
///
/// Used on per-element hot paths where a NaN from a rare floating-point edge
/// case must not leak into an enclosing root-find.
#[inline]
pub fn finite_or(v: Real, fallback: Real) -> Real {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

/// Linear interpolation between `lo` and `hi` with weight `w` on `hi`.
#[inline]
pub fn lerp(lo: Real, hi: Real, w: Real) -> Real {
    lo + (hi - lo) * w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(0.0, "density").is_err());
        assert!(ensure_positive(-1.0, "density").is_err());
        assert_eq!(ensure_positive(2.5, "density").unwrap(), 2.5);
    }

    #[test]
    fn finite_or_replaces_inf_and_nan() {
        assert_eq!(finite_or(Real::INFINITY, 0.0), 0.0);
        assert_eq!(finite_or(Real::NAN, -1.0), -1.0);
        assert_eq!(finite_or(3.0, 0.0), 3.0);
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
    }
}
