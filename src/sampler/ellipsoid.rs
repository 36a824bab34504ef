//! Bounding ellipsoid over the live points (unit-cube coordinates).
//!
//! The ellipsoid is `{x : (x - c)^T P (x - c) <= 1}` with `P = (f Σ)^-1`,
//! where `Σ` is the sample covariance of the points and `f` the smallest
//! factor that encloses all of them, times the volume enlargement.
//! Its Cholesky factor gives the axes used to shape random-walk steps.

use nalgebra::{DMatrix, DVector};

/// Diagonal jitter tried, in order, when the covariance is not positive definite.
const JITTER: [f64; 4] = [0.0, 1e-12, 1e-10, 1e-8];

#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    center: DVector<f64>,
    axes: DMatrix<f64>,
    precision: DMatrix<f64>,
}

impl Ellipsoid {
    /// Sphere circumscribing the unit cube.
    pub fn unit_cube(ndim: usize) -> Self {
        let r = (ndim as f64).sqrt() / 2.0;
        Self {
            center: DVector::from_element(ndim, 0.5),
            axes: DMatrix::identity(ndim, ndim) * r,
            precision: DMatrix::identity(ndim, ndim) / (r * r),
        }
    }

    /// Smallest covariance-shaped ellipsoid containing `points`, with its volume
    /// scaled by `enlarge`.
    ///
    /// Returns `None` when there are too few points or the covariance stays
    /// singular after jitter.
    pub fn bounding(points: &[&[f64]], enlarge: f64) -> Option<Self> {
        let n = points.len();
        let ndim = points.first()?.len();
        if ndim == 0 || n <= ndim {
            return None;
        }

        let mut center = DVector::zeros(ndim);
        for p in points {
            center += DVector::from_column_slice(p);
        }
        center /= n as f64;

        let mut cov = DMatrix::zeros(ndim, ndim);
        for p in points {
            let d = DVector::from_column_slice(p) - &center;
            cov += &d * d.transpose();
        }
        cov /= (n - 1) as f64;

        let chol = JITTER.iter().find_map(|&eps| {
            let mut c = cov.clone();
            if eps > 0.0 {
                let scale = c.trace() / ndim as f64;
                for i in 0..ndim {
                    c[(i, i)] += eps * scale.max(1e-300);
                }
            }
            c.cholesky()
        })?;
        let precision = chol.inverse();

        let max_d2 = points
            .iter()
            .map(|p| {
                let d = DVector::from_column_slice(p) - &center;
                (d.transpose() * &precision * &d)[(0, 0)]
            })
            .fold(0.0_f64, f64::max);
        if !(max_d2.is_finite() && max_d2 > 0.0) {
            return None;
        }

        // Volume scales with the product of the axes, hence the 1/ndim power.
        let factor = max_d2 * enlarge.max(1.0).powf(2.0 / ndim as f64);
        Some(Self {
            center,
            axes: chol.l() * factor.sqrt(),
            precision: precision / factor,
        })
    }

    pub fn ndim(&self) -> usize {
        self.center.len()
    }

    pub fn center(&self) -> &DVector<f64> {
        &self.center
    }

    /// Lower-triangular factor `L` with `L L^T = f Σ`.
    pub fn axes(&self) -> &DMatrix<f64> {
        &self.axes
    }

    pub fn mahalanobis_sq(&self, x: &[f64]) -> f64 {
        let d = DVector::from_column_slice(x) - &self.center;
        (d.transpose() * &self.precision * &d)[(0, 0)]
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        self.mahalanobis_sq(x) <= 1.0 + 1e-9
    }
}
