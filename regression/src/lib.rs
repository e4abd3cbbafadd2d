use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionErrors {
    #[error("cannot fit a regression to an empty series")]
    Empty,
    #[error("x and y lengths differ: {xs} vs {ys}")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("least squares solve failed: {0}")]
    Solve(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub predicted: Vec<f64>,
    pub slope: f64,
}

/// Ordinary least squares of y on x. Returns the predicted y at each input x
/// together with the fitted slope.
pub fn linear(xs: &[f64], ys: &[f64]) -> Result<LinearFit, RegressionErrors> {
    let coeffs = fit(xs, ys, 1)?;
    Ok(LinearFit {
        predicted: predict(xs, &coeffs),
        slope: coeffs[1],
    })
}

/// Least squares over a polynomial basis of the given degree. Only the
/// predicted curve is surfaced; the coefficients stay internal.
pub fn polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Result<Vec<f64>, RegressionErrors> {
    let coeffs = fit(xs, ys, degree)?;
    Ok(predict(xs, &coeffs))
}

fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Result<DVector<f64>, RegressionErrors> {
    if xs.len() != ys.len() {
        return Err(RegressionErrors::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.is_empty() {
        return Err(RegressionErrors::Empty);
    }

    // Vandermonde design matrix, solved via SVD so rank-deficient inputs
    // (fewer points than terms, repeated x) still yield a least squares fit.
    let design = DMatrix::from_fn(xs.len(), degree + 1, |row, col| xs[row].powi(col as i32));
    let rhs = DVector::from_column_slice(ys);

    design
        .svd(true, true)
        .solve(&rhs, f64::EPSILON)
        .map_err(RegressionErrors::Solve)
}

fn predict(xs: &[f64], coeffs: &DVector<f64>) -> Vec<f64> {
    xs.iter()
        .map(|&x| {
            coeffs
                .iter()
                .enumerate()
                .map(|(power, c)| c * x.powi(power as i32))
                .sum()
        })
        .collect()
}
