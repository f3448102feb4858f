//! Feature standardization: zero mean, unit variance per feature, computed
//! fresh over the full customer population on every call. No scaler state
//! survives a run.

use ndarray::{Array2, Axis};
use serde::Serialize;
use tracing::debug;

use crate::error::{DegenerateFeatureError, FeatureName};
use crate::rfm::CustomerRfm;

/// Default stand-in for a missing recency, kept for behavioral
/// compatibility with the source system.
pub const DEFAULT_IMPUTATION_DAYS: i64 = 5;

const FEATURES: [FeatureName; 3] = [
    FeatureName::Recency,
    FeatureName::Frequency,
    FeatureName::Monetary,
];

/// Population mean and standard deviation per feature column, in the order
/// Recency, Frequency, Monetary.
#[derive(Debug, Clone, Serialize)]
pub struct ScalerStats {
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

/// Impute missing recency with `imputation_days`, then standardize each of
/// the three features independently.
///
/// Fails if any feature has zero variance; standardization is undefined
/// there and a guarded epsilon would hide a degenerate dataset.
pub fn normalize(
    rfm: &[CustomerRfm],
    imputation_days: i64,
) -> Result<(Array2<f64>, ScalerStats), DegenerateFeatureError> {
    let n = rfm.len();
    let mut raw = Array2::<f64>::zeros((n, 3));
    for (i, customer) in rfm.iter().enumerate() {
        raw[[i, 0]] = customer.recency.unwrap_or(imputation_days) as f64;
        raw[[i, 1]] = customer.frequency as f64;
        raw[[i, 2]] = customer.monetary;
    }

    let mut mean = [0.0; 3];
    let mut std = [0.0; 3];
    for (j, feature) in FEATURES.iter().enumerate() {
        let column = raw.index_axis(Axis(1), j);
        let mu = column.sum() / n as f64;
        let var = column.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n as f64;
        let sigma = var.sqrt();
        if sigma == 0.0 || !sigma.is_finite() {
            return Err(DegenerateFeatureError { feature: *feature });
        }
        mean[j] = mu;
        std[j] = sigma;
    }

    let mut scaled = raw;
    for j in 0..3 {
        scaled
            .index_axis_mut(Axis(1), j)
            .mapv_inplace(|x| (x - mean[j]) / std[j]);
    }

    debug!(customers = n, "standardized RFM features");
    Ok((scaled, ScalerStats { mean, std }))
}
