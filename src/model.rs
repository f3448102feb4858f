//! Seeded K-Means: elbow diagnostic across a k range, and clustering at a
//! chosen k with a silhouette quality metric.
//!
//! The fit is farthest-first initialization plus Lloyd iterations over an
//! explicit RNG seed, so a run is a pure function of (data, k, seed). The
//! fit must also stay defined at the edges the caller is allowed to reach:
//! k = 1 (inertia equals total variance) and k >= n (duplicate centroids,
//! empty clusters tolerated, labels still produced).

use std::ops::RangeInclusive;

use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use tracing::debug;

use crate::error::DegenerateClusteringError;

/// Seed used by the source system; exposed as configuration, never hidden.
pub const DEFAULT_SEED: u64 = 20;

/// Elbow diagnostic range used by the source system.
pub const DEFAULT_ELBOW_RANGE: RangeInclusive<usize> = 1..=10;

const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-4;

/// Fitted K-Means output for one chosen k.
#[derive(Debug)]
pub struct ClusterModel {
    pub k: usize,
    /// 0-based label per customer row.
    pub labels: Array1<usize>,
    /// (k, 3) centroids in scaled feature space.
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
    /// Silhouette over the full population, or the reason it is undefined.
    /// Labels above remain valid either way.
    pub silhouette: Result<f64, DegenerateClusteringError>,
}

impl ClusterModel {
    /// 1-based cluster ids, the caller-facing labeling.
    pub fn cluster_ids(&self) -> Vec<usize> {
        self.labels.iter().map(|&label| label + 1).collect()
    }

    /// Member count per 0-based label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in self.labels.iter() {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Fit K-Means at `k` and score it. Silhouette is a secondary metric: for
/// k < 2 or k >= n it is reported as an error while labels stay valid.
pub fn cluster(scaled: &Array2<f64>, k: usize, seed: u64) -> ClusterModel {
    let (labels, centroids, inertia) = fit(scaled, k, seed);
    let n = scaled.nrows();
    let silhouette = if k < 2 || k >= n {
        Err(DegenerateClusteringError { k, n_customers: n })
    } else {
        Ok(silhouette_score(scaled, &labels, k))
    };
    debug!(k, inertia, "fitted k-means model");
    ClusterModel {
        k,
        labels,
        centroids,
        inertia,
        silhouette,
    }
}

/// Inertia curve over an inclusive k range, for the elbow diagnostic. The
/// top of the range is capped at the population size; the pipeline never
/// auto-selects k from this curve.
pub fn optimize_k(
    scaled: &Array2<f64>,
    k_range: RangeInclusive<usize>,
    seed: u64,
) -> Vec<(usize, f64)> {
    let k_max = (*k_range.end()).min(scaled.nrows());
    (*k_range.start()..=k_max)
        .map(|k| {
            let (_, _, inertia) = fit(scaled, k, seed);
            (k, inertia)
        })
        .collect()
}

/// Farthest-first initialization followed by Lloyd iterations.
fn fit(data: &Array2<f64>, k: usize, seed: u64) -> (Array1<usize>, Array2<f64>, f64) {
    let n = data.nrows();
    assert!(k >= 1, "cluster count must be at least 1");
    assert!(n >= 1, "cannot fit on an empty feature matrix");

    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let mut centroids = init_centroids(data, k, &mut rng);
    let mut labels = Array1::<usize>::zeros(n);

    for _ in 0..MAX_ITERATIONS {
        // Assignment step.
        for (i, point) in data.outer_iter().enumerate() {
            labels[i] = nearest_centroid(&point, &centroids);
        }

        // Update step; an empty cluster keeps its previous centroid.
        let mut next = centroids.clone();
        for cluster in 0..k {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &label)| label == cluster)
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut mean = Array1::<f64>::zeros(data.ncols());
            for &i in &members {
                mean += &data.row(i);
            }
            mean /= members.len() as f64;
            next.row_mut(cluster).assign(&mean);
        }

        let shift = centroids
            .outer_iter()
            .zip(next.outer_iter())
            .map(|(a, b)| euclidean_distance(&a, &b))
            .fold(0.0, f64::max);
        centroids = next;
        if shift < TOLERANCE {
            break;
        }
    }

    for (i, point) in data.outer_iter().enumerate() {
        labels[i] = nearest_centroid(&point, &centroids);
    }
    let inertia = compute_inertia(data, &labels, &centroids);
    (labels, centroids, inertia)
}

/// Farthest-first seeding: the first centroid comes from the RNG, each
/// further centroid is the point with the greatest distance to its nearest
/// chosen centroid (ties to the lowest row index). Once every distinct
/// point is a centroid (k > distinct points) the distances collapse to
/// zero and further centroids duplicate existing points.
fn init_centroids(data: &Array2<f64>, k: usize, rng: &mut Xoshiro256Plus) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    for c in 1..k {
        let chosen = centroids.slice(ndarray::s![..c, ..]);
        let mut pick = 0;
        let mut pick_distance = f64::NEG_INFINITY;
        for (i, point) in data.outer_iter().enumerate() {
            let nearest = chosen
                .outer_iter()
                .map(|centroid| squared_distance(&point, &centroid))
                .fold(f64::INFINITY, f64::min);
            if nearest > pick_distance {
                pick_distance = nearest;
                pick = i;
            }
        }
        if pick_distance <= 0.0 {
            pick = rng.gen_range(0..n);
        }
        centroids.row_mut(c).assign(&data.row(pick));
    }
    centroids
}

fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (cluster, centroid) in centroids.outer_iter().enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < best_distance {
            best_distance = distance;
            best = cluster;
        }
    }
    best
}

/// Within-cluster sum of squared distances.
fn compute_inertia(data: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    data.outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_distance(&point, &centroids.row(label)))
        .sum()
}

/// Mean silhouette coefficient over every point. Points in singleton
/// clusters, or with no reachable other cluster, contribute 0.
fn silhouette_score(data: &Array2<f64>, labels: &Array1<usize>, k: usize) -> f64 {
    let n = data.nrows();
    let mut total = 0.0;

    for i in 0..n {
        let point = data.row(i);
        let own = labels[i];

        let mut same_cluster = Vec::new();
        let mut other_clusters: Vec<Vec<f64>> = vec![Vec::new(); k];
        for j in 0..n {
            if i == j {
                continue;
            }
            let distance = euclidean_distance(&point, &data.row(j));
            if labels[j] == own {
                same_cluster.push(distance);
            } else {
                other_clusters[labels[j]].push(distance);
            }
        }

        let a = if same_cluster.is_empty() {
            0.0
        } else {
            same_cluster.iter().sum::<f64>() / same_cluster.len() as f64
        };
        let b = other_clusters
            .iter()
            .filter(|distances| !distances.is_empty())
            .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
            .fold(f64::INFINITY, f64::min);

        total += if b.is_infinite() || same_cluster.is_empty() || (a == 0.0 && b == 0.0) {
            0.0
        } else {
            (b - a) / a.max(b)
        };
    }

    total / n as f64
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}
