//! Anomaly scoring and split influence
//!
//! Isolation forest scores follow Liu et al.:
//!
//! ```text
//! s(x, n) = 2^(-E[h(x)] / c(n))
//! c(n)    = 2·H(n-1) - 2·(n-1)/n      (average unsuccessful BST search)
//! ```
//!
//! `s` near 1 means the sample was isolated in very few splits (anomalous);
//! well below 0.5 means it sat deep in the bulk of the training data.

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    /// Raw anomaly score (0.0 = normal, 1.0 = anomaly)
    pub score: f32,
    /// Average path length across trees
    pub avg_path_length: f32,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    /// Create a new anomaly score
    pub fn new(score: f32, avg_path_length: f32, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Check if score indicates an anomaly
    pub fn is_anomaly(&self, threshold: f32) -> bool {
        self.score > threshold
    }

    /// Signed distance to the decision boundary (positive = anomalous)
    pub fn margin(&self, threshold: f32) -> f32 {
        self.score - threshold
    }

    /// Distance to the boundary as a fraction of the room on that side
    ///
    /// 0 on the boundary, 1 at score 1 for outliers and at score 0 for
    /// inliers. `threshold` must lie strictly inside `(0, 1)`.
    pub fn boundary_distance(&self, threshold: f32) -> f32 {
        let room = if self.is_anomaly(threshold) { 1.0 - threshold } else { threshold };
        (self.margin(threshold).abs() / room).clamp(0.0, 1.0)
    }
}

/// Calculate c(n) factor for path length adjustment
///
/// This represents the average path length of unsuccessful search in BST.
pub fn c_factor(n: usize) -> f32 {
    if n <= 1 {
        return 0.0;
    }
    let n_f = n as f64;
    (2.0 * harmonic(n - 1) - 2.0 * (n_f - 1.0) / n_f) as f32
}

/// H(n): exact for small n, asymptotic beyond
fn harmonic(n: usize) -> f64 {
    const EULER: f64 = 0.577_215_664_9;
    if n <= 64 {
        (1..=n).map(|k| 1.0 / k as f64).sum()
    } else {
        let n_f = n as f64;
        n_f.ln() + EULER + 0.5 / n_f
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is expected path length and c(n) is average path length
pub fn calculate_anomaly_score(avg_path_length: f32, num_samples: usize) -> f32 {
    if num_samples <= 1 {
        return 0.5; // Neutral score
    }

    let expected_path = c_factor(num_samples);
    if expected_path == 0.0 {
        return 0.5;
    }

    2.0_f32.powf(-avg_path_length / expected_path)
}

/// How often each feature was split on along the scored paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Influence {
    counts: Vec<u32>,
}

impl Influence {
    /// Zero counts for `num_features` features
    pub fn new(num_features: usize) -> Self {
        Self {
            counts: vec![0; num_features],
        }
    }

    /// Count one split on `feature`
    pub fn record(&mut self, feature: usize) {
        if let Some(c) = self.counts.get_mut(feature) {
            *c += 1;
        }
    }

    /// Per-feature counts
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Most used feature, ties to the lowest index; `None` if no split was used
    pub fn most_used(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, &c) in self.counts.iter().enumerate() {
            if c > 0 && best.map_or(true, |(_, b)| c > b) {
                best = Some((i, c));
            }
        }
        best.map(|(i, _)| i)
    }
}
