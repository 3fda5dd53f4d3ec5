//! Exponential-moving-average readout that collapses the time axis.

use crate::config::EmaParams;

#[derive(Debug, Clone, PartialEq)]
pub struct EmaReadout {
    alpha: f64,
    weights: Vec<f64>,
    inputs: Vec<Vec<f64>>,
    output: Vec<f64>,
}

impl EmaReadout {
    pub fn new(params: &EmaParams) -> Self {
        let weights = Self::weights(params.alpha, params.steps);
        let inputs: Vec<Vec<f64>> = (0..params.steps)
            .map(|t| {
                (0..params.dims)
                    .map(|d| 0.15 * (0.7 * t as f64 + 0.5 * d as f64).sin() + 0.05)
                    .collect()
            })
            .collect();
        let output = apply(&weights, &inputs, params.dims);
        Self {
            alpha: params.alpha,
            weights,
            inputs,
            output,
        }
    }

    /// Geometric profile `(1−α)·α^(T−1−t)` normalized to sum to 1, so the
    /// newest step weighs most.
    pub fn weights(alpha: f64, steps: usize) -> Vec<f64> {
        let raw: Vec<f64> = (0..steps)
            .map(|t| (1.0 - alpha) * alpha.powi((steps - 1 - t) as i32))
            .collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 && total.is_finite() {
            raw.into_iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / steps.max(1) as f64; steps]
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn steps(&self) -> usize {
        self.weights.len()
    }

    pub fn dims(&self) -> usize {
        self.output.len()
    }

    pub fn weight(&self, t: usize) -> f64 {
        self.weights.get(t).copied().unwrap_or(0.0)
    }

    pub fn input(&self, t: usize, d: usize) -> f64 {
        self.inputs.get(t).and_then(|row| row.get(d)).copied().unwrap_or(0.0)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// How many times the newest step outweighs the oldest.
    pub fn recency_ratio(&self) -> f64 {
        match (self.weights.first(), self.weights.last()) {
            (Some(&first), Some(&last)) if first > 0.0 => last / first,
            _ => 1.0,
        }
    }

    /// Collapse an arbitrary `steps × dims` series with this profile.
    pub fn readout(&self, series: &[Vec<f64>]) -> Vec<f64> {
        let dims = series.first().map_or(0, Vec::len);
        apply(&self.weights, series, dims)
    }
}

fn apply(weights: &[f64], series: &[Vec<f64>], dims: usize) -> Vec<f64> {
    let mut out = vec![0.0; dims];
    for (w, row) in weights.iter().zip(series) {
        for (o, x) in out.iter_mut().zip(row) {
            *o += w * x;
        }
    }
    out
}
