//! Causal co-firing scores between query and key spike patterns.

use rand::Rng;

use crate::config::ResonanceParams;

#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceModel {
    query: Vec<Vec<bool>>,
    key: Vec<Vec<bool>>,
    scores: Vec<Vec<Option<u32>>>,
    top: Vec<Vec<usize>>,
    density: f64,
}

impl ResonanceModel {
    /// Draw both patterns at random with the configured spike density.
    pub fn random(params: &ResonanceParams, rng: &mut impl Rng) -> Self {
        let query = pattern(params, rng);
        let key = pattern(params, rng);
        Self::from_patterns(query, key, params.top_k, params.density)
    }

    /// `query[i][t]` and `key[j][t]` are position-by-time spike flags. Both
    /// must have the same number of positions.
    pub fn from_patterns(
        query: Vec<Vec<bool>>,
        key: Vec<Vec<bool>>,
        top_k: usize,
        density: f64,
    ) -> Self {
        let n = query.len().min(key.len());
        let scores: Vec<Vec<Option<u32>>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| (j <= i).then(|| co_firing(&query[i], &key[j])))
                    .collect()
            })
            .collect();
        let top = scores.iter().map(|row| select_top(row, top_k)).collect();
        Self {
            query,
            key,
            scores,
            top,
            density,
        }
    }

    pub fn positions(&self) -> usize {
        self.scores.len()
    }

    pub fn steps(&self) -> usize {
        self.query.first().map_or(0, Vec::len)
    }

    pub fn query(&self) -> &[Vec<bool>] {
        &self.query
    }

    pub fn key(&self) -> &[Vec<bool>] {
        &self.key
    }

    /// `None` for masked (future) cells, `j > i`.
    pub fn score(&self, i: usize, j: usize) -> Option<u32> {
        self.scores.get(i)?.get(j).copied().flatten()
    }

    /// Retained columns of row `i`, best first.
    pub fn top(&self, i: usize) -> &[usize] {
        self.top.get(i).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_top(&self, i: usize, j: usize) -> bool {
        self.top(i).contains(&j)
    }

    /// Score that maps to full intensity: the expected count of a
    /// fully-correlated pair at the configured density.
    pub fn expected_peak(&self) -> f64 {
        (self.steps() as f64 * self.density).max(1.0)
    }
}

fn pattern(params: &ResonanceParams, rng: &mut impl Rng) -> Vec<Vec<bool>> {
    let density = params.density.clamp(0.0, 1.0);
    (0..params.positions)
        .map(|_| (0..params.steps).map(|_| rng.gen_bool(density)).collect())
        .collect()
}

fn co_firing(q: &[bool], k: &[bool]) -> u32 {
    q.iter().zip(k).filter(|(a, b)| **a && **b).count() as u32
}

/// Highest-scoring computed columns; ties go to the lower column index.
fn select_top(row: &[Option<u32>], k: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, u32)> = row
        .iter()
        .enumerate()
        .filter_map(|(j, s)| s.map(|s| (j, s)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(j, _)| j).collect()
}
