//! Cascading activation over a ring of clusters.
//!
//! An event travels in three phases: it scatters from the central hub out to
//! one cluster, spreads laterally to that cluster's ring neighbours through
//! the weight matrix, and gathers back into the hub's readout.

use std::f64::consts::{FRAC_PI_2, TAU};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use spikeviz_protocol::Point;

use crate::config::CascadeParams;

/// Membrane level above which a cluster counts as active.
pub const ACTIVE_LEVEL: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scatter,
    Lateral,
    Gather,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub phase: Phase,
    /// Cluster the signal leaves from (ignored for scatter).
    pub from: usize,
    /// Cluster the signal arrives at (ignored for gather).
    pub to: usize,
    pub progress: f64,
    pub strength: f64,
}

/// Ring placement for a given surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub center: Point,
    pub ring_radius: f64,
    pub node_radius: f64,
    pub clusters: usize,
}

impl RingGeometry {
    pub fn new(width: f64, height: f64, clusters: usize) -> Self {
        let ring_radius = 0.34 * width.min(height).max(0.0);
        Self {
            center: Point::new(width / 2.0, height / 2.0),
            ring_radius,
            node_radius: (0.04 * ring_radius).max(3.0),
            clusters,
        }
    }

    pub fn angle(&self, index: usize) -> f64 {
        index as f64 / self.clusters.max(1) as f64 * TAU - FRAC_PI_2
    }

    pub fn node(&self, index: usize) -> Point {
        let a = self.angle(index);
        Point::new(
            self.center.x + a.cos() * self.ring_radius,
            self.center.y + a.sin() * self.ring_radius,
        )
    }

    /// The first node within `node_radius + 6` of `p`.
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        let reach = self.node_radius + 6.0;
        (0..self.clusters).find(|&i| self.node(i).distance(p) < reach)
    }

    /// Where `signal` is drawn this frame.
    pub fn signal_position(&self, signal: &Signal) -> Point {
        let (a, b) = match signal.phase {
            Phase::Scatter => (self.center, self.node(signal.to)),
            Phase::Lateral => (self.node(signal.from), self.node(signal.to)),
            Phase::Gather => (self.node(signal.from), self.center),
        };
        let t = signal.progress.clamp(0.0, 1.0);
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

pub fn ring_distance(i: usize, j: usize, n: usize) -> usize {
    let d = i.abs_diff(j);
    d.min(n - d)
}

#[derive(Debug, Clone)]
pub struct CascadeModel {
    params: CascadeParams,
    weights: Vec<f64>,
    mem: Vec<f64>,
    i_syn: Vec<f64>,
    signals: Vec<Signal>,
    readout: f64,
    last_hover_fire: Option<f64>,
    cooldown: u32,
    rng: ChaCha8Rng,
}

impl CascadeModel {
    pub fn new(params: CascadeParams, rng: ChaCha8Rng) -> Self {
        let n = params.clusters;
        let radius = params.radius;
        let mut weights = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let d = ring_distance(i, j, n);
                if d > 0 && d <= radius {
                    weights[i * n + j] =
                        (params.gain * (1.0 - d as f64 / (radius + 1) as f64)).tanh();
                }
            }
        }
        Self {
            weights,
            mem: vec![0.0; n],
            i_syn: vec![0.0; n],
            signals: Vec::new(),
            readout: 0.0,
            last_hover_fire: None,
            cooldown: 0,
            rng,
            params,
        }
    }

    pub fn clusters(&self) -> usize {
        self.params.clusters
    }

    pub fn radius(&self) -> usize {
        self.params.radius
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        let n = self.params.clusters;
        if i < n && j < n { self.weights[i * n + j] } else { 0.0 }
    }

    pub fn mem(&self) -> &[f64] {
        &self.mem
    }

    pub fn i_syn(&self) -> &[f64] {
        &self.i_syn
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Hub readout pulse in `[0, 1]`, raised by arriving gather signals.
    pub fn readout(&self) -> f64 {
        self.readout
    }

    pub fn active_count(&self) -> usize {
        self.mem.iter().filter(|&&m| m > ACTIVE_LEVEL).count()
    }

    /// Launch a scatter signal towards `cluster`. Returns `false` when the
    /// signal budget is exhausted.
    pub fn fire(&mut self, cluster: usize, strength: f64) -> bool {
        self.spawn(Signal {
            phase: Phase::Scatter,
            from: cluster,
            to: cluster,
            progress: 0.0,
            strength,
        })
    }

    fn spawn(&mut self, signal: Signal) -> bool {
        if signal.to >= self.params.clusters || self.signals.len() >= self.params.max_signals {
            return false;
        }
        self.signals.push(signal);
        true
    }

    /// Advance one frame. `hovered` is the cluster under the pointer.
    pub fn step(&mut self, clock: f64, hovered: Option<usize>) {
        let p = &self.params;
        for (m, s) in self.mem.iter_mut().zip(self.i_syn.iter_mut()) {
            *s *= p.syn_decay;
            *m = (*m * p.mem_decay).max(0.0);
        }
        self.readout *= 0.9;

        if let Some(cluster) = hovered {
            let ready = self
                .last_hover_fire
                .is_none_or(|last| clock - last > self.params.hover_cooldown);
            if ready {
                self.last_hover_fire = Some(clock);
                self.fire(cluster, self.params.hover_strength);
            }
        }

        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown == 0 {
            self.cooldown = self.params.spontaneous_interval
                + self.rng.gen_range(0..self.params.spontaneous_jitter.max(1));
            let cluster = self.rng.gen_range(0..self.params.clusters);
            self.fire(cluster, self.params.spontaneous_strength);
        }

        self.advance_signals();

        let p = &self.params;
        for (m, s) in self.mem.iter_mut().zip(&self.i_syn) {
            *m = (*m + p.syn_to_mem * s).min(p.mem_ceiling);
        }
    }

    fn advance_signals(&mut self) {
        let mut arrived = Vec::new();
        let params = &self.params;
        self.signals.retain_mut(|signal| {
            signal.progress += match signal.phase {
                Phase::Scatter => params.scatter_speed,
                Phase::Lateral => params.lateral_speed,
                Phase::Gather => params.gather_speed,
            };
            if signal.progress >= 1.0 {
                arrived.push(*signal);
                false
            } else {
                true
            }
        });

        let n = self.params.clusters;
        for signal in arrived {
            match signal.phase {
                Phase::Scatter => {
                    let c = signal.to;
                    self.mem[c] = self.mem[c].max(signal.strength);
                    for d in 1..=self.params.radius {
                        for j in [(c + d) % n, (c + n - d) % n] {
                            self.spawn(Signal {
                                phase: Phase::Lateral,
                                from: c,
                                to: j,
                                progress: 0.0,
                                strength: signal.strength,
                            });
                        }
                    }
                }
                Phase::Lateral => {
                    let w = self.weight(signal.from, signal.to);
                    self.i_syn[signal.to] += w * signal.strength * 0.5;
                    self.spawn(Signal {
                        phase: Phase::Gather,
                        from: signal.to,
                        to: signal.to,
                        progress: 0.0,
                        strength: signal.strength * w,
                    });
                }
                Phase::Gather => {
                    self.readout = (self.readout + 0.25 * signal.strength).min(1.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn model() -> CascadeModel {
        CascadeModel::new(CascadeParams::default(), ChaCha8Rng::seed_from_u64(9))
    }

    #[test]
    fn weights_are_local_symmetric_and_decaying() {
        let m = model();
        let n = m.clusters();
        for i in 0..n {
            assert_eq!(m.weight(i, i), 0.0);
            for j in 0..n {
                assert_eq!(m.weight(i, j), m.weight(j, i));
                if ring_distance(i, j, n) > 3 {
                    assert_eq!(m.weight(i, j), 0.0);
                }
            }
        }
        assert!(m.weight(0, 1) > m.weight(0, 2));
        assert!(m.weight(0, 2) > m.weight(0, 3));
        assert!(m.weight(0, 3) > 0.0);
        // Wraps around the ring.
        assert_eq!(m.weight(0, 63), m.weight(0, 1));
        assert!(m.weight(0, 1) < 1.0);
    }

    #[test]
    fn spontaneous_event_fires_on_first_frame() {
        let mut m = model();
        m.step(0.0, None);
        assert_eq!(m.signals().len(), 1);
        assert_eq!(m.signals()[0].phase, Phase::Scatter);
    }

    #[test]
    fn scatter_arrival_activates_cluster_and_spreads() {
        let mut m = model();
        m.cooldown = 1000;
        assert!(m.fire(10, 1.5));
        // 0.08 per frame reaches 1.0 on the 13th frame.
        for _ in 0..13 {
            m.step(0.0, None);
        }
        assert!(m.mem()[10] > 1.0);
        assert_eq!(m.signals().len(), 6);
        assert!(m.signals().iter().all(|s| s.phase == Phase::Lateral && s.from == 10));
        assert!(m.active_count() >= 1);
    }

    #[test]
    fn full_cycle_reaches_readout() {
        let mut m = model();
        m.cooldown = 10_000;
        m.fire(5, 1.5);
        let mut peak = 0.0_f64;
        for _ in 0..80 {
            m.step(0.0, None);
            peak = peak.max(m.readout());
        }
        assert!(peak > 0.0);
        assert!(m.signals().is_empty());
        assert!(m.i_syn().iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn hover_respects_cooldown() {
        let mut m = model();
        m.cooldown = 10_000;
        m.step(1.00, Some(3));
        m.step(1.05, Some(3));
        assert_eq!(m.signals().len(), 1);
        m.step(1.09, Some(3));
        assert_eq!(m.signals().len(), 2);
    }

    #[test]
    fn signal_budget_is_capped() {
        let mut m = model();
        for i in 0..100 {
            m.fire(i % 64, 1.4);
        }
        assert_eq!(m.signals().len(), 48);
        assert!(!m.fire(0, 1.0));
    }

    #[test]
    fn membrane_stays_bounded() {
        let mut m = model();
        for frame in 0..2000 {
            m.step(frame as f64 / 60.0, Some(frame % 64));
            assert!(m.mem().iter().all(|&v| (0.0..=2.0).contains(&v)));
        }
    }

    #[test]
    fn hit_test_finds_nodes_and_rejects_sentinel() {
        let g = RingGeometry::new(800.0, 440.0, 64);
        assert_eq!(g.hit_test(g.node(17)), Some(17));
        assert_eq!(g.hit_test(Point::new(-9999.0, -9999.0)), None);
        assert_eq!(g.hit_test(g.center), None);
        assert!((g.ring_radius - 149.6).abs() < 1e-9);
    }
}
