//! Pair-based spike-timing-dependent plasticity with a reward gate.

use rand::Rng;

use crate::config::StdpParams;

#[derive(Debug, Clone, PartialEq)]
pub struct StdpTrace {
    pub pre: Vec<bool>,
    pub post: Vec<bool>,
    pub pre_trace: Vec<f64>,
    pub post_trace: Vec<f64>,
    /// Accumulated weight change after each step.
    pub delta_w: Vec<f64>,
    pub reward: Vec<f64>,
    peak: f64,
}

impl StdpTrace {
    /// Potentiation on every post spike scales with the presynaptic trace,
    /// depression on every pre spike with the postsynaptic trace. The reward
    /// compares a noisy loss against its slow moving average.
    pub fn simulate(params: &StdpParams, rng: &mut impl Rng) -> Self {
        let len = params.steps;
        let mut pre = vec![false; len];
        let mut post = vec![false; len];
        for &s in params.pre_spikes.iter().filter(|&&s| s < len) {
            pre[s] = true;
        }
        for &s in params.post_spikes.iter().filter(|&&s| s < len) {
            post[s] = true;
        }

        let decay_plus = (-1.0 / params.tau_plus).exp();
        let decay_minus = (-1.0 / params.tau_minus).exp();
        let mut pre_trace = Vec::with_capacity(len);
        let mut post_trace = Vec::with_capacity(len);
        let mut delta_w = Vec::with_capacity(len);
        let (mut x_pre, mut x_post, mut w) = (0.0_f64, 0.0_f64, 0.0_f64);
        for i in 0..len {
            x_pre = x_pre * decay_plus + f64::from(u8::from(pre[i]));
            x_post = x_post * decay_minus + f64::from(u8::from(post[i]));
            if post[i] {
                w += params.a_plus * x_pre;
            }
            if pre[i] {
                w -= params.a_minus * x_post;
            }
            pre_trace.push(x_pre);
            post_trace.push(x_post);
            delta_w.push(w);
        }

        let mut loss_ema = 4.0;
        let reward = (0..len)
            .map(|i| {
                let loss = 4.0 - 0.6 * (i as f64 / 120.0).sin() + 0.2 * rng.r#gen::<f64>();
                loss_ema = 0.99 * loss_ema + 0.01 * loss;
                sigmoid(2.0 * (loss_ema - loss))
            })
            .collect();

        let peak = delta_w.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
        Self {
            pre,
            post,
            pre_trace,
            post_trace,
            delta_w,
            reward,
            peak,
        }
    }

    pub fn len(&self) -> usize {
        self.delta_w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_w.is_empty()
    }

    /// Reward-modulated weight change at step `i`, normalized to about `[-1, 1]`.
    pub fn gated_change(&self, i: usize) -> f64 {
        match (self.delta_w.get(i), self.reward.get(i)) {
            (Some(w), Some(r)) => w * (2.0 * r - 1.0) / (self.peak + 0.001),
            _ => 0.0,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn trace() -> StdpTrace {
        StdpTrace::simulate(&StdpParams::default(), &mut ChaCha8Rng::seed_from_u64(1))
    }

    #[test]
    fn traces_jump_on_spikes_and_decay() {
        let t = trace();
        assert_eq!(t.pre_trace[59], 0.0);
        assert_relative_eq!(t.pre_trace[60], 1.0);
        assert_relative_eq!(t.pre_trace[61], (-1.0_f64 / 20.0).exp());
    }

    #[test]
    fn pre_before_post_potentiates() {
        let t = trace();
        // Post at 90 follows pre at 60 by 30 steps.
        let expected = 0.005 * (-30.0_f64 / 20.0).exp();
        assert_eq!(t.delta_w[89], 0.0);
        assert_relative_eq!(t.delta_w[90], expected, epsilon = 1e-12);
        assert!(t.delta_w[599] > 0.0);
    }

    #[test]
    fn depression_uses_post_trace() {
        // Pre at 180 sees the post trace left by the spike at 90.
        let t = trace();
        let drop = t.delta_w[179] - t.delta_w[180];
        assert_relative_eq!(drop, 0.005 * t.post_trace[180], epsilon = 1e-12);
    }

    #[test]
    fn reward_is_a_probability_and_gate_is_bounded() {
        let t = trace();
        assert!(t.reward.iter().all(|r| (0.0..=1.0).contains(r)));
        for i in 0..t.len() {
            assert!(t.gated_change(i).abs() <= 1.0);
        }
        assert_eq!(t.gated_change(10_000), 0.0);
    }
}
