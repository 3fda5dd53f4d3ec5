//! Leaky integrate-and-fire neuron driven by a periodic current burst.

use crate::config::LifParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifSample {
    pub v: f64,
    pub i_syn: f64,
    pub spike: bool,
    pub refractory: bool,
    /// The previous step spiked, so this step injects into the cascade.
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifTrace {
    samples: Vec<LifSample>,
}

impl LifTrace {
    /// Run the recurrence for `params.steps` steps starting at rest
    /// (`v = reset`, no synaptic current).
    pub fn simulate(params: &LifParams) -> Self {
        let mut samples = Vec::with_capacity(params.steps);
        let mut v = params.reset;
        let mut i_syn = 0.0;
        let mut refractory = 0u32;

        for step in 0..params.steps {
            let phase = step % params.burst_period;
            let input = if phase > params.burst_start && phase < params.burst_end {
                params.input_current
            } else {
                0.0
            };
            i_syn = params.tau_syn * i_syn + input;

            let sample = if refractory > 0 {
                refractory -= 1;
                v = params.reset;
                LifSample { v, i_syn, spike: false, refractory: true, cascade: false }
            } else {
                let next = params.tau_mem * v + (1.0 - params.tau_mem) * i_syn;
                if next >= params.threshold {
                    // Soft reset keeps the overshoot.
                    v = next - params.threshold;
                    refractory = params.refractory_steps;
                    LifSample {
                        v: params.threshold,
                        i_syn,
                        spike: true,
                        refractory: false,
                        cascade: false,
                    }
                } else {
                    v = next;
                    LifSample { v, i_syn, spike: false, refractory: false, cascade: false }
                }
            };
            samples.push(sample);
        }

        for i in 1..samples.len() {
            if samples[i - 1].spike {
                samples[i].cascade = true;
            }
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[LifSample] {
        &self.samples
    }

    /// Sample `px` columns into a window starting at `offset`, looping.
    pub fn at(&self, offset: usize, px: usize) -> Option<&LifSample> {
        self.samples.get(super::wrap_index(offset, px, self.samples.len()))
    }

    pub fn spike_steps(&self) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.spike.then_some(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_before_first_burst() {
        let trace = LifTrace::simulate(&LifParams::default());
        assert!(trace.samples()[..26].iter().all(|s| !s.spike && s.i_syn == 0.0));
    }

    #[test]
    fn spikes_only_while_driven() {
        let params = LifParams::default();
        let trace = LifTrace::simulate(&params);
        let spikes = trace.spike_steps();
        assert!(!spikes.is_empty());
        for step in spikes {
            let phase = step % params.burst_period;
            assert!(phase > params.burst_start, "spike at {step}");
            // i_syn decays by half per step, so v can coast a few steps
            // past the end of the burst at most.
            assert!(phase < params.burst_end + 10, "spike at {step}");
        }
    }

    #[test]
    fn spike_is_followed_by_refractory_and_cascade() {
        let params = LifParams::default();
        let trace = LifTrace::simulate(&params);
        let first = trace.spike_steps()[0];
        let s = trace.samples();
        assert_eq!(s[first].v, params.threshold);
        assert!(s[first + 1].cascade);
        for k in 1..=params.refractory_steps as usize {
            assert!(s[first + k].refractory);
            assert_eq!(s[first + k].v, params.reset);
        }
        assert!(!s[first + params.refractory_steps as usize + 1].refractory);
    }

    #[test]
    fn window_loops_around() {
        let trace = LifTrace::simulate(&LifParams::default());
        assert_eq!(trace.at(2399, 1), trace.samples().first());
    }
}
