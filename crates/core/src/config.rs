//! Gallery configuration.
//!
//! Every parameter has a default equal to the demo constants, so an empty
//! JSON object (or no config at all) reproduces the stock gallery. Values are
//! tuned for appearance rather than derived from a reference model.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Seed used when neither the config nor the host supplies one.
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub seed: Option<u64>,
    pub encoder: EncoderParams,
    pub lif: LifParams,
    pub cascade: CascadeParams,
    pub resonance: ResonanceParams,
    pub stdp: StdpParams,
    pub leaky_clamp: LeakyClampParams,
    pub ema: EmaParams,
    pub stack: StackParams,
}

impl GalleryConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.encoder.validate()?;
        self.lif.validate()?;
        self.cascade.validate()?;
        self.resonance.validate()?;
        self.stdp.validate()?;
        self.leaky_clamp.validate()?;
        self.ema.validate()?;
        self.stack.validate()
    }

    /// A reproducible generator for one module, salted by its element id so
    /// modules sharing a seed still draw independent streams.
    pub fn rng_for(&self, module: &str) -> ChaCha8Rng {
        let seed = self.seed.unwrap_or(DEFAULT_SEED);
        ChaCha8Rng::seed_from_u64(seed ^ fnv1a(module))
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn finite_positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(field, format!("{value} must be positive")))
    }
}

fn open_unit(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(field, format!("{value} must lie in (0, 1)")))
    }
}

fn within(field: &'static str, value: usize, lo: usize, hi: usize) -> Result<(), ConfigurationError> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(field, format!("{value} must be between {lo} and {hi}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderParams {
    /// Angular rate of the first fast column, in rad/s.
    pub fast_rate: f64,
    /// Added per fast column so neighbours drift out of phase.
    pub fast_rate_step: f64,
    pub slow_rate: f64,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            fast_rate: 1.2,
            fast_rate_step: 0.15,
            slow_rate: 0.4,
        }
    }
}

impl EncoderParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        finite_positive("encoder.fast_rate", self.fast_rate)?;
        if !(self.fast_rate_step.is_finite() && self.fast_rate_step >= 0.0) {
            return Err(ConfigurationError::invalid(
                "encoder.fast_rate_step",
                "must be finite and non-negative",
            ));
        }
        finite_positive("encoder.slow_rate", self.slow_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifParams {
    pub tau_mem: f64,
    pub tau_syn: f64,
    pub threshold: f64,
    pub reset: f64,
    pub refractory_steps: u32,
    pub steps: usize,
    pub input_current: f64,
    /// The input burst is on while `burst_start < step % burst_period < burst_end`.
    pub burst_period: usize,
    pub burst_start: usize,
    pub burst_end: usize,
    /// Samples scrolled per second.
    pub scroll_rate: f64,
}

impl Default for LifParams {
    fn default() -> Self {
        Self {
            tau_mem: 0.9,
            tau_syn: 0.5,
            threshold: 0.25,
            reset: -0.1,
            refractory_steps: 2,
            steps: 2400,
            input_current: 0.3,
            burst_period: 220,
            burst_start: 25,
            burst_end: 130,
            scroll_rate: 55.0,
        }
    }
}

impl LifParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        open_unit("lif.tau_mem", self.tau_mem)?;
        open_unit("lif.tau_syn", self.tau_syn)?;
        if !(self.threshold.is_finite() && self.reset.is_finite() && self.threshold > self.reset) {
            return Err(ConfigurationError::invalid(
                "lif.threshold",
                format!("{} must exceed reset {}", self.threshold, self.reset),
            ));
        }
        within("lif.steps", self.steps, 1, 100_000)?;
        finite_positive("lif.input_current", self.input_current)?;
        within("lif.burst_period", self.burst_period, 2, 100_000)?;
        if self.burst_start >= self.burst_end || self.burst_end > self.burst_period {
            return Err(ConfigurationError::invalid(
                "lif.burst_end",
                "burst window must satisfy start < end <= period",
            ));
        }
        finite_positive("lif.scroll_rate", self.scroll_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeParams {
    pub clusters: usize,
    /// Ring distance beyond which clusters are unconnected.
    pub radius: usize,
    pub gain: f64,
    pub syn_decay: f64,
    pub mem_decay: f64,
    pub syn_to_mem: f64,
    pub mem_ceiling: f64,
    pub hover_strength: f64,
    /// Minimum seconds between hover-triggered events.
    pub hover_cooldown: f64,
    pub spontaneous_strength: f64,
    /// Frames between spontaneous events: `interval + U[0, jitter)`.
    pub spontaneous_interval: u32,
    pub spontaneous_jitter: u32,
    pub scatter_speed: f64,
    pub lateral_speed: f64,
    pub gather_speed: f64,
    pub max_signals: usize,
}

impl Default for CascadeParams {
    fn default() -> Self {
        Self {
            clusters: 64,
            radius: 3,
            gain: 1.0,
            syn_decay: 0.85,
            mem_decay: 0.8,
            syn_to_mem: 0.2,
            mem_ceiling: 2.0,
            hover_strength: 1.5,
            hover_cooldown: 0.08,
            spontaneous_strength: 1.4,
            spontaneous_interval: 55,
            spontaneous_jitter: 60,
            scatter_speed: 0.08,
            lateral_speed: 0.05,
            gather_speed: 0.06,
            max_signals: 48,
        }
    }
}

/// Neurons split evenly across the cascade clusters.
pub const CASCADE_NEURONS: usize = 512;

impl CascadeParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        within("cascade.clusters", self.clusters, 8, 128)?;
        if CASCADE_NEURONS % self.clusters != 0 {
            return Err(ConfigurationError::invalid(
                "cascade.clusters",
                format!("{} must divide {CASCADE_NEURONS}", self.clusters),
            ));
        }
        within("cascade.radius", self.radius, 1, self.clusters / 2)?;
        finite_positive("cascade.gain", self.gain)?;
        open_unit("cascade.syn_decay", self.syn_decay)?;
        open_unit("cascade.mem_decay", self.mem_decay)?;
        finite_positive("cascade.syn_to_mem", self.syn_to_mem)?;
        finite_positive("cascade.mem_ceiling", self.mem_ceiling)?;
        finite_positive("cascade.hover_strength", self.hover_strength)?;
        finite_positive("cascade.hover_cooldown", self.hover_cooldown)?;
        finite_positive("cascade.spontaneous_strength", self.spontaneous_strength)?;
        if self.spontaneous_interval == 0 {
            return Err(ConfigurationError::invalid(
                "cascade.spontaneous_interval",
                "must be at least one frame",
            ));
        }
        for (field, speed) in [
            ("cascade.scatter_speed", self.scatter_speed),
            ("cascade.lateral_speed", self.lateral_speed),
            ("cascade.gather_speed", self.gather_speed),
        ] {
            finite_positive(field, speed)?;
        }
        within("cascade.max_signals", self.max_signals, 1, 1024)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResonanceParams {
    pub positions: usize,
    pub steps: usize,
    /// Probability that a pattern cell spikes.
    pub density: f64,
    pub top_k: usize,
    /// Scan rows advanced per second.
    pub scan_rate: f64,
}

impl Default for ResonanceParams {
    fn default() -> Self {
        Self {
            positions: 10,
            steps: 10,
            density: 0.35,
            top_k: 3,
            scan_rate: 0.8,
        }
    }
}

impl ResonanceParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        within("resonance.positions", self.positions, 2, 10)?;
        within("resonance.steps", self.steps, 2, 10)?;
        if !(0.0..=1.0).contains(&self.density) {
            return Err(ConfigurationError::invalid(
                "resonance.density",
                format!("{} must lie in [0, 1]", self.density),
            ));
        }
        within("resonance.top_k", self.top_k, 1, self.positions)?;
        finite_positive("resonance.scan_rate", self.scan_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdpParams {
    pub steps: usize,
    pub a_plus: f64,
    pub a_minus: f64,
    pub tau_plus: f64,
    pub tau_minus: f64,
    pub pre_spikes: Vec<usize>,
    pub post_spikes: Vec<usize>,
    pub scroll_rate: f64,
}

impl Default for StdpParams {
    fn default() -> Self {
        Self {
            steps: 600,
            a_plus: 0.005,
            a_minus: 0.005,
            tau_plus: 20.0,
            tau_minus: 20.0,
            pre_spikes: vec![60, 180, 300, 420, 510],
            post_spikes: vec![90, 210, 330, 450, 540],
            scroll_rate: 50.0,
        }
    }
}

impl StdpParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        within("stdp.steps", self.steps, 10, 100_000)?;
        for (field, amp) in [("stdp.a_plus", self.a_plus), ("stdp.a_minus", self.a_minus)] {
            if !(amp.is_finite() && amp >= 0.0) {
                return Err(ConfigurationError::invalid(field, "must be finite and non-negative"));
            }
        }
        finite_positive("stdp.tau_plus", self.tau_plus)?;
        finite_positive("stdp.tau_minus", self.tau_minus)?;
        for (field, spikes) in [
            ("stdp.pre_spikes", &self.pre_spikes),
            ("stdp.post_spikes", &self.post_spikes),
        ] {
            if let Some(step) = spikes.iter().find(|&&s| s >= self.steps) {
                return Err(ConfigurationError::invalid(
                    field,
                    format!("spike at step {step} is past the last step {}", self.steps - 1),
                ));
            }
        }
        finite_positive("stdp.scroll_rate", self.scroll_rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakyClampParams {
    pub leak: f64,
    pub floor: f64,
    /// Seconds for the sweep dot to cross the domain.
    pub sweep_period: f64,
}

impl Default for LeakyClampParams {
    fn default() -> Self {
        Self {
            leak: 0.1,
            floor: -0.1,
            sweep_period: 4.0,
        }
    }
}

impl LeakyClampParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        open_unit("leaky_clamp.leak", self.leak)?;
        if !(self.floor.is_finite() && self.floor < 0.0 && self.floor >= -1.0) {
            return Err(ConfigurationError::invalid(
                "leaky_clamp.floor",
                format!("{} must lie in [-1, 0)", self.floor),
            ));
        }
        finite_positive("leaky_clamp.sweep_period", self.sweep_period)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaParams {
    pub steps: usize,
    pub dims: usize,
    pub alpha: f64,
    pub scan_rate: f64,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self {
            steps: 10,
            dims: 16,
            alpha: 0.8,
            scan_rate: 0.9,
        }
    }
}

impl EmaParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        within("ema.steps", self.steps, 2, 10)?;
        within("ema.dims", self.dims, 4, 16)?;
        open_unit("ema.alpha", self.alpha)?;
        finite_positive("ema.scan_rate", self.scan_rate)
    }
}

/// Direction particles travel through the architecture stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    /// Token at the bottom to LM head at the top.
    #[default]
    Upward,
    Downward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackParams {
    pub particles: usize,
    pub flow: FlowDirection,
}

impl Default for StackParams {
    fn default() -> Self {
        Self {
            particles: 80,
            flow: FlowDirection::Upward,
        }
    }
}

impl StackParams {
    fn validate(&self) -> Result<(), ConfigurationError> {
        within("stack.particles", self.particles, 1, 400)
    }
}
