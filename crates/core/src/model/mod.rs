//! Numeric models behind the views. None of them know about surfaces or
//! themes, so their recurrences can be tested directly.

pub mod activation;
pub mod cascade;
pub mod ema;
pub mod encoder;
pub mod lif;
pub mod resonance;
pub mod stack;
pub mod stdp;

pub use activation::{leaky_clamp, relu, sweep_position};
pub use cascade::{CascadeModel, Phase, RingGeometry, Signal};
pub use ema::EmaReadout;
pub use encoder::{ColumnKind, ColumnSample, TemporalEncoder};
pub use lif::{LifSample, LifTrace};
pub use resonance::ResonanceModel;
pub use stack::{ParticleKind, ParticleSystem, Stage, StageKind, STAGES};
pub use stdp::StdpTrace;

/// Index into a looping buffer of `len` samples, `offset` samples in.
pub(crate) fn wrap_index(offset: usize, px: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (offset + px) % len }
}

/// Scroll offset for `clock` seconds at `rate` samples per second.
pub(crate) fn scroll_offset(clock: f64, rate: f64, len: usize) -> usize {
    let samples = (clock * rate).floor();
    if len == 0 || !samples.is_finite() || samples < 0.0 {
        return 0;
    }
    (samples as u64 % len as u64) as usize
}
