//! Layer stack and the particle stream flowing through it.

use rand::Rng;
use spikeviz_protocol::ThemeToken;

use crate::config::{FlowDirection, StackParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Head,
    Norm,
    Ema,
    Lif,
    Block,
    Slow,
    Fast,
    Proj,
    Embed,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub label: &'static str,
    pub caption: &'static str,
    /// Abbreviated caption for narrow surfaces.
    pub short_caption: &'static str,
    pub kind: StageKind,
    pub token: ThemeToken,
}

const fn stage(
    label: &'static str,
    caption: &'static str,
    short_caption: &'static str,
    kind: StageKind,
    token: ThemeToken,
) -> Stage {
    Stage {
        label,
        caption,
        short_caption,
        kind,
        token,
    }
}

/// Top (output) to bottom (input).
pub const STAGES: [Stage; 11] = [
    stage("LM Head", "Linear → logits [128k]", "→ logits [128k]", StageKind::Head, ThemeToken::Amber),
    stage("LayerNorm", "normalize", "normalize", StageKind::Norm, ThemeToken::Faint),
    stage("EMA Readout", "α=0.8 · collapse T→1", "collapse T→1", StageKind::Ema, ThemeToken::Teal),
    stage("Readout LIF", "extracts v_membrane", "extracts v_mem", StageKind::Lif, ThemeToken::Purple),
    stage("SpikeBlock ×6", "Resonance → FFN → Clamp", "Res → FFN → Clamp", StageKind::Block, ThemeToken::Blue),
    stage("Input LIF", "continuous → spikes", "→ spikes", StageKind::Lif, ThemeToken::Purple),
    stage("T_slow ×2", "scale=5.0  (anchor)", "scale=5 anchor", StageKind::Slow, ThemeToken::Amber),
    stage("T_fast ×8", "scale=15.0 (volatile)", "scale=15 volatile", StageKind::Fast, ThemeToken::Teal),
    stage("Temporal Proj.", "nn.Linear(D,D)", "Linear(D,D)", StageKind::Proj, ThemeToken::Muted),
    stage("Embedding", "vocab 128k → d=512", "128k → d=512", StageKind::Embed, ThemeToken::Green),
    stage("Token", "\"Hello\" → index 9426", "\"Hello\" → 9426", StageKind::Token, ThemeToken::Coral),
];

/// Fraction of the remaining distance to the target covered per frame.
pub const EASE: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Fast,
    Slow,
    Deep,
}

impl ParticleKind {
    pub fn token(self) -> ThemeToken {
        match self {
            Self::Fast => ThemeToken::Teal,
            Self::Slow => ThemeToken::Amber,
            Self::Deep => ThemeToken::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Horizontal position across the pipe, `[0, 1)`.
    pub lane: f64,
    /// Progress from input to output, `[0, 1]`.
    pub z: f64,
    pub speed: f64,
    pub kind: ParticleKind,
    pub base_size: f64,
    pub opacity: f64,
    pub size: f64,
    pub token: ThemeToken,
    /// Whether this particle stays lit inside spiking stages.
    spiking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Look {
    opacity: f64,
    size: f64,
    token: ThemeToken,
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    flow: FlowDirection,
}

impl ParticleSystem {
    pub fn new(params: &StackParams, rng: &mut impl Rng) -> Self {
        let mut particles: Vec<Particle> = (0..params.particles)
            .map(|i| {
                let slow = i % 12 == 0;
                let kind = if slow {
                    ParticleKind::Slow
                } else if rng.gen_bool(0.6) {
                    ParticleKind::Fast
                } else {
                    ParticleKind::Deep
                };
                let base_size = if slow { 3.0 } else { 2.0 };
                Particle {
                    lane: rng.r#gen::<f64>(),
                    z: rng.r#gen::<f64>(),
                    speed: if slow { 0.12 } else { 0.3 + 0.5 * rng.r#gen::<f64>() },
                    kind,
                    base_size,
                    opacity: 0.0,
                    size: base_size,
                    token: kind.token(),
                    spiking: i % 3 == 0,
                }
            })
            .collect();

        let flow = params.flow;
        for p in &mut particles {
            let look = target(p, stage_index(p.z, flow));
            p.opacity = look.opacity;
            p.size = look.size;
            p.token = look.token;
        }
        Self { particles, flow }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn flow(&self) -> FlowDirection {
        self.flow
    }

    /// Advance one frame and ease every particle toward its stage's look.
    pub fn step(&mut self) {
        for p in &mut self.particles {
            p.z += 0.016 * p.speed * 0.06;
            if p.z > 1.0 {
                p.z = 0.0;
            }
            let look = target(p, stage_index(p.z, self.flow));
            p.opacity += (look.opacity - p.opacity) * EASE;
            p.size += (look.size - p.size) * EASE;
            p.token = look.token;
        }
    }

    /// Vertical position as a fraction of the pipe height, top = 0.
    pub fn vertical_fraction(&self, p: &Particle) -> f64 {
        vertical_fraction(p.z, self.flow)
    }

    pub fn stage_of(&self, p: &Particle) -> usize {
        stage_index(p.z, self.flow)
    }
}

fn vertical_fraction(z: f64, flow: FlowDirection) -> f64 {
    match flow {
        FlowDirection::Upward => 1.0 - z,
        FlowDirection::Downward => z,
    }
}

fn stage_index(z: f64, flow: FlowDirection) -> usize {
    let n = STAGES.len();
    let idx = (vertical_fraction(z, flow) * n as f64).floor();
    if idx.is_finite() && idx > 0.0 {
        (idx as usize).min(n - 1)
    } else {
        0
    }
}

fn target(p: &Particle, stage: usize) -> Look {
    let own = Look {
        opacity: 0.7,
        size: p.base_size,
        token: p.kind.token(),
    };
    match STAGES[stage.min(STAGES.len() - 1)].kind {
        StageKind::Token | StageKind::Embed | StageKind::Proj => own,
        StageKind::Fast | StageKind::Slow => Look { opacity: 0.85, ..own },
        StageKind::Lif if p.spiking => Look {
            opacity: 0.55,
            size: p.base_size * 0.8,
            ..own
        },
        StageKind::Lif => Look {
            opacity: 0.06,
            size: p.base_size * 0.6,
            ..own
        },
        StageKind::Block => Look {
            opacity: 0.95,
            size: p.base_size * 1.4,
            ..own
        },
        StageKind::Ema | StageKind::Norm => Look {
            opacity: 0.8,
            size: p.base_size,
            token: ThemeToken::Teal,
        },
        StageKind::Head => Look {
            opacity: 0.95,
            size: p.base_size * 1.2,
            token: ThemeToken::Amber,
        },
    }
}
