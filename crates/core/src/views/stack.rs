//! Architecture stack with activations flowing from token to LM head.

use spikeviz_protocol::{Dash, Font, Paint, Point, Rect, TextAlign, ThemeToken};

use super::{FrameInput, MountSpec, Visualization};
use crate::config::GalleryConfig;
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, text_width, Label, LayoutMode};
use crate::model::{ParticleKind, ParticleSystem, StageKind, STAGES};

pub const ID: &str = "stackCanvas";
pub const HEIGHT: f64 = 820.0;

const PAD: f64 = 20.0;
const TOP: f64 = 40.0;
const BOTTOM: f64 = 44.0;
const LEGEND_GAP: f64 = 16.0;
const BLOCK_BANDS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct StackLayout {
    pub width: f64,
    pub mode: LayoutMode,
    pub label_width: f64,
    pub pipe_left: f64,
    pub pipe_width: f64,
    pub layer_height: f64,
}

impl StackLayout {
    pub fn for_width(width: f64) -> Self {
        let label_width = clamp_extent(90.0, 220.0, 0.35 * width);
        let pipe_left = PAD + label_width + 10.0;
        Self {
            width,
            mode: LayoutMode::for_width(width),
            label_width,
            pipe_left,
            pipe_width: (width - pipe_left - 40.0).max(0.0),
            layer_height: (HEIGHT - TOP - BOTTOM) / STAGES.len() as f64,
        }
    }

    pub fn stage(&self, index: usize) -> Rect {
        Rect::new(
            self.pipe_left,
            TOP + index as f64 * self.layer_height,
            self.pipe_width,
            self.layer_height - 3.0,
        )
    }

    fn stage_mid(&self, index: usize) -> f64 {
        TOP + (index as f64 + 0.5) * self.layer_height
    }

    pub fn labels(&self) -> Vec<Label> {
        let name_font = Font::bold(clamp_extent(9.0, 13.0, self.width / 30.0));
        let caption_font = Font::regular(clamp_extent(8.0, 11.0, self.width / 35.0));
        let x = PAD + self.label_width - 5.0;
        let mut labels = Vec::with_capacity(STAGES.len() * 2 + 5);

        for (i, stage) in STAGES.iter().enumerate() {
            let mid = self.stage_mid(i);
            labels.push(Label::new(stage.label, Point::new(x, mid + 3.0), name_font, TextAlign::Right, stage.token));
            labels.push(Label::new(
                self.mode.pick(stage.short_caption, stage.caption),
                Point::new(x, mid + 18.0),
                caption_font,
                TextAlign::Right,
                ThemeToken::Faint,
            ));
            if stage.kind == StageKind::Lif && self.pipe_width > 80.0 {
                labels.push(Label::new(
                    "97% sparse",
                    Point::new(self.pipe_left + self.pipe_width - 6.0, mid + 4.0),
                    Font::semibold(10.0),
                    TextAlign::Right,
                    Paint::new(ThemeToken::Purple, 0.8),
                ));
            }
        }

        let legend_y = HEIGHT - 18.0;
        let font = Font::regular(10.0);
        let entry = |text: &'static str, x: f64, y: f64, kind: ParticleKind| {
            Label::new(text, Point::new(x, y), font, TextAlign::Left, kind.token())
        };
        match self.mode {
            LayoutMode::Compact => {
                let fast = "● fast";
                labels.push(entry(fast, PAD, legend_y - 14.0, ParticleKind::Fast));
                labels.push(entry(
                    "● slow",
                    PAD + text_width(fast, font.size) + LEGEND_GAP,
                    legend_y - 14.0,
                    ParticleKind::Slow,
                ));
                labels.push(entry("● deep features", PAD, legend_y, ParticleKind::Deep));
            }
            LayoutMode::Full => {
                let entries = [
                    ("● T_fast activations", ParticleKind::Fast),
                    ("● T_slow activations", ParticleKind::Slow),
                    ("● deep block features", ParticleKind::Deep),
                ];
                let total: f64 = entries.iter().map(|(t, _)| text_width(t, font.size)).sum::<f64>()
                    + LEGEND_GAP * (entries.len() - 1) as f64;
                let mut x = ((self.width - total) / 2.0).max(PAD);
                for (text, kind) in entries {
                    labels.push(entry(text, x, legend_y, kind));
                    x += text_width(text, font.size) + LEGEND_GAP;
                }
            }
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct StackView {
    particles: ParticleSystem,
}

impl StackView {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            particles: ParticleSystem::new(&config.stack, &mut config.rng_for(ID)),
        }
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }
}

impl Visualization for StackView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn update(&mut self, _input: &FrameInput) {
        self.particles.step();
    }

    fn draw(&self, ctx: &mut DrawContext, _clock: f64) {
        let layout = StackLayout::for_width(ctx.width());

        for (i, stage) in STAGES.iter().enumerate() {
            let r = layout.stage(i);
            ctx.fill_rect(r, Paint::new(stage.token, 0.07));
            ctx.stroke_rect(r, Paint::new(stage.token, 0.3), 1.0);
            match stage.kind {
                StageKind::Block => {
                    let band = r.h / BLOCK_BANDS as f64;
                    for b in 1..BLOCK_BANDS {
                        let y = r.y + b as f64 * band;
                        ctx.line(
                            Point::new(r.x, y),
                            Point::new(r.right(), y),
                            Paint::new(stage.token, 0.25),
                            1.0,
                        );
                    }
                }
                StageKind::Lif => {
                    let y = r.y + r.h / 2.0;
                    ctx.dashed_line(
                        Point::new(r.x, y),
                        Point::new(r.right(), y),
                        Paint::new(stage.token, 0.35),
                        1.0,
                        Dash::new(2.0, 4.0),
                    );
                }
                _ => {}
            }
        }

        let pipe_top = TOP;
        let pipe_height = layout.layer_height * STAGES.len() as f64;
        for p in self.particles.particles() {
            let center = Point::new(
                layout.pipe_left + p.lane * layout.pipe_width,
                pipe_top + self.particles.vertical_fraction(p) * pipe_height,
            );
            ctx.glow(center, p.size * 0.5, p.size * 3.0, Paint::new(p.token, 0.3 * p.opacity));
            ctx.circle(center, p.size, Paint::new(p.token, p.opacity));
        }

        for label in layout.labels() {
            ctx.label(&label);
        }
    }
}
