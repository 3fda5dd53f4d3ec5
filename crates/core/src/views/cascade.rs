//! Cascading activation ring. Hovering a cluster injects an event.

use spikeviz_protocol::{Font, Paint, Point, TextAlign, ThemeToken};

use super::{FrameInput, MountSpec, Visualization};
use crate::config::{CascadeParams, GalleryConfig, CASCADE_NEURONS};
use crate::frame::DrawContext;
use crate::layout::{Label, LayoutMode};
use crate::model::cascade::ACTIVE_LEVEL;
use crate::model::{CascadeModel, Phase, RingGeometry};

pub const ID: &str = "casCanvas";
pub const HEIGHT: f64 = 440.0;

/// Ring neighbours drawn as edges; wider offsets only carry signals.
const DRAWN_EDGE_REACH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeLayout {
    pub mode: LayoutMode,
    pub ring: RingGeometry,
    pub header_y: f64,
}

impl CascadeLayout {
    pub fn new(width: f64, clusters: usize) -> Self {
        let ring = RingGeometry::new(width, HEIGHT, clusters);
        Self {
            mode: LayoutMode::for_width(width),
            header_y: (ring.center.y - ring.ring_radius - 24.0).max(16.0),
            ring,
        }
    }

    pub fn for_width(width: f64) -> Self {
        Self::new(width, CascadeParams::default().clusters)
    }

    pub fn labels(&self, active: usize, radius: usize) -> Vec<Label> {
        let c = self.ring.center;
        let n = self.ring.clusters;
        let per_cluster = CASCADE_NEURONS / n.max(1);
        let (sub_font, first, second, header) = match self.mode {
            LayoutMode::Compact => (
                Font::regular(9.0),
                format!("{per_cluster} neurons / cluster"),
                format!("radius = {radius}"),
                format!("active: {active}/{n}"),
            ),
            LayoutMode::Full => (
                Font::regular(10.0),
                format!("D = {CASCADE_NEURONS} neurons / {n} = {per_cluster} per cluster"),
                format!("radius = {radius}, gain = learnable"),
                format!(
                    "active clusters: {active} / {n}  ({}%)",
                    (active as f64 / n.max(1) as f64 * 100.0).round()
                ),
            ),
        };
        vec![
            Label::new(
                header,
                Point::new(c.x, self.header_y),
                Font::semibold(11.0),
                TextAlign::Center,
                ThemeToken::Muted,
            ),
            Label::new(
                format!("{n} Clusters"),
                Point::new(c.x, c.y - 12.0),
                Font::bold(13.0),
                TextAlign::Center,
                ThemeToken::Text,
            ),
            Label::new(first, Point::new(c.x, c.y + 8.0), sub_font, TextAlign::Center, ThemeToken::Muted),
            Label::new(second, Point::new(c.x, c.y + 24.0), sub_font, TextAlign::Center, ThemeToken::Faint),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CascadeView {
    model: CascadeModel,
}

impl CascadeView {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            model: CascadeModel::new(config.cascade.clone(), config.rng_for(ID)),
        }
    }

    pub fn model(&self) -> &CascadeModel {
        &self.model
    }
}

impl Visualization for CascadeView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: true,
        }
    }

    fn update(&mut self, input: &FrameInput) {
        let ring = RingGeometry::new(input.width, input.height, self.model.clusters());
        let hovered = input.pointer.and_then(|p| ring.hit_test(p));
        self.model.step(input.clock, hovered);
    }

    fn draw(&self, ctx: &mut DrawContext, _clock: f64) {
        let layout = CascadeLayout::new(ctx.width(), self.model.clusters());
        let ring = &layout.ring;
        let n = self.model.clusters();
        let mem = self.model.mem();
        let readout = self.model.readout();

        ctx.glow(
            ring.center,
            0.0,
            ring.ring_radius * (0.25 + 0.25 * readout),
            Paint::new(ThemeToken::Purple, 0.12 + 0.5 * readout),
        );

        for i in 0..n {
            for d in 1..=self.model.radius().min(DRAWN_EDGE_REACH) {
                let j = (i + d) % n;
                let w = self.model.weight(i, j);
                ctx.line(
                    ring.node(i),
                    ring.node(j),
                    Paint::new(ThemeToken::Border2, 0.25 + 0.4 * w),
                    w * 1.5,
                );
            }
        }

        for (i, &m) in mem.iter().enumerate() {
            let p = ring.node(i);
            let level = m.min(1.0);
            let token = if m > 1.0 {
                ThemeToken::Coral
            } else if m > ACTIVE_LEVEL {
                ThemeToken::Teal
            } else {
                ThemeToken::Code
            };
            if m > ACTIVE_LEVEL {
                ctx.glow(
                    p,
                    ring.node_radius,
                    ring.node_radius * (2.0 + 2.0 * level),
                    Paint::new(token, 0.35 * level),
                );
            }
            ctx.circle(p, ring.node_radius, token);
            if m > ACTIVE_LEVEL {
                ctx.circle(p, ring.node_radius * 0.35, Paint::new(ThemeToken::Glint, 0.9 * level));
            }
        }

        for signal in self.model.signals() {
            let token = match signal.phase {
                Phase::Scatter => ThemeToken::Amber,
                Phase::Lateral => ThemeToken::Teal,
                Phase::Gather => ThemeToken::Purple,
            };
            let p = ring.signal_position(signal);
            let alpha = (signal.strength / 1.5).clamp(0.3, 1.0);
            ctx.glow(p, 1.0, 7.0, Paint::new(token, 0.4 * alpha));
            ctx.circle(p, 2.5, Paint::new(token, alpha));
        }

        for label in layout.labels(self.model.active_count(), self.model.radius()) {
            ctx.label(&label);
        }
    }
}
