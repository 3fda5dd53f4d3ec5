//! Every view keeps its static labels apart and on-surface across the
//! supported width range, and never records a non-finite command.

use proptest::prelude::*;
use spikeviz_core::layout::{first_overlap, Label, MIN_LAYOUT_WIDTH};
use spikeviz_core::views::{
    cascade, ema, encoder, leaky_clamp, lif, resonance, stack, stdp, default_gallery,
};
use spikeviz_core::config::{EmaParams, LeakyClampParams};
use spikeviz_core::model::EmaReadout;
use spikeviz_core::{AnimationRegistry, GalleryConfig, Scheduler, StaticHost, ThemeProvider};
use spikeviz_protocol::{Rect, RenderCommand};

fn all_labels(width: f64) -> Vec<(&'static str, f64, Vec<Label>)> {
    let ema = EmaReadout::new(&EmaParams::default());
    vec![
        (encoder::ID, encoder::HEIGHT, encoder::EncoderLayout::for_width(width).labels()),
        (lif::ID, lif::HEIGHT, lif::LifLayout::for_width(width).labels()),
        (cascade::ID, cascade::HEIGHT, cascade::CascadeLayout::for_width(width).labels(64, 3)),
        (resonance::ID, resonance::HEIGHT, resonance::ResonanceLayout::for_width(width).labels(3)),
        (stdp::ID, stdp::HEIGHT, stdp::StdpLayout::for_width(width).labels()),
        (
            leaky_clamp::ID,
            leaky_clamp::HEIGHT,
            leaky_clamp::LeakyClampLayout::for_width(width).labels(&LeakyClampParams::default()),
        ),
        (ema::ID, ema::HEIGHT, ema::EmaLayout::for_width(width).labels(&ema, Some(9))),
        (stack::ID, stack::HEIGHT, stack::StackLayout::for_width(width).labels()),
    ]
}

#[test]
fn labels_are_disjoint_and_inside_bounds() {
    let mut width = MIN_LAYOUT_WIDTH;
    while width <= 2000.0 {
        for (id, height, labels) in all_labels(width) {
            assert!(!labels.is_empty(), "{id} has no labels");
            if let Some((a, b)) = first_overlap(&labels) {
                panic!(
                    "{id} at width {width}: `{}` overlaps `{}`",
                    labels[a].text, labels[b].text
                );
            }
            let surface = Rect::new(0.0, 0.0, width, height);
            for label in &labels {
                assert!(
                    surface.contains_rect(&label.bounds()),
                    "{id} at width {width}: `{}` leaves the surface ({:?})",
                    label.text,
                    label.bounds()
                );
            }
        }
        width += 50.0;
    }
}

#[test]
fn breakpoint_neighbours_hold_the_guarantees() {
    for width in [499.0, 499.9, 500.0, 500.5] {
        for (id, _, labels) in all_labels(width) {
            assert_eq!(first_overlap(&labels), None, "{id} at {width}");
        }
    }
}

#[test]
fn metrics_respect_floors_and_ceilings() {
    for width in [200.0, 350.0, 800.0, 2000.0] {
        let enc = encoder::EncoderLayout::for_width(width);
        assert!((12.0..=26.0).contains(&enc.column_width));
        let l = lif::LifLayout::for_width(width);
        assert!((80.0..=110.0).contains(&l.label_column));
        let r = resonance::ResonanceLayout::for_width(width);
        assert!((0.3..=0.72).contains(&r.scale));
        let margin = if width < 500.0 { 30.0..=40.0 } else { 72.0..=96.0 };
        assert!(margin.contains(&r.margin_left));
        let st = stdp::StdpLayout::for_width(width);
        let column = if width < 500.0 { 52.0..=60.0 } else { 84.0..=110.0 };
        assert!(column.contains(&st.label_column));
        assert!((80.0..=96.0).contains(&st.right_column));
        let e = ema::EmaLayout::for_width(width);
        assert!((8.0..=28.0).contains(&e.cell_width));
        assert!((65.0..=80.0).contains(&e.grid_left));
        let s = stack::StackLayout::for_width(width);
        assert!((90.0..=220.0).contains(&s.label_width));
    }
}

fn command_is_finite(cmd: &RenderCommand) -> bool {
    match cmd {
        RenderCommand::FillRect { rect, .. } | RenderCommand::SetClip { rect } => rect.is_finite(),
        RenderCommand::StrokeRect { rect, width, .. } => rect.is_finite() && width.is_finite(),
        RenderCommand::FillGradient { rect, stops, .. } => {
            rect.is_finite() && stops.iter().all(|s| s.offset.is_finite())
        }
        RenderCommand::DrawLine { from, to, width, .. } => {
            from.is_finite() && to.is_finite() && width.is_finite()
        }
        RenderCommand::DrawPolyline { points, width, .. } => {
            width.is_finite() && points.iter().all(|p| p.is_finite())
        }
        RenderCommand::FillCircle { center, radius, .. } => center.is_finite() && radius.is_finite(),
        RenderCommand::FillGlow {
            center,
            inner_radius,
            outer_radius,
            ..
        } => center.is_finite() && inner_radius.is_finite() && outer_radius.is_finite(),
        RenderCommand::DrawText { position, .. } => position.is_finite(),
        RenderCommand::SetTransform { .. }
        | RenderCommand::ClearClip
        | RenderCommand::BeginGroup { .. }
        | RenderCommand::EndGroup => true,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn any_width_renders_finite_commands(
        width in 0.0f64..3000.0,
        dpr in 0.5f64..4.0,
        frames in 1usize..4,
        t0 in 0.0f64..1.0e6,
    ) {
        let host = StaticHost::new(width, dpr);
        let mut registry = AnimationRegistry::new();
        for view in default_gallery(&GalleryConfig::default()) {
            registry.register(&host, view).expect("stock views mount on a static host");
        }
        let mut scheduler = Scheduler::new(registry, ThemeProvider::default());
        for k in 0..frames {
            for frame in scheduler.frame(t0 + k as f64 * 16.7) {
                prop_assert!(frame.commands.iter().all(command_is_finite), "{}", frame.id);
                let clips = frame.commands.iter().filter(|c| matches!(c, RenderCommand::SetClip { .. })).count();
                let clears = frame.commands.iter().filter(|c| matches!(c, RenderCommand::ClearClip)).count();
                prop_assert_eq!(clips, clears);
            }
        }
    }
}
