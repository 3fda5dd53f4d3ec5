//! Frame recorder.
//!
//! A [`DrawContext`] collects the [`RenderCommand`]s of one frame in logical
//! pixels. Commands with a non-finite coordinate are dropped on the spot, so a
//! degenerate model value costs one missing element instead of the frame.

use spikeviz_protocol::{
    Dash, Font, GradientAxis, GradientStop, Paint, Point, Rect, RenderCommand, SharedStr,
    TextAlign, Transform,
};
use tracing::trace;

use crate::layout::Label;

#[derive(Debug)]
pub struct DrawContext {
    commands: Vec<RenderCommand>,
    width: f64,
    height: f64,
    dropped: usize,
}

impl DrawContext {
    pub(crate) fn new(transform: Transform, width: f64, height: f64) -> Self {
        Self {
            commands: vec![RenderCommand::SetTransform { transform }],
            width,
            height,
            dropped: 0,
        }
    }

    /// Logical width of the surface this frame targets.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    fn push(&mut self, command: RenderCommand, finite: bool) {
        if finite {
            self.commands.push(command);
        } else {
            self.dropped += 1;
            trace!(?command, "dropping non-finite draw command");
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, paint: impl Into<Paint>) {
        self.push(
            RenderCommand::FillRect {
                rect,
                paint: paint.into(),
            },
            rect.is_finite(),
        );
    }

    pub fn stroke_rect(&mut self, rect: Rect, paint: impl Into<Paint>, width: f64) {
        self.push(
            RenderCommand::StrokeRect {
                rect,
                paint: paint.into(),
                width,
            },
            rect.is_finite() && width.is_finite(),
        );
    }

    pub fn gradient(&mut self, rect: Rect, axis: GradientAxis, stops: Vec<GradientStop>) {
        let finite = rect.is_finite() && stops.iter().all(|s| s.offset.is_finite());
        self.push(RenderCommand::FillGradient { rect, axis, stops }, finite);
    }

    pub fn line(&mut self, from: Point, to: Point, paint: impl Into<Paint>, width: f64) {
        self.stroke_line(from, to, paint.into(), width, None);
    }

    pub fn dashed_line(
        &mut self,
        from: Point,
        to: Point,
        paint: impl Into<Paint>,
        width: f64,
        dash: Dash,
    ) {
        self.stroke_line(from, to, paint.into(), width, Some(dash));
    }

    fn stroke_line(&mut self, from: Point, to: Point, paint: Paint, width: f64, dash: Option<Dash>) {
        let finite = from.is_finite() && to.is_finite() && width.is_finite();
        self.push(
            RenderCommand::DrawLine {
                from,
                to,
                paint,
                width,
                dash,
            },
            finite,
        );
    }

    /// Stroke an open path. Dropped whole if any vertex is non-finite.
    pub fn polyline(&mut self, points: Vec<Point>, paint: impl Into<Paint>, width: f64) {
        if points.len() < 2 {
            return;
        }
        let finite = width.is_finite() && points.iter().all(Point::is_finite);
        self.push(
            RenderCommand::DrawPolyline {
                points,
                paint: paint.into(),
                width,
            },
            finite,
        );
    }

    pub fn circle(&mut self, center: Point, radius: f64, paint: impl Into<Paint>) {
        self.push(
            RenderCommand::FillCircle {
                center,
                radius,
                paint: paint.into(),
            },
            center.is_finite() && radius.is_finite() && radius >= 0.0,
        );
    }

    pub fn glow(
        &mut self,
        center: Point,
        inner_radius: f64,
        outer_radius: f64,
        paint: impl Into<Paint>,
    ) {
        let finite = center.is_finite()
            && inner_radius.is_finite()
            && outer_radius.is_finite()
            && outer_radius > 0.0;
        self.push(
            RenderCommand::FillGlow {
                center,
                inner_radius,
                outer_radius,
                paint: paint.into(),
            },
            finite,
        );
    }

    pub fn text(
        &mut self,
        position: Point,
        text: impl Into<SharedStr>,
        paint: impl Into<Paint>,
        font: Font,
        align: TextAlign,
    ) {
        self.push(
            RenderCommand::DrawText {
                position,
                text: text.into(),
                paint: paint.into(),
                font,
                align,
            },
            position.is_finite() && font.size.is_finite(),
        );
    }

    pub fn label(&mut self, label: &Label) {
        self.text(
            label.position,
            label.text.clone(),
            label.paint,
            label.font,
            label.align,
        );
    }

    /// Restrict subsequent commands to `rect` until [`DrawContext::unclip`].
    pub fn clip(&mut self, rect: Rect) {
        self.push(RenderCommand::SetClip { rect }, rect.is_finite());
    }

    pub fn unclip(&mut self) {
        self.commands.push(RenderCommand::ClearClip);
    }

    pub fn begin_group(&mut self, id: impl Into<SharedStr>, label: Option<SharedStr>) {
        self.commands.push(RenderCommand::BeginGroup {
            id: id.into(),
            label,
        });
    }

    pub fn end_group(&mut self) {
        self.commands.push(RenderCommand::EndGroup);
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Commands dropped so far for carrying non-finite values.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn finish(self) -> Vec<RenderCommand> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikeviz_protocol::ThemeToken;

    fn ctx() -> DrawContext {
        DrawContext::new(Transform::identity(), 200.0, 100.0)
    }

    #[test]
    fn starts_with_transform() {
        let commands = DrawContext::new(Transform::scale(3.0), 1.0, 1.0).finish();
        assert_eq!(
            commands,
            vec![RenderCommand::SetTransform {
                transform: Transform::scale(3.0)
            }]
        );
    }

    #[test]
    fn non_finite_commands_are_dropped() {
        let mut ctx = ctx();
        ctx.fill_rect(Rect::new(0.0, f64::NAN, 10.0, 10.0), ThemeToken::Teal);
        ctx.circle(Point::new(f64::INFINITY, 0.0), 3.0, ThemeToken::Coral);
        ctx.polyline(
            vec![Point::new(0.0, 0.0), Point::new(1.0, f64::NAN)],
            ThemeToken::Green,
            1.0,
        );
        ctx.circle(Point::new(5.0, 5.0), 3.0, ThemeToken::Coral);
        assert_eq!(ctx.dropped(), 3);
        assert_eq!(ctx.finish().len(), 2);
    }

    #[test]
    fn single_point_polyline_is_skipped_silently() {
        let mut ctx = ctx();
        ctx.polyline(vec![Point::new(1.0, 1.0)], ThemeToken::Teal, 1.0);
        assert_eq!(ctx.dropped(), 0);
        assert_eq!(ctx.commands().len(), 1);
    }

    #[test]
    fn clip_pairs_are_recorded_in_order() {
        let mut ctx = ctx();
        ctx.clip(Rect::new(80.0, 0.0, 120.0, 100.0));
        ctx.line(Point::new(0.0, 0.0), Point::new(200.0, 0.0), ThemeToken::Border2, 1.0);
        ctx.unclip();
        let commands = ctx.finish();
        assert!(matches!(commands[1], RenderCommand::SetClip { .. }));
        assert!(matches!(commands[2], RenderCommand::DrawLine { dash: None, .. }));
        assert_eq!(commands[3], RenderCommand::ClearClip);
    }
}
