//! Executes `RenderCommand` lists on a 2D canvas context.

use std::f64::consts::TAU;

use js_sys::Array;
use spikeviz_core::BackingSize;
use spikeviz_protocol::{Color, GradientAxis, Point, RenderCommand, Theme};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

/// A mounted canvas element and its 2D context.
pub struct CanvasTarget {
    pub canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasTarget {
    pub fn acquire(document: &Document, id: &str) -> Result<Self, JsValue> {
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id `{id}`")))?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Resize the backing buffer and pin the CSS height.
    pub fn apply_backing(&self, backing: BackingSize, css_height: f64) -> Result<(), JsValue> {
        self.canvas.set_width(backing.width);
        self.canvas.set_height(backing.height);
        self.canvas
            .style()
            .set_property("height", &format!("{css_height}px"))
    }

    pub fn enable_crosshair(&self) -> Result<(), JsValue> {
        self.canvas.style().set_property("cursor", "crosshair")
    }

    pub fn execute(&self, commands: &[RenderCommand], theme: &Theme) -> Result<(), JsValue> {
        execute(&self.ctx, commands, theme)
    }
}

pub fn execute(
    ctx: &CanvasRenderingContext2d,
    commands: &[RenderCommand],
    theme: &Theme,
) -> Result<(), JsValue> {
    // Clip scopes map onto save/restore pairs.
    let mut clips = 0_usize;
    for cmd in commands {
        match cmd {
            RenderCommand::SetTransform { transform } => {
                let [a, b, c, d, e, f] = transform.as_array();
                ctx.set_transform(a, b, c, d, e, f)?;
            }
            RenderCommand::FillRect { rect, paint } => {
                ctx.set_fill_style_str(&theme.resolve_paint(*paint).to_css());
                ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
            }
            RenderCommand::StrokeRect { rect, paint, width } => {
                ctx.set_stroke_style_str(&theme.resolve_paint(*paint).to_css());
                ctx.set_line_width(*width);
                ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
            }
            RenderCommand::FillGradient { rect, axis, stops } => {
                let gradient = match axis {
                    GradientAxis::Horizontal => {
                        ctx.create_linear_gradient(rect.x, rect.y, rect.right(), rect.y)
                    }
                    GradientAxis::Vertical => {
                        ctx.create_linear_gradient(rect.x, rect.y, rect.x, rect.bottom())
                    }
                };
                for stop in stops {
                    gradient.add_color_stop(
                        stop.offset.clamp(0.0, 1.0) as f32,
                        &theme.resolve_paint(stop.paint).to_css(),
                    )?;
                }
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
            }
            RenderCommand::DrawLine {
                from,
                to,
                paint,
                width,
                dash,
            } => {
                if let Some(dash) = dash {
                    ctx.set_line_dash(&Array::of2(&JsValue::from(dash.on), &JsValue::from(dash.off)))?;
                }
                ctx.set_stroke_style_str(&theme.resolve_paint(*paint).to_css());
                ctx.set_line_width(*width);
                ctx.begin_path();
                ctx.move_to(from.x, from.y);
                ctx.line_to(to.x, to.y);
                ctx.stroke();
                if dash.is_some() {
                    ctx.set_line_dash(&Array::new())?;
                }
            }
            RenderCommand::DrawPolyline {
                points,
                paint,
                width,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    continue;
                };
                ctx.set_stroke_style_str(&theme.resolve_paint(*paint).to_css());
                ctx.set_line_width(*width);
                ctx.set_line_join("round");
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for p in rest {
                    ctx.line_to(p.x, p.y);
                }
                ctx.stroke();
            }
            RenderCommand::FillCircle {
                center,
                radius,
                paint,
            } => {
                ctx.set_fill_style_str(&theme.resolve_paint(*paint).to_css());
                fill_disc(ctx, *center, *radius)?;
            }
            RenderCommand::FillGlow {
                center,
                inner_radius,
                outer_radius,
                paint,
            } => {
                if *outer_radius <= 0.0 {
                    continue;
                }
                let color = theme.resolve_paint(*paint);
                let gradient = ctx.create_radial_gradient(
                    center.x,
                    center.y,
                    0.0,
                    center.x,
                    center.y,
                    *outer_radius,
                )?;
                let inner = (inner_radius / outer_radius).clamp(0.0, 1.0) as f32;
                gradient.add_color_stop(0.0, &color.to_css())?;
                gradient.add_color_stop(inner, &color.to_css())?;
                gradient.add_color_stop(1.0, &transparent(color))?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                fill_disc(ctx, *center, *outer_radius)?;
            }
            RenderCommand::DrawText {
                position,
                text,
                paint,
                font,
                align,
            } => {
                ctx.set_font(&font.css());
                ctx.set_text_align(align.css());
                ctx.set_text_baseline("alphabetic");
                ctx.set_fill_style_str(&theme.resolve_paint(*paint).to_css());
                ctx.fill_text(text.as_str(), position.x, position.y)?;
            }
            RenderCommand::SetClip { rect } => {
                ctx.save();
                ctx.begin_path();
                ctx.rect(rect.x, rect.y, rect.w, rect.h);
                ctx.clip();
                clips += 1;
            }
            RenderCommand::ClearClip => {
                if clips > 0 {
                    ctx.restore();
                    clips -= 1;
                }
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
    for _ in 0..clips {
        ctx.restore();
    }
    Ok(())
}

fn fill_disc(ctx: &CanvasRenderingContext2d, center: Point, radius: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(center.x, center.y, radius.max(0.0), 0.0, TAU)?;
    ctx.fill();
    Ok(())
}

fn transparent(color: Color) -> String {
    color.with_alpha(0.0).to_css()
}
