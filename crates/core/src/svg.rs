//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use spikeviz_protocol::{Color, GradientAxis, RenderCommand, TextAlign, Theme};

enum Open {
    Clip,
    Group,
}

/// Render one frame as an SVG document string.
///
/// Coordinates are logical pixels, so the leading `SetTransform` is not
/// applied; `width` and `height` define the viewBox.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, theme: &Theme) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:'IBM Plex Mono',monospace">"#,
    ));

    let mut open: Vec<Open> = Vec::new();
    let mut next_id = 0_usize;
    let mut fresh_id = |prefix: &str| {
        next_id += 1;
        format!("{prefix}{next_id}")
    };

    for cmd in commands {
        match cmd {
            RenderCommand::SetTransform { .. } => {}
            RenderCommand::FillRect { rect, paint } => {
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
                    rect.x,
                    rect.y,
                    rect.w.max(0.0),
                    rect.h.max(0.0),
                    fill(theme.resolve_paint(*paint)),
                ));
            }
            RenderCommand::StrokeRect { rect, paint, width } => {
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none"{} stroke-width="{width}"/>"#,
                    rect.x,
                    rect.y,
                    rect.w.max(0.0),
                    rect.h.max(0.0),
                    stroke(theme.resolve_paint(*paint)),
                ));
            }
            RenderCommand::FillGradient { rect, axis, stops } => {
                let id = fresh_id("g");
                let (x2, y2) = match axis {
                    GradientAxis::Horizontal => (1, 0),
                    GradientAxis::Vertical => (0, 1),
                };
                svg.push_str(&format!(
                    r#"<linearGradient id="{id}" x1="0" y1="0" x2="{x2}" y2="{y2}">"#
                ));
                for stop in stops {
                    push_stop(&mut svg, stop.offset, theme.resolve_paint(stop.paint));
                }
                svg.push_str("</linearGradient>");
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#{id})"/>"#,
                    rect.x,
                    rect.y,
                    rect.w.max(0.0),
                    rect.h.max(0.0),
                ));
            }
            RenderCommand::DrawLine {
                from,
                to,
                paint,
                width,
                dash,
            } => {
                let dash = dash
                    .map(|d| format!(r#" stroke-dasharray="{} {}""#, d.on, d.off))
                    .unwrap_or_default();
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{} stroke-width="{width}"{dash}/>"#,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                    stroke(theme.resolve_paint(*paint)),
                ));
            }
            RenderCommand::DrawPolyline {
                points,
                paint,
                width,
            } => {
                let path: Vec<String> = points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
                svg.push_str(&format!(
                    r#"<polyline points="{}" fill="none"{} stroke-width="{width}" stroke-linejoin="round"/>"#,
                    path.join(" "),
                    stroke(theme.resolve_paint(*paint)),
                ));
            }
            RenderCommand::FillCircle {
                center,
                radius,
                paint,
            } => {
                svg.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="{radius}"{}/>"#,
                    center.x,
                    center.y,
                    fill(theme.resolve_paint(*paint)),
                ));
            }
            RenderCommand::FillGlow {
                center,
                inner_radius,
                outer_radius,
                paint,
            } => {
                let id = fresh_id("r");
                let color = theme.resolve_paint(*paint);
                let inner = (inner_radius / outer_radius).clamp(0.0, 1.0);
                svg.push_str(&format!(r#"<radialGradient id="{id}">"#));
                push_stop(&mut svg, 0.0, color);
                push_stop(&mut svg, inner, color);
                push_stop(&mut svg, 1.0, color.with_alpha(0.0));
                svg.push_str("</radialGradient>");
                svg.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="{outer_radius}" fill="url(#{id})"/>"#,
                    center.x, center.y,
                ));
            }
            RenderCommand::DrawText {
                position,
                text,
                paint,
                font,
                align,
            } => {
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" font-size="{}" font-weight="{}" text-anchor="{anchor}"{}>{}</text>"#,
                    position.x,
                    position.y,
                    font.size,
                    font.weight.css_weight(),
                    fill(theme.resolve_paint(*paint)),
                    escape_xml(text),
                ));
            }
            RenderCommand::SetClip { rect } => {
                if matches!(open.last(), Some(Open::Clip)) {
                    open.pop();
                    svg.push_str("</g>");
                }
                let id = fresh_id("c");
                svg.push_str(&format!(
                    r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#{id})">"#,
                    rect.x,
                    rect.y,
                    rect.w.max(0.0),
                    rect.h.max(0.0),
                ));
                open.push(Open::Clip);
            }
            RenderCommand::ClearClip => {
                if matches!(open.last(), Some(Open::Clip)) {
                    open.pop();
                    svg.push_str("</g>");
                }
            }
            RenderCommand::BeginGroup { id, label } => {
                let label = label
                    .as_ref()
                    .map(|l| format!(r#" aria-label="{}""#, escape_xml(l)))
                    .unwrap_or_default();
                svg.push_str(&format!(r#"<g id="{}"{label}>"#, escape_xml(id)));
                open.push(Open::Group);
            }
            RenderCommand::EndGroup => {
                while let Some(top) = open.pop() {
                    svg.push_str("</g>");
                    if matches!(top, Open::Group) {
                        break;
                    }
                }
            }
        }
    }

    for _ in open.drain(..) {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

fn fill(color: Color) -> String {
    paint_attr("fill", color)
}

fn stroke(color: Color) -> String {
    paint_attr("stroke", color)
}

fn paint_attr(attr: &str, color: Color) -> String {
    if color.a >= 1.0 {
        format!(r#" {attr}="{}""#, color.to_hex())
    } else {
        format!(r#" {attr}="{}" {attr}-opacity="{}""#, color.to_hex(), round3(color.a))
    }
}

fn push_stop(svg: &mut String, offset: f64, color: Color) {
    svg.push_str(&format!(
        r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
        offset.clamp(0.0, 1.0),
        color.to_hex(),
        round3(color.a),
    ));
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
