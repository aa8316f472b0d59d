//! Cairo-based rendering of scene nodes.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::color::{Color, LIGHT_GRAY, WHITE};
use super::font::FontDescriptor;
use crate::scene::{Node, NodeKind};

/// Decoded image resources keyed by their source string.
pub type ImageSet = HashMap<String, cairo::ImageSurface>;

const CONTROL_FILL: Color = Color::new(0.15, 0.39, 0.92, 1.0);
const CONTROL_LABEL_SIZE: f64 = 14.0;

/// Fills the whole target with an opaque background.
pub fn render_background(ctx: &cairo::Context, color: Color) {
    let _ = ctx.save();
    color.apply(ctx);
    ctx.set_operator(cairo::Operator::Source);
    let _ = ctx.paint();
    let _ = ctx.restore();
}

/// Renders a node and its subtree.
///
/// Children are drawn after their parent, in order, so later siblings paint
/// over earlier ones. Image nodes whose source is missing from `images` are
/// skipped.
pub fn render_node(ctx: &cairo::Context, node: &Node, images: &ImageSet) {
    let _ = ctx.save();
    ctx.translate(node.bounds.x, node.bounds.y);

    let (width, height) = (node.bounds.width, node.bounds.height);
    match &node.kind {
        NodeKind::Container {
            background,
            corner_radius,
            border,
        } => {
            if let Some(background) = background {
                rounded_rect(ctx, 0.0, 0.0, width, height, *corner_radius);
                background.apply(ctx);
                let _ = ctx.fill();
            }
            if let Some(border) = border
                && border.width > 0.0
            {
                let inset = border.width / 2.0;
                rounded_rect(
                    ctx,
                    inset,
                    inset,
                    width - border.width,
                    height - border.width,
                    *corner_radius,
                );
                border.color.apply(ctx);
                ctx.set_line_width(border.width);
                let _ = ctx.stroke();
            }
        }
        NodeKind::Text {
            text,
            color,
            size,
            font,
        } => render_text(ctx, text, *color, *size, font, width),
        NodeKind::Bar {
            value,
            fill,
            track,
            corner_radius,
        } => {
            let progress = node.animation.map_or(1.0, |a| a.progress.clamp(0.0, 1.0));
            render_bar(
                ctx,
                width,
                height,
                value.clamp(0.0, 1.0) * progress,
                *fill,
                track.unwrap_or(LIGHT_GRAY),
                *corner_radius,
            );
        }
        NodeKind::Image { source } => {
            if let Some(surface) = images.get(source) {
                render_image(ctx, surface, width, height);
            }
        }
        NodeKind::Control { label, .. } => {
            rounded_rect(ctx, 0.0, 0.0, width, height, 8.0);
            CONTROL_FILL.apply(ctx);
            let _ = ctx.fill();
            render_centered_label(ctx, label, width, height);
        }
    }

    for child in &node.children {
        render_node(ctx, child, images);
    }

    let _ = ctx.restore();
}

/// Renders wrapped text from the node origin using Pango.
pub fn render_text(
    ctx: &cairo::Context,
    text: &str,
    color: Color,
    size: f64,
    font: &FontDescriptor,
    wrap_width: f64,
) {
    let _ = ctx.save();
    ctx.set_antialias(cairo::Antialias::Best);

    let layout = pangocairo::functions::create_layout(ctx);
    let font_desc = pango::FontDescription::from_string(&font.to_pango_string(size));
    layout.set_font_description(Some(&font_desc));
    if wrap_width > 0.0 {
        layout.set_width((wrap_width * pango::SCALE as f64) as i32);
        layout.set_wrap(pango::WrapMode::WordChar);
    }
    layout.set_text(text);

    color.apply(ctx);
    ctx.move_to(0.0, 0.0);
    pangocairo::functions::show_layout(ctx, &layout);

    let _ = ctx.restore();
}

fn render_centered_label(ctx: &cairo::Context, label: &str, width: f64, height: f64) {
    if label.is_empty() {
        return;
    }
    let _ = ctx.save();
    let layout = pangocairo::functions::create_layout(ctx);
    let font_desc = pango::FontDescription::from_string(
        &FontDescriptor::new("Sans", "bold", "normal").to_pango_string(CONTROL_LABEL_SIZE),
    );
    layout.set_font_description(Some(&font_desc));
    layout.set_text(label);

    let (text_w, text_h) = layout.pixel_size();
    ctx.move_to(
        (width - text_w as f64) / 2.0,
        (height - text_h as f64) / 2.0,
    );
    WHITE.apply(ctx);
    pangocairo::functions::show_layout(ctx, &layout);
    let _ = ctx.restore();
}

/// Renders a chart bar: full-width track, then the filled fraction on top.
fn render_bar(
    ctx: &cairo::Context,
    width: f64,
    height: f64,
    fraction: f64,
    fill: Color,
    track: Color,
    corner_radius: f64,
) {
    rounded_rect(ctx, 0.0, 0.0, width, height, corner_radius);
    track.apply(ctx);
    let _ = ctx.fill();

    let filled = width * fraction;
    if filled > 0.0 {
        rounded_rect(ctx, 0.0, 0.0, filled, height, corner_radius);
        fill.apply(ctx);
        let _ = ctx.fill();
    }
}

/// Paints `surface` stretched to the node size.
fn render_image(ctx: &cairo::Context, surface: &cairo::ImageSurface, width: f64, height: f64) {
    let (src_w, src_h) = (surface.width() as f64, surface.height() as f64);
    if src_w <= 0.0 || src_h <= 0.0 || width <= 0.0 || height <= 0.0 {
        return;
    }

    let _ = ctx.save();
    ctx.rectangle(0.0, 0.0, width, height);
    ctx.clip();
    ctx.scale(width / src_w, height / src_h);
    if ctx.set_source_surface(surface, 0.0, 0.0).is_ok() {
        let _ = ctx.paint();
    }
    let _ = ctx.restore();
}

/// Adds a rectangle path with corners rounded by `radius` (clamped to fit).
fn rounded_rect(ctx: &cairo::Context, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let r = radius.min(width / 2.0).min(height / 2.0);
    if r <= 0.0 {
        ctx.rectangle(x, y, width, height);
        return;
    }

    ctx.new_sub_path();
    ctx.arc(x + width - r, y + r, r, -PI / 2.0, 0.0);
    ctx.arc(x + width - r, y + height - r, r, 0.0, PI / 2.0);
    ctx.arc(x + r, y + height - r, r, PI / 2.0, PI);
    ctx.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
    ctx.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bounds, Node};

    fn pixel(surface: &mut cairo::ImageSurface, x: usize, y: usize) -> [u8; 4] {
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        let offset = y * stride + x * 4;
        [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]
    }

    #[test]
    fn bar_fill_follows_animation_progress() {
        let bar = Node::new(
            Bounds::new(0.0, 0.0, 100.0, 10.0),
            NodeKind::Bar {
                value: 1.0,
                fill: Color::new(1.0, 0.0, 0.0, 1.0),
                track: Some(WHITE),
                corner_radius: 0.0,
            },
        )
        .with_animation(crate::scene::Animation {
            progress: 0.5,
            running: false,
        });

        let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 100, 10).unwrap();
        {
            let ctx = cairo::Context::new(&surface).unwrap();
            render_node(&ctx, &bar, &ImageSet::new());
        }
        surface.flush();

        // ARGB32 is stored little-endian: B, G, R, A.
        assert_eq!(pixel(&mut surface, 10, 5), [0, 0, 255, 255]);
        assert_eq!(pixel(&mut surface, 90, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn background_is_opaque() {
        let mut surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 4, 4).unwrap();
        {
            let ctx = cairo::Context::new(&surface).unwrap();
            render_background(&ctx, WHITE);
        }
        surface.flush();
        assert_eq!(pixel(&mut surface, 2, 2), [255, 255, 255, 255]);
    }
}
