use crate::layout::{ArrowLayout, Layout, LineLayout, RectLayout, TextLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

#[cfg(feature = "png")]
use crate::config::RenderConfig;

/// Writes the layout as a standalone SVG document.
pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let mut svg = String::new();
    let (width, height) = (layout.width, layout.height);

    svg.push_str("<?xml version=\"1.0\" ?>\n");
    let _ = write!(
        svg,
        "<svg version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}px\" height=\"{height}px\">\n"
    );
    svg.push_str("<!-- Generated by FlowDev tool. -->\n");
    let _ = write!(
        svg,
        "\t<rect fill=\"{}\" fill-opacity=\"1\" stroke=\"none\" stroke-opacity=\"1\" stroke-width=\"0.0\" width=\"{width}\" height=\"{height}\" x=\"0\" y=\"0\"/>",
        theme.background
    );

    for arrow in &layout.arrows {
        push_arrow(&mut svg, arrow, theme);
    }
    for rect in &layout.rects {
        push_rect(&mut svg, rect, theme);
    }
    svg.push('\n');
    for line in &layout.lines {
        push_divider(&mut svg, line, theme);
    }
    svg.push('\n');
    for text in &layout.texts {
        push_text(&mut svg, text, theme);
    }
    svg.push_str("\n</svg>\n");
    svg
}

fn push_line(svg: &mut String, stroke: &str, stroke_width: &str, from: (i32, i32), to: (i32, i32)) {
    let _ = write!(
        svg,
        "\n\t<line stroke=\"{stroke}\" stroke-opacity=\"1.0\" stroke-width=\"{stroke_width}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"/>",
        from.0, from.1, to.0, to.1
    );
}

fn push_arrow(svg: &mut String, arrow: &ArrowLayout, theme: &Theme) {
    let head = (arrow.x2, arrow.y2);
    push_line(svg, &theme.line_color, "2.5", (arrow.x1, arrow.y1), head);
    push_line(svg, &theme.line_color, "2.5", (arrow.x_tip1, arrow.y_tip1), head);
    push_line(svg, &theme.line_color, "2.5", (arrow.x_tip2, arrow.y_tip2), head);
    svg.push('\n');
}

fn push_rect(svg: &mut String, rect: &RectLayout, theme: &Theme) {
    let fill = if rect.is_plugin {
        &theme.plugin_fill
    } else {
        &theme.op_fill
    };
    let _ = write!(
        svg,
        "\n\t<rect fill=\"{fill}\" fill-opacity=\"1.0\" stroke=\"{}\" stroke-opacity=\"1.0\" stroke-width=\"2.5\" width=\"{}\" height=\"{}\" x=\"{}\" y=\"{}\"",
        theme.line_color, rect.width, rect.height, rect.x, rect.y
    );
    if !rect.is_plugin {
        svg.push_str(" rx=\"10\" ry=\"10\"");
    }
    svg.push_str("/>");
}

fn push_divider(svg: &mut String, line: &LineLayout, theme: &Theme) {
    push_line(svg, &theme.line_color, "1.0", (line.x1, line.y1), (line.x2, line.y2));
}

fn push_text(svg: &mut String, text: &TextLayout, theme: &Theme) {
    let _ = write!(
        svg,
        "\n\t<text fill=\"{}\" fill-opacity=\"1.0\" font-family=\"{}\" font-size=\"{}\" x=\"{}\" y=\"{}\" textLength=\"{}\" lengthAdjust=\"spacingAndGlyphs\">{}</text>",
        theme.text_color,
        escape_xml(&theme.font_family),
        theme.font_size,
        text.x,
        text.y,
        text.width,
        escape_xml(&text.text)
    );
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();
    opt.font_size = theme.font_size;
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
