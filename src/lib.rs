#[cfg(feature = "cli")]
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod log;
pub mod parser;
pub mod render;
pub mod restructure;
pub mod shape;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{FlowError, FlowIssue, ParseIssue};
pub use ir::{Flow, SourceMap, Whereer};
pub use layout::{Layout, compute_layout};
pub use parser::parse_flow;
pub use render::render_svg;
pub use restructure::{restructure, restructure_shapes};
pub use shape::ShapeFlow;
pub use theme::Theme;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

/// Renders flow source text to an SVG document using the default look.
///
/// `name` is used in error locations, usually the file name.
pub fn render(source: &str, name: &str) -> Result<String, FlowError> {
    render_with_options(source, name, &RenderOptions::default())
}

pub fn render_with_options(
    source: &str,
    name: &str,
    options: &RenderOptions,
) -> Result<String, FlowError> {
    let map = SourceMap::new(name, source);
    let flow = parse_flow(&map)?;
    let shapes = restructure(&flow, &map)?;
    let layout = compute_layout(&shapes, &options.layout)?;
    Ok(render_svg(&layout, &options.theme))
}
