use std::path::Path;

use flow_rs_renderer::{
    FlowError, LayoutConfig, SourceMap, Theme, compute_layout, parse_flow, render_svg,
    restructure, restructure_shapes,
};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.starts_with("<?xml"), "{fixture}: missing xml header");
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.ends_with("</svg>\n"), "{fixture}: missing </svg tag");
}

fn render_fixture(path: &Path) -> Result<String, FlowError> {
    let input = std::fs::read_to_string(path).expect("fixture read failed");
    let map = SourceMap::new(path.display().to_string(), input);
    let flow = parse_flow(&map)?;
    let shapes = restructure(&flow, &map)?;
    let layout = compute_layout(&shapes, &LayoutConfig::default())?;
    Ok(render_svg(&layout, &Theme::flowdev()))
}

fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "simple.flow",
        "plugins.flow",
        "merge.flow",
        "split.flow",
        "cycle.flow",
        "continuation.flow",
        "unrelated.flow",
    ];

    for name in candidates {
        let svg = render_fixture(&fixture_path(name))
            .unwrap_or_else(|err| panic!("{name}: render failed: {err}"));
        assert_valid_svg(&svg, name);
    }
}

#[test]
fn merge_fixture_aligns_arrow_heads() {
    let input = std::fs::read_to_string(fixture_path("merge.flow")).unwrap();
    let map = SourceMap::new("merge.flow", input);
    let flow = parse_flow(&map).unwrap();
    let shapes = restructure(&flow, &map).unwrap();
    let layout = compute_layout(&shapes, &LayoutConfig::default()).unwrap();

    // Arrows in drawing order: two on the first row, the rest on the second.
    assert_eq!(layout.arrows.len(), 5);
    assert_eq!(layout.arrows[1].x2, layout.arrows[3].x2);
    let merged = layout
        .rects
        .iter()
        .find(|r| r.x == layout.arrows[1].x2)
        .expect("merged box placed at the arrow heads");
    assert!(merged.bottom() >= layout.arrows[3].y1);
}

#[test]
fn restructured_fixtures_are_stable() {
    for name in ["merge.flow", "split.flow", "cycle.flow"] {
        let input = std::fs::read_to_string(fixture_path(name)).unwrap();
        let map = SourceMap::new(name, input);
        let flow = parse_flow(&map).unwrap();
        let shapes = restructure(&flow, &map).unwrap();
        let again = restructure_shapes(shapes.clone()).unwrap();
        assert_eq!(again, shapes, "{name}");
    }
}

#[test]
fn cycle_fixture_draws_a_back_label() {
    let svg = render_fixture(&fixture_path("cycle.flow")).unwrap();
    assert!(svg.contains(">... back to: loop</text>"));
}

#[test]
fn errors_name_the_source() {
    let map = SourceMap::new(
        "broken.flow",
        "in -> [a A] -> out\nin2 -> [b] -> out2\nin3 -> [a A] -> out3",
    );
    let flow = parse_flow(&map).unwrap();
    let err = restructure(&flow, &map).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("Found errors in flow:\n"), "{text}");
    assert!(text.contains("File 'broken.flow', line 3"), "{text}");
}

#[test]
fn circles_across_rows_render() {
    let source = "in -> [b] -> x\nin2 -> [a] -> [b]\n[b] -> [a]";
    let svg = flow_rs_renderer::render(source, "circle.flow")
        .unwrap_or_else(|err| panic!("render failed: {err}"));
    assert_valid_svg(&svg, "circle.flow");
    assert!(svg.contains(">... back to: b</text>"));
}
