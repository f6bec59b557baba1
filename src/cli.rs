use crate::config::{Config, load_config};
use crate::ir::SourceMap;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::log::debug;
use crate::parser::parse_flow;
use crate::render::{render_svg, write_output_svg};
use crate::restructure::restructure;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "png")]
use crate::render::write_output_png;

#[derive(Parser, Debug)]
#[command(name = "flow2svg", version, about = "Renders flow DSL files as SVG diagrams")]
pub struct Args {
    /// Input file (.flow or .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the computed layout as JSON to this file
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let name = match args.input.as_deref() {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        _ => "standard input".to_string(),
    };
    let flows = if is_markdown {
        extract_flow_blocks(&input)
    } else {
        vec![input]
    };

    if flows.is_empty() {
        return Err(anyhow::anyhow!("No flow diagrams found in input"));
    }

    if flows.len() == 1 {
        let output = match args.output_format {
            OutputFormat::Svg => args.output.clone(),
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
        };
        return render_one(
            &flows[0],
            &name,
            &config,
            args.output_format,
            output.as_deref(),
            args.dump_layout.as_deref(),
        );
    }

    // Multiple diagrams (Markdown input)
    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, flows.len())?;
    for (idx, flow) in flows.iter().enumerate() {
        let dump = args
            .dump_layout
            .as_deref()
            .map(|base| numbered_path(base, idx, "json"));
        let block_name = format!("{name} (block {})", idx + 1);
        render_one(
            flow,
            &block_name,
            &config,
            args.output_format,
            Some(&outputs[idx]),
            dump.as_deref(),
        )?;
    }

    Ok(())
}

fn render_one(
    source: &str,
    name: &str,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
    dump: Option<&Path>,
) -> Result<()> {
    let map = SourceMap::new(name, source);
    let flow = parse_flow(&map)?;
    let shapes = restructure(&flow, &map)?;
    let layout = compute_layout(&shapes, &config.layout)?;
    if let Some(path) = dump {
        write_layout_dump(path, &layout, &shapes)?;
    }
    let svg = render_svg(&layout, &config.theme);
    debug!(flow = name, bytes = svg.len(), "rendered flow");

    match format {
        OutputFormat::Svg => write_output_svg(&svg, output),
        OutputFormat::Png => write_png(&svg, output, config),
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
    write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: Option<&Path>, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
fn init_tracing() {}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn extract_flow_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_flow_fence(trimmed) {
                in_block = true;
                fence = start_fence;
                continue;
            }
        } else if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }

        if in_block {
            current.push(line.to_string());
        }
    }

    blocks
}

fn detect_flow_fence(line: &str) -> Option<String> {
    for fence in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let rest = rest.trim_start_matches(&fence[..1]).trim();
            if rest == "flow" || rest.starts_with("flow ") {
                return Some(fence.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn numbered_path(base: &Path, idx: usize, ext: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("flow");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}-{}.{}", stem, idx + 1, ext))
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("flow-{}.{}", idx + 1, ext)))
            .collect());
    }
    Ok((0..count).map(|idx| numbered_path(base, idx, ext)).collect())
}
