//! `atlasink-export`: render a saved drawing to a display list JSON file.

use atlasink_core::{EditorState, EngineConfig, GeoPoint};
use atlasink_render::{ExportOptions, RenderResult, export_state};
use clap::Parser;
use kurbo::Size;
use std::path::PathBuf;
use std::process::ExitCode;

/// Export an AtlasInk drawing for external rasterization.
#[derive(Parser, Debug)]
#[command(name = "atlasink-export", version, about)]
struct Args {
    /// Saved drawing (`{ shapes, selectedShapeId }` JSON).
    input: PathBuf,

    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Engine configuration JSON.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output width in logical pixels.
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Output height in logical pixels.
    #[arg(long, default_value_t = 768.0)]
    height: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Margin around the drawing when fitting the view.
    #[arg(long, default_value_t = 32.0)]
    padding: f64,

    /// Fixed view as `lng,lat,zoom` instead of fitting to the shapes.
    #[arg(long, value_name = "LNG,LAT,ZOOM", value_parser = parse_view)]
    view: Option<(GeoPoint, f64)>,

    /// Directory relative icon urls are resolved against. Defaults to the
    /// input file's directory.
    #[arg(long, value_name = "DIR")]
    icons: Option<PathBuf>,
}

fn parse_view(s: &str) -> Result<(GeoPoint, f64), String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [lng, lat, zoom] => Ok((GeoPoint::new(lng, lat), zoom)),
        _ => Err("expected lng,lat,zoom".to_string()),
    }
}

fn run(args: Args) -> RenderResult<()> {
    let state = EditorState::load(&args.input)?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let icon_dir = args.icons.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let options = ExportOptions {
        size: Size::new(args.width, args.height),
        scale: args.scale,
        padding: args.padding,
        view: args.view,
        icon_dir,
    };

    let list = export_state(state, config, &options)?;
    let json = list
        .to_json()
        .map_err(|e| atlasink_render::RendererError::RenderFailed(e.to_string()))?;
    match &args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    log::info!("Exporting {}", args.input.display());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("atlasink-export: {e}");
            ExitCode::FAILURE
        }
    }
}
