use std::process::ExitCode;

use netdiagram::settings::{LayoutSettings, load_settings};
use netdiagram::{EntityManager, GraphLayout, Point, Viewport};
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: netdiagram <layout.json> [--settings <file>] [--zoom <level>]";

struct Args {
    layout_path: String,
    settings_path: Option<String>,
    zoom: f64,
}

fn parse_args() -> Result<Args, String> {
    let mut it = std::env::args().skip(1);
    let mut layout_path = None;
    let mut settings_path = None;
    let mut zoom = 1.0;
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => settings_path = Some(it.next().ok_or(USAGE)?),
            "--zoom" => {
                let raw = it.next().ok_or(USAGE)?;
                zoom = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|z| z.is_finite() && *z > 0.0)
                    .ok_or_else(|| format!("invalid zoom level `{raw}`"))?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if layout_path.is_none() => layout_path = Some(arg.clone()),
            _ => return Err(USAGE.to_string()),
        }
    }
    Ok(Args {
        layout_path: layout_path.ok_or(USAGE)?,
        settings_path,
        zoom,
    })
}

fn run(args: Args) -> Result<(), String> {
    let settings = match &args.settings_path {
        Some(path) => load_settings(path).map_err(|e| format!("{path}: {e}"))?,
        None => LayoutSettings::default(),
    };
    let config = settings.to_config().map_err(|e| e.to_string())?;
    let data = std::fs::read_to_string(&args.layout_path)
        .map_err(|e| format!("{}: {e}", args.layout_path))?;
    let layout = GraphLayout::from_json_with(&data, config, EntityManager::new())
        .map_err(|e| format!("{}: {e}", args.layout_path))?;

    let center = layout.positioning_input(false, None).center;
    let viewport = Viewport::centered(layout.config(), center, Point::new(1280.0, 800.0), args.zoom);
    let plan = layout.plan_render(&viewport);

    println!("vertices:   {}", layout.get_vertices().len());
    println!("edges:      {}", layout.get_edges().len());
    println!(
        "groupings:  {} ({} drawn)",
        layout.get_groupings().len(),
        layout.get_render_groupings().len()
    );
    let view = viewport.view_box;
    println!(
        "zoom {}: {:.1} x {:.1} grid units around ({:.1}, {:.1})",
        args.zoom,
        view.width(),
        view.height(),
        view.center().x,
        view.center().y
    );
    println!("  labels as swatches: {}", plan.label_redundant);
    println!("  windowing:          {}", plan.windowing);
    println!(
        "  visible:            {} vertices, {} edges, {} groupings",
        plan.vertices.len(),
        plan.edges.len(),
        plan.groupings.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let result = parse_args().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{msg}");
            ExitCode::FAILURE
        }
    }
}
