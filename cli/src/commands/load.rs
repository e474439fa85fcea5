use std::fs;

use anyhow::{anyhow, Context, Result};
use atxmap::{open_source, preset, Panel, PanelHooks, PanelSpec, ProgressEvent, PRESETS};
use tracing::info;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::LoadArgs) -> Result<()> {
    if args.list {
        for name in PRESETS { println!("{name}") }
        return Ok(());
    }

    let data = args.data.as_deref()
        .ok_or_else(|| anyhow!("a data root is required"))?;

    let mut config = super::base_config(cli)?;
    if let Some(batches) = args.batches { config.batch_count = batches }
    if let Some(ms) = args.yield_ms { config.yield_delay_ms = ms }

    let spec = match &args.panel {
        Some(path) => PanelSpec::from_file(path)?,
        None => preset(&args.preset)
            .ok_or_else(|| anyhow!("unknown preset {:?} (try --list)", args.preset))?,
    };

    let source = open_source(data, &config)?;
    let verbose = cli.verbose;
    let hooks = PanelHooks::new()
        .on_progress(move |e: &ProgressEvent| {
            if verbose > 0 { eprintln!("[load] {:>5.1}% {}", e.percent, e.stage) }
        })
        .on_layers_ready(|| eprintln!("[load] layers ready"));

    println!("[load] panel {} from {}", spec.name, data);
    let mut panel = Panel::new(spec, source, config)?.with_hooks(hooks);
    let summary = panel.load()?;

    for report in &summary.reports {
        let visible = panel.is_layer_visible(&report.layer).unwrap_or(false);
        println!(
            "{:<24} {:>7} features  {:>5} skipped  {:>7} filtered  {:>3} batches  {}",
            report.layer, report.added, report.skipped, report.filtered, report.batches,
            if visible { "shown" } else { "hidden" },
        );
    }
    for layer in &summary.failed {
        println!("{layer:<24} not loaded");
    }
    let shown: Vec<&str> = panel.layers().visible_layers().map(|l| l.name()).collect();
    println!("[load] {} of {} layers shown: {}", shown.len(), panel.layers().len(), shown.join(", "));

    if let Some(dir) = &args.export {
        fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
        for layer in panel.layers().iter() {
            let path = dir.join(format!("{}.geojson", layer.name()));
            let body = serde_json::to_vec(&layer.to_geojson())?;
            fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
            info!(layer = layer.name(), path = %path.display(), "exported");
        }
        println!("[load] wrote {} layers to {}", panel.layers().len(), dir.display());
    }

    Ok(())
}
