mod presets;
mod spec;

use std::{sync::Arc, thread};

use ahash::AHashMap;
use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::LoaderConfig;
use crate::feature::parse_collection;
use crate::intersect::ZoneSet;
use crate::layer::{Layer, LayerSet};
use crate::loader::{
    BatchLoader, CancelToken, Cancelled, LoadReport, LoadState, ProgressRange,
    ProgressReporter, ProgressSink, StageMachine,
};
use crate::source::DataSource;

pub use presets::{preset, PRESETS};
pub use spec::{LayerSpec, PanelSpec, SourceRef, StageSpec};

/// Notifications from a panel to whatever embeds it.
#[derive(Default)]
pub struct PanelHooks {
    /// Called once, after the last stage completes.
    pub on_layers_ready: Option<Box<dyn FnMut() + Send>>,
    /// Called with the new value whenever fullscreen changes.
    pub on_fullscreen_change: Option<Box<dyn FnMut(bool) + Send>>,
    /// Called after every batch of a staged collection.
    pub on_progress: Option<ProgressSink>,
}

impl PanelHooks {
    pub fn new() -> Self { Self::default() }

    pub fn on_layers_ready(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_layers_ready = Some(Box::new(f));
        self
    }

    pub fn on_fullscreen_change(mut self, f: impl FnMut(bool) + Send + 'static) -> Self {
        self.on_fullscreen_change = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&crate::loader::ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }
}

/// What a completed load produced.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub reports: Vec<LoadReport>, // Staged layers in load order, then background layers
    pub failed: Vec<String>,      // Layers whose collection could not be fetched or parsed
}

impl LoadSummary {
    pub fn report(&self, layer: &str) -> Option<&LoadReport> {
        self.reports.iter().find(|r| r.layer == layer)
    }
}

/// Result of fetching and loading a single collection.
enum Collection {
    Loaded(Layer, LoadReport),
    Failed,
}

/// Fetch, parse and batch-load one collection. Fetch and parse failures are logged and
/// reported as `Failed`; only cancellation is an error.
fn load_collection(
    source: &dyn DataSource,
    config: &LoaderConfig,
    cancel: &CancelToken,
    spec: &LayerSpec,
    zones: Option<&ZoneSet>,
    on_batch: &mut dyn FnMut(usize, usize),
) -> Result<Collection> {
    let records = match source.fetch(&spec.path).and_then(|bytes| parse_collection(&bytes)) {
        Ok(records) => records,
        Err(e) => {
            warn!(layer = %spec.name, path = %spec.path, "collection not loaded: {e:#}");
            return Ok(Collection::Failed);
        }
    };
    cancel.check()?;

    let (layer, report) = BatchLoader::new(config, cancel).load(spec, &records, zones, on_batch)?;
    info!(
        layer = %spec.name, added = report.added, skipped = report.skipped,
        filtered = report.filtered, "collection loaded"
    );
    Ok(Collection::Loaded(layer, report))
}

/// A map panel: staged and background layer loading plus its view state.
pub struct Panel {
    spec: PanelSpec,
    source: Arc<dyn DataSource>,
    config: LoaderConfig,
    hooks: PanelHooks,
    cancel: CancelToken,
    machine: StageMachine,
    layers: LayerSet,
    zones: AHashMap<String, ZoneSet>,
    summary: Option<LoadSummary>,
    fullscreen: bool,
    sources_open: bool,
    loaded: bool,
    ready: bool,
}

impl Panel {
    pub fn new(spec: PanelSpec, source: Arc<dyn DataSource>, config: LoaderConfig) -> Result<Self> {
        spec.validate()?;
        config.validate()?;
        let machine = StageMachine::new(spec.stage_names());
        Ok(Self {
            spec,
            source,
            config,
            hooks: PanelHooks::default(),
            cancel: CancelToken::new(),
            machine,
            layers: LayerSet::new(),
            zones: AHashMap::new(),
            summary: None,
            fullscreen: false,
            sources_open: false,
            loaded: false,
            ready: false,
        })
    }

    pub fn with_hooks(mut self, hooks: PanelHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Load every collection: background ones concurrently, stages in order on this thread.
    ///
    /// Each stage's layers are attached as soon as they finish; background layers are attached
    /// after the last stage, once they have all finished. Only then does the state reach
    /// `Complete` and `on_layers_ready` fire, exactly once; a panel can only be loaded once.
    /// If the cancel token fires first, loading stops at the next batch or stage boundary,
    /// every layer is dropped and [`Cancelled`] is returned. Cancelling after that is ignored.
    pub fn load(&mut self) -> Result<LoadSummary> {
        if self.loaded { bail!("panel {:?} has already been loaded", self.spec.name) }
        self.loaded = true;

        match self.load_all() {
            Ok(summary) => {
                self.summary = Some(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                if e.is::<Cancelled>() {
                    info!(panel = %self.spec.name, "load cancelled, discarding layers");
                    self.layers = LayerSet::new();
                    self.zones.clear();
                }
                Err(e)
            }
        }
    }

    fn load_all(&mut self) -> Result<LoadSummary> {
        let Self { spec, source, config, hooks, cancel, machine, layers, zones, ready, .. } = self;
        let (spec, source, config, cancel) = (&*spec, &**source, &*config, &*cancel);

        cancel.check()?;
        machine.advance(LoadState::Map)?;
        info!(panel = %spec.name, stages = spec.stages.len(), background = spec.background.len(), "loading panel");

        let mut summary = LoadSummary::default();

        thread::scope(|scope| -> Result<()> {
            let background = spec.background.iter()
                .map(|layer_spec| (layer_spec, scope.spawn(move || {
                    load_collection(source, config, cancel, layer_spec, None, &mut |_, _| {})
                })))
                .collect::<Vec<_>>();

            let empty = ZoneSet::default();
            let ranges = ProgressRange::FULL.split(spec.stages.len());

            for (stage, range) in spec.stages.iter().zip(ranges) {
                cancel.check()?;
                machine.enter(&stage.name)?;
                info!(panel = %spec.name, stage = %stage.name, "stage started");

                let mut reporter = ProgressReporter::new(stage.name.as_str(), hooks.on_progress.clone(), range.start);
                if stage.layers.is_empty() { reporter.publish(range.end); }

                for (layer_spec, part) in stage.layers.iter().zip(range.split(stage.layers.len())) {
                    let within = layer_spec.within.as_deref()
                        .map(|zone| zones.get(zone).unwrap_or(&empty));

                    let outcome = load_collection(source, config, cancel, layer_spec, within, &mut |done, total| {
                        reporter.publish(part.at(done, total));
                    })?;

                    match outcome {
                        Collection::Loaded(layer, report) => {
                            if spec.is_zone_layer(&layer_spec.name) {
                                zones.insert(layer_spec.name.clone(), ZoneSet::from_layer(&layer));
                            }
                            layers.attach(layer, layer_spec.visible)?;
                            summary.reports.push(report);
                        }
                        Collection::Failed => {
                            reporter.publish(part.end);
                            summary.failed.push(layer_spec.name.clone());
                        }
                    }
                }

                if !config.stage_delay().is_zero() { thread::sleep(config.stage_delay()) }
            }

            for (layer_spec, handle) in background {
                let outcome = match handle.join() {
                    Ok(outcome) => outcome?,
                    Err(panic) => std::panic::resume_unwind(panic),
                };
                match outcome {
                    Collection::Loaded(layer, report) => {
                        layers.attach(layer, layer_spec.visible)?;
                        summary.reports.push(report);
                    }
                    Collection::Failed => summary.failed.push(layer_spec.name.clone()),
                }
            }
            cancel.check()
        })?;

        // Committed: cancels from here on are ignored.
        machine.advance(LoadState::Complete)?;
        info!(panel = %spec.name, "panel ready");
        if !*ready {
            *ready = true;
            if let Some(on_ready) = hooks.on_layers_ready.as_mut() { on_ready() }
        }

        Ok(summary)
    }

    #[inline] pub fn spec(&self) -> &PanelSpec { &self.spec }

    #[inline] pub fn state(&self) -> &LoadState { self.machine.state() }

    #[inline] pub fn history(&self) -> &[LoadState] { self.machine.history() }

    /// True once the ready notification has been sent.
    #[inline] pub fn is_ready(&self) -> bool { self.ready }

    #[inline] pub fn layers(&self) -> &LayerSet { &self.layers }

    /// Per-layer reports of the last successful load.
    #[inline] pub fn summary(&self) -> Option<&LoadSummary> { self.summary.as_ref() }

    #[inline] pub fn layer(&self, name: &str) -> Option<&Layer> { self.layers.get(name) }

    /// Token that abandons the load from another thread.
    #[inline] pub fn cancel_token(&self) -> CancelToken { self.cancel.clone() }

    pub fn toggle_layer(&mut self, name: &str) -> Result<bool> { self.layers.toggle(name) }

    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        self.layers.set_visible(name, visible)
    }

    pub fn is_layer_visible(&self, name: &str) -> Option<bool> { self.layers.is_visible(name) }

    #[inline] pub fn is_fullscreen(&self) -> bool { self.fullscreen }

    /// Set fullscreen; the host is notified only when the value changes.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen == fullscreen { return }
        self.fullscreen = fullscreen;
        if let Some(notify) = self.hooks.on_fullscreen_change.as_mut() { notify(fullscreen) }
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.set_fullscreen(!self.fullscreen);
        self.fullscreen
    }

    #[inline] pub fn sources_open(&self) -> bool { self.sources_open }

    /// Open or close the source attribution popover.
    pub fn toggle_sources(&mut self) -> bool {
        self.sources_open = !self.sources_open;
        self.sources_open
    }

    #[inline] pub fn sources(&self) -> &[SourceRef] { &self.spec.sources }
}
