#![doc = "atxmap: staged, batched geo-layer loading and flood intersection for civic-data panels"]
mod config;
mod feature;
mod geom;
mod intersect;
mod layer;
mod loader;
mod panel;
mod source;
mod style;

pub mod tabular;

#[doc(inline)]
pub use config::LoaderConfig;

#[doc(inline)]
pub use feature::{parse_collection, FeatureRecord, DEFAULT_GEOMETRY_FIELD};

#[doc(inline)]
pub use geom::{point_in_multipolygon, point_in_polygon, point_in_ring, Shape, EDGE_EPSILON};

#[doc(inline)]
pub use intersect::{Anchor, ZoneSet};

#[doc(inline)]
pub use layer::{Graphic, Layer, LayerSet, Primitive};

#[doc(inline)]
pub use loader::{
    batch_size, batches, num_batches, BatchLoader, CancelToken, Cancelled, LoadReport, LoadState,
    ProgressEvent, ProgressRange, ProgressReporter, ProgressSink, StageMachine,
};

#[doc(inline)]
pub use panel::{
    preset, LayerSpec, LoadSummary, Panel, PanelHooks, PanelSpec, SourceRef, StageSpec, PRESETS,
};

#[doc(inline)]
pub use source::{open_source, DataSource, DiskSource, MemSource};

#[cfg(feature = "download")]
#[doc(inline)]
pub use source::HttpSource;

#[doc(inline)]
pub use style::{PopupField, PopupTemplate, Style, StyleRule};
