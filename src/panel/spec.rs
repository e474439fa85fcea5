use std::path::Path;

use ahash::AHashSet;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::feature::DEFAULT_GEOMETRY_FIELD;
use crate::intersect::Anchor;
use crate::style::{PopupTemplate, StyleRule};

fn default_geometry_field() -> String { DEFAULT_GEOMETRY_FIELD.to_string() }

fn default_visible() -> bool { true }

/// One feature collection and how to turn it into a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub path: String, // Relative data path, e.g. "/data/floodplains.json"
    #[serde(default = "default_geometry_field")]
    pub geometry_field: String,
    #[serde(default)]
    pub style: StyleRule,
    #[serde(default)]
    pub popup: PopupTemplate,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Keep only features inside the polygons of this earlier staged layer.
    #[serde(default)]
    pub within: Option<String>,
    #[serde(default)]
    pub anchor: Anchor,
}

impl LayerSpec {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            geometry_field: default_geometry_field(),
            style: StyleRule::default(),
            popup: PopupTemplate::default(),
            visible: true,
            within: None,
            anchor: Anchor::default(),
        }
    }

    pub fn style(mut self, style: StyleRule) -> Self { self.style = style; self }

    pub fn popup(mut self, popup: PopupTemplate) -> Self { self.popup = popup; self }

    pub fn hidden(mut self) -> Self { self.visible = false; self }

    pub fn within(mut self, zone_layer: &str, anchor: Anchor) -> Self {
        self.within = Some(zone_layer.to_string());
        self.anchor = anchor;
        self
    }
}

/// A named initialization phase; its layers load one after another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub layers: Vec<LayerSpec>,
}

/// Attribution entry shown in the panel's sources popover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Full definition of a map panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Collections loaded concurrently, in no particular order.
    #[serde(default)]
    pub background: Vec<LayerSpec>,
    /// Stages loaded strictly in order.
    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

impl PanelSpec {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let spec: PanelSpec = serde_json::from_slice(bytes)
            .context("Failed to parse panel definition")?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read panel definition: {}", path.display()))?;
        Self::from_json_slice(&bytes)
            .with_context(|| format!("in {}", path.display()))
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Every layer spec, staged layers first in load order, then background layers.
    pub fn layers(&self) -> impl Iterator<Item = &LayerSpec> {
        self.stages.iter().flat_map(|s| s.layers.iter()).chain(self.background.iter())
    }

    /// True if some layer filters against `name`.
    pub fn is_zone_layer(&self, name: &str) -> bool {
        self.layers().any(|l| l.within.as_deref() == Some(name))
    }

    /// Check names are unique and every `within` points at a staged layer loaded earlier.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() { bail!("panel name must not be empty") }

        let mut stage_names = AHashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() { bail!("panel {:?}: stage names must not be empty", self.name) }
            if !stage_names.insert(stage.name.as_str()) {
                bail!("panel {:?}: duplicate stage {:?}", self.name, stage.name);
            }
        }

        let mut layer_names = AHashSet::new();
        for layer in self.layers() {
            if layer.name.trim().is_empty() { bail!("panel {:?}: layer names must not be empty", self.name) }
            if !layer_names.insert(layer.name.as_str()) {
                bail!("panel {:?}: duplicate layer {:?}", self.name, layer.name);
            }
        }

        for layer in &self.background {
            if let Some(zone) = &layer.within {
                bail!("panel {:?}: background layer {:?} cannot filter by {:?}", self.name, layer.name, zone);
            }
        }

        let mut loaded = AHashSet::new();
        for layer in self.stages.iter().flat_map(|s| s.layers.iter()) {
            if let Some(zone) = &layer.within {
                if !loaded.contains(zone.as_str()) {
                    bail!("panel {:?}: layer {:?} filters by {:?}, which is not loaded before it", self.name, layer.name, zone);
                }
            }
            loaded.insert(layer.name.as_str());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, layers: Vec<LayerSpec>) -> StageSpec {
        StageSpec { name: name.into(), layers }
    }

    fn panel(background: Vec<LayerSpec>, stages: Vec<StageSpec>) -> PanelSpec {
        PanelSpec { name: "test".into(), title: String::new(), sources: vec![], background, stages }
    }

    #[test]
    fn within_must_reference_earlier_staged_layer() {
        let ok = panel(vec![], vec![
            stage("zones", vec![LayerSpec::new("floods", "/data/f.json")]),
            stage("hits", vec![LayerSpec::new("hit", "/data/b.json").within("floods", Anchor::Centroid)]),
        ]);
        assert!(ok.validate().is_ok());
        assert!(ok.is_zone_layer("floods"));
        assert!(!ok.is_zone_layer("hit"));

        let forward = panel(vec![], vec![
            stage("hits", vec![LayerSpec::new("hit", "/data/b.json").within("floods", Anchor::Centroid)]),
            stage("zones", vec![LayerSpec::new("floods", "/data/f.json")]),
        ]);
        assert!(forward.validate().is_err());

        let background = panel(
            vec![LayerSpec::new("hit", "/data/b.json").within("floods", Anchor::Centroid)],
            vec![stage("zones", vec![LayerSpec::new("floods", "/data/f.json")])],
        );
        assert!(background.validate().is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let layers = panel(
            vec![LayerSpec::new("a", "/data/a.json")],
            vec![stage("s", vec![LayerSpec::new("a", "/data/b.json")])],
        );
        assert!(layers.validate().is_err());

        let stages = panel(vec![], vec![stage("s", vec![]), stage("s", vec![])]);
        assert!(stages.validate().is_err());
    }

    #[test]
    fn json_defaults() {
        let spec = PanelSpec::from_json_slice(br#"{
            "name": "crashes",
            "stages": [{"name": "crashes", "layers": [
                {"name": "crashes", "path": "/data/crashes.json",
                 "style": {"rule": "severity", "field": "crash_sev"}}
            ]}]
        }"#).unwrap();
        let layer = &spec.stages[0].layers[0];
        assert_eq!(layer.geometry_field, "the_geom");
        assert!(layer.visible);
        assert_eq!(layer.anchor, Anchor::Centroid);
        assert!(spec.background.is_empty());
        assert_eq!(spec.stage_names().collect::<Vec<_>>(), ["crashes"]);
    }
}
