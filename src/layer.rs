use anyhow::{anyhow, bail, Result};
use ahash::AHashMap;
use geo::{MultiLineString, MultiPolygon, Point};
use serde_json::{json, Map, Value};

use crate::geom::Shape;
use crate::style::Style;

/// A drawable map primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Marker(Point<f64>),
    Polygon(MultiPolygon<f64>),
    Line(MultiLineString<f64>),
}

impl From<Shape> for Primitive {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Point(p) => Primitive::Marker(p),
            Shape::Line(mls) => Primitive::Line(mls),
            Shape::Area(mp) => Primitive::Polygon(mp),
        }
    }
}

/// One primitive with its style and popup, tied back to its source record.
#[derive(Debug, Clone)]
pub struct Graphic {
    pub feature: usize, // Index of the record in its source collection
    pub primitive: Primitive,
    pub style: Style,
    pub popup: String,
}

/// A named collection of graphics.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    name: String,
    graphics: Vec<Graphic>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), graphics: Vec::new() }
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn len(&self) -> usize { self.graphics.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.graphics.is_empty() }

    #[inline] pub fn graphics(&self) -> &[Graphic] { &self.graphics }

    #[inline] pub fn add(&mut self, graphic: Graphic) { self.graphics.push(graphic) }

    /// Source indices of every graphic, in insertion order.
    pub fn feature_indices(&self) -> Vec<usize> {
        self.graphics.iter().map(|g| g.feature).collect()
    }

    /// Export the layer as a GeoJSON FeatureCollection.
    /// Each feature carries its source index, style and popup as properties.
    pub fn to_geojson(&self) -> Value {
        let features = self.graphics.iter()
            .map(|g| {
                let mut properties = Map::new();
                properties.insert("feature".into(), json!(g.feature));
                properties.insert("color".into(), json!(g.style.color));
                properties.insert("radius".into(), json!(g.style.radius));
                properties.insert("weight".into(), json!(g.style.weight));
                properties.insert("fill_opacity".into(), json!(g.style.fill_opacity));
                properties.insert("popup".into(), json!(g.popup));
                json!({
                    "type": "Feature",
                    "id": g.feature,
                    "geometry": primitive_to_geojson(&g.primitive),
                    "properties": properties,
                })
            })
            .collect::<Vec<_>>();

        json!({
            "type": "FeatureCollection",
            "name": self.name,
            "features": features,
        })
    }
}

/// Convert a primitive to a GeoJSON geometry value.
fn primitive_to_geojson(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Marker(p) => json!({
            "type": "Point",
            "coordinates": [p.x(), p.y()],
        }),
        Primitive::Line(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter()
                .map(|ls| ls.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        }),
        Primitive::Polygon(mp) => {
            let polygons = mp.0.iter()
                .map(|polygon| {
                    std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();
            json!({
                "type": "MultiPolygon",
                "coordinates": polygons,
            })
        }
    }
}

/// Attached layers of a panel with their visibility flags.
/// Layers keep attachment order; flags default per layer at attach time.
#[derive(Debug, Default)]
pub struct LayerSet {
    layers: Vec<Layer>,
    index: AHashMap<String, usize>,
    visible: AHashMap<String, bool>,
}

impl LayerSet {
    pub fn new() -> Self { Self::default() }

    /// Attach a finished layer. Names must be unique within a panel.
    pub fn attach(&mut self, layer: Layer, visible: bool) -> Result<()> {
        if self.index.contains_key(layer.name()) {
            bail!("layer {:?} is already attached", layer.name());
        }
        self.index.insert(layer.name().to_string(), self.layers.len());
        self.visible.insert(layer.name().to_string(), visible);
        self.layers.push(layer);
        Ok(())
    }

    #[inline] pub fn len(&self) -> usize { self.layers.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.layers.is_empty() }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&i| &self.layers[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> { self.layers.iter() }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.visible.get(name).copied()
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        let flag = self.visible.get_mut(name)
            .ok_or_else(|| anyhow!("no layer named {name:?}"))?;
        *flag = visible;
        Ok(())
    }

    /// Flip a layer's visibility and return the new value.
    pub fn toggle(&mut self, name: &str) -> Result<bool> {
        let flag = self.visible.get_mut(name)
            .ok_or_else(|| anyhow!("no layer named {name:?}"))?;
        *flag = !*flag;
        Ok(*flag)
    }

    /// Layers that should currently be on the map, in attachment order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| self.visible.get(layer.name()).copied().unwrap_or(false))
    }
}
