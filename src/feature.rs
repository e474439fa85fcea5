use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};

use crate::geom::Shape;

/// Default name of the geometry field in civic open-data exports.
pub const DEFAULT_GEOMETRY_FIELD: &str = "the_geom";

/// A single fetched record: geometry plus descriptive attributes.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub index: usize, // Position in the source collection
    pub shape: Shape,
    pub attrs: Map<String, Value>,
}

impl FeatureRecord {
    /// Build a record from a raw collection entry.
    /// Plain records carry geometry under `geometry_field` next to their attributes;
    /// GeoJSON features carry `geometry` and a `properties` object, which is flattened.
    pub fn from_value(index: usize, value: &Value, geometry_field: &str) -> Result<Self> {
        let obj = value.as_object()
            .ok_or_else(|| anyhow!("record {index} is not an object"))?;

        if obj.get("type").and_then(Value::as_str) == Some("Feature") {
            let geometry = obj.get("geometry")
                .filter(|g| !g.is_null())
                .ok_or_else(|| anyhow!("feature {index} has no geometry"))?;
            let shape = Shape::from_value(geometry)
                .with_context(|| format!("feature {index}"))?;
            let attrs = obj.get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            return Ok(Self { index, shape, attrs });
        }

        let geometry = obj.get(geometry_field)
            .filter(|g| !g.is_null())
            .ok_or_else(|| anyhow!("record {index} has no {geometry_field:?} field"))?;
        let shape = Shape::from_value(geometry)
            .with_context(|| format!("record {index}"))?;
        let attrs = obj.iter()
            .filter(|(k, _)| k.as_str() != geometry_field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { index, shape, attrs })
    }

    /// Attribute rendered as text; numbers and booleans are formatted, empty strings count as missing.
    pub fn attr_str(&self, key: &str) -> Option<String> {
        match self.attrs.get(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Attribute read as a number; numeric strings are accepted.
    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        match self.attrs.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Split a fetched document into its raw records.
/// Accepts a top-level array or a GeoJSON FeatureCollection.
pub fn parse_collection(bytes: &[u8]) -> Result<Vec<Value>> {
    let doc: Value = serde_json::from_slice(bytes).context("collection is not valid JSON")?;
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(items)) => Ok(items),
            _ => bail!("object collection has no \"features\" array"),
        },
        _ => bail!("collection must be an array or a FeatureCollection"),
    }
}
