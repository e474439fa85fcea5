use anyhow::{anyhow, bail, Context, Result};
use geo::{Centroid, Coord, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use serde_json::Value;

/// Geometry of a single feature record.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point<f64>),
    Line(MultiLineString<f64>),
    Area(MultiPolygon<f64>),
}

impl Shape {
    /// Parse a geometry value in any of the accepted forms:
    /// a GeoJSON-typed object, an untyped `{"coordinates": ...}` object, or a bare coordinate array.
    /// Untyped coordinates are classified by nesting depth (point, line, polygon, multipolygon).
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(obj) => {
                let coords = obj.get("coordinates")
                    .ok_or_else(|| anyhow!("geometry has no coordinates"))?;
                match obj.get("type").and_then(Value::as_str) {
                    Some(ty) => Self::from_typed(ty, coords),
                    None => Self::from_untyped(coords),
                }
            }
            Value::Array(_) => Self::from_untyped(value),
            // Some exports embed the geometry as a JSON string.
            Value::String(s) => {
                let inner: Value = serde_json::from_str(s).context("geometry string is not JSON")?;
                Self::from_value(&inner)
            }
            _ => bail!("geometry must be an object or coordinate array"),
        }
    }

    fn from_typed(ty: &str, coords: &Value) -> Result<Self> {
        match ty {
            "Point" => Ok(Shape::Point(point(coords)?.into())),
            "MultiPoint" => {
                let first = array(coords)?.first()
                    .ok_or_else(|| anyhow!("empty MultiPoint"))?;
                Ok(Shape::Point(point(first)?.into()))
            }
            "LineString" => Ok(Shape::Line(MultiLineString(vec![line(coords)?]))),
            "MultiLineString" => Ok(Shape::Line(MultiLineString(
                array(coords)?.iter().map(line).collect::<Result<_>>()?
            ))),
            "Polygon" => Ok(Shape::Area(MultiPolygon(vec![polygon(coords)?]))),
            "MultiPolygon" => Ok(Shape::Area(MultiPolygon(
                array(coords)?.iter().map(polygon).collect::<Result<_>>()?
            ))),
            other => bail!("unsupported geometry type {other:?}"),
        }
    }

    fn from_untyped(coords: &Value) -> Result<Self> {
        match depth(coords) {
            1 => Ok(Shape::Point(point(coords)?.into())),
            2 => Ok(Shape::Line(MultiLineString(vec![line(coords)?]))),
            3 => Ok(Shape::Area(MultiPolygon(vec![polygon(coords)?]))),
            4 => Ok(Shape::Area(MultiPolygon(
                array(coords)?.iter().map(polygon).collect::<Result<_>>()?
            ))),
            d => bail!("cannot infer geometry from coordinate depth {d}"),
        }
    }

    /// Representative point: the point itself, or the centroid of a line or area.
    pub fn centroid(&self) -> Option<Point<f64>> {
        match self {
            Shape::Point(p) => Some(*p),
            Shape::Line(mls) => mls.centroid(),
            Shape::Area(mp) => mp.centroid(),
        }
    }

    /// Every vertex of the shape, in input order.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = Coord<f64>> + '_> {
        match self {
            Shape::Point(p) => Box::new(std::iter::once(p.0)),
            Shape::Line(mls) => Box::new(mls.0.iter().flat_map(|ls| ls.0.iter().copied())),
            Shape::Area(mp) => Box::new(mp.0.iter().flat_map(|poly| {
                std::iter::once(poly.exterior())
                    .chain(poly.interiors())
                    .flat_map(|ring| ring.0.iter().copied())
            })),
        }
    }

    #[inline]
    pub fn as_area(&self) -> Option<&MultiPolygon<f64>> {
        match self {
            Shape::Area(mp) => Some(mp),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Point(_) => "point",
            Shape::Line(_) => "line",
            Shape::Area(_) => "area",
        }
    }
}

/// Nesting depth of a coordinate array: 1 for `[x, y]`, 2 for `[[x, y], ...]`, and so on.
fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map(depth).unwrap_or(0),
        _ => 0,
    }
}

fn array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("expected a coordinate array"))
}

fn number(value: &Value) -> Result<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .ok_or_else(|| anyhow!("invalid coordinate value {value}"))
}

fn point(value: &Value) -> Result<Coord<f64>> {
    match array(value)?.as_slice() {
        [x, y, ..] => Ok(Coord { x: number(x)?, y: number(y)? }),
        _ => bail!("a position needs at least two numbers"),
    }
}

fn line(value: &Value) -> Result<LineString<f64>> {
    let coords = array(value)?.iter().map(point).collect::<Result<Vec<_>>>()?;
    if coords.len() < 2 { bail!("a line needs at least two positions") }
    Ok(LineString(coords))
}

fn ring(value: &Value) -> Result<LineString<f64>> {
    let coords = array(value)?.iter().map(point).collect::<Result<Vec<_>>>()?;
    if coords.len() < 3 { bail!("a ring needs at least three positions") }
    Ok(LineString(coords))
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(ring);
    let exterior = rings.next().ok_or_else(|| anyhow!("polygon has no rings"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn typed_point() {
        let shape = Shape::from_value(&json!({"type": "Point", "coordinates": [-97.74, 30.27]})).unwrap();
        assert_eq!(shape, Shape::Point(Point::new(-97.74, 30.27)));
    }

    #[test]
    fn string_coordinates_are_numbers() {
        let shape = Shape::from_value(&json!({"type": "Point", "coordinates": ["-97.74", "30.27"]})).unwrap();
        assert_eq!(shape, Shape::Point(Point::new(-97.74, 30.27)));
    }

    #[test]
    fn untyped_depths() {
        assert_eq!(Shape::from_value(&json!([1.0, 2.0])).unwrap().kind(), "point");
        assert_eq!(Shape::from_value(&json!([[0, 0], [1, 1]])).unwrap().kind(), "line");
        assert_eq!(Shape::from_value(&json!({"coordinates": [[[0, 0], [1, 0], [1, 1]]]})).unwrap().kind(), "area");
        let mp = Shape::from_value(&json!([[[[0, 0], [1, 0], [1, 1]]], [[[5, 5], [6, 5], [6, 6]]]])).unwrap();
        assert_eq!(mp.as_area().map(|mp| mp.0.len()), Some(2));
    }

    #[test]
    fn multilinestring_keeps_every_part() {
        let shape = Shape::from_value(&json!({
            "type": "MultiLineString",
            "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3], [4, 4]]]
        })).unwrap();
        assert_eq!(shape.vertices().count(), 5);
    }

    #[test]
    fn polygon_with_hole() {
        let shape = Shape::from_value(&json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]
            ]
        })).unwrap();
        let mp = shape.as_area().unwrap();
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    #[test]
    fn geometry_embedded_as_string() {
        let shape = Shape::from_value(&json!("{\"type\":\"Point\",\"coordinates\":[1,2]}")).unwrap();
        assert_eq!(shape, Shape::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn malformed_geometries_are_errors() {
        for bad in [
            json!(null),
            json!({"type": "Point"}),
            json!({"type": "Point", "coordinates": [1.0]}),
            json!({"type": "Point", "coordinates": ["a", "b"]}),
            json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 1]]]}),
            json!({"type": "Polygon", "coordinates": []}),
            json!({"type": "GeometryCollection", "coordinates": []}),
            json!([]),
            json!([[[[[0, 0]]]]]),
        ] {
            assert!(Shape::from_value(&bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn centroid_of_square() {
        let shape = Shape::from_value(&json!([[[0, 0], [2, 0], [2, 2], [0, 2]]])).unwrap();
        let c = shape.centroid().unwrap();
        assert!((c.x() - 1.0).abs() < 1e-9 && (c.y() - 1.0).abs() < 1e-9);
    }
}
