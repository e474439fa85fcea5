use geo::{Coord, Polygon};
use serde::{Deserialize, Serialize};

use crate::geom::{point_in_polygon, Shape};
use crate::layer::{Layer, Primitive};

/// Which points of a feature are tested against a zone set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// The feature's centroid (buildings, parcels).
    #[default]
    Centroid,
    /// Any vertex of the feature (streets, pipes).
    AnyVertex,
}

/// Polygons of a loaded zone layer (e.g. floodplains), used for point-in-polygon tests.
/// Every test scans every polygon; there is no spatial index.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    polygons: Vec<Polygon<f64>>,
}

impl ZoneSet {
    pub fn new(polygons: Vec<Polygon<f64>>) -> Self { Self { polygons } }

    /// Collect every polygon primitive of a layer; markers and lines are ignored.
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            polygons: layer.graphics().iter()
                .flat_map(|g| match &g.primitive {
                    Primitive::Polygon(mp) => mp.0.clone(),
                    _ => Vec::new(),
                })
                .collect(),
        }
    }

    #[inline] pub fn len(&self) -> usize { self.polygons.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.polygons.is_empty() }

    /// True if the point is inside any zone polygon.
    pub fn contains(&self, pt: Coord<f64>) -> bool {
        self.polygons.iter().any(|polygon| point_in_polygon(pt, polygon))
    }

    /// Classify a shape by its anchor point(s).
    pub fn matches(&self, shape: &Shape, anchor: Anchor) -> bool {
        match anchor {
            Anchor::Centroid => shape.centroid().is_some_and(|c| self.contains(c.0)),
            Anchor::AnyVertex => shape.vertices().any(|v| self.contains(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, LineString, MultiLineString, MultiPolygon, Point};

    use super::*;

    fn zones() -> ZoneSet {
        let square = |x0: f64, y0: f64| Polygon::new(
            LineString::from(vec![
                coord! { x: x0, y: y0 }, coord! { x: x0 + 1.0, y: y0 },
                coord! { x: x0 + 1.0, y: y0 + 1.0 }, coord! { x: x0, y: y0 + 1.0 },
            ]),
            vec![],
        );
        ZoneSet::new(vec![square(0.0, 0.0), square(10.0, 10.0)])
    }

    #[test]
    fn inside_any_zone() {
        let z = zones();
        assert!(z.contains(coord! { x: 0.5, y: 0.5 }));
        assert!(z.contains(coord! { x: 10.5, y: 10.5 }));
        assert!(!z.contains(coord! { x: 5.0, y: 5.0 }));
        assert!(!ZoneSet::default().contains(coord! { x: 0.5, y: 0.5 }));
    }

    #[test]
    fn street_matches_on_any_vertex() {
        let street = Shape::Line(MultiLineString(vec![LineString::from(vec![
            coord! { x: -2.0, y: 0.5 }, coord! { x: 0.5, y: 0.5 }, coord! { x: 3.0, y: 0.5 },
        ])]));
        assert!(zones().matches(&street, Anchor::AnyVertex));
        // Passing through a zone without a vertex inside it does not count.
        let crossing = Shape::Line(MultiLineString(vec![LineString::from(vec![
            coord! { x: -2.0, y: 0.5 }, coord! { x: 3.0, y: 0.5 },
        ])]));
        assert!(!zones().matches(&crossing, Anchor::AnyVertex));
    }

    #[test]
    fn building_matches_on_centroid() {
        let building = Shape::Area(MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                coord! { x: 0.8, y: 0.8 }, coord! { x: 1.6, y: 0.8 },
                coord! { x: 1.6, y: 1.6 }, coord! { x: 0.8, y: 1.6 },
            ]),
            vec![],
        )]));
        // Centroid (1.2, 1.2) is outside although one corner is inside.
        assert!(!zones().matches(&building, Anchor::Centroid));
        assert!(zones().matches(&building, Anchor::AnyVertex));
        assert!(zones().matches(&Shape::Point(Point::new(0.2, 0.9)), Anchor::Centroid));
    }
}
