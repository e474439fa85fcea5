use geo::{Coord, MultiPolygon, Polygon};

/// Added to the edge's y-extent before dividing, so horizontal edges never divide by zero.
pub const EDGE_EPSILON: f64 = 1e-12;

/// Even-odd ray casting: cast a horizontal ray to +x from `pt` and toggle on every edge crossing.
/// The ring does not need to be closed; a duplicated closing vertex contributes a zero-length
/// edge that never crosses. Points exactly on an edge or vertex have no guaranteed answer.
pub fn point_in_ring(pt: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    if ring.len() < 3 { return false }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > pt.y) != (b.y > pt.y) {
            let x_cross = (b.x - a.x) * (pt.y - a.y) / (b.y - a.y + EDGE_EPSILON) + a.x;
            if pt.x < x_cross { inside = !inside }
        }
        j = i;
    }
    inside
}

/// Even-odd test across the exterior and every hole of a polygon.
pub fn point_in_polygon(pt: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .filter(|ring| point_in_ring(pt, &ring.0))
        .count() % 2 == 1
}

/// True if `pt` lies inside any member polygon.
#[inline]
pub fn point_in_multipolygon(pt: Coord<f64>, mp: &MultiPolygon<f64>) -> bool {
    mp.0.iter().any(|polygon| point_in_polygon(pt, polygon))
}

#[cfg(test)]
mod tests {
    use geo::{coord, LineString, Polygon};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: x0, y: y0 },
            coord! { x: x0 + size, y: y0 },
            coord! { x: x0 + size, y: y0 + size },
            coord! { x: x0, y: y0 + size },
        ]
    }

    #[test]
    fn inside_convex_polygon() {
        let ring = square(0.0, 0.0, 10.0);
        for (x, y) in [(5.0, 5.0), (0.1, 0.1), (9.9, 9.9), (0.5, 9.5)] {
            assert!(point_in_ring(coord! { x: x, y: y }, &ring), "({x}, {y}) should be inside");
        }
    }

    #[test]
    fn outside_convex_polygon() {
        let ring = square(0.0, 0.0, 10.0);
        for (x, y) in [(-1.0, 5.0), (11.0, 5.0), (5.0, -0.1), (5.0, 10.1), (-3.0, -3.0)] {
            assert!(!point_in_ring(coord! { x: x, y: y }, &ring), "({x}, {y}) should be outside");
        }
    }

    #[test]
    fn closed_and_open_rings_agree() {
        let open = square(-97.8, 30.2, 0.1);
        let mut closed = open.clone();
        closed.push(open[0]);
        for (x, y) in [(-97.75, 30.25), (-97.85, 30.25), (-97.71, 30.29)] {
            let pt = coord! { x: x, y: y };
            assert_eq!(point_in_ring(pt, &open), point_in_ring(pt, &closed));
        }
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape: notch between x=4..6 above y=4
        let ring = vec![
            coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 },
            coord! { x: 6.0, y: 10.0 }, coord! { x: 6.0, y: 4.0 }, coord! { x: 4.0, y: 4.0 },
            coord! { x: 4.0, y: 10.0 }, coord! { x: 0.0, y: 10.0 },
        ];
        assert!(!point_in_ring(coord! { x: 5.0, y: 8.0 }, &ring));
        assert!(point_in_ring(coord! { x: 2.0, y: 8.0 }, &ring));
        assert!(point_in_ring(coord! { x: 5.0, y: 2.0 }, &ring));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        let ring = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }];
        assert!(!point_in_ring(coord! { x: 0.5, y: 0.5 }, &ring));
        assert!(!point_in_ring(coord! { x: 0.0, y: 0.0 }, &[]));
    }

    #[test]
    fn hole_is_excluded() {
        let polygon = Polygon::new(
            LineString::from(square(0.0, 0.0, 10.0)),
            vec![LineString::from(square(4.0, 4.0, 2.0))],
        );
        assert!(point_in_polygon(coord! { x: 1.0, y: 1.0 }, &polygon));
        assert!(!point_in_polygon(coord! { x: 5.0, y: 5.0 }, &polygon));
    }

    #[test]
    fn any_member_of_multipolygon() {
        let mp = MultiPolygon(vec![
            Polygon::new(LineString::from(square(0.0, 0.0, 1.0)), vec![]),
            Polygon::new(LineString::from(square(5.0, 5.0, 1.0)), vec![]),
        ]);
        assert!(point_in_multipolygon(coord! { x: 5.5, y: 5.5 }, &mp));
        assert!(point_in_multipolygon(coord! { x: 0.5, y: 0.5 }, &mp));
        assert!(!point_in_multipolygon(coord! { x: 3.0, y: 3.0 }, &mp));
    }
}
