mod pip;
mod shape;

pub use pip::{point_in_multipolygon, point_in_polygon, point_in_ring, EDGE_EPSILON};
pub use shape::Shape;
