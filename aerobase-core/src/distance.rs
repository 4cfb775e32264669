//! Great-circle primitives on a spherical Earth.
//!
//! All distances are nautical miles on a sphere of radius
//! [`EARTH_RADIUS_NM`]; there is no ellipsoid correction. These functions are
//! the only precision-sensitive code in the crate. The geo-index relies on
//! [`bounding_box_for_radius`] never excluding a point within the radius and
//! on [`min_distance_to_rect_nm`] never exceeding the true distance.

use geo::{Contains, Coord, LineString, Point, Polygon, Rect};

use crate::model::{Coordinate, CoordinateError};

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Angular padding added to bounding boxes to absorb rounding.
const BOX_MARGIN_DEG: f64 = 1e-9;

/// Great-circle distance between two coordinates in nautical miles.
///
/// Symmetric, and exactly zero for identical coordinates.
///
/// # Examples
/// ```
/// use aerobase_core::{Coordinate, distance::haversine_nm};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(1.0, 0.0).unwrap();
/// assert!((haversine_nm(a, b) - 60.04).abs() < 0.01);
/// ```
pub fn haversine_nm(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_NM * 2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Initial true course from `a` to `b` in degrees `[0, 360)`.
///
/// Returns `0.0` for coincident points.
pub fn initial_course_deg(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    let course = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if course >= 360.0 { 0.0 } else { course }
}

/// Point reached by travelling `distance_nm` from `origin` on initial course
/// `course_deg`.
///
/// # Errors
/// Returns [`CoordinateError::NotFinite`] when the distance or course is not
/// finite.
pub fn destination(
    origin: Coordinate,
    distance_nm: f64,
    course_deg: f64,
) -> Result<Coordinate, CoordinateError> {
    let angular = distance_nm / EARTH_RADIUS_NM;
    let course = course_deg.to_radians();
    let lat1 = origin.latitude().to_radians();
    let lon1 = origin.longitude().to_radians();

    let sin_lat2 = lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * course.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (course.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * sin_lat2);

    Coordinate::new(
        lat2.to_degrees().clamp(-90.0, 90.0),
        wrap_longitude(lon2.to_degrees()),
    )
}

/// Wrap a longitude into `[-180, 180]`.
fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// A latitude/longitude box that may wrap across the antimeridian.
///
/// When `west > east` the box covers `[west, 180]` and `[-180, east]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge in degrees.
    pub south: f64,
    /// Northern edge in degrees.
    pub north: f64,
    /// Western edge in degrees.
    pub west: f64,
    /// Eastern edge in degrees.
    pub east: f64,
}

impl BoundingBox {
    /// Whether the box wraps across the ±180° meridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Whether the box spans every longitude.
    pub fn spans_all_longitudes(&self) -> bool {
        self.west <= -180.0 && self.east >= 180.0
    }

    /// Whether `coordinate` lies inside the box.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        let lat = coordinate.latitude();
        let lon = coordinate.longitude();
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }

    /// Split the box into one or two non-wrapping rectangles
    /// (`x = longitude`, `y = latitude`).
    pub fn rects(&self) -> Vec<Rect<f64>> {
        let rect = |west: f64, east: f64| {
            Rect::new(
                Coord {
                    x: west,
                    y: self.south,
                },
                Coord {
                    x: east,
                    y: self.north,
                },
            )
        };
        if self.crosses_antimeridian() {
            vec![rect(self.west, 180.0), rect(-180.0, self.east)]
        } else {
            vec![rect(self.west, self.east)]
        }
    }
}

/// Conservative box containing every point within `radius_nm` of `center`.
///
/// The longitude half-width is `asin(sin δ / cos φ)` for angular radius `δ`
/// and centre latitude `φ`, which is the exact extent of a spherical cap. A
/// cap that reaches a pole is clamped at that pole and spans all longitudes.
/// Negative radii are treated as zero.
///
/// # Examples
/// ```
/// use aerobase_core::{Coordinate, distance::bounding_box_for_radius};
///
/// let fiji = Coordinate::new(-17.0, 179.9).unwrap();
/// let bbox = bounding_box_for_radius(fiji, 60.0);
/// assert!(bbox.crosses_antimeridian());
/// assert_eq!(bbox.rects().len(), 2);
/// ```
pub fn bounding_box_for_radius(center: Coordinate, radius_nm: f64) -> BoundingBox {
    let angular = radius_nm.max(0.0) / EARTH_RADIUS_NM;
    let angular_deg = angular.to_degrees();
    let lat = center.latitude();
    let lon = center.longitude();

    let south = lat - angular_deg - BOX_MARGIN_DEG;
    let north = lat + angular_deg + BOX_MARGIN_DEG;
    if south <= -90.0 || north >= 90.0 {
        return BoundingBox {
            south: south.max(-90.0),
            north: north.min(90.0),
            west: -180.0,
            east: 180.0,
        };
    }

    let ratio = angular.sin() / lat.to_radians().cos();
    if ratio >= 1.0 {
        return BoundingBox {
            south,
            north,
            west: -180.0,
            east: 180.0,
        };
    }
    let half_width = ratio.asin().to_degrees() + BOX_MARGIN_DEG;
    if half_width >= 180.0 {
        return BoundingBox {
            south,
            north,
            west: -180.0,
            east: 180.0,
        };
    }

    let mut west = lon - half_width;
    let mut east = lon + half_width;
    if west < -180.0 {
        west += 360.0;
    }
    if east > 180.0 {
        east -= 360.0;
    }
    BoundingBox {
        south,
        north,
        west,
        east,
    }
}

/// Lower bound on the great-circle distance from `point` to any point inside
/// `rect` (`x = longitude`, `y = latitude`), in nautical miles.
///
/// Combines the latitude gap with the cross-track distance to the nearest
/// bounding meridian, so the result never exceeds the true distance.
pub fn min_distance_to_rect_nm(point: Coordinate, rect: &Rect<f64>) -> f64 {
    let lat = point.latitude();
    let lon = point.longitude();
    let min = rect.min();
    let max = rect.max();

    let lat_gap = (min.y - lat).max(lat - max.y).max(0.0).to_radians();

    let lon_gap = if (min.x..=max.x).contains(&lon) {
        0.0
    } else {
        (min.x - lon)
            .rem_euclid(360.0)
            .min((lon - max.x).rem_euclid(360.0))
    };
    let cross_track = (lat.to_radians().cos() * lon_gap.min(90.0).to_radians().sin())
        .clamp(0.0, 1.0)
        .asin();

    EARTH_RADIUS_NM * lat_gap.max(cross_track)
}

/// Whether `point` lies strictly inside the ring `vertices`.
///
/// The ring is treated as planar in latitude/longitude, with longitudes
/// measured from the first vertex, so a ring spanning less than 180 degrees
/// of longitude may cross the antimeridian. Rings with fewer than three
/// vertices contain nothing, and points on an edge are outside.
pub fn point_in_polygon(point: Coordinate, vertices: &[Coordinate]) -> bool {
    let Some(first) = vertices.first() else {
        return false;
    };
    if vertices.len() < 3 {
        return false;
    }
    let origin = first.longitude();
    let planar = |c: &Coordinate| Coord {
        x: wrap_longitude(c.longitude() - origin),
        y: c.latitude(),
    };
    let ring: LineString<f64> = vertices.iter().map(planar).collect();
    Polygon::new(ring, Vec::new()).contains(&Point::from(planar(&point)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    fn square(south: f64, west: f64, north: f64, east: f64) -> Vec<Coordinate> {
        vec![
            coord(south, west),
            coord(south, east),
            coord(north, east),
            coord(north, west),
        ]
    }

    #[rstest]
    #[case(coord(0.5, 0.5), true)]
    #[case(coord(2.0, 2.0), false)]
    #[case(coord(-0.1, 0.5), false)]
    fn unit_square_containment(#[case] point: Coordinate, #[case] inside: bool) {
        assert_eq!(point_in_polygon(point, &square(0.0, 0.0, 1.0, 1.0)), inside);
    }

    #[rstest]
    #[case(coord(0.0, 179.9), true)]
    #[case(coord(0.0, -179.9), true)]
    #[case(coord(0.0, 0.0), false)]
    #[case(coord(0.0, 178.0), false)]
    fn ring_may_straddle_the_antimeridian(#[case] point: Coordinate, #[case] inside: bool) {
        let ring = square(-1.0, 179.0, 1.0, -179.0);
        assert_eq!(point_in_polygon(point, &ring), inside);
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        assert!(!point_in_polygon(coord(0.0, 0.0), &[]));
        assert!(!point_in_polygon(
            coord(0.0, 0.0),
            &[coord(-1.0, -1.0), coord(1.0, 1.0)]
        ));
    }

    #[rstest]
    #[case(coord(0.0, 0.0), coord(1.0, 0.0), 60.04)]
    #[case(coord(0.0, 0.0), coord(0.0, 1.0), 60.04)]
    #[case(coord(0.0, 0.0), coord(0.0, 180.0), 10_807.28)]
    #[case(coord(90.0, 0.0), coord(-90.0, 0.0), 10_807.28)]
    fn known_distances(#[case] a: Coordinate, #[case] b: Coordinate, #[case] expected: f64) {
        let distance = haversine_nm(a, b);
        assert!(
            (distance - expected).abs() < 0.1,
            "expected {expected}, got {distance}"
        );
    }

    #[test]
    fn antimeridian_neighbours_are_close() {
        let distance = haversine_nm(coord(0.0, 179.5), coord(0.0, -179.5));
        assert!((distance - 60.04).abs() < 0.01, "got {distance}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = coord(51.4700, -0.4543);
        let b = coord(40.6413, -73.7781);
        assert_eq!(haversine_nm(a, b), haversine_nm(b, a));
        assert_eq!(haversine_nm(a, a), 0.0);
    }

    #[rstest]
    #[case(coord(0.0, 0.0), coord(1.0, 0.0), 0.0)]
    #[case(coord(0.0, 0.0), coord(0.0, 1.0), 90.0)]
    #[case(coord(0.0, 0.0), coord(-1.0, 0.0), 180.0)]
    #[case(coord(0.0, 0.0), coord(0.0, -1.0), 270.0)]
    fn cardinal_courses(#[case] a: Coordinate, #[case] b: Coordinate, #[case] expected: f64) {
        assert!((initial_course_deg(a, b) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0)]
    #[case(45.0)]
    #[case(200.0)]
    #[case(359.0)]
    fn destination_inverts_distance_and_course(#[case] course: f64) {
        let origin = coord(35.0, 139.0);
        let target = destination(origin, 250.0, course).expect("finite input");
        assert!((haversine_nm(origin, target) - 250.0).abs() < 1e-6);
        let back = initial_course_deg(origin, target);
        let delta = (back - course).abs();
        assert!(delta.min(360.0 - delta) < 1e-6, "course {back}");
    }

    #[test]
    fn destination_wraps_across_antimeridian() {
        let target = destination(coord(0.0, 179.9), 60.0, 90.0).expect("finite input");
        assert!(target.longitude() < -179.0, "got {}", target.longitude());
    }

    #[test]
    fn destination_rejects_non_finite_distance() {
        assert!(destination(coord(0.0, 0.0), f64::NAN, 0.0).is_err());
    }

    #[rstest]
    #[case(coord(40.0, 116.0), 200.0)]
    #[case(coord(-33.9, 151.2), 1_000.0)]
    #[case(coord(0.0, 0.0), 3_000.0)]
    #[case(coord(70.0, -20.0), 400.0)]
    fn box_contains_points_on_the_circle(#[case] center: Coordinate, #[case] radius: f64) {
        let bbox = bounding_box_for_radius(center, radius);
        for step in 0..72 {
            let course = f64::from(step) * 5.0;
            let edge = destination(center, radius, course).expect("finite input");
            assert!(bbox.contains(edge), "{edge:?} outside {bbox:?}");
        }
    }

    #[test]
    fn box_near_antimeridian_wraps() {
        let bbox = bounding_box_for_radius(coord(10.0, -179.8), 60.0);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.contains(coord(10.0, 179.5)));
        assert!(bbox.contains(coord(10.0, -179.5)));
        assert!(!bbox.contains(coord(10.0, 0.0)));
        let rects = bbox.rects();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].max().x, 180.0);
        assert_eq!(rects[1].min().x, -180.0);
    }

    #[test]
    fn polar_cap_spans_all_longitudes() {
        let bbox = bounding_box_for_radius(coord(89.5, 10.0), 60.0);
        assert_eq!(bbox.north, 90.0);
        assert!(bbox.spans_all_longitudes());
        assert!(bbox.contains(coord(89.9, -170.0)));
        assert_eq!(bbox.rects().len(), 1);
    }

    #[test]
    fn zero_radius_box_still_contains_centre() {
        let center = coord(12.0, 34.0);
        assert!(bounding_box_for_radius(center, 0.0).contains(center));
    }

    #[rstest]
    #[case(coord(0.0, 0.0), (10.0, 10.0, 20.0, 20.0))]
    #[case(coord(45.0, 170.0), (-175.0, 40.0, -160.0, 50.0))]
    #[case(coord(-60.0, 0.0), (100.0, -70.0, 120.0, -50.0))]
    #[case(coord(15.0, 15.0), (10.0, 10.0, 20.0, 20.0))]
    fn rect_bound_never_exceeds_true_distance(
        #[case] point: Coordinate,
        #[case] bounds: (f64, f64, f64, f64),
    ) {
        let (x0, y0, x1, y1) = bounds;
        let rect = Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 });
        let bound = min_distance_to_rect_nm(point, &rect);
        for i in 0..=10 {
            for j in 0..=10 {
                let sample = coord(
                    y0 + (y1 - y0) * f64::from(j) / 10.0,
                    x0 + (x1 - x0) * f64::from(i) / 10.0,
                );
                assert!(bound <= haversine_nm(point, sample) + 1e-9);
            }
        }
    }

    #[test]
    fn rect_bound_is_zero_inside() {
        let rect = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
        assert_eq!(min_distance_to_rect_nm(coord(0.0, 0.0), &rect), 0.0);
    }
}
