// SPDX-License-Identifier: Apache-2.0
//! Aqueduct geometry primitives.
//!
//! Pure planar geometry shared by the network model and the allocation
//! engine: points, two-point segments, polylines, and axis-aligned bounding
//! boxes. Coordinates live in a projected CRS so distances are plain
//! Euclidean meters.
#![forbid(unsafe_code)]

/// A point in projected planar coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Easting, in meters.
    pub x: f64,
    /// Northing, in meters.
    pub y: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(&self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A directed two-point line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Segment start.
    pub start: Point,
    /// Segment end.
    pub end: Point,
}

impl Segment {
    /// Creates a segment between two points.
    #[must_use]
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment length in meters.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// The point on this segment nearest to `p` (projection clamped to the
    /// segment). Degenerate zero-length segments return `start`.
    #[must_use]
    pub fn nearest_point(&self, p: Point) -> Point {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.start;
        }
        let t = ((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len_sq;
        let t = t.clamp(0.0, 1.0);
        Point::new(self.start.x + t * dx, self.start.y + t * dy)
    }

    /// Euclidean distance from `p` to the nearest point on this segment.
    #[must_use]
    pub fn distance_to_point(&self, p: Point) -> f64 {
        self.nearest_point(p).distance_to(p)
    }

    /// Tight bounding box of the segment.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb {
            min_x: self.start.x.min(self.end.x),
            min_y: self.start.y.min(self.end.y),
            max_x: self.start.x.max(self.end.x),
            max_y: self.start.y.max(self.end.y),
        }
    }
}

/// Error returned when constructing a [`LineString`] from fewer than two
/// vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooFewVertices;

impl core::fmt::Display for TooFewVertices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a line string requires at least two vertices")
    }
}

impl std::error::Error for TooFewVertices {}

/// An ordered polyline with at least two vertices.
///
/// Link geometries in the network model are `LineString`s whose first and
/// last vertex coincide with the link's endpoint node coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineString(Vec<Point>);

impl LineString {
    /// Creates a polyline from its vertices.
    ///
    /// # Errors
    ///
    /// Returns [`TooFewVertices`] when fewer than two vertices are supplied.
    pub fn new(vertices: Vec<Point>) -> Result<Self, TooFewVertices> {
        if vertices.len() < 2 {
            return Err(TooFewVertices);
        }
        Ok(Self(vertices))
    }

    /// Straight two-vertex polyline between `a` and `b`.
    #[must_use]
    pub fn straight(a: Point, b: Point) -> Self {
        Self(vec![a, b])
    }

    /// The vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.0
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.0.len()
    }

    /// First vertex.
    #[must_use]
    pub fn first(&self) -> Point {
        self.0[0]
    }

    /// Last vertex.
    #[must_use]
    pub fn last(&self) -> Point {
        self.0[self.0.len() - 1]
    }

    /// Total polyline length: the sum of its segment lengths.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    /// Iterates over the consecutive two-point segments of the polyline.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.0.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    /// Returns a copy with the first vertex replaced.
    #[must_use]
    pub fn with_first(&self, p: Point) -> Self {
        let mut v = self.0.clone();
        v[0] = p;
        Self(v)
    }

    /// Returns a copy with the last vertex replaced.
    #[must_use]
    pub fn with_last(&self, p: Point) -> Self {
        let mut v = self.0.clone();
        let last = v.len() - 1;
        v[last] = p;
        Self(v)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    /// Minimum easting.
    pub min_x: f64,
    /// Minimum northing.
    pub min_y: f64,
    /// Maximum easting.
    pub max_x: f64,
    /// Maximum northing.
    pub max_y: f64,
}

impl Aabb {
    /// Creates a box from corner coordinates, normalizing min/max.
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// The square box circumscribing a circle of `radius` around `center`.
    ///
    /// This is the bucket shape used by the allocation engine's radius
    /// expansion: every segment within `radius` of `center` intersects it.
    #[must_use]
    pub fn from_center_radius(center: Point, radius: f64) -> Self {
        Self {
            min_x: center.x - radius,
            min_y: center.y - radius,
            max_x: center.x + radius,
            max_y: center.y + radius,
        }
    }

    /// Whether two boxes overlap (closed intervals).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Whether `p` lies inside the box (closed intervals).
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}
