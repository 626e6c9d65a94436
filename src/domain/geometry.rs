//! Polygons, triangulation, and ray casting.

use std::f64::consts::PI;

use nalgebra::{Point2, Rotation2, Vector2};
use once_cell::sync::OnceCell;

use super::Angle;

pub type Triangle = [Point2<f64>; 3];

/// A simple polygon with a compute-once triangulation.
///
/// Transforms carry the cached triangles along, so a polygon triangulated at
/// load time never pays triangulation cost again.
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    vertices: Vec<Point2<f64>>,
    triangles: OnceCell<Vec<Triangle>>,
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

impl Polygon {
    pub fn new(vertices: Vec<Point2<f64>>) -> Self {
        Self {
            vertices,
            triangles: OnceCell::new(),
        }
    }

    /// A regular polygon approximating a circle.
    pub fn circle(center: Point2<f64>, radius: f64, num_sides: usize) -> Self {
        let vertices = (0..num_sides)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / num_sides as f64;
                Point2::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect();
        Self::new(vertices)
    }

    /// The convex hull of every vertex of the given polygons, by Andrew's
    /// monotone chain.
    pub fn convex_hull(polygons: &[Polygon]) -> Polygon {
        let mut points: Vec<Point2<f64>> = polygons
            .iter()
            .flat_map(|p| p.vertices.iter().copied())
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        points.dedup();
        if points.len() < 3 {
            return Polygon::new(points);
        }

        let mut lower: Vec<Point2<f64>> = Vec::new();
        for &p in &points {
            while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }
        let mut upper: Vec<Point2<f64>> = Vec::new();
        for &p in points.iter().rev() {
            while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        Polygon::new(lower)
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn translated(&self, delta: Vector2<f64>) -> Polygon {
        self.mapped(|p| p + delta)
    }

    pub fn rotated_around(&self, angle: Angle, point: Point2<f64>) -> Polygon {
        let rotation = Rotation2::new(angle.radians());
        self.mapped(|p| point + rotation * (p - point))
    }

    /// Triangles of the polygon, computed on first use via ear clipping.
    pub fn triangles(&self) -> &[Triangle] {
        self.triangles.get_or_init(|| triangulate(&self.vertices))
    }

    fn mapped(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Polygon {
        let mapped = Polygon::new(self.vertices.iter().map(|&p| f(p)).collect());
        if let Some(triangles) = self.triangles.get() {
            let _ = mapped
                .triangles
                .set(triangles.iter().map(|t| [f(t[0]), f(t[1]), f(t[2])]).collect());
        }
        mapped
    }
}

fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn signed_area(vertices: &[Point2<f64>]) -> f64 {
    let mut sum = 0.0;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

fn triangle_contains(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, p: Point2<f64>) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of a simple polygon.
fn triangulate(vertices: &[Point2<f64>]) -> Vec<Triangle> {
    if vertices.len() < 3 {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..vertices.len()).collect();
    if signed_area(vertices) < 0.0 {
        indices.reverse();
    }

    let mut triangles = Vec::with_capacity(vertices.len() - 2);
    while indices.len() > 3 {
        let mut clipped = false;
        for i in 0..indices.len() {
            let n = indices.len();
            let i_prev = indices[(i + n - 1) % n];
            let i_curr = indices[i];
            let i_next = indices[(i + 1) % n];
            let (prev, curr, next) = (vertices[i_prev], vertices[i_curr], vertices[i_next]);
            if cross(prev, curr, next) <= 0.0 {
                continue;
            }
            let is_ear = indices.iter().all(|&j| {
                j == i_prev
                    || j == i_curr
                    || j == i_next
                    || !triangle_contains(prev, curr, next, vertices[j])
            });
            if is_ear {
                triangles.push([prev, curr, next]);
                indices.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            // Degenerate input; fan out the remainder so a triangulation
            // always exists.
            for i in 1..indices.len() - 1 {
                triangles.push([
                    vertices[indices[0]],
                    vertices[indices[i]],
                    vertices[indices[i + 1]],
                ]);
            }
            return triangles;
        }
    }
    triangles.push([
        vertices[indices[0]],
        vertices[indices[1]],
        vertices[indices[2]],
    ]);
    triangles
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    p1: Point2<f64>,
    p2: Point2<f64>,
}

impl LineSegment {
    pub fn new(p1: Point2<f64>, p2: Point2<f64>) -> Self {
        Self { p1, p2 }
    }

    /// Check if a ray defined by a position and an angle intersects the line
    /// segment.
    pub fn intersect_with_ray(&self, ray_origin: Point2<f64>, angle: Angle) -> Option<Point2<f64>> {
        // Compute the line's equation in the form of y = mx + b
        let m = (self.p2.y - self.p1.y) / (self.p2.x - self.p1.x);
        let b = self.p1.y - m * self.p1.x;

        // Compute the ray's slope from the angle
        let m_ray = angle.radians().tan();

        // Check if the ray and line are parallel
        let dm = m_ray - m;

        if dm.abs() < f64::EPSILON {
            // Ray and line are parallel
            if (m * ray_origin.x + b - ray_origin.y).abs() < f64::EPSILON
                && self.contains(ray_origin)
            {
                // Ray origin is on line segment
                return Some(ray_origin);
            } else {
                return None;
            }
        }

        let intersection = if m.is_infinite() {
            // Line is vertical
            let b_ray = ray_origin.y - m_ray * ray_origin.x;
            let x = self.p1.x;
            let y = m_ray * x + b_ray;
            Point2::new(x, y)
        } else {
            let x = (m_ray * ray_origin.x - ray_origin.y + b) / dm;
            let y = m * x + b;
            Point2::new(x, y)
        };

        // Check if the intersection point lies outside the line segment
        if !self.contains(intersection) {
            return None;
        }

        // Check if the intersection point lies in front of the ray
        let ray_dx = angle.cos();
        let ray_dy = angle.sin();

        let dx = intersection.x - ray_origin.x;
        let dy = intersection.y - ray_origin.y;

        let dot_product = dx * ray_dx + dy * ray_dy;

        if dot_product >= 0.0 {
            // Intersection is in front of the ray
            Some(intersection)
        } else {
            // Intersection is behind the ray
            None
        }
    }

    pub fn contains(&self, position: Point2<f64>) -> bool {
        position.x + f64::EPSILON >= self.p1.x.min(self.p2.x)
            && position.x - f64::EPSILON <= self.p1.x.max(self.p2.x)
            && position.y + f64::EPSILON >= self.p1.y.min(self.p2.y)
            && position.y - f64::EPSILON <= self.p1.y.max(self.p2.y)
    }
}
