//! Range sensor with a view cone cast against the maze.

use nalgebra::{Point2, Rotation2, Vector2};

use super::{Angle, Maze, Polygon};

/// Rays per view cone; one more endpoint than this fans out of the lens.
const NUM_VIEW_RAYS: usize = 12;

#[derive(Clone, Debug)]
pub struct Sensor {
    initial_position: Point2<f64>,
    initial_direction: Angle,
    range: f64,
    half_width: Angle,
    initial_polygon: Polygon,
    initial_view_polygon: Polygon,
    current_reading: f64,
}

impl Sensor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        position_in_body: Vector2<f64>,
        direction_in_body: Angle,
        radius: f64,
        range: f64,
        half_width: Angle,
        initial_translation: Point2<f64>,
        initial_rotation: Angle,
        maze: &Maze,
    ) -> Self {
        let initial_position =
            initial_translation + Rotation2::new(initial_rotation.radians()) * position_in_body;
        let initial_direction = direction_in_body + initial_rotation;
        let initial_polygon = Polygon::circle(initial_position, radius, 8);
        let initial_view_polygon =
            view_polygon(initial_position, initial_direction, range, half_width, maze);
        let current_reading = reading(initial_position, initial_direction, range, half_width, maze);
        Self {
            initial_position,
            initial_direction,
            range,
            half_width,
            initial_polygon,
            initial_view_polygon,
            current_reading,
        }
    }

    pub fn initial_position(&self) -> Point2<f64> {
        self.initial_position
    }

    pub fn initial_direction(&self) -> Angle {
        self.initial_direction
    }

    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    pub fn initial_view_polygon(&self) -> &Polygon {
        &self.initial_view_polygon
    }

    /// The latest reading: 0.0 when every ray runs clear, approaching 1.0 as
    /// walls close in on the lens.
    pub fn read(&self) -> f64 {
        self.current_reading
    }

    pub(crate) fn update_reading(&mut self, position: Point2<f64>, direction: Angle, maze: &Maze) {
        self.current_reading = reading(position, direction, self.range, self.half_width, maze);
    }

    /// The view cone at the given pose, clipped by the maze's walls.
    pub fn current_view_polygon(
        &self,
        position: Point2<f64>,
        direction: Angle,
        maze: &Maze,
    ) -> Polygon {
        view_polygon(position, direction, self.range, self.half_width, maze)
    }
}

/// Per-ray wall distances across the cone, capped at the sensing range.
fn cast_rays(
    position: Point2<f64>,
    direction: Angle,
    range: f64,
    half_width: Angle,
    maze: &Maze,
) -> Vec<(Angle, f64)> {
    (0..=NUM_VIEW_RAYS)
        .map(|i| {
            let fraction = i as f64 / NUM_VIEW_RAYS as f64;
            let angle = direction - half_width + half_width * 2.0 * fraction;
            let distance = maze
                .distance_to_next_wall(position, angle)
                .map_or(range, |d| d.min(range));
            (angle, distance)
        })
        .collect()
}

fn reading(
    position: Point2<f64>,
    direction: Angle,
    range: f64,
    half_width: Angle,
    maze: &Maze,
) -> f64 {
    let rays = cast_rays(position, direction, range, half_width, maze);
    1.0 - rays.iter().map(|&(_, distance)| distance / range).sum::<f64>() / rays.len() as f64
}

fn view_polygon(
    position: Point2<f64>,
    direction: Angle,
    range: f64,
    half_width: Angle,
    maze: &Maze,
) -> Polygon {
    let mut vertices = vec![position];
    vertices.extend(
        cast_rays(position, direction, range, half_width, maze)
            .iter()
            .map(|&(angle, distance)| {
                position + Vector2::new(angle.cos(), angle.sin()) * distance
            }),
    );
    Polygon::new(vertices)
}
