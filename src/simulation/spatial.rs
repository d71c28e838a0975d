//! Spatial indexing for efficient neighbor queries.
//!
//! A uniform grid over the toroidal world plane. Every entity is bucketed in
//! the cell its position hashes into, and queries only scan the cells covered
//! by their bounding box, never the whole world. The grid is rebuilt from
//! scratch each tick; entities never migrate between cells incrementally.

use ndarray::Array1;

use super::error::SimulationError;
use super::geometric_utils::{angle_between_degrees, toroidal_distance};
use super::locatable::Locatable;

/// Lightweight position-only record used to index creatures without cloning them.
#[derive(Debug, Clone)]
pub struct CreatureLocation {
    /// Creature identifier.
    pub id: u64,
    /// Creature position at indexing time.
    pub position: Array1<f64>,
}

impl Locatable for CreatureLocation {
    fn pos(&self) -> &Array1<f64> {
        &self.position
    }

    fn id(&self) -> u64 {
        self.id
    }
}

/// Field of view of an observer.
#[derive(Debug, Clone)]
pub struct VisionCone {
    /// Observer position.
    pub origin: Array1<f64>,
    /// Observer heading (unit vector).
    pub direction: Array1<f64>,
    /// Maximum visible distance.
    pub distance: f64,
    /// Full opening angle in degrees.
    pub angle: f64,
}

impl VisionCone {
    /// Checks whether `target` lies inside the opening angle.
    ///
    /// The bearing is taken towards the target's raw position, so a neighbor
    /// only visible through a world edge is reported as outside the cone.
    pub fn covers_angle(&self, target: &Array1<f64>) -> bool {
        let to_target = target - &self.origin;
        angle_between_degrees(&self.direction, &to_target) <= self.angle / 2.0
    }
}

/// Uniform grid of buckets over a wrapping world.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<T>>,
}

impl<T: Locatable> SpatialGrid<T> {
    /// Creates an empty grid covering a `width × height` world.
    pub fn new(width: f64, height: f64, cell_size: f64) -> Result<Self, SimulationError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SimulationError::InvalidConfig(
                "grid dimensions must be positive".to_string(),
            ));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimulationError::InvalidConfig(
                "cell_size must be positive".to_string(),
            ));
        }
        if !tiles_evenly(width, cell_size) || !tiles_evenly(height, cell_size) {
            return Err(SimulationError::InvalidConfig(
                "grid dimensions must be multiples of cell_size".to_string(),
            ));
        }
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        let mut cells = Vec::with_capacity(cols * rows);
        cells.resize_with(cols * rows, Vec::new);
        Ok(Self {
            cell_size,
            width,
            height,
            cols,
            rows,
            cells,
        })
    }

    /// Grid dimensions as `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Clears the grid and reassigns every entity to its cell.
    pub fn rebuild(&mut self, entities: impl IntoIterator<Item = T>) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for entity in entities {
            self.insert(entity);
        }
    }

    /// Adds an entity to the cell of its current position.
    pub fn insert(&mut self, entity: T) {
        let index = self.cell_index(entity.pos());
        self.cells[index].push(entity);
    }

    /// `(column, row)` of the cell containing `pos`, wrapped into the grid.
    pub fn cell_of(&self, pos: &Array1<f64>) -> (usize, usize) {
        (
            wrap_index((pos[0] / self.cell_size).floor() as i64, self.cols),
            wrap_index((pos[1] / self.cell_size).floor() as i64, self.rows),
        )
    }

    /// Flat index of the cell containing `pos`.
    pub fn cell_index(&self, pos: &Array1<f64>) -> usize {
        let (col, row) = self.cell_of(pos);
        row * self.cols + col
    }

    /// Entities stored in the cell with the given flat index.
    pub fn cell(&self, index: usize) -> &[T] {
        self.cells.get(index).map_or(&[], Vec::as_slice)
    }

    /// Removes and returns the entity `id` from the cell with the given flat index.
    pub fn take(&mut self, index: usize, id: u64) -> Option<T> {
        let cell = self.cells.get_mut(index)?;
        let position = cell.iter().position(|entity| entity.id() == id)?;
        Some(cell.swap_remove(position))
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Checks whether the grid holds no entity.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// Iterates over every indexed entity.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter().flatten()
    }

    /// Flat indices of the cell containing `pos` and its 8 neighbors, without duplicates.
    pub fn neighborhood(&self, pos: &Array1<f64>) -> Vec<usize> {
        let (col, row) = self.cell_of(pos);
        let cols = axis_span(col as i64 - 1, col as i64 + 1, self.cols);
        let rows = axis_span(row as i64 - 1, row as i64 + 1, self.rows);
        self.combine(&cols, &rows)
    }

    /// Flat indices of the cells overlapping the box `[pos ± radius]`, modulo the grid.
    pub fn cells_around(&self, pos: &Array1<f64>, radius: f64) -> Vec<usize> {
        let cs = self.cell_size;
        let cols = axis_span(
            ((pos[0] - radius) / cs).floor() as i64,
            ((pos[0] + radius) / cs).floor() as i64,
            self.cols,
        );
        let rows = axis_span(
            ((pos[1] - radius) / cs).floor() as i64,
            ((pos[1] + radius) / cs).floor() as i64,
            self.rows,
        );
        self.combine(&cols, &rows)
    }

    /// Entities whose toroidal distance to `pos` is at most `radius`, with that distance.
    pub fn within_radius(&self, pos: &Array1<f64>, radius: f64) -> Vec<(&T, f64)> {
        let mut found = Vec::new();
        for index in self.cells_around(pos, radius) {
            for entity in &self.cells[index] {
                let distance = toroidal_distance(pos, entity.pos(), self.width, self.height);
                if distance <= radius {
                    found.push((entity, distance));
                }
            }
        }
        found
    }

    /// Entities inside the vision cone, with their toroidal distance to the observer.
    ///
    /// `exclude` skips the observer itself when it is indexed in this grid.
    pub fn within_vision(&self, cone: &VisionCone, exclude: Option<u64>) -> Vec<(&T, f64)> {
        self.within_radius(&cone.origin, cone.distance)
            .into_iter()
            .filter(|(entity, _)| Some(entity.id()) != exclude)
            .filter(|(entity, _)| cone.covers_angle(entity.pos()))
            .collect()
    }

    /// Nearest entity inside the vision cone.
    ///
    /// Ties keep the first entity found; scan order is unspecified.
    pub fn query_closest(&self, cone: &VisionCone, exclude: Option<u64>) -> Option<(&T, f64)> {
        let mut best: Option<(&T, f64)> = None;
        for (entity, distance) in self.within_vision(cone, exclude) {
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((entity, distance));
            }
        }
        best
    }

    fn combine(&self, cols: &[usize], rows: &[usize]) -> Vec<usize> {
        rows.iter()
            .flat_map(|row| cols.iter().map(move |col| row * self.cols + col))
            .collect()
    }
}

/// Checks whether `extent` is a whole number of `cell_size` cells.
///
/// Wrapped neighbor lookups assume every column and row has the same width.
pub fn tiles_evenly(extent: f64, cell_size: f64) -> bool {
    let cells = extent / cell_size;
    (cells - cells.round()).abs() <= 1e-9 * cells.max(1.0)
}

fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// Wrapped indices covering `[from, to]` on an axis of `len` cells, each at most once.
fn axis_span(from: i64, to: i64, len: usize) -> Vec<usize> {
    if to - from + 1 >= len as i64 {
        return (0..len).collect();
    }
    (from..=to).map(|i| wrap_index(i, len)).collect()
}
