//! Surface cells of a sphere's cross-section on a Cartesian (y, z) mesh.
//!
//! The body outline is the zero level of `f(y, z) = y² + z² - r²`. It is
//! traced with marching squares over the whole mesh, which yields one closed
//! polyline; that polyline is then oriented, started at a reference point and
//! labelled with its arc length.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use log::debug;
use ndarray::{Array2, ArrayView1};

use crate::constants::METERS_PER_KM;
use crate::errors::{ErosionError, ErosionResult};
use crate::surface_system::volume::AxisMapping;
use crate::utils::point2d::Point2D;

/// Mesh edge carrying a contour crossing. `Y(i, j)` joins nodes (i, j) and
/// (i + 1, j); `Z(i, j)` joins (i, j) and (i, j + 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKey {
    Y(usize, usize),
    Z(usize, usize),
}

struct LevelMesh<'a> {
    y: ArrayView1<'a, f64>,
    z: ArrayView1<'a, f64>,
    f: Array2<f64>,
}

impl<'a> LevelMesh<'a> {
    fn new(y: ArrayView1<'a, f64>, z: ArrayView1<'a, f64>, radius: f64) -> Self {
        let r2 = radius * radius;
        let f = Array2::from_shape_fn((y.len(), z.len()), |(i, j)| y[i] * y[i] + z[j] * z[j] - r2);
        LevelMesh { y, z, f }
    }

    fn inside(&self, i: usize, j: usize) -> bool {
        self.f[[i, j]] < 0.0
    }

    fn node(&self, i: usize, j: usize) -> Point2D {
        Point2D::new(self.y[i], self.z[j])
    }

    fn ends(&self, edge: EdgeKey) -> ((usize, usize), (usize, usize)) {
        match edge {
            EdgeKey::Y(i, j) => ((i, j), (i + 1, j)),
            EdgeKey::Z(i, j) => ((i, j), (i, j + 1)),
        }
    }

    fn crosses(&self, edge: EdgeKey) -> bool {
        let ((i0, j0), (i1, j1)) = self.ends(edge);
        self.inside(i0, j0) != self.inside(i1, j1)
    }

    /// Zero of f along the edge by linear interpolation.
    fn crossing(&self, edge: EdgeKey) -> Point2D {
        let ((i0, j0), (i1, j1)) = self.ends(edge);
        let (f0, f1) = (self.f[[i0, j0]], self.f[[i1, j1]]);
        let t = f0 / (f0 - f1);
        self.node(i0, j0).lerp(&self.node(i1, j1), t)
    }

    /// Segment contributed by the cell whose lower corner is (i, j).
    ///
    /// f is a sum of a y term and a z term, so both diagonals of a cell have
    /// the same corner sum and a cell never has the two-diagonal saddle case.
    fn cell_segment(&self, i: usize, j: usize) -> Option<(EdgeKey, EdgeKey)> {
        let edges = [
            EdgeKey::Y(i, j),
            EdgeKey::Z(i + 1, j),
            EdgeKey::Y(i, j + 1),
            EdgeKey::Z(i, j),
        ];
        let mut crossed = edges.into_iter().filter(|edge| self.crosses(*edge));
        match (crossed.next(), crossed.next()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// Trace the circle of `radius` through the (y, z) mesh as one closed
/// polyline. The first point is not repeated at the end.
pub fn extract_surface_boundary<'a>(
    y_axis: ArrayView1<'a, f64>,
    z_axis: ArrayView1<'a, f64>,
    radius: f64,
) -> ErosionResult<Vec<Point2D>> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(ErosionError::ConfigurationError(format!(
            "radius must be positive, got {radius}"
        )));
    }
    if y_axis.len() < 2 || z_axis.len() < 2 {
        return Err(ErosionError::GeometryError(
            "mesh needs at least 2 nodes per axis".to_string(),
        ));
    }

    let mesh = LevelMesh::new(y_axis, z_axis, radius);
    let mut links: BTreeMap<EdgeKey, Vec<EdgeKey>> = BTreeMap::new();
    for i in 0..y_axis.len() - 1 {
        for j in 0..z_axis.len() - 1 {
            if let Some((a, b)) = mesh.cell_segment(i, j) {
                links.entry(a).or_default().push(b);
                links.entry(b).or_default().push(a);
            }
        }
    }

    if links.is_empty() {
        return Err(ErosionError::GeometryError(format!(
            "no boundary found: radius {radius} does not cross the coordinate mesh"
        )));
    }
    if let Some((edge, _)) = links.iter().find(|(_, next)| next.len() != 2) {
        return Err(ErosionError::GeometryError(format!(
            "boundary is open at {:?}: the circle leaves the coordinate mesh",
            mesh.crossing(*edge)
        )));
    }

    let loop_edges = walk_loop(&links)?;
    if loop_edges.len() != links.len() {
        return Err(ErosionError::GeometryError(format!(
            "boundary splits into several contours ({} of {} crossings on the first)",
            loop_edges.len(),
            links.len()
        )));
    }

    let mut points: Vec<Point2D> = loop_edges.into_iter().map(|e| mesh.crossing(e)).collect();
    dedup_closed(&mut points);
    if points.len() < 3 {
        return Err(ErosionError::GeometryError(format!(
            "degenerate boundary with {} distinct points",
            points.len()
        )));
    }
    debug!(
        "Traced boundary of radius {} with {} points",
        radius,
        points.len()
    );
    Ok(points)
}

fn walk_loop(links: &BTreeMap<EdgeKey, Vec<EdgeKey>>) -> ErosionResult<Vec<EdgeKey>> {
    let start = match links.keys().next() {
        Some(edge) => *edge,
        None => return Ok(Vec::new()),
    };
    let mut ordered = vec![start];
    let mut previous = start;
    let mut current = links[&start][0];

    while current != start {
        if ordered.len() > links.len() {
            return Err(ErosionError::GeometryError(
                "boundary walk does not close".to_string(),
            ));
        }
        ordered.push(current);
        let next = &links[&current];
        let step = if next[0] == previous { next[1] } else { next[0] };
        previous = current;
        current = step;
    }
    Ok(ordered)
}

/// Drop consecutive repeats, including a last point equal to the first.
fn dedup_closed(points: &mut Vec<Point2D>) {
    points.dedup_by(|b, a| a.distance(b) <= f64::EPSILON * a.magnitude().max(1.0));
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if first.distance(&last) <= f64::EPSILON * first.magnitude().max(1.0) {
            points.pop();
        } else {
            break;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalDirection {
    /// South pole towards +y, then the north pole.
    #[default]
    AntiClockwise,
    Clockwise,
}

/// One point of the body outline with the volume cell it falls in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCell {
    pub ordinal: usize,
    pub position: Point2D,
    pub y_index: usize,
    pub z_index: usize,
    /// Distance along the outline from the reference point, in axis units.
    pub arc_length: f64,
}

impl SurfaceCell {
    /// Arc length in km for axes given in metres.
    pub fn arc_km(&self) -> f64 {
        self.arc_length / METERS_PER_KM
    }
}

/// The ordered outline of one circuit around the body.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTrace {
    pub cells: Vec<SurfaceCell>,
    /// Arc length of the full circuit, closing segment included.
    pub perimeter: f64,
}

impl SurfaceTrace {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn arc_lengths(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.arc_length).collect()
    }

    /// Cells with consecutive repeats of the same volume cell collapsed,
    /// keeping the first visit of each. Ordinals are renumbered.
    pub fn distinct_cells(&self) -> Vec<SurfaceCell> {
        let mut distinct: Vec<SurfaceCell> = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            let repeat = distinct
                .last()
                .is_some_and(|last| (last.y_index, last.z_index) == (cell.y_index, cell.z_index));
            if !repeat {
                distinct.push(*cell);
            }
        }
        if distinct.len() > 1 {
            let (first, last) = (distinct[0], distinct[distinct.len() - 1]);
            if (first.y_index, first.z_index) == (last.y_index, last.z_index) {
                distinct.pop();
            }
        }
        for (ordinal, cell) in distinct.iter_mut().enumerate() {
            cell.ordinal = ordinal;
        }
        distinct
    }
}

/// Point on the outline's -z extreme, the default traversal start.
pub fn south_pole(radius: f64) -> Point2D {
    Point2D::new(0.0, -radius)
}

fn signed_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|k| {
            let (a, b) = (points[k], points[(k + 1) % n]);
            a.y * b.z - b.y * a.z
        })
        .sum::<f64>()
        * 0.5
}

/// Total polar angle swept around the origin by the closed polyline.
fn winding_angle(points: &[Point2D]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|k| {
            let step = points[(k + 1) % n].angle() - points[k].angle();
            if step > PI {
                step - 2.0 * PI
            } else if step < -PI {
                step + 2.0 * PI
            } else {
                step
            }
        })
        .sum()
}

/// Walk the closed outline once in `direction`, starting at the point
/// nearest `reference`, and label each point with its arc length.
pub fn order_boundary_by_traversal(
    contour: &[Point2D],
    reference: Point2D,
    y_mapping: &AxisMapping,
    z_mapping: &AxisMapping,
    direction: TraversalDirection,
) -> ErosionResult<SurfaceTrace> {
    let mut points = contour.to_vec();
    dedup_closed(&mut points);
    if points.len() < 3 {
        return Err(ErosionError::GeometryError(format!(
            "cannot order a boundary of {} distinct points",
            points.len()
        )));
    }

    let area = signed_area(&points);
    if area == 0.0 {
        return Err(ErosionError::GeometryError(
            "boundary encloses no area".to_string(),
        ));
    }
    let turns = winding_angle(&points) / (2.0 * PI);
    if (turns.abs() - 1.0).abs() > 1e-6 {
        return Err(ErosionError::GeometryError(format!(
            "boundary winds {turns:.3} times around the body centre"
        )));
    }
    let anticlockwise = area > 0.0;
    if anticlockwise != (direction == TraversalDirection::AntiClockwise) {
        points.reverse();
    }

    let start = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.distance(&reference).total_cmp(&b.distance(&reference)))
        .map(|(k, _)| k)
        .unwrap_or(0);
    points.rotate_left(start);

    let mut cells = Vec::with_capacity(points.len());
    let mut arc_length = 0.0;
    for (ordinal, position) in points.iter().enumerate() {
        if ordinal > 0 {
            arc_length += points[ordinal - 1].distance(position);
        }
        cells.push(SurfaceCell {
            ordinal,
            position: *position,
            y_index: y_mapping.checked_index("y", position.y)?,
            z_index: z_mapping.checked_index("z", position.z)?,
            arc_length,
        });
    }
    let perimeter = arc_length + points[points.len() - 1].distance(&points[0]);

    Ok(SurfaceTrace { cells, perimeter })
}
