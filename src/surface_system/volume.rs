use std::fs::File;
use std::path::Path;

use log::debug;
use ndarray::{s, Array1, Array3, ArrayView1, ArrayView2, Ix1, Ix3, OwnedRepr};
use ndarray_npy::NpzReader;

use crate::constants::METERS_PER_KM;
use crate::errors::{ErosionError, ErosionResult};

/// Index of the cell containing `coord` on an axis starting at `origin` with
/// uniform spacing `cell_size`.
///
/// Ties round half away from zero (`f64::round`), so a coordinate exactly
/// halfway between two cell centres selects the cell further from `origin`
/// on the positive side.
pub fn coordinate_to_index(coord: f64, origin: f64, cell_size: f64) -> i64 {
    ((coord - origin) / cell_size).round() as i64
}

/// Maps physical coordinates on one uniform axis to cell indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    pub origin: f64,
    pub cell_size: f64,
    pub len: usize,
}

impl AxisMapping {
    pub fn new(origin: f64, cell_size: f64, len: usize) -> ErosionResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) || !origin.is_finite() || len == 0 {
            return Err(ErosionError::ConfigurationError(format!(
                "invalid axis mapping: origin {origin}, cell size {cell_size}, length {len}"
            )));
        }
        Ok(AxisMapping {
            origin,
            cell_size,
            len,
        })
    }

    /// Derive origin and spacing from the axis values themselves. The axis
    /// must be increasing with a uniform step.
    pub fn from_axis(axis: ArrayView1<f64>) -> ErosionResult<Self> {
        let len = axis.len();
        if len < 2 {
            return Err(ErosionError::ConfigurationError(format!(
                "coordinate axis needs at least 2 values, got {len}"
            )));
        }
        let origin = axis[0];
        let cell_size = (axis[len - 1] - origin) / (len - 1) as f64;
        let tolerance = 1e-6 * cell_size.abs();
        for (i, value) in axis.iter().enumerate() {
            let expected = origin + i as f64 * cell_size;
            if (value - expected).abs() > tolerance {
                return Err(ErosionError::ConfigurationError(format!(
                    "coordinate axis is not uniform at index {i}: {value} vs {expected}"
                )));
            }
        }
        AxisMapping::new(origin, cell_size, len)
    }

    pub fn index_of(&self, coord: f64) -> i64 {
        coordinate_to_index(coord, self.origin, self.cell_size)
    }

    pub fn coordinate(&self, index: usize) -> f64 {
        self.origin + index as f64 * self.cell_size
    }

    /// Like [`index_of`](Self::index_of) but fails outside the axis.
    pub fn checked_index(&self, axis: &'static str, coord: f64) -> ErosionResult<usize> {
        let index = self.index_of(coord);
        if index < 0 || index as usize >= self.len {
            return Err(ErosionError::BoundsError {
                axis,
                index,
                len: self.len,
            });
        }
        Ok(index as usize)
    }
}

/// Particle counts on a Cartesian grid, indexed `[x, y, z]`, with the
/// coordinate of every index along each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityVolume {
    density: Array3<f64>,
    x: Array1<f64>,
    y: Array1<f64>,
    z: Array1<f64>,
}

impl DensityVolume {
    pub fn new(
        density: Array3<f64>,
        x: Array1<f64>,
        y: Array1<f64>,
        z: Array1<f64>,
    ) -> ErosionResult<Self> {
        let (nx, ny, nz) = density.dim();
        if (nx, ny, nz) != (x.len(), y.len(), z.len()) {
            return Err(ErosionError::ConfigurationError(format!(
                "density shape {:?} does not match axis lengths ({}, {}, {})",
                (nx, ny, nz),
                x.len(),
                y.len(),
                z.len()
            )));
        }
        Ok(DensityVolume { density, x, y, z })
    }

    /// Read a volume archive holding `density`, `x`, `y` and `z` arrays.
    pub fn from_npz<P: AsRef<Path>>(path: P) -> ErosionResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            ErosionError::Archive(format!("failed to open '{}': {e}", path.display()))
        })?;

        let density = read_array3(&mut npz, "density")?;
        let x = read_array1(&mut npz, "x")?;
        let y = read_array1(&mut npz, "y")?;
        let z = read_array1(&mut npz, "z")?;
        debug!(
            "Loaded density volume {:?} from {}",
            density.dim(),
            path.display()
        );
        DensityVolume::new(density, x, y, z)
    }

    pub fn density(&self) -> &Array3<f64> {
        &self.density
    }

    pub fn x_axis(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y_axis(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn z_axis(&self) -> &Array1<f64> {
        &self.z
    }

    pub fn x_mapping(&self) -> ErosionResult<AxisMapping> {
        AxisMapping::from_axis(self.x.view())
    }

    pub fn y_mapping(&self) -> ErosionResult<AxisMapping> {
        AxisMapping::from_axis(self.y.view())
    }

    pub fn z_mapping(&self) -> ErosionResult<AxisMapping> {
        AxisMapping::from_axis(self.z.view())
    }

    /// Axes converted from metres to kilometres.
    pub fn axes_in_km(&self) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        (
            &self.x / METERS_PER_KM,
            &self.y / METERS_PER_KM,
            &self.z / METERS_PER_KM,
        )
    }

    /// Volume with every cell multiplied by `factor`, e.g. to rescale a run
    /// to another source mass flux.
    pub fn scaled(&self, factor: f64) -> Self {
        DensityVolume {
            density: &self.density * factor,
            x: self.x.clone(),
            y: self.y.clone(),
            z: self.z.clone(),
        }
    }

    /// Superparticle counts converted to particles per cm³.
    pub fn to_ppcc(&self, conversion: f64) -> Self {
        self.scaled(conversion)
    }

    /// x index whose coordinate lies closest to 0.
    pub fn center_x_index(&self) -> ErosionResult<usize> {
        self.x_mapping()?.checked_index("x", 0.0)
    }

    /// The (y, z) plane at one x index.
    pub fn slice_x(&self, x_index: usize) -> ErosionResult<ArrayView2<'_, f64>> {
        let (nx, _, _) = self.density.dim();
        if x_index >= nx {
            return Err(ErosionError::BoundsError {
                axis: "x",
                index: x_index as i64,
                len: nx,
            });
        }
        Ok(self.density.slice(s![x_index, .., ..]))
    }

    pub fn get(&self, x_index: usize, y_index: usize, z_index: usize) -> ErosionResult<f64> {
        let (nx, ny, nz) = self.density.dim();
        for (axis, index, len) in [("x", x_index, nx), ("y", y_index, ny), ("z", z_index, nz)] {
            if index >= len {
                return Err(ErosionError::BoundsError {
                    axis,
                    index: index as i64,
                    len,
                });
            }
        }
        Ok(self.density[[x_index, y_index, z_index]])
    }
}

fn read_array1(npz: &mut NpzReader<File>, key: &str) -> ErosionResult<Array1<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix1>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix1>(key))
        .map_err(|e| ErosionError::Archive(format!("failed to read '{key}': {e}")))
}

fn read_array3(npz: &mut NpzReader<File>, key: &str) -> ErosionResult<Array3<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix3>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix3>(key))
        .map_err(|e| ErosionError::Archive(format!("failed to read '{key}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_npy::NpzWriter;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn archive_path(tag: &str) -> PathBuf {
        let epoch_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "plume_volume_{}_{}_{}.npz",
            tag,
            std::process::id(),
            epoch_ns
        ))
    }

    fn cube(n: usize, origin: f64, step: f64) -> DensityVolume {
        let axis = Array1::from_iter((0..n).map(|i| origin + i as f64 * step));
        let density = Array3::from_shape_fn((n, n, n), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        DensityVolume::new(density, axis.clone(), axis.clone(), axis).unwrap()
    }

    #[test]
    fn test_index_of_reference_grid() {
        // 600 cells of 10 km starting at -2995 km
        let mapping = AxisMapping::new(-2_995_000.0, 10_000.0, 600).unwrap();
        assert_eq!(mapping.index_of(0.0), 300);
        assert_eq!(mapping.index_of(1_560_800.0), 456);
        assert_eq!(mapping.index_of(-1_560_800.0), 143);
    }

    #[test]
    fn test_tie_rounds_away_from_zero() {
        assert_eq!(coordinate_to_index(0.5, 0.0, 1.0), 1);
        assert_eq!(coordinate_to_index(-0.5, 0.0, 1.0), -1);
        assert_eq!(coordinate_to_index(2.5, 0.0, 1.0), 3);
    }

    #[test]
    fn test_checked_index_out_of_range() {
        let mapping = AxisMapping::new(0.0, 1.0, 3).unwrap();
        match mapping.checked_index("y", 5.0) {
            Err(ErosionError::BoundsError { axis, index, len }) => {
                assert_eq!((axis, index, len), ("y", 5, 3));
            }
            other => panic!("Expected BoundsError, got {:?}", other),
        }
        assert!(mapping.checked_index("y", -0.7).is_err());
    }

    #[test]
    fn test_from_axis_detects_spacing() {
        let mapping = AxisMapping::from_axis(array![-2.0, -1.0, 0.0, 1.0].view()).unwrap();
        assert_abs_diff_eq!(mapping.origin, -2.0);
        assert_abs_diff_eq!(mapping.cell_size, 1.0, epsilon = 1e-12);
        assert_eq!(mapping.len, 4);
        assert_abs_diff_eq!(mapping.coordinate(3), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_axis_rejects_uneven_axis() {
        assert!(AxisMapping::from_axis(array![0.0, 1.0, 3.0].view()).is_err());
        assert!(AxisMapping::from_axis(array![0.0].view()).is_err());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = DensityVolume::new(
            Array3::zeros((2, 2, 2)),
            array![0.0, 1.0],
            array![0.0, 1.0, 2.0],
            array![0.0, 1.0],
        );
        assert!(matches!(result, Err(ErosionError::ConfigurationError(_))));
    }

    #[test]
    fn test_slice_and_get() {
        let volume = cube(3, -1.0, 1.0);
        assert_eq!(volume.center_x_index().unwrap(), 1);
        let plane = volume.slice_x(1).unwrap();
        assert_eq!(plane[[2, 0]], 120.0);
        assert_eq!(volume.get(2, 1, 0).unwrap(), 210.0);
        assert!(volume.slice_x(3).is_err());
        assert!(matches!(
            volume.get(0, 0, 7),
            Err(ErosionError::BoundsError { axis: "z", .. })
        ));
    }

    #[test]
    fn test_scaling_and_units() {
        let volume = cube(2, 0.0, 1000.0);
        let doubled = volume.scaled(2.0);
        assert_eq!(doubled.get(1, 1, 1).unwrap(), 222.0);
        assert_eq!(volume.to_ppcc(0.5).get(1, 0, 0).unwrap(), 50.0);
        let (x_km, _, _) = volume.axes_in_km();
        assert_eq!(x_km, array![0.0, 1.0]);
    }

    #[test]
    fn test_npz_archive_loads() {
        let volume = cube(4, -1500.0, 1000.0);
        let path = archive_path("full");

        let file = File::create(&path).unwrap();
        let mut writer = NpzWriter::new(file);
        writer.add_array("density", volume.density()).unwrap();
        writer.add_array("x", volume.x_axis()).unwrap();
        writer.add_array("y", volume.y_axis()).unwrap();
        writer.add_array("z", volume.z_axis()).unwrap();
        writer.finish().unwrap();

        let loaded = DensityVolume::from_npz(&path).unwrap();
        assert_eq!(loaded, volume);
        assert_eq!(loaded.get(3, 2, 1).unwrap(), 321.0);
        assert_abs_diff_eq!(loaded.y_mapping().unwrap().cell_size, 1000.0, epsilon = 1e-9);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_npz_without_density_rejected() {
        let volume = cube(2, 0.0, 1.0);
        let path = archive_path("axes_only");

        let file = File::create(&path).unwrap();
        let mut writer = NpzWriter::new(file);
        writer.add_array("x", volume.x_axis()).unwrap();
        writer.add_array("y", volume.y_axis()).unwrap();
        writer.add_array("z", volume.z_axis()).unwrap();
        writer.finish().unwrap();

        match DensityVolume::from_npz(&path) {
            Err(ErosionError::Archive(msg)) => assert!(msg.contains("density")),
            other => panic!("Expected Archive error, got {:?}", other),
        }

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let result = DensityVolume::from_npz(archive_path("absent"));
        assert!(matches!(result, Err(ErosionError::Io(_))));
    }
}
