//! Reading and writing dense matrices in `.npy` format.

use std::path::Path;

use ndarray::Array2;

/// Element types we accept in `.npy` files.
enum NpyType {
    /// 32-bit floats, read as-is.
    F32,
    /// 64-bit floats, narrowed to `f32`.
    F64,
}

impl NpyType {
    /// The types to try, in order.
    const fn variants() -> &'static [Self] {
        &[Self::F32, Self::F64]
    }

    /// Reads an array from a `.npy` file with a specific element type.
    #[allow(clippy::cast_possible_truncation)]
    fn read_with_type<P: AsRef<Path>>(&self, path: P) -> Result<Array2<f32>, String> {
        match self {
            Self::F32 => ndarray_npy::read_npy::<_, Array2<f32>>(path).map_err(|e| e.to_string()),
            Self::F64 => ndarray_npy::read_npy::<_, Array2<f64>>(path)
                .map(|arr| arr.mapv(|v| v as f32))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Reads a 2d array of `f32` or `f64` values from a `.npy` file.
///
/// `f64` values are narrowed to `f32`.
///
/// # Errors
///
/// * If the file does not exist.
/// * If the file does not hold a 2d array of either float type.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Array2<f32>, String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }

    let mut errors = Vec::new();
    for ty in NpyType::variants() {
        match ty.read_with_type(path) {
            Ok(arr) => return Ok(arr),
            Err(e) => errors.push(e),
        }
    }
    Err(format!(
        "Failed to read NPY file at path: {}. {}",
        path.display(),
        errors.join("; ")
    ))
}

/// Writes a 2d array of `f32` values to a `.npy` file.
///
/// # Errors
///
/// * If the file cannot be created or written.
pub fn write_matrix<P: AsRef<Path>>(path: P, arr: &Array2<f32>) -> Result<(), String> {
    ndarray_npy::write_npy(path, arr).map_err(|e| e.to_string())
}
