//! Annotated single-cell data read from a directory.
//!
//! The directory layout mirrors the parts of an `AnnData` object that the
//! evaluation needs:
//!
//! ```text
//! <dir>/X.npy           cells x genes expression
//! <dir>/obs.csv         per-cell annotations with a header row
//! <dir>/obsm/<key>.npy  cells x dims embeddings
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use ndarray::{Array2, ArrayView2, Axis};

pub mod npy;
mod obs;

pub use obs::Obs;

/// The name of the expression matrix file.
const X_FILE: &str = "X.npy";

/// The name of the annotation table file.
const OBS_FILE: &str = "obs.csv";

/// The name of the embeddings directory.
const OBSM_DIR: &str = "obsm";

/// Cells with their expression, annotations and embeddings.
#[derive(Debug, Clone)]
pub struct AnnData {
    /// The expression matrix, cells x genes.
    x: Array2<f32>,
    /// The per-cell annotations.
    obs: Obs,
    /// The named embeddings, each cells x dims.
    obsm: BTreeMap<String, Array2<f32>>,
}

impl AnnData {
    /// Creates a new `AnnData`.
    ///
    /// # Errors
    ///
    /// * If there are no cells.
    /// * If `obs` or any embedding does not have one row per cell.
    pub fn new(x: Array2<f32>, obs: Obs, obsm: BTreeMap<String, Array2<f32>>) -> Result<Self, String> {
        let n_obs = x.nrows();
        if n_obs == 0 {
            return Err("The expression matrix has no cells.".to_string());
        }
        if obs.n_rows() != n_obs {
            return Err(format!(
                "The obs table has {} rows but there are {n_obs} cells.",
                obs.n_rows()
            ));
        }
        if let Some((key, emb)) = obsm.iter().find(|(_, emb)| emb.nrows() != n_obs) {
            return Err(format!(
                "Embedding {key} has {} rows but there are {n_obs} cells.",
                emb.nrows()
            ));
        }
        Ok(Self { x, obs, obsm })
    }

    /// Reads an `AnnData` from a directory.
    ///
    /// Every `.npy` file under `<dir>/obsm` becomes an embedding keyed by
    /// its file stem. A missing `obsm` directory means no embeddings.
    ///
    /// # Errors
    ///
    /// * If `X.npy` or `obs.csv` cannot be read.
    /// * If any embedding cannot be read.
    /// * If the shapes do not agree. See [`AnnData::new`].
    pub fn read_dir<P: AsRef<Path>>(dir: P) -> Result<Self, String> {
        let dir = dir.as_ref();
        ftlog::info!("Reading AnnData from {dir:?}...");

        let x = npy::read_matrix(dir.join(X_FILE))?;
        let obs = Obs::read_csv(dir.join(OBS_FILE))?;

        let mut obsm = BTreeMap::new();
        for path in list_npy(&dir.join(OBSM_DIR))? {
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| format!("Invalid embedding file name: {}", path.display()))?
                .to_string();
            ftlog::debug!("Reading embedding {key} from {path:?}...");
            obsm.insert(key, npy::read_matrix(&path)?);
        }

        ftlog::info!(
            "Read {} cells, {} genes and {} embeddings.",
            x.nrows(),
            x.ncols(),
            obsm.len()
        );
        Self::new(x, obs, obsm)
    }

    /// Writes the `AnnData` to a directory in the layout read by
    /// [`read_dir`](Self::read_dir).
    ///
    /// # Errors
    ///
    /// * If the directories or files cannot be created.
    pub fn write_dir<P: AsRef<Path>>(&self, dir: P) -> Result<(), String> {
        let dir = dir.as_ref();
        let obsm_dir = dir.join(OBSM_DIR);
        std::fs::create_dir_all(&obsm_dir).map_err(|e| e.to_string())?;

        npy::write_matrix(dir.join(X_FILE), &self.x)?;
        self.obs.write_csv(dir.join(OBS_FILE))?;
        for (key, emb) in &self.obsm {
            npy::write_matrix(obsm_dir.join(format!("{key}.npy")), emb)?;
        }
        Ok(())
    }

    /// The number of cells.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// The number of genes.
    #[must_use]
    pub fn n_vars(&self) -> usize {
        self.x.ncols()
    }

    /// The expression matrix.
    #[must_use]
    pub fn x(&self) -> ArrayView2<f32> {
        self.x.view()
    }

    /// The expression of the given cells.
    #[must_use]
    pub fn x_rows(&self, rows: &[usize]) -> Array2<f32> {
        self.x.select(Axis(0), rows)
    }

    /// The per-cell annotations.
    #[must_use]
    pub const fn obs(&self) -> &Obs {
        &self.obs
    }

    /// The values of an annotation column.
    ///
    /// # Errors
    ///
    /// * If there is no such column.
    pub fn obs_column(&self, name: &str) -> Result<&[String], String> {
        self.obs.column(name)
    }

    /// The named embeddings.
    #[must_use]
    pub const fn obsm(&self) -> &BTreeMap<String, Array2<f32>> {
        &self.obsm
    }

    /// The embedding with the given key.
    ///
    /// # Errors
    ///
    /// * If there is no such embedding.
    pub fn embedding(&self, key: &str) -> Result<ArrayView2<f32>, String> {
        self.obsm.get(key).map(Array2::view).ok_or_else(|| {
            format!(
                "Embedding {key} not found. Available embeddings: {:?}",
                self.obsm.keys().collect::<Vec<_>>()
            )
        })
    }

    /// Adds or replaces an embedding.
    ///
    /// # Errors
    ///
    /// * If the embedding does not have one row per cell.
    pub fn insert_embedding(&mut self, key: &str, emb: Array2<f32>) -> Result<(), String> {
        if emb.nrows() != self.n_obs() {
            return Err(format!(
                "Embedding {key} has {} rows but there are {} cells.",
                emb.nrows(),
                self.n_obs()
            ));
        }
        self.obsm.insert(key.to_string(), emb);
        Ok(())
    }
}

/// Lists the `.npy` files in a directory, sorted by path.
///
/// A missing directory has no files.
fn list_npy(dir: &Path) -> Result<Vec<PathBuf>, String> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = std::fs::read_dir(dir)
        .map_err(|e| e.to_string())?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "npy"))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}
