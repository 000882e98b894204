//! FIJI hyperstack export.
//!
//! A hyperstack file holds one 3-D `(kx, ky, E)` volume per pump-probe time
//! step under `experiment/xyE_tstep{i}`.

use crate::paths::{create_parent_dirs, resolve_target, with_extension};
use crate::{Error, Result};
use hdf5::File;
use log::info;
use ndarray::{ArrayD, Axis};
use std::path::{Path, PathBuf};

const EXPERIMENT_GROUP: &str = "experiment";

/// Writes a 4-D `(kx, ky, E, time)` array as a FIJI hyperstack.
///
/// The file is `dir/filename.h5`. `dir` is created if missing. An existing
/// file fails with [`Error::AlreadyExists`] unless `overwrite` is set, in
/// which case a numbered sibling is written. Returns the path written.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `data` is not 4-D, or an I/O/HDF5
/// error.
pub fn save_hyperstack<P: AsRef<Path>>(
    data: &ArrayD<f64>,
    dir: P,
    filename: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    if data.ndim() != 4 {
        return Err(Error::InvalidInput(format!(
            "hyperstack needs (kx, ky, E, time) data, got {} dimensions",
            data.ndim()
        )));
    }

    let requested = with_extension(&dir.as_ref().join(filename));
    let target = resolve_target(&requested, overwrite)?;
    create_parent_dirs(&target)?;

    let time_steps = data.len_of(Axis(3));
    info!("creating HDF5 hyperstack with {time_steps} time steps");

    let file = File::create_excl(&target)?;
    let experiment = file.create_group(EXPERIMENT_GROUP)?;
    for (step, volume) in data.axis_iter(Axis(3)).enumerate() {
        let volume = volume.as_standard_layout();
        let dataset = experiment
            .new_dataset::<f64>()
            .shape(volume.shape().to_vec())
            .create(format!("xyE_tstep{step}").as_str())?;
        if !volume.is_empty() {
            dataset.write(volume.view())?;
        }
    }

    info!("created file {}", target.display());
    Ok(target)
}
