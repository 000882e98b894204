//! HDF5 container for binned datasets.
//!
//! Layout:
//!
//! ```text
//! /frames/f0000 .. f{N-1}    one slice per frame, or a single f0000 with the whole array
//! /axes/d{index} - {label}   1-D axis values
//! /histograms/{name}         1-D normalization curves
//! ```
//!
//! When `frames/` holds a single entry, axis names carry `index + 1`; the
//! loader shifts them back down. Artifacts whose single entry omits the
//! frame dimension load the same way. Older writers named axis entries
//! `ax{index} - {label}`; the loader reads both prefixes.

use crate::memory::memory_status;
use crate::paths::{create_parent_dirs, resolve_target, with_extension};
use crate::{Error, Result};
use bincube_core::{Axis, BinnedDataset};
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Group, Hyperslab, Location, SliceOrIndex};
use log::{debug, info, warn};
use ndarray::{Array1, ArrayD, ArrayView1, ArrayViewD, Ix1, IxDyn};
use std::collections::BTreeMap;
use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const FORMAT_VERSION: &str = "1.0";
const FORMAT_VERSION_ATTR: &str = "bincube_format_version";
const FRAMES_GROUP: &str = "frames";
const AXES_GROUP: &str = "axes";
const HISTOGRAMS_GROUP: &str = "histograms";
const LABEL_ATTR: &str = "label";
const AXIS_PREFIXES: [&str; 2] = ["ax", "d"];

/// Write configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaveOptions {
    /// When the target exists: `false` fails, `true` writes to the first
    /// free `{stem}_{n}.h5` sibling.
    pub overwrite: bool,
    /// Deflate level for frame entries.
    pub compression: Option<u8>,
    /// Byte shuffle filter for frame entries.
    pub shuffle: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            compression: Some(1),
            shuffle: true,
        }
    }
}

impl SaveOptions {
    /// Sets the collision behaviour.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the deflate level (`None` disables compression).
    #[must_use]
    pub fn with_compression(mut self, level: Option<u8>) -> Self {
        self.compression = level;
        self
    }

    /// Enables or disables the shuffle filter.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

/// One stored axis entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisEntry {
    /// Dimension index after the single-frame shift.
    pub index: usize,
    /// Axis label, from the `label` attribute or the entry name.
    pub label: String,
    /// Number of bins.
    pub len: usize,
}

/// Metadata of a stored artifact, read without loading any arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreSummary {
    /// Normalized artifact path.
    pub path: PathBuf,
    pub format_version: Option<String>,
    /// Number of entries in `frames/`.
    pub frame_entries: usize,
    /// Shape `load` would reconstruct.
    pub shape: Vec<usize>,
    /// Axis entries sorted by dimension index.
    pub axes: Vec<AxisEntry>,
    /// Names of the stored histograms.
    pub histograms: Vec<String>,
    /// In-memory size of the data array.
    pub estimated_bytes: u64,
}

/// Writes a dataset and returns the path actually written.
///
/// The `.h5` extension is appended when missing and parent directories are
/// created. The write is not transactional: on error a partially written
/// file may remain.
///
/// # Errors
/// Returns [`Error::AlreadyExists`] if the target exists and
/// `options.overwrite` is false, [`Error::InvalidInput`] for histogram names
/// that are not valid HDF5 link names, or an I/O/HDF5 error.
pub fn save<P: AsRef<Path>>(
    path: P,
    dataset: &BinnedDataset,
    options: &SaveOptions,
) -> Result<PathBuf> {
    for name in dataset.histograms().keys() {
        validate_entry_name(name)?;
    }

    let requested = with_extension(path.as_ref());
    let target = resolve_target(&requested, options.overwrite)?;
    if target != requested {
        info!(
            "{} exists, writing to {} instead",
            requested.display(),
            target.display()
        );
    }
    create_parent_dirs(&target)?;

    let file = File::create_excl(&target)?;
    set_attr_str(&file, FORMAT_VERSION_ATTR, FORMAT_VERSION)?;

    let data = dataset.data();
    let split = dataset.frame_count() > 1;
    let frames = file.create_group(FRAMES_GROUP)?;
    if split {
        for (index, frame) in data.outer_iter().enumerate() {
            write_array(&frames, &frame_name(index), frame, options)?;
        }
    } else {
        write_array(&frames, &frame_name(0), data.view(), options)?;
    }

    let shift = usize::from(!split);
    let axes = file.create_group(AXES_GROUP)?;
    for (index, axis) in dataset.axes().iter().enumerate() {
        let entry = write_vector(&axes, &axis_name(index + shift, &axis.label), axis.view())?;
        set_attr_str(&entry, LABEL_ATTR, &axis.label)?;
    }

    let histograms = file.create_group(HISTOGRAMS_GROUP)?;
    for (name, values) in dataset.histograms() {
        write_vector(&histograms, name, values.view())?;
    }

    info!(
        "saved {:?} dataset ({} frame entries) to {}",
        dataset.shape(),
        if split { dataset.frame_count() } else { 1 },
        target.display()
    );
    Ok(target)
}

/// Reads a dataset written by [`save`].
///
/// # Errors
/// Returns [`Error::NotFound`] if no file exists at the (normalized) path
/// and [`Error::CorruptFormat`] if a group is missing, entry names cannot be
/// parsed, or arrays disagree in shape.
pub fn load<P: AsRef<Path>>(path: P) -> Result<BinnedDataset> {
    let path = with_extension(path.as_ref());
    let file = open_existing(&path)?;
    let layout = Layout::open(&file)?;

    let shape = layout.data_shape()?;
    let bytes = estimated_bytes(&shape);
    let memory = memory_status();
    if !memory.fits(bytes) {
        warn!(
            "{} needs ~{bytes} bytes but only {} are available",
            path.display(),
            memory.available
        );
    }

    let data = layout.read_data(&shape)?;
    let mut axes = Vec::with_capacity(shape.len());
    for (entry, dataset) in layout.axis_entries(shape.len())? {
        let values = read_vector(&dataset, &entry.label)?;
        axes.push(Axis::new(entry.label, values));
    }
    let histograms = layout.read_histograms()?;

    debug!("loaded {:?} dataset from {}", shape, path.display());
    BinnedDataset::new(data, axes, histograms).map_err(|e| Error::CorruptFormat(e.to_string()))
}

/// Reads artifact metadata without loading arrays.
///
/// # Errors
/// Same as [`load`].
pub fn inspect<P: AsRef<Path>>(path: P) -> Result<StoreSummary> {
    let path = with_extension(path.as_ref());
    let file = open_existing(&path)?;
    let layout = Layout::open(&file)?;
    let shape = layout.data_shape()?;

    let axes = layout
        .axis_entries(shape.len())?
        .into_iter()
        .map(|(entry, _)| entry)
        .collect();
    let format_version = read_attr_opt_string(&file, FORMAT_VERSION_ATTR)?;

    Ok(StoreSummary {
        path,
        format_version,
        frame_entries: layout.frame_entries.len(),
        estimated_bytes: estimated_bytes(&shape),
        shape,
        axes,
        histograms: layout.histograms.member_names()?,
    })
}

/// Reads one frame (slice along the leading dimension).
///
/// Only the requested frame is read from disk, whether frames are stored
/// split or as a single entry.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `index` is out of range, otherwise the
/// same errors as [`load`].
pub fn load_frame<P: AsRef<Path>>(path: P, index: usize) -> Result<ArrayD<f64>> {
    let path = with_extension(path.as_ref());
    let file = open_existing(&path)?;
    let layout = Layout::open(&file)?;
    let shape = layout.data_shape()?;

    let frames = shape.first().copied().unwrap_or(0);
    if index >= frames {
        return Err(Error::InvalidInput(format!(
            "frame {index} out of range for {frames} frames"
        )));
    }

    if layout.is_single() {
        let (_, name) = &layout.frame_entries[0];
        let mut slab = vec![SliceOrIndex::from(index)];
        slab.extend((1..shape.len()).map(|_| SliceOrIndex::from(..)));
        Ok(layout
            .frames
            .dataset(name)?
            .read_slice::<f64, _, IxDyn>(Hyperslab::from(slab))?)
    } else {
        let (_, name) = &layout.frame_entries[index];
        Ok(layout.frames.dataset(name)?.read_dyn::<f64>()?)
    }
}

/// Store rooted at an explicit directory.
#[derive(Clone, Debug)]
pub struct DatasetStore {
    root: PathBuf,
    options: SaveOptions,
}

impl DatasetStore {
    /// Creates a store writing below `root` with default options.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            options: SaveOptions::default(),
        }
    }

    /// Sets the write options.
    #[must_use]
    pub fn with_options(mut self, options: SaveOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the artifact path for a name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        with_extension(&self.root.join(name))
    }

    /// Returns true if an artifact with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Saves a dataset under `name`.
    ///
    /// # Errors
    /// See [`save`].
    pub fn save(&self, name: &str, dataset: &BinnedDataset) -> Result<PathBuf> {
        save(self.path_for(name), dataset, &self.options)
    }

    /// Loads the dataset stored under `name`.
    ///
    /// # Errors
    /// See [`load`].
    pub fn load(&self, name: &str) -> Result<BinnedDataset> {
        load(self.path_for(name))
    }

    /// Inspects the dataset stored under `name`.
    ///
    /// # Errors
    /// See [`inspect`].
    pub fn inspect(&self, name: &str) -> Result<StoreSummary> {
        inspect(self.path_for(name))
    }
}

struct Layout {
    frames: Group,
    axes: Group,
    histograms: Group,
    /// `(index, name)` sorted by index.
    frame_entries: Vec<(usize, String)>,
}

impl Layout {
    fn open(file: &File) -> Result<Self> {
        let frames = required_group(file, FRAMES_GROUP)?;
        let axes = required_group(file, AXES_GROUP)?;
        let histograms = required_group(file, HISTOGRAMS_GROUP)?;

        let mut frame_entries = frames
            .member_names()?
            .into_iter()
            .map(|name| parse_frame_name(&name).map(|index| (index, name)))
            .collect::<Result<Vec<_>>>()?;
        frame_entries.sort_unstable();

        if frame_entries.is_empty() {
            return Err(Error::CorruptFormat("frames group is empty".to_string()));
        }
        if let [(_, name)] = frame_entries.as_slice() {
            if *name != frame_name(0) {
                return Err(Error::CorruptFormat(format!(
                    "single frame entry must be {}, found {name}",
                    frame_name(0)
                )));
            }
        } else if let Some((position, (index, name))) = frame_entries
            .iter()
            .enumerate()
            .find(|(position, (index, _))| position != index)
        {
            return Err(Error::CorruptFormat(format!(
                "frame entry {name} has index {index}, expected {position}"
            )));
        }

        Ok(Self {
            frames,
            axes,
            histograms,
            frame_entries,
        })
    }

    fn is_single(&self) -> bool {
        self.frame_entries.len() == 1
    }

    fn data_shape(&self) -> Result<Vec<usize>> {
        let (_, first) = &self.frame_entries[0];
        let frame_shape = self.frames.dataset(first)?.shape();
        if self.is_single() {
            if frame_shape.is_empty() {
                return Err(Error::CorruptFormat(format!(
                    "frame entry {first} is a scalar"
                )));
            }
            return Ok(frame_shape);
        }
        let mut shape = Vec::with_capacity(frame_shape.len() + 1);
        shape.push(self.frame_entries.len());
        shape.extend_from_slice(&frame_shape);
        Ok(shape)
    }

    fn read_data(&self, shape: &[usize]) -> Result<ArrayD<f64>> {
        if self.is_single() {
            let (_, name) = &self.frame_entries[0];
            return Ok(self.frames.dataset(name)?.read_dyn::<f64>()?);
        }

        let mut data = ArrayD::zeros(IxDyn(shape));
        for ((_, name), mut slot) in self.frame_entries.iter().zip(data.outer_iter_mut()) {
            let frame = self.frames.dataset(name)?.read_dyn::<f64>()?;
            if frame.shape() != slot.shape() {
                return Err(Error::CorruptFormat(format!(
                    "frame entry {name} has shape {:?}, expected {:?}",
                    frame.shape(),
                    slot.shape()
                )));
            }
            slot.assign(&frame);
        }
        Ok(data)
    }

    /// Axis entries placed by dimension index, checked against `ndim`.
    fn axis_entries(&self, ndim: usize) -> Result<Vec<(AxisEntry, Dataset)>> {
        let mut slots: Vec<Option<(AxisEntry, Dataset)>> = (0..ndim).map(|_| None).collect();

        for name in self.axes.member_names()? {
            let (stored, name_label) = parse_axis_name(&name)?;
            let index = if self.is_single() {
                stored.checked_sub(1).ok_or_else(|| {
                    Error::CorruptFormat(format!(
                        "axis entry {name:?} has index 0 but frames are stored whole"
                    ))
                })?
            } else {
                stored
            };
            if index >= ndim {
                return Err(Error::CorruptFormat(format!(
                    "axis entry {name:?} maps to dimension {index} of {ndim}-dimensional data"
                )));
            }
            if slots[index].is_some() {
                return Err(Error::CorruptFormat(format!(
                    "more than one axis entry for dimension {index}"
                )));
            }

            let dataset = self.axes.dataset(&name)?;
            let label = read_attr_opt_string(&dataset, LABEL_ATTR)?.unwrap_or(name_label);
            let entry = AxisEntry {
                index,
                label,
                len: dataset.size(),
            };
            slots[index] = Some((entry, dataset));
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    Error::CorruptFormat(format!("no axis entry for dimension {index}"))
                })
            })
            .collect()
    }

    fn read_histograms(&self) -> Result<BTreeMap<String, Array1<f64>>> {
        let mut histograms = BTreeMap::new();
        for name in self.histograms.member_names()? {
            let values = read_vector(&self.histograms.dataset(&name)?, &name)?;
            histograms.insert(name, values);
        }
        Ok(histograms)
    }
}

fn open_existing(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    File::open(path).map_err(|e| {
        Error::CorruptFormat(format!("{} is not an HDF5 file: {e}", path.display()))
    })
}

fn required_group(file: &File, name: &str) -> Result<Group> {
    if !file.link_exists(name) {
        return Err(Error::CorruptFormat(format!("missing group '{name}'")));
    }
    Ok(file.group(name)?)
}

fn frame_name(index: usize) -> String {
    format!("f{index:04}")
}

fn axis_name(index: usize, label: &str) -> String {
    format!("d{index} - {}", label.replace('/', "_"))
}

fn parse_frame_name(name: &str) -> Result<usize> {
    name.strip_prefix('f')
        .and_then(|digits| usize::from_str(digits).ok())
        .ok_or_else(|| Error::CorruptFormat(format!("unexpected frame entry {name:?}")))
}

/// Splits `d{index} - {label}` (or `ax{index} - {label}`) into index and
/// label.
fn parse_axis_name(name: &str) -> Result<(usize, String)> {
    let index = AXIS_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .and_then(|rest| rest.split(' ').next())
        .and_then(|digits| usize::from_str(digits).ok())
        .ok_or_else(|| Error::CorruptFormat(format!("unexpected axis entry {name:?}")))?;
    let label = name
        .split_once(" - ")
        .map(|(_, label)| label.to_string())
        .unwrap_or_default();
    Ok((index, label))
}

fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name.contains('/') {
        return Err(Error::InvalidInput(format!(
            "{name:?} cannot be used as a histogram name"
        )));
    }
    Ok(())
}

fn estimated_bytes(shape: &[usize]) -> u64 {
    let elements: usize = shape.iter().product();
    u64::try_from(elements.saturating_mul(size_of::<f64>())).unwrap_or(u64::MAX)
}

fn write_array(
    group: &Group,
    name: &str,
    values: ArrayViewD<'_, f64>,
    options: &SaveOptions,
) -> Result<Dataset> {
    let values = values.as_standard_layout();
    let builder = group.new_dataset::<f64>();
    let mut builder = if values.ndim() == 0 {
        builder.shape(())
    } else {
        builder.shape(values.shape().to_vec())
    };

    // Filters need a chunked layout, which HDF5 rejects for scalar and
    // zero-sized dataspaces.
    if values.ndim() > 0 && !values.is_empty() {
        if let Some(level) = options.compression {
            builder = builder.deflate(level);
        }
        if options.shuffle {
            builder = builder.shuffle();
        }
    }

    let dataset = builder.create(name)?;
    if values.ndim() == 0 {
        if let Some(value) = values.first() {
            dataset.write_scalar(value)?;
        }
    } else if !values.is_empty() {
        dataset.write(values.view())?;
    }
    Ok(dataset)
}

fn write_vector(group: &Group, name: &str, values: ArrayView1<'_, f64>) -> Result<Dataset> {
    let values = values.as_standard_layout();
    let dataset = group.new_dataset::<f64>().shape((values.len(),)).create(name)?;
    if !values.is_empty() {
        dataset.write(values.view())?;
    }
    Ok(dataset)
}

fn read_vector(dataset: &Dataset, name: &str) -> Result<Array1<f64>> {
    dataset
        .read_dyn::<f64>()?
        .into_dimensionality::<Ix1>()
        .map_err(|_| Error::CorruptFormat(format!("entry {name:?} is not one-dimensional")))
}

fn set_attr_str(location: &Location, name: &str, value: &str) -> Result<()> {
    let value = VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidInput(format!("invalid utf-8 attribute: {e}")))?;
    location
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn read_attr_opt_string(location: &Location, name: &str) -> Result<Option<String>> {
    match location.attr(name) {
        Ok(attr) => {
            let value: VarLenUnicode = attr.read_scalar()?;
            Ok(Some(value.to_string()))
        }
        Err(_) => Ok(None),
    }
}
