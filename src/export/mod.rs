//! Data Export Module
//!
//! Persist the processed splits, sequence tensors and scaler parameters for
//! model training.
//!
//! # Output Layout
//!
//! ```text
//! output_dir/
//! ├── train.csv / validation.csv / test.csv   # timestamp + all columns
//! ├── sequences_{split}.npz                   # sequences, targets, timestamps, names
//! ├── scaler.json                             # fitted ScalerState
//! └── metadata.json                           # written last: completion marker
//! ```
//!
//! Every file is written to a hidden temporary sibling and renamed into
//! place, so a file under its final name is always complete. A run is
//! complete only when [`verify_outputs`] reports nothing missing.
//!
//! # Example
//!
//! ```ignore
//! use metrics_preprocessor::export::Persister;
//!
//! let persister = Persister::new(&config.output_dir);
//! persister.prepare()?;
//! for (kind, split) in &splits {
//!     persister.write_split(*kind, split)?;
//! }
//! persister.write_scaler(&scaler)?;
//! persister.write_metadata(&metadata)?;
//! ```

pub mod npz;

pub use npz::{encode_unicode_npy, NpzWriter};

use crate::error::Result;
use crate::frame::{TimeFrame, Timestamp};
use crate::preprocessing::{ScalerFitScope, ScalerState};
use crate::sequence_builder::SequenceBatch;
use crate::split::SplitKind;
use chrono::SecondsFormat;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Scaler parameters file.
pub const SCALER_FILE: &str = "scaler.json";

/// Completion marker, written after every other file.
pub const METADATA_FILE: &str = "metadata.json";

/// Header of the leading index column in split CSVs.
pub const TIMESTAMP_HEADER: &str = crate::schema::TIMESTAMP_COLUMN;

/// CSV file name for a split.
pub fn split_file_name(kind: SplitKind) -> String {
    format!("{kind}.csv")
}

/// Sequence archive file name for a split.
pub fn sequences_file_name(kind: SplitKind) -> String {
    format!("sequences_{kind}.npz")
}

/// Every file a complete run leaves in the output directory.
pub fn expected_outputs() -> Vec<String> {
    let mut files: Vec<String> = SplitKind::all().iter().map(|&k| split_file_name(k)).collect();
    files.extend(SplitKind::all().iter().map(|&k| sequences_file_name(k)));
    files.push(SCALER_FILE.to_string());
    files.push(METADATA_FILE.to_string());
    files
}

/// Expected output files missing from `dir`.
///
/// An empty result means the run that wrote `dir` completed.
pub fn verify_outputs<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    expected_outputs()
        .into_iter()
        .map(|name| dir.join(name))
        .filter(|path| !path.is_file())
        .collect()
}

/// Format a timestamp the way every output file does (RFC 3339, UTC, `Z`).
pub fn format_timestamp(t: &Timestamp) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Metadata
// ============================================================================

/// Per-split summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMetadata {
    /// Which split
    pub split: SplitKind,

    /// Rows in the split CSV
    pub rows: usize,

    /// Sequences in the split archive
    pub sequences: usize,

    /// First timestamp, if any rows
    pub start: Option<String>,

    /// Last timestamp, if any rows
    pub end: Option<String>,
}

impl SplitMetadata {
    /// Summarize a split frame and its sequence count.
    pub fn from_frame(split: SplitKind, frame: &TimeFrame, sequences: usize) -> Self {
        Self {
            split,
            rows: frame.len(),
            sequences,
            start: frame.index().first().map(format_timestamp),
            end: frame.index().last().map(format_timestamp),
        }
    }
}

/// Metadata about the exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Column naming scheme version
    pub schema_version: String,

    /// Crate version that produced the outputs
    pub pipeline_version: String,

    /// Export timestamp
    pub export_timestamp: String,

    /// Resample period string
    pub resample_rule: String,

    /// Scaler fit policy
    pub scaler_policy: ScalerFitScope,

    /// Metrics configured for the run
    pub metrics: Vec<String>,

    /// Sequence feature columns, in tensor order
    pub feature_columns: Vec<String>,

    /// All target columns, in horizon order
    pub target_columns: Vec<String>,

    /// Target stored in the sequence archives
    pub primary_target: String,

    /// Rows per sequence
    pub sequence_length: usize,

    /// Rows between sequence starts
    pub stride: usize,

    /// Rows dropped by the anomaly filter
    pub anomaly_rows_removed: usize,

    /// Train, validation, test
    pub splits: Vec<SplitMetadata>,
}

impl DatasetMetadata {
    /// Total rows across splits.
    pub fn total_rows(&self) -> usize {
        self.splits.iter().map(|s| s.rows).sum()
    }

    /// Total sequences across splits.
    pub fn total_sequences(&self) -> usize {
        self.splits.iter().map(|s| s.sequences).sum()
    }

    /// Read `metadata.json`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Read a `scaler.json` written by [`Persister::write_scaler`].
pub fn load_scaler<P: AsRef<Path>>(path: P) -> Result<ScalerState> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

// ============================================================================
// Persister
// ============================================================================

/// Writes pipeline outputs under one directory.
#[derive(Debug, Clone)]
pub struct Persister {
    output_dir: PathBuf,
}

impl Persister {
    /// Create a persister for `output_dir`.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory and remove a stale completion marker,
    /// so an interrupted rerun never looks complete.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let marker = self.output_dir.join(METADATA_FILE);
        if marker.exists() {
            debug!("Removing previous completion marker {}", marker.display());
            fs::remove_file(marker)?;
        }
        Ok(())
    }

    /// Write one split as `{split}.csv`.
    pub fn write_split(&self, kind: SplitKind, frame: &TimeFrame) -> Result<PathBuf> {
        let path = self.output_dir.join(split_file_name(kind));
        write_atomic(&path, |w| write_frame_csv(w, frame))?;
        info!(
            "Exported {}: {} rows x {} columns",
            path.display(),
            frame.len(),
            frame.n_columns() + 1
        );
        Ok(path)
    }

    /// Write one split's sequences as `sequences_{split}.npz`.
    pub fn write_sequences(&self, kind: SplitKind, batch: &SequenceBatch) -> Result<PathBuf> {
        let path = self.output_dir.join(sequences_file_name(kind));
        let timestamps: Vec<String> = batch.timestamps.iter().map(format_timestamp).collect();

        write_atomic(&path, |w| {
            let mut npz = NpzWriter::new(w);
            npz.add_array("sequences", &batch.sequences)?;
            npz.add_array("targets", &batch.targets)?;
            npz.add_strings("timestamps", &timestamps)?;
            npz.add_strings("feature_columns", &batch.feature_columns)?;
            npz.add_string_scalar("target_column", &batch.target_column)?;
            npz.finish()?;
            Ok(())
        })?;

        info!(
            "Exported {}: [{} x {} x {}]",
            path.display(),
            batch.len(),
            batch.sequence_length(),
            batch.feature_count()
        );
        Ok(path)
    }

    /// Write the fitted scaler as `scaler.json`.
    pub fn write_scaler(&self, state: &ScalerState) -> Result<PathBuf> {
        let path = self.output_dir.join(SCALER_FILE);
        write_atomic(&path, |w| Ok(serde_json::to_writer_pretty(w, state)?))?;
        info!("Exported scaler: {} ({} columns)", path.display(), state.len());
        Ok(path)
    }

    /// Write `metadata.json`. Call last.
    pub fn write_metadata(&self, metadata: &DatasetMetadata) -> Result<PathBuf> {
        let path = self.output_dir.join(METADATA_FILE);
        write_atomic(&path, |w| Ok(serde_json::to_writer_pretty(w, metadata)?))?;
        info!("Exported metadata: {}", path.display());
        Ok(path)
    }
}

/// Write `frame` as CSV: a leading timestamp column, then every column in
/// frame order. Nulls are empty cells.
pub fn write_frame_csv<W: Write>(writer: W, frame: &TimeFrame) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(frame.n_columns() + 1);
    header.push(TIMESTAMP_HEADER.to_string());
    header.extend(frame.schema()?.names());
    csv.write_record(&header)?;

    let mut record = Vec::with_capacity(header.len());
    for (row, t) in frame.index().iter().enumerate() {
        record.clear();
        record.push(format_timestamp(t));
        for column in frame.columns() {
            // f64 Display is the shortest string that round-trips
            record.push(column.values[row].map(|v| v.to_string()).unwrap_or_default());
        }
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write `path` through a temporary sibling, renaming only on success.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
