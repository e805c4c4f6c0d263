//! Compressed `.npz` archive writer.
//!
//! An `.npz` file is a zip archive whose members are `.npy` files. Numeric
//! members are encoded by `ndarray-npy`; string members use NumPy's
//! fixed-width unicode dtype (`<U{width}`, UTF-32LE, zero padded), which
//! `ndarray-npy` does not cover, so they are encoded here.
//!
//! # NPY v1.0 Layout
//!
//! ```text
//! \x93NUMPY | 0x01 0x00 | header_len: u16 LE | header dict + pad + '\n' | data
//! ```
//!
//! The preamble plus header is padded with spaces to a multiple of 64 bytes.
//!
//! # Example
//!
//! ```ignore
//! let mut npz = NpzWriter::new(BufWriter::new(File::create(path)?));
//! npz.add_array("targets", &targets)?;
//! npz.add_strings("feature_columns", &names)?;
//! npz.add_string_scalar("target_column", "target_cpu_t+5")?;
//! npz.finish()?;
//! ```

use crate::error::Result;
use ndarray_npy::WriteNpyExt;
use std::io::{Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// Encode strings as a NumPy unicode array.
///
/// `shape` is `None` for a 0-d scalar (exactly one value expected) or
/// `Some(n)` for a 1-d array of `n` values.
pub fn encode_unicode_npy(values: &[&str], shape: Option<usize>) -> Vec<u8> {
    let width = values
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0)
        .max(1);

    let shape_str = match shape {
        None => "()".to_string(),
        Some(n) => format!("({n},)"),
    };
    let mut header = format!(
        "{{'descr': '<U{width}', 'fortran_order': False, 'shape': {shape_str}, }}"
    );
    // 10 = magic (6) + version (2) + header length (2); +1 for the newline
    let unpadded = NPY_MAGIC.len() + 4 + header.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(unpadded + padding + values.len() * width * 4);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());

    for value in values {
        let mut written = 0;
        for c in value.chars() {
            out.extend_from_slice(&(c as u32).to_le_bytes());
            written += 1;
        }
        for _ in written..width {
            out.extend_from_slice(&0u32.to_le_bytes());
        }
    }
    out
}

/// Streaming `.npz` writer with deflate compression.
pub struct NpzWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: FileOptions,
}

impl<W: Write + Seek> NpzWriter<W> {
    /// Start a compressed archive on `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// Add a numeric array as `{name}.npy`.
    pub fn add_array<T>(&mut self, name: &str, array: &T) -> Result<()>
    where
        T: WriteNpyExt + ?Sized,
    {
        self.zip.start_file(format!("{name}.npy"), self.options)?;
        array.write_npy(&mut self.zip)?;
        Ok(())
    }

    /// Add a 1-d unicode array as `{name}.npy`.
    pub fn add_strings<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> Result<()> {
        let refs: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        self.add_raw(name, &encode_unicode_npy(&refs, Some(refs.len())))
    }

    /// Add a 0-d unicode scalar as `{name}.npy`.
    pub fn add_string_scalar(&mut self, name: &str, value: &str) -> Result<()> {
        self.add_raw(name, &encode_unicode_npy(&[value], None))
    }

    fn add_raw(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(format!("{name}.npy"), self.options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};
    use ndarray_npy::ReadNpyExt;
    use std::io::{Cursor, Read};

    fn header_of(bytes: &[u8]) -> String {
        let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        String::from_utf8(bytes[10..10 + len].to_vec()).unwrap()
    }

    #[test]
    fn test_unicode_header_and_alignment() {
        let bytes = encode_unicode_npy(&["ab", "cde"], Some(2));
        assert_eq!(&bytes[..6], NPY_MAGIC);
        let header = header_of(&bytes);
        assert!(header.starts_with("{'descr': '<U3', 'fortran_order': False, 'shape': (2,), }"));
        assert!(header.ends_with('\n'));
        assert_eq!((10 + header.len()) % NPY_ALIGN, 0);

        // 2 values x 3 chars x 4 bytes
        let data = &bytes[10 + header.len()..];
        assert_eq!(data.len(), 24);
        assert_eq!(&data[..4], &(b'a' as u32).to_le_bytes());
        assert_eq!(&data[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_scalar_and_empty_arrays() {
        let scalar = encode_unicode_npy(&["target_cpu_t+5"], None);
        assert!(header_of(&scalar).contains("'shape': ()"));
        assert!(header_of(&scalar).contains("'<U14'"));

        let empty = encode_unicode_npy(&[], Some(0));
        let header = header_of(&empty);
        assert!(header.contains("'<U1'"));
        assert!(header.contains("'shape': (0,)"));
        assert_eq!(empty.len(), 10 + header.len());
    }

    #[test]
    fn test_archive_members() {
        let mut npz = NpzWriter::new(Cursor::new(Vec::new()));
        let targets: Array1<f64> = array![1.0, 2.5];
        npz.add_array("targets", &targets).unwrap();
        npz.add_strings("feature_columns", &["cpu", "mem"]).unwrap();
        npz.add_string_scalar("target_column", "target_cpu_t+2").unwrap();
        let cursor = npz.finish().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["feature_columns.npy", "target_column.npy", "targets.npy"]);

        let restored = Array1::<f64>::read_npy(archive.by_name("targets.npy").unwrap()).unwrap();
        assert_eq!(restored, targets);

        let mut raw = Vec::new();
        archive
            .by_name("feature_columns.npy")
            .unwrap()
            .read_to_end(&mut raw)
            .unwrap();
        assert!(header_of(&raw).contains("'<U3'"));
    }
}
