//! Readers for the `.fvecs`/`.ivecs` vector file formats (§6.1).
//!
//! Both formats concatenate fixed-width records: a little-endian `i32`
//! dimension header followed by that many 4-byte payload values. Every
//! record in a file shares the same dimension.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Dimension must be sane: `0 < d < 1_000_000` (§6.1).
fn check_dimension(d: i32, path: &Path) -> CliResult<usize> {
    if d <= 0 || d >= 1_000_000 {
        return Err(CliError::MalformedVectorFile {
            path: path.display().to_string(),
            message: format!("unreasonable dimension {d}"),
        });
    }
    Ok(d as usize)
}

/// Reads a `.fvecs` file: `(dim, vectors)`, one `Vec<f32>` per record.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if the file can't be opened/read, or
/// [`CliError::MalformedVectorFile`] if a record's dimension is outside
/// the sane range or the file is truncated mid-record.
pub fn read_fvecs(path: &Path) -> CliResult<(usize, Vec<Vec<f32>>)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut dim = None;
    let mut vectors = Vec::new();
    let mut header = [0u8; 4];

    while reader.read_exact(&mut header).is_ok() {
        let d = check_dimension(i32::from_le_bytes(header), path)?;
        if let Some(expected) = dim {
            if d != expected {
                return Err(CliError::MalformedVectorFile {
                    path: path.display().to_string(),
                    message: format!("inconsistent dimension: expected {expected}, got {d}"),
                });
            }
        } else {
            dim = Some(d);
        }

        let mut payload = vec![0u8; d * 4];
        reader.read_exact(&mut payload).map_err(|_| CliError::MalformedVectorFile {
            path: path.display().to_string(),
            message: "truncated vector record".to_string(),
        })?;
        let vector: Vec<f32> = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("chunks_exact(4)")))
            .collect();
        vectors.push(vector);
    }

    Ok((dim.unwrap_or(0), vectors))
}

/// Reads a `.ivecs` file: `(dim, vectors)`, one `Vec<i32>` per record.
/// Identical layout to `.fvecs` with an integer payload (§6.1).
///
/// # Errors
///
/// Same as [`read_fvecs`].
pub fn read_ivecs(path: &Path) -> CliResult<(usize, Vec<Vec<i32>>)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut dim = None;
    let mut vectors = Vec::new();
    let mut header = [0u8; 4];

    while reader.read_exact(&mut header).is_ok() {
        let d = check_dimension(i32::from_le_bytes(header), path)?;
        if let Some(expected) = dim {
            if d != expected {
                return Err(CliError::MalformedVectorFile {
                    path: path.display().to_string(),
                    message: format!("inconsistent dimension: expected {expected}, got {d}"),
                });
            }
        } else {
            dim = Some(d);
        }

        let mut payload = vec![0u8; d * 4];
        reader.read_exact(&mut payload).map_err(|_| CliError::MalformedVectorFile {
            path: path.display().to_string(),
            message: "truncated vector record".to_string(),
        })?;
        let vector: Vec<i32> = payload
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes(chunk.try_into().expect("chunks_exact(4)")))
            .collect();
        vectors.push(vector);
    }

    Ok((dim.unwrap_or(0), vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fvecs(path: &Path, records: &[Vec<f32>]) {
        let mut file = File::create(path).unwrap();
        for record in records {
            file.write_all(&(record.len() as i32).to_le_bytes()).unwrap();
            for value in record {
                file.write_all(&value.to_le_bytes()).unwrap();
            }
        }
    }

    #[test]
    fn test_round_trip_fvecs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.fvecs");
        let records = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        write_fvecs(&path, &records);

        let (dim, vectors) = read_fvecs(&path).unwrap();
        assert_eq!(dim, 3);
        assert_eq!(vectors, records);
    }

    #[test]
    fn test_empty_file_yields_zero_dim_and_no_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.fvecs");
        File::create(&path).unwrap();
        let (dim, vectors) = read_fvecs(&path).unwrap();
        assert_eq!(dim, 0);
        assert!(vectors.is_empty());
    }

    #[test]
    fn test_rejects_unreasonable_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fvecs");
        let mut file = File::create(&path).unwrap();
        file.write_all(&(-1i32).to_le_bytes()).unwrap();
        let err = read_fvecs(&path).unwrap_err();
        assert!(matches!(err, CliError::MalformedVectorFile { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_fvecs(Path::new("/nonexistent/base.fvecs")).unwrap_err();
        assert!(matches!(err, CliError::IoError(_)));
    }
}
