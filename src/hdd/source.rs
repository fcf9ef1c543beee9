//! Record source backed by a directory of daily snapshot CSV files.

use crate::hdd::record::{RawRecord, RowOrigin, SourcedRecord};
use crate::io::csv::read_csv_columns;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "parallel-io")]
use rayon::prelude::*;

fn read_snapshot_file(path: &Path) -> Result<Vec<SourcedRecord>> {
    let file: Arc<str> = Arc::from(path.display().to_string());
    let rows = read_csv_columns(path, &RawRecord::COLUMNS)?;
    let malformed = rows.iter().filter(|(_, cells)| cells.is_err()).count();
    debug!(file = %file, rows = rows.len(), malformed, "read snapshot file");
    Ok(rows
        .into_iter()
        .map(|(row, cells)| SourcedRecord {
            origin: RowOrigin {
                file: Arc::clone(&file),
                row,
            },
            raw: cells.map(RawRecord::from_cells),
        })
        .collect())
}

/// Read every file into one logical dataset, keeping file order.
///
/// Malformed rows are kept, carrying their defect, for the parse policy to
/// handle.
///
/// # Errors
/// The first file that cannot be opened or read aborts the load.
pub fn load_snapshot_files(files: &[PathBuf], parallel: bool) -> Result<Vec<SourcedRecord>> {
    let per_file: Vec<Vec<SourcedRecord>> = if parallel {
        read_all(files)?
    } else {
        files
            .iter()
            .map(|f| read_snapshot_file(f))
            .collect::<Result<Vec<_>>>()?
    };
    Ok(per_file.into_iter().flatten().collect())
}

#[cfg(feature = "parallel-io")]
fn read_all(files: &[PathBuf]) -> Result<Vec<Vec<SourcedRecord>>> {
    files.par_iter().map(|f| read_snapshot_file(f)).collect()
}

#[cfg(not(feature = "parallel-io"))]
fn read_all(files: &[PathBuf]) -> Result<Vec<Vec<SourcedRecord>>> {
    files.iter().map(|f| read_snapshot_file(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::fs;

    #[test]
    fn rows_keep_their_origin() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let a = tmp.path().join("a.csv");
        let b = tmp.path().join("b.csv");
        fs::write(
            &a,
            "date,serial_number,model,capacity_bytes,failure,smart_1_raw\n\
             2021-01-04,SN1,ModelA,1000000000000,0,17\n",
        )?;
        fs::write(
            &b,
            "date,serial_number,model,capacity_bytes,failure\n\
             2021-01-05,SN1,ModelA,,0\n\
             2021-01-05,SN2,ModelA,1000000000000,1\n",
        )?;

        for parallel in [false, true] {
            let recs = load_snapshot_files(&[a.clone(), b.clone()], parallel)?;
            assert_eq!(recs.len(), 3);
            assert_eq!(recs[0].origin.row, 1);
            assert!(recs[0].origin.file.ends_with("a.csv"));
            let second = recs[1].raw.clone().expect("well-formed row");
            assert_eq!(second.capacity_bytes, None);
            assert_eq!(recs[2].origin.row, 2);
            let third = recs[2].raw.clone().expect("well-formed row");
            assert_eq!(third.failure.as_deref(), Some("1"));
        }
        Ok(())
    }

    #[test]
    fn malformed_rows_carry_their_defect() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("ragged.csv");
        fs::write(
            &path,
            b"date,serial_number,model,capacity_bytes,failure\n\
              2021-01-04,SN1,ModelA,1000000000000,0,extra\n\
              2021-01-04,S\xff1,ModelA,1000000000000,0\n\
              2021-01-04,SN2,ModelA,1000000000000,0\n",
        )?;

        let recs = load_snapshot_files(&[path], false)?;
        assert_eq!(recs.len(), 3);
        assert_eq!(
            recs[0].raw,
            Err(ParseError::WrongWidth {
                found: 6,
                expected: 5
            })
        );
        assert_eq!(
            recs[1].raw,
            Err(ParseError::InvalidUtf8 {
                column: "serial_number".into()
            })
        );
        assert_eq!(recs[2].origin.row, 3);
        assert!(recs[2].raw.is_ok());
        Ok(())
    }
}
