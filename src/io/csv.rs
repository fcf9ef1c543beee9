//! CSV reading and writing.
//!
//! - [`read_csv_columns`]: selected columns of one file, row by row, each
//!   tagged with its 1-based data row number (header excluded); a malformed
//!   row is returned as an error value instead of ending the read
//! - [`write_csv_vec`]: serde-serialized rows with a derived header
//! - [`write_csv_table`]: rows of plain strings under an explicit header, for
//!   tables whose columns are only known at runtime
//!
//! Writers create missing parent directories.

use crate::error::ParseError;
use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::fs::{File, create_dir_all};
use std::io::BufReader;
use std::path::Path;

/// Cells of one data row under the requested columns (`None` for an empty
/// cell or a column the file lacks), or why the row is unusable.
pub type RowCells = Result<Vec<Option<String>>, ParseError>;

/// Read `columns` from every row of a header-bearing CSV file.
///
/// Columns are matched by header name; other columns are ignored. Rows are
/// read leniently: a row whose field count differs from the header yields
/// [`ParseError::WrongWidth`] and a requested cell that is not UTF-8 yields
/// [`ParseError::InvalidUtf8`], and reading continues with the next row.
///
/// # Errors
/// Fails if the file or its header cannot be read, naming the file.
pub fn read_csv_columns(path: impl AsRef<Path>, columns: &[&str]) -> Result<Vec<(u64, RowCells)>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(f));
    let header = rdr
        .byte_headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    let positions: Vec<Option<usize>> = columns
        .iter()
        .map(|c| header.iter().position(|h| h == c.as_bytes()))
        .collect();

    let mut out = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        let row = out.len() as u64 + 1;
        let more = rdr
            .read_byte_record(&mut record)
            .with_context(|| format!("read CSV record #{row} in {}", path.display()))?;
        if !more {
            break;
        }
        out.push((row, select(&record, header.len(), columns, &positions)));
    }
    Ok(out)
}

fn select(record: &ByteRecord, width: usize, columns: &[&str], positions: &[Option<usize>]) -> RowCells {
    if record.len() != width {
        return Err(ParseError::WrongWidth {
            found: record.len(),
            expected: width,
        });
    }
    columns
        .iter()
        .zip(positions)
        .map(|(name, pos)| match pos.and_then(|i| record.get(i)) {
            None | Some(b"") => Ok(None),
            Some(bytes) => std::str::from_utf8(bytes)
                .map(|s| Some(s.to_string()))
                .map_err(|_| ParseError::InvalidUtf8 {
                    column: (*name).to_string(),
                }),
        })
        .collect()
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("create {}", path.display()))
}

/// Write serde rows with a header derived from `T`'s field names.
///
/// # Returns
/// The number of rows written.
///
/// # Errors
/// Fails on file creation, serialization or flush errors.
pub fn write_csv_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_writer(create_file(path)?);
    for (i, row) in data.iter().enumerate() {
        wtr.serialize(row)
            .with_context(|| format!("serialize CSV row #{}", i + 1))?;
    }
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(data.len())
}

/// Write `header` followed by `rows`, each already rendered to strings.
///
/// # Returns
/// The number of data rows written.
///
/// # Errors
/// Fails on file creation, a row whose width differs from the header, or
/// flush errors.
pub fn write_csv_table<I>(path: impl AsRef<Path>, header: &[String], rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_writer(create_file(path)?);
    wtr.write_record(header)
        .with_context(|| format!("write header to {}", path.display()))?;
    let mut n = 0;
    for row in rows {
        n += 1;
        wtr.write_record(&row)
            .with_context(|| format!("write CSV row #{n} to {}", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Serialize)]
    struct Row {
        id: u32,
        name: Option<String>,
    }

    #[test]
    fn reads_by_header_and_ignores_extra_columns() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("in.csv");
        fs::write(&path, "extra,name,id\nx,Alice,10\ny,,20\n")?;

        let rows = read_csv_columns(&path, &["id", "name", "missing"])?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (1, Ok(vec![Some("10".into()), Some("Alice".into()), None])));
        assert_eq!(rows[1], (2, Ok(vec![Some("20".into()), None, None])));
        Ok(())
    }

    #[test]
    fn malformed_rows_do_not_end_the_read() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("ragged.csv");
        fs::write(&path, b"id,name\n1,a\n2,b,extra\n3\n4,\xffx\n5,e\n")?;

        let rows = read_csv_columns(&path, &["id", "name"])?;
        let rows: Vec<_> = rows.into_iter().map(|(_, cells)| cells).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], Ok(vec![Some("1".into()), Some("a".into())]));
        assert_eq!(rows[1], Err(ParseError::WrongWidth { found: 3, expected: 2 }));
        assert_eq!(rows[2], Err(ParseError::WrongWidth { found: 1, expected: 2 }));
        assert_eq!(rows[3], Err(ParseError::InvalidUtf8 { column: "name".into() }));
        assert_eq!(rows[4], Ok(vec![Some("5".into()), Some("e".into())]));
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_csv_columns("/no/such/dir/in.csv", &["id"]).unwrap_err();
        assert!(format!("{err:#}").contains("in.csv"));
    }

    #[test]
    fn table_writer_emits_header_then_rows() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("nested/out.csv");
        let header = vec!["a".to_string(), "b".to_string()];
        let n = write_csv_table(&path, &header, vec![vec!["1".into(), String::new()]])?;
        assert_eq!(n, 1);
        assert_eq!(fs::read_to_string(&path)?, "a,b\n1,\n");
        Ok(())
    }

    #[test]
    fn serde_writer_derives_header() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("rows.csv");
        write_csv_vec(&path, &[Row { id: 1, name: Some("A".into()) }])?;
        assert_eq!(fs::read_to_string(&path)?, "id,name\n1,A\n");
        Ok(())
    }
}
