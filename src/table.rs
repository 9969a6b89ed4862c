//! Reading client tables.
//!
//! The tables come out of spreadsheet exports of mixed quality, so decoding
//! is permissive: invalid UTF-8 byte sequences are dropped instead of failing
//! the whole run, and a leading byte-order mark is removed so the first
//! column name can still be matched against known aliases.

use crate::error::{ConvertError, Result};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data row of the table, keyed positionally by the header row.
///
/// Column names may be empty or repeated, so this is an ordered list of
/// pairs rather than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<(String, String)>,
}

impl Record {
    /// Build a record from a header and a row, padding short rows with empty
    /// cells and dropping cells beyond the header width.
    pub fn from_row<S: AsRef<str>>(header: &[String], row: &[S]) -> Self {
        let cells = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = row.get(i).map(|v| v.as_ref()).unwrap_or_default();
                (name.clone(), value.to_string())
            })
            .collect();
        Self { cells }
    }

    /// Value of the first column with exactly this name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// (column name, value) pairs in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A parsed table: header row plus every data record in file order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

/// Decode bytes as UTF-8, silently dropping invalid sequences.
fn decode_permissive(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                break;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    text.push_str(valid);
                }
                match err.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at end of input
                    None => break,
                }
            }
        }
    }

    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| ConvertError::input(path, e))?;
    Ok(decode_permissive(&bytes))
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn parse_header(reader: &mut csv::Reader<&[u8]>, path: &Path) -> Result<Vec<String>> {
    let header: Vec<String> = reader
        .headers()
        .map_err(|source| ConvertError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(String::from)
        .collect();

    if header.is_empty() {
        return Err(ConvertError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    Ok(header)
}

/// Parse delimited text into a [`Table`]. `path` is only used for error context.
pub fn parse_table(text: &str, path: &Path) -> Result<Table> {
    let mut reader = csv_reader(text);
    let header = parse_header(&mut reader, path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| ConvertError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let cells: Vec<&str> = row.iter().collect();
        records.push(Record::from_row(&header, &cells));
    }

    Ok(Table { header, records })
}

/// Read the header row and every data record of a table.
pub fn read_table(path: &Path) -> Result<Table> {
    let text = read_text(path)?;
    let table = parse_table(&text, path)?;
    debug!(
        path = %path.display(),
        columns = table.header.len(),
        records = table.records.len(),
        "read table"
    );
    Ok(table)
}

/// Read only the header row of a table; data rows are not parsed.
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let text = read_text(path)?;
    let mut reader = csv_reader(&text);
    parse_header(&mut reader, path)
}
