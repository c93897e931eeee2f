//! CSV reading operations.

use std::{fs, io::Cursor, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::CsvReadOptions};
use walkdir::WalkDir;

use crate::attributes::{AttrValue, AttributeTable, Attributes};

/// Decode ISO-8859-1 bytes; every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads a `;`-delimited, ISO-8859-1 encoded file with a header row. Every
/// column is read as text.
pub(crate) fn read_semicolon_csv(path: &Path) -> Result<DataFrame> {
    let bytes = fs::read(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_separator(b';'))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(decode_latin1(&bytes).into_bytes()))
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Convert a text-only frame into attribute records keyed by `id_field`.
/// Integer-looking values become integers; empty cells are null.
pub(crate) fn attribute_table(df: &DataFrame, id_field: &str) -> Result<AttributeTable> {
    let ids = df.column(id_field)
        .map_err(|_| anyhow!("[io::csv::read] missing id column {id_field:?}"))?
        .str()?;

    let columns = df.get_columns().iter()
        .map(|col| Ok((col.name().to_string(), col.str()?)))
        .collect::<Result<Vec<_>>>()?;

    let mut table = AttributeTable::new();
    for row in 0..df.height() {
        let Some(id) = ids.get(row) else {
            bail!("[io::csv::read] row {} has an empty {id_field:?}", row + 1);
        };
        let record = columns.iter()
            .map(|(name, values)| (name.clone(), values.get(row).map(AttrValue::parse_lossy)))
            .collect::<Attributes>();
        table.insert(id.trim(), record);
    }
    Ok(table)
}

/// Read one attribute CSV file.
pub fn read_attribute_csv(path: &Path, id_field: &str) -> Result<AttributeTable> {
    let df = read_semicolon_csv(path)?;
    attribute_table(&df, id_field)
        .with_context(|| format!("[io::csv::read] {}", path.display()))
}

/// Read every `.csv` file directly inside `dir` (sorted by name) into one table.
pub fn read_attribute_dir(dir: &Path, id_field: &str) -> Result<AttributeTable> {
    let mut files = WalkDir::new(dir).min_depth(1).max_depth(1).into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")))
        .collect::<Vec<_>>();
    files.sort();
    if files.is_empty() {
        bail!("[io::csv::read] no CSV files in {}", dir.display());
    }

    let mut table = AttributeTable::new();
    for file in files {
        let part = read_attribute_csv(&file, id_field)?;
        log::debug!("[io::csv::read] {} records from {}", part.len(), file.display());
        table.extend(part);
    }
    Ok(table)
}
