use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use walkdir::WalkDir;

use crate::{error::RecordError, graph::Activity, region::RegionId};

/// One line of a cell-pair extract: `time \t cell1 \t cell2 \t strength`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRecord {
    pub time: i64,
    pub cell1: RegionId,
    pub cell2: RegionId,
    pub strength: f64,
}

/// One line of a cell-category extract:
/// `cell \t time \t code \t smsIn \t smsOut \t callIn \t callOut \t internet`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub cell: RegionId,
    pub code: String,
    pub activity: Activity,
}

fn fields(line: &str, expected: usize) -> Result<Vec<&str>, RecordError> {
    let fields = line.split('\t').collect::<Vec<_>>();
    if fields.len() != expected {
        return Err(RecordError::FieldCount { expected, found: fields.len() });
    }
    Ok(fields)
}

fn int_field(fields: &[&str], index: usize) -> Result<i64, RecordError> {
    let raw = fields[index].trim();
    if raw.is_empty() {
        return Err(RecordError::MissingField { index });
    }
    raw.parse().map_err(|_| RecordError::NotAnInteger { index, value: raw.to_string() })
}

fn float_field(fields: &[&str], index: usize) -> Result<f64, RecordError> {
    let raw = fields[index].trim();
    if raw.is_empty() {
        return Err(RecordError::MissingField { index });
    }
    raw.parse().map_err(|_| RecordError::NotANumber { index, value: raw.to_string() })
}

/// An empty activity field is absent, not zero.
fn optional_float_field(fields: &[&str], index: usize) -> Result<Option<f64>, RecordError> {
    if fields[index].trim().is_empty() { Ok(None) } else { float_field(fields, index).map(Some) }
}

impl PairRecord {
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let f = fields(line, 4)?;
        Ok(Self {
            time: int_field(&f, 0)?,
            cell1: RegionId::from(int_field(&f, 1)?),
            cell2: RegionId::from(int_field(&f, 2)?),
            strength: float_field(&f, 3)?,
        })
    }
}

impl CategoryRecord {
    /// The timestamp (field 1) is not validated.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let f = fields(line, 8)?;
        Ok(Self {
            cell: RegionId::from(int_field(&f, 0)?),
            code: int_field(&f, 2)?.to_string(),
            activity: Activity {
                sms_in: optional_float_field(&f, 3)?,
                sms_out: optional_float_field(&f, 4)?,
                call_in: optional_float_field(&f, 5)?,
                call_out: optional_float_field(&f, 6)?,
                internet: optional_float_field(&f, 7)?,
            },
        })
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Open an extract for line-by-line reading, decompressing `.gz` files.
pub fn open_extract(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("[aggregate::extract] Failed to open {}", path.display()))?;
    Ok(if is_gzip(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Stream the non-blank lines of an extract through `parse` and `sink`.
/// The first malformed line aborts with its file and line number. Returns
/// the number of records parsed.
pub fn read_extract<R>(
    path: &Path,
    parse: impl Fn(&str) -> Result<R, RecordError>,
    mut sink: impl FnMut(R),
) -> Result<usize> {
    let mut reader = open_extract(path)?;
    let mut line = String::new();
    let mut line_no = 0;
    let mut records = 0;

    loop {
        line.clear();
        let n = reader.read_line(&mut line)
            .with_context(|| format!("[aggregate::extract] {}:{}: read error", path.display(), line_no + 1))?;
        if n == 0 { break }
        line_no += 1;

        let text = line.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() { continue }

        let record = parse(text)
            .with_context(|| format!("[aggregate::extract] {}:{line_no}: malformed line {text:?}", path.display()))?;
        sink(record);
        records += 1;
    }
    Ok(records)
}

/// Every `.txt` or `.txt.gz` file under `dir`, sorted by path.
pub fn discover_extracts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("[aggregate::extract] not a directory: {}", dir.display());
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.with_context(|| format!("[aggregate::extract] walking {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && (name.ends_with(".txt") || name.ends_with(".txt.gz")) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Write};

    use flate2::{write::GzEncoder, Compression};

    #[test]
    fn pair_lines() {
        let record = PairRecord::parse("1383260400000\t1\t10000\t0.0779").unwrap();
        assert_eq!(record.cell1.as_str(), "1");
        assert_eq!(record.cell2.as_str(), "10000");
        assert_eq!(record.strength, 0.0779);

        assert_eq!(PairRecord::parse("1\t2\t3"), Err(RecordError::FieldCount { expected: 4, found: 3 }));
        assert_eq!(PairRecord::parse("1\tx\t3\t1.0"),
                   Err(RecordError::NotAnInteger { index: 1, value: "x".into() }));
        assert_eq!(PairRecord::parse("1\t2\t3\t"), Err(RecordError::MissingField { index: 3 }));
    }

    #[test]
    fn category_lines_allow_empty_activity() {
        let record = CategoryRecord::parse("1\tanything\t39\t0.08\t\t0.5\t\t1.2").unwrap();
        assert_eq!(record.cell.as_str(), "1");
        assert_eq!(record.code, "39");
        assert_eq!(record.activity, Activity {
            sms_in: Some(0.08), sms_out: None, call_in: Some(0.5), call_out: None, internet: Some(1.2),
        });

        assert!(matches!(CategoryRecord::parse("1\tt\t39\t0.08"), Err(RecordError::FieldCount { expected: 8, .. })));
        assert!(matches!(CategoryRecord::parse("1\tt\t39\tabc\t\t\t\t"), Err(RecordError::NotANumber { index: 3, .. })));
        assert!(matches!(CategoryRecord::parse("1\tt\t\t\t\t\t\t"), Err(RecordError::MissingField { index: 2 })));
    }

    #[test]
    fn gzip_and_plain_extracts_read_alike() {
        let dir = tempfile::tempdir().unwrap();
        let body = "1\t1\t2\t0.5\n\n1\t2\t3\t1.5\r\n";

        let plain = dir.path().join("a.txt");
        fs::write(&plain, body).unwrap();
        let gz = dir.path().join("b.txt.gz");
        let mut encoder = GzEncoder::new(fs::File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();

        for path in [&plain, &gz] {
            let mut total = 0.0;
            let n = read_extract(path, PairRecord::parse, |r| total += r.strength).unwrap();
            assert_eq!(n, 2);
            assert_eq!(total, 2.0);
        }
    }

    #[test]
    fn malformed_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "1\t1\t2\t0.5\n1\t1\t2\n").unwrap();

        let err = read_extract(&path, PairRecord::parse, |_| {}).unwrap_err();
        assert!(format!("{err:#}").contains("bad.txt:2"), "{err:#}");
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt.gz", "c.json", "notes.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let found = discover_extracts(dir.path()).unwrap();
        let names = found.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.txt.gz", "b.txt"]);
    }
}
