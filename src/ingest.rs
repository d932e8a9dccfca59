//! Tabular input ingestion.
//!
//! Parses an uploaded CSV file or spreadsheet workbook and extracts one
//! named column as a [`MeasurementSeries`]. Cells that are empty,
//! non-numeric, or non-finite are treated as missing and dropped; the order
//! of the remaining values is preserved.
//!
//! # Formats
//!
//! - `.csv` — comma-delimited with a header row
//! - `.xlsx`, `.xlsm`, `.xls`, `.ods` — first worksheet, first row as header
//!
//! Unknown extensions are sniffed: ZIP or OLE magic bytes mean a workbook,
//! anything else is read as CSV.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::AnalysisError;

/// Ordered measurements extracted from one column, with missing entries
/// removed. All values are finite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementSeries(Vec<f64>);

impl MeasurementSeries {
    /// Builds a series, dropping non-finite values.
    ///
    /// ```
    /// use u_capability::ingest::MeasurementSeries;
    ///
    /// let s = MeasurementSeries::from_values([1.0, f64::NAN, 3.0]);
    /// assert_eq!(s.values(), &[1.0, 3.0]);
    /// ```
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Self(values.into_iter().filter(|v| v.is_finite()).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for MeasurementSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Supported tabular formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    /// Detects the format from the filename extension, falling back to the
    /// leading bytes.
    pub fn detect(filename: &str, bytes: &[u8]) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => TableFormat::Csv,
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => TableFormat::Workbook,
            _ => Self::sniff(bytes),
        }
    }

    fn sniff(bytes: &[u8]) -> Self {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
        if bytes.starts_with(ZIP) || bytes.starts_with(OLE) {
            TableFormat::Workbook
        } else {
            TableFormat::Csv
        }
    }
}

/// Extracts `column` from an upload.
///
/// # Errors
///
/// - [`AnalysisError::NoFileProvided`] if `upload` is `None` or has an empty
///   filename
/// - [`AnalysisError::MalformedInput`] if the bytes are not a readable table
/// - [`AnalysisError::MissingColumn`] if the header lacks `column`
///
/// # Examples
///
/// ```
/// use u_capability::ingest::{read_upload, Upload};
///
/// let upload = Upload::new("data.csv", "Part,Measurement\na,10.5\nb,\nc,9.5\n");
/// let series = read_upload(Some(&upload), "Measurement").unwrap();
/// assert_eq!(series.values(), &[10.5, 9.5]);
/// ```
pub fn read_upload(upload: Option<&Upload>, column: &str) -> Result<MeasurementSeries, AnalysisError> {
    let upload = upload.ok_or(AnalysisError::NoFileProvided)?;
    if upload.filename.trim().is_empty() {
        return Err(AnalysisError::NoFileProvided);
    }
    let format = TableFormat::detect(&upload.filename, &upload.bytes);
    tracing::debug!(filename = %upload.filename, ?format, bytes = upload.bytes.len(), "reading upload");
    read_table(&upload.bytes, format, column)
}

/// Reads `column` from a file on disk.
///
/// # Errors
///
/// [`AnalysisError::Io`] if the file cannot be read; otherwise as
/// [`read_upload`].
pub fn read_path(path: &Path, column: &str) -> Result<MeasurementSeries, AnalysisError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = TableFormat::detect(&filename, &bytes);
    read_table(&bytes, format, column)
}

/// Reads `column` from raw bytes in the given format.
pub fn read_table(
    bytes: &[u8],
    format: TableFormat,
    column: &str,
) -> Result<MeasurementSeries, AnalysisError> {
    let series = match format {
        TableFormat::Csv => read_csv(bytes, column)?,
        TableFormat::Workbook => read_workbook(bytes, column)?,
    };
    tracing::debug!(column, values = series.len(), "extracted measurements");
    Ok(series)
}

fn missing_column(column: &str) -> AnalysisError {
    AnalysisError::MissingColumn {
        column: column.to_string(),
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

fn read_csv(bytes: &[u8], column: &str) -> Result<MeasurementSeries, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AnalysisError::MalformedInput(e.to_string()))?;
    if headers.is_empty() {
        return Err(AnalysisError::MalformedInput(
            "no header row".to_string(),
        ));
    }
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| missing_column(column))?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::MalformedInput(e.to_string()))?;
        if let Some(v) = record.get(index).and_then(parse_cell) {
            values.push(v);
        }
    }
    Ok(MeasurementSeries::from_values(values))
}

fn read_workbook(bytes: &[u8], column: &str) -> Result<MeasurementSeries, AnalysisError> {
    let malformed = |e: calamine::Error| AnalysisError::MalformedInput(e.to_string());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(malformed)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AnalysisError::MalformedInput("workbook has no worksheets".to_string()))?
        .map_err(malformed)?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| AnalysisError::MalformedInput("worksheet is empty".to_string()))?;
    let index = header
        .iter()
        .position(|cell| matches!(cell, Data::String(s) if s.trim() == column))
        .ok_or_else(|| missing_column(column))?;

    let values = rows.filter_map(|row| match row.get(index)? {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_cell(s),
        _ => None,
    });
    Ok(MeasurementSeries::from_values(values))
}
