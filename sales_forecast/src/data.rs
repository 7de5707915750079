//! Tabular upload handling for forecasting
//!
//! Uploads arrive as CSV or Excel workbooks. They are read into a loosely
//! typed [`RawTable`], then a date column and a numeric target column are
//! resolved and turned into a sorted [`SalesSeries`].

use crate::error::{ForecastError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Date column used when the caller does not name one
pub const DEFAULT_DATE_COLUMN: &str = "Date";

/// Target column used when the caller does not name one
pub const DEFAULT_TARGET_COLUMN: &str = "Valor";

/// Formats tried, in order, when no explicit date format is given
const DATE_FORMATS: &[&str] = &[
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const DATE_COLUMN_HINTS: &[&str] = &["date", "data", "time", "dia", "day"];

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// Detect the format from a file name; anything unrecognised is read as CSV
    pub fn from_file_name(name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => FileFormat::Excel,
            _ => FileFormat::Csv,
        }
    }
}

/// A single cell of an uploaded table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Uploaded table with a header row
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names from the first row
    pub headers: Vec<String>,
    /// Data rows; may be shorter than the header row
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows[row].get(column).unwrap_or(&Cell::Empty)
    }

    fn find_column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }
}

/// Data loader for uploaded tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read a table from a file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let format = FileFormat::from_file_name(&path.to_string_lossy());
        Self::from_bytes(&bytes, format)
    }

    /// Read a table from an in-memory upload
    pub fn from_bytes(bytes: &[u8], format: FileFormat) -> Result<RawTable> {
        let table = match format {
            FileFormat::Csv => Self::read_csv(bytes)?,
            FileFormat::Excel => Self::read_excel(bytes)?,
        };

        if table.headers.is_empty() {
            return Err(ForecastError::DataError("Missing header row".to_string()));
        }
        if table.is_empty() {
            return Err(ForecastError::DataError("No data rows found".to_string()));
        }

        debug!(
            columns = table.headers.len(),
            rows = table.len(),
            "read uploaded table"
        );
        Ok(table)
    }

    fn read_csv(bytes: &[u8]) -> Result<RawTable> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(text);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Ok(RawTable {
                headers: Vec::new(),
                rows: Vec::new(),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<Cell> = record
                .iter()
                .map(|field| parse_csv_cell(field, delimiter))
                .collect();
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    fn read_excel(bytes: &[u8]) -> Result<RawTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ForecastError::DataError("Workbook has no worksheets".to_string()))??;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = match sheet_rows.next() {
            Some(header) => header.iter().map(|cell| cell.to_string().trim().to_string()).collect(),
            None => Vec::new(),
        };

        let rows = sheet_rows
            .map(|row| row.iter().map(excel_cell).collect::<Vec<Cell>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        Ok(RawTable { headers, rows })
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn parse_csv_cell(field: &str, delimiter: u8) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    match parse_number(field, delimiter == b';') {
        Some(value) => Cell::Number(value),
        None => Cell::Text(field.to_string()),
    }
}

/// Parse a numeric cell, optionally accepting `1.234,56` style decimals
fn parse_number(text: &str, decimal_comma: bool) -> Option<f64> {
    let text = text.trim();
    let parsed = text.parse::<f64>().ok().or_else(|| {
        if decimal_comma && text.contains(',') {
            text.replace('.', "").replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    });
    parsed.filter(|value| value.is_finite())
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::DateTime(value) => excel_serial_to_date(value.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::String(text) | Data::DateTimeIso(text) => {
            let text = text.trim();
            if text.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(text.to_string())
            }
        }
        other => Cell::Text(other.to_string()),
    }
}

/// Convert an Excel date serial (1900 date system) to a calendar date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Day zero is 1899-12-30, which absorbs Excel's fictitious 1900-02-29
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Parse a date string, trying an explicit format first or the known formats in order
pub fn parse_date(text: &str, explicit_format: Option<&str>) -> Result<NaiveDate> {
    let text = text.trim();

    if let Some(format) = explicit_format {
        return NaiveDate::parse_from_str(text, format)
            .or_else(|_| NaiveDateTime::parse_from_str(text, format).map(|dt| dt.date()))
            .map_err(|e| {
                ForecastError::ParseError(format!(
                    "Date '{}' does not match format '{}': {}",
                    text, format, e
                ))
            });
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    {
        return Ok(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| ForecastError::ParseError(format!("Unrecognised date '{}'", text)))
}

/// Which columns to read and how to parse dates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Name of the date column; defaults to `Date`
    pub date_column: Option<String>,
    /// Name of the numeric target column; defaults to `Valor`
    pub target_column: Option<String>,
    /// Explicit chrono format for the date column
    pub date_format: Option<String>,
}

impl ColumnSpec {
    /// Resolve the date column index
    pub fn resolve_date_column(&self, table: &RawTable) -> Result<usize> {
        if let Some(name) = &self.date_column {
            return table
                .find_column(name)
                .ok_or_else(|| ForecastError::ColumnNotFound(name.clone()));
        }

        table
            .find_column(DEFAULT_DATE_COLUMN)
            .or_else(|| {
                table.headers.iter().position(|header| {
                    let lower = header.to_lowercase();
                    DATE_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
                })
            })
            .ok_or_else(|| {
                ForecastError::ColumnNotFound(format!(
                    "No date column found (expected '{}')",
                    DEFAULT_DATE_COLUMN
                ))
            })
    }

    /// Resolve the target column index, never returning the date column
    pub fn resolve_target_column(&self, table: &RawTable, date_column: usize) -> Result<usize> {
        if let Some(name) = &self.target_column {
            return table
                .find_column(name)
                .ok_or_else(|| ForecastError::ColumnNotFound(name.clone()));
        }

        if let Some(index) = table.find_column(DEFAULT_TARGET_COLUMN) {
            return Ok(index);
        }

        // Fall back to the first fully numeric column
        (0..table.headers.len())
            .filter(|&column| column != date_column)
            .find(|&column| {
                let mut cells = (0..table.len())
                    .map(|row| table.cell(row, column))
                    .filter(|cell| !cell.is_empty())
                    .peekable();
                cells.peek().is_some() && cells.all(|cell| matches!(cell, Cell::Number(_)))
            })
            .ok_or_else(|| {
                ForecastError::ColumnNotFound(format!(
                    "No numeric target column found (expected '{}')",
                    DEFAULT_TARGET_COLUMN
                ))
            })
    }
}

/// A dated sales figure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sales observations sorted by date
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSeries {
    observations: Vec<Observation>,
}

impl SalesSeries {
    /// Create a series from observations, sorting them by date
    pub fn new(mut observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(ForecastError::DataError(
                "No observations found".to_string(),
            ));
        }
        observations.sort_by_key(|obs| obs.date);
        Ok(Self { observations })
    }

    /// Create a series from parallel date and value vectors
    pub fn from_pairs(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates ({}) and values ({}) have different lengths",
                dates.len(),
                values.len()
            )));
        }
        Self::new(
            dates
                .into_iter()
                .zip(values)
                .map(|(date, value)| Observation { date, value })
                .collect(),
        )
    }

    /// Extract the series from an uploaded table
    pub fn from_table(table: &RawTable, spec: &ColumnSpec) -> Result<Self> {
        let date_column = spec.resolve_date_column(table)?;
        let target_column = spec.resolve_target_column(table, date_column)?;
        let date_format = spec.date_format.as_deref();

        debug!(
            date_column = %table.headers[date_column],
            target_column = %table.headers[target_column],
            "resolved columns"
        );

        let mut observations = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            // Header is line 1
            let line = row + 2;
            let date_cell = table.cell(row, date_column);
            let target_cell = table.cell(row, target_column);

            match (date_cell.is_empty(), target_cell.is_empty()) {
                (true, true) => continue,
                (true, false) => {
                    return Err(ForecastError::ParseError(format!(
                        "Row {}: missing date",
                        line
                    )))
                }
                (false, true) => {
                    return Err(ForecastError::ParseError(format!(
                        "Row {}: missing target value",
                        line
                    )))
                }
                (false, false) => {}
            }

            let date = match date_cell {
                Cell::Date(date) => *date,
                Cell::Text(text) => {
                    parse_date(text, date_format).map_err(|e| at_row(line, e))?
                }
                // Compact dates such as 20230201 are read as numbers
                Cell::Number(number) if date_format.is_some() => {
                    parse_date(&format!("{:.0}", number), date_format)
                        .map_err(|e| at_row(line, e))?
                }
                Cell::Number(serial) => excel_serial_to_date(*serial).ok_or_else(|| {
                    ForecastError::ParseError(format!(
                        "Row {}: {} is not a valid date",
                        line, serial
                    ))
                })?,
                Cell::Empty => {
                    return Err(ForecastError::ParseError(format!(
                        "Row {}: missing date",
                        line
                    )))
                }
            };

            let value = match target_cell {
                Cell::Number(value) => *value,
                Cell::Text(text) => parse_number(text, true).ok_or_else(|| {
                    ForecastError::ParseError(format!(
                        "Row {}: target value '{}' is not numeric",
                        line, text
                    ))
                })?,
                other => {
                    return Err(ForecastError::ParseError(format!(
                        "Row {}: expected a number, found {:?}",
                        line, other
                    )))
                }
            };

            observations.push(Observation { date, value });
        }

        Self::new(observations)
    }

    /// Get the observations
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|obs| obs.date).collect()
    }

    /// Get the values as a vector
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|obs| obs.value).collect()
    }

    /// Earliest date
    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    /// Latest date
    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }

    /// Calculate the mean of the values
    pub fn mean(&self) -> f64 {
        self.observations.iter().map(|obs| obs.value).sum::<f64>() / self.len() as f64
    }

    /// Sum values per calendar day, with `NaN` for days without observations
    pub fn daily_totals(&self) -> DailySeries {
        let start = self.first_date();
        let days = (self.last_date() - start).num_days() as usize + 1;
        let mut values = vec![f64::NAN; days];

        for obs in &self.observations {
            let slot = &mut values[(obs.date - start).num_days() as usize];
            *slot = if slot.is_nan() {
                obs.value
            } else {
                *slot + obs.value
            };
        }

        DailySeries { start, values }
    }
}

fn at_row(line: usize, err: ForecastError) -> ForecastError {
    match err {
        ForecastError::ParseError(msg) => ForecastError::ParseError(format!("Row {}: {}", line, msg)),
        other => other,
    }
}

/// A regular daily series starting at `start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// Date of the first value
    pub start: NaiveDate,
    /// One value per day; `NaN` marks a missing day
    #[serde(with = "missing_as_null")]
    pub values: Vec<f64>,
}

/// Missing days are stored as `null`, since JSON has no `NaN`
mod missing_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

impl DailySeries {
    /// Number of days covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series covers no days
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Date of the last value
    pub fn last_date(&self) -> NaiveDate {
        self.start + chrono::Duration::days(self.values.len() as i64 - 1)
    }

    /// Number of days with an observation
    pub fn observed_days(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}
