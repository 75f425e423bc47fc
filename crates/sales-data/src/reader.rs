//! Tabular source loading for the sales report.
//!
//! Decodes an uploaded export into a [`RawTable`], maps its headers onto the
//! logical record columns, fills defaultable columns and normalises every row
//! into a [`NormalizedRecord`].

use std::collections::HashMap;
use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xls, Xlsx};

use sales_core::error::LoadError;
use sales_core::models::{NormalizedRecord, RawAmount, Record};
use tracing::{debug, warn};

// ── Raw table ─────────────────────────────────────────────────────────────────

/// One decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Cell contents as text; numbers use their shortest representation.
    fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Number(value) => value.to_string(),
        }
    }

    fn as_optional_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            other => Some(other.as_text()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

/// A decoded table: a header row plus data rows of cells.
///
/// Rows shorter than the header are padded with [`Cell::Empty`] on access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Index of the first header matching any of `aliases`.
    ///
    /// Headers are compared after trimming whitespace and a UTF-8 BOM.
    pub fn column_index(&self, aliases: &[String]) -> Option<usize> {
        self.headers.iter().position(|header| {
            let header = header.trim_start_matches('\u{feff}').trim();
            aliases.iter().any(|alias| alias == header)
        })
    }
}

// ── Formats & decoders ────────────────────────────────────────────────────────

/// The tabular encodings an upload may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Csv,
    Xls,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xls" => Ok(SourceFormat::Xls),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "" => Err(LoadError::UnsupportedFormat(path.display().to_string())),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xls => "xls",
            SourceFormat::Xlsx => "xlsx",
        };
        f.write_str(name)
    }
}

/// Turns the raw bytes of one upload into a [`RawTable`].
pub trait TableDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, LoadError>;
}

/// UTF-8 CSV with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvDecoder;

impl TableDecoder for CsvDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = rdr
            .headers()
            .map_err(|e| LoadError::Decode(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut table = RawTable::new(headers);
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| {
                LoadError::Decode(format!("Failed to read CSV row {}: {}", line + 2, e))
            })?;
            table.push_row(record.iter().map(Cell::from).collect());
        }

        Ok(table)
    }
}

/// First worksheet of an Excel workbook; its first row is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadsheetDecoder {
    format: SourceFormat,
}

impl SpreadsheetDecoder {
    pub fn xls() -> Self {
        Self {
            format: SourceFormat::Xls,
        }
    }

    pub fn xlsx() -> Self {
        Self {
            format: SourceFormat::Xlsx,
        }
    }
}

impl TableDecoder for SpreadsheetDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, LoadError> {
        match self.format {
            SourceFormat::Xls => decode_workbook::<Xls<Cursor<Vec<u8>>>>(bytes, self.format),
            _ => decode_workbook::<Xlsx<Cursor<Vec<u8>>>>(bytes, self.format),
        }
    }
}

fn decode_workbook<R>(bytes: &[u8], format: SourceFormat) -> Result<RawTable, LoadError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Display,
{
    let mut workbook = R::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| LoadError::Decode(format!("Failed to open {} workbook: {}", format, e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Decode(format!("{} workbook has no worksheets", format)))?
        .map_err(|e| LoadError::Decode(format!("Failed to read {} worksheet: {}", format, e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|c| Cell::from(c).as_text()).collect())
        .unwrap_or_default();

    let mut table = RawTable::new(headers);
    for row in rows {
        let cells: Vec<Cell> = row.iter().map(Cell::from).collect();
        // Formatting can extend the used range past the data.
        if cells.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        table.push_row(cells);
    }

    Ok(table)
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(text) if text.trim().is_empty() => Cell::Empty,
            Data::String(text) => Cell::Text(text.trim().to_string()),
            Data::Float(number) => Cell::Number(*number),
            Data::Int(number) => Cell::Number(*number as f64),
            other => Cell::Text(other.to_string()),
        }
    }
}

// ── Column mapping ────────────────────────────────────────────────────────────

/// Accepted header names for each logical column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub category_raw: Vec<String>,
    pub product_name: Vec<String>,
    pub order_count: Vec<String>,
    pub sale_amount: Vec<String>,
    pub branch_name: Vec<String>,
    pub period_label: Vec<String>,
}

impl Default for ColumnMapping {
    /// Canonical names plus the headers of the Korean point-of-sale export.
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            category_raw: names(&["category_raw", "분류명"]),
            product_name: names(&["product_name", "상품명"]),
            order_count: names(&["order_count", "주문수"]),
            sale_amount: names(&["sale_amount", "실판매금액"]),
            branch_name: names(&["branch_name", "지점명"]),
            period_label: names(&["period_label", "월"]),
        }
    }
}

/// Resolved column positions for one table.
struct ColumnIndex {
    category_raw: usize,
    product_name: usize,
    order_count: usize,
    sale_amount: usize,
    branch_name: Option<usize>,
    period_label: Option<usize>,
}

impl ColumnIndex {
    fn resolve(table: &RawTable, mapping: &ColumnMapping) -> Result<Self, LoadError> {
        let required = |aliases: &[String]| {
            table
                .column_index(aliases)
                .ok_or_else(|| LoadError::MissingColumn(aliases.first().cloned().unwrap_or_default()))
        };

        Ok(Self {
            category_raw: required(&mapping.category_raw)?,
            product_name: required(&mapping.product_name)?,
            order_count: required(&mapping.order_count)?,
            sale_amount: required(&mapping.sale_amount)?,
            branch_name: table.column_index(&mapping.branch_name),
            period_label: table.column_index(&mapping.period_label),
        })
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Decoder registry plus column mapping; the boundary between uploads and the
/// core pipeline.
pub struct Loader {
    mapping: ColumnMapping,
    decoders: HashMap<SourceFormat, Box<dyn TableDecoder>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader with the default column mapping and the built-in CSV and
    /// Excel decoders.
    pub fn new() -> Self {
        let mut decoders: HashMap<SourceFormat, Box<dyn TableDecoder>> = HashMap::new();
        decoders.insert(SourceFormat::Csv, Box::new(CsvDecoder));
        decoders.insert(SourceFormat::Xls, Box::new(SpreadsheetDecoder::xls()));
        decoders.insert(SourceFormat::Xlsx, Box::new(SpreadsheetDecoder::xlsx()));
        Self {
            mapping: ColumnMapping::default(),
            decoders,
        }
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Install (or replace) the decoder used for `format`.
    pub fn register_decoder(&mut self, format: SourceFormat, decoder: Box<dyn TableDecoder>) {
        self.decoders.insert(format, decoder);
    }

    /// Stop accepting `format`; later loads fail with
    /// [`LoadError::DecoderUnavailable`].
    pub fn remove_decoder(&mut self, format: SourceFormat) -> Option<Box<dyn TableDecoder>> {
        self.decoders.remove(&format)
    }

    /// Read, decode and normalise the file at `path`.
    pub fn load_file(
        &self,
        path: &Path,
        period_label: &str,
    ) -> Result<Vec<NormalizedRecord>, LoadError> {
        let format = SourceFormat::from_path(path)?;
        let bytes = read_source(path)?;
        self.load_bytes(&bytes, format, period_label)
    }

    /// Decode and normalise an in-memory upload.
    pub fn load_bytes(
        &self,
        bytes: &[u8],
        format: SourceFormat,
        period_label: &str,
    ) -> Result<Vec<NormalizedRecord>, LoadError> {
        let decoder = self
            .decoders
            .get(&format)
            .ok_or_else(|| LoadError::DecoderUnavailable(format.to_string()))?;
        let table = decoder.decode(bytes)?;
        self.load_table(&table, period_label)
    }

    /// Normalise an already-decoded table.
    ///
    /// Fails without a partial result when a required column is missing.
    pub fn load_table(
        &self,
        table: &RawTable,
        period_label: &str,
    ) -> Result<Vec<NormalizedRecord>, LoadError> {
        let columns = ColumnIndex::resolve(table, &self.mapping)?;

        if columns.branch_name.is_none() {
            debug!("No branch column; using default branch for every row");
        }
        if columns.period_label.is_none() {
            debug!("No period column; labelling every row '{}'", period_label);
        }

        let records: Vec<NormalizedRecord> = table
            .rows
            .iter()
            .map(|row| {
                let record = row_to_record(row, &columns);
                NormalizedRecord::from_record(record, period_label)
            })
            .collect();

        let unparsed = records.iter().filter(|r| !r.amount_parsed).count();
        if unparsed > 0 {
            warn!(
                "{} of {} rows in period '{}' have an unparseable sale amount (counted as 0)",
                unparsed,
                records.len(),
                period_label
            );
        }
        debug!(
            "Loaded {} records for period '{}'",
            records.len(),
            period_label
        );

        Ok(records)
    }
}

/// Normalise `table` with the default column mapping.
pub fn load(table: &RawTable, period_label: &str) -> Result<Vec<NormalizedRecord>, LoadError> {
    Loader::new().load_table(table, period_label)
}

/// Read a source file fully into memory.
pub fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn cell(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&Cell::Empty)
}

fn row_to_record(row: &[Cell], columns: &ColumnIndex) -> Record {
    let sale_amount = match cell(row, columns.sale_amount) {
        Cell::Number(value) => RawAmount::Number(*value),
        other => RawAmount::Text(other.as_text()),
    };

    Record {
        category_raw: cell(row, columns.category_raw).as_text(),
        product_name: cell(row, columns.product_name).as_text(),
        order_count: parse_order_count(cell(row, columns.order_count)),
        sale_amount,
        branch_name: columns
            .branch_name
            .and_then(|idx| cell(row, idx).as_optional_text()),
        period_label: columns
            .period_label
            .and_then(|idx| cell(row, idx).as_optional_text()),
    }
}

/// Order counts are plain numbers, possibly with thousands separators.
fn parse_order_count(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(value) if value.is_finite() => *value,
        Cell::Text(text) => match text.replace(',', "").trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                debug!("Unparseable order count '{}' counted as 0", text);
                0.0
            }
        },
        _ => 0.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
