//! Buffered xlsx report writer.
//!
//! A run produces one workbook with two sheets: a detail sheet (one row per
//! discovered resource) and a summary sheet (one row per region/compartment
//! scope, closed by a bolded grand-total row). Rows accumulate in memory and
//! the file is written exactly once in [`SizingWorkbook::finalize`], which
//! also applies the cosmetic header styling and column autofit.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::config::Workload;

/// One spreadsheet cell. Counts stay integral; size metrics are floats.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(u64),
    Float(f64),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// Sheet names, header rows and the grand-total label for one workload.
#[derive(Debug, Clone, Copy)]
pub struct SheetSpec {
    pub detail_sheet: &'static str,
    pub summary_sheet: &'static str,
    pub detail_headers: &'static [&'static str],
    pub summary_headers: &'static [&'static str],
    pub grand_total_label: &'static str,
}

pub fn sheet_spec(workload: Workload) -> SheetSpec {
    match workload {
        Workload::Instances => SheetSpec {
            detail_sheet: "Instance Info",
            summary_sheet: "Instance Summary",
            detail_headers: &[
                "Compartment ID",
                "Instance ID",
                "Instance Name",
                "Region",
                "Availability Domain",
                "Shape",
                "State",
                "Number of Volumes",
                "Size (GB)",
                "Size (TB)",
                "Boot Volume Name",
                "Block Volume Names",
                "Defined Tags",
                "Freeform Tags",
            ],
            summary_headers: &[
                "Region",
                "Compartment ID",
                "Instance Count",
                "Total Size (GB)",
                "Total Size (TB)",
            ],
            grand_total_label: "Total Instances",
        },
        Workload::ObjectStorage => SheetSpec {
            detail_sheet: "Object Storage Info",
            summary_sheet: "Object Storage Summary",
            detail_headers: &[
                "Namespace",
                "Compartment ID",
                "Bucket Name",
                "Region",
                "Storage Tier",
                "Object Count",
                "Size (GB)",
                "Size (TB)",
                "Defined Tags",
                "Freeform Tags",
            ],
            summary_headers: &[
                "Region",
                "Namespace",
                "Compartment ID",
                "Bucket Count",
                "Total Size (GB)",
                "Total Size (TB)",
            ],
            grand_total_label: "Total Buckets",
        },
        Workload::DbSystems => SheetSpec {
            detail_sheet: "DB System Info",
            summary_sheet: "DB System Summary",
            detail_headers: &[
                "Compartment ID",
                "DB System ID",
                "Display Name",
                "Region",
                "Availability Domain",
                "Shape",
                "Lifecycle State",
                "Node Count",
                "DB Version",
                "Database Edition",
                "Data Storage Size (GB)",
                "Data Storage Size (TB)",
                "Defined Tags",
                "Freeform Tags",
            ],
            summary_headers: &[
                "Region",
                "Compartment ID",
                "DB System Count",
                "Total Storage (GB)",
                "Total Storage (TB)",
            ],
            grand_total_label: "Total DB Systems",
        },
        Workload::OkeClusters => SheetSpec {
            detail_sheet: "OKE Cluster Info",
            summary_sheet: "OKE Cluster Summary",
            detail_headers: &[
                "Region",
                "Compartment ID",
                "Cluster ID",
                "Cluster Name",
                "Kubernetes Version",
                "Node Count",
                "PVC Count",
                "Total PVC Size (GB)",
                "Total PVC Size (TB)",
                "PVC Names",
                "Node Names",
            ],
            summary_headers: &[
                "Region",
                "Compartment ID",
                "Cluster Count",
                "Total Node Count",
                "Total PVC Count",
                "Total PVC Size (GB)",
                "Total PVC Size (TB)",
            ],
            grand_total_label: "Total OKE Clusters",
        },
    }
}

/// In-memory workbook for one run. Created once, appended to throughout the
/// run, saved once.
pub struct SizingWorkbook {
    workbook: Workbook,
    spec: SheetSpec,
    initialized: bool,
    detail_rows: u32,
    summary_rows: u32,
    grand_total_rows: u32,
}

impl SizingWorkbook {
    pub fn new(workload: Workload) -> Self {
        Self {
            workbook: Workbook::new(),
            spec: sheet_spec(workload),
            initialized: false,
            detail_rows: 0,
            summary_rows: 0,
            grand_total_rows: 0,
        }
    }

    pub fn spec(&self) -> &SheetSpec {
        &self.spec
    }

    /// Creates both sheets with their header rows. Idempotent: calling this
    /// again is a no-op, so resumed callers never duplicate headers or lose
    /// buffered rows.
    pub fn initialize(&mut self) -> Result<(), XlsxError> {
        if self.initialized {
            debug!("Workbook already initialized, skipping");
            return Ok(());
        }
        for (name, headers) in [
            (self.spec.summary_sheet, self.spec.summary_headers),
            (self.spec.detail_sheet, self.spec.detail_headers),
        ] {
            let sheet = self.workbook.add_worksheet();
            sheet.set_name(name)?;
            for (col, header) in headers.iter().enumerate() {
                sheet.write_string(0, col as u16, *header)?;
            }
        }
        self.initialized = true;
        Ok(())
    }

    /// Rows appended to the detail sheet so far (header excluded).
    pub fn detail_row_count(&self) -> u32 {
        self.detail_rows
    }

    /// Scope summary rows appended so far (header and grand total excluded).
    pub fn summary_row_count(&self) -> u32 {
        self.summary_rows
    }

    pub fn grand_total_written(&self) -> bool {
        self.grand_total_rows > 0
    }

    pub fn append_details(&mut self, rows: &[Vec<Cell>]) -> Result<(), XlsxError> {
        self.initialize()?;
        let sheet = self.workbook.worksheet_from_name(self.spec.detail_sheet)?;
        for row in rows {
            write_row(sheet, 1 + self.detail_rows, row, None)?;
            self.detail_rows += 1;
        }
        Ok(())
    }

    pub fn append_summary(&mut self, row: &[Cell]) -> Result<(), XlsxError> {
        self.initialize()?;
        let next = 1 + self.summary_rows + self.grand_total_rows;
        let sheet = self.workbook.worksheet_from_name(self.spec.summary_sheet)?;
        write_row(sheet, next, row, None)?;
        self.summary_rows += 1;
        Ok(())
    }

    /// Appends the distinguished trailing row of the summary sheet, in bold.
    /// Must be the final summary write of the run.
    pub fn append_grand_total(&mut self, row: &[Cell]) -> Result<(), XlsxError> {
        self.initialize()?;
        let bold = Format::new().set_bold();
        let next = 1 + self.summary_rows + self.grand_total_rows;
        let sheet = self.workbook.worksheet_from_name(self.spec.summary_sheet)?;
        write_row(sheet, next, row, Some(&bold))?;
        self.grand_total_rows += 1;
        Ok(())
    }

    /// Styles the header rows, autofits column widths and writes the file.
    /// Cosmetic except for the save itself.
    pub fn finalize(mut self, path: &Path) -> Result<(), XlsxError> {
        self.initialize()?;
        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xDDDDDD));
        for (name, headers) in [
            (self.spec.summary_sheet, self.spec.summary_headers),
            (self.spec.detail_sheet, self.spec.detail_headers),
        ] {
            let sheet = self.workbook.worksheet_from_name(name)?;
            for (col, header) in headers.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
            }
            sheet.autofit();
        }
        self.workbook.save(path)?;
        info!(
            workbook = %path.display(),
            detail_rows = self.detail_rows,
            summary_rows = self.summary_rows,
            "Workbook saved"
        );
        Ok(())
    }
}

fn write_row(
    sheet: &mut Worksheet,
    row: u32,
    cells: &[Cell],
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match (cell, format) {
            (Cell::Text(value), None) => sheet.write_string(row, col, value)?,
            (Cell::Text(value), Some(format)) => {
                sheet.write_string_with_format(row, col, value, format)?
            }
            (Cell::Int(value), None) => sheet.write_number(row, col, *value as f64)?,
            (Cell::Int(value), Some(format)) => {
                sheet.write_number_with_format(row, col, *value as f64, format)?
            }
            (Cell::Float(value), None) => sheet.write_number(row, col, *value)?,
            (Cell::Float(value), Some(format)) => {
                sheet.write_number_with_format(row, col, *value, format)?
            }
        };
    }
    Ok(())
}
