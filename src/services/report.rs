use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::database::models::CompanyView;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const REPORT_FILENAME: &str = "companies.xlsx";

const HEADERS: &[(&str, f64)] = &[
    ("Name", 28.0),
    ("Description", 48.0),
    ("Impact", 10.0),
    ("Years", 8.0),
    ("Category", 18.0),
    ("Created by", 28.0),
    ("Created at", 22.0),
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("spreadsheet generation failed: {0}")]
    Xlsx(#[from] XlsxError),
}

/// One worksheet listing `companies` in the given order, returned as file bytes.
pub fn companies_workbook(companies: &[CompanyView]) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Companies")?;

    for (col, (title, width)) in HEADERS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &bold)?;
        sheet.set_column_width(col, *width)?;
    }

    for (i, company) in companies.iter().enumerate() {
        let row = i as u32 + 1;
        let owner = company
            .created_by
            .as_ref()
            .map(|o| format!("{} <{}>", o.name, o.email))
            .unwrap_or_default();

        sheet.write_string(row, 0, &company.name)?;
        sheet.write_string(row, 1, &company.description)?;
        sheet.write_string(row, 2, company.level_impact.as_str())?;
        sheet.write_number(row, 3, company.years_trajectory as f64)?;
        sheet.write_string(row, 4, &company.category)?;
        sheet.write_string(row, 5, owner)?;
        sheet.write_string(row, 6, company.created_at.format("%Y-%m-%d %H:%M:%S").to_string())?;
    }

    Ok(workbook.save_to_buffer()?)
}
