pub mod bootstrap;
pub mod report;

pub use bootstrap::{ensure_default_admin, BootstrapError};
pub use report::{companies_workbook, ReportError};
