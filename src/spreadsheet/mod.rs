//! Spreadsheet rows: cell values, column roles and workbook decoding

pub mod cell;
pub mod columns;
pub mod xlsx;

pub use cell::*;
pub use columns::*;
pub use xlsx::*;
