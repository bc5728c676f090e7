//! Check import: row resolution, batch orchestration and reporting

pub mod importer;
pub mod report;
pub mod resolver;

pub use importer::*;
pub use report::*;
pub use resolver::*;
