pub mod errors;
pub mod mdbtools;
pub mod memory;
pub mod model;
pub mod normalize;
mod registry;
pub mod source;

pub use errors::{DriverAttempt, ReaderError};
pub use mdbtools::MdbToolsDriver;
pub use memory::MemoryDriver;
pub use model::{RawTable, ReadingColumn, TankReading, READING_COLUMNS};
pub use registry::{list_tables_with_drivers, read_with_drivers};
pub use source::{read_readings, SourceConnection, SourceDriver};

#[cfg(test)]
mod tests;
