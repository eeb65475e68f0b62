//! Fluent builders over the engine operations

pub mod export;
pub mod generate;
pub mod store;

pub use export::ExportBuilder;
pub use generate::GenerateBuilder;
pub use store::{StoreBuilder, StoreSource};
