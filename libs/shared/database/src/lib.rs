pub mod sheet;

pub use sheet::SheetClient;
