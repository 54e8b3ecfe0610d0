pub mod sheetdb;
pub mod traits;

pub use sheetdb::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, SheetDbSource};
pub use traits::{FetchError, RecordSource};
