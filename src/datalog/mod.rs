//! The datalog CSV format: a pipe-encoded metadata header followed by sparse
//! comma-separated rows, one column per channel.

pub mod desparsify;
pub mod export;
pub mod header;
pub mod import;
pub mod progress;

pub use desparsify::{Desparsifier, ImportWarning, Record};
pub use export::export_session;
pub use import::{ImportReport, import_datalog};
pub use progress::ProgressFn;
