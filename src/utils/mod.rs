pub mod sql;
pub mod table;
pub mod time;
