//! Database query functions organized by table.

pub mod areas;
pub mod cell_log;
pub mod cells;
pub mod profiles;
