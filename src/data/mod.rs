pub mod merge;
pub mod models;
pub mod table;

pub use merge::merge_all;
pub use models::{MatchRecord, Season};
pub use table::{Cell, CellKind, Column, MatchTable};
