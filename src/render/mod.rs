//! Rendering of detected table grids into their published forms.

mod table;

pub use table::{build_table, clean_cell, is_empty_grid, to_csv, to_html};
