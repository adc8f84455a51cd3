pub mod a1;
pub mod address;
pub mod coord;
pub mod region;

pub use a1::{A1ParseError, parse_area_list, parse_cell, parse_region, parse_sheet_region};
pub use address::{SheetCell, SheetLocator, SheetRef};
pub use coord::{CellRef, CoordError, MAX_COL, MAX_ROW, column_to_letters, letters_to_column};
pub use region::{Region, SheetRegion, sheet_name_needs_quoting};
