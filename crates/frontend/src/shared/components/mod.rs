pub mod date_input;
pub mod table;
pub mod table_totals_row;
pub mod ui;
