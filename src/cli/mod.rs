pub mod entries;
pub mod summary;
pub mod ui;
