pub mod availability;
pub mod catalog;
pub mod directory;
pub mod roster;
