pub mod categories;
pub mod google_drive;
