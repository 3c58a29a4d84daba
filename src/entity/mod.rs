//! SeaORM entity definitions for the backend's PostgreSQL tables.

pub mod evidence;
pub mod officer;
pub mod report;
pub mod suspect;
