//! Command implementations

pub mod cache;
pub mod completions;
pub mod conv;
pub mod convert;
pub mod import;
pub mod init;
pub mod item;
pub mod uom;
