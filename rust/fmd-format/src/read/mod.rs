//! Fragment metadata access.

pub mod fragment_metadata;
pub mod fragment_reader;
pub(crate) mod generic_tiles;
