//! Decoder for fragment metadata files.
//!
//! A fragment metadata object is a sequence of generic tiles followed by a
//! footer and the footer's size. Decoding runs bottom-up:
//!
//! - [`cursor`]: bounds-checked sequential reads over a byte buffer
//! - [`chunk`] and [`decompress`]: a tile's chunk table and the zlib parts
//!   inside each chunk
//! - [`tile`]: tile header and payload
//! - [`footer`]: the trailing footer with per-field sizes and tile offsets
//! - [`read`]: assembly of everything above into [`FragmentMetadata`]
//!
//! [`schema`] describes the array fields and is used by
//! [`FragmentMetadata::verify`].

pub mod chunk;
pub mod cursor;
pub mod datatype;
pub mod decompress;
pub mod field_table;
pub mod footer;
pub mod read;
pub mod schema;
pub mod tile;
mod verify;

pub use datatype::{Datatype, EncryptionType, FragmentType};
pub use field_table::FieldTable;
pub use footer::{Footer, GenericTileOffsets};
pub use read::{
    fragment_metadata::{FragmentMetadata, FragmentMetadataOptions},
    fragment_reader::FragmentReader,
    generic_tiles::{FieldSummary, TileValues},
};
pub use schema::Schema;
pub use tile::Tile;

#[cfg(test)]
mod tests;
