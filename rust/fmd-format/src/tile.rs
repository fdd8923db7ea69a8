//! Generic tile decoding.
//!
//! A generic tile on disk:
//!
//! ```text
//! version: u32
//! persisted_size: u64          (size of the filtered payload)
//! tile_size: u64               (size of the unfiltered content)
//! datatype: u8
//! cell_size: u64
//! encryption_type: u8
//! filter_pipeline_size: u32
//! filter_pipeline: [u8; filter_pipeline_size]
//! payload: [u8; persisted_size] (chunk table, see `chunk`)
//! ```

use fmd_common::{Error, Result};

use crate::{
    chunk::ChunkTable,
    cursor::ByteCursor,
    datatype::{Datatype, EncryptionType},
    decompress::decompress_chunks,
    read::fragment_reader::FragmentReader,
};

/// Encoded size of the fixed part of a tile header.
pub const TILE_HEADER_SIZE: u64 = 34;

/// Fixed-layout header of a generic tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileHeader {
    pub version: u32,
    pub persisted_size: u64,
    pub tile_size: u64,
    pub datatype: Datatype,
    pub cell_size: u64,
    pub encryption_type: EncryptionType,
    pub filter_pipeline_size: u32,
}

impl TileHeader {
    pub fn parse(bytes: &[u8]) -> Result<TileHeader> {
        let mut cursor = ByteCursor::new(bytes, "tile header");
        Ok(TileHeader {
            version: cursor.read_fixed()?,
            persisted_size: cursor.read_fixed()?,
            tile_size: cursor.read_fixed()?,
            datatype: Datatype::try_from(cursor.read_fixed::<u8>()?)?,
            cell_size: cursor.read_fixed()?,
            encryption_type: EncryptionType::try_from(cursor.read_fixed::<u8>()?)?,
            filter_pipeline_size: cursor.read_fixed()?,
        })
    }
}

/// A decoded generic tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub version: u32,
    pub datatype: Datatype,
    pub cell_size: u64,
    pub data: Vec<u8>,
}

impl Tile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// An empty tile carries no content; readers treat it as absent data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads and decodes the generic tile whose header starts at `offset`.
///
/// Errors are wrapped with the tile offset.
pub fn read_tile(reader: &FragmentReader, offset: u64) -> Result<Tile> {
    read_tile_at(reader, offset).map_err(|e| e.context(format!("tile at offset {offset}")))
}

fn read_tile_at(reader: &FragmentReader, offset: u64) -> Result<Tile> {
    let header_bytes = reader.read_at(offset, TILE_HEADER_SIZE, "tile header")?;
    let header = TileHeader::parse(&header_bytes)?;

    if header.encryption_type != EncryptionType::NoEncryption {
        return Err(Error::not_implemented(format!(
            "tile is encrypted with {:?}",
            header.encryption_type
        )));
    }

    // The filter pipeline description is fixed for generic tiles; it is read
    // only to locate the payload.
    let pipeline_offset = offset + TILE_HEADER_SIZE;
    reader.read_at(
        pipeline_offset,
        header.filter_pipeline_size as u64,
        "tile filter pipeline",
    )?;

    let payload_offset = pipeline_offset + header.filter_pipeline_size as u64;
    let payload = reader.read_at(payload_offset, header.persisted_size, "tile payload")?;
    log::debug!(
        "tile at {offset}: payload {} bytes at {payload_offset}, tile size {}",
        header.persisted_size,
        header.tile_size
    );

    let table = ChunkTable::parse(&payload)?;
    if table.unfiltered_size() != header.tile_size {
        return Err(Error::size_mismatch(
            "tile size",
            header.tile_size,
            table.unfiltered_size(),
        ));
    }
    // Declared sizes are checked against the compressed parts before the
    // destination buffer is allocated.
    table.validate_parts()?;

    let mut data = Vec::new();
    data.try_reserve_exact(table.unfiltered_size() as usize)
        .map_err(|e| {
            Error::invalid_format(
                "tile",
                format!("cannot allocate {} bytes: {e}", table.unfiltered_size()),
            )
        })?;
    data.resize(table.unfiltered_size() as usize, 0);
    decompress_chunks(&table, &mut data)?;

    Ok(Tile {
        version: header.version,
        datatype: header.datatype,
        cell_size: header.cell_size,
        data,
    })
}
