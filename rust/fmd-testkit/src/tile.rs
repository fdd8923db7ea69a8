//! Generic tile encoder.

use std::io::Write;

use flate2::{Compression, write::ZlibEncoder};

/// Format version written into tile headers by default.
pub const DEFAULT_TILE_VERSION: u32 = 22;

/// `CHAR` datatype tag, used by generic tiles.
pub const DATATYPE_CHAR: u8 = 4;

/// Compresses `data` into a complete zlib stream.
pub fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to vec");
    encoder.finish().expect("finish zlib stream")
}

/// A chunk whose framing is written as given, for malformed-input tests.
#[derive(Debug, Clone)]
pub struct RawChunk {
    unfiltered_size: u32,
    metadata_parts: u32,
    parts: Vec<(u32, u32)>,
    data: Vec<u8>,
    metadata_override: Option<Vec<u8>>,
}

impl RawChunk {
    pub fn new(unfiltered_size: u32) -> RawChunk {
        RawChunk {
            unfiltered_size,
            metadata_parts: 0,
            parts: Vec::new(),
            data: Vec::new(),
            metadata_override: None,
        }
    }

    pub fn metadata_parts(mut self, count: u32) -> Self {
        self.metadata_parts = count;
        self
    }

    /// Declares a part as `(uncompressed_size, compressed_size)`.
    pub fn part(mut self, uncompressed_size: u32, compressed_size: u32) -> Self {
        self.parts.push((uncompressed_size, compressed_size));
        self
    }

    /// Appends bytes to the chunk's filtered data.
    pub fn data(mut self, data: &[u8]) -> Self {
        self.data.extend_from_slice(data);
        self
    }

    /// Replaces the encoded filtered-metadata record entirely.
    pub fn metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata_override = Some(metadata);
        self
    }

    fn encode_metadata(&self) -> Vec<u8> {
        if let Some(metadata) = &self.metadata_override {
            return metadata.clone();
        }
        let mut buf = Vec::with_capacity(8 + self.parts.len() * 8);
        buf.extend_from_slice(&self.metadata_parts.to_le_bytes());
        buf.extend_from_slice(&(self.parts.len() as u32).to_le_bytes());
        for (uncompressed, compressed) in &self.parts {
            buf.extend_from_slice(&uncompressed.to_le_bytes());
            buf.extend_from_slice(&compressed.to_le_bytes());
        }
        buf
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let metadata = self.encode_metadata();
        out.extend_from_slice(&self.unfiltered_size.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
        out.extend_from_slice(&metadata);
        out.extend_from_slice(&self.data);
    }
}

/// Builds the on-disk bytes of a generic tile.
///
/// Chunks are compressed with zlib, one stream per part. Unless overridden,
/// the header's `tile_size` is the total size of the chunk contents.
#[derive(Debug, Clone)]
pub struct TileBuilder {
    version: u32,
    datatype: u8,
    cell_size: u64,
    encryption_type: u8,
    filter_pipeline: Vec<u8>,
    chunks: Vec<RawChunk>,
    tile_size: Option<u64>,
}

impl Default for TileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TileBuilder {
    pub fn new() -> TileBuilder {
        TileBuilder {
            version: DEFAULT_TILE_VERSION,
            datatype: DATATYPE_CHAR,
            cell_size: 1,
            encryption_type: 0,
            filter_pipeline: Vec::new(),
            chunks: Vec::new(),
            tile_size: None,
        }
    }

    /// A tile holding `content`, split into chunks of at most `chunk_size` bytes.
    pub fn with_content(content: &[u8], chunk_size: usize) -> TileBuilder {
        content
            .chunks(chunk_size.max(1))
            .fold(TileBuilder::new(), |builder, chunk| builder.chunk(chunk))
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn datatype(mut self, datatype: u8) -> Self {
        self.datatype = datatype;
        self
    }

    pub fn cell_size(mut self, cell_size: u64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn encryption_type(mut self, encryption_type: u8) -> Self {
        self.encryption_type = encryption_type;
        self
    }

    /// Opaque filter pipeline bytes written after the header.
    pub fn filter_pipeline(mut self, bytes: Vec<u8>) -> Self {
        self.filter_pipeline = bytes;
        self
    }

    /// Appends a chunk compressed as a single part.
    pub fn chunk(self, data: &[u8]) -> Self {
        self.chunk_parts(&[data])
    }

    /// Appends a chunk whose content is the concatenation of `parts`, each
    /// compressed as its own stream.
    pub fn chunk_parts(mut self, parts: &[&[u8]]) -> Self {
        let unfiltered = parts.iter().map(|p| p.len()).sum::<usize>();
        let chunk = parts
            .iter()
            .fold(RawChunk::new(unfiltered as u32), |chunk, part| {
                let compressed = zlib_compress(part);
                chunk
                    .part(part.len() as u32, compressed.len() as u32)
                    .data(&compressed)
            });
        self.chunks.push(chunk);
        self
    }

    pub fn raw_chunk(mut self, chunk: RawChunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Overrides the `tile_size` declared in the header.
    pub fn tile_size(mut self, tile_size: u64) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    /// Encodes the chunk table that forms the tile payload.
    pub fn build_payload(&self) -> Vec<u8> {
        let mut payload = (self.chunks.len() as u64).to_le_bytes().to_vec();
        for chunk in &self.chunks {
            chunk.encode(&mut payload);
        }
        payload
    }

    pub fn build(&self) -> Vec<u8> {
        let payload = self.build_payload();
        let tile_size = self.tile_size.unwrap_or_else(|| {
            self.chunks
                .iter()
                .map(|c| c.unfiltered_size as u64)
                .sum::<u64>()
        });

        let mut buf = Vec::with_capacity(34 + self.filter_pipeline.len() + payload.len());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(&tile_size.to_le_bytes());
        buf.push(self.datatype);
        buf.extend_from_slice(&self.cell_size.to_le_bytes());
        buf.push(self.encryption_type);
        buf.extend_from_slice(&(self.filter_pipeline.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.filter_pipeline);
        buf.extend_from_slice(&payload);
        buf
    }
}
