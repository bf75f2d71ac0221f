use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{Result, SavError};

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(data.len() / 4 + 64), Compression::default());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

// Stops at the end of the zlib stream; trailing bytes (padding) are ignored.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut dec = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 4);
    dec.read_to_end(&mut out)
        .map_err(|e| SavError::CorruptPayload(e.to_string()))?;
    Ok(out)
}
