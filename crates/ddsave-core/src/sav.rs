// Save container: 32-byte header, zlib payload, zero padding to a fixed size.
use std::fs;
use std::path::Path;

use crate::crc;
use crate::doc::{PlayerType, SavDocument, WriteOpts};
use crate::error::{Result, SavError};
use crate::zlib;

pub const HEADER_SIZE: usize = 32;
pub const SAVE_SIZE: usize = 524_288;
pub const MAX_NAME_LENGTH: usize = 25;

/// Version word of PC (little-endian) saves. Console saves of the original
/// release carry 5 in a big-endian header.
pub const PC_VERSION: u32 = 21;
pub const UNK2: u32 = 860_693_325;
pub const UNK3: u32 = 0;
pub const UNK4: u32 = 860_700_740;
pub const UNK5: u32 = 1_079_398_965;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SavHeader {
    pub version: u32,
    pub real_size: u32,
    pub compressed_size: u32,
    pub unk2: u32,
    pub unk3: u32,
    pub unk4: u32,
    pub checksum: u32,
    pub unk5: u32,
}

impl SavHeader {
    /// Reads the eight words little-endian.
    pub fn from_bytes(b: &[u8; HEADER_SIZE]) -> Self {
        let w = |i: usize| u32::from_le_bytes([b[i * 4], b[i * 4 + 1], b[i * 4 + 2], b[i * 4 + 3]]);
        Self {
            version: w(0),
            real_size: w(1),
            compressed_size: w(2),
            unk2: w(3),
            unk3: w(4),
            unk4: w(5),
            checksum: w(6),
            unk5: w(7),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let words = [
            self.version,
            self.real_size,
            self.compressed_size,
            self.unk2,
            self.unk3,
            self.unk4,
            self.checksum,
            self.unk5,
        ];
        for (chunk, w) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        out
    }
}

/// Reverse the byte order of every 4-byte word in place.
pub fn swap_header_endian(header: &mut [u8]) {
    for word in header.chunks_exact_mut(4) {
        word.reverse();
    }
}

/// Bytes as space separated upper-case hex pairs.
pub fn to_hex_string(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// Full on-disk image: header, payload, zero padding up to `SAVE_SIZE`.
pub fn file_image(header: &[u8; HEADER_SIZE], compressed: &[u8]) -> Result<Vec<u8>> {
    let size = HEADER_SIZE + compressed.len();
    if size > SAVE_SIZE {
        return Err(SavError::PayloadTooLarge { size });
    }
    let mut out = Vec::with_capacity(SAVE_SIZE);
    out.extend_from_slice(header);
    out.extend_from_slice(compressed);
    out.resize(SAVE_SIZE, 0);
    Ok(out)
}

/// Everything `encode` derives from the document, computed in one go.
#[derive(Debug, Clone)]
pub struct Packed {
    pub fields: SavHeader,
    pub header: [u8; HEADER_SIZE],
    pub compressed: Vec<u8>,
    pub decompressed: Vec<u8>,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Sav {
    pub version: u32,
    pub real_size: u32,
    pub compressed_size: u32,
    pub unk2: u32,
    pub unk3: u32,
    pub unk4: u32,
    pub checksum: u32,
    pub unk5: u32,
    /// Layout written by `encode`: `PC_VERSION` for little-endian, anything
    /// else for the word-swapped console layout carrying that version.
    pub target_version: u32,
    header: [u8; HEADER_SIZE],
    compressed: Vec<u8>,
    decompressed: Vec<u8>,
    document: SavDocument,
}

impl Sav {
    /// Wrap an in-memory document; header fields are filled on first encode.
    pub fn from_document(document: SavDocument) -> Self {
        Self {
            version: PC_VERSION,
            real_size: 0,
            compressed_size: 0,
            unk2: UNK2,
            unk3: UNK3,
            unk4: UNK4,
            checksum: 0,
            unk5: UNK5,
            target_version: PC_VERSION,
            header: [0; HEADER_SIZE],
            compressed: Vec::new(),
            decompressed: Vec::new(),
            document,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SavError::NotFound { path: path.to_path_buf() });
        }
        let data = fs::read(path)?;
        let sav = Self::from_bytes(&data)?;
        log::info!("loaded save {}", path.display());
        Ok(sav)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut header: [u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| SavError::CorruptPayload(format!("file too short: {} bytes", data.len())))?;
        let fields = SavHeader::from_bytes(&header);
        let mut version = fields.version;
        if version != PC_VERSION {
            // Console layout. Only the header image and the version word are
            // corrected; the other fields keep their raw little-endian reading.
            swap_header_endian(&mut header);
            version = SavHeader::from_bytes(&header).version;
            log::debug!("word-swapped header, version {}", version);
            if version == PC_VERSION {
                log::warn!("big-endian header carries version {}; it will be re-encoded in the PC layout", version);
            }
        }
        log::debug!(
            "header: version={} real_size={} compressed_size={} checksum={:#010x}",
            version,
            fields.real_size,
            fields.compressed_size,
            fields.checksum
        );

        let body = &data[HEADER_SIZE..];
        let take = (fields.compressed_size as usize).min(body.len());
        let compressed = body[..take].to_vec();
        let decompressed = zlib::decompress(&compressed)?;
        let document = SavDocument::parse(&decompressed)?;

        let sav = Self {
            version,
            real_size: fields.real_size,
            compressed_size: fields.compressed_size,
            unk2: fields.unk2,
            unk3: fields.unk3,
            unk4: fields.unk4,
            checksum: fields.checksum,
            unk5: fields.unk5,
            target_version: version,
            header,
            compressed,
            decompressed,
            document,
        };
        if !sav.checksum_matches() {
            log::warn!("header checksum does not match payload");
        }
        Ok(sav)
    }

    /// Recompute every derived value from the current document.
    pub fn pack(&self) -> Result<Packed> {
        let decompressed = self.document.to_bytes(WriteOpts::default())?;
        let compressed = zlib::compress(&decompressed)?;
        let pc = self.target_version == PC_VERSION;
        let fields = SavHeader {
            version: if pc { PC_VERSION } else { self.target_version },
            real_size: decompressed.len() as u32,
            compressed_size: compressed.len() as u32,
            unk2: UNK2,
            unk3: UNK3,
            unk4: UNK4,
            checksum: crc::checksum(&compressed, compressed.len()),
            unk5: UNK5,
        };
        let mut header = fields.to_bytes();
        if !pc {
            swap_header_endian(&mut header);
        }
        let image = file_image(&header, &compressed)?;
        log::debug!(
            "packed: real_size={} compressed_size={} checksum={:#010x}",
            fields.real_size,
            fields.compressed_size,
            fields.checksum
        );
        Ok(Packed { fields, header, compressed, decompressed, image })
    }

    fn apply_packed(&mut self, p: Packed) {
        let f = p.fields;
        self.version = f.version;
        self.real_size = f.real_size;
        self.compressed_size = f.compressed_size;
        self.unk2 = f.unk2;
        self.unk3 = f.unk3;
        self.unk4 = f.unk4;
        self.checksum = f.checksum;
        self.unk5 = f.unk5;
        self.header = p.header;
        self.compressed = p.compressed;
        self.decompressed = p.decompressed;
    }

    /// Encode to the fixed-size file image and refresh the header fields.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut packed = self.pack()?;
        let out = std::mem::take(&mut packed.image);
        self.apply_packed(packed);
        Ok(out)
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let packed = self.pack()?;
        fs::write(path, &packed.image)?;
        self.apply_packed(packed);
        log::info!("wrote save {}", path.display());
        Ok(())
    }

    pub fn header(&self) -> &[u8; HEADER_SIZE] {
        &self.header
    }
    pub fn compressed_payload(&self) -> &[u8] {
        &self.compressed
    }
    pub fn decompressed_payload(&self) -> &[u8] {
        &self.decompressed
    }
    pub fn document(&self) -> &SavDocument {
        &self.document
    }
    pub fn document_mut(&mut self) -> &mut SavDocument {
        &mut self.document
    }

    pub fn is_pc_layout(&self) -> bool {
        self.target_version == PC_VERSION
    }

    /// Compare the checksum in the (endian-corrected) header image with the stored payload.
    pub fn checksum_matches(&self) -> bool {
        let fields = SavHeader::from_bytes(&self.header);
        fields.checksum == crc::checksum(&self.compressed, fields.compressed_size as usize)
    }

    pub fn steam_id(&self) -> Option<u64> {
        self.document.steam_id()
    }
    pub fn set_steam_id(&mut self, steam_id: u64) -> bool {
        self.document.set_steam_id(steam_id)
    }
    pub fn player_name(&self) -> Option<String> {
        self.document.name(PlayerType::Arisen)
    }
    pub fn pawn_name(&self) -> Option<String> {
        self.document.name(PlayerType::Pawn)
    }
    pub fn set_player_name(&mut self, name: &str) -> Result<bool> {
        self.document.set_name(PlayerType::Arisen, name)
    }
    pub fn set_pawn_name(&mut self, name: &str) -> Result<bool> {
        self.document.set_name(PlayerType::Pawn, name)
    }

    /// Write the document as a standalone XML file.
    pub fn export_xml(&self, path: &Path, opts: WriteOpts) -> Result<()> {
        self.document.write_file(path, opts)
    }
}
