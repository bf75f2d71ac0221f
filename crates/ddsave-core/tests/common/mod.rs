#![allow(dead_code)]
use std::path::{Path, PathBuf};

use ddsave_core::sav::{HEADER_SIZE, SAVE_SIZE, SavHeader, UNK2, UNK3, UNK4, UNK5, swap_header_endian};
use ddsave_core::{crc, zlib};

fn name_array(name: &str) -> String {
    let mut s = String::from(r#"<array name="(u8*)mNameStr" type="u8" count="25">"#);
    let mut codes: Vec<u32> = name.chars().map(|c| c as u32).collect();
    codes.resize(25, 0);
    for c in codes {
        s.push_str(&format!(r#"<u8 value="{}"/>"#, c));
    }
    s.push_str("</array>");
    s
}

/// Minimal save document: player, pawn and a Steam id.
pub fn sample_xml(player: &str, pawn: &str, hair: u32, level: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<class name="mSaveData" type="sSave::saveData">
  <class name="mPl" type="sSave::playerData">
    <class name="mParam" type="cSAVE_DATA_PARAM">
      <s32 name="mLevel" value="{level}"/>
      <u32 name="mGold" value="{gold}"/>
    </class>
    <class name="mEditPl" type="cSAVE_DATA_EDIT">
      {player_name}
      <u8 name="mHair" value="{hair}"/>
      <f32 name="mHeight" value="0.5"/>
    </class>
  </class>
  <array name="mCmc" type="class" count="1">
    <class name="mCmc" type="sSave::cmcData">
      <class name="mParam" type="cSAVE_DATA_PARAM">
        <s32 name="mLevel" value="{pawn_level}"/>
      </class>
      <class name="mEditPawn" type="cSAVE_DATA_EDIT">
        {pawn_name}
        <u8 name="mHair" value="{pawn_hair}"/>
      </class>
    </class>
  </array>
  <u64 name="mSteamID" value="76561198000000042"/>
</class>
"#,
        level = level,
        gold = level * 1000,
        player_name = name_array(player),
        hair = hair,
        pawn_level = level + 1,
        pawn_name = name_array(pawn),
        pawn_hair = hair + 1,
    )
}

/// Build a PC save image by hand from raw document text.
pub fn build_sav_bytes(xml: &[u8]) -> Vec<u8> {
    let compressed = zlib::compress(xml).unwrap();
    let fields = SavHeader {
        version: 21,
        real_size: xml.len() as u32,
        compressed_size: compressed.len() as u32,
        unk2: UNK2,
        unk3: UNK3,
        unk4: UNK4,
        checksum: crc::checksum(&compressed, compressed.len()),
        unk5: UNK5,
    };
    let mut out = fields.to_bytes().to_vec();
    out.extend_from_slice(&compressed);
    out.resize(SAVE_SIZE, 0);
    out
}

/// Same as `build_sav_bytes` but in the word-swapped console layout.
pub fn build_console_sav_bytes(xml: &[u8], version: u32) -> (SavHeader, Vec<u8>) {
    let compressed = zlib::compress(xml).unwrap();
    let fields = SavHeader {
        version,
        real_size: xml.len() as u32,
        compressed_size: compressed.len() as u32,
        unk2: UNK2,
        unk3: UNK3,
        unk4: UNK4,
        checksum: crc::checksum(&compressed, compressed.len()),
        unk5: UNK5,
    };
    let mut header = fields.to_bytes();
    swap_header_endian(&mut header);
    let mut out = Vec::with_capacity(SAVE_SIZE);
    out.extend_from_slice(&header);
    out.extend_from_slice(&compressed);
    out.resize(SAVE_SIZE, 0);
    assert_eq!(HEADER_SIZE, 32);
    (fields, out)
}

pub fn write_sample_sav(dir: &Path, file: &str, player: &str, pawn: &str, hair: u32, level: u32) -> PathBuf {
    let p = dir.join(file);
    let xml = sample_xml(player, pawn, hair, level);
    std::fs::write(&p, build_sav_bytes(xml.as_bytes())).unwrap();
    p
}
