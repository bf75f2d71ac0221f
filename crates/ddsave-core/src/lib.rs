//! ddsave-core: container codec, document overlay and preset transplant for
//! Dragon's Dogma save files
//!
//! Layers, bottom up:
//! - `crc` / `zlib`: checksum and compression of the payload
//! - `sav`: fixed-size container (header, payload, padding) <-> document
//! - `doc` / `xpath`: parsed XML with player/pawn lookups and subtree splicing
//! - `preset` / `manager`: copy appearance and stats between saves
//! - `json` / `backup`: dumps and zip backups for front ends
//!
pub mod backup;
pub mod crc;
pub mod doc;
pub mod error;
pub mod json;
pub mod manager;
pub mod preset;
pub mod sav;
pub mod xpath;
pub mod zlib;

pub use doc::{PlayerType, SavDocument, WriteOpts};
pub use error::{Result, SavError};
pub use manager::{PresetManager, ReplacementType};
pub use preset::Preset;
pub use sav::{Sav, SavHeader};
pub use xpath::{NodePath, PathExpr};
pub use xmltree::Element;
