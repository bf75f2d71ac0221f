//! Presets: one appearance and one stats fragment lifted out of a save.
//!
//! On disk a preset is a small standalone XML file:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <PresetData>
//!   <AppearanceData><class name="mUni" ...>...</class></AppearanceData>
//!   <StatsData><class name="mParam" ...>...</class></StatsData>
//! </PresetData>
//! ```
use std::path::Path;

use xmltree::{Element, XMLNode};

use crate::doc::{PlayerType, SavDocument, WriteOpts};
use crate::error::Result;
use crate::sav::Sav;
use crate::xpath::NodePath;

pub const PRESET_ROOT: &str = "PresetData";
pub const APPEARANCE_SECTION: &str = "AppearanceData";
pub const STATS_SECTION: &str = "StatsData";
pub const UNI_APPEARANCE_MARKER: &str = "mUni";
pub const UNI_APPEARANCE_NODE: &str = ".//class[@name='mUni']";
pub const UNI_STATS_NODE: &str = ".//class[@name='mParam']";

#[derive(Debug, Clone)]
pub struct Preset {
    document: SavDocument,
    appearance: Option<NodePath>,
    stats: Option<NodePath>,
}

impl Default for Preset {
    fn default() -> Self {
        Self::new()
    }
}

impl Preset {
    /// Empty preset with both sections present but childless.
    pub fn new() -> Self {
        let mut root = Element::new(PRESET_ROOT);
        root.children.push(XMLNode::Element(Element::new(APPEARANCE_SECTION)));
        root.children.push(XMLNode::Element(Element::new(STATS_SECTION)));
        Self {
            document: SavDocument::new(root),
            appearance: Some(NodePath(vec![0])),
            stats: Some(NodePath(vec![1])),
        }
    }

    pub fn from_document(document: SavDocument) -> Self {
        let appearance = document.select(&format!(".//{}", APPEARANCE_SECTION)).ok().flatten();
        let stats = document.select(&format!(".//{}", STATS_SECTION)).ok().flatten();
        Self { document, appearance, stats }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let preset = Self::from_document(SavDocument::parse_file(path)?);
        log::info!("loaded preset {} (complete: {})", path.display(), preset.is_loaded());
        Ok(preset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.document.write_file(path, WriteOpts::default())
    }

    /// Copy the appearance and stats fragments of `who` out of a save.
    pub fn from_sav(sav: &Sav, who: PlayerType) -> Self {
        let mut preset = Self::new();
        let doc = sav.document();
        preset.set_appearance_data(doc.appearance(who));
        preset.set_stats_data(doc.stats(who));
        preset
    }

    /// Strict variant of `from_sav`: both fragments must exist in the save.
    pub fn try_from_sav(sav: &Sav, who: PlayerType) -> Result<Self> {
        let doc = sav.document();
        let appearance = doc.require_node(who.appearance_path())?;
        let stats = doc.require_node(who.stats_path())?;
        let mut preset = Self::new();
        preset.set_appearance_data(Some(appearance));
        preset.set_stats_data(Some(stats));
        Ok(preset)
    }

    pub fn document(&self) -> &SavDocument {
        &self.document
    }

    pub fn appearance_section(&self) -> Option<&Element> {
        self.document.node(self.appearance.as_ref()?)
    }
    pub fn stats_section(&self) -> Option<&Element> {
        self.document.node(self.stats.as_ref()?)
    }

    /// The `mUni` appearance fragment inside the appearance section.
    pub fn appearance_fragment(&self) -> Option<&Element> {
        let section = self.appearance.as_ref()?;
        let at = self.document.select_from(section, UNI_APPEARANCE_NODE).ok().flatten()?;
        self.document.node(&at)
    }

    /// The `mParam` stats fragment inside the stats section.
    pub fn stats_fragment(&self) -> Option<&Element> {
        let section = self.stats.as_ref()?;
        let at = self.document.select_from(section, UNI_STATS_NODE).ok().flatten()?;
        self.document.node(&at)
    }

    /// Replace the appearance section's content with a copy of `appearance`,
    /// re-marked as `mUni`. `None` leaves the preset untouched.
    pub fn set_appearance_data(&mut self, appearance: Option<&Element>) -> bool {
        let Some(src) = appearance else {
            return false;
        };
        let mut node = src.clone();
        node.attributes.insert("name".to_string(), UNI_APPEARANCE_MARKER.to_string());
        self.fill_section(self.appearance.clone(), node)
    }

    pub fn set_stats_data(&mut self, stats: Option<&Element>) -> bool {
        let Some(src) = stats else {
            return false;
        };
        self.fill_section(self.stats.clone(), src.clone())
    }

    fn fill_section(&mut self, section: Option<NodePath>, node: Element) -> bool {
        let Some(at) = section else {
            return false;
        };
        let Some(section) = self.document.node_mut(&at) else {
            return false;
        };
        section.attributes.clear();
        section.children.clear();
        section.children.push(XMLNode::Element(node));
        true
    }

    pub fn has_appearance_data(&self) -> bool {
        self.appearance_section().is_some_and(|s| s.name == APPEARANCE_SECTION)
    }

    pub fn has_stats_data(&self) -> bool {
        self.stats_section().is_some_and(|s| s.name == STATS_SECTION)
    }

    /// Both sections present and non-empty.
    pub fn is_loaded(&self) -> bool {
        let filled = |s: Option<&Element>| s.is_some_and(|e| !e.children.is_empty());
        self.has_appearance_data()
            && filled(self.appearance_section())
            && self.has_stats_data()
            && filled(self.stats_section())
    }

    pub fn clear(&mut self) {
        for at in [self.appearance.clone(), self.stats.clone()].into_iter().flatten() {
            if let Some(section) = self.document.node_mut(&at) {
                section.attributes.clear();
                section.children.clear();
            }
        }
    }
}
