use std::path::Path;

use xmltree::Element;

use crate::doc::PlayerType;
use crate::error::Result;
use crate::preset::Preset;
use crate::sav::Sav;

/// Which preset fragments `apply_preset` transplants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementType {
    All,
    AppearanceOnly,
    StatsOnly,
}

/// Working pair of one save and one preset.
#[derive(Debug, Default)]
pub struct PresetManager {
    sav: Option<Sav>,
    preset: Option<Preset>,
}

impl PresetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_sav(&mut self, path: &Path) -> Result<()> {
        self.sav = Some(Sav::load(path)?);
        Ok(())
    }

    pub fn load_preset(&mut self, path: &Path) -> Result<()> {
        self.preset = Some(Preset::load(path)?);
        Ok(())
    }

    /// Swap in a save, returning the previous one.
    pub fn set_sav(&mut self, sav: Sav) -> Option<Sav> {
        self.sav.replace(sav)
    }
    pub fn set_preset(&mut self, preset: Preset) -> Option<Preset> {
        self.preset.replace(preset)
    }
    pub fn take_sav(&mut self) -> Option<Sav> {
        self.sav.take()
    }
    pub fn sav(&self) -> Option<&Sav> {
        self.sav.as_ref()
    }
    pub fn preset(&self) -> Option<&Preset> {
        self.preset.as_ref()
    }

    /// Capture `who` from the current save into a new preset.
    pub fn extract_preset(&self, who: PlayerType) -> Option<Preset> {
        self.sav.as_ref().map(|sav| Preset::from_sav(sav, who))
    }

    pub fn replace_appearance(&mut self, target: PlayerType, replacement: Option<&Element>) -> bool {
        match (self.sav.as_mut(), replacement) {
            (Some(sav), Some(node)) => splice_appearance(sav, target, node),
            _ => false,
        }
    }

    pub fn replace_stats(&mut self, target: PlayerType, replacement: Option<&Element>) -> bool {
        match (self.sav.as_mut(), replacement) {
            (Some(sav), Some(node)) => splice_stats(sav, target, node),
            _ => false,
        }
    }

    /// Transplant the current preset onto `target` in the current save.
    ///
    /// For `All` both replacements run and the result only reports whether
    /// the preset carried both fragments.
    pub fn apply_preset(&mut self, target: PlayerType, mode: ReplacementType) -> bool {
        let (Some(sav), Some(preset)) = (self.sav.as_mut(), self.preset.as_ref()) else {
            return false;
        };
        let appearance = preset.appearance_fragment();
        let stats = preset.stats_fragment();
        let ok = match mode {
            ReplacementType::All => {
                if let Some(node) = appearance {
                    splice_appearance(sav, target, node);
                }
                if let Some(node) = stats {
                    splice_stats(sav, target, node);
                }
                appearance.is_some() && stats.is_some()
            }
            ReplacementType::AppearanceOnly => appearance.is_some_and(|n| splice_appearance(sav, target, n)),
            ReplacementType::StatsOnly => stats.is_some_and(|n| splice_stats(sav, target, n)),
        };
        log::info!("applied preset to {:?} ({:?}): {}", target, mode, ok);
        ok
    }
}

fn splice_appearance(sav: &mut Sav, target: PlayerType, replacement: &Element) -> bool {
    let doc = sav.document_mut();
    let Some(at) = doc.select(target.appearance_path()).ok().flatten() else {
        log::warn!("{:?} appearance node not found", target);
        return false;
    };
    let mut import = replacement.clone();
    if !import.attributes.is_empty() {
        import.attributes.insert("name".to_string(), target.appearance_marker().to_string());
    }
    doc.replace_at(&at, import).is_some()
}

fn splice_stats(sav: &mut Sav, target: PlayerType, replacement: &Element) -> bool {
    let doc = sav.document_mut();
    let Some(at) = doc.select(target.stats_path()).ok().flatten() else {
        log::warn!("{:?} stats node not found", target);
        return false;
    };
    doc.replace_at(&at, replacement.clone()).is_some()
}
