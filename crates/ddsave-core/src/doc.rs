//! Parsed save document with the domain lookups used by the editor.
use std::fs;
use std::path::Path;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Result, SavError};
use crate::sav::MAX_NAME_LENGTH;
use crate::xpath::{NodePath, PathExpr};

pub const PLAYER_APPEARANCE_NODE: &str = ".//class[@name='mEditPl']";
pub const PLAYER_STATS_NODE: &str = ".//class[@name='mPl']/class[@name='mParam']";
pub const PAWN_APPEARANCE_NODE: &str = ".//class[@name='mEditPawn']";
pub const PAWN_STATS_NODE: &str = ".//class[@name='mCmc']/class[@name='mParam']";
pub const STEAM_ID_NODE: &str = ".//u64[@name='mSteamID']";
pub const NAME_ARRAY_NODE: &str = "array[@name='(u8*)mNameStr']";

pub const PLAYER_APPEARANCE_MARKER: &str = "mEditPl";
pub const PAWN_APPEARANCE_MARKER: &str = "mEditPawn";

const NAME_ARRAY_ATTR: &str = "(u8*)mNameStr";

/// Which character section of a save an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerType {
    Arisen,
    Pawn,
}

impl PlayerType {
    pub fn appearance_path(self) -> &'static str {
        match self {
            PlayerType::Arisen => PLAYER_APPEARANCE_NODE,
            PlayerType::Pawn => PAWN_APPEARANCE_NODE,
        }
    }
    pub fn stats_path(self) -> &'static str {
        match self {
            PlayerType::Arisen => PLAYER_STATS_NODE,
            PlayerType::Pawn => PAWN_STATS_NODE,
        }
    }
    /// `name` marker carried by the live appearance node in a save.
    pub fn appearance_marker(self) -> &'static str {
        match self {
            PlayerType::Arisen => PLAYER_APPEARANCE_MARKER,
            PlayerType::Pawn => PAWN_APPEARANCE_MARKER,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct WriteOpts {
    pub indent: bool,
}

impl Default for WriteOpts {
    fn default() -> Self {
        Self { indent: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavDocument {
    root: Element,
}

impl SavDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let text = std::str::from_utf8(data).map_err(|e| SavError::MalformedDocument(e.to_string()))?;
        let root = Element::parse(text.as_bytes()).map_err(|e| SavError::MalformedDocument(e.to_string()))?;
        Ok(Self { root })
    }

    pub fn parse_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SavError::NotFound { path: path.to_path_buf() });
        }
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Serialize as UTF-8 XML with a declaration.
    pub fn to_bytes(&self, opts: WriteOpts) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let config = EmitterConfig::new()
            .perform_indent(opts.indent)
            .write_document_declaration(true);
        self.root
            .write_with_config(&mut out, config)
            .map_err(|e| SavError::MalformedDocument(e.to_string()))?;
        Ok(out)
    }

    pub fn write_file(&self, path: &Path, opts: WriteOpts) -> Result<()> {
        let bytes = self.to_bytes(opts)?;
        fs::write(path, bytes)?;
        log::info!("wrote xml {}", path.display());
        Ok(())
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    // ---- generic lookups ----

    pub fn select(&self, expr: &str) -> Result<Option<NodePath>> {
        Ok(PathExpr::parse(expr)?.select_first(&self.root, None))
    }

    /// Evaluate `expr` relative to the node at `context`.
    pub fn select_from(&self, context: &NodePath, expr: &str) -> Result<Option<NodePath>> {
        Ok(PathExpr::parse(expr)?.select_first(&self.root, Some(context)))
    }

    pub fn node(&self, at: &NodePath) -> Option<&Element> {
        at.resolve(&self.root)
    }
    pub fn node_mut(&mut self, at: &NodePath) -> Option<&mut Element> {
        at.resolve_mut(&mut self.root)
    }

    /// First node matching `expr`; invalid expressions match nothing.
    pub fn get_node(&self, expr: &str) -> Option<&Element> {
        let at = self.select(expr).ok().flatten()?;
        self.node(&at)
    }

    /// Like `get_node`, but a missing node is an error.
    pub fn require_node(&self, expr: &str) -> Result<&Element> {
        let at = self.select(expr)?.ok_or_else(|| SavError::MissingNode(expr.to_string()))?;
        self.node(&at).ok_or_else(|| SavError::MissingNode(expr.to_string()))
    }

    pub fn get_node_attribute(&self, expr: &str, attr: &str) -> Option<&str> {
        self.get_node(expr)?.attributes.get(attr).map(|s| s.as_str())
    }

    /// Overwrite an existing attribute on the first match. Returns false when
    /// the node or the attribute is absent.
    pub fn set_node_attribute(&mut self, expr: &str, attr: &str, value: &str) -> bool {
        let Some(at) = self.select(expr).ok().flatten() else {
            return false;
        };
        match self.node_mut(&at).and_then(|n| n.attributes.get_mut(attr)) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace the first node matching `expr` with a deep copy of
    /// `replacement`. Returns the node that was removed, or `None` when
    /// nothing matched.
    pub fn replace_subtree(&mut self, expr: &str, replacement: &Element) -> Option<Element> {
        let at = self.select(expr).ok().flatten()?;
        self.replace_at(&at, replacement.clone())
    }

    /// Splice `import` in place of the node at `at`: insert before, then remove the old node.
    pub fn replace_at(&mut self, at: &NodePath, import: Element) -> Option<Element> {
        let Some((parent_path, idx)) = at.split_last() else {
            return Some(std::mem::replace(&mut self.root, import));
        };
        let parent = parent_path.resolve_mut(&mut self.root)?;
        if !matches!(parent.children.get(idx), Some(XMLNode::Element(_))) {
            return None;
        }
        parent.children.insert(idx, XMLNode::Element(import));
        match parent.children.remove(idx + 1) {
            XMLNode::Element(old) => Some(old),
            _ => None,
        }
    }

    // ---- domain lookups ----

    pub fn player_appearance(&self) -> Option<&Element> {
        self.get_node(PLAYER_APPEARANCE_NODE)
    }
    pub fn player_stats(&self) -> Option<&Element> {
        self.get_node(PLAYER_STATS_NODE)
    }
    pub fn pawn_appearance(&self) -> Option<&Element> {
        self.get_node(PAWN_APPEARANCE_NODE)
    }
    pub fn pawn_stats(&self) -> Option<&Element> {
        self.get_node(PAWN_STATS_NODE)
    }
    pub fn appearance(&self, who: PlayerType) -> Option<&Element> {
        self.get_node(who.appearance_path())
    }
    pub fn stats(&self, who: PlayerType) -> Option<&Element> {
        self.get_node(who.stats_path())
    }

    fn name_node_path(&self, who: PlayerType) -> Option<NodePath> {
        let expr = format!("{}/{}", who.appearance_path(), NAME_ARRAY_NODE);
        self.select(&expr).ok().flatten()
    }

    pub fn name_node(&self, who: PlayerType) -> Option<&Element> {
        let at = self.name_node_path(who)?;
        self.node(&at)
    }

    pub fn steam_id(&self) -> Option<u64> {
        self.get_node_attribute(STEAM_ID_NODE, "value")?.trim().parse().ok()
    }

    pub fn set_steam_id(&mut self, steam_id: u64) -> bool {
        let ok = self.set_node_attribute(STEAM_ID_NODE, "value", &steam_id.to_string());
        if !ok {
            log::warn!("steam id node not found");
        }
        ok
    }

    pub fn name(&self, who: PlayerType) -> Option<String> {
        self.name_node(who).map(decode_name)
    }
    pub fn player_name(&self) -> Option<String> {
        self.name(PlayerType::Arisen)
    }
    pub fn pawn_name(&self) -> Option<String> {
        self.name(PlayerType::Pawn)
    }

    /// Rewrite a name array. `Ok(false)` when the save has no such node.
    pub fn set_name(&mut self, who: PlayerType, name: &str) -> Result<bool> {
        let codes = encode_name(name)?;
        let Some(at) = self.name_node_path(who) else {
            log::warn!("{:?} name node not found", who);
            return Ok(false);
        };
        let Some(node) = self.node_mut(&at) else {
            return Ok(false);
        };
        rebuild_name_node(node, &codes);
        Ok(true)
    }
    pub fn set_player_name(&mut self, name: &str) -> Result<bool> {
        self.set_name(PlayerType::Arisen, name)
    }
    pub fn set_pawn_name(&mut self, name: &str) -> Result<bool> {
        self.set_name(PlayerType::Pawn, name)
    }
}

/// Character codes of a name node, up to the first zero.
pub fn decode_name(node: &Element) -> String {
    let mut out = String::new();
    for child in node.children.iter().filter_map(|c| c.as_element()) {
        let Some(raw) = child.attributes.get("value") else {
            continue;
        };
        let code: u32 = raw.trim().parse().unwrap_or(0);
        if code == 0 {
            break;
        }
        if let Some(ch) = char::from_u32(code) {
            out.push(ch);
        }
    }
    out
}

/// Zero-padded character codes for a name array.
pub fn encode_name(name: &str) -> Result<Vec<u32>> {
    let len = name.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(SavError::NameTooLong { len });
    }
    let mut codes: Vec<u32> = name.chars().map(|c| c as u32).collect();
    codes.resize(MAX_NAME_LENGTH, 0);
    Ok(codes)
}

fn rebuild_name_node(node: &mut Element, codes: &[u32]) {
    node.attributes.clear();
    node.children.clear();
    node.attributes.insert("name".to_string(), NAME_ARRAY_ATTR.to_string());
    node.attributes.insert("type".to_string(), "u8".to_string());
    node.attributes.insert("count".to_string(), MAX_NAME_LENGTH.to_string());
    for code in codes {
        let mut u8_el = Element::new("u8");
        u8_el.attributes.insert("value".to_string(), code.to_string());
        node.children.push(XMLNode::Element(u8_el));
    }
}
