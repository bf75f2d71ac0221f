use serde_json::json;
use xmltree::{Element, XMLNode};

use crate::doc::SavDocument;
use crate::sav::{Sav, SavHeader};

#[derive(Clone, Copy)]
pub struct JsonOpts {
    pub max_children: usize,
    pub max_depth: usize,
}

impl Default for JsonOpts {
    fn default() -> Self {
        Self {
            max_children: 128,
            max_depth: 16,
        }
    }
}

pub fn document_to_json(doc: &SavDocument, opts: JsonOpts) -> serde_json::Value {
    element_to_json(doc.root(), 0, &opts)
}

pub fn element_to_json(el: &Element, depth: usize, opts: &JsonOpts) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(el.attributes.len() + 2);
    map.insert("$name".to_string(), json!(el.name));
    for (k, v) in el.attributes.iter() {
        map.insert(format!("@{}", k), json!(v));
    }
    let elements: Vec<&Element> = el.children.iter().filter_map(|c| c.as_element()).collect();
    if !elements.is_empty() {
        if depth >= opts.max_depth {
            map.insert("children".to_string(), json!({"$truncated": true, "$omitted": elements.len()}));
        } else {
            let max = opts.max_children.min(elements.len());
            let mut arr = Vec::with_capacity(max + 1);
            for child in elements.iter().take(max) {
                arr.push(element_to_json(child, depth + 1, opts));
            }
            if elements.len() > max {
                arr.push(json!({"$truncated": true, "$omitted": elements.len() - max}));
            }
            map.insert("children".to_string(), serde_json::Value::Array(arr));
        }
    }
    let text: String = el
        .children
        .iter()
        .filter_map(|c| match c {
            XMLNode::Text(t) | XMLNode::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    if !text.trim().is_empty() {
        map.insert("$text".to_string(), json!(text));
    }
    serde_json::Value::Object(map)
}

/// Header fields and the character summary of a loaded save.
pub fn summary_json(sav: &Sav) -> serde_json::Value {
    let stored = SavHeader::from_bytes(sav.header());
    json!({
        "version": sav.version,
        "pcLayout": sav.is_pc_layout(),
        "realSize": stored.real_size,
        "compressedSize": stored.compressed_size,
        "checksum": format!("{:#010x}", stored.checksum),
        "checksumOk": sav.checksum_matches(),
        "playerName": sav.player_name(),
        "pawnName": sav.pawn_name(),
        "steamId": sav.steam_id(),
    })
}

pub fn dump_document_json(doc: &SavDocument, opts: JsonOpts) -> String {
    let v = document_to_json(doc, opts);
    serde_json::to_string_pretty(&v).unwrap_or_default()
}
