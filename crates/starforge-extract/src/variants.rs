//! Variant resolution.
//!
//! Real vehicles ship as a bare class plus several `_PU` entity variants,
//! and only some of those carry the default loadout. The resolver picks
//! the entity that owns the canonical loadout for a given ship.

use starforge_forge::{ForgeView, InstanceReader};
use tracing::debug;

use crate::index::Indexes;
use crate::walk::{loadout_entry_count, read_entity_by_name, read_record};

/// A base loadout with at least this many entries is the real one; smaller
/// loadouts are trivial placeholders.
const REAL_LOADOUT_MIN: usize = 20;

/// The entity triple a ship extraction works from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipEntities {
    /// The bare vehicle class
    pub base_entity: String,
    /// The entity whose default loadout is canonical
    pub loadout_entity: String,
    /// Stem for the sidecar vehicle XML lookup
    pub vehicle_xml_name: String,
}

/// Loadout-owning-entity resolver.
pub struct VariantResolver<'a> {
    view: &'a ForgeView,
    indexes: &'a Indexes,
    reader: &'a InstanceReader<'a>,
}

impl<'a> VariantResolver<'a> {
    /// Resolver over one view and its indexes.
    pub fn new(view: &'a ForgeView, indexes: &'a Indexes, reader: &'a InstanceReader<'a>) -> Self {
        Self {
            view,
            indexes,
            reader,
        }
    }

    /// Choose the entity triple for a ship class.
    pub fn resolve(&self, class_name: &str, ship_name: &str) -> ShipEntities {
        let base = ShipEntities {
            base_entity: class_name.to_string(),
            loadout_entity: class_name.to_string(),
            vehicle_xml_name: class_name.to_string(),
        };

        // 1. A base entity with a real loadout wins outright.
        if self.loadout_count_of(class_name) >= REAL_LOADOUT_MIN {
            return base;
        }

        // 2. The bare _PU entity, exact or fuzzy.
        if let Some(entities) = self.try_entity(&format!("{class_name}_PU")) {
            return entities;
        }

        // 3. The civilian AI flavour, tried explicitly.
        if let Some(entities) = self.try_entity(&format!("{class_name}_PU_AI_CIV")) {
            return entities;
        }

        // 4. Group the variant _PU entities by their variant token and
        //    score each group's canonical entity against the ship name.
        let variants = self.indexes.find_variant_pu_entities(class_name);
        let groups = group_by_variant_token(class_name, &variants);
        if groups.is_empty() {
            return base;
        }

        let mut best: Option<(u32, &str)> = None;
        for (token, canonical) in &groups {
            let score = score_variant_token(token, ship_name);
            if score > 0 && best.is_none_or(|(s, _)| score > s) {
                best = Some((score, canonical.as_str()));
            }
        }

        if let Some((score, canonical)) = best {
            debug!(class = class_name, canonical, score, "variant chosen by token score");
            return self.entities_for_variant(class_name, canonical);
        }

        // 5. One distinct variant token means there is nothing to choose.
        if groups.len() == 1 {
            return self.entities_for_variant(class_name, &groups[0].1);
        }

        base
    }

    fn loadout_count_of(&self, class_name: &str) -> usize {
        self.indexes
            .entity_position(&class_name.to_lowercase())
            .map_or(0, |position| {
                loadout_entry_count(&read_record(self.view, self.reader, position))
            })
    }

    fn try_entity(&self, probe: &str) -> Option<ShipEntities> {
        let (name, entity) = read_entity_by_name(self.view, self.indexes, self.reader, probe)?;
        if loadout_entry_count(&entity) == 0 {
            return None;
        }
        let base = probe
            .strip_suffix("_PU")
            .or_else(|| probe.strip_suffix("_PU_AI_CIV"))
            .unwrap_or(probe);
        Some(ShipEntities {
            base_entity: base.to_string(),
            loadout_entity: name.clone(),
            vehicle_xml_name: xml_stem(&name),
        })
    }

    fn entities_for_variant(&self, class_name: &str, canonical_lower: &str) -> ShipEntities {
        let loadout_entity = self
            .indexes
            .entity_position(canonical_lower)
            .and_then(|p| self.view.records().get(p))
            .map_or_else(|| canonical_lower.to_string(), |r| r.name.clone());
        ShipEntities {
            base_entity: class_name.to_string(),
            loadout_entity: loadout_entity.clone(),
            vehicle_xml_name: xml_stem(&loadout_entity),
        }
    }
}

/// The entity name up to and including `_PU`, with any AI suffix dropped.
fn xml_stem(entity_name: &str) -> String {
    let upper = entity_name.to_uppercase();
    match upper.find("_PU") {
        Some(at) => entity_name[..at + 3].to_string(),
        None => entity_name.to_string(),
    }
}

/// Group variant entity names (lowercased) by the token strictly between
/// `<class>_` and `_pu`, picking one canonical entity per group with
/// preference plain `_pu` > `_ai_civ` > `_ai_uee` > first.
fn group_by_variant_token(class_name: &str, variants: &[String]) -> Vec<(String, String)> {
    let prefix = format!("{}_", class_name.to_lowercase());
    let mut groups: Vec<(String, Vec<&String>)> = Vec::new();

    for name in variants {
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let Some(token_end) = rest.find("_pu") else {
            continue;
        };
        let token = &rest[..token_end];
        if token.is_empty() {
            continue; // the bare _PU entity was already tried
        }
        match groups.iter_mut().find(|(t, _)| t == token) {
            Some((_, members)) => members.push(name),
            None => groups.push((token.to_string(), vec![name])),
        }
    }

    groups
        .into_iter()
        .map(|(token, members)| {
            let canonical = members
                .iter()
                .find(|n| n.ends_with("_pu"))
                .or_else(|| members.iter().find(|n| n.ends_with("_ai_civ")))
                .or_else(|| members.iter().find(|n| n.ends_with("_ai_uee")))
                .unwrap_or(&members[0]);
            (token, (*canonical).clone())
        })
        .collect()
}

/// Score a variant token against the desired ship name: per variant word,
/// the best of exact (+3), alphanumeric-stripped exact (+2) or substring
/// in either direction (+1) over the ship's words.
fn score_variant_token(token: &str, ship_name: &str) -> u32 {
    let ship_words: Vec<String> = ship_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() >= 2)
        .map(str::to_string)
        .collect();

    let strip = |w: &str| -> String { w.chars().filter(char::is_ascii_alphanumeric).collect() };

    token
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|variant_word| {
            ship_words
                .iter()
                .map(|ship_word| {
                    if variant_word == ship_word {
                        3
                    } else if strip(variant_word) == strip(ship_word) {
                        2
                    } else if variant_word.contains(ship_word.as_str())
                        || ship_word.contains(variant_word)
                    {
                        1
                    } else {
                        0
                    }
                })
                .max()
                .unwrap_or(0)
        })
        .sum()
}
