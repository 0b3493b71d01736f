//! Catalogue cross-reference.
//!
//! Links extracted ships to an external catalogue of `(id, displayName)`
//! pairs in three strict passes. No catalogue entry and no ship is ever
//! linked twice, and a later pass never overrides an earlier one.

use std::collections::HashSet;

use crate::rows::CatalogueLink;
use crate::tables::{CATALOGUE_ALIASES, MANUFACTURERS};

/// Minimal ship identity the matcher works from.
#[derive(Debug, Clone)]
pub struct ShipIdentity {
    /// Ship GUID
    pub uuid: String,
    /// Entity class name
    pub class_name: String,
    /// Display name
    pub name: String,
}

/// One external catalogue entry.
#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    /// Catalogue id
    pub id: String,
    /// Display name
    pub display_name: String,
}

/// Normalise a name for matching: lowercase, strip combining marks, fold
/// curly quotes, hyphens to spaces, drop periods and slashes, collapse
/// whitespace. Idempotent.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            // Combining marks from NFD-style decomposition
            '\u{0300}'..='\u{036F}' => {}
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '-' | '\u{2010}'..='\u{2015}' => out.push(' '),
            '.' | '/' => {}
            c if c.is_whitespace() => out.push(' '),
            c => match deaccent(c) {
                Some(base) => out.push(base),
                None => out.push(c),
            },
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Base letter for the accented characters that actually occur in ship
/// names; a full decomposition table is not needed here.
fn deaccent(c: char) -> Option<char> {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ā' | 'ã' => Some('a'),
        'é' | 'è' | 'ê' | 'ë' | 'ē' => Some('e'),
        'í' | 'ì' | 'î' | 'ï' | 'ī' => Some('i'),
        'ó' | 'ò' | 'ô' | 'ö' | 'ō' | 'õ' => Some('o'),
        'ú' | 'ù' | 'û' | 'ü' | 'ū' => Some('u'),
        'ñ' => Some('n'),
        'ç' => Some('c'),
        _ => None,
    }
}

/// Class-name short form: the class without its manufacturer prefix,
/// underscores folded to spaces.
fn class_short_form(class_name: &str) -> String {
    let stem = match class_name.split_once('_') {
        Some((prefix, rest)) if MANUFACTURERS.contains_key(prefix.to_uppercase().as_str()) => rest,
        _ => class_name,
    };
    stem.replace('_', " ")
}

/// Tokens of length ≥ 2 from a normalised name.
fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| t.len() >= 2).collect()
}

/// Link ships to catalogue entries.
///
/// Pass 1 matches exact normalised names, pass 2 the alias table / class
/// short form / manufacturer-prefix strip, pass 3 token overlap with at
/// least two hits and an overlap score of 0.6 over the catalogue tokens.
/// Ties in pass 3 break toward the earlier ship.
pub fn cross_reference(
    ships: &[ShipIdentity],
    catalogue: &[CatalogueEntry],
) -> Vec<CatalogueLink> {
    let mut links = Vec::new();
    let mut used_entries: HashSet<usize> = HashSet::new();
    let mut used_ships: HashSet<usize> = HashSet::new();

    let ship_names: Vec<String> = ships.iter().map(|s| normalize(&s.name)).collect();
    let entry_names: Vec<String> = catalogue
        .iter()
        .map(|e| normalize(&e.display_name))
        .collect();

    let mut link = |links: &mut Vec<CatalogueLink>,
                    used_entries: &mut HashSet<usize>,
                    used_ships: &mut HashSet<usize>,
                    entry: usize,
                    ship: usize,
                    pass: u8| {
        used_entries.insert(entry);
        used_ships.insert(ship);
        links.push(CatalogueLink {
            catalogue_id: catalogue[entry].id.clone(),
            ship_uuid: ships[ship].uuid.clone(),
            pass,
        });
    };

    // Pass 1: exact normalised name.
    for (entry_index, entry_name) in entry_names.iter().enumerate() {
        if let Some(ship_index) = ships
            .iter()
            .enumerate()
            .position(|(i, _)| !used_ships.contains(&i) && &ship_names[i] == entry_name)
        {
            link(
                &mut links,
                &mut used_entries,
                &mut used_ships,
                entry_index,
                ship_index,
                1,
            );
        }
    }

    // Pass 2: alias table, class short form, manufacturer-prefix strip.
    for (entry_index, entry) in catalogue.iter().enumerate() {
        if used_entries.contains(&entry_index) {
            continue;
        }
        let aliased = CATALOGUE_ALIASES
            .get(entry.display_name.as_str())
            .map(|alias| normalize(alias));
        let entry_name = &entry_names[entry_index];

        let matched = ships.iter().enumerate().position(|(ship_index, ship)| {
            if used_ships.contains(&ship_index) {
                return false;
            }
            let ship_name = &ship_names[ship_index];
            if let Some(aliased) = &aliased {
                if ship_name == aliased {
                    return true;
                }
            }
            if normalize(&class_short_form(&ship.class_name)) == *entry_name {
                return true;
            }
            // A catalogue name that leads with the manufacturer still
            // matches the bare ship name.
            MANUFACTURERS.values().any(|m| {
                let stripped = entry_name
                    .strip_prefix(&normalize(m))
                    .map(str::trim_start);
                stripped == Some(ship_name.as_str())
            })
        });

        if let Some(ship_index) = matched {
            link(
                &mut links,
                &mut used_entries,
                &mut used_ships,
                entry_index,
                ship_index,
                2,
            );
        }
    }

    // Pass 3: token overlap.
    for (entry_index, entry_name) in entry_names.iter().enumerate() {
        if used_entries.contains(&entry_index) {
            continue;
        }
        let entry_tokens = tokens(entry_name);
        if entry_tokens.is_empty() {
            continue;
        }

        let mut best: Option<(usize, usize, f64)> = None; // ship, hits, score
        for (ship_index, ship_name) in ship_names.iter().enumerate() {
            if used_ships.contains(&ship_index) {
                continue;
            }
            let ship_tokens: HashSet<&str> = tokens(ship_name).into_iter().collect();
            let hits = entry_tokens
                .iter()
                .filter(|t| ship_tokens.contains(**t))
                .count();
            let score = hits as f64 / entry_tokens.len() as f64;
            if hits >= 2 && score >= 0.6 {
                // Strictly-better only, so ties break toward the earlier ship.
                let better = best.is_none_or(|(_, _, s)| score > s);
                if better {
                    best = Some((ship_index, hits, score));
                }
            }
        }

        if let Some((ship_index, _, _)) = best {
            link(
                &mut links,
                &mut used_entries,
                &mut used_ships,
                entry_index,
                ship_index,
                3,
            );
        }
    }

    links
}
