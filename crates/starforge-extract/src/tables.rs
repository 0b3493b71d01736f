//! Process-wide constant tables: manufacturers, skip lists, LOC-key maps,
//! catalogue aliases and the shared pattern sets. Loaded once and shared
//! by reference.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Vehicle manufacturer prefixes and display names. A class name whose
/// prefix is outside this set is not a player vehicle.
pub static MANUFACTURERS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("AEGS", "Aegis Dynamics"),
        ("ANVL", "Anvil Aerospace"),
        ("ARGO", "ARGO Astronautics"),
        ("BANU", "Banu Souli"),
        ("CNOU", "Consolidated Outland"),
        ("CRUS", "Crusader Industries"),
        ("DRAK", "Drake Interplanetary"),
        ("ESPR", "Esperia"),
        ("GAMA", "Gatac Manufacture"),
        ("GLSN", "Gallenson Tactical Systems"),
        ("GREY", "Greycat Industrial"),
        ("GRIN", "Greycat Industrial"),
        ("KRIG", "Kruger Intergalactic"),
        ("MISC", "Musashi Industrial & Starflight Concern"),
        ("MRAI", "Mirai"),
        ("ORIG", "Origin Jumpworks"),
        ("RSI", "Roberts Space Industries"),
        ("TMBL", "Tumbril Land Systems"),
        ("VNCL", "Vanduul"),
        ("XIAN", "Aopoa"),
        ("XNAA", "Aopoa"),
    ])
});

/// Manufacturer display name for a vehicle/component class name.
pub fn manufacturer_for_class(class_name: &str) -> Option<&'static str> {
    let prefix = class_name.split('_').next()?;
    MANUFACTURERS.get(prefix.to_uppercase().as_str()).copied()
}

/// Whether the class-name prefix belongs to a known vehicle manufacturer.
pub fn has_known_manufacturer(class_name: &str) -> bool {
    manufacturer_for_class(class_name).is_some()
}

/// Name substrings that disqualify a record from the vehicle index.
pub const VEHICLE_BLOCKLIST: &[&str] = &[
    "_ai_",
    "_test",
    "_template",
    "_unmanned",
    "_indestructible",
    "_prison",
];

/// Source-path fragments that mark vehicle records.
pub const VEHICLE_FOLDERS: &[&str] = &["/spaceships/", "/groundvehicles/"];

/// Ground-vehicle outliers stored outside the vehicle folders.
pub const VEHICLE_PATH_ALLOWLIST: &[&str] = &["drak_dragonfly", "argo_mpuv"];

/// Entity-name patterns that are props, not vehicles, even inside the
/// vehicle folders.
pub static NON_VEHICLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ammobox",
        r"(?i)debris",
        r"(?i)_probe($|_)",
        r"(?i)orbital_sentry",
        r"(?i)storage($|_all|_closed)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|_| Regex::new("$^").expect("fallback regex")))
    .collect()
});

/// Class-name substrings that remove a ship from the ship pass.
pub const SHIP_SKIP_SUBSTRINGS: &[&str] = &[
    "_test",
    "_debug",
    "_template",
    "_indestructible",
    "_unmanned",
    "_npc_only",
    "_prison",
    "_hijacked",
    "_drug",
    "_ai_only",
    "_derelict",
    "_wreck",
];

/// Class-name patterns that remove a ship from the ship pass.
pub static SHIP_SKIP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^AMBX_",
        r"_PU($|_)",
        r"_AI_",
        r"_Tier_\d+$",
        r"_Swarm($|_)",
        r"(?i)(^|_)(CIG|Event|Reward|Prize|Trophy)($|_)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|_| Regex::new("$^").expect("fallback regex")))
    .collect()
});

/// Whether a ship class name is filtered out of the ship pass.
pub fn ship_is_skipped(class_name: &str) -> bool {
    let lower = class_name.to_lowercase();
    SHIP_SKIP_SUBSTRINGS.iter().any(|s| lower.contains(s))
        || SHIP_SKIP_PATTERNS.iter().any(|p| p.is_match(class_name))
}

/// Component file-name substrings that mark test/debug/display records.
pub const COMPONENT_SKIP_SUBSTRINGS: &[&str] =
    &["_test", "_debug", "_display", "test_", "debug_", "_template"];

/// Personal-weapon tokens; these are FPS items, not ship guns.
pub const FPS_WEAPON_TOKENS: &[&str] = &[
    "rifle",
    "pistol",
    "smg",
    "shotgun",
    "sniper",
    "multitool",
    "lmg",
    "grenadelauncher",
    "grenade_launcher",
];

/// Career LOC keys → display names.
pub static CAREERS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("@vehicle_focus_combat", "Combat"),
        ("@vehicle_focus_transport", "Transporter"),
        ("@vehicle_focus_exploration", "Exploration"),
        ("@vehicle_focus_industrial", "Industrial"),
        ("@vehicle_focus_support", "Support"),
        ("@vehicle_focus_competition", "Competition"),
        ("@vehicle_focus_multi_role", "Multi-Role"),
        ("@vehicle_focus_ground", "Ground"),
    ])
});

/// Role LOC keys → display names.
pub static ROLES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("@vehicle_class_fighter", "Fighter"),
        ("@vehicle_class_lightfighter", "Light Fighter"),
        ("@vehicle_class_mediumfighter", "Medium Fighter"),
        ("@vehicle_class_heavyfighter", "Heavy Fighter"),
        ("@vehicle_class_bomber", "Bomber"),
        ("@vehicle_class_gunship", "Gunship"),
        ("@vehicle_class_interdiction", "Interdiction"),
        ("@vehicle_class_lightfreight", "Light Freight"),
        ("@vehicle_class_mediumfreight", "Medium Freight"),
        ("@vehicle_class_heavyfreight", "Heavy Freight"),
        ("@vehicle_class_mining", "Mining"),
        ("@vehicle_class_salvage", "Salvage"),
        ("@vehicle_class_refuelling", "Refuelling"),
        ("@vehicle_class_medical", "Medical"),
        ("@vehicle_class_racing", "Racing"),
        ("@vehicle_class_touring", "Touring"),
        ("@vehicle_class_expedition", "Expedition"),
        ("@vehicle_class_passenger", "Passenger"),
        ("@vehicle_class_starter", "Starter"),
        ("@vehicle_class_ground", "Ground"),
    ])
});

/// LOC prefixes stripped before Title-Casing an unmapped career/role key.
const LOC_PREFIXES: &[&str] = &[
    "@vehicle_focus_",
    "@vehicle_class_",
    "@vehicle_",
    "@",
    "LOC_",
];

/// Map a career/role LOC key to a display name, falling back to stripping
/// the known prefixes and Title-Casing the remainder.
pub fn loc_display_name(key: &str, table: &HashMap<&'static str, &'static str>) -> String {
    if let Some(name) = table.get(key) {
        return (*name).to_string();
    }
    let mut stem = key;
    for prefix in LOC_PREFIXES {
        if let Some(rest) = stem.strip_prefix(prefix) {
            stem = rest;
            break;
        }
    }
    title_case(&stem.replace('_', " "))
}

/// Shop LOC keys → kiosk display names.
pub static SHOP_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("@shop_dumpersdepot", "Dumper's Depot"),
        ("@shop_casaba", "Casaba Outlet"),
        ("@shop_centermass", "Center Mass"),
        ("@shop_cubbyblast", "Cubby Blast"),
        ("@shop_liveflire", "Live Fire Weapons"),
        ("@shop_newdeal", "New Deal"),
        ("@shop_astroarmada", "Astro Armada"),
        ("@shop_teachs", "Teach's Ship Shop"),
        ("@shop_omega_pro", "Omega Pro"),
        ("@shop_platinumbay", "Platinum Bay"),
        ("@shop_tammany", "Tammany and Sons"),
        ("@shop_admin", "Admin Office"),
        ("@shop_garrityDefense", "Garrity Defense"),
        ("@shop_conscientiousobjects", "Conscientious Objects"),
    ])
});

/// Shop type inferred from class-name keywords, first match wins.
pub const SHOP_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("weapon", "Weapons"),
    ("armor", "Armor"),
    ("armour", "Armor"),
    ("ship", "Ships"),
    ("vehicle", "Ships"),
    ("component", "Components"),
    ("clothing", "Clothing"),
    ("food", "Food"),
    ("bar", "Bar"),
    ("medical", "Medical"),
    ("mining", "Mining"),
    ("commodit", "Commodities"),
    ("trade", "Commodities"),
    ("rental", "Rentals"),
];

/// Catalogue display name → ship display name aliases for cross-reference
/// pass 2, both sides normalised before comparison.
pub static CATALOGUE_ALIASES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        HashMap::from([
            ("Mercury", "Star Runner"),
            ("F7C Hornet Wildfire Mk I", "Hornet F7C Wildfire"),
            ("F7C-M Super Hornet Mk I", "Super Hornet"),
            ("F7C-M Super Hornet Heartseeker Mk I", "Super Hornet Heartseeker"),
            ("Ursa", "Ursa Rover"),
            ("Dragonfly Yellowjacket", "Dragonfly"),
            ("Hercules Starlifter C2", "C2 Hercules"),
            ("Hercules Starlifter M2", "M2 Hercules"),
            ("Hercules Starlifter A2", "A2 Hercules"),
            ("Valkyrie Liberator Edition", "Valkyrie"),
            ("Reclaimer Best In Show Edition", "Reclaimer"),
            ("Caterpillar Pirate Edition", "Caterpillar"),
            ("P-72 Archimedes", "P72 Archimedes"),
            ("P-52 Merlin", "P52 Merlin"),
            ("Mustang Omega : AMD Edition", "Mustang Omega"),
            ("Khartu-Al", "Khartu-al"),
            ("San'tok.yāi", "Santokyai"),
        ])
    });

/// Event and colour keywords that terminate a paint's ship short name.
pub static PAINT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"_(Pirate|Invictus|ILW|BIS\d*|Harvester|Stella|Luminalia|Citizencon|CitizenCon|Auspicious|Dread|Ghoulish|Code|Timberline|Polar|Sandstorm|Midnight|Fortuna|Solstice|Sunburn|Nightrunner|IAE\d*|Showdown|Aurora(?:borealis)?Event)",
    )
    .unwrap_or_else(|_| Regex::new("$^").expect("fallback regex"))
});

/// Module-port name pattern for ship module rows.
pub static MODULE_PORT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|_)module(_|$)")
        .unwrap_or_else(|_| Regex::new("$^").expect("fallback regex"))
});

/// Module-slot noise: ports matching this are fittings, not modules.
pub static MODULE_NOISE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(dashboard|screen|light|seat|door|interior)")
        .unwrap_or_else(|_| Regex::new("$^").expect("fallback regex"))
});

/// Title-case every whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic component display-name fallback: strip the manufacturer
/// prefix, category prefixes and `_SCItem` suffixes, replace underscores
/// with spaces and break camelCase runs apart.
pub fn resolve_component_name(class_name: &str) -> String {
    let mut stem = class_name;
    if let Some((prefix, rest)) = stem.split_once('_') {
        if MANUFACTURERS.contains_key(prefix.to_uppercase().as_str()) {
            stem = rest;
        }
    }
    for category in ["POWR_", "COOL_", "SHLD_", "QDRV_", "MISL_", "RADR_", "WEPN_", "TURR_"] {
        if let Some(rest) = stem.strip_prefix(category) {
            stem = rest;
        }
    }
    if let Some(rest) = stem.strip_suffix("_SCItem") {
        stem = rest;
    }

    let mut out = String::with_capacity(stem.len() + 4);
    let mut prev_lower = false;
    for c in stem.chars() {
        if c == '_' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.push(c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn manufacturer_prefix_lookup() {
        assert_eq!(
            manufacturer_for_class("RSI_Aurora_MR"),
            Some("Roberts Space Industries")
        );
        assert_eq!(manufacturer_for_class("drak_Cutlass"), Some("Drake Interplanetary"));
        assert_eq!(manufacturer_for_class("ZZZZ_Nope"), None);
    }

    #[test]
    fn ship_skip_filters() {
        assert!(ship_is_skipped("AMBX_Boid"));
        assert!(ship_is_skipped("RSI_Aurora_MR_PU"));
        assert!(ship_is_skipped("RSI_Aurora_MR_PU_AI_CIV"));
        assert!(ship_is_skipped("AEGS_Idris_Swarm_03"));
        assert!(ship_is_skipped("ANVL_Hornet_F7A_Tier_2"));
        assert!(ship_is_skipped("MISC_Starfarer_npc_only"));
        assert!(!ship_is_skipped("RSI_Aurora_MR"));
        assert!(!ship_is_skipped("CRUS_Mercury_StarRunner"));
    }

    #[test]
    fn loc_fallback_title_cases_unknown_keys() {
        assert_eq!(loc_display_name("@vehicle_focus_combat", &CAREERS), "Combat");
        assert_eq!(
            loc_display_name("@vehicle_focus_bounty_hunting", &CAREERS),
            "Bounty Hunting"
        );
        assert_eq!(loc_display_name("@vehicle_class_fighter", &ROLES), "Fighter");
    }

    #[test]
    fn component_name_fallback() {
        assert_eq!(
            resolve_component_name("BEHR_WEPN_LaserRepeater_S3"),
            "BEHR WEPN Laser Repeater S3"
        );
        // Known manufacturer prefix and category prefix both stripped.
        assert_eq!(
            resolve_component_name("AEGS_POWR_FusionCore_SCItem"),
            "Fusion Core"
        );
        assert_eq!(resolve_component_name("QDRV_Atlas"), "Atlas");
    }
}
