//! Ship extraction.
//!
//! For each indexed vehicle: resolve the entity triple, read the base
//! entity, merge the variant loadout and sidecar XML damage model, then
//! emit one ship row plus one row per loadout port and port child.

use serde_json::{Value as Json, json};
use starforge_forge::cryxml::{XmlNode, parse_cryxml};
use starforge_forge::{ForgeView, InstanceReader, Value};
use starforge_p4k::P4kArchive;
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::index::Indexes;
use crate::options::{ExtractOptions, Phase};
use crate::rows::{ShipModuleRow, ShipPortRow, ShipRow, to_row};
use crate::sink::RowSink;
use crate::tables::{
    CAREERS, MODULE_NOISE_PATTERN, MODULE_PORT_PATTERN, ROLES, loc_display_name,
    manufacturer_for_class, ship_is_skipped,
};
use crate::variants::{ShipEntities, VariantResolver};
use crate::walk::{components, find_component, loadout_entries, read_record};

/// Ship entities are read at this depth; loadouts nest several levels of
/// ports below the component list.
const SHIP_READ_DEPTH: usize = 6;

/// Progress cadence for the ship pass.
const SHIP_PROGRESS_INTERVAL: u64 = 20;

/// Sidecar vehicle XML directory inside the archive.
const VEHICLE_XML_DIR: &str = "Data/Scripts/Entities/Vehicles/Implementations/Xml";

/// Loadout fallback suffixes, most specific first; the first entity whose
/// default loadout is non-empty supplies the port→class map.
const LOADOUT_FALLBACK_SUFFIXES: &[&str] =
    &["_PU_AI_UEE", "_PU_AI_SEC", "_PU_AI_CIV", "_PU_AI", "_PU", "_Template"];

/// Classify a loadout port from its name and the equipped class.
pub fn classify_port(port_name: &str, component_class: &str) -> &'static str {
    let port = port_name.to_lowercase();
    let class = component_class.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| port.contains(n) || class.contains(n));

    // Disambiguators run before the broad buckets: racks before guns,
    // interdiction before quantum drives, gimbals before turrets.
    if any(&["weapon_rack", "weaponrack"]) {
        return "WeaponRack";
    }
    if any(&["quantuminterdiction", "quantum_interdiction", "qig"]) {
        return "QuantumInterdictionGenerator";
    }
    if any(&["quantum", "qdrive", "qdrv"]) {
        return "QuantumDrive";
    }
    if any(&["missile_rack", "missilerack", "missilelauncher"]) {
        return "MissileRack";
    }
    if any(&["gimbal"]) {
        return "Gimbal";
    }
    if any(&["turret"]) {
        return "Turret";
    }
    if any(&["shield", "shld"]) {
        return "Shield";
    }
    if any(&["powerplant", "power_plant", "powr"]) {
        return "PowerPlant";
    }
    if any(&["cooler", "cool_"]) {
        return "Cooler";
    }
    if any(&["radar", "radr"]) {
        return "Radar";
    }
    if any(&["countermeasure"]) {
        return "Countermeasure";
    }
    if any(&["flightcontroller", "controller_flight", "ifcs"]) {
        return "FlightController";
    }
    if any(&["thruster"]) {
        return "Thruster";
    }
    if port.starts_with("emp") || port.contains("_emp") || class.contains("emp_") {
        return "EMP";
    }
    if any(&["hardpoint_weapon", "weapon_gun", "weapongun", "wepn"]) || port.contains("gun") {
        return "WeaponGun";
    }
    if any(&["weapon", "missile"]) {
        return "Weapon";
    }
    "Other"
}

/// Port metadata captured from the port container component.
#[derive(Debug, Clone, Default)]
struct PortMeta {
    display_name: Option<String>,
    min_size: Option<i64>,
    max_size: Option<i64>,
    accepted_types: Vec<String>,
    required_tags: Vec<String>,
    editable: Option<bool>,
}

/// Hull summary lifted from the sidecar damage model.
#[derive(Debug, Clone)]
struct PartsSummary {
    total_hp: f64,
    body_hp: Option<f64>,
    root_mass: Option<f64>,
    tree: Json,
}

/// Ship extraction pass.
pub struct ShipExtractor<'a> {
    view: &'a ForgeView,
    indexes: &'a Indexes,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
    archive: Option<&'a P4kArchive>,
}

impl<'a> ShipExtractor<'a> {
    /// Extractor over one decoded view; the archive supplies sidecar XMLs
    /// and may be absent in tests.
    pub fn new(
        view: &'a ForgeView,
        indexes: &'a Indexes,
        options: &'a ExtractOptions,
        archive: Option<&'a P4kArchive>,
    ) -> Self {
        let reader = InstanceReader::new(view)
            .with_max_depth(SHIP_READ_DEPTH.max(options.max_instance_depth))
            .with_array_cap(options.array_element_cap);
        Self {
            view,
            indexes,
            reader,
            options,
            archive,
        }
    }

    /// Run the pass; returns `(ships, ports, modules)` row counts.
    pub fn extract(&self, sink: &mut dyn RowSink) -> ExtractResult<(u64, u64, u64)> {
        let resolver = VariantResolver::new(self.view, self.indexes, &self.reader);
        let total = self.indexes.vehicle_count() as u64;

        let mut ships = Vec::new();
        let mut ports = Vec::new();
        let mut modules = Vec::new();
        let mut done = 0u64;

        for vehicle in self.indexes.vehicles() {
            if ship_is_skipped(&vehicle.class_name) {
                continue;
            }
            match self.extract_ship(&resolver, &vehicle.class_name, &vehicle.guid.to_string()) {
                Some((ship, ship_ports, ship_modules)) => {
                    ships.push(to_row(&ship));
                    ports.extend(ship_ports.iter().map(to_row));
                    modules.extend(ship_modules.iter().map(to_row));
                }
                None => warn!(class = %vehicle.class_name, "ship did not decode"),
            }

            done += 1;
            if done % SHIP_PROGRESS_INTERVAL == 0 {
                self.options.report(Phase::Ships, done, total);
            }
        }
        self.options.report(Phase::Ships, done, total);

        for (table, rows) in [
            ("ships", &ships),
            ("ship_ports", &ports),
            ("ship_modules", &modules),
        ] {
            sink.upsert_batch(table, rows)
                .map_err(|message| ExtractError::Sink {
                    table: table.into(),
                    message,
                })?;
        }
        Ok((ships.len() as u64, ports.len() as u64, modules.len() as u64))
    }

    fn extract_ship(
        &self,
        resolver: &VariantResolver<'_>,
        class_name: &str,
        uuid: &str,
    ) -> Option<(ShipRow, Vec<ShipPortRow>, Vec<ShipModuleRow>)> {
        let base_position = self.indexes.entity_position(&class_name.to_lowercase())?;
        let base = read_record(self.view, &self.reader, base_position);
        if base.is_null() {
            return None;
        }

        let mut row = ShipRow {
            uuid: uuid.to_string(),
            class_name: class_name.to_string(),
            manufacturer: manufacturer_for_class(class_name).map(str::to_string),
            ..ShipRow::default()
        };
        self.capture_attachable(&base, &mut row);
        self.capture_vehicle_params(&base, &mut row);
        self.capture_insurance(&base, &mut row);
        let mut port_meta = capture_port_metadata(&base);

        let entities = resolver.resolve(class_name, &row.name);
        row.loadout_entity = entities.loadout_entity.clone();

        // The variant's loadout replaces the base's; the variant also
        // backfills whatever the base lacked.
        let variant = (entities.loadout_entity != entities.base_entity)
            .then(|| {
                self.indexes
                    .entity_position(&entities.loadout_entity.to_lowercase())
                    .map(|p| read_record(self.view, &self.reader, p))
            })
            .flatten()
            .filter(|v| !v.is_null());

        let loadout_source = variant.as_ref().unwrap_or(&base);
        if let Some(variant) = &variant {
            if row.crew_size.is_none() {
                self.capture_vehicle_params(variant, &mut row);
            }
            if row.insurance_expedite_fee.is_none() {
                self.capture_insurance(variant, &mut row);
            }
            if port_meta.is_empty() {
                port_meta = capture_port_metadata(variant);
            }
        }

        // Sidecar damage model. The XML's root-part mass wins, except when
        // a variant was chosen and the XML that matched was the base's; the
        // variant's controller mass is the more accurate one then.
        let summary = self.read_parts_summary(&entities, &base);
        if let Some((matched, summary)) = &summary {
            row.total_hp = Some(summary.total_hp);
            row.body_hp = summary.body_hp;
            row.mass = summary.root_mass;
            if variant.is_some() && matched.eq_ignore_ascii_case(&entities.base_entity) {
                if let Some(mass) = variant.as_ref().and_then(physics_mass) {
                    row.mass = Some(mass);
                }
            }
        }
        if row.mass.is_none() {
            row.mass = physics_mass(loadout_source).or_else(|| physics_mass(&base));
        }
        if row.total_hp.is_none() {
            row.total_hp = find_component(&base, "SHealthComponentParams")
                .and_then(|c| c.field("Health"))
                .and_then(Value::as_f64);
        }

        // Loadout walk.
        let fallback = self.loadout_fallback_map(class_name);
        let mut ports = Vec::new();
        let mut modules = Vec::new();
        if let Some(entries) = loadout_entries(loadout_source) {
            for entry in entries.items() {
                self.emit_port(entry, None, uuid, &port_meta, &fallback, &mut ports, &mut modules);
            }
        }

        let mut game_data = base.to_json();
        if let (Json::Object(map), Some((_, summary))) = (&mut game_data, &summary) {
            map.insert("vehicleParts".into(), summary.tree.clone());
        }
        row.game_data = game_data;

        Some((row, ports, modules))
    }

    fn capture_attachable(&self, entity: &Value, row: &mut ShipRow) {
        let Some(attach) = find_component(entity, "SAttachableComponentParams") else {
            row.name = ship_display_fallback(&row.class_name);
            return;
        };
        let def = attach.field("AttachDef").unwrap_or(attach);
        row.size = def.field("Size").and_then(Value::as_i64);

        let decoded = def
            .path(&["Localization", "Name"])
            .or_else(|| def.field("Name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let localised = self.options.localise(&row.class_name, decoded);
        row.name = if localised.is_empty()
            || localised.starts_with('@')
            || localised.starts_with("LOC_")
        {
            ship_display_fallback(&row.class_name)
        } else {
            localised
        };

        // Manufacturer sub-block resolves through the GUID index when the
        // attach definition points at a manufacturer record.
        if let Some(guid) = def.field("Manufacturer").and_then(Value::as_guid) {
            if let Some(name) = self.indexes.guid_name(&guid) {
                row.manufacturer = Some(name.to_string());
            }
        }
    }

    fn capture_vehicle_params(&self, entity: &Value, row: &mut ShipRow) {
        let Some(vehicle) = find_component(entity, "VehicleComponentParams") else {
            return;
        };
        row.crew_size = vehicle
            .field("crewSize")
            .and_then(Value::as_i64)
            .or(row.crew_size);
        if let Some(bbox) = vehicle.field("maxBoundingBoxSize") {
            row.length = bbox.field("x").and_then(Value::as_f64).or(row.length);
            row.beam = bbox.field("y").and_then(Value::as_f64).or(row.beam);
            row.height = bbox.field("z").and_then(Value::as_f64).or(row.height);
        }
        if let Some(career) = vehicle.field("vehicleCareer").and_then(Value::as_str) {
            row.career = Some(loc_display_name(career, &CAREERS));
        }
        if let Some(role) = vehicle.field("vehicleRole").and_then(Value::as_str) {
            row.role = Some(loc_display_name(role, &ROLES));
        }
    }

    fn capture_insurance(&self, entity: &Value, row: &mut ShipRow) {
        let Some(static_data) = entity.field("StaticEntityClassData") else {
            return;
        };
        for item in static_data.items() {
            let insurance = item.field("insuranceParams").unwrap_or(item);
            let fee = insurance
                .field("baseExpeditingFee")
                .and_then(Value::as_f64);
            let wait = insurance
                .field("baseWaitTimeMinutes")
                .and_then(Value::as_f64);
            let mandatory = insurance
                .field("mandatoryWaitTimeMinutes")
                .and_then(Value::as_f64);
            if fee.is_some() || wait.is_some() || mandatory.is_some() {
                row.insurance_expedite_fee = fee;
                row.insurance_wait_minutes = wait;
                row.insurance_mandatory_wait_minutes = mandatory;
                return;
            }
        }
    }

    /// Build the `(port name → class)` fill-in map from the first fallback
    /// entity whose default loadout is non-empty; composite `parent/child`
    /// keys cover nested ports.
    fn loadout_fallback_map(
        &self,
        class_name: &str,
    ) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        for suffix in LOADOUT_FALLBACK_SUFFIXES {
            let candidate = format!("{class_name}{suffix}").to_lowercase();
            let Some(position) = self.indexes.entity_position(&candidate) else {
                continue;
            };
            let entity = read_record(self.view, &self.reader, position);
            let Some(entries) = loadout_entries(&entity) else {
                continue;
            };
            if entries.items().count() == 0 {
                continue;
            }

            for entry in entries.items() {
                let Some(port) = entry.field("itemPortName").and_then(Value::as_str) else {
                    continue;
                };
                let port = port.to_lowercase();
                if let Some(class) = entry.field("entityClassName").and_then(Value::as_str) {
                    if !class.is_empty() {
                        map.insert(port.clone(), class.to_string());
                    }
                }
                for child in entry
                    .path(&["loadout", "entries"])
                    .map_or([].iter(), Value::items)
                {
                    let (Some(child_port), Some(child_class)) = (
                        child.field("itemPortName").and_then(Value::as_str),
                        child.field("entityClassName").and_then(Value::as_str),
                    ) else {
                        continue;
                    };
                    if !child_class.is_empty() {
                        map.insert(
                            format!("{port}/{}", child_port.to_lowercase()),
                            child_class.to_string(),
                        );
                    }
                }
            }
            debug!(class = class_name, suffix, entries = map.len(), "loadout fallback map built");
            break;
        }
        map
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_port(
        &self,
        entry: &Value,
        parent: Option<&str>,
        uuid: &str,
        port_meta: &std::collections::HashMap<String, PortMeta>,
        fallback: &std::collections::HashMap<String, String>,
        ports: &mut Vec<ShipPortRow>,
        modules: &mut Vec<ShipModuleRow>,
    ) {
        let Some(port_name) = entry.field("itemPortName").and_then(Value::as_str) else {
            return;
        };
        let port_lower = port_name.to_lowercase();

        let mut class = entry
            .field("entityClassName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if class.is_empty() {
            let key = match parent {
                Some(parent) => format!("{}/{port_lower}", parent.to_lowercase()),
                None => port_lower.clone(),
            };
            class = fallback.get(&key).cloned().unwrap_or_default();
        }

        let meta = port_meta.get(&port_lower);
        ports.push(ShipPortRow {
            ship_uuid: uuid.to_string(),
            port_name: port_name.to_string(),
            parent_port: parent.map(str::to_string),
            equipped_class: class.clone(),
            port_type: classify_port(port_name, &class).to_string(),
            display_name: meta.and_then(|m| m.display_name.clone()),
            min_size: meta.and_then(|m| m.min_size),
            max_size: meta.and_then(|m| m.max_size),
            accepted_types: meta.map(|m| m.accepted_types.clone()).unwrap_or_default(),
            required_tags: meta.map(|m| m.required_tags.clone()).unwrap_or_default(),
            editable: meta.and_then(|m| m.editable),
        });

        if parent.is_none()
            && MODULE_PORT_PATTERN.is_match(port_name)
            && !MODULE_NOISE_PATTERN.is_match(port_name)
            && !class.is_empty()
        {
            modules.push(ShipModuleRow {
                ship_uuid: uuid.to_string(),
                port_name: port_name.to_string(),
                equipped_class: class,
            });
        }

        if parent.is_none() {
            for child in entry
                .path(&["loadout", "entries"])
                .map_or([].iter(), Value::items)
            {
                self.emit_port(child, Some(port_name), uuid, port_meta, fallback, ports, modules);
            }
        }
    }

    /// Try the sidecar XML candidates in order and summarise the first
    /// binary XML that decodes; returns the candidate stem that matched.
    fn read_parts_summary(
        &self,
        entities: &ShipEntities,
        base: &Value,
    ) -> Option<(String, PartsSummary)> {
        let archive = self.archive?;

        let definition_stem = find_component(base, "VehicleComponentParams")
            .and_then(|v| v.field("vehicleDefinition"))
            .and_then(Value::as_str)
            .and_then(|path| {
                path.rsplit(['/', '\\'])
                    .next()
                    .map(|f| f.trim_end_matches(".xml").to_string())
            });

        let mut candidates = vec![
            entities.vehicle_xml_name.clone(),
            entities.base_entity.clone(),
        ];
        if let Some(stem) = definition_stem {
            candidates.push(stem);
        }

        for name in candidates {
            let path = format!("{VEHICLE_XML_DIR}/{name}.xml");
            let Some(entry) = archive.find(&path) else {
                continue;
            };
            let Ok(raw) = archive.read_entry(entry) else {
                warn!(%path, "sidecar XML read failed");
                continue;
            };
            match parse_cryxml(&raw) {
                Ok(Some(tree)) => return summarize_parts(&tree).map(|s| (name, s)),
                Ok(None) => continue,
                Err(error) => {
                    warn!(%path, %error, "sidecar XML decode failed");
                    continue;
                }
            }
        }
        None
    }
}

/// Capture the port-container metadata map, keyed by lowercased port name.
fn capture_port_metadata(entity: &Value) -> std::collections::HashMap<String, PortMeta> {
    let mut out = std::collections::HashMap::new();
    let Some(container) = find_component(entity, "SItemPortContainerComponentParams") else {
        return out;
    };
    for port in container.field("Ports").map_or([].iter(), Value::items) {
        let Some(name) = port.field("Name").and_then(Value::as_str) else {
            continue;
        };

        let accepted_types = port
            .field("Types")
            .map_or([].iter(), Value::items)
            .filter_map(|t| match t {
                Value::String(s) => Some(s.clone()),
                object => object.field("Type").and_then(Value::as_str).map(str::to_string),
            })
            .collect();
        let required_tags = port
            .field("RequiredTags")
            .and_then(Value::as_str)
            .map(|tags| tags.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let editable = port
            .field("Flags")
            .and_then(Value::as_str)
            .map(|flags| !flags.contains("uneditable"))
            .or_else(|| port.field("editable").and_then(Value::as_bool));

        out.insert(
            name.to_lowercase(),
            PortMeta {
                display_name: port
                    .field("DisplayName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                min_size: port.field("MinSize").and_then(Value::as_i64),
                max_size: port.field("MaxSize").and_then(Value::as_i64),
                accepted_types,
                required_tags,
                editable,
            },
        );
    }
    out
}

/// First physics-controller mass found on the entity.
fn physics_mass(entity: &Value) -> Option<f64> {
    for component in components(entity) {
        match component.type_name() {
            Some("SEntityPhysicsControllerParams") => {
                let mass = component
                    .path(&["PhysType", "Mass"])
                    .or_else(|| component.field("Mass"))
                    .and_then(Value::as_f64);
                if mass.is_some() {
                    return mass;
                }
            }
            Some("IFCSParams") => {
                if let Some(mass) = component.field("mass").and_then(Value::as_f64) {
                    return Some(mass);
                }
            }
            _ => {}
        }
    }
    None
}

/// Display fallback for a ship: drop the manufacturer prefix and swap
/// underscores for spaces.
fn ship_display_fallback(class_name: &str) -> String {
    let stem = match class_name.split_once('_') {
        Some((prefix, rest)) if crate::tables::MANUFACTURERS.contains_key(prefix.to_uppercase().as_str()) => rest,
        _ => class_name,
    };
    stem.replace('_', " ")
}

/// Sum the damage model: every `damageMax` on parts whose class is not
/// `ItemPort`, the first `Body` part, the root part's mass, and a nested
/// parts tree for the blob.
fn summarize_parts(root: &XmlNode) -> Option<PartsSummary> {
    let parts = if root.tag == "Parts" {
        root
    } else {
        root.child("Parts")?
    };

    let mut total_hp = 0.0;
    let mut body_hp = None;
    let mut root_mass = None;
    let tree: Vec<Json> = parts
        .children_named("Part")
        .map(|part| walk_part(part, &mut total_hp, &mut body_hp, &mut root_mass))
        .collect();

    Some(PartsSummary {
        total_hp,
        body_hp,
        root_mass,
        tree: Json::Array(tree),
    })
}

fn walk_part(
    part: &XmlNode,
    total_hp: &mut f64,
    body_hp: &mut Option<f64>,
    root_mass: &mut Option<f64>,
) -> Json {
    let name = part.attr("name").unwrap_or_default();
    let class = part.attr("class").unwrap_or_default();
    let damage_max = part.attr("damageMax").and_then(|v| v.parse::<f64>().ok());
    let mass = part.attr("mass").and_then(|v| v.parse::<f64>().ok());

    if root_mass.is_none() {
        *root_mass = mass;
    }
    if class != "ItemPort" {
        if let Some(damage) = damage_max {
            *total_hp += damage;
            if body_hp.is_none() && name == "Body" {
                *body_hp = Some(damage);
            }
        }
    }

    let mut children: Vec<Json> = part
        .children_named("Part")
        .map(|child| walk_part(child, total_hp, body_hp, root_mass))
        .collect();
    for wrapper in part.children_named("Parts") {
        children.extend(
            wrapper
                .children_named("Part")
                .map(|child| walk_part(child, total_hp, body_hp, root_mass)),
        );
    }

    json!({
        "name": name,
        "class": class,
        "damageMax": damage_max,
        "mass": mass,
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn port_classifier_disambiguates() {
        assert_eq!(classify_port("hardpoint_weapon_rack", "WeaponRack_S2"), "WeaponRack");
        assert_eq!(classify_port("hardpoint_qig", "KRIG_QIG_S1"), "QuantumInterdictionGenerator");
        assert_eq!(classify_port("hardpoint_quantum_drive", "QDRV_Atlas"), "QuantumDrive");
        assert_eq!(classify_port("hardpoint_missile_rack", "MRCK_S3"), "MissileRack");
        assert_eq!(classify_port("hardpoint_gun_gimbal", "Mount_Gimbal_S2"), "Gimbal");
        assert_eq!(classify_port("turret_top", "BEHR_Turret_S4"), "Turret");
        assert_eq!(classify_port("hardpoint_shield_generator", "SHLD_Guard"), "Shield");
        assert_eq!(classify_port("hardpoint_power_plant", "POWR_Core"), "PowerPlant");
        assert_eq!(classify_port("hardpoint_controller_flight", "IFCS_X"), "FlightController");
        assert_eq!(classify_port("hardpoint_weapon_left", "BEHR_LaserCannon"), "WeaponGun");
        assert_eq!(classify_port("hardpoint_thing", "Mystery_Item"), "Other");
    }

    #[test]
    fn display_fallback_drops_known_prefixes() {
        assert_eq!(ship_display_fallback("RSI_Aurora_MR"), "Aurora MR");
        assert_eq!(ship_display_fallback("NOPE_Thing_X"), "NOPE Thing X");
    }

    fn part(name: &str, class: &str, damage: Option<&str>, children: Vec<XmlNode>) -> XmlNode {
        let mut attributes = vec![
            ("name".to_string(), name.to_string()),
            ("class".to_string(), class.to_string()),
        ];
        if let Some(damage) = damage {
            attributes.push(("damageMax".to_string(), damage.to_string()));
        }
        XmlNode {
            tag: "Part".to_string(),
            attributes,
            children,
            content: None,
        }
    }

    #[test]
    fn parts_summary_sums_damage_and_skips_item_ports() {
        let mut hull = part(
            "Hull",
            "Animated",
            Some("500"),
            vec![
                part("Body", "Animated", Some("1200"), vec![]),
                part("hardpoint_gun", "ItemPort", Some("9999"), vec![]),
                part("Nose", "Animated", Some("300"), vec![]),
            ],
        );
        hull.attributes.push(("mass".to_string(), "25000".to_string()));
        let root = XmlNode {
            tag: "Vehicle".to_string(),
            attributes: vec![],
            children: vec![XmlNode {
                tag: "Parts".to_string(),
                attributes: vec![],
                children: vec![hull],
                content: None,
            }],
            content: None,
        };

        let summary = summarize_parts(&root).expect("parts present");
        assert_eq!(summary.total_hp, 2000.0);
        assert_eq!(summary.body_hp, Some(1200.0));
        assert_eq!(summary.root_mass, Some(25000.0));
    }
}
