//! Component extraction.
//!
//! Classifies every entity record under an SCItem path with a first-match
//! path-regex table, walks the decoded `Components` list once dispatching
//! on the decoded struct type, and emits one typed row per record with
//! derived weapon stats recomputed from the extracted primitives.

use std::sync::LazyLock;

use regex::Regex;
use starforge_forge::{ForgeView, InstanceReader, Value};
use tracing::warn;

use crate::error::{ExtractError, ExtractResult};
use crate::index::{ENTITY_CLASS_STRUCT, Indexes};
use crate::options::{ExtractOptions, Phase};
use crate::rows::{ComponentRow, to_row};
use crate::sink::RowSink;
use crate::tables::{
    COMPONENT_SKIP_SUBSTRINGS, FPS_WEAPON_TOKENS, manufacturer_for_class, resolve_component_name,
};
use crate::walk::{components, read_record};

/// Component records are read at this depth: deep enough for ammo and
/// pulse sub-records, shallow enough to stay cheap.
const COMPONENT_READ_DEPTH: usize = 4;

/// First-match category table over lowercased source paths. Overlaps are
/// resolved by order: racks before missiles, unmanned before manned
/// turrets, interdiction before quantum drives.
static CATEGORIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("WeaponGun", r"/weapons/"),
        ("Shield", r"shield"),
        ("PowerPlant", r"powerplant|power_plant"),
        ("Cooler", r"cooler"),
        (
            "QuantumInterdictionGenerator",
            r"quantuminterdiction|quantum_interdiction|(^|[/_])qig([/_]|$)",
        ),
        ("QuantumDrive", r"quantumdrive|quantum_drive|qdrive"),
        ("MissileRack", r"missile_?racks?"),
        ("Missile", r"missiles?"),
        ("Thruster", r"thruster"),
        ("Radar", r"radar"),
        ("Countermeasure", r"countermeasure"),
        ("FuelIntake", r"fuel_?intake"),
        ("FuelTank", r"fuel_?tank"),
        ("LifeSupport", r"life_?support"),
        ("EMP", r"(^|[/_])emp([/_]|$)"),
        ("Gimbal", r"gimbal"),
        ("TurretUnmanned", r"remote_?turret|unmanned"),
        ("Turret", r"turret"),
        ("MiningLaser", r"mining"),
        ("SalvageHead", r"salvage"),
        ("TractorBeam", r"tractor"),
        ("SelfDestruct", r"self_?destruct"),
    ]
    .iter()
    .map(|(name, pattern)| {
        (
            *name,
            Regex::new(pattern).unwrap_or_else(|_| Regex::new("$^").expect("fallback regex")),
        )
    })
    .collect()
});

/// Category of an SCItem source path, first match wins.
pub fn classify_component_path(path: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(_, pattern)| pattern.is_match(path))
        .map(|(name, _)| *name)
}

/// Whether the class/path names a personal FPS weapon.
fn is_fps_weapon(class_lower: &str, path: &str) -> bool {
    FPS_WEAPON_TOKENS
        .iter()
        .any(|t| class_lower.contains(t) || path.contains(t))
}

/// The six damage channels, in their canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DamageChannels([f64; 6]);

impl DamageChannels {
    const FIELDS: [&'static str; 6] = [
        "DamagePhysical",
        "DamageEnergy",
        "DamageDistortion",
        "DamageThermal",
        "DamageBiochemical",
        "DamageStun",
    ];

    fn read(value: &Value) -> Self {
        // Damage blocks appear both as a bare info object and as a
        // one-element array wrapping it.
        let info = match value {
            Value::Array(_) => value.items().next().unwrap_or(value),
            other => other,
        };
        let mut out = [0.0; 6];
        for (slot, field) in out.iter_mut().zip(Self::FIELDS) {
            *slot = info.field(field).and_then(Value::as_f64).unwrap_or(0.0);
        }
        Self(out)
    }

    fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    fn max_elementwise(&self, other: &Self) -> Self {
        let mut out = [0.0; 6];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i].max(other.0[i]);
        }
        Self(out)
    }
}

/// Try a chain of field spellings, returning the first numeric hit.
fn field_f64(value: &Value, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .find_map(|n| value.field(n).and_then(Value::as_f64))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

/// Component extraction pass.
pub struct ComponentExtractor<'a> {
    view: &'a ForgeView,
    indexes: &'a Indexes,
    reader: InstanceReader<'a>,
    options: &'a ExtractOptions,
}

impl<'a> ComponentExtractor<'a> {
    /// Extractor over one decoded view.
    pub fn new(view: &'a ForgeView, indexes: &'a Indexes, options: &'a ExtractOptions) -> Self {
        let reader = InstanceReader::new(view)
            .with_max_depth(COMPONENT_READ_DEPTH.max(options.max_instance_depth))
            .with_array_cap(options.array_element_cap);
        Self {
            view,
            indexes,
            reader,
            options,
        }
    }

    /// Run the pass, pushing one batch of component rows into the sink.
    pub fn extract(&self, sink: &mut dyn RowSink) -> ExtractResult<u64> {
        let Some(entity_struct) = self.view.find_struct(ENTITY_CLASS_STRUCT) else {
            return Ok(0);
        };

        let mut rows = Vec::new();
        for (position, record) in self.view.records().iter().enumerate() {
            if record.struct_index != entity_struct {
                continue;
            }
            let path = record.file_name.to_lowercase().replace('\\', "/");
            if !path.contains("scitem") {
                continue;
            }
            let class_lower = record.name.to_lowercase();
            if COMPONENT_SKIP_SUBSTRINGS
                .iter()
                .any(|s| class_lower.contains(s) || path.contains(s))
            {
                continue;
            }
            let Some(category) = classify_component_path(&path) else {
                continue;
            };
            if category == "WeaponGun" && is_fps_weapon(&class_lower, &path) {
                continue;
            }

            match self.extract_record(position, category, &path) {
                Some(row) => rows.push(to_row(&row)),
                None => warn!(class = %record.name, "component record did not decode"),
            }
        }

        sink.upsert_batch("components", &rows)
            .map_err(|message| ExtractError::Sink {
                table: "components".into(),
                message,
            })?;
        self.options
            .report(Phase::Components, rows.len() as u64, rows.len() as u64);
        Ok(rows.len() as u64)
    }

    fn extract_record(
        &self,
        position: usize,
        category: &'static str,
        path: &str,
    ) -> Option<ComponentRow> {
        let record = self.view.records().get(position)?;
        let entity = read_record(self.view, &self.reader, position);
        if entity.is_null() {
            return None;
        }

        let mut row = ComponentRow {
            uuid: record.guid.to_string(),
            class_name: record.name.clone(),
            component_type: category.to_string(),
            manufacturer: manufacturer_for_class(&record.name).map(str::to_string),
            game_data: entity.to_json(),
            ..ComponentRow::default()
        };

        for component in components(&entity) {
            match component.type_name() {
                Some("SAttachableComponentParams") => self.attachable(component, &mut row),
                Some("EntityComponentPowerConnection") => {
                    row.power_base = field_f64(component, &["PowerBase", "powerBase"]);
                    row.power_draw = field_f64(component, &["PowerDraw", "powerDraw"]);
                    if category == "PowerPlant" {
                        row.power_output = row.power_draw;
                    }
                }
                Some("EntityComponentHeatConnection") => {
                    row.heat_generation = field_f64(
                        component,
                        &["HeatGeneration", "ThermalEnergyBase", "heatGeneration"],
                    );
                }
                Some("SHealthComponentParams") => {
                    row.hp = field_f64(component, &["Health", "MaxHealth", "health"]);
                }
                Some("SCItemWeaponComponentParams") => self.weapon(component, &mut row),
                Some("SAmmoContainerComponentParams") => self.ammo_container(component, &mut row),
                Some("SCItemShieldGeneratorParams") => {
                    row.shield_hp = field_f64(component, &["MaxShieldHealth", "ShieldEmitterMaxHealth"]);
                    row.shield_regen = field_f64(component, &["MaxShieldRegen", "ShieldEmitterRegen"]);
                }
                Some("SCItemCoolerParams") => {
                    row.cooling_rate = field_f64(component, &["CoolingRate", "coolingRate"]);
                }
                Some("SCItemQuantumDriveParams") => self.quantum_drive(component, &mut row),
                Some("SCItemMissileParams") => self.missile(component, &mut row),
                Some("SCItemThrusterParams") => {
                    row.thrust_capacity = field_f64(component, &["thrustCapacity", "ThrustCapacity"]);
                    row.thruster_type = infer_thruster_type(path).map(str::to_string);
                }
                Some("SCItemRadarComponentParams" | "SSCItemRadarParams") => {
                    self.radar(component, &mut row);
                }
                Some("SCItemCounterMeasureParams") => {
                    if row.ammo_count.is_none() {
                        row.ammo_count =
                            field_f64(component, &["initialAmmoCount", "capacity", "maxAmmoCount"]);
                    }
                }
                Some("SCItemFuelTankParams") => {
                    row.fuel_capacity = field_f64(component, &["capacity", "Capacity"]);
                }
                Some("SCItemFuelIntakeParams") => {
                    row.fuel_push_rate =
                        field_f64(component, &["fuelPushRate", "FuelPushRate"]).map(round6);
                }
                Some("SCItemEMPParams") => {
                    if row.damage_distortion.is_none() {
                        row.damage_distortion =
                            field_f64(component, &["distortionDamage", "empDamage"]);
                    }
                }
                Some("SCItemQuantumInterdictionGeneratorParams") => {
                    if let Some(pulse) = component.field("quantumInterdictionPulseSettings") {
                        row.interdiction_charge_time =
                            field_f64(pulse, &["chargeTimeSecs", "chargeTime"]);
                        row.interdiction_radius = field_f64(pulse, &["radiusMeters", "radius"]);
                    }
                }
                _ => {}
            }
        }

        apply_derived_stats(&mut row);
        Some(row)
    }

    fn attachable(&self, component: &Value, row: &mut ComponentRow) {
        let attach = component.field("AttachDef").unwrap_or(component);
        row.size = attach.field("Size").and_then(Value::as_i64);
        row.attach_type = attach
            .field("Type")
            .and_then(Value::as_str)
            .map(str::to_string);
        row.attach_sub_type = attach
            .field("SubType")
            .and_then(Value::as_str)
            .map(str::to_string);
        row.grade = attach
            .field("Grade")
            .and_then(Value::as_i64)
            .and_then(grade_letter);

        let decoded = attach
            .path(&["Localization", "Name"])
            .or_else(|| attach.field("Name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let localised = self.options.localise(&row.class_name, decoded);
        row.name = if localised.is_empty()
            || localised.starts_with('@')
            || localised.starts_with("LOC_")
        {
            resolve_component_name(&row.class_name)
        } else {
            localised
        };
    }

    fn weapon(&self, component: &Value, row: &mut ComponentRow) {
        let first_action = component
            .field("fireActions")
            .and_then(|a| a.items().next());
        let Some(action) = first_action else { return };

        row.fire_rate = field_f64(action, &["fireRate", "FireRate"]);
        row.heat_per_shot = field_f64(action, &["heatPerShot", "HeatPerShot"]).map(round4);
        row.pellet_count = field_f64(action, &["pelletCount", "pelletsPerShot"]);

        // Burst-sequence weapons carry their numbers per sequence entry.
        if row.fire_rate.is_none() {
            let mut rate_sum = 0.0;
            let mut any = false;
            for entry in action.field("sequenceEntries").map_or([].iter(), Value::items) {
                let Some(sub) = entry.field("weaponAction") else {
                    continue;
                };
                if let Some(rate) = field_f64(sub, &["fireRate", "FireRate"]) {
                    rate_sum += rate;
                    any = true;
                }
                if row.heat_per_shot.is_none() {
                    row.heat_per_shot =
                        field_f64(sub, &["heatPerShot", "HeatPerShot"]).map(round4);
                }
                if row.pellet_count.is_none() {
                    row.pellet_count = field_f64(sub, &["pelletCount", "pelletsPerShot"]);
                }
            }
            if any {
                row.fire_rate = Some(rate_sum);
            }
        }
    }

    fn ammo_container(&self, component: &Value, row: &mut ComponentRow) {
        row.ammo_count =
            field_f64(component, &["maxAmmoCount", "ammoCount", "initialAmmoCount"]);

        let Some(guid) = component.field("ammoParamsRecord").and_then(Value::as_guid) else {
            return;
        };
        let Some(position) = self.indexes.record_by_guid(&guid) else {
            return;
        };
        let ammo = read_record(self.view, &self.reader, position);
        if ammo.is_null() {
            return;
        }

        row.ammo_speed = field_f64(&ammo, &["speed", "Speed"]);
        row.ammo_lifetime = field_f64(&ammo, &["lifetime", "Lifetime"]).map(round4);
        if let (Some(speed), Some(lifetime)) = (row.ammo_speed, row.ammo_lifetime) {
            row.ammo_range = Some(round2(speed * lifetime));
        }

        let direct = ammo
            .path(&["projectileParams", "damage"])
            .map(DamageChannels::read)
            .unwrap_or_default();
        let detonation = ammo
            .path(&[
                "projectileParams",
                "detonationParams",
                "explosionParams",
                "damage",
            ])
            .map(DamageChannels::read)
            .unwrap_or_default();

        // Placeholder direct-hit blocks defer to the detonation damage.
        let channels = if direct.total() <= 0.0 && detonation.total() > 0.0 {
            direct.max_elementwise(&detonation)
        } else {
            direct
        };

        if channels.total() > 0.0 {
            let [physical, energy, distortion, thermal, biochemical, stun] = channels.0;
            row.damage_physical = Some(round2(physical));
            row.damage_energy = Some(round2(energy));
            row.damage_distortion = Some(round2(distortion));
            row.damage_thermal = Some(round2(thermal));
            row.damage_biochemical = Some(round2(biochemical));
            row.damage_stun = Some(round2(stun));
            row.weapon_damage = Some(round2(channels.total()));
        }
    }

    fn quantum_drive(&self, component: &Value, row: &mut ComponentRow) {
        row.quantum_speed = field_f64(component, &["driveSpeed", "DriveSpeed"])
            .or_else(|| component.path(&["params", "driveSpeed"]).and_then(Value::as_f64));
        row.quantum_fuel_rate =
            field_f64(component, &["quantumFuelRequirement", "QuantumFuelRequirement"])
                .map(round6);
        row.quantum_spline_speed = component
            .path(&["splineJumpParams", "speed"])
            .or_else(|| component.path(&["params", "splineJumpParams", "speed"]))
            .and_then(Value::as_f64);
    }

    fn missile(&self, component: &Value, row: &mut ComponentRow) {
        row.missile_speed = component
            .path(&["GCSParams", "linearSpeed"])
            .or_else(|| component.path(&["GCSParams", "speed"]))
            .and_then(Value::as_f64);
        if let Some(targeting) = component.field("targetingParams") {
            row.missile_lock_time =
                field_f64(targeting, &["lockTime", "lockingTime"]).map(round4);
            row.missile_lock_range =
                field_f64(targeting, &["lockRangeMax", "lockingRange", "maxLockRange"]);
        }
        if let Some(explosion) = component.path(&["explosionParams", "damage"]) {
            let channels = DamageChannels::read(explosion);
            if channels.total() > 0.0 {
                let [physical, energy, distortion, thermal, biochemical, stun] = channels.0;
                row.damage_physical = Some(round2(physical));
                row.damage_energy = Some(round2(energy));
                row.damage_distortion = Some(round2(distortion));
                row.damage_thermal = Some(round2(thermal));
                row.damage_biochemical = Some(round2(biochemical));
                row.damage_stun = Some(round2(stun));
                row.weapon_damage = Some(round2(channels.total()));
            }
        }
    }

    fn radar(&self, component: &Value, row: &mut ComponentRow) {
        let mut ranges = Vec::new();
        for entry in component
            .field("signatureDetection")
            .map_or([].iter(), Value::items)
        {
            if entry.field("permitPassiveDetection").and_then(Value::as_bool) != Some(true) {
                continue;
            }
            if let Some(range) = field_f64(entry, &["detectionRange", "range"]) {
                ranges.push(range);
            }
        }
        if !ranges.is_empty() {
            let mean = ranges.iter().sum::<f64>() / ranges.len() as f64;
            row.radar_detection_range = Some(round2(mean));
        }
    }
}

/// Grade 0.. rendered as A..K.
fn grade_letter(grade: i64) -> Option<String> {
    u8::try_from(grade)
        .ok()
        .filter(|g| *g <= 10)
        .map(|g| char::from(b'A' + g).to_string())
}

/// Thruster kind from source-path keywords.
fn infer_thruster_type(path: &str) -> Option<&'static str> {
    const KEYWORDS: &[(&str, &str)] = &[
        ("retro", "Retro"),
        ("vtol", "VTOL"),
        ("joint", "Joint"),
        ("mav", "Maneuver"),
        ("maneuver", "Maneuver"),
        ("fixed", "Fixed"),
        ("main", "Main"),
    ];
    KEYWORDS
        .iter()
        .find(|(keyword, _)| path.contains(keyword))
        .map(|(_, name)| *name)
}

/// Recompute every derived weapon stat from the extracted primitives.
fn apply_derived_stats(row: &mut ComponentRow) {
    let (Some(damage), Some(fire_rate)) = (row.weapon_damage, row.fire_rate) else {
        return;
    };
    if fire_rate <= 0.0 {
        return;
    }

    let pellets = row.pellet_count.unwrap_or(0.0).max(1.0);
    let shots_per_second = fire_rate / 60.0;
    let alpha = damage * pellets;
    let dps = alpha * shots_per_second;
    row.alpha_damage = Some(round2(alpha));
    row.dps = Some(round2(dps));

    let heat = row.heat_per_shot.unwrap_or(0.0);
    if heat > 0.0 {
        // The division is exact on paper; tolerate float error before the
        // floor so 1/0.05 still counts 20 shots.
        let shots_to_overheat = ((1.0 / heat) + 1e-9).floor().max(1.0);
        let time_to_overheat = shots_to_overheat / shots_per_second;
        let burst_damage = alpha * shots_to_overheat;
        let burst_dps = burst_damage / time_to_overheat;
        let heat_per_second = heat * shots_per_second;
        let estimated_cooldown = (1.0 / (heat_per_second * 0.4)).max(1.0);
        let sustained_dps = burst_damage / (time_to_overheat + estimated_cooldown);

        row.shots_to_overheat = Some(shots_to_overheat);
        row.time_to_overheat = Some(round4(time_to_overheat));
        row.burst_damage = Some(round2(burst_damage));
        row.burst_dps = Some(round2(burst_dps));
        row.heat_per_second = Some(round4(heat_per_second));
        row.estimated_cooldown = Some(round2(estimated_cooldown));
        row.sustained_dps = Some(round2(sustained_dps));
    } else {
        row.burst_dps = Some(round2(dps));
        row.sustained_dps = Some(round2(dps));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_table_resolves_overlaps_by_order() {
        assert_eq!(
            classify_component_path("data/objects/scitem/ships/weapons/behr_gun.xml"),
            Some("WeaponGun")
        );
        assert_eq!(
            classify_component_path("scitem/ships/weapon_mounts/missile_racks/rack_s3.xml"),
            Some("MissileRack")
        );
        assert_eq!(
            classify_component_path("scitem/ships/missiles/talon_s2.xml"),
            Some("Missile")
        );
        assert_eq!(
            classify_component_path("scitem/ships/remote_turrets/ball_turret.xml"),
            Some("TurretUnmanned")
        );
        assert_eq!(
            classify_component_path("scitem/ships/turrets/manned_x.xml"),
            Some("Turret")
        );
        assert_eq!(classify_component_path("scitem/ships/nothing_here.xml"), None);
    }

    #[test]
    fn derived_stats_match_the_reference_example() {
        let mut row = ComponentRow {
            weapon_damage: Some(50.0),
            fire_rate: Some(600.0),
            pellet_count: Some(1.0),
            heat_per_shot: Some(0.05),
            ..ComponentRow::default()
        };
        apply_derived_stats(&mut row);

        assert_eq!(row.alpha_damage, Some(50.0));
        assert_eq!(row.dps, Some(500.0));
        assert_eq!(row.shots_to_overheat, Some(20.0));
        assert_eq!(row.time_to_overheat, Some(2.0));
        assert_eq!(row.burst_damage, Some(1000.0));
        assert_eq!(row.burst_dps, Some(500.0));
        assert_eq!(row.heat_per_second, Some(0.5));
        assert_eq!(row.estimated_cooldown, Some(5.0));
        assert_eq!(row.sustained_dps, Some(round2(1000.0 / 7.0)));
    }

    #[test]
    fn no_heat_means_flat_dps_everywhere() {
        let mut row = ComponentRow {
            weapon_damage: Some(30.0),
            fire_rate: Some(120.0),
            pellet_count: Some(4.0),
            ..ComponentRow::default()
        };
        apply_derived_stats(&mut row);

        // alpha = 30 * 4, dps = 120 * 2/s
        assert_eq!(row.alpha_damage, Some(120.0));
        assert_eq!(row.dps, Some(240.0));
        assert_eq!(row.burst_dps, Some(240.0));
        assert_eq!(row.sustained_dps, Some(240.0));
        assert_eq!(row.shots_to_overheat, None);
    }

    #[test]
    fn grade_letters_run_a_to_k() {
        assert_eq!(grade_letter(0).as_deref(), Some("A"));
        assert_eq!(grade_letter(2).as_deref(), Some("C"));
        assert_eq!(grade_letter(10).as_deref(), Some("K"));
        assert_eq!(grade_letter(11), None);
        assert_eq!(grade_letter(-1), None);
    }

    #[test]
    fn thruster_kind_from_path_keywords() {
        assert_eq!(infer_thruster_type("ships/thrusters/retro_thruster_s2.xml"), Some("Retro"));
        assert_eq!(infer_thruster_type("ships/thrusters/vtol_s1.xml"), Some("VTOL"));
        assert_eq!(infer_thruster_type("ships/thrusters/main_s3.xml"), Some("Main"));
        assert_eq!(infer_thruster_type("ships/thrusters/plain.xml"), None);
    }

    #[test]
    fn fps_weapons_are_not_ship_guns() {
        assert!(is_fps_weapon("behr_rifle_ballistic_01", "scitem/fps/weapons/x.xml"));
        assert!(!is_fps_weapon("behr_laser_s3", "scitem/ships/weapons/x.xml"));
    }
}
