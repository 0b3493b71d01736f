//! Extracted row shapes.
//!
//! Flat structs with explicit numeric columns; every row carries the
//! source record GUID and an opaque `game_data` blob with the full decoded
//! tree for downstream consumers. `None` fields serialise as absent.

use serde::Serialize;
use serde_json::Value as Json;

/// One extracted component.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentRow {
    /// Source record GUID
    pub uuid: String,
    /// Entity class name
    pub class_name: String,
    /// Display name
    pub name: String,
    /// Component category from the path classifier
    pub component_type: String,
    /// Manufacturer display name from the class prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Declared type from the attach definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_type: Option<String>,
    /// Declared sub-type from the attach definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_sub_type: Option<String>,
    /// Item size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Item grade rendered A..K
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    /// Hit points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
    /// Idle power draw
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_base: Option<f64>,
    /// Active power draw
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_draw: Option<f64>,
    /// Generated power, power plants only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_output: Option<f64>,
    /// Thermal output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_generation: Option<f64>,
    /// Rounds per minute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_rate: Option<f64>,
    /// Summed per-hit damage over all channels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon_damage: Option<f64>,
    /// Pellets per shot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pellet_count: Option<f64>,
    /// Heat added per shot, normalised 0..1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_per_shot: Option<f64>,
    /// Damage of one trigger pull
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_damage: Option<f64>,
    /// Continuous damage per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dps: Option<f64>,
    /// Damage per second until overheat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_dps: Option<f64>,
    /// Long-run damage per second including the cooldown window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustained_dps: Option<f64>,
    /// Shots until overheat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shots_to_overheat: Option<f64>,
    /// Seconds of fire until overheat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_overheat: Option<f64>,
    /// Total damage of one heat-bounded burst
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_damage: Option<f64>,
    /// Heat added per second of fire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_per_second: Option<f64>,
    /// Estimated seconds to cool after an overheat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cooldown: Option<f64>,
    /// Magazine capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ammo_count: Option<f64>,
    /// Projectile speed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ammo_speed: Option<f64>,
    /// Projectile lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ammo_lifetime: Option<f64>,
    /// Projectile range = speed × lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ammo_range: Option<f64>,
    /// Damage channels: physical
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_physical: Option<f64>,
    /// Damage channels: energy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_energy: Option<f64>,
    /// Damage channels: distortion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_distortion: Option<f64>,
    /// Damage channels: thermal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_thermal: Option<f64>,
    /// Damage channels: biochemical
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_biochemical: Option<f64>,
    /// Damage channels: stun
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_stun: Option<f64>,
    /// Shield pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield_hp: Option<f64>,
    /// Shield regeneration per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shield_regen: Option<f64>,
    /// Cooler throughput
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_rate: Option<f64>,
    /// Quantum drive cruise speed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantum_speed: Option<f64>,
    /// Quantum fuel burned per megametre
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantum_fuel_rate: Option<f64>,
    /// Spline-jump stage speed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantum_spline_speed: Option<f64>,
    /// Missile lock time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missile_lock_time: Option<f64>,
    /// Missile lock range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missile_lock_range: Option<f64>,
    /// Missile cruise speed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missile_speed: Option<f64>,
    /// Thruster thrust capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thrust_capacity: Option<f64>,
    /// Thruster kind inferred from the file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thruster_type: Option<String>,
    /// Mean passive detection range over permitted signatures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radar_detection_range: Option<f64>,
    /// Fuel tank capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_capacity: Option<f64>,
    /// Fuel intake push rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_push_rate: Option<f64>,
    /// Interdiction pulse charge seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interdiction_charge_time: Option<f64>,
    /// Interdiction pulse radius
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interdiction_radius: Option<f64>,
    /// Full decoded record tree
    pub game_data: Json,
}

/// One extracted ship or ground vehicle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShipRow {
    /// Source record GUID
    pub uuid: String,
    /// Entity class name
    pub class_name: String,
    /// Display name
    pub name: String,
    /// Entity that owned the canonical loadout
    pub loadout_entity: String,
    /// Manufacturer display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Career display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    /// Role display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Crew seats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crew_size: Option<i64>,
    /// Declared item size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Vehicle mass in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    /// Bounding box X
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Bounding box Y
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam: Option<f64>,
    /// Bounding box Z
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Hull hit points summed from the damage model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_hp: Option<f64>,
    /// Hit points of the `Body` part
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_hp: Option<f64>,
    /// Insurance expediting fee
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_expedite_fee: Option<f64>,
    /// Insurance base wait in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_wait_minutes: Option<f64>,
    /// Insurance mandatory wait in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_mandatory_wait_minutes: Option<f64>,
    /// Full decoded entity tree plus the sidecar parts tree
    pub game_data: Json,
}

/// One loadout port (or port child) on a ship.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShipPortRow {
    /// Owning ship GUID
    pub ship_uuid: String,
    /// Port name
    pub port_name: String,
    /// Parent port name for child rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_port: Option<String>,
    /// Equipped entity class
    pub equipped_class: String,
    /// Classified port type
    pub port_type: String,
    /// Port display name from the port container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Minimum accepted item size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i64>,
    /// Maximum accepted item size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
    /// Accepted item types
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepted_types: Vec<String>,
    /// Tags an item must carry to fit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_tags: Vec<String>,
    /// Whether the player may refit the port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
}

/// One ship module slot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShipModuleRow {
    /// Owning ship GUID
    pub ship_uuid: String,
    /// Module port name
    pub port_name: String,
    /// Equipped module class
    pub equipped_class: String,
}

/// One paint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PaintRow {
    /// Paint record GUID
    pub paint_uuid: String,
    /// Paint entity class
    pub paint_class_name: String,
    /// Paint display name
    pub paint_name: String,
    /// Ship short name the paint applies to
    pub ship_short_name: String,
}

/// One shop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShopRow {
    /// Shop record GUID
    pub uuid: String,
    /// Shop entity class
    pub class_name: String,
    /// Display name
    pub name: String,
    /// Inferred shop type
    pub shop_type: String,
}

/// One FPS item.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemRow {
    /// Source record GUID
    pub uuid: String,
    /// Entity class name
    pub class_name: String,
    /// Display name
    pub name: String,
    /// Item category from the path classifier
    pub item_type: String,
    /// Item size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Mass in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    /// Hit points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
    /// Personal-weapon fire rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_rate: Option<f64>,
    /// Personal-weapon per-shot damage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon_damage: Option<f64>,
    /// Armour damage-resistance multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_resistance: Option<f64>,
    /// Clothing minimum operating temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    /// Clothing maximum operating temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    /// Full decoded record tree
    pub game_data: Json,
}

/// One commodity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommodityRow {
    /// Source record GUID
    pub uuid: String,
    /// Entity class name
    pub class_name: String,
    /// Display name
    pub name: String,
    /// Standard cargo units occupied by one unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scu_occupancy: Option<f64>,
    /// Full decoded record tree
    pub game_data: Json,
}

/// One catalogue link from the cross-reference pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogueLink {
    /// External catalogue id
    pub catalogue_id: String,
    /// Linked ship GUID
    pub ship_uuid: String,
    /// Pass that produced the link: 1 exact, 2 alias, 3 token overlap
    pub pass: u8,
}

/// Serialise a row to the JSON shape the sink receives.
pub fn to_row<T: Serialize>(row: &T) -> Json {
    serde_json::to_value(row).unwrap_or(Json::Null)
}
