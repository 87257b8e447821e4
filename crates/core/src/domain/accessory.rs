use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessoryId(pub i64);

/// Catalogue entry for a consumable or attachment that rides along with
/// hired equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessory {
    pub id: AccessoryId,
    pub code: String,
    pub name: String,
}

/// Default rows are derived server-side from the equipment basket and
/// replaced wholesale on every recalculation. Optional rows are added
/// by the operator and survive recalculation untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryKind {
    Default,
    Optional,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySelection {
    pub accessory_id: AccessoryId,
    pub name: String,
    pub quantity: u32,
    pub kind: AccessoryKind,
}

impl AccessorySelection {
    pub fn derived(accessory_id: AccessoryId, name: impl Into<String>, quantity: u32) -> Self {
        Self {
            accessory_id,
            name: name.into(),
            quantity,
            kind: AccessoryKind::Default,
        }
    }

    pub fn optional(accessory: &Accessory, quantity: u32) -> Self {
        Self {
            accessory_id: accessory.id,
            name: accessory.name.clone(),
            quantity,
            kind: AccessoryKind::Optional,
        }
    }
}
