//! Equipment basket edits and the accessory rows derived from them.
//!
//! Every change to the basket either issues an [`AccessoryRequest`]
//! (basket still has rows) or synchronously drops the derived default
//! rows (basket just became empty). Default rows coming back from the
//! backend replace the previous default set wholesale; operator-added
//! optional rows are never touched by a recalculation.

use crate::domain::accessory::{Accessory, AccessoryId, AccessoryKind, AccessorySelection};
use crate::domain::equipment::{
    EquipmentLine, EquipmentSelection, EquipmentType, EquipmentTypeId, EquipmentUnit,
    EquipmentUnitId,
};
use crate::errors::ApiError;
use crate::wizard::lookups::LookupDisposition;
use crate::wizard::state::WizardState;

/// Snapshot a derivation request was issued for. The response only
/// applies while the basket still projects to exactly these lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessoryRequest {
    pub(crate) seq: u64,
    pub lines: Vec<EquipmentLine>,
}

impl WizardState {
    /// Type-and-quantity projection of the current basket.
    pub fn equipment_lines(&self) -> Vec<EquipmentLine> {
        self.equipment
            .iter()
            .map(EquipmentSelection::line)
            .collect()
    }

    /// Adds a catalogue type to the basket. Adding a type that is
    /// already present bumps its quantity instead of growing a second
    /// row.
    pub fn add_generic_equipment(&mut self, equipment: EquipmentType) -> Option<AccessoryRequest> {
        let type_id = equipment.id;
        let existing = self.equipment.iter().position(|selection| {
            matches!(selection, EquipmentSelection::Generic { equipment, .. } if equipment.id == type_id)
        });

        match existing {
            Some(index) => {
                if let EquipmentSelection::Generic { quantity, .. } = &mut self.equipment[index] {
                    *quantity += 1;
                }
            }
            None => self.equipment.push(EquipmentSelection::Generic {
                equipment,
                quantity: 1,
            }),
        }

        Some(self.issue_accessory_request())
    }

    /// Pins a specific fleet unit. Units always land as their own row,
    /// even when the same unit is added twice.
    pub fn add_unit_equipment(&mut self, unit: EquipmentUnit) -> Option<AccessoryRequest> {
        self.equipment.push(EquipmentSelection::Unit { unit });
        Some(self.issue_accessory_request())
    }

    /// Sets the quantity on a generic row; zero removes the row. No-op
    /// when the type is not in the basket or already at that quantity.
    pub fn set_generic_quantity(
        &mut self,
        type_id: EquipmentTypeId,
        quantity: u32,
    ) -> Option<AccessoryRequest> {
        let index = self.equipment.iter().position(|selection| {
            matches!(selection, EquipmentSelection::Generic { equipment, .. } if equipment.id == type_id)
        })?;

        if quantity == 0 {
            self.equipment.remove(index);
            return self.after_basket_shrank();
        }

        match &mut self.equipment[index] {
            EquipmentSelection::Generic {
                quantity: current, ..
            } => {
                if *current == quantity {
                    return None;
                }
                *current = quantity;
            }
            EquipmentSelection::Unit { .. } => return None,
        }
        Some(self.issue_accessory_request())
    }

    pub fn remove_generic_equipment(&mut self, type_id: EquipmentTypeId) -> Option<AccessoryRequest> {
        self.set_generic_quantity(type_id, 0)
    }

    /// Removes the first row pinning the given unit.
    pub fn remove_unit_equipment(&mut self, unit_id: EquipmentUnitId) -> Option<AccessoryRequest> {
        let index = self.equipment.iter().position(|selection| {
            matches!(selection, EquipmentSelection::Unit { unit } if unit.id == unit_id)
        })?;
        self.equipment.remove(index);
        self.after_basket_shrank()
    }

    fn after_basket_shrank(&mut self) -> Option<AccessoryRequest> {
        if self.equipment.is_empty() {
            // Nothing left to derive from: drop the default rows right
            // here rather than round-tripping an empty request.
            self.accessories
                .retain(|row| row.kind == AccessoryKind::Optional);
            self.pending.accessories = false;
            return None;
        }
        Some(self.issue_accessory_request())
    }

    fn issue_accessory_request(&mut self) -> AccessoryRequest {
        self.sequences.accessories += 1;
        self.pending.accessories = true;
        AccessoryRequest {
            seq: self.sequences.accessories,
            lines: self.equipment_lines(),
        }
    }

    /// Applies a derivation response: replaces the default rows and
    /// leaves optional rows untouched. Discarded outright when the
    /// basket no longer matches the snapshot the request was built
    /// from.
    pub fn apply_auto_accessories(
        &mut self,
        request: &AccessoryRequest,
        outcome: Result<Vec<AccessorySelection>, ApiError>,
    ) -> LookupDisposition {
        if request.seq == self.sequences.accessories {
            self.pending.accessories = false;
        }
        if request.lines != self.equipment_lines() {
            return LookupDisposition::DiscardedStale;
        }

        match outcome {
            Ok(defaults) => {
                let mut rows: Vec<AccessorySelection> = defaults
                    .into_iter()
                    .map(|mut row| {
                        row.kind = AccessoryKind::Default;
                        row
                    })
                    .collect();
                rows.extend(
                    self.accessories
                        .drain(..)
                        .filter(|row| row.kind == AccessoryKind::Optional),
                );
                self.accessories = rows;
                LookupDisposition::Applied
            }
            // Keep whatever accessory rows we had; the basket edit
            // itself has already been applied.
            Err(_) => LookupDisposition::Failed,
        }
    }

    /// Adds an operator-chosen accessory row. Adding the same optional
    /// accessory again bumps its quantity.
    pub fn add_optional_accessory(&mut self, accessory: &Accessory) {
        let existing = self.accessories.iter().position(|row| {
            row.accessory_id == accessory.id && row.kind == AccessoryKind::Optional
        });
        match existing {
            Some(index) => self.accessories[index].quantity += 1,
            None => self
                .accessories
                .push(AccessorySelection::optional(accessory, 1)),
        }
    }

    pub fn increment_accessory(&mut self, accessory_id: AccessoryId, kind: AccessoryKind) {
        if let Some(row) = self.accessory_row_mut(accessory_id, kind) {
            row.quantity += 1;
        }
    }

    /// Decrements towards zero. The row is kept at zero so the
    /// operator can bring it back without searching again; rows at
    /// zero are dropped from the submission payload instead.
    pub fn decrement_accessory(&mut self, accessory_id: AccessoryId, kind: AccessoryKind) {
        if let Some(row) = self.accessory_row_mut(accessory_id, kind) {
            row.quantity = row.quantity.saturating_sub(1);
        }
    }

    fn accessory_row_mut(
        &mut self,
        accessory_id: AccessoryId,
        kind: AccessoryKind,
    ) -> Option<&mut AccessorySelection> {
        self.accessories
            .iter_mut()
            .find(|row| row.accessory_id == accessory_id && row.kind == kind)
    }
}
