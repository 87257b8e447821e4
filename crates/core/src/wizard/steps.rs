use serde::{Deserialize, Serialize};

use crate::domain::interaction::InteractionType;

/// The five kinds of step a flow can contain. Which of them actually
/// appear, and at which position, depends on the selected interaction
/// type; positions are always 1-based and contiguous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    TypeSelection,
    CustomerDetails,
    Equipment,
    Delivery,
    Review,
}

impl WizardStep {
    pub fn title(self) -> &'static str {
        match self {
            WizardStep::TypeSelection => "Interaction type",
            WizardStep::CustomerDetails => "Customer, contact and site",
            WizardStep::Equipment => "Equipment and accessories",
            WizardStep::Delivery => "Delivery details",
            WizardStep::Review => "Review and submit",
        }
    }
}

/// Step plan for the given selection. Before a type is chosen the flow
/// is just the type step; afterwards the conditional sections expand it
/// to between three and five steps.
pub fn step_sequence(selected: Option<InteractionType>) -> Vec<WizardStep> {
    let Some(interaction_type) = selected else {
        return vec![WizardStep::TypeSelection];
    };

    let profile = interaction_type.profile();
    let mut sequence = vec![WizardStep::TypeSelection, WizardStep::CustomerDetails];
    if profile.requires_equipment {
        sequence.push(WizardStep::Equipment);
    }
    if profile.requires_delivery {
        sequence.push(WizardStep::Delivery);
    }
    sequence.push(WizardStep::Review);
    sequence
}

pub fn total_steps(selected: Option<InteractionType>) -> usize {
    step_sequence(selected).len()
}

/// Step kind at a 1-based position, `None` when out of range.
pub fn step_at(selected: Option<InteractionType>, position: usize) -> Option<WizardStep> {
    let sequence = step_sequence(selected);
    position
        .checked_sub(1)
        .and_then(|index| sequence.get(index).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_follow_the_conditional_sections() {
        for interaction_type in InteractionType::ALL {
            let profile = interaction_type.profile();
            let expected = 3
                + usize::from(profile.requires_equipment)
                + usize::from(profile.requires_delivery);
            assert_eq!(
                total_steps(Some(interaction_type)),
                expected,
                "unexpected total for {interaction_type:?}"
            );
        }
    }

    #[test]
    fn hire_runs_the_full_five_step_flow() {
        assert_eq!(
            step_sequence(Some(InteractionType::Hire)),
            vec![
                WizardStep::TypeSelection,
                WizardStep::CustomerDetails,
                WizardStep::Equipment,
                WizardStep::Delivery,
                WizardStep::Review,
            ]
        );
    }

    #[test]
    fn off_hire_puts_delivery_at_position_three() {
        assert_eq!(
            step_at(Some(InteractionType::OffHire), 3),
            Some(WizardStep::Delivery)
        );
        assert_eq!(
            step_at(Some(InteractionType::OffHire), 4),
            Some(WizardStep::Review)
        );
    }

    #[test]
    fn enquiry_is_the_minimal_three_step_flow() {
        assert_eq!(
            step_sequence(Some(InteractionType::Enquiry)),
            vec![
                WizardStep::TypeSelection,
                WizardStep::CustomerDetails,
                WizardStep::Review,
            ]
        );
    }

    #[test]
    fn before_selection_only_the_type_step_exists() {
        assert_eq!(step_sequence(None), vec![WizardStep::TypeSelection]);
        assert_eq!(total_steps(None), 1);
    }

    #[test]
    fn positions_are_one_based_and_bounded() {
        assert_eq!(step_at(Some(InteractionType::Hire), 0), None);
        assert_eq!(
            step_at(Some(InteractionType::Hire), 1),
            Some(WizardStep::TypeSelection)
        );
        assert_eq!(step_at(Some(InteractionType::Hire), 6), None);
    }
}
