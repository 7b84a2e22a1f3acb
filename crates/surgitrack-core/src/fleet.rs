//! Static fleet catalog: room definitions, checklist template, staff.
//!
//! Built once from configuration and read-only afterwards. Static
//! definitions win over whatever a persisted snapshot says about a room's
//! name, class or profile.

use std::collections::BTreeMap;

use surgitrack_types::{AsepsisProfile, ChecklistItem, Room, RoomClass, RoomId, StaffMember};

use crate::config::{ChecklistTemplateItem, SurgiTrackConfig};

/// Fixed attributes of one room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDefinition {
    /// Room id.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Room class.
    pub class: RoomClass,
    /// Asepsis profile, for hyper-septic rooms.
    pub asepsis_profile: Option<AsepsisProfile>,
}

/// The configured fleet.
#[derive(Debug, Clone)]
pub struct FleetCatalog {
    rooms: BTreeMap<RoomId, RoomDefinition>,
    checklist: Vec<ChecklistTemplateItem>,
    staff: Vec<StaffMember>,
    default_cleaning_minutes: u32,
}

impl FleetCatalog {
    /// Build the catalog from a validated configuration.
    pub fn from_config(config: &SurgiTrackConfig) -> Self {
        let prefix = &config.fleet.room_name_prefix;
        let rooms = (1..=config.fleet.room_count)
            .map(|n| {
                let id = RoomId(n);
                let definition = if config.fleet.hyper_septic_rooms.contains(&n) {
                    RoomDefinition {
                        id,
                        name: format!("{prefix} {n} (Hyper-septique)"),
                        class: RoomClass::HyperSeptic,
                        asepsis_profile: Some(config.disinfection.hyper_septic_profile.clone()),
                    }
                } else {
                    RoomDefinition {
                        id,
                        name: format!("{prefix} {n}"),
                        class: RoomClass::Standard,
                        asepsis_profile: None,
                    }
                };
                (id, definition)
            })
            .collect();

        Self {
            rooms,
            checklist: config.checklist.clone(),
            staff: config.staff.clone(),
            default_cleaning_minutes: config.disinfection.default_cleaning_minutes,
        }
    }

    /// Definition of `id`, if it belongs to the fleet.
    pub fn definition(&self, id: RoomId) -> Option<&RoomDefinition> {
        self.rooms.get(&id)
    }

    /// All definitions in id order.
    pub fn definitions(&self) -> impl Iterator<Item = &RoomDefinition> {
        self.rooms.values()
    }

    /// Number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the fleet is empty (never true for a validated config).
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// A fresh, fully unchecked checklist.
    pub fn fresh_checklist(&self) -> Vec<ChecklistItem> {
        self.checklist
            .iter()
            .map(|item| ChecklistItem {
                id: item.id.clone(),
                label: item.label.clone(),
                checked: false,
                phase: item.phase,
            })
            .collect()
    }

    /// A new idle room for `definition`.
    pub fn new_room(&self, definition: &RoomDefinition) -> Room {
        Room::idle(
            definition.id,
            definition.name.clone(),
            definition.class,
            definition.asepsis_profile.clone(),
            self.fresh_checklist(),
        )
    }

    /// The staff directory.
    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    /// Cleaning window for standard rooms, in minutes.
    pub const fn default_cleaning_minutes(&self) -> u32 {
        self.default_cleaning_minutes
    }
}

/// Validate an asepsis profile edited by an operator.
///
/// Returns a human-readable reason on failure.
pub fn check_profile(profile: &AsepsisProfile) -> Result<(), String> {
    let floats = [
        profile.air_velocity_mps,
        profile.temp_c_min,
        profile.temp_c_max,
        profile.humidity_pct_min,
        profile.humidity_pct_max,
    ];
    if floats.iter().any(|v| !v.is_finite()) {
        return Err("numeric fields must be finite".to_owned());
    }
    if profile.temp_c_min > profile.temp_c_max {
        return Err("minimum temperature exceeds maximum".to_owned());
    }
    if profile.humidity_pct_min > profile.humidity_pct_max {
        return Err("minimum humidity exceeds maximum".to_owned());
    }
    if profile.pressure_pa_target < 0
        && profile.pressure_mode == surgitrack_types::PressureMode::Positive
    {
        return Err("negative pressure target in positive mode".to_owned());
    }
    if profile.turnover_cleaning_min == 0 || profile.terminal_cleaning_min == 0 {
        return Err("cleaning durations must be positive".to_owned());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::default_hyper_septic_profile;

    #[test]
    fn default_fleet_has_two_hyper_septic_rooms() {
        let catalog = FleetCatalog::from_config(&SurgiTrackConfig::default());
        assert_eq!(catalog.len(), 20);
        let hyper: Vec<_> = catalog
            .definitions()
            .filter(|d| d.class == RoomClass::HyperSeptic)
            .map(|d| d.id)
            .collect();
        assert_eq!(hyper, vec![RoomId(1), RoomId(2)]);
        assert!(catalog.definition(RoomId(1)).unwrap().asepsis_profile.is_some());
        assert!(catalog.definition(RoomId(3)).unwrap().asepsis_profile.is_none());
        assert_eq!(catalog.definition(RoomId(3)).unwrap().name, "Salle 3");
        assert!(catalog.definition(RoomId(21)).is_none());
    }

    #[test]
    fn fresh_checklist_is_unchecked() {
        let catalog = FleetCatalog::from_config(&SurgiTrackConfig::default());
        let checklist = catalog.fresh_checklist();
        assert_eq!(checklist.len(), 7);
        assert!(checklist.iter().all(|item| !item.checked));
    }

    #[test]
    fn profile_checks() {
        let good = default_hyper_septic_profile();
        assert!(check_profile(&good).is_ok());

        let mut hot = good.clone();
        hot.temp_c_min = 30.0;
        assert!(check_profile(&hot).is_err());

        let mut damp = good.clone();
        damp.humidity_pct_min = 80.0;
        assert!(check_profile(&damp).is_err());

        let mut inverted = good.clone();
        inverted.pressure_pa_target = -5;
        assert!(check_profile(&inverted).is_err());
        inverted.pressure_mode = surgitrack_types::PressureMode::Negative;
        assert!(check_profile(&inverted).is_ok());

        let mut no_clean = good;
        no_clean.turnover_cleaning_min = 0;
        assert!(check_profile(&no_clean).is_err());
    }
}
