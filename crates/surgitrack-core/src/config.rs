//! Configuration loading and typed config structures for SurgiTrack.
//!
//! The canonical configuration lives in `surgitrack-config.yaml` in the
//! working directory. Every field has a default, so an empty or missing
//! file yields a complete fleet of 20 rooms with the standard checklist and
//! staff directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use surgitrack_types::{
    AsepsisProfile, ChecklistItemId, ChecklistPhase, PressureMode, StaffId, StaffMember,
    StaffRole,
};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level SurgiTrack configuration.
///
/// Mirrors the structure of `surgitrack-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SurgiTrackConfig {
    /// Room fleet definition.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Disinfection durations and the hyper-septic profile.
    #[serde(default)]
    pub disinfection: DisinfectionConfig,

    /// Time engine parameters.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Snapshot storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Display timezone and calendar window.
    #[serde(default)]
    pub display: DisplayConfig,

    /// HTTP surface.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Safety checklist template copied into every room.
    #[serde(default = "default_checklist")]
    pub checklist: Vec<ChecklistTemplateItem>,

    /// Staff directory.
    #[serde(default = "default_staff")]
    pub staff: Vec<StaffMember>,
}

impl SurgiTrackConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SURGITRACK_DATA_DIR` overrides `storage.data_dir`
    /// - `SURGITRACK_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SURGITRACK_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("SURGITRACK_OBSERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.observer.port = port;
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });

        if self.fleet.room_count == 0 {
            return invalid("fleet.room_count must be at least 1".to_owned());
        }
        if let Some(id) = self
            .fleet
            .hyper_septic_rooms
            .iter()
            .find(|id| **id == 0 || **id > self.fleet.room_count)
        {
            return invalid(format!(
                "fleet.hyper_septic_rooms contains {id}, outside 1..={}",
                self.fleet.room_count
            ));
        }
        if self.disinfection.default_cleaning_minutes == 0 {
            return invalid("disinfection.default_cleaning_minutes must be positive".to_owned());
        }
        if self.disinfection.hyper_septic_profile.turnover_cleaning_min == 0 {
            return invalid(
                "disinfection.hyper_septic_profile.turnover_cleaning_min must be positive"
                    .to_owned(),
            );
        }
        if self.engine.max_transitions_per_evaluation == 0 {
            return invalid("engine.max_transitions_per_evaluation must be at least 1".to_owned());
        }
        if self.engine.tick_interval_ms == 0 {
            return invalid("engine.tick_interval_ms must be positive".to_owned());
        }
        if self.display.calendar_start_hour >= self.display.calendar_end_hour
            || self.display.calendar_end_hour > 24
        {
            return invalid(format!(
                "display calendar window {}..{} is not within a day",
                self.display.calendar_start_hour, self.display.calendar_end_hour
            ));
        }
        if self.display.utc_offset_minutes.unsigned_abs() >= 1440 {
            return invalid("display.utc_offset_minutes must be within one day".to_owned());
        }
        Ok(())
    }
}

/// Room fleet definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FleetConfig {
    /// Number of rooms; ids run `1..=room_count`.
    #[serde(default = "default_room_count")]
    pub room_count: u32,

    /// Ids of the hyper-septic rooms.
    #[serde(default = "default_hyper_septic_rooms")]
    pub hyper_septic_rooms: Vec<u32>,

    /// Prefix of generated room names.
    #[serde(default = "default_room_name_prefix")]
    pub room_name_prefix: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            room_count: default_room_count(),
            hyper_septic_rooms: default_hyper_septic_rooms(),
            room_name_prefix: default_room_name_prefix(),
        }
    }
}

/// Disinfection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisinfectionConfig {
    /// Cleaning window for standard rooms, in minutes.
    #[serde(default = "default_cleaning_minutes")]
    pub default_cleaning_minutes: u32,

    /// Profile given to every hyper-septic room.
    #[serde(default = "default_hyper_septic_profile")]
    pub hyper_septic_profile: AsepsisProfile,
}

impl Default for DisinfectionConfig {
    fn default() -> Self {
        Self {
            default_cleaning_minutes: default_cleaning_minutes(),
            hyper_septic_profile: default_hyper_septic_profile(),
        }
    }
}

/// Time engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Upper bound on transitions applied to one room in one evaluation.
    #[serde(default = "default_max_transitions")]
    pub max_transitions_per_evaluation: u32,

    /// Length of the post-operation attention window. When unset, a room
    /// whose operation time runs out goes straight to disinfection.
    #[serde(default)]
    pub attention_minutes: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_transitions_per_evaluation: default_max_transitions(),
            attention_minutes: None,
        }
    }
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory of the `sled` database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key of the snapshot slot.
    #[serde(default = "default_slot_key")]
    pub slot_key: String,

    /// Keep snapshots in memory only (nothing survives a restart).
    #[serde(default)]
    pub ephemeral: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            slot_key: default_slot_key(),
            ephemeral: false,
        }
    }
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Offset of the display timezone from UTC, in minutes.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// First hour shown on the day calendar.
    #[serde(default = "default_calendar_start_hour")]
    pub calendar_start_hour: u32,

    /// Hour at which the day calendar ends (exclusive).
    #[serde(default = "default_calendar_end_hour")]
    pub calendar_end_hour: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            calendar_start_hour: default_calendar_start_hour(),
            calendar_end_hour: default_calendar_end_hour(),
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One entry of the checklist template. Instantiated unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChecklistTemplateItem {
    /// Item id.
    pub id: ChecklistItemId,
    /// Label shown to the operator.
    pub label: String,
    /// Checklist phase.
    pub phase: ChecklistPhase,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_room_count() -> u32 {
    20
}

fn default_hyper_septic_rooms() -> Vec<u32> {
    vec![1, 2]
}

fn default_room_name_prefix() -> String {
    "Salle".to_owned()
}

const fn default_cleaning_minutes() -> u32 {
    20
}

/// Profile used for hyper-septic rooms when the file does not set one.
pub fn default_hyper_septic_profile() -> AsepsisProfile {
    AsepsisProfile {
        pressure_mode: PressureMode::Positive,
        pressure_pa_target: 15,
        air_changes_per_hour: 50,
        hepa_filter: "H14".to_owned(),
        airflow: "Flux laminaire vertical".to_owned(),
        air_velocity_mps: 0.25,
        temp_c_min: 19.0,
        temp_c_max: 24.0,
        humidity_pct_min: 45.0,
        humidity_pct_max: 65.0,
        turnover_cleaning_min: 30,
        terminal_cleaning_min: 60,
        max_people_recommended: 8,
    }
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_max_transitions() -> u32 {
    16
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_slot_key() -> String {
    "surgiTrack_rooms".to_owned()
}

const fn default_utc_offset_minutes() -> i32 {
    60
}

const fn default_calendar_start_hour() -> u32 {
    8
}

const fn default_calendar_end_hour() -> u32 {
    20
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn checklist_item(id: &str, label: &str, phase: ChecklistPhase) -> ChecklistTemplateItem {
    ChecklistTemplateItem {
        id: ChecklistItemId::from(id),
        label: label.to_owned(),
        phase,
    }
}

/// The standard seven-item safety checklist.
pub fn default_checklist() -> Vec<ChecklistTemplateItem> {
    vec![
        checklist_item("c1", "Identité patient vérifiée", ChecklistPhase::BeforeInduction),
        checklist_item("c2", "Site opératoire marqué", ChecklistPhase::BeforeInduction),
        checklist_item(
            "c3",
            "Vérification matériel anesthésie",
            ChecklistPhase::BeforeInduction,
        ),
        checklist_item(
            "c4",
            "Confirmation identité et site par l'équipe",
            ChecklistPhase::BeforeIncision,
        ),
        checklist_item(
            "c5",
            "Antibioprophylaxie faite <60min",
            ChecklistPhase::BeforeIncision,
        ),
        checklist_item(
            "c6",
            "Comptage final compresses/aiguilles",
            ChecklistPhase::BeforeExit,
        ),
        checklist_item("c7", "Étiquetage des échantillons", ChecklistPhase::BeforeExit),
    ]
}

fn staff_member(id: &str, name: &str, role: StaffRole, specialty: Option<&str>) -> StaffMember {
    StaffMember {
        id: StaffId::from(id),
        name: name.to_owned(),
        role,
        specialty: specialty.map(str::to_owned),
    }
}

/// The default staff directory.
pub fn default_staff() -> Vec<StaffMember> {
    vec![
        staff_member("s1", "Dr. Hachem Sayegh", StaffRole::Surgeon, Some("Orthopédie")),
        staff_member("s2", "Dr. Marie Curie", StaffRole::Surgeon, Some("Neurochirurgie")),
        staff_member("s3", "Dr. Alain Prost", StaffRole::Surgeon, Some("Cardiologie")),
        staff_member("s4", "Dr. Sarah Connor", StaffRole::Surgeon, Some("Ophtalmologie")),
        staff_member("s5", "Dr. Gregory House", StaffRole::Surgeon, Some("Diagnostic")),
        staff_member("a1", "Dr. Luc Besson", StaffRole::Anesthesiologist, None),
        staff_member("a2", "Dr. Claire Redfield", StaffRole::Anesthesiologist, None),
        staff_member("n1", "Julie Martin", StaffRole::ScrubNurse, None),
        staff_member("n2", "Thomas Bernard", StaffRole::NurseAnesthetist, None),
        staff_member("n3", "Lara Croft", StaffRole::ScrubNurse, None),
        staff_member("n4", "Leon Kennedy", StaffRole::NurseAnesthetist, None),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SurgiTrackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fleet.room_count, 20);
        assert_eq!(config.fleet.hyper_septic_rooms, vec![1, 2]);
        assert_eq!(config.disinfection.default_cleaning_minutes, 20);
        assert_eq!(config.engine.tick_interval_ms, 1000);
        assert_eq!(config.storage.slot_key, "surgiTrack_rooms");
        assert_eq!(config.checklist.len(), 7);
        assert_eq!(config.staff.len(), 11);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
fleet:
  room_count: 6
  hyper_septic_rooms: [3]
  room_name_prefix: "OR"

disinfection:
  default_cleaning_minutes: 15
  hyper_septic_profile:
    pressure_mode: POSITIVE
    pressure_pa_target: 20
    air_changes_per_hour: 60
    hepa_filter: U15
    airflow: "Flux laminaire vertical"
    air_velocity_mps: 0.3
    temp_c_min: 18.0
    temp_c_max: 22.0
    humidity_pct_min: 40.0
    humidity_pct_max: 60.0
    turnover_cleaning_min: 45
    terminal_cleaning_min: 90
    max_people_recommended: 6

engine:
  tick_interval_ms: 500
  max_transitions_per_evaluation: 8
  attention_minutes: 5

storage:
  slot_key: "rooms"
  ephemeral: true

display:
  utc_offset_minutes: 0
  calendar_start_hour: 7
  calendar_end_hour: 21

logging:
  level: "debug"

checklist:
  - id: c1
    label: "Identity"
    phase: BEFORE_INDUCTION

staff:
  - id: s1
    name: "Dr. House"
    role: SURGEON
    specialty: "Diagnostic"
"#;

        let config = SurgiTrackConfig::parse(yaml).unwrap();
        assert_eq!(config.fleet.room_count, 6);
        assert_eq!(config.fleet.room_name_prefix, "OR");
        assert_eq!(config.disinfection.default_cleaning_minutes, 15);
        assert_eq!(config.disinfection.hyper_septic_profile.turnover_cleaning_min, 45);
        assert_eq!(config.engine.attention_minutes, Some(5));
        assert!(config.storage.ephemeral);
        assert_eq!(config.display.calendar_start_hour, 7);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.checklist.len(), 1);
        assert_eq!(config.staff.len(), 1);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SurgiTrackConfig::parse("fleet:\n  room_count: 4\n  hyper_septic_rooms: []\n")
            .unwrap();
        assert_eq!(config.fleet.room_count, 4);
        assert!(config.fleet.hyper_septic_rooms.is_empty());
        assert_eq!(config.engine.max_transitions_per_evaluation, 16);
        assert_eq!(config.checklist.len(), 7);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SurgiTrackConfig::parse("").is_ok());
    }

    #[test]
    fn hyper_septic_room_outside_fleet_is_rejected() {
        let err = SurgiTrackConfig::parse("fleet:\n  room_count: 2\n  hyper_septic_rooms: [5]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_cleaning_minutes_is_rejected() {
        let err = SurgiTrackConfig::parse("disinfection:\n  default_cleaning_minutes: 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn inverted_calendar_window_is_rejected() {
        let err = SurgiTrackConfig::parse(
            "display:\n  calendar_start_hour: 20\n  calendar_end_hour: 8\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("surgitrack-config.yaml");
        if path.exists() {
            let config = SurgiTrackConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
