use crate::config::Config;
use crate::disks::{DiskBayRecord, DiskTable};
use crate::enclosure::{self, ENCLOSURE, EnclosureProfile};
use crate::error::{Error, FieldRef, Result};
use crate::fans::{FanMask, FanPlan};
use crate::section::SectionTable;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Consistency problem that does not stop extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub field: String,
    pub message: String,
}

/// Everything extracted from one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub path: PathBuf,
    pub profile: EnclosureProfile,
    pub fans: FanPlan,
    pub disks: Vec<DiskBayRecord>,
    pub warnings: Vec<Warning>,
}

impl Extraction {
    pub fn fan_mask(&self) -> FanMask {
        self.fans.mask
    }

    pub fn pwm_mask(&self) -> FanMask {
        self.fans.pwm_mask()
    }
}

/// Read a profile from disk and extract it.
pub fn extract_file(path: &Path, config: &Config) -> Result<Extraction> {
    let table = SectionTable::load(path)?;
    extract(&table, config)
}

/// Run validation and every extraction stage over a parsed profile.
pub fn extract(table: &SectionTable, config: &Config) -> Result<Extraction> {
    enclosure::validate(table, &config.controller)?;

    let profile = EnclosureProfile::extract(table, &config.controller)?;
    let fans = FanPlan::build(table, profile.fan_count, profile.cpu_fan_count, &config.fans)?;
    let disks = DiskTable::build(table, profile.disk_count)?;

    let mut warnings = Vec::new();
    for collision in &fans.collisions {
        if config.checks.strict {
            return Err(Error::FieldFormat {
                path: table.path().to_path_buf(),
                field: FieldRef::key(ENCLOSURE, "max_fan_num"),
                value: profile.fan_count.to_string(),
                detail: collision.to_string(),
            });
        }
        warnings.push(Warning {
            field: collision.second.clone(),
            message: collision.to_string(),
        });
    }

    for section in &disks.undeclared {
        let message = format!(
            "[{}] exists but only {} bay(s) are declared",
            section, profile.disk_count
        );
        if config.checks.strict {
            return Err(Error::FieldFormat {
                path: table.path().to_path_buf(),
                field: FieldRef::key(ENCLOSURE, "max_disk_num"),
                value: profile.disk_count.to_string(),
                detail: message,
            });
        }
        warnings.push(Warning {
            field: format!("[{}]", section),
            message,
        });
    }

    Ok(Extraction {
        path: table.path().to_path_buf(),
        profile,
        fans,
        disks: disks.records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "\
[System Enclosure]
MODEL = TS-873A
SIO_DEVICE = IT8528
MAX_DISK_NUM = 2
MAX_FAN_NUM = 2
MAX_CPU_FAN_NUM = 1
MAX_TEMP_NUM = 2
PWR_RECOVERY_UNIT = EC
BOARD_SN_DEVICE = VPD:BP

[System IO]
RESET_BUTTON = EC
STATUS_GREEN_LED = EC
STATUS_RED_LED = EC

[System FAN]
FAN_1 = I1
FAN_2 = I2

[CPU FAN]
FAN_1 = I2

[System Disk 1]
SLOT_NAME = Disk 1
ERR_LED = EC:1

[System Disk 2]
SLOT_NAME = Disk 2
ERR_LED = EC:2

[System Disk 3]
SLOT_NAME = Disk 3
";

    fn table() -> SectionTable {
        SectionTable::parse("ts-873a.conf", PROFILE).unwrap()
    }

    #[test]
    fn test_extract_collects_warnings() {
        let extraction = extract(&table(), &Config::default()).unwrap();
        assert_eq!(extraction.profile.model, "TS-873A");
        assert_eq!(extraction.fan_mask().bits(), 0b11);
        assert_eq!(extraction.pwm_mask(), extraction.fan_mask());
        assert_eq!(extraction.disks.len(), 2);
        assert_eq!(extraction.warnings.len(), 2);
        assert_eq!(extraction.warnings[0].field, "[cpu fan] fan_1");
        assert_eq!(extraction.warnings[1].field, "[system disk 3]");
    }

    #[test]
    fn test_strict_turns_collision_into_failure() {
        let mut config = Config::default();
        config.checks.strict = true;
        let err = extract(&table(), &config).unwrap_err();
        assert!(matches!(err, Error::FieldFormat { .. }));
    }

    #[test]
    fn test_unsupported_controller_stops_before_extraction() {
        let mut config = Config::default();
        config.controller.expected = "it8721".to_string();
        let err = extract(&table(), &config).unwrap_err();
        assert!(err.is_not_supported());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let first = extract(&table(), &Config::default()).unwrap();
        let second = extract(&table(), &Config::default()).unwrap();
        assert_eq!(first, second);
    }
}
