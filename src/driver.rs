use crate::disks::{DiskBayRecord, Indicator, IndicatorKind};
use crate::extract::Extraction;
use serde::Serialize;
use std::fmt::Write;

/// Feature bits of a driver model table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverFeatures {
    pub pwr_recovery: bool,
    pub eup_mode: bool,
    pub led_brightness: bool,
    pub led_status: bool,
    /// Enclosure serial lives in the mainboard VPD table rather than the backplane one.
    pub enc_serial_mb: bool,
}

/// Per-slot entry of a driver model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotConfig {
    pub name: String,
    pub ec_index: u32,
    pub has_present: bool,
    pub has_active: bool,
    pub has_error: bool,
    pub has_locate: bool,
}

/// Model table entry for the IT8528 kernel driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverConfig {
    pub name: String,
    pub features: DriverFeatures,
    /// 1-based fan channels.
    pub fans: Vec<u32>,
    pub slots: Vec<SlotConfig>,
}

impl DriverConfig {
    pub fn derive(extraction: &Extraction, token: &str) -> Self {
        let profile = &extraction.profile;
        Self {
            name: profile.model.clone(),
            features: DriverFeatures {
                pwr_recovery: profile.ac_recovery,
                eup_mode: profile.eup_status,
                led_brightness: profile.led_brightness,
                led_status: profile.status_green_led || profile.status_red_led,
                enc_serial_mb: serial_on_mainboard(&profile.serial_location),
            },
            fans: extraction.fans.channels(),
            slots: extraction
                .disks
                .iter()
                .map(|disk| SlotConfig::derive(disk, token))
                .collect(),
        }
    }

    /// Render as a C initializer for the driver's model table.
    pub fn to_c_initializer(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\t{{");
        let _ = writeln!(out, "\t\t.name = \"{}\",", self.name);
        // Board codes aren't in the profile; empty codes are skipped by the driver's search.
        let _ = writeln!(out, "\t\t.mb_model = \"\",");
        let _ = writeln!(out, "\t\t.bp_model = \"\",");

        let features: Vec<&str> = [
            ("pwr_recovery", self.features.pwr_recovery),
            ("eup_mode", self.features.eup_mode),
            ("led_brightness", self.features.led_brightness),
            ("led_status", self.features.led_status),
            ("enc_serial_mb", self.features.enc_serial_mb),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect();
        let _ = writeln!(out, "\t\t.features = {{");
        for name in features {
            let _ = writeln!(out, "\t\t\t.{:<14} = 1,", name);
        }
        let _ = writeln!(out, "\t\t}},");

        let fans: String = self
            .fans
            .iter()
            .map(|f| format!("{}, ", f))
            .collect();
        let _ = writeln!(out, "\t\t.fans = (u8[]){{ {}0}},", fans);

        let _ = writeln!(out, "\t\t.slots = (struct qnap8528_slot_config[]){{");
        for slot in &self.slots {
            let mut fields = vec![
                format!(".name = \"{}\"", slot.name),
                format!(".ec_index = {}", slot.ec_index),
            ];
            for (name, on) in [
                ("has_present", slot.has_present),
                ("has_active", slot.has_active),
                ("has_error", slot.has_error),
                ("has_locate", slot.has_locate),
            ] {
                if on {
                    fields.push(format!(".{} = 1", name));
                }
            }
            let _ = writeln!(out, "\t\t\t{{ {} }},", fields.join(", "));
        }
        let _ = writeln!(out, "\t\t\t{{ NULL }}");
        let _ = writeln!(out, "\t\t}},");
        let _ = writeln!(out, "\t}},");
        out
    }
}

impl SlotConfig {
    pub fn derive(disk: &DiskBayRecord, token: &str) -> Self {
        let indicators = IndicatorKind::ALL.map(|kind| disk.indicator(kind, token));
        let explicit = indicators.iter().find_map(|i| match i {
            Indicator::Ec { index: Some(n) } => Some(u32::from(*n)),
            _ => None,
        });
        let [error, present, locate, blink] = indicators;

        Self {
            name: slot_name(&disk.slot_name, disk.bay),
            ec_index: explicit.unwrap_or(disk.bay),
            has_present: present.is_ec(),
            has_active: blink.is_ec(),
            has_error: error.is_ec(),
            has_locate: locate.is_ec(),
        }
    }
}

/// `VPD:MB` selects the mainboard table, anything else the backplane.
fn serial_on_mainboard(location: &str) -> bool {
    let table = location.rsplit(':').next().unwrap_or_default();
    table.trim().eq_ignore_ascii_case("mb")
}

/// Driver slot name: lowercase alphanumerics, with `Disk <n>` shortened to `hdd<n>`.
pub fn slot_name(slot_name: &str, bay: u32) -> String {
    let name: String = slot_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if let Some(n) = name.strip_prefix("disk") {
        if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
            return format!("hdd{}", n);
        }
    }
    if name.is_empty() {
        return format!("hdd{}", bay);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::section::SectionTable;

    #[test]
    fn test_slot_name_normalization() {
        assert_eq!(slot_name("Disk 3", 3), "hdd3");
        assert_eq!(slot_name("M.2 SSD 1", 5), "m2ssd1");
        assert_eq!(slot_name("U.2-SSD 12", 12), "u2ssd12");
        assert_eq!(slot_name("Diskette", 1), "diskette");
        assert_eq!(slot_name("", 4), "hdd4");
    }

    #[test]
    fn test_slot_config_uses_explicit_ec_index() {
        let disk = DiskBayRecord {
            bay: 5,
            slot_name: "M.2 SSD 1".to_string(),
            err_led: "EC:9".to_string(),
            present_led: "EC".to_string(),
            locate_led: "EC:9".to_string(),
            blink_led: "SIO".to_string(),
            bus_type: "NVME".to_string(),
        };
        let slot = SlotConfig::derive(&disk, "ec");
        assert_eq!(slot.name, "m2ssd1");
        assert_eq!(slot.ec_index, 9);
        assert!(slot.has_error);
        assert!(slot.has_present);
        assert!(slot.has_locate);
        assert!(!slot.has_active);
    }

    #[test]
    fn test_slot_config_falls_back_to_bay() {
        let disk = DiskBayRecord {
            bay: 2,
            slot_name: "Disk 2".to_string(),
            err_led: "EC".to_string(),
            ..DiskBayRecord::default()
        };
        let slot = SlotConfig::derive(&disk, "ec");
        assert_eq!(slot.name, "hdd2");
        assert_eq!(slot.ec_index, 2);
        assert!(slot.has_error);
        assert!(!slot.has_present);
    }

    #[test]
    fn test_derive_and_render() {
        let text = "\
[system enclosure]
model = TS-473A
sio_device = it8528
max_disk_num = 1
max_fan_num = 2
max_temp_num = 1
pwr_recovery_unit = ec
board_sn_device = VPD:MB
eup_status = ec

[system io]
reset_button = ec
status_green_led = ec
status_red_led = ec

[system fan]
fan_1 = i7
fan_2 = i8

[system disk 1]
slot_name = Disk 1
err_led = ec:1
present_led = ec:1
";
        let table = SectionTable::parse("ts-473a.conf", text).unwrap();
        let extraction = crate::extract::extract(&table, &Config::default()).unwrap();
        let driver = DriverConfig::derive(&extraction, "ec");

        assert_eq!(driver.fans, vec![7, 8]);
        assert!(driver.features.pwr_recovery);
        assert!(driver.features.eup_mode);
        assert!(driver.features.led_status);
        assert!(!driver.features.led_brightness);
        assert!(driver.features.enc_serial_mb);

        let c = driver.to_c_initializer();
        assert!(c.contains(".name = \"TS-473A\","));
        assert!(c.contains(".mb_model = \"\","));
        assert!(c.contains(".bp_model = \"\","));
        assert!(c.contains(".enc_serial_mb  = 1,"));
        assert!(c.contains("\t\t\t{ NULL }\n"));
        assert!(c.contains(".fans = (u8[]){ 7, 8, 0},"));
        assert!(c.contains("{ .name = \"hdd1\", .ec_index = 1, .has_present = 1, .has_error = 1 },"));
        assert!(!c.contains("led_brightness"));
    }

    #[test]
    fn test_serial_location_selects_vpd_table() {
        assert!(serial_on_mainboard("VPD:MB"));
        assert!(serial_on_mainboard("vpd:mb"));
        assert!(!serial_on_mainboard("VPD:BP"));
        assert!(!serial_on_mainboard("vpd"));
        assert!(!serial_on_mainboard(""));
    }
}
