use crate::config::FanConfig;
use crate::error::{Error, Result};
use crate::section::SectionTable;
use serde::Serialize;
use std::fmt;

pub const SYSTEM_FAN: &str = "system fan";
pub const CPU_FAN: &str = "cpu fan";

/// The EC exposes at most this many fan channels.
pub const MAX_FAN_CHANNELS: u32 = 64;

/// One `FAN_n` entry resolved to a hardware bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanAssignment {
    pub section: &'static str,
    pub key: String,
    /// 1-based fan ordinal within its section.
    pub ordinal: u32,
    /// 0-based hardware fan-control bit.
    pub bit: u32,
}

impl FanAssignment {
    /// 1-based channel number, as the driver's fan tables list them.
    pub fn channel(&self) -> u32 {
        self.bit + 1
    }
}

/// Bit set of occupied fan-control positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FanMask(u64);

impl FanMask {
    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, bit: u32) -> bool {
        bit < MAX_FAN_CHANNELS && self.0 & (1 << bit) != 0
    }

    fn insert(&mut self, bit: u32) {
        self.0 |= 1 << bit;
    }

    /// Set bit positions, lowest first.
    pub fn positions(self) -> impl Iterator<Item = u32> {
        (0..MAX_FAN_CHANNELS).filter(move |&bit| self.contains(bit))
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl fmt::Display for FanMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Two fans resolving to the same hardware bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanCollision {
    pub first: String,
    pub second: String,
    pub bit: u32,
}

impl fmt::Display for FanCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} both map to fan bit {}",
            self.first, self.second, self.bit
        )
    }
}

/// Fan assignments of a profile and the mask they produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanPlan {
    pub assignments: Vec<FanAssignment>,
    pub mask: FanMask,
    pub collisions: Vec<FanCollision>,
}

impl FanPlan {
    /// Resolve `fan_1..=fan_count` in `[system fan]` and
    /// `fan_1..=cpu_fan_count` in `[cpu fan]`.
    pub fn build(
        table: &SectionTable,
        fan_count: u32,
        cpu_fan_count: u32,
        config: &FanConfig,
    ) -> Result<Self> {
        let mut assignments = Vec::new();
        for (section, count) in [(SYSTEM_FAN, fan_count), (CPU_FAN, cpu_fan_count)] {
            for ordinal in 1..=count {
                assignments.push(resolve(table, section, ordinal, config.marker)?);
            }
        }

        let mut mask = FanMask::default();
        let mut collisions = Vec::new();
        for (i, fan) in assignments.iter().enumerate() {
            if mask.contains(fan.bit) {
                // The mask is unchanged by a repeat; only the first holder is reported.
                if let Some(first) = assignments[..i].iter().find(|a| a.bit == fan.bit) {
                    collisions.push(FanCollision {
                        first: label(first),
                        second: label(fan),
                        bit: fan.bit,
                    });
                }
            }
            mask.insert(fan.bit);
        }

        Ok(Self {
            assignments,
            mask,
            collisions,
        })
    }

    /// PWM controllers share the fan address space.
    pub fn pwm_mask(&self) -> FanMask {
        self.mask
    }

    /// 1-based channel numbers in assignment order.
    pub fn channels(&self) -> Vec<u32> {
        self.assignments.iter().map(FanAssignment::channel).collect()
    }
}

fn label(fan: &FanAssignment) -> String {
    format!("[{}] {}", fan.section, fan.key)
}

fn resolve(
    table: &SectionTable,
    section: &'static str,
    ordinal: u32,
    marker: char,
) -> Result<FanAssignment> {
    let key = format!("fan_{}", ordinal);
    let missing = |detail: &str| Error::FieldFormat {
        path: table.path().to_path_buf(),
        field: crate::error::FieldRef::key(section, key.as_str()),
        value: String::new(),
        detail: detail.to_string(),
    };

    let view = table
        .section(section)
        .ok_or_else(|| missing("fan section is absent"))?;
    let value = view.get(&key).ok_or_else(|| missing("fan entry is absent"))?;

    let mut chars = value.chars();
    let digits = match chars.next() {
        Some(c) if c.eq_ignore_ascii_case(&marker) => chars.as_str(),
        _ => {
            return Err(view.format_error(
                &key,
                value,
                format!("expected '{}' followed by a bit number", marker),
            ));
        }
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(view.format_error(&key, value, "bit number is not numeric"));
    }
    let position: u32 = view.parse(&key, digits)?;
    if !(1..=MAX_FAN_CHANNELS).contains(&position) {
        return Err(view.format_error(
            &key,
            value,
            format!("bit number must be within 1..={}", MAX_FAN_CHANNELS),
        ));
    }

    Ok(FanAssignment {
        section,
        key,
        ordinal,
        bit: position - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldRef;

    fn plan(text: &str, fans: u32, cpu_fans: u32) -> Result<FanPlan> {
        let table = SectionTable::parse("fans.conf", text).unwrap();
        FanPlan::build(&table, fans, cpu_fans, &FanConfig::default())
    }

    #[test]
    fn test_system_and_cpu_fans_combine() {
        let text = "\
[SYSTEM FAN]
FAN_1 = I1
FAN_2 = I2
FAN_3 = I3

[CPU FAN]
FAN_1 = I4
";
        let plan = plan(text, 3, 1).unwrap();
        assert_eq!(plan.mask.bits(), 0b1111);
        assert_eq!(plan.pwm_mask(), plan.mask);
        assert_eq!(plan.channels(), vec![1, 2, 3, 4]);
        assert_eq!(plan.assignments[3].section, CPU_FAN);
        assert_eq!(plan.assignments[3].ordinal, 1);
        assert!(plan.collisions.is_empty());
    }

    #[test]
    fn test_sparse_bits() {
        let text = "[system fan]\nfan_1 = i7\nfan_2 = i8\n";
        let plan = plan(text, 2, 0).unwrap();
        assert_eq!(plan.mask.bits(), 0b1100_0000);
        assert_eq!(plan.mask.positions().collect::<Vec<_>>(), vec![6, 7]);
        assert_eq!(plan.mask.to_string(), "0x00c0");
    }

    #[test]
    fn test_zero_fans_is_empty_mask() {
        let plan = plan("[system io]\nreset_button = ec\n", 0, 0).unwrap();
        assert_eq!(plan.mask, FanMask::default());
        assert!(plan.assignments.is_empty());
    }

    #[test]
    fn test_wrong_marker_is_format_error() {
        let err = plan("[system fan]\nfan_1 = i1\nfan_2 = x2\n", 2, 0).unwrap_err();
        match err {
            Error::FieldFormat { field, value, .. } => {
                assert_eq!(field, FieldRef::key(SYSTEM_FAN, "fan_2"));
                assert_eq!(value, "x2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_suffix_is_format_error() {
        let err = plan("[system fan]\nfan_1 = ia\n", 1, 0).unwrap_err();
        assert!(matches!(err, Error::FieldFormat { .. }));
        let err = plan("[system fan]\nfan_1 = i\n", 1, 0).unwrap_err();
        assert!(matches!(err, Error::FieldFormat { .. }));
        let err = plan("[system fan]\nfan_1 = i-1\n", 1, 0).unwrap_err();
        assert!(matches!(err, Error::FieldFormat { .. }));
    }

    #[test]
    fn test_out_of_range_bit_is_format_error() {
        assert!(plan("[system fan]\nfan_1 = i0\n", 1, 0).is_err());
        assert!(plan("[system fan]\nfan_1 = i65\n", 1, 0).is_err());
        assert!(plan("[system fan]\nfan_1 = i64\n", 1, 0).is_ok());
    }

    #[test]
    fn test_missing_entry_names_key() {
        let err = plan("[system fan]\nfan_1 = i1\n[cpu fan]\n", 1, 1).unwrap_err();
        match err {
            Error::FieldFormat { field, .. } => {
                assert_eq!(field, FieldRef::key(CPU_FAN, "fan_1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_cpu_section() {
        let err = plan("[system fan]\nfan_1 = i1\n", 1, 1).unwrap_err();
        assert!(matches!(err, Error::FieldFormat { .. }));
    }

    #[test]
    fn test_collision_is_recorded() {
        let text = "[system fan]\nfan_1 = i1\nfan_2 = i2\n[cpu fan]\nfan_1 = i2\n";
        let plan = plan(text, 2, 1).unwrap();
        assert_eq!(plan.mask.bits(), 0b11);
        assert_eq!(
            plan.collisions,
            vec![FanCollision {
                first: "[system fan] fan_2".to_string(),
                second: "[cpu fan] fan_1".to_string(),
                bit: 1,
            }]
        );
    }

    #[test]
    fn test_custom_marker() {
        let table = SectionTable::parse("fans.conf", "[system fan]\nfan_1 = F3\n").unwrap();
        let plan = FanPlan::build(&table, 1, 0, &FanConfig { marker: 'f' }).unwrap();
        assert_eq!(plan.mask.bits(), 0b100);
    }
}
