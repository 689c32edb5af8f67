use crate::enclosure::ENCLOSURE;
use crate::error::{Error, FieldRef, Result};
use crate::section::{SectionTable, SectionView};
use serde::Serialize;
use std::fmt;

const DISK_SECTION_PREFIX: &str = "system disk ";

/// Name of the section describing bay `bay`.
pub fn section_name(bay: u32) -> String {
    format!("{}{}", DISK_SECTION_PREFIX, bay)
}

/// Wiring of one disk bay's indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiskBayRecord {
    pub bay: u32,
    pub slot_name: String,
    pub err_led: String,
    pub present_led: String,
    pub locate_led: String,
    pub blink_led: String,
    pub bus_type: String,
}

/// Which indicator of a bay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    Error,
    Present,
    Locate,
    Blink,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::Error,
        IndicatorKind::Present,
        IndicatorKind::Locate,
        IndicatorKind::Blink,
    ];
}

/// Parsed indicator spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    None,
    /// Driven by the EC, optionally at an explicit EC index (`EC:<n>`).
    Ec { index: Option<u8> },
    Other { spec: String },
}

impl Indicator {
    pub fn parse(spec: &str, token: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() {
            return Indicator::None;
        }

        let (head, tail) = match spec.split_once(':') {
            Some((head, tail)) => (head.trim(), Some(tail.trim())),
            None => (spec, None),
        };
        if !head.eq_ignore_ascii_case(token) {
            return Indicator::Other {
                spec: spec.to_string(),
            };
        }

        match tail {
            None => Indicator::Ec { index: None },
            Some(tail) => match tail.parse::<u8>() {
                Ok(index) => Indicator::Ec { index: Some(index) },
                Err(_) => Indicator::Other {
                    spec: spec.to_string(),
                },
            },
        }
    }

    pub fn is_ec(&self) -> bool {
        matches!(self, Indicator::Ec { .. })
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::None => write!(f, "-"),
            Indicator::Ec { index: None } => write!(f, "EC"),
            Indicator::Ec { index: Some(i) } => write!(f, "EC:{}", i),
            Indicator::Other { spec } => write!(f, "{}", spec),
        }
    }
}

impl DiskBayRecord {
    fn from_section(bay: u32, section: &SectionView<'_>) -> Self {
        let text = |key: &str| section.get(key).unwrap_or_default().to_string();
        Self {
            bay,
            slot_name: text("slot_name"),
            err_led: text("err_led"),
            present_led: text("present_led"),
            locate_led: text("locate_led"),
            blink_led: text("blink_led"),
            bus_type: text("bus_type"),
        }
    }

    pub fn indicator_spec(&self, kind: IndicatorKind) -> &str {
        match kind {
            IndicatorKind::Error => &self.err_led,
            IndicatorKind::Present => &self.present_led,
            IndicatorKind::Locate => &self.locate_led,
            IndicatorKind::Blink => &self.blink_led,
        }
    }

    pub fn indicator(&self, kind: IndicatorKind, token: &str) -> Indicator {
        Indicator::parse(self.indicator_spec(kind), token)
    }
}

/// Disk bay records of a profile plus sections nobody declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskTable {
    pub records: Vec<DiskBayRecord>,
    /// `system disk k` sections with k beyond the declared count.
    pub undeclared: Vec<String>,
}

impl DiskTable {
    /// Build one record per declared bay, `1..=disk_count`.
    pub fn build(table: &SectionTable, disk_count: u32) -> Result<Self> {
        if disk_count == 0 {
            return Err(Error::MissingField {
                path: table.path().to_path_buf(),
                field: FieldRef::key(ENCLOSURE, "max_disk_num"),
                reason: "declares no disk bays",
            });
        }

        let records = (1..=disk_count)
            .map(|bay| {
                let section = table.require_section(&section_name(bay))?;
                Ok(DiskBayRecord::from_section(bay, &section))
            })
            .collect::<Result<Vec<_>>>()?;

        let undeclared = table
            .section_names()
            .filter(|name| {
                name.strip_prefix(DISK_SECTION_PREFIX)
                    .and_then(|n| n.trim().parse::<u32>().ok())
                    .is_some_and(|bay| bay > disk_count)
            })
            .map(str::to_string)
            .collect();

        Ok(Self {
            records,
            undeclared,
        })
    }
}
