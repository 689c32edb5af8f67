use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::section::{SectionTable, SectionView};
use serde::Serialize;

pub const ENCLOSURE: &str = "system enclosure";
pub const IO: &str = "system io";

/// How a field behaves when its key is absent.
#[derive(Debug, Clone, Copy)]
enum Fallback {
    Required,
    /// Use the model identifier.
    Model,
    Count(u32),
    Flag(bool),
}

#[derive(Debug, Clone, Copy)]
struct Field {
    section: &'static str,
    key: &'static str,
    fallback: Fallback,
}

const fn field(section: &'static str, key: &'static str, fallback: Fallback) -> Field {
    Field {
        section,
        key,
        fallback,
    }
}

// Every field read from a profile, with its default.
const MODEL: Field = field(ENCLOSURE, "model", Fallback::Required);
const DISPLAY_NAME: Field = field(ENCLOSURE, "display_fixed_model_name", Fallback::Model);
const SIO_DEVICE: Field = field(ENCLOSURE, "sio_device", Fallback::Flag(false));
const DISK_COUNT: Field = field(ENCLOSURE, "max_disk_num", Fallback::Required);
const FAN_COUNT: Field = field(ENCLOSURE, "max_fan_num", Fallback::Required);
const CPU_FAN_COUNT: Field = field(ENCLOSURE, "max_cpu_fan_num", Fallback::Count(0));
const TEMP_COUNT: Field = field(ENCLOSURE, "max_temp_num", Fallback::Required);
const PWR_RECOVERY: Field = field(ENCLOSURE, "pwr_recovery_unit", Fallback::Required);
const SERIAL_LOCATION: Field = field(ENCLOSURE, "board_sn_device", Fallback::Required);
const EUP_STATUS: Field = field(ENCLOSURE, "eup_status", Fallback::Flag(false));
const USB_COPY_BUTTON: Field = field(IO, "usb_copy_button", Fallback::Flag(false));
const RESET_BUTTON: Field = field(IO, "reset_button", Fallback::Required);
const STATUS_GREEN_LED: Field = field(IO, "status_green_led", Fallback::Required);
const STATUS_RED_LED: Field = field(IO, "status_red_led", Fallback::Required);
const LED_BRIGHTNESS: Field = field(IO, "led_bv_interface", Fallback::Flag(false));
const AUDIO_MUTE: Field = field(IO, "audio_mute", Fallback::Flag(false));

/// Enclosure-level capabilities of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnclosureProfile {
    pub model: String,
    pub display_name: String,
    pub disk_count: u32,
    pub fan_count: u32,
    pub cpu_fan_count: u32,
    pub temp_sensor_count: u32,
    /// AC power recovery is handled by the EC.
    pub ac_recovery: bool,
    /// Where the board serial number lives (e.g. a VPD table).
    pub serial_location: String,
    pub eup_status: bool,
    pub usb_copy_button: bool,
    pub reset_button: bool,
    pub status_green_led: bool,
    pub status_red_led: bool,
    pub led_brightness: bool,
    pub audio_mute: bool,
}

/// Check that the profile targets the expected EC chip.
///
/// Returns the model identifier on success.
pub fn validate<'a>(table: &'a SectionTable, controller: &ControllerConfig) -> Result<&'a str> {
    let enclosure = table.require_section(ENCLOSURE)?;
    let model = enclosure.require(MODEL.key)?;

    let found = enclosure.get(SIO_DEVICE.key);
    if found.is_some_and(|sio| sio.eq_ignore_ascii_case(&controller.expected)) {
        return Ok(model);
    }

    Err(Error::NotSupported {
        path: table.path().to_path_buf(),
        model: model.to_string(),
        controller: controller.expected.clone(),
        found: found.map(str::to_string),
    })
}

impl EnclosureProfile {
    /// Extract enclosure capabilities from a validated table.
    pub fn extract(table: &SectionTable, controller: &ControllerConfig) -> Result<Self> {
        let reader = Reader {
            table,
            token: &controller.token,
        };

        let model = reader.text(&MODEL, None)?;
        let display_name = reader.text(&DISPLAY_NAME, Some(&model))?;

        Ok(Self {
            display_name,
            disk_count: reader.count(&DISK_COUNT)?,
            fan_count: reader.count(&FAN_COUNT)?,
            cpu_fan_count: reader.count(&CPU_FAN_COUNT)?,
            temp_sensor_count: reader.count(&TEMP_COUNT)?,
            ac_recovery: reader.flag(&PWR_RECOVERY)?,
            serial_location: reader.text(&SERIAL_LOCATION, None)?,
            eup_status: reader.flag(&EUP_STATUS)?,
            usb_copy_button: reader.flag(&USB_COPY_BUTTON)?,
            reset_button: reader.flag(&RESET_BUTTON)?,
            status_green_led: reader.flag(&STATUS_GREEN_LED)?,
            status_red_led: reader.flag(&STATUS_RED_LED)?,
            led_brightness: reader.flag(&LED_BRIGHTNESS)?,
            audio_mute: reader.flag(&AUDIO_MUTE)?,
            model,
        })
    }

    /// Controller-driven flags with their profile keys, in report order.
    pub fn flags(&self) -> [(&'static str, bool); 8] {
        [
            ("AC Recovery", self.ac_recovery),
            ("EuP Mode", self.eup_status),
            ("Copy Button", self.usb_copy_button),
            ("Reset Button", self.reset_button),
            ("Status Green", self.status_green_led),
            ("Status Red", self.status_red_led),
            ("Brightness", self.led_brightness),
            ("Audio Mute", self.audio_mute),
        ]
    }
}

/// Applies the field table's fallbacks to lookups.
struct Reader<'a> {
    table: &'a SectionTable,
    token: &'a str,
}

impl<'a> Reader<'a> {
    fn lookup(&self, field: &Field) -> Result<Option<(SectionView<'a>, &'a str)>> {
        let section = match field.fallback {
            Fallback::Required => self.table.require_section(field.section)?,
            _ => match self.table.section(field.section) {
                Some(section) => section,
                None => return Ok(None),
            },
        };
        let value = match field.fallback {
            Fallback::Required => Some(section.require(field.key)?),
            _ => section.get(field.key),
        };
        Ok(value.map(|v| (section, v)))
    }

    fn text(&self, field: &Field, model: Option<&str>) -> Result<String> {
        match (self.lookup(field)?, field.fallback) {
            (Some((_, value)), _) => Ok(value.to_string()),
            (None, Fallback::Model) => Ok(model.unwrap_or_default().to_string()),
            (None, _) => Ok(String::new()),
        }
    }

    fn count(&self, field: &Field) -> Result<u32> {
        match (self.lookup(field)?, field.fallback) {
            (Some((section, value)), _) => section.parse(field.key, value),
            (None, Fallback::Count(default)) => Ok(default),
            (None, _) => Ok(0),
        }
    }

    fn flag(&self, field: &Field) -> Result<bool> {
        match (self.lookup(field)?, field.fallback) {
            (Some((_, value)), _) => Ok(value.eq_ignore_ascii_case(self.token)),
            (None, Fallback::Flag(default)) => Ok(default),
            (None, _) => Ok(false),
        }
    }
}
