use crate::driver::DriverConfig;
use crate::error::Error;
use crate::extract::Extraction;
use colored::Colorize;

const LABEL_W: usize = 16;

fn yes_no(value: bool) -> String {
    if value {
        "EC".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

pub fn print_extraction(ex: &Extraction) {
    let p = &ex.profile;
    let mut rows: Vec<(&str, String, usize)> = vec![
        row("Model", p.model.clone()),
        row("Fixed Name", p.display_name.clone()),
        row("Disk Bays", p.disk_count.to_string()),
        row("Sys Fans", p.fan_count.to_string()),
        row("CPU Fans", p.cpu_fan_count.to_string()),
        row("Temp Sensors", p.temp_sensor_count.to_string()),
        row("Serial Location", p.serial_location.clone()),
        row(
            "Fan Mask",
            format!("{} ({} channels)", ex.fan_mask(), ex.fan_mask().count()),
        ),
        row("PWM Mask", ex.pwm_mask().to_string()),
    ];
    for (label, on) in p.flags() {
        // Escape codes don't count toward the box width.
        rows.push((label, yes_no(on), 2));
    }

    let inner_w = rows
        .iter()
        .map(|(_, _, w)| LABEL_W + 2 + w)
        .max()
        .unwrap_or(40)
        .max(LABEL_W + 2 + ex.path.display().to_string().len());

    let title = ex.path.display().to_string();
    let fill = inner_w.saturating_sub(1 + title.len());
    println!("╭─ {} {}╮", title.bold(), "─".repeat(fill));

    for (label, value, width) in &rows {
        let padded = format!("{:<w$}", label, w = LABEL_W);
        let pad = inner_w.saturating_sub(LABEL_W + 2 + width);
        println!("│ {}  {}{} │", padded.dimmed(), value, " ".repeat(pad));
    }

    println!("╰{}╯", "─".repeat(inner_w + 2));

    print_disks(ex);

    for warning in &ex.warnings {
        println!("  {} {}", "warning:".yellow().bold(), warning.message);
    }
    println!();
}

fn row(label: &'static str, value: String) -> (&'static str, String, usize) {
    let width = value.chars().count();
    (label, value, width)
}

fn print_disks(ex: &Extraction) {
    let title = format!("Disk bays ({})", ex.disks.len());
    let divider_w: usize = 48;
    let fill = divider_w.saturating_sub(2 + title.len());
    println!("── {} {}", title.bold(), "─".repeat(fill));

    for disk in &ex.disks {
        println!("  {}", format!("Disk {}", disk.bay).bold());
        for (label, value) in [
            ("name", &disk.slot_name),
            ("error", &disk.err_led),
            ("present", &disk.present_led),
            ("locate", &disk.locate_led),
            ("blink", &disk.blink_led),
            ("type", &disk.bus_type),
            ("bus_type", &disk.bus_type),
        ] {
            println!("      {:<10} {}", format!("{}:", label).dimmed(), value);
        }
    }
}

/// One-line diagnostic for a profile that could not be extracted.
pub fn print_failure(err: &Error) {
    if err.is_not_supported() {
        eprintln!("{} {}", "note:".yellow(), err);
    } else {
        eprintln!("{} {}", "error:".red().bold(), err);
    }
}

pub fn print_driver(driver: &DriverConfig) {
    print!("{}", driver.to_c_initializer());
}

/// Build the `--json` document for a run.
pub fn json_report(
    extractions: &[Extraction],
    drivers: &[DriverConfig],
    failures: &[Error],
) -> serde_json::Value {
    serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "profiles": extractions.iter().zip(drivers).map(|(ex, driver)| serde_json::json!({
            "path": ex.path.display().to_string(),
            "profile": ex.profile,
            "fan_mask": ex.fan_mask().bits(),
            "pwm_mask": ex.pwm_mask().bits(),
            "fans": ex.fans.assignments,
            "disks": ex.disks.iter().map(|d| serde_json::json!({
                "disk": d.bay,
                "name": d.slot_name,
                "error": d.err_led,
                "present": d.present_led,
                "locate": d.locate_led,
                "blink": d.blink_led,
                "type": d.bus_type,
                "bus_type": d.bus_type,
            })).collect::<Vec<_>>(),
            "warnings": ex.warnings,
            "driver": driver,
        })).collect::<Vec<_>>(),
        "failures": failures.iter().map(|e| serde_json::json!({
            "path": e.path().display().to_string(),
            "kind": e.kind(),
            "message": e.to_string(),
        })).collect::<Vec<_>>(),
    })
}
