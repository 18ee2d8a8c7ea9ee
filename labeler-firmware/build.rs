//! Build script for labeler-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml and turns it into the default configuration

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use labeler_core::config::{MachineConfig, Param, SensorLevels};
use labeler_hal::gpio::ActiveLevel;

/// Table holding sensor polarity; every other table holds parameters
const SENSOR_TABLE: &str = "sensors";

fn main() {
    setup_linker();
    let (config, levels) = load_config();
    write_defaults(&config, &levels);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and validate machine.toml
fn load_config() -> (MachineConfig, SensorLevels) {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a machine.toml configuration file.        ║\n\
            ║  Please create one in the labeler-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &[e.to_string()]),
    };

    let document: toml::Table = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in machine.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut config = MachineConfig::default();
    let mut levels = SensorLevels::default();
    let mut errors = Vec::new();
    let mut seen = Vec::new();

    for (table_name, table) in &document {
        let Some(table) = table.as_table() else {
            errors.push(format!("`{}` must be a table", table_name));
            continue;
        };

        if table_name == SENSOR_TABLE {
            read_levels(table, &mut levels, &mut errors);
            continue;
        }

        for (key, value) in table {
            let Some(param) = Param::from_name(key) else {
                errors.push(format!("[{}] unknown parameter `{}`", table_name, key));
                continue;
            };
            let Some(value) = value.as_integer().and_then(|v| u32::try_from(v).ok()) else {
                errors.push(format!("`{}` must be a non-negative integer", key));
                continue;
            };
            if seen.contains(&param) {
                errors.push(format!("`{}` is set more than once", key));
            }
            seen.push(param);
            if let Err(e) = config.set(param, value) {
                errors.push(format!("`{}` = {}: {:?}", key, value, e));
            }
        }
    }

    for param in Param::ALL {
        if !seen.contains(&param) {
            errors.push(format!("missing parameter `{}`", param.name()));
        }
    }

    if errors.is_empty() {
        if let Err(e) = config.validate() {
            errors.push(format!("rejected by validation: {:?}", e));
        }
    }

    if !errors.is_empty() {
        fail("Invalid configuration in machine.toml", &errors);
    }

    println!("cargo:warning=machine.toml validated successfully");
    (config, levels)
}

fn read_levels(table: &toml::Table, levels: &mut SensorLevels, errors: &mut Vec<String>) {
    for (key, value) in table {
        let slot = match key.as_str() {
            "swing_right" => &mut levels.swing_right,
            "swing_left" => &mut levels.swing_left,
            "axis_upper" => &mut levels.axis_upper,
            "axis_lower" => &mut levels.axis_lower,
            "probe" => &mut levels.probe,
            _ => {
                errors.push(format!("[{}] unknown sensor `{}`", SENSOR_TABLE, key));
                continue;
            }
        };
        match value.as_str() {
            Some("high") => *slot = ActiveLevel::High,
            Some("low") => *slot = ActiveLevel::Low,
            _ => errors.push(format!("sensor `{}` must be \"high\" or \"low\"", key)),
        }
    }
}

/// Emit `DEFAULT_CONFIG` and `DEFAULT_LEVELS` into OUT_DIR/defaults.rs
fn write_defaults(config: &MachineConfig, levels: &SensorLevels) {
    let mut out = String::new();
    out.push_str("// Generated from machine.toml by build.rs\n\n");

    out.push_str("pub const DEFAULT_CONFIG: MachineConfig = MachineConfig {\n");
    for param in Param::ALL {
        writeln!(out, "    {}: {},", param.name(), config.get(param)).unwrap();
    }
    out.push_str("};\n\n");

    out.push_str("pub const DEFAULT_LEVELS: SensorLevels = SensorLevels {\n");
    let sensors = [
        ("swing_right", levels.swing_right),
        ("swing_left", levels.swing_left),
        ("axis_upper", levels.axis_upper),
        ("axis_lower", levels.axis_lower),
        ("probe", levels.probe),
    ];
    for (name, level) in sensors {
        writeln!(out, "    {}: ActiveLevel::{:?},", name, level).unwrap();
    }
    out.push_str("};\n");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("defaults.rs"), out).unwrap();
}

/// Abort the build with a boxed error listing
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
