//! Setup/initialization module - handles application startup tasks
//!
//! Includes:
//! - Logger initialization
//! - Folder structure initialization

use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use env_logger::Builder;
use log::{info, kv::Key};
use std::io::Write;

use crate::config::AppConfig;

// ────────────────────────────────────────────────────────────────
// Folder Initialization
// ────────────────────────────────────────────────────────────────

/// Create the directories uploads and visualizations are written to.
pub fn initialize_folder(config: &AppConfig) -> Result<()> {
    for dir in [&config.upload_dir, &config.output_dir] {
        std::fs::create_dir_all(dir).context(format!("Fail to create folder {:?}", dir))?;
    }
    info!(
        "Uploads go to {:?}, analysis output to {:?}",
        config.upload_dir, config.output_dir
    );
    Ok(())
}

// ────────────────────────────────────────────────────────────────
// Logger Initialization
// ────────────────────────────────────────────────────────────────

/// Split a `Debug`-formatted duration such as `12.3456ms` into `12.35 ms`.
fn format_duration(raw: &str) -> String {
    if let Some(idx) = raw.find(|c: char| c.is_alphabetic() || c == 'µ') {
        let (num, unit) = (&raw[..idx], &raw[idx..]);
        if let Ok(val) = num.parse::<f32>() {
            return format!("{:.2} {}", val, unit);
        }
    }
    raw.to_string()
}

pub fn initialize_logger() {
    let dim = Style::new().dimmed();
    let cyan = Style::new().fg_color(Some(AnsiColor::Cyan.into()));

    Builder::new()
        .format(move |buf, record| {
            let ts = buf.timestamp();
            let level_style = buf.default_level_style(record.level());

            let dur_raw = record
                .key_values()
                .get(Key::from("duration"))
                .map(|v| format_duration(&v.to_string()))
                .unwrap_or_default();

            // Right-align the duration field to width 10
            let dur = if dur_raw.is_empty() {
                " ".repeat(10)
            } else {
                format!("{cyan}{:>10}{cyan:#}", dur_raw)
            };

            writeln!(
                buf,
                "{dim}{ts}{dim:#} {level_style}{}{level_style:#} {dim}{}{dim:#}",
                record.level(),
                record.target()
            )?;

            let message = format!("{}", record.args());
            let subsequent_indent = " ".repeat(11);
            let mut lines = message.lines();
            if let Some(first_line) = lines.next() {
                writeln!(buf, "{} {}", dur, first_line)?;
            }
            for line in lines {
                writeln!(buf, "{}{}", subsequent_indent, line)?;
            }
            Ok(())
        })
        // Only show INFO+ globally, WARN+ for Rocket
        .filter(None, log::LevelFilter::Info)
        .filter(Some("rocket"), log::LevelFilter::Warn)
        // RUST_LOG still wins when set
        .parse_default_env()
        .init();
}
