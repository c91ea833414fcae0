//! Server-visible metadata in `server.properties`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::manifest::PackMetadata;

const MOTD_KEY: &str = "motd";

/// `§fModpack: §2<name> §4<version>`
pub fn motd_for(metadata: &PackMetadata) -> String {
    format!(
        "\u{00A7}fModpack: \u{00A7}2{} \u{00A7}4{}",
        metadata.name, metadata.version
    )
}

/// Set the `motd` entry of a Java properties file to the pack name and version.
///
/// Every other line is preserved verbatim. A missing file is created.
/// Returns the motd that was written.
pub fn update_motd(properties_path: &Path, metadata: &PackMetadata) -> anyhow::Result<String> {
    let motd = motd_for(metadata);

    let existing = match fs::read_to_string(properties_path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).with_context(|| {
                format!("Failed to read properties: {}", properties_path.display())
            });
        }
    };

    let updated = set_property(&existing, MOTD_KEY, &motd);

    let tmp = properties_path.with_extension(format!("properties.{}.tmp", std::process::id()));
    fs::write(&tmp, updated)
        .with_context(|| format!("Failed to write properties: {}", tmp.display()))?;
    fs::rename(&tmp, properties_path).with_context(|| {
        format!("Failed to replace properties: {}", properties_path.display())
    })?;

    info!("Set the motd to \"{}\" in \"{}\"", motd, properties_path.display());
    Ok(motd)
}

/// Replace (or append) `key` in properties text, keeping all other lines.
fn set_property(content: &str, key: &str, value: &str) -> String {
    let entry = format!("{}={}", escape_key(key), escape_value(value));
    let mut out: Vec<String> = Vec::new();
    let mut replaced = false;
    let mut continuation = false;
    let mut dropping = false;

    for line in content.lines() {
        if continuation {
            continuation = ends_with_continuation(line);
            if !dropping {
                out.push(line.to_string());
            }
            continue;
        }
        dropping = false;

        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            out.push(line.to_string());
            continue;
        }

        continuation = ends_with_continuation(line);
        if raw_key(trimmed) == key {
            dropping = true;
            if !replaced {
                out.push(entry.clone());
                replaced = true;
            }
            continue;
        }
        out.push(line.to_string());
    }

    if !replaced {
        out.push(entry);
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Unescaped key of a logical line.
fn raw_key(line: &str) -> String {
    let mut key = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(next);
                }
            }
            '=' | ':' | ' ' | '\t' | '\x0c' => break,
            _ => key.push(ch),
        }
    }
    key
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch == ' ' {
            out.push_str("\\ ");
        } else {
            push_escaped(&mut out, ch);
        }
    }
    out
}

/// Escape a value the way Java's `Properties.store` does: separators and
/// comment markers get a backslash, anything outside printable ASCII
/// becomes `\uXXXX` (UTF-16 code units).
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (index, ch) in value.chars().enumerate() {
        if ch == ' ' && index == 0 {
            out.push_str("\\ ");
        } else {
            push_escaped(&mut out, ch);
        }
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\x0c' => out.push_str("\\f"),
        '=' | ':' | '#' | '!' => {
            out.push('\\');
            out.push(ch);
        }
        c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04X}", unit));
            }
        }
        c => out.push(c),
    }
}
