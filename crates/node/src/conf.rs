//! `kepler.conf` reader.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONF_FILE: &str = "kepler.conf";

/// Keys are lowercased; a key may repeat and keeps every value in file order.
pub type ConfMap = HashMap<String, Vec<String>>;

/// Reads `path`; a missing file is not an error.
pub fn load_kepler_conf(path: &Path) -> Result<Option<ConfMap>, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(format!("failed to read {}: {err}", path.display())),
    };
    Ok(Some(parse_conf(&contents)))
}

/// `key=value` lines, `#` and `;` comments, and bare keys that read as "1".
pub fn parse_conf(contents: &str) -> ConfMap {
    let mut out = ConfMap::new();
    for raw_line in contents.lines() {
        let mut line = raw_line;
        if let Some(idx) = line.find(|c: char| c == '#' || c == ';') {
            line = &line[..idx];
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    out
}

/// Last value given for `key`.
pub fn conf_value<'a>(conf: &'a ConfMap, key: &str) -> Option<&'a str> {
    conf.get(key)
        .and_then(|values| values.last())
        .map(String::as_str)
}

pub fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
