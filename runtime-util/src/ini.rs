//! INI file parsing (component O), grounded on the original's
//! `pinifile.c`: sections, `key = value` pairs, `;`/`#` comments, quoted
//! values, `{ item item }` lists, and BOM stripping — but returning an
//! in-memory structure from a `&str`/`Read` source rather than mutating a
//! handle in place.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use multios_runtime_core::error::{Domain, Error};

/// A parsed INI document: an ordered list of sections, each holding an
/// ordered list of `key = value` parameters.
#[derive(Debug, Clone, Default)]
pub struct IniFile {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, Default)]
struct Section {
    name: String,
    keys: Vec<(String, String)>,
}

fn strip_bom(line: &str) -> &str {
    let bytes = line.as_bytes();
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &line[3..]
    } else if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        &line[2..]
    } else {
        line
    }
}

fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
        {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    // Unquoted values run up to the first `;` or `#` comment marker.
    trimmed.split(&[';', '#'][..]).next().unwrap_or("").trim().to_string()
}

impl IniFile {
    /// Parses INI syntax from an in-memory string.
    pub fn parse_str(text: &str) -> Result<Self, Error> {
        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<Section> = None;

        for raw_line in text.lines() {
            let line = strip_bom(raw_line).trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                if let Some(section) = current.take() {
                    if !section.keys.is_empty() {
                        sections.push(section);
                    }
                }
                let name = line[1..line.len() - 1].trim().to_string();
                current = Some(Section { name, keys: Vec::new() });
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = unquote(value);
                if let Some(section) = current.as_mut() {
                    section.keys.push((key, value));
                }
            }
        }

        if let Some(section) = current.take() {
            if !section.keys.is_empty() {
                sections.push(section);
            }
        }

        Ok(IniFile { sections })
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut text = String::new();
        std::fs::File::open(path.as_ref())
            .map_err(|e| Error::from_io(Domain::Io, e))?
            .read_to_string(&mut text)
            .map_err(|e| Error::from_io(Domain::Io, e))?;
        Self::parse_str(&text)
    }

    pub fn sections(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn keys(&self, section: &str) -> Vec<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.keys.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_key(&self, section: &str, key: &str) -> bool {
        self.find(section, key).is_some()
    }

    fn find(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .and_then(|s| s.keys.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.as_str())
    }

    pub fn parameter_string(&self, section: &str, key: &str, default: &str) -> String {
        self.find(section, key).unwrap_or(default).to_string()
    }

    pub fn parameter_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.find(section, key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    pub fn parameter_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.find(section, key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    pub fn parameter_boolean(&self, section: &str, key: &str, default: bool) -> bool {
        match self.find(section, key) {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                other => other.parse::<i64>().map(|n| n > 0).unwrap_or(default),
            },
            None => default,
        }
    }

    /// Parses a `{ item item item }`-style list value.
    pub fn parameter_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        let val = self.find(section, key)?.trim();
        if val.len() < 2 || !val.starts_with('{') || !val.ends_with('}') {
            return None;
        }
        Some(val[1..val.len() - 1].split_whitespace().map(|s| s.to_string()).collect())
    }

    pub fn to_map(&self) -> HashMap<String, HashMap<String, String>> {
        self.sections
            .iter()
            .map(|s| (s.name.clone(), s.keys.iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; comment line
[general]
name = \"multios\"
count = 42
ratio = 3.5
enabled = true
tags = { alpha beta gamma }

[empty_but_present]
only_key = value ; trailing comment
";

    #[test]
    fn parses_sections_and_keys() {
        let ini = IniFile::parse_str(SAMPLE).unwrap();
        assert_eq!(ini.sections(), vec!["general", "empty_but_present"]);
        assert_eq!(ini.keys("general"), vec!["name", "count", "ratio", "enabled", "tags"]);
    }

    #[test]
    fn reads_typed_parameters_with_defaults() {
        let ini = IniFile::parse_str(SAMPLE).unwrap();
        assert_eq!(ini.parameter_string("general", "name", ""), "multios");
        assert_eq!(ini.parameter_int("general", "count", 0), 42);
        assert_eq!(ini.parameter_double("general", "ratio", 0.0), 3.5);
        assert!(ini.parameter_boolean("general", "enabled", false));
        assert_eq!(ini.parameter_string("general", "missing", "fallback"), "fallback");
    }

    #[test]
    fn parses_brace_delimited_lists() {
        let ini = IniFile::parse_str(SAMPLE).unwrap();
        assert_eq!(ini.parameter_list("general", "tags"), Some(vec!["alpha".into(), "beta".into(), "gamma".into()]));
    }

    #[test]
    fn strips_inline_comment_from_unquoted_value() {
        let ini = IniFile::parse_str(SAMPLE).unwrap();
        assert_eq!(ini.parameter_string("empty_but_present", "only_key", ""), "value");
    }

    #[test]
    fn section_with_no_keys_is_dropped() {
        let ini = IniFile::parse_str("[dangling]\n[general]\nk = v\n").unwrap();
        assert_eq!(ini.sections(), vec!["general"]);
    }
}
