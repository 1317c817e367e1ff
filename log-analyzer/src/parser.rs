use std::collections::HashMap;

use regex::Regex;

/// Compiled named-field pattern applied to individual log lines.
#[derive(Debug, Clone)]
pub struct LinePattern {
    regex: Regex,
}

impl LinePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.regex.capture_names().flatten().any(|n| n == name)
    }

    /// Captured fields keyed by group name, or `None` when the line does not
    /// match. Groups that did not participate in the match are left out.
    pub fn parse_line(&self, line: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(line)?;
        let fields = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Some(fields)
    }
}
