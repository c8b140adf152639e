//! Builder for test configurations.

#![allow(dead_code)]

use std::path::Path;

use serde_json::{json, Value};

use signbook::config::{load_config_from_str, Config};

/// Builds a `Config` through the real loader, so schema and semantic
/// validation apply to every test configuration.
pub struct ConfigBuilder {
    value: Value,
}

impl ConfigBuilder {
    pub fn new(root: &Path) -> Self {
        Self {
            value: json!({
                "version": "1.0",
                "input_directory": root.join("input"),
                "output_directory": root.join("output"),
                "processed_directory": root.join("processed"),
                "error_directory": root.join("error"),
                "encoding": { "input": "UTF-8", "output": "UTF-8" },
                "polling_interval_ms": 3_600_000
            }),
        }
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.value["input_file_pattern"] = json!(pattern);
        self
    }

    pub fn input_encoding(mut self, label: &str) -> Self {
        self.value["encoding"]["input"] = json!(label);
        self
    }

    pub fn output_encoding(mut self, label: &str) -> Self {
        self.value["encoding"]["output"] = json!(label);
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.value["page_separator"] = json!(separator);
        self
    }

    pub fn fixed_marker(mut self, marker: &str) -> Self {
        self.value["marker"] = json!({ "strategy": "fixed", "marker": marker });
        self
    }

    pub fn stored_marker(mut self) -> Self {
        self.value["marker"] = json!({ "strategy": "stored" });
        self
    }

    pub fn catalog_marker(mut self, detect_lines: usize) -> Self {
        self.value["marker"] = json!({ "strategy": "catalog", "detect_lines": detect_lines });
        self
    }

    pub fn contains_matching(mut self) -> Self {
        self.value["marker"]["match_mode"] = json!("contains");
        self
    }

    pub fn build(self) -> Config {
        load_config_from_str(&self.value.to_string()).expect("test config should be valid")
    }
}
