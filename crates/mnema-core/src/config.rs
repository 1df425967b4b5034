// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Limits and checks applied to every save and load pass.

use serde::{Deserialize, Serialize};

/// Configuration shared by [`GraphWriter`](crate::GraphWriter) and
/// [`GraphReader`](crate::GraphReader).
///
/// The length limits bound the allocations a reader performs on behalf of a
/// possibly corrupt stream; the writer enforces the same limits so that
/// anything it produces can be read back with the same configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Maximum byte length of a string field or type tag.
    pub max_string_len: u32,
    /// Maximum byte length of a blob.
    pub max_blob_len: u32,
    /// Maximum element count of a reference sequence.
    pub max_sequence_len: u32,
    /// Maximum object nesting depth of a pass.
    pub max_depth: usize,
    /// Verify declared field schemas while streaming.
    pub check_schema: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_string_len: 64 * 1024,
            max_blob_len: 256 * 1024 * 1024,
            max_sequence_len: 16 * 1024 * 1024,
            max_depth: 512,
            check_schema: cfg!(debug_assertions),
        }
    }
}

impl StreamConfig {
    /// Load configuration from a JSON string. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StreamConfig::from_json(r#"{ "max_depth": 8, "check_schema": true }"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(config.check_schema);
        assert_eq!(config.max_blob_len, StreamConfig::default().max_blob_len);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.json");
        let path = path.to_str().unwrap();

        let config = StreamConfig {
            max_string_len: 128,
            ..Default::default()
        };
        config.to_file(path).unwrap();
        assert_eq!(StreamConfig::from_file(path).unwrap(), config);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(StreamConfig::from_json("{ max_depth: }").is_err());
    }
}
