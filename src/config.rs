// Copyright 2025 Fernando Borretti
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

use std::fs::read_to_string;

use serde::Deserialize;

use classcards_core::error::Fallible;
use classcards_core::error::fail;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DB_PATH: &str = "classcards.db";

/// Optional on-disk configuration. Every field is optional, and
/// command-line flags win over file values.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
}

impl ConfigFile {
    pub fn load(path: Option<&str>) -> Fallible<Self> {
        let Some(path) = path else {
            return Ok(ConfigFile::default());
        };
        let text = read_to_string(path)?;
        match toml::from_str(&text) {
            Ok(config) => Ok(config),
            Err(e) => fail(format!("Failed to parse config file: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_no_file() -> Fallible<()> {
        let config = ConfigFile::load(None)?;
        assert!(config.host.is_none());
        assert!(config.port.is_none());
        assert!(config.database.is_none());
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("classcards.toml");
        write(&path, "port = 9001\ndatabase = \"/tmp/cards.db\"\n")?;
        let config = ConfigFile::load(path.to_str())?;
        assert_eq!(config.port, Some(9001));
        assert_eq!(config.database.as_deref(), Some("/tmp/cards.db"));
        assert!(config.host.is_none());
        Ok(())
    }

    #[test]
    fn test_unknown_key() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("classcards.toml");
        write(&path, "prot = 9001\n")?;
        assert!(ConfigFile::load(path.to_str()).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(ConfigFile::load(Some("./derpherp.toml")).is_err());
    }
}
