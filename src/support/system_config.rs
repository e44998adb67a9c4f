//-
// Copyright (c) 2024, Jason Lingle
//
// This file is part of Corpmail.
//
// Corpmail is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Corpmail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Corpmail. If not, see <http://www.gnu.org/licenses/>.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::support::{error::Error, file_ops::IgnoreKinds};

/// The name of the configuration file within the Corpmail root.
pub const CONFIG_FILE: &str = "corpmail.toml";

/// The system-wide configuration for Corpmail.
///
/// This is stored in a file named `corpmail.toml` under the Corpmail root,
/// which defaults to the current directory. The file is optional.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct SystemConfig {
    /// Where the account collection lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Defaults applied to newly created accounts.
    #[serde(default)]
    pub accounts: AccountsConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// The path to the account store. Relative paths are resolved against
    /// the Corpmail root.
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_file: PathBuf::from("resources/emails.emails"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AccountsConfig {
    /// Mailbox capacity, in megabytes, given to new accounts.
    pub default_mail_capacity: u32,
    /// Length of the password generated for new accounts.
    pub password_length: usize,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        AccountsConfig {
            default_mail_capacity: 500,
            password_length: 8,
        }
    }
}

impl SystemConfig {
    /// Load the configuration from `root`.
    ///
    /// A missing file yields the default configuration.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let data = fs::read(root.join(CONFIG_FILE)).ignore_not_found()?;
        Ok(toml::from_slice(&data)?)
    }

    /// Return the absolute location of the account store.
    pub fn data_file(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.data_file)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let root = tempfile::tempdir().unwrap();
        let config = SystemConfig::load(root.path()).unwrap();
        assert_eq!(SystemConfig::default(), config);
        assert_eq!(500, config.accounts.default_mail_capacity);
        assert_eq!(8, config.accounts.password_length);
        assert_eq!(
            root.path().join("resources/emails.emails"),
            config.data_file(root.path())
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE),
            "[accounts]\ndefault_mail_capacity = 1024\n",
        )
        .unwrap();

        let config = SystemConfig::load(root.path()).unwrap();
        assert_eq!(1024, config.accounts.default_mail_capacity);
        assert_eq!(8, config.accounts.password_length);
        assert_eq!(StorageConfig::default(), config.storage);
    }

    #[test]
    fn absolute_data_file_is_kept() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE),
            "[storage]\ndata_file = \"/var/lib/corpmail/accounts\"\n",
        )
        .unwrap();

        let config = SystemConfig::load(root.path()).unwrap();
        assert_eq!(
            PathBuf::from("/var/lib/corpmail/accounts"),
            config.data_file(root.path())
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE), "[accounts\n").unwrap();
        assert_matches!(Err(Error::Toml(_)), SystemConfig::load(root.path()));
    }
}
