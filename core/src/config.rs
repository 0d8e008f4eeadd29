use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Which Snowball algorithm the default lemmatizer applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Russian,
    English,
    /// Cyrillic tokens go to Russian, Latin tokens to English.
    #[default]
    Auto,
}

/// What a build does when the index already holds postings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReindexPolicy {
    /// Fail with `IndexError::AlreadyIndexed`.
    Reject,
    /// Drop every posting, keep the term dictionary, index again.
    ///
    /// Postings are cleared before the first document is appended. A build
    /// that fails partway leaves only the documents appended before the
    /// failure; run the build again to restore a complete index.
    #[default]
    Rebuild,
    /// Append on top of existing postings; repeated builds inflate match counts.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub index_path: PathBuf,
    pub docs_path: PathBuf,
    pub language: Language,
    pub reindex: ReindexPolicy,
    /// Open throwaway databases that vanish on drop.
    pub temporary: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./index.db"),
            docs_path: PathBuf::from("./docs.db"),
            language: Language::default(),
            reindex: ReindexPolicy::default(),
            temporary: false,
        }
    }
}

impl IndexConfig {
    pub fn temporary() -> Self {
        Self { temporary: true, ..Self::default() }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut f = File::open(path.as_ref())?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        let cfg: IndexConfig = serde_json::from_str(&buf)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.temporary {
            if self.index_path.as_os_str().is_empty() {
                return Err(IndexError::Config("index_path must not be empty".into()));
            }
            if self.index_path == self.docs_path {
                return Err(IndexError::Config("index_path and docs_path must differ".into()));
            }
        }
        Ok(())
    }

    pub(crate) fn sled_config(&self, path: &Path) -> sled::Config {
        if self.temporary {
            sled::Config::new().temporary(true)
        } else {
            sled::Config::new().path(path)
        }
    }
}
