use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Default manifest file name, looked up in the working directory.
pub const MANIFEST_FILE: &str = "CHECKSUMS.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChecksumEntry {
    /// Key of the entry in `Manifest::checksums`; not repeated inside the JSON object.
    #[serde(skip)]
    pub relative_path: String,
    pub sha256: String,
    pub size: u64,
    pub modified: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Manifest {
    pub generated: String,
    pub total_files: usize,
    pub checksums: BTreeMap<String, ChecksumEntry>,
}

impl Manifest {
    pub fn new(generated: String, entries: Vec<ChecksumEntry>) -> Self {
        let checksums: BTreeMap<String, ChecksumEntry> =
            entries.into_iter().map(|e| (e.relative_path.clone(), e)).collect();
        Self { generated, total_files: checksums.len(), checksums }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut f = File::create(path)?;
        f.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        f.write_all(b"\n")?;
        Ok(())
    }
}

/// Digest recorded for one path. The current format stores an object with a
/// `sha256` member; older manifests store the bare hex string.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordedDigest {
    Bare(String),
    Entry { sha256: String },
}

impl RecordedDigest {
    pub fn sha256(&self) -> &str {
        match self {
            RecordedDigest::Bare(s) => s,
            RecordedDigest::Entry { sha256 } => sha256,
        }
    }
}

/// Expected digests of a manifest as read from disk. The shape is decided once
/// here: a `checksums` key selects the current format, a `files` key the legacy one.
#[derive(Clone, Debug)]
pub enum ManifestDigests {
    Checksums(BTreeMap<String, RecordedDigest>),
    Files(BTreeMap<String, String>),
}

impl ManifestDigests {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let mut doc: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::Format(format!("manifest is not valid JSON: {e}")))?;
        let Some(obj) = doc.as_object_mut() else {
            return Err(Error::Format("manifest root must be a JSON object".into()));
        };
        if let Some(v) = obj.remove("checksums") {
            let map = serde_json::from_value(v)
                .map_err(|e| Error::Format(format!("bad 'checksums' table: {e}")))?;
            Ok(ManifestDigests::Checksums(map))
        } else if let Some(v) = obj.remove("files") {
            let map = serde_json::from_value(v)
                .map_err(|e| Error::Format(format!("bad 'files' table: {e}")))?;
            Ok(ManifestDigests::Files(map))
        } else {
            Err(Error::Format("manifest has neither 'checksums' nor 'files'".into()))
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        Self::from_json(&std::fs::read(path)?)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ManifestDigests::Files(_))
    }

    pub fn len(&self) -> usize {
        match self {
            ManifestDigests::Checksums(m) => m.len(),
            ManifestDigests::Files(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(relative_path, expected_sha256)` pairs in path order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        match self {
            ManifestDigests::Checksums(m) => {
                Box::new(m.iter().map(|(p, d)| (p.as_str(), d.sha256())))
            }
            ManifestDigests::Files(m) => Box::new(m.iter().map(|(p, d)| (p.as_str(), d.as_str()))),
        }
    }
}

impl From<&Manifest> for ManifestDigests {
    fn from(mf: &Manifest) -> Self {
        ManifestDigests::Checksums(
            mf.checksums
                .iter()
                .map(|(p, e)| (p.clone(), RecordedDigest::Entry { sha256: e.sha256.clone() }))
                .collect(),
        )
    }
}
