//! XML parameter presets:
//!
//! ```xml
//! <eyeball>
//!   <param name="pupilSize">0.2</param>
//!   <param name="veinColor">200 50 50</param>
//! </eyeball>
//! ```

use std::path::{Path, PathBuf};

use log::info;
use roxmltree::{Document, Node};
use thiserror::Error;

use crate::assets::{read_asset, AssetError};
use crate::binder::ParameterBinder;
use crate::params::{ParamError, ParamId, ParamValue};

pub const ROOT_TAG: &str = "eyeball";
pub const PARAM_TAG: &str = "param";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("invalid preset XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("preset root must be <eyeball>, found <{0}>")]
    UnexpectedRoot(String),
    #[error("<param> on line {line} has no name attribute")]
    MissingName { line: u32 },
    #[error("line {line}: {source}")]
    Param {
        line: u32,
        #[source]
        source: ParamError,
    },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// One `<param>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetEntry {
    pub name: String,
    pub text: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preset {
    pub entries: Vec<PresetEntry>,
}

impl Preset {
    pub fn from_xml(xml: &str) -> Result<Self, PresetError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        if !root.has_tag_name(ROOT_TAG) {
            return Err(PresetError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut entries = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name(PARAM_TAG)) {
            let line = line_of(&document, &node);
            let name = node
                .attribute("name")
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or(PresetError::MissingName { line })?;
            entries.push(PresetEntry {
                name: name.to_string(),
                text: node.text().map(str::trim).unwrap_or_default().to_string(),
                line,
            });
        }
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let bytes = read_asset(path)?;
        let xml = String::from_utf8(bytes).map_err(|_| PresetError::Encoding {
            path: path.to_path_buf(),
        })?;
        let preset = Self::from_xml(&xml)?;
        info!(
            "preset {} read ({} parameters)",
            path.display(),
            preset.entries.len()
        );
        Ok(preset)
    }

    /// Parses and clamps every entry, failing on the first bad one.
    pub fn resolve(&self) -> Result<Vec<(ParamId, ParamValue)>, PresetError> {
        self.entries
            .iter()
            .map(|entry| {
                let id = ParamId::from_name(&entry.name).ok_or_else(|| PresetError::Param {
                    line: entry.line,
                    source: ParamError::UnknownParameter(entry.name.clone()),
                })?;
                let spec = id.spec();
                let value = spec
                    .parse(&entry.text)
                    .and_then(|value| spec.clamp(value))
                    .map_err(|source| PresetError::Param {
                        line: entry.line,
                        source,
                    })?;
                Ok((id, value))
            })
            .collect()
    }

    /// Applies the whole preset through the binder, which clamps each value.
    pub fn apply(&self, binder: &mut ParameterBinder) -> Result<usize, PresetError> {
        let values = self.resolve()?;
        for (entry, &(id, value)) in self.entries.iter().zip(&values) {
            binder
                .set_param(id, value)
                .map_err(|source| PresetError::Param {
                    line: entry.line,
                    source,
                })?;
        }
        Ok(values.len())
    }
}

fn line_of(document: &Document<'_>, node: &Node<'_, '_>) -> u32 {
    document.text_pos_at(node.range().start).row
}
