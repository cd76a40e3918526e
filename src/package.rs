//! EML document assembler.
//!
//! Sections are accumulated in a fixed order: the `eml:eml` root first,
//! then the dataset, then related projects. Additional metadata can be
//! appended at any point. Out-of-order calls fail with
//! [`EmlError::PreconditionViolated`] instead of producing a partial
//! document.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::EmlConstants;
use crate::domain::PackageId;
use crate::error::EmlError;
use crate::sections::{AdditionalMetadataBlock, DatasetSection, ProjectSection};
use crate::xml;

pub const ROOT_ELEMENT: &str = "eml:eml";
pub const EML_NAMESPACE: &str = "https://eml.ecoinformatics.org/eml-2.2.0";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const STMML_NAMESPACE: &str = "http://www.xml-cml.org/schema/schema24";
pub const SCHEMA_LOCATION: &str = "https://eml.ecoinformatics.org/eml-2.2.0 xsd/eml.xsd";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmlAttributes {
    #[serde(rename = "packageId")]
    pub package_id: String,
    pub system: String,
    #[serde(rename = "xmlns:eml")]
    pub xmlns_eml: String,
    #[serde(rename = "xmlns:xsi")]
    pub xmlns_xsi: String,
    #[serde(rename = "xmlns:stmml")]
    pub xmlns_stmml: String,
    #[serde(rename = "xsi:schemaLocation")]
    pub schema_location: String,
}

/// Root `eml:eml` element attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmlSection {
    #[serde(rename = "$")]
    pub attributes: EmlAttributes,
    #[serde(skip)]
    package_id: PackageId,
}

impl EmlSection {
    pub fn new(package_id: &PackageId, constants: &EmlConstants) -> Self {
        Self {
            attributes: EmlAttributes {
                package_id: package_id.urn(),
                system: constants.provider_url.clone(),
                xmlns_eml: EML_NAMESPACE.to_string(),
                xmlns_xsi: XSI_NAMESPACE.to_string(),
                xmlns_stmml: STMML_NAMESPACE.to_string(),
                schema_location: SCHEMA_LOCATION.to_string(),
            },
            package_id: package_id.clone(),
        }
    }

    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PackageState {
    Empty,
    HasEml(EmlSection),
    HasDataset(EmlSection, Box<DatasetSection>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStage {
    Empty,
    HasEml,
    HasDataset,
}

#[derive(Debug, Clone)]
pub struct EmlPackage {
    state: PackageState,
    additional_metadata: Vec<AdditionalMetadataBlock>,
}

impl Default for EmlPackage {
    fn default() -> Self {
        Self::new()
    }
}

impl EmlPackage {
    pub fn new() -> Self {
        Self {
            state: PackageState::Empty,
            additional_metadata: Vec::new(),
        }
    }

    pub fn stage(&self) -> PackageStage {
        match self.state {
            PackageState::Empty => PackageStage::Empty,
            PackageState::HasEml(_) => PackageStage::HasEml,
            PackageState::HasDataset(..) => PackageStage::HasDataset,
        }
    }

    pub fn with_eml(mut self, eml: EmlSection) -> Result<Self, EmlError> {
        match self.state {
            PackageState::Empty => {
                self.state = PackageState::HasEml(eml);
                Ok(self)
            }
            _ => Err(EmlError::PreconditionViolated(
                "eml section has already been set",
            )),
        }
    }

    pub fn with_dataset(mut self, dataset: DatasetSection) -> Result<Self, EmlError> {
        match self.state {
            PackageState::HasEml(eml) => {
                self.state = PackageState::HasDataset(eml, Box::new(dataset));
                Ok(self)
            }
            PackageState::Empty => Err(EmlError::PreconditionViolated(
                "eml section must be set before the dataset section",
            )),
            PackageState::HasDataset(..) => Err(EmlError::PreconditionViolated(
                "dataset section has already been set",
            )),
        }
    }

    pub fn with_additional_metadata(
        mut self,
        blocks: impl IntoIterator<Item = AdditionalMetadataBlock>,
    ) -> Self {
        self.additional_metadata.extend(blocks);
        self
    }

    /// Nests survey sections under the dataset's project as related projects.
    pub fn with_related_projects(
        mut self,
        projects: impl IntoIterator<Item = ProjectSection>,
    ) -> Result<Self, EmlError> {
        let PackageState::HasDataset(_, dataset) = &mut self.state else {
            return Err(EmlError::PreconditionViolated(
                "dataset section must be set before related projects",
            ));
        };
        dataset.project.related_project.extend(projects);
        Ok(self)
    }

    /// Merges root, dataset and additional metadata and renders the XML.
    pub fn build(self) -> Result<String, EmlError> {
        let PackageState::HasDataset(eml, dataset) = self.state else {
            return Err(EmlError::PreconditionViolated(
                "dataset section must be set before building the document",
            ));
        };

        let known_ids = known_ids(&eml, &dataset);
        if let Some(block) = self
            .additional_metadata
            .iter()
            .find(|block| !known_ids.contains(block.describes.as_str()))
        {
            return Err(EmlError::UnknownDescribes(block.describes.clone()));
        }

        let mut root = match to_value(&eml)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        root.insert("dataset".to_string(), to_value(&dataset)?);
        if !self.additional_metadata.is_empty() {
            root.insert(
                "additionalMetadata".to_string(),
                to_value(&self.additional_metadata)?,
            );
        }

        debug!(
            package_id = %eml.package_id(),
            related_projects = dataset.project.related_project.len(),
            additional_metadata = self.additional_metadata.len(),
            "rendering EML document"
        );

        let mut document = Map::new();
        document.insert(ROOT_ELEMENT.to_string(), Value::Object(root));
        xml::render(&Value::Object(document))
    }
}

fn known_ids<'a>(eml: &'a EmlSection, dataset: &'a DatasetSection) -> BTreeSet<&'a str> {
    let mut ids = BTreeSet::new();
    ids.insert(eml.package_id().as_str());
    ids.insert(dataset.id());
    ids.insert(dataset.project.id());
    ids.extend(dataset.project.related_project.iter().map(ProjectSection::id));
    ids
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EmlError> {
    serde_json::to_value(value).map_err(|err| EmlError::Serialize(err.to_string()))
}
