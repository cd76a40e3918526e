//! Section builders.
//!
//! Each builder is a pure function over a slice of the metadata source and
//! returns a serializable EML fragment. Optional sections come back as
//! `Option` and are dropped by the caller when absent. Field order in these
//! types is element order in the rendered document.

pub mod additional;
pub mod coverage;
pub mod design;
pub mod funding;
pub mod party;
pub mod project;

use serde::Serialize;

pub use additional::AdditionalMetadataBlock;
pub use coverage::{Coverage, GeographicCoverage, TaxonomicCoverage, TemporalCoverage};
pub use design::DesignDescription;
pub use funding::FundingSection;
pub use party::ResponsibleParty;
pub use project::{DatasetSection, ProjectSection};

/// `id` and `system` attributes shared by dataset and project elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdAttributes {
    pub id: String,
    pub system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Para {
    pub para: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemizedList {
    pub itemizedlist: ListItems,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItems {
    pub listitem: Vec<Para>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParaContent {
    Text(String),
    List(ItemizedList),
}

/// `<section><title/><para/></section>`, optionally with nested sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSection {
    pub title: String,
    pub para: ParaContent,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<TextSection>,
}

impl TextSection {
    pub fn new(title: impl Into<String>, para: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            para: ParaContent::Text(para.into()),
            section: Vec::new(),
        }
    }

    /// Section only when `para` has non-blank text.
    pub fn optional(title: &str, para: Option<&str>) -> Option<Self> {
        para.map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| Self::new(title, text))
    }

    pub fn list(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            para: ParaContent::List(ItemizedList {
                itemizedlist: ListItems {
                    listitem: items.into_iter().map(|para| Para { para }).collect(),
                },
            }),
            section: Vec::new(),
        }
    }
}

/// Container of text sections, used for `abstract` and `description`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    pub section: Vec<TextSection>,
}
