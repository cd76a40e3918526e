use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EmlError;
use crate::geometry::Feature;

/// Stable external identifier of a project or survey.
///
/// Distinct from the numeric surrogate id; this is the value that ends up in
/// `packageId` and every `describes` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId(String);

impl PackageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn urn(&self) -> String {
        format!("urn:uuid:{}", self.0)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PackageId {
    type Err = EmlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        if !is_valid {
            return Err(EmlError::InvalidPackageId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for PackageId {
    type Error = EmlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageId> for String {
    fn from(value: PackageId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(u64);

impl TaxonId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinator {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub coordinator_agency: String,
    #[serde(default)]
    pub share_contact_details: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSource {
    pub agency_name: String,
    #[serde(default)]
    pub agency_project_id: Option<String>,
    #[serde(default)]
    pub investment_action_category_name: Option<String>,
    #[serde(default)]
    pub funding_amount: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Three-level IUCN conservation action classification, stored as code ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IucnClassification {
    pub level_1: u64,
    pub level_2: u64,
    pub level_3: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partnerships {
    #[serde(default)]
    pub indigenous_partnerships: Vec<u64>,
    #[serde(default)]
    pub stakeholder_partnerships: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub geometry: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAuthor {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAttachment {
    pub id: u64,
    pub file_name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year_published: Option<i32>,
    #[serde(default)]
    pub authors: Vec<ReportAuthor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: u64,
    pub uuid: PackageId,
    pub name: String,
    #[serde(default)]
    pub project_type: Option<u64>,
    #[serde(default)]
    pub activities: Vec<u64>,
    pub objectives: String,
    #[serde(default)]
    pub caveats: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub coordinator: Coordinator,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub funding_sources: Vec<FundingSource>,
    #[serde(default)]
    pub iucn_classifications: Vec<IucnClassification>,
    #[serde(default)]
    pub partnerships: Partnerships,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub permit_number: String,
    pub permit_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurposeAndMethodology {
    #[serde(default)]
    pub intended_outcome_id: Option<u64>,
    #[serde(default)]
    pub additional_details: Option<String>,
    #[serde(default)]
    pub field_method_id: Option<u64>,
    #[serde(default)]
    pub ecological_season_id: Option<u64>,
    #[serde(default)]
    pub vantage_code_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proprietor {
    pub proprietor_type_name: String,
    pub proprietor_name: String,
    #[serde(default)]
    pub first_nations_name: Option<String>,
    #[serde(default)]
    pub category_rationale: Option<String>,
    #[serde(default)]
    pub disa_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: u64,
    pub project_id: u64,
    pub uuid: PackageId,
    pub name: String,
    pub biologist_first_name: String,
    pub biologist_last_name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub focal_species: Vec<TaxonId>,
    #[serde(default)]
    pub ancillary_species: Vec<TaxonId>,
    #[serde(default)]
    pub permits: Vec<Permit>,
    #[serde(default)]
    pub funding_sources: Vec<FundingSource>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub purpose_and_methodology: PurposeAndMethodology,
    #[serde(default)]
    pub proprietor: Option<Proprietor>,
}

impl SurveyRecord {
    /// Focal then ancillary species, first occurrence wins.
    pub fn species_ids(&self) -> Vec<TaxonId> {
        let mut ids = Vec::with_capacity(self.focal_species.len() + self.ancillary_species.len());
        for id in self.focal_species.iter().chain(&self.ancillary_species) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// Aggregated metadata graph for one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySource {
    pub survey: SurveyRecord,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub report_attachments: Vec<ReportAttachment>,
}

/// Aggregated metadata graph for one project and all of its surveys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSource {
    pub project: ProjectRecord,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub report_attachments: Vec<ReportAttachment>,
    #[serde(default)]
    pub surveys: Vec<SurveySource>,
}

impl MetadataSource {
    pub fn package_id(&self) -> &PackageId {
        &self.project.uuid
    }
}
