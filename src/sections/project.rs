use chrono::NaiveDate;
use serde::Serialize;

use crate::codes::{CodeSet, CodeTableResolver};
use crate::constants::EmlConstants;
use crate::domain::{MetadataSource, SurveySource};
use crate::sections::coverage::{
    Coverage, TaxonomicCoverage, build_geographic_coverage, build_temporal_coverage,
};
use crate::sections::design::{DesignDescription, build_design_description};
use crate::sections::funding::{FundingSection, build_funding};
use crate::sections::party::{
    ResponsibleParty, build_contact, build_personnel, build_survey_personnel,
};
use crate::sections::{IdAttributes, Para, TextBody, TextSection};

pub const DATASET_LANGUAGE: &str = "English";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyAreaDescription {
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSection {
    #[serde(rename = "$")]
    pub attributes: IdAttributes,
    pub title: String,
    pub personnel: ResponsibleParty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#abstract: Option<TextBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingSection>,
    pub study_area_description: StudyAreaDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_description: Option<DesignDescription>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_project: Vec<ProjectSection>,
}

impl ProjectSection {
    pub fn id(&self) -> &str {
        &self.attributes.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataProvider {
    pub organization_name: String,
    pub online_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSection {
    #[serde(rename = "$")]
    pub attributes: IdAttributes,
    pub title: String,
    pub creator: ResponsibleParty,
    pub metadata_provider: MetadataProvider,
    pub pub_date: String,
    pub language: String,
    pub intellectual_rights: Para,
    pub contact: ResponsibleParty,
    pub project: ProjectSection,
}

impl DatasetSection {
    pub fn id(&self) -> &str {
        &self.attributes.id
    }
}

/// Dataset section for the project. Surveys are attached later as related
/// projects by the package.
pub fn build_dataset_section(
    source: &MetadataSource,
    constants: &EmlConstants,
    pub_date: NaiveDate,
) -> DatasetSection {
    let project = &source.project;
    let contact = build_contact(&project.coordinator);
    DatasetSection {
        attributes: IdAttributes {
            id: source.package_id().as_str().to_string(),
            system: constants.provider_url.clone(),
        },
        title: project.name.clone(),
        creator: contact.clone(),
        metadata_provider: MetadataProvider {
            organization_name: constants.organization_name.clone(),
            online_url: constants.organization_url.clone(),
        },
        pub_date: pub_date.format("%Y-%m-%d").to_string(),
        language: DATASET_LANGUAGE.to_string(),
        intellectual_rights: Para {
            para: constants.intellectual_rights.clone(),
        },
        contact,
        project: build_project_section(source, constants),
    }
}

pub fn build_project_section(source: &MetadataSource, constants: &EmlConstants) -> ProjectSection {
    let project = &source.project;
    let section = [
        Some(TextSection::new("Objectives", project.objectives.clone())),
        TextSection::optional("Caveats", project.caveats.as_deref()),
        TextSection::optional("Comments", project.comments.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    ProjectSection {
        attributes: IdAttributes {
            id: source.package_id().as_str().to_string(),
            system: constants.provider_url.clone(),
        },
        title: project.name.clone(),
        personnel: build_personnel(&project.coordinator),
        r#abstract: Some(TextBody { section }),
        funding: build_funding(&project.funding_sources),
        study_area_description: StudyAreaDescription {
            coverage: Coverage {
                geographic_coverage: build_geographic_coverage(&project.location),
                temporal_coverage: build_temporal_coverage(project.start_date, project.end_date),
                taxonomic_coverage: None,
            },
        },
        design_description: None,
        related_project: Vec::new(),
    }
}

/// Related-project section for one survey.
///
/// `taxonomic_coverage` comes from the taxonomy lookup done by the caller.
pub fn build_survey_section<C: CodeTableResolver + ?Sized>(
    source: &SurveySource,
    taxonomic_coverage: Option<TaxonomicCoverage>,
    constants: &EmlConstants,
    codes: &C,
) -> ProjectSection {
    let survey = &source.survey;
    let methodology = &survey.purpose_and_methodology;
    let intended_outcome = methodology
        .intended_outcome_id
        .and_then(|id| codes.resolve(CodeSet::IntendedOutcome, id));
    let section = [
        TextSection::optional("Intended Outcomes", intended_outcome.as_deref()),
        TextSection::optional(
            "Additional Details",
            methodology.additional_details.as_deref(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    ProjectSection {
        attributes: IdAttributes {
            id: survey.uuid.as_str().to_string(),
            system: constants.provider_url.clone(),
        },
        title: survey.name.clone(),
        personnel: build_survey_personnel(survey),
        r#abstract: (!section.is_empty()).then_some(TextBody { section }),
        funding: build_funding(&survey.funding_sources),
        study_area_description: StudyAreaDescription {
            coverage: Coverage {
                geographic_coverage: build_geographic_coverage(&survey.location),
                temporal_coverage: build_temporal_coverage(survey.start_date, survey.end_date),
                taxonomic_coverage,
            },
        },
        design_description: build_design_description(methodology, codes),
        related_project: Vec::new(),
    }
}
