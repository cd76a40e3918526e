#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use eml_compiler::domain::{
    Coordinator, FundingSource, Location, MetadataSource, ProjectRecord, PurposeAndMethodology,
    SurveyRecord, SurveySource, TaxonId,
};
use eml_compiler::error::EmlError;
use eml_compiler::taxonomy::{TaxonRecord, TaxonomyClient};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn coordinator(share: bool) -> Coordinator {
    Coordinator {
        first_name: "Robin".to_string(),
        last_name: "Hale".to_string(),
        email_address: "robin.hale@example.org".to_string(),
        coordinator_agency: "Wildlife Branch".to_string(),
        share_contact_details: share,
    }
}

pub fn project(uuid: &str) -> ProjectRecord {
    ProjectRecord {
        id: 1,
        uuid: uuid.parse().unwrap(),
        name: "Caribou recovery".to_string(),
        project_type: None,
        activities: Vec::new(),
        objectives: "Restore caribou habitat".to_string(),
        caveats: None,
        comments: None,
        start_date: date(2021, 4, 1),
        end_date: Some(date(2024, 3, 31)),
        coordinator: coordinator(true),
        location: Location::default(),
        funding_sources: Vec::new(),
        iucn_classifications: Vec::new(),
        partnerships: Default::default(),
    }
}

pub fn funding(agency: &str) -> FundingSource {
    FundingSource {
        agency_name: agency.to_string(),
        agency_project_id: Some("AG-1".to_string()),
        investment_action_category_name: Some("Habitat".to_string()),
        funding_amount: Some(120_000),
        start_date: date(2021, 4, 1),
        end_date: date(2022, 3, 31),
    }
}

pub fn survey(id: u64, uuid: &str) -> SurveyRecord {
    SurveyRecord {
        id,
        project_id: 1,
        uuid: uuid.parse().unwrap(),
        name: format!("Survey {id}"),
        biologist_first_name: "Kai".to_string(),
        biologist_last_name: "Moreno".to_string(),
        start_date: date(2022, 1, 10),
        end_date: None,
        focal_species: Vec::new(),
        ancillary_species: Vec::new(),
        permits: Vec::new(),
        funding_sources: Vec::new(),
        location: Location::default(),
        purpose_and_methodology: PurposeAndMethodology::default(),
        proprietor: None,
    }
}

pub fn metadata(project: ProjectRecord) -> MetadataSource {
    MetadataSource {
        project,
        attachments: Vec::new(),
        report_attachments: Vec::new(),
        surveys: Vec::new(),
    }
}

pub fn survey_source(survey: SurveyRecord) -> SurveySource {
    SurveySource {
        survey,
        attachments: Vec::new(),
        report_attachments: Vec::new(),
    }
}

pub fn taxon(id: u64, code: &str) -> TaxonRecord {
    TaxonRecord {
        id: TaxonId::new(id),
        rank: "Species".to_string(),
        unit_names: vec!["Rangifer".to_string(), "tarandus".to_string()],
        english_name: Some("Caribou".to_string()),
        code: code.to_string(),
    }
}

/// Taxonomy client answering from a fixed table and recording requests.
#[derive(Default)]
pub struct StaticTaxonomy {
    records: BTreeMap<u64, TaxonRecord>,
    pub requests: Mutex<Vec<Vec<u64>>>,
}

impl StaticTaxonomy {
    pub fn new(records: Vec<TaxonRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.get(), record))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl TaxonomyClient for StaticTaxonomy {
    fn lookup(&self, ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError> {
        self.requests
            .lock()
            .unwrap()
            .push(ids.iter().map(|id| id.get()).collect());
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(&id.get()).cloned())
            .collect())
    }
}

pub struct FailingTaxonomy;

impl TaxonomyClient for FailingTaxonomy {
    fn lookup(&self, _ids: &[TaxonId]) -> Result<Vec<TaxonRecord>, EmlError> {
        Err(EmlError::TaxonomyHttp("connection refused".to_string()))
    }
}

pub fn elements<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == name)
        .collect()
}

pub fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

pub fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|child| child.text())
}
