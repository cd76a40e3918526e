use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::codes::{CodeSet, CodeTableResolver};
use crate::domain::{
    Attachment, MetadataSource, PackageId, ReportAttachment, SurveySource,
};

/// Annotation attached to the entity whose package id is `describes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdditionalMetadataBlock {
    pub describes: String,
    pub metadata: Value,
}

impl AdditionalMetadataBlock {
    pub fn new(describes: &PackageId, kind: &str, body: Value) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert(kind.to_string(), body);
        Self {
            describes: describes.as_str().to_string(),
            metadata: Value::Object(metadata),
        }
    }

    /// Category name, the single top-level key of `metadata`.
    pub fn kind(&self) -> Option<&str> {
        self.metadata
            .as_object()
            .and_then(|map| map.keys().next())
            .map(String::as_str)
    }
}

/// Every project-level block followed by each survey's blocks.
pub fn build_additional_metadata<C: CodeTableResolver + ?Sized>(
    source: &MetadataSource,
    codes: &C,
) -> Vec<AdditionalMetadataBlock> {
    let mut blocks = build_project_blocks(source, codes);
    for survey in &source.surveys {
        blocks.extend(build_survey_blocks(survey));
    }
    blocks
}

pub fn build_project_blocks<C: CodeTableResolver + ?Sized>(
    source: &MetadataSource,
    codes: &C,
) -> Vec<AdditionalMetadataBlock> {
    let package_id = source.package_id();
    let project = &source.project;
    let blocks = [
        project_type_block(package_id, project.project_type, codes),
        activities_block(package_id, &project.activities, codes),
        iucn_block(package_id, source, codes),
        stakeholder_block(package_id, &project.partnerships.stakeholder_partnerships),
        first_nations_block(package_id, &project.partnerships.indigenous_partnerships, codes),
        attachments_block(package_id, "projectAttachments", "projectAttachment", &source.attachments),
        report_attachments_block(
            package_id,
            "projectReportAttachments",
            "projectReportAttachment",
            &source.report_attachments,
        ),
    ];
    collect_present(package_id, blocks)
}

pub fn build_survey_blocks(source: &SurveySource) -> Vec<AdditionalMetadataBlock> {
    let survey = &source.survey;
    let package_id = &survey.uuid;
    let blocks = [
        permits_block(package_id, source),
        proprietor_block(package_id, source),
        attachments_block(package_id, "surveyAttachments", "surveyAttachment", &source.attachments),
        report_attachments_block(
            package_id,
            "surveyReportAttachments",
            "surveyReportAttachment",
            &source.report_attachments,
        ),
    ];
    collect_present(package_id, blocks)
}

fn collect_present<const N: usize>(
    package_id: &PackageId,
    blocks: [Option<AdditionalMetadataBlock>; N],
) -> Vec<AdditionalMetadataBlock> {
    let present = blocks.into_iter().flatten().collect::<Vec<_>>();
    debug!(
        describes = %package_id,
        present = present.len(),
        omitted = N - present.len(),
        "built additional metadata"
    );
    present
}

pub fn project_type_block<C: CodeTableResolver + ?Sized>(
    package_id: &PackageId,
    project_type: Option<u64>,
    codes: &C,
) -> Option<AdditionalMetadataBlock> {
    let name = codes.resolve(CodeSet::ProjectType, project_type?)?;
    Some(AdditionalMetadataBlock::new(
        package_id,
        "projectTypes",
        json!({ "projectType": { "name": name } }),
    ))
}

pub fn activities_block<C: CodeTableResolver + ?Sized>(
    package_id: &PackageId,
    activities: &[u64],
    codes: &C,
) -> Option<AdditionalMetadataBlock> {
    let names = resolve_all(CodeSet::Activity, activities, codes);
    if names.is_empty() {
        return None;
    }
    Some(AdditionalMetadataBlock::new(
        package_id,
        "projectActivities",
        json!({ "projectActivity": named(names) }),
    ))
}

/// IUCN conservation actions with each level resolved to its label.
///
/// Levels that do not resolve are left out of their entry; a classification
/// with no resolvable level is dropped.
pub fn iucn_block<C: CodeTableResolver + ?Sized>(
    package_id: &PackageId,
    source: &MetadataSource,
    codes: &C,
) -> Option<AdditionalMetadataBlock> {
    let actions = source
        .project
        .iucn_classifications
        .iter()
        .filter_map(|classification| {
            let levels = [
                (
                    "IUCNConservationActionLevel1Classification",
                    codes.resolve(CodeSet::IucnLevel1, classification.level_1),
                ),
                (
                    "IUCNConservationActionLevel2SubClassification",
                    codes.resolve(CodeSet::IucnLevel2, classification.level_2),
                ),
                (
                    "IUCNConservationActionLevel3SubClassification",
                    codes.resolve(CodeSet::IucnLevel3, classification.level_3),
                ),
            ];
            let entry = levels
                .into_iter()
                .filter_map(|(key, label)| label.map(|label| (key.to_string(), Value::from(label))))
                .collect::<serde_json::Map<_, _>>();
            (!entry.is_empty()).then_some(Value::Object(entry))
        })
        .collect::<Vec<_>>();
    if actions.is_empty() {
        return None;
    }
    Some(AdditionalMetadataBlock::new(
        package_id,
        "IUCNConservationActions",
        json!({ "IUCNConservationAction": actions }),
    ))
}

pub fn stakeholder_block(
    package_id: &PackageId,
    stakeholders: &[String],
) -> Option<AdditionalMetadataBlock> {
    let names = stakeholders
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if names.is_empty() {
        return None;
    }
    Some(AdditionalMetadataBlock::new(
        package_id,
        "stakeholderPartnerships",
        json!({ "stakeholderPartnership": named(names) }),
    ))
}

pub fn first_nations_block<C: CodeTableResolver + ?Sized>(
    package_id: &PackageId,
    first_nations: &[u64],
    codes: &C,
) -> Option<AdditionalMetadataBlock> {
    let names = resolve_all(CodeSet::FirstNations, first_nations, codes);
    if names.is_empty() {
        return None;
    }
    Some(AdditionalMetadataBlock::new(
        package_id,
        "firstNationPartnerships",
        json!({ "firstNationPartnership": named(names) }),
    ))
}

pub fn attachments_block(
    package_id: &PackageId,
    kind: &str,
    item: &str,
    attachments: &[Attachment],
) -> Option<AdditionalMetadataBlock> {
    if attachments.is_empty() {
        return None;
    }
    let entries = attachments
        .iter()
        .map(|attachment| {
            let mut entry = serde_json::Map::new();
            entry.insert("file_name".to_string(), json!(attachment.file_name));
            insert_text(&mut entry, "file_type", attachment.file_type.as_deref());
            insert_text(&mut entry, "title", attachment.title.as_deref());
            insert_text(&mut entry, "description", attachment.description.as_deref());
            Value::Object(entry)
        })
        .collect::<Vec<_>>();
    let mut body = serde_json::Map::new();
    body.insert(item.to_string(), Value::Array(entries));
    Some(AdditionalMetadataBlock::new(package_id, kind, Value::Object(body)))
}

pub fn report_attachments_block(
    package_id: &PackageId,
    kind: &str,
    item: &str,
    reports: &[ReportAttachment],
) -> Option<AdditionalMetadataBlock> {
    if reports.is_empty() {
        return None;
    }
    let entries = reports
        .iter()
        .map(|report| {
            let mut entry = serde_json::Map::new();
            entry.insert("file_name".to_string(), json!(report.file_name));
            entry.insert("title".to_string(), json!(report.title));
            insert_text(&mut entry, "description", report.description.as_deref());
            if let Some(year) = report.year_published {
                entry.insert("year_published".to_string(), json!(year));
            }
            if !report.authors.is_empty() {
                let authors = report
                    .authors
                    .iter()
                    .map(|author| format!("{} {}", author.first_name, author.last_name))
                    .collect::<Vec<_>>();
                entry.insert("authors".to_string(), json!({ "author": authors }));
            }
            Value::Object(entry)
        })
        .collect::<Vec<_>>();
    let mut body = serde_json::Map::new();
    body.insert(item.to_string(), Value::Array(entries));
    Some(AdditionalMetadataBlock::new(package_id, kind, Value::Object(body)))
}

pub fn permits_block(
    package_id: &PackageId,
    source: &SurveySource,
) -> Option<AdditionalMetadataBlock> {
    let permits = &source.survey.permits;
    if permits.is_empty() {
        return None;
    }
    let entries = permits
        .iter()
        .map(|permit| {
            json!({
                "permit_number": permit.permit_number,
                "permit_type": permit.permit_type,
            })
        })
        .collect::<Vec<_>>();
    Some(AdditionalMetadataBlock::new(
        package_id,
        "surveyPermits",
        json!({ "permit": entries }),
    ))
}

pub fn proprietor_block(
    package_id: &PackageId,
    source: &SurveySource,
) -> Option<AdditionalMetadataBlock> {
    let proprietor = source.survey.proprietor.as_ref()?;
    let mut entry = serde_json::Map::new();
    entry.insert(
        "proprietor_type".to_string(),
        json!(proprietor.proprietor_type_name),
    );
    entry.insert(
        "proprietor_name".to_string(),
        json!(proprietor.proprietor_name),
    );
    insert_text(
        &mut entry,
        "first_nations_name",
        proprietor.first_nations_name.as_deref(),
    );
    insert_text(
        &mut entry,
        "category_rationale",
        proprietor.category_rationale.as_deref(),
    );
    entry.insert("disa_required".to_string(), json!(proprietor.disa_required));
    Some(AdditionalMetadataBlock::new(
        package_id,
        "surveyProprietors",
        json!({ "surveyProprietor": Value::Object(entry) }),
    ))
}

fn resolve_all<C: CodeTableResolver + ?Sized>(
    code_set: CodeSet,
    ids: &[u64],
    codes: &C,
) -> Vec<String> {
    ids.iter()
        .filter_map(|id| codes.resolve(code_set, *id))
        .collect()
}

fn named(names: Vec<String>) -> Vec<Value> {
    names.into_iter().map(|name| json!({ "name": name })).collect()
}

fn insert_text(entry: &mut serde_json::Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        entry.insert(key.to_string(), json!(value));
    }
}
