mod common;

use assert_matches::assert_matches;

use eml_compiler::EmlCompiler;
use eml_compiler::codes::{CodeSet, CodeTables};
use eml_compiler::constants::{ConstantKey, EmlConstants, NOT_SUPPLIED};
use eml_compiler::domain::{
    Attachment, Coordinator, IucnClassification, MetadataSource, ReportAttachment, TaxonId,
};
use eml_compiler::error::EmlError;
use eml_compiler::geometry::Feature;
use eml_compiler::source::{Snapshot, SnapshotProvider};
use eml_compiler::taxonomy::{OfflineTaxonomyClient, TaxonomyClient};

use common::*;

fn constants() -> EmlConstants {
    EmlConstants::resolve(|key| match key {
        ConstantKey::ProviderUrl => Some("https://biohub.example.org".to_string()),
        ConstantKey::OrganizationName => Some("Species Hub".to_string()),
        ConstantKey::TaxonomicProviderUrl => Some("https://taxa.example.org".to_string()),
        _ => None,
    })
}

fn compiler_for<T: TaxonomyClient>(
    source: &MetadataSource,
    taxonomy: T,
    codes: CodeTables,
) -> EmlCompiler<SnapshotProvider, T, CodeTables, EmlConstants> {
    let snapshot = Snapshot {
        projects: vec![source.project.clone()],
        surveys: source
            .surveys
            .iter()
            .map(|survey| survey.survey.clone())
            .collect(),
        ..Default::default()
    };
    EmlCompiler::new(SnapshotProvider::new(snapshot), taxonomy, codes, constants())
        .with_pub_date(date(2024, 6, 1))
}

fn compile(source: &MetadataSource, codes: CodeTables) -> String {
    compiler_for(source, OfflineTaxonomyClient, codes)
        .compile_source(source)
        .unwrap()
}

#[test]
fn iucn_only_project_scenario() {
    let mut project = project("abc-123");
    project.iucn_classifications = vec![IucnClassification {
        level_1: 1,
        level_2: 2,
        level_3: 3,
    }];
    let codes = CodeTables::new()
        .with(CodeSet::IucnLevel1, 1, "Level1")
        .with(CodeSet::IucnLevel2, 2, "Level2")
        .with(CodeSet::IucnLevel3, 3, "Level3");

    let xml = compile(&metadata(project), codes);
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let root = doc.root_element();

    assert_eq!(root.tag_name().name(), "eml");
    assert_eq!(root.attribute("packageId"), Some("urn:uuid:abc-123"));
    assert!(elements(&doc, "geographicCoverage").is_empty());
    assert!(elements(&doc, "funding").is_empty());

    let blocks = elements(&doc, "additionalMetadata");
    assert_eq!(blocks.len(), 1);
    assert_eq!(child_text(blocks[0], "describes"), Some("abc-123"));
    let action = elements(&doc, "IUCNConservationAction");
    assert_eq!(action.len(), 1);
    assert_eq!(
        child_text(action[0], "IUCNConservationActionLevel1Classification"),
        Some("Level1")
    );
    assert_eq!(
        child_text(action[0], "IUCNConservationActionLevel2SubClassification"),
        Some("Level2")
    );
    assert_eq!(
        child_text(action[0], "IUCNConservationActionLevel3SubClassification"),
        Some("Level3")
    );
}

#[test]
fn dataset_elements_follow_eml_order() {
    let xml = compile(&metadata(project("abc-123")), CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let dataset = elements(&doc, "dataset")[0];

    let order = dataset
        .children()
        .filter(|node| node.is_element())
        .map(|node| node.tag_name().name())
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            "title",
            "creator",
            "metadataProvider",
            "pubDate",
            "language",
            "intellectualRights",
            "contact",
            "project"
        ]
    );
    assert_eq!(child_text(dataset, "pubDate"), Some("2024-06-01"));
    let rights = child(dataset, "intellectualRights").unwrap();
    assert_eq!(child_text(rights, "para"), Some(NOT_SUPPLIED));
    assert_eq!(dataset.attribute("system"), Some("https://biohub.example.org"));
}

#[test]
fn private_coordinator_details_never_reach_the_document() {
    let coordinators = [
        coordinator(false),
        Coordinator {
            first_name: "Ana".to_string(),
            last_name: "Ortiz".to_string(),
            email_address: "ana@example.com".to_string(),
            coordinator_agency: "Fisheries".to_string(),
            share_contact_details: false,
        },
    ];

    for coordinator in coordinators {
        let mut project = project("abc-123");
        project.coordinator = coordinator.clone();
        let xml = compile(&metadata(project), CodeTables::new());

        assert!(!xml.contains(&coordinator.email_address));
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(elements(&doc, "electronicMailAddress").is_empty());
        assert!(elements(&doc, "givenName").is_empty());
        assert!(elements(&doc, "surName").is_empty());
        let creator = elements(&doc, "creator")[0];
        assert_eq!(
            child_text(creator, "organizationName"),
            Some(coordinator.coordinator_agency.as_str())
        );
    }
}

#[test]
fn shared_coordinator_details_are_included() {
    let xml = compile(&metadata(project("abc-123")), CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let contact = elements(&doc, "contact")[0];
    assert_eq!(
        child_text(contact, "electronicMailAddress"),
        Some("robin.hale@example.org")
    );
    let personnel = elements(&doc, "personnel")[0];
    assert_eq!(child_text(personnel, "role"), Some("pointOfContact"));
}

#[test]
fn funding_section_present_only_with_sources() {
    let mut funded = project("abc-123");
    funded.funding_sources = vec![funding("Habitat Trust"), funding("Land Fund")];
    let xml = compile(&metadata(funded), CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let funding = elements(&doc, "funding");
    assert_eq!(funding.len(), 1);
    let agencies = funding[0]
        .children()
        .filter(|node| node.is_element())
        .collect::<Vec<_>>();
    assert_eq!(agencies.len(), 2);
    assert_eq!(child_text(agencies[1], "para"), Some("Land Fund"));
    assert!(xml.contains("<para>2021-04-01</para>"));
    assert!(!xml.contains("T00:00"));
}

#[test]
fn geographic_coverage_from_point_with_radius() {
    let mut project = project("abc-123");
    project.location.location_description = Some("Peace region".to_string());
    project.location.geometry = vec![Feature::point(-122.5, 55.0).with_radius(1_000.0)];
    let xml = compile(&metadata(project), CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let coverage = elements(&doc, "geographicCoverage");
    assert_eq!(coverage.len(), 1);
    assert_eq!(
        child_text(coverage[0], "geographicDescription"),
        Some("Peace region")
    );
    let bounds = child(coverage[0], "boundingCoordinates").unwrap();
    let west: f64 = child_text(bounds, "westBoundingCoordinate")
        .unwrap()
        .parse()
        .unwrap();
    let east: f64 = child_text(bounds, "eastBoundingCoordinate")
        .unwrap()
        .parse()
        .unwrap();
    assert!(west < -122.5 && east > -122.5);
    assert_eq!(elements(&doc, "gRingPoint").len(), 65);
}

#[test]
fn compiling_twice_is_byte_identical() {
    let mut project = project("abc-123");
    project.funding_sources = vec![funding("Habitat Trust")];
    project.location.geometry = vec![Feature::point(-120.0, 50.0).with_radius(250.0)];
    project.partnerships.stakeholder_partnerships = vec!["River Society".to_string()];
    let mut source = metadata(project);
    source.surveys = vec![
        survey_source(survey(2, "survey-b")),
        survey_source(survey(1, "survey-a")),
    ];

    let first = compile(&source, CodeTables::new());
    let second = compile(&source, CodeTables::new());
    assert_eq!(first, second);
}

#[test]
fn repeated_compiles_differ_only_in_pub_date() {
    let source = metadata(project("abc-123"));
    let strip = |xml: String| {
        xml.lines()
            .filter(|line| !line.contains("<pubDate>"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let unpinned = EmlCompiler::new(
        SnapshotProvider::new(Snapshot::default()),
        OfflineTaxonomyClient,
        CodeTables::new(),
        constants(),
    );
    let first = unpinned.compile_source(&source).unwrap();
    let second = compile(&source, CodeTables::new());
    assert_eq!(strip(first), strip(second));
}

#[test]
fn partial_taxonomy_results_keep_matched_species() {
    let mut survey = survey(7, "survey-7");
    survey.focal_species = vec![TaxonId::new(10), TaxonId::new(20)];
    let mut source = metadata(project("abc-123"));
    source.surveys = vec![survey_source(survey)];

    let taxonomy = StaticTaxonomy::new(vec![taxon(10, "M-RATA")]);
    let compiler = compiler_for(&source, taxonomy, CodeTables::new());
    let xml = compiler.compile_source(&source).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let classifications = elements(&doc, "taxonomicClassification");
    assert_eq!(classifications.len(), 1);
    let taxon_id = child(classifications[0], "taxonId").unwrap();
    assert_eq!(taxon_id.text(), Some("M-RATA"));
    assert_eq!(taxon_id.attribute("provider"), Some("https://taxa.example.org"));
    assert_eq!(
        child_text(classifications[0], "taxonRankValue"),
        Some("Rangifer tarandus")
    );
}

#[test]
fn unmatched_species_omit_taxonomic_coverage() {
    let mut survey = survey(7, "survey-7");
    survey.focal_species = vec![TaxonId::new(99)];
    let mut source = metadata(project("abc-123"));
    source.surveys = vec![survey_source(survey)];

    let compiler = compiler_for(&source, StaticTaxonomy::default(), CodeTables::new());
    let xml = compiler.compile_source(&source).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    assert!(elements(&doc, "taxonomicCoverage").is_empty());
}

#[test]
fn taxonomy_failure_fails_compilation() {
    let mut survey = survey(7, "survey-7");
    survey.focal_species = vec![TaxonId::new(10)];
    let mut source = metadata(project("abc-123"));
    source.surveys = vec![survey_source(survey)];

    let compiler = compiler_for(&source, FailingTaxonomy, CodeTables::new());
    assert_matches!(
        compiler.compile_source(&source),
        Err(EmlError::TaxonomyHttp(_))
    );
}

#[test]
fn attachments_without_reports_emit_one_block() {
    let mut source = metadata(project("abc-123"));
    source.attachments = vec![
        Attachment {
            id: 1,
            file_name: "map.png".to_string(),
            file_type: Some("Image".to_string()),
            title: None,
            description: None,
        },
        Attachment {
            id: 2,
            file_name: "plan.pdf".to_string(),
            file_type: Some("Other".to_string()),
            title: Some("Plan".to_string()),
            description: None,
        },
    ];

    let xml = compile(&source, CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    assert_eq!(elements(&doc, "projectAttachments").len(), 1);
    assert_eq!(elements(&doc, "projectAttachment").len(), 2);
    assert!(elements(&doc, "projectReportAttachments").is_empty());
}

#[test]
fn surveys_become_related_projects_with_their_own_blocks() {
    let mut survey = survey(3, "survey-3");
    survey.purpose_and_methodology.intended_outcome_id = Some(1);
    survey.purpose_and_methodology.field_method_id = Some(2);
    survey.purpose_and_methodology.vantage_code_ids = vec![1, 2];
    let mut survey = survey_source(survey);
    survey.report_attachments = vec![ReportAttachment {
        id: 5,
        file_name: "findings.pdf".to_string(),
        title: "Findings".to_string(),
        description: None,
        year_published: Some(2023),
        authors: Vec::new(),
    }];
    let mut source = metadata(project("abc-123"));
    source.surveys = vec![survey];

    let codes = CodeTables::new()
        .with(CodeSet::IntendedOutcome, 1, "Habitat assessment")
        .with(CodeSet::FieldMethod, 2, "Transect")
        .with(CodeSet::VantageCode, 1, "Air")
        .with(CodeSet::VantageCode, 2, "Ground");

    let xml = compile(&source, codes);
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let related = elements(&doc, "relatedProject");
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].attribute("id"), Some("survey-3"));
    assert_eq!(related[0].parent().unwrap().tag_name().name(), "project");
    assert_eq!(elements(&doc, "listitem").len(), 2);
    assert!(xml.contains("<para>Habitat assessment</para>"));
    let single = elements(&doc, "singleDateTime");
    assert_eq!(single.len(), 1);

    let blocks = elements(&doc, "additionalMetadata");
    assert_eq!(blocks.len(), 1);
    assert_eq!(child_text(blocks[0], "describes"), Some("survey-3"));
    assert_eq!(elements(&doc, "surveyReportAttachments").len(), 1);
}

#[test]
fn compile_unknown_project_is_not_found() {
    let compiler = EmlCompiler::new(
        SnapshotProvider::new(Snapshot::default()),
        OfflineTaxonomyClient,
        CodeTables::new(),
        constants(),
    );
    assert_matches!(compiler.compile(42), Err(EmlError::ProjectNotFound(42)));
}

#[test]
fn control_characters_in_free_text_still_parse() {
    let mut project = project("abc-123");
    project.objectives = "Pasted from Word\u{0B}text".to_string();
    project.caveats = Some("bell\u{7} and null\u{0}".to_string());
    project.coordinator.coordinator_agency = "Wildlife\u{1B} Branch".to_string();

    let xml = compile(&metadata(project), CodeTables::new());
    let doc = roxmltree::Document::parse(&xml).unwrap();
    assert!(xml.contains("<para>Pasted from Wordtext</para>"));
    assert!(xml.contains("<para>bell and null</para>"));
    let creator = elements(&doc, "creator")[0];
    assert_eq!(child_text(creator, "organizationName"), Some("Wildlife Branch"));
}
