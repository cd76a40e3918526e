use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::codes::CodeTableResolver;
use crate::constants::{ConstantsProvider, EmlConstants};
use crate::domain::{MetadataSource, SurveyRecord, SurveySource};
use crate::error::EmlError;
use crate::package::{EmlPackage, EmlSection};
use crate::sections::additional::build_additional_metadata;
use crate::sections::coverage::{TaxonomicCoverage, build_taxonomic_coverage};
use crate::sections::project::{build_dataset_section, build_survey_section};
use crate::sections::ProjectSection;
use crate::source::{SourceLoader, SourceProvider, parallel_map};
use crate::taxonomy::TaxonomyClient;

/// Compiles one project, with its surveys, into an EML document.
pub struct EmlCompiler<S, T, C, K>
where
    S: SourceProvider,
    T: TaxonomyClient,
    C: CodeTableResolver,
    K: ConstantsProvider,
{
    loader: SourceLoader<S>,
    taxonomy: T,
    codes: C,
    constants: K,
    pub_date: Option<NaiveDate>,
}

impl<S, T, C, K> EmlCompiler<S, T, C, K>
where
    S: SourceProvider,
    T: TaxonomyClient,
    C: CodeTableResolver,
    K: ConstantsProvider,
{
    pub fn new(source: S, taxonomy: T, codes: C, constants: K) -> Self {
        Self {
            loader: SourceLoader::new(source),
            taxonomy,
            codes,
            constants,
            pub_date: None,
        }
    }

    /// Pins `pubDate` instead of using today's date.
    pub fn with_pub_date(mut self, pub_date: NaiveDate) -> Self {
        self.pub_date = Some(pub_date);
        self
    }

    pub fn load(&self, project_id: u64) -> Result<MetadataSource, EmlError> {
        self.loader.load(project_id)
    }

    pub fn compile(&self, project_id: u64) -> Result<String, EmlError> {
        let source = self.loader.load(project_id)?;
        self.compile_source(&source)
    }

    pub fn compile_source(&self, source: &MetadataSource) -> Result<String, EmlError> {
        let constants = self.constants.constants()?;
        let pub_date = self.pub_date.unwrap_or_else(|| Utc::now().date_naive());
        let package_id = source.package_id();

        let surveys = self.build_survey_sections(source, &constants)?;
        let dataset = build_dataset_section(source, &constants, pub_date);
        let additional_metadata = build_additional_metadata(source, &self.codes);

        let xml = EmlPackage::new()
            .with_eml(EmlSection::new(package_id, &constants))?
            .with_dataset(dataset)?
            .with_additional_metadata(additional_metadata)
            .with_related_projects(surveys)?
            .build()?;

        info!(
            project_id = source.project.id,
            package_id = %package_id,
            surveys = source.surveys.len(),
            bytes = xml.len(),
            "compiled EML document"
        );
        Ok(xml)
    }

    fn build_survey_sections(
        &self,
        source: &MetadataSource,
        constants: &EmlConstants,
    ) -> Result<Vec<ProjectSection>, EmlError> {
        parallel_map(&source.surveys, |survey| self.survey_section(survey, constants))
    }

    fn survey_section(
        &self,
        source: &SurveySource,
        constants: &EmlConstants,
    ) -> Result<ProjectSection, EmlError> {
        let taxonomic = taxonomic_coverage(
            &self.taxonomy,
            &source.survey,
            &constants.taxonomic_provider_url,
        )?;
        Ok(build_survey_section(source, taxonomic, constants, &self.codes))
    }
}

/// Looks up a survey's focal and ancillary species and maps the matches.
///
/// Ids the client does not return are left out; lookup errors propagate.
pub fn taxonomic_coverage<T: TaxonomyClient + ?Sized>(
    client: &T,
    survey: &SurveyRecord,
    provider_url: &str,
) -> Result<Option<TaxonomicCoverage>, EmlError> {
    let ids = survey.species_ids();
    if ids.is_empty() {
        return Ok(None);
    }
    let records = client.lookup(&ids)?;
    let matched = ids
        .iter()
        .filter(|id| records.iter().any(|record| record.id == **id))
        .count();
    if matched < ids.len() {
        warn!(
            survey_id = survey.id,
            requested = ids.len(),
            matched,
            "taxonomy lookup returned partial results"
        );
    }
    Ok(build_taxonomic_coverage(&ids, &records, provider_url))
}
