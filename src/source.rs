use std::collections::BTreeMap;
use std::fs;
use std::thread::{self, ScopedJoinHandle};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{
    Attachment, MetadataSource, ProjectRecord, ReportAttachment, SurveyRecord, SurveySource,
};
use crate::error::EmlError;

/// Upper bound on survey graphs loaded or built concurrently.
pub const MAX_PARALLEL_SURVEYS: usize = 8;

/// Delivers typed project and survey records from persisted state.
pub trait SourceProvider: Send + Sync {
    fn project(&self, project_id: u64) -> Result<ProjectRecord, EmlError>;
    fn project_attachments(&self, project_id: u64) -> Result<Vec<Attachment>, EmlError>;
    fn project_report_attachments(
        &self,
        project_id: u64,
    ) -> Result<Vec<ReportAttachment>, EmlError>;
    fn survey_ids(&self, project_id: u64) -> Result<Vec<u64>, EmlError>;
    fn survey(&self, survey_id: u64) -> Result<SurveyRecord, EmlError>;
    fn survey_attachments(&self, survey_id: u64) -> Result<Vec<Attachment>, EmlError>;
    fn survey_report_attachments(&self, survey_id: u64)
    -> Result<Vec<ReportAttachment>, EmlError>;
}

/// Point-in-time export of projects, surveys and their attachments.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub surveys: Vec<SurveyRecord>,
    #[serde(default)]
    pub project_attachments: BTreeMap<u64, Vec<Attachment>>,
    #[serde(default)]
    pub project_report_attachments: BTreeMap<u64, Vec<ReportAttachment>>,
    #[serde(default)]
    pub survey_attachments: BTreeMap<u64, Vec<Attachment>>,
    #[serde(default)]
    pub survey_report_attachments: BTreeMap<u64, Vec<ReportAttachment>>,
}

#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    snapshot: Snapshot,
}

impl SnapshotProvider {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn load(path: &Utf8Path) -> Result<Self, EmlError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| EmlError::SourceRead(path.as_std_path().to_path_buf()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|err| EmlError::SourceParse(err.to_string()))?;
        debug!(
            path = %path,
            projects = snapshot.projects.len(),
            surveys = snapshot.surveys.len(),
            "loaded source snapshot"
        );
        Ok(Self::new(snapshot))
    }
}

impl SourceProvider for SnapshotProvider {
    fn project(&self, project_id: u64) -> Result<ProjectRecord, EmlError> {
        self.snapshot
            .projects
            .iter()
            .find(|project| project.id == project_id)
            .cloned()
            .ok_or(EmlError::ProjectNotFound(project_id))
    }

    fn project_attachments(&self, project_id: u64) -> Result<Vec<Attachment>, EmlError> {
        Ok(self
            .snapshot
            .project_attachments
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn project_report_attachments(
        &self,
        project_id: u64,
    ) -> Result<Vec<ReportAttachment>, EmlError> {
        Ok(self
            .snapshot
            .project_report_attachments
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    fn survey_ids(&self, project_id: u64) -> Result<Vec<u64>, EmlError> {
        let mut ids = self
            .snapshot
            .surveys
            .iter()
            .filter(|survey| survey.project_id == project_id)
            .map(|survey| survey.id)
            .collect::<Vec<_>>();
        ids.sort_unstable();
        Ok(ids)
    }

    fn survey(&self, survey_id: u64) -> Result<SurveyRecord, EmlError> {
        self.snapshot
            .surveys
            .iter()
            .find(|survey| survey.id == survey_id)
            .cloned()
            .ok_or(EmlError::SurveyNotFound(survey_id))
    }

    fn survey_attachments(&self, survey_id: u64) -> Result<Vec<Attachment>, EmlError> {
        Ok(self
            .snapshot
            .survey_attachments
            .get(&survey_id)
            .cloned()
            .unwrap_or_default())
    }

    fn survey_report_attachments(
        &self,
        survey_id: u64,
    ) -> Result<Vec<ReportAttachment>, EmlError> {
        Ok(self
            .snapshot
            .survey_report_attachments
            .get(&survey_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Aggregates one project's metadata graph from a [`SourceProvider`].
///
/// Project core and attachment lists are fetched on scoped threads; survey
/// graphs follow in batches of at most [`MAX_PARALLEL_SURVEYS`], collected
/// in the order the provider lists their ids.
pub struct SourceLoader<P: SourceProvider> {
    provider: P,
}

impl<P: SourceProvider> SourceLoader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn load(&self, project_id: u64) -> Result<MetadataSource, EmlError> {
        let survey_ids = self.provider.survey_ids(project_id)?;
        info!(project_id, surveys = survey_ids.len(), "loading metadata source");

        thread::scope(|scope| {
            let project = scope.spawn(|| self.provider.project(project_id));
            let attachments = scope.spawn(|| self.provider.project_attachments(project_id));
            let report_attachments =
                scope.spawn(|| self.provider.project_report_attachments(project_id));
            let surveys = parallel_map(&survey_ids, |&survey_id| self.load_survey(survey_id));

            let project = join(project)?;
            let attachments = join(attachments)?;
            let report_attachments = join(report_attachments)?;
            let surveys = surveys?;

            Ok(MetadataSource {
                project,
                attachments,
                report_attachments,
                surveys,
            })
        })
    }

    pub fn load_survey(&self, survey_id: u64) -> Result<SurveySource, EmlError> {
        let survey = self.provider.survey(survey_id)?;
        let attachments = self.provider.survey_attachments(survey_id)?;
        let report_attachments = self.provider.survey_report_attachments(survey_id)?;
        debug!(
            survey_id,
            attachments = attachments.len(),
            report_attachments = report_attachments.len(),
            "loaded survey source"
        );
        Ok(SurveySource {
            survey,
            attachments,
            report_attachments,
        })
    }
}

/// Applies `f` to every item on scoped threads, at most
/// [`MAX_PARALLEL_SURVEYS`] at a time, keeping input order. The first error
/// in input order wins.
pub(crate) fn parallel_map<I, T, F>(items: &[I], f: F) -> Result<Vec<T>, EmlError>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> Result<T, EmlError> + Sync,
{
    let f = &f;
    let mut results = Vec::with_capacity(items.len());
    for chunk in items.chunks(MAX_PARALLEL_SURVEYS) {
        let batch = thread::scope(|scope| {
            let handles = chunk
                .iter()
                .map(|item| scope.spawn(move || f(item)))
                .collect::<Vec<_>>();
            handles.into_iter().map(join).collect::<Result<Vec<_>, EmlError>>()
        })?;
        results.extend(batch);
    }
    Ok(results)
}

pub(crate) fn join<T>(handle: ScopedJoinHandle<'_, Result<T, EmlError>>) -> Result<T, EmlError> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
