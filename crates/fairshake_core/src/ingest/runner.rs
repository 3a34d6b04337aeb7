//! Sequential ingestion batch with per-study fault isolation.

use log::{error, info, warn};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::model::assessment::{AssessmentId, NewAnswer, NewAssessment};
use crate::model::author::AuthorId;
use crate::model::catalog::{DigitalObjectId, NewDigitalObject};
use crate::repo::assessment_repo::AssessmentRepository;
use crate::repo::catalog_repo::CatalogRepository;

use super::archive::RemoteArchive;
use super::checklist::{evaluate_descriptor, ChecklistRule, RuleOutcome, TITLE_RULE};
use super::{IngestError, IngestResult};

const METHODOLOGY: &str = "auto";

/// Step at which a study failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Fetch,
    Evaluate,
    Persist,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Evaluate => "evaluate",
            Self::Persist => "persist",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudyRecord {
    pub study: String,
    pub object_id: DigitalObjectId,
    pub assessment_id: AssessmentId,
    pub answers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyFailure {
    pub study: String,
    pub stage: IngestStage,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub created: Vec<StudyRecord>,
    pub failures: Vec<StudyFailure>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reference data resolved once before any study is processed.
struct RunContext {
    assessor: AuthorId,
}

pub struct Ingestor<C, A> {
    catalog: C,
    assessments: A,
    settings: IngestConfig,
    rules: Vec<ChecklistRule>,
}

impl<C, A> Ingestor<C, A>
where
    C: CatalogRepository,
    A: AssessmentRepository,
{
    pub fn new(
        catalog: C,
        assessments: A,
        settings: IngestConfig,
        rules: Vec<ChecklistRule>,
    ) -> Self {
        Self {
            catalog,
            assessments,
            settings,
            rules,
        }
    }

    /// Processes every configured study over one archive session.
    ///
    /// # Errors
    /// - `Setup` when the assessor, project, rubric or a checklist metric is
    ///   missing. Nothing is written in that case.
    ///
    /// Per-study failures never abort the run; they land in
    /// [`IngestReport::failures`].
    pub fn run(&self, archive: &mut dyn RemoteArchive) -> IngestResult<IngestReport> {
        let context = self.prepare()?;
        let run_id = Uuid::new_v4();
        info!(
            "event=ingest_run module=ingest status=start run_id={} studies={}",
            run_id,
            self.settings.studies.len()
        );

        let mut report = IngestReport {
            run_id,
            created: Vec::new(),
            failures: Vec::new(),
        };
        for study in &self.settings.studies {
            match self.process_study(archive, &context, study) {
                Ok(record) => {
                    info!(
                        "event=ingest_study module=ingest status=ok run_id={} study={} object_id={} assessment_id={} answers={}",
                        run_id, study, record.object_id, record.assessment_id, record.answers
                    );
                    report.created.push(record);
                }
                Err((stage, err)) => {
                    error!(
                        "event=ingest_study module=ingest status=error run_id={} study={} stage={} error={}",
                        run_id,
                        study,
                        stage.as_str(),
                        err
                    );
                    report.failures.push(StudyFailure {
                        study: study.clone(),
                        stage,
                        error: err.to_string(),
                    });
                }
            }
        }

        let status = if report.is_clean() { "ok" } else { "partial" };
        info!(
            "event=ingest_run module=ingest status={} run_id={} created={} failed={}",
            status,
            run_id,
            report.created.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn prepare(&self) -> IngestResult<RunContext> {
        let assessor = self
            .catalog
            .find_author_by_username(&self.settings.assessor)?
            .ok_or_else(|| {
                IngestError::Setup(format!("unknown assessor `{}`", self.settings.assessor))
            })?;
        if self.catalog.get_project(self.settings.project_id)?.is_none() {
            return Err(IngestError::Setup(format!(
                "unknown project {}",
                self.settings.project_id
            )));
        }
        if self.catalog.get_rubric(self.settings.rubric_id)?.is_none() {
            return Err(IngestError::Setup(format!(
                "unknown rubric {}",
                self.settings.rubric_id
            )));
        }
        for metric in self.rules.iter().filter_map(|rule| rule.metric) {
            if self.catalog.get_metric(metric)?.is_none() {
                return Err(IngestError::Setup(format!("unknown metric {metric}")));
            }
        }
        Ok(RunContext {
            assessor: assessor.id,
        })
    }

    fn process_study(
        &self,
        archive: &mut dyn RemoteArchive,
        context: &RunContext,
        study: &str,
    ) -> Result<StudyRecord, (IngestStage, IngestError)> {
        let xml = self
            .fetch_descriptor(archive, study)
            .map_err(|err| (IngestStage::Fetch, err))?;
        let outcomes =
            evaluate_descriptor(&self.rules, &xml).map_err(|err| (IngestStage::Evaluate, err))?;
        self.persist(context, study, &outcomes)
            .map_err(|err| (IngestStage::Persist, err))
    }

    fn fetch_descriptor(
        &self,
        archive: &mut dyn RemoteArchive,
        study: &str,
    ) -> IngestResult<String> {
        archive.change_dir(&format!("{}/{}/", self.settings.studies_root(), study))?;

        let version = archive
            .list()?
            .iter()
            .map(|entry| entry_name(entry))
            .filter(|name| name.starts_with(study))
            .max()
            .ok_or_else(|| IngestError::NoVersionDirectory {
                study: study.to_string(),
            })?;
        archive.change_dir(&version)?;

        let descriptor = archive
            .list()?
            .iter()
            .map(|entry| entry_name(entry))
            .find(|name| name.ends_with(".xml"))
            .ok_or_else(|| IngestError::MissingDescriptor {
                study: study.to_string(),
            })?;
        info!(
            "event=ingest_fetch module=ingest status=ok study={} version={} descriptor={}",
            study, version, descriptor
        );
        let bytes = archive.download(&descriptor)?;
        Ok(String::from_utf8(bytes)?)
    }

    fn persist(
        &self,
        context: &RunContext,
        study: &str,
        outcomes: &[RuleOutcome],
    ) -> IngestResult<StudyRecord> {
        let title = outcomes
            .iter()
            .find(|outcome| outcome.description == TITLE_RULE)
            .map(|outcome| outcome.comment.trim())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| {
                warn!("event=ingest_title module=ingest status=fallback study={study}");
                study
            });

        let object_id = self.catalog.create_digital_object(&NewDigitalObject {
            title: title.to_string(),
            url: format!(
                "ftp://{}{}/{}/",
                self.settings.host,
                self.settings.studies_root(),
                study
            ),
            kind: self.settings.object_type.clone(),
            tags: self.settings.tags.clone(),
            projects: vec![self.settings.project_id],
            authors: vec![context.assessor],
        })?;

        let assessment_id = self.assessments.create_assessment(&NewAssessment {
            project: Some(self.settings.project_id),
            target: object_id,
            rubric: self.settings.rubric_id,
            methodology: METHODOLOGY.to_string(),
            assessor: context.assessor,
        })?;

        let mut answers = 0;
        for outcome in outcomes {
            let Some(metric) = outcome.metric else {
                continue;
            };
            self.assessments.create_answer(&NewAnswer {
                assessment: assessment_id,
                metric,
                answer: outcome.answer,
                comment: outcome.comment.clone(),
            })?;
            answers += 1;
        }

        Ok(StudyRecord {
            study: study.to_string(),
            object_id,
            assessment_id,
            answers,
        })
    }
}

/// Last path component of a listing entry; some servers return full paths.
fn entry_name(entry: &str) -> String {
    let trimmed = entry.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

#[cfg(test)]
mod tests {
    use super::entry_name;

    #[test]
    fn entry_name_strips_directories() {
        assert_eq!(entry_name("phs000007.v30.p11"), "phs000007.v30.p11");
        assert_eq!(
            entry_name("/dbgap/studies/phs000007/phs000007.v30.p11/"),
            "phs000007.v30.p11"
        );
    }
}
