use std::path::Path;

use super::*;
use crate::archive::{ArchiveError, ArchiveInput, ArchiveOutput, Archiver, ZipArchiver};
use crate::downloads::file::FileLinkStore;
use crate::extraction::ParseError;
use crate::models::content::EnhancedContent;
use crate::models::order::{DeployMode, EmailKind, OrderRecord};
use crate::models::resume::ExperienceEntry;
use crate::notify::{Mailer, NotifyError, OutgoingEmail, PreviewMailer};
use crate::orders::file::FileOrderStore;
use crate::publish::{LocalPublisher, PublishError, PublishOutcome, SitePublisher};
use crate::render::{PortfolioRenderer, RenderError};

const BACKEND: &str = "http://localhost:8080";

struct FixedParser(Option<StructuredResume>);

#[async_trait]
impl ResumeParser for FixedParser {
    async fn parse(&self, _source: &ResumeSource) -> Result<Extraction, ParseError> {
        match &self.0 {
            Some(resume) => Ok(Extraction {
                resume: resume.clone(),
                confidence: 0.65,
                matched: vec!["name", "email", "experience"],
            }),
            None => Err(ParseError::Remote("actor run failed".into())),
        }
    }
}

struct BrokenPublisher;

#[async_trait]
impl Publisher for BrokenPublisher {
    async fn publish(&self, _order_id: &str, _html: &str) -> Result<PublishOutcome, PublishError> {
        Err(PublishError::DeploymentFailed("disk full".into()))
    }
}

struct BrokenArchiver;

#[async_trait]
impl Archiver for BrokenArchiver {
    async fn archive(&self, _input: ArchiveInput) -> Result<ArchiveOutput, ArchiveError> {
        Err(ArchiveError::Io(std::io::Error::other("no space left")))
    }
}

struct BrokenRenderer;

impl SiteRenderer for BrokenRenderer {
    fn render(
        &self,
        _resume: &StructuredResume,
        _content: &EnhancedContent,
        _options: &RenderOptions,
    ) -> Result<String, RenderError> {
        Err(RenderError::Format(std::fmt::Error))
    }
}

struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    fn is_preview(&self) -> bool {
        false
    }

    async fn send(&self, _email: &OutgoingEmail) -> Result<(), NotifyError> {
        Err(NotifyError::Api {
            status: 503,
            message: "unavailable".into(),
        })
    }
}

fn jane() -> StructuredResume {
    StructuredResume {
        name: "Jane Doe".into(),
        email: "jane@x.com".into(),
        experience: vec![ExperienceEntry {
            title: "Engineer".into(),
            company: "Acme".into(),
            dates: "2020-2023".into(),
            description: "Built the order pipeline".into(),
        }],
        ..Default::default()
    }
}

fn job() -> OrderJob {
    OrderJob {
        order_id: "o1".into(),
        email: "a@b.com".into(),
        position: 1,
        resume_filename: "o1.pdf".into(),
        photo_filename: None,
    }
}

struct Harness {
    remote: Option<Arc<dyn ResumeParser>>,
    local: Arc<dyn ResumeParser>,
    renderer: Arc<dyn SiteRenderer>,
    publisher: Option<Arc<dyn Publisher>>,
    archiver: Option<Arc<dyn Archiver>>,
    mailer: Arc<dyn Mailer>,
}

impl Harness {
    fn new() -> Self {
        Self {
            remote: None,
            local: Arc::new(FixedParser(Some(jane()))),
            renderer: Arc::new(PortfolioRenderer),
            publisher: None,
            archiver: None,
            mailer: Arc::new(PreviewMailer),
        }
    }

    async fn run(self, dir: &Path) -> OrderRecord {
        let store = FileOrderStore::open(dir.join("orders.json")).await.unwrap();
        let tracker = OrderTracker::new(Arc::new(store));
        let links = FileLinkStore::open(dir.join("download-links.json")).await.unwrap();
        let archive_dir = dir.join("temp");

        let publisher = self.publisher.unwrap_or_else(|| {
            Arc::new(SitePublisher::new(
                None,
                LocalPublisher::new(dir.join("generated"), BACKEND),
                false,
                "admin@folio.test",
            ))
        });

        let pipeline = Pipeline::new(
            tracker.clone(),
            self.remote,
            self.local,
            Arc::new(Enhancer::new(None, false)),
            self.renderer,
            publisher,
            self.archiver
                .unwrap_or_else(|| Arc::new(ZipArchiver::new(&archive_dir))),
            Downloads::new(Arc::new(links), &archive_dir),
            Notifier::new(self.mailer, None, 50),
            PipelineSettings {
                backend_url: format!("{BACKEND}/"),
                uploads_dir: dir.join("uploads"),
                admin_contact: "admin@folio.test".into(),
            },
        );
        pipeline.process(job()).await;
        tracker.get("o1").await
    }
}

#[tokio::test]
async fn test_happy_path_degrades_to_local_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let record = Harness::new().run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Completed);
    assert_eq!(
        record.site_url.as_deref(),
        Some("http://localhost:8080/generated/o1.html")
    );
    assert!(record
        .download_url
        .as_deref()
        .unwrap()
        .starts_with("http://localhost:8080/download/"));
    assert_eq!(record.deploy_mode, Some(DeployMode::Local));
    assert_eq!(record.parsing_mode, Some(ParsingMode::Local));
    assert_eq!(record.customer_name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.zip_basename.as_deref(), Some("Jane Doe_a--o1.zip"));
    assert!(record.customer_message.unwrap().contains("admin@folio.test"));

    for step in [Step::Parsing, Step::Enhancing, Step::Building, Step::Deploying, Step::Completed] {
        assert!(record.steps.contains_key(&step), "missing step {step:?}");
    }
    for code in [
        WarningCode::AiEnhancementFallback,
        WarningCode::DeployDegraded,
        WarningCode::DeployErrorRecorded,
        WarningCode::AdminContactProvided,
        WarningCode::AdminAlertFailed,
    ] {
        assert!(record.warnings.contains(&code), "missing warning {code:?}");
    }
    assert!(!record.warnings.contains(&WarningCode::AiEnhancementFailed));
    assert!(record.emails[&EmailKind::Completed].preview);

    let html = std::fs::read_to_string(dir.path().join("generated/o1.html")).unwrap();
    assert!(html.contains("Jane Doe"));
    assert!(dir.path().join("temp/Jane Doe_a--o1.zip").exists());
}

#[tokio::test]
async fn test_publish_failure_fails_order_but_keeps_download() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.publisher = Some(Arc::new(BrokenPublisher));
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Failed);
    assert!(record.download_url.is_some());
    assert!(record.warnings.contains(&WarningCode::DeployFailed));
    assert!(record.warnings.contains(&WarningCode::AdminAlertFailed));
    assert!(record.error.unwrap().contains("disk full"));
    assert!(record.customer_message.unwrap().contains("admin@folio.test"));
    assert!(!record.steps.contains_key(&Step::Completed));
}

#[tokio::test]
async fn test_archive_failure_alone_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.archiver = Some(Arc::new(BrokenArchiver));
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Completed);
    assert!(record.download_url.is_none());
    assert!(record.zip_basename.is_none());
    assert!(record.warnings.contains(&WarningCode::ArchiveFailed));
    assert_eq!(
        record.site_url.as_deref(),
        Some("http://localhost:8080/generated/o1.html")
    );
    assert!(record.steps.contains_key(&Step::Completed));
    assert!(record.emails.contains_key(&EmailKind::Completed));
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_local_parse() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.remote = Some(Arc::new(FixedParser(None)));
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Completed);
    assert_eq!(record.parsing_mode, Some(ParsingMode::Local));
    assert!(record.warnings.contains(&WarningCode::ParserFallback));
}

#[tokio::test]
async fn test_remote_success_records_remote_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.remote = Some(Arc::new(FixedParser(Some(jane()))));
    harness.local = Arc::new(FixedParser(None));
    let record = harness.run(dir.path()).await;

    assert_eq!(record.parsing_mode, Some(ParsingMode::Remote));
    assert!(!record.warnings.contains(&WarningCode::ParserFallback));
}

#[tokio::test]
async fn test_no_usable_parse_fails_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.remote = Some(Arc::new(FixedParser(None)));
    harness.local = Arc::new(FixedParser(None));
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Failed);
    assert!(record.warnings.contains(&WarningCode::ParserFallback));
    assert!(!record.steps.contains_key(&Step::Enhancing));
    assert!(record.error.is_some());
}

#[tokio::test]
async fn test_render_failure_publishes_minimal_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.renderer = Arc::new(BrokenRenderer);
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Completed);
    assert!(record.warnings.contains(&WarningCode::TemplateBuildFailed));
    assert!(record.template_build_error.is_some());
    let html = std::fs::read_to_string(dir.path().join("generated/o1.html")).unwrap();
    assert!(html.contains("<h1>Jane Doe</h1>"));
}

#[tokio::test]
async fn test_email_failure_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new();
    harness.mailer = Arc::new(BrokenMailer);
    let record = harness.run(dir.path()).await;

    assert_eq!(record.status, OrderStatus::Completed);
    assert!(record.warnings.contains(&WarningCode::EmailSendFailed));
    assert!(record.email_error.unwrap().contains("503"));
    assert!(!record.emails.contains_key(&EmailKind::Completed));
}
