//! Per-order orchestration: parse, enhance, build, deliver, complete.
//!
//! Each stage is a typed step run through [`stage::run_stage`], which records
//! the stage on the order before it starts and merges its details after. Only
//! two failures end an order: no usable parse, and no publish at all.

mod deliver;
pub mod stage;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::archive::Archiver;
use crate::downloads::Downloads;
use crate::enhancement::Enhancer;
use crate::extraction::{Extraction, ResumeParser, ResumeSource};
use crate::models::content::{EnhancedContent, EnhancementMode};
use crate::models::order::{OrderPatch, OrderStatus, ParsingMode, Step, WarningCode};
use crate::models::resume::StructuredResume;
use crate::notify::{AdminAlert, Notifier};
use crate::orders::OrderTracker;
use crate::publish::Publisher;
use crate::render::{fallback_document, RenderOptions, SiteRenderer};

use stage::{run_stage, StageError, StageOutput};

/// One admitted order handed to the pipeline.
#[derive(Debug, Clone)]
pub struct OrderJob {
    pub order_id: String,
    pub email: String,
    pub position: u32,
    pub resume_filename: String,
    pub photo_filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub backend_url: String,
    pub uploads_dir: PathBuf,
    pub admin_contact: String,
}

/// Whatever takes an admitted order from `queued` to a terminal status.
#[async_trait]
pub trait OrderRunner: Send + Sync {
    async fn run(&self, job: OrderJob);
}

pub struct Pipeline {
    tracker: OrderTracker,
    remote_parser: Option<Arc<dyn ResumeParser>>,
    local_parser: Arc<dyn ResumeParser>,
    enhancer: Arc<Enhancer>,
    renderer: Arc<dyn SiteRenderer>,
    publisher: Arc<dyn Publisher>,
    archiver: Arc<dyn Archiver>,
    downloads: Downloads,
    notifier: Notifier,
    settings: PipelineSettings,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tracker: OrderTracker,
        remote_parser: Option<Arc<dyn ResumeParser>>,
        local_parser: Arc<dyn ResumeParser>,
        enhancer: Arc<Enhancer>,
        renderer: Arc<dyn SiteRenderer>,
        publisher: Arc<dyn Publisher>,
        archiver: Arc<dyn Archiver>,
        downloads: Downloads,
        notifier: Notifier,
        settings: PipelineSettings,
    ) -> Self {
        let mut settings = settings;
        settings.backend_url = settings.backend_url.trim_end_matches('/').to_string();
        Self {
            tracker,
            remote_parser,
            local_parser,
            enhancer,
            renderer,
            publisher,
            archiver,
            downloads,
            notifier,
            settings,
        }
    }

    /// Drives one order to `completed` or `failed`. Never returns an error:
    /// a fatal stage error is recorded on the order instead.
    pub async fn process(&self, job: OrderJob) {
        info!(
            "Generating portfolio for order {} (position #{})",
            job.order_id, job.position
        );
        match self.execute(&job).await {
            Ok(()) => info!("Order {} completed", job.order_id),
            Err(e) => {
                error!("Order {} failed: {e}", job.order_id);
                let message = self.contact_message();
                self.tracker
                    .update(
                        &job.order_id,
                        OrderStatus::Failed,
                        OrderPatch {
                            error: Some(e.to_string()),
                            admin_message: Some(message.clone()),
                            customer_message: Some(message),
                            ..Default::default()
                        },
                    )
                    .await;
            }
        }
    }

    async fn execute(&self, job: &OrderJob) -> Result<(), StageError> {
        let id = job.order_id.as_str();
        let resume = run_stage(&self.tracker, id, OrderStatus::Parsing, Step::Parsing, self.parse(job)).await?;
        let content = run_stage(
            &self.tracker,
            id,
            OrderStatus::Enhancing,
            Step::Enhancing,
            self.enhance(&resume),
        )
        .await?;
        let html = run_stage(
            &self.tracker,
            id,
            OrderStatus::Building,
            Step::Building,
            self.build(job, &resume, &content),
        )
        .await?;
        let delivery = run_stage(
            &self.tracker,
            id,
            OrderStatus::Deploying,
            Step::Deploying,
            self.deliver(job, &resume, html),
        )
        .await?;
        self.complete(job, delivery).await;
        Ok(())
    }

    fn contact_message(&self) -> String {
        format!("You may contact admin: {}", self.settings.admin_contact)
    }

    fn public_upload_url(&self, filename: &str) -> String {
        format!("{}/uploads/{filename}", self.settings.backend_url)
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    async fn parse(&self, job: &OrderJob) -> Result<StageOutput<StructuredResume>, StageError> {
        let source = ResumeSource {
            path: self.settings.uploads_dir.join(&job.resume_filename),
            public_url: self.public_upload_url(&job.resume_filename),
        };

        let (extraction, mode) = match &self.remote_parser {
            Some(remote) => match remote.parse(&source).await {
                Ok(extraction) => (extraction, ParsingMode::Remote),
                Err(e) => {
                    warn!("Remote parse failed for order {}, using local: {e}", job.order_id);
                    // Recorded now so it survives a local failure too.
                    self.tracker
                        .update(
                            &job.order_id,
                            OrderStatus::Parsing,
                            OrderPatch::default().warning(WarningCode::ParserFallback),
                        )
                        .await;
                    (self.local_parser.parse(&source).await?, ParsingMode::Local)
                }
            },
            None => (self.local_parser.parse(&source).await?, ParsingMode::Local),
        };

        let Extraction {
            resume, confidence, ..
        } = extraction;
        let patch = OrderPatch {
            parsing_mode: Some(mode),
            parsing_confidence: Some(confidence),
            customer_name: Some(resume.name.trim().to_string()),
            ..Default::default()
        };
        Ok(StageOutput::new(resume, patch))
    }

    // ── Enhancing ─────────────────────────────────────────────────────────────

    async fn enhance(&self, resume: &StructuredResume) -> Result<StageOutput<EnhancedContent>, StageError> {
        let content = self.enhancer.enhance(resume).await;
        let meta = &content.meta;

        let mut patch = OrderPatch {
            ai_enhancement_mode: Some(meta.mode),
            ai_model_used: meta.model.clone(),
            ai_enhancement_error: meta.error.clone(),
            ..Default::default()
        };
        if meta.mode != EnhancementMode::Claude {
            patch = patch.warning(WarningCode::AiEnhancementFallback);
        }
        if meta.rejected {
            patch = patch.warning(WarningCode::AiOutputRejected);
        } else if meta.error.is_some() {
            patch = patch.warning(WarningCode::AiEnhancementFailed);
        }
        Ok(StageOutput::new(content, patch))
    }

    // ── Building ──────────────────────────────────────────────────────────────

    async fn build(
        &self,
        job: &OrderJob,
        resume: &StructuredResume,
        content: &EnhancedContent,
    ) -> Result<StageOutput<String>, StageError> {
        let options = RenderOptions {
            photo_url: job.photo_filename.as_deref().map(|f| self.public_upload_url(f)),
        };
        match self.renderer.render(resume, content, &options) {
            Ok(html) => Ok(StageOutput::new(html, OrderPatch::default())),
            Err(e) => {
                warn!("Render failed for order {}, using minimal page: {e}", job.order_id);
                let patch = OrderPatch {
                    template_build_error: Some(e.to_string()),
                    ..Default::default()
                }
                .warning(WarningCode::TemplateBuildFailed);
                Ok(StageOutput::new(fallback_document(resume, content), patch))
            }
        }
    }

    /// Sends an admin alert, returning the details to record if it failed.
    async fn alert_admin(&self, job: &OrderJob, subject: &str, title: &str, details: String) -> OrderPatch {
        let alert = AdminAlert {
            subject,
            title,
            order_id: &job.order_id,
            customer_email: &job.email,
            details,
        };
        match self.notifier.admin_alert(alert).await {
            Ok(()) => OrderPatch::default(),
            Err(e) => {
                warn!("Admin alert for order {} failed: {e}", job.order_id);
                OrderPatch {
                    admin_email_error: Some(e.to_string()),
                    ..Default::default()
                }
                .warning(WarningCode::AdminAlertFailed)
            }
        }
    }
}

#[async_trait]
impl OrderRunner for Pipeline {
    async fn run(&self, job: OrderJob) {
        self.process(job).await
    }
}

#[cfg(test)]
mod tests;
