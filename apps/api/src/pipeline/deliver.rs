use chrono::Utc;
use tracing::{info, warn};

use super::stage::{StageError, StageOutput};
use super::{OrderJob, Pipeline};
use crate::archive::{ArchiveInput, ArchiveOutput};
use crate::models::order::{EmailKind, OrderPatch, OrderStatus, Step, WarningCode};
use crate::models::resume::StructuredResume;
use crate::publish::PublishOutcome;

pub(super) struct Delivery {
    publish: PublishOutcome,
    archive: Option<ArchiveOutput>,
}

impl Pipeline {
    /// Publishes and archives concurrently. The archive is optional; a
    /// publish failure fails the order, but only after any archive has been
    /// turned into a download link.
    pub(super) async fn deliver(
        &self,
        job: &OrderJob,
        resume: &StructuredResume,
        html: String,
    ) -> Result<StageOutput<Delivery>, StageError> {
        let input = ArchiveInput {
            order_id: job.order_id.clone(),
            html: html.clone(),
            resume_pdf: Some(self.settings.uploads_dir.join(&job.resume_filename)),
            customer_name: resume.name.trim().to_string(),
            email: job.email.clone(),
        };
        let (published, archived) = tokio::join!(
            self.publisher.publish(&job.order_id, &html),
            self.archiver.archive(input)
        );

        let mut patch = OrderPatch::default();
        let archive = match archived {
            Ok(archive) => {
                patch.zip_path = Some(archive.path.display().to_string());
                patch.zip_basename = Some(archive.basename.clone());
                Some(archive)
            }
            Err(e) => {
                warn!("Archive for order {} failed: {e}", job.order_id);
                patch = patch.warning(WarningCode::ArchiveFailed);
                None
            }
        };

        let publish = match published {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.to_string();
                if let Some(archive) = &archive {
                    patch.download_url = self.issue_link(job, archive).await;
                }
                patch.deploy_error = Some(reason.clone());
                patch = patch.warning(WarningCode::DeployFailed);
                self.tracker.update(&job.order_id, OrderStatus::Deploying, patch).await;

                let alert = self
                    .alert_admin(
                        job,
                        &format!("Deploy failed - Order {}", job.order_id),
                        "Deployment failed",
                        reason,
                    )
                    .await;
                self.tracker.update(&job.order_id, OrderStatus::Deploying, alert).await;
                return Err(e.into());
            }
        };

        patch.deploy_mode = Some(publish.mode);
        patch.deployment_id = publish.deployment_id.clone();
        patch.deploy_error = publish.error.clone();
        patch.admin_message = publish.admin_message.clone();

        let mut degraded = false;
        if !publish.mode.is_hosted() {
            patch = patch.warning(WarningCode::DeployDegraded);
            degraded = true;
        }
        if publish.error.is_some() {
            patch = patch.warning(WarningCode::DeployErrorRecorded);
            degraded = true;
        }
        if publish.admin_message.is_some() {
            patch = patch.warning(WarningCode::AdminContactProvided);
            degraded = true;
        }
        if degraded {
            let details = publish
                .error
                .clone()
                .unwrap_or_else(|| "Unknown deploy error".to_string());
            let alert = self
                .alert_admin(
                    job,
                    &format!("Deploy issue - Order {}", job.order_id),
                    "Deployment issue detected",
                    details,
                )
                .await;
            patch = merge(patch, alert);
        }

        Ok(StageOutput::new(Delivery { publish, archive }, patch))
    }

    async fn issue_link(&self, job: &OrderJob, archive: &ArchiveOutput) -> Option<String> {
        match self
            .downloads
            .issue(&job.email, &job.order_id, Some(archive.basename.clone()))
            .await
        {
            Ok(link) => Some(format!("{}/download/{}", self.settings.backend_url, link.token)),
            Err(e) => {
                warn!("Could not issue download link for order {}: {e}", job.order_id);
                None
            }
        }
    }

    /// Issues the download link, notifies the customer and marks the order complete.
    pub(super) async fn complete(&self, job: &OrderJob, delivery: Delivery) {
        let Delivery { publish, archive } = delivery;

        let download_url = match &archive {
            Some(archive) => self.issue_link(job, archive).await,
            None => None,
        };

        let mut patch = OrderPatch {
            site_url: Some(publish.url.clone()),
            download_url: download_url.clone(),
            deploy_mode: Some(publish.mode),
            deployment_id: publish.deployment_id.clone(),
            deploy_error: publish.error.clone(),
            admin_message: publish.admin_message.clone(),
            customer_message: publish.admin_message.clone(),
            zip_path: archive.as_ref().map(|a| a.path.display().to_string()),
            zip_basename: archive.as_ref().map(|a| a.basename.clone()),
            ..Default::default()
        };

        match self
            .notifier
            .completed(&job.email, &publish.url, download_url.as_deref(), job.position)
            .await
        {
            Ok(preview) => patch = patch.email(EmailKind::Completed, preview),
            Err(e) => {
                let reason = e.to_string();
                warn!("Completion email for order {} failed: {reason}", job.order_id);
                patch.email_error = Some(reason.clone());
                patch = patch.warning(WarningCode::EmailSendFailed);
                let alert = self
                    .alert_admin(
                        job,
                        &format!("Customer email failed - Order {}", job.order_id),
                        "Customer success email failed",
                        reason,
                    )
                    .await;
                patch = merge(patch, alert);
            }
        }

        patch = patch.step(Step::Completed, Utc::now());
        self.tracker
            .update(&job.order_id, OrderStatus::Completed, patch)
            .await;
        info!(
            "Order {} delivered at {} (download link: {})",
            job.order_id,
            publish.url,
            download_url.as_deref().unwrap_or("none")
        );
    }
}

/// Folds an admin-alert patch (warning plus error text) into `patch`.
fn merge(mut patch: OrderPatch, alert: OrderPatch) -> OrderPatch {
    patch.warnings.extend(alert.warnings);
    if alert.admin_email_error.is_some() {
        patch.admin_email_error = alert.admin_email_error;
    }
    patch
}
