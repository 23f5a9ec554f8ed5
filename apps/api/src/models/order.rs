use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::content::EnhancementMode;

/// Order status as seen by a polling client.
///
/// The happy path is strictly ordered `pending_payment -> queued -> parsing ->
/// enhancing -> building -> deploying -> completed`; `failed` and
/// `payment_failed` are terminal and reachable from anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    NotFound,
    PendingPayment,
    Queued,
    Parsing,
    Enhancing,
    Building,
    Deploying,
    Completed,
    Failed,
    PaymentFailed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::NotFound => "not_found",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Queued => "queued",
            OrderStatus::Parsing => "parsing",
            OrderStatus::Enhancing => "enhancing",
            OrderStatus::Building => "building",
            OrderStatus::Deploying => "deploying",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::PaymentFailed => "payment_failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::PaymentFailed
        )
    }

    fn rank(self) -> u8 {
        match self {
            OrderStatus::NotFound => 0,
            OrderStatus::PendingPayment => 1,
            OrderStatus::Queued => 2,
            OrderStatus::Parsing => 3,
            OrderStatus::Enhancing => 4,
            OrderStatus::Building => 5,
            OrderStatus::Deploying => 6,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::PaymentFailed => 7,
        }
    }

    /// Status that results from writing `next` onto a record currently at `self`.
    /// Terminal statuses are sticky and earlier stages never overwrite later ones.
    pub fn advance(self, next: OrderStatus) -> OrderStatus {
        if self.is_terminal() {
            self
        } else if next.rank() >= self.rank() {
            next
        } else {
            self
        }
    }
}

/// Named pipeline steps; the first timestamp recorded for each is kept forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Queued,
    Parsing,
    Enhancing,
    Building,
    Deploying,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    ParserFallback,
    AiEnhancementFallback,
    AiEnhancementFailed,
    AiOutputRejected,
    TemplateBuildFailed,
    DeployFailed,
    DeployDegraded,
    DeployErrorRecorded,
    AdminContactProvided,
    ArchiveFailed,
    EmailSendFailed,
    AdminAlertFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Confirmation,
    Completed,
    SoldOut,
}

/// Rendered email kept on the order so preview-mode clients can display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPreview {
    pub subject: String,
    pub html: String,
    pub preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMode {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
    Vercel,
    S3,
    Local,
}

impl DeployMode {
    pub fn is_hosted(self) -> bool {
        !matches!(self, DeployMode::Local)
    }
}

macro_rules! order_fields {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $field:ident: $ty:ty,)+ }) => {
        $(#[$meta])*
        pub struct $name {
            pub order_id: String,
            pub status: OrderStatus,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub updated_at: Option<DateTime<Utc>>,
            #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
            pub steps: BTreeMap<Step, DateTime<Utc>>,
            #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
            pub warnings: BTreeSet<WarningCode>,
            #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
            pub emails: BTreeMap<EmailKind, EmailPreview>,
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl $name {
            fn overwrite_scalars(&mut self, patch: OrderPatch) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = Some(value);
                    }
                )+
            }
        }

        /// Partial update merged into an [`OrderRecord`].
        #[derive(Debug, Clone, Default)]
        pub struct OrderPatch {
            pub steps: BTreeMap<Step, DateTime<Utc>>,
            pub warnings: BTreeSet<WarningCode>,
            pub emails: BTreeMap<EmailKind, EmailPreview>,
            $(pub $field: Option<$ty>,)+
        }
    };
}

order_fields! {
    /// The single source of truth for one order's progress.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    OrderRecord {
        email: String,
        filename: String,
        photo_filename: String,
        position: u32,
        eta_minutes: u32,
        created_at: DateTime<Utc>,
        parsing_mode: ParsingMode,
        parsing_confidence: f32,
        customer_name: String,
        ai_enhancement_mode: EnhancementMode,
        ai_enhancement_error: String,
        ai_model_used: String,
        template_build_error: String,
        deploy_mode: DeployMode,
        deploy_error: String,
        deployment_id: String,
        #[serde(rename = "vercelUrl")]
        site_url: String,
        download_url: String,
        zip_basename: String,
        zip_path: String,
        error: String,
        admin_message: String,
        customer_message: String,
        email_error: String,
        admin_email_error: String,
        payment_ref: String,
        payment_amount: String,
        payment_reason: String,
    }
}

impl OrderRecord {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Self::default()
        }
    }

    /// Sentinel returned to pollers for unknown order ids.
    pub fn not_found(order_id: impl Into<String>) -> Self {
        Self::new(order_id)
    }

    /// Merges `patch` into the record.
    ///
    /// Scalars overwrite, `steps` are first-write-wins per step, `warnings`
    /// are a set union and `emails` merge per kind. `updated_at` is always
    /// stamped with `now`.
    pub fn apply(&mut self, status: OrderStatus, mut patch: OrderPatch, now: DateTime<Utc>) {
        self.status = self.status.advance(status);
        self.updated_at = Some(now);

        for (step, at) in std::mem::take(&mut patch.steps) {
            self.steps.entry(step).or_insert(at);
        }
        self.warnings.extend(std::mem::take(&mut patch.warnings));
        self.emails.extend(std::mem::take(&mut patch.emails));

        self.overwrite_scalars(patch);
    }
}

impl OrderPatch {
    pub fn step(mut self, step: Step, at: DateTime<Utc>) -> Self {
        self.steps.insert(step, at);
        self
    }

    pub fn warning(mut self, code: WarningCode) -> Self {
        self.warnings.insert(code);
        self
    }

    pub fn email(mut self, kind: EmailKind, preview: EmailPreview) -> Self {
        self.emails.insert(kind, preview);
        self
    }
}
