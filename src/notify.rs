use async_trait::async_trait;
use tracing::info;

use crate::users::model::VerificationStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationNotice {
    pub email: String,
    pub name: String,
    pub status: VerificationStatus,
    pub remarks: Option<String>,
}

impl VerificationNotice {
    pub fn subject(&self) -> &'static str {
        match self.status {
            VerificationStatus::Approved => "Your alumni account has been approved",
            VerificationStatus::Rejected => "Your alumni account verification was declined",
            VerificationStatus::Blocked => "Your alumni account has been blocked",
            VerificationStatus::Pending => "Your alumni account is awaiting verification",
        }
    }

    pub fn body(&self) -> String {
        let mut body = format!("Hello {},\n\n{}.", self.name, self.subject());
        if let Some(remarks) = &self.remarks {
            body.push_str(&format!("\n\nRemarks: {remarks}"));
        }
        body
    }
}

/// Outbound member notifications. Callers treat delivery as best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_verification_outcome(&self, notice: &VerificationNotice) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_verification_outcome(&self, notice: &VerificationNotice) -> anyhow::Result<()> {
        info!(
            to = %notice.email,
            status = %notice.status,
            subject = notice.subject(),
            body = %notice.body(),
            "verification notice"
        );
        Ok(())
    }
}
