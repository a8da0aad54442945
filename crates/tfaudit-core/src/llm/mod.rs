mod hf;
mod settings;

use anyhow::Result;
use async_trait::async_trait;

pub use hf::HfChatClient;
pub use settings::InferenceSettings;

/// Client abstraction for the hosted model that performs the security audit.
#[async_trait]
pub trait AuditModel: Send + Sync {
    /// Send one unit of Terraform code for analysis and return the raw reply.
    async fn audit(&self, system_prompt: &str, content: &str) -> Result<String>;
}
