use anyhow::Result;
use async_trait::async_trait;

use super::Completer;

/// Completer used when no provider is configured. Every call fails, which sends
/// the planner down its fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCompleter;

#[async_trait]
impl Completer for OfflineCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("no completion provider configured")
    }

    fn name(&self) -> &str {
        "offline"
    }
}
