pub mod notifiers;

pub use notifiers::dry_run::DryRunNotifier;
pub use notifiers::mattermost::{MattermostNotifier, WebhookMessage};

use mf_core::{Notifier, Result};
use std::sync::Arc;

/// Build the notifier for `webhook_url`, or one that only logs when `dry_run` is set.
pub fn create_notifier(webhook_url: &str, dry_run: bool) -> Result<Arc<dyn Notifier>> {
    if dry_run {
        return Ok(Arc::new(DryRunNotifier::new()));
    }
    Ok(Arc::new(MattermostNotifier::new(webhook_url)?))
}

pub mod prelude {
    pub use super::{create_notifier, DryRunNotifier, MattermostNotifier};
    pub use mf_core::{render_message, Notifier};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_notifier() {
        assert_eq!(create_notifier("not a url", true).unwrap().name(), "dry-run");
        assert_eq!(
            create_notifier("https://chat.example.com/hooks/abc", false).unwrap().name(),
            "mattermost"
        );
        assert!(create_notifier("not a url", false).is_err());
    }
}
