//! Message gates applied before and after matching.

use cmdrouter_config::RouterConfig;
use cmdrouter_core::MessageEvent;

/// Permission requirement that only admins satisfy.
pub const ADMIN_PERMISSION: &str = "admin";

/// Whether the passive listener should route this event at all.
pub fn entry_filter(config: &RouterConfig, event: &dyn MessageEvent) -> bool {
    if event.has_replied() || !config.enable_global_match || event.message_str().is_empty() {
        return false;
    }
    if config.activate_by_wake && !event.is_at_or_wake_command() {
        return false;
    }
    true
}

/// Whether the requester may invoke a command with this requirement.
/// Unknown requirements are open to everyone.
pub fn permission_filter(event: &dyn MessageEvent, requirement: &str) -> bool {
    requirement != ADMIN_PERMISSION || event.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdrouter_core::TextEvent;

    #[test]
    fn test_entry_filter() {
        let config = RouterConfig::default();
        assert!(entry_filter(&config, &TextEvent::new("帮我禁言alice")));
        assert!(!entry_filter(&config, &TextEvent::new("")));
        assert!(!entry_filter(&config, &TextEvent::new("hi").replied(true)));
        assert!(!entry_filter(&config, &TextEvent::new("hi").woken(false)));

        let passive = RouterConfig { activate_by_wake: false, ..RouterConfig::default() };
        assert!(entry_filter(&passive, &TextEvent::new("hi").woken(false)));

        let off = RouterConfig { enable_global_match: false, ..RouterConfig::default() };
        assert!(!entry_filter(&off, &TextEvent::new("hi")));
    }

    #[test]
    fn test_permission_filter() {
        let member = TextEvent::new("hi");
        let admin = TextEvent::new("hi").admin(true);
        assert!(!permission_filter(&member, "admin"));
        assert!(permission_filter(&admin, "admin"));
        assert!(permission_filter(&member, "everyone"));
        assert!(permission_filter(&member, "member"));
    }
}
