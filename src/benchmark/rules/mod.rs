//! Rule implementations, one module per benchmark section.

pub mod base;
pub mod logging;
pub mod management;
pub mod network;
pub mod virtual_machine;

use std::sync::Arc;

use super::rule::Rule;

pub use base::{AcceptanceLevelRule, AdvancedSettingRule};
pub use logging::RemoteSyslogRule;
pub use management::{HostAgentIntRule, ManagedObjectBrowserRule};
pub use network::{VlanHygieneRule, VswitchSecurityRule};
pub use virtual_machine::VmSettingRule;

/// Every CIS ESXi 8 rule, each under its canonical id.
pub fn all_rules() -> Vec<Arc<dyn Rule>> {
    let mut rules: Vec<Arc<dyn Rule>> = vec![
        Arc::new(AcceptanceLevelRule),
        Arc::new(AdvancedSettingRule::share_force_salting()),
        Arc::new(ManagedObjectBrowserRule),
        Arc::new(AdvancedSettingRule::dcui_timeout()),
        Arc::new(AdvancedSettingRule::shell_interactive_timeout()),
        Arc::new(AdvancedSettingRule::shell_timeout()),
        Arc::new(HostAgentIntRule::account_lock_failures()),
        Arc::new(HostAgentIntRule::account_unlock_time()),
        Arc::new(RemoteSyslogRule),
        Arc::new(VswitchSecurityRule::forged_transmits()),
        Arc::new(VswitchSecurityRule::mac_changes()),
        Arc::new(VswitchSecurityRule::promiscuous()),
        Arc::new(VlanHygieneRule),
    ];
    rules.extend(
        VmSettingRule::all()
            .into_iter()
            .map(|rule| Arc::new(rule) as Arc<dyn Rule>),
    );
    rules
}
