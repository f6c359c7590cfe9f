//! Auditor orchestration tests: host failures, aliases, fixes and exit codes.

mod common;

use std::sync::Arc;

use common::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use esxguard::audit::{AuditEvents, AuditReport, Auditor, FixRecord, SilentEvents};
use esxguard::benchmark::commands;
use esxguard::benchmark::{BenchmarkSettings, RemediationOutcome, RuleRegistry, Verdict};
use esxguard::connection::ConnectionError;

fn auditor() -> Auditor {
    Auditor::new(Arc::new(RuleRegistry::esxi8()), BenchmarkSettings::default())
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn all_ids() -> Vec<String> {
    RuleRegistry::esxi8().resolve("").0
}

#[derive(Default)]
struct RecordingEvents {
    log: Mutex<Vec<String>>,
}

impl AuditEvents for RecordingEvents {
    fn on_host_start(&self, host: &str) {
        self.log.lock().push(format!("start {}", host));
    }

    fn on_verdict(&self, verdict: &Verdict) {
        self.log
            .lock()
            .push(format!("{} {}", verdict.rule_id, verdict.passed));
    }

    fn on_host_error(&self, host: &str, _error: &ConnectionError) {
        self.log.lock().push(format!("error {}", host));
    }

    fn on_fix(&self, record: &FixRecord) {
        self.log.lock().push(format!("fix {}", record.rule_id));
    }
}

#[tokio::test]
async fn test_compliant_host_exits_zero() {
    let mock = MockConnection::new("10.0.0.5");
    script_compliant_host(&mock);

    let host = auditor()
        .audit_host("10.0.0.5", &mock, &all_ids(), &SilentEvents)
        .await;
    assert_eq!(host.verdicts.len(), 20);
    assert_eq!(host.failed(), 0);

    let report = AuditReport::new(vec![host]);
    assert_eq!(report.exit_code(), 0);
    assert!(report.failed_rule_ids(&RuleRegistry::esxi8()).is_empty());
}

#[tokio::test]
async fn test_failed_rule_exits_two() {
    let mock = MockConnection::new("10.0.0.5");
    script_compliant_host(&mock);
    mock.respond(
        commands::advanced_get("/UserVars/DcuiTimeOut"),
        &advanced_list("/UserVars/DcuiTimeOut", 601),
    );

    let host = auditor()
        .audit_host("10.0.0.5", &mock, &all_ids(), &SilentEvents)
        .await;
    let report = AuditReport::new(vec![host]);

    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.failed_rule_ids(&RuleRegistry::esxi8()), vec!["3.7"]);
}

#[tokio::test]
async fn test_unreachable_host_stops_its_audit_only() {
    let down = MockConnection::new("10.0.0.6");
    down.set_should_fail(true);
    let up = MockConnection::new("10.0.0.5");
    script_compliant_host(&up);

    let events = RecordingEvents::default();
    let auditor = auditor();
    let rules = ids(&["2.4", "3.7"]);
    let first = auditor.audit_host("10.0.0.6", &down, &rules, &events).await;
    let second = auditor.audit_host("10.0.0.5", &up, &rules, &events).await;

    assert!(first.is_unreachable());
    assert!(first.verdicts.is_empty());
    assert!(!second.is_unreachable());
    assert_eq!(second.verdicts.len(), 2);
    assert_eq!(
        *events.log.lock(),
        vec![
            "start 10.0.0.6",
            "error 10.0.0.6",
            "start 10.0.0.5",
            "2.4 true",
            "3.7 true",
        ]
    );

    let report = AuditReport::new(vec![first, second]);
    assert_eq!(report.stats.unreachable_hosts, 1);
    assert_eq!(report.exit_code(), 3);
}

#[tokio::test]
async fn test_connection_lost_midway_keeps_earlier_verdicts() {
    let mock = MockConnection::new("h");
    script_compliant_host(&mock);
    // 2.4 runs two commands, 2.10 one
    mock.fail_after(3);

    let host = auditor()
        .audit_host("h", &mock, &ids(&["2.4", "2.10", "3.3"]), &SilentEvents)
        .await;
    assert_eq!(host.verdicts.len(), 2);
    assert!(host.is_unreachable());
    assert!(host.error.as_deref().unwrap_or_default().contains("Mock connection failed"));
}

#[tokio::test]
async fn test_alias_is_evaluated_once() {
    let mock = MockConnection::new("h");
    mock.respond(commands::PORTGROUP_LIST, PORTGROUPS_DIRTY);

    let host = auditor()
        .audit_host("h", &mock, &ids(&["5.9", "5.10"]), &SilentEvents)
        .await;

    assert_eq!(mock.command_count(), 1);
    assert_eq!(host.verdicts.len(), 2);
    let alias = host.verdict("5.10").unwrap();
    assert_eq!(alias.title, "Port-group VLAN hygiene (trunk VLANs)");
    assert!(!alias.passed);
    assert_eq!(
        alias.offending_port_groups(),
        host.verdict("5.9").unwrap().offending_port_groups()
    );
}

#[tokio::test]
async fn test_alias_alone_still_reports_under_its_id() {
    let mock = MockConnection::new("h");
    mock.respond(commands::PORTGROUP_LIST, PORTGROUPS_CLEAN);

    let host = auditor()
        .audit_host("h", &mock, &ids(&["5.10"]), &SilentEvents)
        .await;
    assert_eq!(host.verdicts.len(), 1);
    assert_eq!(host.verdicts[0].rule_id, "5.10");
    assert!(host.verdicts[0].passed);
}

#[tokio::test]
async fn test_remediate_only_failed_and_selected() {
    let mock = MockConnection::new("h");
    script_compliant_host(&mock);
    mock.respond(
        commands::advanced_get("/UserVars/DcuiTimeOut"),
        &advanced_list("/UserVars/DcuiTimeOut", 0),
    );
    mock.respond(
        commands::advanced_get("/Mem/ShareForceSalting"),
        &advanced_list("/Mem/ShareForceSalting", 1),
    );

    let auditor = auditor();
    let host = auditor
        .audit_host("h", &mock, &all_ids(), &SilentEvents)
        .await;
    mock.reset();

    let events = RecordingEvents::default();
    let fixes = auditor
        .remediate_host(
            &host,
            &mock,
            &ids(&["3.7", "2.4"]),
            &ScriptedOperator::silent(),
            &events,
        )
        .await;

    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].rule_id, "3.7");
    assert_eq!(fixes[0].outcome, Some(RemediationOutcome::Applied(1)));
    assert_eq!(
        mock.get_commands(),
        vec![commands::advanced_set("/UserVars/DcuiTimeOut", 600)]
    );
    assert_eq!(*events.log.lock(), vec!["fix 3.7"]);

    let mut report = AuditReport::new(vec![host]);
    report.record_fixes(fixes);
    assert_eq!(report.stats.fixes_applied, 1);
    // 2.10 still failed
    assert_eq!(report.exit_code(), 2);
}

#[tokio::test]
async fn test_alias_pair_remediated_once() {
    let mock = MockConnection::new("h");
    mock.respond(commands::PORTGROUP_LIST, PORTGROUPS_DIRTY);

    let auditor = auditor();
    let rules = ids(&["5.9", "5.10"]);
    let host = auditor.audit_host("h", &mock, &rules, &SilentEvents).await;
    mock.reset();

    let operator = ScriptedOperator::new(["10", "20"]);
    let fixes = auditor
        .remediate_host(&host, &mock, &rules, &operator, &SilentEvents)
        .await;

    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].outcome, Some(RemediationOutcome::Applied(2)));
    assert_eq!(mock.command_count(), 2);
}

#[tokio::test]
async fn test_fix_failures_are_recorded_and_run_continues() {
    let mock = MockConnection::new("h");
    mock.respond(commands::VM_LIST, VM_LIST_WINDOWS1);
    mock.respond(commands::SYSLOG_GET, &syslog_config("<none>"));

    let auditor = auditor();
    let rules = ids(&["4.2", "7.6"]);
    let host = auditor.audit_host("h", &mock, &rules, &SilentEvents).await;
    assert_eq!(host.failed(), 2);

    // The syslog prompt is closed, the VM prompt gets an empty selection
    let operator = ScriptedOperator::new(Vec::<String>::new());
    let fixes = auditor
        .remediate_host(&host, &mock, &rules, &operator, &SilentEvents)
        .await;
    assert_eq!(fixes.len(), 2);
    assert!(fixes[0].error.as_deref().unwrap_or_default().contains("Prompt failed"));
    assert!(fixes[1].error.is_some());

    let operator = ScriptedOperator::new(["", ""]);
    let fixes = auditor
        .remediate_host(&host, &mock, &ids(&["7.6"]), &operator, &SilentEvents)
        .await;
    assert_eq!(fixes[0].outcome, Some(RemediationOutcome::NoSelection));
    assert!(!fixes[0].is_success());

    let mut report = AuditReport::new(vec![host]);
    report.record_fixes(fixes);
    assert_eq!(report.stats.fixes_failed, 1);
    assert_eq!(report.exit_code(), 2);
}

#[tokio::test]
async fn test_unattended_run_skips_fixes_that_need_answers() {
    let mock = MockConnection::new("h");
    mock.respond(
        commands::advanced_get("/UserVars/DcuiTimeOut"),
        &advanced_list("/UserVars/DcuiTimeOut", 0),
    );
    mock.respond(commands::SYSLOG_GET, &syslog_config("<none>"));
    mock.respond(commands::PORTGROUP_LIST, PORTGROUPS_DIRTY);
    mock.respond(commands::VM_LIST, VM_LIST_WINDOWS1);

    let auditor = auditor();
    let rules = ids(&["3.7", "4.2", "5.9", "7.6"]);
    let host = auditor.audit_host("h", &mock, &rules, &SilentEvents).await;
    assert_eq!(host.failed(), 4);
    mock.reset();

    let operator = ScriptedOperator::unattended();
    let fixes = auditor
        .remediate_host(&host, &mock, &rules, &operator, &SilentEvents)
        .await;

    assert_eq!(fixes.len(), 4);
    assert_eq!(fixes[0].outcome, Some(RemediationOutcome::Applied(1)));
    for fix in &fixes[1..] {
        assert!(fix.is_skipped(), "{} was attempted", fix.rule_id);
        assert!(fix.error.is_none());
        assert!(fix
            .skipped
            .as_deref()
            .unwrap_or_default()
            .contains("needs an interactive terminal"));
    }
    assert!(operator.prompts().is_empty());
    assert_eq!(
        mock.get_commands(),
        vec![commands::advanced_set("/UserVars/DcuiTimeOut", 600)]
    );

    let mut report = AuditReport::new(vec![host]);
    report.record_fixes(fixes);
    assert_eq!(report.stats.fixes_applied, 1);
    assert_eq!(report.stats.fixes_skipped, 3);
    assert_eq!(report.stats.fixes_failed, 0);
}

#[tokio::test]
async fn test_unreachable_host_is_not_remediated() {
    let mock = MockConnection::new("h");
    mock.set_should_fail(true);

    let auditor = auditor();
    let host = auditor
        .audit_host("h", &mock, &all_ids(), &SilentEvents)
        .await;
    let fixes = auditor
        .remediate_host(&host, &mock, &all_ids(), &ScriptedOperator::silent(), &SilentEvents)
        .await;
    assert!(fixes.is_empty());
}

#[tokio::test]
async fn test_report_serializes_for_json_output() {
    let mock = MockConnection::new("10.0.0.5");
    script_compliant_host(&mock);
    let host = auditor()
        .audit_host("10.0.0.5", &mock, &ids(&["3.7"]), &SilentEvents)
        .await;

    let json = serde_json::to_value(AuditReport::new(vec![host])).unwrap();
    assert_eq!(json["hosts"][0]["host"], "10.0.0.5");
    assert_eq!(json["hosts"][0]["verdicts"][0]["rule_id"], "3.7");
    assert_eq!(json["stats"]["passed"], 1);
    assert!(json.get("fixes").is_none());
}
