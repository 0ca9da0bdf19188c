use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use application::alert_intake::AlertIntake;
use application::feedback::FeedbackService;
use application::inspector_runtime::{InspectorRuntime, TaskOutcome, run_inspector};
use chrono::Utc;
use domain::alert::entity::Alert;
use domain::attribute::entity::{AttrType, Attribute};
use domain::common::entity::ReportId;
use domain::report::entity::{ReportContent, ReportSection};
use domain::task::entity::TaskResult;
use infrastructure::constants::INSPECT_TIMEOUT;

use crate::cli::OutputFormat;
use crate::inspectors::IpAddrInspector;
use crate::startup::Services;

// ── Correlate ───────────────────────────────────────────────────────────

pub async fn cmd_correlate(services: &Services, path: &Path, output: OutputFormat) -> Result<()> {
    let alert = parse_alert(&read_file(path)?, path)?;

    let intake = AlertIntake::new(Arc::clone(&services.dispatcher));
    let outcome = intake.receive_alert(&alert, Utc::now()).await?;

    if output == OutputFormat::Json {
        let body = serde_json::json!({
            "report": outcome.report,
            "dispatched": outcome.dispatched,
            "duplicates": outcome.duplicates,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Report:      {}", outcome.report.id);
    println!("Status:      {}", outcome.report.status);
    println!("Created at:  {}", outcome.report.created_at.to_rfc3339());
    println!("Dispatched:  {}", outcome.dispatched.len());
    println!("Duplicates:  {}", outcome.duplicates);
    if !outcome.dispatched.is_empty() {
        println!();
        print_attribute_table(&outcome.dispatched);
    }
    Ok(())
}

// ── Inspect ─────────────────────────────────────────────────────────────

pub async fn cmd_inspect(services: &Services, path: &Path, output: OutputFormat) -> Result<()> {
    let raw = read_file(path)?;
    let payloads: Vec<Vec<u8>> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.as_bytes().to_vec())
        .collect();

    let runtime = InspectorRuntime::new(
        Arc::new(IpAddrInspector),
        Arc::clone(&services.queue),
        services.dispatch_settings(),
        services.metrics_port(),
    );
    let outcomes = tokio::time::timeout(INSPECT_TIMEOUT, runtime.handle_batch(&payloads))
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "inspection did not finish within {}s",
                INSPECT_TIMEOUT.as_secs()
            )
        })??;

    if output == OutputFormat::Json {
        let rows: Vec<_> = outcomes
            .iter()
            .map(|outcome| match outcome {
                TaskOutcome::Declined => serde_json::json!({ "outcome": "declined" }),
                TaskOutcome::Published {
                    contents,
                    attributes,
                } => serde_json::json!({
                    "outcome": "published",
                    "contents": contents,
                    "attributes": attributes,
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if outcomes.is_empty() {
        println!("No task messages in {}.", path.display());
        return Ok(());
    }

    println!("{:>4}  {:<10}  {:>8}  {:>10}", "#", "OUTCOME", "CONTENTS", "ATTRIBUTES");
    for (i, outcome) in outcomes.iter().enumerate() {
        let (label, contents, attributes) = match outcome {
            TaskOutcome::Declined => ("declined", 0, 0),
            TaskOutcome::Published {
                contents,
                attributes,
            } => ("published", *contents, *attributes),
        };
        println!(
            "{:>4}  {:<10}  {:>8}  {:>10}",
            i + 1,
            label,
            contents,
            attributes
        );
    }
    println!("\n{} task(s) handled.", outcomes.len());
    Ok(())
}

// ── Feedback ────────────────────────────────────────────────────────────

pub fn cmd_feedback_content(services: &Services, path: &Path, output: OutputFormat) -> Result<()> {
    let raw = read_file(path)?;
    let feedback = FeedbackService::new(Arc::clone(&services.dispatcher));
    let section = feedback.accept_content(raw.as_bytes(), Utc::now())?;

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&section)?);
        return Ok(());
    }

    println!(
        "Section staged: report={} author={} kind={} attribute={}",
        section.report_id,
        section.author,
        section.content.kind(),
        format_attribute(&section.attribute)
    );
    Ok(())
}

pub async fn cmd_feedback_attribute(
    services: &Services,
    path: &Path,
    output: OutputFormat,
) -> Result<()> {
    let raw = read_file(path)?;
    let feedback = FeedbackService::new(Arc::clone(&services.dispatcher));
    let dispatched = feedback.accept_attribute(raw.as_bytes(), Utc::now()).await?;

    if output == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "dispatched": dispatched }))?
        );
        return Ok(());
    }

    if dispatched {
        println!("Attribute dispatched as a new task.");
    } else {
        println!("Attribute already scheduled for this report; skipped.");
    }
    Ok(())
}

// ── Show ────────────────────────────────────────────────────────────────

pub fn cmd_show(services: &Services, report_id: &str, output: OutputFormat) -> Result<()> {
    let report_id = ReportId::from(report_id);
    let repository = services.repository();
    let alerts = repository.fetch_alert_cache(&report_id)?;
    let attributes = repository.fetch_attribute_cache(&report_id)?;
    let sections = repository.fetch_report_section(&report_id)?;

    if output == OutputFormat::Json {
        let body = serde_json::json!({
            "report_id": report_id,
            "alerts": alerts,
            "attributes": attributes,
            "sections": sections,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Report {report_id}");

    println!("\nAlerts ({}):", alerts.len());
    for alert in &alerts {
        println!(
            "  {}  {:<16} {:<20} {}",
            alert.timestamp.to_rfc3339(),
            truncate(&alert.detector, 16),
            truncate(&alert.rule_id, 20),
            alert.rule_name
        );
    }

    println!("\nAttributes ({}):", attributes.len());
    if !attributes.is_empty() {
        print_attribute_table(&attributes);
    }

    println!("\nSections ({}):", sections.len());
    for section in &sections {
        println!("  {}", format_section(section));
    }
    Ok(())
}

// ── Try ─────────────────────────────────────────────────────────────────

pub async fn cmd_try(
    attr_type: AttrType,
    key: &str,
    value: &str,
    output: OutputFormat,
) -> Result<()> {
    let attribute = Attribute::new(attr_type, key, value);
    let result = run_inspector(&IpAddrInspector, attribute).await?;

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        None => println!("Inspector declined {attr_type} attributes."),
        Some(result) => print_task_result(&result),
    }
    Ok(())
}

// ── Purge ───────────────────────────────────────────────────────────────

pub fn cmd_purge(services: &Services, output: OutputFormat) -> Result<()> {
    let removed = services.store.purge_expired(Utc::now().timestamp())?;
    let remaining = services.store.record_count()?;

    if output == OutputFormat::Json {
        let body = serde_json::json!({ "removed": removed, "remaining": remaining });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Purged {removed} expired record(s); {remaining} remaining.");
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_alert(raw: &str, path: &Path) -> Result<Alert> {
    serde_json::from_str(raw).with_context(|| format!("invalid alert JSON in {}", path.display()))
}

fn print_attribute_table(attributes: &[Attribute]) {
    println!("  {:<9} {:<16} {:<40} {:<20}", "TYPE", "KEY", "VALUE", "CONTEXT");
    for attr in attributes {
        let context = attr
            .context
            .iter()
            .map(|c| format!("{c:?}").to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "  {:<9} {:<16} {:<40} {:<20}",
            attr.attr_type.as_str(),
            truncate(&attr.key, 16),
            truncate(&attr.value, 40),
            if context.is_empty() { "-".to_string() } else { context },
        );
    }
}

fn print_task_result(result: &TaskResult) {
    println!("Contents ({}):", result.contents.len());
    for content in &result.contents {
        println!("  {}", format_content(content));
    }
    println!("New attributes ({}):", result.new_attributes.len());
    for attr in &result.new_attributes {
        println!("  {}", format_attribute(attr));
    }
}

fn format_attribute(attr: &Attribute) -> String {
    format!("{}:{}={}", attr.attr_type, attr.key, attr.value)
}

fn format_section(section: &ReportSection) -> String {
    format!(
        "[{}] {} <- {}",
        section.author,
        format_content(&section.content),
        format_attribute(&section.attribute)
    )
}

fn format_content(content: &ReportContent) -> String {
    match content {
        ReportContent::Host(host) => {
            let mut parts = Vec::new();
            if !host.ip_addr.is_empty() {
                parts.push(format!("ip={}", host.ip_addr.join(",")));
            }
            if !host.host_name.is_empty() {
                parts.push(format!("name={}", host.host_name.join(",")));
            }
            if !host.as_owner.is_empty() {
                parts.push(format!("owner={}", host.as_owner.join(",")));
            }
            format!("host {}", join_or_dash(&parts))
        }
        ReportContent::User(user) => format!("user activities={}", user.activities.len()),
        ReportContent::Binary(_) => "binary".to_string(),
    }
}

fn join_or_dash(parts: &[String]) -> String {
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::report::entity::{ReportHost, ReportUser};

    #[test]
    fn parse_alert_error_names_file_and_keeps_cause() {
        let err = parse_alert("{\"detector\": 7}", Path::new("/tmp/alert.json")).unwrap_err();
        assert_eq!(err.to_string(), "invalid alert JSON in /tmp/alert.json");
        assert_eq!(err.chain().count(), 2);
        assert!(err.root_cause().to_string().contains("invalid type"));
    }

    #[test]
    fn parse_alert_accepts_valid_json() {
        let raw = r#"{
            "detector": "guardduty",
            "rule_id": "recon-1",
            "rule_name": "outbound port probe",
            "alert_key": "A1",
            "timestamp": "2024-05-01T09:00:00Z",
            "attributes": []
        }"#;
        let alert = parse_alert(raw, Path::new("alert.json")).unwrap();
        assert_eq!(alert.detector, "guardduty");
        assert_eq!(alert.alert_key, "A1");
    }

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate("guardduty", 16), "guardduty");
    }

    #[test]
    fn truncate_long_string_gets_ellipsis() {
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn format_attribute_joins_identity() {
        let attr = Attribute::new(AttrType::DomainName, "query", "example.com");
        assert_eq!(format_attribute(&attr), "domain:query=example.com");
    }

    #[test]
    fn format_host_content() {
        let content = ReportContent::Host(ReportHost {
            ip_addr: vec!["10.0.0.1".to_string()],
            as_owner: vec!["private network".to_string()],
            ..Default::default()
        });
        assert_eq!(
            format_content(&content),
            "host ip=10.0.0.1 owner=private network"
        );
    }

    #[test]
    fn format_empty_host_is_dash() {
        let content = ReportContent::Host(ReportHost::default());
        assert_eq!(format_content(&content), "host -");
    }

    #[test]
    fn format_user_content_counts_activities() {
        let content = ReportContent::User(ReportUser::default());
        assert_eq!(format_content(&content), "user activities=0");
    }
}
