use serde::Serialize;
use tidyquote_core::config::{AppConfig, LoadOptions};
use tidyquote_core::cpq::RateSnapshot;
use tidyquote_core::domain::rate::ServiceFrequency;

use crate::commands::{CatalogContext, CommandResult};

const EXIT_DOCTOR_FAILED: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_DOCTOR_FAILED } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let context = CatalogContext::from_config(config);
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match context.catalog.snapshot() {
                Ok(snapshot) => {
                    checks.push(check_tier_coverage(&context.config, &snapshot));
                    checks.push(check_discount_uniqueness(&snapshot));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "tier_coverage",
                        status: CheckStatus::Fail,
                        details: format!("rate catalog unreadable: {error}"),
                    });
                    checks.push(skipped("discount_uniqueness", "rate catalog unreadable"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("tier_coverage", "configuration did not load"));
            checks.push(skipped("discount_uniqueness", "configuration did not load"));
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_tier_coverage(config: &AppConfig, snapshot: &RateSnapshot) -> DoctorCheck {
    if !config.pricing.seed_catalog {
        return skipped("tier_coverage", "seed catalog disabled; rates are created at runtime");
    }

    let coverage = snapshot.tier_coverage();
    DoctorCheck {
        name: "tier_coverage",
        status: if coverage.is_complete() { CheckStatus::Pass } else { CheckStatus::Fail },
        details: coverage.describe(),
    }
}

fn check_discount_uniqueness(snapshot: &RateSnapshot) -> DoctorCheck {
    let duplicated = [
        ServiceFrequency::Weekly,
        ServiceFrequency::Biweekly,
        ServiceFrequency::Monthly,
        ServiceFrequency::OneTime,
    ]
    .into_iter()
    .filter(|frequency| snapshot.discounts_for(*frequency).len() > 1)
    .map(|frequency| frequency.as_str())
    .collect::<Vec<_>>();

    if duplicated.is_empty() {
        DoctorCheck {
            name: "discount_uniqueness",
            status: CheckStatus::Pass,
            details: "at most one active discount per frequency".to_string(),
        }
    } else {
        DoctorCheck {
            name: "discount_uniqueness",
            status: CheckStatus::Fail,
            details: format!("several active discounts for: {}", duplicated.join(", ")),
        }
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped: {reason}") }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
