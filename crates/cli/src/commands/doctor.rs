use std::time::Duration;

use osvoice_core::config::{AppConfig, LoadOptions};
use osvoice_skill::{HttpOneSphereClient, OneSphereApi, SessionSettings};
use serde::Serialize;

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

const AUTH_CHECK: &str = "onesphere_authentication";
const STATUS_CHECK: &str = "onesphere_status";

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_onesphere(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in [AUTH_CHECK, STATUS_CHECK] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_onesphere(config: &AppConfig) -> Vec<DoctorCheck> {
    let failed = |details: String| {
        vec![
            DoctorCheck { name: AUTH_CHECK, status: CheckStatus::Fail, details: details.clone() },
            DoctorCheck { name: STATUS_CHECK, status: CheckStatus::Fail, details },
        ]
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return failed(format!("failed to initialize async runtime: {error}")),
    };
    let client = match HttpOneSphereClient::new(Duration::from_secs(config.onesphere.timeout_secs))
    {
        Ok(client) => client,
        Err(error) => return failed(error.to_string()),
    };
    let settings = SessionSettings::from(config);

    runtime.block_on(async {
        let auth = match client
            .create_session(&settings.api_base, &settings.user_name, &settings.password)
            .await
        {
            Ok(Some(_)) => DoctorCheck {
                name: AUTH_CHECK,
                status: CheckStatus::Pass,
                details: format!("session token issued for `{}`", settings.user_name),
            },
            Ok(None) => DoctorCheck {
                name: AUTH_CHECK,
                status: CheckStatus::Fail,
                details: "session response carried no token".to_string(),
            },
            Err(error) => {
                DoctorCheck { name: AUTH_CHECK, status: CheckStatus::Fail, details: error.to_string() }
            }
        };

        let status = match client.service_status(&settings.api_base).await {
            Ok(status) => DoctorCheck {
                name: STATUS_CHECK,
                status: CheckStatus::Pass,
                details: format!(
                    "service reports `{}`",
                    status.service.as_deref().unwrap_or("unknown")
                ),
            },
            Err(error) => DoctorCheck {
                name: STATUS_CHECK,
                status: CheckStatus::Fail,
                details: error.to_string(),
            },
        };

        vec![auth, status]
    })
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
