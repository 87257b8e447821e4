use hiredesk_client::HttpHireApi;
use hiredesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};
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

pub fn run(json_output: bool, base_url: Option<String>, offline: bool) -> String {
    let report = build_report(base_url, offline);

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

fn build_report(base_url: Option<String>, offline: bool) -> DoctorReport {
    let mut checks = Vec::new();

    let options = LoadOptions {
        overrides: ConfigOverrides { api_base_url: base_url, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_api_client(&config));
            checks.push(check_api_reachability(&config, offline));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "api_client",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "api_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // Skipped checks do not fail the run; an offline doctor should
    // still pass on a healthy config.
    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_api_client(config: &AppConfig) -> DoctorCheck {
    match HttpHireApi::from_config(config) {
        Ok(_) => DoctorCheck {
            name: "api_client",
            status: CheckStatus::Pass,
            details: format!("client built for `{}`", config.api.base_url),
        },
        Err(error) => DoctorCheck {
            name: "api_client",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_api_reachability(config: &AppConfig, offline: bool) -> DoctorCheck {
    if offline {
        return DoctorCheck {
            name: "api_reachability",
            status: CheckStatus::Skipped,
            details: "skipped by --offline".to_string(),
        };
    }

    let client = match HttpHireApi::from_config(config) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "api_reachability",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "api_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    match runtime.block_on(client.health()) {
        Ok(()) => DoctorCheck {
            name: "api_reachability",
            status: CheckStatus::Pass,
            details: format!("health endpoint answered at `{}`", config.api.base_url),
        },
        Err(error) => DoctorCheck {
            name: "api_reachability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
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
