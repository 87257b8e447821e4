use std::env;
use std::sync::{Mutex, OnceLock};

use hiredesk_cli::commands::{config, doctor, smoke};
use serde_json::Value;

#[test]
fn smoke_passes_against_the_fixture_backend() {
    with_env(&[], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected a passing smoke report");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        let names: Vec<_> = checks
            .iter()
            .map(|check| check["name"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(
            names,
            vec![
                "config_validation",
                "step_plan",
                "customer_cascade",
                "accessory_derivation",
                "stale_discard",
                "submission",
            ]
        );
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn smoke_fails_fast_when_config_is_invalid() {
    with_env(&[("HIREDESK_API_BASE_URL", "ftp://hire.example.com")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected the smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");

        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert!(checks[1..].iter().all(|check| check["status"] == "skipped"));
    });
}

#[test]
fn doctor_offline_passes_and_skips_reachability() {
    with_env(&[], || {
        let output = doctor::run(true, None, true);
        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        let reachability = checks
            .iter()
            .find(|check| check["name"] == "api_reachability")
            .expect("reachability check");
        assert_eq!(reachability["status"], "skipped");
    });
}

#[test]
fn doctor_reports_config_failures_and_skips_dependent_checks() {
    with_env(&[("HIREDESK_API_BASE_URL", "not-a-url")], || {
        let output = doctor::run(true, None, false);
        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "fail");

        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert!(checks[1..].iter().all(|check| check["status"] == "skipped"));
    });
}

#[test]
fn doctor_base_url_override_goes_through_validation() {
    with_env(&[], || {
        let output = doctor::run(true, Some("ftp://wrong.example.com".to_string()), true);
        let payload = parse_payload(&output);
        assert_eq!(
            payload["overall_status"], "fail",
            "an invalid override should fail config validation"
        );
    });
}

#[test]
fn config_command_attributes_sources_and_redacts_tokens() {
    with_env(
        &[
            ("HIREDESK_API_BASE_URL", "https://hire.example.com"),
            ("HIREDESK_API_AUTH_TOKEN", "tok-secret-value"),
        ],
        || {
            let output = config::run();
            assert!(output.contains(
                "- api.base_url = https://hire.example.com (source: env (HIREDESK_API_BASE_URL))"
            ));
            assert!(output
                .contains("- api.auth_token = tok-*** (source: env (HIREDESK_API_AUTH_TOKEN))"));
            assert!(!output.contains("tok-secret-value"));
            assert!(output.contains("- search.result_limit = 25 (source: default)"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HIREDESK_API_BASE_URL",
        "HIREDESK_API_TIMEOUT_SECS",
        "HIREDESK_API_AUTH_TOKEN",
        "HIREDESK_SEARCH_RESULT_LIMIT",
        "HIREDESK_LOGGING_LEVEL",
        "HIREDESK_LOGGING_FORMAT",
        "HIREDESK_LOG_LEVEL",
        "HIREDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
