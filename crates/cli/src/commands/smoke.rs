use std::time::Instant;

use anyhow::{bail, ensure, Context as _, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::commands::CommandResult;
use hiredesk_client::WizardSession;
use hiredesk_core::api::FixtureHireApi;
use hiredesk_core::config::{AppConfig, LoadOptions};
use hiredesk_core::domain::customer::{Customer, CustomerId};
use hiredesk_core::domain::equipment::{EquipmentSearchResults, SearchMode};
use hiredesk_core::domain::interaction::{ContactMethod, InteractionType};
use hiredesk_core::wizard::{LookupDisposition, WizardState, WizardStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

const WIZARD_CHECKS: [&str; 5] = [
    "step_plan",
    "customer_cascade",
    "accessory_derivation",
    "stale_discard",
    "submission",
];

/// Validates the config, then runs the wizard end to end against the
/// fixture backend: step planning, the customer cascade, accessory
/// derivation, staleness discards, and a full submission. Nothing here
/// touches the network.
pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, _config)) => checks.push(SmokeCheck {
            name: "config_validation",
            status: SmokeStatus::Pass,
            elapsed_ms,
            message: "configuration loaded and validated".to_string(),
        }),
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            for name in WIZARD_CHECKS {
                checks.push(skipped(name));
            }
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "async_runtime",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            for name in WIZARD_CHECKS {
                checks.push(skipped(name));
            }
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    run_check(&mut checks, "step_plan", check_step_plan);
    run_check(&mut checks, "customer_cascade", || {
        runtime.block_on(check_customer_cascade())
    });
    run_check(&mut checks, "accessory_derivation", || {
        runtime.block_on(check_accessory_derivation())
    });
    run_check(&mut checks, "stale_discard", check_stale_discard);
    run_check(&mut checks, "submission", || runtime.block_on(check_submission()));

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn run_check(
    checks: &mut Vec<SmokeCheck>,
    name: &'static str,
    check: impl FnOnce() -> Result<String>,
) {
    let started = Instant::now();
    match check() {
        Ok(message) => checks.push(SmokeCheck {
            name,
            status: SmokeStatus::Pass,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message,
        }),
        Err(error) => checks.push(SmokeCheck {
            name,
            status: SmokeStatus::Fail,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: format!("{error:#}"),
        }),
    }
}

fn check_step_plan() -> Result<String> {
    let mut wizard = WizardState::new();
    ensure!(
        wizard.step_sequence() == vec![WizardStep::TypeSelection],
        "without a type only the type selection step should exist"
    );

    let expected: &[(InteractionType, usize)] = &[
        (InteractionType::Hire, 5),
        (InteractionType::OffHire, 4),
        (InteractionType::Quotation, 4),
        (InteractionType::Enquiry, 3),
    ];
    for (interaction_type, total) in expected {
        ensure!(
            wizard.select_type(*interaction_type),
            "{} should be selectable",
            interaction_type.label()
        );
        ensure!(
            wizard.total_steps() == *total,
            "{} should plan {} steps, planned {}",
            interaction_type.label(),
            total,
            wizard.total_steps()
        );
    }

    for coming_soon in [InteractionType::Breakdown, InteractionType::Exchange] {
        ensure!(
            !wizard.select_type(coming_soon),
            "{} is not live and should be refused",
            coming_soon.label()
        );
    }

    Ok("step plans derive from the interaction type".to_string())
}

async fn check_customer_cascade() -> Result<String> {
    let mut session = WizardSession::new(FixtureHireApi::new());
    ensure!(session.select_type(InteractionType::Hire), "hire should be selectable");

    session.search_customers("breedon").await?;
    ensure!(
        session.state().customer_results().len() == 1,
        "expected exactly one match for `breedon`, found {}",
        session.state().customer_results().len()
    );
    let customer = session.state().customer_results()[0].clone();
    session.choose_customer(customer).await;

    let contact = session
        .state()
        .contact()
        .context("the single primary contact should be preselected")?;
    ensure!(
        contact.name == "Dawn Keller",
        "unexpected preselected contact `{}`",
        contact.name
    );

    let contacts = session.state().contact_options().len();
    let sites = session.state().site_options().len();
    ensure!(sites == 2, "expected 2 sites for the customer, found {sites}");

    Ok(format!("customer cascade loaded {contacts} contacts and {sites} sites"))
}

async fn check_accessory_derivation() -> Result<String> {
    let mut session = WizardSession::new(FixtureHireApi::new());
    session.select_type(InteractionType::Hire);

    session.search_equipment(SearchMode::Generic, "excavator").await?;
    let results = session
        .state()
        .equipment_results()
        .context("equipment results should be present after the search")?;
    let EquipmentSearchResults::Types(types) = results.clone() else {
        bail!("generic search should return catalogue types");
    };
    let excavator = types.first().context("the excavator should match")?.clone();
    let excavator_id = excavator.id;

    session.add_generic_equipment(excavator).await?;
    let defaults = session.state().accessory_selections().len();
    ensure!(defaults == 3, "the excavator should derive 3 default rows, got {defaults}");

    session.set_generic_quantity(excavator_id, 2).await?;
    ensure!(
        session
            .state()
            .accessory_selections()
            .iter()
            .all(|row| row.quantity == 2),
        "derived quantities should scale with the basket"
    );

    session.remove_generic_equipment(excavator_id).await?;
    ensure!(
        session.state().accessory_selections().is_empty(),
        "emptying the basket should drop the derived rows"
    );

    Ok("accessory defaults follow the equipment basket".to_string())
}

fn check_stale_discard() -> Result<String> {
    let mut wizard = WizardState::new();
    wizard.select_type(InteractionType::Hire);

    let first = wizard.begin_customer_search("bre");
    let second = wizard.begin_customer_search("breedon");

    let newest = wizard.apply_customer_search(
        &second,
        Ok(vec![Customer {
            id: CustomerId(101),
            name: "Breedon Groundworks Ltd".to_string(),
            account_ref: Some("BG-0041".to_string()),
        }]),
    );
    ensure!(
        newest == LookupDisposition::Applied,
        "the newest response should be applied"
    );

    let stale = wizard.apply_customer_search(&first, Ok(Vec::new()));
    ensure!(
        stale == LookupDisposition::DiscardedStale,
        "the superseded response should be discarded"
    );
    ensure!(
        wizard.customer_results().len() == 1,
        "the applied results should survive the stale response"
    );

    Ok("superseded lookup responses are discarded".to_string())
}

async fn check_submission() -> Result<String> {
    let mut session = WizardSession::new(FixtureHireApi::new());
    ensure!(session.select_type(InteractionType::Hire), "hire should be selectable");

    session.search_customers("breedon").await?;
    let customer = session.state().customer_results()[0].clone();
    session.choose_customer(customer).await;
    let site = session
        .state()
        .site_options()
        .first()
        .context("the customer should have sites")?
        .clone();
    session.choose_site(site);
    session.advance()?;

    session.search_equipment(SearchMode::Generic, "excavator").await?;
    let results = session
        .state()
        .equipment_results()
        .context("equipment results should be present")?;
    let EquipmentSearchResults::Types(types) = results.clone() else {
        bail!("generic search should return catalogue types");
    };
    let excavator = types.first().context("the excavator should match")?.clone();
    session.add_generic_equipment(excavator).await?;
    session.advance()?;

    session.set_delivery_date(Some(smoke_date(2026, 9, 7)?));
    session.set_hire_start_date(Some(smoke_date(2026, 9, 7)?));
    session.set_hire_end_date(Some(smoke_date(2026, 9, 21)?));
    session.set_contact_method(ContactMethod::Phone);
    session.advance()?;

    let receipt = session.submit().await?;
    ensure!(
        receipt.reference_number.starts_with("HD-"),
        "unexpected reference `{}`",
        receipt.reference_number
    );

    Ok(format!("interaction submitted as {}", receipt.reference_number))
}

fn smoke_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid smoke date")
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped after a previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
