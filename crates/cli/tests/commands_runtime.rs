use std::env;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use tidyquote_cli::commands::{
    config, doctor,
    price::{self, PriceArgs},
    rates::{self, RatesArgs},
};

fn weekly_request(json: bool) -> PriceArgs {
    PriceArgs {
        square_footage: 1500,
        frequency: Some("weekly".to_string()),
        add_ons: vec!["pethaircleanup".to_string()],
        json,
    }
}

#[test]
fn price_json_reports_totals_in_configured_currency() {
    with_env(&[("TIDYQUOTE_PRICING_CURRENCY", "EUR")], || {
        let result = price::run(&weekly_request(true));
        assert_eq!(result.exit_code, 0, "expected successful pricing");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "price");
        assert_eq!(payload["currency"], "EUR");
        assert_eq!(money(&payload["quote"]["basePrice"]), Decimal::new(120, 0));
        assert_eq!(money(&payload["quote"]["totalPrice"]), Decimal::new(1305, 1));
        assert_eq!(payload["degradations"].as_array().map(Vec::len), Some(0));
    });
}

#[test]
fn price_human_output_ends_with_total_line() {
    with_env(&[], || {
        let result = price::run(&weekly_request(false));
        assert_eq!(result.exit_code, 0);

        let last = result.output.lines().last().unwrap_or_default().to_string();
        assert_eq!(
            last,
            "base 120.00 + surcharges 25.00 - discounts 14.50 = total 130.50 USD"
        );
    });
}

#[test]
fn price_returns_config_failure_for_invalid_currency() {
    with_env(&[("TIDYQUOTE_PRICING_CURRENCY", "usd")], || {
        let result = price::run(&weekly_request(true));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "price");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn price_rejects_unknown_frequency() {
    with_env(&[], || {
        let result = price::run(&PriceArgs {
            frequency: Some("fortnightly".to_string()),
            ..weekly_request(true)
        });
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_argument");
    });
}

#[test]
fn price_without_seed_catalog_degrades_to_zero() {
    with_env(&[("TIDYQUOTE_PRICING_SEED_CATALOG", "false")], || {
        let result = price::run(&weekly_request(true));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(money(&payload["quote"]["totalPrice"]), Decimal::ZERO);
        let kinds = payload["degradations"]
            .as_array()
            .map(|items| items.iter().map(|item| item["kind"].clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        assert_eq!(kinds, vec!["no_matching_tier", "unmatched_add_on", "no_frequency_discount"]);
    });
}

#[test]
fn rates_filters_by_category() {
    with_env(&[], || {
        let result = rates::run(&RatesArgs { category: Some("surcharge".to_string()), json: true });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let categories = payload
            .as_array()
            .map(|items| items.iter().map(|item| item["category"].clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        assert_eq!(categories.len(), 4);
        assert!(categories.iter().all(|category| category == "surcharge"));

        let invalid = rates::run(&RatesArgs { category: Some("bundle".to_string()), json: true });
        assert_eq!(invalid.exit_code, 3);
    });
}

#[test]
fn doctor_passes_with_seeded_defaults() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(3));
    });
}

#[test]
fn doctor_fails_and_skips_catalog_checks_when_config_invalid() {
    with_env(&[("TIDYQUOTE_PRICING_RECENT_QUOTES_LIMIT", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_skips_coverage_when_seed_catalog_disabled() {
    with_env(&[("TIDYQUOTE_PRICING_SEED_CATALOG", "false")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- [skip] tier_coverage"), "{}", result.output);
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("TIDYQUOTE_SERVER_PORT", "9090"), ("TIDYQUOTE_LOG_LEVEL", "debug")], || {
        let output = config::run();

        assert!(output.contains("- server.port = 9090 (source: env (TIDYQUOTE_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (TIDYQUOTE_LOG_LEVEL))"));
        assert!(output.contains("- pricing.currency = USD (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn money(value: &Value) -> Decimal {
    value.as_str().and_then(|raw| raw.parse().ok()).expect("decimal string")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TIDYQUOTE_SERVER_BIND_ADDRESS",
        "TIDYQUOTE_SERVER_PORT",
        "TIDYQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "TIDYQUOTE_PRICING_CURRENCY",
        "TIDYQUOTE_PRICING_SEED_CATALOG",
        "TIDYQUOTE_PRICING_RECENT_QUOTES_LIMIT",
        "TIDYQUOTE_LOGGING_LEVEL",
        "TIDYQUOTE_LOGGING_FORMAT",
        "TIDYQUOTE_LOG_LEVEL",
        "TIDYQUOTE_LOG_FORMAT",
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
