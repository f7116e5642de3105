mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_in_memory_fallback_warning() {
    let events = common::write_events(common::HAPPY_PATH).unwrap();

    let mut cmd = Command::new(cargo_bin!("checkout-wizard"));
    cmd.arg(events.path()).env_remove("CHECKOUT_BASE_URL");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: No payment service URL configured (--base-url). Falling back to the in-memory payment service."));
}

#[test]
fn test_http_service_no_fallback_warning() {
    let mut server = mockito::Server::new();
    let card = server.mock("POST", "/").with_status(200).create();
    let otp = server
        .mock("POST", "/otp")
        .match_body(mockito::Matcher::Json(serde_json::json!({ "otp": "123456" })))
        .with_status(200)
        .create();

    let events = common::write_events(common::HAPPY_PATH).unwrap();

    let mut cmd = Command::new(cargo_bin!("checkout-wizard"));
    cmd.arg(events.path()).arg("--base-url").arg(server.url());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not())
        .stdout(predicate::str::contains(r#""step": "complete""#));

    card.assert();
    otp.assert();
}

#[test]
fn test_base_url_from_environment() {
    let mut server = mockito::Server::new();
    let card = server.mock("POST", "/").with_status(503).create();

    let events = common::write_events(&common::HAPPY_PATH[..12]).unwrap();

    let mut cmd = Command::new(cargo_bin!("checkout-wizard"));
    cmd.arg(events.path()).env("CHECKOUT_BASE_URL", server.url());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""step": "payment""#))
        .stdout(predicate::str::contains("Failed to submit card. Please try again."));

    card.assert();
}
