/* src/cli/core/src/config/tests/validation.rs */

use super::*;

#[test]
fn empty_fallback_rejected() {
  let err = parse_site_config("[i18n]\nfallback = \"\"\n").unwrap_err();
  assert!(err.to_string().contains("i18n.fallback"));
}

#[test]
fn blank_host_rejected() {
  let err = parse_site_config("[server]\nhost = \" \"\n").unwrap_err();
  assert!(err.to_string().contains("server.host"));
}

#[test]
fn blank_seed_rejected() {
  let err = parse_site_config("[store]\nseed = \"\"\n").unwrap_err();
  assert!(err.to_string().contains("store.seed"));
}

#[test]
fn unparsable_port_rejected() {
  assert!(parse_site_config("[server]\nport = 70000\n").is_err());
  assert!(parse_site_config("[server]\nport = \"x\"\n").is_err());
}

#[test]
fn missing_file_reports_path() {
  let tmp = tempfile::tempdir().unwrap();
  let path = tmp.path().join("campaign.toml");
  let err = load_site_config(&path).unwrap_err();
  assert!(err.to_string().contains("failed to read"));
}

#[test]
fn missing_config_reported() {
  let tmp = tempfile::tempdir().unwrap();
  let err = find_site_config(tmp.path()).unwrap_err();
  assert!(err.to_string().contains("campaign.toml not found"));
}
