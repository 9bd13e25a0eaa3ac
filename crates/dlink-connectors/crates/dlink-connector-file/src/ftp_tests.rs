use super::*;
use std::time::Duration;

use dlink_core::{FILE_KIND, FileConnector, LinkError, Parameter};
use pretty_assertions::assert_eq;

use crate::ftp::parse_list_line;

fn param() -> Parameter {
    Parameter::new("FTP", FILE_KIND).with_host("ftp.internal", 2121)
}

#[test]
fn test_defaults() {
    let settings = FtpSettings::from_param(&param()).unwrap();
    assert_eq!(settings.port, 2121);
    assert!(settings.passive);
    assert!(settings.binary);
    assert_eq!(settings.timeout, Duration::from_millis(30_000));
    assert_eq!(settings.encoding, "UTF-8");
}

#[test]
fn test_anonymous_login_uses_guest_password() {
    let settings = FtpSettings::from_param(&param()).unwrap();
    assert_eq!(settings.user, ANONYMOUS_USER);
    assert_eq!(settings.password, ANONYMOUS_PASSWORD);
    assert_eq!(settings.password, "guest@dataround.io");
}

#[test]
fn test_explicit_options() {
    let param = param()
        .with_credentials("etl", "secret")
        .with_config("passiveMode", "false")
        .with_config("binaryMode", "false")
        .with_config("timeout", "500");
    let settings = FtpSettings::from_param(&param).unwrap();
    assert_eq!(settings.user, "etl");
    assert_eq!(settings.password, "secret");
    assert!(!settings.passive);
    assert!(!settings.binary);
    assert_eq!(settings.timeout, Duration::from_millis(500));
}

#[test]
fn test_default_port() {
    let mut param = param();
    param.port = None;
    assert_eq!(FtpSettings::from_param(&param).unwrap().port, 21);
}

#[test]
fn test_missing_host_is_configuration_error() {
    let err = FtpSettings::from_param(&Parameter::new("FTP", FILE_KIND)).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
}

#[test]
fn test_invalid_timeout_is_configuration_error() {
    let err = FtpSettings::from_param(&param().with_config("timeout", "soon")).unwrap_err();
    assert!(matches!(err, LinkError::Configuration(_)));
}

#[test]
fn test_settings_debug_hides_password() {
    let settings = FtpSettings::from_param(&param().with_credentials("etl", "secret")).unwrap();
    assert!(!format!("{:?}", settings).contains("secret"));
}

#[test]
fn test_parse_unix_listing() {
    let dir = parse_list_line("drwxr-xr-x 2 ftp ftp 4096 Mar 01 12:00 2024").unwrap();
    assert_eq!(dir, RemoteEntry::directory("2024"));

    let file = parse_list_line("-rw-r--r-- 1 ftp ftp 120 Mar 01 12:00 orders.csv").unwrap();
    assert_eq!(file, RemoteEntry::file("orders.csv"));

    assert!(parse_list_line("total 8").is_none());
}

#[test]
fn test_uninitialized_connector() {
    let mut connector = FtpConnector::default();
    assert!(!connector.test_connectivity());
    assert!(connector.list_files("/").is_err());
    assert!(connector.close().is_ok());
}
