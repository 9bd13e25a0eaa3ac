use super::*;

use dlink_core::LinkError;
use pretty_assertions::assert_eq;

#[test]
fn test_parses_uri_list() {
    let endpoints = parse_metastore_uris("thrift://meta-1:9084, thrift://meta-2").unwrap();
    assert_eq!(
        endpoints,
        vec![
            MetastoreEndpoint {
                host: "meta-1".into(),
                port: 9084,
            },
            MetastoreEndpoint {
                host: "meta-2".into(),
                port: DEFAULT_METASTORE_PORT,
            },
        ]
    );
    assert_eq!(endpoints[1].to_string(), "meta-2:9083");
}

#[test]
fn test_rejects_bad_uris() {
    for uri in ["", " , ", "http://meta:9083", "meta:9083", "thrift://"] {
        let err = parse_metastore_uris(uri).unwrap_err();
        assert!(matches!(err, LinkError::Configuration(_)), "{}: {}", uri, err);
    }
}
