use std::collections::BTreeSet;

use flame_common::protocol::jsonrpc::SUPPORTED_PROTOCOL_VERSIONS;
use flame_common::protocol::methods::IMPLEMENTED_METHODS;

fn load_contract() -> serde_json::Value {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts/jsonrpc-methods.json");
    let content = std::fs::read_to_string(path).expect("contract file should be readable");
    serde_json::from_str(&content).expect("contract file should be valid JSON")
}

#[test]
fn implemented_methods_match_contract() {
    let contract = load_contract();
    let expected: BTreeSet<&str> = contract["implemented_methods"]
        .as_array()
        .expect("implemented_methods should be an array")
        .iter()
        .map(|v| v.as_str().expect("method should be a string"))
        .collect();

    let actual: BTreeSet<&str> = IMPLEMENTED_METHODS.iter().copied().collect();
    assert_eq!(actual, expected, "IMPLEMENTED_METHODS diverged from contract");
}

#[test]
fn every_implemented_method_is_described() {
    let contract = load_contract();
    let described = contract["methods"].as_object().expect("methods should be an object");

    for method in IMPLEMENTED_METHODS {
        let entry = described
            .get(*method)
            .unwrap_or_else(|| panic!("method `{method}` missing from contract description"));
        let policy = entry["policy"].as_str().expect("policy should be a string");
        assert!(
            matches!(policy, "coalesce" | "cancel_previous"),
            "method `{method}` has unknown policy `{policy}`"
        );
    }
}

#[test]
fn rpc_protocol_versions_match_contract() {
    let contract = load_contract();
    let expected: Vec<&str> = contract["rpc_protocol_versions"]
        .as_array()
        .expect("rpc_protocol_versions should be an array")
        .iter()
        .map(|v| v.as_str().expect("version should be a string"))
        .collect();

    assert_eq!(
        SUPPORTED_PROTOCOL_VERSIONS,
        &expected[..],
        "SUPPORTED_PROTOCOL_VERSIONS diverged from contract"
    );
}
