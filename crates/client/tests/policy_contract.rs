use flame_client::{OperationKind, Policy};

fn load_contract() -> serde_json::Value {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts/jsonrpc-methods.json");
    let content = std::fs::read_to_string(path).expect("contract file should be readable");
    serde_json::from_str(&content).expect("contract file should be valid JSON")
}

#[test]
fn operation_policies_match_contract() {
    let contract = load_contract();

    for kind in OperationKind::ALL {
        let expected = contract["methods"][kind.method()]["policy"]
            .as_str()
            .unwrap_or_else(|| panic!("contract should describe `{kind}`"));
        let actual = match kind.policy() {
            Policy::Coalesce => "coalesce",
            Policy::CancelPrevious => "cancel_previous",
        };
        assert_eq!(actual, expected, "policy for `{kind}` diverged from contract");
    }
}

#[test]
fn operation_params_match_contract() {
    let contract = load_contract();
    let samples = [
        flame_client::Operation::CheckLogin,
        flame_client::Operation::ListProjects,
        flame_client::Operation::list_directory("p", "/"),
        flame_client::Operation::read_file("p", "/a"),
        flame_client::Operation::search("q", 1),
    ];

    for operation in samples {
        let method = operation.kind().method();
        let mut expected: Vec<&str> = contract["methods"][method]["params"]
            .as_array()
            .expect("params should be an array")
            .iter()
            .map(|v| v.as_str().expect("param should be a string"))
            .collect();
        let params = operation.params();
        let mut actual: Vec<&str> = params
            .as_object()
            .expect("params should be an object")
            .keys()
            .map(String::as_str)
            .collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected, "params for `{method}` diverged from contract");
    }
}
