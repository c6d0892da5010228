use flowcheck_core::{
    parse_environment_str, parse_flow_str, validate_environment, validate_flow, DocumentFormat,
    FailurePolicy, Validate,
};

fn minimal_valid_yaml() -> &'static str {
    r#"
flowId: auth
name: Login then fetch profile
failurePolicy: continue
steps:
  - stepId: login
    method: POST
    path: /login
    body:
      username: "{{user}}"
    captures:
      - name: token
        path: data.token
    assertions:
      - status == 200
      - data.token exists
  - stepId: me
    method: GET
    path: /me
    headers:
      Authorization: "Bearer {{token}}"
    timeoutMs: 2000
    assertions:
      - status == 200
      - data.user.name == "Ada"
edges:
  - source: login
    target: me
"#
}

#[test]
fn parse_yaml_and_validate_ok() {
    let parsed = parse_flow_str(minimal_valid_yaml(), DocumentFormat::Yaml).unwrap();
    validate_flow(&parsed.value).unwrap();
    assert_eq!(parsed.value.failure_policy, Some(FailurePolicy::Continue));
    assert_eq!(parsed.value.steps[1].timeout_ms, Some(2000));
}

#[test]
fn parse_auto_detects_yaml() {
    let parsed = parse_flow_str(minimal_valid_yaml(), DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
}

#[test]
fn parse_json_and_validate_ok() {
    let json = r#"
{
  "flowId": "health",
  "steps": [
    { "stepId": "ping", "method": "GET", "path": "/health", "assertions": ["status == 200"] }
  ]
}
"#;
    let parsed = parse_flow_str(json, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
    parsed.value.validate().unwrap();
    assert!(parsed.value.edges.is_empty());
}

#[test]
fn malformed_document_is_a_parse_error() {
    assert!(parse_flow_str("{ not json", DocumentFormat::Json).is_err());
    assert!(parse_flow_str("steps: [", DocumentFormat::Yaml).is_err());
}

#[test]
fn validation_collects_every_violation() {
    let yaml = r#"
flowId: broken
steps:
  - stepId: a
    method: GET
    path: /a
    captures:
      - name: "$bad"
        path: data.id
      - name: ok
        path: "data..id"
    assertions:
      - status == two-hundred
      - exists
  - stepId: a
    method: "GE T"
    path: ""
    timeoutMs: 0
edges:
  - source: a
    target: ghost
"#;
    let flow = parse_flow_str(yaml, DocumentFormat::Yaml).unwrap().value;
    let err = validate_flow(&flow).unwrap_err();
    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();

    for expected in [
        "steps[0].captures[0]",
        "steps[0].captures[1]",
        "steps[0].assertions[0]",
        "steps[0].assertions[1]",
        "steps[1].stepId",
        "steps[1].method",
        "steps[1].path",
        "steps[1].timeoutMs",
        "edges[0].target",
    ] {
        assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
    }
}

#[test]
fn empty_flow_and_self_loop_are_rejected() {
    let yaml = r#"
flowId: loop
steps:
  - stepId: a
    method: GET
    path: /a
edges:
  - source: a
    target: a
"#;
    let flow = parse_flow_str(yaml, DocumentFormat::Yaml).unwrap().value;
    let err = validate_flow(&flow).unwrap_err();
    assert_eq!(err.violations.len(), 1);
    assert_eq!(err.violations[0].path, "edges[0]");

    let empty = parse_flow_str("flowId: e\nsteps: []\n", DocumentFormat::Yaml).unwrap().value;
    let err = validate_flow(&empty).unwrap_err();
    assert_eq!(err.violations[0].path, "steps");
}

#[test]
fn environment_validation() {
    let env = parse_environment_str(
        r#"{"id": "dev", "baseUrl": "http://localhost:8080", "variables": {"user": "ada"}}"#,
        DocumentFormat::Auto,
    )
    .unwrap()
    .value;
    validate_environment(&env).unwrap();
    assert_eq!(env.environment_id, "dev");

    let bad = parse_environment_str(
        "baseUrl: localhost\nvariables:\n  $randomInt: \"1\"\n",
        DocumentFormat::Yaml,
    )
    .unwrap()
    .value;
    let err = bad.validate().unwrap_err();
    assert_eq!(err.violations.len(), 2);
}
