use flowcheck_core::{
    build_graph, plan_flow, plan_from_str, render_plan_text, DocumentFormat, Environment, Flow,
    FlowEdge, FlowStep, GraphError,
};

fn diamond() -> Flow {
    Flow {
        flow_id: "diamond".into(),
        name: None,
        description: None,
        failure_policy: None,
        steps: vec![
            FlowStep::new("d", "GET", "/d"),
            FlowStep::new("b", "GET", "/b"),
            FlowStep::new("a", "GET", "/a"),
            FlowStep::new("c", "GET", "/c"),
        ],
        edges: vec![
            FlowEdge::new("a", "b"),
            FlowEdge::new("a", "c"),
            FlowEdge::new("b", "d"),
            FlowEdge::new("c", "d"),
        ],
    }
}

#[test]
fn planner_builds_levels_from_edges() {
    let doc = r#"
flowId: orders
steps:
  - stepId: login
    method: POST
    path: /login
    captures:
      - name: token
        path: data.token
  - stepId: createOrder
    method: POST
    path: /orders
    headers:
      Authorization: "Bearer {{token}}"
    captures:
      - name: orderId
        path: id
  - stepId: fetchOrder
    method: GET
    path: /orders/{{orderId}}
edges:
  - from: login
    to: createOrder
  - from: createOrder
    to: fetchOrder
"#;

    let outcome = plan_from_str(doc, DocumentFormat::Yaml, None).unwrap();
    assert!(outcome.validation.is_valid, "{:?}", outcome.validation.errors);
    let plan = outcome.plan.unwrap();
    assert_eq!(
        plan.graph.levels,
        vec![
            vec!["login".to_string()],
            vec!["createOrder".to_string()],
            vec!["fetchOrder".to_string()],
        ]
    );
    assert_eq!(plan.graph.predecessors("fetchOrder"), ["createOrder".to_string()]);
    assert!(plan.summary.unbound_variables.is_empty());
    assert!(outcome.validation.warnings.is_empty());
}

#[test]
fn topological_order_keeps_declared_order_between_independent_steps() {
    let graph = build_graph(&diamond()).unwrap();
    assert_eq!(graph.topo_order, vec!["a", "b", "c", "d"]);
    assert_eq!(
        graph.levels,
        vec![vec!["a".to_string()], vec!["b".into(), "c".into()], vec!["d".into()]]
    );
    let succ: Vec<_> = graph.transitive_successors("a").into_iter().collect();
    assert_eq!(succ, vec!["b", "c", "d"]);
    assert!(graph.transitive_successors("d").is_empty());
}

#[test]
fn cycles_are_rejected_with_the_involved_steps() {
    let mut flow = diamond();
    flow.edges.push(FlowEdge::new("d", "a"));
    match build_graph(&flow) {
        Err(GraphError::Cycle(ids)) => assert_eq!(ids, vec!["d", "b", "a", "c"]),
        other => panic!("expected cycle, got {other:?}"),
    }

    let outcome = plan_flow(&flow, None).unwrap();
    assert!(!outcome.validation.is_valid);
    assert!(outcome.plan.is_none());
    assert!(outcome.validation.errors.iter().any(|e| e.contains("cycle")));
}

#[test]
fn unknown_edge_endpoint_is_a_graph_error() {
    let mut flow = diamond();
    flow.edges.push(FlowEdge::new("a", "ghost"));
    assert!(matches!(
        build_graph(&flow),
        Err(GraphError::UnknownStep { missing, .. }) if missing == "ghost"
    ));
}

#[test]
fn unbound_variables_are_reported_per_step() {
    let mut flow = diamond();
    flow.steps[1] = FlowStep::new("b", "GET", "/b/{{token}}").header("X-Req", "{{$uuid}}");
    flow.steps[3] = FlowStep::new("c", "GET", "/c/{{host_id}}/{{$nope}}");
    flow.steps[2] = FlowStep::new("a", "GET", "/a").capture("token", "token");

    let env = Environment::new("dev", "http://localhost").with_variable("host_id", "7");
    let plan = plan_flow(&flow, Some(&env)).unwrap().plan.unwrap();

    let c = plan.steps.iter().find(|s| s.step_id == "c").unwrap();
    assert_eq!(c.unbound_variables.iter().collect::<Vec<_>>(), vec!["$nope"]);
    let b = plan.steps.iter().find(|s| s.step_id == "b").unwrap();
    assert!(b.unbound_variables.is_empty());
    assert!(b.referenced_variables.contains("token"));

    // Without the environment, host_id is unbound as well.
    let plan = plan_flow(&flow, None).unwrap().plan.unwrap();
    assert!(plan.summary.unbound_variables.contains("host_id"));
}

#[test]
fn capture_from_unrelated_branch_does_not_bind() {
    let flow = Flow {
        flow_id: "f".into(),
        name: None,
        description: None,
        failure_policy: None,
        steps: vec![
            FlowStep::new("x", "GET", "/x").capture("id", "id"),
            FlowStep::new("y", "GET", "/y/{{id}}"),
        ],
        edges: vec![],
    };
    let plan = plan_flow(&flow, None).unwrap().plan.unwrap();
    assert!(plan.summary.unbound_variables.contains("id"));
}

#[test]
fn dot_and_text_renderings_mention_every_step() {
    let flow = diamond();
    let plan = plan_flow(&flow, None).unwrap().plan.unwrap();

    let dot = plan.graph.to_dot(&flow.flow_id);
    assert!(dot.starts_with("digraph flowcheck {"));
    assert!(dot.contains("\"a\" -> \"b\";"));
    assert!(dot.contains("{ rank=same; \"b\"; \"c\"; }"));

    let text = render_plan_text(&plan);
    assert!(text.contains("flow diamond (4 steps, 4 edges, policy abort)"));
    assert!(text.contains("level 1:"));
    assert!(text.contains("d GET /d  (after b, c)"));
}
