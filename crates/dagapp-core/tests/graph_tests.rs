use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dagapp_core::{
    Args, CoreError, Declarations, GraphContext, NodeDeclaration, RootInputSpec, Value,
    VectorGroupDeclaration,
};
use serde_json::json;

/// Wrap a closure so every call bumps `counter`
fn counted<F>(
    counter: &Arc<AtomicUsize>,
    f: F,
) -> impl Fn(&Args) -> Result<Value, CoreError> + Send + Sync + 'static
where
    F: Fn(&Args) -> Result<Value, CoreError> + Send + Sync + 'static,
{
    let counter = Arc::clone(counter);
    move |args: &Args| {
        counter.fetch_add(1, Ordering::SeqCst);
        f(args)
    }
}

fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

fn as_numbers(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

struct Chain {
    context: GraphContext,
    a: Arc<AtomicUsize>,
    b: Arc<AtomicUsize>,
    c: Arc<AtomicUsize>,
    d: Arc<AtomicUsize>,
}

/// A -> B -> C fed by root `x`, and D fed by root `y`
fn chain() -> Chain {
    let (a, b, c, d) = Default::default();
    let declarations = Declarations::new()
        .input(RootInputSpec::new("x", json!(1)))
        .input(RootInputSpec::new("y", json!(10)))
        .node(NodeDeclaration::new(
            "node_a",
            ["x"],
            counted(&a, |args| Ok(json!(args.f64("x")? + 1.0))),
        ))
        .node(NodeDeclaration::new(
            "node_b",
            ["node_a"],
            counted(&b, |args| Ok(json!(args.f64("node_a")? * 2.0))),
        ))
        .node(NodeDeclaration::new(
            "node_c",
            ["node_b"],
            counted(&c, |args| Ok(json!(args.f64("node_b")? - 3.0))),
        ))
        .node(NodeDeclaration::new(
            "node_d",
            ["y"],
            counted(&d, |args| Ok(json!(args.f64("y")? * 10.0))),
        ));

    Chain {
        context: GraphContext::new(declarations).unwrap(),
        a,
        b,
        c,
        d,
    }
}

#[test]
fn test_evaluation_terminates_with_values() {
    let mut chain = chain();
    let values = chain.context.get_values(&["node_c", "node_d"]).unwrap();

    assert_eq!(values[0].as_f64(), Some(1.0));
    assert_eq!(values[1].as_f64(), Some(100.0));
    assert_eq!(
        chain.context.evaluation_order().unwrap(),
        vec!["node_a", "node_b", "node_c", "node_d"]
    );
}

#[test]
fn test_repeated_reads_do_not_recompute() {
    let mut chain = chain();
    chain.context.get_values(&["node_c", "node_d"]).unwrap();
    chain.context.get_values(&["node_c", "node_d", "node_b"]).unwrap();

    assert_eq!(calls(&chain.a), 1);
    assert_eq!(calls(&chain.b), 1);
    assert_eq!(calls(&chain.c), 1);
    assert_eq!(calls(&chain.d), 1);
    assert_eq!(chain.context.computation_count("node_c"), 1);
}

#[test]
fn test_root_update_recomputes_only_downstream() {
    let mut chain = chain();
    chain.context.get_values(&["node_c", "node_d"]).unwrap();

    chain.context.set_root_input("x", json!(4)).unwrap();
    assert!(!chain.context.is_cached("node_a"));
    assert!(!chain.context.is_cached("node_c"));
    assert!(chain.context.is_cached("node_d"));

    let values = chain.context.get_values(&["node_c", "node_d"]).unwrap();
    assert_eq!(values[0].as_f64(), Some(7.0));

    assert_eq!(calls(&chain.a), 2);
    assert_eq!(calls(&chain.b), 2);
    assert_eq!(calls(&chain.c), 2);
    assert_eq!(calls(&chain.d), 1);
}

#[test]
fn test_cyclic_registration_leaves_graph_unchanged() {
    let mut chain = chain();
    let before = chain.context.evaluation_order().unwrap();
    let values = chain.context.get_values(&["node_c", "node_d"]).unwrap();

    let err = chain
        .context
        .register_batch(vec![
            NodeDeclaration::new("loop_a", ["loop_b", "node_a"], |_| Ok(json!(0))),
            NodeDeclaration::new("loop_b", ["loop_a"], |_| Ok(json!(0))),
        ])
        .unwrap_err();

    assert!(matches!(err, CoreError::CyclicDependency { .. }));
    assert_eq!(err.error_code(), "ERR_CYCLIC_DEPENDENCY");
    assert_eq!(chain.context.evaluation_order().unwrap(), before);
    assert!(matches!(chain.context.get_value("loop_a"), Err(CoreError::UnknownNode(_))));

    // Existing nodes still answer from cache
    assert_eq!(chain.context.get_values(&["node_c", "node_d"]).unwrap(), values);
    assert_eq!((calls(&chain.a), calls(&chain.c), calls(&chain.d)), (1, 1, 1));
    assert_eq!(chain.context.computation_count("node_c"), 1);
}

#[test]
fn test_unresolved_parameter_is_named() {
    let mut chain = chain();
    let err = chain
        .context
        .register_node(NodeDeclaration::new("node_e", ["node_a", "speed"], |_| Ok(json!(0))))
        .unwrap_err();

    assert_eq!(
        err,
        CoreError::UnresolvedBinding {
            node: "node_e".to_string(),
            parameter: "speed".to_string()
        }
    );
    assert!(err.to_string().contains("speed"));
}

#[test]
fn test_batch_registration_with_forward_references() {
    let mut chain = chain();
    chain
        .context
        .register_batch(vec![
            NodeDeclaration::new("total", ["node_c", "half"], |args| {
                Ok(json!(args.f64("node_c")? + args.f64("half")?))
            }),
            NodeDeclaration::new("half", ["node_d"], |args| Ok(json!(args.f64("node_d")? / 2.0))),
        ])
        .unwrap();

    assert_eq!(chain.context.get_value("total").unwrap().as_f64(), Some(51.0));
    assert_eq!(chain.context.title(), Some("Total Calculator".to_string()));
}

#[test]
fn test_rejected_root_update_keeps_state() {
    let declarations = Declarations::new()
        .input(RootInputSpec::new("vax", json!(0.5)).with_range(0.0, 1.0))
        .node(NodeDeclaration::new("protected", ["vax"], |args| {
            Ok(json!(args.f64("vax")? * 100.0))
        }));
    let mut context = GraphContext::new(declarations).unwrap();
    context.get_value("protected").unwrap();

    let err = context.set_root_input("vax", json!(1.5)).unwrap_err();
    assert!(matches!(err, CoreError::RangeViolation { .. }));
    assert!(context.is_cached("protected"));
    assert_eq!(context.get_value("vax").unwrap(), json!(0.5));

    assert_eq!(
        context.set_root_input("speed", json!(1)).unwrap_err(),
        CoreError::UnknownRootInput("speed".to_string())
    );
}

#[test]
fn test_failing_callable_is_not_cached() {
    let declarations = Declarations::new()
        .input(RootInputSpec::new("divisor", json!(0)))
        .node(NodeDeclaration::new("ratio", ["divisor"], |args| {
            let divisor = args.f64("divisor")?;
            if divisor == 0.0 {
                return Err(CoreError::Other("divisor must not be zero".to_string()));
            }
            Ok(json!(10.0 / divisor))
        }));
    let mut context = GraphContext::new(declarations).unwrap();

    let err = context.get_value("ratio").unwrap_err();
    assert_eq!(err.error_code(), "ERR_COMPUTATION_FAILED");
    assert!(!context.is_cached("ratio"));

    context.set_root_input("divisor", json!(4)).unwrap();
    assert_eq!(context.get_value("ratio").unwrap().as_f64(), Some(2.5));
}

#[test]
fn test_static_node_holds_until_reload() {
    let baseline_calls = Arc::new(AtomicUsize::new(0));
    let declarations = Declarations::new()
        .input(RootInputSpec::new("r", json!(2)))
        .node(
            NodeDeclaration::new(
                "baseline",
                ["r"],
                counted(&baseline_calls, |args| Ok(json!(args.f64("r")? * 10.0))),
            )
            .pinned(),
        )
        .node(NodeDeclaration::new("current", ["r"], |args| Ok(json!(args.f64("r")? * 10.0))))
        .node(NodeDeclaration::new("growth", ["current", "baseline"], |args| {
            Ok(json!(args.f64("current")? - args.f64("baseline")?))
        }));
    let mut context = GraphContext::new(declarations).unwrap();

    // Computed eagerly when declared
    assert_eq!(calls(&baseline_calls), 1);
    assert!(context.is_cached("baseline"));

    context.set_root_input("r", json!(3)).unwrap();
    let values = context.get_values(&["baseline", "current", "growth"]).unwrap();
    assert_eq!(values[0].as_f64(), Some(20.0));
    assert_eq!(values[1].as_f64(), Some(30.0));
    assert_eq!(values[2].as_f64(), Some(10.0));
    assert_eq!(calls(&baseline_calls), 1);

    context.reload_current().unwrap();
    assert_eq!(context.get_value("baseline").unwrap().as_f64(), Some(30.0));
    assert_eq!(context.get_value("growth").unwrap().as_f64(), Some(0.0));
    assert_eq!(calls(&baseline_calls), 2);
}

#[test]
fn test_mark_static_on_live_graph() {
    let mut chain = chain();
    chain.context.get_value("node_b").unwrap();

    let pinned = chain.context.mark_static("node_b").unwrap();
    assert_eq!(pinned, vec!["node_a", "node_b", "node_c"]);

    chain.context.set_root_input("x", json!(100)).unwrap();
    assert_eq!(chain.context.get_value("node_c").unwrap().as_f64(), Some(1.0));

    let err = chain.context.mark_static("missing").unwrap_err();
    assert_eq!(err, CoreError::UnknownNode("missing".to_string()));
}

/// `data` shifted by `offset`
fn metric(name: &str, offset: f64) -> NodeDeclaration {
    NodeDeclaration::new(name, ["data"], move |args| Ok(json!(args.f64("data")? + offset)))
}

#[test]
fn test_static_nodes_sharing_upstream_pin_together() {
    let data_calls = Arc::new(AtomicUsize::new(0));
    let declarations = Declarations::new()
        .input(RootInputSpec::new("r", json!(4)))
        .node(NodeDeclaration::new(
            "data",
            ["r"],
            counted(&data_calls, |args| Ok(json!(args.f64("r")? * 10.0))),
        ))
        .node(metric("metric_a", 1.0).pinned())
        .node(metric("metric_b", -1.0).pinned());

    let mut context = GraphContext::new(declarations).unwrap();
    for name in ["data", "metric_a", "metric_b"] {
        let class = context.describe_node(name).unwrap().class;
        assert!(class.is_pinned(), "{} should be static", name);
    }

    context.set_root_input("r", json!(5)).unwrap();
    let values = context.get_values(&["metric_a", "metric_b"]).unwrap();
    assert_eq!(values, vec![json!(41.0), json!(39.0)]);
    assert_eq!(calls(&data_calls), 1);
}

#[test]
fn test_mark_static_many_on_live_graph() {
    let declarations = Declarations::new()
        .input(RootInputSpec::new("r", json!(4)))
        .node(NodeDeclaration::new("data", ["r"], |args| Ok(json!(args.f64("r")? * 10.0))))
        .node(metric("metric_a", 1.0))
        .node(metric("metric_b", -1.0));
    let mut context = GraphContext::new(declarations).unwrap();

    let err = context.mark_static("metric_a").unwrap_err();
    assert_eq!(err.error_code(), "ERR_INVALID_STATIC_DECLARATION");

    let pinned = context.mark_static_many(&["metric_a", "metric_b"]).unwrap();
    assert_eq!(pinned, vec!["data", "metric_a", "metric_b"]);

    context.set_root_input("r", json!(0)).unwrap();
    assert_eq!(context.get_value("metric_b").unwrap().as_f64(), Some(39.0));
}

struct Powers {
    context: GraphContext,
    square_calls: Arc<AtomicUsize>,
    total_calls: Arc<AtomicUsize>,
}

fn powers() -> Powers {
    let square_calls = Arc::new(AtomicUsize::new(0));
    let total_calls = Arc::new(AtomicUsize::new(0));
    let declarations = Declarations::new()
        .input(RootInputSpec::new("xs", json!([2, 3, 5])))
        .input(RootInputSpec::new("scale", json!(1)))
        .vector_group(VectorGroupDeclaration::new("squares", "xs", "x", "square"))
        .node(
            NodeDeclaration::new(
                "square",
                ["x", "scale"],
                counted(&square_calls, |args| {
                    Ok(json!(args.f64("x")?.powi(2) * args.f64("scale")?))
                }),
            )
            .in_vector_group("squares"),
        )
        .node(NodeDeclaration::new(
            "total",
            ["squares"],
            counted(&total_calls, |args| {
                Ok(json!(args.list("squares")?.iter().filter_map(Value::as_f64).sum::<f64>()))
            }),
        ));

    Powers {
        context: GraphContext::new(declarations).unwrap(),
        square_calls,
        total_calls,
    }
}

#[test]
fn test_vector_group_replicates_per_element() {
    let mut powers = powers();

    let squares = powers.context.get_value("squares").unwrap();
    assert_eq!(as_numbers(&squares), vec![4.0, 9.0, 25.0]);
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(38.0));
    assert_eq!(calls(&powers.square_calls), 3);
    assert_eq!(powers.context.vector_group("squares").unwrap().len(), 3);
}

#[test]
fn test_vector_element_change_recomputes_one_replica() {
    let mut powers = powers();
    powers.context.get_value("total").unwrap();

    powers.context.set_root_input("xs", json!([2, 10, 5])).unwrap();
    let squares = powers.context.get_value("squares").unwrap();

    assert_eq!(as_numbers(&squares), vec![4.0, 100.0, 25.0]);
    assert_eq!(calls(&powers.square_calls), 4);
    assert_eq!(powers.context.computation_counts("square"), vec![1, 2, 1]);
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(129.0));
    assert_eq!(calls(&powers.total_calls), 2);
}

#[test]
fn test_vector_resize_rebuilds_group() {
    let mut powers = powers();
    powers.context.get_value("total").unwrap();

    powers.context.set_root_input("xs", json!([2, 3, 5, 7])).unwrap();
    assert_eq!(powers.context.vector_group("squares").unwrap().len(), 4);

    let squares = powers.context.get_value("squares").unwrap();
    assert_eq!(as_numbers(&squares), vec![4.0, 9.0, 25.0, 49.0]);
    assert_eq!(calls(&powers.square_calls), 7);
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(87.0));

    powers.context.set_root_input("xs", json!([])).unwrap();
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(0.0));

    // Growing from empty still refreshes the aggregate
    powers.context.set_root_input("xs", json!([3])).unwrap();
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(9.0));
}

#[test]
fn test_shared_root_invalidates_every_replica() {
    let mut powers = powers();
    powers.context.get_value("total").unwrap();

    powers.context.set_root_input("scale", json!(2)).unwrap();
    assert!(!powers.context.is_cached("square"));
    assert_eq!(powers.context.get_value("total").unwrap().as_f64(), Some(76.0));
    assert_eq!(calls(&powers.square_calls), 6);
}

#[test]
fn test_vector_source_must_stay_a_sequence() {
    let mut powers = powers();
    powers.context.get_value("total").unwrap();

    let err = powers.context.set_root_input("xs", json!(4)).unwrap_err();
    assert!(matches!(err, CoreError::TypeMismatch { .. }));
    assert!(powers.context.is_cached("total"));
    assert_eq!(powers.context.vector_group("squares").unwrap().len(), 3);
}
