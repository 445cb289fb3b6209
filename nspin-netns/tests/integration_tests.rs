use nspin_core::{DiagnosticsConfig, Error, InterfaceLocation, TargetConfig};
use nspin_netns::*;
use std::net::Ipv4Addr;
use std::sync::Arc;

fn executor(mock: &MockRunner) -> Executor {
    Executor::new(Arc::new(mock.clone()))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn clean_host() -> MockRunner {
    MockRunner::new(SimulatedHost::new().with_root_interface("ha-0-0"))
}

#[tokio::test]
async fn test_add_on_clean_host() {
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    let report = reconciler.converge(false).await.unwrap();

    assert_eq!(
        mock.mutations().await,
        vec![
            "ip netns add ha-test",
            "ip link set dev ha-0-0 netns ha-test",
            "ip netns exec ha-test ip link set ha-0-0 up",
            "ip netns exec ha-test ip link set lo up",
            "ip netns exec ha-test ip addr add 2.2.2.3/24 dev ha-0-0",
            "ip netns exec ha-test ip route add default via 2.2.2.2",
        ]
    );
    assert!(report.skipped().is_empty());
    assert!(report.tolerated().is_empty());

    assert!(mock.namespace_exists("ha-test").await);
    assert_eq!(
        mock.interface_location("ha-0-0", "ha-test").await,
        InterfaceLocation::InTargetNamespace
    );
    assert!(mock.link_is_up("ha-test", "ha-0-0").await);
    assert!(mock.link_is_up("ha-test", "lo").await);
    assert_eq!(mock.addresses("ha-test", "ha-0-0").await, vec!["2.2.2.3/24"]);
    assert_eq!(mock.default_route("ha-test").await, Some(Ipv4Addr::new(2, 2, 2, 2)));
}

#[tokio::test]
async fn test_second_add_is_idempotent() {
    init_tracing();
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    reconciler.converge(false).await.unwrap();
    mock.clear_calls().await;
    let report = reconciler.converge(false).await.unwrap();

    // Only bring-up and the tolerated route attempt are re-issued
    assert_eq!(
        mock.mutations().await,
        vec![
            "ip netns exec ha-test ip link set ha-0-0 up",
            "ip netns exec ha-test ip link set lo up",
            "ip netns exec ha-test ip route add default via 2.2.2.2",
        ]
    );
    assert_eq!(report.skipped().len(), 3);
    assert_eq!(report.tolerated(), vec!["Add default route via 2.2.2.2"]);

    assert_eq!(mock.namespaces_created().await, 1);
    assert_eq!(mock.addresses("ha-test", "ha-0-0").await, vec!["2.2.2.3/24"]);
}

#[tokio::test]
async fn test_force_add_recreates_namespace() {
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    reconciler.converge(false).await.unwrap();
    mock.clear_calls().await;
    let report = reconciler.converge(true).await.unwrap();

    let mutations = mock.mutations().await;
    assert_eq!(mutations[0], "ip netns del ha-test");
    assert_eq!(mutations[1], "ip netns add ha-test");
    assert_eq!(mock.namespaces_created().await, 2);

    // End state matches a non-forced converge
    assert!(report.skipped().is_empty());
    assert_eq!(mock.addresses("ha-test", "ha-0-0").await, vec!["2.2.2.3/24"]);
    assert_eq!(mock.default_route("ha-test").await, Some(Ipv4Addr::new(2, 2, 2, 2)));
}

#[tokio::test]
async fn test_force_add_on_clean_host_skips_delete() {
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    let report = reconciler.converge(true).await.unwrap();

    assert_eq!(report.skipped(), vec!["Delete namespace ha-test for force-add"]);
    assert_eq!(mock.namespaces_created().await, 1);
}

#[tokio::test]
async fn test_interface_missing_aborts_without_mutation() {
    let mock = MockRunner::new(SimulatedHost::new());
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    let err = reconciler.converge(false).await.unwrap_err();

    assert!(matches!(err, Error::InterfaceMissing { .. }));
    assert!(mock.mutations().await.is_empty());
    assert!(!mock.namespace_exists("ha-test").await);
}

#[tokio::test]
async fn test_existing_namespace_without_interface_aborts() {
    let mock = MockRunner::new(
        SimulatedHost::new()
            .with_root_interface("ha-0-0")
            .with_namespace("ha-test"),
    );
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    let err = reconciler.converge(false).await.unwrap_err();

    assert!(matches!(
        err,
        Error::InterfaceMissing { namespace: Some(ref ns), .. } if ns == "ha-test"
    ));
    assert!(mock.mutations().await.is_empty());
}

#[tokio::test]
async fn test_propagated_failure_stops_sequence() {
    // Namespace vanishes between create and move, so the move fails
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    let mut steps = reconciler.plan(false);
    steps.insert(
        1,
        Step::new(
            "Injected",
            "Delete namespace early",
            CommandSpec::new("ip", ["netns", "del", "ha-test"]),
        ),
    );
    let mut report = ConvergeReport::default();
    let result = reconciler.apply(&steps, &mut report).await;

    assert!(matches!(result, Err(Error::CommandFailed { .. })));
    assert_eq!(report.applied(), vec!["Create namespace ha-test", "Delete namespace early"]);
}

#[tokio::test]
async fn test_custom_target() {
    let mock = MockRunner::new(SimulatedHost::new().with_root_interface("veth-blue"));
    let target = TargetConfig::new("blue", "veth-blue", "10.0.0.5/16", "10.0.0.1").unwrap();
    let reconciler = Reconciler::new(executor(&mock), target);

    reconciler.converge(false).await.unwrap();

    assert_eq!(mock.addresses("blue", "veth-blue").await, vec!["10.0.0.5/16"]);
    assert_eq!(mock.default_route("blue").await, Some(Ipv4Addr::new(10, 0, 0, 1)));
}

#[tokio::test]
async fn test_observe_after_converge() {
    let mock = clean_host();
    let reconciler = Reconciler::new(executor(&mock), TargetConfig::default());

    assert!(!reconciler.inspector().observe().await.is_converged());
    reconciler.converge(false).await.unwrap();
    assert!(reconciler.inspector().observe().await.is_converged());
}

#[tokio::test]
async fn test_reachability_skipped_without_namespace() {
    let mock = clean_host();
    let diagnostics = Diagnostics::new(
        executor(&mock),
        TargetConfig::default(),
        DiagnosticsConfig::default(),
    );

    let report = diagnostics.test_reachability().await.unwrap();

    assert!(report.namespace_missing);
    assert!(report.results.is_empty());
    assert!(!mock.commands().await.iter().any(|c| c.contains("ping")));
}

#[tokio::test]
async fn test_reachability_probes_every_target() {
    init_tracing();
    let mock = MockRunner::new(
        SimulatedHost::new()
            .with_root_interface("ha-0-0")
            .with_unreachable("2.2.2.2")
            .with_unreachable("8.8.8.8"),
    );
    Reconciler::new(executor(&mock), TargetConfig::default())
        .converge(false)
        .await
        .unwrap();
    mock.clear_calls().await;

    let diagnostics = Diagnostics::new(
        executor(&mock),
        TargetConfig::default(),
        DiagnosticsConfig::default(),
    );
    let report = diagnostics.test_reachability().await.unwrap();

    let pings: Vec<String> = mock
        .commands()
        .await
        .into_iter()
        .filter(|c| c.contains("ping"))
        .collect();
    assert_eq!(
        pings,
        vec![
            "ip netns exec ha-test ping -c 4 2.2.2.2",
            "ip netns exec ha-test ping -c 4 2.2.2.2",
            "ip netns exec ha-test ping -c 4 8.8.8.8",
            "ip netns exec ha-test ping -c 4 192.168.7.1",
        ]
    );
    assert_eq!(report.results.len(), 4);
    assert_eq!(
        report.failed(),
        vec![
            Ipv4Addr::new(2, 2, 2, 2),
            Ipv4Addr::new(2, 2, 2, 2),
            Ipv4Addr::new(8, 8, 8, 8),
        ]
    );
    assert!(!report.all_reachable());
}
