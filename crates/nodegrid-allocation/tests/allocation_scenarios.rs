//! End-to-end allocation scenarios.
//!
//! Drives the prioritizer the way the provisioning layer does: build a
//! pool snapshot, collect candidates from every source, prioritize, and
//! check the ordering contract holds.

use nodegrid_allocation::{AllocationRequest, NodeCandidate, NodePrioritizer};
use nodegrid_core::{
    Allocation, ApplicationId, ClusterMembership, ClusterSpec, ClusterType,
    ConfigResourcesCalculator, Node, NodePool, NodeSpec, NodeState, NodeType, ProvisionConfig,
    Resources, StaticAllocationPolicy,
};

const GB: u64 = 1024 * 1024 * 1024;

fn app() -> ApplicationId {
    ApplicationId::new("acme", "search")
}

fn host(hostname: &str, cpu: u32) -> Node {
    Node::new(
        hostname,
        NodeType::Host,
        NodeState::Active,
        Resources::new(cpu, 256 * GB, 2000 * GB),
    )
}

fn child(
    hostname: &str,
    parent: &str,
    owner: &ApplicationId,
    cluster: &str,
    state: NodeState,
    cpu: u32,
) -> Node {
    Node::new(
        hostname,
        NodeType::Tenant,
        state,
        Resources::new(cpu, 8 * GB, 50 * GB),
    )
    .with_parent(parent)
    .with_allocation(Allocation {
        owner: owner.clone(),
        membership: ClusterMembership {
            cluster: cluster.to_string(),
            cluster_type: ClusterType::Stateless,
            group: Some(0),
            retired: false,
        },
    })
}

fn count_request(count: u32, cpu: u32) -> AllocationRequest {
    AllocationRequest {
        application: app(),
        cluster: ClusterSpec::new("web", ClusterType::Stateless).with_group(0),
        spec: NodeSpec::count(count, Resources::new(cpu, 8 * GB, 50 * GB)),
        wanted_groups: 1,
        allocate_fully: false,
    }
}

fn config(spares: u32) -> ProvisionConfig {
    ProvisionConfig {
        spare_count: spares,
        ..ProvisionConfig::default()
    }
}

/// (name, is_new, violates_spares, exclusive_switch) fingerprint for
/// order comparisons.
fn fingerprint(candidates: &[NodeCandidate<'_>]) -> Vec<(String, bool, bool, bool)> {
    candidates
        .iter()
        .map(|c| {
            (
                c.name().to_string(),
                c.is_new(),
                c.violates_spares,
                c.exclusive_switch,
            )
        })
        .collect()
}

#[test]
fn prioritize_is_deterministic() {
    let config = config(1);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48).with_switch("switch1.dc1"),
        host("hostb.dc1", 48).with_switch("switch1.dc1"),
        host("hostc.dc1", 48).with_switch("switch2.dc1"),
        host("hostd.dc1", 48),
        child("node1.dc1", "hostb.dc1", &app(), "web", NodeState::Active, 4),
        Node::new(
            "node2.dc1",
            NodeType::Tenant,
            NodeState::Ready,
            Resources::new(2, 8 * GB, 50 * GB),
        )
        .with_parent("hostc.dc1"),
    ]);

    let run = || {
        let mut prioritizer =
            NodePrioritizer::new(&pool, count_request(4, 2), &policy, &calculator).unwrap();
        prioritizer.add_application_nodes();
        prioritizer.add_ready_nodes();
        prioritizer.add_new_child_nodes();
        prioritizer.prioritize()
    };

    let first = run();
    let second = run();
    assert!(!first.is_empty());
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn spare_hosts_are_protected_outside_replacement() {
    // hosta is empty, hostb is mostly used: hosta becomes the spare.
    let config = config(1);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let other = ApplicationId::new("globex", "crm");
    let pool = NodePool::new(vec![
        host("hosta.dc1", 8),
        host("hostb.dc1", 8),
        child("other1.dc1", "hostb.dc1", &other, "api", NodeState::Active, 4),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    assert!(ranked.iter().all(|c| !c.violates_spares));
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].parent_hostname(), Some("hostb.dc1"));
}

#[test]
fn replacement_may_use_spares_but_ranks_them_last() {
    let config = config(1);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 8),
        host("hostb.dc1", 8),
        host("hostc.dc1", 8),
        // 2 healthy + 1 failed node: a count of 2 is still fulfilled, so
        // allocating now means replacing the failure.
        child("node1.dc1", "hostb.dc1", &app(), "web", NodeState::Active, 2),
        child("node2.dc1", "hostb.dc1", &app(), "web", NodeState::Active, 2),
        child("node3.dc1", "hostb.dc1", &app(), "web", NodeState::Failed, 2),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    assert!(prioritizer.is_replacement());
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    // The spare (hosta, first of the emptiest hosts by name) is offered
    // now, after every non-violating candidate.
    assert!(ranked.iter().any(|c| c.violates_spares));
    assert!(ranked.iter().any(|c| !c.violates_spares));
    let first_violation = ranked.iter().position(|c| c.violates_spares).unwrap();
    assert!(ranked[..first_violation].iter().all(|c| !c.violates_spares));
    assert!(ranked[first_violation..].iter().all(|c| c.violates_spares));
    assert_eq!(
        ranked[first_violation].parent_hostname(),
        Some("hosta.dc1")
    );
}

#[test]
fn one_exclusive_candidate_per_concrete_switch() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48).with_switch("switch1.dc1"),
        host("hostb.dc1", 48).with_switch("switch1.dc1"),
        host("hostc.dc1", 48).with_switch("switch1.dc1"),
        host("hostd.dc1", 48).with_switch("switch2.dc1"),
        host("hoste.dc1", 48),
        host("hostf.dc1", 48),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(4, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();
    assert_eq!(ranked.len(), 6);

    let exclusive_on = |switch: &str| {
        ranked
            .iter()
            .filter(|c| c.switch_hostname() == Some(switch) && c.exclusive_switch)
            .count()
    };
    assert_eq!(exclusive_on("switch1.dc1"), 1);
    assert_eq!(exclusive_on("switch2.dc1"), 1);

    // Unknown topology is never collapsed into one failure domain.
    assert!(
        ranked
            .iter()
            .filter(|c| c.switch_hostname().is_none())
            .all(|c| c.exclusive_switch)
    );
}

#[test]
fn new_children_respect_host_capacity() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let other = ApplicationId::new("globex", "crm");
    let pool = NodePool::new(vec![
        host("hosta.dc1", 8),
        host("hostb.dc1", 8),
        child("other1.dc1", "hosta.dc1", &other, "api", NodeState::Active, 7),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(1, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].parent_hostname(), Some("hostb.dc1"));
}

#[test]
fn no_second_node_of_a_cluster_on_one_host() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48),
        host("hostb.dc1", 48),
        child("node1.dc1", "hosta.dc1", &app(), "web", NodeState::Active, 2),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    let proposed: Vec<_> = ranked
        .iter()
        .filter(|c| c.is_new())
        .filter_map(|c| c.parent_hostname())
        .collect();
    assert_eq!(proposed, vec!["hostb.dc1"]);
}

#[test]
fn ready_node_outranks_carving_a_new_one() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48),
        host("hostb.dc1", 48),
        Node::new(
            "ready1.dc1",
            NodeType::Tenant,
            NodeState::Ready,
            Resources::new(2, 8 * GB, 50 * GB),
        )
        .with_parent("hosta.dc1"),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    prioritizer.add_ready_nodes();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    assert!(ranked.len() >= 2);
    assert_eq!(ranked[0].name(), "ready1.dc1");
    assert!(!ranked[0].is_new());
}

#[test]
fn spare_and_capacity_shortfall_scenario() {
    // Pool: hosta 0 of 8 cores used, hostb 6 of 8 used; one spare.
    // hosta has more free capacity, so it is the spare.
    let config = config(1);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let other = ApplicationId::new("globex", "crm");
    let pool = NodePool::new(vec![
        host("hosta.dc1", 8),
        host("hostb.dc1", 8),
        child("other1.dc1", "hostb.dc1", &other, "api", NodeState::Active, 6),
    ]);

    // Non-replacement request for 2 nodes of 2 cores each.
    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    // hosta is rejected as spare; hostb fits exactly one child. One
    // candidate against a count of two is the caller's shortfall to
    // report.
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].parent_hostname(), Some("hostb.dc1"));
    assert!((ranked.len() as u32) < 2);
}

#[test]
fn surplus_nodes_come_back_flagged() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48),
        child("node1.dc1", "hosta.dc1", &app(), "web", NodeState::Reserved, 2),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(1, 2), &policy, &calculator).unwrap();
    let surplus = pool.get("node1.dc1").unwrap();
    prioritizer.add_surplus_nodes([surplus]);
    let ranked = prioritizer.prioritize();

    assert_eq!(ranked.len(), 1);
    assert!(ranked[0].is_surplus);
    assert!(!ranked[0].is_new());
}

#[test]
fn drained_parent_blocks_inactive_nodes_only() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let mut draining = host("hosta.dc1", 48);
    draining.state = NodeState::Failed;
    let pool = NodePool::new(vec![
        draining,
        host("hostb.dc1", 48),
        child("node1.dc1", "hosta.dc1", &app(), "web", NodeState::Inactive, 2),
        child("node2.dc1", "hostb.dc1", &app(), "web", NodeState::Inactive, 2),
        child("node3.dc1", "hosta.dc1", &app(), "web", NodeState::Active, 2),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(3, 2), &policy, &calculator).unwrap();
    prioritizer.add_application_nodes();
    let ranked = prioritizer.prioritize();

    let names: Vec<&str> = ranked.iter().map(|c| c.name()).collect();
    // Inactive node on the failed host is withheld; the active one on the
    // same host and the inactive one on the healthy host are offered.
    assert!(!names.contains(&"node1.dc1"));
    assert!(names.contains(&"node2.dc1"));
    assert!(names.contains(&"node3.dc1"));
}

#[test]
fn allocate_fully_restricts_carving_to_co_tenant_hosts() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48),
        host("hostb.dc1", 48),
        // The tenant already runs another cluster on hosta.
        child("feed1.dc1", "hosta.dc1", &app(), "feed", NodeState::Active, 2),
    ]);

    let mut request = count_request(2, 2);
    request.allocate_fully = true;
    let mut prioritizer = NodePrioritizer::new(&pool, request, &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].parent_hostname(), Some("hosta.dc1"));
}

#[test]
fn reserved_hosts_only_serve_their_tenant() {
    let config = config(0);
    let policy = StaticAllocationPolicy::new(&config);
    let calculator = ConfigResourcesCalculator::new(&config);
    let pool = NodePool::new(vec![
        host("hosta.dc1", 48).reserved_to("globex"),
        host("hostb.dc1", 48).reserved_to("acme"),
        host("hostc.dc1", 48),
    ]);

    let mut prioritizer =
        NodePrioritizer::new(&pool, count_request(2, 2), &policy, &calculator).unwrap();
    prioritizer.add_new_child_nodes();
    let ranked = prioritizer.prioritize();

    let proposed: Vec<_> = ranked.iter().filter_map(|c| c.parent_hostname()).collect();
    assert!(!proposed.contains(&"hosta.dc1"));
    assert!(proposed.contains(&"hostb.dc1"));
    assert!(proposed.contains(&"hostc.dc1"));
}
