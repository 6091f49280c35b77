//! Critical path calculation using forward and backward passes.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::calendar::day_number;
use crate::config::EngineConfig;
use crate::models::{Activity, AnchorPoint, Dependency, Project};
use crate::offsets::target_anchor;
use crate::{log_checks, log_debug};

use super::types::{arrow_key, ActivityTiming, CriticalPathResult};

/// Integer node id within one analysis.
type NodeId = usize;

/// The connected subgraph: every activity on either side of at least one usable edge.
///
/// An edge is usable when both endpoints exist and have parseable start and end dates,
/// and its offset lands on a representable date. The last rule keeps every day-number
/// sum in the passes bounded.
struct ConnectedGraph<'a> {
    nodes: Vec<&'a Activity>,
    /// Incoming edges per node: (predecessor, dependency).
    preds: Vec<Vec<(NodeId, &'a Dependency)>>,
    /// Outgoing edges per node: (dependent, dependency).
    succs: Vec<Vec<(NodeId, &'a Dependency)>>,
    start: Vec<i64>,
    duration: Vec<i64>,
}

impl<'a> ConnectedGraph<'a> {
    fn build(project: &'a Project, verbosity: u8) -> Self {
        // Activities with usable dates, first occurrence per id.
        let mut dated: FxHashMap<&'a str, (&'a Activity, i64, i64)> = FxHashMap::default();
        for act in project.activities() {
            match (act.start(), act.end()) {
                (Some(start), Some(end)) => {
                    dated
                        .entry(act.id.as_str())
                        .or_insert((act, day_number(start), day_number(end)));
                }
                _ => {
                    log_checks!(verbosity, "critical path: {} has unparseable dates", act.id);
                }
            }
        }

        let mut graph = ConnectedGraph {
            nodes: Vec::new(),
            preds: Vec::new(),
            succs: Vec::new(),
            start: Vec::new(),
            duration: Vec::new(),
        };
        let mut node_of: FxHashMap<&'a str, NodeId> = FxHashMap::default();

        for act in project.activities() {
            if !dated.contains_key(act.id.as_str()) {
                continue;
            }
            for dep in act.dependencies() {
                let Some(&(pred, _, _)) = dated.get(dep.predecessor_id.as_str()) else {
                    continue;
                };
                if target_anchor(pred, dep).is_none() {
                    log_checks!(
                        verbosity,
                        "critical path: skipping {}->{} (offset {} out of range)",
                        dep.predecessor_id,
                        act.id,
                        dep.offset_days
                    );
                    continue;
                }
                let u = graph.node(&mut node_of, &dated, dep.predecessor_id.as_str());
                let v = graph.node(&mut node_of, &dated, act.id.as_str());
                graph.preds[v].push((u, dep));
                graph.succs[u].push((v, dep));
            }
        }
        graph
    }

    fn node(
        &mut self,
        node_of: &mut FxHashMap<&'a str, NodeId>,
        dated: &FxHashMap<&'a str, (&'a Activity, i64, i64)>,
        id: &'a str,
    ) -> NodeId {
        if let Some(&n) = node_of.get(id) {
            return n;
        }
        let (act, start, end) = dated[id];
        let n = self.nodes.len();
        self.nodes.push(act);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        self.start.push(start);
        self.duration.push(end - start);
        node_of.insert(id, n);
        n
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn id(&self, n: NodeId) -> &'a str {
        self.nodes[n].id.as_str()
    }
}

/// Kahn's algorithm over in-degrees counted inside the connected set.
///
/// Nodes on a cycle never reach in-degree zero and are left out of the order.
fn topological_order(graph: &ConnectedGraph<'_>) -> Vec<NodeId> {
    let n = graph.len();
    let mut in_degree: Vec<usize> = graph.preds.iter().map(Vec::len).collect();

    let mut queue: VecDeque<NodeId> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    let mut order: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &(v, _) in &graph.succs[u] {
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push_back(v);
            }
        }
    }
    order
}

/// Compute the critical activities and arrows of the whole project.
///
/// Only activities taking part in at least one dependency are analysed; isolated
/// activities are never critical.
///
/// Forward pass: early start defaults to the activity's own start and is pushed by each
/// predecessor edge whose `to_point` is `Start` (edges constraining the dependent's end do
/// not push early start). Backward pass: late finish starts at the latest early finish
/// and is pulled in by each dependent edge, translated back through this activity's
/// duration when the edge leaves from its start. An activity is critical when
/// `|late_start - early_start|` is within `config.critical_float_tolerance_days`; an arrow
/// is critical when both endpoints are.
pub fn compute_critical_path(project: &Project, config: &EngineConfig) -> CriticalPathResult {
    let verbosity = config.verbosity;
    let graph = ConnectedGraph::build(project, verbosity);
    if graph.len() == 0 {
        return CriticalPathResult::default();
    }

    let order = topological_order(&graph);
    if order.len() != graph.len() {
        log_checks!(
            verbosity,
            "critical path: {} activities sit on a dependency cycle and are skipped",
            graph.len() - order.len()
        );
    }
    let mut ordered = vec![false; graph.len()];
    for &v in &order {
        ordered[v] = true;
    }

    // Forward pass
    let mut es: Vec<i64> = graph.start.clone();
    let mut ef: Vec<i64> = vec![0; graph.len()];
    for &v in &order {
        for &(u, dep) in &graph.preds[v] {
            if !ordered[u] || dep.to_point != AnchorPoint::Start {
                continue;
            }
            let anchor = match dep.from_point {
                AnchorPoint::Start => es[u],
                AnchorPoint::End => ef[u],
            };
            es[v] = es[v].max(anchor + dep.offset_days);
        }
        ef[v] = es[v] + graph.duration[v];
    }

    let max_ef = order.iter().map(|&v| ef[v]).max().unwrap_or(0);
    let min_es = order.iter().map(|&v| es[v]).min().unwrap_or(max_ef);

    // Backward pass
    let mut lf: Vec<i64> = vec![max_ef; graph.len()];
    let mut ls: Vec<i64> = graph.duration.iter().map(|d| max_ef - d).collect();
    for &v in order.iter().rev() {
        for &(w, dep) in &graph.succs[v] {
            if !ordered[w] {
                continue;
            }
            let dependent_anchor = match dep.to_point {
                AnchorPoint::Start => ls[w],
                AnchorPoint::End => lf[w],
            };
            let required = dependent_anchor - dep.offset_days;
            let finish = match dep.from_point {
                AnchorPoint::End => required,
                AnchorPoint::Start => required + graph.duration[v],
            };
            lf[v] = lf[v].min(finish);
        }
        ls[v] = lf[v] - graph.duration[v];
    }

    let mut result = CriticalPathResult {
        critical_path_length: max_ef - min_es,
        ..Default::default()
    };

    for &v in &order {
        let timing = ActivityTiming {
            earliest_start: es[v],
            earliest_finish: ef[v],
            latest_start: ls[v],
            latest_finish: lf[v],
            slack: ls[v] - es[v],
        };
        log_debug!(
            verbosity,
            "critical path: {} es={} ef={} ls={} lf={} slack={}",
            graph.id(v),
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.slack
        );
        if timing.is_critical(config.critical_float_tolerance_days) {
            result.critical_activity_ids.insert(graph.id(v).to_string());
        }
        result.timings.insert(graph.id(v).to_string(), timing);
    }

    for &v in &order {
        for &(u, _) in &graph.preds[v] {
            let (pred, dependent) = (graph.id(u), graph.id(v));
            if result.critical_activity_ids.contains(pred)
                && result.critical_activity_ids.contains(dependent)
            {
                result.critical_arrows.insert(arrow_key(pred, dependent));
            }
        }
    }

    result
}
