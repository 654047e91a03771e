use super::{ArcKey, Graph, GraphElement, HyperArcKey, LabelSet, NodeKey};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Elements drawn emphasized, e.g. the location of a recognized option.
#[derive(Debug, Default)]
pub(crate) struct Highlight {
    pub nodes: HashSet<NodeKey>,
    pub arcs: HashSet<ArcKey>,
    pub hyperarcs: HashSet<HyperArcKey>,
}

fn label_text(name: &str, labels: &LabelSet) -> String {
    let labels = labels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let text = if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}|{labels}")
    };
    text.escape_debug().to_string()
}

pub(crate) fn render(g: &Graph, highlight: &Highlight) -> String {
    // node and edge weights are the finished DOT attribute lists
    let mut out = DiGraph::<String, String>::new();
    let mut node_idx: HashMap<NodeKey, NodeIndex> = HashMap::new();

    for (key, node) in g.nodes() {
        let color = if highlight.nodes.contains(&key) {
            "shape=Mrecord, color=\"blue\""
        } else {
            "shape=record"
        };
        let attrs = format!("{color}, label = \"{}\"", label_text(&node.name(), &node.labels));
        node_idx.insert(key, out.add_node(attrs));
    }

    for (key, arc) in g.arcs() {
        let mut endpoint = |end: Option<NodeKey>| match end.and_then(|n| node_idx.get(&n)) {
            Some(idx) => *idx,
            None => out.add_node("shape=point".to_string()),
        };
        let src = endpoint(arc.from());
        let dst = endpoint(arc.to());
        let dir = if arc.doubly_directed {
            "both"
        } else if arc.directed {
            "forward"
        } else {
            "none"
        };
        let color = if highlight.arcs.contains(&key) {
            ", color=\"blue\""
        } else {
            ""
        };
        let attrs = format!(
            "label = \"{}\", dir={dir}{color}",
            label_text(&arc.name(), &arc.labels)
        );
        out.add_edge(src, dst, attrs);
    }

    for (key, hyperarc) in g.hyperarcs() {
        let color = if highlight.hyperarcs.contains(&key) {
            ", color=\"blue\""
        } else {
            ""
        };
        let hub = out.add_node(format!(
            "shape=diamond{color}, label = \"{}\"",
            label_text(&hyperarc.name(), hyperarc.labels())
        ));
        for member in hyperarc.nodes() {
            if let Some(&idx) = node_idx.get(member) {
                out.add_edge(hub, idx, format!("style=dashed, dir=none{color}"));
            }
        }
    }

    format!(
        "{:?}",
        Dot::with_attr_getters(
            &out,
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, edge| edge.weight().clone(),
            &|_, (_, attrs)| attrs.clone(),
        )
    )
}

impl Graph {
    /// Graphviz DOT rendering, for debugging and for the example client.
    pub fn dot(&self) -> String {
        render(self, &Highlight::default())
    }
}

/// Concatenates several DOT renderings, e.g. the states of a candidate across a run.
pub struct DotCollector {
    dot: String,
}

impl Default for DotCollector {
    fn default() -> Self {
        DotCollector::new()
    }
}

impl DotCollector {
    pub fn new() -> Self {
        DotCollector { dot: String::new() }
    }

    pub fn collect(&mut self, graph: &Graph) {
        self.collect_raw(&graph.dot());
    }

    pub fn collect_raw(&mut self, dot: &str) {
        if !self.dot.is_empty() {
            self.dot.push_str("\n---\n");
        }
        self.dot.push_str(dot);
    }

    pub fn finalize(&self) -> String {
        self.dot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Arc, HyperArc, Node};

    #[test]
    fn renders_dangling_ends_and_hyperarcs() {
        let mut g = Graph::new();
        let a = g.add_node(Node::new("a").with_label("x")).unwrap();
        let b = g.add_node(Node::new("b")).unwrap();
        g.add_arc(Arc::between("ab", a, b)).unwrap();
        g.add_arc(Arc::dangling("loose", Some(a), None).undirected()).unwrap();
        g.add_hyperarc(HyperArc::new("h", [a, b])).unwrap();

        let dot = g.dot();
        assert!(dot.contains("a|x"));
        assert!(dot.contains("shape=point"));
        assert!(dot.contains("dir=none"));
        assert!(dot.contains("shape=diamond"));

        let mut collector = DotCollector::new();
        collector.collect(&g);
        collector.collect(&g);
        assert_eq!(collector.finalize().matches("\n---\n").count(), 1);
    }
}
