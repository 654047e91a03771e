use super::{ApplyError, ApplyReport, ApplyResult};
use crate::diagnostics::Diagnostic;
use crate::graph::{ArcEnd, ArcKey, Graph, LabelSet, NodeKey};
use crate::rule::{ArcDirection, EmbeddingRule, GrammarRule};
use crate::util::log;
use error_stack::ResultExt;
use std::collections::HashMap;

/// An arc end left dangling by deleting the host image of an L node.
#[derive(Debug, Clone, Copy)]
pub(super) struct FreeEnd {
    pub arc: ArcKey,
    pub end: ArcEnd,
    pub l_node: NodeKey,
}

/// The new `(from, to)` of a free arc attached to `target` by `embedding`.
///
/// With a surviving `other` end the arc may be turned around to honour `new_direction`. When
/// both ends were freed only the freed slot is written; the other end is resolved on its own.
fn reattached_ends(
    embedding: &EmbeddingRule,
    current: (Option<NodeKey>, Option<NodeKey>),
    free_end: ArcEnd,
    other_freed: bool,
    target: NodeKey,
) -> (Option<NodeKey>, Option<NodeKey>) {
    if other_freed {
        return match free_end {
            ArcEnd::From => (Some(target), current.1),
            ArcEnd::To => (current.0, Some(target)),
        };
    }
    let other = match free_end {
        ArcEnd::From => current.1,
        ArcEnd::To => current.0,
    };
    turned_toward(embedding, free_end, other, target)
}

fn turned_toward(
    embedding: &EmbeddingRule,
    free_end: ArcEnd,
    other: Option<NodeKey>,
    target: NodeKey,
) -> (Option<NodeKey>, Option<NodeKey>) {
    match (embedding.new_direction, free_end) {
        (ArcDirection::Into, _) | (ArcDirection::Any, ArcEnd::To) => (other, Some(target)),
        (ArcDirection::OutOf, _) | (ArcDirection::Any, ArcEnd::From) => (Some(target), other),
    }
}

/// Runs the rule's embedding rules over every free end, in order.
pub(super) fn reattach(
    host: &mut Graph,
    rule: &GrammarRule,
    free_ends: &[FreeEnd],
    r_to_host: &HashMap<NodeKey, NodeKey>,
    report: &mut ApplyReport,
) -> ApplyResult<()> {
    let mut free_count: HashMap<ArcKey, usize> = HashMap::new();
    for free in free_ends {
        *free_count.entry(free.arc).or_default() += 1;
    }

    for free in free_ends {
        let Some(original) = host.arc(free.arc).cloned() else {
            continue;
        };
        // both ends lost their node: neither end is a neighbour of the other
        let other_freed = free_count.get(&free.arc).is_some_and(|&n| n > 1);
        let other = if other_freed {
            None
        } else {
            original.end(free.end.opposite())
        };
        let neighbor_labels: Option<LabelSet> =
            other.and_then(|n| host.node(n)).map(|n| n.labels.clone());
        let deleted_name = rule.l().node(free.l_node).map(|n| n.name());

        let mut attached = false;
        for embedding in rule.embedding_rules() {
            if embedding.l_node_name.is_some() && embedding.l_node_name != deleted_name {
                continue;
            }
            if !embedding.admits(
                &original.labels,
                neighbor_labels.as_ref(),
                ArcDirection::at_end(free.end),
                original.is_oriented(),
            ) {
                continue;
            }
            let Some(target) = rule
                .r()
                .node_by_name(&embedding.r_node_name)
                .and_then(|r| r_to_host.get(&r).copied())
            else {
                continue;
            };

            let (from, to) = reattached_ends(
                embedding,
                (original.from, original.to),
                free.end,
                other_freed,
                target,
            );
            let directed = original.directed || embedding.new_direction != ArcDirection::Any;
            if !attached {
                host.set_arc_end(free.arc, ArcEnd::From, from)
                    .change_context(ApplyError::Graph)?;
                host.set_arc_end(free.arc, ArcEnd::To, to)
                    .change_context(ApplyError::Graph)?;
                if let Some(arc) = host.arc_mut(free.arc) {
                    arc.directed = directed;
                }
                attached = true;
            } else {
                let mut duplicate = original.clone();
                duplicate.from = from;
                duplicate.to = to;
                duplicate.directed = directed;
                let key = host
                    .add_arc_unique(duplicate)
                    .change_context(ApplyError::Graph)?;
                report.added_arcs.push(key);
            }
            // a copy of a doubly freed arc would keep a dangling end nobody resolves
            if !embedding.allow_arc_duplication || other_freed {
                break;
            }
        }

        if !attached {
            log::warn!(
                "rule `{}` left the {:?} end of arc `{}` dangling",
                rule.name(),
                free.end,
                original.name()
            );
            report.diagnostics.push(Diagnostic::DanglingReattachmentFailure {
                arc: free.arc,
                name: original.name(),
                end: free.end,
            });
        }
    }
    Ok(())
}
