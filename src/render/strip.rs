//! Text stripper: applies a [`StripPlan`] to the document tree.

use serde::{Deserialize, Serialize};

use crate::model::{declarations, Element, Node, SvgDocument};
use crate::parser::StripPlan;

/// Counters from one stripping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripStats {
    /// Text elements removed
    pub text_removed: usize,
    /// Groups removed because they became empty
    pub groups_pruned: usize,
}

/// Remove the planned text elements and the groups they leave empty.
///
/// Paths are processed in reverse document order, so removing a node
/// never shifts the path of one still to be processed. A group is pruned
/// only when removal left it empty, no `href`/`url()` names its id and it
/// carries no `filter`, `mask` or `clip-path`. The root is never removed.
pub fn strip_text(doc: &mut SvgDocument, plan: &StripPlan) -> StripStats {
    let mut stats = StripStats::default();

    for path in plan.text_nodes.iter().rev() {
        let Some((&index, parent_path)) = path.split_last() else {
            continue;
        };
        let Some(parent) = doc.element_at_mut(parent_path) else {
            log::warn!("Strip path {:?} no longer resolves", path);
            continue;
        };
        let is_text = matches!(
            parent.children.get(index),
            Some(Node::Element(el)) if is_text_element(el)
        );
        if !is_text {
            log::warn!("Strip path {:?} does not name a text element", path);
            continue;
        }
        parent.children.remove(index);
        stats.text_removed += 1;
        stats.groups_pruned += prune_empty_ancestors(doc, parent_path, plan);
    }

    log::debug!(
        "Removed {} text elements, pruned {} groups",
        stats.text_removed,
        stats.groups_pruned
    );
    stats
}

fn is_text_element(element: &Element) -> bool {
    matches!(element.svg_name(), Some("text" | "flowRoot"))
}

/// Properties that can still paint or affect layout on an empty group.
const RENDERING_PROPERTIES: &[&str] = &["filter", "mask", "clip-path"];

fn is_prunable(element: &Element, plan: &StripPlan) -> bool {
    matches!(element.svg_name(), Some("g" | "a"))
        && element.is_effectively_empty()
        && element.attr("id").map_or(true, |id| !plan.is_referenced(id))
        && !has_rendering_properties(element)
}

fn has_rendering_properties(element: &Element) -> bool {
    declarations(element)
        .iter()
        .any(|(name, value)| RENDERING_PROPERTIES.contains(&name.as_str()) && value != "none")
}

fn prune_empty_ancestors(doc: &mut SvgDocument, path: &[usize], plan: &StripPlan) -> usize {
    let mut pruned = 0;
    let mut path = path;
    while let Some((&index, parent_path)) = path.split_last() {
        let Some(parent) = doc.element_at_mut(parent_path) else {
            break;
        };
        let prunable = match parent.children.get(index) {
            Some(Node::Element(el)) => is_prunable(el, plan),
            _ => false,
        };
        if !prunable {
            break;
        }
        parent.children.remove(index);
        pruned += 1;
        path = parent_path;
    }
    pruned
}
