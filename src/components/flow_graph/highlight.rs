use serde_json::Value;

use super::types::Node;

const BORDER: &str = "border";

fn is_settled(nodes: &[Node], target: &str, border: &str) -> bool {
	nodes.iter().all(|node| {
		if node.id == target {
			node.style_str(BORDER) == Some(border)
		} else {
			node.style.as_ref().is_none_or(|s| !s.contains_key(BORDER))
		}
	})
}

/// Gives `target` the highlight `border` and strips borders from every other
/// node. Returns `None` when the node set is already in that state, so
/// repeated calls settle instead of producing a fresh set each time.
pub fn apply_highlight(nodes: &[Node], target: &str, border: &str) -> Option<Vec<Node>> {
	if is_settled(nodes, target, border) {
		return None;
	}

	Some(
		nodes
			.iter()
			.map(|node| {
				let mut node = node.clone();
				if node.id == target {
					node.style
						.get_or_insert_with(Default::default)
						.insert(BORDER.into(), Value::String(border.into()));
				} else if let Some(style) = node.style.as_mut() {
					style.remove(BORDER);
				}
				node
			})
			.collect(),
	)
}
