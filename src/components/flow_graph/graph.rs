use log::debug;

use super::types::{Connection, Dimensions, Edge, EdgeKind, Node, NodeKind, XYPosition};

/// Graph shown when the host does not provide nodes.
pub fn default_nodes() -> Vec<Node> {
	vec![Node::new("a", NodeKind::Input, "Start")]
}

/// Edges shown when the host does not provide edges. The target is not among
/// the default nodes, so the renderer skips it.
pub fn default_edges() -> Vec<Edge> {
	vec![Edge {
		kind: EdgeKind::Animated,
		animated: true,
		..Edge::new("a->c", "a", "c")
	}]
}

/// Ordered node and edge sets of one mounted widget.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

impl GraphModel {
	#[cfg(test)]
	pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		Self { nodes, edges }
	}

	pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
		self.nodes = nodes;
		self.edges = edges;
	}

	pub fn set_nodes(&mut self, nodes: Vec<Node>) {
		self.nodes = nodes;
	}

	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.id == id)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn set_position(&mut self, idx: usize, position: XYPosition) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.position = position;
		}
	}

	pub fn set_measured(&mut self, idx: usize, dimensions: Dimensions) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.measured = Some(dimensions);
		}
	}

	/// Both endpoints of `edge`, or `None` when either id is unknown.
	pub fn resolve_edge(&self, edge: &Edge) -> Option<(&Node, &Node)> {
		Some((self.node(&edge.source)?, self.node(&edge.target)?))
	}

	/// Appends an edge for `connection`. A connection whose source and target
	/// already have an edge is ignored.
	pub fn add_edge(&mut self, connection: Connection) -> bool {
		let exists = self
			.edges
			.iter()
			.any(|e| e.source == connection.source && e.target == connection.target);
		if exists {
			debug!(
				"Ignoring duplicate connection {} -> {}",
				connection.source, connection.target
			);
			return false;
		}
		let id = format!("xy-edge__{}-{}", connection.source, connection.target);
		self.edges
			.push(Edge::new(id, connection.source, connection.target));
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model() -> GraphModel {
		GraphModel::new(
			vec![
				Node::new("a", NodeKind::Input, "A"),
				Node::new("b", NodeKind::Default, "B"),
			],
			vec![Edge::new("x", "b", "a")],
		)
	}

	#[test]
	fn connect_appends_one_edge() {
		let mut graph = model();
		let before = graph.edges.clone();
		assert!(graph.add_edge(Connection {
			source: "a".into(),
			target: "b".into(),
		}));

		assert_eq!(graph.edges.len(), before.len() + 1);
		assert_eq!(&graph.edges[..before.len()], &before[..]);
		let added = graph.edges.last().unwrap();
		assert_eq!(added.source, "a");
		assert_eq!(added.target, "b");
		assert_eq!(added.id, "xy-edge__a-b");
		assert_eq!(added.kind, EdgeKind::Default);
		assert!(!added.animated);
	}

	#[test]
	fn duplicate_connection_is_ignored() {
		let mut graph = model();
		let connection = Connection {
			source: "b".into(),
			target: "a".into(),
		};
		assert!(!graph.add_edge(connection));
		assert_eq!(graph.edges.len(), 1);
	}

	#[test]
	fn default_graph_has_dangling_edge() {
		let graph = GraphModel::new(default_nodes(), default_edges());
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].id, "a");
		assert_eq!(graph.nodes[0].kind, NodeKind::Input);
		assert_eq!(graph.nodes[0].label(), Some("Start"));

		assert_eq!(graph.edges.len(), 1);
		let edge = &graph.edges[0];
		assert_eq!((edge.source.as_str(), edge.target.as_str()), ("a", "c"));
		assert!(edge.animated);
		assert!(graph.resolve_edge(edge).is_none());
	}

	#[test]
	fn point_updates_ignore_out_of_range() {
		let mut graph = model();
		graph.set_position(7, XYPosition::new(1.0, 1.0));
		graph.set_position(1, XYPosition::new(3.0, 4.0));
		assert_eq!(graph.nodes[1].position, XYPosition::new(3.0, 4.0));
		assert_eq!(graph.nodes[0].position, XYPosition::default());
	}
}
