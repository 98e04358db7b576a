use log::{debug, info};

use super::graph::{GraphModel, default_edges, default_nodes};
use super::highlight::apply_highlight;
use super::layout::layout;
use super::theme::Theme;
use super::types::{
	Connection, Dimensions, Direction, Edge, GraphConfig, Node, NodeKind, XYPosition,
};
use super::viewport::{FIT_PADDING, ViewTransform, node_bounds, viewport_for_bounds};

pub const HANDLE_RADIUS: f64 = 4.0;
pub const HANDLE_HIT_RADIUS: f64 = 10.0;
pub const NODE_MIN_WIDTH: f64 = 150.0;
pub const NODE_PADDING: f64 = 10.0;
pub const LINE_HEIGHT: f64 = 16.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	#[default]
	Initializing,
	Ready,
	TornDown,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: XYPosition,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
	Source,
	Target,
}

/// In-progress connect gesture.
#[derive(Clone, Debug, Default)]
pub struct ConnectState {
	pub origin: Option<(usize, HandleKind)>,
	/// Pointer position in graph coordinates.
	pub cursor: XYPosition,
}

/// Inputs the last layout was computed from.
#[derive(Clone, Debug, PartialEq)]
struct LayoutKey {
	nodes: Vec<(String, f64, f64)>,
	edges: Vec<(String, String)>,
	direction: Direction,
}

impl LayoutKey {
	fn new(nodes: &[Node], edges: &[Edge], direction: Direction) -> Self {
		Self {
			nodes: nodes
				.iter()
				.map(|n| {
					let (w, h) = n.size();
					(n.id.clone(), w, h)
				})
				.collect(),
			edges: edges
				.iter()
				.map(|e| (e.source.clone(), e.target.clone()))
				.collect(),
			direction,
		}
	}
}

/// Live state of one mounted flow canvas.
pub struct FlowState {
	pub graph: GraphModel,
	pub theme: Theme,
	pub direction: Direction,
	pub border_node_id: Option<String>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub connect: ConnectState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	phase: Phase,
	layout_key: Option<LayoutKey>,
}

impl FlowState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: GraphModel::default(),
			theme: Theme::default(),
			direction: Direction::default(),
			border_node_id: None,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			connect: ConnectState::default(),
			width,
			height,
			flow_time: 0.0,
			phase: Phase::Initializing,
			layout_key: None,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Seeds the graph from `config` (or the built-in graph) and lays it out.
	pub fn mount(&mut self, config: Option<&GraphConfig>) {
		if self.phase != Phase::Initializing {
			return;
		}
		let fallback = GraphConfig::default();
		self.apply_config(config.unwrap_or(&fallback));
		self.phase = Phase::Ready;
		info!(
			"Flow canvas mounted with {} nodes and {} edges",
			self.graph.nodes.len(),
			self.graph.edges.len()
		);
	}

	/// Merges a host payload into the live state. Nodes and edges are always
	/// taken from the payload, but layout only reruns when its inputs differ
	/// from the last payload; returns whether it did.
	pub fn apply_config(&mut self, config: &GraphConfig) -> bool {
		if self.phase == Phase::TornDown {
			debug!("Ignoring config for a torn down canvas");
			return false;
		}

		self.theme = Theme::resolve(config.theme.as_ref());
		self.direction = config.direction.unwrap_or_default();
		self.border_node_id = config.border_node_id.clone();

		let nodes = config.nodes.clone().unwrap_or_else(default_nodes);
		let edges = config.edges.clone().unwrap_or_else(default_edges);
		let key = LayoutKey::new(&nodes, &edges, self.direction);
		let replaced = if self.layout_key.as_ref() == Some(&key) {
			debug!("Layout inputs unchanged, keeping live positions");
			let nodes = self.carry_over_geometry(nodes);
			self.graph.replace(nodes, edges);
			false
		} else {
			let laid_out = layout(&nodes, &edges, self.direction);
			info!(
				"Laid out {} nodes ({:?})",
				laid_out.len(),
				self.direction
			);
			self.graph.replace(laid_out, edges);
			self.layout_key = Some(key);
			true
		};

		self.reconcile_highlight();
		replaced
	}

	/// Gives host nodes the position of the live node with the same id, and
	/// its measured size while the painted text is unchanged.
	fn carry_over_geometry(&self, nodes: Vec<Node>) -> Vec<Node> {
		nodes
			.into_iter()
			.map(|mut node| {
				let Some(live) = self.graph.node_index(&node.id).and_then(|idx| self.graph.nodes.get(idx)) else {
					return node;
				};
				node.position = live.position;
				if display_lines(&node) == display_lines(live) {
					node.measured = live.measured;
				}
				node
			})
			.collect()
	}

	/// Brings node borders in line with `border_node_id`; returns whether
	/// the node set changed.
	pub fn reconcile_highlight(&mut self) -> bool {
		let Some(target) = self.border_node_id.as_deref() else {
			return false;
		};
		let border = self.theme.highlight_border();
		match apply_highlight(&self.graph.nodes, target, &border) {
			Some(nodes) => {
				debug!("Highlighting node {}", target);
				self.graph.set_nodes(nodes);
				true
			}
			None => false,
		}
	}

	pub fn move_node(&mut self, idx: usize, position: XYPosition) {
		self.graph.set_position(idx, position);
	}

	pub fn connect(&mut self, connection: Connection) -> bool {
		if self.phase == Phase::TornDown {
			return false;
		}
		let added = self.graph.add_edge(connection);
		if added {
			self.reconcile_highlight();
		}
		added
	}

	/// Records rendered sizes of nodes painted for the first time.
	/// `text_width` returns the pixel width of a line of text.
	pub fn measure_nodes(&mut self, text_width: impl Fn(&str) -> f64) {
		for idx in 0..self.graph.nodes.len() {
			let node = &self.graph.nodes[idx];
			if node.is_measured() {
				continue;
			}
			let lines = display_lines(node);
			let widest = lines.iter().map(|l| text_width(l.as_str())).fold(0.0, f64::max);
			let dimensions = Dimensions {
				width: Some((widest + 2.0 * NODE_PADDING).max(NODE_MIN_WIDTH)),
				height: Some(lines.len().max(1) as f64 * LINE_HEIGHT + 2.0 * NODE_PADDING),
			};
			self.graph.set_measured(idx, dimensions);
		}
	}

	pub fn fit_view(&mut self) {
		if let Some(bounds) = node_bounds(&self.graph.nodes) {
			self.transform = viewport_for_bounds(bounds, self.width, self.height, FIT_PADDING);
		}
	}

	pub fn teardown(&mut self) {
		self.phase = Phase::TornDown;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.connect = ConnectState::default();
	}

	pub fn tick(&mut self, dt: f64) {
		if self.phase == Phase::Ready {
			self.flow_time += dt;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let point = self.transform.screen_to_graph(sx, sy);
		self.graph.nodes.iter().rposition(|n| n.contains(point))
	}

	pub fn handle_at_position(&self, sx: f64, sy: f64) -> Option<(usize, HandleKind)> {
		let point = self.transform.screen_to_graph(sx, sy);
		let near = |p: XYPosition| {
			let (dx, dy) = (p.x - point.x, p.y - point.y);
			(dx * dx + dy * dy).sqrt() < HANDLE_HIT_RADIUS
		};
		self.graph
			.nodes
			.iter()
			.enumerate()
			.rev()
			.find_map(|(idx, node)| {
				if node.kind.has_source_handle() && near(node.handle_point(node.source_side())) {
					Some((idx, HandleKind::Source))
				} else if node.kind.has_target_handle() && near(node.handle_point(node.target_side())) {
					Some((idx, HandleKind::Target))
				} else {
					None
				}
			})
	}

	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) {
		let Some(node) = self.graph.nodes.get(idx) else {
			return;
		};
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			node_start: node.position,
		};
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		if let (true, Some(idx)) = (self.drag.active, self.drag.node_idx) {
			let (dx, dy) = (
				(sx - self.drag.start_x) / self.transform.k,
				(sy - self.drag.start_y) / self.transform.k,
			);
			let start = self.drag.node_start;
			self.move_node(idx, XYPosition::new(start.x + dx, start.y + dy));
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn begin_connect(&mut self, idx: usize, handle: HandleKind, sx: f64, sy: f64) {
		self.connect = ConnectState {
			origin: Some((idx, handle)),
			cursor: self.transform.screen_to_graph(sx, sy),
		};
	}

	pub fn connect_to(&mut self, sx: f64, sy: f64) {
		if self.connect.origin.is_some() {
			self.connect.cursor = self.transform.screen_to_graph(sx, sy);
		}
	}

	/// Completes the connect gesture over the node under the pointer.
	/// Returns the connection that was added, if any.
	pub fn finish_connect(&mut self, sx: f64, sy: f64) -> Option<Connection> {
		let (origin, handle) = std::mem::take(&mut self.connect).origin?;
		let over = self
			.handle_at_position(sx, sy)
			.map(|(idx, _)| idx)
			.or_else(|| self.node_at_position(sx, sy))?;
		if over == origin {
			return None;
		}

		let (source, target) = match handle {
			HandleKind::Source => (origin, over),
			HandleKind::Target => (over, origin),
		};
		// the graph may have been replaced mid-gesture
		let (source, target) = (self.graph.nodes.get(source)?, self.graph.nodes.get(target)?);
		if !source.kind.has_source_handle() || !target.kind.has_target_handle() {
			debug!("No compatible handle between {} and {}", source.id, target.id);
			return None;
		}

		let connection = Connection {
			source: source.id.clone(),
			target: target.id.clone(),
		};
		self.connect(connection.clone()).then_some(connection)
	}

	pub fn end_gestures(&mut self) {
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.connect = ConnectState::default();
	}
}

/// Text lines painted inside a node.
pub fn display_lines(node: &Node) -> Vec<String> {
	let label = node.label().unwrap_or(&node.id).to_string();
	match node.kind {
		NodeKind::PositionLogger => vec![
			label,
			format!("{:.0}, {:.0}", node.position.x, node.position.y),
		],
		_ => vec![label],
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::types::EdgeKind;

	fn config(json: serde_json::Value) -> GraphConfig {
		serde_json::from_value(json).unwrap()
	}

	fn two_nodes() -> GraphConfig {
		config(serde_json::json!({
			"nodes": [
				{ "id": "a", "type": "input", "position": { "x": 0, "y": 0 }, "data": { "label": "A" } },
				{ "id": "b", "position": { "x": 0, "y": 0 }, "data": { "label": "B" } }
			],
			"edges": []
		}))
	}

	fn mounted(config: Option<&GraphConfig>) -> FlowState {
		let mut state = FlowState::new(800.0, 600.0);
		state.mount(config);
		state
	}

	fn bordered(state: &FlowState) -> Vec<&str> {
		state
			.graph
			.nodes
			.iter()
			.filter(|n| n.style_str("border").is_some())
			.map(|n| n.id.as_str())
			.collect()
	}

	#[test]
	fn mounts_default_graph() {
		let state = mounted(None);
		assert_eq!(state.phase(), Phase::Ready);
		assert_eq!(state.graph.nodes.len(), 1);
		assert_eq!(state.graph.nodes[0].id, "a");
		assert_eq!(state.graph.nodes[0].position, XYPosition::new(0.0, 0.0));
		assert_eq!(state.graph.edges.len(), 1);
		assert_eq!(state.graph.edges[0].kind, EdgeKind::Animated);
		assert!(state.graph.resolve_edge(&state.graph.edges[0]).is_none());
	}

	#[test]
	fn missing_edges_fall_back_per_field() {
		let state = mounted(Some(&config(serde_json::json!({
			"nodes": [{ "id": "z", "position": { "x": 5, "y": 5 }, "data": {} }]
		}))));
		assert_eq!(state.graph.nodes[0].id, "z");
		assert_eq!(state.graph.edges[0].id, "a->c");
	}

	#[test]
	fn unchanged_inputs_keep_manual_positions() {
		let payload = two_nodes();
		let mut state = mounted(Some(&payload));
		state.move_node(1, XYPosition::new(400.0, 300.0));

		assert!(!state.apply_config(&payload));
		assert_eq!(state.graph.nodes[1].position, XYPosition::new(400.0, 300.0));
	}

	#[test]
	fn restyled_payload_lands_without_relayout() {
		let mut state = mounted(Some(&config(serde_json::json!({
			"nodes": [
				{ "id": "a", "position": { "x": 0, "y": 0 }, "data": { "label": "Old" }, "style": { "background": "#fff" } },
				{ "id": "b", "type": "default", "position": { "x": 0, "y": 0 }, "data": { "label": "B" } }
			],
			"edges": [{ "id": "ab", "source": "a", "target": "b", "type": "default" }]
		}))));
		state.measure_nodes(|text| text.len() as f64 * 7.0);
		state.move_node(0, XYPosition::new(-40.0, 10.0));
		let measured_b = state.graph.nodes[1].measured;

		let restyled = config(serde_json::json!({
			"nodes": [
				{ "id": "a", "position": { "x": 0, "y": 0 }, "data": { "label": "New" }, "style": { "background": "#000" } },
				{ "id": "b", "type": "output", "position": { "x": 0, "y": 0 }, "data": { "label": "B" } }
			],
			"edges": [{ "id": "ab2", "source": "a", "target": "b", "type": "animatedSvg", "animated": true }]
		}));
		assert!(!state.apply_config(&restyled));

		let (a, b) = (&state.graph.nodes[0], &state.graph.nodes[1]);
		assert_eq!(a.label(), Some("New"));
		assert_eq!(a.style_str("background"), Some("#000"));
		assert_eq!(a.position, XYPosition::new(-40.0, 10.0));
		assert!(!a.is_measured());
		assert_eq!(b.kind, NodeKind::Output);
		assert_eq!(b.measured, measured_b);
		let edge = &state.graph.edges[0];
		assert_eq!((edge.id.as_str(), edge.kind, edge.animated), ("ab2", EdgeKind::Animated, true));
	}

	#[test]
	fn resent_payload_leaves_viewport_alone() {
		let payload = two_nodes();
		let mut state = mounted(Some(&payload));
		state.fit_view();
		state.transform.zoom_at(100.0, 100.0, 1.1);
		let panned = state.transform;

		assert!(!state.apply_config(&payload));
		assert!(!state.apply_config(&payload));
		assert_eq!(state.transform, panned);
	}

	#[test]
	fn changed_inputs_relayout() {
		let mut state = mounted(Some(&two_nodes()));
		state.move_node(1, XYPosition::new(400.0, 300.0));

		let mut next = two_nodes();
		next.edges = Some(vec![Edge::new("ab", "a", "b")]);
		assert!(state.apply_config(&next));
		assert_eq!(state.graph.nodes[0].position, XYPosition::new(0.0, 0.0));
		assert_eq!(state.graph.nodes[1].position, XYPosition::new(0.0, 100.0));
		assert_eq!(state.graph.edges.len(), 1);
	}

	#[test]
	fn highlight_converges_to_one_border() {
		let mut payload = two_nodes();
		payload.border_node_id = Some("b".into());
		let mut state = mounted(Some(&payload));
		assert_eq!(bordered(&state), ["b"]);
		assert_eq!(state.graph.nodes[1].style_str("border"), Some("2px solid #ff4b4b"));

		let snapshot = state.graph.nodes.clone();
		assert!(!state.reconcile_highlight());
		assert_eq!(state.graph.nodes, snapshot);

		payload.border_node_id = Some("a".into());
		state.apply_config(&payload);
		assert_eq!(bordered(&state), ["a"]);
	}

	#[test]
	fn theme_change_recolours_highlight() {
		let mut payload = two_nodes();
		payload.border_node_id = Some("a".into());
		let mut state = mounted(Some(&payload));

		payload.theme = Some(serde_json::from_value(serde_json::json!({ "primaryColor": "#0068c9" })).unwrap());
		assert!(!state.apply_config(&payload));
		assert_eq!(state.graph.nodes[0].style_str("border"), Some("2px solid #0068c9"));
	}

	#[test]
	fn connect_gesture_appends_edge() {
		let mut state = mounted(Some(&two_nodes()));
		let a = state.graph.nodes[0].handle_point(state.graph.nodes[0].source_side());
		let b = state.graph.nodes[1].position;

		let (idx, handle) = state.handle_at_position(a.x, a.y).unwrap();
		assert_eq!((idx, handle), (0, HandleKind::Source));
		state.begin_connect(idx, handle, a.x, a.y);
		state.connect_to(b.x + 30.0, b.y + 25.0);
		let connection = state.finish_connect(b.x + 30.0, b.y + 25.0).unwrap();

		assert_eq!(connection.source, "a");
		assert_eq!(connection.target, "b");
		assert_eq!(state.graph.edges.len(), 1);
		assert_eq!(state.graph.edges[0].source, "a");
		assert_eq!(state.graph.edges[0].target, "b");
		assert!(state.connect.origin.is_none());
	}

	#[test]
	fn connect_into_input_node_is_rejected() {
		let mut state = mounted(Some(&two_nodes()));
		let b = &state.graph.nodes[1];
		let handle = b.handle_point(b.source_side());
		let a = state.graph.nodes[0].position;

		state.begin_connect(1, HandleKind::Source, handle.x, handle.y);
		assert!(state.finish_connect(a.x + 30.0, a.y + 20.0).is_none());
		assert!(state.graph.edges.is_empty());
	}

	#[test]
	fn drag_moves_without_relayout() {
		let mut state = mounted(Some(&two_nodes()));
		let start = state.graph.nodes[1].position;
		state.begin_drag(1, 10.0, 10.0);
		state.drag_to(40.0, 60.0);
		assert_eq!(state.graph.nodes[1].position, XYPosition::new(start.x + 30.0, start.y + 50.0));
		assert_eq!(state.graph.nodes[0].position, XYPosition::new(0.0, 0.0));
	}

	#[test]
	fn measuring_keeps_positions() {
		let mut state = mounted(Some(&two_nodes()));
		let before: Vec<XYPosition> = state.graph.nodes.iter().map(|n| n.position).collect();
		state.measure_nodes(|text| text.len() as f64 * 7.0);

		assert!(state.graph.nodes.iter().all(Node::is_measured));
		assert_eq!(state.graph.nodes[0].size(), (NODE_MIN_WIDTH, LINE_HEIGHT + 2.0 * NODE_PADDING));
		let after: Vec<XYPosition> = state.graph.nodes.iter().map(|n| n.position).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn torn_down_state_ignores_updates() {
		let mut state = mounted(None);
		state.teardown();
		assert_eq!(state.phase(), Phase::TornDown);
		assert!(!state.apply_config(&two_nodes()));
		assert_eq!(state.graph.nodes[0].id, "a");
		assert!(!state.connect(Connection {
			source: "a".into(),
			target: "a".into(),
		}));
	}

	#[test]
	fn fit_view_frames_nodes() {
		let mut state = mounted(Some(&two_nodes()));
		state.fit_view();
		let k = state.transform.k;
		assert!(k >= 0.5 && k <= 2.0);
		let bounds = node_bounds(&state.graph.nodes).unwrap();
		let center = state.transform.screen_to_graph(400.0, 300.0);
		assert!((center.x - (bounds.x + bounds.width / 2.0)).abs() < 1e-9);
		assert!((center.y - (bounds.y + bounds.height / 2.0)).abs() < 1e-9);
	}
}
