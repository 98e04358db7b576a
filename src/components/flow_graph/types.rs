use serde::Deserialize;
use serde_json::{Map, Value};

use super::theme::ThemeConfig;

/// Size assumed for a node that the renderer has not measured yet.
pub const DEFAULT_NODE_WIDTH: f64 = 100.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 50.0;

/// Free-form style overrides, keyed by CSS-like property name.
pub type NodeStyle = Map<String, Value>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct XYPosition {
	pub x: f64,
	pub y: f64,
}

impl XYPosition {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Width/height reported by the renderer. Either axis may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Dimensions {
	#[serde(default)]
	pub width: Option<f64>,
	#[serde(default)]
	pub height: Option<f64>,
}

/// Side of a node a handle sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
	Top,
	Right,
	Bottom,
	Left,
}

impl Position {
	/// Unit vector pointing away from the node on this side.
	pub fn direction(self) -> (f64, f64) {
		match self {
			Position::Top => (0.0, -1.0),
			Position::Right => (1.0, 0.0),
			Position::Bottom => (0.0, 1.0),
			Position::Left => (-1.0, 0.0),
		}
	}

	pub fn is_horizontal(self) -> bool {
		matches!(self, Position::Left | Position::Right)
	}
}

/// Node renderer variants. Unknown tags fall back to [`NodeKind::Default`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NodeKind {
	#[default]
	Default,
	Input,
	Output,
	PositionLogger,
}

impl From<String> for NodeKind {
	fn from(tag: String) -> Self {
		match tag.as_str() {
			"input" => NodeKind::Input,
			"output" => NodeKind::Output,
			"position-logger" => NodeKind::PositionLogger,
			_ => NodeKind::Default,
		}
	}
}

impl NodeKind {
	pub fn has_source_handle(self) -> bool {
		!matches!(self, NodeKind::Output)
	}

	pub fn has_target_handle(self) -> bool {
		!matches!(self, NodeKind::Input)
	}
}

/// Edge renderer variants. Unknown tags fall back to [`EdgeKind::Default`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EdgeKind {
	/// Bezier curve.
	#[default]
	Default,
	Straight,
	SmoothStep,
	/// Smooth-step path with a marker travelling along it.
	Animated,
}

impl From<String> for EdgeKind {
	fn from(tag: String) -> Self {
		match tag.as_str() {
			"straight" => EdgeKind::Straight,
			"smoothstep" => EdgeKind::SmoothStep,
			"animatedSvg" | "animated" => EdgeKind::Animated,
			_ => EdgeKind::Default,
		}
	}
}

/// Flow direction of the hierarchical layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum Direction {
	#[default]
	TB,
	BT,
	LR,
	RL,
}

impl Direction {
	pub fn is_horizontal(self) -> bool {
		matches!(self, Direction::LR | Direction::RL)
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	pub id: String,
	#[serde(rename = "type", default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub position: XYPosition,
	#[serde(default)]
	pub data: Value,
	#[serde(default)]
	pub measured: Option<Dimensions>,
	#[serde(default)]
	pub style: Option<NodeStyle>,
	#[serde(default)]
	pub source_position: Option<Position>,
	#[serde(default)]
	pub target_position: Option<Position>,
}

impl Node {
	pub fn new(id: impl Into<String>, kind: NodeKind, label: &str) -> Self {
		Self {
			id: id.into(),
			kind,
			position: XYPosition::default(),
			data: serde_json::json!({ "label": label }),
			measured: None,
			style: None,
			source_position: None,
			target_position: None,
		}
	}

	pub fn label(&self) -> Option<&str> {
		self.data.get("label").and_then(Value::as_str)
	}

	/// Measured size per axis, falling back to the 100x50 default.
	pub fn size(&self) -> (f64, f64) {
		let measured = self.measured.unwrap_or_default();
		(
			measured.width.unwrap_or(DEFAULT_NODE_WIDTH),
			measured.height.unwrap_or(DEFAULT_NODE_HEIGHT),
		)
	}

	pub fn is_measured(&self) -> bool {
		self.measured
			.is_some_and(|m| m.width.is_some() && m.height.is_some())
	}

	pub fn style_str(&self, key: &str) -> Option<&str> {
		self.style.as_ref()?.get(key)?.as_str()
	}

	pub fn source_side(&self) -> Position {
		self.source_position.unwrap_or(Position::Bottom)
	}

	pub fn target_side(&self) -> Position {
		self.target_position.unwrap_or(Position::Top)
	}

	/// Anchor point of the handle on `side`, in graph coordinates.
	pub fn handle_point(&self, side: Position) -> XYPosition {
		let (w, h) = self.size();
		let XYPosition { x, y } = self.position;
		match side {
			Position::Top => XYPosition::new(x + w / 2.0, y),
			Position::Right => XYPosition::new(x + w, y + h / 2.0),
			Position::Bottom => XYPosition::new(x + w / 2.0, y + h),
			Position::Left => XYPosition::new(x, y + h / 2.0),
		}
	}

	pub fn contains(&self, point: XYPosition) -> bool {
		let (w, h) = self.size();
		point.x >= self.position.x
			&& point.x <= self.position.x + w
			&& point.y >= self.position.y
			&& point.y <= self.position.y + h
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Edge {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type", default)]
	pub kind: EdgeKind,
	#[serde(default)]
	pub animated: bool,
}

impl Edge {
	pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: EdgeKind::Default,
			animated: false,
		}
	}
}

/// A finished connect gesture, from a source handle to a target handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
	pub source: String,
	pub target: String,
}

/// Configuration pushed by the host. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
	#[serde(default)]
	pub nodes: Option<Vec<Node>>,
	#[serde(default)]
	pub edges: Option<Vec<Edge>>,
	#[serde(default)]
	pub border_node_id: Option<String>,
	#[serde(default)]
	pub theme: Option<ThemeConfig>,
	#[serde(default)]
	pub direction: Option<Direction>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_host_payload() {
		let config: GraphConfig = serde_json::from_value(serde_json::json!({
			"nodes": [
				{ "id": "a", "type": "input", "position": { "x": 1.0, "y": 2.0 }, "data": { "label": "Start" } },
				{ "id": "b", "type": "mystery", "position": { "x": 0, "y": 0 }, "data": {},
				  "measured": { "width": 180 }, "style": { "border": "1px solid red" } }
			],
			"edges": [{ "id": "e", "source": "a", "target": "b", "type": "animatedSvg", "animated": true }],
			"borderNodeId": "b",
			"direction": "LR"
		}))
		.unwrap();

		let nodes = config.nodes.unwrap();
		assert_eq!(nodes[0].kind, NodeKind::Input);
		assert_eq!(nodes[0].label(), Some("Start"));
		assert_eq!(nodes[1].kind, NodeKind::Default);
		assert_eq!(nodes[1].size(), (180.0, DEFAULT_NODE_HEIGHT));
		assert!(!nodes[1].is_measured());
		assert_eq!(nodes[1].style_str("border"), Some("1px solid red"));

		let edges = config.edges.unwrap();
		assert_eq!(edges[0].kind, EdgeKind::Animated);
		assert!(edges[0].animated);
		assert_eq!(config.border_node_id.as_deref(), Some("b"));
		assert_eq!(config.direction, Some(Direction::LR));
		assert!(config.theme.is_none());
	}

	#[test]
	fn empty_payload_is_all_defaults() {
		let config: GraphConfig = serde_json::from_str("{}").unwrap();
		assert_eq!(config, GraphConfig::default());
	}

	#[test]
	fn handle_points_sit_on_node_sides() {
		let mut node = Node::new("n", NodeKind::Default, "n");
		node.position = XYPosition::new(10.0, 20.0);
		assert_eq!(node.handle_point(Position::Top), XYPosition::new(60.0, 20.0));
		assert_eq!(node.handle_point(Position::Bottom), XYPosition::new(60.0, 70.0));
		assert_eq!(node.handle_point(Position::Left), XYPosition::new(10.0, 45.0));
		assert_eq!(node.handle_point(Position::Right), XYPosition::new(110.0, 45.0));
	}
}
