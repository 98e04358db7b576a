use super::types::{Node, XYPosition};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
/// Fraction of the content size kept free around it after fitting.
pub const FIT_PADDING: f64 = 0.1;

/// Pan (`x`, `y`, screen pixels) and zoom (`k`) of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> XYPosition {
		XYPosition::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zooms by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = k;
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

pub fn node_bounds(nodes: &[Node]) -> Option<Bounds> {
	let first = nodes.first()?;
	let (mut x0, mut y0) = (first.position.x, first.position.y);
	let (mut x1, mut y1) = (x0, y0);
	for node in nodes {
		let (w, h) = node.size();
		x0 = x0.min(node.position.x);
		y0 = y0.min(node.position.y);
		x1 = x1.max(node.position.x + w);
		y1 = y1.max(node.position.y + h);
	}
	Some(Bounds {
		x: x0,
		y: y0,
		width: x1 - x0,
		height: y1 - y0,
	})
}

/// Transform that centers `bounds` in a `width` x `height` viewport.
pub fn viewport_for_bounds(bounds: Bounds, width: f64, height: f64, padding: f64) -> ViewTransform {
	let x_zoom = width / (bounds.width * (1.0 + padding));
	let y_zoom = height / (bounds.height * (1.0 + padding));
	let k = x_zoom.min(y_zoom).clamp(MIN_ZOOM, MAX_ZOOM);
	let (cx, cy) = (bounds.x + bounds.width / 2.0, bounds.y + bounds.height / 2.0);
	ViewTransform {
		x: width / 2.0 - cx * k,
		y: height / 2.0 - cy * k,
		k,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_graph::types::NodeKind;

	#[test]
	fn fit_centers_content() {
		let mut a = Node::new("a", NodeKind::Default, "a");
		let mut b = Node::new("b", NodeKind::Default, "b");
		a.position = XYPosition::new(0.0, 0.0);
		b.position = XYPosition::new(300.0, 150.0);

		let bounds = node_bounds(&[a, b]).unwrap();
		assert_eq!(bounds, Bounds { x: 0.0, y: 0.0, width: 400.0, height: 200.0 });

		let t = viewport_for_bounds(bounds, 880.0, 880.0, FIT_PADDING);
		assert!((t.k - 2.0).abs() < 1e-9);
		let center = t.screen_to_graph(440.0, 440.0);
		assert!((center.x - 200.0).abs() < 1e-9);
		assert!((center.y - 100.0).abs() < 1e-9);
	}

	#[test]
	fn fit_zoom_is_clamped() {
		let bounds = Bounds { x: 0.0, y: 0.0, width: 100_000.0, height: 50.0 };
		assert_eq!(viewport_for_bounds(bounds, 800.0, 600.0, FIT_PADDING).k, MIN_ZOOM);
	}

	#[test]
	fn zoom_keeps_cursor_anchor() {
		let mut t = ViewTransform::default();
		let before = t.screen_to_graph(120.0, 80.0);
		t.zoom_at(120.0, 80.0, 1.5);
		let after = t.screen_to_graph(120.0, 80.0);
		assert!((before.x - after.x).abs() < 1e-9);
		assert!((before.y - after.y).abs() < 1e-9);
		t.zoom_at(0.0, 0.0, 100.0);
		assert_eq!(t.k, MAX_ZOOM);
	}

	#[test]
	fn no_nodes_no_bounds() {
		assert!(node_bounds(&[]).is_none());
	}
}
