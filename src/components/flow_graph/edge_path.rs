//! Edge geometry: straight, bezier and smooth-step paths, plus the marker
//! that travels along animated edges.

use super::types::{Position, XYPosition};

/// Distance a smooth-step path keeps straight before its first turn.
pub const STEP_OFFSET: f64 = 20.0;
/// Corner radius of smooth-step bends.
pub const STEP_BORDER_RADIUS: f64 = 5.0;
/// Seconds the marker needs to traverse an animated edge.
pub const MARKER_PERIOD: f64 = 2.0;
pub const MARKER_RADIUS: f64 = 4.0;
const BEZIER_CURVATURE: f64 = 0.25;
const CURVE_SAMPLES: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
	MoveTo(XYPosition),
	LineTo(XYPosition),
	QuadTo { ctrl: XYPosition, to: XYPosition },
	CubicTo { c1: XYPosition, c2: XYPosition, to: XYPosition },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgePath {
	pub commands: Vec<PathCommand>,
	/// Where a label for this edge would sit.
	pub label: XYPosition,
}

impl EdgePath {
	/// Polyline approximation; curves are sampled evenly in parameter space.
	pub fn flatten(&self) -> Vec<XYPosition> {
		let mut points: Vec<XYPosition> = Vec::new();
		let mut pen = XYPosition::default();
		for command in &self.commands {
			match *command {
				PathCommand::MoveTo(p) | PathCommand::LineTo(p) => {
					points.push(p);
					pen = p;
				}
				PathCommand::QuadTo { ctrl, to } => {
					for i in 1..=CURVE_SAMPLES {
						let t = i as f64 / CURVE_SAMPLES as f64;
						let mt = 1.0 - t;
						points.push(XYPosition::new(
							mt * mt * pen.x + 2.0 * mt * t * ctrl.x + t * t * to.x,
							mt * mt * pen.y + 2.0 * mt * t * ctrl.y + t * t * to.y,
						));
					}
					pen = to;
				}
				PathCommand::CubicTo { c1, c2, to } => {
					for i in 1..=CURVE_SAMPLES {
						let t = i as f64 / CURVE_SAMPLES as f64;
						let mt = 1.0 - t;
						let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
						points.push(XYPosition::new(
							a * pen.x + b * c1.x + c * c2.x + d * to.x,
							a * pen.y + b * c1.y + c * c2.y + d * to.y,
						));
					}
					pen = to;
				}
			}
		}
		points
	}

	pub fn length(&self) -> f64 {
		self.flatten()
			.windows(2)
			.map(|w| distance(w[0], w[1]))
			.sum()
	}

	/// Point at `fraction` (0..=1) of the path's arc length.
	pub fn point_at(&self, fraction: f64) -> Option<XYPosition> {
		let points = self.flatten();
		let first = *points.first()?;
		let total = self.length();
		if total <= f64::EPSILON {
			return Some(first);
		}

		let mut remaining = fraction.clamp(0.0, 1.0) * total;
		for w in points.windows(2) {
			let segment = distance(w[0], w[1]);
			if remaining <= segment && segment > 0.0 {
				let t = remaining / segment;
				return Some(XYPosition::new(
					w[0].x + (w[1].x - w[0].x) * t,
					w[0].y + (w[1].y - w[0].y) * t,
				));
			}
			remaining -= segment;
		}
		points.last().copied()
	}
}

fn distance(a: XYPosition, b: XYPosition) -> f64 {
	((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

fn midpoint(a: XYPosition, b: XYPosition) -> XYPosition {
	XYPosition::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn straight_path(source: XYPosition, target: XYPosition) -> EdgePath {
	EdgePath {
		commands: vec![PathCommand::MoveTo(source), PathCommand::LineTo(target)],
		label: midpoint(source, target),
	}
}

fn control_offset(distance: f64) -> f64 {
	if distance >= 0.0 {
		0.5 * distance
	} else {
		BEZIER_CURVATURE * 25.0 * (-distance).sqrt()
	}
}

fn control_point(side: Position, from: XYPosition, to: XYPosition) -> XYPosition {
	match side {
		Position::Left => XYPosition::new(from.x - control_offset(from.x - to.x), from.y),
		Position::Right => XYPosition::new(from.x + control_offset(to.x - from.x), from.y),
		Position::Top => XYPosition::new(from.x, from.y - control_offset(from.y - to.y)),
		Position::Bottom => XYPosition::new(from.x, from.y + control_offset(to.y - from.y)),
	}
}

/// Cubic curve leaving each handle perpendicular to its node side.
pub fn bezier_path(
	source: XYPosition,
	source_side: Position,
	target: XYPosition,
	target_side: Position,
) -> EdgePath {
	let c1 = control_point(source_side, source, target);
	let c2 = control_point(target_side, target, source);
	// cubic midpoint at t = 0.5
	let label = XYPosition::new(
		source.x * 0.125 + c1.x * 0.375 + c2.x * 0.375 + target.x * 0.125,
		source.y * 0.125 + c1.y * 0.375 + c2.y * 0.375 + target.y * 0.125,
	);
	EdgePath {
		commands: vec![
			PathCommand::MoveTo(source),
			PathCommand::CubicTo { c1, c2, to: target },
		],
		label,
	}
}

fn axis(p: XYPosition, horizontal: bool) -> f64 {
	if horizontal { p.x } else { p.y }
}

fn axis_of(v: (f64, f64), horizontal: bool) -> f64 {
	if horizontal { v.0 } else { v.1 }
}

/// Corner points of an orthogonal route, including both gapped handle points.
fn step_points(
	source: XYPosition,
	source_side: Position,
	target: XYPosition,
	target_side: Position,
) -> (Vec<XYPosition>, XYPosition) {
	let source_dir = source_side.direction();
	let target_dir = target_side.direction();
	let source_gapped = XYPosition::new(
		source.x + source_dir.0 * STEP_OFFSET,
		source.y + source_dir.1 * STEP_OFFSET,
	);
	let target_gapped = XYPosition::new(
		target.x + target_dir.0 * STEP_OFFSET,
		target.y + target_dir.1 * STEP_OFFSET,
	);

	// main travel axis and its sign
	let horizontal = source_side.is_horizontal();
	let current = if horizontal {
		if source_gapped.x < target_gapped.x { 1.0 } else { -1.0 }
	} else if source_gapped.y < target_gapped.y {
		1.0
	} else {
		-1.0
	};

	let mut source_gap_offset = (0.0, 0.0);
	let mut target_gap_offset = (0.0, 0.0);
	let vertical_split = |cx: f64| {
		vec![
			XYPosition::new(cx, source_gapped.y),
			XYPosition::new(cx, target_gapped.y),
		]
	};
	let horizontal_split = |cy: f64| {
		vec![
			XYPosition::new(source_gapped.x, cy),
			XYPosition::new(target_gapped.x, cy),
		]
	};

	let (corners, center) = if axis_of(source_dir, horizontal) * axis_of(target_dir, horizontal) == -1.0 {
		// opposite sides, the common case
		let center = midpoint(source, target);
		let corners = if (axis_of(source_dir, horizontal) == current) == horizontal {
			vertical_split(center.x)
		} else {
			horizontal_split(center.y)
		};
		(corners, center)
	} else {
		let source_target = vec![XYPosition::new(source_gapped.x, target_gapped.y)];
		let target_source = vec![XYPosition::new(target_gapped.x, source_gapped.y)];
		let mut corners = if horizontal {
			if source_dir.0 == current { target_source.clone() } else { source_target.clone() }
		} else if source_dir.1 == current {
			source_target.clone()
		} else {
			target_source.clone()
		};

		if source_side == target_side {
			let diff = (axis(source, horizontal) - axis(target, horizontal)).abs();
			if diff <= STEP_OFFSET {
				let gap = (STEP_OFFSET - 1.0).min(STEP_OFFSET - diff);
				if axis_of(source_dir, horizontal) == current {
					let sign = if axis(source_gapped, horizontal) > axis(source, horizontal) { -1.0 } else { 1.0 };
					set_axis(&mut source_gap_offset, horizontal, sign * gap);
				} else {
					let sign = if axis(target_gapped, horizontal) > axis(target, horizontal) { -1.0 } else { 1.0 };
					set_axis(&mut target_gap_offset, horizontal, sign * gap);
				}
			}
		} else {
			// mixed sides, e.g. right -> bottom
			let same_dir = axis_of(source_dir, horizontal) == axis_of(target_dir, !horizontal);
			let source_gt = axis(source_gapped, !horizontal) > axis(target_gapped, !horizontal);
			let source_lt = axis(source_gapped, !horizontal) < axis(target_gapped, !horizontal);
			let flip = if axis_of(source_dir, horizontal) == 1.0 {
				(!same_dir && source_gt) || (same_dir && source_lt)
			} else {
				(!same_dir && source_lt) || (same_dir && source_gt)
			};
			if flip {
				corners = if horizontal { source_target } else { target_source };
			}
		}

		let source_point = offset(source_gapped, source_gap_offset);
		let target_point = offset(target_gapped, target_gap_offset);
		let knee = corners[0];
		let max_x = (source_point.x - knee.x).abs().max((target_point.x - knee.x).abs());
		let max_y = (source_point.y - knee.y).abs().max((target_point.y - knee.y).abs());
		let center = if max_x >= max_y {
			XYPosition::new((source_point.x + target_point.x) / 2.0, knee.y)
		} else {
			XYPosition::new(knee.x, (source_point.y + target_point.y) / 2.0)
		};
		(corners, center)
	};

	let mut points = Vec::with_capacity(corners.len() + 4);
	points.push(source);
	points.push(offset(source_gapped, source_gap_offset));
	points.extend(corners);
	points.push(offset(target_gapped, target_gap_offset));
	points.push(target);
	(points, center)
}

fn set_axis(v: &mut (f64, f64), horizontal: bool, value: f64) {
	if horizontal {
		v.0 = value;
	} else {
		v.1 = value;
	}
}

fn offset(p: XYPosition, by: (f64, f64)) -> XYPosition {
	XYPosition::new(p.x + by.0, p.y + by.1)
}

/// Rounded corner at `b` between segments `a -> b` and `b -> c`.
fn bend(a: XYPosition, b: XYPosition, c: XYPosition, radius: f64) -> Vec<PathCommand> {
	let size = (distance(a, b) / 2.0).min(distance(b, c) / 2.0).min(radius);
	if (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y) {
		return vec![PathCommand::LineTo(b)];
	}
	if a.y == b.y {
		let x_dir = if a.x < c.x { -1.0 } else { 1.0 };
		let y_dir = if a.y < c.y { 1.0 } else { -1.0 };
		vec![
			PathCommand::LineTo(XYPosition::new(b.x + size * x_dir, b.y)),
			PathCommand::QuadTo {
				ctrl: b,
				to: XYPosition::new(b.x, b.y + size * y_dir),
			},
		]
	} else {
		let x_dir = if a.x < c.x { 1.0 } else { -1.0 };
		let y_dir = if a.y < c.y { -1.0 } else { 1.0 };
		vec![
			PathCommand::LineTo(XYPosition::new(b.x, b.y + size * y_dir)),
			PathCommand::QuadTo {
				ctrl: b,
				to: XYPosition::new(b.x + size * x_dir, b.y),
			},
		]
	}
}

/// Orthogonal route with rounded corners between two handles.
pub fn smooth_step_path(
	source: XYPosition,
	source_side: Position,
	target: XYPosition,
	target_side: Position,
) -> EdgePath {
	let (points, label) = step_points(source, source_side, target, target_side);
	let last = points.len() - 1;
	let mut commands = Vec::with_capacity(points.len() * 2);
	for (i, &p) in points.iter().enumerate() {
		if i == 0 {
			commands.push(PathCommand::MoveTo(p));
		} else if i == last {
			commands.push(PathCommand::LineTo(p));
		} else {
			commands.extend(bend(points[i - 1], p, points[i + 1], STEP_BORDER_RADIUS));
		}
	}
	EdgePath { commands, label }
}

/// Smooth-step edge with a marker looping along it forever.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedEdge {
	pub id: String,
	pub path: EdgePath,
	pub marker_radius: f64,
	pub period: f64,
}

impl AnimatedEdge {
	/// Marker position `elapsed` seconds after mount.
	pub fn marker_at(&self, elapsed: f64) -> Option<XYPosition> {
		let phase = elapsed.rem_euclid(self.period) / self.period;
		self.path.point_at(phase)
	}
}

pub fn animated_edge(
	id: &str,
	source: XYPosition,
	source_side: Position,
	target: XYPosition,
	target_side: Position,
) -> AnimatedEdge {
	AnimatedEdge {
		id: id.to_string(),
		path: smooth_step_path(source, source_side, target, target_side),
		marker_radius: MARKER_RADIUS,
		period: MARKER_PERIOD,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn p(x: f64, y: f64) -> XYPosition {
		XYPosition::new(x, y)
	}

	fn is_orthogonal(points: &[XYPosition]) -> bool {
		points.windows(2).all(|w| w[0].x == w[1].x || w[0].y == w[1].y)
	}

	#[test]
	fn bottom_to_top_splits_horizontally() {
		let (points, center) = step_points(p(0.0, 0.0), Position::Bottom, p(100.0, 200.0), Position::Top);
		assert_eq!(
			points,
			vec![
				p(0.0, 0.0),
				p(0.0, 20.0),
				p(0.0, 100.0),
				p(100.0, 100.0),
				p(100.0, 180.0),
				p(100.0, 200.0),
			]
		);
		assert_eq!(center, p(50.0, 100.0));
		assert!(is_orthogonal(&points));
	}

	#[test]
	fn right_to_left_splits_vertically() {
		let (points, _) = step_points(p(0.0, 0.0), Position::Right, p(200.0, 80.0), Position::Left);
		assert_eq!(points[2], p(100.0, 0.0));
		assert_eq!(points[3], p(100.0, 80.0));
		assert!(is_orthogonal(&points));
	}

	#[test]
	fn mixed_and_same_sides_stay_orthogonal() {
		let cases = [
			(Position::Right, Position::Bottom),
			(Position::Bottom, Position::Left),
			(Position::Bottom, Position::Bottom),
			(Position::Left, Position::Left),
			(Position::Top, Position::Right),
		];
		for (from, to) in cases {
			for target in [p(150.0, 120.0), p(-150.0, -60.0), p(10.0, 5.0)] {
				let (points, _) = step_points(p(0.0, 0.0), from, target, to);
				assert!(is_orthogonal(&points), "{from:?} -> {to:?} to {target:?}");
				assert_eq!(points.first(), Some(&p(0.0, 0.0)));
				assert_eq!(points.last(), Some(&target));
			}
		}
	}

	#[test]
	fn smooth_step_rounds_each_corner() {
		let path = smooth_step_path(p(0.0, 0.0), Position::Bottom, p(100.0, 200.0), Position::Top);
		let quads = path
			.commands
			.iter()
			.filter(|c| matches!(c, PathCommand::QuadTo { .. }))
			.count();
		assert_eq!(quads, 2);
		assert_eq!(path.commands.first(), Some(&PathCommand::MoveTo(p(0.0, 0.0))));
		assert_eq!(path.commands.last(), Some(&PathCommand::LineTo(p(100.0, 200.0))));
	}

	#[test]
	fn aligned_handles_give_a_straight_run() {
		let path = smooth_step_path(p(50.0, 0.0), Position::Bottom, p(50.0, 100.0), Position::Top);
		assert!(path.commands.iter().all(|c| !matches!(c, PathCommand::QuadTo { .. })));
		assert!((path.length() - 100.0).abs() < 1e-9);
	}

	#[test]
	fn marker_loops_every_period() {
		let edge = animated_edge("a->c", p(0.0, 0.0), Position::Bottom, p(0.0, 100.0), Position::Top);
		assert_eq!(edge.id, "a->c");
		assert_eq!(edge.period, 2.0);
		assert_eq!(edge.marker_at(0.0), Some(p(0.0, 0.0)));
		let halfway = edge.marker_at(1.0).unwrap();
		assert!((halfway.y - 50.0).abs() < 1e-9);
		assert_eq!(edge.marker_at(0.5), edge.marker_at(2.5));
		assert_eq!(edge.marker_at(7.0), edge.marker_at(1.0));
	}

	#[test]
	fn bezier_ends_at_handles() {
		let path = bezier_path(p(0.0, 0.0), Position::Bottom, p(100.0, 100.0), Position::Top);
		let points = path.flatten();
		assert_eq!(points.first(), Some(&p(0.0, 0.0)));
		let end = points.last().unwrap();
		assert!((end.x - 100.0).abs() < 1e-9 && (end.y - 100.0).abs() < 1e-9);
		assert_eq!(path.label, p(50.0, 50.0));
	}

	#[test]
	fn degenerate_path_has_a_point() {
		let path = straight_path(p(3.0, 4.0), p(3.0, 4.0));
		assert_eq!(path.point_at(0.7), Some(p(3.0, 4.0)));
	}
}
