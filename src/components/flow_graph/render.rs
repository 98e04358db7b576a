use std::f64::consts::PI;

use log::trace;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::edge_path::{self, EdgePath, PathCommand};
use super::state::{FlowState, HANDLE_RADIUS, HandleKind, LINE_HEIGHT, display_lines};
use super::types::{Edge, EdgeKind, Node, XYPosition};

const FONT: &str = "12px sans-serif";
const CORNER_RADIUS: f64 = 3.0;
const DASH: f64 = 5.0;
const GAP: f64 = 5.0;

/// Splits a CSS border shorthand such as `"2px solid #ff4b4b"` into width and
/// color. Only solid pixel borders are understood.
pub fn parse_border(border: &str) -> Option<(f64, &str)> {
	let mut parts = border.split_whitespace();
	let width = parts.next()?.strip_suffix("px")?.parse().ok()?;
	if parts.next()? != "solid" {
		return None;
	}
	Some((width, parts.next()?))
}

/// Measures nodes painted for the first time, using the canvas font.
pub fn measure(state: &mut FlowState, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(FONT);
	state.measure_nodes(|text| ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0));
}

pub fn render(state: &FlowState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(&state.theme.background_color);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_connection_line(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn trace_path(path: &EdgePath, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	for command in &path.commands {
		match *command {
			PathCommand::MoveTo(p) => ctx.move_to(p.x, p.y),
			PathCommand::LineTo(p) => ctx.line_to(p.x, p.y),
			PathCommand::QuadTo { ctrl, to } => ctx.quadratic_curve_to(ctrl.x, ctrl.y, to.x, to.y),
			PathCommand::CubicTo { c1, c2, to } => {
				ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y)
			}
		}
	}
}

fn stroke_edge(state: &FlowState, edge: &Edge, path: &EdgePath, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(state.theme.edge_stroke());
	ctx.set_line_width(1.0);
	if edge.animated {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(DASH),
			&JsValue::from_f64(GAP),
		));
		ctx.set_line_dash_offset(-(state.flow_time * 20.0) % (DASH + GAP));
	}
	trace_path(path, ctx);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_edges(state: &FlowState, ctx: &CanvasRenderingContext2d) {
	for edge in &state.graph.edges {
		// edges whose endpoints are missing are simply not drawn
		let Some((source, target)) = state.graph.resolve_edge(edge) else {
			continue;
		};
		let (source_side, target_side) = (source.source_side(), target.target_side());
		let (from, to) = (source.handle_point(source_side), target.handle_point(target_side));

		match edge.kind {
			EdgeKind::Animated => {
				let animated = edge_path::animated_edge(&edge.id, from, source_side, to, target_side);
				stroke_edge(state, edge, &animated.path, ctx);
				if let Some(p) = animated.marker_at(state.flow_time) {
					trace!("Marker of {} at ({:.1}, {:.1})", animated.id, p.x, p.y);
					ctx.begin_path();
					let _ = ctx.arc(p.x, p.y, animated.marker_radius, 0.0, 2.0 * PI);
					ctx.set_fill_style_str(&state.theme.primary_color);
					ctx.fill();
				}
			}
			EdgeKind::SmoothStep => {
				let path = edge_path::smooth_step_path(from, source_side, to, target_side);
				stroke_edge(state, edge, &path, ctx);
			}
			EdgeKind::Straight => stroke_edge(state, edge, &edge_path::straight_path(from, to), ctx),
			EdgeKind::Default => {
				let path = edge_path::bezier_path(from, source_side, to, target_side);
				stroke_edge(state, edge, &path, ctx);
			}
		}
	}
}

fn draw_connection_line(state: &FlowState, ctx: &CanvasRenderingContext2d) {
	let Some((idx, handle)) = state.connect.origin else {
		return;
	};
	let Some(node) = state.graph.nodes.get(idx) else {
		return;
	};
	let side = match handle {
		HandleKind::Source => node.source_side(),
		HandleKind::Target => node.target_side(),
	};
	let path = edge_path::straight_path(node.handle_point(side), state.connect.cursor);
	ctx.set_stroke_style_str(state.theme.edge_stroke());
	ctx.set_line_width(1.0);
	trace_path(&path, ctx);
	ctx.stroke();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	ctx.line_to(x + w - r, y);
	ctx.quadratic_curve_to(x + w, y, x + w, y + r);
	ctx.line_to(x + w, y + h - r);
	ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
	ctx.line_to(x + r, y + h);
	ctx.quadratic_curve_to(x, y + h, x, y + h - r);
	ctx.line_to(x, y + r);
	ctx.quadratic_curve_to(x, y, x + r, y);
	ctx.close_path();
}

fn draw_handle(state: &FlowState, p: XYPosition, ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, HANDLE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(state.theme.handle_fill());
	ctx.fill();
}

fn draw_node(state: &FlowState, node: &Node, ctx: &CanvasRenderingContext2d) {
	let (w, h) = node.size();
	let XYPosition { x, y } = node.position;

	rounded_rect(ctx, x, y, w, h, CORNER_RADIUS);
	ctx.set_fill_style_str(node.style_str("background").unwrap_or(state.theme.node_fill()));
	ctx.fill();

	let (border_width, border_color) = node
		.style_str("border")
		.and_then(parse_border)
		.unwrap_or((1.0, state.theme.node_border()));
	ctx.set_stroke_style_str(border_color);
	ctx.set_line_width(border_width);
	ctx.stroke();

	let lines = display_lines(node);
	ctx.set_fill_style_str(node.style_str("color").unwrap_or(state.theme.text_color.as_str()));
	ctx.set_font(FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let top = y + h / 2.0 - (lines.len() as f64 - 1.0) * LINE_HEIGHT / 2.0;
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + w / 2.0, top + i as f64 * LINE_HEIGHT);
	}

	if node.kind.has_target_handle() {
		draw_handle(state, node.handle_point(node.target_side()), ctx);
	}
	if node.kind.has_source_handle() {
		draw_handle(state, node.handle_point(node.source_side()), ctx);
	}
}

fn draw_nodes(state: &FlowState, ctx: &CanvasRenderingContext2d) {
	for node in &state.graph.nodes {
		draw_node(state, node, ctx);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_solid_pixel_borders() {
		assert_eq!(parse_border("2px solid #ff4b4b"), Some((2.0, "#ff4b4b")));
		assert_eq!(parse_border(" 1.5px  solid red "), Some((1.5, "red")));
		assert_eq!(parse_border("2px dashed red"), None);
		assert_eq!(parse_border("none"), None);
	}
}
