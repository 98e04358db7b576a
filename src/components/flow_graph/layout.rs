//! Layered (Sugiyama-style) auto-layout.
//!
//! The graph is ranked along the flow direction, long edges are split with
//! dummy vertices, ranks are ordered to reduce crossings and finally every
//! vertex gets a coordinate. Everything iterates in input order so the same
//! input always yields the same drawing.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use super::types::{Direction, Edge, Node, XYPosition};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
	/// Gap between neighbouring nodes of one rank.
	pub node_sep: f64,
	/// Gap reserved around dummy vertices of long edges.
	pub edge_sep: f64,
	/// Gap between ranks.
	pub rank_sep: f64,
	/// Barycenter sweeps for crossing reduction.
	pub sweeps: usize,
	/// Alignment passes for coordinate assignment.
	pub passes: usize,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		Self {
			node_sep: 50.0,
			edge_sep: 10.0,
			rank_sep: 50.0,
			sweeps: 8,
			passes: 8,
		}
	}
}

pub fn layout(nodes: &[Node], edges: &[Edge], direction: Direction) -> Vec<Node> {
	layout_with(nodes, edges, direction, &LayoutOptions::default())
}

/// Returns `nodes` with positions set so each node's box is centered on its
/// layout anchor. Edges are never modified.
pub fn layout_with(
	nodes: &[Node],
	edges: &[Edge],
	direction: Direction,
	options: &LayoutOptions,
) -> Vec<Node> {
	let graph = LayoutGraph::build(nodes, edges);
	let centers = graph.centers(direction, options);

	nodes
		.iter()
		.map(|node| {
			let mut node = node.clone();
			if let Some(&slot) = graph.index.get(node.id.as_str()) {
				let (w, h) = graph.sizes[slot];
				let center = centers[slot];
				node.position = XYPosition::new(center.x - w / 2.0, center.y - h / 2.0);
			}
			node
		})
		.collect()
}

struct LayoutGraph<'a> {
	index: HashMap<&'a str, usize>,
	sizes: Vec<(f64, f64)>,
	edges: Vec<(usize, usize)>,
}

impl<'a> LayoutGraph<'a> {
	fn build(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
		let mut index = HashMap::new();
		let mut sizes = Vec::new();
		for node in nodes {
			match index.get(node.id.as_str()) {
				Some(&slot) => sizes[slot] = node.size(),
				None => {
					index.insert(node.id.as_str(), sizes.len());
					sizes.push(node.size());
				}
			}
		}

		let mut seen = HashSet::new();
		let mut pairs = Vec::new();
		for edge in edges {
			let (Some(&u), Some(&v)) = (
				index.get(edge.source.as_str()),
				index.get(edge.target.as_str()),
			) else {
				debug!("Layout skips dangling edge {}", edge.id);
				continue;
			};
			if u != v && seen.insert((u, v)) {
				pairs.push((u, v));
			}
		}

		Self {
			index,
			sizes,
			edges: pairs,
		}
	}

	/// Center point of every layout node, indexed like `sizes`.
	fn centers(&self, direction: Direction, options: &LayoutOptions) -> Vec<XYPosition> {
		let n = self.sizes.len();
		if n == 0 {
			return Vec::new();
		}

		// (cross, depth): extent along the rank line and along the flow.
		let extents: Vec<(f64, f64)> = self
			.sizes
			.iter()
			.map(|&(w, h)| if direction.is_horizontal() { (h, w) } else { (w, h) })
			.collect();

		let dag = break_cycles(n, &self.edges);
		let ranks = assign_ranks(n, &dag);
		let mut layered = Layered::new(&ranks, &dag, &extents);
		layered.order(options.sweeps);
		let cross = layered.cross_coordinates(options);
		let depth = layered.rank_coordinates(options.rank_sep);

		let mut centers: Vec<XYPosition> = (0..n)
			.map(|v| {
				let (c, d) = (cross[v], depth[ranks[v]]);
				match direction {
					Direction::TB => XYPosition::new(c, d),
					Direction::BT => XYPosition::new(c, -d),
					Direction::LR => XYPosition::new(d, c),
					Direction::RL => XYPosition::new(-d, c),
				}
			})
			.collect();

		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		for (center, &(w, h)) in centers.iter().zip(&self.sizes) {
			min_x = min_x.min(center.x - w / 2.0);
			min_y = min_y.min(center.y - h / 2.0);
		}
		for center in &mut centers {
			center.x -= min_x;
			center.y -= min_y;
		}
		centers
	}
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
	New,
	Active,
	Done,
}

/// Reverses every back edge found by a depth-first search in input order.
fn break_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
	let mut out = vec![Vec::new(); n];
	for (i, &(u, _)) in edges.iter().enumerate() {
		out[u].push(i);
	}

	let mut state = vec![Visit::New; n];
	let mut reversed = vec![false; edges.len()];
	for root in 0..n {
		if state[root] != Visit::New {
			continue;
		}
		state[root] = Visit::Active;
		let mut stack = vec![(root, 0usize)];
		while let Some(top) = stack.last_mut() {
			let (v, cursor) = *top;
			match out[v].get(cursor) {
				Some(&e) => {
					top.1 += 1;
					let w = edges[e].1;
					match state[w] {
						Visit::New => {
							state[w] = Visit::Active;
							stack.push((w, 0));
						}
						Visit::Active => reversed[e] = true,
						Visit::Done => {}
					}
				}
				None => {
					state[v] = Visit::Done;
					stack.pop();
				}
			}
		}
	}

	edges
		.iter()
		.zip(reversed)
		.map(|(&(u, v), rev)| if rev { (v, u) } else { (u, v) })
		.collect()
}

/// Longest-path ranking, with sources pulled down next to their successors.
fn assign_ranks(n: usize, dag: &[(usize, usize)]) -> Vec<usize> {
	let mut preds = vec![Vec::new(); n];
	let mut succs = vec![Vec::new(); n];
	for &(u, v) in dag {
		succs[u].push(v);
		preds[v].push(u);
	}

	let mut indegree: Vec<usize> = preds.iter().map(Vec::len).collect();
	let mut queue: VecDeque<usize> = (0..n).filter(|&v| indegree[v] == 0).collect();
	let mut order = Vec::with_capacity(n);
	while let Some(v) = queue.pop_front() {
		order.push(v);
		for &w in &succs[v] {
			indegree[w] -= 1;
			if indegree[w] == 0 {
				queue.push_back(w);
			}
		}
	}

	let mut rank = vec![0i64; n];
	for &v in &order {
		for &w in &succs[v] {
			rank[w] = rank[w].max(rank[v] + 1);
		}
	}
	for &v in order.iter().rev() {
		if preds[v].is_empty() {
			if let Some(nearest) = succs[v].iter().map(|&w| rank[w]).min() {
				rank[v] = nearest - 1;
			}
		}
	}

	let min = rank.iter().copied().min().unwrap_or(0);
	rank.into_iter().map(|r| (r - min) as usize).collect()
}

/// Proper layered graph: every edge spans exactly one rank.
struct Layered {
	rank: Vec<usize>,
	extent: Vec<(f64, f64)>,
	dummy: Vec<bool>,
	up: Vec<Vec<usize>>,
	down: Vec<Vec<usize>>,
	layers: Vec<Vec<usize>>,
}

impl Layered {
	fn new(ranks: &[usize], dag: &[(usize, usize)], extents: &[(f64, f64)]) -> Self {
		let n = ranks.len();
		let mut rank = ranks.to_vec();
		let mut extent = extents.to_vec();
		let mut dummy = vec![false; n];
		let mut up = vec![Vec::new(); n];
		let mut down = vec![Vec::new(); n];

		for &(u, v) in dag {
			let mut prev = u;
			for r in rank[u] + 1..rank[v] {
				let d = rank.len();
				rank.push(r);
				extent.push((0.0, 0.0));
				dummy.push(true);
				up.push(vec![prev]);
				down.push(Vec::new());
				down[prev].push(d);
				prev = d;
			}
			down[prev].push(v);
			up[v].push(prev);
		}

		let depth = rank.iter().copied().max().map_or(0, |r| r + 1);
		let mut layers = vec![Vec::new(); depth];
		let mut roots: Vec<usize> = (0..rank.len()).collect();
		roots.sort_by_key(|&v| rank[v]);
		let mut seen = vec![false; rank.len()];
		for root in roots {
			let mut stack = vec![root];
			while let Some(v) = stack.pop() {
				if seen[v] {
					continue;
				}
				seen[v] = true;
				layers[rank[v]].push(v);
				for &w in down[v].iter().rev() {
					if !seen[w] {
						stack.push(w);
					}
				}
			}
		}

		Self {
			rank,
			extent,
			dummy,
			up,
			down,
			layers,
		}
	}

	fn positions(&self) -> Vec<usize> {
		let mut pos = vec![0; self.rank.len()];
		for layer in &self.layers {
			for (i, &v) in layer.iter().enumerate() {
				pos[v] = i;
			}
		}
		pos
	}

	fn crossings(&self) -> usize {
		let pos = self.positions();
		let mut total = 0;
		for layer in &self.layers {
			let mut segments = Vec::new();
			for &u in layer {
				for &v in &self.down[u] {
					segments.push((pos[u], pos[v]));
				}
			}
			for (i, a) in segments.iter().enumerate() {
				for b in &segments[i + 1..] {
					if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
						total += 1;
					}
				}
			}
		}
		total
	}

	/// Alternating barycenter sweeps; keeps the ordering with fewest crossings.
	fn order(&mut self, sweeps: usize) {
		let mut best = self.layers.clone();
		let mut best_crossings = self.crossings();
		let len = self.layers.len();

		for sweep in 0..sweeps {
			if best_crossings == 0 {
				break;
			}
			if sweep % 2 == 0 {
				for r in 1..len {
					self.sort_layer(r, true);
				}
			} else {
				for r in (0..len.saturating_sub(1)).rev() {
					self.sort_layer(r, false);
				}
			}
			let crossings = self.crossings();
			if crossings < best_crossings {
				best = self.layers.clone();
				best_crossings = crossings;
			}
		}
		self.layers = best;
	}

	fn sort_layer(&mut self, r: usize, from_above: bool) {
		let pos = self.positions();
		let mut keyed: Vec<(f64, usize)> = self.layers[r]
			.iter()
			.enumerate()
			.map(|(i, &v)| {
				let neighbours = if from_above { &self.up[v] } else { &self.down[v] };
				let barycenter = if neighbours.is_empty() {
					i as f64
				} else {
					neighbours.iter().map(|&w| pos[w] as f64).sum::<f64>() / neighbours.len() as f64
				};
				(barycenter, v)
			})
			.collect();
		keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
		self.layers[r] = keyed.into_iter().map(|(_, v)| v).collect();
	}

	fn half_width(&self, v: usize, options: &LayoutOptions) -> f64 {
		let gap = if self.dummy[v] {
			options.edge_sep
		} else {
			options.node_sep
		};
		(self.extent[v].0 + gap) / 2.0
	}

	fn separation(&self, a: usize, b: usize, options: &LayoutOptions) -> f64 {
		self.half_width(a, options) + self.half_width(b, options)
	}

	/// Cross-axis coordinate of every vertex.
	fn cross_coordinates(&self, options: &LayoutOptions) -> Vec<f64> {
		let mut x = vec![0.0; self.rank.len()];
		for layer in &self.layers {
			let mut cursor = 0.0;
			for (i, &v) in layer.iter().enumerate() {
				if i > 0 {
					cursor += self.separation(layer[i - 1], v, options);
				}
				x[v] = cursor;
			}
			for &v in layer {
				x[v] -= cursor / 2.0;
			}
		}

		let len = self.layers.len();
		for pass in 0..options.passes {
			let downward = pass % 2 == 0;
			let ranks: Vec<usize> = if downward {
				(1..len).collect()
			} else {
				(0..len.saturating_sub(1)).rev().collect()
			};
			for r in ranks {
				let layer = &self.layers[r];
				let desired: Vec<f64> = layer
					.iter()
					.map(|&v| {
						let neighbours = if downward { &self.up[v] } else { &self.down[v] };
						if neighbours.is_empty() {
							x[v]
						} else {
							neighbours.iter().map(|&w| x[w]).sum::<f64>() / neighbours.len() as f64
						}
					})
					.collect();
				for (&v, placed) in layer.iter().zip(self.place(layer, &desired, options)) {
					x[v] = placed;
				}
			}
		}
		x
	}

	/// Moves a rank towards `desired` while keeping order and separation.
	/// Averages a left-anchored and a right-anchored placement, both feasible.
	fn place(&self, layer: &[usize], desired: &[f64], options: &LayoutOptions) -> Vec<f64> {
		let k = layer.len();
		let mut left = desired.to_vec();
		for i in 1..k {
			left[i] = left[i].max(left[i - 1] + self.separation(layer[i - 1], layer[i], options));
		}
		let mut right = desired.to_vec();
		for i in (0..k.saturating_sub(1)).rev() {
			right[i] = right[i].min(right[i + 1] - self.separation(layer[i], layer[i + 1], options));
		}
		left.iter().zip(&right).map(|(l, r)| (l + r) / 2.0).collect()
	}

	/// Flow-axis coordinate of every rank's center line.
	fn rank_coordinates(&self, rank_sep: f64) -> Vec<f64> {
		let mut coords = Vec::with_capacity(self.layers.len());
		let mut cursor = 0.0;
		for layer in &self.layers {
			let depth = layer
				.iter()
				.map(|&v| self.extent[v].1)
				.fold(0.0, f64::max);
			cursor += depth / 2.0;
			coords.push(cursor);
			cursor += depth / 2.0 + rank_sep;
		}
		coords
	}
}
