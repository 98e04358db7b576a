use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::deferred::{DeferredSlot, WindowTimer};
use super::render;
use super::state::{FlowState, Phase};
use super::types::GraphConfig;

fn viewport_size() -> (f64, f64) {
	let win = window();
	(
		win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
		win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
	)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Empties the slot holding the frame callback. The callback owns a handle
/// to its own slot, so it is only freed once taken out.
fn release_frame<T>(slot: &RefCell<Option<T>>, dispose: impl FnOnce(T)) {
	if let Some(frame) = slot.borrow_mut().take() {
		dispose(frame);
	}
}

#[component]
pub fn FlowCanvas(
	#[prop(into)] config: Signal<Option<GraphConfig>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	/// Called once the graph has been laid out and painted for the first time.
	#[prop(optional)]
	on_ready: Option<Callback<()>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<FlowState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let fit_view = Arc::new(Mutex::new(DeferredSlot::new(WindowTimer)));

	// Fits on the next turn of the event loop; a newer request or unmount
	// cancels the pending one.
	let schedule_fit: Rc<dyn Fn()> = {
		let (state, alive, fit_view) = (state.clone(), alive.clone(), fit_view.clone());
		Rc::new(move || {
			let (state, alive) = (state.clone(), alive.clone());
			if let Ok(mut slot) = fit_view.lock() {
				slot.schedule(move || {
					if !alive.load(Ordering::Acquire) {
						return;
					}
					if let Some(ref mut s) = *state.borrow_mut() {
						s.fit_view();
					}
				});
			}
		})
	};

	let (state_init, animate_init, alive_init, fit_init) = (
		state.clone(),
		animate.clone(),
		alive.clone(),
		schedule_fit.clone(),
	);
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();

		let (w, h) = if fullscreen {
			viewport_size()
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
				height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return warn!("Canvas context is not 2d"),
			},
			_ => return warn!("Canvas 2d context unavailable"),
		};

		let mut s = FlowState::new(w, h);
		s.mount(config.get_untracked().as_ref());
		render::measure(&mut s, &ctx);
		*state_init.borrow_mut() = Some(s);
		fit_init();

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone());
		let last_frame = Cell::new(None::<f64>);
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if !alive_anim.load(Ordering::Acquire) {
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					s.teardown();
				}
				// dropped once this frame has returned
				release_frame(&animate_inner, |cb| set_timeout(move || drop(cb), Duration::ZERO));
				return;
			}
			let dt = last_frame.replace(Some(now)).map_or(0.0, |prev| (now - prev) / 1000.0);
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(dt);
				render::measure(s, &ctx);
				render::render(s, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = window().request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window().request_animation_frame(cb.as_ref().unchecked_ref());
		}

		if let Some(on_ready) = on_ready {
			on_ready.run(());
		}
	});

	let (state_cfg, fit_cfg) = (state.clone(), schedule_fit.clone());
	Effect::new(move |_| {
		let Some(cfg) = config.get() else {
			return;
		};
		// resent payloads keep the user's pan and zoom
		let relaid = match *state_cfg.borrow_mut() {
			Some(ref mut s) if s.phase() == Phase::Ready => s.apply_config(&cfg),
			_ => false,
		};
		if relaid {
			fit_cfg();
		}
	});

	let resize_listener = fullscreen.then(|| {
		let state_resize = state.clone();
		window_event_listener_untyped("resize", move |_| {
			let (nw, nh) = viewport_size();
			if let Some(canvas) = canvas_ref.get() {
				let canvas: HtmlCanvasElement = canvas.into();
				canvas.set_width(nw as u32);
				canvas.set_height(nh as u32);
			}
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		})
	});

	let (alive_cleanup, fit_cleanup) = (alive.clone(), fit_view.clone());
	on_cleanup(move || {
		alive_cleanup.store(false, Ordering::Release);
		if let Ok(mut slot) = fit_cleanup.lock() {
			if slot.is_pending() {
				debug!("Cancelling pending fit view");
			}
			slot.cancel();
		}
		if let Some(handle) = resize_listener {
			handle.remove();
		}
		info!("Flow canvas unmounted");
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some((idx, handle)) = s.handle_at_position(x, y) {
				s.begin_connect(idx, handle, x, y);
			} else if let Some(idx) = s.node_at_position(x, y) {
				s.begin_drag(idx, x, y);
			} else {
				s.begin_pan(x, y);
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.connect.origin.is_some() {
				s.connect_to(x, y);
			} else if s.drag.active {
				s.drag_to(x, y);
			} else {
				s.pan_to(x, y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let pos = pointer(canvas_ref, &ev);
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if let (Some(_), Some((x, y))) = (s.connect.origin, pos) {
				if let Some(connection) = s.finish_connect(x, y) {
					info!("Connected {} -> {}", connection.source, connection.target);
				}
			}
			s.end_gestures();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_gestures();
		}
	};

	let state_wh = state;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.transform.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="flow-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
