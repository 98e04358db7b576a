//! Leptos client-side flow graph widget, driven by its embedding page.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

// Modules
mod bridge;
mod components;
mod pages;

use crate::bridge::HostBridge;
use crate::components::flow_graph::GraphConfig;
use crate::pages::home::Home;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// The widget root: listens for host render messages and feeds them to the canvas.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = RwSignal::new(None::<GraphConfig>);
	let listener = HostBridge.listen(move |cfg| {
		info!("Received graph config from host");
		config.set(Some(cfg));
	});
	on_cleanup(move || listener.remove());

	let theme = move || {
		config
			.with(|cfg| cfg.as_ref().and_then(|c| c.theme.as_ref()).and_then(|t| t.base))
			.unwrap_or_default()
			.as_str()
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=theme />

		// sets the document title
		<Title text="Flow Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Home config=config />
	}
}

