use leptos::prelude::*;

use crate::bridge;
use crate::components::flow_graph::{FlowCanvas, GraphConfig};

/// Default Home Page
#[component]
pub fn Home(#[prop(into)] config: Signal<Option<GraphConfig>>) -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<FlowCanvas
					config=config
					fullscreen=true
					on_ready=Callback::new(|_| bridge::report_ready())
				/>
			</div>
		</ErrorBoundary>
	}
}
