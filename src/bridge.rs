//! Messages exchanged with the embedding page over `window.postMessage`.

use leptos::prelude::{WindowListenerHandle, window, window_event_listener_untyped};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::MessageEvent;

use crate::components::flow_graph::GraphConfig;

#[derive(Debug, Error)]
pub enum BridgeError {
	#[error("undecodable host message: {0}")]
	Decode(serde_wasm_bindgen::Error),
	#[error("could not encode widget message: {0}")]
	Encode(serde_wasm_bindgen::Error),
	#[error("no parent window to report to")]
	NoParent,
	#[error("postMessage failed: {0}")]
	Post(String),
}

/// Inbound message from the host page.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum HostMessage {
	#[serde(rename = "flow:render")]
	Render {
		#[serde(default)]
		args: GraphConfig,
	},
	#[serde(other)]
	Other,
}

impl HostMessage {
	pub fn from_js(value: JsValue) -> Result<Self, BridgeError> {
		serde_wasm_bindgen::from_value(value).map_err(BridgeError::Decode)
	}
}

/// Outbound message to the host page.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum WidgetMessage {
	#[serde(rename = "flow:frameSizeReady")]
	FrameSizeReady,
}

/// Window-level `postMessage` channel to the embedding page.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostBridge;

impl HostBridge {
	/// Calls `on_config` for every render message. The returned handle stops
	/// listening when removed.
	pub fn listen(self, on_config: impl Fn(GraphConfig) + 'static) -> WindowListenerHandle {
		window_event_listener_untyped("message", move |ev| {
			let Ok(ev) = ev.dyn_into::<MessageEvent>() else {
				return;
			};
			match HostMessage::from_js(ev.data()) {
				Ok(HostMessage::Render { args }) => on_config(args),
				Ok(HostMessage::Other) => debug!("Ignoring unrelated host message"),
				Err(err) => debug!("{}", err),
			}
		})
	}

	pub fn report_frame_size(self) -> Result<(), BridgeError> {
		self.post(WidgetMessage::FrameSizeReady)
	}

	fn post(self, message: WidgetMessage) -> Result<(), BridgeError> {
		let serializer = serde_wasm_bindgen::Serializer::json_compatible();
		let value = message.serialize(&serializer).map_err(BridgeError::Encode)?;
		let parent = window()
			.parent()
			.ok()
			.flatten()
			.ok_or(BridgeError::NoParent)?;
		parent
			.post_message(&value, "*")
			.map_err(|err| BridgeError::Post(format!("{:?}", err)))?;
		debug!("Posted {:?} to host", message);
		Ok(())
	}
}

/// Logs instead of propagating; the host is never told about bridge failures.
pub fn report_ready() {
	if let Err(err) = HostBridge.report_frame_size() {
		warn!("{}", err);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_render_message() {
		let msg: HostMessage = serde_json::from_value(serde_json::json!({
			"type": "flow:render",
			"args": {
				"nodes": [{ "id": "a", "position": { "x": 0, "y": 0 }, "data": { "label": "A" } }],
				"borderNodeId": "a",
				"direction": "LR"
			}
		}))
		.unwrap();
		let HostMessage::Render { args } = msg else {
			panic!("expected render message");
		};
		assert_eq!(args.nodes.as_ref().map(Vec::len), Some(1));
		assert_eq!(args.border_node_id.as_deref(), Some("a"));
		assert_eq!(format!("{:?}", args.direction), "Some(LR)");
	}

	#[test]
	fn render_without_args_uses_defaults() {
		let msg: HostMessage =
			serde_json::from_value(serde_json::json!({ "type": "flow:render" })).unwrap();
		assert_eq!(msg, HostMessage::Render { args: GraphConfig::default() });
	}

	#[test]
	fn unrelated_messages_are_tolerated() {
		let msg: HostMessage =
			serde_json::from_value(serde_json::json!({ "type": "devtools:ping", "x": 1 })).unwrap();
		assert_eq!(msg, HostMessage::Other);
		assert!(serde_json::from_value::<HostMessage>(serde_json::json!("hello")).is_err());
	}

	#[test]
	fn frame_size_ready_wire_shape() {
		assert_eq!(
			serde_json::to_value(WidgetMessage::FrameSizeReady).unwrap(),
			serde_json::json!({ "type": "flow:frameSizeReady" })
		);
	}
}
