//! Cancelable zero-delay callbacks, used for the deferred fit-view.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use leptos::prelude::{TimeoutHandle, set_timeout_with_handle};
use log::warn;

/// Something that can run a callback on a later turn of the event loop.
pub trait Timer {
	type Handle;

	fn defer(&self, callback: Box<dyn FnOnce()>) -> Option<Self::Handle>;
	fn clear(&self, handle: Self::Handle);
}

/// Browser `setTimeout(cb, 0)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowTimer;

impl Timer for WindowTimer {
	type Handle = TimeoutHandle;

	fn defer(&self, callback: Box<dyn FnOnce()>) -> Option<TimeoutHandle> {
		match set_timeout_with_handle(callback, Duration::ZERO) {
			Ok(handle) => Some(handle),
			Err(err) => {
				warn!("Failed to schedule deferred call: {:?}", err);
				None
			}
		}
	}

	fn clear(&self, handle: TimeoutHandle) {
		handle.clear();
	}
}

/// A scheduled callback that runs at most once and never after being
/// cancelled, even if the timer fires anyway.
pub struct DeferredCall<H> {
	settled: Arc<AtomicBool>,
	handle: Option<H>,
}

impl<H> DeferredCall<H> {
	pub fn schedule<T>(timer: &T, callback: impl FnOnce() + 'static) -> Self
	where
		T: Timer<Handle = H>,
	{
		let settled = Arc::new(AtomicBool::new(false));
		let flag = settled.clone();
		let handle = timer.defer(Box::new(move || {
			if !flag.swap(true, Ordering::AcqRel) {
				callback();
			}
		}));
		Self { settled, handle }
	}

	/// Whether the callback has neither run nor been cancelled.
	pub fn is_pending(&self) -> bool {
		!self.settled.load(Ordering::Acquire)
	}

	pub fn cancel<T>(mut self, timer: &T)
	where
		T: Timer<Handle = H>,
	{
		self.settled.store(true, Ordering::Release);
		if let Some(handle) = self.handle.take() {
			timer.clear(handle);
		}
	}
}

/// Holds at most one pending call; scheduling replaces (and cancels) the
/// previous one.
pub struct DeferredSlot<T: Timer> {
	timer: T,
	pending: Option<DeferredCall<T::Handle>>,
}

impl<T: Timer> DeferredSlot<T> {
	pub fn new(timer: T) -> Self {
		Self {
			timer,
			pending: None,
		}
	}

	pub fn schedule(&mut self, callback: impl FnOnce() + 'static) {
		self.cancel();
		self.pending = Some(DeferredCall::schedule(&self.timer, callback));
	}

	pub fn cancel(&mut self) {
		if let Some(call) = self.pending.take() {
			call.cancel(&self.timer);
		}
	}

	pub fn is_pending(&self) -> bool {
		self.pending.as_ref().is_some_and(DeferredCall::is_pending)
	}
}
