use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::error;
use winit::raw_window_handle::RawDisplayHandle;

use crate::{Limits, RendererError, Result, SelectionPolicy};

use super::{Device, Instance};

static CONTEXT_LIVE: AtomicBool = AtomicBool::new(false);

/// Marks a flag as taken for as long as it is alive.
struct ContextSlot(&'static AtomicBool);

impl ContextSlot {
    fn claim(flag: &'static AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ContextSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Instance plus logical device. Created first, dropped last.
///
/// At most one is live per process; a second [`GraphicsContext::new`] fails
/// with [`RendererError::ContextAlreadyExists`] until the first is dropped.
pub struct GraphicsContext {
    pub device: Arc<Device>,
    pub instance: Instance,
    _slot: ContextSlot,
}

impl GraphicsContext {
    /// `display_handle` is `None` for headless use, no surface can be made then.
    pub fn new(
        app_name: &str,
        display_handle: Option<RawDisplayHandle>,
        validation: bool,
        policy: &SelectionPolicy,
        limits: &Limits,
    ) -> Result<Self> {
        let slot = ContextSlot::claim(&CONTEXT_LIVE).ok_or(RendererError::ContextAlreadyExists)?;
        let instance = Instance::new(app_name, display_handle, validation)?;
        let device = Arc::new(Device::new(&instance, policy, limits)?);
        Ok(Self {
            device,
            instance,
            _slot: slot,
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        let users = Arc::strong_count(&self.device);
        if users > 1 {
            error!("Device still has {} other owners at teardown", users - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_exclusive_until_dropped() {
        static FLAG: AtomicBool = AtomicBool::new(false);

        let first = ContextSlot::claim(&FLAG).unwrap();
        assert!(ContextSlot::claim(&FLAG).is_none());
        drop(first);

        let again = ContextSlot::claim(&FLAG);
        assert!(again.is_some());
        drop(again);
        assert!(!FLAG.load(Ordering::Acquire));
    }
}
