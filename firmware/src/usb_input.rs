//! Host-to-device traffic: GUI OUT reports and USB device state.

use defmt::{debug, info};
use embassy_usb::class::hid::{ReportId, RequestHandler};
use embassy_usb::control::OutResponse;
use embassy_usb::Handler;
use portable_atomic::Ordering;

use crate::usb_output::CONFIGURED;
use crate::SharedPanel;

/// Forwards GUI OUT reports (SET_REPORT or interrupt OUT) to the panel.
#[derive(Clone, Copy)]
pub struct LedRequestHandler {
    panel: &'static SharedPanel,
}

impl LedRequestHandler {
    pub const fn new(panel: &'static SharedPanel) -> Self {
        Self { panel }
    }
}

impl RequestHandler for LedRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        debug!("GUI report {:?}: {=[u8]:x}", id, data);
        self.panel
            .lock(|panel| panel.borrow_mut().on_led_report(data));
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Enables the panel's interfaces while the host has the device configured.
pub struct UsbStateHandler {
    panel: &'static SharedPanel,
}

impl UsbStateHandler {
    pub const fn new(panel: &'static SharedPanel) -> Self {
        Self { panel }
    }

    fn set_enabled(&mut self, enabled: bool) {
        CONFIGURED.store(enabled, Ordering::Relaxed);
        self.panel
            .lock(|panel| panel.borrow_mut().set_interfaces_enabled(enabled));
    }
}

impl Handler for UsbStateHandler {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            self.set_enabled(false);
        }
    }

    fn reset(&mut self) {
        self.set_enabled(false);
    }

    fn configured(&mut self, configured: bool) {
        info!("USB configured: {}", configured);
        self.set_enabled(configured);
    }

    fn suspended(&mut self, suspended: bool) {
        info!("USB suspended: {}", suspended);
    }
}
