//! USB composite front panel for RP2350B.
//!
//! # Overview
//!
//! The firmware runs on an RP2350B and presents three HID interfaces:
//! 1. A boot keyboard reporting the nine panel keys as keypad digits
//! 2. A two-axis joystick driven by the vertical and horizontal sliders
//! 3. A vendor "GUI" interface streaming a diagnostic report every
//!    millisecond and accepting LED writes and idle-animation commands
//!
//! # Hardware Configuration
//!
//! | Port bits | GPIO     | Function |
//! |-----------|----------|----------|
//! | A0-A7     | 0-7      | Panel LEDs 1-8 (active low) |
//! | F0-F3     | 8-11     | Keypad column selects 0-3 (active low) |
//! | F4-F7     | 12-15    | Keypad rows 0-3 |
//! | B0-B3     | 16-19    | Horizontal slider contacts 8-11 |
//! | B4        | 20       | Test-mode switch (low = test mode) |
//! | B6        | 21       | Status LED (active low) |
//! | B7        | 22       | Keypad column 4 select (active low) |
//! | C2-C7     | 23-28    | Vertical slider contacts 0-5 |
//! | D0-D5     | 29-34    | Vertical slider contacts 6-11 |
//! | E0-E7     | 35-42    | Horizontal slider contacts 0-7 |
//!
//! # Architecture
//!
//! All panel state lives in one [`FrontPanel`] behind a critical-section
//! mutex ([`SharedPanel`]). The tick task locks it once per millisecond;
//! the USB callbacks lock it briefly to forward host reports and
//! configuration changes. Reports leave the tick through non-blocking
//! endpoints and are written by one task per interface.
//!
//! # Modules
//!
//! - [`ports`]: Board ports over GPIO pins ([`BoardPorts`])
//! - [`usb_output`]: HID descriptors, endpoints and writer tasks
//! - [`usb_input`]: GUI OUT reports and USB state callbacks
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`startup-sequence`** (default): Light every LED for 20 s, then 2 s dark, before USB starts

#![no_std]

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

// Re-export core types for convenience
pub use panel_core::{
    FrontPanel, GpioPorts, HidEndpoint, HostCommand, KeyCode, Leds, OutputError, PanelConfig,
    PortId,
};

pub mod ports;
pub mod usb_input;
pub mod usb_output;

pub use ports::BoardPorts;
pub use usb_input::{LedRequestHandler, UsbStateHandler};
pub use usb_output::{KeyboardEndpoint, ReportSlot, SlotEndpoint};

/// USB vendor ID the host tools look for.
pub const USB_VID: u16 = 0x03EB;
/// USB product ID the host tools look for.
pub const USB_PID: u16 = 0x2133;

/// The panel as wired on this board.
pub type Panel = FrontPanel<BoardPorts, KeyboardEndpoint, SlotEndpoint, SlotEndpoint>;

/// Panel shared between the tick task and the USB callbacks.
pub type SharedPanel = Mutex<CriticalSectionRawMutex, RefCell<Panel>>;
