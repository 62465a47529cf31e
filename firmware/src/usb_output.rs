//! USB HID interfaces: descriptors, endpoints and writer tasks.
//!
//! The panel core queues reports through [`HidEndpoint`] from the 1 ms tick.
//! Each interface has a writer task that owns the embassy-usb [`HidWriter`]
//! and drains what the tick queued.

use defmt::{error, warn, Format};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{
    Config, HidBootProtocol, HidReaderWriter, HidSubclass, HidWriter, RequestHandler, State,
};
use embassy_usb::Builder;
use heapless::Vec;
use panel_core::report::KEYBOARD_REPORT_SIZE;
use panel_core::{GuiReport, HidEndpoint, JoystickReport, OutputError};
use portable_atomic::{AtomicBool, Ordering};
use usbd_hid::descriptor::{KeyboardReport, SerializedDescriptor};

/// USB driver type of this board.
pub type UsbDriver = Driver<'static, USB>;

/// Largest report any interface sends.
pub const MAX_REPORT_SIZE: usize = 8;

/// Keyboard reports that may wait for the keyboard writer.
const KEYBOARD_QUEUE: usize = 4;

/// Joystick: X and Y, 0-255 each, 128 at rest.
pub const JOYSTICK_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x00, //     Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0xC0, //   End Collection
    0xC0, // End Collection
];

/// GUI: 7-byte vendor input report, 2-byte vendor output report.
pub const GUI_DESCRIPTOR: &[u8] = &[
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01, // Usage (Vendor 1)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    //
    // --- Diagnostic stream ---
    0x09, 0x02, //   Usage (Vendor 2)
    0x95, GuiReport::SIZE as u8, // Report Count (7)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Host commands / LED writes ---
    0x09, 0x03, //   Usage (Vendor 3)
    0x95, panel_core::command::MAX_REPORT_LENGTH as u8, // Report Count (2)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Hand-off between the tick and a writer task for one report in flight.
///
/// `busy` is set when the tick queues a report and cleared by the writer
/// once the transfer completes.
pub struct ReportSlot {
    busy: AtomicBool,
    report: Signal<CriticalSectionRawMutex, Vec<u8, MAX_REPORT_SIZE>>,
}

impl ReportSlot {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            report: Signal::new(),
        }
    }
}

impl Default for ReportSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Set while the device is configured by the host.
pub static CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Single-report endpoint for the joystick and GUI interfaces.
#[derive(Clone, Copy)]
pub struct SlotEndpoint {
    slot: &'static ReportSlot,
}

impl SlotEndpoint {
    pub const fn new(slot: &'static ReportSlot) -> Self {
        Self { slot }
    }
}

impl HidEndpoint for SlotEndpoint {
    fn try_send(&mut self, report: &[u8]) -> Result<(), OutputError> {
        if !CONFIGURED.load(Ordering::Relaxed) {
            return Err(OutputError::NotReady);
        }
        let report = Vec::from_slice(report).map_err(|_| OutputError::Dropped)?;
        if self.slot.busy.swap(true, Ordering::AcqRel) {
            return Err(OutputError::Busy);
        }
        self.slot.report.signal(report);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        CONFIGURED.load(Ordering::Relaxed) && !self.slot.busy.load(Ordering::Acquire)
    }
}

/// Queue of pending keyboard reports.
pub type KeyboardQueue = Channel<CriticalSectionRawMutex, [u8; KEYBOARD_REPORT_SIZE], KEYBOARD_QUEUE>;

/// Queued keyboard endpoint, so the down and up reports of one click are
/// never split by a busy endpoint.
#[derive(Clone, Copy)]
pub struct KeyboardEndpoint {
    queue: &'static KeyboardQueue,
}

impl KeyboardEndpoint {
    pub const fn new(queue: &'static KeyboardQueue) -> Self {
        Self { queue }
    }
}

impl HidEndpoint for KeyboardEndpoint {
    fn try_send(&mut self, report: &[u8]) -> Result<(), OutputError> {
        if !CONFIGURED.load(Ordering::Relaxed) {
            return Err(OutputError::NotReady);
        }
        let report: [u8; KEYBOARD_REPORT_SIZE] =
            report.try_into().map_err(|_| OutputError::Dropped)?;
        self.queue.try_send(report).map_err(|_| OutputError::Busy)
    }

    fn is_ready(&self) -> bool {
        CONFIGURED.load(Ordering::Relaxed) && !self.queue.is_full()
    }
}

/// Which interface a writer task serves, for logging.
#[derive(Clone, Copy, Debug, Format)]
pub enum Interface {
    Keyboard,
    Joystick,
    Gui,
}

/// Drain a report slot into its HID writer.
pub async fn run_slot_writer<const N: usize>(
    interface: Interface,
    mut writer: HidWriter<'static, UsbDriver, N>,
    slot: &'static ReportSlot,
) -> ! {
    loop {
        let report = slot.report.wait().await;
        if let Err(e) = writer.write(&report).await {
            warn!("{} report failed: {:?}", interface, e);
        }
        slot.busy.store(false, Ordering::Release);
    }
}

/// Drain the keyboard queue into the keyboard HID writer.
///
/// Queued reports already use the boot layout of [`KeyboardReport`].
pub async fn run_keyboard_writer(
    mut writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>,
    queue: &'static KeyboardQueue,
) -> ! {
    loop {
        let report = queue.receive().await;
        if let Err(e) = writer.write(&report).await {
            error!("{} report failed: {:?}", Interface::Keyboard, e);
        }
    }
}

fn hid_config<'d>(
    report_descriptor: &'d [u8],
    request_handler: Option<&'d mut dyn RequestHandler>,
    max_packet_size: u16,
    hid_subclass: HidSubclass,
    hid_boot_protocol: HidBootProtocol,
) -> Config<'d> {
    Config {
        report_descriptor,
        request_handler,
        poll_ms: 1,
        max_packet_size,
        hid_subclass,
        hid_boot_protocol,
    }
}

/// Interface 0: boot keyboard.
pub fn configure_keyboard(
    builder: &mut Builder<'static, UsbDriver>,
    state: &'static mut State<'static>,
) -> HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE> {
    let config = hid_config(
        KeyboardReport::desc(),
        None,
        8,
        HidSubclass::Boot,
        HidBootProtocol::Keyboard,
    );
    HidWriter::new(builder, state, config)
}

/// Interface 1: two-axis joystick.
pub fn configure_joystick(
    builder: &mut Builder<'static, UsbDriver>,
    state: &'static mut State<'static>,
) -> HidWriter<'static, UsbDriver, { JoystickReport::SIZE }> {
    let config = hid_config(
        JOYSTICK_DESCRIPTOR,
        None,
        8,
        HidSubclass::No,
        HidBootProtocol::None,
    );
    HidWriter::new(builder, state, config)
}

/// Interface 2: vendor GUI interface, IN diagnostic stream plus OUT commands.
///
/// `request_handler` serves SET_REPORT on the control pipe; the returned
/// reader serves the interrupt OUT endpoint.
pub fn configure_gui(
    builder: &mut Builder<'static, UsbDriver>,
    state: &'static mut State<'static>,
    request_handler: &'static mut dyn RequestHandler,
) -> HidReaderWriter<'static, UsbDriver, { panel_core::command::MAX_REPORT_LENGTH }, { GuiReport::SIZE }>
{
    let config = hid_config(
        GUI_DESCRIPTOR,
        Some(request_handler),
        8,
        HidSubclass::No,
        HidBootProtocol::None,
    );
    HidReaderWriter::new(builder, state, config)
}
