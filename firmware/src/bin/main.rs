#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Flex;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::{HidReader, HidWriter, State};
use embassy_usb::{Builder, Config as UsbConfig};
use front_panel::usb_output::{
    configure_gui, configure_joystick, configure_keyboard, run_keyboard_writer, run_slot_writer,
    Interface, KeyboardQueue, UsbDriver,
};
use front_panel::{
    BoardPorts, KeyboardEndpoint, LedRequestHandler, Panel, PanelConfig, PortId, ReportSlot,
    SharedPanel, SlotEndpoint, UsbStateHandler, USB_PID, USB_VID,
};
use panel_core::command::MAX_REPORT_LENGTH;
use panel_core::report::KEYBOARD_REPORT_SIZE;
use panel_core::{GuiReport, JoystickReport};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

/// Boot block telling the RP2350 bootrom how to start this image.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: embassy_rp::block::ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Report hand-off between the tick and the writer tasks.
static KEYBOARD_QUEUE: KeyboardQueue = KeyboardQueue::new();
static JOYSTICK_SLOT: ReportSlot = ReportSlot::new();
static GUI_SLOT: ReportSlot = ReportSlot::new();

static PANEL: StaticCell<SharedPanel> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state, one per interface.
static KEYBOARD_STATE: StaticCell<State> = StaticCell::new();
static JOYSTICK_STATE: StaticCell<State> = StaticCell::new();
static GUI_STATE: StaticCell<State> = StaticCell::new();

static GUI_CONTROL_HANDLER: StaticCell<LedRequestHandler> = StaticCell::new();
static USB_STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Front panel starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Board ports ---
    let mut ports = BoardPorts::new();
    macro_rules! wire {
        ($($port:ident $bit:literal => $pin:ident),* $(,)?) => {
            $( ports.attach(PortId::$port, $bit, Flex::new(p.$pin)); )*
        };
    }
    wire! {
        A 0 => PIN_0, A 1 => PIN_1, A 2 => PIN_2, A 3 => PIN_3,
        A 4 => PIN_4, A 5 => PIN_5, A 6 => PIN_6, A 7 => PIN_7,
        F 0 => PIN_8, F 1 => PIN_9, F 2 => PIN_10, F 3 => PIN_11,
        F 4 => PIN_12, F 5 => PIN_13, F 6 => PIN_14, F 7 => PIN_15,
        B 0 => PIN_16, B 1 => PIN_17, B 2 => PIN_18, B 3 => PIN_19,
        B 4 => PIN_20, B 6 => PIN_21, B 7 => PIN_22,
        C 2 => PIN_23, C 3 => PIN_24, C 4 => PIN_25, C 5 => PIN_26,
        C 6 => PIN_27, C 7 => PIN_28,
        D 0 => PIN_29, D 1 => PIN_30, D 2 => PIN_31, D 3 => PIN_32,
        D 4 => PIN_33, D 5 => PIN_34,
        E 0 => PIN_35, E 1 => PIN_36, E 2 => PIN_37, E 3 => PIN_38,
        E 4 => PIN_39, E 5 => PIN_40, E 6 => PIN_41, E 7 => PIN_42,
    }

    // --- Panel ---
    let mut panel: Panel = Panel::new(
        ports,
        KeyboardEndpoint::new(&KEYBOARD_QUEUE),
        SlotEndpoint::new(&JOYSTICK_SLOT),
        SlotEndpoint::new(&GUI_SLOT),
        PanelConfig::DEFAULT,
    );

    #[cfg(feature = "startup-sequence")]
    {
        info!("Running startup sequence...");
        panel.boot(&mut embassy_time::Delay);
    }
    #[cfg(not(feature = "startup-sequence"))]
    panel.init();

    let panel: &'static SharedPanel = PANEL.init(Mutex::new(RefCell::new(panel)));

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some("EVI");
    usb_config.product = Some("Front Panel");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    builder.handler(USB_STATE_HANDLER.init(UsbStateHandler::new(panel)));

    // Interface order is fixed: keyboard 0, joystick 1, GUI 2.
    let keyboard_writer = configure_keyboard(&mut builder, KEYBOARD_STATE.init(State::new()));
    let joystick_writer = configure_joystick(&mut builder, JOYSTICK_STATE.init(State::new()));
    let gui = configure_gui(
        &mut builder,
        GUI_STATE.init(State::new()),
        GUI_CONTROL_HANDLER.init(LedRequestHandler::new(panel)),
    );
    let (gui_reader, gui_writer) = gui.split();

    // Build the USB device
    let usb_device = builder.build();

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(keyboard_task(keyboard_writer).unwrap());
    spawner.spawn(joystick_task(joystick_writer).unwrap());
    spawner.spawn(gui_task(gui_writer).unwrap());
    spawner.spawn(gui_out_task(gui_reader, LedRequestHandler::new(panel)).unwrap());
    spawner.spawn(tick_task(panel).unwrap());

    info!("Front panel initialized");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

#[embassy_executor::task]
async fn keyboard_task(writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>) {
    run_keyboard_writer(writer, &KEYBOARD_QUEUE).await
}

#[embassy_executor::task]
async fn joystick_task(writer: HidWriter<'static, UsbDriver, { JoystickReport::SIZE }>) {
    run_slot_writer(Interface::Joystick, writer, &JOYSTICK_SLOT).await
}

#[embassy_executor::task]
async fn gui_task(writer: HidWriter<'static, UsbDriver, { GuiReport::SIZE }>) {
    run_slot_writer(Interface::Gui, writer, &GUI_SLOT).await
}

/// GUI OUT endpoint - host LED writes and commands.
#[embassy_executor::task]
async fn gui_out_task(
    reader: HidReader<'static, UsbDriver, MAX_REPORT_LENGTH>,
    mut handler: LedRequestHandler,
) {
    reader.run(false, &mut handler).await
}

/// Tick task - runs the panel pipeline once per millisecond.
#[embassy_executor::task]
async fn tick_task(panel: &'static SharedPanel) {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        panel.lock(|panel| panel.borrow_mut().tick());
        ticker.next().await;
    }
}
