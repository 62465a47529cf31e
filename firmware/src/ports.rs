//! Board GPIO ports over RP2350 pins.
//!
//! The panel logic addresses six 8-bit ports. Each port bit is backed by one
//! [`Flex`] pin, attached at startup; bits without a pin read low and ignore
//! writes.

use embassy_rp::gpio::{Flex, Level, Pull};
use panel_core::{Direction, GpioPorts, PortId};

const PORTS: usize = PortId::ALL.len();

/// The board's ports, one optional pin per bit.
pub struct BoardPorts {
    pins: [[Option<Flex<'static>>; 8]; PORTS],
}

impl BoardPorts {
    /// Create a board with no pins attached.
    pub fn new() -> Self {
        Self {
            pins: core::array::from_fn(|_| core::array::from_fn(|_| None)),
        }
    }

    /// Back `port` bit `bit` with `pin`.
    pub fn attach(&mut self, port: PortId, bit: u8, pin: Flex<'static>) {
        if let Some(slot) = self.pins[port.index()].get_mut(bit as usize) {
            *slot = Some(pin);
        }
    }

    fn masked(
        &mut self,
        port: PortId,
        mask: u8,
    ) -> impl Iterator<Item = (u8, &mut Flex<'static>)> + '_ {
        self.pins[port.index()]
            .iter_mut()
            .enumerate()
            .filter(move |(bit, _)| mask & (1 << bit) != 0)
            .filter_map(|(bit, pin)| pin.as_mut().map(|pin| (1u8 << bit, pin)))
    }
}

impl Default for BoardPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPorts for BoardPorts {
    fn read_port(&mut self, port: PortId) -> u8 {
        self.masked(port, 0xFF)
            .filter(|(_, pin)| pin.is_high())
            .fold(0, |value, (bit, _)| value | bit)
    }

    fn write_port(&mut self, port: PortId, mask: u8, value: u8) {
        for (bit, pin) in self.masked(port, mask) {
            pin.set_level(if value & bit != 0 { Level::High } else { Level::Low });
        }
    }

    fn set_direction(&mut self, port: PortId, mask: u8, direction: Direction) {
        for (_, pin) in self.masked(port, mask) {
            match direction {
                Direction::Output => {
                    pin.set_pull(Pull::None);
                    pin.set_as_output();
                }
                Direction::InputPullUp => {
                    pin.set_pull(Pull::Up);
                    pin.set_as_input();
                }
            }
        }
    }
}
