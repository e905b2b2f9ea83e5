//! FTDI bit-bang transport over rusb.
//!
//! The relay board is an FT232-class bridge: a vendor control request puts
//! all pins into bit-bang output mode, after which every byte written to the
//! bulk OUT endpoint is latched straight onto the pins. Four of those pins
//! drive the relay channels.
//!
//! Transfers here are blocking with a bounded timeout, matching the board's
//! model of one confirmed byte per push. The timeout keeps a wedged device
//! from hanging a caller indefinitely; on timeout the caller sees an error
//! and the in-memory mask keeps the attempted value.

use std::time::Duration;

use rusb::{
    Context, Device, DeviceHandle, Direction, Recipient, RequestType, TransferType, UsbContext,
};
use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::traits::{RelayPort, RelayTransport};
use usbrelay_core::constants::TRANSFER_TIMEOUT_MS;

/// FTDI vendor ID used by the relay board's bridge chip.
pub const FTDI_VID: u16 = 0x0403;

/// FT232 product ID used by the relay board's bridge chip.
pub const FTDI_PID: u16 = 0x6001;

/// Vendor request: set bit mode.
const SIO_SET_BITMODE: u8 = 0x0B;

/// Bit mode selector for asynchronous bit-bang.
const BITMODE_BITBANG: u8 = 0x01;

/// Pin direction mask: all pins driven as outputs.
const ALL_PINS_OUTPUT: u8 = 0xFF;

/// One physical FTDI device found on the bus, not yet claimed.
///
/// Produced by [`FtdiPort::discover`]; consumed by binding. Holding a port
/// holds nothing on the device itself; another process can still claim it
/// until `bind` succeeds.
pub struct FtdiPort {
    context: Context,
    bus: u8,
    address: u8,
}

impl std::fmt::Debug for FtdiPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtdiPort")
            .field("bus", &self.bus)
            .field("address", &self.address)
            .finish()
    }
}

impl FtdiPort {
    /// Enumerate every matching bridge chip currently on the bus.
    ///
    /// # Errors
    ///
    /// Returns an error if the USB context cannot be created or the bus
    /// cannot be enumerated. Finding zero devices is not an error here;
    /// callers that require at least one board check the length.
    pub fn discover() -> Result<Vec<FtdiPort>> {
        let context = Context::new()?;
        let mut ports = Vec::new();

        for device in context.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(_) => continue,
            };
            if descriptor.vendor_id() == FTDI_VID && descriptor.product_id() == FTDI_PID {
                ports.push(FtdiPort {
                    context: context.clone(),
                    bus: device.bus_number(),
                    address: device.address(),
                });
            }
        }

        debug!(count = ports.len(), "enumerated relay bridge candidates");
        Ok(ports)
    }

    /// Bus number of the underlying device.
    #[must_use]
    pub fn bus(&self) -> u8 {
        self.bus
    }

    /// Device address on its bus.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    fn locate(&self) -> Result<Device<Context>> {
        for device in self.context.devices()?.iter() {
            if device.bus_number() == self.bus && device.address() == self.address {
                return Ok(device);
            }
        }
        Err(TransportError::NotFound {
            vid: FTDI_VID,
            pid: FTDI_PID,
        })
    }
}

impl RelayPort for FtdiPort {
    type Transport = FtdiBitbang;

    async fn bind(self) -> Result<FtdiBitbang> {
        let device = self.locate()?;
        let handle = device.open()?;

        // The ftdi_sio serial driver grabs the interface on most hosts;
        // ask libusb to shuffle it out of the way while we hold the claim.
        let _ = handle.set_auto_detach_kernel_driver(true);

        let config = device.config_descriptor(0)?;
        let (interface_number, bulk_out) = find_bulk_out(&config)?;
        handle.claim_interface(interface_number)?;

        debug!(
            bus = self.bus,
            address = self.address,
            interface = interface_number,
            endpoint = bulk_out,
            "bound relay bridge"
        );

        Ok(FtdiBitbang {
            handle,
            interface: interface_number,
            bulk_out,
            timeout: Duration::from_millis(TRANSFER_TIMEOUT_MS),
        })
    }
}

/// Scan a configuration for the first interface carrying a bulk OUT endpoint.
fn find_bulk_out(config: &rusb::ConfigDescriptor) -> Result<(u8, u8)> {
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.direction() == Direction::Out
                    && endpoint.transfer_type() == TransferType::Bulk
                {
                    return Ok((descriptor.interface_number(), endpoint.address()));
                }
            }
        }
    }
    Err(TransportError::NoBulkOutEndpoint)
}

/// A claimed FTDI bridge in bit-bang mode.
///
/// Owns the USB handle exclusively for the lifetime of the device instance;
/// dropping it closes the handle and releases the claimed interface.
pub struct FtdiBitbang {
    handle: DeviceHandle<Context>,
    interface: u8,
    bulk_out: u8,
    timeout: Duration,
}

impl std::fmt::Debug for FtdiBitbang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtdiBitbang")
            .field("interface", &self.interface)
            .field("bulk_out", &self.bulk_out)
            .finish()
    }
}

impl RelayTransport for FtdiBitbang {
    async fn configure_output_mode(&mut self) -> Result<()> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);

        // Direction mask rides in the high byte, mode selector in the low
        // byte. The opposite ordering silently leaves the pins as inputs on
        // this chip family; confirm against real hardware before changing.
        let value = u16::from(ALL_PINS_OUTPUT) << 8 | u16::from(BITMODE_BITBANG);

        self.handle
            .write_control(
                request_type,
                SIO_SET_BITMODE,
                value,
                u16::from(self.interface),
                &[],
                self.timeout,
            )
            .map_err(|err| match err {
                rusb::Error::Timeout => TransportError::Timeout {
                    duration_ms: TRANSFER_TIMEOUT_MS,
                },
                other => TransportError::configuration(other.to_string()),
            })?;

        debug!(interface = self.interface, "bit-bang output mode configured");
        Ok(())
    }

    async fn push(&mut self, byte: u8) -> Result<()> {
        let written = self.handle.write_bulk(self.bulk_out, &[byte], self.timeout)?;
        if written != 1 {
            return Err(TransportError::ShortWrite {
                written,
                expected: 1,
            });
        }
        trace!(byte, "pushed state byte");
        Ok(())
    }
}
