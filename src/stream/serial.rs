//! Serial port transport.

use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::debug;

use crate::Result;

/// Open the serial device at `path` and discard anything already buffered.
pub fn open(path: &str, baud_rate: u32) -> Result<SerialStream> {
    let port = tokio_serial::new(path, baud_rate).open_native_async()?;
    port.clear(ClearBuffer::All)?;
    debug!(path, baud_rate, "serial port opened");
    Ok(port)
}
