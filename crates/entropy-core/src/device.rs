//! Abstract byte source for refillers, plus the concrete serial adapter.
//!
//! Every device reader implements [`DeviceReader`], which frames a read with
//! a start-of-transfer and end-of-transfer sentinel the way the underlying
//! hardware protocol expects. The conditioning pipeline only ever consumes
//! the resulting bytes; it never depends on the framing mechanism.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{EntropyError, Result};

/// Sentinel written before a read begins.
pub const START_TRANSFER_CODE: u8 = b'^';
/// Sentinel written after a read completes.
pub const STOP_TRANSFER_CODE: u8 = b'$';

/// How long a freshly-opened serial device needs before its first read.
pub const DEVICE_RESTART_DELAY: Duration = Duration::from_millis(2000);

/// Abstract entropy device. One Refiller owns exactly one `DeviceReader`.
pub trait DeviceReader: Send {
    /// Read `n` bytes of fresh device material, framed with the start/stop
    /// sentinels. The returned buffer is exactly `n` bytes with the final
    /// byte null-terminated.
    fn read_chunk(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Human-readable identifier for logging (e.g. the serial port name).
    fn name(&self) -> &str;
}

/// Production adapter over a real serial port.
pub struct SerialDeviceReader {
    port_name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl SerialDeviceReader {
    /// Open `port_name` at `baud_rate`, configure 8N1 with no flow control
    /// and raw mode, wait for the device to settle, then flush any stale
    /// bytes sitting in the input buffer.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_secs(5))
            .open()
            .map_err(|e| EntropyError::DeviceFailure(format!("open {port_name}: {e}")))?;

        std::thread::sleep(DEVICE_RESTART_DELAY);

        let reader = Self {
            port_name: port_name.to_string(),
            port,
        };
        reader
            .port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| EntropyError::DeviceFailure(format!("flush {port_name}: {e}")))?;
        Ok(reader)
    }
}

impl DeviceReader for SerialDeviceReader {
    fn read_chunk(&mut self, n: usize) -> Result<Vec<u8>> {
        if n == 0 {
            return Err(EntropyError::InvalidArgument("read_chunk(0)".into()));
        }
        self.port
            .write_all(&[START_TRANSFER_CODE])
            .map_err(|e| EntropyError::DeviceFailure(e.to_string()))?;

        let mut buffer = vec![0u8; n];
        let mut used = 0;
        while used < n - 1 {
            let read = self
                .port
                .read(&mut buffer[used..n - 1])
                .map_err(|e| EntropyError::DeviceFailure(e.to_string()))?;
            if read == 0 {
                return Err(EntropyError::DeviceFailure(format!(
                    "{} closed mid-read",
                    self.port_name
                )));
            }
            used += read;
        }

        self.port
            .write_all(&[STOP_TRANSFER_CODE])
            .map_err(|e| EntropyError::DeviceFailure(e.to_string()))?;
        buffer[n - 1] = 0;
        Ok(buffer)
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

/// Deterministic test double: cycles through a fixed byte stream.
#[cfg(test)]
pub struct MockDeviceReader {
    name: String,
    data: Vec<u8>,
    offset: usize,
}

#[cfg(test)]
impl MockDeviceReader {
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            data,
            offset: 0,
        }
    }
}

#[cfg(test)]
impl DeviceReader for MockDeviceReader {
    fn read_chunk(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0u8; n];
        for slot in out.iter_mut().take(n - 1) {
            *slot = self.data[self.offset % self.data.len()];
            self.offset += 1;
        }
        out[n - 1] = 0;
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Test double that always fails, for exercising the device-failure path.
#[cfg(test)]
pub struct FailingDeviceReader {
    name: String,
}

#[cfg(test)]
impl FailingDeviceReader {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
impl DeviceReader for FailingDeviceReader {
    fn read_chunk(&mut self, _n: usize) -> Result<Vec<u8>> {
        Err(EntropyError::DeviceFailure(format!("{} unplugged", self.name)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_reader_produces_requested_length_and_terminates() {
        let mut reader = MockDeviceReader::new("mock0", b"abcdefg".to_vec());
        let chunk = reader.read_chunk(8).unwrap();
        assert_eq!(chunk.len(), 8);
        assert_eq!(chunk, b"abcdefg\0");
    }

    #[test]
    fn failing_reader_always_errors() {
        let mut reader = FailingDeviceReader::new("dead0");
        assert!(reader.read_chunk(8).is_err());
    }
}
