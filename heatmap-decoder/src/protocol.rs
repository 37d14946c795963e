//! UART frame decoder
//!
//! Reassembles the sensor byte stream into readings. The wire format has no
//! delimiter and no checksum: every frame is `ADDRESS, LOW, HIGH`, where the
//! address is one of `0xF0..=0xF3` and `LOW | HIGH << 8` is a signed 16-bit
//! temperature in tenths of a degree Celsius.
//!
//! Synchronisation only happens while waiting for an address: any byte that is
//! not a known address is dropped. Once an address has been accepted the next
//! two bytes are payload, whatever their value, so an address-valued byte in
//! the middle of a frame is never treated as the start of a new frame.

use crate::types::{SensorReading, SENSOR_COUNT};
use byteorder::{ByteOrder, LittleEndian};

/// Wire address of each sensor, in index order
pub const SENSOR_ADDRESSES: [u8; SENSOR_COUNT] = [0xF0, 0xF1, 0xF2, 0xF3];

/// Bytes per frame on the wire
pub const FRAME_LEN: usize = 3;

/// Wire value units per degree Celsius
const TENTHS_PER_DEGREE: f64 = 10.0;

/// Map a wire address byte to its sensor index
pub fn address_to_index(address: u8) -> Option<usize> {
    SENSOR_ADDRESSES.iter().position(|&a| a == address)
}

/// Map a sensor index to its wire address byte
pub fn index_to_address(index: usize) -> Option<u8> {
    SENSOR_ADDRESSES.get(index).copied()
}

/// Decode a little-endian signed payload into °C
pub fn decode_temperature(low: u8, high: u8) -> f64 {
    f64::from(LittleEndian::read_i16(&[low, high])) / TENTHS_PER_DEGREE
}

/// Encode one reading into its 3-byte wire form
///
/// The temperature is rounded to tenths and saturates at the i16 range.
/// Returns `None` for an unknown sensor index.
pub fn encode_frame(index: usize, temperature: f64) -> Option<[u8; FRAME_LEN]> {
    let address = index_to_address(index)?;
    let tenths = (temperature * TENTHS_PER_DEGREE)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;

    let mut payload = [0u8; 2];
    LittleEndian::write_i16(&mut payload, tenths);
    Some([address, payload[0], payload[1]])
}

/// Decoder position within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Scanning for a known address byte
    AwaitingAddress,
    /// Address accepted, next byte is the low payload byte
    AwaitingLow { address: u8 },
    /// Low byte buffered, next byte completes the frame
    AwaitingHigh { address: u8, low: u8 },
}

/// Counters maintained by the decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Total bytes pushed through the decoder
    pub bytes_consumed: u64,
    /// Frames completed and emitted
    pub frames_decoded: u64,
    /// Bytes dropped while awaiting an address
    pub bytes_discarded: u64,
}

/// Byte-at-a-time frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecoderState,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::AwaitingAddress,
            stats: DecoderStats::default(),
        }
    }

    /// Current position within a frame
    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Consume one byte, returning a reading when it completes a frame
    pub fn push(&mut self, byte: u8) -> Option<SensorReading> {
        self.stats.bytes_consumed += 1;

        match self.state {
            DecoderState::AwaitingAddress => {
                if address_to_index(byte).is_some() {
                    self.state = DecoderState::AwaitingLow { address: byte };
                } else {
                    self.stats.bytes_discarded += 1;
                    log::trace!("Discarding byte 0x{:02X} while awaiting address", byte);
                }
                None
            }
            DecoderState::AwaitingLow { address } => {
                self.state = DecoderState::AwaitingHigh { address, low: byte };
                None
            }
            DecoderState::AwaitingHigh { address, low } => {
                self.state = DecoderState::AwaitingAddress;

                // Only known addresses ever leave AwaitingAddress
                let index = address_to_index(address)?;
                let temperature = decode_temperature(low, byte);
                self.stats.frames_decoded += 1;
                log::debug!(
                    "Frame: sensor {} (addr=0x{:02X}) -> {:.1} °C",
                    index,
                    address,
                    temperature
                );
                Some(SensorReading::new(index, temperature))
            }
        }
    }

    /// Feed a chunk of bytes, returning an iterator over completed readings
    ///
    /// Chunks may split frames anywhere; partial frames carry over to the
    /// next call.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = SensorReading> + 'a {
        bytes.iter().filter_map(move |&b| self.push(b))
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        self.state = DecoderState::AwaitingAddress;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<SensorReading> {
        let mut decoder = FrameDecoder::new();
        decoder.feed(bytes).collect()
    }

    #[test]
    fn test_simple_frame() {
        let readings = decode_all(&[0xF1, 0x64, 0x00]);
        assert_eq!(readings, vec![SensorReading::new(1, 10.0)]);
    }

    #[test]
    fn test_negative_extreme() {
        // raw 0x8000 is -32768 tenths
        let readings = decode_all(&[0xF0, 0x00, 0x80]);
        assert_eq!(readings, vec![SensorReading::new(0, -3276.8)]);
    }

    #[test]
    fn test_small_negative() {
        // 0xFFF6 = -10 tenths
        let readings = decode_all(&[0xF3, 0xF6, 0xFF]);
        assert_eq!(readings, vec![SensorReading::new(3, -1.0)]);
    }

    #[test]
    fn test_address_byte_as_payload() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(0xF0), None);
        assert_eq!(decoder.push(0xF1), None);
        assert_eq!(
            decoder.state(),
            DecoderState::AwaitingHigh { address: 0xF0, low: 0xF1 }
        );
        let reading = decoder.push(0x00);
        assert_eq!(reading, Some(SensorReading::new(0, 24.1)));
        assert_eq!(decoder.state(), DecoderState::AwaitingAddress);
        assert_eq!(decoder.stats().frames_decoded, 1);
    }

    #[test]
    fn test_noise_never_leaves_awaiting_address() {
        let noise: Vec<u8> = (0u8..=255)
            .filter(|b| address_to_index(*b).is_none())
            .rev()
            .collect();

        let mut decoder = FrameDecoder::new();
        for &b in &noise {
            assert_eq!(decoder.push(b), None);
            assert_eq!(decoder.state(), DecoderState::AwaitingAddress);
        }
        assert_eq!(decoder.stats().bytes_discarded, noise.len() as u64);
        assert_eq!(decoder.stats().frames_decoded, 0);
    }

    #[test]
    fn test_resync_after_noise() {
        let bytes = [0x00, 0x13, 0x37, 0xF2, 0xC8, 0x00, 0xAA, 0xF3, 0x2C, 0x01];
        let readings = decode_all(&bytes);
        assert_eq!(
            readings,
            vec![SensorReading::new(2, 20.0), SensorReading::new(3, 30.0)]
        );
    }

    #[test]
    fn test_arbitrary_chunking() {
        let stream = [0xF0, 0xC8, 0x00, 0xF1, 0xD2, 0x00, 0xF2, 0xDC, 0x00];
        let expected = decode_all(&stream);

        for split in 0..=stream.len() {
            let mut decoder = FrameDecoder::new();
            let (a, b) = stream.split_at(split);
            let mut readings: Vec<_> = decoder.feed(a).collect();
            readings.extend(decoder.feed(&[]));
            readings.extend(decoder.feed(b));
            assert_eq!(readings, expected, "split at {}", split);
        }
        assert_eq!(expected.len(), 3);
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(0xF2);
        decoder.push(0x10);
        decoder.reset();
        assert_eq!(decoder.state(), DecoderState::AwaitingAddress);
        assert_eq!(decoder.push(0x00), None);
    }

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame(1, 10.0), Some([0xF1, 0x64, 0x00]));
        assert_eq!(encode_frame(0, -3276.8), Some([0xF0, 0x00, 0x80]));
        assert_eq!(encode_frame(2, 1.0e9), Some([0xF2, 0xFF, 0x7F]));
        assert_eq!(encode_frame(4, 20.0), None);

        let frame = encode_frame(3, -12.3).unwrap();
        assert_eq!(decode_all(&frame), vec![SensorReading::new(3, -12.3)]);
    }
}
