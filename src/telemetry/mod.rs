//! Wire format of the status reports leaving the device.
//!
//! Each [`StatusMessage`] travels as one postcard packet, COBS-framed and
//! terminated by a `0x00` byte.

pub mod types;

use postcard::to_slice_cobs;

use crate::error::Error;
use crate::types::StatusMessage;

pub use types::BatteryStatus;

/// Big enough for any encoded [`StatusMessage`], framing included.
pub const MAX_FRAME_LEN: usize = 8;

/// Encodes `msg` into `buf`, returning the frame including its terminator.
pub fn encode_frame<'b>(msg: &StatusMessage, buf: &'b mut [u8]) -> Result<&'b mut [u8], Error> {
    to_slice_cobs(msg, buf).map_err(|_| Error::Encode)
}

/// Decodes one frame in place. `frame` may or may not carry the terminator.
#[cfg(test)]
pub fn decode_frame(frame: &mut [u8]) -> Result<StatusMessage, Error> {
    postcard::from_bytes_cobs(frame).map_err(|_| Error::Decode)
}
