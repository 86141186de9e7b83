//! Binary wire protocol spoken between clients and the signaling server.

mod codec;
mod constants;
mod errors;
mod framing;
mod msg;
mod msg_type;
mod types;

pub use codec::{decode_msg, encode_msg};
pub use constants::{MAX_BODY_LEN, PROTO_VERSION};
pub use errors::{FrameError, ProtoError};
pub use framing::{read_frame, write_frame};
pub use msg::Msg;
pub use msg_type::MsgType;
pub use types::{EnvelopeKind, ParticipantId, SignalingEnvelope};

use std::io::{Read, Write};

/// Reads one frame and decodes it into a [`Msg`].
pub fn read_msg<R: Read>(r: &mut R) -> Result<Msg, FrameError> {
    let (msg_type, body) = read_frame(r, MAX_BODY_LEN)?;
    Ok(decode_msg(msg_type, &body)?)
}

/// Encodes `msg` and writes it as one frame.
pub fn write_msg<W: Write>(w: &mut W, msg: &Msg) -> Result<(), FrameError> {
    let (msg_type, body) = encode_msg(msg)?;
    if body.len() > MAX_BODY_LEN {
        return Err(ProtoError::TooLarge.into());
    }
    write_frame(w, msg_type, &body)?;
    Ok(())
}
