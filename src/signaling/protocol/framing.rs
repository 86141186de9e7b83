use super::{FrameError, MsgType, PROTO_VERSION, ProtoError};
use std::io::{self, Read, Write};

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, msg_type: MsgType, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body too large"))?;
    let mut frame = Vec::with_capacity(8 + body.len());
    frame.push(PROTO_VERSION);
    frame.push(msg_type.as_u8());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(body);
    // One write per frame so a shared TLS stream never interleaves halves.
    w.write_all(&frame)?;
    w.flush()
}

/// Read a single frame, enforcing a max body length.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<(MsgType, Vec<u8>), FrameError> {
    let mut header = [0u8; 8];
    r.read_exact(&mut header)?;

    if header[0] != PROTO_VERSION {
        return Err(ProtoError::InvalidFormat("bad proto version").into());
    }
    let msg_type = MsgType::from_u8(header[1])?;

    // flags (header[2..4]) are reserved
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > max_body {
        return Err(ProtoError::TooLarge.into());
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;

    Ok((msg_type, body))
}
