use super::{EnvelopeKind, Msg, MsgType, ProtoError, SignalingEnvelope};
use std::str;

// ---- Encode to body bytes -------------------------------------------------

pub fn encode_msg(msg: &Msg) -> Result<(MsgType, Vec<u8>), ProtoError> {
    let mut body = Vec::new();

    let msg_type = match msg {
        Msg::Authenticate { identity, secret } => {
            put_str16(&mut body, identity)?;
            put_str16(&mut body, secret)?;
            MsgType::Authenticate
        }
        Msg::AuthOk { identity } => {
            put_str16(&mut body, identity)?;
            MsgType::AuthOk
        }
        Msg::AuthErr { code } => {
            put_u16(&mut body, *code);
            MsgType::AuthErr
        }
        Msg::Signal(env) => {
            put_str16(&mut body, &env.from)?;
            put_str16(&mut body, &env.to)?;
            put_blob32(&mut body, &env.payload)?;
            env.kind.msg_type()
        }
        Msg::Ping { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Ping
        }
        Msg::Pong { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Pong
        }
    };

    Ok((msg_type, body))
}

// ---- Decode from body bytes ----------------------------------------------

pub fn decode_msg(msg_type: MsgType, body: &[u8]) -> Result<Msg, ProtoError> {
    let mut cursor = Cursor::new(body);

    let msg = match msg_type {
        MsgType::Authenticate => {
            let identity = cursor.get_str16()?.to_owned();
            let secret = cursor.get_str16()?.to_owned();
            Msg::Authenticate { identity, secret }
        }
        MsgType::AuthOk => Msg::AuthOk {
            identity: cursor.get_str16()?.to_owned(),
        },
        MsgType::AuthErr => Msg::AuthErr {
            code: cursor.get_u16()?,
        },
        MsgType::Offer | MsgType::Answer | MsgType::IceCandidate => {
            let kind = EnvelopeKind::from_msg_type(msg_type)
                .ok_or(ProtoError::InvalidFormat("not an envelope type"))?;
            let from = cursor.get_str16()?.to_owned();
            let to = cursor.get_str16()?.to_owned();
            let payload = cursor.get_blob32()?.to_vec();
            Msg::Signal(SignalingEnvelope {
                kind,
                from,
                to,
                payload,
            })
        }
        MsgType::Ping => Msg::Ping {
            nonce: cursor.get_u64()?,
        },
        MsgType::Pong => Msg::Pong {
            nonce: cursor.get_u64()?,
        },
    };

    cursor.finish()?;
    Ok(msg)
}

// ---- Primitive write helpers ---------------------------------------------

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// str16 = u16 length + UTF-8 bytes
fn put_str16(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    let bytes = s.as_bytes();
    let len = u16::try_from(bytes.len()).map_err(|_| ProtoError::StringTooLong {
        max: u16::MAX as usize,
        actual: bytes.len(),
    })?;
    put_u16(buf, len);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// blob32 = u32 length + raw bytes
fn put_blob32(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ProtoError> {
    let len = u32::try_from(bytes.len()).map_err(|_| ProtoError::TooLarge)?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

// ---- Cursor for decoding --------------------------------------------------

#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtoError> {
        let bytes = self.get_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn get_u16(&mut self) -> Result<u16, ProtoError> {
        self.take::<2>().map(u16::from_be_bytes)
    }

    fn get_u32(&mut self) -> Result<u32, ProtoError> {
        self.take::<4>().map(u32::from_be_bytes)
    }

    fn get_u64(&mut self) -> Result<u64, ProtoError> {
        self.take::<8>().map(u64::from_be_bytes)
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtoError> {
        if self.buf.len() < len {
            return Err(ProtoError::Truncated);
        }
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    fn get_str16(&mut self) -> Result<&'a str, ProtoError> {
        let len = self.get_u16()? as usize;
        let bytes = self.get_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
    }

    fn get_blob32(&mut self) -> Result<&'a [u8], ProtoError> {
        let len = self.get_u32()? as usize;
        self.get_bytes(len)
    }

    /// The whole body must be consumed.
    fn finish(self) -> Result<(), ProtoError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(ProtoError::InvalidFormat("trailing bytes in message body"))
        }
    }
}
