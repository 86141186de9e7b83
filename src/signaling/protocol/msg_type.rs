use crate::signaling::protocol::ProtoError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MsgType {
    Authenticate = 0x01,
    AuthOk = 0x02,
    AuthErr = 0x03,

    Offer = 0x20,
    Answer = 0x21,
    IceCandidate = 0x22,

    Ping = 0x30,
    Pong = 0x31,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Result<MsgType, ProtoError> {
        use MsgType::*;
        match v {
            0x01 => Ok(Authenticate),
            0x02 => Ok(AuthOk),
            0x03 => Ok(AuthErr),
            0x20 => Ok(Offer),
            0x21 => Ok(Answer),
            0x22 => Ok(IceCandidate),
            0x30 => Ok(Ping),
            0x31 => Ok(Pong),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
