use crate::signaling::protocol::Msg;

/// Commands issued by the application into the signaling client's writer.
#[derive(Debug)]
pub enum SignalingCommand {
    Send(Msg),
    Disconnect,
}
