mod checksum;
mod icmpv4;
pub(crate) use icmpv4::{decode_reply, EchoRequest};
pub use icmpv4::{encode_request, ProtocolErrorKind, UnreachableCode, MAX_PAYLOAD_SIZE};

mod sequence_number;
pub(crate) use sequence_number::SequenceNumber;

mod socket;
pub(crate) use socket::raw_socket::RawSocket;
pub use socket::InterfaceBinding;
pub(crate) use socket::TSocket;

#[cfg(test)]
pub(crate) mod tests {
    pub(crate) use super::socket::tests::{MockReply, OnSend, SocketMock};
}
