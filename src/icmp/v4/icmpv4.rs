use super::checksum;
use super::SequenceNumber;
use crate::{PingError, PingResult, Ttl};
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket, echo_request::MutableEchoRequestPacket, IcmpCode, IcmpPacket, IcmpTypes,
};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use std::fmt;
use std::net::Ipv4Addr;

pub const ICMP_HEADER_SIZE: usize = 8;
pub const IPV4_HEADER_SIZE: usize = 20;
/// Largest echo payload that fits into a single IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - IPV4_HEADER_SIZE - ICMP_HEADER_SIZE;

const PAYLOAD_FILLER: u8 = b'Q';

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct EchoRequest {
    identifier: u16,
    sequence: SequenceNumber,
    payload_size: usize,
}

impl EchoRequest {
    pub(crate) fn new(identifier: u16, sequence: SequenceNumber, payload_size: usize) -> PingResult<Self> {
        if payload_size > MAX_PAYLOAD_SIZE {
            return Err(PingError::InvalidSize { size: payload_size, max: MAX_PAYLOAD_SIZE });
        }
        Ok(EchoRequest { identifier, sequence, payload_size })
    }

    pub(crate) fn identifier(&self) -> u16 {
        self.identifier
    }

    pub(crate) fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub(crate) fn encode(&self) -> PingResult<Vec<u8>> {
        let mut buf = vec![PAYLOAD_FILLER; ICMP_HEADER_SIZE + self.payload_size];
        {
            let mut package = MutableEchoRequestPacket::new(&mut buf)
                .ok_or(PingError::InvalidSize { size: self.payload_size, max: MAX_PAYLOAD_SIZE })?;
            package.set_icmp_type(IcmpTypes::EchoRequest);
            package.set_icmp_code(IcmpCode::new(0));
            package.set_checksum(0_u16);
            package.set_identifier(self.identifier);
            package.set_sequence_number(self.sequence.into());
        }
        let checksum = checksum::checksum(&buf);
        buf[2..4].copy_from_slice(&checksum.to_be_bytes());
        Ok(buf)
    }
}

/// Encodes an echo request: ICMP header followed by `payload_size` filler bytes.
pub fn encode_request(identifier: u16, sequence: u16, payload_size: usize) -> PingResult<Vec<u8>> {
    EchoRequest::new(identifier, sequence.into(), payload_size)?.encode()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ReplyKind {
    EchoReply,
    DestinationUnreachable,
    SourceQuench,
    Redirect,
    TimeExceeded,
    ParameterProblem,
}

/// An inbound echo reply, or an ICMP error message that embeds one of our echo requests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct EchoReply {
    pub kind: ReplyKind,
    pub code: u8,
    pub identifier: u16,
    pub sequence: SequenceNumber,
    pub ttl: Ttl,
    pub source: Ipv4Addr,
}

impl EchoReply {
    /// `None` for a plain echo reply.
    pub(crate) fn protocol_error(&self) -> Option<ProtocolErrorKind> {
        match self.kind {
            ReplyKind::EchoReply => None,
            ReplyKind::DestinationUnreachable => {
                Some(ProtocolErrorKind::DestinationUnreachable { code: UnreachableCode::from(self.code) })
            }
            ReplyKind::TimeExceeded if self.code == 0 => Some(ProtocolErrorKind::TimeToLiveExpired),
            ReplyKind::SourceQuench | ReplyKind::Redirect | ReplyKind::TimeExceeded | ReplyKind::ParameterProblem => {
                Some(ProtocolErrorKind::Other { icmp_type: self.kind.icmp_type(), code: self.code })
            }
        }
    }
}

impl ReplyKind {
    fn icmp_type(self) -> u8 {
        match self {
            ReplyKind::EchoReply => IcmpTypes::EchoReply.0,
            ReplyKind::DestinationUnreachable => IcmpTypes::DestinationUnreachable.0,
            ReplyKind::SourceQuench => IcmpTypes::SourceQuench.0,
            ReplyKind::Redirect => IcmpTypes::RedirectMessage.0,
            ReplyKind::TimeExceeded => IcmpTypes::TimeExceeded.0,
            ReplyKind::ParameterProblem => IcmpTypes::ParameterProblem.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum DecodeError {
    #[error("malformed datagram: {0}")]
    Malformed(&'static str),
    #[error("echo reply with bad checksum")]
    BadChecksum,
    #[error("unrelated ICMP message of type {0}")]
    Unrelated(u8),
}

/// Decodes a datagram read from a raw ICMPv4 socket, IPv4 header included.
pub(crate) fn decode_reply(raw: &[u8]) -> Result<EchoReply, DecodeError> {
    let (ip_packet, icmp) = split_ipv4(raw)?;
    let icmp_packet = IcmpPacket::new(icmp).ok_or(DecodeError::Malformed("shorter than an ICMP header"))?;
    let icmp_type = icmp_packet.get_icmp_type();
    let kind = match icmp_type {
        IcmpTypes::EchoReply => ReplyKind::EchoReply,
        IcmpTypes::DestinationUnreachable => ReplyKind::DestinationUnreachable,
        IcmpTypes::SourceQuench => ReplyKind::SourceQuench,
        IcmpTypes::RedirectMessage => ReplyKind::Redirect,
        IcmpTypes::TimeExceeded => ReplyKind::TimeExceeded,
        IcmpTypes::ParameterProblem => ReplyKind::ParameterProblem,
        other => return Err(DecodeError::Unrelated(other.0)),
    };

    let (identifier, sequence) = if kind == ReplyKind::EchoReply {
        // Error messages carry arbitrary embedded data and are not verified here.
        if !checksum::is_valid(icmp) {
            return Err(DecodeError::BadChecksum);
        }
        let echo_reply = EchoReplyPacket::new(icmp).ok_or(DecodeError::Malformed("truncated echo reply"))?;
        (echo_reply.get_identifier(), echo_reply.get_sequence_number())
    } else {
        embedded_echo_request(icmp, icmp_type.0)?
    };

    Ok(EchoReply {
        kind,
        code: icmp_packet.get_icmp_code().0,
        identifier,
        sequence: sequence.into(),
        ttl: Ttl(ip_packet.get_ttl()),
        source: ip_packet.get_source(),
    })
}

/// Splits at the variable-length IPv4 header (IHL × 4 bytes).
fn split_ipv4(raw: &[u8]) -> Result<(Ipv4Packet<'_>, &[u8]), DecodeError> {
    let ip_packet = Ipv4Packet::new(raw).ok_or(DecodeError::Malformed("shorter than an IPv4 header"))?;
    let header_len = usize::from(ip_packet.get_header_length()) * 4;
    if header_len < IPV4_HEADER_SIZE {
        return Err(DecodeError::Malformed("IPv4 header length below minimum"));
    }
    let icmp = raw
        .get(header_len..)
        .filter(|icmp| icmp.len() >= ICMP_HEADER_SIZE)
        .ok_or(DecodeError::Malformed("shorter than an ICMP header"))?;
    Ok((ip_packet, icmp))
}

fn embedded_echo_request(icmp: &[u8], icmp_type: u8) -> Result<(u16, u16), DecodeError> {
    let (original_ip, original_icmp) = split_ipv4(&icmp[ICMP_HEADER_SIZE..])?;
    if original_ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp
        || original_icmp[0] != IcmpTypes::EchoRequest.0
    {
        return Err(DecodeError::Unrelated(icmp_type));
    }
    Ok((
        u16::from_be_bytes([original_icmp[4], original_icmp[5]]),
        u16::from_be_bytes([original_icmp[6], original_icmp[7]]),
    ))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnreachableCode {
    Network,
    Host,
    Protocol,
    Port,
    FragmentationNeeded,
    SourceRouteFailed,
    Other(u8),
}

impl From<u8> for UnreachableCode {
    fn from(code: u8) -> Self {
        match code {
            0 => UnreachableCode::Network,
            1 => UnreachableCode::Host,
            2 => UnreachableCode::Protocol,
            3 => UnreachableCode::Port,
            4 => UnreachableCode::FragmentationNeeded,
            5 => UnreachableCode::SourceRouteFailed,
            other => UnreachableCode::Other(other),
        }
    }
}

impl fmt::Display for UnreachableCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableCode::Network => write!(f, "network unreachable"),
            UnreachableCode::Host => write!(f, "host unreachable"),
            UnreachableCode::Protocol => write!(f, "protocol unreachable"),
            UnreachableCode::Port => write!(f, "port unreachable"),
            UnreachableCode::FragmentationNeeded => write!(f, "fragmentation needed"),
            UnreachableCode::SourceRouteFailed => write!(f, "source route failed"),
            UnreachableCode::Other(code) => write!(f, "code {code}"),
        }
    }
}

/// Classification of a correlated ICMP error reply.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolErrorKind {
    DestinationUnreachable { code: UnreachableCode },
    TimeToLiveExpired,
    Other { icmp_type: u8, code: u8 },
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolErrorKind::DestinationUnreachable { code } => write!(f, "destination unreachable ({code})"),
            ProtocolErrorKind::TimeToLiveExpired => write!(f, "time to live expired"),
            ProtocolErrorKind::Other { icmp_type, code } => write!(f, "ICMP error type {icmp_type} code {code}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pnet_packet::ipv4::MutableIpv4Packet;

    /// Wraps an ICMP message into an IPv4 datagram as a raw socket would deliver it.
    pub(crate) fn ipv4_datagram(icmp: &[u8], source: Ipv4Addr, ttl: u8) -> Vec<u8> {
        ipv4_datagram_with_options(icmp, source, ttl, 0)
    }

    pub(crate) fn ipv4_datagram_with_options(icmp: &[u8], source: Ipv4Addr, ttl: u8, option_words: u8) -> Vec<u8> {
        let header_len = IPV4_HEADER_SIZE + usize::from(option_words) * 4;
        let mut buf = vec![0u8; header_len + icmp.len()];
        let mut packet = MutableIpv4Packet::new(&mut buf).unwrap();
        packet.set_version(4);
        packet.set_header_length(5 + option_words);
        packet.set_total_length(u16::try_from(header_len + icmp.len()).unwrap());
        packet.set_ttl(ttl);
        packet.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        packet.set_source(source);
        packet.set_destination(Ipv4Addr::new(10, 0, 0, 1));
        buf[header_len..].copy_from_slice(icmp);
        buf
    }

    /// The echo reply a well-behaved host sends back for `request`.
    pub(crate) fn echo_reply_to(request: &[u8]) -> Vec<u8> {
        let mut reply = request.to_vec();
        reply[0] = IcmpTypes::EchoReply.0;
        reply[2..4].copy_from_slice(&[0, 0]);
        let checksum = checksum::checksum(&reply);
        reply[2..4].copy_from_slice(&checksum.to_be_bytes());
        reply
    }

    /// An ICMP error message quoting the IPv4 header and first 8 bytes of `request`.
    pub(crate) fn error_message_for(icmp_type: u8, code: u8, request: &[u8], destination: Ipv4Addr) -> Vec<u8> {
        let mut original = ipv4_datagram(&request[..ICMP_HEADER_SIZE], Ipv4Addr::new(10, 0, 0, 1), 1);
        original[16..20].copy_from_slice(&destination.octets());
        let mut message = vec![icmp_type, code, 0, 0, 0, 0, 0, 0];
        message.extend_from_slice(&original);
        let checksum = checksum::checksum(&message);
        message[2..4].copy_from_slice(&checksum.to_be_bytes());
        message
    }

    #[test]
    fn encode_request_lays_out_header_and_checksum() {
        let package = encode_request(0x1234, 1, 0).unwrap();
        assert_eq!(vec![0x08, 0x00, 0xe5, 0xca, 0x12, 0x34, 0x00, 0x01], package);
    }

    #[test]
    fn encode_request_fills_payload_deterministically() {
        let package_1 = encode_request(0xBEEF, 7, 56).unwrap();
        let package_2 = encode_request(0xBEEF, 7, 56).unwrap();
        assert_eq!(ICMP_HEADER_SIZE + 56, package_1.len());
        assert_eq!(package_1, package_2);
        assert!(package_1[ICMP_HEADER_SIZE..].iter().all(|b| *b == b'Q'));
        assert!(checksum::is_valid(&package_1));
    }

    #[test]
    fn encode_request_with_odd_payload_validates() {
        let package = encode_request(1, 2, 57).unwrap();
        assert!(checksum::is_valid(&package));
    }

    #[test]
    fn encode_request_rejects_oversized_payload() {
        assert!(encode_request(1, 1, MAX_PAYLOAD_SIZE).is_ok());
        let result = encode_request(1, 1, MAX_PAYLOAD_SIZE + 1);
        assert!(matches!(result, Err(PingError::InvalidSize { size, max }) if size == MAX_PAYLOAD_SIZE + 1 && max == 65_507));
        assert!(matches!(encode_request(1, 1, 99_999), Err(PingError::InvalidSize { .. })));
    }

    #[test]
    fn decode_echo_reply() {
        let request = encode_request(0xABCD, 42, 56).unwrap();
        let source = Ipv4Addr::new(93, 184, 216, 34);
        let raw = ipv4_datagram(&echo_reply_to(&request), source, 57);

        let reply = decode_reply(&raw).unwrap();

        assert_eq!(ReplyKind::EchoReply, reply.kind);
        assert_eq!(0xABCD, reply.identifier);
        assert_eq!(SequenceNumber::from(42), reply.sequence);
        assert_eq!(Ttl(57), reply.ttl);
        assert_eq!(source, reply.source);
        assert_eq!(None, reply.protocol_error());
    }

    #[test]
    fn decode_honours_variable_ip_header_length() {
        let request = encode_request(7, 8, 16).unwrap();
        let raw = ipv4_datagram_with_options(&echo_reply_to(&request), Ipv4Addr::LOCALHOST, 64, 3);
        assert_eq!(IPV4_HEADER_SIZE + 12 + ICMP_HEADER_SIZE + 16, raw.len());

        let reply = decode_reply(&raw).unwrap();

        assert_eq!(7, reply.identifier);
        assert_eq!(SequenceNumber::from(8), reply.sequence);
    }

    #[test]
    fn decode_rejects_bad_echo_reply_checksum() {
        let request = encode_request(1, 1, 8).unwrap();
        let mut reply = echo_reply_to(&request);
        reply[9] ^= 0xFF;
        let raw = ipv4_datagram(&reply, Ipv4Addr::LOCALHOST, 64);
        assert_eq!(Err(DecodeError::BadChecksum), decode_reply(&raw));
    }

    #[test]
    fn decode_rejects_truncated_datagrams() {
        assert!(matches!(decode_reply(&[]), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_reply(&[0x45; 19]), Err(DecodeError::Malformed(_))));
        let raw = ipv4_datagram(&[0, 0, 0, 0], Ipv4Addr::LOCALHOST, 64);
        assert!(matches!(decode_reply(&raw), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn decode_ignores_looped_back_echo_request() {
        let request = encode_request(1, 1, 8).unwrap();
        let raw = ipv4_datagram(&request, Ipv4Addr::LOCALHOST, 64);
        assert_eq!(Err(DecodeError::Unrelated(8)), decode_reply(&raw));
    }

    #[test]
    fn decode_time_exceeded_uses_embedded_request() {
        let request = encode_request(0x0102, 3, 56).unwrap();
        let router = Ipv4Addr::new(192, 168, 1, 1);
        let message = error_message_for(11, 0, &request, Ipv4Addr::new(93, 184, 216, 34));
        let raw = ipv4_datagram(&message, router, 255);

        let reply = decode_reply(&raw).unwrap();

        assert_eq!(ReplyKind::TimeExceeded, reply.kind);
        assert_eq!(0x0102, reply.identifier);
        assert_eq!(SequenceNumber::from(3), reply.sequence);
        assert_eq!(router, reply.source);
        assert_eq!(Some(ProtocolErrorKind::TimeToLiveExpired), reply.protocol_error());
    }

    #[test]
    fn decode_destination_unreachable_is_not_checksum_validated() {
        let request = encode_request(5, 6, 0).unwrap();
        let mut message = error_message_for(3, 1, &request, Ipv4Addr::new(10, 9, 9, 9));
        message[2] ^= 0xFF;
        let raw = ipv4_datagram(&message, Ipv4Addr::new(10, 0, 0, 254), 64);

        let reply = decode_reply(&raw).unwrap();

        assert_eq!(
            Some(ProtocolErrorKind::DestinationUnreachable { code: UnreachableCode::Host }),
            reply.protocol_error()
        );
    }

    #[test]
    fn decode_error_message_without_echo_request_is_unrelated() {
        // Port unreachable quoting a UDP datagram.
        let mut message = error_message_for(3, 3, &[0u8; 8], Ipv4Addr::new(10, 9, 9, 9));
        message[ICMP_HEADER_SIZE + 9] = IpNextHeaderProtocols::Udp.0;
        let raw = ipv4_datagram(&message, Ipv4Addr::new(10, 0, 0, 254), 64);
        assert_eq!(Err(DecodeError::Unrelated(3)), decode_reply(&raw));
    }

    #[test]
    fn fragment_reassembly_timeout_is_other_protocol_error() {
        let request = encode_request(5, 6, 0).unwrap();
        let message = error_message_for(11, 1, &request, Ipv4Addr::new(10, 9, 9, 9));
        let reply = decode_reply(&ipv4_datagram(&message, Ipv4Addr::LOCALHOST, 64)).unwrap();
        assert_eq!(Some(ProtocolErrorKind::Other { icmp_type: 11, code: 1 }), reply.protocol_error());
    }
}
