// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::frame::{self, FrameHeader};
use crate::core::token::Token;
use crate::error::ProtocolError;
use crate::protocol::exchange::{
    build_request, decode_response, receive_frame, round_trip, ExchangeLimits,
};
use crate::protocol::handshake::{hello, DeviceIdentity, HELLO_PACKET};
use crate::transport::Datagram;
use crate::utils::crypto::Cipher;
use crate::utils::metrics::Metrics;
use crate::utils::timeout::deadline_after;

const TOKEN_HEX: &str = "0123456789abcdef0123456789abcdef";
const MI_INFO: &[u8] = br#"{"id": 1, "method": "miIO.info", "params": []}"#;

/// In-memory transport replaying queued datagrams and recording writes
#[derive(Default)]
struct ScriptedDatagram {
    inbound: Mutex<VecDeque<Vec<u8>>>,
    sent: Mutex<Vec<Vec<u8>>>,
    short_write: Option<usize>,
}

impl ScriptedDatagram {
    fn with_replies(replies: Vec<Vec<u8>>) -> Self {
        Self {
            inbound: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

impl Datagram for ScriptedDatagram {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.sent.lock().unwrap().push(buf.to_vec());
        Ok(self.short_write.unwrap_or(buf.len()))
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.inbound.lock().unwrap().pop_front();
        match next {
            Some(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(n)
            }
            None => {
                // Behave like a silent device
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn limits() -> ExchangeLimits {
    ExchangeLimits {
        deadline: deadline_after(Duration::from_secs(1)),
        chunk_size: 4096,
    }
}

fn token() -> Token {
    Token::from_hex(TOKEN_HEX).unwrap()
}

fn hello_reply(device_id: u32, stamp: u32) -> Vec<u8> {
    let mut reply = vec![0u8; 32];
    reply[0..2].copy_from_slice(&[0x21, 0x31]);
    reply[2..4].copy_from_slice(&[0x00, 0x20]);
    reply[8..12].copy_from_slice(&device_id.to_be_bytes());
    reply[12..16].copy_from_slice(&stamp.to_be_bytes());
    reply
}

/// What a device would answer: the same framing, with its own stamp
fn device_response(payload: &[u8], identity: DeviceIdentity) -> Vec<u8> {
    build_request(&Cipher::new(&token()), &token(), identity, payload).unwrap()
}

#[test]
fn test_request_decodes_back_to_payload() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 1,
        stamp: 2,
    };

    let request = build_request(&cipher, &token, identity, MI_INFO).unwrap();
    let header = FrameHeader::parse(&request).unwrap();
    assert_eq!(header.device_id, 1);
    assert_eq!(header.stamp, 2);
    assert_eq!(header.length as usize, request.len());
    assert_eq!((request.len() - 32) % 16, 0);

    let decoded = decode_response(&cipher, &token, &request).unwrap();
    assert_eq!(decoded, MI_INFO);
}

#[test]
fn test_existing_sentinel_not_doubled() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 1,
        stamp: 2,
    };

    let with_sentinel = build_request(&cipher, &token, identity, b"abc\0").unwrap();
    let without = build_request(&cipher, &token, identity, b"abc").unwrap();
    assert_eq!(with_sentinel, without);
}

#[test]
fn test_empty_payload_is_sentinel_only() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 1,
        stamp: 2,
    };

    let request = build_request(&cipher, &token, identity, b"").unwrap();
    assert_eq!(request.len(), 48);
    assert!(matches!(
        decode_response(&cipher, &token, &request),
        Err(ProtocolError::EmptyResponse)
    ));
}

#[test]
fn test_short_response_rejected_before_hashing() {
    let token = token();
    let cipher = Cipher::new(&token);
    let result = decode_response(&cipher, &token, &[0x21, 0x31, 0x00, 0x20]);
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(4))));
}

#[test]
fn test_valid_checksum_over_bad_padding() {
    // Body encrypted without padding: checksum passes, unpad must fail
    let token = token();
    let cipher = Cipher::new(&token);
    let mut body = [0x41u8; 16];
    body[15] = 0;
    cipher.encrypt(&mut body).unwrap();

    let response = frame::encode_frame(1, 2, &token, &body).unwrap();
    assert!(matches!(
        decode_response(&cipher, &token, &response),
        Err(ProtocolError::InvalidPadding)
    ));
}

#[tokio::test]
async fn test_hello_exchange() {
    let transport = ScriptedDatagram::with_replies(vec![hello_reply(1, 2)]);
    let identity = hello(&transport, deadline_after(Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(
        identity,
        DeviceIdentity {
            device_id: 1,
            stamp: 2
        }
    );
    assert_eq!(transport.sent(), vec![HELLO_PACKET.to_vec()]);
}

#[tokio::test]
async fn test_hello_short_reply() {
    let transport = ScriptedDatagram::with_replies(vec![vec![0u8; 20]]);
    let result = hello(&transport, deadline_after(Duration::from_secs(1))).await;
    assert!(matches!(result, Err(ProtocolError::MalformedHello(20))));
}

#[tokio::test]
async fn test_hello_short_write() {
    let transport = ScriptedDatagram {
        short_write: Some(10),
        ..Default::default()
    };
    let result = hello(&transport, deadline_after(Duration::from_secs(1))).await;
    assert!(matches!(
        result,
        Err(ProtocolError::ShortWrite {
            expected: 32,
            written: 10
        })
    ));
}

#[tokio::test]
async fn test_hello_silent_device_times_out() {
    let transport = ScriptedDatagram::default();
    let result = hello(&transport, deadline_after(Duration::from_millis(30))).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[tokio::test]
async fn test_receive_reassembles_chunks() {
    let response = device_response(
        &vec![b'x'; 200],
        DeviceIdentity {
            device_id: 5,
            stamp: 6,
        },
    );
    let chunks: Vec<Vec<u8>> = response.chunks(64).map(<[u8]>::to_vec).collect();
    assert!(chunks.len() > 1);

    let transport = ScriptedDatagram::with_replies(chunks);
    let received = receive_frame(&transport, deadline_after(Duration::from_secs(1)), 64)
        .await
        .unwrap();
    assert_eq!(&received[..], &response[..]);
}

#[tokio::test]
async fn test_receive_tiny_first_chunk() {
    let transport = ScriptedDatagram::with_replies(vec![vec![0x21, 0x31]]);
    let result = receive_frame(&transport, deadline_after(Duration::from_secs(1)), 4096).await;
    assert!(matches!(result, Err(ProtocolError::MalformedFrame(2))));
}

#[tokio::test]
async fn test_receive_incomplete_frame_times_out() {
    let response = device_response(
        b"{\"result\": [\"ok\"]}",
        DeviceIdentity {
            device_id: 5,
            stamp: 6,
        },
    );
    let transport = ScriptedDatagram::with_replies(vec![response[..40].to_vec()]);
    let result = receive_frame(&transport, deadline_after(Duration::from_millis(30)), 4096).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[tokio::test]
async fn test_round_trip_over_scripted_device() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 9,
        stamp: 101,
    };
    let reply = br#"{"result": ["ok"], "id": 1}"#;
    let transport = ScriptedDatagram::with_replies(vec![device_response(reply, identity)]);
    let metrics = Metrics::new();

    let exchanged = round_trip(
        &transport,
        &cipher,
        &token,
        identity,
        MI_INFO,
        limits(),
        &metrics,
    )
    .await
    .unwrap();

    assert_eq!(exchanged.payload, reply);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(exchanged.request_len, sent[0].len());
    assert_eq!(FrameHeader::parse(&sent[0]).unwrap().stamp, 101);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.requests_sent, 1);
    assert_eq!(snapshot.bytes_sent, exchanged.request_len as u64);
    assert_eq!(snapshot.bytes_received, exchanged.response_len as u64);
}

#[tokio::test]
async fn test_round_trip_wrong_token_response() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 9,
        stamp: 101,
    };

    let foreign = Token::from_bytes([0x33; 16]);
    let forged = build_request(&Cipher::new(&foreign), &foreign, identity, b"{}").unwrap();
    let transport = ScriptedDatagram::with_replies(vec![forged]);
    let metrics = Metrics::new();

    let result = round_trip(
        &transport,
        &cipher,
        &token,
        identity,
        MI_INFO,
        limits(),
        &metrics,
    )
    .await;
    assert!(matches!(result, Err(ProtocolError::ChecksumMismatch { .. })));
    // Written and read even though verification failed
    assert_eq!(metrics.snapshot().requests_sent, 1);
    assert_eq!(metrics.snapshot().responses_received, 1);
}

#[tokio::test]
async fn test_round_trip_silent_device_still_counts_request() {
    let token = token();
    let cipher = Cipher::new(&token);
    let identity = DeviceIdentity {
        device_id: 9,
        stamp: 102,
    };
    let transport = ScriptedDatagram::default();
    let metrics = Metrics::new();
    let limits = ExchangeLimits {
        deadline: deadline_after(Duration::from_millis(30)),
        chunk_size: 4096,
    };

    let result = round_trip(&transport, &cipher, &token, identity, MI_INFO, limits, &metrics).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.requests_sent, 1);
    assert_eq!(snapshot.bytes_sent, transport.sent()[0].len() as u64);
    assert_eq!(snapshot.responses_received, 0);
}

#[tokio::test]
async fn test_receive_single_datagram_larger_than_chunk() {
    let response = device_response(
        &vec![b'y'; 1500],
        DeviceIdentity {
            device_id: 5,
            stamp: 7,
        },
    );
    let transport = ScriptedDatagram::with_replies(vec![response.clone()]);

    let received = receive_frame(&transport, deadline_after(Duration::from_secs(1)), 32)
        .await
        .unwrap();
    assert_eq!(&received[..], &response[..]);
}
