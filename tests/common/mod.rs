//! Loopback fake device shared by the integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use miio_protocol::core::frame::FrameHeader;
use miio_protocol::protocol::exchange::{build_request, decode_response};
use miio_protocol::protocol::handshake::{DeviceIdentity, HELLO_PACKET};
use miio_protocol::utils::crypto::Cipher;
use miio_protocol::Token;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub const TOKEN_HEX: &str = "0123456789abcdef0123456789abcdef";
pub const MI_INFO: &[u8] = br#"{"id": 1, "method": "miIO.info", "params": []}"#;

pub type Handler = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// A request the device decoded
#[derive(Debug, Clone)]
pub struct Received {
    pub device_id: u32,
    pub stamp: u32,
    pub payload: Vec<u8>,
}

/// How the fake device behaves
#[derive(Clone)]
pub struct Behavior {
    pub device_id: u32,
    pub stamp: u32,
    /// Split responses into datagrams of this size
    pub split: Option<usize>,
    /// Sign responses with this token instead of the shared one
    pub reply_token: Option<Token>,
    /// Answer hellos but never requests
    pub ignore_requests: bool,
    pub handler: Handler,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            device_id: 0x0004_2A1B,
            stamp: 1000,
            split: None,
            reply_token: None,
            ignore_requests: false,
            handler: Arc::new(|_| br#"{"result": ["ok"], "id": 1}"#.to_vec()),
        }
    }
}

pub struct FakeDevice {
    pub port: u16,
    pub hellos: Arc<AtomicUsize>,
    pub received: Arc<Mutex<Vec<Received>>>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    pub async fn spawn(behavior: Behavior) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        let hellos = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let task = tokio::spawn(run(
            socket,
            behavior,
            Arc::clone(&hellos),
            Arc::clone(&received),
        ));

        Self {
            port,
            hellos,
            received,
            task,
        }
    }

    pub fn hello_count(&self) -> usize {
        self.hellos.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn token() -> Token {
    Token::from_hex(TOKEN_HEX).unwrap()
}

fn hello_reply(device_id: u32, stamp: u32) -> Vec<u8> {
    let mut reply = vec![0u8; 32];
    reply[0..4].copy_from_slice(&[0x21, 0x31, 0x00, 0x20]);
    reply[8..12].copy_from_slice(&device_id.to_be_bytes());
    reply[12..16].copy_from_slice(&stamp.to_be_bytes());
    reply
}

async fn run(
    socket: UdpSocket,
    behavior: Behavior,
    hellos: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Received>>>,
) {
    let token = token();
    let cipher = Cipher::new(&token);
    let reply_token = behavior.reply_token.clone().unwrap_or_else(|| token.clone());
    let reply_cipher = Cipher::new(&reply_token);
    let mut stamp = behavior.stamp;
    let mut buf = vec![0u8; 65535];

    loop {
        let (n, peer) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(_) => return,
        };
        let datagram = &buf[..n];

        if datagram == HELLO_PACKET {
            hellos.fetch_add(1, Ordering::SeqCst);
            let _ = socket
                .send_to(&hello_reply(behavior.device_id, stamp), peer)
                .await;
            continue;
        }

        let Ok(header) = FrameHeader::parse(datagram) else {
            continue;
        };
        let Ok(payload) = decode_response(&cipher, &token, datagram) else {
            continue;
        };

        stamp = stamp.max(header.stamp);
        received.lock().unwrap().push(Received {
            device_id: header.device_id,
            stamp: header.stamp,
            payload: payload.clone(),
        });

        if behavior.ignore_requests {
            continue;
        }

        let response = (behavior.handler)(&payload);
        let identity = DeviceIdentity {
            device_id: behavior.device_id,
            stamp: header.stamp,
        };
        let frame = build_request(&reply_cipher, &reply_token, identity, &response).unwrap();

        match behavior.split {
            Some(size) => {
                for chunk in frame.chunks(size) {
                    let _ = socket.send_to(chunk, peer).await;
                }
            }
            None => {
                let _ = socket.send_to(&frame, peer).await;
            }
        }
    }
}
