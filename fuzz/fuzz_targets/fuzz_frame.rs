#![no_main]

use libfuzzer_sys::fuzz_target;
use miio_protocol::protocol::exchange::decode_response;
use miio_protocol::utils::crypto::Cipher;
use miio_protocol::{decode_frame, FrameHeader, Token};

fuzz_target!(|data: &[u8]| {
    let token = Token::from_bytes([0x11; 16]);
    let cipher = Cipher::new(&token);

    let _ = FrameHeader::parse(data);
    let _ = decode_frame(data, &token);
    let _ = decode_response(&cipher, &token, data);
});
