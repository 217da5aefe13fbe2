#![no_main]

use libfuzzer_sys::fuzz_target;
use miio_protocol::protocol::handshake::parse_hello_reply;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut identity) = parse_hello_reply(data) {
        let before = identity.stamp;
        assert_eq!(identity.advance(), before.wrapping_add(1));
    }
});
