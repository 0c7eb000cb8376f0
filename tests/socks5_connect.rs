//! End-to-end tests for the SOCKS5 CONNECT flow over real loopback sockets

mod common;

use common::{
    closed_port, read_reply, read_until_closed, socks5_mock, spawn_echo_server, TestProxy,
};
use std::time::Duration;
use tcp_proxy::config::Config;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const FAILURE_TAIL: [u8; 8] = [0x00, 0x01, 0, 0, 0, 0, 0, 0];

fn assert_failure(reply: [u8; 10], code: u8) {
    assert_eq!(reply[0], 0x05);
    assert_eq!(reply[1], code, "unexpected reply {:?}", reply);
    assert_eq!(&reply[2..], &FAILURE_TAIL);
}

#[tokio::test]
async fn test_echo_through_proxy() {
    let echo = spawn_echo_server().await;
    let proxy = TestProxy::start().await;

    let mut stream = proxy.open_tunnel(echo).await;

    stream.write_all(b"hello").await.unwrap();
    let mut buf = [0u8; 5];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");
}

#[tokio::test]
async fn test_success_reply_carries_bound_address() {
    let echo = spawn_echo_server().await;
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_connect_ipv4([127, 0, 0, 1], echo.port()))
        .await
        .unwrap();

    let reply = read_reply(&mut stream).await;
    assert_eq!(&reply[..4], &[0x05, 0x00, 0x00, 0x01]);
    assert_eq!(&reply[4..8], &[127, 0, 0, 1]);
    let bound_port = u16::from_be_bytes([reply[8], reply[9]]);
    assert_ne!(bound_port, 0);
    assert_ne!(bound_port, echo.port());
}

#[tokio::test]
async fn test_domain_destination() {
    let echo = spawn_echo_server().await;
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_connect_domain("localhost", echo.port()))
        .await
        .unwrap();
    assert_eq!(read_reply(&mut stream).await[1], 0x00);

    stream.write_all(b"via name").await.unwrap();
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"via name");
}

#[tokio::test]
async fn test_no_acceptable_method() {
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect().await;
    stream
        .write_all(&socks5_mock::create_auth_request_password())
        .await
        .unwrap();

    let mut resp = [0u8; 2];
    stream.read_exact(&mut resp).await.unwrap();
    assert_eq!(resp, [0x05, 0xFF]);
    assert!(read_until_closed(&mut stream).await.is_empty());
}

#[tokio::test]
async fn test_wrong_version_gets_no_reply() {
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect().await;
    stream.write_all(&[0x04, 0x01, 0x00]).await.unwrap();
    assert!(read_until_closed(&mut stream).await.is_empty());
}

#[tokio::test]
async fn test_ipv6_address_type_not_supported() {
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    // rejected before the address is read
    stream.write_all(&[0x05, 0x01, 0x00, 0x04]).await.unwrap();

    assert_failure(read_reply(&mut stream).await, 0x08);
}

#[tokio::test]
async fn test_bind_command_not_supported() {
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_command_ipv4(0x02, [127, 0, 0, 1], 80))
        .await
        .unwrap();

    assert_failure(read_reply(&mut stream).await, 0x07);
    assert!(read_until_closed(&mut stream).await.is_empty());
}

#[tokio::test]
async fn test_udp_associate_not_supported() {
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_command_ipv4(0x03, [0, 0, 0, 0], 0))
        .await
        .unwrap();

    assert_failure(read_reply(&mut stream).await, 0x07);
}

#[tokio::test]
async fn test_connection_refused() {
    let port = closed_port().await;
    let proxy = TestProxy::start().await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_connect_ipv4([127, 0, 0, 1], port))
        .await
        .unwrap();

    assert_failure(read_reply(&mut stream).await, 0x05);
    assert!(read_until_closed(&mut stream).await.is_empty());
}

#[tokio::test]
async fn test_unresolvable_domain() {
    let mut config = Config::default();
    config.socks.resolve_timeout_secs = 2;
    let proxy = TestProxy::start_with(config).await;

    let mut stream = proxy.connect_negotiated().await;
    stream
        .write_all(&socks5_mock::create_connect_domain(
            "this-domain-does-not-exist-12345.invalid",
            80,
        ))
        .await
        .unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), read_reply(&mut stream))
        .await
        .unwrap();
    assert_failure(reply, 0x04);
}

#[tokio::test]
async fn test_half_close_through_proxy() {
    let proxy = TestProxy::start().await;

    // target reads the whole request before answering
    let (listener, target) = common::create_test_listener().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        stream.read_to_end(&mut request).await.unwrap();
        stream.write_all(b"response after EOF").await.unwrap();
        stream.shutdown().await.unwrap();
        request
    });

    let mut stream = proxy.open_tunnel(target).await;
    stream.write_all(b"full request").await.unwrap();
    stream.shutdown().await.unwrap();

    let response = read_until_closed(&mut stream).await;
    assert_eq!(response, b"response after EOF");
    assert_eq!(server.await.unwrap(), b"full request");
}

#[tokio::test]
async fn test_large_transfer_is_byte_exact() {
    let echo = spawn_echo_server().await;
    let proxy = TestProxy::start().await;

    let stream = proxy.open_tunnel(echo).await;
    let (mut reader, mut writer) = stream.into_split();

    let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let expected = payload.clone();
    let write = tokio::spawn(async move {
        writer.write_all(&payload).await.unwrap();
        writer.shutdown().await.unwrap();
    });

    let mut received = Vec::new();
    reader.read_to_end(&mut received).await.unwrap();
    write.await.unwrap();

    assert_eq!(received.len(), expected.len());
    assert!(received == expected);
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let echo = spawn_echo_server().await;
    let proxy = TestProxy::start().await;

    let mut tasks = Vec::new();
    for i in 0..16u8 {
        let stream = proxy.open_tunnel(echo).await;
        tasks.push(tokio::spawn(async move {
            let mut stream = stream;
            let message = vec![i; 1024 + i as usize];
            stream.write_all(&message).await.unwrap();
            stream.shutdown().await.unwrap();

            let mut echoed = Vec::new();
            stream.read_to_end(&mut echoed).await.unwrap();
            assert_eq!(echoed, message);
        }));
    }

    for task in tasks {
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let proxy = TestProxy::start().await;
    proxy.shutdown();

    let addr = proxy.addr;
    let refused = async {
        loop {
            if TcpStream::connect(addr).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), refused)
        .await
        .unwrap();
}
