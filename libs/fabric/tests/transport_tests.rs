use lossless_core::{AudioFormatDescriptor, Request, Response};
use lossless_fabric::{
    codec::MessageCodec,
    error::Error,
    transport::{TcpTransport, TcpTransportListener},
};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

fn response(rate: f64, depth: u32) -> Response {
    Response {
        current_sample_rate: rate,
        detected_sample_rate: rate,
        current_bit_depth: depth,
        detected_bit_depth: depth,
        auto_switching_enabled: true,
        bit_depth_detection_enabled: false,
        formats_with_current_bit_depth: vec![AudioFormatDescriptor::linear_pcm(rate, depth, 2)],
        formats_with_current_sample_rate: vec![AudioFormatDescriptor::linear_pcm(rate, depth, 2)],
        default_output_device_name: "DAC".to_string(),
        server_host_name: "studio-mac".to_string(),
        time_stamp: "2024-05-01 12:00:00.000".to_string(),
    }
}

/// Helper to get a free port
async fn get_listener() -> (TcpTransportListener, std::net::SocketAddr) {
    let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Raw tokio listener for peers that need to write malformed bytes
async fn get_raw_listener() -> (tokio::net::TcpListener, std::net::SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

#[tokio::test]
async fn tcp_send_receive_single_frame() {
    let (listener, addr) = get_listener().await;

    // Spawn echo server
    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut transport = transport.into_transport();
        let received = transport.receive().await.unwrap();
        transport.send(&received).await.unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();
    client.send(b"hello world").await.unwrap();
    let echoed = client.receive().await.unwrap();

    assert_eq!(echoed, b"hello world");
}

#[tokio::test]
async fn tcp_multiple_frames_preserve_boundaries() {
    let (listener, addr) = get_listener().await;

    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut transport = transport.into_transport();
        for _ in 0..3 {
            let msg = transport.receive().await.unwrap();
            transport.send(&msg).await.unwrap();
        }
    });

    let mut client = TcpTransport::builder()
        .address(addr)
        .nodelay(true)
        .connect()
        .await
        .unwrap()
        .into_transport();

    // Send all three before reading so they can coalesce on the wire
    let messages = vec![b"first".to_vec(), Vec::new(), b"third".to_vec()];
    for msg in &messages {
        client.send(msg).await.unwrap();
    }
    for msg in &messages {
        assert_eq!(&client.receive().await.unwrap(), msg);
    }
}

#[tokio::test]
async fn request_reaches_peer_and_response_comes_back() {
    let (listener, addr) = get_listener().await;
    let codec: MessageCodec = MessageCodec::default();

    let format = AudioFormatDescriptor::linear_pcm(96_000.0, 24, 2);

    let server = tokio::spawn(async move {
        let codec: MessageCodec = MessageCodec::default();
        let (transport, _addr) = listener.accept().await.unwrap();
        let mut transport = transport.into_transport();

        let message = codec
            .decode_request(&transport.receive().await.unwrap())
            .unwrap();
        let Request::SetDeviceSampleRate(format) = message.request else {
            panic!("unexpected request {:?}", message.request);
        };

        let reply = response(format.sample_rate, format.bits_per_channel);
        transport
            .send(&codec.encode_response(&reply).unwrap())
            .await
            .unwrap();
        message
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();
    client
        .send(&codec.encode_request(&Request::SetDeviceSampleRate(format)).unwrap())
        .await
        .unwrap();
    let reply = codec
        .decode_response(&client.receive().await.unwrap())
        .unwrap();

    assert_eq!(reply.current_sample_rate, 96_000.0);
    assert_eq!(reply.current_bit_depth, 24);

    let seen = server.await.unwrap();
    assert_eq!(seen.request, Request::SetDeviceSampleRate(format));
    assert_eq!(seen.time_stamp.len(), "2024-05-01 12:00:00.000".len());
}

#[tokio::test]
async fn request_frame_has_envelope_shape() {
    let (listener, addr) = get_raw_listener().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, _writer) = stream.into_split();
        let mut frames = lossless_fabric::transport::StreamReassembler::new(reader);
        frames.next_frame().await.unwrap()
    });

    let codec: MessageCodec = MessageCodec::default();
    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();
    client
        .send(&codec.encode_request(&Request::Refresh).unwrap())
        .await
        .unwrap();

    let payload = server.await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(value["request"], serde_json::json!({ "type": "refresh" }));
    assert!(value["timeStamp"].is_string());
    assert_eq!(value.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn rejects_oversized_frame() {
    let (listener, addr) = get_raw_listener().await;

    // Peer claims 200MB, over the 100MB limit
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(200 * 1024 * 1024).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();

    match client.receive().await.unwrap_err() {
        Error::InvalidFrame(msg) => assert!(msg.contains("too large")),
        e => panic!("Expected InvalidFrame, got {:?}", e),
    }
}

#[tokio::test]
async fn partial_prefix_then_close_is_frame_length_error() {
    let (listener, addr) = get_raw_listener().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&[0, 0]).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();

    match client.receive().await.unwrap_err() {
        Error::FrameLength { received } => assert_eq!(received, 2),
        e => panic!("Expected FrameLength, got {:?}", e),
    }
}

#[tokio::test]
async fn early_close_inside_payload() {
    let (listener, addr) = get_raw_listener().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(10).await.unwrap();
        stream.write_all(b"{\"cur").await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();

    match client.receive().await.unwrap_err() {
        Error::ConnectionClosedMidFrame { expected, received } => {
            assert_eq!(expected, 10);
            assert_eq!(received, 5);
        }
        e => panic!("Expected ConnectionClosedMidFrame, got {:?}", e),
    }
}

#[tokio::test]
async fn connection_closed_error() {
    let (listener, addr) = get_listener().await;

    // Spawn server that immediately closes
    tokio::spawn(async move {
        let (transport, _addr) = listener.accept().await.unwrap();
        transport.into_transport().close().await.unwrap();
    });

    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();

    match client.receive().await.unwrap_err() {
        Error::ConnectionClosed => {}
        e => panic!("Expected ConnectionClosed, got {:?}", e),
    }
}

#[tokio::test]
async fn zero_length_frame_is_a_boundary_but_not_a_response() {
    let (listener, addr) = get_raw_listener().await;
    let good = response(44_100.0, 16);
    let good_payload = serde_json::to_vec(&good).unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_u32(0).await.unwrap();
        stream.write_u32(good_payload.len() as u32).await.unwrap();
        stream.write_all(&good_payload).await.unwrap();
        stream.flush().await.unwrap();
    });

    let codec: MessageCodec = MessageCodec::default();
    let mut client = TcpTransport::connect(addr).await.unwrap().into_transport();

    let empty = client.receive().await.unwrap();
    assert!(empty.is_empty());
    assert!(matches!(
        codec.decode_response(&empty),
        Err(Error::Decode(_))
    ));

    let next = codec.decode_response(&client.receive().await.unwrap()).unwrap();
    assert_eq!(next, good);
}

#[tokio::test]
async fn builder_requires_an_address() {
    match TcpTransport::builder().connect().await {
        Err(Error::Custom(msg)) => assert!(msg.contains("Address")),
        Err(e) => panic!("Expected Custom error, got {:?}", e),
        Ok(_) => panic!("connect without address succeeded"),
    }
}
