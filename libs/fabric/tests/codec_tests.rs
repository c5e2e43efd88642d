use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use lossless_core::{AudioFormatDescriptor, Request, Response};
use lossless_fabric::{
    codec::{ClientMessage, MessageCodec},
    error::Error,
    transport::{encode_frame, FramingConfig, StreamReassembler},
};
use proptest::prelude::*;
use tokio::io::{AsyncRead, ReadBuf};

/// Reader that hands out pre-cut chunks, one per `poll_read`
struct ChunkedReader {
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkedReader {
    fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(mut chunk) = self.chunks.pop_front() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            if n < chunk.len() {
                chunk.drain(..n);
                self.chunks.push_front(chunk);
            }
        }
        Poll::Ready(Ok(()))
    }
}

fn split_at_cuts(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|cut| cut % bytes.len().max(1))
        .filter(|cut| *cut > 0)
        .collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for point in points {
        chunks.push(bytes[start..point].to_vec());
        start = point;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn sample_response(formats: Vec<AudioFormatDescriptor>) -> Response {
    Response {
        current_sample_rate: 44_100.0,
        detected_sample_rate: 96_000.0,
        current_bit_depth: 16,
        detected_bit_depth: 24,
        auto_switching_enabled: true,
        bit_depth_detection_enabled: true,
        formats_with_current_bit_depth: formats.clone(),
        formats_with_current_sample_rate: formats,
        default_output_device_name: "USB DAC \u{2013} Line Out".to_string(),
        server_host_name: "studio-mac".to_string(),
        time_stamp: "2024-05-01 12:00:00.125".to_string(),
    }
}

fn descriptor_strategy() -> impl Strategy<Value = AudioFormatDescriptor> {
    (
        (1.0f64..768_000.0, any::<u32>(), any::<u32>(), any::<u32>()),
        (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>()),
    )
        .prop_map(
            |(
                (sample_rate, format_id, format_flags, bytes_per_packet),
                (frames_per_packet, bytes_per_frame, channels_per_frame, bits_per_channel, reserved),
            )| AudioFormatDescriptor {
                sample_rate,
                format_id,
                format_flags,
                bytes_per_packet,
                frames_per_packet,
                bytes_per_frame,
                channels_per_frame,
                bits_per_channel,
                reserved,
            },
        )
}

fn request_strategy() -> impl Strategy<Value = Request> {
    prop_oneof![
        Just(Request::Refresh),
        Just(Request::ToggleAutoSwitching),
        Just(Request::ToggleBitDepthDetection),
        descriptor_strategy().prop_map(Request::SetDeviceSampleRate),
        descriptor_strategy().prop_map(Request::SetDeviceBitDepth),
        Just(Request::SetCurrentToDetected),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn request_roundtrips_through_peer(request in request_strategy()) {
        let codec: MessageCodec = MessageCodec::default();
        let payload = codec.encode_request(&request).unwrap();
        let message = codec.decode_request(&payload).unwrap();
        prop_assert_eq!(message.request, request);
    }

    #[test]
    fn response_survives_arbitrary_chunking(
        formats in prop::collection::vec(descriptor_strategy(), 0..6),
        cuts in prop::collection::vec(any::<usize>(), 0..40),
    ) {
        let codec: MessageCodec = MessageCodec::default();
        let response = sample_response(formats);
        let frame = encode_frame(&codec.encode_response(&response).unwrap()).unwrap();

        let chunks = split_at_cuts(&frame, &cuts);
        let decoded = block_on(async move {
            let mut frames = StreamReassembler::new(ChunkedReader::new(chunks));
            let first = frames.next_frame().await.unwrap();
            let after = frames.next_frame().await;
            (first, after)
        });

        prop_assert_eq!(codec.decode_response(&decoded.0).unwrap(), response);
        prop_assert!(matches!(decoded.1, Err(Error::ConnectionClosed)));
    }
}

#[test]
fn one_byte_chunks_yield_exactly_one_response() {
    let codec: MessageCodec = MessageCodec::default();
    let response = sample_response(vec![AudioFormatDescriptor::linear_pcm(48_000.0, 24, 2)]);
    let frame = encode_frame(&codec.encode_response(&response).unwrap()).unwrap();
    let chunks = frame.iter().map(|byte| vec![*byte]).collect();

    let (first, after) = block_on(async move {
        let mut frames = StreamReassembler::new(ChunkedReader::new(chunks));
        (frames.next_frame().await.unwrap(), frames.next_frame().await)
    });

    assert_eq!(codec.decode_response(&first).unwrap(), response);
    assert!(matches!(after, Err(Error::ConnectionClosed)));
}

#[test]
fn chunk_limit_bounds_each_read() {
    let payload = vec![7u8; 1000];
    let frame = encode_frame(&payload).unwrap();

    let received = block_on(async move {
        let framing = FramingConfig {
            chunk_limit: 3,
            ..FramingConfig::default()
        };
        let mut frames = StreamReassembler::new(ChunkedReader::new(vec![frame])).with_framing(framing);
        frames.next_frame().await.unwrap()
    });

    assert_eq!(received, payload);
}

#[test]
fn invalid_json_is_a_decode_error_and_next_frame_still_reads() {
    let codec: MessageCodec = MessageCodec::default();
    let good = sample_response(Vec::new());

    let mut bytes = encode_frame(b"{not json").unwrap();
    bytes.extend(encode_frame(&codec.encode_response(&good).unwrap()).unwrap());

    let (bad, next) = block_on(async move {
        let mut frames = StreamReassembler::new(ChunkedReader::new(vec![bytes]));
        (
            frames.next_frame().await.unwrap(),
            frames.next_frame().await.unwrap(),
        )
    });

    assert!(matches!(codec.decode_response(&bad), Err(Error::Decode(_))));
    assert_eq!(codec.decode_response(&next).unwrap(), good);
}

#[test]
fn unknown_request_tag_fails_on_peer() {
    let codec: MessageCodec = MessageCodec::default();
    let payload = br#"{"request":{"type":"eject"},"timeStamp":"2024-05-01 12:00:00.000"}"#;
    assert!(matches!(codec.decode_request(payload), Err(Error::Decode(_))));
}

#[test]
fn envelope_carries_fresh_timestamp() {
    let message = ClientMessage::new(Request::ToggleAutoSwitching);
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["request"]["type"], "toggleAutoSwitching");
    assert_eq!(value["timeStamp"], message.time_stamp.as_str());
}

#[test]
fn non_finite_sample_rate_is_an_encode_error() {
    let codec: MessageCodec = MessageCodec::default();
    for rate in [f64::NAN, f64::INFINITY] {
        let format = AudioFormatDescriptor::linear_pcm(rate, 24, 2);
        assert!(matches!(
            codec.encode_request(&Request::SetDeviceSampleRate(format)),
            Err(Error::Encode(_))
        ));
        assert!(matches!(
            codec.encode_request(&Request::SetDeviceBitDepth(format)),
            Err(Error::Encode(_))
        ));
    }
}

#[test]
fn large_declared_length_with_short_body_ends_mid_frame() {
    let declared: u32 = 50 * 1024 * 1024;
    let mut bytes = declared.to_be_bytes().to_vec();
    bytes.extend_from_slice(b"{\"cur");

    let result = block_on(async move {
        let mut frames = StreamReassembler::new(ChunkedReader::new(vec![bytes]));
        frames.next_frame().await
    });

    assert!(matches!(
        result,
        Err(Error::ConnectionClosedMidFrame { expected, received: 5 }) if expected == declared as usize
    ));
}
