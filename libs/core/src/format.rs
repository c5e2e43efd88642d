use serde::{Deserialize, Serialize};

/// Description of one PCM stream format, mirroring CoreAudio's
/// `AudioStreamBasicDescription`.
///
/// Equality is structural over all nine fields. Sample rates compare exactly,
/// which only holds when both sides went through the same JSON encoding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFormatDescriptor {
    /// Frames per second (Hz)
    #[serde(rename = "mSampleRate")]
    pub sample_rate: f64,
    #[serde(rename = "mFormatID")]
    pub format_id: u32,
    #[serde(rename = "mFormatFlags")]
    pub format_flags: u32,
    #[serde(rename = "mBytesPerPacket")]
    pub bytes_per_packet: u32,
    #[serde(rename = "mFramesPerPacket")]
    pub frames_per_packet: u32,
    #[serde(rename = "mBytesPerFrame")]
    pub bytes_per_frame: u32,
    #[serde(rename = "mChannelsPerFrame")]
    pub channels_per_frame: u32,
    #[serde(rename = "mBitsPerChannel")]
    pub bits_per_channel: u32,
    #[serde(rename = "mReserved")]
    pub reserved: u32,
}

impl AudioFormatDescriptor {
    /// `'lpcm'`
    pub const LINEAR_PCM: u32 = u32::from_be_bytes(*b"lpcm");

    /// `kAudioFormatFlagIsSignedInteger | kAudioFormatFlagIsPacked`
    pub const SIGNED_PACKED: u32 = 0x4 | 0x8;

    /// Packed signed-integer linear PCM with one frame per packet
    pub fn linear_pcm(sample_rate: f64, bits_per_channel: u32, channels_per_frame: u32) -> Self {
        let bytes_per_frame = bits_per_channel.div_ceil(8) * channels_per_frame;
        Self {
            sample_rate,
            format_id: Self::LINEAR_PCM,
            format_flags: Self::SIGNED_PACKED,
            bytes_per_packet: bytes_per_frame,
            frames_per_packet: 1,
            bytes_per_frame,
            channels_per_frame,
            bits_per_channel,
            reserved: 0,
        }
    }
}
