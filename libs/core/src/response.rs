use serde::{Deserialize, Serialize};

use crate::format::AudioFormatDescriptor;

/// Snapshot of the switcher's state, sent after every request
///
/// Every field is required; a payload missing any of them does not decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub current_sample_rate: f64,
    pub detected_sample_rate: f64,
    pub current_bit_depth: u32,
    pub detected_bit_depth: u32,
    pub auto_switching_enabled: bool,
    pub bit_depth_detection_enabled: bool,
    /// Formats the device offers at the current bit depth
    pub formats_with_current_bit_depth: Vec<AudioFormatDescriptor>,
    /// Formats the device offers at the current sample rate
    pub formats_with_current_sample_rate: Vec<AudioFormatDescriptor>,
    pub default_output_device_name: String,
    pub server_host_name: String,
    /// Server-side timestamp, `yyyy-MM-dd HH:mm:ss.SSS`
    pub time_stamp: String,
}

impl Response {
    /// Whether the detected rate matches one of the offered formats
    ///
    /// Exact comparison; both sides arrive through the same JSON decoding.
    pub fn offers_detected_sample_rate(&self) -> bool {
        self.formats_with_current_bit_depth
            .iter()
            .any(|format| format.sample_rate == self.detected_sample_rate)
    }
}
