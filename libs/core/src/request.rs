use std::fmt;

use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::AudioFormatDescriptor;

const TYPE_KEY: &str = "type";

/// Wire tag of a [`Request`]
///
/// Each tag knows its JSON name and the key its payload travels under, if
/// it has one. Encoding and decoding of requests both go through this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTag {
    Refresh,
    ToggleAutoSwitching,
    ToggleBitDepthDetection,
    SetDeviceSampleRate,
    SetDeviceBitDepth,
    SetCurrentToDetected,
}

impl RequestTag {
    pub const ALL: [RequestTag; 6] = [
        RequestTag::Refresh,
        RequestTag::ToggleAutoSwitching,
        RequestTag::ToggleBitDepthDetection,
        RequestTag::SetDeviceSampleRate,
        RequestTag::SetDeviceBitDepth,
        RequestTag::SetCurrentToDetected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::ToggleAutoSwitching => "toggleAutoSwitching",
            Self::ToggleBitDepthDetection => "toggleBitDepthDetection",
            Self::SetDeviceSampleRate => "setDeviceSampleRate",
            Self::SetDeviceBitDepth => "setDeviceBitDepth",
            Self::SetCurrentToDetected => "setCurrentToDetected",
        }
    }

    /// Key of the nested [`AudioFormatDescriptor`], for tags that carry one
    pub fn payload_key(self) -> Option<&'static str> {
        match self {
            Self::SetDeviceSampleRate => Some("sampleRate"),
            Self::SetDeviceBitDepth => Some("bitDepth"),
            _ => None,
        }
    }

    /// Look a tag up by its wire name
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == name)
            .ok_or_else(|| Error::UnknownRequestTag(name.to_string()))
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control message sent from the remote to the switcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Refresh,
    ToggleAutoSwitching,
    ToggleBitDepthDetection,
    SetDeviceSampleRate(AudioFormatDescriptor),
    SetDeviceBitDepth(AudioFormatDescriptor),
    SetCurrentToDetected,
}

impl Request {
    pub fn tag(&self) -> RequestTag {
        match self {
            Self::Refresh => RequestTag::Refresh,
            Self::ToggleAutoSwitching => RequestTag::ToggleAutoSwitching,
            Self::ToggleBitDepthDetection => RequestTag::ToggleBitDepthDetection,
            Self::SetDeviceSampleRate(_) => RequestTag::SetDeviceSampleRate,
            Self::SetDeviceBitDepth(_) => RequestTag::SetDeviceBitDepth,
            Self::SetCurrentToDetected => RequestTag::SetCurrentToDetected,
        }
    }

    pub fn payload(&self) -> Option<&AudioFormatDescriptor> {
        match self {
            Self::SetDeviceSampleRate(format) | Self::SetDeviceBitDepth(format) => Some(format),
            _ => None,
        }
    }

    fn from_parts(tag: RequestTag, payload: Option<AudioFormatDescriptor>) -> Result<Self> {
        let missing = || Error::MissingPayload {
            tag: tag.as_str(),
            field: tag.payload_key().unwrap_or_default(),
        };

        Ok(match tag {
            RequestTag::Refresh => Self::Refresh,
            RequestTag::ToggleAutoSwitching => Self::ToggleAutoSwitching,
            RequestTag::ToggleBitDepthDetection => Self::ToggleBitDepthDetection,
            RequestTag::SetDeviceSampleRate => Self::SetDeviceSampleRate(payload.ok_or_else(missing)?),
            RequestTag::SetDeviceBitDepth => Self::SetDeviceBitDepth(payload.ok_or_else(missing)?),
            RequestTag::SetCurrentToDetected => Self::SetCurrentToDetected,
        })
    }

    /// Parse `{"type": <tag>, <payload key>: <descriptor>}`; the payload key
    /// is only read for tags that carry one
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(Error::custom("request must be a JSON object"));
        };

        let tag = match object.get(TYPE_KEY) {
            Some(Value::String(name)) => RequestTag::parse(name)?,
            Some(_) => return Err(Error::custom("request `type` must be a string")),
            None => return Err(Error::custom("request is missing `type`")),
        };

        let payload = match tag.payload_key().and_then(|key| object.remove(key)) {
            Some(raw) => Some(serde_json::from_value::<AudioFormatDescriptor>(raw)?),
            None => None,
        };

        Self::from_parts(tag, payload)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetDeviceSampleRate(format) => {
                write!(f, "{}({} Hz)", self.tag(), format.sample_rate)
            }
            Self::SetDeviceBitDepth(format) => {
                write!(f, "{}({} bit)", self.tag(), format.bits_per_channel)
            }
            _ => write!(f, "{}", self.tag()),
        }
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let tag = self.tag();
        let payload = tag.payload_key().zip(self.payload());

        let mut map = serializer.serialize_map(Some(1 + usize::from(payload.is_some())))?;
        map.serialize_entry(TYPE_KEY, tag.as_str())?;
        if let Some((key, format)) = payload {
            // JSON has no NaN or infinity; serde_json would write `null`
            if !format.sample_rate.is_finite() {
                return Err(S::Error::custom(format!(
                    "{tag}: sample rate {} is not a finite number",
                    format.sample_rate
                )));
            }
            map.serialize_entry(key, format)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Request::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_table_is_bijective() {
        for tag in RequestTag::ALL {
            assert_eq!(RequestTag::parse(tag.as_str()).unwrap(), tag);
        }
        assert!(matches!(
            RequestTag::parse("reboot"),
            Err(Error::UnknownRequestTag(name)) if name == "reboot"
        ));
    }

    #[test]
    fn unit_variants_omit_payload() {
        let value = serde_json::to_value(Request::ToggleBitDepthDetection).unwrap();
        assert_eq!(value, json!({ "type": "toggleBitDepthDetection" }));
        assert_eq!(
            serde_json::to_value(Request::SetCurrentToDetected).unwrap(),
            json!({ "type": "setCurrentToDetected" })
        );
    }

    #[test]
    fn format_variants_nest_descriptor_under_their_key() {
        let format = AudioFormatDescriptor::linear_pcm(96_000.0, 24, 2);

        let rate = serde_json::to_value(Request::SetDeviceSampleRate(format)).unwrap();
        assert_eq!(rate["type"], "setDeviceSampleRate");
        assert_eq!(rate["sampleRate"]["mSampleRate"], 96_000.0);
        assert!(rate.get("bitDepth").is_none());

        let depth = serde_json::to_value(Request::SetDeviceBitDepth(format)).unwrap();
        assert_eq!(depth["type"], "setDeviceBitDepth");
        assert_eq!(depth["bitDepth"]["mBitsPerChannel"], 24);
    }

    #[test]
    fn non_finite_sample_rate_does_not_serialize() {
        for rate in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let format = AudioFormatDescriptor::linear_pcm(rate, 24, 2);
            assert!(serde_json::to_vec(&Request::SetDeviceSampleRate(format)).is_err());
            assert!(serde_json::to_vec(&Request::SetDeviceBitDepth(format)).is_err());
        }
    }

    #[test]
    fn missing_payload_is_rejected() {
        let err = Request::from_value(json!({ "type": "setDeviceBitDepth" })).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingPayload { tag: "setDeviceBitDepth", field: "bitDepth" }
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(Request::from_value(json!("refresh")).is_err());
        assert!(Request::from_value(json!({ "type": 3 })).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"kind":"refresh"}"#).is_err());
    }

    #[test]
    fn display_names_the_tag() {
        let format = AudioFormatDescriptor::linear_pcm(48_000.0, 16, 2);
        assert_eq!(Request::Refresh.to_string(), "refresh");
        assert_eq!(
            Request::SetDeviceSampleRate(format).to_string(),
            "setDeviceSampleRate(48000 Hz)"
        );
    }
}
