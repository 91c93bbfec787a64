//! Serialize/deserialize contract for [`TimeSeries`].
//!
//! A series is written as its four parts plus the global metadata. Channel
//! arrays are flattened to a shape and row-major values. JSON has no NaN or
//! infinity: NaN is written as `null` and the infinities as the strings
//! `"inf"` and `"-inf"`, on the time axis and in every channel, so every
//! value reads back as written. Reading re-checks every channel against the
//! time axis.
//!
//! ```
//! use kinetrace_core::TimeSeries;
//! let mut ts = TimeSeries::new(vec![0.0, 0.5])
//!     .with_scalar("Forces", vec![f64::INFINITY, f64::NAN])
//!     .unwrap();
//! ts.add_event(0.25, "push").unwrap();
//! let json = ts.to_json().unwrap();
//! let back = TimeSeries::from_json(&json).unwrap();
//! assert_eq!(back.events(), ts.events());
//! assert_eq!(back.data("Forces").unwrap()[[0]], f64::INFINITY);
//! assert!(back.data("Forces").unwrap()[[1]].is_nan());
//! assert!(json.contains(r#""values":["inf",null]"#));
//! ```

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::timeseries::TimeSeries;
use crate::{Event, KinetraceError, Metadata};

/// `f64` sequences with NaN as `null` and the infinities as `"inf"`/`"-inf"`.
mod lossless {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const POS_INF: &str = "inf";
    const NEG_INF: &str = "-inf";

    struct Encoded(f64);

    impl serde::Serialize for Encoded {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self.0 {
                v if v.is_finite() => serializer.serialize_f64(v),
                v if v.is_nan() => serializer.serialize_none(),
                v if v > 0.0 => serializer.serialize_str(POS_INF),
                _ => serializer.serialize_str(NEG_INF),
            }
        }
    }

    impl<'de> Deserialize<'de> for Encoded {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum TextOrNumber {
                Number(f64),
                Text(String),
            }

            match Option::<TextOrNumber>::deserialize(deserializer)? {
                None => Ok(Self(f64::NAN)),
                Some(TextOrNumber::Number(v)) => Ok(Self(v)),
                Some(TextOrNumber::Text(s)) => match s.as_str() {
                    POS_INF => Ok(Self(f64::INFINITY)),
                    NEG_INF => Ok(Self(f64::NEG_INFINITY)),
                    other => Err(D::Error::custom(format!(
                        "expected a number, null, \"{POS_INF}\" or \"{NEG_INF}\", got \"{other}\""
                    ))),
                },
            }
        }
    }

    pub(super) fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| Encoded(*v)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<f64>, D::Error> {
        let encoded = Vec::<Encoded>::deserialize(deserializer)?;
        Ok(encoded.into_iter().map(|e| e.0).collect())
    }
}

/// One channel in its on-disk form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChannel {
    /// Full array shape; axis 0 is time.
    pub shape: Vec<usize>,
    /// Row-major values.
    #[serde(with = "lossless")]
    pub values: Vec<f64>,
}

impl From<&ArrayD<f64>> for RawChannel {
    fn from(arr: &ArrayD<f64>) -> Self {
        Self {
            shape: arr.shape().to_vec(),
            values: arr.iter().copied().collect(),
        }
    }
}

impl RawChannel {
    fn into_array(self, name: &str) -> Result<ArrayD<f64>, KinetraceError> {
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.values).map_err(|e| {
            KinetraceError::Data(format!("channel '{name}' does not match its shape: {e}"))
        })
    }
}

/// On-disk form of a [`TimeSeries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimeSeries {
    /// Time axis.
    #[serde(with = "lossless")]
    pub time: Vec<f64>,
    /// Global metadata.
    #[serde(default)]
    pub time_info: Metadata,
    /// Channels by name.
    #[serde(default)]
    pub data: BTreeMap<String, RawChannel>,
    /// Channel metadata by name.
    #[serde(default)]
    pub data_info: BTreeMap<String, Metadata>,
    /// Events.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl From<TimeSeries> for RawTimeSeries {
    fn from(ts: TimeSeries) -> Self {
        Self {
            data: ts
                .data
                .iter()
                .map(|(k, v)| (k.clone(), RawChannel::from(v)))
                .collect(),
            time: ts.time,
            time_info: ts.time_info,
            data_info: ts.data_info,
            events: ts.events,
        }
    }
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = KinetraceError;

    fn try_from(raw: RawTimeSeries) -> Result<Self, Self::Error> {
        let mut data = BTreeMap::new();
        for (name, channel) in raw.data {
            let arr = channel.into_array(&name)?;
            data.insert(name, arr);
        }
        Self::from_parts(raw.time, data, raw.data_info, raw.events, raw.time_info)
    }
}

impl TimeSeries {
    /// Serialize to a JSON string.
    ///
    /// # Errors
    /// Returns `Data` if serialization fails.
    pub fn to_json(&self) -> Result<String, KinetraceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON string, re-validating the channel-length invariant.
    ///
    /// # Errors
    /// Returns `Data` for malformed input and `ShapeMismatch` if a channel's
    /// length does not match the time axis.
    pub fn from_json(s: &str) -> Result<Self, KinetraceError> {
        let raw: RawTimeSeries = serde_json::from_str(s)?;
        Self::try_from(raw)
    }
}
