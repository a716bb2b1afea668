use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single device registration as posted by clients.
///
/// Field contents are not validated: any string is accepted and missing
/// keys decode as empty strings. Keys are matched without regard to ASCII
/// case, unknown keys are skipped and a `null` value leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    #[serde(rename = "DeviceType")]
    pub device_type: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "RoutingType")]
    pub routing_type: String,
}

impl<'de> Deserialize<'de> for DeviceRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = DeviceRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a device record object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<DeviceRecord, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut record = DeviceRecord::default();

        // Later duplicates overwrite earlier ones
        while let Some(key) = map.next_key::<String>()? {
            match record.field_mut(&key) {
                Some(field) => {
                    if let Some(value) = map.next_value::<Option<String>>()? {
                        *field = value;
                    }
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(record)
    }
}

impl DeviceRecord {
    pub fn new(
        device_name: impl Into<String>,
        device_type: impl Into<String>,
        ip_address: impl Into<String>,
        routing_type: impl Into<String>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            device_type: device_type.into(),
            ip_address: ip_address.into(),
            routing_type: routing_type.into(),
        }
    }

    /// Format the record as one log line, newline included.
    pub fn log_line<Tz>(&self, timestamp: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "[{}] Name={}, Type={}, IP={}, Routing={}\n",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.device_name,
            self.device_type,
            self.ip_address,
            self.routing_type
        )
    }

    pub fn to_log_line(&self) -> String {
        self.log_line(&Local::now())
    }

    /// Decode the first JSON value of a request body.
    ///
    /// Anything after that value is ignored and a top-level `null` yields an
    /// empty record. An empty body is an error.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<DeviceRecord>>();
        match values.next() {
            Some(record) => Ok(record?.unwrap_or_default()),
            None => Err(de::Error::custom("empty request body")),
        }
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        if key.eq_ignore_ascii_case("DeviceName") {
            Some(&mut self.device_name)
        } else if key.eq_ignore_ascii_case("DeviceType") {
            Some(&mut self.device_type)
        } else if key.eq_ignore_ascii_case("IPAddress") {
            Some(&mut self.ip_address)
        } else if key.eq_ignore_ascii_case("RoutingType") {
            Some(&mut self.routing_type)
        } else {
            None
        }
    }
}
