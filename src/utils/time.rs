use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a timestamp as stored by the backend.
///
/// RFC 3339 is tried first. Timestamps without an offset are read as UTC.
pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(datetime) => Ok(datetime),
        Err(err) => {
            let naive = format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
            );
            PrimitiveDateTime::parse(s, naive)
                .map(PrimitiveDateTime::assume_utc)
                .map_err(|_| err)
        }
    }
}

/// Deserialize a backend timestamp into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}
