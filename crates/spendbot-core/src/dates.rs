//! Calendar date formats used across the bot and the backend.
//!
//! Users type `dd.mm.yyyy`; requests travel as `yyyy-mm-dd`; records come
//! back rendered as `dd.mm.yyyy`.

use chrono::NaiveDate;

pub const USER_DATE_FORMAT: &str = "%d.%m.%Y";
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Strict user-facing parse (`dd.mm.yyyy`, must be a real calendar day).
pub fn parse_user_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), USER_DATE_FORMAT).ok()
}

/// Wire parse (`yyyy-mm-dd`).
pub fn parse_wire_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), WIRE_DATE_FORMAT)
}

/// Accepts either representation; used when reading payloads.
pub fn parse_any_date(input: &str) -> Option<NaiveDate> {
    parse_user_date(input).or_else(|| parse_wire_date(input).ok())
}

pub fn to_wire(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

pub fn to_display(date: NaiveDate) -> String {
    date.format(USER_DATE_FORMAT).to_string()
}

/// Serde adapter: writes `dd.mm.yyyy`, reads either format.
pub mod display_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_display(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_any_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

/// Serde adapter: writes `yyyy-mm-dd`, reads either format.
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::to_wire(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_any_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

pub mod wire_date_opt {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&super::to_wire(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        super::parse_any_date(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}
