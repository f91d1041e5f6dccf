use std::io;

use chrono::NaiveDate;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::PgpKey;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Separates uids in the flat `uids` column. Each uid is percent-encoded
/// first, so a literal `|` inside a uid is written as `%7C`.
pub const UID_SEPARATOR: &str = "|";

const UID_ESCAPES: &AsciiSet = &CONTROLS.add(b'%').add(b'|');

/// A key as one flat row of the keys file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub fingerprint: String,
    pub algorithm_number: String,
    pub size_bits: String,
    pub uids: String,
    pub created_date: String,
    pub expiry_date: String,
}

impl KeyRecord {
    pub fn from_key(key: &PgpKey) -> Self {
        Self {
            fingerprint: key
                .fingerprint()
                .map(|fpr| fpr.as_str().to_string())
                .unwrap_or_default(),
            algorithm_number: optional_to_string(key.algorithm_number()),
            size_bits: optional_to_string(key.size_bits()),
            uids: key
                .raw_uids()
                .iter()
                .map(|uid| encode_uid(uid))
                .collect::<Vec<_>>()
                .join(UID_SEPARATOR),
            created_date: format_date(key.created_date()),
            expiry_date: format_date(key.expiry_date()),
        }
    }

    pub fn into_key(self) -> Result<PgpKey> {
        let mut builder = PgpKey::builder();

        if !self.fingerprint.is_empty() {
            builder.set_fingerprint(&self.fingerprint)?;
        }
        if !self.algorithm_number.is_empty() {
            builder.set_algorithm_number(parse_column(
                "algorithm_number",
                &self.algorithm_number,
            )?);
        }
        if !self.size_bits.is_empty() {
            builder.set_size_bits(parse_column("size_bits", &self.size_bits)?);
        }
        if !self.uids.is_empty() {
            for uid in self.uids.split(UID_SEPARATOR) {
                builder.add_uid(decode_uid(uid)?)?;
            }
        }
        builder.set_created_date(parse_date(&self.created_date)?);
        builder.set_expiry_date(parse_date(&self.expiry_date)?);

        Ok(builder.build())
    }
}

/// Writes a header and one fully quoted row per key.
pub fn write_records<'k, W, I>(writer: W, keys: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = &'k PgpKey>,
{
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    for key in keys {
        csv_writer.serialize(KeyRecord::from_key(key))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Reads keys written by [`write_records`], one result per row.
pub fn read_records<R: io::Read>(reader: R) -> impl Iterator<Item = Result<PgpKey>> {
    csv::Reader::from_reader(reader)
        .into_deserialize::<KeyRecord>()
        .map(|record| record.map_err(Error::from)?.into_key())
}

fn encode_uid(uid: &str) -> String {
    utf8_percent_encode(uid, UID_ESCAPES).to_string()
}

fn decode_uid(encoded: &str) -> Result<String> {
    Ok(percent_decode_str(encoded).decode_utf8()?.into_owned())
}

fn optional_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::InvalidDate {
            value: value.to_string(),
        })
}

fn parse_column(column: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| Error::MalformedRecord {
        line: value.to_string(),
        reason: format!("invalid {column}"),
    })
}
