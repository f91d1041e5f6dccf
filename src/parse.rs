//! Parser for the machine readable keyserver index (`op=vindex&options=mr`).
//!
//! ```text
//! info:1:2
//! pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:
//! uid:Paul Michael Furley <paul@paulfurley.com>:1482418217::
//! pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::r
//! uid:Paul M Furley (http%3A//paulfurley.com) <paul@paulfurley.com>:1392480548::
//! ```

use std::str::Lines;

use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::key::{PgpKey, PgpKeyBuilder};

const PUB_FIELDS: usize = 7;
const UID_FIELDS: usize = 5;

/// Lazily yields the keys of a vindex response, in input order.
///
/// Blocks that fail to parse are logged and skipped; they never stop the
/// keys that follow from being yielded.
pub struct VindexParser<'a> {
    blocks: VindexBlocks<'a>,
}

impl<'a> VindexParser<'a> {
    /// Fails only if the response is not UTF-8 text.
    pub fn from_bytes(response: &'a [u8]) -> Result<Self> {
        Ok(Self::new(std::str::from_utf8(response)?))
    }

    pub fn new(response: &'a str) -> Self {
        Self {
            blocks: VindexBlocks::new(response),
        }
    }
}

impl Iterator for VindexParser<'_> {
    type Item = PgpKey;

    fn next(&mut self) -> Option<PgpKey> {
        for block in self.blocks.by_ref() {
            match block.to_key() {
                Ok(key) => return Some(key),
                Err(Error::UnsupportedLegacyFingerprint(_)) => {}
                Err(err) => {
                    warn!(error = %err, pub_line = block.pub_line, "dropping key");
                }
            }
        }
        None
    }
}

/// The `pub:` line of one key and the `uid:` lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VindexBlock<'a> {
    pub pub_line: &'a str,
    pub uid_lines: Vec<&'a str>,
}

impl VindexBlock<'_> {
    pub fn to_key(&self) -> Result<PgpKey> {
        let mut builder = PgpKey::builder();

        update_from_pub_line(&mut builder, self.pub_line)?;
        for line in &self.uid_lines {
            update_from_uid_line(&mut builder, line)?;
        }

        Ok(builder.build())
    }
}

/// Splits a vindex response into per-key blocks.
///
/// A forward-only cursor over the response: the open block is held until the
/// next `pub:` line or the end of input closes it.
pub struct VindexBlocks<'a> {
    lines: Lines<'a>,
    current: Option<VindexBlock<'a>>,
}

impl<'a> VindexBlocks<'a> {
    pub fn new(response: &'a str) -> Self {
        Self {
            lines: response.lines(),
            current: None,
        }
    }
}

impl<'a> Iterator for VindexBlocks<'a> {
    type Item = VindexBlock<'a>;

    fn next(&mut self) -> Option<VindexBlock<'a>> {
        for line in self.lines.by_ref() {
            let record_type = line.split(':').next().unwrap_or_default();

            match record_type {
                "pub" => {
                    let block = VindexBlock {
                        pub_line: line,
                        uid_lines: Vec::new(),
                    };
                    if let Some(finished) = self.current.replace(block) {
                        return Some(finished);
                    }
                }
                "uid" => match self.current {
                    Some(ref mut block) => block.uid_lines.push(line),
                    None => debug!(line, "skipping uid line outside of a key"),
                },
                "info" | "" => {}
                _ => debug!(record_type, "skipping unknown vindex record type"),
            }
        }

        self.current.take()
    }
}

/// `pub:<fingerprint>:<algorithm>:<bits>:<created>:<expires>:<flags>`
fn update_from_pub_line(builder: &mut PgpKeyBuilder, line: &str) -> Result<()> {
    let fields: Vec<&str> = line.split(':').collect();
    let [_, fingerprint, algorithm, bits, created, expires, flag] = fields[..] else {
        return Err(malformed(
            line,
            format!("expected {PUB_FIELDS} fields, got {}", fields.len()),
        ));
    };

    if !flag.is_empty() && flag != "r" {
        info!(flag, "unexpected key flag");
    }

    builder.set_fingerprint(fingerprint)?;
    builder.set_algorithm_number(parse_number(line, "algorithm", algorithm)?);
    builder.set_size_bits(parse_number(line, "key length", bits)?);

    if !created.is_empty() {
        builder.set_created_timestamp(parse_number(line, "creation time", created)?)?;
    }

    if !expires.is_empty() {
        builder.set_expiry_timestamp(parse_number(line, "expiration time", expires)?)?;
    }

    if flag == "r" {
        builder.set_revoked();
    }

    Ok(())
}

/// `uid:<percent-encoded uid>:<created>::`
fn update_from_uid_line(builder: &mut PgpKeyBuilder, line: &str) -> Result<()> {
    let fields: Vec<&str> = line.split(':').collect();
    let [_, uid, _, _, _] = fields[..] else {
        return Err(malformed(
            line,
            format!("expected {UID_FIELDS} fields, got {}", fields.len()),
        ));
    };

    builder.add_uid(percent_decode_str(uid).decode_utf8_lossy())?;
    Ok(())
}

fn parse_number<T: std::str::FromStr>(line: &str, what: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| malformed(line, format!("invalid {what} '{value}'")))
}

fn malformed(line: &str, reason: String) -> Error {
    Error::MalformedRecord {
        line: line.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const SAMPLE_MULTIPLE_KEYS: &str = "info:1:2
pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:
uid:Paul Michael Furley <paul@paulfurley.com>:1482418217::
uid:Paul Michael Furley <furbitso@gmail.com>:1482418217::
pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::r
uid:Paul M Furley (http%3A//paulfurley.com) <paul@paulfurley.com>:1392480548::
";

    fn parse(response: &str) -> Vec<PgpKey> {
        VindexParser::new(response).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_split_on_key() {
        let blocks: Vec<_> = VindexBlocks::new(SAMPLE_MULTIPLE_KEYS).collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            VindexBlock {
                pub_line: "pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:",
                uid_lines: vec![
                    "uid:Paul Michael Furley <paul@paulfurley.com>:1482418217::",
                    "uid:Paul Michael Furley <furbitso@gmail.com>:1482418217::",
                ],
            }
        );
        assert_eq!(
            blocks[1],
            VindexBlock {
                pub_line: "pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::r",
                uid_lines: vec![
                    "uid:Paul M Furley (http%3A//paulfurley.com) <paul@paulfurley.com>:1392480548::",
                ],
            }
        );
    }

    #[test]
    fn test_split_ignores_leading_uid_and_unknown_lines() {
        let response = "uid:orphan <orphan@example.com>:1::\n\
                        something:else\n\
                        pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274::\n";
        let blocks: Vec<_> = VindexBlocks::new(response).collect();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].uid_lines.is_empty());
    }

    #[test]
    fn test_parse_keys() {
        let keys = parse(SAMPLE_MULTIPLE_KEYS);
        assert_eq!(keys.len(), 2);

        let first = &keys[0];
        assert!(*first.fingerprint().unwrap() == "A999B7498D1A8DC473E53C92309F635DAD1B5517");
        assert_eq!(first.algorithm_number(), Some(1));
        assert_eq!(first.size_bits(), Some(4096));
        assert_eq!(first.created_date(), Some(date(2014, 10, 31)));
        assert_eq!(first.expiry_date(), Some(date(2017, 12, 22)));
        assert!(!first.is_revoked());
        assert_eq!(first.raw_uids().len(), 2);

        let second = &keys[1];
        assert!(*second.fingerprint().unwrap() == "5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB");
        assert!(second.is_revoked());
        assert_eq!(second.expiry_date(), None);
        assert_eq!(
            second.raw_uids(),
            ["Paul M Furley (http://paulfurley.com) <paul@paulfurley.com>"]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_empty());
        assert!(parse("info:1:0\n").is_empty());
    }

    #[test]
    fn test_parse_empty_created_date_as_none() {
        let keys = parse("pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:::\n");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].created_date(), None);
        assert_eq!(keys[0].expiry_date(), None);
    }

    #[test]
    fn test_parse_unicode_uid() {
        let keys = parse(
            "pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274::\n\
             uid:Tobias Y%C3%BCksel <Tobias.yueksel@googlemail.com>:1482418217::\n",
        );
        assert_eq!(
            keys[0].email_lines(),
            vec!["Tobias Yüksel <Tobias.yueksel@googlemail.com>"]
        );
    }

    #[test]
    fn test_null_byte_in_uid_drops_whole_key() {
        let keys = parse(
            "pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274::\n\
             uid:Paul <paul@example.com>:1482418217::\n\
             uid:Evil%00 <evil@example.com>:1482418217::\n\
             pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::\n",
        );
        assert_eq!(keys.len(), 1);
        assert!(*keys[0].fingerprint().unwrap() == "5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB");
    }

    #[test]
    fn test_legacy_fingerprint_dropped() {
        let keys = parse(
            "pub:309F635DAD1B5517:1:1024:1000000000::\n\
             uid:Old Key <old@example.com>:1000000000::\n\
             pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::\n",
        );
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_malformed_blocks_skipped() {
        let keys = parse(
            "pub:NOTAFINGERPRINT:1:4096:1414791274::\n\
             pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096\n\
             pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:rsa:4096:1414791274::\n\
             pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274::\n\
             uid:too:many:fields:here:now:\n\
             pub:5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB:1:2048:1392480548::\n",
        );
        assert_eq!(keys.len(), 1);
        assert!(*keys[0].fingerprint().unwrap() == "5DD5B8F28CBEFA024F9F472B638C78A5E281ACDB");
    }

    #[test]
    fn test_unexpected_flag_not_fatal() {
        let keys = parse("pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274::d\n");
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].is_revoked());
    }

    #[test]
    fn test_crlf_line_endings() {
        let keys = parse(
            "info:1:1\r\n\
             pub:A999B7498D1A8DC473E53C92309F635DAD1B5517:1:4096:1414791274:1513954217:\r\n\
             uid:Paul <paul@example.com>:1482418217::\r\n",
        );
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].expiry_date(), Some(date(2017, 12, 22)));
        assert_eq!(keys[0].email_lines(), vec!["Paul <paul@example.com>"]);
    }

    #[test]
    fn test_from_bytes_rejects_non_utf8() {
        let result = VindexParser::from_bytes(b"pub:\xff\xfe");
        assert!(matches!(result, Err(Error::NotText(_))));
    }

    #[test]
    fn test_iteration_is_lazy() {
        let mut parser = VindexParser::new(SAMPLE_MULTIPLE_KEYS);
        let first = parser.next().unwrap();
        assert_eq!(first.size_bits(), Some(4096));
        let second = parser.next().unwrap();
        assert_eq!(second.size_bits(), Some(2048));
        assert!(parser.next().is_none());
    }
}
