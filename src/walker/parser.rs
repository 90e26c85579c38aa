//! Streaming sitemap XML decoder
//!
//! Documents are read one token at a time, so only the fields of the element
//! currently being decoded are held in memory. Both `<urlset>` documents and
//! `<sitemapindex>` documents are handled by the same reader; the caller sees
//! a sequence of [`SitemapRecord`]s in document order.
//!
//! Decoding is lenient: namespace prefixes are ignored, unknown elements are
//! skipped, mismatched end tags are tolerated, and text with broken entity
//! references is kept verbatim.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use quick_xml::errors::IllFormedError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

/// Fields of a `<url>` element, as raw text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: String,
    pub priority: String,
}

/// Fields of a `<sitemap>` element inside a sitemap index, as raw text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
}

/// One decoded element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapRecord {
    Url(UrlEntry),
    Sitemap(SitemapEntry),
}

/// Why decoding stopped early
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("decoding cancelled")]
    Cancelled,

    #[error("body read timed out")]
    Timeout,

    #[error(transparent)]
    Xml(quick_xml::Error),
}

impl From<quick_xml::Error> for DecodeError {
    fn from(err: quick_xml::Error) -> Self {
        match &err {
            quick_xml::Error::Io(io) if io.kind() == io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Xml(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    LastMod,
    ChangeFreq,
    Priority,
}

/// The element currently being assembled
#[derive(Debug)]
struct Pending {
    record: SitemapRecord,
    /// Nesting below the record element; 1 means a direct child
    depth: usize,
    field: Option<Field>,
    text: String,
}

impl Pending {
    fn open(name: &[u8]) -> Option<Self> {
        let record = match name {
            b"url" => SitemapRecord::Url(UrlEntry::default()),
            b"sitemap" => SitemapRecord::Sitemap(SitemapEntry::default()),
            _ => return None,
        };
        Some(Self {
            record,
            depth: 0,
            field: None,
            text: String::new(),
        })
    }

    fn field_for(&self, name: &[u8]) -> Option<Field> {
        match (&self.record, name) {
            (_, b"loc") => Some(Field::Loc),
            (_, b"lastmod") => Some(Field::LastMod),
            (SitemapRecord::Url(_), b"changefreq") => Some(Field::ChangeFreq),
            (SitemapRecord::Url(_), b"priority") => Some(Field::Priority),
            _ => None,
        }
    }

    fn collecting(&self) -> bool {
        self.depth == 1 && self.field.is_some()
    }

    fn commit(&mut self) {
        let Some(field) = self.field.take() else {
            return;
        };
        let text = std::mem::take(&mut self.text);
        match (&mut self.record, field) {
            (SitemapRecord::Url(entry), Field::Loc) => entry.loc = text,
            (SitemapRecord::Url(entry), Field::LastMod) => entry.lastmod = text,
            (SitemapRecord::Url(entry), Field::ChangeFreq) => entry.changefreq = text,
            (SitemapRecord::Url(entry), Field::Priority) => entry.priority = text,
            (SitemapRecord::Sitemap(entry), Field::Loc) => entry.loc = text,
            (SitemapRecord::Sitemap(entry), Field::LastMod) => entry.lastmod = text,
            (SitemapRecord::Sitemap(_), _) => {}
        }
    }
}

/// Pull-based reader producing one [`SitemapRecord`] per call
pub struct SitemapReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> SitemapReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;

        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Decodes the next `<url>` or `<sitemap>` element
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The next element in document order
    /// * `Ok(None)` - The document ended cleanly
    /// * `Err(DecodeError)` - Cancelled, timed out, or the token stream is corrupt
    pub async fn next_record(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<SitemapRecord>, DecodeError> {
        let mut pending: Option<Pending> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(DecodeError::Cancelled);
            }

            self.buf.clear();
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
                event = self.reader.read_event_into_async(&mut self.buf) => event?,
            };

            match event {
                Event::Start(start) => match pending.as_mut() {
                    None => pending = Pending::open(start.local_name().as_ref()),
                    Some(current) => {
                        current.depth += 1;
                        if current.depth == 1 {
                            current.field = current.field_for(start.local_name().as_ref());
                            current.text.clear();
                        }
                    }
                },
                Event::Empty(empty) => {
                    if pending.is_none() {
                        if let Some(open) = Pending::open(empty.local_name().as_ref()) {
                            return Ok(Some(open.record));
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = pending.as_mut().filter(|p| p.collecting()) {
                        match text.unescape() {
                            Ok(unescaped) => current.text.push_str(&unescaped),
                            Err(_) => {
                                unescape_lenient(&String::from_utf8_lossy(&text), &mut current.text)
                            }
                        }
                    }
                }
                Event::CData(cdata) => {
                    if let Some(current) = pending.as_mut().filter(|p| p.collecting()) {
                        current.text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::End(_) => {
                    if let Some(mut current) = pending.take() {
                        if current.depth == 0 {
                            tracing::trace!(record = ?current.record, "Decoded sitemap record");
                            return Ok(Some(current.record));
                        }
                        if current.depth == 1 {
                            current.commit();
                        }
                        current.depth -= 1;
                        pending = Some(current);
                    }
                }
                Event::Eof => {
                    return match pending {
                        Some(current) => Err(DecodeError::Xml(quick_xml::Error::IllFormed(
                            IllFormedError::MissingEndTag(record_name(&current.record).to_string()),
                        ))),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }
}

fn record_name(record: &SitemapRecord) -> &'static str {
    match record {
        SitemapRecord::Url(_) => "url",
        SitemapRecord::Sitemap(_) => "sitemap",
    }
}

/// Parses a `<lastmod>` value
///
/// Accepted forms, tried in order: RFC 3339 (with or without fractional
/// seconds), a bare date (UTC midnight), a bare date-time (UTC), and RFC 1123
/// with a zone name or numeric offset.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().fixed_offset());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    DateTime::parse_from_rfc2822(trimmed).ok()
}

/// Resolves entity references one at a time into `out`
///
/// Predefined and numeric references are decoded. Unknown or unterminated
/// ones are copied through as written.
fn unescape_lenient(raw: &str, out: &mut String) {
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = tail
            .find(';')
            .and_then(|end| resolve_entity(&tail[..end]).map(|ch| (ch, end + 1)));
        match resolved {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                Some(_) => return None,
                None if number.bytes().all(|b| b.is_ascii_digit()) => number.parse().ok()?,
                None => return None,
            };
            char::from_u32(code)
        }
    }
}

/// Parses a `<priority>` value; no range check is applied
pub fn parse_priority(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
