//! Response body decoding
//!
//! Sitemap files are served either as plain XML or as raw gzip (`.xml.gz`),
//! often without a matching `Content-Encoding`. The first two bytes decide.

use async_compression::tokio::bufread::GzipDecoder;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use std::io;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::io::StreamReader;

/// gzip member header magic
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Buffer size for the decompressed side of a gzip body
const DECODE_BUFFER_SIZE: usize = 64 * 1024;

/// A decoded sitemap byte stream
///
/// Dropping it releases the underlying connection and any decompressor state.
pub type SitemapBody = Box<dyn AsyncBufRead + Send + Unpin>;

/// Wraps a response byte stream, transparently inflating gzip payloads
///
/// Chunks are pulled until two bytes are buffered (or the stream ends). Those
/// bytes are replayed in front of the rest of the stream, so readers see every
/// byte exactly once. Failures while peeking are returned as-is; later stream
/// failures surface through the reader as `io::Error`s built by `into_io`.
///
/// # Arguments
///
/// * `stream` - The raw body chunks
/// * `into_io` - Converts stream errors for the reader side
///
/// # Returns
///
/// * `Ok(SitemapBody)` - A buffered reader over the (possibly inflated) body
/// * `Err(E)` - The stream failed before two bytes arrived
pub async fn decode_body<S, E>(mut stream: S, into_io: fn(E) -> io::Error) -> Result<SitemapBody, E>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Send + 'static,
{
    let mut prefix = BytesMut::new();
    while prefix.len() < GZIP_MAGIC.len() {
        match stream.next().await {
            Some(chunk) => prefix.extend_from_slice(&chunk?),
            None => break,
        }
    }

    let gzipped = is_gzip(&prefix);
    let replayed = stream::iter([Ok(prefix.freeze())])
        .chain(stream)
        .map(move |chunk| chunk.map_err(into_io));
    let reader = StreamReader::new(replayed);

    if gzipped {
        let mut decoder = GzipDecoder::new(reader);
        decoder.multiple_members(true);
        Ok(Box::new(BufReader::with_capacity(DECODE_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Checks whether a byte prefix starts a gzip member
pub fn is_gzip(prefix: &[u8]) -> bool {
    prefix.starts_with(&GZIP_MAGIC)
}
