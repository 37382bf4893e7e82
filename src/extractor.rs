//! Recovers the data blob a page embeds for client-side rendering.

use std::borrow::Cow;

use itertools::Itertools;
use log::trace;
use mhdata_scraping_utils::{regex, selector};
use scraper::Html;
use serde_json::Value;
use thiserror::Error;

/// Discriminator of the two supported embedding styles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum PayloadKind {
    /// `<script id="__NEXT_DATA__">` holding one JSON document.
    InlineJson,
    /// A sequence of `self.__next_f.push([1,"…"])` calls.
    StreamedChunks,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Payload {
    InlineJson(Value),
    StreamedChunks(String),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::InlineJson(_) => PayloadKind::InlineJson,
            Payload::StreamedChunks(_) => PayloadKind::StreamedChunks,
        }
    }

    /// Text that the record parser works on.
    ///
    /// Inline JSON is re-serialized compactly (keys keep their document order),
    /// so both variants expose the same `"key":value` motifs.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Payload::InlineJson(value) => Cow::Owned(value.to_string()),
            Payload::StreamedChunks(text) => Cow::Borrowed(text),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No embedded payload was found in the page")]
    NotFound,
    #[error("The __NEXT_DATA__ script is not valid JSON: {0}")]
    InvalidInlineJson(#[source] serde_json::Error),
    #[error("{count} streamed fragments were found but could not be unescaped: {source}")]
    InvalidStreamedChunks {
        count: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub fn extract(html: &str) -> Result<Payload, ExtractionError> {
    if let Some(payload) = extract_inline_json(html)? {
        return Ok(payload);
    }
    if let Some(payload) = extract_streamed_chunks(html)? {
        return Ok(payload);
    }
    Err(ExtractionError::NotFound)
}

fn extract_inline_json(html: &str) -> Result<Option<Payload>, ExtractionError> {
    let document = Html::parse_document(html);
    let Some(script) = document
        .select(selector!(r#"script[id="__NEXT_DATA__"]"#))
        .next()
    else {
        return Ok(None);
    };
    let text = script.text().collect::<String>();
    let value = serde_json::from_str(&text).map_err(ExtractionError::InvalidInlineJson)?;
    trace!("Found __NEXT_DATA__ ({} bytes)", text.len());
    Ok(Some(Payload::InlineJson(value)))
}

fn extract_streamed_chunks(html: &str) -> Result<Option<Payload>, ExtractionError> {
    let fragments = regex!(r#"self\.__next_f\.push\(\[1,\s*"((?:[^"\\]|\\.)*)"\]\)"#)
        .captures_iter(html)
        .map(|captures| captures.get(1).map_or("", |m| m.as_str()))
        .collect_vec();
    if fragments.is_empty() {
        return Ok(None);
    }
    trace!("Found {} streamed fragments", fragments.len());
    let text = unescape(&fragments.concat()).map_err(|source| {
        ExtractionError::InvalidStreamedChunks {
            count: fragments.len(),
            source,
        }
    })?;
    Ok(Some(Payload::StreamedChunks(text)))
}

/// Decodes the concatenated fragments as one JSON string literal body.
fn unescape(escaped: &str) -> serde_json::Result<String> {
    serde_json::from_str(&format!("\"{escaped}\""))
}
