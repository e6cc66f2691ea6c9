//! Leaf-text digest over TISS documents.
//!
//! The digest ignores structure entirely: tags, attributes, comments, processing instructions
//! and the declaration are discarded and the remaining text values are concatenated in document
//! order. The concatenation is hashed as Latin-1 bytes with MD5.

use crate::encoding::encode_latin1;
use crate::error::{IntegrityError, IntegrityResult};
use crate::tree;
use md5::{Digest, Md5};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// Local name of the trailing element that carries the digest
pub const EPILOGUE_ELEMENT: &str = "epilogo";
/// Local name of the digest element inside the epilogue
pub const HASH_ELEMENT: &str = "hash";

/// Result of re-deriving a document's digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub matches: bool,
    pub embedded: String,
    pub computed: String,
}

/// Every non-empty text value of the document, in document order.
///
/// Adjacent text and CDATA segments inside one element are joined before trimming, so a comment
/// in the middle of a value does not split it. Only the whitespace around a value is trimmed;
/// whitespace inside it is kept.
pub fn leaf_values(doc: &str) -> IntegrityResult<Vec<String>> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().trim_text(false);

    let mut values = Vec::new();
    let mut pending = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(text) => pending.push_str(&text.unescape()?),
            Event::CData(data) => pending.push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::Start(_) | Event::End(_) | Event::Empty(_) => flush(&mut pending, &mut values),
            Event::Eof => {
                flush(&mut pending, &mut values);
                break;
            }
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    Ok(values)
}

fn flush(pending: &mut String, values: &mut Vec<String>) {
    let trimmed = pending.trim();
    if !trimmed.is_empty() {
        values.push(trimmed.to_string());
    }
    pending.clear();
}

/// Concatenation of [`leaf_values`], the digest input.
pub fn extract_leaf_values(doc: &str) -> IntegrityResult<String> {
    Ok(leaf_values(doc)?.concat())
}

/// MD5 over the Latin-1 bytes of `content`, as 32 lowercase hex characters.
///
/// Fails with [`IntegrityError::Encoding`] when `content` holds characters above U+00FF; run
/// [`crate::sanitize_encoding`] over free text before it reaches a document.
pub fn digest(content: &str) -> IntegrityResult<String> {
    let bytes = encode_latin1(content)?;
    Ok(format!("{:x}", Md5::digest(&bytes)))
}

/// Digest of a whole document, ignoring any epilogue it already carries.
pub fn digest_document(doc: &str) -> IntegrityResult<String> {
    let stripped = strip_epilogue(doc)?;
    digest(&extract_leaf_values(&stripped)?)
}

/// Remove every epilogue element from the document.
pub fn strip_epilogue(doc: &str) -> IntegrityResult<String> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().trim_text(false);

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(start) if start.local_name().as_ref() == EPILOGUE_ELEMENT.as_bytes() => {
                reader.read_to_end(start.name())?;
                ranges.push((before, reader.buffer_position() as usize));
            }
            Event::Empty(start) if start.local_name().as_ref() == EPILOGUE_ELEMENT.as_bytes() => {
                ranges.push((before, reader.buffer_position() as usize));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if ranges.is_empty() {
        return Ok(doc.to_string());
    }

    let mut out = String::with_capacity(doc.len());
    let mut cursor = 0;
    for (start, end) in ranges {
        out.push_str(slice(doc, cursor, start)?);
        cursor = end;
    }
    out.push_str(slice(doc, cursor, doc.len())?);
    Ok(out)
}

fn slice(doc: &str, start: usize, end: usize) -> IntegrityResult<&str> {
    doc.get(start..end).ok_or_else(|| {
        IntegrityError::Structure(format!("invalid byte range {}..{}", start, end))
    })
}

/// The digest carried in the document's epilogue.
pub fn embedded_digest(doc: &str) -> IntegrityResult<String> {
    let parsed = tree::parse(doc)?;
    parsed
        .root
        .find(EPILOGUE_ELEMENT)
        .and_then(|epilogue| epilogue.text_of(HASH_ELEMENT))
        .map(str::to_string)
        .ok_or(IntegrityError::MissingDigest)
}

/// Compute the digest and insert an epilogue right before the root closing tag.
///
/// Any epilogue already present is replaced. The epilogue uses the root element's namespace
/// prefix.
pub fn embed(doc: &str) -> IntegrityResult<String> {
    let stripped = strip_epilogue(doc)?;
    let hash = digest(&extract_leaf_values(&stripped)?)?;

    let root = root_name(&stripped)?;
    let closing = format!("</{}>", root);
    let position = stripped.rfind(&closing).ok_or_else(|| {
        IntegrityError::Structure(format!("root closing tag {} not found", closing))
    })?;

    let prefix = root
        .split_once(':')
        .map(|(prefix, _)| format!("{}:", prefix))
        .unwrap_or_default();
    let epilogue = format!(
        "<{p}{e}><{p}{h}>{hash}</{p}{h}></{p}{e}>",
        p = prefix,
        e = EPILOGUE_ELEMENT,
        h = HASH_ELEMENT,
        hash = hash
    );

    debug!(root = %root, digest = %hash, "embedding epilogue");

    let mut out = String::with_capacity(stripped.len() + epilogue.len());
    out.push_str(slice(&stripped, 0, position)?);
    out.push_str(&epilogue);
    out.push_str(slice(&stripped, position, stripped.len())?);
    Ok(out)
}

/// Compare the embedded digest with one recomputed from the rest of the document.
pub fn verify(doc: &str) -> IntegrityResult<Verification> {
    let embedded = embedded_digest(doc)?;
    let computed = digest_document(doc)?;
    let matches = embedded.to_ascii_lowercase() == computed;

    if !matches {
        debug!(embedded = %embedded, computed = %computed, "digest mismatch");
    }

    Ok(Verification {
        matches,
        embedded,
        computed,
    })
}

fn root_name(doc: &str) -> IntegrityResult<String> {
    let mut reader = Reader::from_str(doc);
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                return Ok(String::from_utf8_lossy(start.name().as_ref()).into_owned())
            }
            Event::Empty(start) => {
                return Err(IntegrityError::Structure(format!(
                    "root element <{}/> has no closing tag",
                    String::from_utf8_lossy(start.name().as_ref())
                )))
            }
            Event::Eof => {
                return Err(IntegrityError::Structure(
                    "document has no root element".to_string(),
                ))
            }
            _ => {}
        }
    }
}
