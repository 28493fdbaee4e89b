//! Property list reading.
//!
//! Alfred stores its preferences as binary property lists and workflow
//! manifests (`info.plist`) as XML property lists. Binary files are turned
//! into XML with `plutil`, which ships with macOS; XML is parsed directly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::name::QName;

/// Magic bytes at the start of a binary property list
const BINARY_MAGIC: &[u8] = b"bplist";

/// A parsed property list value
#[derive(Debug, Clone, PartialEq)]
pub enum PlistValue {
    Dict(BTreeMap<String, PlistValue>),
    Array(Vec<PlistValue>),
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// ISO 8601 timestamp, kept as text
    Date(String),
    /// Base64 payload, kept as text with whitespace removed
    Data(String),
}

impl PlistValue {
    /// Look up a key if this value is a dict
    pub fn get(&self, key: &str) -> Option<&PlistValue> {
        match self {
            PlistValue::Dict(dict) => dict.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlistValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, PlistValue>> {
        match self {
            PlistValue::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Convenience for `get(key)` followed by `as_str()`
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PlistValue::as_str)
    }
}

/// Read a property list file in either binary or XML format
pub fn read_plist(path: &Path) -> Result<PlistValue> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read plist: {}", path.display()))?;

    let xml = if bytes.starts_with(BINARY_MAGIC) {
        convert_to_xml(path)?
    } else {
        String::from_utf8(bytes)
            .with_context(|| format!("plist is not valid UTF-8: {}", path.display()))?
    };

    parse_xml(&xml).with_context(|| format!("failed to parse plist: {}", path.display()))
}

/// Convert a binary plist to XML with `plutil`
fn convert_to_xml(path: &Path) -> Result<String> {
    let output = Command::new("plutil")
        .args(["-convert", "xml1", "-o", "-"])
        .arg(path)
        .output()
        .with_context(|| format!("failed to run plutil on {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "plutil could not convert {}: {}",
            path.display(),
            stderr.trim()
        );
    }

    String::from_utf8(output.stdout).context("plutil produced invalid UTF-8")
}

/// Parse an XML property list document
pub fn parse_xml(xml: &str) -> Result<PlistValue> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"plist" => break,
            Event::Eof => bail!("missing <plist> element"),
            _ => {}
        }
    }

    read_value(&mut reader)?.ok_or_else(|| anyhow!("empty <plist> element"))
}

/// Read the next value. Returns `None` when the enclosing element ends.
fn read_value(reader: &mut Reader<&[u8]>) -> Result<Option<PlistValue>> {
    loop {
        let value = match reader.read_event()? {
            Event::Start(e) => {
                let tag = e.name().as_ref().to_vec();
                match tag.as_slice() {
                    b"dict" => read_dict(reader)?,
                    b"array" => read_array(reader)?,
                    _ => {
                        let text = read_text(reader, &tag)?;
                        scalar(&tag, text)?
                    }
                }
            }
            Event::Empty(e) => empty_value(e.name().as_ref())?,
            Event::End(_) => return Ok(None),
            Event::Eof => bail!("unexpected end of document"),
            _ => continue,
        };
        return Ok(Some(value));
    }
}

fn read_dict(reader: &mut Reader<&[u8]>) -> Result<PlistValue> {
    let mut dict = BTreeMap::new();

    loop {
        let key = match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"key" => read_text(reader, b"key")?,
            Event::Empty(e) if e.name().as_ref() == b"key" => String::new(),
            Event::End(_) => return Ok(PlistValue::Dict(dict)),
            Event::Eof => bail!("unexpected end of document inside <dict>"),
            Event::Start(e) | Event::Empty(e) => bail!(
                "expected <key> in <dict>, found <{}>",
                String::from_utf8_lossy(e.name().as_ref())
            ),
            _ => continue,
        };

        let value = read_value(reader)?
            .ok_or_else(|| anyhow!("missing value for key '{}'", key))?;
        dict.insert(key, value);
    }
}

fn read_array(reader: &mut Reader<&[u8]>) -> Result<PlistValue> {
    let mut items = Vec::new();
    while let Some(value) = read_value(reader)? {
        items.push(value);
    }
    Ok(PlistValue::Array(items))
}

fn read_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String> {
    let raw = reader.read_text(QName(tag))?;
    Ok(unescape(&raw)?.into_owned())
}

fn scalar(tag: &[u8], text: String) -> Result<PlistValue> {
    let value = match tag {
        b"string" => PlistValue::String(text),
        b"integer" => PlistValue::Integer(
            text.trim()
                .parse()
                .with_context(|| format!("invalid <integer>: {}", text))?,
        ),
        b"real" => PlistValue::Real(
            text.trim()
                .parse()
                .with_context(|| format!("invalid <real>: {}", text))?,
        ),
        b"date" => PlistValue::Date(text),
        b"data" => PlistValue::Data(text.split_whitespace().collect()),
        b"true" => PlistValue::Boolean(true),
        b"false" => PlistValue::Boolean(false),
        other => bail!("unknown plist element <{}>", String::from_utf8_lossy(other)),
    };
    Ok(value)
}

fn empty_value(tag: &[u8]) -> Result<PlistValue> {
    match tag {
        b"dict" => Ok(PlistValue::Dict(BTreeMap::new())),
        b"array" => Ok(PlistValue::Array(Vec::new())),
        _ => scalar(tag, String::new()),
    }
}
