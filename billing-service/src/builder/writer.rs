use crate::error::{BillingError, BillingResult};
use crate::money::format_money;
use crate::wire::{TISS_NAMESPACE, TISS_PREFIX, WIRE_ENCODING};
use chrono::{NaiveDate, NaiveTime};
use integrity_engine::sanitize_encoding;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;
use std::fmt::Display;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";

/// Namespaced element writer. Text passes through [`sanitize_encoding`] so documents are always
/// Latin-1 representable.
pub(crate) struct TissWriter {
    writer: Writer<Vec<u8>>,
}

fn write_failed(err: impl Display) -> BillingError {
    BillingError::Structure(format!("XML write failed: {}", err))
}

fn qualified(name: &str) -> String {
    format!("{}:{}", TISS_PREFIX, name)
}

impl TissWriter {
    pub fn new() -> BillingResult<Self> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some(WIRE_ENCODING), None)))
            .map_err(write_failed)?;
        Ok(Self { writer })
    }

    /// Root element carrying the namespace declaration
    pub fn root<F>(&mut self, name: &str, body: F) -> BillingResult<()>
    where
        F: FnOnce(&mut Self) -> BillingResult<()>,
    {
        let tag = qualified(name);
        let xmlns = format!("xmlns:{}", TISS_PREFIX);
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute((xmlns.as_str(), TISS_NAMESPACE));
        self.writer
            .write_event(Event::Start(start))
            .map_err(write_failed)?;
        body(self)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))
            .map_err(write_failed)
    }

    pub fn element<F>(&mut self, name: &str, body: F) -> BillingResult<()>
    where
        F: FnOnce(&mut Self) -> BillingResult<()>,
    {
        let tag = qualified(name);
        self.writer
            .write_event(Event::Start(BytesStart::new(tag.as_str())))
            .map_err(write_failed)?;
        body(self)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))
            .map_err(write_failed)
    }

    /// Text element; written even when `value` is empty
    pub fn leaf(&mut self, name: &str, value: &str) -> BillingResult<()> {
        let tag = qualified(name);
        let text = sanitize_encoding(value.trim());
        self.writer
            .write_event(Event::Start(BytesStart::new(tag.as_str())))
            .map_err(write_failed)?;
        self.writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(write_failed)?;
        self.writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))
            .map_err(write_failed)
    }

    /// Optional text element, omitted entirely when absent or blank
    pub fn opt(&mut self, name: &str, value: Option<&str>) -> BillingResult<()> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.leaf(name, value),
            None => Ok(()),
        }
    }

    pub fn money(&mut self, name: &str, value: Decimal) -> BillingResult<()> {
        self.leaf(name, &format_money(value))
    }

    pub fn opt_money(&mut self, name: &str, value: Option<Decimal>) -> BillingResult<()> {
        match value {
            Some(value) => self.money(name, value),
            None => Ok(()),
        }
    }

    pub fn number(&mut self, name: &str, value: impl Display) -> BillingResult<()> {
        self.leaf(name, &value.to_string())
    }

    pub fn date(&mut self, name: &str, value: NaiveDate) -> BillingResult<()> {
        self.leaf(name, &value.format(DATE_FORMAT).to_string())
    }

    pub fn opt_date(&mut self, name: &str, value: Option<NaiveDate>) -> BillingResult<()> {
        match value {
            Some(value) => self.date(name, value),
            None => Ok(()),
        }
    }

    pub fn opt_time(&mut self, name: &str, value: Option<NaiveTime>) -> BillingResult<()> {
        match value {
            Some(value) => self.leaf(name, &value.format(TIME_FORMAT).to_string()),
            None => Ok(()),
        }
    }

    pub fn finish(self) -> BillingResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| BillingError::Structure(format!("document is not valid text: {}", e)))
    }
}
