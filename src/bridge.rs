//! Key/value messages exchanged with the watch.
//!
//! Every outbound message is encoded into one dictionary that must fit the
//! watch inbox (`MAX_MESSAGE_BYTES`). Arrays travel as JSON text because the
//! watch side only gets strings and integers.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    constants::MAX_MESSAGE_BYTES,
    data_backend::parse_display_date,
    data_types::{MealDetail, NormalizedDay, NormalizedMeal},
    errors::BridgeError,
};

pub const ERROR_MSG: &str = "ERROR_MSG";
pub const DAY_LIST: &str = "DAY_LIST";
pub const WEEKDAY_LIST: &str = "WEEKDAY_LIST";
pub const RELOAD_APP: &str = "RELOAD_APP";
pub const RELOAD_DONE: &str = "RELOAD_DONE";
pub const SELECTED_DATE: &str = "SELECTED_DATE";
pub const MEALS_IDS: &str = "MEALS_IDS";
pub const MEALS_NAMES: &str = "MEALS_NAMES";
pub const MEALS_PRICES: &str = "MEALS_PRICES";
pub const MEAL_ID: &str = "MEAL_ID";
pub const MEAL_NAME: &str = "MEAL_NAME";
pub const MEAL_PRICE: &str = "MEAL_PRICE";
pub const MEAL_NOTES: &str = "MEAL_NOTES";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageValue {
    Int(i64),
    Text(String),
}

impl MessageValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

pub type Dictionary = BTreeMap<&'static str, MessageValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Error(String),
    DayList(Vec<String>),
    WeekdayList(Vec<String>),
    ReloadApp,
    MealList {
        ids: Vec<i64>,
        names: Vec<String>,
        prices: Vec<String>,
    },
    MealDetail {
        name: String,
        price: String,
        notes: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ReloadDone,
    DateSelected(NaiveDate),
    MealSelected(i64),
}

pub fn payload_size(dict: &Dictionary) -> usize {
    serde_json::to_string(dict).map_or(usize::MAX, |s| s.len())
}

fn fits(dict: &Dictionary) -> bool {
    payload_size(dict) <= MAX_MESSAGE_BYTES
}

fn text_array<T: Serialize>(items: &[T]) -> MessageValue {
    MessageValue::Text(json!(items).to_string())
}

fn text(s: &str) -> MessageValue {
    MessageValue::Text(s.to_string())
}

/// Largest `n` in `0..=len` for which `fits_at(n)` holds. Payload size grows
/// with `n`, so a binary search keeps this at O(log len) encodings.
fn largest_fitting(len: usize, fits_at: impl Fn(usize) -> bool) -> usize {
    if fits_at(len) {
        return len;
    }
    // answer in [lo, hi), hi never fits
    let (mut lo, mut hi) = (0, len);
    while lo + 1 < hi {
        let mid = lo + (hi - lo) / 2;
        if fits_at(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Builds with the first `n` of `len` items, dropping items from the end
/// until it fits.
fn shrink_to_fit(len: usize, build: impl Fn(usize) -> Dictionary) -> Dictionary {
    let n = largest_fitting(len, |n| fits(&build(n)));
    if n < len {
        log::warn!("message too large, dropped {} of {} entries", len - n, len);
    }
    build(n)
}

/// Cuts `value` at the longest char boundary that lets the dictionary fit.
fn truncate_to_fit(value: &str, build: impl Fn(&str) -> Dictionary) -> (String, Dictionary) {
    let cuts: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain([value.len()])
        .collect();
    let k = largest_fitting(cuts.len() - 1, |k| fits(&build(&value[..cuts[k]])));

    let s = &value[..cuts[k]];
    if s.len() < value.len() {
        log::warn!("message too large, truncated text to {} bytes", s.len());
    }
    (s.to_string(), build(s))
}

impl OutboundMessage {
    /// Day and weekday lists, in the order they have to be sent.
    pub fn day_lists(days: &[NormalizedDay]) -> (Self, Self) {
        (
            Self::DayList(days.iter().map(|d| d.display_date.clone()).collect()),
            Self::WeekdayList(days.iter().map(|d| d.weekday_label.clone()).collect()),
        )
    }

    pub fn meal_list(meals: &[NormalizedMeal]) -> Self {
        Self::MealList {
            ids: meals.iter().map(|m| m.id).collect(),
            names: meals.iter().map(|m| m.name.clone()).collect(),
            prices: meals.iter().map(|m| m.formatted_price.clone()).collect(),
        }
    }

    pub fn meal_detail(detail: MealDetail) -> Self {
        Self::MealDetail {
            name: detail.name,
            price: detail.formatted_price,
            notes: detail.notes_joined,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => ERROR_MSG,
            Self::DayList(_) => DAY_LIST,
            Self::WeekdayList(_) => WEEKDAY_LIST,
            Self::ReloadApp => RELOAD_APP,
            Self::MealList { .. } => MEALS_IDS,
            Self::MealDetail { .. } => MEAL_NAME,
        }
    }

    pub fn encode(&self) -> Dictionary {
        match self {
            Self::Error(msg) => {
                truncate_to_fit(msg, |s| Dictionary::from([(ERROR_MSG, text(s))])).1
            }
            Self::DayList(items) | Self::WeekdayList(items) => {
                let key = self.kind();
                shrink_to_fit(items.len(), |n| {
                    Dictionary::from([(key, text_array(&items[..n]))])
                })
            }
            Self::ReloadApp => Dictionary::from([(RELOAD_APP, MessageValue::Int(1))]),
            Self::MealList { ids, names, prices } => {
                let len = ids.len().min(names.len()).min(prices.len());
                shrink_to_fit(len, |n| {
                    Dictionary::from([
                        (MEALS_IDS, text_array(&ids[..n])),
                        (MEALS_NAMES, text_array(&names[..n])),
                        (MEALS_PRICES, text_array(&prices[..n])),
                    ])
                })
            }
            Self::MealDetail { name, price, notes } => {
                let build = |name: &str, notes: &str| {
                    Dictionary::from([
                        (MEAL_NAME, text(name)),
                        (MEAL_PRICE, text(price)),
                        (MEAL_NOTES, text(notes)),
                    ])
                };
                // notes give way first, the name only if that is not enough
                let (notes, dict) = truncate_to_fit(notes, |n| build(name, n));
                if fits(&dict) {
                    dict
                } else {
                    truncate_to_fit(name, |n| build(n, &notes)).1
                }
            }
        }
    }
}

fn decode_meal_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl InboundEvent {
    /// Validates an inbound dictionary. Exactly one known key is accepted.
    pub fn decode(dict: &Map<String, Value>) -> Result<Self, BridgeError> {
        let mut entries = dict.iter();
        let (key, value) = entries.next().ok_or(BridgeError::EmptyMessage)?;
        if entries.next().is_some() {
            return Err(BridgeError::MultipleKeys(dict.len()));
        }

        match key.as_str() {
            RELOAD_DONE => Ok(Self::ReloadDone),
            SELECTED_DATE => value
                .as_str()
                .and_then(|s| parse_display_date(s).ok())
                .map(Self::DateSelected)
                .ok_or(BridgeError::MalformedValue { key: SELECTED_DATE }),
            MEAL_ID => decode_meal_id(value)
                .map(Self::MealSelected)
                .ok_or(BridgeError::MalformedValue { key: MEAL_ID }),
            other => Err(BridgeError::UnknownKey(other.to_string())),
        }
    }

    pub fn decode_line(line: &str) -> Result<Self, BridgeError> {
        let dict: Map<String, Value> = serde_json::from_str(line)?;
        Self::decode(&dict)
    }
}

/// Outbound side of the watch link. `Ok` means the watch acknowledged.
pub trait Transport {
    fn send(&mut self, message: &Dictionary)
        -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// One JSON object per line, e.g. on stdout.
pub struct LineTransport<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineTransport<W> {
    pub fn new(writer: W) -> Self {
        LineTransport { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> Transport for LineTransport<W> {
    async fn send(&mut self, message: &Dictionary) -> Result<(), BridgeError> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

pub type StdioTransport = LineTransport<tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdout() -> Self {
        LineTransport::new(tokio::io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> Result<InboundEvent, BridgeError> {
        InboundEvent::decode_line(raw)
    }

    #[test]
    fn day_list_is_json_text() {
        let dict = OutboundMessage::DayList(vec!["01.05.2024".into(), "03.05.2024".into()]).encode();
        assert_eq!(
            dict.get(DAY_LIST).and_then(MessageValue::as_text),
            Some(r#"["01.05.2024","03.05.2024"]"#)
        );
    }

    #[test]
    fn meal_list_goes_out_as_one_message() {
        let dict = OutboundMessage::MealList {
            ids: vec![7, 8],
            names: vec!["Curry".into(), "Pizza".into()],
            prices: vec!["3.50€".into(), "N/A".into()],
        }
        .encode();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict[MEALS_IDS], MessageValue::Text("[7,8]".into()));
        assert_eq!(dict[MEALS_PRICES], MessageValue::Text(r#"["3.50€","N/A"]"#.into()));
    }

    #[test]
    fn reload_is_a_marker() {
        assert_eq!(
            OutboundMessage::ReloadApp.encode(),
            Dictionary::from([(RELOAD_APP, MessageValue::Int(1))])
        );
    }

    #[test]
    fn oversized_meal_list_is_shortened_in_lockstep() {
        let n = 40;
        let dict = OutboundMessage::MealList {
            ids: (0..n).collect(),
            names: (0..n).map(|i| format!("Sehr langer Gerichtname Nummer {}", i)).collect(),
            prices: (0..n).map(|_| "12.30€".to_string()).collect(),
        }
        .encode();

        assert!(payload_size(&dict) <= MAX_MESSAGE_BYTES);
        let count = |key: &str| {
            let raw = dict[key].as_text().unwrap();
            serde_json::from_str::<Vec<Value>>(raw).unwrap().len()
        };
        assert!(count(MEALS_IDS) < n as usize);
        assert_eq!(count(MEALS_IDS), count(MEALS_NAMES));
        assert_eq!(count(MEALS_IDS), count(MEALS_PRICES));
    }

    #[test]
    fn oversized_detail_truncates_notes_first() {
        let dict = OutboundMessage::MealDetail {
            name: "Curry".into(),
            price: "3.50€".into(),
            notes: "Allergene: ".repeat(200),
        }
        .encode();

        assert!(payload_size(&dict) <= MAX_MESSAGE_BYTES);
        assert_eq!(dict[MEAL_NAME], MessageValue::Text("Curry".into()));
    }

    #[test]
    fn huge_notes_are_cut_to_the_inbox_size() {
        let dict = OutboundMessage::MealDetail {
            name: "Curry".into(),
            price: "3.50€".into(),
            notes: "x".repeat(100_000),
        }
        .encode();

        // one byte per 'x', so the cut lands exactly on the limit
        assert_eq!(payload_size(&dict), MAX_MESSAGE_BYTES);
        assert_eq!(dict[MEAL_NAME], MessageValue::Text("Curry".into()));
    }

    #[test]
    fn long_name_is_cut_on_a_char_boundary() {
        let dict = OutboundMessage::MealDetail {
            name: "Käsespätzle mit Röstzwiebeln ".repeat(100),
            price: "3.50€".into(),
            notes: "Milch, Ei".into(),
        }
        .encode();

        assert!(payload_size(&dict) <= MAX_MESSAGE_BYTES);
        assert_eq!(dict[MEAL_NOTES], MessageValue::Text(String::new()));
        let name = dict[MEAL_NAME].as_text().unwrap();
        assert!(name.starts_with("Käsespätzle"));
    }

    #[test]
    fn escaped_error_text_still_fits() {
        let dict = OutboundMessage::Error("\"\n".repeat(2_000)).encode();
        assert!(payload_size(&dict) <= MAX_MESSAGE_BYTES);
        assert!(!dict[ERROR_MSG].as_text().unwrap().is_empty());
    }

    #[test]
    fn decodes_known_events() {
        assert_eq!(decode(r#"{"RELOAD_DONE": 1}"#).unwrap(), InboundEvent::ReloadDone);
        assert_eq!(
            decode(r#"{"SELECTED_DATE": "01.05.2024"}"#).unwrap(),
            InboundEvent::DateSelected(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert_eq!(decode(r#"{"MEAL_ID": 42}"#).unwrap(), InboundEvent::MealSelected(42));
        assert_eq!(decode(r#"{"MEAL_ID": "42"}"#).unwrap(), InboundEvent::MealSelected(42));
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(matches!(decode(r#"{"FOO": 1}"#), Err(BridgeError::UnknownKey(k)) if k == "FOO"));
        assert!(matches!(decode("{}"), Err(BridgeError::EmptyMessage)));
        assert!(matches!(
            decode(r#"{"SELECTED_DATE": "2024-05-01"}"#),
            Err(BridgeError::MalformedValue { key: SELECTED_DATE })
        ));
        assert!(matches!(
            decode(r#"{"MEAL_ID": "abc"}"#),
            Err(BridgeError::MalformedValue { key: MEAL_ID })
        ));
        assert!(matches!(
            decode(r#"{"MEAL_ID": 1, "RELOAD_DONE": 1}"#),
            Err(BridgeError::MultipleKeys(2))
        ));
        assert!(matches!(decode("[1, 2]"), Err(BridgeError::Json(_))));
    }

    #[tokio::test]
    async fn line_transport_writes_one_object_per_line() {
        let mut transport = LineTransport::new(Vec::new());
        transport.send(&OutboundMessage::ReloadApp.encode()).await.unwrap();
        transport
            .send(&OutboundMessage::Error("oops".into()).encode())
            .await
            .unwrap();

        let out = String::from_utf8(transport.into_inner()).unwrap();
        assert_eq!(out, "{\"RELOAD_APP\":1}\n{\"ERROR_MSG\":\"oops\"}\n");
    }
}
