//! Domain types for the hold pull-list pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::BranchConfig;
use crate::ils::{
    BibFields, CallFields, HoldRecordFields, IlsError, ItemFields, PatronFields, Record,
};

/// Hold status that keeps a hold out of the reports.
pub const EXPIRED_STATUS: &str = "EXPIRED";

/// A library branch being reported on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Library key used by the ILS.
    pub key: String,
    /// Display name used in paths and report headers.
    pub name: String,
}

impl Branch {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

impl From<&BranchConfig> for Branch {
    fn from(config: &BranchConfig) -> Self {
        Self::new(config.key.clone(), config.name.clone())
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.name)
    }
}

/// Hold type discriminator as sent by the ILS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldType {
    /// Copy-specific hold.
    Copy,
    /// Title-level hold.
    Title,
}

impl HoldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldType::Copy => "COPY",
            HoldType::Title => "TITLE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COPY" => Some(HoldType::Copy),
            "TITLE" => Some(HoldType::Title),
            _ => None,
        }
    }
}

impl fmt::Display for HoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hold record detail needed for a report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldDetail {
    pub hold_type: HoldType,
    pub status: String,
    pub bib_key: Option<String>,
    pub patron_key: Option<String>,
}

impl HoldDetail {
    pub fn from_record(record: &Record<HoldRecordFields>) -> Result<Self, IlsError> {
        let fields = require_fields(record, "holdRecord")?;
        let raw_type = fields
            .hold_type
            .as_deref()
            .ok_or_else(|| IlsError::missing_field("holdRecord", &record.key, "holdType"))?;
        let hold_type = HoldType::parse(raw_type).ok_or_else(|| IlsError::UnexpectedValue {
            resource: "holdRecord",
            key: record.key.clone(),
            field: "holdType",
            value: raw_type.to_string(),
        })?;
        let status = fields
            .status
            .clone()
            .ok_or_else(|| IlsError::missing_field("holdRecord", &record.key, "status"))?;

        Ok(Self {
            hold_type,
            status,
            bib_key: nested_key(&fields.bib),
            patron_key: nested_key(&fields.patron),
        })
    }
}

/// Item (physical copy) detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetail {
    pub barcode: String,
    pub call_key: Option<String>,
    pub location_key: String,
    pub location_description: String,
}

impl ItemDetail {
    pub fn from_record(record: &Record<ItemFields>) -> Result<Self, IlsError> {
        let fields = require_fields(record, "item")?;
        let barcode = fields
            .barcode
            .clone()
            .ok_or_else(|| IlsError::missing_field("item", &record.key, "barcode"))?;
        let location = fields
            .current_location
            .as_ref()
            .filter(|l| !l.key.is_empty())
            .ok_or_else(|| IlsError::missing_field("item", &record.key, "currentLocation"))?;

        Ok(Self {
            barcode,
            call_key: nested_key(&fields.call),
            location_key: location.key.clone(),
            location_description: location
                .fields
                .as_ref()
                .and_then(|f| f.description.clone())
                .unwrap_or_default(),
        })
    }
}

/// Call number record detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDetail {
    pub call_number: String,
    pub volume: Option<String>,
    pub bib_key: Option<String>,
}

impl CallDetail {
    pub fn from_record(record: &Record<CallFields>) -> Result<Self, IlsError> {
        let fields = require_fields(record, "call")?;
        Ok(Self {
            call_number: fields.call_number.clone().unwrap_or_default(),
            volume: fields.volumetric.clone().filter(|v| !v.is_empty()),
            bib_key: nested_key(&fields.bib),
        })
    }
}

/// Bibliographic record detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibDetail {
    pub title: String,
    pub author: String,
    pub control_number: String,
}

impl BibDetail {
    pub fn from_record(record: &Record<BibFields>) -> Result<Self, IlsError> {
        let fields = require_fields(record, "bib")?;
        Ok(Self {
            title: fields.title.clone().unwrap_or_default(),
            author: fields.author.clone().unwrap_or_default(),
            control_number: fields.title_control_number.clone().unwrap_or_default(),
        })
    }
}

/// Patron detail. Only its existence matters for the reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatronDetail {
    pub key: String,
    pub barcode: Option<String>,
}

impl PatronDetail {
    pub fn from_record(record: &Record<PatronFields>) -> Result<Self, IlsError> {
        let fields = require_fields(record, "patron")?;
        Ok(Self {
            key: record.key.clone(),
            barcode: fields.barcode.clone(),
        })
    }
}

fn require_fields<'a, F>(record: &'a Record<F>, resource: &'static str) -> Result<&'a F, IlsError> {
    record
        .fields
        .as_ref()
        .ok_or_else(|| IlsError::missing_field(resource, &record.key, "fields"))
}

fn nested_key<F>(record: &Option<Record<F>>) -> Option<String> {
    record
        .as_ref()
        .and_then(|r| r.key())
        .map(str::to_string)
}

/// One pull-list entry, normalized right after fetch.
///
/// Keys are always present (possibly empty if the server omitted them);
/// detail fields are filled only when the pull list embedded them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldChain {
    /// Index in the fetched pull list.
    pub position: usize,
    pub hold_key: String,
    pub item_key: String,
    pub hold: Option<HoldDetail>,
    pub item: Option<ItemDetail>,
    pub call: Option<CallDetail>,
    pub bib: Option<BibDetail>,
    pub patron: Option<PatronDetail>,
}

impl HoldChain {
    /// A chain carrying only keys.
    pub fn keys_only(position: usize, hold_key: impl Into<String>, item_key: impl Into<String>) -> Self {
        Self {
            position,
            hold_key: hold_key.into(),
            item_key: item_key.into(),
            hold: None,
            item: None,
            call: None,
            bib: None,
            patron: None,
        }
    }

    /// Whether every detail a report row needs is already present.
    pub fn is_complete(&self) -> bool {
        self.hold.is_some() && self.item.is_some() && self.call.is_some() && self.bib.is_some()
    }

    /// Converts a complete chain into a resolved hold.
    pub fn into_resolved(self) -> Option<ResolvedHold> {
        match (self.hold, self.item, self.call, self.bib) {
            (Some(hold), Some(item), Some(call), Some(bib)) => Some(ResolvedHold::assemble(
                self.position,
                self.hold_key,
                hold,
                item,
                call,
                bib,
            )),
            _ => None,
        }
    }
}

/// A hold whose every dependent lookup succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHold {
    pub position: usize,
    pub hold_key: String,
    pub hold_type: HoldType,
    pub status: String,
    pub barcode: String,
    pub title: String,
    pub author: String,
    pub call_number: String,
    pub volume: Option<String>,
    pub bib_control_number: String,
    pub current_location: String,
    pub location_description: String,
}

impl ResolvedHold {
    pub fn assemble(
        position: usize,
        hold_key: String,
        hold: HoldDetail,
        item: ItemDetail,
        call: CallDetail,
        bib: BibDetail,
    ) -> Self {
        Self {
            position,
            hold_key,
            hold_type: hold.hold_type,
            status: hold.status,
            barcode: item.barcode,
            title: bib.title,
            author: bib.author,
            call_number: call.call_number,
            volume: call.volume,
            bib_control_number: bib.control_number,
            current_location: item.location_key,
            location_description: item.location_description,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.status == EXPIRED_STATUS
    }
}

/// A flat report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub hold_type: HoldType,
    pub barcode: String,
    pub title: String,
    pub author: String,
    pub call_number: String,
    /// Volume designator, empty when the call record has none.
    pub volume: String,
    pub bib: String,
    pub current_location: String,
    pub location_description: String,
}

impl ReportRow {
    /// Value of a sortable field.
    pub fn field(&self, field: SortField) -> &str {
        match field {
            SortField::Barcode => &self.barcode,
            SortField::Title => &self.title,
            SortField::Author => &self.author,
            SortField::CallNumber => &self.call_number,
            SortField::Volume => &self.volume,
            SortField::Bib => &self.bib,
            SortField::HoldType => self.hold_type.as_str(),
            SortField::CurrentLocation => &self.current_location,
            SortField::LocationDesc => &self.location_description,
        }
    }
}

impl From<ResolvedHold> for ReportRow {
    fn from(hold: ResolvedHold) -> Self {
        Self {
            hold_type: hold.hold_type,
            barcode: hold.barcode,
            title: hold.title,
            author: hold.author,
            call_number: hold.call_number,
            volume: hold.volume.unwrap_or_default(),
            bib: hold.bib_control_number,
            current_location: hold.current_location,
            location_description: hold.location_description,
        }
    }
}

/// Report row fields usable as sort keys, named as in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Barcode,
    Title,
    Author,
    CallNumber,
    Volume,
    Bib,
    HoldType,
    CurrentLocation,
    LocationDesc,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        SortField::Barcode,
        SortField::Title,
        SortField::Author,
        SortField::CallNumber,
        SortField::Volume,
        SortField::Bib,
        SortField::HoldType,
        SortField::CurrentLocation,
        SortField::LocationDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Barcode => "barcode",
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::CallNumber => "callNumber",
            SortField::Volume => "volume",
            SortField::Bib => "bib",
            SortField::HoldType => "holdType",
            SortField::CurrentLocation => "currentLocation",
            SortField::LocationDesc => "locationDesc",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown sort field: {0}")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownSortField(s.to_string()))
    }
}

/// Lookup a hold can be dropped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    HoldRecord,
    Item,
    Bib,
    Call,
    Patron,
}

impl LookupStage {
    /// Operation label used for request accounting.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStage::HoldRecord => "hold_record",
            LookupStage::Item => "item",
            LookupStage::Bib => "bib",
            LookupStage::Call => "call",
            LookupStage::Patron => "patron",
        }
    }

    /// ILSWS resource name.
    pub fn resource(&self) -> &'static str {
        match self {
            LookupStage::HoldRecord => "holdRecord",
            LookupStage::Item => "item",
            LookupStage::Bib => "bib",
            LookupStage::Call => "call",
            LookupStage::Patron => "patron",
        }
    }
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hold lookup that failed after retries.
#[derive(Debug, Error)]
#[error("{stage} lookup for hold '{hold_key}' failed: {source}")]
pub struct EnrichError {
    pub hold_key: String,
    pub stage: LookupStage,
    #[source]
    pub source: IlsError,
}

impl EnrichError {
    pub fn new(hold_key: impl Into<String>, stage: LookupStage, source: IlsError) -> Self {
        Self {
            hold_key: hold_key.into(),
            stage,
            source,
        }
    }
}

/// A hold left out of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedHold {
    pub hold_key: String,
    pub stage: LookupStage,
    pub error: String,
}

impl From<&EnrichError> for DroppedHold {
    fn from(error: &EnrichError) -> Self {
        Self {
            hold_key: error.hold_key.clone(),
            stage: error.stage,
            error: error.source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ils::LocationFields;

    fn hold_record(hold_type: Option<&str>, status: Option<&str>) -> Record<HoldRecordFields> {
        Record::new(
            "1001",
            HoldRecordFields {
                hold_type: hold_type.map(str::to_string),
                status: status.map(str::to_string),
                bib: Some(Record::key_only("55")),
                patron: Some(Record::key_only("P9")),
            },
        )
    }

    #[test]
    fn test_hold_detail_from_record() {
        let detail = HoldDetail::from_record(&hold_record(Some("TITLE"), Some("PLACED"))).unwrap();
        assert_eq!(detail.hold_type, HoldType::Title);
        assert_eq!(detail.status, "PLACED");
        assert_eq!(detail.bib_key.as_deref(), Some("55"));
        assert_eq!(detail.patron_key.as_deref(), Some("P9"));
    }

    #[test]
    fn test_hold_detail_rejects_unknown_type() {
        let err = HoldDetail::from_record(&hold_record(Some("SYSTEM"), Some("PLACED"))).unwrap_err();
        assert!(matches!(err, IlsError::UnexpectedValue { field: "holdType", .. }));
    }

    #[test]
    fn test_hold_detail_requires_status() {
        let err = HoldDetail::from_record(&hold_record(Some("COPY"), None)).unwrap_err();
        assert!(matches!(err, IlsError::MissingField { field: "status", .. }));
    }

    #[test]
    fn test_key_only_record_has_no_detail() {
        let err = HoldDetail::from_record(&Record::key_only("1001")).unwrap_err();
        assert!(matches!(err, IlsError::MissingField { field: "fields", .. }));
    }

    #[test]
    fn test_item_detail_requires_location() {
        let record = Record::new(
            "55:1:1",
            ItemFields {
                barcode: Some("3123".to_string()),
                call: None,
                current_location: None,
            },
        );
        assert!(ItemDetail::from_record(&record).is_err());

        let record = Record::new(
            "55:1:1",
            ItemFields {
                barcode: Some("3123".to_string()),
                call: Some(Record::key_only("55:1")),
                current_location: Some(Record::new(
                    "STACKS",
                    LocationFields {
                        description: Some("Adult stacks".to_string()),
                    },
                )),
            },
        );
        let detail = ItemDetail::from_record(&record).unwrap();
        assert_eq!(detail.location_key, "STACKS");
        assert_eq!(detail.location_description, "Adult stacks");
        assert_eq!(detail.call_key.as_deref(), Some("55:1"));
    }

    #[test]
    fn test_call_detail_blank_volume_is_none() {
        let record = Record::new(
            "55:1",
            CallFields {
                call_number: Some("FIC SMI".to_string()),
                volumetric: Some(String::new()),
                bib: None,
            },
        );
        let detail = CallDetail::from_record(&record).unwrap();
        assert_eq!(detail.volume, None);
    }

    #[test]
    fn test_report_row_defaults_volume() {
        let hold = ResolvedHold {
            position: 0,
            hold_key: "1".to_string(),
            hold_type: HoldType::Copy,
            status: "PLACED".to_string(),
            barcode: "b".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            call_number: "c".to_string(),
            volume: None,
            bib_control_number: "n".to_string(),
            current_location: "L".to_string(),
            location_description: "Loc".to_string(),
        };
        let row = ReportRow::from(hold);
        assert_eq!(row.volume, "");
        assert_eq!(row.field(SortField::HoldType), "COPY");
        assert_eq!(row.field(SortField::Bib), "n");
    }

    #[test]
    fn test_sort_field_names_round_trip() {
        for field in SortField::ALL {
            assert_eq!(field.as_str().parse::<SortField>().unwrap(), field);
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
        assert!("shelf".parse::<SortField>().is_err());
    }
}
