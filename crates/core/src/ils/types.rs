//! ILSWS wire types.
//!
//! Every ILSWS resource comes back as `{ "resource", "key", "fields" }`.
//! `fields` is absent when a record is only referenced by key, which is how
//! the same types describe both "thin" and "thick" responses.

use serde::{Deserialize, Serialize};

/// A keyed ILSWS record with an optional field bag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record<F> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<F>,
}

impl<F> Record<F> {
    /// A record carrying fields.
    pub fn new(key: impl Into<String>, fields: F) -> Self {
        Self {
            resource: None,
            key: key.into(),
            fields: Some(fields),
        }
    }

    /// A bare reference to a record.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            resource: None,
            key: key.into(),
            fields: None,
        }
    }

    /// Key, or `None` when the server sent an empty one.
    pub fn key(&self) -> Option<&str> {
        if self.key.is_empty() {
            None
        } else {
            Some(&self.key)
        }
    }
}

/// Response of `loginUser`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_token: String,
}

/// Fields of `holdItemPullList`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullListFields {
    #[serde(default)]
    pub pull_list: Vec<Record<PullListEntryFields>>,
}

/// One pull-list entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullListEntryFields {
    pub hold_record: Record<HoldRecordFields>,
    pub item: Record<ItemFields>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldRecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib: Option<Record<BibFields>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patron: Option<Record<PatronFields>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<Record<CallFields>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Record<LocationFields>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_number: Option<String>,
    /// Volume designator, e.g. "v.2".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumetric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib: Option<Record<BibFields>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BibFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_control_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_thick_pull_list() {
        let json = r#"{
            "resource": "/circulation/holdItemPullList",
            "key": "CEN",
            "fields": {
                "pullList": [{
                    "resource": "/circulation/holdItemPullList/pullList",
                    "fields": {
                        "holdRecord": {
                            "resource": "/circulation/holdRecord",
                            "key": "1001",
                            "fields": { "holdType": "COPY", "status": "PLACED" }
                        },
                        "item": {
                            "resource": "/catalog/item",
                            "key": "55:1:1",
                            "fields": {
                                "barcode": "31234000012345",
                                "currentLocation": {
                                    "resource": "/policy/location",
                                    "key": "STACKS",
                                    "fields": { "description": "Adult stacks" }
                                },
                                "call": {
                                    "resource": "/catalog/call",
                                    "key": "55:1",
                                    "fields": {
                                        "callNumber": "FIC SMI",
                                        "volumetric": null,
                                        "bib": {
                                            "resource": "/catalog/bib",
                                            "key": "55",
                                            "fields": {
                                                "title": "White Teeth",
                                                "author": "Smith, Zadie",
                                                "titleControlNumber": "a123"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }]
            }
        }"#;

        let record: Record<PullListFields> = serde_json::from_str(json).unwrap();
        assert_eq!(record.key, "CEN");
        let entries = record.fields.unwrap().pull_list;
        assert_eq!(entries.len(), 1);

        let entry = entries[0].fields.as_ref().unwrap();
        assert_eq!(entry.hold_record.key, "1001");
        let item = entry.item.fields.as_ref().unwrap();
        assert_eq!(item.barcode.as_deref(), Some("31234000012345"));
        let call = item.call.as_ref().unwrap().fields.as_ref().unwrap();
        assert_eq!(call.volumetric, None);
        let bib = call.bib.as_ref().unwrap().fields.as_ref().unwrap();
        assert_eq!(bib.title_control_number.as_deref(), Some("a123"));
    }

    #[test]
    fn test_deserialize_thin_entry() {
        let json = r#"{
            "fields": {
                "holdRecord": { "resource": "/circulation/holdRecord", "key": "1001" },
                "item": { "resource": "/catalog/item", "key": "55:1:1" }
            }
        }"#;

        let entry: Record<PullListEntryFields> = serde_json::from_str(json).unwrap();
        assert_eq!(entry.key(), None);
        let fields = entry.fields.unwrap();
        assert!(fields.hold_record.fields.is_none());
        assert_eq!(fields.item.key(), Some("55:1:1"));
    }

    #[test]
    fn test_deserialize_key_only_record() {
        let entry: Record<PullListEntryFields> =
            serde_json::from_str(r#"{"resource": "/circulation/holdItemPullList/pullList", "key": "7"}"#)
                .unwrap();
        assert_eq!(entry.key(), Some("7"));
        assert!(entry.fields.is_none());

        let pull_list: Record<PullListFields> =
            serde_json::from_str(r#"{"key": "CEN", "fields": {"pullList": [{"key": "1"}]}}"#)
                .unwrap();
        let entries = pull_list.fields.unwrap().pull_list;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].fields.is_none());
    }

    #[test]
    fn test_login_response() {
        let login: LoginResponse =
            serde_json::from_str(r#"{"staffKey": "S1", "sessionToken": "tok-1"}"#).unwrap();
        assert_eq!(login.session_token, "tok-1");
    }
}
