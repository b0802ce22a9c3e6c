//! Builder for consistent hold test data.

use crate::holds::{
    BibDetail, CallDetail, HoldChain, HoldDetail, HoldType, ItemDetail, ReportRow, ResolvedHold,
};
use crate::ils::{
    BibFields, CallFields, HoldRecordFields, ItemFields, LocationFields, PatronFields,
    PullListEntryFields, Record,
};

/// Describes one hold and every record it depends on.
///
/// Record keys derive from the hold key `k`: item `I{k}`, call `C{k}`,
/// bib `BIB{k}`, patron `P{k}`. Field values default to `B{k}` for the
/// barcode, `Title {k}`, `Author {k}` and `CN {k}`.
///
/// # Example
///
/// ```rust,ignore
/// let spec = HoldSpec::new("7", HoldType::Copy).title("Beloved").volume("v.2");
/// ils.add_hold(&spec).await;
/// let chain = HoldChain::keys_only(0, "7", "I7");
/// ```
#[derive(Debug, Clone)]
pub struct HoldSpec {
    pub hold_key: String,
    pub hold_type: HoldType,
    pub status: String,
    pub barcode: String,
    pub title: String,
    pub author: String,
    pub call_number: String,
    pub volume: Option<String>,
    pub control_number: String,
    pub location: String,
    pub location_description: String,
    /// Whether the hold record names its bib. Copy holds may only reach it via the call.
    pub hold_names_bib: bool,
}

impl HoldSpec {
    pub fn new(hold_key: impl Into<String>, hold_type: HoldType) -> Self {
        let hold_key = hold_key.into();
        Self {
            status: "PLACED".to_string(),
            barcode: format!("B{}", hold_key),
            title: format!("Title {}", hold_key),
            author: format!("Author {}", hold_key),
            call_number: format!("CN {}", hold_key),
            volume: None,
            control_number: format!("a{}", hold_key),
            location: "STACKS".to_string(),
            location_description: "Stacks".to_string(),
            hold_names_bib: true,
            hold_type,
            hold_key,
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn barcode(mut self, barcode: &str) -> Self {
        self.barcode = barcode.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn call_number(mut self, call_number: &str) -> Self {
        self.call_number = call_number.to_string();
        self
    }

    pub fn volume(mut self, volume: &str) -> Self {
        self.volume = Some(volume.to_string());
        self
    }

    pub fn location(mut self, key: &str, description: &str) -> Self {
        self.location = key.to_string();
        self.location_description = description.to_string();
        self
    }

    pub fn without_hold_bib(mut self) -> Self {
        self.hold_names_bib = false;
        self
    }

    pub fn item_key(&self) -> String {
        format!("I{}", self.hold_key)
    }

    pub fn call_key(&self) -> String {
        format!("C{}", self.hold_key)
    }

    pub fn bib_key(&self) -> String {
        format!("BIB{}", self.hold_key)
    }

    pub fn patron_key(&self) -> String {
        format!("P{}", self.hold_key)
    }

    pub fn hold_record(&self) -> Record<HoldRecordFields> {
        Record::new(
            self.hold_key.clone(),
            HoldRecordFields {
                hold_type: Some(self.hold_type.as_str().to_string()),
                status: Some(self.status.clone()),
                bib: self.hold_names_bib.then(|| Record::key_only(self.bib_key())),
                patron: Some(Record::key_only(self.patron_key())),
            },
        )
    }

    pub fn item_record(&self) -> Record<ItemFields> {
        Record::new(
            self.item_key(),
            ItemFields {
                barcode: Some(self.barcode.clone()),
                call: Some(Record::key_only(self.call_key())),
                current_location: Some(self.location_record()),
            },
        )
    }

    pub fn call_record(&self) -> Record<CallFields> {
        Record::new(
            self.call_key(),
            CallFields {
                call_number: Some(self.call_number.clone()),
                volumetric: self.volume.clone(),
                bib: Some(Record::key_only(self.bib_key())),
            },
        )
    }

    pub fn bib_record(&self) -> Record<BibFields> {
        Record::new(self.bib_key(), self.bib_fields())
    }

    pub fn patron_record(&self) -> Record<PatronFields> {
        Record::new(
            self.patron_key(),
            PatronFields {
                barcode: Some(format!("2100{}", self.hold_key)),
                display_name: Some(format!("Patron {}", self.hold_key)),
            },
        )
    }

    fn bib_fields(&self) -> BibFields {
        BibFields {
            title: Some(self.title.clone()),
            author: Some(self.author.clone()),
            title_control_number: Some(self.control_number.clone()),
        }
    }

    fn location_record(&self) -> Record<LocationFields> {
        Record::new(
            self.location.clone(),
            LocationFields {
                description: Some(self.location_description.clone()),
            },
        )
    }

    /// Pull-list entry carrying keys only.
    pub fn thin_entry(&self) -> Record<PullListEntryFields> {
        Record::new(
            "",
            PullListEntryFields {
                hold_record: Record::key_only(self.hold_key.clone()),
                item: Record::key_only(self.item_key()),
            },
        )
    }

    /// Pull-list entry with everything embedded the way a thick request returns it.
    pub fn thick_entry(&self) -> Record<PullListEntryFields> {
        Record::new(
            "",
            PullListEntryFields {
                hold_record: Record::new(
                    self.hold_key.clone(),
                    HoldRecordFields {
                        hold_type: Some(self.hold_type.as_str().to_string()),
                        status: Some(self.status.clone()),
                        bib: None,
                        patron: None,
                    },
                ),
                item: Record::new(
                    self.item_key(),
                    ItemFields {
                        barcode: Some(self.barcode.clone()),
                        call: Some(Record::new(
                            self.call_key(),
                            CallFields {
                                call_number: Some(self.call_number.clone()),
                                volumetric: self.volume.clone(),
                                bib: Some(Record::new(self.bib_key(), self.bib_fields())),
                            },
                        )),
                        current_location: Some(self.location_record()),
                    },
                ),
            },
        )
    }

    /// A chain that needs no lookups.
    pub fn complete_chain(&self, position: usize) -> HoldChain {
        let mut chain = HoldChain::keys_only(position, self.hold_key.clone(), self.item_key());
        chain.hold = Some(HoldDetail {
            hold_type: self.hold_type,
            status: self.status.clone(),
            bib_key: None,
            patron_key: None,
        });
        chain.item = Some(ItemDetail {
            barcode: self.barcode.clone(),
            call_key: Some(self.call_key()),
            location_key: self.location.clone(),
            location_description: self.location_description.clone(),
        });
        chain.call = Some(CallDetail {
            call_number: self.call_number.clone(),
            volume: self.volume.clone(),
            bib_key: Some(self.bib_key()),
        });
        chain.bib = Some(BibDetail {
            title: self.title.clone(),
            author: self.author.clone(),
            control_number: self.control_number.clone(),
        });
        chain
    }

    pub fn resolved(&self, position: usize) -> ResolvedHold {
        ResolvedHold {
            position,
            hold_key: self.hold_key.clone(),
            hold_type: self.hold_type,
            status: self.status.clone(),
            barcode: self.barcode.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            call_number: self.call_number.clone(),
            volume: self.volume.clone(),
            bib_control_number: self.control_number.clone(),
            current_location: self.location.clone(),
            location_description: self.location_description.clone(),
        }
    }

    pub fn row(&self) -> ReportRow {
        ReportRow::from(self.resolved(0))
    }
}
