//! XML paging-list documents fed to the stylesheets.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <paging_list count="2" location="Central" timestamp="2024-03-01T09:15:02.120-08:00">
//!   <record>
//!     <location>STACKS</location>
//!     <loc_desc>Adult stacks</loc_desc>
//!     <title>..</title>
//!     <call_number>..</call_number>
//!     <barcode>..</barcode>
//!     <author>..</author>
//!   </record>
//! </paging_list>
//! ```

use std::io::Cursor;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::holds::ReportRow;

use super::ReportError;

/// ISO-8601 timestamp with milliseconds at a fixed UTC offset.
pub fn format_timestamp(now: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    now.with_timezone(&offset)
        .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        .to_string()
}

fn xml_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Xml(e.to_string())
}

/// Render the paging-list document for one partition.
pub fn render_paging_list(
    location: &str,
    timestamp: &str,
    rows: &[&ReportRow],
) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let count = rows.len().to_string();
    let mut root = BytesStart::new("paging_list");
    root.push_attribute(("count", count.as_str()));
    root.push_attribute(("location", location));
    root.push_attribute(("timestamp", timestamp));
    writer.write_event(Event::Start(root)).map_err(xml_error)?;

    for row in rows {
        writer
            .write_event(Event::Start(BytesStart::new("record")))
            .map_err(xml_error)?;
        for (name, value) in [
            ("location", row.current_location.as_str()),
            ("loc_desc", row.location_description.as_str()),
            ("title", row.title.as_str()),
            ("call_number", row.call_number.as_str()),
            ("barcode", row.barcode.as_str()),
            ("author", row.author.as_str()),
        ] {
            writer
                .create_element(name)
                .write_text_content(BytesText::new(value))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("record")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("paging_list")))
        .map_err(xml_error)?;

    Ok(writer.into_inner().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holds::HoldType;
    use crate::testing::HoldSpec;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_at_pacific_offset() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 17, 15, 2).unwrap()
            + chrono::Duration::milliseconds(120);
        assert_eq!(format_timestamp(now, -480), "2024-03-01T09:15:02.120-08:00");
        assert_eq!(format_timestamp(now, 0), "2024-03-01T17:15:02.120+00:00");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        assert!(format_timestamp(now, 100_000).ends_with("+00:00"));
    }

    #[test]
    fn test_document_shape() {
        let rows = [
            HoldSpec::new("1", HoldType::Copy)
                .title("Pride & Prejudice")
                .location("STACKS", "Adult stacks")
                .row(),
            HoldSpec::new("2", HoldType::Copy).row(),
        ];
        let refs: Vec<_> = rows.iter().collect();
        let xml = String::from_utf8(
            render_paging_list("Central", "2024-03-01T09:15:02.120-08:00", &refs).unwrap(),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "<paging_list count=\"2\" location=\"Central\" timestamp=\"2024-03-01T09:15:02.120-08:00\">"
        ));
        assert_eq!(xml.matches("<record>").count(), 2);
        assert!(xml.contains("<title>Pride &amp; Prejudice</title>"));
        assert!(xml.contains("<loc_desc>Adult stacks</loc_desc>"));

        let location = xml.find("<location>").unwrap();
        let author = xml.find("<author>").unwrap();
        assert!(location < author);
    }
}
