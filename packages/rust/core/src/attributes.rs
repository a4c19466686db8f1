//! Source record → remote contact attributes.

use contactsync_remote::AttributeMap;
use contactsync_shared::SourceRecord;

/// Placeholder the vendor export uses for "no website"; treated as empty.
pub const EMPTY_URL_SENTINEL: &str = "http://";

/// Remote attributes populated from a source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactAttribute {
    CompanyName,
    CompanyId,
    Sms,
    TenderCode,
}

impl ContactAttribute {
    pub const ALL: [Self; 4] = [Self::CompanyName, Self::CompanyId, Self::Sms, Self::TenderCode];

    /// Attribute name on the remote service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompanyName => "COMPANY_NAME",
            Self::CompanyId => "COMPANY_ID",
            Self::Sms => "SMS",
            Self::TenderCode => "TENDER_CODE",
        }
    }

    fn source_value(self, record: &SourceRecord) -> &str {
        match self {
            Self::CompanyName => &record.vendor_name,
            Self::CompanyId => &record.id_code,
            Self::Sms => &record.phone,
            Self::TenderCode => &record.category,
        }
    }
}

/// Build the attribute map for a record.
///
/// Empty values and the bare `http://` sentinel are left out. No record
/// means no attributes.
pub fn map_attributes(record: Option<&SourceRecord>) -> AttributeMap {
    let Some(record) = record else {
        return AttributeMap::new();
    };

    ContactAttribute::ALL
        .into_iter()
        .filter_map(|attr| {
            let value = attr.source_value(record);
            (!value.is_empty() && value != EMPTY_URL_SENTINEL)
                .then(|| (attr.as_str().to_string(), value.to_string()))
        })
        .collect()
}
