//! Ledger row encoding.
//!
//! Rows are stored as a one-byte version tag followed by the postcard
//! encoding of that version's record, so the layout can evolve without a
//! separate migration table.

use redb::TypeName;
pub use v1 as latest_record;

pub mod v1;

pub trait RecordVariant {
    const VERSION: u8;
}

#[derive(Debug, Clone)]
pub enum VersionedRecord {
    V1(v1::PinRecord),
}

impl VersionedRecord {
    pub fn into_latest(self) -> latest_record::PinRecord {
        match self {
            VersionedRecord::V1(record) => record,
        }
    }
}

impl From<latest_record::PinRecord> for VersionedRecord {
    fn from(record: latest_record::PinRecord) -> Self {
        VersionedRecord::V1(record)
    }
}

impl redb::Value for VersionedRecord {
    type SelfType<'a> = VersionedRecord;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (version, data) = data.split_first().expect("empty record");
        match *version {
            v1::PinRecord::VERSION => {
                let v1 = postcard::from_bytes::<v1::PinRecord>(data).expect("invalid record");
                VersionedRecord::V1(v1)
            }
            version => panic!("unsupported record version: {}", version),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        match value {
            VersionedRecord::V1(v1) => {
                postcard::to_extend(v1, vec![v1::PinRecord::VERSION]).unwrap()
            }
        }
    }

    fn type_name() -> TypeName {
        TypeName::new("pinner::PinRecord")
    }
}
