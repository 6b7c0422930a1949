//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with a different access pattern:
//! - reviews: raw reviews keyed by date, read-only to the pipeline
//! - records: append-only consolidated records plus secondary index entries
//! - topics: the canonical topic taxonomy
//! - days: terminal day-status checkpoints

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family for raw reviews
pub const CF_REVIEWS: &str = "reviews";

/// Column family for consolidated records and their index entries
pub const CF_RECORDS: &str = "records";

/// Column family for canonical topics
pub const CF_TOPICS: &str = "topics";

/// Column family for day-status checkpoints
pub const CF_DAYS: &str = "days";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_REVIEWS, CF_RECORDS, CF_TOPICS, CF_DAYS];

/// Options for the append-only record log (compressed).
fn records_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Options for review storage (compressed, write-once).
fn reviews_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build descriptors for all column families.
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_REVIEWS, reviews_options()),
        ColumnFamilyDescriptor::new(CF_RECORDS, records_options()),
        ColumnFamilyDescriptor::new(CF_TOPICS, Options::default()),
        ColumnFamilyDescriptor::new(CF_DAYS, Options::default()),
    ]
}
