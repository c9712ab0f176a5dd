//! Review search and ingestion core.
//!
//! - [`filter`] — typed predicate builder for filtered and catalog queries
//! - [`search`] — cosine-ranked search (plain and filtered) and keyword search
//! - [`ingest`] — validation and the staged steps of adding a review
//! - [`compare`] — side-by-side semantic vs. keyword results
//! - [`catalog`] — catalog browse, lookup, and import
//! - [`stats`] — corpus counts
//!
//! Everything here is synchronous and takes a borrowed connection; the async
//! orchestration lives in [`crate::service`].

pub mod catalog;
pub mod compare;
pub mod filter;
pub mod ingest;
pub mod search;
pub mod stats;
pub mod types;

/// Encode an embedding as the little-endian `FLOAT32` blob sqlite-vec reads.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_is_little_endian_float32() {
        let bytes = embedding_to_bytes(&[1.0f32, -2.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xc0]);
    }
}
