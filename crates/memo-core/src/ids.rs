//! Memo id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Length of generated memo ids.
pub const ID_LEN: usize = 12;

/// URL-safe alphabet, 64 symbols so every 6 bits map to one character.
const ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Source of fresh memo ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// 12-character random ids drawn from a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        // Bytes 6 and 8 carry the version and variant bits.
        bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 6 && *i != 8)
            .take(ID_LEN)
            .map(|(_, b)| ALPHABET[(b & 63) as usize] as char)
            .collect()
    }
}

/// Predictable ids (`<prefix>-1`, `<prefix>-2`, ...).
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_ids_have_fixed_length_and_alphabet() {
        let id = RandomIds.next_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn random_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| RandomIds.next_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::new("m");
        assert_eq!(ids.next_id(), "m-1");
        assert_eq!(ids.next_id(), "m-2");
    }
}
