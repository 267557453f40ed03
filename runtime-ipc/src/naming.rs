//! Stable platform-key derivation: the same user-visible name always maps
//! to the same OS object name, across processes and across the
//! POSIX/Windows split in naming rules (leading `/`, length limits,
//! forbidden characters).

/// FNV-1a, chosen for being dependency-free and identical on every
/// platform (unlike `std`'s `DefaultHasher`, which is explicitly
/// unspecified across Rust versions).
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Maps `name` to `"{prefix}{16 hex digits}"`, which is short, uses only
/// the characters every supported platform's IPC namespace allows, and is
/// a pure function of `name` so every process deriving it agrees.
pub(crate) fn platform_key(name: &str, prefix: &str) -> String {
    format!("{prefix}{:016x}", fnv1a64(name.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_maps_to_same_key() {
        assert_eq!(platform_key("widget-queue", "/rtp-"), platform_key("widget-queue", "/rtp-"));
    }

    #[test]
    fn different_names_map_to_different_keys() {
        assert_ne!(platform_key("a", "/rtp-"), platform_key("b", "/rtp-"));
    }

    #[test]
    fn key_is_short_and_prefixed() {
        let key = platform_key("anything", "/rtp-");
        assert!(key.starts_with("/rtp-"));
        assert_eq!(key.len(), "/rtp-".len() + 16);
    }
}
