//! Storage key abstraction shared by typed entity stores.

/// Trait for types that can be used as storage keys.
///
/// A storage key must encode itself to a stable byte representation and be
/// recoverable from that representation. Keys are compared byte-wise by the
/// underlying storage engine, so the encoding also defines scan order.
pub trait StorageKey: Sized {
    /// Encodes the key to its byte representation.
    fn storage_key(&self) -> Vec<u8>;

    /// Decodes a key from its byte representation.
    fn from_storage_key(bytes: &[u8]) -> Result<Self, String>;
}
