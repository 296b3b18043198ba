//! Common trait for registries that store named items.

/// Common trait for registries that store named items.
///
/// # Example
///
/// ```
/// use mapchain::registry::{EntryRegistry, Registry};
///
/// let registry = EntryRegistry::new();
/// assert!(registry.contains("obfuscated"));
/// assert_eq!(registry.len(), 2);
/// ```
pub trait Registry<V> {
    /// Check if an item with the given name exists in the registry.
    fn contains(&self, name: &str) -> bool;

    /// Get an item by name.
    ///
    /// Returns `None` if no item with the given name exists.
    fn get(&self, name: &str) -> Option<&V>;

    /// Get the number of items in the registry.
    fn len(&self) -> usize;

    /// Check if the registry is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get an iterator over all names in the registry.
    fn names(&self) -> Box<dyn Iterator<Item = &String> + '_>;
}
