//! Canonical mapping table.
//!
//! A [`MappingTable`] renames identifiers from a left namespace to a right
//! namespace. It holds package and class renames; every class owns its field
//! and method renames and every method owns its parameter renames, which are
//! keyed by ordinal index rather than by name.
//!
//! Every element carries a [`Metadata`] map (javadoc, comments, ...). Keys are
//! unique and kept sorted so that tables compare and serialize deterministically.
//!
//! Tables are produced once, by a decoder or by [`crate::chain`], and are
//! shared behind `Arc` afterwards. The mutating builder methods exist for those
//! producers only.

pub mod descriptor;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

pub use descriptor::remap_descriptor;

/// Per-element metadata: key to string value.
pub type Metadata = BTreeMap<String, String>;

/// Common access to the metadata carried by every table element.
pub trait Annotated {
    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Set a metadata value, replacing any previous value for `key`.
    fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.metadata_mut().insert(key.into(), value.into());
        self
    }

    /// Overlay `other` onto this element's metadata; keys in `other` win.
    fn overlay_metadata(&mut self, other: &Metadata) {
        let metadata = self.metadata_mut();
        for (key, value) in other {
            metadata.insert(key.clone(), value.clone());
        }
    }
}

macro_rules! impl_annotated {
    ($($ty:ty),*) => {
        $(impl Annotated for $ty {
            fn metadata(&self) -> &Metadata {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut Metadata {
                &mut self.metadata
            }
        })*
    };
}

impl_annotated!(PackageMapping, ClassMapping, FieldMapping, MethodMapping, ParameterMapping);

/// Insert `value` under `key`, replacing any previous value, and hand back the slot.
fn replace<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, value: V) -> &mut V {
    match map.entry(key) {
        Entry::Occupied(mut slot) => {
            slot.insert(value);
            slot.into_mut()
        }
        Entry::Vacant(slot) => slot.insert(value),
    }
}

/// A package rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMapping {
    original: String,
    mapped: String,
    metadata: Metadata,
}

impl PackageMapping {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn mapped(&self) -> &str {
        &self.mapped
    }
}

/// Lookup key for a method: name plus descriptor, both in the left namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodKey {
    pub name: String,
    pub descriptor: String,
}

impl MethodKey {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self { name: name.into(), descriptor: descriptor.into() }
    }
}

/// A class rename together with its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    original: String,
    mapped: String,
    metadata: Metadata,
    fields: BTreeMap<String, FieldMapping>,
    methods: BTreeMap<MethodKey, MethodMapping>,
}

impl ClassMapping {
    fn new(original: String, mapped: String) -> Self {
        Self {
            original,
            mapped,
            metadata: Metadata::new(),
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn mapped(&self) -> &str {
        &self.mapped
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.values()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodMapping> {
        self.methods.values()
    }

    /// Look up a field by its original name.
    pub fn field(&self, original: &str) -> Option<&FieldMapping> {
        self.fields.get(original)
    }

    /// Look up a method by its original name and original descriptor.
    pub fn method(&self, original: &str, descriptor: &str) -> Option<&MethodMapping> {
        self.methods.get(&MethodKey::new(original, descriptor))
    }

    /// Add (or replace) a field rename.
    pub fn add_field(
        &mut self,
        original: impl Into<String>,
        mapped: impl Into<String>,
        descriptor: Option<String>,
    ) -> &mut FieldMapping {
        let original = original.into();
        let field = FieldMapping {
            original: original.clone(),
            mapped: mapped.into(),
            descriptor,
            metadata: Metadata::new(),
        };
        replace(&mut self.fields, original, field)
    }

    /// Add (or replace) a method rename.
    pub fn add_method(
        &mut self,
        original: impl Into<String>,
        descriptor: impl Into<String>,
        mapped: impl Into<String>,
    ) -> &mut MethodMapping {
        let key = MethodKey::new(original, descriptor);
        let method = MethodMapping {
            original: key.name.clone(),
            mapped: mapped.into(),
            descriptor: key.descriptor.clone(),
            metadata: Metadata::new(),
            parameters: BTreeMap::new(),
        };
        replace(&mut self.methods, key, method)
    }

    pub fn field_mut(&mut self, original: &str) -> Option<&mut FieldMapping> {
        self.fields.get_mut(original)
    }

    pub fn method_mut(&mut self, original: &str, descriptor: &str) -> Option<&mut MethodMapping> {
        self.methods.get_mut(&MethodKey::new(original, descriptor))
    }
}

/// A field rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    original: String,
    mapped: String,
    descriptor: Option<String>,
    metadata: Metadata,
}

impl FieldMapping {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn mapped(&self) -> &str {
        &self.mapped
    }

    /// Field type in the left namespace, when the source format records it.
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }
}

/// A method rename with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMapping {
    original: String,
    mapped: String,
    descriptor: String,
    metadata: Metadata,
    parameters: BTreeMap<u32, ParameterMapping>,
}

impl MethodMapping {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn mapped(&self) -> &str {
        &self.mapped
    }

    /// Method descriptor in the left namespace.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterMapping> {
        self.parameters.values()
    }

    pub fn parameter(&self, index: u32) -> Option<&ParameterMapping> {
        self.parameters.get(&index)
    }

    /// Add (or replace) the parameter at `index`.
    pub fn add_parameter(
        &mut self,
        index: u32,
        original: Option<String>,
        mapped: Option<String>,
    ) -> &mut ParameterMapping {
        let parameter = ParameterMapping { index, original, mapped, metadata: Metadata::new() };
        replace(&mut self.parameters, index, parameter)
    }
}

/// A parameter rename. Either name may be unknown: metadata-only sources
/// frequently document a parameter without naming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMapping {
    index: u32,
    original: Option<String>,
    mapped: Option<String>,
    metadata: Metadata,
}

impl ParameterMapping {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn mapped(&self) -> Option<&str> {
        self.mapped.as_deref()
    }
}

/// Renaming table between two namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    packages: BTreeMap<String, PackageMapping>,
    classes: BTreeMap<String, ClassMapping>,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the table renames nothing at all.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.classes.is_empty()
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageMapping> {
        self.packages.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassMapping> {
        self.classes.values()
    }

    /// Look up a package by its original name.
    pub fn package(&self, original: &str) -> Option<&PackageMapping> {
        self.packages.get(original)
    }

    /// Look up a class by its original (internal, slash-separated) name.
    pub fn class(&self, original: &str) -> Option<&ClassMapping> {
        self.classes.get(original)
    }

    pub fn class_mut(&mut self, original: &str) -> Option<&mut ClassMapping> {
        self.classes.get_mut(original)
    }

    /// Add (or replace) a package rename.
    pub fn add_package(
        &mut self,
        original: impl Into<String>,
        mapped: impl Into<String>,
    ) -> &mut PackageMapping {
        let original = original.into();
        let package =
            PackageMapping { original: original.clone(), mapped: mapped.into(), metadata: Metadata::new() };
        replace(&mut self.packages, original, package)
    }

    /// Add a class rename.
    ///
    /// If the class already exists its mapped name is updated and its members
    /// and metadata are kept, so decoders can declare members before the class
    /// line has been fully read.
    pub fn add_class(
        &mut self,
        original: impl Into<String>,
        mapped: impl Into<String>,
    ) -> &mut ClassMapping {
        let original = original.into();
        let mapped = mapped.into();
        let class = self
            .classes
            .entry(original.clone())
            .or_insert_with(|| ClassMapping::new(original, mapped.clone()));
        class.mapped = mapped;
        class
    }

    /// Get the class `original`, creating an identity rename if it is missing.
    pub fn class_or_identity(&mut self, original: &str) -> &mut ClassMapping {
        self.classes
            .entry(original.to_string())
            .or_insert_with(|| ClassMapping::new(original.to_string(), original.to_string()))
    }

    pub(crate) fn insert_package(&mut self, package: PackageMapping) {
        self.packages.insert(package.original.clone(), package);
    }

    pub(crate) fn insert_class(&mut self, class: ClassMapping) {
        self.classes.insert(class.original.clone(), class);
    }

    /// Map a class name into the right namespace.
    ///
    /// Unknown inner classes (`Outer$Inner`) are remapped through their outer
    /// class; any other unknown name is returned unchanged.
    pub fn remap_class(&self, name: &str) -> String {
        if let Some(class) = self.classes.get(name) {
            return class.mapped.clone();
        }
        match name.rfind('$') {
            Some(split) => {
                format!("{}{}", self.remap_class(&name[..split]), &name[split..])
            }
            None => name.to_string(),
        }
    }

    /// Map every class referenced by a descriptor into the right namespace.
    pub fn remap_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |class| self.remap_class(class))
    }

    /// Swap the left and right namespaces, including every nested element.
    ///
    /// Descriptors are rewritten into the new left namespace. Metadata is
    /// carried over unchanged.
    pub fn reverse(&self) -> MappingTable {
        let mut reversed = MappingTable::new();

        for package in self.packages.values() {
            reversed
                .add_package(package.mapped.clone(), package.original.clone())
                .overlay_metadata(&package.metadata);
        }

        for class in self.classes.values() {
            let new_class = reversed.add_class(class.mapped.clone(), class.original.clone());
            new_class.overlay_metadata(&class.metadata);

            for field in class.fields.values() {
                let descriptor = field.descriptor.as_deref().map(|d| self.remap_descriptor(d));
                new_class
                    .add_field(field.mapped.clone(), field.original.clone(), descriptor)
                    .overlay_metadata(&field.metadata);
            }

            for method in class.methods.values() {
                let new_method = new_class.add_method(
                    method.mapped.clone(),
                    self.remap_descriptor(&method.descriptor),
                    method.original.clone(),
                );
                new_method.overlay_metadata(&method.metadata);

                for parameter in method.parameters.values() {
                    new_method
                        .add_parameter(
                            parameter.index,
                            parameter.mapped.clone(),
                            parameter.original.clone(),
                        )
                        .overlay_metadata(&parameter.metadata);
                }
            }
        }

        reversed
    }

    /// Count the elements in the table.
    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats {
            packages: self.packages.len(),
            classes: self.classes.len(),
            ..Default::default()
        };
        for class in self.classes.values() {
            stats.fields += class.fields.len();
            stats.methods += class.methods.len();
            stats.parameters += class.methods.values().map(|m| m.parameters.len()).sum::<usize>();
        }
        stats
    }
}

/// Element counts for a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub packages: usize,
    pub classes: usize,
    pub fields: usize,
    pub methods: usize,
    pub parameters: usize,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packages, {} classes, {} fields, {} methods, {} parameters",
            self.packages, self.classes, self.fields, self.methods, self.parameters
        )
    }
}
