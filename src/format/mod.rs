//! Mapping formats: artifact bytes to [`MappingTable`].
//!
//! Formats form a closed set selected by name from entry configuration:
//!
//! | Name | Reads | Entry kinds |
//! |------|-------|-------------|
//! | `fart` | any flat text syntax below, plus CSRG and Tiny v1, detected from content | plain, namespaced |
//! | `proguard` | ProGuard `a.B -> c:` text | plain |
//! | `xsrg` / `srg` | `CL:`/`FD:`/`MD:` lines | plain |
//! | `tsrg` | TSRG v1 indented text, or TSRG v2 with a `tsrg2` header | plain |
//! | `namespaced` | Tiny v2 text with two or more namespaces | plain, namespaced |
//! | `tiny` | zip holding `mappings/mappings.tiny`, or flat Tiny v2 | plain, namespaced |
//! | `parchment` | Parchment JSON (or zip holding `parchment.json`) | plain |
//!
//! Compatibility is checked when an entry is registered, not when it is
//! resolved.

mod container;
pub mod csrg;
pub mod parchment;
pub mod proguard;
pub mod srg;
pub mod tiny;
pub mod tsrg;

use std::fmt;
use std::fs;
use std::path::Path;

use crate::entry::{EntryKind, MappingEntry};
use crate::error::FormatError;
use crate::table::MappingTable;

pub use parchment::ParameterDocs;
pub use tiny::NamedTable;

/// Container paths tried by the `tiny` format, in order.
const TINY_CONTAINER_PATHS: &[&str] = &["mappings/mappings.tiny", "hashed/mappings.tiny"];

/// Container path read by the `parchment` format.
const PARCHMENT_CONTAINER_PATHS: &[&str] = &["parchment.json"];

/// A mapping format decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    /// Content-detected flat text
    Fart,
    /// ProGuard (obfuscator output: named -> obfuscated)
    Proguard,
    /// SRG and XSRG
    XSrg,
    /// TSRG v1, or multi-namespace TSRG v2
    Tsrg,
    /// Multi-namespace Tiny v2 text
    Namespaced,
    /// Tiny v2, possibly wrapped in a jar
    Tiny,
    /// Documentation-only Parchment export
    Parchment(ParameterDocs),
}

impl MappingFormat {
    /// Every registered format, in registry order.
    pub const ALL: &'static [MappingFormat] = &[
        MappingFormat::Fart,
        MappingFormat::Proguard,
        MappingFormat::XSrg,
        MappingFormat::Tsrg,
        MappingFormat::Namespaced,
        MappingFormat::Tiny,
        MappingFormat::Parchment(ParameterDocs::MethodLevel),
    ];

    /// Look up a format by its configured name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fart" => Some(Self::Fart),
            "proguard" => Some(Self::Proguard),
            "xsrg" | "srg" => Some(Self::XSrg),
            "tsrg" => Some(Self::Tsrg),
            "namespaced" => Some(Self::Namespaced),
            "tiny" => Some(Self::Tiny),
            "parchment" => Some(Self::Parchment(ParameterDocs::default())),
            _ => None,
        }
    }

    /// Name used in configuration and state keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fart => "fart",
            Self::Proguard => "proguard",
            Self::XSrg => "xsrg",
            Self::Tsrg => "tsrg",
            Self::Namespaced => "namespaced",
            Self::Tiny => "tiny",
            Self::Parchment(_) => "parchment",
        }
    }

    /// Whether this format can decode artifacts for entries of `kind`.
    ///
    /// Formats that can hold more than two namespaces accept namespace
    /// selecting entries; the built-in entries never decode through a format.
    pub fn accepts(&self, kind: &EntryKind) -> bool {
        match kind {
            EntryKind::Plain => true,
            EntryKind::Namespaced { .. } => {
                matches!(self, Self::Fart | Self::Tsrg | Self::Namespaced | Self::Tiny)
            }
            EntryKind::Obfuscated | EntryKind::Official => false,
        }
    }

    /// Decode the artifact at `path` on behalf of `entry`.
    pub fn decode(&self, path: &Path, entry: &MappingEntry) -> Result<MappingTable, FormatError> {
        log::debug!("decoding {} as {} for '{}'", path.display(), self, entry.name());
        match self {
            Self::Fart => decode_detected(&fs::read_to_string(path)?, entry),
            Self::Proguard => proguard::parse(&fs::read_to_string(path)?),
            Self::XSrg => srg::parse(&fs::read_to_string(path)?),
            Self::Tsrg => {
                let text = fs::read_to_string(path)?;
                match detect_syntax(&text) {
                    Some(Syntax::Tsrg2) => select_namespaces(tsrg::parse_v2(&text)?, entry),
                    _ => tsrg::parse(&text),
                }
            }
            Self::Namespaced => decode_namespaced(&fs::read_to_string(path)?, entry),
            Self::Tiny => {
                let text = match container::read_entry(path, TINY_CONTAINER_PATHS)? {
                    Some(text) => text,
                    None => fs::read_to_string(path)?,
                };
                decode_namespaced(&text, entry)
            }
            Self::Parchment(docs) => {
                let text = match container::read_entry(path, PARCHMENT_CONTAINER_PATHS)? {
                    Some(text) => text,
                    None => fs::read_to_string(path)?,
                };
                parchment::parse(&text, *docs)
            }
        }
    }
}

impl fmt::Display for MappingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse Tiny v2 text and select the namespace pair `entry` asks for.
///
/// An entry that declares `from`/`to` always gets that pair. Otherwise the
/// file must have exactly two namespaces.
pub fn decode_namespaced(text: &str, entry: &MappingEntry) -> Result<MappingTable, FormatError> {
    select_namespaces(tiny::parse(text)?, entry)
}

fn select_namespaces(named: NamedTable, entry: &MappingEntry) -> Result<MappingTable, FormatError> {
    match entry.namespaces() {
        Some((from, to)) => named.select(from, to),
        None if named.namespaces().len() == 2 => {
            let namespaces = named.namespaces();
            named.select(&namespaces[0], &namespaces[1])
        }
        None => Err(FormatError::AmbiguousNamespaces { found: named.namespaces().to_vec() }),
    }
}

/// Syntaxes recognized by the `fart` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Proguard,
    Srg,
    Csrg,
    Tsrg,
    Tsrg2,
    TinyV1,
    TinyV2,
}

/// Guess the syntax of a flat mappings file.
///
/// Headers and line prefixes decide from the first significant line. Headerless
/// columnar text is TSRG v1 when any line is indented, and CSRG when some
/// flat line has member columns.
pub fn detect_syntax(text: &str) -> Option<Syntax> {
    let mut significant = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'));
    let line = significant.next()?;

    if line.starts_with("tiny\t2\t") {
        return Some(Syntax::TinyV2);
    }
    if line.starts_with("v1\t") {
        return Some(Syntax::TinyV1);
    }
    if line.starts_with("tsrg2 ") {
        return Some(Syntax::Tsrg2);
    }
    if ["PK:", "CL:", "FD:", "MD:"].iter().any(|prefix| line.starts_with(prefix)) {
        return Some(Syntax::Srg);
    }
    if line.contains(" -> ") && line.ends_with(':') {
        return Some(Syntax::Proguard);
    }
    let starts_identifier = line.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$');
    if !starts_identifier {
        return None;
    }

    let mut has_members = false;
    for line in std::iter::once(line).chain(significant) {
        if line.starts_with(['\t', ' ']) {
            return Some(Syntax::Tsrg);
        }
        match line.split_whitespace().count() {
            2 => {}
            3 | 4 => has_members = true,
            _ => return None,
        }
    }
    Some(if has_members { Syntax::Csrg } else { Syntax::Tsrg })
}

fn decode_detected(text: &str, entry: &MappingEntry) -> Result<MappingTable, FormatError> {
    match detect_syntax(text) {
        Some(Syntax::Proguard) => proguard::parse(text),
        Some(Syntax::Srg) => srg::parse(text),
        Some(Syntax::Csrg) => csrg::parse(text),
        Some(Syntax::Tsrg) => tsrg::parse(text),
        Some(Syntax::Tsrg2) => select_namespaces(tsrg::parse_v2(text)?, entry),
        Some(Syntax::TinyV1) => select_namespaces(tiny::parse_v1(text)?, entry),
        Some(Syntax::TinyV2) => decode_namespaced(text, entry),
        None => Err(FormatError::UnrecognizedSyntax),
    }
}
