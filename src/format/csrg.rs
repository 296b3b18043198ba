//! CSRG text: compact SRG with one element per flat line.
//!
//! ```text
//! a/ net/example/
//! a/b net/example/Player
//! a/b c health
//! a/b d (La/b;)V attack
//! ```
//!
//! Members name their owner in the left namespace; owners without a class
//! line keep their name.

use crate::error::FormatError;
use crate::table::MappingTable;

/// Parse CSRG text into a left-to-right table.
pub fn parse(text: &str) -> Result<MappingTable, FormatError> {
    let mut table = MappingTable::new();

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [original, mapped] if original.ends_with('/') => {
                table.add_package(original.trim_end_matches('/'), mapped.trim_end_matches('/'));
            }
            [original, mapped] => {
                table.add_class(*original, *mapped);
            }
            [owner, name, mapped] => {
                table.class_or_identity(owner).add_field(*name, *mapped, None);
            }
            [owner, name, descriptor, mapped] => {
                table.class_or_identity(owner).add_method(*name, *descriptor, *mapped);
            }
            _ => return Err(FormatError::syntax(line_no, "expected 2 to 4 columns")),
        }
    }

    Ok(table)
}
