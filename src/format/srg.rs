//! SRG and XSRG text.
//!
//! ```text
//! PK: a net/example
//! CL: a/b net/example/Player
//! FD: a/b/c net/example/Player/health          (SRG)
//! FD: a/b/c I net/example/Player/health I      (XSRG)
//! MD: a/b/d (La/b;)V net/example/Player/attack (Lnet/example/Player;)V
//! ```
//!
//! Members may precede their class line; the owner is created on demand and
//! renamed once its `CL:` line is read.

use crate::error::FormatError;
use crate::table::MappingTable;

/// Parse SRG or XSRG text into a left-to-right table.
pub fn parse(text: &str) -> Result<MappingTable, FormatError> {
    let mut table = MappingTable::new();

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let (kind, rest) = line
            .split_once(':')
            .ok_or_else(|| FormatError::syntax(line_no, "expected `KIND: ...`"))?;
        let tokens: Vec<&str> = rest.split_whitespace().collect();

        match (kind, tokens.as_slice()) {
            ("PK", [original, mapped]) => {
                table.add_package(*original, *mapped);
            }
            ("CL", [original, mapped]) => {
                table.add_class(*original, *mapped);
            }
            ("FD", [original, mapped]) => {
                let (owner, name) = split_member(original, line_no)?;
                let (_, mapped_name) = split_member(mapped, line_no)?;
                table.class_or_identity(owner).add_field(name, mapped_name, None);
            }
            ("FD", [original, descriptor, mapped, _]) => {
                let (owner, name) = split_member(original, line_no)?;
                let (_, mapped_name) = split_member(mapped, line_no)?;
                table.class_or_identity(owner).add_field(
                    name,
                    mapped_name,
                    Some(descriptor.to_string()),
                );
            }
            ("MD", [original, descriptor, mapped, _]) => {
                let (owner, name) = split_member(original, line_no)?;
                let (_, mapped_name) = split_member(mapped, line_no)?;
                table.class_or_identity(owner).add_method(name, *descriptor, mapped_name);
            }
            ("PK" | "CL" | "FD" | "MD", _) => {
                return Err(FormatError::syntax(
                    line_no,
                    format!("wrong number of tokens for {kind}"),
                ));
            }
            _ => return Err(FormatError::syntax(line_no, format!("unknown line kind `{kind}`"))),
        }
    }

    Ok(table)
}

/// Split `owner/name` at the last slash.
fn split_member(qualified: &str, line: usize) -> Result<(&str, &str), FormatError> {
    qualified
        .rsplit_once('/')
        .ok_or_else(|| FormatError::syntax(line, format!("`{qualified}` has no owner")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_srg() {
        let table = parse(
            "PK: a net/example\n\
             CL: a/b net/example/Player\n\
             FD: a/b/c net/example/Player/health\n\
             MD: a/b/d (La/b;)V net/example/Player/attack (Lnet/example/Player;)V\n",
        )
        .unwrap();

        assert_eq!(table.package("a").unwrap().mapped(), "net/example");
        let class = table.class("a/b").unwrap();
        assert_eq!(class.mapped(), "net/example/Player");
        assert_eq!(class.field("c").unwrap().mapped(), "health");
        assert_eq!(class.field("c").unwrap().descriptor(), None);
        assert_eq!(class.method("d", "(La/b;)V").unwrap().mapped(), "attack");
    }

    #[test]
    fn test_parse_xsrg_field_descriptor() {
        let table = parse("CL: a Player\nFD: a/b I Player/health I\n").unwrap();
        assert_eq!(table.class("a").unwrap().field("b").unwrap().descriptor(), Some("I"));
    }

    #[test]
    fn test_member_before_class() {
        let table = parse("FD: a/b Player/health\nCL: a Player\n").unwrap();
        let class = table.class("a").unwrap();
        assert_eq!(class.mapped(), "Player");
        assert!(class.field("b").is_some());
    }

    #[test]
    fn test_member_without_class_line_keeps_owner() {
        let table = parse("MD: a/b ()V a/run ()V\n").unwrap();
        let class = table.class("a").unwrap();
        assert_eq!(class.mapped(), "a");
        assert_eq!(class.method("b", "()V").unwrap().mapped(), "run");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let table = parse("# header\n\nCL: a Player # trailing\n").unwrap();
        assert_eq!(table.class("a").unwrap().mapped(), "Player");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("CL: a\n"), Err(FormatError::Syntax { line: 1, .. })));
        assert!(matches!(parse("CL: a b\nXX: c d\n"), Err(FormatError::Syntax { line: 2, .. })));
        assert!(parse("FD: nope Player/x\n").is_err());
    }
}
