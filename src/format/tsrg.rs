//! TSRG v1 text.
//!
//! ```text
//! a/ net/example/
//! a/b net/example/Player
//! 	c health
//! 	d (La/b;)V attack
//! ```
//!
//! Package lines end with `/`. Member lines are indented and belong to the
//! nearest class line above them.
//!
//! TSRG v2 declares its namespaces in a header and gives one name per
//! namespace. Descriptors are in the first namespace; fields may carry one.
//!
//! ```text
//! tsrg2 obf srg named
//! a/b net/example/C_1_ net/example/Player
//! 	c f_2_ health
//! 	d (La/b;)V m_3_ attack
//! 		static
//! 		0 o p_0 target
//! ```

use crate::error::FormatError;
use crate::table::MappingTable;

use super::tiny::{NamedClass, NamedMember, NamedMethod, NamedParameter, NamedTable};

/// Parse TSRG v1 text into a left-to-right table.
pub fn parse(text: &str) -> Result<MappingTable, FormatError> {
    let mut table = MappingTable::new();
    let mut current: Option<String> = None;

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let content = raw.split('#').next().unwrap_or_default().trim_end();
        if content.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();

        if content.starts_with(['\t', ' ']) {
            let owner = current
                .as_deref()
                .ok_or_else(|| FormatError::syntax(line_no, "member outside of a class"))?;
            let class = table.class_or_identity(owner);
            match tokens.as_slice() {
                [original, mapped] => {
                    class.add_field(*original, *mapped, None);
                }
                [original, descriptor, mapped] => {
                    class.add_method(*original, *descriptor, *mapped);
                }
                _ => return Err(FormatError::syntax(line_no, "expected 2 or 3 member tokens")),
            }
            continue;
        }

        match tokens.as_slice() {
            [original, mapped] if original.ends_with('/') => {
                table.add_package(
                    original.trim_end_matches('/'),
                    mapped.trim_end_matches('/'),
                );
                current = None;
            }
            [original, mapped] => {
                table.add_class(*original, *mapped);
                current = Some(original.to_string());
            }
            _ => return Err(FormatError::syntax(line_no, "expected `original mapped`")),
        }
    }

    Ok(table)
}

/// Parse TSRG v2 text into a multi-namespace table.
pub fn parse_v2(text: &str) -> Result<NamedTable, FormatError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or_else(|| FormatError::syntax(1, "empty file"))?;
    let header: Vec<&str> = header.split_whitespace().collect();
    match header.as_slice() {
        ["tsrg2", namespaces @ ..] if namespaces.len() >= 2 => {}
        _ => return Err(FormatError::syntax(1, "expected `tsrg2 <ns> <ns>...`")),
    }
    let mut table = NamedTable::new(header[1..].iter().map(|ns| ns.to_string()).collect());
    let width = table.namespaces.len();
    let owned = |tokens: &[&str]| tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>();

    for (number, raw) in lines {
        let line_no = number + 1;
        let content = raw.trim_end();
        if content.trim().is_empty() || content.trim_start().starts_with('#') {
            continue;
        }
        let depth = content.chars().take_while(|c| *c == '\t' || *c == ' ').count();
        let tokens: Vec<&str> = content.split_whitespace().collect();

        match depth {
            0 if tokens.len() == width && tokens[0].ends_with('/') => {
                table.packages.push(tokens.iter().map(|t| t.trim_end_matches('/').to_string()).collect());
            }
            0 if tokens.len() == width => {
                table.classes.push(NamedClass { names: owned(&tokens[..]), ..Default::default() });
            }
            1 => {
                let class = table
                    .classes
                    .last_mut()
                    .ok_or_else(|| FormatError::syntax(line_no, "member outside of a class"))?;
                if tokens.len() == width {
                    class.fields.push(NamedMember {
                        descriptor: None,
                        names: owned(&tokens[..]),
                        comment: None,
                    });
                } else if tokens.len() == width + 1 {
                    let mut names = owned(&tokens[..]);
                    let descriptor = names.remove(1);
                    let member = NamedMember { descriptor: Some(descriptor), names, comment: None };
                    if member.descriptor.as_deref().is_some_and(|d| d.starts_with('(')) {
                        class.methods.push(NamedMethod { member, parameters: Vec::new() });
                    } else {
                        class.fields.push(member);
                    }
                } else {
                    return Err(FormatError::syntax(line_no, format!("expected {width} member names")));
                }
            }
            2 if tokens == ["static"] => {}
            2 if tokens.len() == width + 1 => {
                let index = tokens[0]
                    .parse()
                    .map_err(|_| FormatError::syntax(line_no, "invalid parameter index"))?;
                let method = table
                    .classes
                    .last_mut()
                    .and_then(|class| class.methods.last_mut())
                    .ok_or_else(|| FormatError::syntax(line_no, "parameter outside of a method"))?;
                method.parameters.push(NamedParameter {
                    index,
                    names: owned(&tokens[1..]),
                    comment: None,
                });
            }
            _ => return Err(FormatError::syntax(line_no, format!("expected {width} names"))),
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "a/ net/example/\n\
                          a/b net/example/Player\n\
                          \tc health\n\
                          \td (La/b;)V attack\n\
                          a/e net/example/World\n";

    #[test]
    fn test_parse_tsrg() {
        let table = parse(SAMPLE).unwrap();
        assert_eq!(table.package("a").unwrap().mapped(), "net/example");

        let player = table.class("a/b").unwrap();
        assert_eq!(player.mapped(), "net/example/Player");
        assert_eq!(player.field("c").unwrap().mapped(), "health");
        assert_eq!(player.method("d", "(La/b;)V").unwrap().mapped(), "attack");

        let world = table.class("a/e").unwrap();
        assert_eq!(world.fields().count(), 0);
    }

    #[test]
    fn test_member_outside_class() {
        let err = parse("\tc health\n").unwrap_err();
        assert!(matches!(err, FormatError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_member_after_package_is_error() {
        assert!(parse("a/ net/\n\tc health\n").is_err());
    }

    #[test]
    fn test_too_many_tokens() {
        assert!(parse("a b c\n").is_err());
        assert!(parse("a b\n\tc d e f\n").is_err());
    }

    const SAMPLE_V2: &str = "tsrg2 obf srg named\n\
                             a/ net/example/ net/example/\n\
                             a/b net/example/C_1_ net/example/Player\n\
                             \tc f_2_ health\n\
                             \te I f_5_ level\n\
                             \td (La/b;)V m_3_ attack\n\
                             \t\tstatic\n\
                             \t\t0 o p_0 target\n";

    #[test]
    fn test_parse_v2() {
        let named = parse_v2(SAMPLE_V2).unwrap();
        assert_eq!(named.namespaces(), ["obf", "srg", "named"]);

        let table = named.select("obf", "named").unwrap();
        assert_eq!(table.package("a").unwrap().mapped(), "net/example");
        let class = table.class("a/b").unwrap();
        assert_eq!(class.mapped(), "net/example/Player");
        assert_eq!(class.field("c").unwrap().mapped(), "health");
        assert_eq!(class.field("c").unwrap().descriptor(), None);
        assert_eq!(class.field("e").unwrap().descriptor(), Some("I"));
        let method = class.method("d", "(La/b;)V").unwrap();
        assert_eq!(method.mapped(), "attack");
        assert_eq!(method.parameter(0).unwrap().original(), Some("o"));
        assert_eq!(method.parameter(0).unwrap().mapped(), Some("target"));
    }

    #[test]
    fn test_parse_v2_selects_descriptors_in_from_namespace() {
        let table = parse_v2(SAMPLE_V2).unwrap().select("srg", "named").unwrap();
        let class = table.class("net/example/C_1_").unwrap();
        assert_eq!(class.method("m_3_", "(Lnet/example/C_1_;)V").unwrap().mapped(), "attack");
    }

    #[test]
    fn test_parse_v2_errors() {
        assert!(parse_v2("tsrg2 obf\n").is_err());
        assert!(matches!(
            parse_v2("tsrg2 a b\n\tc d\n"),
            Err(FormatError::Syntax { line: 2, .. })
        ));
        assert!(parse_v2("tsrg2 a b\na b\n\tc d e f\n").is_err());
    }
}
