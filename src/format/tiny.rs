//! Tiny text, read into a multi-namespace [`NamedTable`].
//!
//! Tiny v2:
//!
//! ```text
//! tiny	2	0	official	intermediary	named
//! c	a	class_1	Player
//! 	c	The player.
//! 	f	I	b	field_2	health
//! 	m	(La;)V	c	method_3	attack
//! 		p	1		arg1	target
//! ```
//!
//! Tiny v1 (flat, no parameters or comments):
//!
//! ```text
//! v1	official	intermediary	named
//! CLASS	a	class_1	Player
//! FIELD	a	I	b	field_2	health
//! METHOD	a	(La;)V	c	method_3	attack
//! ```
//!
//! Member descriptors are always written in the first namespace. An empty
//! name means the element keeps its first-namespace name. Comments are stored
//! under the `comment` metadata key.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::FormatError;
use crate::table::{Annotated, MappingTable};

/// Metadata key holding Tiny comments.
pub const COMMENT: &str = "comment";

/// A class with one name per namespace.
#[derive(Debug, Clone, Default)]
pub(super) struct NamedClass {
    pub(super) names: Vec<String>,
    pub(super) comment: Option<String>,
    pub(super) fields: Vec<NamedMember>,
    pub(super) methods: Vec<NamedMethod>,
}

/// A field or method. Descriptors are in the first namespace; fields may
/// have none.
#[derive(Debug, Clone, Default)]
pub(super) struct NamedMember {
    pub(super) descriptor: Option<String>,
    pub(super) names: Vec<String>,
    pub(super) comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct NamedMethod {
    pub(super) member: NamedMember,
    pub(super) parameters: Vec<NamedParameter>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct NamedParameter {
    pub(super) index: u32,
    pub(super) names: Vec<String>,
    pub(super) comment: Option<String>,
}

/// Parsed multi-namespace file holding every namespace it declares.
#[derive(Debug, Clone, Default)]
pub struct NamedTable {
    pub(super) namespaces: Vec<String>,
    pub(super) packages: Vec<Vec<String>>,
    pub(super) classes: Vec<NamedClass>,
}

/// Name at `index`, falling back to the first namespace when empty.
fn name_or_first(names: &[String], index: usize) -> &str {
    match names.get(index).map(String::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => names.first().map(String::as_str).unwrap_or_default(),
    }
}

impl NamedTable {
    pub(super) fn new(namespaces: Vec<String>) -> Self {
        Self { namespaces, packages: Vec::new(), classes: Vec::new() }
    }

    /// Namespace names in header order.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn namespace_index(&self, name: &str) -> Result<usize, FormatError> {
        self.namespaces.iter().position(|ns| ns == name).ok_or_else(|| {
            FormatError::UnknownNamespace {
                requested: name.to_string(),
                available: self.namespaces.clone(),
            }
        })
    }

    /// Project the file onto a `from -> to` table.
    ///
    /// Descriptors are rewritten from the first namespace into `from`.
    pub fn select(&self, from: &str, to: &str) -> Result<MappingTable, FormatError> {
        let from_index = self.namespace_index(from)?;
        let to_index = self.namespace_index(to)?;

        let mut first_to_from = MappingTable::new();
        if from_index != 0 {
            for class in &self.classes {
                first_to_from.add_class(
                    name_or_first(&class.names, 0),
                    name_or_first(&class.names, from_index),
                );
            }
        }

        let mut table = MappingTable::new();
        for names in &self.packages {
            table.add_package(name_or_first(names, from_index), name_or_first(names, to_index));
        }

        for named in &self.classes {
            let class = table.add_class(
                name_or_first(&named.names, from_index),
                name_or_first(&named.names, to_index),
            );
            if let Some(comment) = &named.comment {
                class.meta(COMMENT, comment.as_str());
            }

            for named_field in &named.fields {
                let field = class.add_field(
                    name_or_first(&named_field.names, from_index),
                    name_or_first(&named_field.names, to_index),
                    named_field.descriptor.as_deref().map(|d| first_to_from.remap_descriptor(d)),
                );
                if let Some(comment) = &named_field.comment {
                    field.meta(COMMENT, comment.as_str());
                }
            }

            for named_method in &named.methods {
                let member = &named_method.member;
                let descriptor = member.descriptor.as_deref().unwrap_or_default();
                let method = class.add_method(
                    name_or_first(&member.names, from_index),
                    first_to_from.remap_descriptor(descriptor),
                    name_or_first(&member.names, to_index),
                );
                if let Some(comment) = &member.comment {
                    method.meta(COMMENT, comment.as_str());
                }

                for named_parameter in &named_method.parameters {
                    let name_at = |index: usize| {
                        named_parameter.names.get(index).filter(|name| !name.is_empty()).cloned()
                    };
                    let parameter = method.add_parameter(
                        named_parameter.index,
                        name_at(from_index),
                        name_at(to_index),
                    );
                    if let Some(comment) = &named_parameter.comment {
                        parameter.meta(COMMENT, comment.as_str());
                    }
                }
            }
        }

        Ok(table)
    }
}

/// Where a comment line attaches.
#[derive(Clone, Copy)]
enum Scope {
    Class,
    Field,
    Method,
    Parameter,
}

/// Parse Tiny v2 text.
pub fn parse(text: &str) -> Result<NamedTable, FormatError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or_else(|| FormatError::syntax(1, "empty file"))?;
    let header: Vec<&str> = header.split('\t').collect();
    match header.as_slice() {
        ["tiny", "2", _, namespaces @ ..] if namespaces.len() >= 2 => {}
        _ => return Err(FormatError::syntax(1, "expected `tiny\\t2\\t<minor>\\t<ns>\\t<ns>...`")),
    }
    let mut table = NamedTable::new(header[3..].iter().map(|ns| ns.to_string()).collect());
    let width = table.namespaces.len();
    let mut escaped_names = false;
    let mut scope: Option<Scope> = None;

    for (number, raw) in lines {
        let line_no = number + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let depth = raw.chars().take_while(|c| *c == '\t').count();
        let columns: Vec<&str> = raw[depth..].split('\t').collect();
        let escaped = escaped_names;
        let name_columns = |from: usize| -> Result<Vec<String>, FormatError> {
            let names = columns.get(from..from + width).ok_or_else(|| {
                FormatError::syntax(line_no, format!("expected {width} names"))
            })?;
            Ok(names
                .iter()
                .map(|name| if escaped { unescape(name) } else { name.to_string() })
                .collect())
        };

        match (depth, columns[0]) {
            // Header properties precede the first class.
            (1, property) if table.classes.is_empty() && scope.is_none() => {
                if property == "escaped-names" {
                    escaped_names = true;
                }
            }
            (0, "c") => {
                table.classes.push(NamedClass { names: name_columns(1)?, ..Default::default() });
                scope = Some(Scope::Class);
            }
            (1, "f") | (1, "m") => {
                let descriptor = columns
                    .get(1)
                    .ok_or_else(|| FormatError::syntax(line_no, "missing descriptor"))?;
                let member = NamedMember {
                    descriptor: Some(descriptor.to_string()),
                    names: name_columns(2)?,
                    comment: None,
                };
                let class = current_class(&mut table, line_no)?;
                if columns[0] == "f" {
                    class.fields.push(member);
                    scope = Some(Scope::Field);
                } else {
                    class.methods.push(NamedMethod { member, parameters: Vec::new() });
                    scope = Some(Scope::Method);
                }
            }
            (2, "p") => {
                let index = columns
                    .get(1)
                    .and_then(|index| index.parse().ok())
                    .ok_or_else(|| FormatError::syntax(line_no, "invalid parameter index"))?;
                let parameter = NamedParameter { index, names: name_columns(2)?, comment: None };
                let method = current_class(&mut table, line_no)?
                    .methods
                    .last_mut()
                    .ok_or_else(|| FormatError::syntax(line_no, "parameter outside of a method"))?;
                method.parameters.push(parameter);
                scope = Some(Scope::Parameter);
            }
            (_, "c") => {
                let comment = columns
                    .get(1)
                    .map(|text| unescape(text))
                    .ok_or_else(|| FormatError::syntax(line_no, "missing comment text"))?;
                attach_comment(&mut table, scope, depth, comment, line_no)?;
            }
            // Local variables are not modelled.
            (_, "v") => {}
            (_, kind) => {
                return Err(FormatError::syntax(line_no, format!("unexpected `{kind}` at depth {depth}")))
            }
        }
    }

    Ok(table)
}

/// Parse Tiny v1 text.
///
/// Members name their owner by its first-namespace name; an owner without a
/// `CLASS` line keeps that name in every namespace.
pub fn parse_v1(text: &str) -> Result<NamedTable, FormatError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or_else(|| FormatError::syntax(1, "empty file"))?;
    let header: Vec<&str> = header.split('\t').collect();
    match header.as_slice() {
        ["v1", namespaces @ ..] if namespaces.len() >= 2 => {}
        _ => return Err(FormatError::syntax(1, "expected `v1\\t<ns>\\t<ns>...`")),
    }
    let mut table = NamedTable::new(header[1..].iter().map(|ns| ns.to_string()).collect());
    let width = table.namespaces.len();
    let mut owners: HashMap<String, usize> = HashMap::new();

    for (number, raw) in lines {
        let line_no = number + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = raw.split('\t').collect();
        let names = |from: usize| -> Result<Vec<String>, FormatError> {
            columns
                .get(from..from + width)
                .map(|names| names.iter().map(|name| name.to_string()).collect())
                .ok_or_else(|| FormatError::syntax(line_no, format!("expected {width} names")))
        };

        match columns[0] {
            "CLASS" => {
                let names = names(1)?;
                match owners.get(&names[0]) {
                    Some(&index) => table.classes[index].names = names,
                    None => {
                        owners.insert(names[0].clone(), table.classes.len());
                        table.classes.push(NamedClass { names, ..Default::default() });
                    }
                }
            }
            kind @ ("FIELD" | "METHOD") => {
                let (owner, descriptor) = match columns.as_slice() {
                    [_, owner, descriptor, ..] => (*owner, *descriptor),
                    _ => return Err(FormatError::syntax(line_no, "missing owner or descriptor")),
                };
                let member = NamedMember {
                    descriptor: Some(descriptor.to_string()),
                    names: names(3)?,
                    comment: None,
                };
                let index = *owners.entry(owner.to_string()).or_insert_with(|| {
                    let mut names = vec![String::new(); width];
                    names[0] = owner.to_string();
                    table.classes.push(NamedClass { names, ..Default::default() });
                    table.classes.len() - 1
                });
                let class = &mut table.classes[index];
                if kind == "FIELD" {
                    class.fields.push(member);
                } else {
                    class.methods.push(NamedMethod { member, parameters: Vec::new() });
                }
            }
            other => {
                return Err(FormatError::syntax(line_no, format!("unknown line kind `{other}`")))
            }
        }
    }

    Ok(table)
}

fn current_class(table: &mut NamedTable, line: usize) -> Result<&mut NamedClass, FormatError> {
    table
        .classes
        .last_mut()
        .ok_or_else(|| FormatError::syntax(line, "member outside of a class"))
}

fn attach_comment(
    table: &mut NamedTable,
    scope: Option<Scope>,
    depth: usize,
    comment: String,
    line: usize,
) -> Result<(), FormatError> {
    let class = current_class(table, line)?;
    let slot = match (depth, scope) {
        (1, _) => Some(&mut class.comment),
        (2, Some(Scope::Field)) => class.fields.last_mut().map(|f| &mut f.comment),
        (2, Some(Scope::Method | Scope::Parameter)) => {
            class.methods.last_mut().map(|m| &mut m.member.comment)
        }
        (3, Some(Scope::Parameter)) => class
            .methods
            .last_mut()
            .and_then(|m| m.parameters.last_mut())
            .map(|p| &mut p.comment),
        _ => None,
    }
    .ok_or_else(|| FormatError::syntax(line, "comment has nothing to attach to"))?;
    *slot = Some(comment);
    Ok(())
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

/// Write `table` as two-namespace Tiny v2 text.
///
/// Packages are not representable and are skipped. Metadata under
/// [`COMMENT`] is written back as comments.
pub fn write(table: &MappingTable, from: &str, to: &str) -> String {
    let mut out = format!("tiny\t2\t0\t{from}\t{to}\n");
    let comment = |out: &mut String, depth: usize, element: &dyn Annotated| {
        if let Some(text) = element.metadata().get(COMMENT) {
            let _ = writeln!(out, "{}c\t{}", "\t".repeat(depth), escape(text));
        }
    };

    for class in table.classes() {
        let _ = writeln!(out, "c\t{}\t{}", class.original(), class.mapped());
        comment(&mut out, 1, class);
        for field in class.fields() {
            let descriptor = field.descriptor().unwrap_or("Ljava/lang/Object;");
            let _ = writeln!(out, "\tf\t{}\t{}\t{}", descriptor, field.original(), field.mapped());
            comment(&mut out, 2, field);
        }
        for method in class.methods() {
            let _ = writeln!(
                out,
                "\tm\t{}\t{}\t{}",
                method.descriptor(),
                method.original(),
                method.mapped()
            );
            comment(&mut out, 2, method);
            for parameter in method.parameters() {
                let _ = writeln!(
                    out,
                    "\t\tp\t{}\t{}\t{}",
                    parameter.index(),
                    parameter.original().unwrap_or_default(),
                    parameter.mapped().unwrap_or_default()
                );
                comment(&mut out, 3, parameter);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\ta\tclass_1\tcom/example/Player
\tc\tThe player.\\nSecond line.
\tf\tI\tb\tfield_2\thealth
\t\tc\tHit points.
\tm\t(La;)V\tc\tmethod_3\tattack
\t\tc\tAttack someone.
\t\tp\t1\t\targ1\ttarget
\t\t\tc\tWho to hit.
c\td\tclass_4\t
";

    #[test]
    fn test_parse_namespaces() {
        let named = parse(SAMPLE).unwrap();
        assert_eq!(named.namespaces(), ["official", "intermediary", "named"]);
    }

    #[test]
    fn test_select_official_named() {
        let table = parse(SAMPLE).unwrap().select("official", "named").unwrap();
        let class = table.class("a").unwrap();
        assert_eq!(class.mapped(), "com/example/Player");
        assert_eq!(
            class.metadata().get(COMMENT).map(String::as_str),
            Some("The player.\nSecond line.")
        );
        let field = class.field("b").unwrap();
        assert_eq!(field.mapped(), "health");
        assert_eq!(field.metadata().get(COMMENT).map(String::as_str), Some("Hit points."));

        let method = class.method("c", "(La;)V").unwrap();
        assert_eq!(method.mapped(), "attack");
        assert_eq!(method.metadata().get(COMMENT).map(String::as_str), Some("Attack someone."));
        let parameter = method.parameter(1).unwrap();
        assert_eq!(parameter.original(), None);
        assert_eq!(parameter.mapped(), Some("target"));
        assert_eq!(parameter.metadata().get(COMMENT).map(String::as_str), Some("Who to hit."));
    }

    #[test]
    fn test_empty_name_falls_back_to_first_namespace() {
        let table = parse(SAMPLE).unwrap().select("official", "named").unwrap();
        assert_eq!(table.class("d").unwrap().mapped(), "d");
    }

    #[test]
    fn test_select_rewrites_descriptors_into_from_namespace() {
        let table = parse(SAMPLE).unwrap().select("intermediary", "named").unwrap();
        let class = table.class("class_1").unwrap();
        assert!(class.method("method_3", "(Lclass_1;)V").is_some());
    }

    #[test]
    fn test_select_unknown_namespace() {
        let err = parse(SAMPLE).unwrap().select("official", "mojang").unwrap_err();
        assert!(matches!(err, FormatError::UnknownNamespace { ref requested, .. } if requested == "mojang"));
    }

    #[test]
    fn test_header_properties_and_escaped_names() {
        let text = "tiny\t2\t0\ta\tb\n\tescaped-names\nc\tx\\ty\tz\n";
        let table = parse(text).unwrap().select("a", "b").unwrap();
        assert_eq!(table.class("x\ty").unwrap().mapped(), "z");
    }

    #[test]
    fn test_bad_header() {
        assert!(parse("tiny\t1\t0\ta\n").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parameter_outside_method() {
        assert!(parse("tiny\t2\t0\ta\tb\nc\ta\tb\n\t\tp\t1\tx\ty\n").is_err());
    }

    #[test]
    fn test_write_then_parse_keeps_comments() {
        let mut table = MappingTable::new();
        let class = table.add_class("a", "Player");
        class.meta(COMMENT, "line\tone");
        class.add_method("b", "()V", "tick").add_parameter(0, None, Some("delta".into()));

        let text = write(&table, "official", "named");
        let back = parse(&text).unwrap().select("official", "named").unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_parse_v1() {
        let text = "v1\tofficial\tintermediary\tnamed\n\
                    # comment\n\
                    CLASS\ta\tclass_1\tcom/example/Player\n\
                    FIELD\ta\tI\tb\tfield_2\thealth\n\
                    METHOD\ta\t(La;)V\tc\tmethod_3\tattack\n\
                    METHOD\tz\t()V\td\tmethod_4\ttick\n";
        let named = parse_v1(text).unwrap();
        assert_eq!(named.namespaces(), ["official", "intermediary", "named"]);

        let table = named.select("intermediary", "named").unwrap();
        let class = table.class("class_1").unwrap();
        assert_eq!(class.mapped(), "com/example/Player");
        assert_eq!(class.field("field_2").unwrap().mapped(), "health");
        assert_eq!(class.field("field_2").unwrap().descriptor(), Some("I"));
        assert_eq!(class.method("method_3", "(Lclass_1;)V").unwrap().mapped(), "attack");
        let orphan = table.class("z").unwrap();
        assert_eq!(orphan.mapped(), "z");
        assert_eq!(orphan.method("method_4", "()V").unwrap().mapped(), "tick");
    }

    #[test]
    fn test_parse_v1_errors() {
        assert!(parse_v1("v1\tonly\n").is_err());
        assert!(matches!(
            parse_v1("v1\ta\tb\nLOCAL\tx\ty\n"),
            Err(FormatError::Syntax { line: 2, .. })
        ));
        assert!(parse_v1("v1\ta\tb\nFIELD\ta\tI\tb\n").is_err());
    }
}
