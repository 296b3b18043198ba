//! ProGuard mapping text.
//!
//! ```text
//! # comment
//! com.example.Player -> a:
//!     int health -> b
//!     1:4:void attack(com.example.Player,int) -> c
//! ```
//!
//! ProGuard files map the readable names to the obfuscated ones, so the
//! resulting table is `named -> obfuscated`; callers wanting the usual
//! direction reverse it. Descriptors are recorded in the named namespace.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::FormatError;
use crate::table::MappingTable;

fn class_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+) -> (\S+):$").expect("class pattern is valid"))
}

fn member_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\d+:\d+:)?(\S+) ([^\s(]+)(?:\(([^)]*)\))?(?::\d+(?::\d+)?)? -> (\S+)$")
            .expect("member pattern is valid")
    })
}

/// Parse ProGuard text into a `named -> obfuscated` table.
pub fn parse(text: &str) -> Result<MappingTable, FormatError> {
    let mut table = MappingTable::new();
    let mut current: Option<String> = None;

    for (number, raw) in text.lines().enumerate() {
        let line_no = number + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !raw.starts_with(char::is_whitespace) {
            let caps = class_line()
                .captures(trimmed)
                .ok_or_else(|| FormatError::syntax(line_no, "expected `name -> obf:`"))?;
            let original = internal_name(&caps[1]);
            table.add_class(original.clone(), internal_name(&caps[2]));
            current = Some(original);
            continue;
        }

        let owner = current
            .as_deref()
            .ok_or_else(|| FormatError::syntax(line_no, "member outside of a class"))?;
        let caps = member_line()
            .captures(trimmed)
            .ok_or_else(|| FormatError::syntax(line_no, "malformed member line"))?;

        let name = &caps[2];
        // Qualified names describe code inlined from another class.
        if name.contains('.') {
            continue;
        }
        let return_type = java_type_descriptor(&caps[1]);
        let mapped = &caps[4];

        let Some(class) = table.class_mut(owner) else {
            continue;
        };
        match caps.get(3) {
            Some(args) => {
                let descriptor = method_descriptor(args.as_str(), &return_type);
                class.add_method(name, descriptor, mapped);
            }
            None => {
                class.add_field(name, mapped, Some(return_type));
            }
        }
    }

    Ok(table)
}

/// `com.example.Outer$Inner` to `com/example/Outer$Inner`.
fn internal_name(java_name: &str) -> String {
    java_name.replace('.', "/")
}

fn method_descriptor(args: &str, return_descriptor: &str) -> String {
    let mut descriptor = String::from("(");
    for arg in args.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        descriptor.push_str(&java_type_descriptor(arg));
    }
    descriptor.push(')');
    descriptor.push_str(return_descriptor);
    descriptor
}

/// Convert a Java source type (`int[]`, `java.lang.String`) to a descriptor.
pub fn java_type_descriptor(java_type: &str) -> String {
    let mut base = java_type.trim();
    let mut dims = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        dims += 1;
    }

    let element = match base {
        "void" => "V".to_string(),
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "short" => "S".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "float" => "F".to_string(),
        "double" => "D".to_string(),
        class => format!("L{};", internal_name(class)),
    };
    format!("{}{}", "[".repeat(dims), element)
}
