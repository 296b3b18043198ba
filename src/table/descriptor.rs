//! JVM type descriptor helpers.
//!
//! Descriptors reference classes as `Lpkg/Name;`. Every other character is a
//! primitive tag, an array marker, or method punctuation, so rewriting a
//! descriptor only ever touches the text between an `L` and the next `;`.

/// Rewrite every object type in `descriptor` through `map_class`.
///
/// Malformed input (an `L` with no terminating `;`) is copied through unchanged
/// from that point on.
pub fn remap_descriptor<F>(descriptor: &str, mut map_class: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;

    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..=start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                out.push_str(&map_class(&after[..end]));
                out.push(';');
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}
