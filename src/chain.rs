//! Composition of mapping tables.
//!
//! [`chain`] joins a table `A -> B` with a table `B -> C` into `A -> C`.
//! Unlike a strict join, nothing from the left operand is ever dropped:
//!
//! - an element whose mapped name is found on the right takes the right
//!   operand's mapped name, and its metadata is the left metadata overlaid by
//!   the right metadata (right wins on conflicting keys);
//! - an element with no match is copied from the left operand unchanged.
//!
//! Parameters are matched by index. Parameters that only exist on the matched
//! right-hand method are appended, so a parameter set is a union over indices.
//!
//! Because of the fallback rule the operator is neither commutative nor
//! associative in general. Callers reducing several tables must keep the
//! operand order fixed; see [`chain_all`].

use std::collections::BTreeSet;

use crate::table::{Annotated, ClassMapping, MappingTable, MethodMapping};

/// Chain `ours` (`A -> B`) with `theirs` (`B -> C`) into `A -> C`.
pub fn chain(ours: &MappingTable, theirs: &MappingTable) -> MappingTable {
    let mut out = MappingTable::new();

    for our_package in ours.packages() {
        match theirs.package(our_package.mapped()) {
            Some(their_package) => {
                let package = out.add_package(our_package.original(), their_package.mapped());
                package.overlay_metadata(our_package.metadata());
                package.overlay_metadata(their_package.metadata());
            }
            None => {
                out.add_package(our_package.original(), our_package.mapped())
                    .overlay_metadata(our_package.metadata());
            }
        }
    }

    for our_class in ours.classes() {
        let their_class = theirs.class(our_class.mapped());
        let mapped = their_class.map_or(our_class.mapped(), ClassMapping::mapped);

        let class = out.add_class(our_class.original(), mapped);
        class.overlay_metadata(our_class.metadata());
        if let Some(their_class) = their_class {
            class.overlay_metadata(their_class.metadata());
        }

        for our_field in our_class.fields() {
            let their_field = their_class.and_then(|c| c.field(our_field.mapped()));
            let mapped = their_field.map_or(our_field.mapped(), |f| f.mapped());

            let field = class.add_field(
                our_field.original(),
                mapped,
                our_field.descriptor().map(str::to_string),
            );
            field.overlay_metadata(our_field.metadata());
            if let Some(their_field) = their_field {
                field.overlay_metadata(their_field.metadata());
            }
        }

        for our_method in our_class.methods() {
            // The right operand keys its methods by B-namespace descriptors.
            let their_method = their_class.and_then(|c| {
                c.method(our_method.mapped(), &ours.remap_descriptor(our_method.descriptor()))
            });
            let mapped = their_method.map_or(our_method.mapped(), MethodMapping::mapped);

            let method =
                class.add_method(our_method.original(), our_method.descriptor(), mapped);
            method.overlay_metadata(our_method.metadata());
            if let Some(their_method) = their_method {
                method.overlay_metadata(their_method.metadata());
            }

            let mut seen = BTreeSet::new();
            for our_parameter in our_method.parameters() {
                let index = our_parameter.index();
                let their_parameter = their_method.and_then(|m| m.parameter(index));

                match their_parameter {
                    Some(their_parameter) => {
                        let parameter = method.add_parameter(
                            index,
                            our_parameter.original().map(str::to_string),
                            their_parameter.mapped().map(str::to_string),
                        );
                        parameter.overlay_metadata(our_parameter.metadata());
                        parameter.overlay_metadata(their_parameter.metadata());
                        seen.insert(index);
                    }
                    None => {
                        method
                            .add_parameter(
                                index,
                                our_parameter.original().map(str::to_string),
                                our_parameter.mapped().map(str::to_string),
                            )
                            .overlay_metadata(our_parameter.metadata());
                    }
                }
            }

            if let Some(their_method) = their_method {
                for their_parameter in their_method.parameters() {
                    if seen.contains(&their_parameter.index()) {
                        continue;
                    }
                    method
                        .add_parameter(
                            their_parameter.index(),
                            their_parameter.original().map(str::to_string),
                            their_parameter.mapped().map(str::to_string),
                        )
                        .overlay_metadata(their_parameter.metadata());
                }
            }
        }
    }

    out
}

/// Reduce per-side tables left to right.
///
/// Each step is a [`chain`] of the accumulated table with the next one,
/// after which the packages and classes that only the next table knows are
/// carried over as well: sides describe disjoint parts of the same artifact,
/// so a class present on one side only must survive the reduction. The
/// iteration order of `tables` is the composition order. Returns `None` for an
/// empty input.
pub fn chain_all<I>(tables: I) -> Option<MappingTable>
where
    I: IntoIterator<Item = MappingTable>,
{
    tables.into_iter().reduce(|acc, next| {
        let mut out = chain(&acc, &next);
        absorb_unmatched(&mut out, &acc, &next);
        out
    })
}

/// Copy elements of `next` that were neither matched by `acc` nor already
/// present in `out`.
fn absorb_unmatched(out: &mut MappingTable, acc: &MappingTable, next: &MappingTable) {
    let consumed_packages: BTreeSet<&str> = acc.packages().map(|p| p.mapped()).collect();
    for package in next.packages() {
        if consumed_packages.contains(package.original()) || out.package(package.original()).is_some()
        {
            continue;
        }
        out.insert_package(package.clone());
    }

    let consumed_classes: BTreeSet<&str> = acc.classes().map(|c| c.mapped()).collect();
    for class in next.classes() {
        if consumed_classes.contains(class.original()) || out.class(class.original()).is_some() {
            continue;
        }
        out.insert_class(class.clone());
    }
}
