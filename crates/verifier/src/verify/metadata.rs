use pnacl_ir::{InstData, MdKind, metadata::MetadataKinds};

use crate::config::MetadataWhitelist;

/// Attachments of `data` whose kind is not whitelisted, in attachment order.
pub fn disallowed_attachments<'a>(
    whitelist: &'a MetadataWhitelist,
    kinds: &'a MetadataKinds,
    data: &'a InstData,
) -> impl Iterator<Item = MdKind> + 'a {
    data.metadata
        .iter()
        .map(|(kind, _)| *kind)
        .filter(move |kind| !whitelist.allows(kinds, *kind))
}

/// `!name`, or `!<unknown kind #N>` for ids without a registered name.
pub fn metadata_kind_text(kinds: &MetadataKinds, kind: MdKind) -> String {
    match kinds.name(kind) {
        Some(name) => format!("!{name}"),
        None => format!("!<unknown kind #{}>", kind.0),
    }
}
