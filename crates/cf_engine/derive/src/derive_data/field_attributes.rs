use syn::{Attribute, Expr, LitStr};

use crate::CLASSIFY_ATTRIBUTE_NAME;

/// `#[classify(...)]` on a field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub ignore: bool,
    pub parent: bool,
    pub follow_id: bool,
    pub ignore_if_default: bool,
    pub ignore_if_empty: bool,
    /// Expression compared with the value of the field.
    pub ignore_if_eq: Option<Expr>,
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(CLASSIFY_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let flag = if meta.path.is_ident("ignore") {
                    &mut out.ignore
                } else if meta.path.is_ident("parent") {
                    &mut out.parent
                } else if meta.path.is_ident("follow_id") {
                    &mut out.follow_id
                } else if meta.path.is_ident("ignore_if_default") {
                    &mut out.ignore_if_default
                } else if meta.path.is_ident("ignore_if_empty") {
                    &mut out.ignore_if_empty
                } else if meta.path.is_ident("ignore_if_eq") {
                    out.ignore_if_eq = Some(meta.value()?.parse()?);
                    return Ok(());
                } else if meta.path.is_ident("rename") {
                    out.rename = Some(meta.value()?.parse()?);
                    return Ok(());
                } else {
                    return Err(meta.error(
                        "unknown field attribute, expected one of: `ignore`, `parent`, \
                         `follow_id`, `ignore_if_default`, `ignore_if_empty`, \
                         `ignore_if_eq`, `rename`",
                    ));
                };
                *flag = true;
                Ok(())
            })?;
        }

        Ok(out)
    }

    /// Names of the `FieldFlags` constants to set.
    ///
    /// `IGNORE_IF_EQUAL` is set along with the equality check.
    pub fn flag_names(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.ignore, "IGNORE"),
            (self.parent, "PARENT"),
            (self.follow_id, "FOLLOW_ID"),
            (self.ignore_if_default, "IGNORE_IF_DEFAULT"),
            (self.ignore_if_empty, "IGNORE_IF_EMPTY"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
    }
}

/// `#[classify(rename = "...")]` on an enum variant, the only variant attribute.
pub(crate) fn parse_variant_rename(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut rename = None;
    for attr in attrs {
        if !attr.path().is_ident(CLASSIFY_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                rename = Some(meta.value()?.parse()?);
                return Ok(());
            }
            Err(meta.error("enum variants only accept `rename`"))
        })?;
    }
    Ok(rename)
}
