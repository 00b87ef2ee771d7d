use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr};

use crate::CLASSIFY_ATTRIBUTE_NAME;

/// `#[classify(...)]` on the type.
#[derive(Default, Debug)]
pub(crate) struct TypeAttributes {
    /// The type implements `Default`.
    pub default: Option<Span>,
    /// Forward hooks to `ClassifyHooks`.
    pub hooks: Option<Span>,
    pub ignore_if_default: bool,
    pub ignore_if_empty: bool,
    /// Custom type path, without generics.
    pub type_path: Option<LitStr>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(CLASSIFY_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    out.default = Some(meta.path.span());
                    return Ok(());
                }
                if meta.path.is_ident("hooks") {
                    out.hooks = Some(meta.path.span());
                    return Ok(());
                }
                if meta.path.is_ident("ignore_if_default") {
                    out.ignore_if_default = true;
                    return Ok(());
                }
                if meta.path.is_ident("ignore_if_empty") {
                    out.ignore_if_empty = true;
                    return Ok(());
                }
                if meta.path.is_ident("type_path") {
                    let path: LitStr = meta.value()?.parse()?;
                    let value = path.value();
                    if value.is_empty() || value.starts_with("::") || value.contains(['<', '>', ' ']) {
                        return Err(syn::Error::new(
                            path.span(),
                            "`type_path` must be a plain path like `my_crate::module::Type`",
                        ));
                    }
                    out.type_path = Some(path);
                    return Ok(());
                }
                Err(meta.error(
                    "unknown type attribute, expected one of: \
                     `default`, `hooks`, `ignore_if_default`, `ignore_if_empty`, `type_path`",
                ))
            })?;
        }

        Ok(out)
    }
}
