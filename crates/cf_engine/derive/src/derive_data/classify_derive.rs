use std::collections::HashSet;

use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, Member, Type};

use super::{ClassifyMeta, FieldAttributes, TypeAttributes, parse_variant_rename};

/// What the derive generates for a type.
pub(crate) enum ClassifyDerive<'a> {
    /// A plain object: a struct with named fields, or a unit struct.
    Object(ClassifyStruct<'a>),
    /// A fieldless enum, classified as its variant name.
    Enum(ClassifyEnum<'a>),
}

pub(crate) struct ClassifyStruct<'a> {
    pub meta: ClassifyMeta<'a>,
    pub fields: Vec<StructField<'a>>,
}

pub(crate) struct StructField<'a> {
    pub member: Member,
    pub ty: &'a Type,
    /// Persisted name.
    pub name: String,
    pub attrs: FieldAttributes,
}

pub(crate) struct ClassifyEnum<'a> {
    pub meta: ClassifyMeta<'a>,
    pub variants: Vec<EnumVariant<'a>>,
}

pub(crate) struct EnumVariant<'a> {
    pub ident: &'a Ident,
    /// Persisted name.
    pub name: String,
}

/// `r#type` becomes `type`, `_cache` becomes `cache`.
fn persisted_name(ident: &Ident) -> String {
    let name = ident.unraw().to_string();
    match name.strip_prefix('_') {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => name,
    }
}

fn check_unique<'n>(names: impl Iterator<Item = (&'n str, proc_macro2::Span)>) -> syn::Result<()> {
    let mut seen = HashSet::new();
    for (name, span) in names {
        if !seen.insert(name) {
            return Err(syn::Error::new(span, format!("duplicate persisted name `{name}`")));
        }
    }
    Ok(())
}

impl<'a> ClassifyDerive<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;
        let meta = ClassifyMeta::new(attrs, &input.ident, &input.generics)?;

        match &input.data {
            Data::Struct(data) => {
                let fields = match &data.fields {
                    Fields::Named(named) => named
                        .named
                        .iter()
                        .map(|field| {
                            let attrs = FieldAttributes::parse_attrs(&field.attrs)?;
                            let Some(ident) = &field.ident else {
                                return Err(syn::Error::new(field.span(), "expected a named field"));
                            };
                            let name = match &attrs.rename {
                                Some(rename) => rename.value(),
                                None => persisted_name(ident),
                            };
                            Ok(StructField {
                                member: Member::Named(ident.clone()),
                                ty: &field.ty,
                                name,
                                attrs,
                            })
                        })
                        .collect::<syn::Result<Vec<_>>>()?,
                    Fields::Unit => Vec::new(),
                    Fields::Unnamed(unnamed) => {
                        return Err(syn::Error::new(
                            unnamed.span(),
                            "`Classify` needs named fields, tuple structs are not supported",
                        ));
                    }
                };
                check_unique(fields.iter().map(|f| (f.name.as_str(), f.ty.span())))?;
                Ok(Self::Object(ClassifyStruct { meta, fields }))
            }
            Data::Enum(data) => {
                if meta.impl_with_generic() {
                    return Err(syn::Error::new(
                        input.generics.span(),
                        "`Classify` cannot be derived for generic enums",
                    ));
                }
                if data.variants.is_empty() {
                    return Err(syn::Error::new(input.ident.span(), "enum without variants"));
                }
                let variants = data
                    .variants
                    .iter()
                    .map(|variant| {
                        if !matches!(variant.fields, Fields::Unit) {
                            return Err(syn::Error::new(
                                variant.span(),
                                "`Classify` enums cannot have fields",
                            ));
                        }
                        let name = match parse_variant_rename(&variant.attrs)? {
                            Some(rename) => rename.value(),
                            None => variant.ident.unraw().to_string(),
                        };
                        Ok(EnumVariant {
                            ident: &variant.ident,
                            name,
                        })
                    })
                    .collect::<syn::Result<Vec<_>>>()?;
                check_unique(variants.iter().map(|v| (v.name.as_str(), v.ident.span())))?;
                Ok(Self::Enum(ClassifyEnum { meta, variants }))
            }
            Data::Union(data) => Err(syn::Error::new(
                data.union_token.span,
                "`Classify` cannot be derived for unions",
            )),
        }
    }
}
