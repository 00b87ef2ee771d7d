use proc_macro2::TokenStream;
use quote::quote;
use syn::{Generics, Ident, ImplGenerics, Path, TypeGenerics, WhereClause};

use super::TypeAttributes;

/// Type-level data shared by every generated impl.
pub(crate) struct ClassifyMeta<'a> {
    cf_engine_path: Path,
    attrs: TypeAttributes,
    ident: &'a Ident,
    generics: &'a Generics,
    /// `generics` with a `Typed` bound on every type parameter.
    bounded: Generics,
}

impl<'a> ClassifyMeta<'a> {
    pub fn new(attrs: TypeAttributes, ident: &'a Ident, generics: &'a Generics) -> syn::Result<Self> {
        if let Some(lifetime) = generics.lifetimes().next() {
            return Err(syn::Error::new_spanned(
                lifetime,
                "`Classify` cannot be derived for types with lifetime parameters",
            ));
        }
        if let Some(param) = generics.const_params().next() {
            return Err(syn::Error::new_spanned(
                param,
                "`Classify` cannot be derived for types with const parameters",
            ));
        }

        let cf_engine_path = crate::path::cf_engine();
        let typed_ = crate::path::typed_(&cf_engine_path);

        let mut bounded = generics.clone();
        let params = generics.type_params().map(|param| param.ident.clone()).collect::<Vec<_>>();
        let where_clause = bounded.make_where_clause();
        for param in params {
            where_clause.predicates.push(syn::parse_quote!(#param: #typed_));
        }

        Ok(Self {
            cf_engine_path,
            attrs,
            ident,
            generics,
            bounded,
        })
    }

    #[inline]
    pub fn cf_engine_path(&self) -> &Path {
        &self.cf_engine_path
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn ident(&self) -> &Ident {
        self.ident
    }

    #[inline]
    pub fn impl_with_generic(&self) -> bool {
        self.generics.type_params().next().is_some()
    }

    pub fn split_generics(&self) -> (ImplGenerics<'_>, TypeGenerics<'_>, Option<&WhereClause>) {
        self.bounded.split_for_impl()
    }

    /// Type parameters, appended to the type path.
    pub fn type_params(&self) -> impl Iterator<Item = &Ident> {
        self.generics.type_params().map(|param| &param.ident)
    }

    /// Expression of the path without generics.
    pub fn base_path(&self) -> TokenStream {
        match &self.attrs.type_path {
            Some(path) => quote!(#path),
            None => {
                let name = self.ident.to_string();
                quote!(::core::concat!(::core::module_path!(), "::", #name))
            }
        }
    }

    /// The last segment of [`Self::base_path`].
    pub fn base_name(&self) -> String {
        match &self.attrs.type_path {
            Some(path) => {
                let path = path.value();
                match path.rsplit_once("::") {
                    Some((_, name)) => name.to_owned(),
                    None => path,
                }
            }
            None => self.ident.to_string(),
        }
    }
}
