use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ClassifyMeta;

/// Generate the `Classify` impl.
///
/// `extra_tokens` holds the kind-specific methods, at least `value_ref`.
pub(crate) fn impl_trait_classify(meta: &ClassifyMeta, extra_tokens: TokenStream) -> TokenStream {
    let cf_engine_path = meta.cf_engine_path();
    let classify_ = crate::path::classify_(cf_engine_path);
    let typed_ = crate::path::typed_(cf_engine_path);
    let type_info_ = crate::path::type_info_(cf_engine_path);
    let macro_exports_ = crate::path::macro_exports_(cf_engine_path);

    let hooks_tokens = if meta.attrs().hooks.is_some() {
        let hooks_ = crate::path::hooks_(cf_engine_path);
        quote! {
            #[inline]
            fn before_classify(&self) {
                <Self as #hooks_>::before_classify(self)
            }

            #[inline]
            fn after_classify(&self) {
                <Self as #hooks_>::after_classify(self)
            }

            #[inline]
            fn before_declassify(&mut self) {
                <Self as #hooks_>::before_declassify(self)
            }

            #[inline]
            fn after_declassify(&mut self) {
                <Self as #hooks_>::after_declassify(self)
            }
        }
    } else {
        TokenStream::new()
    };

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics();

    quote! {
        impl #impl_generics #classify_ for #ident #ty_generics #where_clause {
            #[inline]
            fn classify_info(&self) -> &'static #type_info_ {
                <Self as #typed_>::type_info()
            }

            #[inline]
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            #[inline]
            fn into_any(
                self: #macro_exports_::Box<Self>,
            ) -> #macro_exports_::Box<dyn ::core::any::Any> {
                self
            }

            #extra_tokens

            #hooks_tokens
        }
    }
}
