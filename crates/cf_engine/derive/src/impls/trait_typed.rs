use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ClassifyMeta;

/// Generate the `Typed` impl around `type_info_tokens`, an expression of
/// type `TypeInfo`.
pub(crate) fn impl_trait_typed(meta: &ClassifyMeta, type_info_tokens: TokenStream) -> TokenStream {
    let cf_engine_path = meta.cf_engine_path();
    let typed_ = crate::path::typed_(cf_engine_path);
    let type_info_ = crate::path::type_info_(cf_engine_path);
    let info_ = crate::path::info_(cf_engine_path);

    let inner_cell_tokens = if meta.impl_with_generic() {
        quote! {
            static CELL: #info_::GenericInfoCell = #info_::GenericInfoCell::new();
            CELL.get_or_insert::<Self>(|| {
                #type_info_tokens
            })
        }
    } else {
        quote! {
            static CELL: #info_::NonGenericInfoCell = #info_::NonGenericInfoCell::new();
            CELL.get_or_init(|| {
                #type_info_tokens
            })
        }
    };

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics();

    quote! {
        impl #impl_generics #typed_ for #ident #ty_generics #where_clause {
            fn type_info() -> &'static #type_info_ {
                #inner_cell_tokens
            }
        }
    }
}
