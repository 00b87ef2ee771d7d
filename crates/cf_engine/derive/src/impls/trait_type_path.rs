use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::ClassifyMeta;

/// Generate the `TypePath` impl.
///
/// Generic types append the paths of their arguments, computed once per
/// instantiation.
pub(crate) fn impl_trait_type_path(meta: &ClassifyMeta) -> TokenStream {
    let cf_engine_path = meta.cf_engine_path();
    let type_path_ = crate::path::type_path_(cf_engine_path);
    let info_ = crate::path::info_(cf_engine_path);
    let macro_exports_ = crate::path::macro_exports_(cf_engine_path);

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics();
    let base_path = meta.base_path();
    let base_name = meta.base_name();

    let (path_body, name_body) = if meta.impl_with_generic() {
        let params = meta.type_params().collect::<Vec<_>>();
        (
            quote! {
                static CELL: #info_::GenericPathCell = #info_::GenericPathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    #macro_exports_::generic_path(
                        #base_path,
                        &[#(<#params as #type_path_>::type_path()),*],
                    )
                })
            },
            quote! {
                static CELL: #info_::GenericPathCell = #info_::GenericPathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    #macro_exports_::generic_path(
                        #base_name,
                        &[#(<#params as #type_path_>::type_name()),*],
                    )
                })
            },
        )
    } else {
        (quote!(#base_path), quote!(#base_name))
    };

    quote! {
        impl #impl_generics #type_path_ for #ident #ty_generics #where_clause {
            #[inline]
            fn type_path() -> &'static str {
                #path_body
            }

            #[inline]
            fn type_name() -> &'static str {
                #name_body
            }
        }
    }
}
