use proc_macro2::TokenStream;
use quote::quote;

use super::{get_auto_register_impl, impl_trait_classify, impl_trait_type_path, impl_trait_typed};

use crate::derive_data::ClassifyEnum;

/// Implement everything for a fieldless enum.
///
/// The enum is a simple type keyed by variant name.
pub(crate) fn impl_enum(info: &ClassifyEnum) -> TokenStream {
    let meta = &info.meta;
    let cf_engine_path = meta.cf_engine_path();
    let info_ = crate::path::info_(cf_engine_path);
    let classify_ = crate::path::classify_(cf_engine_path);
    let value_ = crate::path::value_(cf_engine_path);
    let scalar_ = crate::path::scalar_(cf_engine_path);
    let macro_exports_ = crate::path::macro_exports_(cf_engine_path);

    let names = info.variants.iter().map(|v| &v.name).collect::<Vec<_>>();
    let variants = info.variants.iter().map(|v| v.ident).collect::<Vec<_>>();

    let with_default = meta.attrs().default.map(|span| {
        quote::quote_spanned! { span =>
            .with_default(|| -> #macro_exports_::Box<dyn #classify_> {
                #macro_exports_::Box::new(<Self as ::core::default::Default>::default())
            })
        }
    });

    let type_info_tokens = quote! {
        #info_::TypeInfo::Simple(
            #info_::SimpleInfo::with_converter(
                #info_::Type::of::<Self>(),
                |scalar| match scalar {
                    #scalar_::Str(name) => match name.as_str() {
                        #(#names => ::core::option::Option::Some(
                            #macro_exports_::Box::new(Self::#variants) as #macro_exports_::Box<dyn #classify_>
                        ),)*
                        _ => ::core::option::Option::None,
                    },
                    _ => ::core::option::Option::None,
                },
            )
            #with_default
        )
    };

    let classify_methods = quote! {
        fn value_ref(&self) -> #value_::ValueRef<'_> {
            let name = match self {
                #(Self::#variants => #names,)*
            };
            #value_::ValueRef::Simple(#scalar_::Str(#macro_exports_::String::from(name)))
        }
    };

    let type_path_tokens = impl_trait_type_path(meta);
    let typed_tokens = impl_trait_typed(meta, type_info_tokens);
    let classify_tokens = impl_trait_classify(meta, classify_methods);
    let auto_register_tokens = get_auto_register_impl(meta);

    quote! {
        #type_path_tokens

        #typed_tokens

        #classify_tokens

        #auto_register_tokens
    }
}
