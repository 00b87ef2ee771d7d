use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{get_auto_register_impl, impl_trait_classify, impl_trait_type_path, impl_trait_typed};

use crate::derive_data::ClassifyStruct;

/// Implement everything for a plain object.
pub(crate) fn impl_object(info: &ClassifyStruct) -> TokenStream {
    let meta = &info.meta;

    let type_path_tokens = impl_trait_type_path(meta);
    let typed_tokens = impl_trait_typed(meta, get_object_info_tokens(info));
    let classify_tokens = impl_trait_classify(meta, get_object_classify_methods(info));
    let object_tokens = impl_trait_object(info);
    let auto_register_tokens = get_auto_register_impl(meta);

    quote! {
        #type_path_tokens

        #typed_tokens

        #classify_tokens

        #object_tokens

        #auto_register_tokens
    }
}

/// `TypeInfo::Object(ObjectInfo::new::<Self>(&[...]) ...)`
fn get_object_info_tokens(info: &ClassifyStruct) -> TokenStream {
    let meta = &info.meta;
    let cf_engine_path = meta.cf_engine_path();
    let info_ = crate::path::info_(cf_engine_path);
    let typed_ = crate::path::typed_(cf_engine_path);
    let classify_ = crate::path::classify_(cf_engine_path);
    let macro_exports_ = crate::path::macro_exports_(cf_engine_path);

    let fields = info.fields.iter().map(|field| {
        let name = &field.name;
        let ty = field.ty;
        let flags = field.attrs.flag_names().map(|flag| format_ident!("{flag}"));
        let equal_check = field.attrs.ignore_if_eq.as_ref().map(|expr| {
            quote! {
                .with_equal_check(|value: &dyn #classify_| {
                    value
                        .downcast_ref::<#ty>()
                        .is_some_and(|value| *value == #expr)
                })
            }
        });

        quote! {
            #info_::FieldInfo::new(#name, <#ty as #typed_>::type_info)
                .with_flags(#info_::FieldFlags::empty()#(.union(#info_::FieldFlags::#flags))*)
                #equal_check
        }
    });

    let attrs = meta.attrs();
    let type_flags = [
        (attrs.ignore_if_default, "IGNORE_IF_DEFAULT"),
        (attrs.ignore_if_empty, "IGNORE_IF_EMPTY"),
    ]
    .into_iter()
    .filter_map(|(set, flag)| set.then(|| format_ident!("{flag}")));

    let constructor = attrs.default.map(|span| {
        quote::quote_spanned! { span =>
            .with_constructor(|| -> #macro_exports_::Box<dyn #classify_> {
                #macro_exports_::Box::new(<Self as ::core::default::Default>::default())
            })
        }
    });

    quote! {
        #info_::TypeInfo::Object(
            #info_::ObjectInfo::new::<Self>(&[#(#fields),*])
                .with_flags(#info_::FieldFlags::empty()#(.union(#info_::FieldFlags::#type_flags))*)
                #constructor
        )
    }
}

fn get_object_classify_methods(info: &ClassifyStruct) -> TokenStream {
    let value_ = crate::path::value_(info.meta.cf_engine_path());

    quote! {
        #[inline]
        fn value_ref(&self) -> #value_::ValueRef<'_> {
            #value_::ValueRef::Object(self)
        }

        #[inline]
        fn as_object_mut(&mut self) -> ::core::option::Option<&mut dyn #value_::Object> {
            ::core::option::Option::Some(self)
        }
    }
}

/// Generate the `Object` impl: access by name, by index, and assignment.
fn impl_trait_object(info: &ClassifyStruct) -> TokenStream {
    let meta = &info.meta;
    let cf_engine_path = meta.cf_engine_path();
    let value_ = crate::path::value_(cf_engine_path);
    let classify_ = crate::path::classify_(cf_engine_path);
    let typed_ = crate::path::typed_(cf_engine_path);
    let type_path_ = crate::path::type_path_(cf_engine_path);
    let error_ = crate::path::error_(cf_engine_path);
    let macro_exports_ = crate::path::macro_exports_(cf_engine_path);

    let names = info.fields.iter().map(|field| &field.name).collect::<Vec<_>>();
    let members = info.fields.iter().map(|field| &field.member).collect::<Vec<_>>();
    let types = info.fields.iter().map(|field| field.ty).collect::<Vec<_>>();
    let indices = 0..info.fields.len();

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics();

    quote! {
        impl #impl_generics #value_::Object for #ident #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::core::option::Option<&dyn #classify_> {
                match name {
                    #(#names => ::core::option::Option::Some(&self.#members),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_at(&self, index: usize) -> ::core::option::Option<&dyn #classify_> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#members),)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: #macro_exports_::Box<dyn #classify_>,
            ) -> ::core::result::Result<(), #error_> {
                match name {
                    #(#names => {
                        self.#members = <#types as #typed_>::from_boxed(value)?;
                        ::core::result::Result::Ok(())
                    })*
                    _ => ::core::result::Result::Err(#error_::malformed(
                        #macro_exports_::format!(
                            "`{}` has no field `{}`",
                            <Self as #type_path_>::type_path(),
                            name,
                        ),
                    )),
                }
            }
        }
    }
}
