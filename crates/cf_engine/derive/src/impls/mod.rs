// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod enum_kind;
mod object_kind;
mod trait_classify;
mod trait_type_path;
mod trait_typed;

// -----------------------------------------------------------------------------
// Internal API

use auto_register::get_auto_register_impl;
use enum_kind::impl_enum;
use object_kind::impl_object;
use trait_classify::impl_trait_classify;
use trait_type_path::impl_trait_type_path;
use trait_typed::impl_trait_typed;

use proc_macro2::TokenStream;

use crate::derive_data::ClassifyDerive;

/// Every impl of the derive, wrapped in an anonymous const.
pub(crate) fn impl_classify(derive: &ClassifyDerive) -> TokenStream {
    let tokens = match derive {
        ClassifyDerive::Object(info) => impl_object(info),
        ClassifyDerive::Enum(info) => impl_enum(info),
    };

    quote::quote! {
        const _: () = {
            #tokens
        };
    }
}
