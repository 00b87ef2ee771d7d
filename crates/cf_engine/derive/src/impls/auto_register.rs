use crate::derive_data::ClassifyMeta;

/// Submit the type to the registry collected by `TypeRegistry::auto_register`.
///
/// Generic types are skipped, their instantiations are unknown here.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(meta: &ClassifyMeta) -> proc_macro2::TokenStream {
    if meta.impl_with_generic() {
        return proc_macro2::TokenStream::new();
    }

    let auto_register_ = crate::path::auto_register_(meta.cf_engine_path());
    let ident = meta.ident();

    quote::quote! {
        #auto_register_::inventory::submit!{
            #auto_register_::__AutoRegisterFunc(
                <#ident as #auto_register_::__RegisterType>::__register
            )
        }
    }
}

#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &ClassifyMeta) -> proc_macro2::TokenStream {
    proc_macro2::TokenStream::new()
}
