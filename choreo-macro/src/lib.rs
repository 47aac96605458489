#![forbid(unsafe_code)]

extern crate proc_macro;

#[macro_use]
extern crate proc_macro_error;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Implements `PayloadType` using the kebab-case name of the struct.
///
/// `OrderCreated` becomes `order-created`, which is the message name every
/// payload of this type is published, dispatched and scheduled under.
#[proc_macro_error]
#[proc_macro_derive(Payload)]
pub fn payload_derive(input: TokenStream) -> TokenStream {
    let DeriveInput { ident, data, .. } = parse_macro_input!(input);

    let syn::Data::Struct(_) = data else {
        abort!(ident, "Derive Payload only available on struct");
    };

    let name = ident.to_string().to_case(Case::Kebab);

    quote! {
        impl PayloadType for #ident {
            fn payload_type() -> &'static str {
                #name
            }
        }
    }
    .into()
}

#[proc_macro_error]
#[proc_macro_derive(Saga)]
pub fn saga_derive(input: TokenStream) -> TokenStream {
    let DeriveInput { ident, data, .. } = parse_macro_input!(input);

    if let syn::Data::Union(_) = data {
        abort!(ident, "Derive Saga not available on union");
    }

    let name = ident.to_string().to_case(Case::Kebab);

    quote! {
        impl SagaInfo for #ident {
            fn saga_type() -> &'static str {
                #name
            }
        }
    }
    .into()
}
