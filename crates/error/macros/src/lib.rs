//! Proc-macro companion to `nebula-error`.
//!
//! `#[derive(ErrorCode)]` implements `nebula_error::ErrorCode` for an enum
//! whose variants carry a `#[code = "..."]` attribute (falling back to the
//! variant name in `snake_case` when absent) and an optional `#[retryable]`
//! marker attribute.
//!
//! ```ignore
//! #[derive(Debug, thiserror::Error, nebula_error_macros::ErrorCode)]
//! enum MyError {
//!     #[error("node {0} timed out")]
//!     #[code = "node_timeout"]
//!     #[retryable]
//!     NodeTimeout(String),
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

#[proc_macro_derive(ErrorCode, attributes(code, retryable))]
pub fn derive_error_code(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input, "ErrorCode can only be derived for enums")
            .to_compile_error()
            .into();
    };

    let mut code_arms = Vec::new();
    let mut retryable_arms = Vec::new();

    for variant in &data.variants {
        let vident = &variant.ident;
        let pattern = match &variant.fields {
            Fields::Unit => quote! { Self::#vident },
            Fields::Unnamed(_) => quote! { Self::#vident(..) },
            Fields::Named(_) => quote! { Self::#vident { .. } },
        };

        let mut code = to_snake_case(&vident.to_string());
        let mut retryable = false;
        for attr in &variant.attrs {
            if attr.path().is_ident("code") {
                if let syn::Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s),
                        ..
                    }) = &nv.value
                    {
                        code = s.value();
                    }
                }
            }
            if attr.path().is_ident("retryable") {
                retryable = true;
            }
        }

        code_arms.push(quote! { #pattern => #code });
        if retryable {
            retryable_arms.push(quote! { #pattern => true, });
        }
    }

    let expanded = quote! {
        impl nebula_error::ErrorCode for #name {
            fn code(&self) -> &'static str {
                match self {
                    #(#code_arms,)*
                }
            }

            fn retryable(&self) -> bool {
                #[allow(unreachable_patterns)]
                match self {
                    #(#retryable_arms)*
                    _ => false,
                }
            }
        }
    };

    expanded.into()
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.char_indices() {
        if ch.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
