use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn an asynchronous test into a Rocket test against a freshly seeded
/// server, with test logging enabled and dependencies injected.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// `crate::engine::Engine` (the engine behind that client), and
/// [`rocket::http::Header`], which is the `Authorization` header of a
/// signed-in session and needs a login argument: `voter`, `admin` or `agent`.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Which demo identity, if any, to sign in as.
    let login = parse_macro_input!(args as Option<Ident>);

    // Extract type information and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone(), login.is_some()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let maybe_login = match login {
        Some(role) => {
            let example = match role.to_string().as_str() {
                "voter" => format_ident!("example_voter"),
                "admin" => format_ident!("example_admin"),
                "agent" => format_ident!("example_agent"),
                _ => {
                    return syn::Error::new(role.span(), "Expected one of `voter`, `admin` or `agent`")
                        .into_compile_error()
                        .into();
                }
            };
            quote! {
                let login_response = rocket_client
                    .post(uri!(crate::api::auth::login))
                    .header(rocket::http::ContentType::JSON)
                    .body(rocket::serde::json::json!(crate::model::api::auth::LoginRequest::#example()).to_string())
                    .dispatch()
                    .await;
                assert_eq!(rocket::http::Status::Ok, login_response.status(), "test login failed");
                let session = login_response
                    .into_json::<crate::model::api::auth::LoginResponse>()
                    .await
                    .unwrap();
                let auth_header = rocket::http::Header::new(
                    "Authorization",
                    format!("{}{}", crate::model::api::auth::BEARER_PREFIX, session.token),
                );
            }
        }
        None => TokenStream2::new(),
    };

    // Rewrite the test function.
    quote! {
        #[rocket::async_test]
        #[allow(unused_variables)]
        async fn #name() {
            // This test enters backend code, so enable logging.
            log4rs_test_utils::test_logging::init_logging_once_for(["evote_backend"], None, None);

            let rocket_client = rocket::local::asynchronous::Client::tracked(
                crate::rocket_for_engine(crate::engine::Engine::new(crate::store::Store::example())),
            )
            .await
            .unwrap();
            let engine = rocket_client
                .rocket()
                .state::<crate::engine::Engine>()
                .unwrap()
                .clone();

            #maybe_login

            /// The test itself.
            #item_fn

            #new_name(#(#test_args),*).await;
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature, logged_in: bool) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_engine = false;
    let mut has_header = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself
                    if let Some(segment) = type_path.path.segments.last() {
                        let (seen, arg) = if segment.ident == "Client" {
                            (&mut has_client, quote! { rocket_client })
                        } else if segment.ident == "Engine" {
                            (&mut has_engine, quote! { engine.clone() })
                        } else if segment.ident == "Header" {
                            if !logged_in {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "A `Header` can only be injected with `#[backend_test(voter|admin|agent)]`",
                                ));
                            }
                            (&mut has_header, quote! { auth_header.clone() })
                        } else {
                            return Err(unexpected(input));
                        };
                        if *seen {
                            return Err(syn::Error::new(
                                input.span(),
                                format!("Test cannot accept more than one `{}`", segment.ident),
                            ));
                        }
                        *seen = true;
                        args.push(arg);
                        continue;
                    }
                }
            }
        }

        return Err(unexpected(input));
    }

    Ok(args)
}

fn unexpected(input: &FnArg) -> syn::Error {
    syn::Error::new(
        input.span(),
        "Expected one of `client_ident: Client`, `engine_ident: Engine` or `header_ident: Header`",
    )
}
