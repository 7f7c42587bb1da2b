use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{parse_macro_input, ItemFn, LitStr};

#[derive(Clone, Copy)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl Format {
    fn to_tokens(self) -> proc_macro2::TokenStream {
        match self {
            Format::Text => quote!(linkhook::Format::Text),
            Format::Json => quote!(linkhook::Format::Json),
            Format::JsonPretty => quote!(linkhook::Format::JsonPretty),
        }
    }
}

#[derive(Clone, Copy)]
enum Trace {
    Off,
    Stdout,
    Tracing,
}

impl Trace {
    fn to_tokens(self) -> proc_macro2::TokenStream {
        match self {
            Trace::Off => quote!(linkhook::Trace::Off),
            Trace::Stdout => quote!(linkhook::Trace::Stdout),
            Trace::Tracing => quote!(linkhook::Trace::Tracing),
        }
    }
}

/// Opens an allocation ledger window for the whole function and prints the
/// memory report when it returns.
///
/// The body runs with a `LedgerGuard` alive. The guard is dropped on every
/// exit path, so the report is printed for early returns and `?` errors too.
///
/// # Parameters
///
/// * `format` - `"text"` (default), `"json"`, or `"json-pretty"`
/// * `trace` - `"stdout"` (default), `"tracing"`, or `"off"`
///
/// # Examples
///
/// ```rust,ignore
/// #[linkhook::main]
/// fn main() {
///     // Your code here
/// }
/// ```
///
/// ```rust,ignore
/// #[linkhook::main(format = "json", trace = "off")]
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     Ok(())
/// }
/// ```
///
/// # Limitations
///
/// Only one guard can be alive at a time.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;

    let mut format = Format::Text;
    let mut trace = Trace::Stdout;

    if !attr.is_empty() {
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("format") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: LitStr = meta.input.parse()?;
                format = match lit.value().as_str() {
                    "text" => Format::Text,
                    "json" => Format::Json,
                    "json-pretty" => Format::JsonPretty,
                    other => {
                        return Err(meta.error(format!(
                            "Unknown format {:?}. Expected one of: \"text\", \"json\", \"json-pretty\"",
                            other
                        )))
                    }
                };
                return Ok(());
            }

            if meta.path.is_ident("trace") {
                meta.input.parse::<syn::Token![=]>()?;
                let lit: LitStr = meta.input.parse()?;
                trace = match lit.value().as_str() {
                    "off" => Trace::Off,
                    "stdout" => Trace::Stdout,
                    "tracing" => Trace::Tracing,
                    other => {
                        return Err(meta.error(format!(
                            "Unknown trace mode {:?}. Expected one of: \"off\", \"stdout\", \"tracing\"",
                            other
                        )))
                    }
                };
                return Ok(());
            }

            Err(meta.error("Unknown parameter. Supported: format=\"..\", trace=\"..\""))
        });

        if let Err(e) = parser.parse2(proc_macro2::TokenStream::from(attr)) {
            return e.to_compile_error().into();
        }
    }

    let format_token = format.to_tokens();
    let trace_token = trace.to_tokens();
    let fn_name = &sig.ident;

    let body = quote! {
        let _linkhook = {
            let caller_name: &'static str =
                concat!(module_path!(), "::", stringify!(#fn_name));

            linkhook::LedgerGuardBuilder::new(caller_name)
                .format(#format_token)
                .trace(#trace_token)
                .build()
        };
        #block
    };

    let wrapped_body = if sig.asyncness.is_some() {
        quote! { async { #body }.await }
    } else {
        body
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #wrapped_body
        }
    };

    output.into()
}
