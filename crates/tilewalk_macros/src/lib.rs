use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, LitInt, Pat, Type};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The generated guard logs through Bevy's `info!` when the call takes longer
/// than the threshold (milliseconds, default 1). Functions that take a
/// `tick: Res<FrameTick>` parameter additionally log on every 100th frame.
/// Without `perf_stats` the attribute leaves the function untouched.
///
/// ```ignore
/// #[profile(2)]
/// pub fn find_path(&mut self, /* ... */) -> Route { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        let literal = parse_macro_input!(attr as LitInt);
        match literal.base10_parse() {
            Ok(ms) => ms,
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let frame = if takes_frame_tick(&input) {
        quote! { Some(tick.0) }
    } else {
        quote! { None }
    };

    let guard = quote! {
        struct ProfileGuard {
            start: std::time::Instant,
            frame: Option<u64>,
        }
        impl Drop for ProfileGuard {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed();
                let sampled = self.frame.is_some_and(|frame| frame % 100 == 0);
                if elapsed.as_millis() > #threshold_ms || sampled {
                    match self.frame {
                        Some(frame) => bevy::prelude::info!("[PERF] {} (frame {}): {:?}", #fn_name_str, frame, elapsed),
                        None => bevy::prelude::info!("[PERF] {}: {:?}", #fn_name_str, elapsed),
                    }
                }
            }
        }
        ProfileGuard {
            start: std::time::Instant::now(),
            frame: #frame,
        }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_guard = {
                #guard
            };

            #block
        }
    };

    output.into()
}

/// True when the function has a parameter named `tick` whose type mentions `FrameTick`.
fn takes_frame_tick(func: &ItemFn) -> bool {
    func.sig.inputs.iter().any(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return false;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return false;
        };
        pat_ident.ident == "tick" && mentions_frame_tick(&pat_type.ty)
    })
}

fn mentions_frame_tick(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path.path.segments.iter().any(|segment| {
            if segment.ident == "FrameTick" {
                return true;
            }
            match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| {
                    matches!(arg, syn::GenericArgument::Type(inner) if mentions_frame_tick(inner))
                }),
                _ => false,
            }
        }),
        Type::Reference(reference) => mentions_frame_tick(&reference.elem),
        _ => false,
    }
}
