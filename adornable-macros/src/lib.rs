// adornable-macros/src/lib.rs
extern crate proc_macro;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote, quote_spanned};
use syn::{
    Attribute, Error, Expr, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, ReturnType,
    Token, Type, Visibility, ext::IdentExt, parse::Parse, punctuated::Punctuated,
    spanned::Spanned,
};

// One `#[decorate(...)]` attribute: a decorator name followed by settings
struct DecorateArgs {
    name: String,
    from: Option<Expr>,
    defer_validation: Option<Expr>,
    options: Vec<(String, Expr)>,
}

impl Parse for DecorateArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if input.is_empty() {
            return Err(create_error(
                input.span(),
                "No decorator name provided",
                Some("Expected `#[decorate(name, ...)]`"),
            ));
        }

        let name = if input.peek(LitStr) {
            let name: LitStr = input.parse()?;
            name.value()
        } else {
            input.call(Ident::parse_any)?.to_string()
        };

        let mut args = DecorateArgs {
            name,
            from: None,
            defer_validation: None,
            options: Vec::new(),
        };

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }

            let key = input.call(Ident::parse_any)?;
            let value = if input.peek(Token![=]) {
                input.parse::<Token![=]>()?;
                Some(input.parse::<Expr>()?)
            } else {
                None
            };

            match (key.to_string().as_str(), value) {
                ("from", Some(receiver)) => args.from = Some(receiver),
                ("defer_validation", Some(defer)) => args.defer_validation = Some(defer),
                ("defer_validation", None) => {
                    args.defer_validation = Some(syn::parse_quote!(true));
                }
                (key_name, Some(option)) => args.options.push((key_name.to_string(), option)),
                (key_name, None) => {
                    return Err(create_error(
                        key.span(),
                        &format!("Decorator option `{key_name}` needs a value"),
                        Some("Write options as `name = value`"),
                    ));
                }
            }
        }

        Ok(args)
    }
}

// Arguments of `#[adornable(...)]`
struct AdornableArgs {
    type_name: Option<LitStr>,
    receivers: Vec<Expr>,
}

struct AdornableArg {
    key: Ident,
    value: Expr,
}

impl Parse for AdornableArg {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let key = input.call(Ident::parse_any)?;
        input.parse::<Token![=]>()?;
        let value = input.parse()?;
        Ok(AdornableArg { key, value })
    }
}

impl Parse for AdornableArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut args = AdornableArgs {
            type_name: None,
            receivers: Vec::new(),
        };
        for arg in Punctuated::<AdornableArg, Token![,]>::parse_terminated(input)? {
            match arg.key.to_string().as_str() {
                "name" => match arg.value {
                    Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(name),
                        ..
                    }) => args.type_name = Some(name),
                    other => {
                        return Err(create_error(
                            other.span(),
                            "Expected a string literal",
                            Some("Write the type name as `name = \"MyType\"`"),
                        ));
                    }
                },
                "decorators_from" => args.receivers.push(arg.value),
                unknown => {
                    return Err(create_error(
                        arg.key.span(),
                        &format!("Unknown `adornable` argument `{unknown}`"),
                        Some("Expected `name = \"...\"` or `decorators_from = <receiver>`"),
                    ));
                }
            }
        }
        Ok(args)
    }
}

// Helper function to create decorated error messages
fn create_error(span: Span, message: &str, help: Option<&str>) -> Error {
    let mut err = Error::new(span, message);
    if let Some(help_msg) = help {
        err.combine(Error::new(span, help_msg));
    }
    err
}

fn is_decorate(attr: &Attribute) -> bool {
    attr.path().is_ident("decorate")
}

fn type_name_of(self_ty: &Type) -> syn::Result<String> {
    match self_ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .ok_or_else(|| Error::new(self_ty.span(), "Expected a type name")),
        _ => Err(create_error(
            self_ty.span(),
            "Cannot infer a type name for this impl",
            Some("Supply one with `#[adornable(name = \"MyType\")]`"),
        )),
    }
}

fn validate_method(method: &ImplItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if sig.constness.is_some() {
        return Err(create_error(
            sig.constness.span(),
            "Cannot decorate const functions",
            Some("The decorate attribute cannot be used with const functions"),
        ));
    }
    if sig.asyncness.is_some() {
        return Err(create_error(
            sig.asyncness.span(),
            "Cannot decorate async functions",
            Some("Decorator chains run synchronously"),
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(create_error(
            sig.ident.span(),
            "Cannot decorate generic methods",
            Some("Arguments travel through the chain as values, so every parameter type must be concrete"),
        ));
    }
    if let Some(receiver) = sig.receiver()
        && (receiver.reference.is_none() || receiver.mutability.is_some())
    {
        return Err(create_error(
            receiver.self_token.span,
            "Decorated methods must take `&self` or no receiver",
            Some("Use interior mutability for state changed by a decorated method"),
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(Error::new(variadic.span(), "Cannot decorate variadic functions"));
    }
    Ok(())
}

// Everything generated for one decorated method
struct Expansion {
    original: ImplItemFn,
    wrapper: proc_macro2::TokenStream,
    definition: proc_macro2::TokenStream,
}

fn expand_method(self_ty: &Type, method: ImplItemFn) -> syn::Result<Expansion> {
    validate_method(&method)?;

    let mut declarations = Vec::new();
    for attr in method.attrs.iter().filter(|attr| is_decorate(attr)) {
        let args: DecorateArgs = attr.parse_args()?;
        let name = &args.name;
        let from = args.from.iter().map(|receiver| quote!(.from(#receiver)));
        let defer = args.defer_validation.iter().map(|defer| quote!(.deferred(#defer)));
        let options = args
            .options
            .iter()
            .map(|(key, value)| quote!(.option(#key, #value)));
        declarations.push(quote! {
            __adornable_target.declare(
                ::adornable::Declaration::new(#name) #(#from)* #(#defer)* #(#options)*
            )?;
        });
    }

    let sig = &method.sig;
    let name = sig.ident.to_string();
    let original_ident = format_ident!("__adornable_original_{}", sig.ident);
    let span = sig.ident.span();
    let is_instance = sig.receiver().is_some();

    let params: Vec<_> = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(typed.ty.clone()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let param_idents: Vec<_> = (0..params.len())
        .map(|index| format_ident!("__adornable_arg{}", index))
        .collect();
    let indices = 0..params.len();
    let return_ty = match &sig.output {
        ReturnType::Default => quote!(()),
        ReturnType::Type(_, ty) => quote!(#ty),
    };

    // The original body stays callable under a hidden name
    let mut original = method.clone();
    original.sig.ident = original_ident.clone();
    original.vis = Visibility::Inherited;
    original
        .attrs
        .retain(|attr| !is_decorate(attr) && !attr.path().is_ident("doc"));
    original.attrs.push(syn::parse_quote!(#[doc(hidden)]));

    let vis = &method.vis;
    let attrs = method.attrs.iter().filter(|attr| !is_decorate(attr));
    let fn_token = &sig.fn_token;
    let ident = &sig.ident;
    let self_param = is_instance.then(|| quote!(&self,));
    let lookup = if is_instance {
        quote!(.instance(#name)?.call(self, __adornable_arguments)?)
    } else {
        quote!(.static_method(#name)?.call(__adornable_arguments)?)
    };

    let wrapper = quote! {
        #(#attrs)*
        #vis #fn_token #ident(#self_param #(#param_idents: #params),*) -> ::adornable::Result<#return_ty> {
            let __adornable_arguments = ::adornable::Arguments::from_positional(::std::vec![
                #(::adornable::to_value(&#param_idents)?),*
            ]);
            let __adornable_value = Self::__adornable_methods()? #lookup;
            ::adornable::from_value(__adornable_value)
        }
    };

    // Spanned to the method so the recorded definition site points at it
    let definition = if is_instance {
        quote_spanned! {span=>
            __adornable_table.install_instance(__adornable_target.define_instance_method(
                #name,
                |__adornable_self: &#self_ty, __adornable_arguments: &::adornable::Arguments| {
                    ::adornable::to_value(&__adornable_self.#original_ident(
                        #(__adornable_arguments.get(#indices)?),*
                    ))
                },
            ));
        }
    } else {
        quote_spanned! {span=>
            __adornable_table.install_static(__adornable_target.define_static_method(
                #name,
                |__adornable_arguments: &::adornable::Arguments| {
                    ::adornable::to_value(&<#self_ty>::#original_ident(
                        #(__adornable_arguments.get(#indices)?),*
                    ))
                },
            ));
        }
    };

    Ok(Expansion {
        original,
        wrapper,
        definition: quote! {
            #(#declarations)*
            #definition
        },
    })
}

fn expand(args: AdornableArgs, mut item: ItemImpl) -> syn::Result<proc_macro2::TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(create_error(
            item.impl_token.span,
            "Cannot adorn generic impl blocks",
            Some("Decorated methods are defined once per concrete type"),
        ));
    }
    if let Some((_, path, _)) = &item.trait_ {
        return Err(create_error(
            path.span(),
            "Cannot adorn trait impls",
            Some("Decorated methods return `adornable::Result`, which changes their signature"),
        ));
    }

    let self_ty = item.self_ty.clone();
    let type_name = match &args.type_name {
        Some(name) => name.value(),
        None => type_name_of(&self_ty)?,
    };
    let receivers = &args.receivers;

    let mut items = Vec::new();
    let mut definitions = Vec::new();
    for impl_item in std::mem::take(&mut item.items) {
        match impl_item {
            ImplItem::Fn(method) if method.attrs.iter().any(is_decorate) => {
                let expansion = expand_method(&self_ty, method)?;
                items.push(ImplItem::Fn(expansion.original));
                items.push(ImplItem::Verbatim(expansion.wrapper));
                definitions.push(expansion.definition);
            }
            other => items.push(other),
        }
    }

    if definitions.is_empty() {
        return Err(create_error(
            item.impl_token.span,
            "No decorated methods in this impl",
            Some("Mark methods with `#[decorate(name)]`"),
        ));
    }

    items.push(ImplItem::Verbatim(quote! {
        #[doc(hidden)]
        fn __adornable_methods() -> ::adornable::Result<&'static ::adornable::MethodTable<#self_ty>> {
            static METHODS: ::std::sync::OnceLock<::adornable::Result<::adornable::MethodTable<#self_ty>>> =
                ::std::sync::OnceLock::new();
            METHODS
                .get_or_init(|| {
                    let mut __adornable_target = ::adornable::Target::new(#type_name);
                    #(__adornable_target.register_receiver(#receivers);)*
                    let mut __adornable_table = ::adornable::MethodTable::new();
                    #(#definitions)*
                    ::std::result::Result::Ok(__adornable_table)
                })
                .as_ref()
                .map_err(::std::clone::Clone::clone)
        }
    }));
    item.items = items;

    Ok(quote!(#item))
}

/// Defines the decorated methods of an `impl` block.
///
/// Each `#[decorate(...)]` attribute on a method declares one decorator, in
/// attribute order; the first declared decorator is the outermost. The
/// method's original body is kept under a hidden name and the public method
/// runs the bound chain around it.
///
/// # Arguments
///
/// * `name = "Type"` - Type name used in formal method names (defaults to
///   the last segment of the impl's type)
/// * `decorators_from = <receiver>` - Registers a `ReceiverRef` to search for
///   decorator names; repeatable, later registrations win
///
/// `#[decorate(...)]` accepts:
///
/// * the decorator name, as an identifier or string literal
/// * `from = <receiver>` - Resolve on this receiver instead of the registry
/// * `defer_validation` - Validate on first call instead of at definition
/// * `key = value` - Any other pair is a decorator option
///
/// # Requirements
///
/// Decorated methods take `&self` or no receiver and are neither `const`,
/// `async`, nor generic. A type with decorated instance methods implements
/// `adornable::Identified`, which keys per-value state such as memoized
/// results. Parameters and the return type must implement
/// `Serialize` and `DeserializeOwned`. A decorated method returning `R`
/// becomes a method returning `adornable::Result<R>`. One adorned impl block
/// per type.
///
/// # Examples
///
/// ```rust,ignore
/// use adornable::adornable;
///
/// struct Calculator;
///
/// impl adornable::Identified for Calculator {
///     fn instance_id(&self) -> u64 {
///         0
///     }
/// }
///
/// #[adornable]
/// impl Calculator {
///     #[decorate(log)]
///     #[decorate(memoize, for_arguments = true)]
///     pub fn square(&self, x: u64) -> u64 {
///         x * x
///     }
///
///     #[decorate(log)]
///     pub fn version() -> String {
///         "1.0".to_string()
///     }
/// }
///
/// assert_eq!(Calculator.square(4)?, 16);
/// // stdout: Calling method `Calculator#square` with arguments `[4]`
/// ```
///
/// Custom decorators:
///
/// ```rust,ignore
/// use adornable::{adornable, DecoratorSet, ReceiverRef};
/// use serde_json::json;
///
/// fn exclaim() -> ReceiverRef {
///     DecoratorSet::class("Exclaim")
///         .with("exclaim", |_, next, _| {
///             let value = next.proceed()?;
///             Ok(json!(format!("{}!", value.as_str().unwrap_or_default())))
///         })
///         .into_ref()
/// }
///
/// struct Greeter;
///
/// #[adornable(decorators_from = exclaim())]
/// impl Greeter {
///     #[decorate(exclaim)]
///     fn greet(name: String) -> String {
///         format!("hello {name}")
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn adornable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match syn::parse::<AdornableArgs>(attr) {
        Ok(args) => args,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let item_impl = match syn::parse::<ItemImpl>(item) {
        Ok(item_impl) => item_impl,
        Err(e) => {
            return TokenStream::from(
                create_error(
                    e.span(),
                    "The adornable attribute must be placed on an impl block",
                    Some("Put `#[decorate(...)]` on methods inside an `#[adornable]` impl"),
                )
                .to_compile_error(),
            );
        }
    };

    match expand(args, item_impl) {
        Ok(output) => output.into(),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

/// Marks a method inside an `#[adornable]` impl block.
///
/// The `adornable` attribute consumes these markers; one that reaches this
/// macro was written outside such a block.
#[proc_macro_attribute]
pub fn decorate(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = proc_macro2::TokenStream::from(item);
    let span = item
        .clone()
        .into_iter()
        .next()
        .map_or_else(Span::call_site, |token| token.span());
    let error = create_error(
        span,
        "`#[decorate]` only works inside an `#[adornable]` impl block",
        Some("Add `#[adornable]` to the surrounding impl"),
    )
    .to_compile_error();
    quote!(#error #item).into()
}
