use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[command] 宏实现
/// - 支持结构体（具名、tuple 或 unit）与枚举，原样输出目标类型
/// - 追加 `impl ::cmdbus::command::Command`，泛型参数与 where 子句一并带上
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as CommandAttrConfig);
    let input = parse_macro_input!(item as Item);

    let (ident, generics) = match &input {
        Item::Struct(st) => (&st.ident, &st.generics),
        Item::Enum(en) => (&en.ident, &en.generics),
        other => {
            return syn::Error::new(other.span(), "#[command] only supports struct or enum")
                .to_compile_error()
                .into();
        }
    };

    let name = cfg
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let output = cfg.output.unwrap_or_else(|| syn::parse_quote! { () });
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let expanded: proc_macro2::TokenStream = quote! {
        #input

        impl #impl_generics ::cmdbus::command::Command for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            type Output = #output;
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

// 键值参数：name = "<str>"、output = <Type>
struct CommandAttrConfig {
    name: Option<LitStr>,
    output: Option<Type>,
}

impl Parse for CommandAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut name: Option<LitStr> = None;
        let mut output: Option<Type> = None;

        if input.is_empty() {
            return Ok(Self { name, output });
        }

        let pairs: Punctuated<CommandAttrElem, Token![,]> = Punctuated::parse_terminated(input)?;

        for elem in pairs {
            match elem {
                CommandAttrElem::Name(key, lit) => {
                    if name.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    if lit.value().trim().is_empty() {
                        return Err(syn::Error::new(lit.span(), "command name must not be empty"));
                    }
                    name = Some(lit);
                }
                CommandAttrElem::Output(key, ty) => {
                    if output.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'output' in attribute",
                        ));
                    }
                    output = Some(ty);
                }
            }
        }

        Ok(Self { name, output })
    }
}

enum CommandAttrElem {
    Name(syn::Ident, LitStr),
    Output(syn::Ident, Type),
}

impl Parse for CommandAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        if key == "name" {
            let lit: LitStr = input
                .parse()
                .map_err(|e| syn::Error::new(e.span(), "expected string literal for 'name'"))?;
            Ok(Self::Name(key, lit))
        } else if key == "output" {
            let ty: Type = input.parse()?;
            Ok(Self::Output(key, ty))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'name' | 'output'",
            ))
        }
    }
}
