use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, GenericArgument, Ident,
    PathArguments, PathSegment, Type, Variant,
};

pub fn expand(input: &DeriveInput) -> TokenStream {
    match ErrorEnum::parse(input) {
        Ok(model) => model.expand(),
        Err(err) => err.to_compile_error(),
    }
}

struct ErrorEnum<'a> {
    input: &'a DeriveInput,
    ext: Ident,
    variants: Vec<ErrorVariant<'a>>,
}

struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg: Vec<&'a Attribute>,
}

impl<'a> ErrorEnum<'a> {
    fn parse(input: &'a DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "herald_error can only be applied to enums",
            ));
        };

        let variants =
            data.variants.iter().map(ErrorVariant::parse).collect::<syn::Result<Vec<_>>>()?;

        Ok(Self { input, ext: format_ident!("{}Ext", input.ident), variants })
    }

    fn expand(&self) -> TokenStream {
        let input = self.input;
        let derives = self.missing_derives();
        let context_trait = self.context_trait();
        let conversions = self.variants.iter().filter_map(|v| self.source_conversion(v));
        let internal = self.internal_conversions();
        let variant_names = self.variant_names();

        quote! {
            #[allow(non_shorthand_field_patterns)]
            #derives
            #input

            #context_trait
            #(#conversions)*
            #internal
            #variant_names

            #[allow(dead_code)]
            fn format_context(
                context: &Option<std::borrow::Cow<'static, str>>,
            ) -> std::borrow::Cow<'static, str> {
                context
                    .as_ref()
                    .map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
            }
        }
    }

    /// `Debug` and `thiserror::Error`, unless the enum already derives them.
    fn missing_derives(&self) -> TokenStream {
        let present = derived_traits(&self.input.attrs);
        let mut missing = Vec::new();
        if !present.contains("Debug") {
            missing.push(quote! { Debug });
        }
        if !present.contains("Error") {
            missing.push(quote! { ::thiserror::Error });
        }
        if missing.is_empty() {
            return quote! {};
        }
        quote! { #[derive(#(#missing),*)] }
    }

    fn context_trait(&self) -> TokenStream {
        let name = &self.input.ident;
        let ext = &self.ext;
        let arms = self.variants.iter().filter(|v| v.has_context).map(|v| {
            let ident = v.ident;
            let cfg = &v.cfg;
            quote! { #(#cfg)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
        });

        quote! {
            pub trait #ext<T> {
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
            }

            #[automatically_derived]
            impl<T> #ext<T> for Result<T, #name> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                    self.map_err(|mut err| {
                        match &mut err {
                            #(#arms)*
                            _ => {}
                        }
                        err
                    })
                }
            }
        }
    }

    fn source_conversion(&self, variant: &ErrorVariant<'_>) -> Option<TokenStream> {
        if variant.ident == "Internal" {
            return None;
        }
        let (field, ty) = variant.source?;
        let name = &self.input.ident;
        let ext = &self.ext;
        let ident = variant.ident;
        let cfg = &variant.cfg;

        Some(quote! {
            #(#cfg)*
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
            }

            #(#cfg)*
            impl<T> #ext<T> for std::result::Result<T, #ty> {
                #[inline]
                fn context(
                    self,
                    context: impl Into<std::borrow::Cow<'static, str>>,
                ) -> std::result::Result<T, #name> {
                    self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                }
            }
        })
    }

    fn internal_conversions(&self) -> TokenStream {
        let Some(internal) = self.variants.iter().find(|v| v.ident == "Internal") else {
            return quote! {};
        };
        let name = &self.input.ident;
        let cfg = &internal.cfg;

        quote! {
            #(#cfg)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(message: &'static str) -> Self {
                    Self::Internal { message: std::borrow::Cow::Borrowed(message), context: None }
                }
            }

            #(#cfg)*
            impl From<String> for #name {
                #[inline]
                fn from(message: String) -> Self {
                    Self::Internal { message: std::borrow::Cow::Owned(message), context: None }
                }
            }
        }
    }

    fn variant_names(&self) -> TokenStream {
        let name = &self.input.ident;
        let arms = self.variants.iter().map(|v| {
            let ident = v.ident;
            let label = ident.to_string();
            let cfg = &v.cfg;
            quote! { #(#cfg)* Self::#ident { .. } => #label, }
        });

        quote! {
            #[automatically_derived]
            impl #name {
                /// Name of the variant, stable across releases and safe to use as a log field.
                #[must_use]
                pub const fn variant_name(&self) -> &'static str {
                    match self {
                        #(#arms)*
                    }
                }
            }
        }
    }
}

impl<'a> ErrorVariant<'a> {
    fn parse(variant: &'a Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "herald_error variants must use named fields",
            ));
        };

        let has_context = context_field(fields)?.is_some();
        let source = fields
            .named
            .iter()
            .find(|field| is_source(field))
            .and_then(|field| field.ident.as_ref().map(|ident| (ident, &field.ty)));

        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants with a source need a `context: Option<Cow<'static, str>>` field",
            ));
        }

        let cfg = variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).collect();

        Ok(Self { ident: &variant.ident, source, has_context, cfg })
    }
}

fn context_field(fields: &FieldsNamed) -> syn::Result<Option<&Field>> {
    let Some(field) =
        fields.named.iter().find(|field| field.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };
    if !is_context_type(&field.ty) {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "context field must be Option<Cow<'static, str>>",
        ));
    }
    Ok(Some(field))
}

fn is_source(field: &Field) -> bool {
    field.ident.as_ref().is_some_and(|ident| ident == "source")
        || field.attrs.iter().any(|attr| attr.path().is_ident("source") || attr.path().is_ident("from"))
}

fn derived_traits(attrs: &[Attribute]) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                traits.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }
    traits
}

fn last_segment<'t>(ty: &'t Type, expected: &str) -> Option<&'t PathSegment> {
    let Type::Path(path) = ty else {
        return None;
    };
    path.path.segments.last().filter(|segment| segment.ident == expected)
}

fn is_context_type(ty: &Type) -> bool {
    let Some(option) = last_segment(ty, "Option") else {
        return false;
    };
    let PathArguments::AngleBracketed(option_args) = &option.arguments else {
        return false;
    };
    let Some(GenericArgument::Type(inner)) = option_args.args.first() else {
        return false;
    };
    let Some(cow) = last_segment(inner, "Cow") else {
        return false;
    };
    let PathArguments::AngleBracketed(cow_args) = &cow.arguments else {
        return false;
    };

    let mut args = cow_args.args.iter();
    matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static")
        && matches!(args.next(), Some(GenericArgument::Type(t)) if last_segment(t, "str").is_some())
}
