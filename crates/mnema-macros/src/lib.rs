// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides the `Streamable` derive for mnema.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error, Fields, LitStr, Result};

/// Derives `mnema_core::TypeTagged` and `mnema_core::Streamable` for a struct
/// with named fields.
///
/// Fields are streamed in declaration order through `mnema_core::StreamField`,
/// and the same order is published as the type's declared schema.
///
/// Container attributes:
/// - `#[stream(tag = "...")]` sets the persistent type tag (defaults to the type name).
/// - `#[stream(register)]` submits the type to the static registry.
///
/// Field attributes:
/// - `#[stream(skip)]` leaves the field out of the stream; it keeps its default on load.
/// - `#[stream(pod)]` streams a single `bytemuck::Pod` value.
/// - `#[stream(pod_buffer)]` streams a `Vec<T: Pod>` as one blob.
#[proc_macro_derive(Streamable, attributes(stream))]
pub fn derive_streamable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

struct ContainerAttrs {
    tag: Option<LitStr>,
    register: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldMode {
    Default,
    Skip,
    Pod,
    PodBuffer,
}

fn container_attrs(input: &DeriveInput) -> Result<ContainerAttrs> {
    let mut attrs = ContainerAttrs {
        tag: None,
        register: false,
    };
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("stream")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                attrs.tag = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("register") {
                attrs.register = true;
                Ok(())
            } else {
                Err(meta.error("expected `tag = \"...\"` or `register`"))
            }
        })?;
    }
    Ok(attrs)
}

fn field_mode(field: &syn::Field) -> Result<FieldMode> {
    let mut mode = FieldMode::Default;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("stream")) {
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("skip") {
                FieldMode::Skip
            } else if meta.path.is_ident("pod") {
                FieldMode::Pod
            } else if meta.path.is_ident("pod_buffer") {
                FieldMode::PodBuffer
            } else {
                return Err(meta.error("expected `skip`, `pod` or `pod_buffer`"));
            };
            if mode != FieldMode::Default && mode != next {
                return Err(meta.error("conflicting field modes"));
            }
            mode = next;
            Ok(())
        })?;
    }
    Ok(mode)
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "`Streamable` cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new_spanned(
                    name,
                    "`Streamable` can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                name,
                "`Streamable` can only be derived for structs",
            ))
        }
    };

    let attrs = container_attrs(input)?;
    let tag = attrs
        .tag
        .unwrap_or_else(|| LitStr::new(&name.to_string(), name.span()));

    let mut saves = Vec::new();
    let mut loads = Vec::new();
    let mut kinds = Vec::new();
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
        let ty = &field.ty;
        match field_mode(field)? {
            FieldMode::Skip => {}
            FieldMode::Default => {
                saves.push(quote! {
                    ::mnema_core::StreamField::write_field(&self.#ident, writer)?;
                });
                loads.push(quote! {
                    self.#ident = <#ty as ::mnema_core::StreamField>::read_field(reader)?;
                });
                kinds.push(quote! { <#ty as ::mnema_core::StreamField>::KIND });
            }
            FieldMode::Pod => {
                saves.push(quote! {
                    ::mnema_core::field::pod::write(&self.#ident, writer)?;
                });
                loads.push(quote! {
                    self.#ident = ::mnema_core::field::pod::read::<#ty>(reader)?;
                });
                kinds.push(quote! { ::mnema_core::field::pod::kind::<#ty>() });
            }
            FieldMode::PodBuffer => {
                saves.push(quote! {
                    ::mnema_core::field::pod_buffer::write(&self.#ident, writer)?;
                });
                loads.push(quote! {
                    self.#ident = ::mnema_core::field::pod_buffer::read(reader)?;
                });
                kinds.push(quote! { ::mnema_core::field::pod_buffer::KIND });
            }
        }
    }

    let registration = attrs.register.then(|| {
        quote! {
            ::mnema_core::inventory::submit! {
                ::mnema_core::TypeRegistration::of::<#name>()
            }
        }
    });

    Ok(quote! {
        impl ::mnema_core::TypeTagged for #name {
            const TYPE_TAG: &'static str = #tag;
        }

        impl ::mnema_core::Streamable for #name {
            fn type_tag(&self) -> &'static str {
                <Self as ::mnema_core::TypeTagged>::TYPE_TAG
            }

            #[allow(unused_variables)]
            fn save(
                &self,
                writer: &mut ::mnema_core::GraphWriter<'_>,
            ) -> ::core::result::Result<(), ::mnema_core::SaveError> {
                #(#saves)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn load(
                &mut self,
                reader: &mut ::mnema_core::GraphReader<'_>,
            ) -> ::core::result::Result<(), ::mnema_core::LoadError> {
                #(#loads)*
                Ok(())
            }

            fn schema(&self) -> ::core::option::Option<&'static [::mnema_core::FieldKind]> {
                const SCHEMA: &[::mnema_core::FieldKind] = &[#(#kinds),*];
                ::core::option::Option::Some(SCHEMA)
            }
        }

        #registration
    })
}
