//! Proc-macros for the nbconv configuration.
//!
//! `#[derive(Configurable)]` generates `apply_override` for `KEY=VALUE`
//! overrides and `merge_fields` for layering config files.

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Type, parse_macro_input};

/// Attribute configuration for a field.
#[derive(Default)]
struct FieldConfig {
  /// The config key name (defaults to field name).
  key: Option<String>,

  /// Deprecation info: (version, replacement).
  deprecated: Option<(String, Option<String>)>,

  /// An empty value clears an optional field.
  allow_empty: bool,

  /// Replacement seen before `deprecated`.
  pending_replacement: Option<String>,
}

impl FieldConfig {
  fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
    let mut config = Self::default();

    for attr in attrs {
      if !attr.path().is_ident("config") {
        continue;
      }

      attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("key") {
          let lit: syn::LitStr = meta.value()?.parse()?;
          config.key = Some(lit.value());
        } else if meta.path.is_ident("deprecated") {
          let lit: syn::LitStr = meta.value()?.parse()?;
          config.deprecated =
            Some((lit.value(), config.pending_replacement.take()));
        } else if meta.path.is_ident("replacement") {
          let lit: syn::LitStr = meta.value()?.parse()?;
          match config.deprecated.as_mut() {
            Some((_, replacement)) => *replacement = Some(lit.value()),
            None => config.pending_replacement = Some(lit.value()),
          }
        } else if meta.path.is_ident("allow_empty") {
          config.allow_empty = true;
        } else {
          return Err(meta.error("unsupported config attribute"));
        }
        Ok(())
      })?;
    }

    Ok(config)
  }
}

/// Type of a field as written, without whitespace (`Option<Vec<String>>`).
fn type_string(ty: &Type) -> String {
  ty.to_token_stream()
    .to_string()
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect()
}

/// Derive macro for configuration structs.
#[proc_macro_derive(Configurable, attributes(config))]
pub fn derive_configurable(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  let name = &input.ident;
  let (impl_generics, ty_generics, where_clause) =
    input.generics.split_for_impl();

  let Data::Struct(data) = &input.data else {
    return syn::Error::new_spanned(
      &input,
      "Configurable can only be derived for structs",
    )
    .to_compile_error()
    .into();
  };

  let (field_handlers, merge_handlers) = match (
    generate_field_handlers(&data.fields),
    generate_merge_handlers(&data.fields),
  ) {
    (Ok(fields), Ok(merges)) => (fields, merges),
    (Err(e), _) | (_, Err(e)) => return e.to_compile_error().into(),
  };

  let expanded = quote! {
    impl #impl_generics #name #ty_generics #where_clause {
      /// Apply a configuration override by key.
      ///
      /// # Errors
      ///
      /// Returns an error for unknown keys and unparsable values.
      pub fn apply_override(
        &mut self,
        key: &str,
        value: &str,
      ) -> std::result::Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError;

        #(#field_handlers)*

        Err(ConfigError::Override(format!(
          "Unknown configuration key: '{key}'. Run `nbconv init` for the supported keys.",
        )))
      }

      /// Merge another config into this one.
      #[allow(deprecated)]
      pub fn merge_fields(&mut self, other: Self) {
        #(#merge_handlers)*
      }
    }
  };

  TokenStream::from(expanded)
}

fn generate_field_handlers(
  fields: &Fields,
) -> syn::Result<Vec<proc_macro2::TokenStream>> {
  let mut handlers = Vec::new();

  for field in fields {
    let has_config_attr = field
      .attrs
      .iter()
      .any(|attr| attr.path().is_ident("config"));
    if !has_config_attr {
      continue;
    }

    let field_config = FieldConfig::from_attrs(&field.attrs)?;
    let Some(field_name) = field.ident.as_ref() else {
      return Err(syn::Error::new_spanned(field, "Named field required"));
    };
    let field_key = field_config
      .key
      .clone()
      .unwrap_or_else(|| field_name.to_string());

    handlers.push(generate_field_handler(
      field_name,
      &field_key,
      &field.ty,
      &field_config,
    ));
  }

  Ok(handlers)
}

fn generate_field_handler(
  field_name: &syn::Ident,
  field_key: &str,
  field_type: &Type,
  config: &FieldConfig,
) -> proc_macro2::TokenStream {
  let deprecation_check =
    config.deprecated.as_ref().map_or_else(
      || quote! {},
      |(version, replacement)| {
        let msg = replacement.as_ref().map_or_else(
          || {
            format!(
              "The '{field_key}' config key is deprecated since {version}."
            )
          },
          |replacement| {
            format!(
              "The '{field_key}' config key is deprecated since {version}. \
               Use '{replacement}' instead."
            )
          },
        );
        quote! { log::warn!(#msg); }
      },
    );

  let value_assignment =
    generate_value_assignment(field_name, field_key, field_type, config);

  let assignment_expr = if config.deprecated.is_some() {
    quote! {
      #[allow(deprecated)]
      { #value_assignment }
    }
  } else {
    value_assignment
  };

  quote! {
    if key == #field_key {
      #deprecation_check
      #assignment_expr
      return Ok(());
    }
  }
}

fn generate_value_assignment(
  field_name: &syn::Ident,
  field_key: &str,
  field_type: &Type,
  config: &FieldConfig,
) -> proc_macro2::TokenStream {
  let type_str = type_string(field_type);

  let split_list = quote! {
    value
      .split(',')
      .map(str::trim)
      .filter(|item| !item.is_empty())
      .map(Into::into)
      .collect()
  };
  let parse_value = quote! {
    value.parse().map_err(|e| ConfigError::Override(format!(
      "Invalid value for '{}': '{}' - {}",
      #field_key, value, e
    )))?
  };

  if let Some(inner) = type_str
    .strip_prefix("Option<")
    .and_then(|rest| rest.strip_suffix('>'))
  {
    let parsed = if inner.starts_with("Vec<") {
      split_list
    } else {
      parse_value
    };
    if config.allow_empty {
      quote! {
        self.#field_name = if value.is_empty() {
          None
        } else {
          Some(#parsed)
        };
      }
    } else {
      quote! {
        self.#field_name = Some(#parsed);
      }
    }
  } else if type_str.starts_with("Vec<") {
    // Comma-separated; an override replaces the whole list
    quote! {
      self.#field_name = #split_list;
    }
  } else if type_str == "PathBuf" || type_str.ends_with("::PathBuf") {
    quote! {
      self.#field_name = std::path::PathBuf::from(value);
    }
  } else if type_str == "String" {
    quote! {
      self.#field_name = value.to_string();
    }
  } else if type_str == "bool" {
    quote! {
      self.#field_name = match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => true,
        "false" | "no" | "0" => false,
        _ => {
          return Err(ConfigError::Override(format!(
            "Invalid boolean value for '{}': '{}'. Expected true/false, yes/no, or 1/0",
            #field_key, value
          )));
        }
      };
    }
  } else {
    // Numbers and enums go through FromStr
    quote! {
      self.#field_name = #parse_value;
    }
  }
}

fn generate_merge_handlers(
  fields: &Fields,
) -> syn::Result<Vec<proc_macro2::TokenStream>> {
  let mut handlers = Vec::new();

  for field in fields {
    let Some(field_name) = field.ident.as_ref() else {
      return Err(syn::Error::new_spanned(field, "Named field required"));
    };
    let type_str = type_string(&field.ty);

    let handler = if type_str.starts_with("Option<") {
      // Replace only when the other config sets a value
      quote! {
        if other.#field_name.is_some() {
          self.#field_name = other.#field_name;
        }
      }
    } else if type_str.starts_with("Vec<") {
      quote! {
        self.#field_name.extend(other.#field_name);
      }
    } else {
      quote! {
        self.#field_name = other.#field_name;
      }
    };

    handlers.push(handler);
  }

  Ok(handlers)
}
