use crate::rename::apply_rename_rule;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{DataStruct, DeriveInput, Fields, LitStr, Path, Result, Token, Type};

struct ModelField {
    name: String,
    required: bool,
}

struct ModelIndex {
    unique: bool,
    fields: Vec<String>,
}

pub(crate) fn generate_model_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = match &data.fields {
        Fields::Named(named) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                "Model can only be derived for structs with named fields",
            ))
        }
    };

    let mut type_name = name.unraw().to_string();
    let mut collection: Option<String> = None;
    let mut database: Option<String> = None;
    let mut client: Option<String> = None;
    let mut inherits: Vec<Path> = Vec::new();
    let mut config: Vec<(String, String)> = Vec::new();
    let mut indexes: Vec<ModelIndex> = Vec::new();
    let mut rename_all: Option<String> = None;
    let mut container_default = false;

    for attr in &ast.attrs {
        if attr.path().is_ident("model") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    type_name = string_value(&meta)?;
                    Ok(())
                } else if meta.path.is_ident("collection") {
                    collection = Some(string_value(&meta)?);
                    Ok(())
                } else if meta.path.is_ident("database") {
                    database = Some(string_value(&meta)?);
                    Ok(())
                } else if meta.path.is_ident("client") {
                    client = Some(string_value(&meta)?);
                    Ok(())
                } else if meta.path.is_ident("inherit") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    inherits.push(s.parse()?);
                    Ok(())
                } else if meta.path.is_ident("config") {
                    meta.parse_nested_meta(|meta| {
                        let key = match meta.path.get_ident() {
                            Some(ident) => ident.unraw().to_string(),
                            None => return Err(meta.error("Config keys must be plain identifiers")),
                        };
                        config.push((key, string_value(&meta)?));
                        Ok(())
                    })
                } else if meta.path.is_ident("index") {
                    let mut unique: Option<bool> = None;
                    let mut index_fields: Option<Vec<String>> = None;

                    meta.parse_nested_meta(|meta| {
                        if meta.path.is_ident("type") {
                            let index_type = string_value(&meta)?;
                            match index_type.to_ascii_lowercase().replace('_', "-").as_str() {
                                "unique" => unique = Some(true),
                                "non-unique" => unique = Some(false),
                                _ => return Err(meta.error("Index type must be \"unique\" or \"non-unique\"")),
                            }
                            Ok(())
                        } else if meta.path.is_ident("fields") {
                            let field_list = string_value(&meta)?;
                            index_fields = Some(
                                field_list
                                    .split(',')
                                    .map(|field| field.trim().to_string())
                                    .filter(|field| !field.is_empty())
                                    .collect(),
                            );
                            Ok(())
                        } else {
                            Err(meta.error("Unknown index attribute"))
                        }
                    })
                    .and_then(|_| match (unique, index_fields) {
                        (Some(unique), Some(fields)) if !fields.is_empty() => {
                            indexes.push(ModelIndex { unique, fields });
                            Ok(())
                        }
                        _ => Err(meta.error("Index type and fields are required")),
                    })
                } else {
                    Err(meta.error("Unknown model attribute"))
                }
            })?
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    if meta.input.peek(Token![=]) {
                        rename_all = Some(string_value(&meta)?);
                    } else {
                        rename_all = symmetric_names(&meta)?;
                    }
                    Ok(())
                } else if meta.path.is_ident("default") {
                    container_default = true;
                    skip_value(&meta)
                } else {
                    skip_value(&meta)
                }
            })?
        }
    }

    let mut model_fields = Vec::with_capacity(fields.len());
    for field in fields {
        let ident = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };

        let mut key: Option<String> = None;
        let mut skipped = false;
        let mut flattened = false;
        let mut may_be_absent = container_default;
        let mut required_override: Option<bool> = None;

        for attr in &field.attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if meta.input.peek(Token![=]) {
                            key = Some(string_value(&meta)?);
                        } else {
                            key = symmetric_names(&meta)?;
                        }
                        Ok(())
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                        skipped = true;
                        Ok(())
                    } else if meta.path.is_ident("flatten") {
                        flattened = true;
                        Ok(())
                    } else if meta.path.is_ident("default")
                        || meta.path.is_ident("skip_serializing_if")
                    {
                        may_be_absent = true;
                        skip_value(&meta)
                    } else {
                        skip_value(&meta)
                    }
                })?;
            } else if attr.path().is_ident("model") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("required") {
                        required_override = Some(true);
                        Ok(())
                    } else if meta.path.is_ident("optional") {
                        required_override = Some(false);
                        Ok(())
                    } else {
                        Err(meta.error("Unknown model field attribute"))
                    }
                })?;
            }
        }

        if flattened {
            return Err(syn::Error::new_spanned(
                field,
                "Flattened fields are not supported by Model",
            ));
        }
        if skipped {
            continue;
        }

        let field_name = match key {
            Some(key) => key,
            None => {
                let ident_name = ident.unraw().to_string();
                match &rename_all {
                    Some(rule) => match apply_rename_rule(rule, &ident_name) {
                        Some(renamed) => renamed,
                        None => {
                            return Err(syn::Error::new_spanned(
                                ast,
                                format!("Unknown serde rename_all rule \"{}\"", rule),
                            ))
                        }
                    },
                    None => ident_name,
                }
            }
        };

        if field_name == "_id" && !is_object_id(&field.ty) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "The _id field of a Model must be a bson ObjectId",
            ));
        }

        let required =
            required_override.unwrap_or_else(|| !is_option(&field.ty) && !may_be_absent);
        model_fields.push(ModelField {
            name: field_name,
            required,
        });
    }

    let mut declared = HashSet::new();
    for field in &model_fields {
        if !declared.insert(field.name.as_str()) {
            return Err(syn::Error::new_spanned(
                ast,
                format!("Field {} is declared more than once", field.name),
            ));
        }
    }
    for index in &indexes {
        for path in &index.fields {
            let root = path.split('.').next().unwrap_or(path);
            if root != "_id" && !declared.contains(root) {
                return Err(syn::Error::new_spanned(
                    ast,
                    format!("Index field {} not found in struct", path),
                ));
            }
        }
    }

    let fields_code = model_fields.iter().map(|field| {
        let field_name = &field.name;
        if field.required {
            quote! { .field(docflex::model::FieldSpec::required(#field_name)) }
        } else {
            quote! { .field(docflex::model::FieldSpec::optional(#field_name)) }
        }
    });

    let collection_code = match &collection {
        Some(collection) => quote! { .collection(#collection) },
        None => quote! {},
    };

    let database_code = match &database {
        Some(database) => quote! { .database(#database) },
        None => quote! {},
    };

    let config_code = if client.is_none() && config.is_empty() {
        quote! {}
    } else {
        let client_code = match &client {
            Some(client) => quote! { .client_name(#client) },
            None => quote! {},
        };
        let entries_code = config.iter().map(|(key, value)| quote! { .set(#key, #value) });
        quote! {
            .config(docflex::model::ModelConfig::new() #client_code #(#entries_code)*)
        }
    };

    let inherit_code = inherits.iter().map(|path| quote! { .inherit(#path()) });

    let indexes_code = indexes.iter().map(|index| {
        let unique = index.unique;
        let index_fields = index.fields.iter().map(|field| quote!(#field));
        quote! {
            .index(docflex::model::IndexSpec::new(vec![#(#index_fields),*], #unique))
        }
    });

    let gen = quote! {
        impl #impl_generics docflex::model::Model for #name #ty_generics #where_clause {
            fn declaration() -> docflex::model::ModelDeclaration {
                docflex::model::ModelDeclaration::new(#type_name)
                    #(#fields_code)*
                    #collection_code
                    #database_code
                    #(#inherit_code)*
                    #config_code
                    #(#indexes_code)*
            }
        }
    };

    Ok(gen)
}

fn string_value(meta: &ParseNestedMeta) -> Result<String> {
    let value = meta.value()?;
    let s: LitStr = value.parse()?;
    Ok(s.value())
}

// `rename(serialize = "..", deserialize = "..")`, both names must agree
fn symmetric_names(meta: &ParseNestedMeta) -> Result<Option<String>> {
    let mut serialize: Option<String> = None;
    let mut deserialize: Option<String> = None;
    meta.parse_nested_meta(|meta| {
        if meta.path.is_ident("serialize") {
            serialize = Some(string_value(&meta)?);
            Ok(())
        } else if meta.path.is_ident("deserialize") {
            deserialize = Some(string_value(&meta)?);
            Ok(())
        } else {
            skip_value(&meta)
        }
    })?;

    if serialize != deserialize {
        return Err(meta.error("Model requires the same serialize and deserialize name"));
    }
    Ok(serialize)
}

// consumes the value of a serde attribute this derive does not care about
fn skip_value(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        let value = meta.value()?;
        value.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

fn is_object_id(ty: &Type) -> bool {
    match last_segment(ty) {
        Some(segment) if segment.ident == "ObjectId" => true,
        Some(segment) if segment.ident == "Option" => match &segment.arguments {
            syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| {
                matches!(arg, syn::GenericArgument::Type(inner) if is_object_id(inner))
            }),
            _ => false,
        },
        _ => false,
    }
}

fn is_option(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "Option")
}
