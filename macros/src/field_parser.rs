use proc_macro2::Ident;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::{Expr, Fields, GenericArgument, ItemStruct, LitStr, PathArguments, Type};

#[derive(Clone)]
pub struct FieldDef {
    pub name: Ident,
}

/// `#[kv_attr]` field; `value_type` is the `T` of its `Attr<T>`.
#[derive(Clone)]
pub struct AttrDef {
    pub field: FieldDef,
    pub value_type: Type,
    pub default: Option<Expr>,
}

#[derive(Default)]
pub struct StructAttrs {
    pub name: Option<LitStr>,
    pub pool: Option<LitStr>,
    pub namespace: Option<LitStr>,
}

pub struct FieldDefs {
    pub identity: FieldDef,
    pub attrs: Vec<AttrDef>,
}

enum ParsingResult {
    Identity(FieldDef),
    Attr(AttrDef),
    Plain,
}

pub fn get_named_fields(ast: &ItemStruct) -> Result<Punctuated<syn::Field, Comma>, syn::Error> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new(ast.generics.span(), "`#[derive(KvAttrs)]` does not support generic structs"));
    }
    match &ast.fields {
        Fields::Named(fields_named) => Ok(fields_named.named.clone()),
        _ => Err(syn::Error::new(ast.span(), "`#[derive(KvAttrs)]` only supports structs with named fields.")),
    }
}

pub fn get_struct_attrs(ast: &ItemStruct) -> Result<StructAttrs, syn::Error> {
    let mut result = StructAttrs::default();
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("kv_attrs")) {
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("pool") {
                result.pool = Some(nested.value()?.parse()?);
            } else if nested.path.is_ident("name") {
                result.name = Some(nested.value()?.parse()?);
            } else if nested.path.is_ident("namespace") {
                result.namespace = Some(nested.value()?.parse()?);
            } else {
                return Err(nested.error("expected `pool = \"..\"`, `name = \"..\"` or `namespace = \"..\"`"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

/// `Attr<T>`, also behind a path like `kvattr::Attr<T>`.
fn attr_value_type(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else { return None };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Attr" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn parse_field(field: &syn::Field) -> Result<ParsingResult, syn::Error> {
    let name = field.ident.clone().ok_or_else(|| syn::Error::new(field.span(), "Unnamed fields not supported"))?;
    let def = FieldDef { name };
    let mut parsed = ParsingResult::Plain;
    for attr in &field.attrs {
        let next = if attr.path().is_ident("attr_id") {
            ParsingResult::Identity(def.clone())
        } else if attr.path().is_ident("kv_attr") {
            let value_type = attr_value_type(&field.ty)
                .ok_or_else(|| syn::Error::new(field.ty.span(), "`#[kv_attr]` fields must have type `Attr<T>`"))?;
            let mut default = None;
            if let syn::Meta::List(_) = &attr.meta {
                attr.parse_nested_meta(|nested| {
                    if nested.path.is_ident("default") {
                        default = Some(nested.value()?.parse::<Expr>()?);
                        Ok(())
                    } else {
                        Err(nested.error("expected `default = <expr>`"))
                    }
                })?;
            }
            ParsingResult::Attr(AttrDef { field: def.clone(), value_type, default })
        } else {
            continue;
        };
        if !matches!(parsed, ParsingResult::Plain) {
            return Err(syn::Error::new(attr.span(), "`#[attr_id]` and `#[kv_attr]` are exclusive, use one per field"));
        }
        parsed = next;
    }
    Ok(parsed)
}

pub fn get_field_macros(fields: &Punctuated<syn::Field, Comma>, ast: &ItemStruct) -> Result<FieldDefs, syn::Error> {
    let mut identity: Option<FieldDef> = None;
    let mut attrs: Vec<AttrDef> = Vec::new();

    for field in fields.iter() {
        match parse_field(field)? {
            ParsingResult::Identity(def) => {
                if identity.is_some() {
                    return Err(syn::Error::new(field.span(), "Multiple `#[attr_id]` fields found; only one is allowed"));
                }
                identity = Some(def);
            }
            ParsingResult::Attr(attr) => attrs.push(attr),
            ParsingResult::Plain => {}
        }
    }

    let identity = identity.ok_or_else(|| {
        syn::Error::new(ast.ident.span(), "`#[attr_id]` not found on any field. Exactly one field must identify the host.")
    })?;

    Ok(FieldDefs { identity, attrs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;
    use syn::parse_quote;

    fn parse(ast: &ItemStruct) -> Result<FieldDefs, String> {
        let fields = get_named_fields(ast).map_err(|e| e.to_string())?;
        get_field_macros(&fields, ast).map_err(|e| e.to_string())
    }

    #[test]
    fn identity_and_attrs_are_collected() {
        let ast: ItemStruct = parse_quote! {
            struct Post {
                #[attr_id]
                id: Option<i64>,
                #[kv_attr(default = "untitled")]
                title: kvattr::Attr<String>,
                #[kv_attr]
                views: Attr<i64>,
                body: String,
            }
        };
        let defs = parse(&ast).unwrap();
        assert_eq!(defs.identity.name, "id");
        let names: Vec<String> = defs.attrs.iter().map(|a| a.field.name.to_string()).collect();
        assert_eq!(names, vec!["title", "views"]);
        assert!(defs.attrs[0].default.is_some());
        assert!(defs.attrs[1].default.is_none());
        assert_eq!(defs.attrs[0].value_type.to_token_stream().to_string(), "String");
        assert_eq!(defs.attrs[1].value_type.to_token_stream().to_string(), "i64");
    }

    #[test]
    fn missing_identity_is_rejected() {
        let ast: ItemStruct = parse_quote! {
            struct Post {
                id: i64,
                #[kv_attr]
                title: Attr<String>,
            }
        };
        assert!(parse(&ast).err().unwrap().contains("`#[attr_id]` not found on any field"));
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let ast: ItemStruct = parse_quote! {
            struct Post {
                #[attr_id]
                id: i64,
                #[attr_id]
                uuid: String,
            }
        };
        assert!(parse(&ast).err().unwrap().contains("Multiple `#[attr_id]` fields found"));
    }

    #[test]
    fn kv_attr_needs_attr_type() {
        let ast: ItemStruct = parse_quote! {
            struct Post {
                #[attr_id]
                id: i64,
                #[kv_attr]
                title: String,
            }
        };
        assert!(parse(&ast).err().unwrap().contains("must have type `Attr<T>`"));
    }

    #[test]
    fn identity_and_attr_on_one_field_are_exclusive() {
        let ast: ItemStruct = parse_quote! {
            struct Post {
                #[attr_id]
                #[kv_attr]
                id: Attr<i64>,
            }
        };
        assert!(parse(&ast).err().unwrap().contains("are exclusive"));
    }

    #[test]
    fn generic_and_tuple_structs_are_rejected() {
        let generic: ItemStruct = parse_quote! {
            struct Post<T> {
                #[attr_id]
                id: T,
            }
        };
        assert!(parse(&generic).err().unwrap().contains("does not support generic structs"));
        let tuple: ItemStruct = parse_quote! { struct Post(#[attr_id] i64); };
        assert!(parse(&tuple).err().unwrap().contains("only supports structs with named fields"));
        let unit: ItemStruct = parse_quote! { struct Post; };
        assert!(parse(&unit).err().unwrap().contains("only supports structs with named fields"));
    }

    #[test]
    fn struct_attrs_are_parsed() {
        let ast: ItemStruct = parse_quote! {
            #[kv_attrs(pool = "foo_pool", namespace = "articles")]
            struct Post {
                #[attr_id]
                id: i64,
            }
        };
        let attrs = get_struct_attrs(&ast).unwrap();
        assert_eq!(attrs.pool.unwrap().value(), "foo_pool");
        assert_eq!(attrs.namespace.unwrap().value(), "articles");
        assert!(attrs.name.is_none());
        let unknown: ItemStruct = parse_quote! {
            #[kv_attrs(table = "x")]
            struct Post {
                #[attr_id]
                id: i64,
            }
        };
        assert!(get_struct_attrs(&unknown).is_err());
    }
}
