//! Parsing of `#[config(...)]` attributes.

use syn::{Attribute, LitStr, Path};

/// Name of the helper attribute.
pub const ATTR: &str = "config";

/// Container-level attributes.
#[derive(Debug)]
pub struct RecordAttrs {
    /// Path to the runtime crate (`::tagconf` unless overridden).
    pub krate: Path,
}

impl RecordAttrs {
    /// Parses `#[config(crate = "...")]` on the record.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut krate = None;

        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let value: LitStr = meta.value()?.parse()?;
                    krate = Some(value.parse::<Path>()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown record attribute, expected `crate`"))
                }
            })?;
        }

        Ok(Self {
            krate: krate.unwrap_or_else(|| syn::parse_quote!(::tagconf)),
        })
    }
}

/// Field-level attributes.
#[derive(Debug, Default, PartialEq)]
pub struct FieldAttrs {
    /// `(tag name, tag value)` pairs in declaration order.
    pub keys: Vec<(String, String)>,
    /// Validation tag.
    pub validate: Option<String>,
    /// Default literal.
    pub default: Option<String>,
}

impl FieldAttrs {
    /// Parses the `#[config(...)]` attributes of a field.
    ///
    /// Returns `None` when the field carries no `config` attribute, which
    /// leaves it out of the record's descriptors.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Option<Self>> {
        let mut parsed = None::<Self>;

        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            let field = parsed.get_or_insert_with(Self::default);
            attr.parse_nested_meta(|meta| {
                let name = meta
                    .path
                    .get_ident()
                    .ok_or_else(|| meta.error("expected identifier"))?
                    .to_string();
                let value: LitStr = meta.value()?.parse()?;

                match name.as_str() {
                    "validate" => set_once(&mut field.validate, value, "validate"),
                    "default" => set_once(&mut field.default, value, "default"),
                    _ => {
                        if field.keys.iter().any(|(tag, _)| *tag == name) {
                            return Err(syn::Error::new(
                                value.span(),
                                format!("duplicate key for tag `{name}`"),
                            ));
                        }
                        field.keys.push((name, value.value()));
                        Ok(())
                    }
                }
            })?;
        }

        Ok(parsed)
    }
}

fn set_once(slot: &mut Option<String>, value: LitStr, name: &str) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new(
            value.span(),
            format!("duplicate `{name}` attribute"),
        ));
    }
    *slot = Some(value.value());
    Ok(())
}
