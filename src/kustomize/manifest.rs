//! Decoding and normalization of Kustomization documents.

use std::fmt;

use serde::de::{EnumAccess, Error as _, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::traits::ExtractError;

const KUSTOMIZATION_KIND: &str = "Kustomization";

/// An entry of the `images` list.
///
/// Every field is optional here; [`super::extract_image`] decides whether
/// the entry is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KustomizeImage {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub new_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub new_tag: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub digest: Option<String>,
}

/// A Kustomization reduced to the parts that carry dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kustomization {
    pub kind: String,
    /// Legacy `bases` entries followed by `resources` entries
    pub bases: Vec<String>,
    pub images: Vec<KustomizeImage>,
}

/// Parses `content` as a Kustomization.
///
/// Returns `None` for anything that does not decode or is not of kind
/// `Kustomization`.
pub fn parse_kustomize(content: &str) -> Option<Kustomization> {
    match decode(content) {
        Ok(pkg) => Some(pkg),
        Err(e) => {
            debug!(error = %e, "Skipping manifest");
            None
        }
    }
}

fn decode(content: &str) -> Result<Kustomization, ExtractError> {
    let LenientValue(mut doc) = serde_yaml::from_str(content)?;
    doc.apply_merge()?;

    let Value::Mapping(map) = doc else {
        return Err(ExtractError::schema("document is empty or not a mapping"));
    };

    match map.get("kind") {
        Some(Value::String(kind)) if kind == KUSTOMIZATION_KIND => {}
        other => {
            return Err(ExtractError::schema(format!(
                "expected kind '{KUSTOMIZATION_KIND}', found {other:?}"
            )))
        }
    }

    let mut bases = string_entries(sequence(map.get("bases"), "bases")?);
    bases.extend(string_entries(sequence(map.get("resources"), "resources")?));

    let images = sequence(map.get("images"), "images")?
        .iter()
        .filter_map(|entry| match serde_yaml::from_value(entry.clone()) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!(error = %e, "Skipping malformed image entry");
                None
            }
        })
        .collect();

    Ok(Kustomization {
        kind: KUSTOMIZATION_KIND.to_string(),
        bases,
        images,
    })
}

/// A YAML value whose mappings keep the last of any repeated keys.
///
/// `serde_yaml::Value` rejects duplicate keys; manifests in the wild rely on
/// the later entry overriding the earlier one, as JSON parsers do.
struct LenientValue(Value);

impl<'de> Deserialize<'de> for LenientValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientVisitor).map(LenientValue)
    }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_f64<E>(self, n: f64) -> Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        LenientValue::deserialize(deserializer).map(|LenientValue(v)| v)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(LenientValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some((LenientValue(key), LenientValue(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }

    fn visit_enum<A>(self, data: A) -> Result<Value, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (tag, variant) = data.variant::<String>()?;
        let LenientValue(value) = variant.newtype_variant()?;
        Ok(Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value,
        })))
    }
}

/// A missing or null key reads as an empty list.
fn sequence<'a>(value: Option<&'a Value>, key: &str) -> Result<&'a [Value], ExtractError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Sequence(items)) => Ok(items),
        Some(_) => Err(ExtractError::schema(format!("'{key}' is not a list"))),
    }
}

fn string_entries(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            other => {
                debug!(entry = ?other, "Skipping non-string base entry");
                None
            }
        })
        .collect()
}

/// Accepts any YAML scalar as text; null and empty strings become `None`.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a scalar, found {other:?}"
            )))
        }
    };
    Ok(text.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_yaml() {
        assert!(parse_kustomize("kind: Kustomization\nbases: [unclosed").is_none());
        assert!(matches!(
            decode("{ not: valid: yaml"),
            Err(ExtractError::Decode(_))
        ));
    }

    #[test]
    fn test_rejects_empty_document() {
        assert!(parse_kustomize("").is_none());
        assert!(parse_kustomize("~").is_none());
        assert!(parse_kustomize("# only a comment\n").is_none());
    }

    #[test]
    fn test_rejects_other_kinds() {
        assert!(parse_kustomize("kind: Deployment\n").is_none());
        assert!(parse_kustomize("kind: kustomization\n").is_none());
        assert!(parse_kustomize("bases:\n  - github.com/a/b?ref=v1\n").is_none());
        assert!(matches!(
            decode("apiVersion: v1\nkind: Service\n"),
            Err(ExtractError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_accepts_json() {
        let pkg = parse_kustomize(r#"{"kind": "Kustomization", "resources": ["a", "b"]}"#)
            .unwrap();
        assert_eq!(pkg.bases, vec!["a", "b"]);
        assert!(pkg.images.is_empty());
    }

    #[test]
    fn test_minimal_manifest_has_empty_lists() {
        let pkg = parse_kustomize("kind: Kustomization\n").unwrap();
        assert_eq!(pkg.kind, "Kustomization");
        assert!(pkg.bases.is_empty());
        assert!(pkg.images.is_empty());
    }

    #[test]
    fn test_bases_precede_resources() {
        let content = "\
kind: Kustomization
resources:
  - r1
  - r2
bases:
  - b1
  - b2
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(pkg.bases, vec!["b1", "b2", "r1", "r2"]);
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let pkg = parse_kustomize("kind: Kustomization\nbases:\nresources: ~\nimages:\n").unwrap();
        assert!(pkg.bases.is_empty());
        assert!(pkg.images.is_empty());
    }

    #[test]
    fn test_list_of_wrong_type_is_rejected() {
        assert!(parse_kustomize("kind: Kustomization\nbases: github.com/a/b\n").is_none());
        assert!(parse_kustomize("kind: Kustomization\nimages: {name: nginx}\n").is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let content = "\
kind: Kustomization
resources:
  - 42
  - ./local
images:
  - plain-string
  - name: nginx
    newTag: \"1.19\"
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(pkg.bases, vec!["./local"]);
        assert_eq!(pkg.images.len(), 1);
        assert_eq!(pkg.images[0].name.as_deref(), Some("nginx"));
    }

    #[test]
    fn test_image_scalars_are_read_as_text() {
        let content = "\
kind: Kustomization
images:
  - name: nginx
    newName: registry.example.com/nginx
    newTag: 1.19
  - name: redis
    newTag: 6
  - name: empty
    newTag: \"\"
    digest: ~
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(
            pkg.images[0],
            KustomizeImage {
                name: Some("nginx".to_string()),
                new_name: Some("registry.example.com/nginx".to_string()),
                new_tag: Some("1.19".to_string()),
                digest: None,
            }
        );
        assert_eq!(pkg.images[1].new_tag.as_deref(), Some("6"));
        assert_eq!(pkg.images[2].new_tag, None);
        assert_eq!(pkg.images[2].digest, None);
    }

    #[test]
    fn test_boolean_and_float_scalars() {
        let content = "\
kind: Kustomization
images:
  - name: flag
    newTag: true
  - name: trimmed
    newTag: 1.10
  - name: quoted
    newTag: \"1.10\"
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(pkg.images[0].new_tag.as_deref(), Some("true"));
        // Unquoted floats lose trailing zeros
        assert_eq!(pkg.images[1].new_tag.as_deref(), Some("1.1"));
        assert_eq!(pkg.images[2].new_tag.as_deref(), Some("1.10"));
    }

    #[test]
    fn test_duplicate_keys_keep_last() {
        let content = "\
kind: Kustomization
images:
  - name: redis
images:
  - name: nginx
    newTag: \"1.19\"
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(pkg.images.len(), 1);
        assert_eq!(pkg.images[0].name.as_deref(), Some("nginx"));
        assert_eq!(pkg.images[0].new_tag.as_deref(), Some("1.19"));
    }

    #[test]
    fn test_duplicate_keys_in_json() {
        let pkg = parse_kustomize(r#"{"kind": "Deployment", "kind": "Kustomization"}"#).unwrap();
        assert_eq!(pkg.kind, "Kustomization");
    }

    #[test]
    fn test_merge_keys_are_resolved() {
        let content = "\
kind: Kustomization
defaults: &defaults
  newTag: \"1.19\"
images:
  - <<: *defaults
    name: nginx
  - <<: *defaults
    name: redis
    newTag: \"6\"
";
        let pkg = parse_kustomize(content).unwrap();
        assert_eq!(pkg.images[0].name.as_deref(), Some("nginx"));
        assert_eq!(pkg.images[0].new_tag.as_deref(), Some("1.19"));
        assert_eq!(pkg.images[1].new_tag.as_deref(), Some("6"));
    }

    #[test]
    fn test_tagged_values_decode() {
        let pkg = parse_kustomize("kind: Kustomization
extra: !Custom value
resources:
  - a
")
            .unwrap();
        assert_eq!(pkg.bases, vec!["a"]);
    }
}
