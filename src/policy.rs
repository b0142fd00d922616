use serde::{Deserialize, Deserializer, Serialize};

/// Declares which fields a bare token searches and how each field's values
/// are typed.
///
/// Each list is optional and absence differs from emptiness: with `isString`
/// absent every field is pattern-matched, with `isString: []` every field is
/// matched exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPolicy {
    /// Fields a bare token expands into, in output order.
    #[serde(
        default,
        alias = "anyOf",
        deserialize_with = "dedup_list",
        skip_serializing_if = "Option::is_none"
    )]
    any: Option<Vec<String>>,

    /// Fields compared by substring/pattern rather than exact equality.
    #[serde(
        default,
        deserialize_with = "dedup_list",
        skip_serializing_if = "Option::is_none"
    )]
    is_string: Option<Vec<String>>,

    /// Fields whose values are points in time.
    #[serde(
        default,
        deserialize_with = "dedup_list",
        skip_serializing_if = "Option::is_none"
    )]
    is_date: Option<Vec<String>>,
}

impl FieldPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_any<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any = Some(dedup("any", fields));
        self
    }

    pub fn with_is_string<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.is_string = Some(dedup("isString", fields));
        self
    }

    pub fn with_is_date<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.is_date = Some(dedup("isDate", fields));
        self
    }

    pub fn any(&self) -> Option<&[String]> {
        self.any.as_deref()
    }

    pub fn is_string(&self) -> Option<&[String]> {
        self.is_string.as_deref()
    }

    pub fn is_date(&self) -> Option<&[String]> {
        self.is_date.as_deref()
    }

    /// Fields a bare token expands into: `any` when populated, otherwise
    /// `isString`. `None` when neither has entries.
    pub fn bare_fields(&self) -> Option<&[String]> {
        [self.any(), self.is_string()]
            .into_iter()
            .flatten()
            .find(|fields| !fields.is_empty())
    }

    pub fn is_string_field(&self, field: &str) -> bool {
        match &self.is_string {
            None => true,
            Some(fields) => fields.iter().any(|f| f == field),
        }
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.is_date
            .as_ref()
            .is_some_and(|fields| fields.iter().any(|f| f == field))
    }
}

fn dedup<I, S>(list: &str, fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for field in fields {
        let field = field.into();
        if out.contains(&field) {
            log::warn!("policy list={list} duplicate field={field} dropped");
            continue;
        }
        out.push(field);
    }
    out
}

fn dedup_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let fields: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(fields.map(|f| dedup("policy", f)))
}
