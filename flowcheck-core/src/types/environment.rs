use std::collections::BTreeMap;

/// Target of a run: where requests go and which variables seed the scope.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Environment {
    #[serde(rename = "environmentId", alias = "id", default)]
    pub environment_id: String,

    #[serde(rename = "baseUrl", alias = "base_url")]
    pub base_url: String,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(environment_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            environment_id: environment_id.into(),
            base_url: base_url.into(),
            variables: BTreeMap::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}
