use serde::{Deserialize, Serialize};

/// Named connection strings; `primary` is the fallback used when
/// `DATABASE_URL` is not set
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ConnectionStrings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DatabaseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// Shape of `appsettings.yml`. Every field is optional; missing values fall
/// back to environment variables and built-in defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct YmlSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<String>,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub connection_strings: ConnectionStrings,
}

impl YmlSettings {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}
