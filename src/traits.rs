use serde::Serialize;

/// Types that can be printed for the user in a structured format.
pub trait Exportable {
    /// YAML, for human-readable dumps such as the effective configuration.
    fn export(&self) -> Result<String, serde_yaml::Error>
    where
        Self: Serialize,
    {
        serde_yaml::to_string(&self)
    }

    /// Pretty-printed JSON, for `--json` output.
    fn export_json(&self) -> Result<String, serde_json::Error>
    where
        Self: Serialize,
    {
        serde_json::to_string_pretty(&self)
    }
}

impl Exportable for crate::data::Package {}

impl Exportable for Vec<crate::data::Package> {}

impl Exportable for crate::statistics::StatsSummary {}
