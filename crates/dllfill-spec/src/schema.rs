use crate::manifest::BindingTable;

/// JSON Schema for [`BindingTable`] as a `serde_json::Value`.
pub fn generate_schema_value() -> serde_json::Value {
    let schema = schemars::schema_for!(BindingTable);
    schema.to_value()
}

/// Pretty-printed JSON Schema for [`BindingTable`].
pub fn generate_schema_json_pretty() -> String {
    let value = generate_schema_value();
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
