//! Load store and collection declarations from a JSON schema file.

use crate::catalog::types::CatalogFile;
use crate::error::ConfigError;
use std::path::Path;

pub fn parse_catalog_file(json: &str) -> Result<CatalogFile, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_catalog_file(path: impl AsRef<Path>) -> Result<CatalogFile, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let file = parse_catalog_file(&raw)?;
    tracing::debug!(path = %path.display(), stores = file.stores.len(), "catalog file loaded");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_schema() {
        let file = parse_catalog_file(
            r#"{
                "stores": [{
                    "id": "shop",
                    "database_url_env": "SHOP_DATABASE_URL",
                    "collections": [{
                        "name": "Products",
                        "entity": "Product",
                        "properties": [
                            { "name": "Sku", "type": "string", "key": true },
                            { "name": "Price", "type": "decimal" },
                            { "name": "Weight", "type": "decimal", "nullable": true, "column": "weight_kg" }
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap();
        let store = &file.stores[0];
        assert_eq!(store.schema, "public");
        assert_eq!(store.collections[0].properties.len(), 3);
        assert!(store.collections[0].properties[0].key);
        assert_eq!(store.collections[0].properties[2].column.as_deref(), Some("weight_kg"));
    }

    #[test]
    fn malformed_schema_is_a_load_error() {
        assert!(matches!(parse_catalog_file("{ \"stores\": 3 }"), Err(ConfigError::Load(_))));
    }
}
