use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};

/// Manufactured product tracked by model and registration status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
    #[serde(rename = "modelName")]
    pub model_name: String,
    pub make: String,
    pub status: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub description: String,
}

impl Record for Product {
    const KIND: &'static str = "product";
    const NAME: &'static str = "Product";
    const PLURAL: &'static str = "Products";
    const FIELDS: &'static [Field] = &[
        Field::text("modelID"),
        Field::text("modelName"),
        Field::text("make"),
        Field::integer("status"),
        Field::text("updatedAt"),
        Field::text("description"),
    ];
    const COUNT_FIELD: &'static str = "status";

    fn id(&self) -> &str {
        &self.id
    }

    fn count(&self) -> i64 {
        self.status
    }

    fn set_count(&mut self, count: i64) {
        self.status = count;
    }

    fn samples() -> Vec<Self> {
        [
            ("PRODUCT-00001", "MODEL-00001", "GalaxyS7"),
            ("PRODUCT-00002", "MODEL-00002", "GalaxyS9"),
            ("PRODUCT-00003", "MODEL-00003", "GalaxyS10"),
            ("PRODUCT-00004", "MODEL-00004", "GalaxyS11"),
            ("PRODUCT-00005", "MODEL-00005", "GalaxyS20"),
            ("PRODUCT-00006", "MODEL-00006", "GalaxyS20"),
            ("PRODUCT-00007", "MODEL-00007", "GalaxyS20"),
        ]
        .into_iter()
        .map(|(id, model_id, model_name)| Product {
            id: id.to_string(),
            model_id: model_id.to_string(),
            model_name: model_name.to_string(),
            make: "SAMSUNG".to_string(),
            status: 1,
            updated_at: "2020-06-08".to_string(),
            description: "등록".to_string(),
        })
        .collect()
    }
}
