use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};

/// Inventory of one model held by an owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
    pub make: String,
    pub count: i64,
    pub owner: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl Record for Stock {
    const KIND: &'static str = "stock";
    const NAME: &'static str = "Stock";
    const PLURAL: &'static str = "Stocks";
    const FIELDS: &'static [Field] = &[
        Field::text("modelID"),
        Field::text("make"),
        Field::integer("count"),
        Field::text("owner"),
        Field::text("updatedAt"),
    ];
    const COUNT_FIELD: &'static str = "count";
    const OWNER_FIELD: Option<&'static str> = Some("owner");

    fn id(&self) -> &str {
        &self.id
    }

    fn count(&self) -> i64 {
        self.count
    }

    fn set_count(&mut self, count: i64) {
        self.count = count;
    }

    fn samples() -> Vec<Self> {
        [
            ("STOCK-00001", "MODEL-00001", "SAMSUNG", 20, "Seoul"),
            ("STOCK-00002", "MODEL-00002", "SAMSUNG", 15, "Seoul"),
            ("STOCK-00003", "MODEL-00003", "SAMSUNG", 30, "Busan"),
            ("STOCK-00004", "MODEL-00004", "KIA", 5, "Incheon"),
            ("STOCK-00005", "MODEL-00005", "KIA", 12, "Daegu"),
        ]
        .into_iter()
        .map(|(id, model_id, make, count, owner)| Stock {
            id: id.to_string(),
            model_id: model_id.to_string(),
            make: make.to_string(),
            count,
            owner: owner.to_string(),
            updated_at: "2020-06-08".to_string(),
        })
        .collect()
    }
}
