use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};

/// Product model line with the number of units registered against it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub count: i64,
}

impl Model {
    pub fn new(id: &str, name: &str, count: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            count,
        }
    }
}

impl Record for Model {
    const KIND: &'static str = "model";
    const NAME: &'static str = "Model";
    const PLURAL: &'static str = "Models";
    const FIELDS: &'static [Field] = &[Field::text("name"), Field::integer("count")];
    const COUNT_FIELD: &'static str = "count";

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
        vec![
            Model::new("MODEL-00001", "GalaxyS7", 10),
            Model::new("MODEL-00002", "GalaxyS9", 10),
            Model::new("MODEL-00003", "GalaxyS10", 10),
            Model::new("MODEL-00004", "K5", 3),
            Model::new("MODEL-00005", "Sorento", 3),
        ]
    }
}
