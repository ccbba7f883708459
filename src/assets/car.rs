use crate::record::{Field, Record};
use serde::{Deserialize, Serialize};

/// Car with a fleet count and an owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    #[serde(rename = "ID")]
    pub id: String,
    pub make: String,
    pub model: String,
    pub count: i64,
    pub owner: String,
}

impl Car {
    pub fn new(id: &str, make: &str, model: &str, count: i64, owner: &str) -> Self {
        Self {
            id: id.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            count,
            owner: owner.to_string(),
        }
    }
}

impl Record for Car {
    const KIND: &'static str = "car";
    const NAME: &'static str = "Car";
    const PLURAL: &'static str = "Cars";
    const FIELDS: &'static [Field] = &[
        Field::text("make"),
        Field::text("model"),
        Field::integer("count"),
        Field::text("owner"),
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
        vec![
            Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"),
            Car::new("CAR1", "Ford", "Mustang", 4, "Brad"),
            Car::new("CAR2", "Hyundai", "Tucson", 7, "Jin Soo"),
            Car::new("CAR3", "Volkswagen", "Passat", 2, "Max"),
            Car::new("CAR4", "Tesla", "S", 5, "Adriana"),
            Car::new("CAR5", "Peugeot", "205", 1, "Michel"),
            Car::new("CAR6", "Chery", "S22L", 3, "Aarav"),
            Car::new("CAR7", "Fiat", "Punto", 6, "Pari"),
            Car::new("CAR8", "Tata", "Nano", 9, "Valeria"),
            Car::new("CAR9", "Holden", "Barina", 8, "Shotaro"),
        ]
    }
}
