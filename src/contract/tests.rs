use super::*;
use crate::assets::{Car, Model, Product, Stock};
use crate::ledger::Ledger;
use crate::stub::{ChaincodeStub, KeyModification, StateDatabase, StubError};
use chrono::{DateTime, Utc};

fn car_ledger() -> Ledger {
    Ledger::new("car", StateDatabase::CouchDb)
}

fn cars() -> RecordContract<Car> {
    RecordContract::new()
}

fn add_car(ledger: &Ledger, car: Car) {
    ledger.submit(|ctx| cars().add(ctx, car)).expect("add failed");
}

fn get_car(ledger: &Ledger, id: &str) -> Result<Car, ContractError> {
    ledger.evaluate(|ctx| cars().get(ctx, id)).map(|r| r.value)
}

#[test]
fn test_add_then_get_returns_same_record() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    let car = get_car(&ledger, "CAR0").unwrap();
    assert_eq!(
        car,
        Car {
            id: "CAR0".to_string(),
            make: "Toyota".to_string(),
            model: "Prius".to_string(),
            count: 10,
            owner: "Tomoko".to_string(),
        }
    );
}

#[test]
fn test_add_twice_fails_already_exists() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    let err = ledger
        .submit(|ctx| cars().add(ctx, Car::new("CAR0", "Ford", "Focus", 1, "Brad")))
        .unwrap_err();
    assert_eq!(err.to_string(), "The car CAR0 already exists");

    // Stored record untouched
    assert_eq!(get_car(&ledger, "CAR0").unwrap().make, "Toyota");
}

#[test]
fn test_get_and_delete_absent_fail_not_found() {
    let ledger = car_ledger();

    let err = get_car(&ledger, "CAR9").unwrap_err();
    assert_eq!(err.to_string(), "The car CAR9 does not exist");

    let err = ledger.submit(|ctx| cars().delete(ctx, "CAR9")).unwrap_err();
    assert_eq!(err.to_string(), "The car CAR9 does not exist");
}

#[test]
fn test_exists() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    let exists = |id: &str| ledger.evaluate(|ctx| cars().exists(ctx, id)).unwrap().value;
    assert!(exists("CAR0"));
    assert!(!exists("CAR1"));
}

#[test]
fn test_push_and_pop_count() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    let pushed = ledger
        .submit(|ctx| cars().adjust_count(ctx, "CAR0", 5, Direction::Push))
        .unwrap()
        .value;
    assert_eq!(pushed.count, 15);
    assert_eq!(get_car(&ledger, "CAR0").unwrap().count, 15);

    let err = ledger
        .submit(|ctx| cars().adjust_count(ctx, "CAR0", 20, Direction::Pop))
        .unwrap_err();
    assert_eq!(err.to_string(), "Not enough count. 15 < 20");
    assert_eq!(get_car(&ledger, "CAR0").unwrap().count, 15);

    let popped = ledger
        .submit(|ctx| cars().pop_count(ctx, "CAR0", 15))
        .unwrap()
        .value;
    assert_eq!(popped.count, 0);
}

#[test]
fn test_non_positive_delta_always_fails() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    for delta in [0, -1, -100] {
        for direction in [Direction::Push, Direction::Pop] {
            let err = ledger
                .submit(|ctx| cars().adjust_count(ctx, "CAR0", delta, direction))
                .unwrap_err();
            assert_eq!(err, ContractError::InvalidCount { delta });
        }
    }

    // Checked before the record is read
    let err = ledger
        .submit(|ctx| cars().push_count(ctx, "MISSING", 0))
        .unwrap_err();
    assert_eq!(err, ContractError::InvalidCount { delta: 0 });
}

#[test]
fn test_push_overflow_is_rejected() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", i64::MAX - 1, "Tomoko"));

    let err = ledger
        .submit(|ctx| cars().push_count(ctx, "CAR0", 2))
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));
}

#[test]
fn test_get_all_empty_then_n_records() {
    let ledger = car_ledger();
    let all = ledger.evaluate(|ctx| cars().get_all(ctx)).unwrap().value;
    assert!(all.is_empty());

    for i in 0..5 {
        add_car(
            &ledger,
            Car::new(&format!("CAR{}", i), "Toyota", "Prius", i, "Tomoko"),
        );
    }

    let all = ledger.evaluate(|ctx| cars().get_all(ctx)).unwrap().value;
    assert_eq!(all.len(), 5);
    let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["CAR0", "CAR1", "CAR2", "CAR3", "CAR4"]);
    assert_eq!(ledger.world_state().open_iterators(), 0);
}

#[test]
fn test_get_all_aborts_on_undecodable_value() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 1, "Tomoko"));
    ledger
        .submit(|ctx| {
            ctx.stub_mut()
                .put_state("CAR1", b"garbage".to_vec())
                .map_err(ContractError::StorageWrite)
        })
        .unwrap();

    let err = ledger.evaluate(|ctx| cars().get_all(ctx)).unwrap_err();
    assert!(matches!(err, ContractError::Deserialization { kind: "car", .. }));
    assert_eq!(ledger.world_state().open_iterators(), 0);
}

#[test]
fn test_get_range() {
    let ledger = car_ledger();
    ledger.submit(|ctx| cars().init_ledger(ctx)).unwrap();

    let range = ledger
        .evaluate(|ctx| cars().get_range(ctx, "CAR2", "CAR5"))
        .unwrap()
        .value;
    let ids: Vec<&str> = range.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["CAR2", "CAR3", "CAR4"]);
}

#[test]
fn test_rich_query() {
    let ledger = car_ledger();
    ledger.submit(|ctx| cars().init_ledger(ctx)).unwrap();

    let owned = ledger
        .evaluate(|ctx| cars().query(ctx, r#"{"selector":{"owner":"Brad"}}"#))
        .unwrap()
        .value;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, "CAR1");

    let err = ledger
        .evaluate(|ctx| cars().query(ctx, "{"))
        .unwrap_err();
    assert!(matches!(err, ContractError::StorageRead(StubError::InvalidQuery(_))));
}

#[test]
fn test_rich_query_unavailable_on_key_value_backend() {
    let ledger = Ledger::new("car", StateDatabase::GoLevelDb);
    let err = ledger
        .evaluate(|ctx| cars().query(ctx, r#"{"selector":{}}"#))
        .unwrap_err();
    assert!(matches!(err, ContractError::StorageRead(StubError::Unsupported(_))));
    assert!(err.to_string().starts_with("Failed to read from world state: "));
}

#[test]
fn test_update_field_and_change_owner() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));

    ledger
        .submit(|ctx| cars().update_field(ctx, "CAR0", "model", "Corolla"))
        .unwrap();
    ledger
        .submit(|ctx| cars().change_owner(ctx, "CAR0", "Dave"))
        .unwrap();

    let car = get_car(&ledger, "CAR0").unwrap();
    assert_eq!(car.model, "Corolla");
    assert_eq!(car.owner, "Dave");

    let err = ledger
        .submit(|ctx| cars().update_field(ctx, "CAR7", "owner", "Dave"))
        .unwrap_err();
    assert!(matches!(err, ContractError::NotFound { .. }));
}

#[test]
fn test_count_never_goes_negative() {
    let ledger = car_ledger();
    let args: Vec<String> = ["Toyota", "Prius", "-10", "Tomoko"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let err = ledger
        .submit(|ctx| cars().add_from_args(ctx, "CAR0", &args))
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));

    let err = ledger
        .submit(|ctx| cars().add(ctx, Car::new("CAR1", "Ford", "Mustang", -1, "Brad")))
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidArgument(_)));
    assert!(ledger.world_state().is_empty());

    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));
    let err = ledger
        .submit(|ctx| cars().update_field(ctx, "CAR0", "count", "-99"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field count of car CAR0 must not be negative, got -99"
    );
    assert_eq!(get_car(&ledger, "CAR0").unwrap().count, 10);
}

#[test]
fn test_add_with_empty_id_is_invalid_argument() {
    let ledger = car_ledger();

    let err = ledger
        .submit(|ctx| cars().add(ctx, Car::new("", "Toyota", "Prius", 10, "Tomoko")))
        .unwrap_err();

    assert_eq!(
        err,
        ContractError::InvalidArgument("The car id must not be empty".to_string())
    );
    assert!(ledger.world_state().is_empty());
}

#[test]
fn test_change_owner_without_owner_field() {
    let ledger = Ledger::new("model", StateDatabase::CouchDb);
    let models = RecordContract::<Model>::new();
    ledger.submit(|ctx| models.init_ledger(ctx)).unwrap();

    let err = ledger
        .submit(|ctx| models.change_owner(ctx, "MODEL-00001", "KIA"))
        .unwrap_err();
    assert_eq!(err.to_string(), "The model record has no owner");
}

#[test]
fn test_history_skips_deletions() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));
    ledger.submit(|ctx| cars().delete(ctx, "CAR0")).unwrap();

    let history = ledger
        .evaluate(|ctx| cars().history(ctx, "CAR0"))
        .unwrap()
        .value;
    assert_eq!(history, vec![Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko")]);

    assert!(matches!(get_car(&ledger, "CAR0"), Err(ContractError::NotFound { .. })));
}

#[test]
fn test_history_keeps_versions_in_order() {
    let ledger = car_ledger();
    add_car(&ledger, Car::new("CAR0", "Toyota", "Prius", 10, "Tomoko"));
    ledger.submit(|ctx| cars().push_count(ctx, "CAR0", 1)).unwrap();
    ledger.submit(|ctx| cars().change_owner(ctx, "CAR0", "Dave")).unwrap();

    let history = ledger
        .evaluate(|ctx| cars().history(ctx, "CAR0"))
        .unwrap()
        .value;
    let states: Vec<(i64, &str)> = history.iter().map(|c| (c.count, c.owner.as_str())).collect();
    assert_eq!(states, vec![(10, "Tomoko"), (11, "Tomoko"), (11, "Dave")]);
}

#[test]
fn test_init_ledger_for_every_entity() {
    fn check<R: crate::record::Record>(expected: usize) {
        let ledger = Ledger::new(R::KIND, StateDatabase::CouchDb);
        let contract = RecordContract::<R>::new();
        ledger.submit(|ctx| contract.init_ledger(ctx)).unwrap();
        let all = ledger.evaluate(|ctx| contract.get_all(ctx)).unwrap().value;
        assert_eq!(all.len(), expected, "{}", R::KIND);
    }

    check::<Product>(7);
    check::<Car>(10);
    check::<Stock>(5);
    check::<Model>(5);
}

#[test]
fn test_product_status_is_its_count() {
    let ledger = Ledger::new("product", StateDatabase::CouchDb);
    let products = RecordContract::<Product>::new();
    ledger.submit(|ctx| products.init_ledger(ctx)).unwrap();

    let updated = ledger
        .submit(|ctx| products.push_count(ctx, "PRODUCT-00001", 2))
        .unwrap()
        .value;
    assert_eq!(updated.status, 3);
}

/// Stub whose writes always fail, for exercising storage error paths
struct FailingStub {
    cause: String,
}

impl ChaincodeStub for FailingStub {
    fn tx_id(&self) -> &str {
        "failing-tx"
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn get_state(&self, _key: &str) -> Result<Option<Vec<u8>>, StubError> {
        Ok(None)
    }

    fn put_state(&mut self, _key: &str, _value: Vec<u8>) -> Result<(), StubError> {
        Err(StubError::Backend(self.cause.clone()))
    }

    fn del_state(&mut self, _key: &str) -> Result<(), StubError> {
        Err(StubError::Backend(self.cause.clone()))
    }

    fn get_state_by_range(
        &self,
        _start_key: &str,
        _end_key: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, StubError> {
        Ok(ResultsIterator::new(
            vec![Err(StubError::Backend(self.cause.clone()))].into_iter(),
        ))
    }

    fn get_query_result(&self, _query: &str) -> Result<ResultsIterator<'_, KeyValue>, StubError> {
        Err(StubError::Backend(self.cause.clone()))
    }

    fn get_history_for_key(
        &self,
        _key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, StubError> {
        Err(StubError::Backend(self.cause.clone()))
    }
}

#[test]
fn test_put_failure_surfaces_as_write_error() {
    let mut stub = FailingStub {
        cause: "MODEL-00001".to_string(),
    };
    let mut ctx = TransactionContext::new(&mut stub);
    let models = RecordContract::<Model>::new();

    let err = models
        .add(&mut ctx, Model::new("MODEL-00001", "KIA", 3))
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to put to world state. MODEL-00001");
}

#[test]
fn test_read_failures_surface_as_read_errors() {
    let mut stub = FailingStub {
        cause: "disk gone".to_string(),
    };
    let ctx = TransactionContext::new(&mut stub);
    let models = RecordContract::<Model>::new();

    let err = models.get_all(&ctx).unwrap_err();
    assert_eq!(err.to_string(), "Failed to read from world state: disk gone");

    let err = models.history(&ctx, "MODEL-00001").unwrap_err();
    assert!(matches!(err, ContractError::StorageRead(_)));

    let err = models.query(&ctx, "{}").unwrap_err();
    assert!(matches!(err, ContractError::StorageRead(_)));
}
