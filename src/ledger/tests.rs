use super::*;
use crate::stub::StubError;
use std::sync::Arc;
use std::thread;

fn put(ctx: &mut TransactionContext<'_>, key: &str, value: &str) -> Result<(), ContractError> {
    ctx.stub_mut()
        .put_state(key, value.as_bytes().to_vec())
        .map_err(ContractError::StorageWrite)
}

#[test]
fn test_submit_commits_writes() {
    let ledger = Ledger::new("car", StateDatabase::CouchDb);

    let receipt = ledger
        .submit(|ctx| {
            put(ctx, "a", "1")?;
            put(ctx, "b", "2")?;
            Ok("done")
        })
        .unwrap();

    assert_eq!(receipt.value, "done");
    assert_eq!(receipt.writes, 2);
    assert!(Uuid::parse_str(&receipt.tx_id).is_ok());
    assert_eq!(ledger.world_state().get("a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(ledger.world_state().len(), 2);
}

#[test]
fn test_failed_transaction_leaves_no_writes() {
    let ledger = Ledger::new("car", StateDatabase::CouchDb);

    let result: Result<Receipt<()>, ContractError> = ledger.submit(|ctx| {
        put(ctx, "a", "1")?;
        Err(ContractError::InvalidArgument("boom".to_string()))
    });

    assert_eq!(
        result.unwrap_err(),
        ContractError::InvalidArgument("boom".to_string())
    );
    assert!(ledger.world_state().is_empty());
}

#[test]
fn test_evaluate_discards_writes() {
    let ledger = Ledger::new("car", StateDatabase::CouchDb);

    let receipt = ledger.evaluate(|ctx| put(ctx, "a", "1")).unwrap();

    assert_eq!(receipt.writes, 0);
    assert!(ledger.world_state().is_empty());
}

#[test]
fn test_each_transaction_sees_previous_commit() {
    let ledger = Ledger::new("car", StateDatabase::CouchDb);

    ledger.submit(|ctx| put(ctx, "a", "1")).unwrap();
    let seen = ledger
        .evaluate(|ctx| {
            ctx.stub()
                .get_state("a")
                .map_err(ContractError::StorageRead)
        })
        .unwrap();

    assert_eq!(seen.value, Some(b"1".to_vec()));
}

#[test]
fn test_history_is_tagged_with_tx_ids() {
    let ledger = Ledger::new("car", StateDatabase::CouchDb);

    let first = ledger.submit(|ctx| put(ctx, "k", "v1")).unwrap();
    let second = ledger.submit(|ctx| put(ctx, "k", "v2")).unwrap();
    assert_ne!(first.tx_id, second.tx_id);

    let history = ledger
        .evaluate(|ctx| {
            ctx.stub()
                .get_history_for_key("k")
                .map_err(ContractError::StorageRead)?
                .collect::<Result<Vec<_>, StubError>>()
                .map_err(ContractError::StorageRead)
        })
        .unwrap()
        .value;

    let tx_ids: Vec<&str> = history.iter().map(|m| m.tx_id.as_str()).collect();
    assert_eq!(tx_ids, vec![first.tx_id.as_str(), second.tx_id.as_str()]);
}

#[test]
fn test_concurrent_submissions_are_serialized() {
    let ledger = Arc::new(Ledger::new("counter", StateDatabase::GoLevelDb));
    ledger.submit(|ctx| put(ctx, "n", "0")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..25 {
                    ledger
                        .submit(|ctx| {
                            let current = ctx
                                .stub()
                                .get_state("n")
                                .map_err(ContractError::StorageRead)?
                                .unwrap_or_default();
                            let n: u64 = String::from_utf8_lossy(&current).parse().unwrap_or(0);
                            put(ctx, "n", &(n + 1).to_string())
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let value = ledger.world_state().get("n").unwrap().unwrap();
    assert_eq!(String::from_utf8(value).unwrap(), "200");
}
