//! Contract-API dispatch.
//!
//! A chaincode receives a function name and positional string arguments,
//! the way the platform invokes contracts, and answers with JSON.

use crate::contract::{ContractError, Direction, RecordContract};
use crate::record::Record;
use crate::stub::TransactionContext;
use serde::Serialize;
use serde_json::Value;

mod function;
pub mod registry;


pub use function::Function;
pub use registry::{ChaincodeInfo, ChaincodeRegistry, DeployError, InvokeError, RECORD_CONTRACTS};

/// A deployable contract reachable by function name
pub trait Chaincode: Send + Sync {
    /// Namespace name the chaincode is deployed under
    fn name(&self) -> &str;

    /// Function names accepted by [`Chaincode::invoke`]
    fn functions(&self) -> Vec<String>;

    /// Runs `function` with string `args`; `Value::Null` means "no result"
    fn invoke(
        &self,
        ctx: &mut TransactionContext<'_>,
        function: &str,
        args: &[String],
    ) -> Result<Value, ContractError>;
}

impl<R: Record> Chaincode for RecordContract<R> {
    fn name(&self) -> &str {
        R::KIND
    }

    fn functions(&self) -> Vec<String> {
        Function::ALL
            .into_iter()
            .filter_map(|f| f.name::<R>())
            .collect()
    }

    fn invoke(
        &self,
        ctx: &mut TransactionContext<'_>,
        function: &str,
        args: &[String],
    ) -> Result<Value, ContractError> {
        let resolved = Function::resolve::<R>(function).ok_or_else(|| {
            ContractError::UnknownFunction {
                contract: R::KIND.to_string(),
                function: function.to_string(),
            }
        })?;

        match resolved {
            Function::InitLedger => {
                expect_args(function, args, 0)?;
                self.init_ledger(ctx)?;
                Ok(Value::Null)
            }
            Function::Exists => {
                expect_args(function, args, 1)?;
                to_json::<R, _>(&self.exists(ctx, &args[0])?)
            }
            Function::Add => {
                expect_args(function, args, R::FIELDS.len() + 1)?;
                self.add_from_args(ctx, &args[0], &args[1..])?;
                Ok(Value::Null)
            }
            Function::Query => {
                expect_args(function, args, 1)?;
                to_json::<R, _>(&self.get(ctx, &args[0])?)
            }
            Function::QueryAll => {
                expect_args(function, args, 0)?;
                to_json::<R, _>(&self.get_all(ctx)?)
            }
            Function::QueryByRange => {
                expect_args(function, args, 2)?;
                to_json::<R, _>(&self.get_range(ctx, &args[0], &args[1])?)
            }
            Function::RichQuery => {
                expect_args(function, args, 1)?;
                to_json::<R, _>(&self.query(ctx, &args[0])?)
            }
            Function::Update => {
                expect_args(function, args, 3)?;
                self.update_field(ctx, &args[0], &args[1], &args[2])?;
                Ok(Value::Null)
            }
            Function::ChangeOwner => {
                expect_args(function, args, 2)?;
                self.change_owner(ctx, &args[0], &args[1])?;
                Ok(Value::Null)
            }
            Function::PushCount | Function::PopCount => {
                expect_args(function, args, 2)?;
                let delta = parse_i64("delta", &args[1])?;
                let direction = if resolved == Function::PushCount {
                    Direction::Push
                } else {
                    Direction::Pop
                };
                to_json::<R, _>(&self.adjust_count(ctx, &args[0], delta, direction)?)
            }
            Function::Delete => {
                expect_args(function, args, 1)?;
                self.delete(ctx, &args[0])?;
                Ok(Value::Null)
            }
            Function::History => {
                expect_args(function, args, 1)?;
                to_json::<R, _>(&self.history(ctx, &args[0])?)
            }
        }
    }
}

fn expect_args(function: &str, args: &[String], expected: usize) -> Result<(), ContractError> {
    if args.len() != expected {
        return Err(ContractError::InvalidArgument(format!(
            "Incorrect number of params. Expected {}, received {} for {}",
            expected,
            args.len(),
            function
        )));
    }
    Ok(())
}

fn parse_i64(name: &str, raw: &str) -> Result<i64, ContractError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ContractError::InvalidArgument(format!("Argument {} must be an integer, got '{}'", name, raw))
    })
}

fn to_json<R: Record, T: Serialize>(value: &T) -> Result<Value, ContractError> {
    serde_json::to_value(value).map_err(|e| ContractError::Serialization {
        kind: R::KIND,
        id: String::new(),
        reason: e.to_string(),
    })
}
