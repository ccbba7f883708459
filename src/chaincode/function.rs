use crate::record::Record;

/// Contract functions every record chaincode exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    InitLedger,
    Exists,
    Add,
    Query,
    QueryAll,
    QueryByRange,
    RichQuery,
    Update,
    ChangeOwner,
    PushCount,
    PopCount,
    Delete,
    History,
}

impl Function {
    pub const ALL: [Function; 13] = [
        Function::InitLedger,
        Function::Exists,
        Function::Add,
        Function::Query,
        Function::QueryAll,
        Function::QueryByRange,
        Function::RichQuery,
        Function::Update,
        Function::ChangeOwner,
        Function::PushCount,
        Function::PopCount,
        Function::Delete,
        Function::History,
    ];

    /// Contract-API name of this function for records of type `R`.
    ///
    /// `None` when `R` does not offer the function.
    pub fn name<R: Record>(self) -> Option<String> {
        let name = match self {
            Function::InitLedger => "InitLedger".to_string(),
            Function::Exists => format!("{}Exists", R::NAME),
            Function::Add => format!("Add{}", R::NAME),
            Function::Query => format!("Query{}", R::NAME),
            Function::QueryAll => format!("QueryAll{}", R::PLURAL),
            Function::QueryByRange => format!("Query{}ByRange", R::PLURAL),
            Function::RichQuery => format!("Query{}CouchDB", R::NAME),
            Function::Update => format!("Update{}", R::NAME),
            Function::ChangeOwner => {
                R::OWNER_FIELD?;
                format!("Change{}Owner", R::NAME)
            }
            Function::PushCount => format!("Push{}Count", R::NAME),
            Function::PopCount => format!("Pop{}Count", R::NAME),
            Function::Delete => format!("Delete{}", R::NAME),
            Function::History => format!("QueryHistory{}", R::PLURAL),
        };
        Some(name)
    }

    /// Resolves a contract-API name for records of type `R`
    pub fn resolve<R: Record>(function: &str) -> Option<Function> {
        Self::ALL
            .into_iter()
            .find(|f| f.name::<R>().as_deref() == Some(function))
    }
}
