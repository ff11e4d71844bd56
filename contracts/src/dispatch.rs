//! # Contract Dispatcher
//!
//! String-based entry point: a function name plus positional string
//! arguments in, a JSON value out. This is the surface the node's `invoke`
//! and `query` commands drive.
//!
//! | Function           | Args                                     | Mode  |
//! |--------------------|------------------------------------------|-------|
//! | `InitLedger`       |                                          | write |
//! | `CreateAsset`      | id, color, size, owner, appraisedValue   | write |
//! | `UpdateAsset`      | id, color, size, owner, appraisedValue   | write |
//! | `DeleteAsset`      | id                                       | write |
//! | `TransferAsset`    | id, newOwner                             | write |
//! | `ReadAsset`        | id                                       | read  |
//! | `AssetExists`      | id                                       | read  |
//! | `GetAllAssets`     |                                          | read  |
//! | `GetAssetsByOwner` | owner                                    | read  |
//! | `GetAssetHistory`  | assetId                                  | read  |
//! | `GetAssetCount`    |                                          | read  |

use std::fmt;
use std::str::FromStr;

use asset_ledger_protocol::{StateError, WorldState};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::AssetError;
use crate::registry::AssetContract;

/// A callable contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    InitLedger,
    CreateAsset,
    ReadAsset,
    UpdateAsset,
    DeleteAsset,
    TransferAsset,
    AssetExists,
    GetAllAssets,
    GetAssetsByOwner,
    GetAssetHistory,
    GetAssetCount,
}

impl Function {
    pub const ALL: [Function; 11] = [
        Function::InitLedger,
        Function::CreateAsset,
        Function::ReadAsset,
        Function::UpdateAsset,
        Function::DeleteAsset,
        Function::TransferAsset,
        Function::AssetExists,
        Function::GetAllAssets,
        Function::GetAssetsByOwner,
        Function::GetAssetHistory,
        Function::GetAssetCount,
    ];

    /// Wire name of the function.
    pub fn name(self) -> &'static str {
        match self {
            Function::InitLedger => "InitLedger",
            Function::CreateAsset => "CreateAsset",
            Function::ReadAsset => "ReadAsset",
            Function::UpdateAsset => "UpdateAsset",
            Function::DeleteAsset => "DeleteAsset",
            Function::TransferAsset => "TransferAsset",
            Function::AssetExists => "AssetExists",
            Function::GetAllAssets => "GetAllAssets",
            Function::GetAssetsByOwner => "GetAssetsByOwner",
            Function::GetAssetHistory => "GetAssetHistory",
            Function::GetAssetCount => "GetAssetCount",
        }
    }

    /// Whether the function only reads. Read-only functions should be
    /// evaluated rather than submitted.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Function::ReadAsset
                | Function::AssetExists
                | Function::GetAllAssets
                | Function::GetAssetsByOwner
                | Function::GetAssetHistory
                | Function::GetAssetCount
        )
    }

    /// Number of positional arguments expected.
    pub fn arity(self) -> usize {
        match self {
            Function::InitLedger | Function::GetAllAssets | Function::GetAssetCount => 0,
            Function::ReadAsset
            | Function::DeleteAsset
            | Function::AssetExists
            | Function::GetAssetsByOwner
            | Function::GetAssetHistory => 1,
            Function::TransferAsset => 2,
            Function::CreateAsset | Function::UpdateAsset => 5,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DispatchError::UnknownFunction(s.to_string()))
    }
}

/// Errors from [`AssetContract::invoke`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: Function,
        expected: usize,
        actual: usize,
    },

    #[error("argument {name} must be a decimal integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<StateError> for DispatchError {
    fn from(e: StateError) -> Self {
        DispatchError::Asset(AssetError::Store(e))
    }
}

impl DispatchError {
    /// True for failures caused by the caller's input rather than by state.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownFunction(_)
                | DispatchError::Arity { .. }
                | DispatchError::InvalidInteger { .. }
                | DispatchError::Asset(AssetError::InvalidAssetId { .. })
        )
    }
}

fn parse_int(name: &'static str, value: &str) -> Result<i64, DispatchError> {
    value
        .trim()
        .parse()
        .map_err(|_| DispatchError::InvalidInteger {
            name,
            value: value.to_string(),
        })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(DispatchError::Encode)
}

impl AssetContract {
    /// Call `function` by name with string arguments.
    ///
    /// Functions returning nothing yield [`Value::Null`].
    pub fn invoke<S: AsRef<str>>(
        &self,
        ctx: &mut dyn WorldState,
        function: &str,
        args: &[S],
    ) -> Result<Value, DispatchError> {
        let function: Function = function.parse()?;
        self.call(ctx, function, args)
    }

    /// Like [`invoke`](Self::invoke) with an already resolved [`Function`].
    pub fn call<S: AsRef<str>>(
        &self,
        ctx: &mut dyn WorldState,
        function: Function,
        args: &[S],
    ) -> Result<Value, DispatchError> {
        if args.len() != function.arity() {
            return Err(DispatchError::Arity {
                function,
                expected: function.arity(),
                actual: args.len(),
            });
        }
        let arg = |i: usize| args[i].as_ref();

        tracing::trace!(%function, args = args.len(), "dispatching");
        let value = match function {
            Function::InitLedger => to_json(&self.init_ledger(ctx)?)?,
            Function::CreateAsset => {
                let size = parse_int("size", arg(2))?;
                let appraised = parse_int("appraisedValue", arg(4))?;
                self.create_asset(ctx, arg(0), arg(1), size, arg(3), appraised)?;
                Value::Null
            }
            Function::UpdateAsset => {
                let size = parse_int("size", arg(2))?;
                let appraised = parse_int("appraisedValue", arg(4))?;
                self.update_asset(ctx, arg(0), arg(1), size, arg(3), appraised)?;
                Value::Null
            }
            Function::DeleteAsset => {
                self.delete_asset(ctx, arg(0))?;
                Value::Null
            }
            Function::TransferAsset => {
                self.transfer_asset(ctx, arg(0), arg(1))?;
                Value::Null
            }
            Function::ReadAsset => to_json(&self.read_asset(ctx, arg(0))?)?,
            Function::AssetExists => Value::Bool(self.asset_exists(ctx, arg(0))?),
            Function::GetAllAssets => to_json(&self.get_all_assets(ctx)?)?,
            Function::GetAssetsByOwner => to_json(&self.get_assets_by_owner(ctx, arg(0))?)?,
            Function::GetAssetHistory => to_json(&self.get_asset_history(ctx, arg(0))?)?,
            Function::GetAssetCount => to_json(&self.get_asset_count(ctx)?)?,
        };
        Ok(value)
    }
}
