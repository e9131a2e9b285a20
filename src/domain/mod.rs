mod account;
mod category;
mod integrity;
mod ledger;
mod money;
mod transaction;

pub use account::*;
pub use category::*;
pub use integrity::*;
pub use ledger::*;
pub use money::*;
pub use transaction::*;
