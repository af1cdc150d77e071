mod declare;
mod symbol;
mod table;

pub use declare::{declared_symbol, declared_symbols, schema_namespace};
pub use symbol::{NormalizedName, Symbol};
pub use table::{SymbolChange, SymbolTable};
