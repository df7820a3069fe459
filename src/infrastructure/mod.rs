// Infrastructure implementations of the boundary ports.

pub mod fragment_loader;
pub mod lexer;
pub mod parser;
pub mod unparser;

pub use fragment_loader::{FsFragmentLoader, MemoryFragmentLoader};
pub use parser::DefaultParser;
pub use unparser::{unparse_or_dump, PrettyUnparser};
