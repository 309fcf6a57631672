//! External online schema change tool
//!
//! Option tokenization, command line construction, availability probing and
//! process execution for `mariadb-schema-change`.

mod command;
mod execute;
mod probe;
mod tokenize;

pub use command::{CommandLineBuilder, ToolInvocation};
pub use execute::{execute_invocation, ExecutionOutcome, KeepAlive, NoKeepAlive};
pub use probe::{
    parse_version, AvailabilityState, CommandProbe, StaticProbe, ToolAvailability, VersionProbe,
};
pub use tokenize::{join_tokens, tokenize};
