pub mod authz;
pub mod command;

pub use authz::{build_role_set, has_any_required_role, is_guild_member};
pub use command::{CommandError, CommandLine, CommandOutput};
