//! Authorization checks for the gate
//!
//! A user is granted access when they are a member of the required guild and
//! hold at least one of the required roles within it.

use std::collections::HashSet;

use crate::auth::provider::Guild;

/// Check whether the required guild appears in the user's guild list (exact id match)
pub fn is_guild_member(guilds: &[Guild], required_guild_id: &str) -> bool {
    guilds.iter().any(|g| g.id == required_guild_id)
}

/// Check whether the user holds at least one of the required roles
///
/// # Arguments
/// * `user_roles` - Set of role ids the user holds in the guild
/// * `required_roles` - Role ids that grant access (any one is enough)
pub fn has_any_required_role(user_roles: &HashSet<&str>, required_roles: &[String]) -> bool {
    required_roles
        .iter()
        .any(|r| user_roles.contains(r.as_str()))
}

/// Build a HashSet of roles from a slice for efficient lookups
pub fn build_role_set(roles: &[String]) -> HashSet<&str> {
    roles.iter().map(|s| s.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles<'a>(r: &[&'a str]) -> HashSet<&'a str> {
        r.iter().copied().collect()
    }

    fn guild(id: &str) -> Guild {
        Guild { id: id.to_string() }
    }

    #[test]
    fn test_member_of_required_guild() {
        let guilds = vec![guild("111"), guild("222")];
        assert!(is_guild_member(&guilds, "222"));
    }

    #[test]
    fn test_not_member_of_required_guild() {
        let guilds = vec![guild("111"), guild("222")];
        assert!(!is_guild_member(&guilds, "333"));
        assert!(!is_guild_member(&[], "111"));
    }

    #[test]
    fn test_guild_match_is_exact() {
        let guilds = vec![guild("1234")];
        assert!(!is_guild_member(&guilds, "123"));
        assert!(!is_guild_member(&guilds, " 1234"));
    }

    #[test]
    fn test_any_one_required_role_is_enough() {
        let user_roles = roles(&["viewer", "ops"]);
        let required = vec!["admin".to_string(), "ops".to_string()];

        assert!(has_any_required_role(&user_roles, &required));
    }

    #[test]
    fn test_disjoint_roles_are_denied() {
        let user_roles = roles(&["viewer"]);
        let required = vec!["admin".to_string(), "dev".to_string()];

        assert!(!has_any_required_role(&user_roles, &required));
    }

    #[test]
    fn test_user_without_roles_is_denied() {
        let user_roles: HashSet<&str> = HashSet::new();
        let required = vec!["dev".to_string()];

        assert!(!has_any_required_role(&user_roles, &required));
    }

    #[test]
    fn test_build_role_set() {
        let roles_vec = vec!["admin".to_string(), "dev".to_string()];
        let role_set = build_role_set(&roles_vec);

        assert!(role_set.contains("admin"));
        assert!(role_set.contains("dev"));
        assert!(!role_set.contains("ops"));
    }
}
