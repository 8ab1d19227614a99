use serde::{Deserialize, Serialize};

/// Organization a user belongs to. Owned by the accounts subsystem; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub org_id: i64,
    pub org_name: String,
}

impl Organization {
    /// Storage path segment for the organization
    pub fn slug(&self) -> String {
        org_slug(&self.org_name)
    }
}

/// Lowercased organization name with spaces replaced by `_`.
pub fn org_slug(org_name: &str) -> String {
    org_name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_slug() {
        assert_eq!(org_slug("Acme Legal Group"), "acme_legal_group");
        assert_eq!(org_slug("ACME"), "acme");
        assert_eq!(org_slug("a  b"), "a__b");
    }
}
