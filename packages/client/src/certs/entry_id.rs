use std::fmt;

/// Identifies an entry within one store: the alias plus a rank
/// disambiguating repeated aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserCertStoreEntryId {
    alias: String,
    rank: usize,
}

impl UserCertStoreEntryId {
    pub fn new(alias: impl Into<String>, rank: usize) -> Self {
        Self {
            alias: alias.into(),
            rank,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl fmt::Display for UserCertStoreEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank == 0 {
            f.write_str(&self.alias)
        } else {
            write!(f, "{}:{}", self.alias, self.rank)
        }
    }
}

/// Hands out ranks per alias.
#[derive(Debug, Default)]
pub(crate) struct EntryIdGenerator {
    ranks: std::collections::HashMap<String, usize>,
}

impl EntryIdGenerator {
    pub(crate) fn next_id(&mut self, alias: &str) -> UserCertStoreEntryId {
        let rank = self.ranks.entry(alias.to_string()).or_insert(0);
        let id = UserCertStoreEntryId::new(alias, *rank);

        *rank += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_per_alias() {
        let mut ids = EntryIdGenerator::default();

        let first = ids.next_id("server");
        let second = ids.next_id("server");
        let other = ids.next_id("ca");

        assert_eq!(first.to_string(), "server");
        assert_eq!(second.to_string(), "server:1");
        assert_eq!(other.rank(), 0);
        assert_ne!(first, second);
    }
}
