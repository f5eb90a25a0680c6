use crate::utils::EMPTY_MIGRATION_SENTINEL;
use std::fmt;

/// Direction of a schema diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Live datasource to declared datamodel (the "do" script)
    Up,
    /// Declared datamodel back to the live datasource (the "undo" script)
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Result of a schema diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The schemas differ; holds the SQL script
    Changes(String),
    /// Nothing to migrate
    NoChanges,
}

impl DiffOutcome {
    /// Classify raw diff tool output.
    ///
    /// Blank output and the empty-migration sentinel both mean no changes.
    pub fn from_script(script: &str) -> Self {
        let trimmed = script.trim();
        if trimmed.is_empty() || trimmed == EMPTY_MIGRATION_SENTINEL {
            DiffOutcome::NoChanges
        } else {
            DiffOutcome::Changes(script.to_string())
        }
    }

    pub fn has_changes(&self) -> bool {
        matches!(self, DiffOutcome::Changes(_))
    }

    /// SQL text to store in a migration file
    pub fn into_script(self) -> String {
        match self {
            DiffOutcome::Changes(sql) => sql,
            DiffOutcome::NoChanges => format!("{}\n", EMPTY_MIGRATION_SENTINEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_script_sentinel() {
        assert_eq!(
            DiffOutcome::from_script("-- This is an empty migration.\n"),
            DiffOutcome::NoChanges
        );
        assert_eq!(
            DiffOutcome::from_script("  -- This is an empty migration.  "),
            DiffOutcome::NoChanges
        );
    }

    #[test]
    fn test_from_script_blank() {
        assert_eq!(DiffOutcome::from_script(""), DiffOutcome::NoChanges);
        assert_eq!(DiffOutcome::from_script("\n\n"), DiffOutcome::NoChanges);
    }

    #[test]
    fn test_from_script_changes_kept_verbatim() {
        let sql = "-- CreateTable\nCREATE TABLE \"users\" (\"id\" SERIAL);\n";
        let outcome = DiffOutcome::from_script(sql);
        assert!(outcome.has_changes());
        assert_eq!(outcome.into_script(), sql);
    }

    #[test]
    fn test_sentinel_inside_larger_script_is_a_change() {
        let sql = "-- This is an empty migration.\nDROP TABLE \"users\";";
        assert!(DiffOutcome::from_script(sql).has_changes());
    }

    #[test]
    fn test_no_changes_script() {
        assert_eq!(
            DiffOutcome::NoChanges.into_script(),
            "-- This is an empty migration.\n"
        );
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }
}
