use std::path::{Path, PathBuf};

/// Line the Prisma diff prints when the datamodel and datasource agree
pub const EMPTY_MIGRATION_SENTINEL: &str = "-- This is an empty migration.";

/// Default location of the Prisma schema, relative to the working directory
pub const DEFAULT_SCHEMA_PATH: &str = "./prisma/schema.prisma";

/// Default command used to invoke Prisma
pub const DEFAULT_PRISMA_COMMAND: &str = "npx prisma";

/// Extension shared by every migration file
pub const MIGRATION_EXTENSION: &str = "sql";

/// Minimum number of digits in a rendered migration version
pub const VERSION_WIDTH: usize = 3;

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Check whether a file name carries the migration extension
pub fn has_migration_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MIGRATION_EXTENSION)
}
