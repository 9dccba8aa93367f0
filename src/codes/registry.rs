//! Code Table Registry
//!
//! In-memory registry of named code tables. Tables come from the embedded
//! core table and from TOML files in user and workspace directories; a table
//! from a higher-priority source replaces one of the same name.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::schema::CodeTable;

/// Embedded common-core code table
const CORE_TABLE: &str = include_str!("../../resources/codes/core.toml");

/// Codes given built-in semantics, used when the embedded table fails to load
const CORE_CODES: [&str; 34] = [
    "G0", "G1", "G2", "G3", "G4", "G10", "G17", "G18", "G19", "G20", "G21", "G53", "G54", "G55",
    "G56", "G57", "G58", "G59", "G59.1", "G59.2", "G59.3", "G64", "G80", "G90", "G91", "G94",
    "M0", "M1", "M2", "M3", "M4", "M5", "M6", "M30",
];

impl CodeTable {
    /// The embedded common-core table
    pub fn core() -> CodeTable {
        match CodeTable::from_toml(CORE_TABLE) {
            Ok(table) => table,
            Err(e) => {
                log::warn!(
                    "Failed to parse embedded core code table: {}. Using minimal fallback.",
                    e
                );
                CodeTable::from_names("core", CORE_CODES)
            }
        }
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::core()
    }
}

/// Where a table was loaded from, lowest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TablePriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Workspace = 2,
}

/// A registered table with its source
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: CodeTable,
    pub priority: TablePriority,
    pub source_path: Option<PathBuf>,
}

/// Simple in-memory code table registry
#[derive(Debug, Clone, Default)]
pub struct CodeRegistry {
    tables: HashMap<String, LoadedTable>,
    active: Option<String>,
}

impl CodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded core table, active
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add_embedded_core_table();
        registry.set_active("core");
        registry
    }

    /// Add the embedded core table
    pub fn add_embedded_core_table(&mut self) {
        self.add_table(CodeTable::core(), TablePriority::BuiltIn, None);
    }

    /// Register a table unless one of the same name has higher priority
    pub fn add_table(
        &mut self,
        table: CodeTable,
        priority: TablePriority,
        source_path: Option<PathBuf>,
    ) -> bool {
        let should_load = match self.tables.get(&table.name) {
            Some(existing) => priority >= existing.priority,
            None => true,
        };

        if should_load {
            self.tables.insert(
                table.name.clone(),
                LoadedTable {
                    table,
                    priority,
                    source_path,
                },
            );
        }
        should_load
    }

    /// Load every `*.toml` table in `dir`; a missing directory is not an error
    ///
    /// Files that fail to parse are logged and skipped. Returns the number
    /// of tables registered.
    pub fn load_directory(&mut self, dir: &Path, priority: TablePriority) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read code table directory: {}", dir.display()))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path, priority) {
                Ok(_) => loaded += 1,
                Err(e) => log::warn!("Skipping code table {}: {:#}", path.display(), e),
            }
        }
        Ok(loaded)
    }

    /// Load a single table file, returning its name
    pub fn load_file(&mut self, path: &Path, priority: TablePriority) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read code table file: {}", path.display()))?;
        let table = CodeTable::from_toml(&content)
            .with_context(|| format!("Invalid code table: {}", path.display()))?;

        let name = table.name.clone();
        if self.add_table(table, priority, Some(path.to_path_buf())) {
            log::debug!("Loaded code table '{}' from {}", name, path.display());
        }
        Ok(name)
    }

    /// Set the active table
    pub fn set_active(&mut self, name: &str) -> bool {
        if self.tables.contains_key(name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Get the currently active table
    pub fn active(&self) -> Option<&CodeTable> {
        self.active
            .as_ref()
            .and_then(|name| self.tables.get(name))
            .map(|loaded| &loaded.table)
    }

    pub fn get(&self, name: &str) -> Option<&LoadedTable> {
        self.tables.get(name)
    }

    /// List all registered table names, sorted
    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Activate a table given by name or by path to a TOML file
    pub fn select(&mut self, name_or_path: &str) -> Result<()> {
        if self.set_active(name_or_path) {
            return Ok(());
        }

        let path = Path::new(name_or_path);
        if path.is_file() {
            let name = self.load_file(path, TablePriority::Workspace)?;
            self.set_active(&name);
            return Ok(());
        }

        anyhow::bail!(
            "Unknown code table '{}' (available: {})",
            name_or_path,
            self.list_tables().join(", ")
        )
    }

    /// Detect a registered table named by a modeline in the program text
    ///
    /// Only the first and last five lines are searched, for a comment like
    /// `; gctk_codes=core`.
    pub fn detect_modeline_table(&self, content: &str) -> Option<String> {
        let lines: Vec<&str> = content.lines().collect();
        let check_lines: Vec<&str> = if lines.len() <= 10 {
            lines
        } else {
            let mut check = Vec::new();
            check.extend_from_slice(&lines[0..5]);
            check.extend_from_slice(&lines[lines.len() - 5..]);
            check
        };

        let modeline_re = regex::Regex::new(r"gctk_codes\s*=\s*([\w-]+)").ok()?;

        check_lines.into_iter().find_map(|line| {
            let name = modeline_re.captures(line)?.get(1)?.as_str();
            self.tables.contains_key(name).then(|| name.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> CodeTable {
        CodeTable::from_names(name, ["G0"])
    }

    #[test]
    fn test_core_table_parses() {
        let table = CodeTable::core();
        assert_eq!(table.name, "core");
        assert_eq!(table.version.as_deref(), Some("1.0"));
        for code in CORE_CODES {
            assert!(table.contains(code), "core table lacks {code}");
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = CodeRegistry::new();
        assert!(registry.list_tables().is_empty());
        assert!(registry.active().is_none());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = CodeRegistry::with_builtin();
        assert_eq!(registry.list_tables(), vec!["core"]);
        assert_eq!(registry.active().unwrap().name, "core");
    }

    #[test]
    fn test_priority_replacement() {
        let mut registry = CodeRegistry::new();
        assert!(registry.add_table(named("shop"), TablePriority::Workspace, None));
        assert!(!registry.add_table(named("shop"), TablePriority::UserGlobal, None));
        assert_eq!(
            registry.get("shop").unwrap().priority,
            TablePriority::Workspace
        );
    }

    #[test]
    fn test_nonexistent_table() {
        let mut registry = CodeRegistry::new();
        assert!(!registry.set_active("nonexistent"));
        assert!(registry.select("nonexistent").is_err());
    }

    #[test]
    fn test_modeline_requires_registered_table() {
        let mut registry = CodeRegistry::with_builtin();
        registry.add_table(named("lathe"), TablePriority::UserGlobal, None);

        assert_eq!(
            registry.detect_modeline_table("; gctk_codes=lathe\nG0 X1"),
            Some("lathe".to_string())
        );
        assert_eq!(registry.detect_modeline_table("(gctk_codes = mill)\nG0"), None);
        assert_eq!(registry.detect_modeline_table("G1 X10 Y20\n; just a comment"), None);
    }

    #[test]
    fn test_modeline_in_trailer() {
        let registry = CodeRegistry::with_builtin();
        let mut content = String::new();
        for i in 0..20 {
            content.push_str(&format!("G1 X{i}\n"));
        }
        content.push_str("; gctk_codes=core\n");
        assert_eq!(
            registry.detect_modeline_table(&content),
            Some("core".to_string())
        );
    }
}
