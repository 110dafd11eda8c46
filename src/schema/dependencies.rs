use super::tables::{get_table, ALL_TABLES};
use super::types::TableSchema;
use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};

/// Orders tables by their foreign key dependencies
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let deps = ALL_TABLES
            .iter()
            .map(|table| (table.name, table.dependencies()))
            .collect();

        Self { deps }
    }

    /// All tables with parents before children, for creating and inserting
    pub fn creation_order(&self) -> Result<Vec<&'static TableSchema>> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        // Walk the registry order so the output is stable
        for table in ALL_TABLES {
            if !visited.contains(table.name) {
                self.visit(table.name, &mut visited, &mut temp_visited, &mut result)?;
            }
        }

        Ok(result)
    }

    /// All tables with children before parents, for clearing rows
    pub fn teardown_order(&self) -> Result<Vec<&'static TableSchema>> {
        let mut tables = self.creation_order()?;
        tables.reverse();
        Ok(tables)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<()> {
        if temp_visited.contains(name) {
            bail!("Circular dependency detected at: {}", name);
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut deps: Vec<_> = deps.iter().copied().collect();
            deps.sort_unstable();
            for dep in deps {
                if dep != name {
                    self.visit(dep, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        match get_table(name) {
            Some(table) => result.push(table),
            None => bail!("Unknown table: {}", name),
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(names: &[&str], name: &str) -> usize {
        names.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_creation_order_puts_parents_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.creation_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert_eq!(names.len(), ALL_TABLES.len());
        assert!(position(&names, "associates") < position(&names, "invoices"));
        assert!(position(&names, "invoices") < position(&names, "payments"));
        assert!(position(&names, "events") < position(&names, "registrations"));
        assert!(position(&names, "associates") < position(&names, "registrations"));
    }

    #[test]
    fn test_teardown_order_puts_children_first() {
        let resolver = DependencyResolver::new();
        let tables = resolver.teardown_order().unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name).collect();

        assert!(position(&names, "payments") < position(&names, "invoices"));
        assert!(position(&names, "invoices") < position(&names, "associates"));
        assert!(position(&names, "registrations") < position(&names, "events"));
    }
}
