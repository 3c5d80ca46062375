use crate::types::{ChainError, Program, StateId, TapeTuple};

// Default embedded machines
const MACHINE_TEXTS: [&str; 4] = [
    include_str!("../machines/inverter.tm"),
    include_str!("../machines/shuttle.tm"),
    include_str!("../machines/left-sweep.tm"),
    include_str!("../machines/three-state-walker.tm"),
];

lazy_static::lazy_static! {
    pub static ref MACHINES: Vec<Program> = MACHINE_TEXTS
        .iter()
        .filter_map(|text| match crate::parser::parse(text) {
            Ok(program) => Some(program),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse embedded machine");
                None
            }
        })
        .collect();
}

/// Read-only catalogue of the embedded machines.
pub struct MachineCatalog;

impl MachineCatalog {
    /// Get the number of available machines
    pub fn count() -> usize {
        MACHINES.len()
    }

    /// Get a machine by its index
    pub fn get_by_index(index: usize) -> Result<Program, ChainError> {
        MACHINES.get(index).cloned().ok_or_else(|| {
            ChainError::ValidationError(format!("Machine index {} out of range", index))
        })
    }

    /// Get a machine by its name, ignoring case
    pub fn get_by_name(name: &str) -> Result<Program, ChainError> {
        MACHINES
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| ChainError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all machine names
    pub fn list_names() -> Vec<String> {
        MACHINES.iter().map(|program| program.name.clone()).collect()
    }

    /// Get information about a machine by its index
    pub fn get_info(index: usize) -> Result<MachineInfo, ChainError> {
        let program = Self::get_by_index(index)?;

        Ok(MachineInfo {
            index,
            name: program.name.clone(),
            initial_state: program.initial_state(),
            tape: program.tape,
            state_count: program.state_count(),
        })
    }

    /// Search for machines by name
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        MACHINES
            .iter()
            .enumerate()
            .filter(|(_, program)| program.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original text of a machine by its index
    pub fn get_text_by_index(index: usize) -> Result<&'static str, ChainError> {
        MACHINE_TEXTS.get(index).copied().ok_or_else(|| {
            ChainError::ValidationError(format!("Machine text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct MachineInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: StateId,
    pub tape: TapeTuple,
    pub state_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synchronizer::{turing_chain, SyncConfig};
    use crate::types::{Step, TuringSymbol};

    #[test]
    fn test_all_machines_parse() {
        assert_eq!(MachineCatalog::count(), MACHINE_TEXTS.len());
    }

    #[test]
    fn test_machine_names() {
        let names = MachineCatalog::list_names();
        assert_eq!(
            names,
            vec!["Inverter", "Shuttle", "Left Sweep", "Three State Walker"]
        );
    }

    #[test]
    fn test_get_by_name() {
        let program = MachineCatalog::get_by_name("inverter").unwrap();
        assert_eq!(program.tape, TapeTuple::new(0, 5, 21, TuringSymbol::One));

        let shuttle = MachineCatalog::get_by_name("Shuttle").unwrap();
        assert_eq!(shuttle.tape, TapeTuple::new(0, 1, 3, TuringSymbol::Zero));

        assert!(MachineCatalog::get_by_name("Nonexistent").is_err());
    }

    #[test]
    fn test_get_by_index_and_info() {
        assert!(MachineCatalog::get_by_index(0).is_ok());
        assert!(MachineCatalog::get_by_index(999).is_err());

        let info = MachineCatalog::get_info(3).unwrap();
        assert_eq!(info.name, "Three State Walker");
        assert_eq!(info.state_count, 3);
        assert_eq!(info.initial_state, 0);
        assert!(MachineCatalog::get_info(999).is_err());
    }

    #[test]
    fn test_search() {
        assert_eq!(MachineCatalog::search("SWEEP"), vec![2]);
        assert_eq!(MachineCatalog::search("e"), vec![0, 1, 2, 3]);
        assert!(MachineCatalog::search("nonexistent").is_empty());
    }

    #[test]
    fn test_get_text_by_index() {
        assert!(MachineCatalog::get_text_by_index(0)
            .unwrap()
            .contains("name: Inverter"));
        assert!(MachineCatalog::get_text_by_index(999).is_err());
    }

    #[test]
    fn test_machines_can_be_executed() {
        for program in MACHINES.iter() {
            let mut machine = program.machine();
            assert_eq!(machine.step(), Step::Continue, "{}", program.name);
        }
    }

    #[test]
    fn test_machines_commute_through_the_chain() {
        for program in MACHINES.iter() {
            let mut sync = turing_chain(program.machine(), SyncConfig::default());
            sync.generate().unwrap();

            for _ in 0..2 {
                sync.advance().unwrap();
                assert_eq!(sync.compare().unwrap(), vec![true, true], "{}", program.name);
            }
        }
    }
}
