//! Parameter checks
//!
//! Compares a command's parameter words against the code table entries of
//! its codes. Findings are warnings only; the command is still interpreted.

use crate::codes::{CodeDef, CodeTable};
use crate::command::{Code, Command};
use crate::diagnostics::SemanticWarning;

/// Modal words accepted on any line
const MODAL_WORDS: [char; 3] = ['F', 'S', 'T'];

impl CodeTable {
    /// Check `command`'s parameters against the table
    pub fn check_parameters(&self, command: &Command) -> Vec<SemanticWarning> {
        let mut warnings = Vec::new();

        let defs: Vec<&CodeDef> = command
            .codes
            .iter()
            .filter(|code| !matches!(code, Code::Unrecognized { .. }))
            .filter_map(|code| self.get(&code.name()))
            .collect();
        if defs.is_empty() {
            return warnings;
        }

        // Only codes that declare parameters restrict the accepted letters
        let declaring: Vec<&str> = defs
            .iter()
            .filter(|d| d.parameters.is_some())
            .map(|d| d.name.as_str())
            .collect();

        for (letter, value) in command.parameters.iter() {
            let found = defs
                .iter()
                .find_map(|d| d.find_parameter(letter).map(|p| (d, p)));
            match found {
                Some((def, param)) => {
                    if let Err(message) = param.validate(value) {
                        warnings.push(SemanticWarning::InvalidParameter {
                            code: def.name.clone(),
                            message,
                        });
                    }
                }
                None if !declaring.is_empty() && !MODAL_WORDS.contains(&letter) => {
                    warnings.push(SemanticWarning::UnexpectedParameter {
                        letter,
                        code: declaring.join("/"),
                    });
                }
                None => {}
            }
        }

        for def in &defs {
            for param in def.required_parameters() {
                let present = command
                    .parameters
                    .iter()
                    .any(|(letter, _)| param.matches_letter(letter));
                if !present {
                    warnings.push(SemanticWarning::MissingParameter {
                        name: param.name.clone(),
                        code: def.name.clone(),
                    });
                }
            }
        }

        warnings
    }
}
