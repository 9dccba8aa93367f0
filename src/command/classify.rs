//! Statement classification
//!
//! Splits a statement's words into primary codes and parameters and resolves
//! each code against the active code table.

use serde::Serialize;
use thiserror::Error;

use super::{code_name, is_primary_letter, Code, Command, Parameters};
use crate::codes::CodeTable;
use crate::parser::Statement;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ClassifyError {
    #[error("conflicting primary codes {}", .codes.join(" "))]
    MultiplePrimaryCodes { codes: Vec<String> },
}

/// Whether two primary words may share one statement
///
/// A G code may travel with an M code; two codes of the same letter may not.
pub fn may_coexist(first: char, second: char) -> bool {
    matches!((first, second), ('G', 'M') | ('M', 'G'))
}

/// Resolve a code word against `table`
fn resolve(letter: char, number: f64, table: &CodeTable) -> Code {
    if !table.contains(&code_name(letter, number)) {
        return Code::Unrecognized { letter, number };
    }
    match Code::from_word(letter, number) {
        Code::Unrecognized { .. } => Code::Ignored { letter, number },
        code => code,
    }
}

/// Classify a parsed statement into a [`Command`]
pub fn classify(statement: Statement, table: &CodeTable) -> Result<Command, ClassifyError> {
    let (primary, parameters): (Vec<_>, Vec<_>) = statement
        .words
        .into_iter()
        .partition(|w| is_primary_letter(w.letter));

    let conflict = primary.iter().enumerate().any(|(i, a)| {
        primary[i + 1..]
            .iter()
            .any(|b| !may_coexist(a.letter, b.letter))
    });
    if conflict {
        return Err(ClassifyError::MultiplePrimaryCodes {
            codes: primary
                .iter()
                .map(|w| code_name(w.letter, w.value))
                .collect(),
        });
    }

    let codes = primary
        .iter()
        .map(|w| resolve(w.letter, w.value, table))
        .collect();
    let parameters: Parameters = parameters.into_iter().map(|w| (w.letter, w.value)).collect();

    Ok(Command {
        line: statement.line,
        line_number: statement.line_number,
        codes,
        parameters,
        comment: statement.comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn classify_line(line: &str) -> Result<Command, ClassifyError> {
        let statement = parse_line(line).unwrap().unwrap();
        classify(statement, &CodeTable::core())
    }

    #[test]
    fn test_classify_motion() {
        let command = classify_line("G1 X10 Y5 F200").unwrap();
        assert_eq!(command.codes, vec![Code::Linear]);
        assert_eq!(command.parameters.get('F'), Some(200.0));
        assert_eq!(command.parameters.len(), 3);
    }

    #[test]
    fn test_parameter_only_line() {
        let command = classify_line("X1 Y2").unwrap();
        assert!(command.codes.is_empty());
        assert_eq!(command.primary(), None);
    }

    #[test]
    fn test_g_and_m_may_coexist() {
        let command = classify_line("G0 M5").unwrap();
        assert_eq!(command.codes, vec![Code::Rapid, Code::SpindleStop]);
    }

    #[test]
    fn test_two_g_codes_conflict() {
        let err = classify_line("G90 G1 X1").unwrap_err();
        assert_eq!(
            err,
            ClassifyError::MultiplePrimaryCodes {
                codes: vec!["G90".to_string(), "G1".to_string()]
            }
        );
        assert_eq!(err.to_string(), "conflicting primary codes G90 G1");
    }

    #[test]
    fn test_two_m_codes_conflict() {
        assert!(classify_line("M3 M8").is_err());
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let command = classify_line("G38.2 Z-5").unwrap();
        assert_eq!(
            command.codes,
            vec![Code::Unrecognized {
                letter: 'G',
                number: 38.2
            }]
        );
    }

    #[test]
    fn test_table_listed_code_without_semantics_is_ignored() {
        let command = classify_line("G64").unwrap();
        assert_eq!(
            command.codes,
            vec![Code::Ignored {
                letter: 'G',
                number: 64.0
            }]
        );
    }

    #[test]
    fn test_table_restricts_known_codes() {
        let table = CodeTable::from_names("linear-only", ["G0", "G1"]);
        let statement = parse_line("G2 X1 I1").unwrap().unwrap();
        let command = classify(statement, &table).unwrap();
        assert!(matches!(command.codes[0], Code::Unrecognized { .. }));
    }
}
