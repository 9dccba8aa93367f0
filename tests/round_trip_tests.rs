//! Rendering a command and reading it back yields the same command
use gctk::{classify, parse_line, CodeTable, Command};

fn read(line: &str, table: &CodeTable) -> Command {
    let statement = parse_line(line)
        .expect("non-blank line")
        .unwrap_or_else(|e| panic!("{line:?} rejected: {e}"));
    classify(statement, table).expect("classify")
}

#[test]
fn test_rendered_commands_read_back_equal() {
    let table = CodeTable::core();
    let lines = [
        "G1 X10 Y20.5 Z0.2 F1500",
        "n20 g01 x-.5 y+3. ; feed move",
        "G2 X1 Y1 I0.5 J-0.5 (quarter) (arc)",
        "G59.3",
        "G38.2 Z-10 F50",
        "G64 P0.01",
        "M3 S12000 G0 X0",
        "T3 M6",
        "X0.1 Y0.2",
        "G10 L2 P1 X-100.125 Y0.0000001",
        "(only a comment)",
        "N7",
        "G1 X123456789.25 Y-0.000015",
    ];

    for line in lines {
        let command = read(line, &table);
        let rendered = command.to_string();
        let reread = read(&rendered, &table);
        assert_eq!(reread, command, "{line:?} rendered as {rendered:?}");
    }
}

#[test]
fn test_rendering_is_canonical() {
    let table = CodeTable::core();
    let command = read("n5 g01 x1.50 (cut) y-0 ; fast", &table);
    assert_eq!(command.to_string(), "N5 G1 X1.5 Y-0 ;cut  fast");
}
