use gctk::interpreter::{interpret, EventKind, InterpreterOptions};

fn main() {
    println!("=== gctk Interpreter Demo ===");

    let program = "\
%
(square with a rounded corner)
G21
G90
G0 X0 Y0
M3 S9000
G1 X20 F600
Y10
G3 X10 Y20 R10
G1 X0
Y0 Z-1.2.3 ; malformed
M5
";

    let result = interpret(program, &InterpreterOptions::default());

    for event in &result.events {
        match &event.kind {
            EventKind::Move(m) => println!(
                "line {:>2}: {:?} to ({}, {}, {}) {:?}",
                event.line, m.kind, m.target.x, m.target.y, m.target.z, m.units
            ),
            other => println!("line {:>2}: {:?}", event.line, other),
        }
    }

    println!("\nDiagnostics:");
    for diagnostic in &result.diagnostics {
        println!("  {}", diagnostic);
    }
}
