use std::io::{self, BufRead, Write};

use tankgauge_core::grades::{parse_selection, selection_menu, GradeSelection};

/// Shows the grade menu on `output` and parses one line from `input`.
pub fn prompt_for_grades<R, W>(mut input: R, mut output: W) -> io::Result<GradeSelection>
where
    R: BufRead,
    W: Write,
{
    writeln!(output)?;
    write!(output, "{}", selection_menu())?;
    write!(output, "Enter your choice: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_selection(line.trim()))
}
